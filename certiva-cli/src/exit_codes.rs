//! Exit codes following sysexits.h conventions.

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Comparison produced a negative prediction.
/// Maps to EX_DATAERR from sysexits.h.
pub const NO_MATCH: i32 = 65;
