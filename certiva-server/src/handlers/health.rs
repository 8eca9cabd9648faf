//! Health check handler
//!
//! Reports ledger connectivity and model load state for monitoring and
//! load balancer health checks.

use axum::{extract::State, Json};
use certiva_core::LedgerMode;
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Load state of the AI collaborators
#[derive(Serialize, ToSchema)]
pub struct AiModelsLoaded {
    /// Whether the certificate parser has real OCR/detector models
    pub certificate_parser: bool,
    /// Whether the signature verifier has a real embedding model
    pub signature_verifier: bool,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status: "healthy" or "degraded"
    pub status: &'static str,
    /// Server version from Cargo.toml
    pub version: &'static str,
    /// Whether a live ledger backs the trust anchor
    pub blockchain_connected: bool,
    /// Load state of the AI collaborators
    pub ai_models_loaded: AiModelsLoaded,
}

/// GET /health - Health check endpoint
///
/// Reports whether the ledger runs in live or degraded mode and whether
/// real models back the AI collaborators. The service stays functional in
/// degraded mode; this endpoint only makes the degradation visible.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service health snapshot", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine_health = state.engine.health();
    let blockchain_connected = engine_health.ledger_mode == LedgerMode::Live;

    let certificate_parser = state
        .parser
        .as_ref()
        .map(|p| p.is_loaded())
        .unwrap_or(false);

    let ai_models_loaded = AiModelsLoaded {
        certificate_parser,
        signature_verifier: engine_health.signature_model_loaded,
    };

    let status = if blockchain_connected
        && ai_models_loaded.certificate_parser
        && ai_models_loaded.signature_verifier
    {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        blockchain_connected,
        ai_models_loaded,
    })
}
