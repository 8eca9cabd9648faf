//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3.0 specification served at /docs.

use utoipa::OpenApi;

use crate::handlers::{AiModelsLoaded, HealthResponse};

/// Certiva API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Certiva - Certificate Verification API",
        version = "0.1.0",
        description = r#"
## Certificate Verification Decision Engine

Certiva combines three independent evidence sources into one trust
verdict:

- **Structured-field extraction** - pattern rules plus a generative
  fallback over the OCR transcript
- **Biometric similarity** - embedding distance between a claimed
  photo/signature and a reference
- **Ledger trust anchor** - tamper-evident record keyed by the
  certificate's content hash

### How It Works

1. **Parse** a certificate scan via `POST /parse-certificate`
2. **Anchor** it via `POST /certificate/store-blockchain`
3. **Verify** later via `POST /certificate/verify-comprehensive` - the
   ledger lookup and the supplied biometric comparisons run concurrently
   and every signal failure is attributed in the verdict, never silently
   dropped
"#,
        license(
            name = "MIT OR Apache-2.0",
            url = "https://github.com/certiva/certiva/blob/main/LICENSE"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "Biometrics", description = "Face and signature similarity comparisons"),
        (name = "Certificates", description = "Certificate parsing and ledger anchoring"),
        (name = "Verification", description = "Comprehensive multi-signal verification"),
        (name = "Health", description = "Service health endpoints")
    ),
    paths(
        crate::handlers::health::health_handler,
        crate::handlers::similarity::verify_faces_handler,
        crate::handlers::similarity::verify_signatures_handler,
        crate::handlers::certificate::parse_certificate_handler,
        crate::handlers::certificate::store_blockchain_handler,
        crate::handlers::certificate::get_ledger_record_handler,
        crate::handlers::comprehensive::verify_comprehensive_handler,
    ),
    components(schemas(HealthResponse, AiModelsLoaded))
)]
pub struct ApiDoc;
