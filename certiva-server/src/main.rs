//! Certiva Server - REST API for certificate verification
//!
//! Wires the decision engine's collaborators from configuration: live
//! implementations where endpoints are set, mocks where the deployment
//! explicitly allows them, and a degraded in-process ledger when no
//! gateway is reachable.

use std::sync::Arc;

use certiva_core::{
    CertificateParser, EmbeddingConfig, EmbeddingModel, EmbeddingModelFactory, FieldExtractor,
    HttpLedgerConfig, LedgerClient, LedgerConfig, LedgerFactory, MockRegionDetector,
    MockTextRecognizer, RegionCropper, RegionDetector, RemoteDetectorConfig,
    RemoteEmbeddingConfig, RemoteExtractionBackend, RemoteExtractionConfig, RemoteOcrConfig,
    RemoteRegionDetector, RemoteTextRecognizer, TextRecognizer, VerificationConfig,
    VerificationEngine,
};
use certiva_server::{create_router, AppState, Config};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    let state = build_state(&config).await;
    let app = create_router(state, &config);

    let addr = config.socket_addr();
    info!(%addr, "Certiva server listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Assemble the shared application state from configuration.
async fn build_state(config: &Config) -> AppState {
    let ledger = build_ledger(config).await;

    let face_model = build_embedding_model(
        config.face_model_url.as_deref(),
        "face",
        config.allow_mock_models,
    );
    let signature_model = build_embedding_model(
        config.signature_model_url.as_deref(),
        "signature",
        config.allow_mock_models,
    );

    let engine = Arc::new(VerificationEngine::new(
        ledger.clone(),
        face_model,
        signature_model,
        VerificationConfig::default(),
    ));

    let parser = build_parser(config);

    AppState {
        engine,
        parser,
        ledger,
        max_file_size: config.max_file_size(),
    }
}

async fn build_ledger(config: &Config) -> Arc<dyn LedgerClient> {
    match &config.ledger_gateway_url {
        Some(url) => LedgerFactory::create(LedgerConfig::Auto(HttpLedgerConfig::new(url)))
            .await
            .expect("Failed to create ledger client"),
        None => {
            warn!("LEDGER_GATEWAY_URL not set, using degraded in-process ledger");
            LedgerFactory::create_degraded()
        }
    }
}

fn build_embedding_model(
    endpoint: Option<&str>,
    kind: &str,
    allow_mock: bool,
) -> Arc<dyn EmbeddingModel> {
    match endpoint {
        Some(url) => {
            EmbeddingModelFactory::create(EmbeddingConfig::Remote(RemoteEmbeddingConfig::new(
                url,
            )))
            .expect("Failed to create embedding model")
        }
        None if allow_mock => {
            warn!(kind, "No embedding endpoint configured, using mock model");
            EmbeddingModelFactory::create_mock()
        }
        None => panic!(
            "No {kind} embedding endpoint configured; set the endpoint or ALLOW_MOCK_MODELS=true"
        ),
    }
}

/// Build the certificate parser when its collaborators are available.
fn build_parser(config: &Config) -> Option<Arc<CertificateParser>> {
    let ocr: Arc<dyn TextRecognizer> = match &config.ocr_url {
        Some(url) => Arc::new(
            RemoteTextRecognizer::new(RemoteOcrConfig::new(url))
                .expect("Failed to create OCR client"),
        ),
        None if config.allow_mock_models => {
            warn!("OCR_URL not set, using mock text recognizer");
            Arc::new(MockTextRecognizer::returning(""))
        }
        None => return None,
    };

    let detector: Arc<dyn RegionDetector> = match &config.detector_url {
        Some(url) => Arc::new(
            RemoteRegionDetector::new(RemoteDetectorConfig::new(url))
                .expect("Failed to create detector client"),
        ),
        None if config.allow_mock_models => {
            warn!("DETECTOR_URL not set, using mock region detector");
            Arc::new(MockRegionDetector::empty())
        }
        None => return None,
    };

    let extractor = match &config.extraction_url {
        Some(url) => {
            let backend = RemoteExtractionBackend::new(RemoteExtractionConfig::new(
                url,
                &config.extraction_model,
            ))
            .expect("Failed to create extraction backend");
            FieldExtractor::with_backend(Arc::new(backend))
        }
        None => {
            warn!("EXTRACTION_URL not set, field extraction uses pattern rules only");
            FieldExtractor::rules_only()
        }
    };

    Some(Arc::new(CertificateParser::new(
        ocr,
        extractor,
        detector,
        RegionCropper::new(&config.artifacts_dir),
    )))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
