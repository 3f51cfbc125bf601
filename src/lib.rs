pub mod backend;
pub mod bus;
pub mod chat;
pub mod config;
pub mod directive;
pub mod errors;
pub mod page;
pub mod shell;

use std::sync::{Arc, Mutex};

use tokio::io::BufReader;

use crate::backend::http::HttpQueryBackend;
use crate::bus::extension::ExtensionBus;
use crate::chat::controller::ChatSessionController;
use crate::config::{AppConfig, PageConfig};
use crate::errors::PageHintResult;
use crate::page::applier::{HighlightListener, PageActionApplier};
use crate::page::document::StaticDocument;

/// Wire the popup, the bus and the content script together and run a chat session on stdin/stdout.
pub async fn run() -> PageHintResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    let mut cfg = match config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %e, "no usable config; using defaults");
            AppConfig::default()
        }
    };
    cfg.apply_env_overrides();

    // Content-script context: the page document and its listener.
    let document = Arc::new(Mutex::new(load_document(&cfg.page)));
    let bus = ExtensionBus::from_config(&cfg.bus);
    let port = bus.attach_content_script();
    tracing::info!(listener = port.id(), "content script listening");
    let listener = port.receive(HighlightListener::new(
        PageActionApplier::from_config(&cfg.highlight),
        document,
    ));

    // Popup context.
    let backend = Arc::new(HttpQueryBackend::from_config(&cfg.backend));
    tracing::info!(endpoint = %backend.endpoint(), "backend configured");
    let mut controller = ChatSessionController::new(backend, Arc::new(bus.clone()))
        .with_fallback_reply(cfg.chat.fallback_reply.clone());
    let indicator = shell::spawn_pending_indicator(controller.subscribe(), tokio::io::stderr());

    let result = shell::run_popup(
        &mut controller,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await;

    drop(controller);
    bus.detach_content_script();
    let _ = indicator.await;
    let _ = listener.await;
    result
}

/// The configured page snapshot, or an empty document when none is set or it cannot be read.
fn load_document(cfg: &PageConfig) -> StaticDocument {
    let Some(path) = &cfg.snapshot else {
        return StaticDocument::default();
    };
    match StaticDocument::load(path) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "page snapshot unusable; starting with an empty page"
            );
            StaticDocument::default()
        }
    }
}
