//! Observability infrastructure for the protocol layer.
//!
//! Structured logging with consistent spans: one span per handler operation,
//! carrying the bound engine name and the table it acts on.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at startup. Safe to call multiple times; subsequent calls are
/// no-ops. `RUST_LOG` controls levels (e.g. `info`, `strata_core=debug`).
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for one storage-handler operation.
#[must_use]
pub fn handler_span(operation: &str, engine: &str, database: &str, table: &str) -> Span {
    tracing::info_span!(
        "storage_handler",
        op = operation,
        engine = engine,
        database = database,
        table = table,
    )
}
