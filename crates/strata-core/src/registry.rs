//! Typed storage-handler registry.
//!
//! A table is bound to a storage engine by a string identifier. The registry
//! maps that identifier to one shared handler instance, produced by a factory
//! that is validated at registration time rather than at first use. The
//! binding identifier plus prefix-namespaced table properties are the entire
//! external configuration surface; no other side channel exists.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::handler::StorageHandler;

/// Factory producing a handler instance for one registered engine name.
pub type HandlerFactory = Box<dyn Fn() -> Arc<dyn StorageHandler> + Send + Sync>;

/// Resolves storage-engine names to bound handler instances.
///
/// One instance is created per registered name and shared across all query
/// compilations that bind to it, which is why every handler method must be
/// concurrency-safe and argument-derived.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn StorageHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a storage engine under `name`.
    ///
    /// The factory is invoked once, immediately, and the produced instance is
    /// probed for its mandatory capabilities so a broken implementation fails
    /// here instead of at first use inside some compilation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the name is empty or already
    /// registered. Mandatory-capability probes surface the instance's own
    /// errors.
    pub fn register(&mut self, name: impl Into<String>, factory: HandlerFactory) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::configuration(
                "storage handler name must be non-empty",
            ));
        }
        if self.handlers.contains_key(&name) {
            return Err(Error::configuration(format!(
                "storage handler '{name}' is already registered"
            )));
        }

        let handler = factory();
        Self::validate(&name, handler.as_ref())?;

        tracing::debug!(handler = %name, "registered storage handler");
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Resolves the handler bound to `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for unknown names; the statement that
    /// referenced the binding aborts at compile time.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn StorageHandler>> {
        self.handlers.get(name).cloned().ok_or_else(|| {
            Error::configuration(format!("unknown storage handler '{name}'"))
        })
    }

    /// Returns the registered engine names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    // Mandatory capabilities only; optional groups are allowed to be absent.
    fn validate(name: &str, handler: &dyn StorageHandler) -> Result<()> {
        for (what, id) in [
            ("row format reader", handler.row_format_reader()),
            ("row format writer", handler.row_format_writer()),
            ("row encoder/decoder", handler.row_encoder_decoder()),
        ] {
            if id.as_str().trim().is_empty() {
                return Err(Error::configuration(format!(
                    "storage handler '{name}' declares an empty {what} identifier"
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("names", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
