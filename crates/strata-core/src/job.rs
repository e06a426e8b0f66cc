//! Job-scoped configuration and secret accumulators.
//!
//! Each job submission owns one [`JobProperties`] and one [`Credentials`]
//! accumulator. Storage handlers never receive them mutably; directional
//! configuration calls return an immutable [`ConfigDelta`] that the engine
//! merges here. This keeps the additive-only contract structural: there is no
//! way for a handler to remove an entry the engine placed.

use std::collections::BTreeMap;
use std::fmt;

use crate::descriptor::TableDescriptor;
use crate::error::Result;
use crate::handler::StorageHandler;

/// An immutable key/value delta produced by one configuration call.
///
/// Deltas are pure functions of the table descriptor they were derived from:
/// equal descriptors must produce equal deltas, on every invocation, in every
/// process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDelta {
    entries: BTreeMap<String, String>,
}

impl ConfigDelta {
    /// Creates an empty delta.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry to the delta.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Returns true when the delta carries no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the entries as a map.
    #[must_use]
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

/// Additive configuration accumulator for one job submission.
///
/// There is deliberately no removal API. Duplicate keys are resolved
/// last-writer-wins; a differing overwrite is surfaced as a warning because
/// it usually means an engine implements only the legacy combined
/// configuration method and returned conflicting values for the input and
/// output directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobProperties {
    entries: BTreeMap<String, String>,
}

impl JobProperties {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a single entry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Looks up an entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges a delta, last-writer-wins.
    ///
    /// An overwrite that changes an existing value is logged at `warn`;
    /// re-setting a key to the identical value is silent, since idempotent
    /// re-invocation is part of the configuration contract.
    pub fn merge(&mut self, delta: &ConfigDelta) {
        for (key, value) in delta.iter() {
            if let Some(existing) = self.entries.get(key) {
                if existing != value {
                    tracing::warn!(
                        key,
                        "duplicate job property key; keeping last-written value"
                    );
                }
            }
            self.entries.insert(key.to_string(), value.to_string());
        }
    }

    /// Iterates over the entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Additive secret accumulator for one job submission.
///
/// Kept separate from [`JobProperties`] so secrets never travel through the
/// plaintext configuration path. `Debug` output redacts values.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    entries: BTreeMap<String, String>,
}

impl Credentials {
    /// Creates an empty credential set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a secret entry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Looks up a secret.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of secrets held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no secrets are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges another credential set, last-writer-wins.
    ///
    /// A differing overwrite is logged at `warn` by key only; values never
    /// reach the log.
    pub fn merge(&mut self, other: &Credentials) {
        for (key, value) in &other.entries {
            if let Some(existing) = self.entries.get(key) {
                if existing != value {
                    tracing::warn!(
                        key = key.as_str(),
                        "duplicate credential key; keeping last-written value"
                    );
                }
            }
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Iterates over the secret keys (not values) in key order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted: BTreeMap<&str, &str> = self
            .entries
            .keys()
            .map(|k| (k.as_str(), "<redacted>"))
            .collect();
        f.debug_struct("Credentials").field("entries", &redacted).finish()
    }
}

/// The live configuration object handed to the final pre-submission hook.
///
/// Unlike the directional calls, `configure_job_conf` mutates this in place:
/// it is the last point at which an engine can inject arbitrary
/// configuration before the job is handed to the distributed executor.
#[derive(Debug, Default)]
pub struct JobConfiguration {
    /// Plaintext configuration entries.
    pub properties: JobProperties,
    /// Secret material, kept out of the plaintext path.
    pub credentials: Credentials,
}

impl JobConfiguration {
    /// Creates an empty job configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Assembles the input-side configuration for one job submission.
///
/// Drives the handler's directional input call, merges the resulting delta
/// into `properties`, and populates `credentials`. Legacy-only engines are
/// handled transparently: the directional trait defaults route through the
/// combined legacy method, so this function never needs to know which form
/// the engine implements.
///
/// # Errors
///
/// Propagates any error from the handler's configuration methods; errors are
/// never swallowed and abort the current submit step.
pub fn assemble_input_configuration(
    handler: &dyn StorageHandler,
    table: &TableDescriptor,
    properties: &mut JobProperties,
    credentials: &mut Credentials,
) -> Result<()> {
    let delta = handler.configure_input_job_properties(table)?;
    properties.merge(&delta);

    let secrets = handler.configure_input_job_credentials(table)?;
    credentials.merge(&secrets);
    Ok(())
}

/// Assembles the output-side configuration for one job submission.
///
/// # Errors
///
/// Propagates any error from the handler's configuration methods.
pub fn assemble_output_configuration(
    handler: &dyn StorageHandler,
    table: &TableDescriptor,
    properties: &mut JobProperties,
) -> Result<()> {
    let delta = handler.configure_output_job_properties(table)?;
    properties.merge(&delta);
    Ok(())
}
