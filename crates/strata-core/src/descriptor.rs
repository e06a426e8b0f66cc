//! Immutable table metadata snapshots.
//!
//! A [`TableDescriptor`] is created by the catalog at compile time and handed
//! read-only to storage-handler calls. Handlers derive job configuration from
//! it; they never mutate it. Metadata changes go through the catalog, not
//! through the propagation methods.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// Fully qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableName {
    /// Database (schema) the table lives in.
    pub database: String,
    /// Table name within the database.
    pub table: String,
}

impl TableName {
    /// Creates a table name.
    #[must_use]
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}

/// A single column definition within a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Logical type name as recorded by the catalog (e.g. `bigint`).
    pub type_name: String,
}

impl ColumnDescriptor {
    /// Creates a column descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Stable identifier for a row-format reader, writer, or encoder
/// implementation.
///
/// Identifiers are opaque to the engine; they only need to be non-empty and
/// stable across releases of the storage handler that declares them.
/// Non-emptiness is enforced when the handler is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatId(String);

impl FormatId {
    /// Creates a format identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable snapshot of one table's metadata.
///
/// Equality is content equality: two descriptors built from the same catalog
/// state compare equal, which is what the idempotence contract for job
/// configuration is defined against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    name: TableName,
    columns: Vec<ColumnDescriptor>,
    properties: BTreeMap<String, String>,
}

impl TableDescriptor {
    /// Starts building a descriptor for the given table.
    #[must_use]
    pub fn builder(name: TableName) -> TableDescriptorBuilder {
        TableDescriptorBuilder {
            name,
            columns: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Returns the fully qualified table name.
    #[must_use]
    pub fn name(&self) -> &TableName {
        &self.name
    }

    /// Returns the ordered column definitions.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Returns all table properties.
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Looks up a single property value.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Parses a boolean property, falling back to `default` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the value is present but is not
    /// `true` or `false`.
    pub fn bool_property(&self, key: &str, default: bool) -> Result<bool> {
        match self.property(key) {
            None => Ok(default),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(Error::configuration(format!(
                    "property '{key}' must be 'true' or 'false', got '{other}'"
                ))),
            },
        }
    }

    /// Parses an unsigned integer property.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the value is present but does
    /// not parse as an unsigned integer.
    pub fn u64_property(&self, key: &str) -> Result<Option<u64>> {
        match self.property(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<u64>().map(Some).map_err(|_| {
                Error::configuration(format!(
                    "property '{key}' must be an unsigned integer, got '{raw}'"
                ))
            }),
        }
    }

    /// Splits a comma-separated list property into trimmed entries.
    ///
    /// Returns `None` when the property is absent; an empty value yields an
    /// empty list.
    #[must_use]
    pub fn list_property(&self, key: &str) -> Option<Vec<String>> {
        self.property(key).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    /// Returns all properties whose keys start with `prefix`, with the prefix
    /// stripped.
    ///
    /// The binding identifier plus prefix-namespaced properties are the whole
    /// external configuration surface of a storage engine, so prefix scans
    /// are the standard way handlers pick up their own settings.
    #[must_use]
    pub fn properties_with_prefix(&self, prefix: &str) -> BTreeMap<String, String> {
        self.properties
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(prefix)
                    .map(|stripped| (stripped.to_string(), v.clone()))
            })
            .collect()
    }
}

/// Builder for [`TableDescriptor`].
#[derive(Debug)]
pub struct TableDescriptorBuilder {
    name: TableName,
    columns: Vec<ColumnDescriptor>,
    properties: BTreeMap<String, String>,
}

impl TableDescriptorBuilder {
    /// Appends a column definition.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.columns.push(ColumnDescriptor::new(name, type_name));
        self
    }

    /// Sets a table property.
    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Finalizes the immutable descriptor.
    #[must_use]
    pub fn build(self) -> TableDescriptor {
        TableDescriptor {
            name: self.name,
            columns: self.columns,
            properties: self.properties,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> TableDescriptor {
        TableDescriptor::builder(TableName::new("metrics", "events"))
            .column("ts", "timestamp")
            .column("v", "double")
            .property("streaming.source.topic", "events")
            .property("streaming.parse.columns", "ts, v")
            .property("streaming.tuning.task.count", "4")
            .property("flag", "true")
            .build()
    }

    #[test]
    fn test_property_lookup() {
        let d = descriptor();
        assert_eq!(d.property("streaming.source.topic"), Some("events"));
        assert_eq!(d.property("missing"), None);
    }

    #[test]
    fn test_bool_property_default_and_parse() {
        let d = descriptor();
        assert!(d.bool_property("flag", false).expect("parse"));
        assert!(!d.bool_property("missing", false).expect("default"));
    }

    #[test]
    fn test_bool_property_rejects_garbage() {
        let d = TableDescriptor::builder(TableName::new("db", "t"))
            .property("flag", "yes")
            .build();
        let err = d.bool_property("flag", false).expect_err("must fail");
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_u64_property() {
        let d = descriptor();
        assert_eq!(
            d.u64_property("streaming.tuning.task.count").expect("parse"),
            Some(4)
        );
        assert_eq!(d.u64_property("missing").expect("absent"), None);
    }

    #[test]
    fn test_list_property_trims_entries() {
        let d = descriptor();
        assert_eq!(
            d.list_property("streaming.parse.columns"),
            Some(vec!["ts".to_string(), "v".to_string()])
        );
    }

    #[test]
    fn test_properties_with_prefix_strips_prefix() {
        let d = descriptor();
        let tuning = d.properties_with_prefix("streaming.tuning.");
        assert_eq!(tuning.get("task.count").map(String::as_str), Some("4"));
        assert_eq!(tuning.len(), 1);
    }

    #[test]
    fn test_format_id_round_trips() {
        assert_eq!(FormatId::new("stream-reader").as_str(), "stream-reader");
    }

    #[test]
    fn test_descriptor_equality_is_content_equality() {
        assert_eq!(descriptor(), descriptor());
    }
}
