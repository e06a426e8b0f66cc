//! Row-parser selection from table properties.
//!
//! One table property selects among a small closed set of row-parsing
//! formats. An unrecognized selector is a configuration error, and the
//! schema-carrying binary format additionally requires an inline schema
//! property.

use strata_core::descriptor::TableDescriptor;
use strata_core::error::{Error, Result};

use crate::properties;

/// Format selector value for structured JSON input.
pub const FORMAT_JSON: &str = "json";
/// Format selector value for delimited text input.
pub const FORMAT_DELIMITED: &str = "delimited";
/// Format selector value for schema-carrying binary input.
pub const FORMAT_BINARY: &str = "binary";

/// Fully resolved configuration for one table's row parser.
///
/// Serializes into the `parser` section of the ingestion supervisor
/// document, tagged by format.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "format", rename_all = "camelCase")]
pub enum RowParserSpec {
    /// Structured JSON rows; field names come from the payload itself.
    Json,
    /// Delimited text rows with optional header handling.
    #[serde(rename_all = "camelCase")]
    Delimited {
        /// Field names in payload order; no substitution or reordering.
        columns: Vec<String>,
        /// Field delimiter.
        delimiter: String,
        /// Delimiter for list-valued fields, when distinct.
        list_delimiter: Option<String>,
        /// Whether the input carries header rows.
        has_header_rows: bool,
        /// Leading header rows to skip.
        skip_header_rows: u64,
    },
    /// Binary rows decoded against an inline schema document.
    InlineSchemaBinary {
        /// The schema document, parsed from the inline property.
        schema: serde_json::Value,
    },
}

impl RowParserSpec {
    /// Resolves the parser configuration for a table.
    ///
    /// An absent selector defaults to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unrecognized selector, a
    /// delimited table without a column list, or a binary table without the
    /// inline schema property.
    pub fn from_table(table: &TableDescriptor) -> Result<Self> {
        let selector = table
            .property(properties::PARSE_FORMAT)
            .unwrap_or(FORMAT_JSON)
            .trim()
            .to_ascii_lowercase();

        match selector.as_str() {
            FORMAT_JSON => Ok(Self::Json),
            FORMAT_DELIMITED => Self::delimited_from_table(table),
            FORMAT_BINARY => Self::binary_from_table(table),
            other => Err(Error::configuration(format!(
                "unrecognized row format '{other}' in property '{}'; \
                 supported formats are: {FORMAT_JSON}, {FORMAT_DELIMITED}, {FORMAT_BINARY}",
                properties::PARSE_FORMAT
            ))),
        }
    }

    fn delimited_from_table(table: &TableDescriptor) -> Result<Self> {
        let columns = table
            .list_property(properties::PARSE_COLUMNS)
            .filter(|cols| !cols.is_empty())
            .ok_or_else(|| {
                Error::configuration(format!(
                    "delimited row format requires a column list in property '{}'",
                    properties::PARSE_COLUMNS
                ))
            })?;

        let delimiter = table
            .property(properties::PARSE_DELIMITER)
            .unwrap_or("\t")
            .to_string();

        Ok(Self::Delimited {
            columns,
            delimiter,
            list_delimiter: table
                .property(properties::PARSE_LIST_DELIMITER)
                .map(str::to_string),
            has_header_rows: table.bool_property(properties::PARSE_HAS_HEADER, false)?,
            skip_header_rows: table
                .u64_property(properties::PARSE_SKIP_HEADER_ROWS)?
                .unwrap_or(0),
        })
    }

    fn binary_from_table(table: &TableDescriptor) -> Result<Self> {
        let raw = table.property(properties::PARSE_SCHEMA).ok_or_else(|| {
            Error::configuration(format!(
                "binary row format requires an inline schema in property '{}'",
                properties::PARSE_SCHEMA
            ))
        })?;

        let schema: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
            Error::configuration(format!(
                "inline schema in property '{}' is not valid JSON: {e}",
                properties::PARSE_SCHEMA
            ))
        })?;

        Ok(Self::InlineSchemaBinary { schema })
    }
}
