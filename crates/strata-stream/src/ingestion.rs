//! Remote ingestion-controller submission.
//!
//! Writes against a streaming table are finalized by handing the controller a
//! JSON supervisor document describing schema, tuning, and source-connection
//! parameters. Submission is a synchronous POST from the caller's
//! perspective; a 200-class response is acceptance, anything else is a
//! failure carrying the status and body. The protocol never retries — retry
//! policy belongs to the caller.

use std::collections::BTreeMap;

use serde::Serialize;

use strata_core::descriptor::TableDescriptor;
use strata_core::error::{Error, Result};

use crate::parser::RowParserSpec;
use crate::properties;

/// Column entry within the ingestion data schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,
    /// Logical type name.
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Schema section of the supervisor document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSchema {
    /// Ingestion source name; the table name by convention.
    pub source: String,
    /// Column holding the event timestamp.
    pub timestamp_column: String,
    /// Ingested columns in table order.
    pub columns: Vec<ColumnSchema>,
    /// Row-parser configuration.
    pub parser: RowParserSpec,
}

/// Tuning section of the supervisor document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TuningConfig {
    /// Maximum rows buffered in memory before a persist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rows_in_memory: Option<u64>,
}

/// Source-connection section of the supervisor document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IoConfig {
    /// Source topic.
    pub topic: String,
    /// Broker list.
    pub brokers: String,
    /// Consumer properties passed through verbatim (secrets excluded).
    pub consumer_properties: BTreeMap<String, String>,
    /// Number of parallel ingestion tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_count: Option<u64>,
    /// Replicas per ingestion task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u64>,
    /// Whether consumption starts at the earliest retained offset.
    pub use_earliest_offset: bool,
}

/// The JSON document submitted to the remote ingestion controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorSpec {
    /// Schema section.
    pub data_schema: DataSchema,
    /// Tuning section.
    pub tuning: TuningConfig,
    /// Source-connection section.
    pub io_config: IoConfig,
}

impl SupervisorSpec {
    /// Builds the supervisor document from table metadata.
    ///
    /// Pure function of the descriptor: equal descriptors yield equal specs,
    /// which is what makes re-submission safe.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the topic, brokers, or a usable
    /// timestamp column is missing, or when the parser configuration is
    /// invalid.
    pub fn from_table(table: &TableDescriptor) -> Result<Self> {
        let topic = require_property(table, properties::SOURCE_TOPIC)?;
        let brokers = require_property(table, properties::SOURCE_BROKERS)?;
        let parser = RowParserSpec::from_table(table)?;

        let timestamp_column = match table.property(properties::TIMESTAMP_COLUMN) {
            Some(column) => column.to_string(),
            None => table
                .columns()
                .first()
                .map(|c| c.name.clone())
                .ok_or_else(|| {
                    Error::configuration(format!(
                        "table '{}' has no columns and no '{}' property",
                        table.name(),
                        properties::TIMESTAMP_COLUMN
                    ))
                })?,
        };

        Ok(Self {
            data_schema: DataSchema {
                source: table.name().to_string(),
                timestamp_column,
                columns: table
                    .columns()
                    .iter()
                    .map(|c| ColumnSchema {
                        name: c.name.clone(),
                        type_name: c.type_name.clone(),
                    })
                    .collect(),
                parser,
            },
            tuning: TuningConfig {
                max_rows_in_memory: table.u64_property(properties::TUNING_MAX_ROWS_IN_MEMORY)?,
            },
            io_config: IoConfig {
                topic,
                brokers,
                consumer_properties: consumer_properties(table),
                task_count: table.u64_property(properties::TUNING_TASK_COUNT)?,
                replicas: table.u64_property(properties::TUNING_REPLICAS)?,
                use_earliest_offset: table
                    .bool_property(properties::TUNING_USE_EARLIEST_OFFSET, false)?,
            },
        })
    }
}

/// Whether a table is streaming-backed.
///
/// Streaming tables are marked by the presence of the source-topic property.
#[must_use]
pub fn is_streaming_table(table: &TableDescriptor) -> bool {
    table.property(properties::SOURCE_TOPIC).is_some()
}

/// Submits a supervisor document to the controller endpoint.
///
/// # Errors
///
/// Returns [`Error::RemoteSubmission`] carrying the status code and response
/// body for any non-success response, and [`Error::Internal`] when the
/// request cannot be sent at all.
pub async fn submit_supervisor_spec(endpoint: &str, spec: &SupervisorSpec) -> Result<()> {
    let client = build_client()?;
    submit_with_client(&client, endpoint, spec).await
}

/// Submits a supervisor document using a caller-provided HTTP client.
///
/// # Errors
///
/// Same contract as [`submit_supervisor_spec`].
pub async fn submit_with_client(
    client: &reqwest::Client,
    endpoint: &str,
    spec: &SupervisorSpec,
) -> Result<()> {
    tracing::info!(
        source = %spec.data_schema.source,
        endpoint,
        "submitting ingestion supervisor spec"
    );

    let response = client
        .post(endpoint)
        .json(spec)
        .send()
        .await
        .map_err(|e| Error::internal(format!("ingestion submission request failed: {e}")))?;

    let status = response.status();
    if status.is_success() {
        tracing::info!(source = %spec.data_schema.source, "supervisor spec accepted");
        return Ok(());
    }

    let body = read_rejection_body(response).await;
    Err(Error::remote_submission(status.as_u16(), body))
}

/// Asks the controller to terminate the supervisor for `source`.
///
/// # Errors
///
/// Same contract as [`submit_supervisor_spec`].
pub async fn terminate_supervisor(endpoint: &str, source: &str) -> Result<()> {
    let client = build_client()?;
    let url = format!("{}/{source}/terminate", endpoint.trim_end_matches('/'));

    let response = client
        .post(&url)
        .send()
        .await
        .map_err(|e| Error::internal(format!("supervisor termination request failed: {e}")))?;

    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = read_rejection_body(response).await;
    Err(Error::remote_submission(status.as_u16(), body))
}

// A rejection whose body cannot be read still carries the failure inline
// instead of reporting an empty body.
async fn read_rejection_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|e| format!("<body unavailable: {e}>"))
}

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| Error::internal(format!("failed to build HTTP client: {e}")))
}

fn require_property(table: &TableDescriptor, key: &str) -> Result<String> {
    table.property(key).map(str::to_string).ok_or_else(|| {
        Error::configuration(format!(
            "streaming table '{}' is missing required property '{key}'",
            table.name()
        ))
    })
}

// Secrets travel through the credential path, never through the spec.
fn consumer_properties(table: &TableDescriptor) -> BTreeMap<String, String> {
    table
        .properties_with_prefix(properties::CONSUMER_PREFIX)
        .into_iter()
        .filter(|(key, _)| {
            !format!("{}{key}", properties::CONSUMER_PREFIX)
                .starts_with(properties::CONSUMER_SECRET_PREFIX)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::descriptor::TableName;

    fn streaming_table() -> TableDescriptor {
        TableDescriptor::builder(TableName::new("metrics", "events"))
            .column("ts", "timestamp")
            .column("v", "double")
            .property(properties::SOURCE_TOPIC, "events")
            .property(properties::SOURCE_BROKERS, "broker-1:9092,broker-2:9092")
            .property(properties::TUNING_TASK_COUNT, "4")
            .property(properties::CONSUMER_PREFIX.to_string() + "group.id", "strata")
            .property(
                properties::CONSUMER_SECRET_PREFIX.to_string() + "sasl.password",
                "hunter2",
            )
            .build()
    }

    #[test]
    fn test_spec_from_table_is_deterministic() {
        let table = streaming_table();
        let first = SupervisorSpec::from_table(&table).expect("spec");
        let second = SupervisorSpec::from_table(&table).expect("spec");
        assert_eq!(first, second);
    }

    #[test]
    fn test_spec_carries_topic_brokers_and_columns() {
        let spec = SupervisorSpec::from_table(&streaming_table()).expect("spec");
        assert_eq!(spec.io_config.topic, "events");
        assert_eq!(spec.io_config.brokers, "broker-1:9092,broker-2:9092");
        assert_eq!(spec.io_config.task_count, Some(4));
        assert_eq!(spec.data_schema.source, "metrics.events");
        assert_eq!(spec.data_schema.timestamp_column, "ts");
        assert_eq!(spec.data_schema.columns.len(), 2);
    }

    #[test]
    fn test_consumer_secrets_never_enter_the_spec() {
        let spec = SupervisorSpec::from_table(&streaming_table()).expect("spec");
        assert_eq!(
            spec.io_config.consumer_properties.get("group.id").map(String::as_str),
            Some("strata")
        );
        assert!(spec
            .io_config
            .consumer_properties
            .keys()
            .all(|k| !k.contains("secret")));
        let rendered = serde_json::to_string(&spec).expect("serialize");
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_missing_topic_is_a_configuration_error() {
        let table = TableDescriptor::builder(TableName::new("metrics", "events"))
            .column("ts", "timestamp")
            .property(properties::SOURCE_BROKERS, "broker-1:9092")
            .build();
        let err = SupervisorSpec::from_table(&table).expect_err("no topic");
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_is_streaming_table_keys_off_the_topic() {
        assert!(is_streaming_table(&streaming_table()));
        let plain = TableDescriptor::builder(TableName::new("db", "t")).build();
        assert!(!is_streaming_table(&plain));
    }
}
