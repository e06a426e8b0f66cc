//! Table property keys recognized by the streaming storage handler.
//!
//! The binding identifier plus these namespaced keys are the engine's entire
//! configuration surface. Everything lives under the `streaming.` prefix so
//! the handler can pick up its own settings with a single prefix scan.

/// Prefix shared by every property this handler recognizes.
pub const PREFIX: &str = "streaming.";

/// Source topic. Presence of this key marks a table as streaming-backed.
pub const SOURCE_TOPIC: &str = "streaming.source.topic";

/// Broker list for the streaming source.
pub const SOURCE_BROKERS: &str = "streaming.source.brokers";

/// Row-parsing format selector: `json`, `delimited`, or `binary`.
pub const PARSE_FORMAT: &str = "streaming.parse.format";

/// Comma-separated column list for the delimited format.
pub const PARSE_COLUMNS: &str = "streaming.parse.columns";

/// Field delimiter for the delimited format.
pub const PARSE_DELIMITER: &str = "streaming.parse.delimiter";

/// Delimiter for list-valued fields within the delimited format.
pub const PARSE_LIST_DELIMITER: &str = "streaming.parse.list.delimiter";

/// Whether delimited input carries header rows.
pub const PARSE_HAS_HEADER: &str = "streaming.parse.header";

/// How many leading header rows to skip in delimited input.
pub const PARSE_SKIP_HEADER_ROWS: &str = "streaming.parse.skip.header.rows";

/// Inline schema document required by the binary format.
pub const PARSE_SCHEMA: &str = "streaming.parse.schema";

/// Column holding the event timestamp.
pub const TIMESTAMP_COLUMN: &str = "streaming.timestamp.column";

/// Endpoint of the remote ingestion controller.
pub const CONTROLLER_ENDPOINT: &str = "streaming.controller.endpoint";

/// Number of parallel ingestion tasks.
pub const TUNING_TASK_COUNT: &str = "streaming.tuning.task.count";

/// Number of replicas per ingestion task.
pub const TUNING_REPLICAS: &str = "streaming.tuning.replicas";

/// Maximum rows buffered in memory before a persist.
pub const TUNING_MAX_ROWS_IN_MEMORY: &str = "streaming.tuning.max.rows.in.memory";

/// Whether consumption starts from the earliest retained offset.
pub const TUNING_USE_EARLIEST_OFFSET: &str = "streaming.tuning.use.earliest.offset";

/// Prefix for consumer properties passed through to the source verbatim.
pub const CONSUMER_PREFIX: &str = "streaming.consumer.";

/// Prefix for consumer secrets, routed through the credential path only.
pub const CONSUMER_SECRET_PREFIX: &str = "streaming.consumer.secret.";
