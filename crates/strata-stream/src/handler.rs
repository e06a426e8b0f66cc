//! The streaming storage handler.
//!
//! Binds a table to an external streaming-analytics store fed by a remote
//! ingestion controller. Reads are served from the store's segments; writes
//! are finalized by submitting a supervisor document instead of moving staged
//! files, so the handler opts into the engine-owned commit path and accepts
//! its reduced atomicity.

use std::sync::Arc;

use async_trait::async_trait;

use strata_core::descriptor::{FormatId, TableDescriptor};
use strata_core::error::{Error, Result};
use strata_core::handler::{
    AlterOperation, CommitProperties, CommitSupport, JoinFilterPredicate, LockType, MetaHook,
    StorageHandler, StorageHandlerInfo, WriteEntity, DEFAULT_ALLOWED_ALTER_OPS,
};
use strata_core::job::{ConfigDelta, Credentials, JobConfiguration};
use strata_core::transform::{PartitionTransform, PartitionTransformSpec};

use crate::ingestion::{self, SupervisorSpec};
use crate::parser::RowParserSpec;
use crate::properties;

/// Storage handler for streaming-ingestion tables.
pub struct StreamingStorageHandler {
    commit: StreamingCommit,
    hook: Arc<StreamingMetaHook>,
}

impl StreamingStorageHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            commit: StreamingCommit,
            hook: Arc::new(StreamingMetaHook),
        }
    }

    fn timestamp_column(table: &TableDescriptor) -> Option<String> {
        table
            .property(properties::TIMESTAMP_COLUMN)
            .map(str::to_string)
            .or_else(|| table.columns().first().map(|c| c.name.clone()))
    }
}

impl Default for StreamingStorageHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageHandler for StreamingStorageHandler {
    fn row_format_reader(&self) -> FormatId {
        FormatId::new("strata.stream.SegmentRecordReader")
    }

    fn row_format_writer(&self) -> FormatId {
        FormatId::new("strata.stream.SegmentRecordWriter")
    }

    fn row_encoder_decoder(&self) -> FormatId {
        FormatId::new("strata.stream.StreamRowCodec")
    }

    fn meta_hook(&self) -> Option<Arc<dyn MetaHook>> {
        Some(self.hook.clone())
    }

    fn configure_input_job_properties(&self, table: &TableDescriptor) -> Result<ConfigDelta> {
        let mut delta = public_streaming_properties(table);
        delta.set("streaming.job.direction", "input");
        Ok(delta)
    }

    fn configure_output_job_properties(&self, table: &TableDescriptor) -> Result<ConfigDelta> {
        let mut delta = public_streaming_properties(table);
        delta.set("streaming.job.direction", "output");
        Ok(delta)
    }

    fn configure_input_job_credentials(&self, table: &TableDescriptor) -> Result<Credentials> {
        let mut creds = Credentials::new();
        for (key, value) in table.properties_with_prefix(properties::CONSUMER_SECRET_PREFIX) {
            creds.set(format!("{}{key}", properties::CONSUMER_PREFIX), value);
        }
        Ok(creds)
    }

    fn configure_job_conf(
        &self,
        table: &TableDescriptor,
        conf: &mut JobConfiguration,
    ) -> Result<()> {
        // Last chance to pin the entries tasks cannot run without.
        if let Some(topic) = table.property(properties::SOURCE_TOPIC) {
            conf.properties.set(properties::SOURCE_TOPIC, topic);
        }
        if let Some(brokers) = table.property(properties::SOURCE_BROKERS) {
            conf.properties.set(properties::SOURCE_BROKERS, brokers);
        }
        Ok(())
    }

    // Segments tolerate column renames; widen the default gate by one.
    fn is_allowed_alter_operation(&self, op: AlterOperation) -> bool {
        DEFAULT_ALLOWED_ALTER_OPS.contains(&op) || op == AlterOperation::RenameColumns
    }

    // Appends go through the ingestion controller, not through files held by
    // other writers.
    fn lock_type(&self, _entity: &WriteEntity) -> LockType {
        LockType::Shared
    }

    fn supports_dynamic_split_pruning(
        &self,
        table: &TableDescriptor,
        predicate: &JoinFilterPredicate,
    ) -> bool {
        // Segments are time-indexed; only timestamp predicates prune, and
        // only for tables actually backed by the streaming store.
        ingestion::is_streaming_table(table)
            && Self::timestamp_column(table).is_some_and(|ts| ts == predicate.target_column)
    }

    fn storage_handler_info(&self, table: &TableDescriptor) -> Result<Option<StorageHandlerInfo>> {
        if !ingestion::is_streaming_table(table) {
            return Ok(None);
        }

        let mut info = StorageHandlerInfo::new("streaming ingestion table");
        if let Some(topic) = table.property(properties::SOURCE_TOPIC) {
            info = info.with_entry("source.topic", topic);
        }
        if let Some(endpoint) = table.property(properties::CONTROLLER_ENDPOINT) {
            info = info.with_entry("controller.endpoint", endpoint);
        }
        Ok(Some(info))
    }

    // Segment layout stores the partition value inline with the data.
    fn always_unpartitioned(&self) -> bool {
        true
    }

    fn supports_partition_transform(&self) -> bool {
        true
    }

    fn partition_transform_spec(
        &self,
        table: &TableDescriptor,
    ) -> Option<Vec<PartitionTransformSpec>> {
        if !ingestion::is_streaming_table(table) {
            return None;
        }
        // Segments are day-partitioned on the event timestamp.
        Self::timestamp_column(table)
            .map(|ts| vec![PartitionTransformSpec::new(ts, PartitionTransform::Day)])
    }

    fn file_format_property_key(&self) -> Option<&str> {
        Some(properties::PARSE_FORMAT)
    }

    fn commit_support(&self) -> Option<&dyn CommitSupport> {
        Some(&self.commit)
    }
}

// Public (non-secret) streaming properties, copied verbatim so distributed
// tasks see exactly what the table declares.
fn public_streaming_properties(table: &TableDescriptor) -> ConfigDelta {
    let mut delta = ConfigDelta::new();
    for (key, value) in table.properties() {
        if key.starts_with(properties::PREFIX)
            && !key.starts_with(properties::CONSUMER_SECRET_PREFIX)
        {
            delta.set(key.clone(), value.clone());
        }
    }
    delta
}

/// Commit contract: the handler owns table creation and commit.
struct StreamingCommit;

#[async_trait]
impl CommitSupport for StreamingCommit {
    fn direct_insert_ctas(&self) -> bool {
        true
    }

    fn commit_in_move_task(&self) -> bool {
        true
    }

    async fn commit(
        &self,
        table: &TableDescriptor,
        _properties: &CommitProperties,
        overwrite: bool,
    ) -> Result<()> {
        let endpoint = table
            .property(properties::CONTROLLER_ENDPOINT)
            .ok_or_else(|| {
                Error::configuration(format!(
                    "streaming table '{}' is missing required property '{}'",
                    table.name(),
                    properties::CONTROLLER_ENDPOINT
                ))
            })?;

        let spec = SupervisorSpec::from_table(table)?;
        tracing::info!(table = %table.name(), overwrite, "committing via ingestion controller");
        ingestion::submit_supervisor_spec(endpoint, &spec).await
    }
}

/// Keeps the ingestion controller in sync with the engine's catalog.
struct StreamingMetaHook;

#[async_trait]
impl MetaHook for StreamingMetaHook {
    async fn pre_create_table(&self, table: &TableDescriptor) -> Result<()> {
        if !ingestion::is_streaming_table(table) {
            return Ok(());
        }
        // Fail the create at compile time if the table could never ingest.
        RowParserSpec::from_table(table)?;
        SupervisorSpec::from_table(table)?;
        Ok(())
    }

    async fn commit_drop_table(&self, table: &TableDescriptor, delete_data: bool) -> Result<()> {
        if !delete_data || !ingestion::is_streaming_table(table) {
            return Ok(());
        }

        let Some(endpoint) = table.property(properties::CONTROLLER_ENDPOINT) else {
            return Ok(());
        };

        // Best-effort: the engine's catalog entry is already gone, so a
        // controller that cannot be reached must not fail the drop.
        let source = table.name().to_string();
        if let Err(err) = ingestion::terminate_supervisor(endpoint, &source).await {
            tracing::warn!(table = %source, %err, "failed to terminate ingestion supervisor");
        }
        Ok(())
    }
}
