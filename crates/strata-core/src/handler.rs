//! The storage-handler contract.
//!
//! A storage handler binds one table to one external storage engine. The
//! engine's planner queries the handler at compile time to shape the plan,
//! drives job configuration through it at submission time, and hands off to
//! it at commit time.
//!
//! # Design
//!
//! Mandatory operations (row formats, metadata hook, job configuration) live
//! on [`StorageHandler`] itself. Everything else is an independently
//! toggleable capability with a conservative default: no pushdown, exclusive
//! locking, no statistics, no direct insert. A handler implementing only the
//! mandatory operations behaves correctly, just without optimizations.
//!
//! The heavier optional capabilities are grouped into separate contracts
//! ([`StatisticsSupport`], [`CommitSupport`], [`MetadataTableSupport`])
//! reached through accessor methods, so no implementation has to understand
//! features it never opted into.
//!
//! # Concurrency
//!
//! One handler instance is resolved per table binding and shared across
//! unrelated query compilations. Every method here must therefore be safe to
//! call concurrently and must derive everything it needs from its arguments;
//! instance state must never act as a side channel between calls.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::descriptor::{FormatId, TableDescriptor, TableName};
use crate::error::{Error, Result};
use crate::job::{ConfigDelta, Credentials, JobConfiguration};
use crate::transform::PartitionTransformSpec;

/// A schema or property mutation requested by an alter statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlterOperation {
    /// Add table properties.
    AddProperties,
    /// Drop table properties.
    DropProperties,
    /// Append columns to the schema.
    AddColumns,
    /// Rename existing columns.
    RenameColumns,
    /// Replace the full column list.
    ReplaceColumns,
    /// Drop columns from the schema.
    DropColumns,
    /// Change a column's type.
    ChangeColumnType,
    /// Add a partition.
    AddPartition,
    /// Drop a partition.
    DropPartition,
    /// Compact the table's storage.
    Compact,
}

impl AlterOperation {
    /// Returns the canonical lowercase name used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddProperties => "add-properties",
            Self::DropProperties => "drop-properties",
            Self::AddColumns => "add-columns",
            Self::RenameColumns => "rename-columns",
            Self::ReplaceColumns => "replace-columns",
            Self::DropColumns => "drop-columns",
            Self::ChangeColumnType => "change-column-type",
            Self::AddPartition => "add-partition",
            Self::DropPartition => "drop-partition",
            Self::Compact => "compact",
        }
    }
}

impl fmt::Display for AlterOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alter operations every handler permits unless it overrides the gate.
pub const DEFAULT_ALLOWED_ALTER_OPS: [AlterOperation; 3] = [
    AlterOperation::AddProperties,
    AlterOperation::DropProperties,
    AlterOperation::AddColumns,
];

/// Lock strength negotiated per write target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockType {
    /// Concurrent writers allowed (append-friendly formats).
    Shared,
    /// Single writer.
    Exclusive,
}

/// Reference to the table or partition a write statement targets.
///
/// Used only as a lookup key for lock-type negotiation; the protocol never
/// owns or retains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteEntity {
    /// The table being written.
    pub table: TableName,
    /// The specific partition, when the write targets one.
    pub partition: Option<String>,
}

impl WriteEntity {
    /// Creates a table-level write entity.
    #[must_use]
    pub fn table(table: TableName) -> Self {
        Self {
            table,
            partition: None,
        }
    }

    /// Creates a partition-level write entity.
    #[must_use]
    pub fn partition(table: TableName, partition: impl Into<String>) -> Self {
        Self {
            table,
            partition: Some(partition.into()),
        }
    }
}

/// Opaque, engine-defined property bag passed at commit time.
#[derive(Debug, Clone, Default)]
pub struct CommitProperties {
    entries: BTreeMap<String, String>,
}

impl CommitProperties {
    /// Creates an empty property bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an entry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Looks up an entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

/// Engine-defined runtime diagnostics, surfaced read-only by describe-style
/// commands.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageHandlerInfo {
    /// One-line summary of the handler's runtime state.
    pub summary: String,
    /// Additional diagnostic entries.
    pub entries: BTreeMap<String, String>,
}

impl StorageHandlerInfo {
    /// Creates a diagnostic payload with just a summary line.
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Adds a diagnostic entry.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for StorageHandlerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)?;
        for (key, value) in &self.entries {
            write!(f, "\n  {key}: {value}")?;
        }
        Ok(())
    }
}

/// Advisory table statistics supplied by a storage engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicStatistics {
    /// Total row count, when known.
    pub num_rows: Option<u64>,
    /// Number of backing files, when known.
    pub num_files: Option<u64>,
    /// Total size in bytes, when known.
    pub total_size: Option<u64>,
}

impl BasicStatistics {
    /// Renders the statistics under their fixed property keys.
    ///
    /// Unknown values are omitted rather than written as zero.
    #[must_use]
    pub fn to_property_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        if let Some(rows) = self.num_rows {
            map.insert("numRows".to_string(), rows.to_string());
        }
        if let Some(files) = self.num_files {
            map.insert("numFiles".to_string(), files.to_string());
        }
        if let Some(size) = self.total_size {
            map.insert("totalSize".to_string(), size.to_string());
        }
        map
    }
}

/// A join-filter predicate offered for dynamic split pruning.
///
/// Opaque to the protocol: handlers only need the target column and a
/// rendered form for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinFilterPredicate {
    /// The column the filter constrains.
    pub target_column: String,
    /// Human-readable rendering of the predicate.
    pub rendered: String,
}

/// Privileges checked through an engine's authorization provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Privilege {
    /// Read table data.
    Select,
    /// Write table data.
    Insert,
    /// Alter table metadata.
    Alter,
    /// Drop the table.
    Drop,
}

/// Engine-specific access-control provider.
pub trait AuthorizationProvider: Send + Sync {
    /// Checks whether the current principal holds `privilege` on `table`.
    ///
    /// # Errors
    ///
    /// Returns an error when the privilege is denied or the check cannot be
    /// performed.
    fn check_privilege(&self, table: &TableDescriptor, privilege: Privilege) -> Result<()>;
}

impl fmt::Debug for dyn AuthorizationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn AuthorizationProvider")
    }
}

/// Callbacks that keep an external catalog synchronized with the engine's
/// own catalog.
///
/// All methods default to no-ops; a handler that needs no notifications
/// simply returns `None` from [`StorageHandler::meta_hook`].
#[async_trait]
pub trait MetaHook: Send + Sync {
    /// Called before the engine's catalog records a new table.
    async fn pre_create_table(&self, _table: &TableDescriptor) -> Result<()> {
        Ok(())
    }

    /// Called after the engine's catalog has recorded a new table.
    async fn commit_create_table(&self, _table: &TableDescriptor) -> Result<()> {
        Ok(())
    }

    /// Called when a create failed after [`MetaHook::pre_create_table`] ran.
    async fn rollback_create_table(&self, _table: &TableDescriptor) -> Result<()> {
        Ok(())
    }

    /// Called before the engine's catalog drops a table.
    async fn pre_drop_table(&self, _table: &TableDescriptor) -> Result<()> {
        Ok(())
    }

    /// Called after the engine's catalog dropped a table.
    ///
    /// `delete_data` is true when the statement also removes the stored data.
    async fn commit_drop_table(&self, _table: &TableDescriptor, _delete_data: bool) -> Result<()> {
        Ok(())
    }
}

/// Optional statistics-provisioning contract.
pub trait StatisticsSupport: Send + Sync {
    /// Whether this handler can supply basic statistics at all.
    fn can_provide_basic_statistics(&self) -> bool {
        false
    }

    /// Returns advisory row/file/size counts for the table, if available.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine fails while gathering statistics.
    fn basic_statistics(&self, _table: &TableDescriptor) -> Result<Option<BasicStatistics>> {
        Ok(None)
    }
}

/// Optional commit contract for engines that own part of the write path.
///
/// Engines opting in accept a narrower atomicity guarantee: a table created
/// through the direct-insert path may become visible before the statement
/// completes, and rollback after a partial failure is entirely the engine's
/// responsibility. The protocol provides no automatic cleanup on this path.
#[async_trait]
pub trait CommitSupport: Send + Sync {
    /// Whether create-as-select runs as a direct insert.
    ///
    /// When true, the planner skips its own create-table and move tasks; the
    /// engine creates the table during compilation and must drop it again if
    /// the statement fails.
    fn direct_insert_ctas(&self) -> bool {
        false
    }

    /// Whether the engine commits inserts itself in place of the default
    /// move task.
    fn commit_in_move_task(&self) -> bool {
        false
    }

    /// Finalizes a write on behalf of the engine.
    ///
    /// `overwrite` is true for insert-overwrite statements.
    ///
    /// # Errors
    ///
    /// The default fails with [`Error::Unsupported`]: being invoked without
    /// having opted in via [`CommitSupport::commit_in_move_task`] is a
    /// configuration-consistency bug the engine must prevent.
    async fn commit(
        &self,
        _table: &TableDescriptor,
        _properties: &CommitProperties,
        _overwrite: bool,
    ) -> Result<()> {
        Err(Error::unsupported(
            "storage-handler-commit",
            "this storage handler never opted into the move-task bypass path",
        ))
    }
}

/// Optional metadata-table contract.
///
/// Engines exposing auxiliary tables (history, manifests, ...) gate which
/// reserved names are recognized.
pub trait MetadataTableSupport: Send + Sync {
    /// Whether `name` addresses a recognized metadata table.
    fn is_valid_metadata_table(&self, name: &str) -> bool;
}

/// The contract every storage engine implementation satisfies.
///
/// See the [module docs](self) for the capability model and concurrency
/// requirements. Capability-query methods must be free of observable side
/// effects; only job-configuration assembly, [`StorageHandler::configure_job_conf`],
/// and commit may touch external state.
pub trait StorageHandler: Send + Sync {
    /// Identifies the implementation responsible for reading rows.
    fn row_format_reader(&self) -> FormatId;

    /// Identifies the implementation responsible for writing rows.
    fn row_format_writer(&self) -> FormatId;

    /// Identifies the implementation responsible for (de)serializing rows.
    fn row_encoder_decoder(&self) -> FormatId;

    /// Returns the hook used to keep an external catalog synchronized, or
    /// `None` when the engine needs no notifications.
    fn meta_hook(&self) -> Option<Arc<dyn MetaHook>>;

    /// Returns the engine-specific access-control provider.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthorizationUnavailable`] when none is configured.
    fn authorization_provider(&self) -> Result<Arc<dyn AuthorizationProvider>> {
        Err(Error::authorization_unavailable(
            "no authorization provider configured for this storage handler",
        ))
    }

    /// Legacy combined job configuration for engines that do not distinguish
    /// input from output.
    ///
    /// The directional methods default to routing through this one, so a
    /// legacy-only engine feeds both directions without the propagation layer
    /// knowing. Duplicate keys across the merged result resolve
    /// last-writer-wins with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error when configuration cannot be derived from the
    /// descriptor; the submit step aborts.
    fn configure_table_job_properties(&self, _table: &TableDescriptor) -> Result<ConfigDelta> {
        Ok(ConfigDelta::new())
    }

    /// Derives the configuration entries input-side tasks need.
    ///
    /// Must be idempotent: equal descriptors produce equal deltas, across
    /// invocations and process restarts, and any external side effect must be
    /// safely repeatable.
    ///
    /// # Errors
    ///
    /// Returns an error when configuration cannot be derived from the
    /// descriptor.
    fn configure_input_job_properties(&self, table: &TableDescriptor) -> Result<ConfigDelta> {
        self.configure_table_job_properties(table)
    }

    /// Derives the configuration entries output-side tasks need.
    ///
    /// Same idempotence contract as
    /// [`StorageHandler::configure_input_job_properties`].
    ///
    /// # Errors
    ///
    /// Returns an error when configuration cannot be derived from the
    /// descriptor.
    fn configure_output_job_properties(&self, table: &TableDescriptor) -> Result<ConfigDelta> {
        self.configure_table_job_properties(table)
    }

    /// Derives the secret entries input-side tasks need.
    ///
    /// Secrets stay out of the plaintext configuration path; same idempotence
    /// contract as the property methods.
    ///
    /// # Errors
    ///
    /// Returns an error when credentials cannot be derived from the
    /// descriptor.
    fn configure_input_job_credentials(&self, _table: &TableDescriptor) -> Result<Credentials> {
        Ok(Credentials::new())
    }

    /// Final hook invoked immediately before job submission.
    ///
    /// Operates on the live configuration object; the last point at which an
    /// engine can inject arbitrary configuration. Expected to be free of side
    /// effects beyond that mutation.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration cannot be finalized; the
    /// submission aborts.
    fn configure_job_conf(
        &self,
        _table: &TableDescriptor,
        _conf: &mut JobConfiguration,
    ) -> Result<()> {
        Ok(())
    }

    /// Whether the engine permits the given alter operation.
    ///
    /// The default admits exactly [`DEFAULT_ALLOWED_ALTER_OPS`]. Engines may
    /// widen or narrow the set; narrowing below the default is legitimate for
    /// formats that cannot, say, add columns after the fact.
    fn is_allowed_alter_operation(&self, op: AlterOperation) -> bool {
        DEFAULT_ALLOWED_ALTER_OPS.contains(&op)
    }

    /// Negotiates the lock strength for a write target.
    fn lock_type(&self, _entity: &WriteEntity) -> LockType {
        LockType::Exclusive
    }

    /// Whether the engine can prune splits using a join-filter predicate.
    fn supports_dynamic_split_pruning(
        &self,
        _table: &TableDescriptor,
        _predicate: &JoinFilterPredicate,
    ) -> bool {
        false
    }

    /// Augments or replaces the operator-level diagnostic property map.
    ///
    /// The default passes `initial` through unchanged.
    fn operator_properties(
        &self,
        initial: BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        initial
    }

    /// Supplies the diagnostic payload for describe-style commands.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine fails while gathering diagnostics.
    fn storage_handler_info(&self, _table: &TableDescriptor) -> Result<Option<StorageHandlerInfo>> {
        Ok(None)
    }

    /// Whether partition columns fold into the regular column list because
    /// the physical layout stores partition values inline with data.
    fn always_unpartitioned(&self) -> bool {
        false
    }

    /// Whether the engine supports partition transforms.
    fn supports_partition_transform(&self) -> bool {
        false
    }

    /// Returns the ordered transform spec, when
    /// [`StorageHandler::supports_partition_transform`] is true.
    fn partition_transform_spec(
        &self,
        _table: &TableDescriptor,
    ) -> Option<Vec<PartitionTransformSpec>> {
        None
    }

    /// Names the table property key selecting the physical file format, when
    /// the format is property-configured.
    fn file_format_property_key(&self) -> Option<&str> {
        None
    }

    /// Whether the engine can truncate without the default table
    /// implementation.
    fn supports_truncate(&self) -> bool {
        false
    }

    /// Whether the engine can resolve historical snapshots.
    fn is_time_travel_allowed(&self) -> bool {
        false
    }

    /// The optional statistics contract, when implemented.
    fn statistics(&self) -> Option<&dyn StatisticsSupport> {
        None
    }

    /// The optional commit contract, when implemented.
    ///
    /// Absence means the default write path: the planner keeps its own
    /// create-table and move tasks and the catalog performs the commit.
    fn commit_support(&self) -> Option<&dyn CommitSupport> {
        None
    }

    /// The optional metadata-table contract, when implemented.
    fn metadata_tables(&self) -> Option<&dyn MetadataTableSupport> {
        None
    }
}

impl fmt::Debug for dyn StorageHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn StorageHandler")
    }
}
