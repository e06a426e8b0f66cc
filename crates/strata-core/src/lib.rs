//! # strata-core
//!
//! Storage-handler protocol contracts for the Strata SQL engine.
//!
//! A table is bound to exactly one external storage engine by name at
//! creation time; thereafter the query engine calls back into that engine's
//! handler at well-defined points of the compile/execute/commit lifecycle.
//! This crate defines that boundary:
//!
//! - **Descriptors**: immutable table metadata snapshots and job-scoped
//!   configuration accumulators
//! - **Capability negotiation**: the [`handler::StorageHandler`] contract with
//!   conservative defaults for every optional capability
//! - **Job configuration propagation**: idempotent assembly of the key/value
//!   bundle distributed tasks receive
//! - **Alter gate and commit protocol**: which mutations an engine permits,
//!   and who finalizes a write
//! - **Registry**: name-to-handler binding, validated at registration
//!
//! ## Crate Boundary
//!
//! `strata-core` is the only crate allowed to define these shared contracts.
//! Engine implementations (e.g. `strata-stream`) depend on it; nothing here
//! depends on a concrete engine, the planner, or the catalog.
//!
//! ## Example
//!
//! ```rust
//! use strata_core::prelude::*;
//!
//! let table = TableDescriptor::builder(TableName::new("metrics", "events"))
//!     .column("ts", "timestamp")
//!     .property("streaming.source.topic", "events")
//!     .build();
//!
//! assert_eq!(table.property("streaming.source.topic"), Some("events"));
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod alter;
pub mod commit;
pub mod descriptor;
pub mod error;
pub mod handler;
pub mod job;
pub mod observability;
pub mod registry;
pub mod transform;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use strata_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::alter::check_alter_operation;
    pub use crate::commit::{commit_write, plan_ctas_write, plan_insert_write, WritePlan};
    pub use crate::descriptor::{
        ColumnDescriptor, FormatId, TableDescriptor, TableDescriptorBuilder, TableName,
    };
    pub use crate::error::{Error, Result};
    pub use crate::handler::{
        AlterOperation, AuthorizationProvider, BasicStatistics, CommitProperties, CommitSupport,
        JoinFilterPredicate, LockType, MetaHook, MetadataTableSupport, Privilege,
        StatisticsSupport, StorageHandler, StorageHandlerInfo, WriteEntity,
        DEFAULT_ALLOWED_ALTER_OPS,
    };
    pub use crate::job::{
        assemble_input_configuration, assemble_output_configuration, ConfigDelta, Credentials,
        JobConfiguration, JobProperties,
    };
    pub use crate::registry::{HandlerFactory, HandlerRegistry};
    pub use crate::transform::{PartitionTransform, PartitionTransformSpec};
}

// Re-export key types at crate root for ergonomics
pub use descriptor::{ColumnDescriptor, FormatId, TableDescriptor, TableName};
pub use error::{Error, Result};
pub use handler::{
    AlterOperation, BasicStatistics, CommitProperties, LockType, StorageHandler,
    StorageHandlerInfo, WriteEntity,
};
pub use job::{ConfigDelta, Credentials, JobConfiguration, JobProperties};
pub use observability::{init_logging, LogFormat};
pub use registry::HandlerRegistry;
pub use transform::{PartitionTransform, PartitionTransformSpec};
