//! # strata-stream
//!
//! Streaming-ingestion storage handler for the Strata SQL engine.
//!
//! Tables bound to this handler are backed by a time-indexed streaming
//! analytics store fed from a message bus. The handler implements the
//! `strata-core` storage-handler contract:
//!
//! - row-parser selection from table properties (JSON, delimited text, or
//!   schema-carrying binary)
//! - job configuration derived from the `streaming.`-prefixed property
//!   namespace, secrets routed through the credential path
//! - engine-owned commit: writes are finalized by submitting a supervisor
//!   document to a remote ingestion controller
//!
//! Current scope:
//! - supervisor submission and termination against one controller endpoint
//!
//! Non-goals (for now):
//! - segment reading/writing (lives with the execution engine's codecs)
//! - controller-side retry or failover policy

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod handler;
pub mod ingestion;
pub mod parser;
pub mod properties;

pub use handler::StreamingStorageHandler;
pub use ingestion::{
    is_streaming_table, submit_supervisor_spec, terminate_supervisor, SupervisorSpec,
};
pub use parser::RowParserSpec;
