//! The commit protocol for handler-backed writes.
//!
//! Per write statement the planner queries the handler's commit capabilities
//! once and compiles one of two paths:
//!
//! - **Default path**: the engine creates the table (for CTAS), schedules a
//!   move task relocating staged output into its final location, and the
//!   catalog performs the commit.
//! - **Engine-owned path**: the engine omits the create and/or move task; the
//!   handler creates the table during compilation and/or commits through
//!   [`commit_write`] at the point the default commit would have run.
//!
//! The engine-owned path trades atomicity for capability: a table may be
//! transiently visible before the statement completes, and rollback after a
//! partial failure is the handler's job. The protocol performs no automatic
//! cleanup on that path.

use crate::descriptor::TableDescriptor;
use crate::error::{Error, Result};
use crate::handler::{CommitProperties, StorageHandler};

/// The tasks the planner compiles for one write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WritePlan {
    /// Whether the planner schedules its own create-table task (CTAS only).
    pub create_table_task: bool,
    /// Whether the planner schedules the default move task.
    pub move_task: bool,
    /// Whether commit is routed through the handler instead of the catalog.
    pub handler_commit: bool,
}

/// Plans a create-as-select write against the handler's commit capabilities.
///
/// A handler opting into direct insert creates the table itself at compile
/// time, so both the create-table and move tasks are omitted from the plan.
#[must_use]
pub fn plan_ctas_write(handler: &dyn StorageHandler) -> WritePlan {
    let Some(commit) = handler.commit_support() else {
        return WritePlan {
            create_table_task: true,
            move_task: true,
            handler_commit: false,
        };
    };

    let direct_insert = commit.direct_insert_ctas();
    let handler_commit = commit.commit_in_move_task();
    WritePlan {
        create_table_task: !direct_insert,
        move_task: !direct_insert && !handler_commit,
        handler_commit,
    }
}

/// Plans a plain insert write against the handler's commit capabilities.
#[must_use]
pub fn plan_insert_write(handler: &dyn StorageHandler) -> WritePlan {
    let handler_commit = handler
        .commit_support()
        .is_some_and(|commit| commit.commit_in_move_task());
    WritePlan {
        create_table_task: false,
        move_task: !handler_commit,
        handler_commit,
    }
}

/// Finalizes a write through the handler's commit contract.
///
/// Guards the configuration-consistency invariant before delegating: a
/// handler must have opted into the move-task bypass for this call to be
/// legal, so the mismatch is reported without invoking the handler at all.
///
/// # Errors
///
/// Returns [`Error::Unsupported`] when the handler never opted into
/// handler-owned commit, or whatever error the handler's own commit raises.
/// Errors on this path leave rollback to the handler.
pub async fn commit_write(
    handler: &dyn StorageHandler,
    table: &TableDescriptor,
    properties: &CommitProperties,
    overwrite: bool,
) -> Result<()> {
    let Some(commit) = handler.commit_support() else {
        return Err(Error::unsupported(
            "storage-handler-commit",
            "storage handler exposes no commit contract",
        ));
    };

    if !commit.commit_in_move_task() {
        return Err(Error::unsupported(
            "storage-handler-commit",
            "storage handler did not opt into the move-task bypass path",
        ));
    }

    tracing::debug!(table = %table.name(), overwrite, "delegating commit to storage handler");
    commit.commit(table, properties, overwrite).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FormatId, TableName};
    use crate::handler::{CommitSupport, MetaHook};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EngineOwnedCommit {
        commits: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl CommitSupport for EngineOwnedCommit {
        fn direct_insert_ctas(&self) -> bool {
            true
        }

        fn commit_in_move_task(&self) -> bool {
            true
        }

        async fn commit(
            &self,
            _table: &TableDescriptor,
            _properties: &CommitProperties,
            _overwrite: bool,
        ) -> Result<()> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::internal("simulated failure after table creation"));
            }
            Ok(())
        }
    }

    struct EngineOwnedHandler {
        commit: EngineOwnedCommit,
    }

    impl EngineOwnedHandler {
        fn new(fail: bool) -> Self {
            Self {
                commit: EngineOwnedCommit {
                    commits: AtomicUsize::new(0),
                    fail,
                },
            }
        }
    }

    impl StorageHandler for EngineOwnedHandler {
        fn row_format_reader(&self) -> FormatId {
            FormatId::new("r")
        }

        fn row_format_writer(&self) -> FormatId {
            FormatId::new("w")
        }

        fn row_encoder_decoder(&self) -> FormatId {
            FormatId::new("e")
        }

        fn meta_hook(&self) -> Option<Arc<dyn MetaHook>> {
            None
        }

        fn commit_support(&self) -> Option<&dyn CommitSupport> {
            Some(&self.commit)
        }
    }

    struct DefaultPathHandler;

    impl StorageHandler for DefaultPathHandler {
        fn row_format_reader(&self) -> FormatId {
            FormatId::new("r")
        }

        fn row_format_writer(&self) -> FormatId {
            FormatId::new("w")
        }

        fn row_encoder_decoder(&self) -> FormatId {
            FormatId::new("e")
        }

        fn meta_hook(&self) -> Option<Arc<dyn MetaHook>> {
            None
        }
    }

    fn table() -> TableDescriptor {
        TableDescriptor::builder(TableName::new("db", "t")).build()
    }

    #[test]
    fn test_default_path_keeps_create_and_move_tasks() {
        let plan = plan_ctas_write(&DefaultPathHandler);
        assert_eq!(
            plan,
            WritePlan {
                create_table_task: true,
                move_task: true,
                handler_commit: false,
            }
        );
    }

    #[test]
    fn test_direct_insert_ctas_omits_create_and_move_tasks() {
        let handler = EngineOwnedHandler::new(false);
        let plan = plan_ctas_write(&handler);
        assert!(!plan.create_table_task);
        assert!(!plan.move_task);
        assert!(plan.handler_commit);
    }

    #[test]
    fn test_insert_plan_bypasses_move_task_when_opted_in() {
        let handler = EngineOwnedHandler::new(false);
        let plan = plan_insert_write(&handler);
        assert!(!plan.move_task);
        assert!(plan.handler_commit);

        let plan = plan_insert_write(&DefaultPathHandler);
        assert!(plan.move_task);
        assert!(!plan.handler_commit);
    }

    #[tokio::test]
    async fn test_commit_write_delegates_to_handler() {
        let handler = EngineOwnedHandler::new(false);
        commit_write(&handler, &table(), &CommitProperties::new(), false)
            .await
            .expect("commit succeeds");
        assert_eq!(handler.commit.commits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_commit_failure_triggers_no_protocol_cleanup() {
        // Rollback on the engine-owned path belongs to the handler; the
        // protocol reports the failure and does nothing else.
        let handler = EngineOwnedHandler::new(true);
        let err = commit_write(&handler, &table(), &CommitProperties::new(), false)
            .await
            .expect_err("simulated failure");
        assert!(matches!(err, Error::Internal { .. }));
        assert_eq!(handler.commit.commits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_commit_without_opt_in_is_a_consistency_error() {
        let err = commit_write(&DefaultPathHandler, &table(), &CommitProperties::new(), true)
            .await
            .expect_err("never opted in");
        assert!(matches!(err, Error::Unsupported { .. }));
    }
}
