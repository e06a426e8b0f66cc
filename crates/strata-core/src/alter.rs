//! The alter-operation gate.
//!
//! The engine calls [`check_alter_operation`] before compiling any alter
//! statement against a handler-bound table. A refusal is a user-visible
//! statement error, never a fatal one.

use crate::error::{Error, Result};
use crate::handler::{AlterOperation, StorageHandler};

/// Rejects alter operations the bound storage engine does not permit.
///
/// # Errors
///
/// Returns [`Error::Unsupported`] naming the refused operation when the
/// handler's gate returns false.
pub fn check_alter_operation(handler: &dyn StorageHandler, op: AlterOperation) -> Result<()> {
    if handler.is_allowed_alter_operation(op) {
        Ok(())
    } else {
        Err(Error::unsupported(
            op.as_str(),
            "alter operation is not permitted by the table's storage handler",
        ))
    }
}
