//! Reconciliation error types.

use asic_model::ModelError;
use asic_view::ViewError;

/// Errors aborting a reconciliation run.
///
/// Reconciliation stops at the first non-recoverable error; operations
/// already emitted are not rolled back.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    /// A hard precondition does not hold (port not matched, switch count
    /// wrong).
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// An invariant of the engine itself was broken. Carries full context;
    /// the caller is expected to abort.
    #[error("internal error: {0}")]
    Internal(String),

    /// An object could not be brought to its desired state.
    #[error("object {object} cannot be reconciled: {reason}")]
    Unreconcilable { object: String, reason: String },

    #[error(transparent)]
    View(#[from] ViewError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
