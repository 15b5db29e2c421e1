//! Error types for reconciliation and selection writes.
//!
//! None of these reach the host. Reconciliation errors turn into a cache
//! invalidation, selection errors into a "not handled" result.

use miette::Diagnostic;
use thiserror::Error;

/// Why a cached model could not absorb a new DOM selection.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReconcileError {
    /// A cached back-reference no longer matches the live tree.
    #[error("cached model no longer matches the DOM: {0}")]
    #[diagnostic(code(tapestry::reconcile::structural_mismatch))]
    StructuralMismatch(String),

    /// A selection boundary has no counterpart in the model.
    #[error("selection cannot be mapped onto the model: {0}")]
    #[diagnostic(code(tapestry::reconcile::selection_unresolvable))]
    SelectionUnresolvable(String),

    /// Applying the selection would break a model invariant.
    #[error("selection would corrupt the model: {0}")]
    #[diagnostic(code(tapestry::reconcile::invariant_violation))]
    InvariantViolation(String),
}

/// Why a DOM selection could not be written.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    /// Table coordinates fall outside the table.
    #[error("cell ({row}, {column}) is outside the table")]
    #[diagnostic(code(tapestry::selection::out_of_bounds))]
    OutOfBounds { row: usize, column: usize },

    /// The target node is gone or not under the editor root.
    #[error("selection target is not part of the editor")]
    #[diagnostic(code(tapestry::selection::detached_target))]
    DetachedTarget,

    /// The target exists but has the wrong kind, such as an image selection on
    /// a paragraph.
    #[error("selection target is a <{0}>, not the expected element")]
    #[diagnostic(code(tapestry::selection::unexpected_target))]
    UnexpectedTarget(String),
}
