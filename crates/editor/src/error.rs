//! Error types for edit commands.

use thiserror::Error;
use topotrace_graph::GraphError;

/// Errors from applying or reversing an edit.
///
/// A command that returns an error has left the store as it found it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// The store rejected an operation.
    #[error("graph store rejected edit: {0}")]
    Graph(#[from] GraphError),
}
