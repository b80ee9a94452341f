//! Error types for the federation layer.

use crate::node::SourceFailure;
use arbor_types::NodePath;
use thiserror::Error;

/// Result type for federation operations.
pub type FederationResult<T> = Result<T, FederationError>;

/// Errors that can occur reading a federated node.
#[derive(Debug, Error)]
pub enum FederationError {
    /// A malformed value was constructed or supplied.
    #[error(transparent)]
    Types(#[from] arbor_types::Error),

    /// Every source was asked and none has anything for this node.
    #[error("node does not exist at {0}")]
    NotFound(NodePath),

    /// One or more sources could not be resolved and no cached fallback
    /// existed for them, leaving nothing to serve.
    #[error("no source could be resolved ({} failures)", .failures.len())]
    PartialUnavailable {
        /// The per-source failures, in source priority order.
        failures: Vec<SourceFailure>,
    },
}
