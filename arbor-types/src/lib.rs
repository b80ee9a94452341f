//! Core type definitions for Arbor.
//!
//! This crate defines the fundamental, connector-agnostic types used
//! throughout the federation core:
//! - Node paths and same-name-sibling path segments
//! - Properties (a name plus an ordered sequence of opaque values)
//! - Expiration timestamps
//! - Contributions (one source's immutable opinion of one node)
//!
//! All connector-specific types (SQL row mappings, SVN entries, file
//! metadata, etc.) belong in their respective connectors, not here.

mod contribution;
mod path;
mod property;
mod timestamp;

pub use contribution::Contribution;
pub use path::{NodePath, PathSegment};
pub use property::Property;
pub use timestamp::{Expiration, Timestamp};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}
