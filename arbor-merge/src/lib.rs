//! Pure merge engine for Arbor federated nodes.
//!
//! This crate turns an ordered set of [`Contribution`]s (one per source
//! that was asked about a node) into the node's effective view: resolved
//! properties, resolved children, and an aggregate expiration.
//!
//! All merging in this crate satisfies the following properties:
//! - **Deterministic**: equal ordered inputs always produce equal outputs
//! - **Idempotent**: merging the same unchanged input set twice produces
//!   identical effective views
//! - **Pure**: no I/O, no state, no clock reads
//!
//! The input order is the source priority order (highest first), fixed by
//! federation configuration. Priority resolves all collisions: the first
//! source to define a property name wins, and an exact (name, index) child
//! duplicate reported by a lower-priority source is dropped.
//!
//! [`Contribution`]: arbor_types::Contribution

mod engine;
mod view;

pub use engine::MergeEngine;
pub use view::EffectiveView;
