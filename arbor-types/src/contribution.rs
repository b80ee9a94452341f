//! Contributions: one source's opinion of one node.
//!
//! When a federated node is read, each back-end source is asked what it
//! knows about that node and answers with a `Contribution`: the properties
//! and children it holds for the node, the path the node has in the
//! source's own namespace, and how long the answer stays valid.
//!
//! Contributions are immutable. A "changed" contribution is always a new
//! value, never an in-place mutation, which is what makes them freely
//! shareable across reader tasks without locking.
//!
//! Internally a contribution picks the cheapest storage shape for its
//! content (nothing at all, a single property, a single child, and so on).
//! The shape is invisible through the public accessors.

use crate::path::{NodePath, PathSegment};
use crate::property::Property;
use crate::timestamp::{Expiration, Timestamp};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One source's immutable opinion about one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    source_name: String,
    /// The node's path in the source's own namespace. `None` only when the
    /// source was asked and affirmatively has nothing for this node.
    path_in_source: Option<NodePath>,
    expiration: Expiration,
    repr: Repr,
}

/// Storage shapes. A pure optimization for the common small cases; every
/// accessor answers identically regardless of which shape was chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Repr {
    Empty,
    OneProperty(Property),
    OneChild(PathSegment),
    Properties(Vec<Property>),
    Children(Vec<PathSegment>),
    Full {
        properties: Vec<Property>,
        children: Vec<PathSegment>,
    },
}

impl Contribution {
    /// The "asked and has nothing" contribution.
    ///
    /// Stored like any other contribution so that the source is not asked
    /// again until `expiration` passes.
    pub fn empty(source_name: impl Into<String>, expiration: Expiration) -> Result<Self> {
        let source_name = validated_source(source_name.into())?;
        Ok(Self {
            source_name,
            path_in_source: None,
            expiration,
            repr: Repr::Empty,
        })
    }

    /// A contribution carrying exactly one property and no children.
    ///
    /// Fails with `InvalidArgument` if the property has no values:
    /// single-property contributions always carry one non-empty property.
    pub fn with_property(
        source_name: impl Into<String>,
        path_in_source: NodePath,
        expiration: Expiration,
        property: Property,
    ) -> Result<Self> {
        let source_name = validated_source(source_name.into())?;
        if property.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "single-property contribution from '{source_name}' given property \
                 '{}' with no values",
                property.name()
            )));
        }
        Ok(Self {
            source_name,
            path_in_source: Some(path_in_source),
            expiration,
            repr: Repr::OneProperty(property),
        })
    }

    /// A contribution carrying exactly one child and no properties.
    pub fn with_child(
        source_name: impl Into<String>,
        path_in_source: NodePath,
        expiration: Expiration,
        child: PathSegment,
    ) -> Result<Self> {
        let source_name = validated_source(source_name.into())?;
        Ok(Self {
            source_name,
            path_in_source: Some(path_in_source),
            expiration,
            repr: Repr::OneChild(child),
        })
    }

    /// The general constructor: any mix of properties and children.
    ///
    /// Duplicate property names overwrite the earlier definition in place
    /// (map semantics, stable order). Children keep insertion order. The
    /// cheapest storage shape is chosen from the final content.
    pub fn new(
        source_name: impl Into<String>,
        path_in_source: NodePath,
        expiration: Expiration,
        properties: Vec<Property>,
        children: Vec<PathSegment>,
    ) -> Result<Self> {
        let source_name = validated_source(source_name.into())?;
        let properties = dedup_properties(properties);
        let repr = match (properties.len(), children.len()) {
            (0, 0) => Repr::Empty,
            (1, 0) => Repr::OneProperty(into_single(properties)),
            (0, 1) => Repr::OneChild(into_single(children)),
            (_, 0) => Repr::Properties(properties),
            (0, _) => Repr::Children(children),
            _ => Repr::Full {
                properties,
                children,
            },
        };
        Ok(Self {
            source_name,
            path_in_source: Some(path_in_source),
            expiration,
            repr,
        })
    }

    /// The name of the source that produced this contribution.
    #[must_use]
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// The node's path in the source's namespace, when the source has
    /// content for the node.
    #[must_use]
    pub fn path_in_source(&self) -> Option<&NodePath> {
        self.path_in_source.as_ref()
    }

    /// When this contribution stops being valid.
    #[must_use]
    pub const fn expiration(&self) -> Expiration {
        self.expiration
    }

    /// True iff a concrete deadline is set and `now` has reached it.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiration.is_expired(now)
    }

    /// Looks up a property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties().iter().find(|p| p.name() == name)
    }

    /// All properties, in stable (first-definition) order.
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        match &self.repr {
            Repr::OneProperty(property) => std::slice::from_ref(property),
            Repr::Properties(properties) | Repr::Full { properties, .. } => properties,
            Repr::Empty | Repr::OneChild(_) | Repr::Children(_) => &[],
        }
    }

    /// The number of properties.
    #[must_use]
    pub fn property_count(&self) -> usize {
        self.properties().len()
    }

    /// All children, in insertion order.
    #[must_use]
    pub fn children(&self) -> &[PathSegment] {
        match &self.repr {
            Repr::OneChild(child) => std::slice::from_ref(child),
            Repr::Children(children) | Repr::Full { children, .. } => children,
            Repr::Empty | Repr::OneProperty(_) | Repr::Properties(_) => &[],
        }
    }

    /// The number of children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    /// True when the source has neither properties nor children here.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.property_count() == 0 && self.child_count() == 0
    }

    /// A copy of this contribution with a new deadline.
    ///
    /// The only sanctioned way a contribution "changes"; used to mark a
    /// source's cached answer expired on an out-of-band change
    /// notification.
    #[must_use]
    pub fn with_expiration(&self, expiration: Expiration) -> Self {
        Self {
            expiration,
            ..self.clone()
        }
    }
}

impl fmt::Display for Contribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "contribution from '{}'", self.source_name)?;
        match &self.path_in_source {
            Some(path) => write!(f, " at {path}")?,
            None => write!(f, " (nothing)")?,
        }
        write!(
            f,
            " [{} properties, {} children, expires {}]",
            self.property_count(),
            self.child_count(),
            self.expiration
        )
    }
}

fn validated_source(source_name: String) -> Result<String> {
    if source_name.trim().is_empty() {
        return Err(Error::InvalidArgument(
            "contribution source name may not be blank".to_string(),
        ));
    }
    Ok(source_name)
}

/// Later definitions of a name overwrite the earlier one in place, so the
/// result is duplicate-free with a stable order.
fn dedup_properties(properties: Vec<Property>) -> Vec<Property> {
    let mut out: Vec<Property> = Vec::with_capacity(properties.len());
    for property in properties {
        match out.iter().position(|p| p.name() == property.name()) {
            Some(index) => out[index] = property,
            None => out.push(property),
        }
    }
    out
}

fn into_single<T>(mut items: Vec<T>) -> T {
    debug_assert_eq!(items.len(), 1);
    items.remove(0)
}
