//! Node properties.
//!
//! A property is a name plus an ordered, possibly-empty sequence of opaque
//! values. The core never interprets values; connectors produce whatever
//! JSON shape their backing store holds.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A named, ordered sequence of opaque values.
///
/// Two properties are equal iff their names and value sequences are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    name: String,
    values: Vec<Value>,
}

impl Property {
    /// Creates a property from a name and a value sequence.
    #[must_use]
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Creates a single-valued property.
    #[must_use]
    pub fn single(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            values: vec![value],
        }
    }

    /// The property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ordered value sequence.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The first value, or `None` if the property has no values.
    #[must_use]
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    /// True when the property carries no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=", self.name)?;
        match self.values.as_slice() {
            [] => write!(f, "[]"),
            [one] => write!(f, "{one}"),
            many => {
                write!(f, "[")?;
                for (i, value) in many.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
        }
    }
}
