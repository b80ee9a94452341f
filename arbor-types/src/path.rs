//! Node paths within the federated tree.
//!
//! A path is a sequence of segments, each a child name plus a 1-based
//! same-name-sibling index. Index 1 is the implicit default and is omitted
//! when rendering, so `/a/b` and `/a/b[1]` denote the same node.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single step in a node path: a child name plus its same-name-sibling
/// index.
///
/// Two children of the same parent may share a name; the index (1-based)
/// distinguishes them. Equality and hashing cover both name and index, so
/// `b[1]` and `b[2]` are distinct segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    name: String,
    index: u32,
}

impl PathSegment {
    /// Creates a segment with the implicit index 1.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: 1,
        }
    }

    /// Creates a segment with an explicit same-name-sibling index.
    ///
    /// An index of 0 is normalized to 1 (indices are 1-based).
    #[must_use]
    pub fn with_index(name: impl Into<String>, index: u32) -> Self {
        Self {
            name: name.into(),
            index: index.max(1),
        }
    }

    /// The child name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The 1-based same-name-sibling index.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == 1 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}[{}]", self.name, self.index)
        }
    }
}

/// An absolute path identifying one node in a tree.
///
/// The root is the empty segment sequence. Paths are the cache key for
/// federated nodes and half of the refresh key, so they are cheap to hash
/// and compare.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NodePath {
    segments: Vec<PathSegment>,
}

impl NodePath {
    /// The root path.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a path from a segment sequence.
    #[must_use]
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Returns true for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The segments making up this path, top-down.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The final segment, or `None` for the root.
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// The parent path, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns this path extended by one child segment.
    #[must_use]
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !trimmed.starts_with('/') {
            return Err(Error::InvalidPath(format!("path must be absolute: {s:?}")));
        }
        let mut segments = Vec::new();
        for part in trimmed.split('/').filter(|p| !p.is_empty()) {
            segments.push(parse_segment(part)?);
        }
        Ok(Self { segments })
    }
}

fn parse_segment(part: &str) -> Result<PathSegment, Error> {
    if let Some(open) = part.find('[') {
        let close = part
            .strip_suffix(']')
            .ok_or_else(|| Error::InvalidPath(format!("unterminated index in {part:?}")))?;
        let name = &part[..open];
        let index: u32 = close[open + 1..]
            .parse()
            .map_err(|_| Error::InvalidPath(format!("bad sibling index in {part:?}")))?;
        if name.is_empty() || index == 0 {
            return Err(Error::InvalidPath(format!("bad segment {part:?}")));
        }
        Ok(PathSegment::with_index(name, index))
    } else {
        Ok(PathSegment::new(part))
    }
}
