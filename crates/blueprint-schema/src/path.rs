//! Path addressing for schema trees
//!
//! A [`SchemaPath`] is a sequence of property names from the document root.
//! Its string form joins the segments with `.`; the empty string is the root.
//! Property names that contain a `.` cannot be addressed and are rejected
//! when a path is built.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::SchemaNode;
use crate::traversal::resolve_arc;
use crate::{Error, Result};

/// Separator between segments in the string form of a path.
pub const SEPARATOR: char = '.';

/// Address of a node, as property-name segments from the root
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaPath {
    segments: Vec<String>,
}

fn check_segment(segment: &str, path: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(Error::invalid_path(path, "empty segment"));
    }
    if segment.contains(SEPARATOR) {
        return Err(Error::invalid_path(
            path,
            format!("property name `{segment}` contains `{SEPARATOR}` and cannot be addressed"),
        ));
    }
    Ok(())
}

impl SchemaPath {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse the dot-joined string form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if any segment is empty (`"a..b"`,
    /// `".a"`, `"a."`).
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        let segments = text
            .split(SEPARATOR)
            .map(|segment| {
                check_segment(segment, text)?;
                Ok(segment.to_string())
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }

    /// Build a path from individual segments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if a segment is empty or contains `.`.
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        let display = segments.join(".");
        for segment in &segments {
            check_segment(segment, &display)?;
        }
        Ok(Self { segments })
    }

    /// The path of a direct child.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if `segment` is empty or contains `.`.
    pub fn child(&self, segment: impl Into<String>) -> Result<Self> {
        let segment = segment.into();
        check_segment(&segment, &format!("{self}{}{segment}", self.joiner()))?;
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    fn joiner(&self) -> &'static str {
        if self.is_root() { "" } else { "." }
    }

    /// Segments from the root.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether this is the document root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last segment; `None` for the root.
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The enclosing path; `None` for the root.
    pub fn parent(&self) -> Option<SchemaPath> {
        self.split_last().map(|(parent, _)| parent)
    }

    /// Split into the parent path and the last segment.
    pub fn split_last(&self) -> Option<(SchemaPath, &str)> {
        let (last, prefix) = self.segments.split_last()?;
        Some((
            SchemaPath {
                segments: prefix.to_vec(),
            },
            last.as_str(),
        ))
    }

    /// Whether `prefix` is this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &SchemaPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Whether this path is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &SchemaPath) -> bool {
        self.len() < other.len() && other.starts_with(self)
    }

    /// Whether the two paths are equal or one is an ancestor of the other.
    pub fn is_related_to(&self, other: &SchemaPath) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }

    /// The longest path that is a prefix of both.
    pub fn common_prefix(&self, other: &SchemaPath) -> SchemaPath {
        let shared = self
            .segments
            .iter()
            .zip(&other.segments)
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.clone())
            .collect();
        SchemaPath { segments: shared }
    }

    /// The segments below `prefix`, if `prefix` starts this path.
    pub fn relative_to(&self, prefix: &SchemaPath) -> Option<&[String]> {
        if self.starts_with(prefix) {
            Some(&self.segments[prefix.len()..])
        } else {
            None
        }
    }
}

/// The longest prefix shared by every path; `None` for an empty input.
pub fn common_prefix_of<'a, I>(paths: I) -> Option<SchemaPath>
where
    I: IntoIterator<Item = &'a SchemaPath>,
{
    let mut paths = paths.into_iter();
    let first = paths.next()?.clone();
    Some(paths.fold(first, |prefix, path| prefix.common_prefix(path)))
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl FromStr for SchemaPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for SchemaPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SchemaPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// A property location together with the node found there
///
/// `schema` is a snapshot, not a live view: two handles denote the same
/// property when their paths are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaProperty {
    pub path: SchemaPath,
    pub key: String,
    pub schema: Arc<SchemaNode>,
}

impl SchemaProperty {
    /// Capture the property at `path` in `root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] for the root (it is not a property) and
    /// [`Error::PathNotFound`] if the path does not resolve.
    pub fn at(root: &Arc<SchemaNode>, path: &SchemaPath) -> Result<Self> {
        let key = path
            .key()
            .ok_or_else(|| Error::invalid_path(path, "the document root is not a property"))?
            .to_string();
        let schema = resolve_arc(root, path)?;
        Ok(Self {
            path: path.clone(),
            key,
            schema,
        })
    }

    /// Whether both handles address the same location.
    pub fn same_location(&self, other: &SchemaProperty) -> bool {
        self.path == other.path
    }
}
