//! Path resolution and walks over schema trees

use std::sync::Arc;

use crate::model::{ObjectShape, SchemaNode, Shape};
use crate::path::SchemaPath;
use crate::{Error, Result};

/// Trait for walking the addressable properties of a tree
pub trait Visitor {
    /// Visit a property (never the root).
    fn visit(&mut self, path: &SchemaPath, node: &Arc<SchemaNode>);

    /// Whether to walk below the given property.
    fn descend(&self, _path: &SchemaPath, _node: &Arc<SchemaNode>) -> bool {
        true
    }
}

/// The object that holds the children addressed below `node`.
///
/// Arrays are transparent: the container of an array is the container of its
/// item schema, through any number of nested arrays.
pub fn container(node: &SchemaNode) -> Option<&ObjectShape> {
    match &node.shape {
        Shape::Object(object) => Some(object),
        Shape::Array(array) => array.items.as_deref().and_then(container),
        Shape::Untyped | Shape::Scalar(_) => None,
    }
}

/// A direct child of `node`, looking through arrays.
pub fn child<'a>(node: &'a SchemaNode, key: &str) -> Option<&'a Arc<SchemaNode>> {
    container(node).and_then(|object| object.property(key))
}

/// Resolve `path` against `root`.
///
/// # Errors
///
/// Returns [`Error::PathNotFound`] naming the first unresolved prefix.
pub fn resolve<'a>(root: &'a SchemaNode, path: &SchemaPath) -> Result<&'a SchemaNode> {
    let mut current = root;
    for (depth, segment) in path.segments().iter().enumerate() {
        current = child(current, segment)
            .map(|node| &**node)
            .ok_or_else(|| unresolved(path, depth))?;
    }
    Ok(current)
}

/// Resolve `path` and return the shared handle to the node found there.
///
/// # Errors
///
/// Returns [`Error::PathNotFound`] naming the first unresolved prefix.
pub fn resolve_arc(root: &Arc<SchemaNode>, path: &SchemaPath) -> Result<Arc<SchemaNode>> {
    let mut current = root;
    for (depth, segment) in path.segments().iter().enumerate() {
        current = child(current, segment).ok_or_else(|| unresolved(path, depth))?;
    }
    Ok(Arc::clone(current))
}

fn unresolved(path: &SchemaPath, depth: usize) -> Error {
    Error::path_not_found(path.segments()[..=depth].join("."))
}

/// Whether `path` resolves in `root`.
pub fn contains(root: &SchemaNode, path: &SchemaPath) -> bool {
    resolve(root, path).is_ok()
}

/// Walk every addressable property below `root` in document order.
///
/// Properties whose names cannot form a path segment are skipped together
/// with their subtrees.
pub fn walk<V: Visitor>(root: &SchemaNode, visitor: &mut V) {
    walk_recursive(root, &SchemaPath::root(), visitor);
}

fn walk_recursive<V: Visitor>(node: &SchemaNode, at: &SchemaPath, visitor: &mut V) {
    let Some(object) = container(node) else {
        return;
    };
    for (key, child) in object.iter() {
        let Ok(path) = at.child(key.as_str()) else {
            tracing::trace!("Skipping unaddressable property '{}' under '{}'", key, at);
            continue;
        };
        visitor.visit(&path, child);
        if visitor.descend(&path, child) {
            walk_recursive(child, &path, visitor);
        }
    }
}

struct PathCollector(Vec<SchemaPath>);

impl Visitor for PathCollector {
    fn visit(&mut self, path: &SchemaPath, _node: &Arc<SchemaNode>) {
        self.0.push(path.clone());
    }
}

/// Every addressable property path, in document order.
pub fn paths(root: &SchemaNode) -> Vec<SchemaPath> {
    let mut collector = PathCollector(Vec::new());
    walk(root, &mut collector);
    collector.0
}
