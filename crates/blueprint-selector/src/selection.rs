//! Extracted selection fragments

use std::collections::BTreeSet;
use std::sync::Arc;

use blueprint_schema::path::common_prefix_of;
use blueprint_schema::traversal::{paths, resolve_arc};
use blueprint_schema::{Properties, SchemaNode, SchemaPath};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The persisted product of a selection
///
/// `json_schema` is the fragment to mount and `target_path` the anchor it is
/// mounted at. Both are `None` when nothing is selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubSchemaSelection {
    #[serde(default)]
    pub json_schema: Option<SchemaNode>,

    #[serde(default)]
    pub target_path: Option<SchemaPath>,
}

impl SubSchemaSelection {
    /// The "nothing selected" value.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether no fragment is present.
    pub fn is_empty(&self) -> bool {
        self.json_schema.is_none()
    }
}

/// Derive the fragment for `selected` paths of `target`.
///
/// One path yields the node at that path, anchored at the path itself.
/// Several paths yield a synthetic object keyed by each path's last segment,
/// in the target's document order, anchored at their common prefix.
pub(crate) fn extract(target: &Arc<SchemaNode>, selected: &BTreeSet<SchemaPath>) -> SubSchemaSelection {
    if selected.len() == 1 {
        let Some(path) = selected.first() else {
            return SubSchemaSelection::empty();
        };
        return match resolve_arc(target, path) {
            Ok(node) => SubSchemaSelection {
                json_schema: Some(node.as_ref().clone()),
                target_path: Some(path.clone()),
            },
            Err(err) => {
                warn!("Dropping unresolved selection: {}", err);
                SubSchemaSelection::empty()
            }
        };
    }

    let ordered: Vec<SchemaPath> = paths(target)
        .into_iter()
        .filter(|path| selected.contains(path))
        .collect();
    let Some(prefix) = common_prefix_of(&ordered) else {
        return SubSchemaSelection::empty();
    };

    let mut combined = Properties::new();
    for path in &ordered {
        let Ok(node) = resolve_arc(target, path) else {
            continue;
        };
        let key = fragment_key(path, &prefix, &combined);
        combined.insert(key, node);
    }

    let mut fragment = SchemaNode::object();
    if let blueprint_schema::Shape::Object(object) = &mut fragment.shape {
        object.properties = Some(combined);
    }
    SubSchemaSelection {
        json_schema: Some(fragment),
        target_path: Some(prefix),
    }
}

/// Key of `path` inside a combined fragment.
///
/// The bare last segment is used unless an earlier path already took it; then
/// the segments below `prefix` joined with `_`, then that with a counter.
pub(crate) fn fragment_key(path: &SchemaPath, prefix: &SchemaPath, taken: &Properties) -> String {
    let bare = path.key().unwrap_or_default();
    if !taken.contains_key(bare) {
        return bare.to_string();
    }

    let qualified = path
        .relative_to(prefix)
        .map_or_else(|| bare.to_string(), |segments| segments.join("_"));
    if !taken.contains_key(&qualified) {
        return qualified;
    }

    let mut counter = 2;
    loop {
        let candidate = format!("{qualified}_{counter}");
        if !taken.contains_key(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
