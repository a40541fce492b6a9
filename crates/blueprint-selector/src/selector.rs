//! Antichain selection over a target schema

use std::collections::BTreeSet;
use std::sync::Arc;

use blueprint_schema::traversal::{container, paths};
use blueprint_schema::{ObjectShape, Result, SchemaNode, SchemaPath, path::SEPARATOR, resolve};
use tracing::{debug, warn};

use crate::selection::{self, SubSchemaSelection};

/// Interactive selection of subtrees of one target schema
///
/// The selected set is an antichain at all times. The derived fragment is
/// recomputed from the target on every call to [`Self::selection`], so it
/// always reflects the current state.
#[derive(Debug, Clone)]
pub struct SubschemaSelector {
    target: Arc<SchemaNode>,
    selected: BTreeSet<SchemaPath>,
}

impl SubschemaSelector {
    /// A selector over `target` with nothing selected.
    pub fn new(target: impl Into<Arc<SchemaNode>>) -> Self {
        Self {
            target: target.into(),
            selected: BTreeSet::new(),
        }
    }

    /// A selector over `target` pre-populated from a previously saved
    /// selection.
    pub fn with_seed(target: impl Into<Arc<SchemaNode>>, seed: &SubSchemaSelection) -> Self {
        let mut selector = Self::new(target);
        for path in Self::locate(&selector.target, seed) {
            // Located paths resolve by construction
            if let Err(err) = selector.select(&path) {
                warn!("Seed path '{}' rejected: {}", path, err);
            }
        }
        selector
    }

    /// Find the target paths that produced `seed`.
    ///
    /// A seed whose fragment is an object with several properties is first
    /// read as a combined selection: each property is searched for below the
    /// target path by key and schema, and the reading is kept only if the
    /// paths found extract to exactly the seed again. Otherwise the seed is
    /// read as a single selection anchored at its target path. When neither
    /// reading holds, the combined properties that can still be found are
    /// returned and the rest are skipped.
    ///
    /// Two cases cannot be told apart from the fragment alone. A seed that
    /// fits both readings, such as an object with every child selected, is
    /// read as combined. Same-named properties with equal schemas under
    /// different parents produce identical fragments, so the first of them in
    /// document order is chosen.
    pub fn locate(target: &Arc<SchemaNode>, seed: &SubSchemaSelection) -> Vec<SchemaPath> {
        let Some(fragment) = &seed.json_schema else {
            return Vec::new();
        };
        let anchor = seed.target_path.clone().unwrap_or_default();

        let found = fragment
            .as_object()
            .map(|combined| locate_combined(target, &anchor, combined))
            .unwrap_or_default();
        let complete = fragment.as_object().is_some_and(|combined| {
            combined.len() > 1 && combined.len() == found.len()
        });
        if complete {
            let rebuilt = selection::extract(target, &found.iter().cloned().collect());
            if rebuilt.json_schema.as_ref() == Some(fragment)
                && rebuilt.target_path.as_ref() == Some(&anchor)
            {
                debug!("Seed matches {} paths under '{}'", found.len(), anchor);
                return found;
            }
        }

        if resolve(target, &anchor).is_ok_and(|node| node == fragment) {
            debug!("Seed matches the node at '{}'", anchor);
            return vec![anchor];
        }

        if fragment.as_object().is_none() {
            warn!("Seed does not match the target at '{}'", anchor);
        }
        found
    }

    /// The schema selections are made against.
    pub fn target(&self) -> &Arc<SchemaNode> {
        &self.target
    }

    /// Selected paths in path order.
    pub fn selected(&self) -> &BTreeSet<SchemaPath> {
        &self.selected
    }

    pub fn is_selected(&self, path: &SchemaPath) -> bool {
        self.selected.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Select the subtree at `path`.
    ///
    /// Any selected ancestor or descendant of `path` is deselected first.
    ///
    /// # Errors
    ///
    /// Returns [`blueprint_schema::Error::PathNotFound`] if `path` does not
    /// resolve against the target; the selection is unchanged.
    pub fn select(&mut self, path: &SchemaPath) -> Result<()> {
        resolve(&self.target, path)?;

        let before = self.selected.len();
        self.selected.retain(|selected| !selected.is_related_to(path));
        if self.selected.len() != before {
            debug!(
                "Selecting '{}' replaced {} related path(s)",
                path,
                before - self.selected.len()
            );
        }
        self.selected.insert(path.clone());
        Ok(())
    }

    /// Remove `path` from the selection; returns whether it was selected.
    pub fn deselect(&mut self, path: &SchemaPath) -> bool {
        self.selected.remove(path)
    }

    /// Flip `path`; returns whether it is selected afterwards.
    ///
    /// # Errors
    ///
    /// See [`Self::select`].
    pub fn toggle(&mut self, path: &SchemaPath) -> Result<bool> {
        if self.deselect(path) {
            Ok(false)
        } else {
            self.select(path)?;
            Ok(true)
        }
    }

    /// Replace the selection with every top-level property of the target.
    pub fn select_all(&mut self) {
        let mut all = BTreeSet::new();
        if let Some(object) = container(&self.target) {
            for (key, _) in object.iter() {
                if key.contains(SEPARATOR) {
                    warn!("Property '{}' cannot be addressed by path, skipped", key);
                    continue;
                }
                if let Ok(path) = SchemaPath::root().child(key.as_str()) {
                    all.insert(path);
                }
            }
        }
        self.selected = all;
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Replace the selection with `paths`, keeping the antichain.
    ///
    /// Paths that no longer resolve are dropped; among related paths the one
    /// applied last wins.
    pub fn restore(&mut self, paths: impl IntoIterator<Item = SchemaPath>) {
        self.selected.clear();
        for path in paths {
            if let Err(err) = self.select(&path) {
                warn!("Dropping '{}' from restored selection: {}", path, err);
            }
        }
    }

    /// The fragment and anchor for the current selection.
    pub fn selection(&self) -> SubSchemaSelection {
        selection::extract(&self.target, &self.selected)
    }
}

/// Search each property of a combined fragment below `anchor`.
fn locate_combined(
    target: &SchemaNode,
    anchor: &SchemaPath,
    combined: &ObjectShape,
) -> Vec<SchemaPath> {
    let candidates: Vec<SchemaPath> = paths(target)
        .into_iter()
        .filter(|path| anchor.is_ancestor_of(path))
        .collect();

    let mut found: Vec<SchemaPath> = Vec::new();
    for (key, schema) in combined.iter() {
        let hit = candidates.iter().find(|path| {
            !found.contains(path)
                && names_match(path, anchor, key)
                && resolve(target, path).is_ok_and(|node| node == schema.as_ref())
        });
        match hit {
            Some(path) => found.push(path.clone()),
            None => warn!("Seed property '{}' not found under '{}'", key, anchor),
        }
    }
    found
}

/// Whether `key` is one of the fragment keys `path` can be given: its last
/// segment, its segments below `anchor` joined with `_`, or either of those
/// with a `_<n>` counter.
fn names_match(path: &SchemaPath, anchor: &SchemaPath, key: &str) -> bool {
    let bare = path.key().unwrap_or_default();
    let qualified = path.relative_to(anchor).map(|segments| segments.join("_"));

    let mut bases = vec![bare];
    if let Some(qualified) = qualified.as_deref() {
        bases.push(qualified);
    }
    bases.iter().any(|base| {
        key == *base
            || key
                .strip_prefix(base)
                .and_then(|rest| rest.strip_prefix('_'))
                .and_then(|counter| counter.parse::<u32>().ok())
                .is_some_and(|counter| counter >= 2)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_schema::Error;
    use serde_json::json;

    fn target() -> SchemaNode {
        SchemaNode::from_value(&json!({
            "type": "object",
            "properties": {
                "a": {
                    "type": "object",
                    "properties": {
                        "x": {"type": "string"},
                        "y": {"type": "number"}
                    }
                },
                "b": {"type": "boolean"},
                "list": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"id": {"type": "integer"}}}
                }
            }
        }))
        .unwrap()
    }

    fn path(text: &str) -> SchemaPath {
        SchemaPath::parse(text).unwrap()
    }

    fn selected(selector: &SubschemaSelector) -> Vec<String> {
        selector.selected().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_select_descendant_replaces_ancestor() {
        let mut selector = SubschemaSelector::new(target());
        selector.select(&path("a")).unwrap();
        selector.select(&path("a.x")).unwrap();

        assert_eq!(selected(&selector), vec!["a.x"]);
    }

    #[test]
    fn test_select_ancestor_replaces_descendants() {
        let mut selector = SubschemaSelector::new(target());
        selector.select(&path("a.x")).unwrap();
        selector.select(&path("a.y")).unwrap();
        selector.select(&path("b")).unwrap();
        selector.select(&path("a")).unwrap();

        assert_eq!(selected(&selector), vec!["a", "b"]);
    }

    #[test]
    fn test_select_unknown_path_is_rejected() {
        let mut selector = SubschemaSelector::new(target());
        selector.select(&path("b")).unwrap();

        assert!(matches!(
            selector.select(&path("a.z")),
            Err(Error::PathNotFound { .. })
        ));
        assert_eq!(selected(&selector), vec!["b"]);
    }

    #[test]
    fn test_toggle_and_deselect() {
        let mut selector = SubschemaSelector::new(target());

        assert!(selector.toggle(&path("list.id")).unwrap());
        assert!(selector.is_selected(&path("list.id")));
        assert!(!selector.toggle(&path("list.id")).unwrap());
        assert!(selector.is_empty());
        assert!(!selector.deselect(&path("b")));
    }

    #[test]
    fn test_select_all_is_idempotent() {
        let mut selector = SubschemaSelector::new(target());
        selector.select(&path("a.x")).unwrap();

        selector.select_all();
        let first = selector.selection();
        selector.select_all();

        assert_eq!(selected(&selector), vec!["a", "b", "list"]);
        assert_eq!(selector.selection(), first);
    }

    #[test]
    fn test_select_all_skips_dotted_keys() {
        let schema = SchemaNode::object()
            .with_property("plain", SchemaNode::string())
            .with_property("dotted.key", SchemaNode::string());
        let mut selector = SubschemaSelector::new(schema);
        selector.select_all();

        assert_eq!(selected(&selector), vec!["plain"]);
    }

    #[test]
    fn test_single_selection_is_anchored_at_its_path() {
        let mut selector = SubschemaSelector::new(target());
        selector.select(&path("a")).unwrap();
        let selection = selector.selection();

        assert_eq!(selection.target_path, Some(path("a")));
        assert_eq!(
            selection.json_schema.unwrap().to_value(),
            json!({"type": "object", "properties": {"x": {"type": "string"}, "y": {"type": "number"}}})
        );
    }

    #[test]
    fn test_selection_through_array_uses_item_properties() {
        let mut selector = SubschemaSelector::new(target());
        selector.select(&path("list.id")).unwrap();
        let selection = selector.selection();

        assert_eq!(selection.target_path, Some(path("list.id")));
        assert_eq!(selection.json_schema, Some(SchemaNode::integer()));
    }

    #[test]
    fn test_siblings_combine_under_common_prefix() {
        let mut selector = SubschemaSelector::new(target());
        selector.select(&path("a.y")).unwrap();
        selector.select(&path("a.x")).unwrap();
        let selection = selector.selection();

        assert_eq!(selection.target_path, Some(path("a")));
        assert_eq!(
            selection.json_schema.unwrap().to_value(),
            json!({"type": "object", "properties": {"x": {"type": "string"}, "y": {"type": "number"}}})
        );
    }

    #[test]
    fn test_locate_single_and_combined_seeds() {
        let schema = Arc::new(target());

        let mut single = SubschemaSelector::new(Arc::clone(&schema));
        single.select(&path("a.x")).unwrap();
        let reseeded = SubschemaSelector::with_seed(Arc::clone(&schema), &single.selection());
        assert_eq!(selected(&reseeded), vec!["a.x"]);

        let mut combined = SubschemaSelector::new(Arc::clone(&schema));
        combined.select(&path("b")).unwrap();
        combined.select(&path("list.id")).unwrap();
        let reseeded = SubschemaSelector::with_seed(Arc::clone(&schema), &combined.selection());
        assert_eq!(selected(&reseeded), vec!["b", "list.id"]);
    }

    #[test]
    fn test_locate_skips_missing_properties() {
        let seed = SubSchemaSelection {
            json_schema: Some(
                SchemaNode::object()
                    .with_property("b", SchemaNode::boolean())
                    .with_property("gone", SchemaNode::string()),
            ),
            target_path: Some(SchemaPath::root()),
        };

        let located = SubschemaSelector::locate(&Arc::new(target()), &seed);
        assert_eq!(located, vec![path("b")]);
    }

    #[test]
    fn test_locate_ignores_changed_schema() {
        let seed = SubSchemaSelection {
            json_schema: Some(SchemaNode::string()),
            target_path: Some(path("b")),
        };

        assert!(SubschemaSelector::locate(&Arc::new(target()), &seed).is_empty());
        assert!(SubschemaSelector::locate(&Arc::new(target()), &SubSchemaSelection::empty()).is_empty());
    }

    #[test]
    fn test_seed_of_every_child_stays_combined() {
        let schema = Arc::new(target());
        let mut original = SubschemaSelector::new(Arc::clone(&schema));
        original.select(&path("a.x")).unwrap();
        original.select(&path("a.y")).unwrap();

        let mut reseeded = SubschemaSelector::with_seed(Arc::clone(&schema), &original.selection());
        assert_eq!(selected(&reseeded), vec!["a.x", "a.y"]);

        assert!(!reseeded.toggle(&path("a.y")).unwrap());
        assert_eq!(selected(&reseeded), vec!["a.x"]);
    }

    #[test]
    fn test_seed_with_described_parent_stays_single() {
        let schema = Arc::new(
            SchemaNode::object().with_property(
                "a",
                SchemaNode::object()
                    .with_keyword("title", json!("A"))
                    .with_property("x", SchemaNode::string())
                    .with_property("y", SchemaNode::number()),
            ),
        );
        let mut original = SubschemaSelector::new(Arc::clone(&schema));
        original.select(&path("a")).unwrap();

        let reseeded = SubschemaSelector::with_seed(schema, &original.selection());
        assert_eq!(selected(&reseeded), vec!["a"]);
    }

    #[test]
    fn test_seed_with_colliding_keys_round_trips() {
        let schema = Arc::new(
            SchemaNode::from_value(&json!({
                "type": "object",
                "properties": {
                    "buyer": {"properties": {"id": {"type": "string"}}},
                    "seller": {"properties": {"id": {"type": "integer"}}},
                    "id": {"type": "boolean"}
                }
            }))
            .unwrap(),
        );
        let mut original = SubschemaSelector::new(Arc::clone(&schema));
        for clicked in ["buyer.id", "seller.id", "id"] {
            original.select(&path(clicked)).unwrap();
        }

        let reseeded = SubschemaSelector::with_seed(schema, &original.selection());
        assert_eq!(selected(&reseeded), vec!["buyer.id", "id", "seller.id"]);
        assert_eq!(reseeded.selection(), original.selection());
    }

    #[test]
    fn test_counter_keys_match_their_base() {
        let root = SchemaPath::root();

        assert!(names_match(&path("id"), &root, "id_2"));
        assert!(names_match(&path("seller.id"), &root, "seller_id_3"));
        assert!(!names_match(&path("id"), &root, "id_1"));
        assert!(!names_match(&path("id"), &root, "id_x"));
        assert!(!names_match(&path("id"), &root, "identifier"));
    }

    #[test]
    fn test_restore_drops_unresolvable_paths() {
        let mut selector = SubschemaSelector::new(target());
        selector.restore(vec![path("a.x"), path("missing"), path("b")]);

        assert_eq!(selected(&selector), vec!["a.x", "b"]);
    }
}
