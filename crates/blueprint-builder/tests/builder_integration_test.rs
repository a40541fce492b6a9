//! Integration tests: structural sharing and edit round trips on a real schema.

use std::path::PathBuf;
use std::sync::Arc;

use blueprint_builder::{PropertyDefinition, SchemaBuilder};
use blueprint_schema::traversal::{child, paths};
use blueprint_schema::{SchemaLoader, SchemaNode, SchemaPath, resolve, validate};
use serde_json::json;

fn purchase_order() -> SchemaNode {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../testdata/schemas/purchase_order.json");
    SchemaLoader::new().load_from_file(&path).unwrap()
}

fn path(text: &str) -> SchemaPath {
    SchemaPath::parse(text).unwrap()
}

/// Every non-ancestor sibling along `edited` must be the same allocation in
/// both trees.
fn assert_shared_off_path(before: &Arc<SchemaNode>, after: &Arc<SchemaNode>, edited: &SchemaPath) {
    let mut ancestor = SchemaPath::root();
    for segment in edited.segments() {
        let old_parent = resolve(before, &ancestor).unwrap();
        let new_parent = resolve(after, &ancestor).unwrap();
        let old_container = blueprint_schema::traversal::container(old_parent).unwrap();

        for (key, old_child) in old_container.iter() {
            if key == segment {
                continue;
            }
            let new_child = child(new_parent, key).unwrap();
            assert!(
                Arc::ptr_eq(old_child, new_child),
                "sibling '{key}' under '{ancestor}' was copied"
            );
        }
        ancestor = ancestor.child(segment.as_str()).unwrap();
    }
}

#[test]
fn test_deep_update_shares_unaffected_subtrees() {
    let mut builder = SchemaBuilder::from_schema(purchase_order()).unwrap();
    let before = builder.schema();

    let target = builder.property(&path("lines.quantity")).unwrap();
    let after = builder
        .update_property(
            &target,
            SchemaNode::integer().with_keyword("minimum", json!(0)),
        )
        .unwrap();

    assert!(!Arc::ptr_eq(&before, &after));
    assert_shared_off_path(&before, &after, &target.path);

    // Definitions hang off the root and are untouched as well
    let old_defs = before.definitions.as_ref().unwrap();
    let new_defs = after.definitions.as_ref().unwrap();
    assert!(Arc::ptr_eq(&old_defs["address"], &new_defs["address"]));

    // The previous snapshot is still intact
    assert_eq!(
        resolve(&before, &path("lines.quantity")).unwrap().keywords["minimum"],
        json!(1)
    );
}

#[test]
fn test_add_then_remove_restores_empty_object() {
    let empty = SchemaNode::object();
    let definitions = [
        ("id", SchemaNode::integer()),
        ("tags", SchemaNode::array(SchemaNode::string())),
        ("nested", SchemaNode::object().with_property("a", SchemaNode::boolean())),
    ];

    for (key, definition) in definitions {
        let mut builder = SchemaBuilder::from_schema(empty.clone()).unwrap();
        builder.add_property(&path(key), definition, None).unwrap();
        builder.remove_property(&path(key)).unwrap();

        assert_eq!(*builder.schema(), empty, "add/remove of '{key}'");
    }
}

#[test]
fn test_remove_of_required_add_keeps_empty_required_list() {
    let mut builder = SchemaBuilder::from_schema(SchemaNode::object()).unwrap();
    builder
        .add_property(&path("id"), PropertyDefinition::new(SchemaNode::integer()).required(true), None)
        .unwrap();
    assert_eq!(builder.schema().to_value()["required"], json!(["id"]));

    builder.remove_property(&path("id")).unwrap();

    let schema = builder.schema();
    assert_ne!(*schema, SchemaNode::object());
    assert_eq!(schema.to_value()["required"], json!([]));
    assert!(validate(&schema).is_ok());
}

#[test]
fn test_remove_required_keeps_invariant() {
    let mut builder = SchemaBuilder::from_schema(purchase_order()).unwrap();

    builder.remove_property(&path("lines.sku")).unwrap();
    builder.remove_property(&path("orderNumber")).unwrap();

    let schema = builder.schema();
    assert!(validate(&schema).is_ok());
    assert_eq!(
        schema.as_object().unwrap().required,
        Some(vec!["lines".to_string()])
    );
    let lines = resolve(&schema, &path("lines")).unwrap();
    let items = lines.as_array().unwrap().items.as_ref().unwrap();
    assert_eq!(
        items.as_object().unwrap().required,
        Some(vec!["quantity".to_string()])
    );
}

#[test]
fn test_constraints_pass_through_edits() {
    let mut builder = SchemaBuilder::from_schema(purchase_order()).unwrap();
    builder
        .add_property(
            &path("buyer.vat"),
            PropertyDefinition::new(SchemaNode::string().with_keyword("pattern", json!("^[A-Z]{2}"))),
            Some("name"),
        )
        .unwrap();

    let schema = builder.schema().to_value();
    assert_eq!(schema["properties"]["currency"]["enum"], json!(["EUR", "USD", "GBP"]));
    assert_eq!(schema["properties"]["orderNumber"]["pattern"], json!("^PO-[0-9]+$"));
    assert_eq!(schema["title"], json!("Purchase Order"));

    let order: Vec<String> = paths(&builder.schema())
        .iter()
        .filter(|p| p.len() == 2 && p.segments()[0] == "buyer")
        .map(ToString::to_string)
        .collect();
    assert_eq!(order, vec!["buyer.name", "buyer.vat", "buyer.gln"]);
}

#[test]
fn test_export_after_edits_is_lossless() -> anyhow::Result<()> {
    let mut builder = SchemaBuilder::from_schema(purchase_order())?;
    builder.add_property(&path("notes"), SchemaNode::string(), Some("buyer"))?;

    let exported = blueprint_schema::to_json(&builder.schema(), false)?;
    let reloaded = SchemaLoader::new().load_from_json(&exported)?;

    assert_eq!(reloaded, *builder.schema());
    assert_eq!(blueprint_schema::to_json(&reloaded, false)?, exported);
    Ok(())
}
