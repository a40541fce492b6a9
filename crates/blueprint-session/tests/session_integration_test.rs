//! Integration tests: an output definition edited in one session and a
//! source mapping selected against it in another.

use std::path::PathBuf;
use std::sync::Arc;

use blueprint_builder::{PropertyDefinition, SchemaBuilder};
use blueprint_schema::{SchemaLoader, SchemaNode, SchemaPath, resolve};
use blueprint_selector::{OutputDefinition, SourceMapping, SubschemaSelector};
use blueprint_session::{BuilderSession, SelectorSession};
use serde_json::json;

fn fixture(name: &str) -> SchemaNode {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../testdata/schemas")
        .join(name);
    SchemaLoader::new().load_from_file(&path).unwrap()
}

fn path(text: &str) -> SchemaPath {
    SchemaPath::parse(text).unwrap()
}

#[test]
fn test_edit_output_definition_then_reset() -> anyhow::Result<()> {
    let definition = OutputDefinition {
        name: Some("Orders".to_string()),
        json_schema: fixture("purchase_order.json"),
        ..OutputDefinition::default()
    };
    let mut session = BuilderSession::bind(SchemaBuilder::from_schema(definition.json_schema)?);
    let seed = Arc::clone(session.seed());

    session.apply(|builder| {
        builder.add_property(
            &path("buyer.email"),
            PropertyDefinition::new(SchemaNode::string().with_keyword("format", json!("email")))
                .required(true),
            None,
        )
    })?;
    let snapshot = session.apply(|builder| builder.remove_property(&path("orderDate")))?;

    assert!(snapshot.is_dirty);
    assert_eq!(snapshot.version, 2);
    assert!(resolve(&snapshot.value, &path("buyer.email")).is_ok());
    // Unedited subtrees are shared with the seed
    assert!(Arc::ptr_eq(
        blueprint_schema::traversal::child(&seed, "lines").unwrap(),
        blueprint_schema::traversal::child(&snapshot.value, "lines").unwrap(),
    ));

    let reset = session.reset(None)?;
    assert!(!reset.is_dirty);
    assert!(Arc::ptr_eq(&reset.value, &seed));
    Ok(())
}

#[test]
fn test_selection_saved_to_mapping_reseeds_clean() -> anyhow::Result<()> {
    let target = Arc::new(fixture("customer.yaml"));
    let mut mapping = SourceMapping::new("customers");

    let mut session = SelectorSession::bind(SubschemaSelector::with_seed(
        Arc::clone(&target),
        &mapping.seed_selection(),
    ));
    assert!(!session.can_save());

    session.apply(|selector| selector.select(&path("contact.email")))?;
    session.apply(|selector| selector.select(&path("customerId")))?;
    assert!(session.can_save());
    assert!(mapping.apply_selection(&session.selection()));
    assert!(mapping.target_path.is_root());

    // Opening the saved mapping again lands on the same selection
    let reopened = SelectorSession::bind(SubschemaSelector::with_seed(
        Arc::clone(&target),
        &mapping.seed_selection(),
    ));
    assert_eq!(reopened.seed(), session.workspace().selected());
    assert!(!reopened.is_dirty());
    assert!(!reopened.can_save());
    Ok(())
}

#[test]
fn test_selector_rebind_follows_other_mapping() {
    let target = Arc::new(fixture("customer.yaml"));
    let mut session = SelectorSession::bind(SubschemaSelector::new(Arc::clone(&target)));
    session
        .apply(|selector| selector.select(&path("active")))
        .unwrap();

    let other: std::collections::BTreeSet<SchemaPath> = [path("contact")].into_iter().collect();
    let snapshot = session.rebind(other.clone()).unwrap();

    assert_eq!(snapshot.value, other);
    assert!(!snapshot.is_dirty);
    assert!(!session.can_save());
}
