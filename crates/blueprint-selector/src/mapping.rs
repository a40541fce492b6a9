//! Persisted mapping records the engines read seeds from and write back to

use blueprint_schema::{SchemaNode, SchemaPath, default_schema};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::selection::SubSchemaSelection;

fn default_file_type() -> Option<String> {
    Some("JSON".to_string())
}

/// One source of a blueprint: an input schema and the fragment of the output
/// schema it feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapping {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "default_file_type")]
    pub file_type: Option<String>,

    #[serde(default = "default_schema")]
    pub input_json_schema: SchemaNode,

    /// The fragment produced by the last saved selection.
    #[serde(default = "default_schema")]
    pub output_json_schema: SchemaNode,

    #[serde(default)]
    pub jsonata_mapping: Option<String>,

    #[serde(default)]
    pub model_id: Option<String>,

    /// Anchor of `output_json_schema` in the blueprint output; empty for the
    /// document root.
    #[serde(default)]
    pub target_path: SchemaPath,
}

impl Default for SourceMapping {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            file_type: default_file_type(),
            input_json_schema: default_schema(),
            output_json_schema: default_schema(),
            jsonata_mapping: None,
            model_id: None,
            target_path: SchemaPath::root(),
        }
    }
}

impl SourceMapping {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// The saved selection, as a seed for a selector.
    pub fn seed_selection(&self) -> SubSchemaSelection {
        SubSchemaSelection {
            json_schema: Some(self.output_json_schema.clone()),
            target_path: Some(self.target_path.clone()),
        }
    }

    /// Store `selection` as this mapping's output fragment.
    ///
    /// An empty selection resets the fragment to the default schema. Returns
    /// whether the stored fragment or anchor changed; a generated JSONata
    /// expression is kept either way.
    pub fn apply_selection(&mut self, selection: &SubSchemaSelection) -> bool {
        let schema = selection
            .json_schema
            .clone()
            .unwrap_or_else(default_schema);
        let target_path = selection.target_path.clone().unwrap_or_default();

        if schema == self.output_json_schema && target_path == self.target_path {
            return false;
        }
        debug!(
            "Mapping {:?} now targets '{}'",
            self.name.as_deref().unwrap_or("<unnamed>"),
            target_path
        );
        self.output_json_schema = schema;
        self.target_path = target_path;
        true
    }
}

/// The output schema of a blueprint, edited with the schema builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDefinition {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_schema")]
    pub json_schema: SchemaNode,
}

impl Default for OutputDefinition {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            description: None,
            json_schema: default_schema(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SubschemaSelector;
    use serde_json::json;

    #[test]
    fn test_defaults_when_fields_are_missing() {
        let mapping: SourceMapping = serde_json::from_value(json!({"id": 7})).unwrap();

        assert_eq!(mapping.id, Some(7));
        assert_eq!(mapping.file_type.as_deref(), Some("JSON"));
        assert!(mapping.target_path.is_root());
        assert_eq!(mapping.output_json_schema, default_schema());

        let definition: OutputDefinition = serde_json::from_value(json!({})).unwrap();
        assert_eq!(definition, OutputDefinition::default());
    }

    #[test]
    fn test_field_names_are_camel_case() {
        let mapping = SourceMapping::new("orders");
        let value = serde_json::to_value(&mapping).unwrap();

        assert_eq!(value["targetPath"], json!(""));
        assert_eq!(value["fileType"], json!("JSON"));
        assert!(value.get("outputJsonSchema").is_some());
        assert!(value.get("jsonataMapping").is_some());
    }

    #[test]
    fn test_fresh_mapping_seeds_nothing() {
        let target = SchemaNode::object().with_property("a", SchemaNode::string());
        let mapping = SourceMapping::new("fresh");

        let selector = SubschemaSelector::with_seed(target, &mapping.seed_selection());
        assert!(selector.is_empty());
    }

    #[test]
    fn test_apply_then_seed_restores_selection() {
        let target = SchemaNode::object()
            .with_property("a", SchemaNode::string())
            .with_property("b", SchemaNode::object().with_property("c", SchemaNode::number()));
        let mut selector = SubschemaSelector::new(target.clone());
        selector.select(&SchemaPath::parse("b.c").unwrap()).unwrap();

        let mut mapping = SourceMapping::new("orders");
        assert!(mapping.apply_selection(&selector.selection()));
        assert!(!mapping.apply_selection(&selector.selection()));
        assert_eq!(mapping.target_path.to_string(), "b.c");

        let reseeded = SubschemaSelector::with_seed(target, &mapping.seed_selection());
        assert_eq!(reseeded.selected(), selector.selected());
    }

    #[test]
    fn test_empty_selection_resets_fragment() {
        let mut mapping = SourceMapping::new("orders");
        mapping.output_json_schema = SchemaNode::string();
        mapping.target_path = SchemaPath::parse("x").unwrap();

        assert!(mapping.apply_selection(&SubSchemaSelection::empty()));
        assert_eq!(mapping.output_json_schema, default_schema());
        assert!(mapping.target_path.is_root());
    }
}
