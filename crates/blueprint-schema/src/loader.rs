//! Schema loading, draft-07 normalization and export

use std::path::Path;

use serde_json::{Value, json};
use tracing::{debug, info, trace};

use crate::invariants::validate;
use crate::model::{SchemaNode, Shape};
use crate::{Error, Result};

/// `$schema` URI stamped on normalized documents.
pub const JSON_SCHEMA_DRAFT7_URI: &str = "http://json-schema.org/draft-07/schema#";

/// The schema a new input or output definition starts from.
pub fn default_schema_value() -> Value {
    json!({
        "$schema": JSON_SCHEMA_DRAFT7_URI,
        "type": "object",
        "properties": {},
        "required": []
    })
}

/// [`default_schema_value`] as a tree.
pub fn default_schema() -> SchemaNode {
    let mut node = SchemaNode::object();
    node.keywords
        .insert("$schema".to_string(), Value::String(JSON_SCHEMA_DRAFT7_URI.into()));
    if let Shape::Object(object) = &mut node.shape {
        object.required = Some(Vec::new());
    }
    node
}

/// Apply the draft-07 defaults to a root document in place.
///
/// Sets `$schema`, gives a root `object` an empty `properties` map and gives
/// a root `array` a default object item schema (also replacing tuple
/// `items`). Nested nodes are left as they are. Non-object values are left
/// untouched so that parsing reports them.
pub fn normalize_draft7(value: &mut Value) {
    let Value::Object(map) = value else {
        return;
    };

    map.insert(
        "$schema".to_string(),
        Value::String(JSON_SCHEMA_DRAFT7_URI.to_string()),
    );

    match map.get("type").and_then(Value::as_str) {
        Some("object") => {
            map.entry("properties").or_insert_with(|| json!({}));
        }
        Some("array") => {
            let needs_items = map.get("items").is_none_or(Value::is_array);
            if needs_items {
                map.insert(
                    "items".to_string(),
                    json!({"type": "object", "properties": {}}),
                );
            }
        }
        _ => {}
    }
}

/// Loads schema documents from JSON or YAML
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader {
    normalize: bool,
}

impl SchemaLoader {
    /// Create a loader that keeps documents as written
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply [`normalize_draft7`] before parsing
    #[must_use]
    pub fn with_normalization(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Load a schema from a file; `.yaml`/`.yml` files are read as YAML,
    /// everything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns an I/O, format, shape or invariant error.
    pub fn load_from_file(&self, path: &Path) -> Result<SchemaNode> {
        trace!("Loading schema from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;

        let schema = if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            self.load_from_yaml(&content)?
        } else {
            self.load_from_json(&content)?
        };
        info!("Loaded schema from {}", path.display());
        Ok(schema)
    }

    /// Load a schema from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns a format, shape or invariant error.
    pub fn load_from_json(&self, json: &str) -> Result<SchemaNode> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| Error::InvalidFormat(format!("JSON parse error: {e}")))?;
        self.load_from_value(value)
    }

    /// Load a schema from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns a format, shape or invariant error.
    pub fn load_from_yaml(&self, yaml: &str) -> Result<SchemaNode> {
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| Error::InvalidFormat(format!("YAML parse error: {e}")))?;
        self.load_from_value(value)
    }

    /// Load a schema from an already parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns a shape or invariant error.
    pub fn load_from_value(&self, mut value: Value) -> Result<SchemaNode> {
        if self.normalize {
            debug!("Applying draft-07 defaults");
            normalize_draft7(&mut value);
        }
        let schema = SchemaNode::from_value(&value)?;
        validate(&schema)?;
        Ok(schema)
    }
}

/// Export a tree as UTF-8 JSON, keeping `properties` in insertion order.
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`] if serialization fails.
pub fn to_json(schema: &SchemaNode, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(schema)
    } else {
        serde_json::to_string(schema)
    };
    rendered.map_err(|e| Error::InvalidFormat(format!("JSON write error: {e}")))
}
