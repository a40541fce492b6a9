//! Schema node model
//!
//! The model keeps only the structural keywords (`type`, `properties`,
//! `required`, `items`, `definitions`) as typed fields. Every other keyword is
//! carried verbatim in [`SchemaNode::keywords`] and is never interpreted.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Ordered child schemas keyed by property (or definition) name.
pub type Properties = IndexMap<String, Arc<SchemaNode>>;

/// Pass-through keywords in document order.
pub type Keywords = IndexMap<String, Value>;

const STRUCTURAL_KEYWORDS: [&str; 5] = ["type", "properties", "required", "items", "definitions"];

/// The JSON Schema primitive type names supported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    Object,
    Array,
}

/// Type names that never hold children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl SchemaType {
    /// Keyword spelling of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Null => "null",
            SchemaType::Object => "object",
            SchemaType::Array => "array",
        }
    }

    /// Parse a `type` keyword value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(SchemaType::String),
            "number" => Some(SchemaType::Number),
            "integer" => Some(SchemaType::Integer),
            "boolean" => Some(SchemaType::Boolean),
            "null" => Some(SchemaType::Null),
            "object" => Some(SchemaType::Object),
            "array" => Some(SchemaType::Array),
            _ => None,
        }
    }

    /// The scalar form of this type, if it has one.
    pub fn scalar(self) -> Option<ScalarType> {
        match self {
            SchemaType::String => Some(ScalarType::String),
            SchemaType::Number => Some(ScalarType::Number),
            SchemaType::Integer => Some(ScalarType::Integer),
            SchemaType::Boolean => Some(ScalarType::Boolean),
            SchemaType::Null => Some(ScalarType::Null),
            SchemaType::Object | SchemaType::Array => None,
        }
    }
}

impl From<ScalarType> for SchemaType {
    fn from(scalar: ScalarType) -> Self {
        match scalar {
            ScalarType::String => SchemaType::String,
            ScalarType::Number => SchemaType::Number,
            ScalarType::Integer => SchemaType::Integer,
            ScalarType::Boolean => SchemaType::Boolean,
            ScalarType::Null => SchemaType::Null,
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural shape of a node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Shape {
    /// No `type` and no structural keywords
    #[default]
    Untyped,

    /// A leaf with a scalar `type`
    Scalar(ScalarType),

    /// An object-shaped node (explicit `type: object`, or `properties`/`required` present)
    Object(ObjectShape),

    /// An array-shaped node with a single homogeneous item schema
    Array(ArrayShape),
}

/// Object body: ordered properties plus the required list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectShape {
    /// Whether `"type": "object"` is written out
    pub typed: bool,

    /// Child schemas; `None` when the `properties` keyword is absent
    pub properties: Option<Properties>,

    /// Required property names; `None` when the `required` keyword is absent
    pub required: Option<Vec<String>>,
}

/// Array body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayShape {
    /// Whether `"type": "array"` is written out
    pub typed: bool,

    /// Item schema; `None` when the `items` keyword is absent
    pub items: Option<Arc<SchemaNode>>,
}

/// One node of a JSON Schema document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaNode {
    /// Shape and structural children
    pub shape: Shape,

    /// Reusable sub-schemas, kept opaque
    pub definitions: Option<Properties>,

    /// Every non-structural keyword, passed through unmodified
    pub keywords: Keywords,
}

impl ObjectShape {
    /// An explicitly typed object with an empty `properties` map.
    pub fn new() -> Self {
        Self {
            typed: true,
            properties: Some(Properties::new()),
            required: None,
        }
    }

    /// Look up a direct child.
    pub fn property(&self, key: &str) -> Option<&Arc<SchemaNode>> {
        self.properties.as_ref().and_then(|p| p.get(key))
    }

    /// Iterate the direct children in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<SchemaNode>)> {
        self.properties.iter().flat_map(|p| p.iter())
    }

    /// Number of declared properties.
    pub fn len(&self) -> usize {
        self.properties.as_ref().map_or(0, |p| p.len())
    }

    /// Whether no property is declared.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `properties` map, created empty when absent.
    pub fn properties_mut(&mut self) -> &mut Properties {
        self.properties.get_or_insert_with(Properties::new)
    }

    /// Whether `key` is listed in `required`.
    pub fn is_required(&self, key: &str) -> bool {
        self.required
            .as_ref()
            .is_some_and(|names| names.iter().any(|name| name == key))
    }

    /// Add `key` to or drop it from `required`.
    ///
    /// Adding a name that is already listed, or dropping one that is not, is
    /// a no-op. Dropping never removes the `required` keyword itself, so an
    /// object that gained the keyword through an add keeps `required: []`
    /// after its last required name is dropped.
    pub fn set_required(&mut self, key: &str, required: bool) {
        if required {
            if !self.is_required(key) {
                self.required
                    .get_or_insert_with(Vec::new)
                    .push(key.to_string());
            }
        } else if let Some(names) = self.required.as_mut() {
            names.retain(|name| name != key);
        }
    }
}

impl SchemaNode {
    /// A node with no type and no keywords (`{}`).
    pub fn untyped() -> Self {
        Self::default()
    }

    /// A scalar leaf of the given type.
    pub fn scalar(scalar: ScalarType) -> Self {
        Self {
            shape: Shape::Scalar(scalar),
            ..Self::default()
        }
    }

    /// `{"type": "string"}`
    pub fn string() -> Self {
        Self::scalar(ScalarType::String)
    }

    /// `{"type": "number"}`
    pub fn number() -> Self {
        Self::scalar(ScalarType::Number)
    }

    /// `{"type": "integer"}`
    pub fn integer() -> Self {
        Self::scalar(ScalarType::Integer)
    }

    /// `{"type": "boolean"}`
    pub fn boolean() -> Self {
        Self::scalar(ScalarType::Boolean)
    }

    /// `{"type": "object", "properties": {}}`
    pub fn object() -> Self {
        Self {
            shape: Shape::Object(ObjectShape::new()),
            ..Self::default()
        }
    }

    /// `{"type": "array", "items": <items>}`
    pub fn array(items: SchemaNode) -> Self {
        Self {
            shape: Shape::Array(ArrayShape {
                typed: true,
                items: Some(Arc::new(items)),
            }),
            ..Self::default()
        }
    }

    /// Add a pass-through keyword. Structural keyword names are ignored;
    /// those are expressed through [`Shape`].
    #[must_use]
    pub fn with_keyword(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if !STRUCTURAL_KEYWORDS.contains(&key.as_str()) {
            self.keywords.insert(key, value);
        }
        self
    }

    /// Append a property, turning the node into an explicit object first if
    /// it is not object-shaped.
    #[must_use]
    pub fn with_property(self, key: impl Into<String>, child: SchemaNode) -> Self {
        let key = key.into();
        self.map_object(|object| {
            object.properties_mut().insert(key, Arc::new(child));
        })
    }

    /// Mark a property as required, turning the node into an object first
    /// if needed.
    #[must_use]
    pub fn with_required(self, key: &str) -> Self {
        self.map_object(|object| object.set_required(key, true))
    }

    fn map_object(mut self, edit: impl FnOnce(&mut ObjectShape)) -> Self {
        let mut object = match std::mem::take(&mut self.shape) {
            Shape::Object(object) => object,
            _ => ObjectShape::new(),
        };
        edit(&mut object);
        self.shape = Shape::Object(object);
        self
    }

    /// The effective `type`, whether written out or implied by the shape.
    pub fn schema_type(&self) -> Option<SchemaType> {
        match &self.shape {
            Shape::Untyped => None,
            Shape::Scalar(scalar) => Some((*scalar).into()),
            Shape::Object(_) => Some(SchemaType::Object),
            Shape::Array(_) => Some(SchemaType::Array),
        }
    }

    fn declared_type(&self) -> Option<SchemaType> {
        match &self.shape {
            Shape::Object(object) if !object.typed => None,
            Shape::Array(array) if !array.typed => None,
            _ => self.schema_type(),
        }
    }

    /// The object body, if this node is object-shaped.
    pub fn as_object(&self) -> Option<&ObjectShape> {
        match &self.shape {
            Shape::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The array body, if this node is array-shaped.
    pub fn as_array(&self) -> Option<&ArrayShape> {
        match &self.shape {
            Shape::Array(array) => Some(array),
            _ => None,
        }
    }

    /// The `title` keyword, if it is a string.
    pub fn title(&self) -> Option<&str> {
        self.keywords.get("title").and_then(Value::as_str)
    }

    /// The `description` keyword, if it is a string.
    pub fn description(&self) -> Option<&str> {
        self.keywords.get("description").and_then(Value::as_str)
    }

    /// Parse a node from a JSON value.
    ///
    /// Only the shape is checked here; the `required` invariant is checked by
    /// [`crate::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidShape`] for boolean schemas, non-object nodes,
    /// type unions, tuple `items`, nodes declaring both `items` and
    /// `properties`, and `type` values that contradict the structural keywords.
    pub fn from_value(value: &Value) -> Result<Self> {
        parse_node(value, "")
    }

    /// Convert the node back to a JSON value.
    ///
    /// Keys are written as `type`, the pass-through keywords in their original
    /// order, then `properties`, `required`, `items` and `definitions`.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(schema_type) = self.declared_type() {
            map.insert("type".to_string(), Value::String(schema_type.as_str().into()));
        }
        for (key, value) in &self.keywords {
            map.insert(key.clone(), value.clone());
        }
        match &self.shape {
            Shape::Object(object) => {
                if let Some(properties) = &object.properties {
                    map.insert("properties".to_string(), children_to_value(properties));
                }
                if let Some(required) = &object.required {
                    map.insert(
                        "required".to_string(),
                        Value::Array(required.iter().cloned().map(Value::String).collect()),
                    );
                }
            }
            Shape::Array(array) => {
                if let Some(items) = &array.items {
                    map.insert("items".to_string(), items.to_value());
                }
            }
            Shape::Untyped | Shape::Scalar(_) => {}
        }
        if let Some(definitions) = &self.definitions {
            map.insert("definitions".to_string(), children_to_value(definitions));
        }
        Value::Object(map)
    }
}

fn children_to_value(children: &Properties) -> Value {
    Value::Object(
        children
            .iter()
            .map(|(key, child)| (key.clone(), child.to_value()))
            .collect(),
    )
}

fn child_location(at: &str, key: &str) -> String {
    if at.is_empty() {
        key.to_string()
    } else {
        format!("{at}.{key}")
    }
}

fn parse_node(value: &Value, at: &str) -> Result<SchemaNode> {
    let map = match value {
        Value::Object(map) => map,
        Value::Bool(_) => {
            return Err(Error::invalid_shape(at, "boolean schemas are not supported"));
        }
        _ => return Err(Error::invalid_shape(at, "a schema must be a JSON object")),
    };

    let mut schema_type = None;
    let mut properties = None;
    let mut required = None;
    let mut items = None;
    let mut definitions = None;
    let mut keywords = Keywords::new();

    for (key, entry) in map {
        match key.as_str() {
            "type" => schema_type = Some(parse_type(entry, at)?),
            "properties" => properties = Some(parse_children(entry, at, "properties")?),
            "required" => required = Some(parse_required(entry, at)?),
            "items" => items = Some(Arc::new(parse_items(entry, at)?)),
            "definitions" => definitions = Some(parse_children(entry, at, "definitions")?),
            _ => {
                keywords.insert(key.clone(), entry.clone());
            }
        }
    }

    let object_keywords = properties.is_some() || required.is_some();
    if object_keywords && items.is_some() {
        return Err(Error::invalid_shape(
            at,
            "a node cannot declare both `items` and `properties`",
        ));
    }

    let shape = match schema_type {
        None if object_keywords => Shape::Object(ObjectShape {
            typed: false,
            properties,
            required,
        }),
        None if items.is_some() => Shape::Array(ArrayShape {
            typed: false,
            items,
        }),
        None => Shape::Untyped,
        Some(SchemaType::Object) if items.is_none() => Shape::Object(ObjectShape {
            typed: true,
            properties,
            required,
        }),
        Some(SchemaType::Array) if !object_keywords => Shape::Array(ArrayShape { typed: true, items }),
        Some(other) => match other.scalar() {
            Some(scalar) if !object_keywords && items.is_none() => Shape::Scalar(scalar),
            _ => {
                return Err(Error::invalid_shape(
                    at,
                    format!("type `{other}` contradicts the structural keywords of the node"),
                ));
            }
        },
    };

    Ok(SchemaNode {
        shape,
        definitions,
        keywords,
    })
}

fn parse_type(value: &Value, at: &str) -> Result<SchemaType> {
    match value {
        Value::String(name) => SchemaType::from_name(name)
            .ok_or_else(|| Error::invalid_shape(at, format!("unknown type `{name}`"))),
        Value::Array(_) => Err(Error::invalid_shape(at, "type unions are not supported")),
        _ => Err(Error::invalid_shape(at, "`type` must be a string")),
    }
}

fn parse_children(value: &Value, at: &str, keyword: &str) -> Result<Properties> {
    let Value::Object(map) = value else {
        return Err(Error::invalid_shape(at, format!("`{keyword}` must be an object")));
    };
    map.iter()
        .map(|(key, child)| {
            let location = if keyword == "properties" {
                child_location(at, key)
            } else {
                format!("{at}#/{keyword}/{key}")
            };
            parse_node(child, &location).map(|node| (key.clone(), Arc::new(node)))
        })
        .collect()
}

fn parse_required(value: &Value, at: &str) -> Result<Vec<String>> {
    let Value::Array(names) = value else {
        return Err(Error::invalid_shape(at, "`required` must be an array of names"));
    };
    names
        .iter()
        .map(|name| {
            name.as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::invalid_shape(at, "`required` entries must be strings"))
        })
        .collect()
}

fn parse_items(value: &Value, at: &str) -> Result<SchemaNode> {
    if value.is_array() {
        return Err(Error::invalid_shape(at, "tuple `items` arrays are not supported"));
    }
    parse_node(value, &format!("{at}[]"))
}

struct ChildrenRef<'a>(&'a Properties);

impl Serialize for ChildrenRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, child) in self.0 {
            map.serialize_entry(key, child.as_ref())?;
        }
        map.end()
    }
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(schema_type) = self.declared_type() {
            map.serialize_entry("type", schema_type.as_str())?;
        }
        for (key, value) in &self.keywords {
            map.serialize_entry(key, value)?;
        }
        match &self.shape {
            Shape::Object(object) => {
                if let Some(properties) = &object.properties {
                    map.serialize_entry("properties", &ChildrenRef(properties))?;
                }
                if let Some(required) = &object.required {
                    map.serialize_entry("required", required)?;
                }
            }
            Shape::Array(array) => {
                if let Some(items) = &array.items {
                    map.serialize_entry("items", items.as_ref())?;
                }
            }
            Shape::Untyped | Shape::Scalar(_) => {}
        }
        if let Some(definitions) = &self.definitions {
            map.serialize_entry("definitions", &ChildrenRef(definitions))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SchemaNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        SchemaNode::from_value(&value).map_err(serde::de::Error::custom)
    }
}
