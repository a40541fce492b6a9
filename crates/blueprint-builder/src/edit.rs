//! Copy-on-write edits
//!
//! Each function walks from the root along the path, clones only the nodes on
//! that walk (a clone copies one level of `Arc` handles, never a subtree) and
//! returns the new root. A failed edit returns an error and the input root is
//! left exactly as it was.

use std::sync::Arc;

use blueprint_schema::traversal::{container, resolve_arc};
use blueprint_schema::{
    Error, ObjectShape, Properties, Result, SchemaNode, SchemaPath, SchemaProperty, Shape, resolve,
    validate,
};
use tracing::{debug, trace};

/// The content written by an add or update
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDefinition {
    /// Schema of the property
    pub schema: SchemaNode,

    /// `Some(true)` lists the key in the parent's `required`, `Some(false)`
    /// drops it; `None` leaves `required` alone
    pub required: Option<bool>,

    /// New key for an update; the property keeps its position
    pub rename: Option<String>,
}

impl PropertyDefinition {
    /// A definition that only carries a schema.
    pub fn new(schema: SchemaNode) -> Self {
        Self {
            schema,
            required: None,
            rename: None,
        }
    }

    /// Set the `required` membership of the property.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Rename the property as part of an update.
    #[must_use]
    pub fn renamed(mut self, key: impl Into<String>) -> Self {
        self.rename = Some(key.into());
        self
    }
}

impl From<SchemaNode> for PropertyDefinition {
    fn from(schema: SchemaNode) -> Self {
        Self::new(schema)
    }
}

/// How the object at the end of a walk is reached
enum Access<'a> {
    /// The object must already exist; a miss reports the given path
    Existing(&'a SchemaPath),

    /// The object is created or promoted when missing
    Create,
}

type ObjectEdit<'e> = dyn FnMut(&mut ObjectShape) -> Result<()> + 'e;

/// Apply `edit` to the object at `at`, looking through arrays.
fn edit_object(
    node: &SchemaNode,
    at: &SchemaPath,
    access: &Access<'_>,
    edit: &mut ObjectEdit<'_>,
) -> Result<SchemaNode> {
    let mut next = node.clone();
    match &mut next.shape {
        Shape::Object(object) => edit(object)?,
        Shape::Array(array) => {
            let items = match (&array.items, access) {
                (Some(items), _) => edit_object(items, at, access, edit)?,
                (None, Access::Create) => edit_object(&SchemaNode::object(), at, access, edit)?,
                (None, Access::Existing(wanted)) => return Err(Error::path_not_found(wanted)),
            };
            array.items = Some(Arc::new(items));
        }
        Shape::Untyped => match access {
            Access::Create => {
                trace!("Promoting untyped node at '{}' to an object", at);
                let mut object = ObjectShape::new();
                edit(&mut object)?;
                next.shape = Shape::Object(object);
            }
            Access::Existing(wanted) => return Err(Error::path_not_found(wanted)),
        },
        Shape::Scalar(_) => {
            return Err(match access {
                Access::Create => Error::not_an_object(at),
                Access::Existing(wanted) => Error::path_not_found(wanted),
            });
        }
    }
    Ok(next)
}

/// Walk `rest` below `node` and apply `edit` to the object found at the end,
/// rebuilding every node on the way back up.
fn edit_container(
    node: &SchemaNode,
    rest: &[String],
    at: &SchemaPath,
    access: &Access<'_>,
    edit: &mut ObjectEdit<'_>,
) -> Result<SchemaNode> {
    let Some((segment, tail)) = rest.split_first() else {
        return edit_object(node, at, access, edit);
    };
    let child_path = at.child(segment.as_str())?;
    edit_object(node, at, &Access::Existing(&child_path), &mut |object| {
        let child = object
            .property(segment)
            .cloned()
            .ok_or_else(|| Error::path_not_found(&child_path))?;
        let rebuilt = edit_container(&child, tail, &child_path, access, edit)?;
        object
            .properties_mut()
            .insert(segment.clone(), Arc::new(rebuilt));
        Ok(())
    })
}

fn edit_parent_of(
    root: &Arc<SchemaNode>,
    parent: &SchemaPath,
    access: &Access<'_>,
    edit: &mut ObjectEdit<'_>,
) -> Result<Arc<SchemaNode>> {
    edit_container(root, parent.segments(), &SchemaPath::root(), access, edit).map(Arc::new)
}

fn split_property(path: &SchemaPath) -> Result<(SchemaPath, &str)> {
    path.split_last()
        .ok_or_else(|| Error::invalid_path(path, "the document root is not a property"))
}

fn insert_after(properties: &mut Properties, key: String, schema: Arc<SchemaNode>, after: Option<&str>) {
    match after.map(|sibling| (sibling, properties.get_index_of(sibling))) {
        Some((_, Some(index))) => {
            properties.shift_insert(index + 1, key, schema);
        }
        Some((sibling, None)) => {
            debug!("Sibling '{}' not found, appending '{}' at the end", sibling, key);
            properties.insert(key, schema);
        }
        None => {
            properties.insert(key, schema);
        }
    }
}

/// Insert a new property named by the last segment of `path` into the object
/// addressed by the rest of the path.
///
/// Untyped parents are promoted to `type: object`; array parents receive the
/// property in their item schema. `after` names the sibling to insert behind;
/// an unknown sibling appends at the end.
///
/// # Errors
///
/// - [`Error::InvalidPath`] for the root path or a definition with `rename`
/// - [`Error::PathNotFound`] if the parent does not resolve
/// - [`Error::NotAnObject`] if the parent is a scalar
/// - [`Error::PropertyExists`] if the key is already taken
/// - [`Error::InvalidShape`] if the definition breaks an invariant
pub fn add_property(
    root: &Arc<SchemaNode>,
    path: &SchemaPath,
    definition: PropertyDefinition,
    after: Option<&str>,
) -> Result<Arc<SchemaNode>> {
    let (parent, key) = split_property(path)?;
    if definition.rename.is_some() {
        return Err(Error::invalid_path(path, "a new property cannot be renamed"));
    }
    validate(&definition.schema)?;

    let schema = Arc::new(definition.schema);
    let required = definition.required.unwrap_or(false);

    let next = edit_parent_of(root, &parent, &Access::Create, &mut |object| {
        if object.property(key).is_some() {
            return Err(Error::property_exists(path));
        }
        insert_after(object.properties_mut(), key.to_string(), Arc::clone(&schema), after);
        if required {
            object.set_required(key, true);
        }
        Ok(())
    })?;

    debug!("Added property '{}'", path);
    Ok(next)
}

/// Replace the property addressed by `target.path`, keeping its position.
///
/// With `rename` set, the property moves to the new key in place, in both
/// `properties` and `required`. An update that changes nothing returns
/// `root` itself.
///
/// # Errors
///
/// - [`Error::PathNotFound`] if `target.path` no longer resolves
/// - [`Error::PropertyExists`] if the new key is taken by a sibling
/// - [`Error::InvalidPath`] for the root or an unaddressable new key
/// - [`Error::InvalidShape`] if the definition breaks an invariant
pub fn update_property(
    root: &Arc<SchemaNode>,
    target: &SchemaProperty,
    definition: PropertyDefinition,
) -> Result<Arc<SchemaNode>> {
    let (parent, key) = split_property(&target.path)?;
    validate(&definition.schema)?;

    let renamed = match definition.rename.as_deref() {
        Some(new_key) if new_key != key => Some(parent.child(new_key)?),
        _ => None,
    };

    let current = resolve_arc(root, &target.path)?;
    let was_required = resolve(root, &parent)
        .ok()
        .and_then(container)
        .is_some_and(|object| object.is_required(key));
    let required_unchanged = definition.required.is_none_or(|r| r == was_required);
    if renamed.is_none() && required_unchanged && *current == definition.schema {
        trace!("Update of '{}' changes nothing", target.path);
        return Ok(Arc::clone(root));
    }

    let schema = Arc::new(definition.schema);
    let required = definition.required;

    let next = edit_parent_of(root, &parent, &Access::Existing(&target.path), &mut |object| {
        if object.property(key).is_none() {
            return Err(Error::path_not_found(&target.path));
        }
        let final_key = match &renamed {
            None => {
                object
                    .properties_mut()
                    .insert(key.to_string(), Arc::clone(&schema));
                key
            }
            Some(renamed_path) => {
                let new_key = renamed_path.key().unwrap_or(key);
                if object.property(new_key).is_some() {
                    return Err(Error::property_exists(renamed_path));
                }
                let properties = object.properties_mut();
                let index = properties.get_index_of(key).unwrap_or(properties.len());
                properties.shift_remove(key);
                properties.shift_insert(index, new_key.to_string(), Arc::clone(&schema));
                for name in object.required.iter_mut().flatten() {
                    if name == key {
                        *name = new_key.to_string();
                    }
                }
                new_key
            }
        };
        if let Some(required) = required {
            object.set_required(final_key, required);
        }
        Ok(())
    })?;

    match &renamed {
        Some(renamed_path) => debug!("Renamed property '{}' to '{}'", target.path, renamed_path),
        None => debug!("Updated property '{}'", target.path),
    }
    Ok(next)
}

/// Delete the property at `path` and drop it from the parent's `required`.
///
/// An emptied `required` list stays in the parent as `[]`; removing a
/// property that was added as required is therefore not an exact inverse
/// of the add when the parent had no `required` keyword before.
///
/// # Errors
///
/// Returns [`Error::PathNotFound`] if the property does not exist, and
/// [`Error::InvalidPath`] for the root.
pub fn remove_property(root: &Arc<SchemaNode>, path: &SchemaPath) -> Result<Arc<SchemaNode>> {
    let (parent, key) = split_property(path)?;

    let next = edit_parent_of(root, &parent, &Access::Existing(path), &mut |object| {
        let removed = object
            .properties
            .as_mut()
            .and_then(|properties| properties.shift_remove(key));
        if removed.is_none() {
            return Err(Error::path_not_found(path));
        }
        object.set_required(key, false);
        Ok(())
    })?;

    debug!("Removed property '{}'", path);
    Ok(next)
}
