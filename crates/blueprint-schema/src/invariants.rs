//! Tree invariants
//!
//! Array and object shapes are mutually exclusive by construction of
//! [`Shape`], so the only invariant left to check at runtime is that every
//! name in a `required` list is declared in the sibling `properties` map.

use crate::model::{SchemaNode, Shape};
use crate::{Error, Result};

/// Check every invariant of `node` and of all its subtrees, including
/// `definitions`.
///
/// # Errors
///
/// Returns [`Error::InvalidShape`] naming the first offending node.
pub fn validate(node: &SchemaNode) -> Result<()> {
    validate_at(node, "")
}

fn validate_at(node: &SchemaNode, at: &str) -> Result<()> {
    match &node.shape {
        Shape::Object(object) => {
            for name in object.required.iter().flatten() {
                if object.property(name).is_none() {
                    return Err(Error::invalid_shape(
                        at,
                        format!("required property `{name}` is not declared in `properties`"),
                    ));
                }
            }
            for (key, child) in object.iter() {
                let location = if at.is_empty() {
                    key.clone()
                } else {
                    format!("{at}.{key}")
                };
                validate_at(child, &location)?;
            }
        }
        Shape::Array(array) => {
            if let Some(items) = &array.items {
                validate_at(items, &format!("{at}[]"))?;
            }
        }
        Shape::Untyped | Shape::Scalar(_) => {}
    }

    for (name, definition) in node.definitions.iter().flatten() {
        validate_at(definition, &format!("{at}#/definitions/{name}"))?;
    }
    Ok(())
}
