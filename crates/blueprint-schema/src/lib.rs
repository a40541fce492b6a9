#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # blueprint-schema
//!
//! Recursive JSON Schema tree and path addressing for mapping blueprints.
//!
//! A [`SchemaNode`] is a tagged union over its shape (object, array, scalar,
//! untyped). Children live behind [`std::sync::Arc`] so that an edit only
//! rebuilds the ancestor chain of the node it touches; every other subtree is
//! shared with the previous version of the tree.
//!
//! Paths ([`SchemaPath`]) traverse `properties` only. An array and its `items`
//! schema occupy the same path, so `orders.id` addresses the `id` property of
//! the item schema of the `orders` array.

/// Invariant checks run after structural edits.
pub mod invariants;
/// JSON/YAML loading, draft-07 normalization and export.
pub mod loader;
/// Schema node model and its JSON conversion.
pub mod model;
/// Path addressing and property handles.
pub mod path;
/// Path resolution and document-order walks.
pub mod traversal;

pub use invariants::validate;
pub use loader::{
    JSON_SCHEMA_DRAFT7_URI, SchemaLoader, default_schema, default_schema_value, normalize_draft7,
    to_json,
};
pub use model::{
    ArrayShape, Keywords, ObjectShape, Properties, ScalarType, SchemaNode, SchemaType, Shape,
};
pub use path::{SchemaPath, SchemaProperty};
pub use traversal::{Visitor, resolve, walk};

use thiserror::Error;

/// Errors raised by schema trees and the engines built on them.
///
/// Every variant names the offending location. None of them is fatal: an
/// operation that fails leaves the tree it was given untouched.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Path not found: '{path}'")]
    PathNotFound { path: String },

    #[error("Node at '{path}' is not an object and cannot hold properties")]
    NotAnObject { path: String },

    #[error("Invalid shape at '{path}': {reason}")]
    InvalidShape { path: String, reason: String },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Property already exists: '{path}'")]
    PropertyExists { path: String },

    #[error("Invalid schema format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a path-not-found error.
    pub fn path_not_found(path: impl ToString) -> Self {
        Self::PathNotFound {
            path: path.to_string(),
        }
    }

    /// Build a not-an-object error for the node that was expected to hold properties.
    pub fn not_an_object(path: impl ToString) -> Self {
        Self::NotAnObject {
            path: path.to_string(),
        }
    }

    /// Build an invalid-shape error with the reason the node was rejected.
    pub fn invalid_shape(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Build an invalid-path error with the reason the path was rejected.
    pub fn invalid_path(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Build a property-exists error.
    pub fn property_exists(path: impl ToString) -> Self {
        Self::PropertyExists {
            path: path.to_string(),
        }
    }
}

/// Crate-local result type for schema operations.
pub type Result<T> = std::result::Result<T, Error>;
