#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # blueprint-selector
//!
//! Selection of subtrees of a target schema and their extraction into a
//! fragment anchored in an output schema.
//!
//! The selection is always an antichain: no selected path is an ancestor of
//! another. Selecting a node deselects every selected ancestor and
//! descendant of it.

pub mod mapping;
pub mod selection;
pub mod selector;

pub use mapping::{OutputDefinition, SourceMapping};
pub use selection::SubSchemaSelection;
pub use selector::SubschemaSelector;

pub use blueprint_schema::{Error, Result};
