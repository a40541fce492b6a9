#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # blueprint-builder
//!
//! Structural editor for schema trees.
//!
//! Every edit takes the current root and returns a new root. Only the
//! ancestor chain of the edited property is rebuilt; siblings and unrelated
//! subtrees are the very same `Arc`s as in the previous version, so a host can
//! skip unchanged branches with a pointer comparison.

pub mod builder;
pub mod edit;

pub use builder::SchemaBuilder;
pub use edit::{PropertyDefinition, add_property, remove_property, update_property};

pub use blueprint_schema::{Error, Result};
