#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # blueprint-session
//!
//! Binds a schema builder or a subschema selector to a versioned working
//! value with dirty tracking and reset-to-seed.
//!
//! A session is owned by exactly one editing surface. It holds the seed it
//! was bound to, the workspace, a version counter and a dirty flag.

pub mod session;
pub mod workspace;

pub use session::{BuilderSession, EditSession, SelectorSession, Snapshot};
pub use workspace::Workspace;

pub use blueprint_schema::{Error, Result};
