//! Schema builder bound to a working tree

use std::sync::Arc;

use blueprint_schema::traversal::resolve_arc;
use blueprint_schema::{Result, SchemaNode, SchemaPath, SchemaProperty, validate};
use tracing::debug;

use crate::edit::{self, PropertyDefinition};

/// Structural editor over one working tree
///
/// The builder owns nothing but the current root. Every mutating call
/// replaces that root with the value returned by the matching function in
/// [`crate::edit`]; a failing call leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    root: Arc<SchemaNode>,
}

impl SchemaBuilder {
    /// A builder over an empty schema (`{}`)
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder over the given tree.
    ///
    /// # Errors
    ///
    /// Returns [`blueprint_schema::Error::InvalidShape`] if the tree breaks an
    /// invariant.
    pub fn from_schema(schema: impl Into<Arc<SchemaNode>>) -> Result<Self> {
        let mut builder = Self::new();
        builder.set_schema(schema)?;
        Ok(builder)
    }

    /// Replace the working tree wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`blueprint_schema::Error::InvalidShape`] if the tree breaks an
    /// invariant; the previous tree is kept.
    pub fn set_schema(&mut self, next: impl Into<Arc<SchemaNode>>) -> Result<Arc<SchemaNode>> {
        let next = next.into();
        validate(&next)?;
        debug!("Builder bound to a new schema");
        self.root = next;
        Ok(Arc::clone(&self.root))
    }

    /// The current working tree.
    pub fn schema(&self) -> Arc<SchemaNode> {
        Arc::clone(&self.root)
    }

    /// Borrow the current working tree.
    pub fn root(&self) -> &Arc<SchemaNode> {
        &self.root
    }

    /// A handle to the property at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`blueprint_schema::Error::PathNotFound`] if the path does not
    /// resolve.
    pub fn property(&self, path: &SchemaPath) -> Result<SchemaProperty> {
        SchemaProperty::at(&self.root, path)
    }

    /// The node at `path`; the root for the empty path.
    ///
    /// # Errors
    ///
    /// Returns [`blueprint_schema::Error::PathNotFound`] if the path does not
    /// resolve.
    pub fn node(&self, path: &SchemaPath) -> Result<Arc<SchemaNode>> {
        resolve_arc(&self.root, path)
    }

    /// See [`edit::add_property`].
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`edit::add_property`].
    pub fn add_property(
        &mut self,
        path: &SchemaPath,
        definition: impl Into<PropertyDefinition>,
        after: Option<&str>,
    ) -> Result<Arc<SchemaNode>> {
        let next = edit::add_property(&self.root, path, definition.into(), after)?;
        Ok(self.commit(next))
    }

    /// See [`edit::update_property`].
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`edit::update_property`].
    pub fn update_property(
        &mut self,
        target: &SchemaProperty,
        definition: impl Into<PropertyDefinition>,
    ) -> Result<Arc<SchemaNode>> {
        let next = edit::update_property(&self.root, target, definition.into())?;
        Ok(self.commit(next))
    }

    /// See [`edit::remove_property`].
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`edit::remove_property`].
    pub fn remove_property(&mut self, path: &SchemaPath) -> Result<Arc<SchemaNode>> {
        let next = edit::remove_property(&self.root, path)?;
        Ok(self.commit(next))
    }

    fn commit(&mut self, next: Arc<SchemaNode>) -> Arc<SchemaNode> {
        self.root = next;
        Arc::clone(&self.root)
    }
}
