//! Editable engines a session can drive

use std::collections::BTreeSet;
use std::sync::Arc;

use blueprint_builder::SchemaBuilder;
use blueprint_schema::{Result, SchemaNode, SchemaPath};
use blueprint_selector::SubschemaSelector;

/// An engine whose working value can be captured and put back
///
/// `value` must be cheap enough to take before every operation; both the
/// builder and the selector hand out shared or small values.
pub trait Workspace {
    type Value: Clone + PartialEq;

    /// The current working value.
    fn value(&self) -> Self::Value;

    /// Replace the working value.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not acceptable to the engine; the
    /// previous value is kept in that case.
    fn restore(&mut self, value: Self::Value) -> Result<()>;
}

impl Workspace for SchemaBuilder {
    type Value = Arc<SchemaNode>;

    fn value(&self) -> Self::Value {
        self.schema()
    }

    fn restore(&mut self, value: Self::Value) -> Result<()> {
        self.set_schema(value).map(|_| ())
    }
}

impl Workspace for SubschemaSelector {
    type Value = BTreeSet<SchemaPath>;

    fn value(&self) -> Self::Value {
        self.selected().clone()
    }

    fn restore(&mut self, value: Self::Value) -> Result<()> {
        SubschemaSelector::restore(self, value);
        Ok(())
    }
}
