//! Versioned sessions with dirty tracking

use std::collections::BTreeSet;
use std::sync::Arc;

use blueprint_builder::SchemaBuilder;
use blueprint_schema::{Result, SchemaNode, SchemaPath};
use blueprint_selector::{SubSchemaSelection, SubschemaSelector};
use tracing::{debug, warn};

use crate::workspace::Workspace;

/// The observable state of a session after a call
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<V> {
    pub value: V,
    pub is_dirty: bool,
    pub version: u64,
}

/// A workspace bound to a seed value
///
/// `version` increases on every call that changes the working value and on
/// every reset. `is_dirty` is false after bind or reset and stays true from
/// the first value-changing operation until the next reset.
#[derive(Debug)]
pub struct EditSession<W: Workspace> {
    workspace: W,
    seed: W::Value,
    version: u64,
    dirty: bool,
}

/// Session over the output schema builder.
pub type BuilderSession = EditSession<SchemaBuilder>;

/// Session over a subschema selection.
pub type SelectorSession = EditSession<SubschemaSelector>;

impl<W: Workspace> EditSession<W> {
    /// Bind `workspace`; its current value becomes the seed.
    pub fn bind(workspace: W) -> Self {
        let seed = workspace.value();
        Self {
            workspace,
            seed,
            version: 0,
            dirty: false,
        }
    }

    /// Run `op` against the workspace.
    ///
    /// # Errors
    ///
    /// Propagates the error of `op`. The working value, version and dirty
    /// flag are then exactly as before the call.
    pub fn apply<R, F>(&mut self, op: F) -> Result<Snapshot<W::Value>>
    where
        F: FnOnce(&mut W) -> Result<R>,
    {
        let before = self.workspace.value();
        if let Err(err) = op(&mut self.workspace) {
            if self.workspace.value() != before {
                if let Err(restore_err) = self.workspace.restore(before) {
                    warn!("Could not roll back failed operation: {}", restore_err);
                }
            }
            return Err(err);
        }

        if self.workspace.value() != before {
            self.version += 1;
            self.dirty = true;
            debug!("Session advanced to version {}", self.version);
        }
        Ok(self.snapshot())
    }

    /// Restore the working value to `seed`, or to the bound seed when
    /// `None`, and clear the dirty flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace rejects the seed; the session is
    /// left unchanged.
    pub fn reset(&mut self, seed: Option<W::Value>) -> Result<Snapshot<W::Value>> {
        let seed = seed.unwrap_or_else(|| self.seed.clone());
        self.workspace.restore(seed.clone())?;
        self.seed = seed;
        self.version += 1;
        self.dirty = false;
        debug!("Session reset at version {}", self.version);
        Ok(self.snapshot())
    }

    /// Follow an externally changed seed.
    ///
    /// A seed equal to the bound one is a no-op; any other seed resets the
    /// session to it, discarding unsaved work. The workspace itself is kept,
    /// so a selector session stays on its target schema; see
    /// [`EditSession::rebind_target`] for switching to another mapping.
    ///
    /// # Errors
    ///
    /// See [`Self::reset`].
    pub fn rebind(&mut self, seed: W::Value) -> Result<Snapshot<W::Value>> {
        if seed == self.seed {
            return Ok(self.snapshot());
        }
        if self.dirty {
            debug!("Rebinding discards unsaved changes");
        }
        self.reset(Some(seed))
    }

    pub fn snapshot(&self) -> Snapshot<W::Value> {
        Snapshot {
            value: self.workspace.value(),
            is_dirty: self.dirty,
            version: self.version,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn workspace(&self) -> &W {
        &self.workspace
    }

    pub fn seed(&self) -> &W::Value {
        &self.seed
    }

    /// Hand back the workspace, ending the session.
    pub fn into_workspace(self) -> W {
        self.workspace
    }
}

impl EditSession<SubschemaSelector> {
    /// Whether a save action should be offered: something is selected and
    /// it differs from what was seeded.
    pub fn can_save(&self) -> bool {
        self.dirty && !self.workspace.is_empty()
    }

    /// The fragment for the current selection.
    pub fn selection(&self) -> SubSchemaSelection {
        self.workspace.selection()
    }

    /// Move the session to another target schema and saved selection.
    ///
    /// The seed becomes the paths located for `seed` in `target`. The session
    /// is reset: clean, with a new version.
    pub fn rebind_target(
        &mut self,
        target: impl Into<Arc<SchemaNode>>,
        seed: &SubSchemaSelection,
    ) -> Snapshot<BTreeSet<SchemaPath>> {
        if self.dirty {
            debug!("Rebinding discards unsaved changes");
        }
        self.workspace = SubschemaSelector::with_seed(target, seed);
        self.seed = self.workspace.value();
        self.version += 1;
        self.dirty = false;
        debug!("Session moved to a new target at version {}", self.version);
        self.snapshot()
    }
}
