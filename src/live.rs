//! Query results that follow the note store.
//!
//! A [`LiveQuery`] pairs a store subscription with a [`QuerySpec`]. Whenever
//! the store publishes a new snapshot, or the query is replaced, the next call
//! to [`LiveQuery::results`] reflects it. Results are always recomputed from
//! the latest snapshot and never patched incrementally.

use anyhow::{Context, Result};
use time::OffsetDateTime;
use tokio::sync::watch;

use crate::models::Note;
use crate::query::{QuerySpec, execute};
use crate::store::{NoteScope, Snapshot};

pub struct LiveQuery {
    changes: watch::Receiver<Snapshot>,
    snapshot: Snapshot,
    scope: NoteScope,
    spec: QuerySpec,
}

impl LiveQuery {
    /// Starts following `changes`, seeded with its current snapshot.
    pub fn new(mut changes: watch::Receiver<Snapshot>, scope: NoteScope, spec: QuerySpec) -> Self {
        let snapshot = changes.borrow_and_update().clone();
        Self {
            changes,
            snapshot,
            scope,
            spec,
        }
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    pub fn scope(&self) -> &NoteScope {
        &self.scope
    }

    /// Replaces the active query parameters.
    pub fn set_spec(&mut self, spec: QuerySpec) {
        self.spec = spec;
    }

    /// Picks up a newer snapshot if one was published. Returns whether the
    /// snapshot changed.
    ///
    /// A closed store leaves the last snapshot in place.
    pub fn refresh(&mut self) -> bool {
        match self.changes.has_changed() {
            Ok(true) => {
                self.snapshot = self.changes.borrow_and_update().clone();
                true
            }
            Ok(false) | Err(_) => false,
        }
    }

    /// Waits until the store publishes a new snapshot and adopts it.
    pub async fn changed(&mut self) -> Result<()> {
        self.changes
            .changed()
            .await
            .context("Note store was dropped")?;
        self.snapshot = self.changes.borrow_and_update().clone();
        Ok(())
    }

    /// Notes in scope that match the current query, in its sort order.
    pub fn results(&self, now: OffsetDateTime) -> Vec<&Note> {
        execute(self.scope.select(&self.snapshot), &self.spec, now)
    }

    /// The scoped notes before any filtering, newest first.
    pub fn scoped_notes(&self) -> Vec<&Note> {
        self.scope.select(&self.snapshot).collect()
    }
}
