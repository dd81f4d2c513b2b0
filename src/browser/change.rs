//! Structural change notifications.
//!
//! Every mutating model operation returns the [`ModelChange`]s it performed,
//! in order. Observers registered on the model additionally receive the same
//! changes bracketed as "about to" / "done" pairs around the mutation.

use super::item::ItemId;

/// One structural change to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChange {
    /// Rows `first..=last` were added under `parent`.
    RowsInserted {
        parent: ItemId,
        first: usize,
        last: usize,
    },
    /// Rows `first..=last` were removed from `parent`.
    RowsRemoved {
        parent: ItemId,
        first: usize,
        last: usize,
    },
    /// Everything below the root was discarded.
    Reset,
}

/// Receiver of bracketed change notifications.
pub trait ModelObserver {
    fn rows_about_to_be_inserted(&mut self, _parent: ItemId, _first: usize, _last: usize) {}
    fn rows_inserted(&mut self, _parent: ItemId, _first: usize, _last: usize) {}
    fn rows_about_to_be_removed(&mut self, _parent: ItemId, _first: usize, _last: usize) {}
    fn rows_removed(&mut self, _parent: ItemId, _first: usize, _last: usize) {}
    fn model_about_to_reset(&mut self) {}
    fn model_reset(&mut self) {}
}

/// Observer that logs structural changes at trace level.
#[derive(Debug, Default)]
pub struct TraceObserver;

impl ModelObserver for TraceObserver {
    fn rows_inserted(&mut self, parent: ItemId, first: usize, last: usize) {
        tracing::trace!(?parent, first, last, "rows inserted");
    }

    fn rows_removed(&mut self, parent: ItemId, first: usize, last: usize) {
        tracing::trace!(?parent, first, last, "rows removed");
    }

    fn model_reset(&mut self) {
        tracing::trace!("model reset");
    }
}

/// Registered observers of one model.
#[derive(Default)]
pub struct ModelSignals {
    observers: Vec<Box<dyn ModelObserver>>,
}

impl std::fmt::Debug for ModelSignals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSignals")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ModelSignals {
    pub fn connect(&mut self, observer: Box<dyn ModelObserver>) {
        self.observers.push(observer);
    }

    /// Run `insert_fn` between the insertion notifications.
    pub fn emit_rows_inserted<F, R>(&mut self, parent: ItemId, first: usize, last: usize, insert_fn: F) -> R
    where
        F: FnOnce() -> R,
    {
        for o in &mut self.observers {
            o.rows_about_to_be_inserted(parent, first, last);
        }
        let out = insert_fn();
        for o in &mut self.observers {
            o.rows_inserted(parent, first, last);
        }
        out
    }

    /// Run `remove_fn` between the removal notifications.
    pub fn emit_rows_removed<F, R>(&mut self, parent: ItemId, first: usize, last: usize, remove_fn: F) -> R
    where
        F: FnOnce() -> R,
    {
        for o in &mut self.observers {
            o.rows_about_to_be_removed(parent, first, last);
        }
        let out = remove_fn();
        for o in &mut self.observers {
            o.rows_removed(parent, first, last);
        }
        out
    }

    /// Run `reset_fn` between the reset notifications.
    pub fn emit_reset<F, R>(&mut self, reset_fn: F) -> R
    where
        F: FnOnce() -> R,
    {
        for o in &mut self.observers {
            o.model_about_to_reset();
        }
        let out = reset_fn();
        for o in &mut self.observers {
            o.model_reset();
        }
        out
    }
}
