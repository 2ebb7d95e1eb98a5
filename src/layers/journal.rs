// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Recorded-Effects Journal
//!
//! A protected operation body records one undo step for every effect it
//! applies to the protected state. If the invocation aborts at any point
//! after the body started (including a failing post-check), the pipeline
//! replays the undo steps in reverse order, leaving the state exactly as it
//! was before the invocation.
//!
//! Effects that live outside the protected state (a record store, emitted
//! events) cannot be undone once observed, so the body defers them instead:
//! deferred steps run in recording order when the invocation commits and are
//! dropped unrun when it aborts.
//!
//! Writes to the state without a recorded undo step are NOT rolled back.
//!
//! ```ignore
//! pipeline.invoke(&mut ledger, &invocation, |ledger, inv, journal| {
//!     journal.assign(ledger, |l| &mut l.balance, new_balance);
//!     journal.push(ledger, |l| &mut l.history, entry);
//!     journal.defer(move || notify(entry));
//!     Ok(())
//! })?;
//! ```

type UndoStep<'a, S> = Box<dyn FnOnce(&mut S) + 'a>;
type DeferredStep<'a> = Box<dyn FnOnce() + 'a>;

pub struct Journal<'a, S> {
    undo: Vec<UndoStep<'a, S>>,
    deferred: Vec<DeferredStep<'a>>,
}

impl<S> Default for Journal<'_, S> {
    fn default() -> Self {
        Self {
            undo: Vec::new(),
            deferred: Vec::new(),
        }
    }
}

impl<'a, S> Journal<'a, S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an undo step for an effect that was just applied
    pub fn record<F>(&mut self, undo: F)
    where
        F: FnOnce(&mut S) + 'a,
    {
        self.undo.push(Box::new(undo));
    }

    /// Run `effect` only if the invocation commits
    pub fn defer<F>(&mut self, effect: F)
    where
        F: FnOnce() + 'a,
    {
        self.deferred.push(Box::new(effect));
    }

    /// Recorded undo steps plus deferred effects
    pub fn len(&self) -> usize {
        self.undo.len() + self.deferred.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Undo every recorded effect, newest first, and drop deferred ones
    pub fn rollback(self, state: &mut S) -> usize {
        let steps = self.undo.len();
        for undo in self.undo.into_iter().rev() {
            undo(state);
        }
        steps
    }

    /// Keep every effect and run the deferred ones; returns the effect count
    pub fn commit(self) -> usize {
        let effects = self.len();
        for effect in self.deferred {
            effect();
        }
        effects
    }
}

impl<'a, S: 'a> Journal<'a, S> {
    /// Overwrite a field and record how to restore it
    pub fn assign<T: 'a>(&mut self, state: &mut S, field: fn(&mut S) -> &mut T, value: T) {
        let old = std::mem::replace(field(state), value);
        self.record(move |s| *field(s) = old);
    }

    /// Append to a vector field and record how to remove it
    pub fn push<T: 'a>(&mut self, state: &mut S, field: fn(&mut S) -> &mut Vec<T>, item: T) {
        field(state).push(item);
        self.record(move |s| {
            field(s).pop();
        });
    }
}
