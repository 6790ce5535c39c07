//! Undo journal
//!
//! Every state mutation made while a call is in flight is recorded here so
//! the call can be unwound if it, or anything it triggers, fails. Calls
//! nest: a re-entrant call opens its own mark inside the outer one, and an
//! inner rollback only reverts what happened after that mark.

use twokey_core::{Nonce, PrincipalId};

/// A single reversible state change
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Undo {
    /// A principal was added and appended to history
    PrincipalActivated(PrincipalId),
    /// A principal was deactivated
    PrincipalDeactivated(PrincipalId),
    /// A nonce moved `Empty -> Open`
    NonceOpened(Nonce),
    /// A nonce moved `Open -> Done`
    NonceFinalized(Nonce),
    /// An audit record was appended
    AuditAppended,
}

/// Position in the journal at the start of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Mark(usize);

#[derive(Debug, Default)]
pub(crate) struct Journal {
    entries: Vec<Undo>,
    depth: usize,
}

impl Journal {
    /// Enter a call
    pub(crate) fn begin(&mut self) -> Mark {
        self.depth += 1;
        Mark(self.entries.len())
    }

    /// Record a change; ignored outside of a call
    pub(crate) fn record(&mut self, undo: Undo) {
        if self.depth > 0 {
            self.entries.push(undo);
        }
    }

    /// Leave a call, keeping its changes.
    ///
    /// An inner commit keeps its entries so an enclosing rollback can still
    /// revert them; the outermost commit discards the journal.
    pub(crate) fn commit(&mut self, _mark: Mark) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.entries.clear();
        }
    }

    /// Leave a call, returning its changes newest first
    pub(crate) fn rollback(&mut self, mark: Mark) -> Vec<Undo> {
        self.depth = self.depth.saturating_sub(1);
        let mut undone = self.entries.split_off(mark.0);
        undone.reverse();
        undone
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
