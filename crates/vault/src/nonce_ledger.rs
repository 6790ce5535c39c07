//! Nonce ledger
//!
//! Maps caller-chosen nonces to proposals and drives the
//! propose / confirm / cancel protocol. A nonce moves only forward,
//! `Empty -> Open -> Done`, and a `Done` nonce is permanently inert.
//!
//! The proposal and its confirmation are the same call made by two
//! different principals; a confirmation is accepted only when it rebuilds
//! the stored action exactly.

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use twokey_core::{Nonce, PrincipalId};

use crate::action::Action;
use crate::error::{VaultError, VaultResult};
use crate::registry::PrincipalRegistry;

/// Lifecycle state of a nonce
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NonceState {
    /// Never used
    #[default]
    Empty,
    /// Proposed, awaiting a matching confirmation
    Open,
    /// Executed or cancelled, never usable again
    Done,
}

/// An action plus the principal who first submitted it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Proposal {
    /// Principal that opened the nonce
    pub proposer: PrincipalId,
    /// Action agreed on under the nonce
    pub action: Action,
}

/// Observable state of one nonce
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NonceRecord {
    /// The nonce
    pub nonce: Nonce,
    /// Lifecycle state
    pub state: NonceState,
    /// Present whenever `state` is not `Empty`
    pub proposal: Option<Proposal>,
}

impl NonceRecord {
    fn empty(nonce: Nonce) -> Self {
        Self {
            nonce,
            state: NonceState::Empty,
            proposal: None,
        }
    }

    /// Principal that opened the nonce
    pub fn proposer(&self) -> Option<&PrincipalId> {
        self.proposal.as_ref().map(|p| &p.proposer)
    }

    /// Stored action
    pub fn action(&self) -> Option<&Action> {
        self.proposal.as_ref().map(|p| &p.action)
    }
}

/// Result of an accepted action submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Nonce moved `Empty -> Open`; nothing executes yet
    Opened,
    /// Nonce moved `Open -> Done`; the proposal must now execute
    Confirmed(Proposal),
}

/// Result of an accepted cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cancellation {
    /// Nonce moved `Open -> Done` without executing
    Retired,
    /// Nonce was already `Done`; nothing changed
    AlreadyDone,
}

#[derive(Debug, Clone)]
struct Entry {
    state: NonceState,
    proposal: Proposal,
}

/// Per-nonce proposal state plus the history of every used nonce
#[derive(Debug, Clone, Default)]
pub struct NonceLedger {
    entries: HashMap<Nonce, Entry>,
    /// Every nonce that ever left `Empty`, in order; never shrinks
    known_nonces: Vec<Nonce>,
}

impl NonceLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Observable record for `nonce`; unseen nonces read as `Empty`
    pub fn record(&self, nonce: Nonce) -> NonceRecord {
        match self.entries.get(&nonce) {
            Some(entry) => NonceRecord {
                nonce,
                state: entry.state,
                proposal: Some(entry.proposal.clone()),
            },
            None => NonceRecord::empty(nonce),
        }
    }

    /// Lifecycle state of `nonce`
    pub fn state(&self, nonce: Nonce) -> NonceState {
        self.entries
            .get(&nonce)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    /// Every nonce that ever left `Empty`, in first-use order
    pub fn known_nonces(&self) -> &[Nonce] {
        &self.known_nonces
    }

    /// Submit `action` under `nonce` on behalf of `caller`.
    ///
    /// Deduplication runs first (`NonceRetired`, `SelfConfirmation`), then
    /// authorization against `registry`, then the open-or-confirm step.
    /// A mismatching confirmation leaves the nonce `Open` and untouched.
    pub fn submit(
        &mut self,
        registry: &PrincipalRegistry,
        caller: &PrincipalId,
        nonce: Nonce,
        action: Action,
    ) -> VaultResult<Submission> {
        if let Some(entry) = self.entries.get(&nonce) {
            match entry.state {
                NonceState::Done => return Err(VaultError::NonceRetired(nonce)),
                NonceState::Open if entry.proposal.proposer == *caller => {
                    return Err(VaultError::SelfConfirmation {
                        caller: caller.clone(),
                        nonce,
                    });
                }
                _ => {}
            }
        }

        authorize(registry, caller, nonce)?;

        match self.entries.get_mut(&nonce) {
            None => {
                self.entries.insert(
                    nonce,
                    Entry {
                        state: NonceState::Open,
                        proposal: Proposal {
                            proposer: caller.clone(),
                            action,
                        },
                    },
                );
                self.known_nonces.push(nonce);
                Ok(Submission::Opened)
            }
            Some(entry) => {
                if entry.proposal.action != action {
                    debug!(
                        nonce,
                        stored = %hex::encode(entry.proposal.action.digest()),
                        submitted = %hex::encode(action.digest()),
                        "Confirmation does not match open proposal"
                    );
                    return Err(VaultError::ProposalMismatch(nonce));
                }
                entry.state = NonceState::Done;
                Ok(Submission::Confirmed(entry.proposal.clone()))
            }
        }
    }

    /// Retire `nonce` without executing it.
    ///
    /// Only its active original proposer may cancel. Cancelling a nonce that
    /// is already `Done` succeeds and changes nothing.
    pub fn cancel(
        &mut self,
        registry: &PrincipalRegistry,
        caller: &PrincipalId,
        nonce: Nonce,
    ) -> VaultResult<Cancellation> {
        authorize(registry, caller, nonce)?;

        let entry = match self.entries.get_mut(&nonce) {
            Some(entry) if entry.proposal.proposer == *caller => entry,
            _ => {
                return Err(VaultError::Unauthorized {
                    caller: caller.clone(),
                    nonce,
                })
            }
        };

        match entry.state {
            NonceState::Done => Ok(Cancellation::AlreadyDone),
            _ => {
                entry.state = NonceState::Done;
                Ok(Cancellation::Retired)
            }
        }
    }

    /// Undo the `Empty -> Open` step for `nonce`
    pub(crate) fn revert_open(&mut self, nonce: Nonce) {
        debug_assert_eq!(self.known_nonces.last(), Some(&nonce));
        self.entries.remove(&nonce);
        self.known_nonces.pop();
    }

    /// Undo the `Open -> Done` step for `nonce`
    pub(crate) fn revert_finalize(&mut self, nonce: Nonce) {
        if let Some(entry) = self.entries.get_mut(&nonce) {
            entry.state = NonceState::Open;
        }
    }
}

fn authorize(registry: &PrincipalRegistry, caller: &PrincipalId, nonce: Nonce) -> VaultResult<()> {
    if registry.is_active(caller) {
        Ok(())
    } else {
        Err(VaultError::Unauthorized {
            caller: caller.clone(),
            nonce,
        })
    }
}
