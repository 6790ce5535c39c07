//! Custody state aggregate and call surface
//!
//! [`VaultState`] owns every piece of custody state and implements the entry
//! points. Each entry point is one atomic unit: it runs inside a journal
//! mark and either commits every mutation it made (including those of
//! re-entrant calls made by the transfer primitive) or unwinds all of them.
//!
//! [`Vault`] pairs a state with its value-transfer primitive for callers
//! that do not need to re-enter.

#![warn(missing_docs)]

use serde::Serialize;
use tracing::{debug, info, warn};
use twokey_core::{Amount, Nonce, PrincipalId, VaultConfig};

use crate::action::Action;
use crate::audit::{AuditEvent, AuditLog, AuditRecord};
use crate::error::VaultResult;
use crate::executor::execute;
use crate::journal::{Journal, Undo};
use crate::nonce_ledger::{Cancellation, NonceLedger, NonceRecord, Submission};
use crate::registry::PrincipalRegistry;
use crate::transfer::ValueTransfer;

/// Result of an accepted proposal call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// First signature recorded; the nonce is now `Open`
    Opened,
    /// Second signature matched; the action ran and the nonce is `Done`
    Executed(Action),
}

/// Principal registry, nonce ledger and audit trail of one custody instance
#[derive(Debug, Default)]
pub struct VaultState {
    registry: PrincipalRegistry,
    nonces: NonceLedger,
    audit: AuditLog,
    journal: Journal,
}

impl VaultState {
    /// Seed a state by adding each identifier in order
    pub fn with_principals<I, P>(seeds: I) -> VaultResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PrincipalId>,
    {
        let registry = PrincipalRegistry::with_principals(seeds)?;
        let mut audit = AuditLog::new();
        for principal in registry.history() {
            audit.append(AuditEvent::PrincipalAdded {
                principal: principal.clone(),
            });
        }
        info!(principals = registry.count(), "Vault state seeded");
        Ok(Self {
            registry,
            audit,
            ..Self::default()
        })
    }

    /// Open or confirm `action` under `nonce` on behalf of `caller`
    pub fn propose<T>(
        &mut self,
        caller: &PrincipalId,
        action: Action,
        nonce: Nonce,
        transfer: &mut T,
    ) -> VaultResult<ProposalOutcome>
    where
        T: ValueTransfer + ?Sized,
    {
        self.transact(caller, nonce, |state| state.submit(caller, action, nonce, transfer))
    }

    /// Open or confirm a forward of `amount` to `destination`
    pub fn propose_forward<T>(
        &mut self,
        caller: &PrincipalId,
        destination: impl Into<PrincipalId>,
        amount: Amount,
        nonce: Nonce,
        transfer: &mut T,
    ) -> VaultResult<ProposalOutcome>
    where
        T: ValueTransfer + ?Sized,
    {
        self.propose(caller, Action::forward(destination, amount), nonce, transfer)
    }

    /// Open or confirm adding `target` as a principal
    pub fn propose_add<T>(
        &mut self,
        caller: &PrincipalId,
        target: impl Into<PrincipalId>,
        nonce: Nonce,
        transfer: &mut T,
    ) -> VaultResult<ProposalOutcome>
    where
        T: ValueTransfer + ?Sized,
    {
        self.propose(caller, Action::add_principal(target), nonce, transfer)
    }

    /// Open or confirm removing principal `target`
    pub fn propose_remove<T>(
        &mut self,
        caller: &PrincipalId,
        target: impl Into<PrincipalId>,
        nonce: Nonce,
        transfer: &mut T,
    ) -> VaultResult<ProposalOutcome>
    where
        T: ValueTransfer + ?Sized,
    {
        self.propose(caller, Action::remove_principal(target), nonce, transfer)
    }

    /// Retire `nonce` without executing its proposal
    pub fn cancel(&mut self, caller: &PrincipalId, nonce: Nonce) -> VaultResult<()> {
        self.transact(caller, nonce, |state| {
            match state.nonces.cancel(&state.registry, caller, nonce)? {
                Cancellation::Retired => {
                    state.journal.record(Undo::NonceFinalized(nonce));
                    state.append_audit(AuditEvent::NonceCancelled {
                        nonce,
                        proposer: caller.clone(),
                    });
                    info!(caller = %caller, nonce, "Nonce cancelled");
                }
                Cancellation::AlreadyDone => {
                    debug!(caller = %caller, nonce, "Cancel on retired nonce, nothing to do");
                }
            }
            Ok(())
        })
    }

    /// Check whether `id` is an active principal
    pub fn is_active(&self, id: &PrincipalId) -> bool {
        self.registry.is_active(id)
    }

    /// Every principal ever added, in addition order
    pub fn principal_history(&self) -> &[PrincipalId] {
        self.registry.history()
    }

    /// Number of active principals
    pub fn principal_count(&self) -> usize {
        self.registry.count()
    }

    /// Active principals in identifier order
    pub fn active_principals(&self) -> impl Iterator<Item = &PrincipalId> {
        self.registry.active()
    }

    /// State, proposer and action stored under `nonce`
    pub fn nonce_record(&self, nonce: Nonce) -> NonceRecord {
        self.nonces.record(nonce)
    }

    /// Every nonce that ever left `Empty`, in first-use order
    pub fn known_nonces(&self) -> &[Nonce] {
        self.nonces.known_nonces()
    }

    /// Committed custody events
    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Copy of the whole observable state
    pub fn snapshot(&self) -> VaultSnapshot {
        VaultSnapshot {
            active_principals: self.registry.active().cloned().collect(),
            principal_history: self.registry.history().to_vec(),
            principal_count: self.registry.count(),
            nonces: self
                .nonces
                .known_nonces()
                .iter()
                .map(|nonce| self.nonces.record(*nonce))
                .collect(),
            audit: self.audit.records().to_vec(),
        }
    }

    fn submit<T>(
        &mut self,
        caller: &PrincipalId,
        action: Action,
        nonce: Nonce,
        transfer: &mut T,
    ) -> VaultResult<ProposalOutcome>
    where
        T: ValueTransfer + ?Sized,
    {
        let kind = action.kind();
        match self.nonces.submit(&self.registry, caller, nonce, action.clone())? {
            Submission::Opened => {
                self.journal.record(Undo::NonceOpened(nonce));
                self.append_audit(AuditEvent::ProposalOpened {
                    nonce,
                    proposer: caller.clone(),
                    action,
                });
                info!(caller = %caller, nonce, action = kind.as_str(), "Proposal opened");
                Ok(ProposalOutcome::Opened)
            }
            Submission::Confirmed(proposal) => {
                // nonce is Done before anything external runs
                self.journal.record(Undo::NonceFinalized(nonce));
                execute(&proposal.action, self, transfer)?;
                self.append_audit(AuditEvent::ProposalExecuted {
                    nonce,
                    proposer: proposal.proposer.clone(),
                    confirmer: caller.clone(),
                    action: proposal.action.clone(),
                });
                info!(
                    proposer = %proposal.proposer,
                    confirmer = %caller,
                    nonce,
                    action = kind.as_str(),
                    "Proposal executed"
                );
                Ok(ProposalOutcome::Executed(proposal.action))
            }
        }
    }

    pub(crate) fn activate(&mut self, target: &PrincipalId) -> VaultResult<()> {
        self.registry.add(target.clone())?;
        self.journal.record(Undo::PrincipalActivated(target.clone()));
        self.append_audit(AuditEvent::PrincipalAdded {
            principal: target.clone(),
        });
        Ok(())
    }

    pub(crate) fn deactivate(&mut self, target: &PrincipalId) -> VaultResult<()> {
        self.registry.remove(target)?;
        self.journal.record(Undo::PrincipalDeactivated(target.clone()));
        self.append_audit(AuditEvent::PrincipalRemoved {
            principal: target.clone(),
        });
        Ok(())
    }

    fn append_audit(&mut self, event: AuditEvent) {
        self.audit.append(event);
        self.journal.record(Undo::AuditAppended);
    }

    /// Run `op` as one atomic call
    fn transact<R, F>(&mut self, caller: &PrincipalId, nonce: Nonce, op: F) -> VaultResult<R>
    where
        F: FnOnce(&mut Self) -> VaultResult<R>,
    {
        let mark = self.journal.begin();
        match op(self) {
            Ok(value) => {
                self.journal.commit(mark);
                Ok(value)
            }
            Err(err) => {
                let undone = self.journal.rollback(mark);
                let reverted = undone.len();
                for undo in undone {
                    self.revert(undo);
                }
                warn!(
                    caller = %caller,
                    nonce,
                    reason = err.kind().as_str(),
                    reverted,
                    "Call rejected: {}",
                    err
                );
                Err(err)
            }
        }
    }

    fn revert(&mut self, undo: Undo) {
        debug!(?undo, "Reverting");
        match undo {
            Undo::PrincipalActivated(id) => self.registry.revert_add(&id),
            Undo::PrincipalDeactivated(id) => self.registry.revert_remove(id),
            Undo::NonceOpened(nonce) => self.nonces.revert_open(nonce),
            Undo::NonceFinalized(nonce) => self.nonces.revert_finalize(nonce),
            Undo::AuditAppended => self.audit.pop(),
        }
    }
}

/// Serializable copy of the observable custody state
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VaultSnapshot {
    /// Active principals in identifier order
    pub active_principals: Vec<PrincipalId>,
    /// Every principal ever added
    pub principal_history: Vec<PrincipalId>,
    /// Number of active principals
    pub principal_count: usize,
    /// Every used nonce in first-use order
    pub nonces: Vec<NonceRecord>,
    /// Full audit chain
    pub audit: Vec<AuditRecord>,
}

impl VaultSnapshot {
    /// Render as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Custody state bundled with its value-transfer primitive
#[derive(Debug)]
pub struct Vault<T: ValueTransfer> {
    state: VaultState,
    transfer: T,
}

impl<T: ValueTransfer> Vault<T> {
    /// Create a vault seeded with `seeds`.
    ///
    /// Duplicate seeds fail with `DuplicateMember`.
    pub fn new<I, P>(seeds: I, transfer: T) -> VaultResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PrincipalId>,
    {
        Ok(Self {
            state: VaultState::with_principals(seeds)?,
            transfer,
        })
    }

    /// Create a vault from the `[vault]` config section
    pub fn from_config(config: &VaultConfig, transfer: T) -> VaultResult<Self> {
        Self::new(config.principals.iter().cloned(), transfer)
    }

    /// Open or confirm `action` under `nonce`
    pub fn propose(
        &mut self,
        caller: &PrincipalId,
        action: Action,
        nonce: Nonce,
    ) -> VaultResult<ProposalOutcome> {
        self.state.propose(caller, action, nonce, &mut self.transfer)
    }

    /// Open or confirm a forward of `amount` to `destination`
    pub fn propose_forward(
        &mut self,
        caller: &PrincipalId,
        destination: impl Into<PrincipalId>,
        amount: Amount,
        nonce: Nonce,
    ) -> VaultResult<ProposalOutcome> {
        self.state.propose_forward(caller, destination, amount, nonce, &mut self.transfer)
    }

    /// Open or confirm adding `target` as a principal
    pub fn propose_add(
        &mut self,
        caller: &PrincipalId,
        target: impl Into<PrincipalId>,
        nonce: Nonce,
    ) -> VaultResult<ProposalOutcome> {
        self.state.propose_add(caller, target, nonce, &mut self.transfer)
    }

    /// Open or confirm removing principal `target`
    pub fn propose_remove(
        &mut self,
        caller: &PrincipalId,
        target: impl Into<PrincipalId>,
        nonce: Nonce,
    ) -> VaultResult<ProposalOutcome> {
        self.state.propose_remove(caller, target, nonce, &mut self.transfer)
    }

    /// Retire a nonce `caller` proposed
    pub fn cancel(&mut self, caller: &PrincipalId, nonce: Nonce) -> VaultResult<()> {
        self.state.cancel(caller, nonce)
    }

    /// Accept inbound value; never fails and never touches custody state
    pub fn receive(&mut self, from: &PrincipalId, amount: Amount) {
        info!(from = %from, amount, "Value received");
        self.transfer.deposit(from, amount);
    }

    /// Check whether `id` is an active principal
    pub fn is_active(&self, id: &PrincipalId) -> bool {
        self.state.is_active(id)
    }

    /// Every principal ever added, in addition order
    pub fn principal_history(&self) -> &[PrincipalId] {
        self.state.principal_history()
    }

    /// Number of active principals
    pub fn principal_count(&self) -> usize {
        self.state.principal_count()
    }

    /// Active principals in identifier order
    pub fn active_principals(&self) -> impl Iterator<Item = &PrincipalId> {
        self.state.active_principals()
    }

    /// State, proposer and action stored under `nonce`
    pub fn nonce_record(&self, nonce: Nonce) -> NonceRecord {
        self.state.nonce_record(nonce)
    }

    /// Every nonce that ever left `Empty`
    pub fn known_nonces(&self) -> &[Nonce] {
        self.state.known_nonces()
    }

    /// Committed custody events
    pub fn audit_log(&self) -> &AuditLog {
        self.state.audit_log()
    }

    /// Copy of the whole observable state
    pub fn snapshot(&self) -> VaultSnapshot {
        self.state.snapshot()
    }

    /// Custody state
    pub fn state(&self) -> &VaultState {
        &self.state
    }

    /// Value-transfer primitive
    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    /// Split into state and primitive
    pub fn into_parts(self) -> (VaultState, T) {
        (self.state, self.transfer)
    }
}
