//! Hash-chained audit log
//!
//! Each committed state change appends one record whose hash covers the
//! previous record's hash, so the log cannot be edited without breaking the
//! chain. Records appended by a call that later fails are removed again by
//! the rollback that unwinds the call.

#![warn(missing_docs)]

use blake3::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use twokey_core::{Nonce, PrincipalId};

use crate::action::{encode_id, Action};

const DOMAIN_TAG: &[u8] = b"TWOKEY-AUDIT-V1";

/// Hash of the record before the first one
pub const GENESIS_HASH: [u8; 32] = [0u8; 32];

/// Observable custody event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A nonce was opened with a proposal
    ProposalOpened {
        /// Nonce opened
        nonce: Nonce,
        /// First signer
        proposer: PrincipalId,
        /// Proposed action
        action: Action,
    },
    /// A proposal was confirmed and its action executed
    ProposalExecuted {
        /// Nonce retired
        nonce: Nonce,
        /// First signer
        proposer: PrincipalId,
        /// Second signer
        confirmer: PrincipalId,
        /// Executed action
        action: Action,
    },
    /// An open nonce was retired by its proposer
    NonceCancelled {
        /// Nonce retired
        nonce: Nonce,
        /// Proposer that cancelled
        proposer: PrincipalId,
    },
    /// A principal became active
    PrincipalAdded {
        /// New principal
        principal: PrincipalId,
    },
    /// A principal was deactivated
    PrincipalRemoved {
        /// Removed principal
        principal: PrincipalId,
    },
}

impl AuditEvent {
    fn hash_material(&self, hasher: &mut Hasher) {
        match self {
            AuditEvent::ProposalOpened {
                nonce,
                proposer,
                action,
            } => {
                hasher.update(&[0]);
                hasher.update(&nonce.to_be_bytes());
                encode_id(hasher, proposer);
                action.encode_into(hasher);
            }
            AuditEvent::ProposalExecuted {
                nonce,
                proposer,
                confirmer,
                action,
            } => {
                hasher.update(&[1]);
                hasher.update(&nonce.to_be_bytes());
                encode_id(hasher, proposer);
                encode_id(hasher, confirmer);
                action.encode_into(hasher);
            }
            AuditEvent::NonceCancelled { nonce, proposer } => {
                hasher.update(&[2]);
                hasher.update(&nonce.to_be_bytes());
                encode_id(hasher, proposer);
            }
            AuditEvent::PrincipalAdded { principal } => {
                hasher.update(&[3]);
                encode_id(hasher, principal);
            }
            AuditEvent::PrincipalRemoved { principal } => {
                hasher.update(&[4]);
                encode_id(hasher, principal);
            }
        }
    }
}

/// One link in the audit chain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditRecord {
    /// Position in the log, starting at 0
    pub seq: u64,
    /// Recorded event
    pub event: AuditEvent,
    /// Hash of the previous record, [`GENESIS_HASH`] for the first
    pub prev_hash: [u8; 32],
    /// Hash over `seq`, `prev_hash` and `event`
    pub hash: [u8; 32],
}

impl AuditRecord {
    fn compute_hash(seq: u64, prev_hash: &[u8; 32], event: &AuditEvent) -> [u8; 32] {
        let mut hasher = Hasher::new();
        hasher.update(DOMAIN_TAG);
        hasher.update(&seq.to_be_bytes());
        hasher.update(prev_hash);
        event.hash_material(&mut hasher);
        *hasher.finalize().as_bytes()
    }
}

/// Audit chain verification errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuditChainError {
    /// A record does not point at its predecessor
    #[error("Broken link at record {seq}")]
    BrokenLink {
        /// Offending record
        seq: u64,
    },

    /// A record's stored hash does not match its contents
    #[error("Hash mismatch at record {seq}")]
    HashMismatch {
        /// Offending record
        seq: u64,
    },
}

/// Append-only audit chain
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    records: Vec<AuditRecord>,
}

impl AuditLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` and return the new record's hash
    pub fn append(&mut self, event: AuditEvent) -> [u8; 32] {
        let seq = self.records.len() as u64;
        let prev_hash = self.head();
        let hash = AuditRecord::compute_hash(seq, &prev_hash, &event);
        self.records.push(AuditRecord {
            seq,
            event,
            prev_hash,
            hash,
        });
        hash
    }

    /// All records, oldest first
    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    /// Hash of the latest record, or [`GENESIS_HASH`] when empty
    pub fn head(&self) -> [u8; 32] {
        self.records
            .last()
            .map(|record| record.hash)
            .unwrap_or(GENESIS_HASH)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn pop(&mut self) {
        self.records.pop();
    }

    /// Recompute every hash and link in the chain
    pub fn verify_chain(&self) -> Result<(), AuditChainError> {
        verify_records(&self.records)
    }
}

/// Verify an exported sequence of records
pub fn verify_records(records: &[AuditRecord]) -> Result<(), AuditChainError> {
    let mut prev_hash = GENESIS_HASH;
    for (index, record) in records.iter().enumerate() {
        let seq = index as u64;
        if record.seq != seq || record.prev_hash != prev_hash {
            return Err(AuditChainError::BrokenLink { seq });
        }
        if AuditRecord::compute_hash(seq, &record.prev_hash, &record.event) != record.hash {
            return Err(AuditChainError::HashMismatch { seq });
        }
        prev_hash = record.hash;
    }
    Ok(())
}
