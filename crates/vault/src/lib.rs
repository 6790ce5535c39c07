//! TwoKey Vault - dual-authorization custody
//!
//! Exactly two distinct registered principals must agree before value leaves
//! custody or the principal set changes. This crate provides:
//! - Principal registry with a quorum floor of two
//! - Nonce ledger implementing propose / confirm / cancel
//! - Action executor for forwards and membership changes
//! - Per-call atomicity via an undo journal
//! - Hash-chained audit log of committed events
//!
//! # Architecture
//!
//! Every call flows through the same pipeline:
//! 1. Retired and self-confirming nonces are rejected by the `NonceLedger`
//! 2. The caller is authorized against the `PrincipalRegistry`
//! 3. The first call opens the nonce, a matching second call retires it
//! 4. The retired proposal is executed; forwards call the `ValueTransfer`
//!    primitive, which may re-enter the vault
//! 5. Any failure unwinds every mutation the call made
//!
//! Proposal and confirmation are the same call from two different
//! principals. Matching parameters is the second signature.
//!
//! # Examples
//!
//! ```
//! use twokey_vault::{ProposalOutcome, Treasury, Vault};
//!
//! let mut vault = Vault::new(["alice", "bob", "carol"], Treasury::with_balance(1500)).unwrap();
//!
//! let opened = vault.propose_forward(&"alice".into(), "dana", 1000, 7).unwrap();
//! assert_eq!(opened, ProposalOutcome::Opened);
//!
//! let executed = vault.propose_forward(&"bob".into(), "dana", 1000, 7).unwrap();
//! assert!(matches!(executed, ProposalOutcome::Executed(_)));
//! assert_eq!(vault.transfer().balance(), 500);
//! ```

#![warn(missing_docs)]

pub mod action;
pub mod audit;
pub mod error;
mod executor;
mod journal;
pub mod nonce_ledger;
pub mod registry;
pub mod transfer;
pub mod vault;

pub use action::{Action, ActionKind};
pub use audit::{AuditChainError, AuditEvent, AuditLog, AuditRecord};
pub use error::{ErrorKind, VaultError, VaultResult};
pub use nonce_ledger::{NonceRecord, NonceState, Proposal};
pub use registry::{PrincipalRegistry, RegistryError, QUORUM_FLOOR};
pub use transfer::{Payment, TransferError, Treasury, ValueTransfer};
pub use vault::{ProposalOutcome, Vault, VaultSnapshot, VaultState};

pub use twokey_core::{Amount, Nonce, PrincipalId};
