//! Call-level error taxonomy
//!
//! Every error aborts the triggering call and unwinds all of its effects.
//! Nothing is retried or suppressed internally; the calling principal
//! decides whether to retry with corrected parameters.

#![warn(missing_docs)]

use thiserror::Error;
use twokey_core::{Nonce, PrincipalId};

use crate::registry::RegistryError;
use crate::transfer::TransferError;

/// Reasons a custody call can fail
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VaultError {
    /// Caller is not an active principal, or not the proposer of the nonce it cancels
    #[error("Unauthorized: {caller} may not perform this call on nonce {nonce}")]
    Unauthorized {
        /// Rejected caller
        caller: PrincipalId,
        /// Nonce the call addressed
        nonce: Nonce,
    },

    /// Nonce has already been finalized
    #[error("Nonce {0} is retired")]
    NonceRetired(Nonce),

    /// Proposer attempted to confirm its own open proposal
    #[error("Self confirmation: {caller} proposed nonce {nonce} and cannot confirm it")]
    SelfConfirmation {
        /// Proposer of the open nonce
        caller: PrincipalId,
        /// Open nonce
        nonce: Nonce,
    },

    /// Confirmation does not structurally equal the open proposal
    #[error("Proposal mismatch on nonce {0}")]
    ProposalMismatch(Nonce),

    /// Principal registry refused the membership change
    #[error("Registry rejected membership change: {0}")]
    Registry(#[from] RegistryError),

    /// The value-transfer primitive reported failure
    #[error("Transfer failed: {0}")]
    TransferFailed(#[from] TransferError),
}

/// Flat view of [`VaultError`] without payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`VaultError::Unauthorized`]
    Unauthorized,
    /// See [`VaultError::NonceRetired`]
    NonceRetired,
    /// See [`VaultError::SelfConfirmation`]
    SelfConfirmation,
    /// See [`VaultError::ProposalMismatch`]
    ProposalMismatch,
    /// See [`RegistryError::DuplicateMember`]
    DuplicateMember,
    /// See [`RegistryError::UnknownMember`]
    UnknownMember,
    /// See [`RegistryError::QuorumFloor`]
    QuorumFloor,
    /// See [`VaultError::TransferFailed`]
    TransferFailed,
}

impl ErrorKind {
    /// Stable label
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NonceRetired => "nonce_retired",
            ErrorKind::SelfConfirmation => "self_confirmation",
            ErrorKind::ProposalMismatch => "proposal_mismatch",
            ErrorKind::DuplicateMember => "duplicate_member",
            ErrorKind::UnknownMember => "unknown_member",
            ErrorKind::QuorumFloor => "quorum_floor",
            ErrorKind::TransferFailed => "transfer_failed",
        }
    }
}

impl VaultError {
    /// Get the failure reason without its payload
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::Unauthorized { .. } => ErrorKind::Unauthorized,
            VaultError::NonceRetired(_) => ErrorKind::NonceRetired,
            VaultError::SelfConfirmation { .. } => ErrorKind::SelfConfirmation,
            VaultError::ProposalMismatch(_) => ErrorKind::ProposalMismatch,
            VaultError::Registry(RegistryError::DuplicateMember(_)) => ErrorKind::DuplicateMember,
            VaultError::Registry(RegistryError::UnknownMember(_)) => ErrorKind::UnknownMember,
            VaultError::Registry(RegistryError::QuorumFloor { .. }) => ErrorKind::QuorumFloor,
            VaultError::TransferFailed(_) => ErrorKind::TransferFailed,
        }
    }
}

/// Result type for custody calls.
pub type VaultResult<T> = Result<T, VaultError>;
