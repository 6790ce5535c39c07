//! Custody action definitions
//!
//! An action is the effect two principals agree on under one nonce. The
//! confirming call must rebuild exactly the proposed action: equality is
//! structural, so matching parameters is the co-signature.

#![warn(missing_docs)]

use blake3::Hasher;
use serde::{Deserialize, Serialize};
use twokey_core::{Amount, PrincipalId};

/// Closed set of actions a finalized proposal can execute
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Action {
    /// Move value out of custody
    Forward {
        /// Receiving address handle (need not be a principal)
        destination: PrincipalId,
        /// Amount to move
        amount: Amount,
    },
    /// Register a new active principal
    AddPrincipal {
        /// Principal to activate
        target: PrincipalId,
    },
    /// Deactivate an active principal
    RemovePrincipal {
        /// Principal to deactivate
        target: PrincipalId,
    },
}

/// Discriminant of an [`Action`], for logs and metrics labels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// [`Action::Forward`]
    Forward,
    /// [`Action::AddPrincipal`]
    AddPrincipal,
    /// [`Action::RemovePrincipal`]
    RemovePrincipal,
}

impl ActionKind {
    /// Stable label
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Forward => "forward",
            ActionKind::AddPrincipal => "add_principal",
            ActionKind::RemovePrincipal => "remove_principal",
        }
    }
}

impl Action {
    /// Build a forward action
    pub fn forward(destination: impl Into<PrincipalId>, amount: Amount) -> Self {
        Action::Forward {
            destination: destination.into(),
            amount,
        }
    }

    /// Build an add-principal action
    pub fn add_principal(target: impl Into<PrincipalId>) -> Self {
        Action::AddPrincipal {
            target: target.into(),
        }
    }

    /// Build a remove-principal action
    pub fn remove_principal(target: impl Into<PrincipalId>) -> Self {
        Action::RemovePrincipal {
            target: target.into(),
        }
    }

    /// Get the action discriminant
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Forward { .. } => ActionKind::Forward,
            Action::AddPrincipal { .. } => ActionKind::AddPrincipal,
            Action::RemovePrincipal { .. } => ActionKind::RemovePrincipal,
        }
    }

    /// BLAKE3 digest over a canonical, length-prefixed encoding.
    ///
    /// Two actions have the same digest exactly when they are equal.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Hasher::new();
        hasher.update(b"TWOKEY-ACTION-V1");
        self.encode_into(&mut hasher);
        *hasher.finalize().as_bytes()
    }

    pub(crate) fn encode_into(&self, hasher: &mut Hasher) {
        match self {
            Action::Forward {
                destination,
                amount,
            } => {
                hasher.update(&[0]);
                encode_id(hasher, destination);
                hasher.update(&amount.to_be_bytes());
            }
            Action::AddPrincipal { target } => {
                hasher.update(&[1]);
                encode_id(hasher, target);
            }
            Action::RemovePrincipal { target } => {
                hasher.update(&[2]);
                encode_id(hasher, target);
            }
        }
    }
}

pub(crate) fn encode_id(hasher: &mut Hasher, id: &PrincipalId) {
    let bytes = id.as_str().as_bytes();
    hasher.update(&(bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}
