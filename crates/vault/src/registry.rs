//! Principal registry
//!
//! Tracks the active principal set and the append-only history of every
//! addition. Removal is refused while only [`QUORUM_FLOOR`] principals are
//! active, so a confirmation partner always exists.

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::warn;
use twokey_core::PrincipalId;

/// Minimum number of active principals that must remain after a removal
pub const QUORUM_FLOOR: usize = 2;

/// Registry membership errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Principal is already active
    #[error("Duplicate member: {0} is already an active principal")]
    DuplicateMember(PrincipalId),

    /// Principal is not active
    #[error("Unknown member: {0} is not an active principal")]
    UnknownMember(PrincipalId),

    /// Removal would leave fewer than the quorum floor
    #[error("Quorum floor: {active} active principals, removal requires more than {floor}")]
    QuorumFloor {
        /// Active principals at the time of the attempt
        active: usize,
        /// Required minimum after removal
        floor: usize,
    },
}

/// Current and historical principals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrincipalRegistry {
    /// Active principals; the active count is this set's size
    active: BTreeSet<PrincipalId>,
    /// Every addition in order, never shrinks
    history: Vec<PrincipalId>,
}

impl PrincipalRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a registry by adding each identifier in order.
    ///
    /// Duplicate seeds fail with [`RegistryError::DuplicateMember`].
    pub fn with_principals<I, P>(seeds: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PrincipalId>,
    {
        let mut registry = Self::new();
        for seed in seeds {
            registry.add(seed.into())?;
        }
        if registry.count() < QUORUM_FLOOR {
            warn!(
                active = registry.count(),
                "Registry seeded below quorum floor, no proposal can be confirmed"
            );
        }
        Ok(registry)
    }

    /// Check whether `id` is an active principal
    pub fn is_active(&self, id: &PrincipalId) -> bool {
        self.active.contains(id)
    }

    /// Number of active principals
    pub fn count(&self) -> usize {
        self.active.len()
    }

    /// Every identifier ever added, in addition order
    pub fn history(&self) -> &[PrincipalId] {
        &self.history
    }

    /// Active principals in identifier order
    pub fn active(&self) -> impl Iterator<Item = &PrincipalId> {
        self.active.iter()
    }

    /// Activate `id` and append it to the history
    pub fn add(&mut self, id: PrincipalId) -> Result<(), RegistryError> {
        if self.active.contains(&id) {
            return Err(RegistryError::DuplicateMember(id));
        }
        self.active.insert(id.clone());
        self.history.push(id);
        Ok(())
    }

    /// Deactivate `id`; the history keeps it
    pub fn remove(&mut self, id: &PrincipalId) -> Result<(), RegistryError> {
        if !self.active.contains(id) {
            return Err(RegistryError::UnknownMember(id.clone()));
        }
        if self.active.len() <= QUORUM_FLOOR {
            return Err(RegistryError::QuorumFloor {
                active: self.active.len(),
                floor: QUORUM_FLOOR,
            });
        }
        self.active.remove(id);
        Ok(())
    }

    /// Undo the most recent successful [`add`](Self::add) of `id`
    pub(crate) fn revert_add(&mut self, id: &PrincipalId) {
        debug_assert_eq!(self.history.last(), Some(id));
        self.active.remove(id);
        self.history.pop();
    }

    /// Undo a successful [`remove`](Self::remove) of `id`
    pub(crate) fn revert_remove(&mut self, id: PrincipalId) {
        self.active.insert(id);
    }
}
