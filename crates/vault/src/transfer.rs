//! Value-transfer seam
//!
//! The primitive that moves value out of custody is opaque to the vault: it
//! either fully succeeds or fully fails. It also receives the live
//! [`VaultState`], since a destination may run arbitrary logic that calls
//! back into the vault before the transfer returns.

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use twokey_core::{Amount, PrincipalId};

use crate::vault::VaultState;

/// Failures the transfer primitive can report
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    /// Custody balance cannot cover the amount
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Amount the forward asked for
        requested: Amount,
        /// Balance at the time of the attempt
        available: Amount,
    },

    /// Destination refused the value
    #[error("destination rejected transfer: {0}")]
    Rejected(String),
}

/// Opaque value-transfer primitive
pub trait ValueTransfer {
    /// Move `amount` to `destination`.
    ///
    /// Called after the proposal's nonce is already retired. `host` may be
    /// used to re-enter the vault's entry points.
    ///
    /// Must be all-or-nothing for the implementation's own state. The vault
    /// unwinds its own state on `Err`, including calls made through `host`,
    /// but not the primitive's: an implementation that re-enters and then
    /// fails has to drop any payouts those nested calls made.
    fn transfer(
        &mut self,
        destination: &PrincipalId,
        amount: Amount,
        host: &mut VaultState,
    ) -> Result<(), TransferError>;

    /// Account for inbound value. Inbound value is always accepted.
    fn deposit(&mut self, _from: &PrincipalId, _amount: Amount) {}
}

/// Outbound payment made by a [`Treasury`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payment {
    /// Receiving address handle
    pub destination: PrincipalId,
    /// Amount paid
    pub amount: Amount,
}

/// In-memory balance-holding transfer primitive
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Treasury {
    balance: Amount,
    payments: Vec<Payment>,
}

impl Treasury {
    /// Create an empty treasury
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a treasury holding `balance`
    pub fn with_balance(balance: Amount) -> Self {
        Self {
            balance,
            payments: Vec::new(),
        }
    }

    /// Current balance
    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Outbound payments in execution order
    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }
}

impl ValueTransfer for Treasury {
    fn transfer(
        &mut self,
        destination: &PrincipalId,
        amount: Amount,
        _host: &mut VaultState,
    ) -> Result<(), TransferError> {
        if amount > self.balance {
            return Err(TransferError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        self.payments.push(Payment {
            destination: destination.clone(),
            amount,
        });
        debug!(destination = %destination, amount, balance = self.balance, "Treasury paid out");
        Ok(())
    }

    fn deposit(&mut self, from: &PrincipalId, amount: Amount) {
        self.balance = self.balance.saturating_add(amount);
        debug!(from = %from, amount, balance = self.balance, "Treasury credited");
    }
}
