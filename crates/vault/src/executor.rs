//! Action executor
//!
//! Dispatches a finalized proposal to its effect. Runs only after the
//! proposal's nonce is already `Done`, so a destination that re-enters the
//! vault during a forward finds the nonce retired.

use tracing::info;

use crate::action::Action;
use crate::error::VaultResult;
use crate::transfer::ValueTransfer;
use crate::vault::VaultState;

/// Apply `action` to `state`, calling out to `transfer` for forwards.
///
/// Registry and transfer errors propagate unchanged; the caller unwinds.
pub(crate) fn execute<T>(
    action: &Action,
    state: &mut VaultState,
    transfer: &mut T,
) -> VaultResult<()>
where
    T: ValueTransfer + ?Sized,
{
    match action {
        Action::Forward {
            destination,
            amount,
        } => {
            transfer.transfer(destination, *amount, state)?;
            info!(destination = %destination, amount = *amount, "Forward executed");
        }
        Action::AddPrincipal { target } => {
            state.activate(target)?;
            info!(principal = %target, active = state.principal_count(), "Principal added");
        }
        Action::RemovePrincipal { target } => {
            state.deactivate(target)?;
            info!(principal = %target, active = state.principal_count(), "Principal removed");
        }
    }
    Ok(())
}
