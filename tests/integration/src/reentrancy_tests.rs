//! Re-entrant destinations
//!
//! A forward's destination runs arbitrary logic before the transfer
//! returns. These tests drive the vault from inside that callback.
//!
//! # Expected Outcomes
//!
//! - Replaying the executing nonce from inside the transfer is `NonceRetired`
//! - Legitimate nested calls commit together with the outer call
//! - An outer failure unwinds nested calls that had already succeeded

use crate::test_utils::{id, init_tracing, Reentry, ReentrantTransfer};
use twokey_vault::{
    Action, ErrorKind, NonceState, ProposalOutcome, Treasury, ValueTransfer, Vault, VaultState,
};

fn vault(transfer: ReentrantTransfer) -> Vault<ReentrantTransfer> {
    Vault::new(["alice", "bob", "carol"], transfer).unwrap()
}

#[test]
fn test_replay_from_destination_rejected() {
    init_tracing();
    let replay = Reentry {
        caller: id("carol"),
        action: Action::forward("mallory", 100),
        nonce: 7,
    };
    let mut vault = vault(ReentrantTransfer::new(1000, vec![replay]));

    vault.propose_forward(&id("alice"), "mallory", 100, 7).unwrap();
    let outcome = vault.propose_forward(&id("bob"), "mallory", 100, 7).unwrap();

    assert!(matches!(outcome, ProposalOutcome::Executed(_)));
    let observed = &vault.transfer().observed;
    assert_eq!(observed.len(), 1);
    assert_eq!(
        observed[0].as_ref().unwrap_err().kind(),
        ErrorKind::NonceRetired
    );
    assert_eq!(vault.transfer().treasury.balance(), 900);
    assert_eq!(vault.transfer().treasury.payments().len(), 1);
}

#[test]
fn test_replay_with_any_action_rejected() {
    let replay = Reentry {
        caller: id("carol"),
        action: Action::forward("mallory", 900),
        nonce: 7,
    };
    let mut vault = vault(ReentrantTransfer::new(1000, vec![replay]));

    vault.propose_forward(&id("alice"), "mallory", 100, 7).unwrap();
    vault.propose_forward(&id("bob"), "mallory", 100, 7).unwrap();

    assert_eq!(
        vault.transfer().observed[0].as_ref().unwrap_err().kind(),
        ErrorKind::NonceRetired
    );
    assert_eq!(vault.transfer().treasury.balance(), 900);
}

#[test]
fn test_nested_confirmation_commits() {
    let nested = Reentry {
        caller: id("carol"),
        action: Action::forward("mallory", 50),
        nonce: 8,
    };
    let mut vault = vault(ReentrantTransfer::new(1000, vec![nested]));

    vault.propose_forward(&id("alice"), "mallory", 50, 8).unwrap();
    vault.propose_forward(&id("alice"), "mallory", 100, 7).unwrap();
    vault.propose_forward(&id("bob"), "mallory", 100, 7).unwrap();

    assert!(matches!(
        vault.transfer().observed[0],
        Ok(ProposalOutcome::Executed(_))
    ));
    assert_eq!(vault.nonce_record(7).state, NonceState::Done);
    assert_eq!(vault.nonce_record(8).state, NonceState::Done);
    assert_eq!(vault.transfer().treasury.balance(), 850);
    assert!(vault.audit_log().verify_chain().is_ok());
}

#[test]
fn test_outer_failure_unwinds_nested_calls() {
    init_tracing();
    let nested = Reentry {
        caller: id("carol"),
        action: Action::add_principal("mallory"),
        nonce: 8,
    };
    let mut transfer = ReentrantTransfer::new(1000, vec![nested]);
    transfer.fail_after_reentry = true;
    let mut vault = vault(transfer);

    vault.propose_add(&id("alice"), "mallory", 8).unwrap();
    vault.propose_forward(&id("alice"), "dana", 100, 7).unwrap();
    let before = vault.snapshot();

    let err = vault.propose_forward(&id("bob"), "dana", 100, 7).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TransferFailed);
    // the nested add succeeded on its own
    assert!(matches!(
        vault.transfer().observed[0],
        Ok(ProposalOutcome::Executed(_))
    ));
    assert!(!vault.is_active(&id("mallory")));
    assert_eq!(vault.nonce_record(7).state, NonceState::Open);
    assert_eq!(vault.nonce_record(8).state, NonceState::Open);
    assert_eq!(vault.snapshot(), before);
    assert_eq!(vault.transfer().treasury.balance(), 1000);
}

#[test]
fn test_outer_failure_unwinds_nested_open() {
    let nested = Reentry {
        caller: id("carol"),
        action: Action::forward("mallory", 1),
        nonce: 99,
    };
    let mut transfer = ReentrantTransfer::new(1000, vec![nested]);
    transfer.fail_after_reentry = true;
    let mut vault = vault(transfer);

    vault.propose_forward(&id("alice"), "dana", 100, 7).unwrap();
    vault.propose_forward(&id("bob"), "dana", 100, 7).unwrap_err();

    assert_eq!(vault.transfer().observed[0], Ok(ProposalOutcome::Opened));
    assert_eq!(vault.known_nonces(), &[7]);
    assert_eq!(vault.nonce_record(99).state, NonceState::Empty);
}

#[test]
fn test_state_accepts_dyn_transfer() {
    let mut state = VaultState::with_principals(["alice", "bob"]).unwrap();
    let mut treasury = Treasury::with_balance(10);
    let transfer: &mut dyn ValueTransfer = &mut treasury;

    state.propose_forward(&id("alice"), "dana", 10, 1, transfer).unwrap();
    state.propose_forward(&id("bob"), "dana", 10, 1, transfer).unwrap();

    assert_eq!(treasury.balance(), 0);
}
