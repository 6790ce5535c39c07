//! Read surface, audit chain, snapshot export and config-driven setup

use crate::test_utils::{id, seeded_vault};
use twokey_core::Config;
use twokey_vault::audit::verify_records;
use twokey_vault::{Action, AuditChainError, AuditEvent, NonceState, Treasury, Vault};

#[test]
fn test_audit_follows_committed_history() {
    let mut vault = seeded_vault(1000);
    vault.propose_forward(&id("alice"), "dana", 300, 7).unwrap();
    vault.propose_forward(&id("carol"), "dana", 301, 7).unwrap_err();
    vault.propose_forward(&id("bob"), "dana", 300, 7).unwrap();
    vault.propose_add(&id("bob"), "erin", 8).unwrap();
    vault.cancel(&id("bob"), 8).unwrap();

    let events: Vec<_> = vault
        .audit_log()
        .records()
        .iter()
        .map(|record| record.event.clone())
        .collect();

    assert_eq!(events.len(), 7);
    assert_eq!(
        events[0],
        AuditEvent::PrincipalAdded {
            principal: id("alice"),
        }
    );
    assert_eq!(
        events[3],
        AuditEvent::ProposalOpened {
            nonce: 7,
            proposer: id("alice"),
            action: Action::forward("dana", 300),
        }
    );
    assert_eq!(
        events[4],
        AuditEvent::ProposalExecuted {
            nonce: 7,
            proposer: id("alice"),
            confirmer: id("bob"),
            action: Action::forward("dana", 300),
        }
    );
    assert!(matches!(events[5], AuditEvent::ProposalOpened { nonce: 8, .. }));
    assert!(matches!(events[6], AuditEvent::NonceCancelled { nonce: 8, .. }));
    assert!(vault.audit_log().verify_chain().is_ok());
}

#[test]
fn test_exported_audit_detects_tampering() {
    let mut vault = seeded_vault(1000);
    vault.propose_forward(&id("alice"), "dana", 300, 7).unwrap();
    vault.propose_forward(&id("bob"), "dana", 300, 7).unwrap();

    let mut records = vault.snapshot().audit;
    assert!(verify_records(&records).is_ok());

    records[4].event = AuditEvent::ProposalExecuted {
        nonce: 7,
        proposer: id("alice"),
        confirmer: id("bob"),
        action: Action::forward("mallory", 300),
    };
    assert_eq!(
        verify_records(&records),
        Err(AuditChainError::HashMismatch { seq: 4 })
    );
}

#[test]
fn test_snapshot_json_export() {
    let mut vault = seeded_vault(1000);
    vault.propose_add(&id("alice"), "erin", 11).unwrap();
    vault.propose_remove(&id("bob"), "carol", 12).unwrap();
    vault.propose_remove(&id("alice"), "carol", 12).unwrap();

    let json = vault.snapshot().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["principal_count"], 2);
    assert_eq!(value["principal_history"].as_array().unwrap().len(), 3);
    assert_eq!(value["nonces"][0]["nonce"], 11);
    assert_eq!(value["nonces"][0]["state"], "Open");
    assert_eq!(value["nonces"][1]["state"], "Done");
    assert_eq!(value["nonces"][1]["proposal"]["proposer"], "bob");
    assert_eq!(value["audit"].as_array().unwrap().len(), 7);
}

#[test]
fn test_read_surface_does_not_mutate() {
    let mut vault = seeded_vault(1000);
    vault.propose_add(&id("alice"), "erin", 1).unwrap();
    let before = vault.snapshot();

    assert!(vault.is_active(&id("alice")));
    assert!(!vault.is_active(&id("erin")));
    assert_eq!(vault.nonce_record(2).state, NonceState::Empty);
    assert_eq!(vault.known_nonces(), &[1]);
    let _ = vault.principal_history();
    let _ = vault.state().audit_log().head();

    assert_eq!(vault.snapshot(), before);
}

#[test]
fn test_vault_from_config_document() {
    let config = Config::from_toml_str(
        r#"
        [vault]
        principals = ["alice", "bob", "carol"]

        [logging]
        level = "twokey_vault=debug"
        "#,
    )
    .unwrap();
    twokey_core::logging::init_with(&config.logging).unwrap();

    let mut vault = Vault::from_config(&config.vault, Treasury::with_balance(50)).unwrap();
    vault.propose_forward(&id("carol"), "dana", 50, 1).unwrap();
    vault.propose_forward(&id("alice"), "dana", 50, 1).unwrap();

    assert_eq!(vault.principal_history(), &[id("alice"), id("bob"), id("carol")]);
    assert_eq!(vault.transfer().balance(), 0);
}

#[test]
fn test_duplicate_config_seed_rejected() {
    let config = Config::from_toml_str(
        r#"
        [vault]
        principals = ["alice", "bob", "alice"]
        "#,
    )
    .unwrap();

    let err = Vault::from_config(&config.vault, Treasury::new()).unwrap_err();
    assert_eq!(err.kind().as_str(), "duplicate_member");
}

#[test]
fn test_receive_then_forward() {
    let mut vault = seeded_vault(0);
    vault.receive(&id("anyone"), 75);

    vault.propose_forward(&id("alice"), "dana", 75, 3).unwrap();
    vault.propose_forward(&id("bob"), "dana", 75, 3).unwrap();

    let (state, treasury) = vault.into_parts();
    assert_eq!(treasury.balance(), 0);
    assert_eq!(state.nonce_record(3).state, NonceState::Done);
}
