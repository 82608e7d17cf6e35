//! End-to-end broker behaviour against the in-memory vault

use std::sync::Arc;

use credbroker_core::{BrokerError, CredentialStore, ErrorKind, MemoryVault, VaultOp, VaultStatus};

fn setup() -> (Arc<MemoryVault>, CredentialStore) {
    let vault = Arc::new(MemoryVault::new());
    let store = CredentialStore::new(vault.clone());
    (vault, store)
}

#[test]
fn test_full_lifecycle() {
    let (vault, store) = setup();

    store.store("example.com", "alice", "s3cr3t").unwrap();
    let credential = store.fetch("example.com").unwrap();
    assert_eq!(credential.username, "alice");
    assert_eq!(credential.secret.expose(), "s3cr3t");

    store.update("example.com", "alice", "newpass").unwrap();
    let credential = store.fetch("example.com").unwrap();
    assert_eq!(credential.username, "alice");
    assert_eq!(credential.secret.expose(), "newpass");

    store.remove("example.com").unwrap();
    assert_eq!(
        store.fetch("example.com").unwrap_err().kind(),
        ErrorKind::NotFound
    );

    assert_eq!(vault.outstanding_handles(), 0);
}

#[test]
fn test_secret_round_trips_unchanged() {
    let (_, store) = setup();
    let secret = "  pä$$ wörd\t🔑 with \"quotes\" and trailing space ";

    store.store("unicode.example", "ünïcödé", secret).unwrap();
    let credential = store.fetch("unicode.example").unwrap();

    assert_eq!(credential.username, "ünïcödé");
    assert_eq!(credential.secret.expose(), secret);
}

#[test]
fn test_remove_is_absorbing() {
    let (vault, store) = setup();
    store.store("svc", "alice", "pw").unwrap();
    store.remove("svc").unwrap();

    assert_eq!(vault.match_count("svc"), 0);
    for err in [
        store.fetch("svc").unwrap_err(),
        store.update("svc", "alice", "pw2").unwrap_err(),
        store.remove("svc").unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    // The service can be claimed again afterwards.
    store.store("svc", "bob", "pw3").unwrap();
    assert_eq!(store.fetch("svc").unwrap().username, "bob");
}

#[test]
fn test_update_keeps_single_item() {
    let (vault, store) = setup();
    store.store("svc", "u1", "p1").unwrap();

    store.update("svc", "u2", "p2").unwrap();

    assert_eq!(vault.match_count("svc"), 1);
    let credential = store.fetch("svc").unwrap();
    assert_eq!(credential.username, "u2");
    assert_eq!(credential.secret.expose(), "p2");
}

#[test]
fn test_services_are_independent() {
    let (_, store) = setup();
    store.store("a.example", "alice", "pa").unwrap();
    store.store("b.example", "alice", "pb").unwrap();

    store.remove("a.example").unwrap();

    assert!(!store.exists("a.example").unwrap());
    assert_eq!(store.fetch("b.example").unwrap().secret.expose(), "pb");
}

#[test]
fn test_ambiguity_blocks_mutation() {
    let (vault, store) = setup();
    vault.insert_raw("svc", "alice", "one");
    vault.insert_raw("svc", "bob", "two");

    assert!(matches!(
        store.update("svc", "carol", "three"),
        Err(BrokerError::NotFound { matches: 2, .. })
    ));
    assert!(matches!(
        store.remove("svc"),
        Err(BrokerError::NotFound { matches: 2, .. })
    ));
    assert!(matches!(
        store.fetch("svc"),
        Err(BrokerError::NotFound { matches: 2, .. })
    ));
    assert_eq!(vault.mutations(), 0);
    assert_eq!(vault.match_count("svc"), 2);
}

#[test]
fn test_vault_failures_are_terminal() {
    let (vault, store) = setup();
    store.store("svc", "alice", "pw").unwrap();
    vault.fail_next(VaultOp::ModifyItem, VaultStatus::AUTH_FAILED);

    let err = store.update("svc", "alice", "new").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Vault);
    assert_eq!(err.vault_code(), Some(VaultStatus::AUTH_FAILED.code()));

    // No retry happened: the old secret is still in place.
    assert_eq!(store.fetch("svc").unwrap().secret.expose(), "pw");
    assert_eq!(vault.outstanding_handles(), 0);
}
