use gatehouse::infra::audit_logger::AuditLogger;
use gatehouse::infra::credential_store::{
    CredentialError, CredentialManager, EncryptedFileStore, SecretStore,
};
use gatehouse_tools::ExecutionMode;
use std::sync::Arc;
use tempfile::TempDir;

fn test_key() -> [u8; 32] {
    [42u8; 32]
}

fn manager(temp: &TempDir, mode: ExecutionMode) -> (CredentialManager, Arc<AuditLogger>) {
    let store = EncryptedFileStore::open(temp.path().join("credentials"), &test_key()).unwrap();
    let logger = Arc::new(
        AuditLogger::new(
            mode,
            temp.path().join("audit.log"),
            temp.path().join("audit.key"),
        )
        .unwrap(),
    );
    (
        CredentialManager::new(Arc::new(store), logger.clone()),
        logger,
    )
}

#[test]
fn store_and_fetch_roundtrip() {
    let temp = TempDir::new().unwrap();
    let (manager, _) = manager(&temp, ExecutionMode::Extended);

    manager.store("alice", "secret123").unwrap();
    assert_eq!(manager.fetch("alice").unwrap().unwrap(), "secret123");
}

#[test]
fn store_overwrites_previous_value() {
    let temp = TempDir::new().unwrap();
    let (manager, _) = manager(&temp, ExecutionMode::Extended);

    manager.store("token", "old").unwrap();
    manager.store("token", "new").unwrap();
    assert_eq!(manager.fetch("token").unwrap().unwrap(), "new");
}

#[test]
fn delete_removes_the_secret() {
    let temp = TempDir::new().unwrap();
    let (manager, _) = manager(&temp, ExecutionMode::Extended);

    manager.store("temp", "value").unwrap();
    manager.delete("temp").unwrap();
    assert!(manager.fetch("temp").unwrap().is_none());
}

#[test]
fn fetch_absent_reports_found_false_without_secret_field() {
    let temp = TempDir::new().unwrap();
    let (manager, logger) = manager(&temp, ExecutionMode::Extended);

    assert!(manager.fetch("nobody").unwrap().is_none());

    let records = logger.read_records().unwrap();
    let record = records.last().unwrap().as_ref().unwrap();
    assert_eq!(record.event, "credential_fetch");
    assert_eq!(record.payload["found"], false);
    assert_eq!(record.payload["username"], "nobody");
    let keys: Vec<&String> = record.payload.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 2);
}

#[test]
fn secret_value_never_reaches_the_audit_log() {
    let temp = TempDir::new().unwrap();
    let (manager, _) = manager(&temp, ExecutionMode::Extended);

    manager.store("alice", "hunter2-super-secret").unwrap();
    manager.fetch("alice").unwrap();

    // Extended-mode log is plaintext, so a leak would be directly visible.
    let log = std::fs::read_to_string(temp.path().join("audit.log")).unwrap();
    assert!(log.contains("credential_store"));
    assert!(log.contains("credential_fetch"));
    assert!(!log.contains("hunter2-super-secret"));
}

#[test]
fn secrets_are_encrypted_on_disk() {
    let temp = TempDir::new().unwrap();
    let store = EncryptedFileStore::open(temp.path(), &test_key()).unwrap();
    store.store("alice", "plaintext-secret").unwrap();

    let entries: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
    let blob = std::fs::read(entries[0].as_ref().unwrap().path()).unwrap();
    assert!(!blob.is_empty());
    assert!(!blob.windows(b"plaintext-secret".len()).any(|w| w == b"plaintext-secret"));
}

#[test]
fn wrong_key_fails_to_decrypt() {
    let temp = TempDir::new().unwrap();
    let store = EncryptedFileStore::open(temp.path(), &test_key()).unwrap();
    store.store("alice", "value").unwrap();

    let wrong = EncryptedFileStore::open(temp.path(), &[9u8; 32]).unwrap();
    assert!(matches!(
        wrong.fetch("alice"),
        Err(CredentialError::Encryption)
    ));
}

#[test]
fn secrets_persist_across_instances() {
    let temp = TempDir::new().unwrap();
    {
        let store = EncryptedFileStore::open(temp.path(), &test_key()).unwrap();
        store.store("durable", "data").unwrap();
    }
    let store = EncryptedFileStore::open(temp.path(), &test_key()).unwrap();
    assert_eq!(store.fetch("durable").unwrap().unwrap(), "data");
}

#[test]
fn credential_ops_are_audited_in_isolated_mode_too() {
    let temp = TempDir::new().unwrap();
    let (manager, logger) = manager(&temp, ExecutionMode::Isolated);

    manager.store("alice", "s3cret").unwrap();
    manager.delete("alice").unwrap();

    let records = logger.read_records().unwrap();
    let events: Vec<String> = records
        .iter()
        .map(|r| r.as_ref().unwrap().event.clone())
        .collect();
    assert_eq!(events, vec!["credential_store", "credential_delete"]);
}
