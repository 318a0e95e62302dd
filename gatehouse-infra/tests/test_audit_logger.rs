use gatehouse::infra::audit_logger::{AuditError, AuditLogger};
use gatehouse_tools::{AuditRecord, ExecutionMode};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn paths(temp: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    (temp.path().join("audit.log"), temp.path().join("audit.key"))
}

#[test]
fn extended_mode_appends_plaintext_json_lines() {
    let temp = TempDir::new().unwrap();
    let (log, key) = paths(&temp);
    let logger = AuditLogger::new(ExecutionMode::Extended, &log, &key).unwrap();

    logger.append("read_file", json!({"path": "a.txt"})).unwrap();
    logger.append("write_file", json!({"path": "b.txt", "bytes": 4})).unwrap();

    let content = fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in &lines {
        let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(parsed["mode"], "extended");
        assert!(parsed["ts"].is_f64() || parsed["ts"].is_number());
    }
    assert!(content.contains("read_file"));
}

#[test]
fn extended_mode_never_creates_a_key() {
    let temp = TempDir::new().unwrap();
    let (log, key) = paths(&temp);
    let logger = AuditLogger::new(ExecutionMode::Extended, &log, &key).unwrap();
    logger.append("local_task", json!({"task": "t"})).unwrap();
    assert!(!key.exists());
}

#[test]
fn isolated_mode_encrypts_at_rest() {
    let temp = TempDir::new().unwrap();
    let (log, key) = paths(&temp);
    let logger = AuditLogger::new(ExecutionMode::Isolated, &log, &key).unwrap();

    logger
        .append("read_file", json!({"path": "visible-name.txt"}))
        .unwrap();

    let raw = fs::read(&log).unwrap();
    let text = String::from_utf8_lossy(&raw);
    assert!(!text.contains("read_file"));
    assert!(!text.contains("visible-name"));
}

#[test]
fn isolated_roundtrip_is_byte_identical() {
    let temp = TempDir::new().unwrap();
    let (log, key) = paths(&temp);
    let logger = AuditLogger::new(ExecutionMode::Isolated, &log, &key).unwrap();

    let record = AuditRecord::new(
        "write_file",
        ExecutionMode::Isolated,
        json!({"path": "notes/a.txt", "bytes": 2}),
        1_700_000_000.125,
    );
    logger.write_record(&record).unwrap();

    let records = logger.read_records().unwrap();
    assert_eq!(records.len(), 1);
    let restored = records[0].as_ref().unwrap();
    assert_eq!(
        restored.canonical_json().unwrap(),
        record.canonical_json().unwrap()
    );
    assert_eq!(restored, &record);
}

#[test]
fn key_is_created_lazily_and_reused() {
    let temp = TempDir::new().unwrap();
    let (log, key) = paths(&temp);

    let logger = AuditLogger::new(ExecutionMode::Isolated, &log, &key).unwrap();
    assert!(!key.exists());
    logger.append("solve_equation", json!({"expression": "x"})).unwrap();
    assert!(key.exists());
    let key_bytes = fs::read(&key).unwrap();
    assert_eq!(key_bytes.len(), 32);

    // A second logger over the same paths decrypts the first one's records.
    let second = AuditLogger::new(ExecutionMode::Isolated, &log, &key).unwrap();
    second.append("vector_norm", json!({"norm": 1.0})).unwrap();
    assert_eq!(fs::read(&key).unwrap(), key_bytes);

    let records = second.read_records().unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.is_ok()));
}

#[cfg(unix)]
#[test]
fn key_file_has_restrictive_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let (log, key) = paths(&temp);
    let logger = AuditLogger::new(ExecutionMode::Isolated, &log, &key).unwrap();
    logger.append("local_task", json!({"task": "t"})).unwrap();

    let mode = fs::metadata(&key).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn single_byte_tamper_is_detected() {
    let temp = TempDir::new().unwrap();
    let (log, key) = paths(&temp);
    let logger = AuditLogger::new(ExecutionMode::Isolated, &log, &key).unwrap();
    logger.append("read_file", json!({"path": "a.txt"})).unwrap();

    let mut raw = fs::read(&log).unwrap();
    let mid = raw.len() / 2;
    raw[mid] ^= 0x01;
    fs::write(&log, &raw).unwrap();

    let records = logger.read_records().unwrap();
    assert_eq!(records.len(), 1);
    assert!(matches!(records[0], Err(AuditError::RecordCorrupt(_))));
}

#[test]
fn corrupt_record_does_not_hide_later_records() {
    let temp = TempDir::new().unwrap();
    let (log, key) = paths(&temp);
    let logger = AuditLogger::new(ExecutionMode::Isolated, &log, &key).unwrap();
    logger.append("first", json!({})).unwrap();
    logger.append("second", json!({})).unwrap();

    // Damage only the first line.
    let raw = fs::read(&log).unwrap();
    let newline = raw.iter().position(|b| *b == b'\n').unwrap();
    let mut damaged = raw.clone();
    damaged[newline / 2] ^= 0x01;
    fs::write(&log, &damaged).unwrap();

    let records = logger.read_records().unwrap();
    assert_eq!(records.len(), 2);
    assert!(matches!(records[0], Err(AuditError::RecordCorrupt(_))));
    let second = records[1].as_ref().unwrap();
    assert_eq!(second.event, "second");
}

#[test]
fn identical_records_share_one_canonical_form() {
    let a = AuditRecord::new("e", ExecutionMode::Extended, json!({"k": 1, "z": 2}), 5.5);
    let b = AuditRecord::new("e", ExecutionMode::Extended, json!({"z": 2, "k": 1}), 5.5);
    assert_eq!(a.canonical_json().unwrap(), b.canonical_json().unwrap());
}

#[test]
fn concurrent_writers_interleave_at_record_granularity() {
    let temp = TempDir::new().unwrap();
    let (log, key) = paths(&temp);

    // Generate the key up front so racing writers all read the same one.
    AuditLogger::new(ExecutionMode::Isolated, &log, &key)
        .unwrap()
        .append("setup", json!({}))
        .unwrap();

    let mut handles = vec![];
    for writer in 0..8 {
        let log = log.clone();
        let key = key.clone();
        handles.push(thread::spawn(move || {
            // Each thread acts as an independent process with its own
            // logger over the shared files.
            let logger = AuditLogger::new(ExecutionMode::Isolated, &log, &key).unwrap();
            for i in 0..10 {
                logger
                    .append("tick", json!({"writer": writer, "i": i}))
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let reader = AuditLogger::new(ExecutionMode::Isolated, &log, &key).unwrap();
    let records = reader.read_records().unwrap();
    assert_eq!(records.len(), 1 + 8 * 10);
    assert!(records.iter().all(|r| r.is_ok()));
}

#[test]
fn shared_logger_is_safe_across_threads() {
    let temp = TempDir::new().unwrap();
    let (log, key) = paths(&temp);
    let logger = Arc::new(AuditLogger::new(ExecutionMode::Extended, &log, &key).unwrap());

    let mut handles = vec![];
    for i in 0..10 {
        let logger = Arc::clone(&logger);
        handles.push(thread::spawn(move || {
            logger.append("tick", json!({"i": i})).unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let records = logger.read_records().unwrap();
    assert_eq!(records.len(), 10);
}
