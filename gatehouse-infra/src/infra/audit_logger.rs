use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use gatehouse_tools::{AuditRecord, ExecutionMode};
use parking_lot::Mutex;
use rand::RngCore;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zeroize::Zeroize;

use crate::infra::keys::{KeyError, KeyManager};

const NONCE_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("key error: {0}")]
    Key(#[from] KeyError),

    #[error("encryption failed")]
    Encryption,

    #[error("audit record corrupt: {0}")]
    RecordCorrupt(String),
}

/// Mode-aware append-only audit log.
///
/// Isolated mode seals each record independently with AES-256-GCM and
/// stores it as one base64 line; extended mode appends plaintext JSON
/// lines. The file is opened per write and each record is one append of a
/// single buffer, so concurrent writers interleave at record granularity
/// and never inside a record.
pub struct AuditLogger {
    mode: ExecutionMode,
    log_path: PathBuf,
    keys: KeyManager,
    cipher: Mutex<Option<Aes256Gcm>>,
}

impl AuditLogger {
    pub fn new(
        mode: ExecutionMode,
        log_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> Result<Self, AuditError> {
        let log_path = log_path.as_ref().to_path_buf();
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            mode,
            log_path,
            keys: KeyManager::new(key_path),
            cipher: Mutex::new(None),
        })
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Append one record stamped with the active mode and current time.
    pub fn append(&self, event: &str, payload: Value) -> Result<(), AuditError> {
        self.write_record(&AuditRecord::now(event, self.mode, payload))
    }

    /// Append a fully constructed record. Exposed so encoding can be
    /// verified against known timestamps.
    pub fn write_record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let plaintext = record.canonical_json()?;
        let mut line = match self.mode {
            ExecutionMode::Isolated => BASE64.encode(self.seal(&plaintext)?).into_bytes(),
            ExecutionMode::Extended => plaintext,
        };
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        file.write_all(&line)?;
        file.sync_all()?;
        Ok(())
    }

    /// Read every record back, one result per log line. A damaged line
    /// surfaces as `RecordCorrupt` without aborting the rest of the read;
    /// the caller decides whether to halt or continue past it.
    pub fn read_records(&self) -> Result<Vec<Result<AuditRecord, AuditError>>, AuditError> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read(&self.log_path)?;
        let mut records = Vec::new();
        for (index, chunk) in data.split(|b| *b == b'\n').enumerate() {
            if chunk.is_empty() {
                continue;
            }
            records.push(self.decode_line(index + 1, chunk));
        }
        Ok(records)
    }

    fn decode_line(&self, line: usize, chunk: &[u8]) -> Result<AuditRecord, AuditError> {
        let plaintext = match self.mode {
            ExecutionMode::Isolated => self.open_sealed(line, chunk)?,
            ExecutionMode::Extended => chunk.to_vec(),
        };
        serde_json::from_slice(&plaintext)
            .map_err(|e| AuditError::RecordCorrupt(format!("line {line}: invalid record: {e}")))
    }

    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, AuditError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let ciphertext = self
            .cipher()?
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| AuditError::Encryption)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn open_sealed(&self, line: usize, chunk: &[u8]) -> Result<Vec<u8>, AuditError> {
        let sealed = BASE64
            .decode(chunk)
            .map_err(|e| AuditError::RecordCorrupt(format!("line {line}: invalid encoding: {e}")))?;
        if sealed.len() < NONCE_LEN {
            return Err(AuditError::RecordCorrupt(format!(
                "line {line}: truncated record"
            )));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher()?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                AuditError::RecordCorrupt(format!("line {line}: authentication failed"))
            })
    }

    fn cipher(&self) -> Result<Aes256Gcm, AuditError> {
        let mut cached = self.cipher.lock();
        if let Some(cipher) = cached.as_ref() {
            return Ok(cipher.clone());
        }
        let mut key = self.keys.load_or_generate()?;
        let cipher = Aes256Gcm::new(&key.into());
        key.zeroize();
        *cached = Some(cipher.clone());
        Ok(cipher)
    }
}
