use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use zeroize::Zeroize;

use crate::infra::audit_logger::AuditLogger;

const NONCE_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encryption error")]
    Encryption,

    #[error("audit write failed: {0}")]
    Audit(String),
}

/// Backend holding named secrets. The gateway depends only on this
/// interface; swapping in a platform keychain is a backend concern.
pub trait SecretStore: Send + Sync {
    fn store(&self, user: &str, secret: &str) -> Result<(), CredentialError>;
    fn fetch(&self, user: &str) -> Result<Option<String>, CredentialError>;
    fn delete(&self, user: &str) -> Result<(), CredentialError>;
}

/// Default backend: one `<sha256(user)>.cred` file per secret holding
/// `nonce ‖ ciphertext`. Encrypts under a subkey derived from the gateway
/// key so credentials and audit records never share a raw key.
pub struct EncryptedFileStore {
    dir: PathBuf,
    cipher: Aes256Gcm,
}

impl EncryptedFileStore {
    pub fn open(dir: impl AsRef<Path>, master_key: &[u8; 32]) -> Result<Self, CredentialError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let mut subkey = Self::derive_subkey(master_key);
        let cipher = Aes256Gcm::new(&subkey.into());
        subkey.zeroize();

        Ok(Self { dir, cipher })
    }

    fn derive_subkey(master_key: &[u8; 32]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"gatehouse-credentials");
        hasher.update(master_key);
        hasher.finalize().into()
    }

    fn secret_path(&self, user: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(user.as_bytes());
        self.dir.join(format!("{:x}.cred", hasher.finalize()))
    }
}

impl SecretStore for EncryptedFileStore {
    fn store(&self, user: &str, secret: &str) -> Result<(), CredentialError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), secret.as_bytes())
            .map_err(|_| CredentialError::Encryption)?;

        let path = self.secret_path(user);
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        file.write_all(&nonce_bytes)?;
        file.write_all(&ciphertext)?;
        file.sync_all()?;
        Ok(())
    }

    fn fetch(&self, user: &str) -> Result<Option<String>, CredentialError> {
        let path = self.secret_path(user);
        if !path.exists() {
            return Ok(None);
        }

        let data = fs::read(&path)?;
        if data.len() < NONCE_LEN {
            return Err(CredentialError::Encryption);
        }
        let (nonce, ciphertext) = data.split_at(NONCE_LEN);
        let mut plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CredentialError::Encryption)?;

        let secret =
            String::from_utf8(plaintext.clone()).map_err(|_| CredentialError::Encryption)?;
        plaintext.zeroize();

        Ok(Some(secret))
    }

    fn delete(&self, user: &str) -> Result<(), CredentialError> {
        let path = self.secret_path(user);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// Audited front door for credential handling. Every operation is logged
/// in every mode; payloads carry the username and presence only — never
/// secret material.
pub struct CredentialManager {
    backend: Arc<dyn SecretStore>,
    audit: Arc<AuditLogger>,
}

impl CredentialManager {
    pub fn new(backend: Arc<dyn SecretStore>, audit: Arc<AuditLogger>) -> Self {
        Self { backend, audit }
    }

    pub fn store(&self, user: &str, secret: &str) -> Result<(), CredentialError> {
        self.backend.store(user, secret)?;
        self.audit
            .append("credential_store", json!({"username": user}))
            .map_err(|e| CredentialError::Audit(e.to_string()))?;
        Ok(())
    }

    pub fn fetch(&self, user: &str) -> Result<Option<String>, CredentialError> {
        let secret = self.backend.fetch(user)?;
        self.audit
            .append(
                "credential_fetch",
                json!({"username": user, "found": secret.is_some()}),
            )
            .map_err(|e| CredentialError::Audit(e.to_string()))?;
        Ok(secret)
    }

    pub fn delete(&self, user: &str) -> Result<(), CredentialError> {
        self.backend.delete(user)?;
        self.audit
            .append("credential_delete", json!({"username": user}))
            .map_err(|e| CredentialError::Audit(e.to_string()))?;
        Ok(())
    }
}
