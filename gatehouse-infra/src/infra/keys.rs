use parking_lot::Mutex;
use rand::RngCore;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zeroize::Zeroize;

pub const KEY_LEN: usize = 32;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("key file {0} is malformed")]
    Malformed(PathBuf),
}

/// Lazily materializes the symmetric key backing isolated-mode encryption.
///
/// Generation uses `create_new` so two processes racing on an empty data
/// directory cannot end up with different keys for the same path: the
/// loser of the race discards its candidate and reads the winner's file.
/// Once loaded, the key is cached for the process lifetime.
pub struct KeyManager {
    path: PathBuf,
    cached: Mutex<Option<[u8; KEY_LEN]>>,
}

impl KeyManager {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cached: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_or_generate(&self) -> Result<[u8; KEY_LEN], KeyError> {
        let mut cached = self.cached.lock();
        if let Some(key) = *cached {
            return Ok(key);
        }
        let key = if self.path.exists() {
            self.read_key()?
        } else {
            self.generate()?
        };
        *cached = Some(key);
        Ok(key)
    }

    fn read_key(&self) -> Result<[u8; KEY_LEN], KeyError> {
        let data = fs::read(&self.path)?;
        data.as_slice()
            .try_into()
            .map_err(|_| KeyError::Malformed(self.path.clone()))
    }

    fn generate(&self) -> Result<[u8; KEY_LEN], KeyError> {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        match options.open(&self.path) {
            Ok(mut file) => {
                file.write_all(&key)?;
                file.sync_all()?;
                Ok(key)
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                key.zeroize();
                self.read_key()
            }
            Err(err) => Err(err.into()),
        }
    }
}
