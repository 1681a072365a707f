//! Durable storage for the single active Identity Token.
//!
//! Exactly one key is persisted: the token string. It survives process
//! restarts and is removed only by an explicit reset.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use super::token::IdentityToken;

/// Errors from the identity store.
#[derive(Debug, Error)]
pub enum IdentityStoreError {
    /// Failed to read the stored token.
    #[error("Failed to read identity from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write or remove the stored token.
    #[error("Failed to write identity to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Durable single-key token storage.
///
/// Synchronous and object-safe: every operation is a small local write.
pub trait IdentityStore: Send + Sync {
    /// Load the stored token, if any.
    fn load(&self) -> Result<Option<IdentityToken>, IdentityStoreError>;

    /// Persist `token`, replacing any previous value.
    fn save(&self, token: &IdentityToken) -> Result<(), IdentityStoreError>;

    /// Remove the stored token. Succeeds if none is stored.
    fn clear(&self) -> Result<(), IdentityStoreError>;
}

/// File-backed identity store.
///
/// Writes go to a sibling temporary file and are renamed into place, so a
/// crash mid-write never leaves a truncated token behind.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    /// Create a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, source: io::Error) -> IdentityStoreError {
        IdentityStoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl IdentityStore for FileIdentityStore {
    fn load(&self) -> Result<Option<IdentityToken>, IdentityStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(IdentityToken::parse(&contents).ok()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(IdentityStoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn save(&self, token: &IdentityToken) -> Result<(), IdentityStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, token.as_str()).map_err(|e| self.write_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.write_error(e))?;

        tracing::debug!(path = %self.path.display(), "Identity token persisted");
        Ok(())
    }

    fn clear(&self) -> Result<(), IdentityStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Identity token cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.write_error(e)),
        }
    }
}

/// In-memory identity store, for tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    token: Mutex<Option<IdentityToken>>,
}

impl MemoryIdentityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `token`.
    pub fn with_token(token: IdentityToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> Result<Option<IdentityToken>, IdentityStoreError> {
        Ok(self.token.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, token: &IdentityToken) -> Result<(), IdentityStoreError> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), IdentityStoreError> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
