use std::fs::{File, TryLockError};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::CredentialError;
use crate::token::sibling;

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Exclusive lock on a token file, held as an OS advisory lock on a
/// `<token path>.lock` sidecar.
///
/// The sidecar is created on first use and never removed. Only the advisory
/// lock on it is taken and released, so a crashed holder releases the lock
/// when the OS closes its descriptor.
#[derive(Debug, Clone)]
pub struct TokenLock {
    path: PathBuf,
}

/// A held [`TokenLock`]. Dropping it closes the descriptor and releases the
/// lock.
#[derive(Debug)]
pub struct TokenLockGuard {
    file: File,
    path: PathBuf,
}

impl TokenLockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TokenLockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            debug!(path = %self.path.display(), error = %e, "unlock failed; closing the file releases it");
        }
    }
}

impl TokenLock {
    /// Lock guarding the token file at `token_path`.
    pub fn for_token(token_path: &Path) -> Self {
        Self {
            path: sibling(token_path, ".lock"),
        }
    }

    /// Path of the sidecar lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Try to take the lock once. Returns `None` if another holder has it.
    pub async fn try_acquire(&self) -> Result<Option<TokenLockGuard>, CredentialError> {
        let file = tokio::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .await
            .map_err(|e| CredentialError::io(&self.path, e))?
            .into_std()
            .await;

        match file.try_lock() {
            Ok(()) => Ok(Some(TokenLockGuard {
                file,
                path: self.path.clone(),
            })),
            Err(TryLockError::WouldBlock) => Ok(None),
            Err(TryLockError::Error(e)) => Err(CredentialError::io(&self.path, e)),
        }
    }

    /// Take the lock, polling until `timeout` elapses.
    pub async fn acquire(&self, timeout: Duration) -> Result<TokenLockGuard, CredentialError> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let Some(guard) = self.try_acquire().await? {
                debug!(path = %self.path.display(), "token lock acquired");
                return Ok(guard);
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(CredentialError::LockTimeout {
                    path: self.path.clone(),
                    waited: timeout,
                });
            }

            let remaining = deadline - tokio::time::Instant::now();
            tokio::time::sleep(LOCK_POLL_INTERVAL.min(remaining)).await;
        }
    }
}
