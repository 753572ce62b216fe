//! Master-key rotation manager.
//!
//! Holds the current 32-byte master key plus up to two previous keys,
//! retained only for decrypting secrets written before a rotation.

use crate::primitives::{decrypt, encrypt};
use iam_core::IamError;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

const MAX_PREVIOUS_KEYS: usize = 2;

struct MasterKeyState {
    current: Vec<u8>,
    previous: VecDeque<Vec<u8>>,
}

/// A cloneable, reader/writer-locked handle to the master-key state.
///
/// This is an explicit collaborator in place of a hidden process-global:
/// constructors take a `MasterKeyHandle` rather than reaching for ambient
/// state.
#[derive(Clone)]
pub struct MasterKeyHandle {
    state: Arc<RwLock<MasterKeyState>>,
}

impl std::fmt::Debug for MasterKeyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKeyHandle").field("state", &"[REDACTED]").finish()
    }
}

impl MasterKeyHandle {
    /// Creates a new handle seeded with `initial_key` (must be 32 bytes)
    /// and no previous keys.
    pub fn new(initial_key: [u8; 32]) -> Self {
        Self {
            state: Arc::new(RwLock::new(MasterKeyState {
                current: initial_key.to_vec(),
                previous: VecDeque::new(),
            })),
        }
    }

    /// Rotates to `new_key`: the old current key becomes the most recent
    /// previous key, and `previous` is truncated to the last two.
    pub async fn rotate(&self, new_key: [u8; 32]) {
        let mut state = self.state.write().await;
        let old_current = std::mem::replace(&mut state.current, new_key.to_vec());
        state.previous.push_front(old_current);
        state.previous.truncate(MAX_PREVIOUS_KEYS);
    }

    /// Encrypts `plaintext` under the current master key.
    ///
    /// # Errors
    ///
    /// Returns `IamError::Internal` if sealing fails.
    pub async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, IamError> {
        let state = self.state.read().await;
        encrypt(plaintext, &state.current)
    }

    /// Decrypts `ciphertext`, trying the current key first and then each
    /// previous key in order. Fails only if every key fails.
    ///
    /// # Errors
    ///
    /// Returns `IamError::FailedPrecondition` if no live master key can
    /// decrypt `ciphertext` — distinguishing "exhausted the key set" from
    /// a transient crypto error.
    pub async fn decrypt_any(&self, ciphertext: &[u8]) -> Result<Vec<u8>, IamError> {
        let state = self.state.read().await;
        if let Ok(plaintext) = decrypt(ciphertext, &state.current) {
            return Ok(plaintext);
        }
        for key in &state.previous {
            if let Ok(plaintext) = decrypt(ciphertext, key) {
                return Ok(plaintext);
            }
        }
        Err(IamError::failed_precondition(
            "failed to decrypt with any available key",
        ))
    }

    /// Re-encrypts every entry in `encrypted` under the current key.
    ///
    /// All-or-nothing on the caller's logical boundary: the first
    /// un-decryptable entry aborts the whole operation and the partial
    /// output is discarded (the caller receives only the error).
    ///
    /// # Errors
    ///
    /// Returns `IamError::FailedPrecondition` if any entry cannot be
    /// decrypted under any live key, or `IamError::Internal` if
    /// re-encryption fails.
    pub async fn re_encrypt_all(&self, encrypted: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, IamError> {
        let mut reencrypted = Vec::with_capacity(encrypted.len());
        for ciphertext in encrypted {
            let plaintext = self.decrypt_any(ciphertext).await?;
            let fresh = self.encrypt(&plaintext).await?;
            reencrypted.push(fresh);
        }
        Ok(reencrypted)
    }
}
