//! HMAC-SHA256, SHA-256, and AES-256-GCM seal/open.
//!
//! Cryptography here follows this workspace's rule of thumb: no
//! openssl, ring/rustls throughout. AES-GCM uses `ring` rather than a
//! separate `aes-gcm` crate since `ring` is already the stack's
//! AEAD/randomness provider.

use hmac::{Hmac, Mac};
use iam_core::IamError;
use ring::aead::{self, BoundKey, Nonce, NonceSequence, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Computes HMAC-SHA256 over `msg` with `key`.
///
/// # Errors
///
/// Returns `IamError::Internal` if `key` cannot seed an HMAC instance
/// (HMAC accepts any key length, so this is effectively infallible but is
/// surfaced as a `Result` to keep the crypto boundary explicit).
pub fn hmac_sha256(key: &[u8], msg: &[u8]) -> Result<[u8; 32], IamError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| IamError::internal("hmac_sha256", e.to_string()))?;
    mac.update(msg);
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    Ok(out)
}

/// Computes SHA-256 over `msg`.
pub fn sha256(msg: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(msg);
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

/// A nonce sequence that yields exactly one nonce, generated fresh per
/// `encrypt` call. `ring`'s sealing API is built around a `NonceSequence`
/// even for single-use nonces.
struct OneShotNonce(Option<[u8; NONCE_LEN]>);

impl NonceSequence for OneShotNonce {
    fn advance(&mut self) -> Result<Nonce, ring::error::Unspecified> {
        self.0.take().map(Nonce::assume_unique_for_key).ok_or(ring::error::Unspecified)
    }
}

/// Encrypts `plaintext` under `key` (must be exactly 32 bytes) using
/// AES-256-GCM with an empty AAD. Returns `nonce ∥ ciphertext_and_tag`, a
/// fresh random 12-byte nonce prepended to the sealed output.
///
/// # Errors
///
/// Returns `IamError::Internal` if `key` is not 32 bytes, random nonce
/// generation fails, or sealing fails.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, IamError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| IamError::internal("encrypt", "invalid AES-256-GCM key length"))?;

    let rng = SystemRandom::new();
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| IamError::internal("encrypt", "failed to generate nonce"))?;

    let mut sealing_key = aead::SealingKey::new(unbound, OneShotNonce(Some(nonce_bytes)));

    let mut in_out = plaintext.to_vec();
    sealing_key
        .seal_in_place_append_tag(aead::Aad::empty(), &mut in_out)
        .map_err(|_| IamError::internal("encrypt", "AEAD seal failed"))?;

    let mut out = Vec::with_capacity(NONCE_LEN + in_out.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&in_out);
    Ok(out)
}

/// Decrypts `ciphertext` (as produced by [`encrypt`]) under `key`.
///
/// # Errors
///
/// Returns `IamError::Internal` if `key` is not 32 bytes, `ciphertext` is
/// shorter than the nonce size, or authentication fails.
pub fn decrypt(ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>, IamError> {
    if ciphertext.len() < NONCE_LEN {
        return Err(IamError::internal("decrypt", "ciphertext too short"));
    }

    let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_LEN);
    let mut nonce_arr = [0u8; NONCE_LEN];
    nonce_arr.copy_from_slice(nonce_bytes);

    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| IamError::internal("decrypt", "invalid AES-256-GCM key length"))?;
    let mut opening_key = aead::OpeningKey::new(unbound, OneShotNonce(Some(nonce_arr)));

    let mut in_out = sealed.to_vec();
    let plaintext = opening_key
        .open_in_place(aead::Aad::empty(), &mut in_out)
        .map_err(|_| IamError::internal("decrypt", "AEAD authentication failed"))?;

    Ok(plaintext.to_vec())
}

/// Constant-time comparison of two byte slices. `false` on any length
/// mismatch without leaking the point of divergence.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.len() == b.len() && bool::from(a.ct_eq(b))
}
