//! ChaCha20-Poly1305 (IETF, 96-bit nonce) seal/open.

use crate::error::{ConnsealError, ErrorCategory, ErrorKind, Result};
use crate::kdf::KEY_LEN;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use zeroize::Zeroizing;

/// Length of nonce in bytes
pub const NONCE_LEN: usize = 12;

/// Length of the Poly1305 tag appended to every ciphertext
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext`, returning ciphertext with the tag appended.
pub fn seal(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| {
            ConnsealError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::CipherFailure,
                "encryption failed",
            )
        })
}

/// Verify and decrypt `sealed` (ciphertext plus tag).
///
/// No plaintext is returned unless the tag verifies.
pub fn open(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    sealed: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map(Zeroizing::new)
        .map_err(|_| {
            ConnsealError::with_kind(
                ErrorCategory::User,
                ErrorKind::AuthenticationFailed,
                "corrupt input, tampered-with data, or bad passphrase",
            )
        })
}
