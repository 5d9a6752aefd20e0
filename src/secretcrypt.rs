//! Passphrase encryption of text using Argon2id + ChaCha20-Poly1305
//!
//! This module ties the pieces together:
//! - a fresh random salt and nonce per call
//! - Argon2id (interactive profile) to turn the passphrase into a key
//! - ChaCha20-Poly1305 (IETF) to seal the UTF-8 plaintext
//! - the `encrypted:` hex encoding from [`crate::wire`]
//!
//! Both directions are stateless single calls. Key material lives in
//! `Zeroizing` buffers and is wiped on every exit path.

use crate::aead::{self, NONCE_LEN};
use crate::error::{ConnsealError, ErrorCategory, ErrorKind, Result};
use crate::kdf::{self, SALT_LEN};
use crate::random::random_bytes;
use crate::wire::{self, Envelope};
use tracing::debug;
use zeroize::Zeroize;

/// Encrypt `plaintext` under `passphrase`, returning the export string.
pub fn encrypt_with_passphrase(plaintext: &str, passphrase: &str) -> Result<String> {
    let salt: [u8; SALT_LEN] = random_bytes();
    let nonce: [u8; NONCE_LEN] = random_bytes();

    encrypt_deterministic(plaintext, passphrase, &salt, &nonce)
}

/// Encrypt using the provided salt and nonce
///
/// This function is ONLY for producing known-answer test vectors.
/// NEVER use this in production - always use [`encrypt_with_passphrase`],
/// which draws a fresh salt and nonce.
pub fn encrypt_deterministic(
    plaintext: &str,
    passphrase: &str,
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<String> {
    let key = kdf::derive_key(passphrase.as_bytes(), salt)?;
    let ciphertext = aead::seal(&key, nonce, plaintext.as_bytes())?;
    debug!(
        plaintext_len = plaintext.len(),
        ciphertext_len = ciphertext.len(),
        "sealed export"
    );

    Ok(wire::encode(&Envelope {
        salt: *salt,
        nonce: *nonce,
        ciphertext,
    }))
}

/// Decrypt an export string produced by [`encrypt_with_passphrase`].
///
/// The string is parsed before any key derivation, so malformed input is
/// rejected without paying for Argon2id. The returned error always carries
/// one of `UnexpectedVariant`, `Malformed`, `AuthenticationFailed` or
/// `InvalidUtf8` as its kind (or `KdfFailure` for an internal fault).
pub fn decrypt_with_passphrase(exported: &str, passphrase: &str) -> Result<String> {
    let envelope = wire::decode(exported)?;
    let key = kdf::derive_key(passphrase.as_bytes(), &envelope.salt)?;
    let mut plaintext = aead::open(&key, &envelope.nonce, &envelope.ciphertext)?;
    debug!(plaintext_len = plaintext.len(), "opened export");

    String::from_utf8(std::mem::take(&mut *plaintext)).map_err(|e| {
        e.into_bytes().zeroize();
        ConnsealError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidUtf8,
            "decrypted payload is not valid UTF-8",
        )
    })
}
