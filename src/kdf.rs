//! Passphrase key derivation using Argon2id
//!
//! The interactive profile (Argon2id v1.3, 64 MiB, 2 passes, 1 lane) is
//! byte-compatible with libsodium's `crypto_pwhash` at
//! `OPSLIMIT_INTERACTIVE`/`MEMLIMIT_INTERACTIVE`, which is what existing
//! exports were produced with.

use crate::error::{ConnsealError, ErrorCategory, ErrorKind, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use std::time::Instant;
use tracing::trace;
use zeroize::Zeroizing;

/// Length of salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of derived key in bytes
pub const KEY_LEN: usize = 32;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub lanes: u32,
}

impl KdfParams {
    /// The only profile used for exports. The wire format carries no
    /// parameters, so changing this breaks every existing export.
    pub const INTERACTIVE: KdfParams = KdfParams {
        memory_kib: 64 * 1024,
        iterations: 2,
        lanes: 1,
    };
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::INTERACTIVE
    }
}

/// Derive a 32-byte key from a passphrase and salt at the interactive profile.
pub fn derive_key(passphrase: &[u8], salt: &[u8; SALT_LEN]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    derive_key_with_params(passphrase, salt, KdfParams::INTERACTIVE)
}

/// Derive a 32-byte key with explicit cost parameters.
pub fn derive_key_with_params(
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    params: KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let argon_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.lanes,
        Some(KEY_LEN),
    )
    .map_err(|e| {
        ConnsealError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::KdfFailure,
            format!("invalid Argon2id parameters: {e}"),
        )
    })?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let started = Instant::now();
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passphrase, salt, key.as_mut())
        .map_err(|e| {
            ConnsealError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::KdfFailure,
                format!("Argon2id key derivation failed: {e}"),
            )
        })?;
    trace!(elapsed_ms = started.elapsed().as_millis() as u64, "derived key");

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cheap parameters for unit tests.
    const FAST: KdfParams = KdfParams {
        memory_kib: 256,
        iterations: 1,
        lanes: 1,
    };

    #[test]
    fn test_deterministic() {
        let salt = [1u8; SALT_LEN];
        let k1 = derive_key_with_params(b"passphrase", &salt, FAST).unwrap();
        let k2 = derive_key_with_params(b"passphrase", &salt, FAST).unwrap();
        assert_eq!(*k1, *k2);
    }

    #[test]
    fn test_different_passphrase_different_key() {
        let salt = [2u8; SALT_LEN];
        let k1 = derive_key_with_params(b"passphrase one", &salt, FAST).unwrap();
        let k2 = derive_key_with_params(b"passphrase two", &salt, FAST).unwrap();
        assert_ne!(*k1, *k2);
    }

    #[test]
    fn test_different_salt_different_key() {
        let k1 = derive_key_with_params(b"same", &[1u8; SALT_LEN], FAST).unwrap();
        let k2 = derive_key_with_params(b"same", &[2u8; SALT_LEN], FAST).unwrap();
        assert_ne!(*k1, *k2);
    }

    #[test]
    fn test_empty_passphrase_allowed() {
        let key = derive_key_with_params(b"", &[0u8; SALT_LEN], FAST).unwrap();
        assert_eq!(key.len(), KEY_LEN);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let bad = KdfParams {
            memory_kib: 1,
            iterations: 0,
            lanes: 0,
        };
        let err = derive_key_with_params(b"x", &[0u8; SALT_LEN], bad).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::KdfFailure));
        assert_eq!(err.category, ErrorCategory::Internal);
    }

    #[test]
    fn test_interactive_profile_constants() {
        // libsodium MEMLIMIT_INTERACTIVE is given in bytes.
        assert_eq!(KdfParams::default(), KdfParams::INTERACTIVE);
        assert_eq!(KdfParams::INTERACTIVE.memory_kib * 1024, 67_108_864);
        assert_eq!(KdfParams::INTERACTIVE.iterations, 2);
    }
}
