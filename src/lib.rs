//! Connseal - passphrase-protected export and restore of node connection
//! secrets using Argon2id and ChaCha20-Poly1305.

#![forbid(unsafe_code)]

pub mod aead;
pub mod connection;
pub mod error;
pub mod file_ops;
pub mod kdf;
pub mod passphrase;
pub mod random;
pub mod secretcrypt;
pub mod wire;

pub use error::{ConnsealError, ErrorCategory, ErrorKind, Result};
pub use secretcrypt::{decrypt_with_passphrase, encrypt_with_passphrase};
