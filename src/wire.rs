//! Text encoding of an export
//!
//! Format: `encrypted:{hex(salt[16])}{hex(nonce[12])}{hex(ciphertext+tag)}`
//!
//! Salt and nonce are fixed-width; everything after them is the sealed
//! payload, which is never shorter than the 16-byte tag.

use crate::aead::{NONCE_LEN, TAG_LEN};
use crate::error::{ConnsealError, ErrorCategory, ErrorKind, Result};
use crate::kdf::SALT_LEN;

/// Variant tag preceding the first `:`
pub const VARIANT: &str = "encrypted";

/// Full literal prefix of every export
pub const PREFIX: &str = "encrypted:";

const SALT_HEX_LEN: usize = SALT_LEN * 2;
const NONCE_HEX_LEN: usize = NONCE_LEN * 2;
const MIN_BODY_HEX_LEN: usize = SALT_HEX_LEN + NONCE_HEX_LEN + TAG_LEN * 2;

/// The decoded components of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext with the authentication tag appended.
    pub ciphertext: Vec<u8>,
}

/// Encode an envelope as lowercase hex behind the `encrypted:` prefix.
pub fn encode(envelope: &Envelope) -> String {
    let mut out =
        String::with_capacity(PREFIX.len() + MIN_BODY_HEX_LEN + envelope.ciphertext.len() * 2);
    out.push_str(PREFIX);
    out.push_str(&hex::encode(envelope.salt));
    out.push_str(&hex::encode(envelope.nonce));
    out.push_str(&hex::encode(&envelope.ciphertext));
    out
}

/// Parse an export string back into its components.
///
/// Hex is accepted in either case. No key derivation happens here, so
/// malformed input is rejected cheaply.
pub fn decode(exported: &str) -> Result<Envelope> {
    let body = match exported.split_once(':') {
        Some((VARIANT, body)) => body,
        _ => {
            return Err(ConnsealError::with_kind(
                ErrorCategory::User,
                ErrorKind::UnexpectedVariant,
                "input unrecognized as an encrypted export",
            ));
        }
    };

    let body = body.as_bytes();
    if body.len() < MIN_BODY_HEX_LEN {
        return Err(malformed(
            "input shorter than salt, nonce and tag; likely truncated",
        ));
    }

    let (salt_hex, rest) = body.split_at(SALT_HEX_LEN);
    let (nonce_hex, ciphertext_hex) = rest.split_at(NONCE_HEX_LEN);

    let mut salt = [0u8; SALT_LEN];
    hex::decode_to_slice(salt_hex, &mut salt).map_err(|e| hex_error("salt", e))?;

    let mut nonce = [0u8; NONCE_LEN];
    hex::decode_to_slice(nonce_hex, &mut nonce).map_err(|e| hex_error("nonce", e))?;

    let ciphertext = hex::decode(ciphertext_hex).map_err(|e| hex_error("ciphertext", e))?;

    Ok(Envelope {
        salt,
        nonce,
        ciphertext,
    })
}

/// Cheap check used before offering a file for restore.
///
/// Only the prefix is inspected; a `true` result does not mean [`decode`]
/// will succeed.
pub fn looks_like_export(text: &str) -> bool {
    text.starts_with(PREFIX)
}

fn malformed(msg: impl Into<String>) -> ConnsealError {
    ConnsealError::with_kind(ErrorCategory::User, ErrorKind::Malformed, msg)
}

fn hex_error(field: &str, err: hex::FromHexError) -> ConnsealError {
    ConnsealError::with_kind_and_source(
        ErrorCategory::User,
        ErrorKind::Malformed,
        format!("hex decoding of {} failed: {}", field, err),
        err,
    )
}
