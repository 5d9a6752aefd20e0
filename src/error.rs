use std::error::Error as StdError;

use thiserror::Error;

/// Generic text shown to users for any failure that could otherwise reveal
/// whether the passphrase or the export itself was at fault.
pub const GENERIC_DECRYPT_FAILURE: &str = "wrong passphrase or corrupted file";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// In particular this means that use of Internal is never a guarantee
    /// the error is not, for example due to a user error - merely that it
    /// cannot be confidently determined by the code.
    Internal,

    /// The user provided invalid input or performed an action that is
    /// unsupported or impossible to complete.
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
///
/// Errors produced while decrypting an export always carry one of
/// `UnexpectedVariant`, `Malformed`, `AuthenticationFailed` or `InvalidUtf8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The input does not start with the `encrypted` tag.
    UnexpectedVariant,
    /// The tag matched but the hex payload is truncated, of odd length or
    /// contains non-hex characters.
    Malformed,
    /// Authentication failed due to an incorrect passphrase or tampering
    /// or corruption.
    AuthenticationFailed,
    /// The payload authenticated but is not valid UTF-8 text.
    InvalidUtf8,
    /// Decrypted text is not a usable connection setup document.
    InvalidConnection,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// Passphrase was obtained but refused by caller policy (too short,
    /// confirmation mismatch, not UTF-8).
    PassphraseRejected,
    /// Low-level Argon2id key derivation failed.
    KdfFailure,
    /// ChaCha20-Poly1305 failed to seal data.
    CipherFailure,
    /// Unexpected state reached within connseal logic.
    InternalInvariant,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct ConnsealError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag for consumers that need to
    /// branch their behavior. Outside the decryption path, consuming code
    /// MUST handle the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl ConnsealError {
    /// Creates a new error with a required category and display message.
    pub fn new(category: ErrorCategory, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// The message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }

    /// True when the export string itself could not be parsed.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self.kind,
            Some(ErrorKind::UnexpectedVariant) | Some(ErrorKind::Malformed)
        )
    }

    /// Message safe to show an end user.
    ///
    /// Format and authentication failures collapse into one generic text so
    /// the caller never learns which of passphrase or ciphertext was wrong.
    pub fn user_message(&self) -> &str {
        if self.is_format_error() || self.kind == Some(ErrorKind::AuthenticationFailed) {
            GENERIC_DECRYPT_FAILURE
        } else {
            &self.msg
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ConnsealError>;
