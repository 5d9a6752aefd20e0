//! Passphrase reading functionality
//!
//! The encryption core takes the passphrase as a plain `&str` and imposes no
//! policy. Confirmation and minimum length are caller concerns and live here
//! as reader wrappers.

use crate::error::{ConnsealError, ErrorCategory, ErrorKind, Result};
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Default minimum passphrase length, in characters, applied by the CLI.
pub const DEFAULT_MIN_PASSPHRASE_LEN: usize = 8;

/// Trait for reading passphrases from various sources
pub trait PassphraseReader {
    /// Read a passphrase as arbitrary bytes (not necessarily UTF-8)
    ///
    /// Returns the passphrase wrapped in `Zeroizing` to ensure it is securely
    /// wiped from memory when dropped.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// View a passphrase as UTF-8 text, which is what the core accepts.
pub fn passphrase_str(passphrase: &[u8]) -> Result<&str> {
    std::str::from_utf8(passphrase).map_err(|e| {
        ConnsealError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::PassphraseRejected,
            "passphrase is not valid UTF-8",
            e,
        )
    })
}

/// Returns a fixed passphrase (for testing)
pub struct ConstantPassphraseReader {
    passphrase: Zeroizing<Vec<u8>>,
}

impl ConstantPassphraseReader {
    pub fn new(passphrase: Vec<u8>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase),
        }
    }
}

impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new((*self.passphrase).clone()))
    }
}

/// Reads passphrase from any io::Read source
///
/// The whole stream is the passphrase; nothing (not even a trailing newline)
/// is stripped.
pub struct ReaderPassphraseReader {
    reader: Box<dyn Read>,
}

impl ReaderPassphraseReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PassphraseReader for ReaderPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            ConnsealError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading passphrase: {}", e),
                e,
            )
        })?;
        Ok(data)
    }
}

/// Reads passphrase from terminal with no echo
pub struct TerminalPassphraseReader {
    prompt: &'static str,
}

impl TerminalPassphraseReader {
    pub fn new() -> Self {
        Self::with_prompt("Passphrase: ")
    }

    pub fn with_prompt(prompt: &'static str) -> Self {
        Self { prompt }
    }
}

impl Default for TerminalPassphraseReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if !io::stdin().is_terminal() {
            return Err(ConnsealError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "cannot read passphrase from terminal - stdin is not a terminal",
            ));
        }

        io::stderr()
            .write_all(self.prompt.as_bytes())
            .map_err(|e| {
                ConnsealError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;
        io::stderr().flush().map_err(|e| {
            ConnsealError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to flush prompt: {}", e),
                e,
            )
        })?;

        // Read password *without echo*
        // Note: rpassword returns String (UTF-8 only), not zeroized
        let passphrase = rpassword::read_password().map_err(|e| {
            ConnsealError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("failure reading passphrase: {}", e),
                e,
            )
        })?;

        Ok(Zeroizing::new(passphrase.into_bytes()))
    }
}

/// Reads the passphrase twice and fails unless both entries match.
pub struct ConfirmingPassphraseReader {
    first: Box<dyn PassphraseReader>,
    confirm: Box<dyn PassphraseReader>,
}

impl ConfirmingPassphraseReader {
    pub fn new(first: Box<dyn PassphraseReader>, confirm: Box<dyn PassphraseReader>) -> Self {
        Self { first, confirm }
    }

    /// Prompts on the terminal for the passphrase and its confirmation.
    pub fn terminal() -> Self {
        Self::new(
            Box::new(TerminalPassphraseReader::with_prompt("New passphrase: ")),
            Box::new(TerminalPassphraseReader::with_prompt("Confirm passphrase: ")),
        )
    }
}

impl PassphraseReader for ConfirmingPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let passphrase = self.first.read_passphrase()?;
        let confirmation = self.confirm.read_passphrase()?;
        if *passphrase != *confirmation {
            return Err(ConnsealError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseRejected,
                "passphrases do not match",
            ));
        }
        Ok(passphrase)
    }
}

/// Rejects passphrases shorter than `min_chars` characters.
pub struct MinLengthPassphraseReader {
    upstream: Box<dyn PassphraseReader>,
    min_chars: usize,
}

impl MinLengthPassphraseReader {
    pub fn new(upstream: Box<dyn PassphraseReader>, min_chars: usize) -> Self {
        Self {
            upstream,
            min_chars,
        }
    }
}

impl PassphraseReader for MinLengthPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let passphrase = self.upstream.read_passphrase()?;
        let chars = passphrase_str(&passphrase)?.chars().count();
        if chars < self.min_chars {
            return Err(ConnsealError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseRejected,
                format!(
                    "passphrase must be at least {} characters long",
                    self.min_chars
                ),
            ));
        }
        Ok(passphrase)
    }
}

/// Reads from `upstream` once and hands out copies of that passphrase on
/// every later call.
pub struct CachingPassphraseReader {
    upstream: Box<dyn PassphraseReader>,
    cached: Option<Zeroizing<Vec<u8>>>,
}

impl CachingPassphraseReader {
    pub fn new(upstream: Box<dyn PassphraseReader>) -> Self {
        Self {
            upstream,
            cached: None,
        }
    }
}

impl PassphraseReader for CachingPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if let Some(cached) = &self.cached {
            return Ok(Zeroizing::new((**cached).clone()));
        }
        let passphrase = self.upstream.read_passphrase()?;
        self.cached = Some(Zeroizing::new((*passphrase).clone()));
        Ok(passphrase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(passphrase: &[u8]) -> Box<dyn PassphraseReader> {
        Box::new(ConstantPassphraseReader::new(passphrase.to_vec()))
    }

    #[test]
    fn test_constant_reader() {
        let mut reader = ConstantPassphraseReader::new(b"test123".to_vec());
        assert_eq!(&*reader.read_passphrase().unwrap(), b"test123");
        assert_eq!(&*reader.read_passphrase().unwrap(), b"test123");
    }

    /// Tests the terminal reader. This is ignored by default and must be run
    /// explicitly and with human input:
    ///
    /// cargo test test_terminal_reader_interactive -- --ignored --nocapture
    #[test]
    #[ignore]
    fn test_terminal_reader_interactive() {
        let mut reader = TerminalPassphraseReader::new();
        println!("\nPlease enter a test passphrase:");
        let passphrase = reader.read_passphrase().unwrap();
        assert!(!passphrase.is_empty(), "Expected non-empty passphrase");
    }

    #[test]
    fn test_reader_passphrase_reader() {
        let data = b"mypassword";
        let mut reader = ReaderPassphraseReader::new(Box::new(&data[..]));
        assert_eq!(&*reader.read_passphrase().unwrap(), b"mypassword");
    }

    #[test]
    fn test_reader_keeps_trailing_newline() {
        let data = b"mypassword\n";
        let mut reader = ReaderPassphraseReader::new(Box::new(&data[..]));
        assert_eq!(&*reader.read_passphrase().unwrap(), b"mypassword\n");
    }

    #[test]
    fn test_passphrase_str() {
        assert_eq!(passphrase_str("pässword".as_bytes()).unwrap(), "pässword");

        let err = passphrase_str(&[0xff, 0xfe]).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::PassphraseRejected));
    }

    #[test]
    fn test_confirming_reader_match() {
        let mut reader = ConfirmingPassphraseReader::new(constant(b"same one"), constant(b"same one"));
        assert_eq!(&*reader.read_passphrase().unwrap(), b"same one");
    }

    #[test]
    fn test_confirming_reader_mismatch() {
        let mut reader = ConfirmingPassphraseReader::new(constant(b"first"), constant(b"second"));
        let err = reader.read_passphrase().unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::PassphraseRejected));
        assert_eq!(err.category, ErrorCategory::User);
    }

    #[test]
    fn test_confirming_reader_propagates_upstream_error() {
        struct FailingReader;

        impl PassphraseReader for FailingReader {
            fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
                Err(ConnsealError::with_kind(
                    ErrorCategory::Internal,
                    ErrorKind::PassphraseUnavailable,
                    "simulated error",
                ))
            }
        }

        let mut reader = ConfirmingPassphraseReader::new(constant(b"first"), Box::new(FailingReader));
        let err = reader.read_passphrase().unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::PassphraseUnavailable));
    }

    #[test]
    fn test_min_length_counts_characters() {
        // 8 characters, 16 bytes
        let mut reader = MinLengthPassphraseReader::new(constant("ääääääää".as_bytes()), 8);
        assert!(reader.read_passphrase().is_ok());

        let mut reader = MinLengthPassphraseReader::new(constant(b"short"), 8);
        let err = reader.read_passphrase().unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::PassphraseRejected));
        assert!(err.message().contains("at least 8"));
    }

    #[test]
    fn test_min_length_zero_accepts_empty() {
        let mut reader = MinLengthPassphraseReader::new(constant(b""), 0);
        assert_eq!(&*reader.read_passphrase().unwrap(), b"");
    }

    #[test]
    fn test_caching_reader_reads_upstream_once() {
        use std::cell::Cell;
        use std::rc::Rc;

        struct CountingReader {
            calls: Rc<Cell<usize>>,
        }

        impl PassphraseReader for CountingReader {
            fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
                self.calls.set(self.calls.get() + 1);
                Ok(Zeroizing::new(b"cached pass".to_vec()))
            }
        }

        let calls = Rc::new(Cell::new(0));
        let mut reader = CachingPassphraseReader::new(Box::new(CountingReader {
            calls: calls.clone(),
        }));

        assert_eq!(&*reader.read_passphrase().unwrap(), b"cached pass");
        assert_eq!(&*reader.read_passphrase().unwrap(), b"cached pass");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_caching_reader_does_not_cache_errors() {
        let mut reader = CachingPassphraseReader::new(Box::new(MinLengthPassphraseReader::new(
            constant(b"short"),
            8,
        )));
        assert!(reader.read_passphrase().is_err());
        let err = reader.read_passphrase().unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::PassphraseRejected));
    }

    #[test]
    fn test_caching_wraps_confirming_reader() {
        // Confirmation is asked once; later reads reuse the confirmed value.
        let mut reader = CachingPassphraseReader::new(Box::new(ConfirmingPassphraseReader::new(
            constant(b"same one"),
            constant(b"same one"),
        )));
        assert_eq!(&*reader.read_passphrase().unwrap(), b"same one");
        assert_eq!(&*reader.read_passphrase().unwrap(), b"same one");
    }
}
