//! File encryption/decryption operations
//!
//! This module provides high-level file operations for exporting and
//! restoring connection secrets (or any UTF-8 text) as `encrypted:` files.
//!
//! Every output is written to a temporary file in the target directory,
//! fsynced, restricted to mode 0o600 on Unix and then renamed into place, so
//! readers see either the old file or the complete new one.

use crate::connection::{self, ConnectionSetup};
use crate::error::{ConnsealError, ErrorCategory, ErrorKind, Result};
use crate::passphrase::{PassphraseReader, passphrase_str};
use crate::secretcrypt;
use crate::wire::{self, Envelope};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::Zeroizing;

/// Encrypt a text file with a passphrase
///
/// Reads UTF-8 plaintext from `input_path`, encrypts it using a passphrase
/// from `passphrase_reader`, and writes the export string to `output_path`.
pub fn encrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let plaintext = read_text(input_path)?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let exported = secretcrypt::encrypt_with_passphrase(&plaintext, passphrase_str(&passphrase)?)
        .map_err(|e| e.with_context("encryption failed"))?;
    write_file_secure(output_path, exported.as_bytes())?;
    debug!(input = %input_path.display(), output = %output_path.display(), "encrypted file");

    Ok(())
}

/// Decrypt an export file with a passphrase
///
/// The file is parsed before the passphrase is requested, so a file that is
/// not an export fails without prompting.
pub fn decrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let exported = read_export(input_path)?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let plaintext = Zeroizing::new(
        secretcrypt::decrypt_with_passphrase(&exported, passphrase_str(&passphrase)?)
            .map_err(|e| e.with_context("failed to decrypt"))?,
    );
    write_file_secure(output_path, plaintext.as_bytes())?;
    debug!(input = %input_path.display(), output = %output_path.display(), "decrypted file");

    Ok(())
}

/// Export a connection setup JSON file
///
/// The input must parse as a [`ConnectionSetup`]. When `output_path` is
/// `None` the file is named by [`ConnectionSetup::export_file_name`] inside
/// `default_dir`. Returns the path written.
pub fn export_connection_file(
    input_path: &Path,
    output_path: Option<&Path>,
    default_dir: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<PathBuf> {
    let json = read_text(input_path)?;
    let setup = ConnectionSetup::from_json(&json)
        .map_err(|e| e.with_context(format!("failed to load {}", input_path.display())))?;
    let output_path = match output_path {
        Some(path) => path.to_path_buf(),
        None => default_dir.join(setup.export_file_name()),
    };

    let passphrase = passphrase_reader.read_passphrase()?;
    let exported = connection::export_connection(&setup, passphrase_str(&passphrase)?)
        .map_err(|e| e.with_context("encryption failed"))?;
    write_file_secure(&output_path, exported.as_bytes())?;
    debug!(output = %output_path.display(), "exported connection");

    Ok(output_path)
}

/// Restore a connection setup from an export file
///
/// Writes the setup back out as pretty-printed JSON and returns it.
pub fn restore_connection_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<ConnectionSetup> {
    let exported = read_export(input_path)?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let setup = connection::restore_connection(&exported, passphrase_str(&passphrase)?)
        .map_err(|e| e.with_context("failed to restore connection"))?;

    let json = Zeroizing::new(serde_json::to_string_pretty(&setup).map_err(|e| {
        ConnsealError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::InternalInvariant,
            "failed to serialize connection setup",
            e,
        )
    })?);
    write_file_secure(output_path, json.as_bytes())?;
    debug!(output = %output_path.display(), "restored connection");

    Ok(setup)
}

/// Parse an export file without decrypting it.
pub fn inspect_file(input_path: &Path) -> Result<Envelope> {
    let exported = read_text(input_path)?;
    wire::decode(trim_line_ending(&exported))
        .map_err(|e| e.with_context(format!("{} is not a valid export", input_path.display())))
}

/// Read an export file, tolerating one trailing line ending, and check its
/// structure.
fn read_export(path: &Path) -> Result<String> {
    let text = read_text(path)?;
    let exported = trim_line_ending(&text);
    if !wire::looks_like_export(exported) {
        debug!(input = %path.display(), "input does not start with the export prefix");
        return Err(ConnsealError::with_kind(
            ErrorCategory::User,
            ErrorKind::UnexpectedVariant,
            format!("{} is not an encrypted export", path.display()),
        ));
    }
    wire::decode(exported)
        .map_err(|e| e.with_context(format!("{} is not a valid export", path.display())))?;
    Ok(exported.to_string())
}

fn trim_line_ending(text: &str) -> &str {
    text.strip_suffix('\n')
        .map(|t| t.strip_suffix('\r').unwrap_or(t))
        .unwrap_or(text)
}

fn read_text(path: &Path) -> Result<Zeroizing<String>> {
    let bytes = fs::read(path).map_err(|e| read_error(path, e))?;
    let text = String::from_utf8(bytes).map_err(|e| {
        ConnsealError::with_kind(
            ErrorCategory::User,
            ErrorKind::Io,
            format!(
                "{} is not valid UTF-8 (at byte {})",
                path.display(),
                e.utf8_error().valid_up_to()
            ),
        )
    })?;
    Ok(Zeroizing::new(text))
}

/// Atomically replace `path` with `contents`, readable by the owner only.
fn write_file_secure(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        ConnsealError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to create tempfile in {}", dir.display()),
            e,
        )
    })?;

    temp_file
        .write_all(contents)
        .map_err(|e| io_error("failed to write to tempfile", e))?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file
        .flush()
        .map_err(|e| io_error("failed to flush tempfile", e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| io_error("failed to sync file prior to rename", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| io_error("failed to set tempfile permissions", e))?;
    }

    temp_file.persist(path).map_err(|e| {
        ConnsealError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

fn io_error(msg: &str, err: io::Error) -> ConnsealError {
    ConnsealError::with_kind_and_source(ErrorCategory::Internal, ErrorKind::Io, msg, err)
}

fn read_error(path: &Path, err: io::Error) -> ConnsealError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    ConnsealError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
