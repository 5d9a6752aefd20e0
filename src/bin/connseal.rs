//! Connseal CLI - passphrase-protected connection exports
//!
//! Command-line interface for exporting and restoring node connection
//! secrets (or any UTF-8 text) as `encrypted:` strings, using Argon2id key
//! derivation and ChaCha20-Poly1305.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;

use connseal::file_ops;
use connseal::passphrase::{
    ConfirmingPassphraseReader, DEFAULT_MIN_PASSPHRASE_LEN, MinLengthPassphraseReader,
    PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader,
};

#[derive(Parser)]
#[command(name = "connseal")]
#[command(version)]
#[command(about = "Passphrase-protected export and restore of connection secrets.", long_about = None)]
struct Cli {
    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a text file
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the encrypted text to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Refuse passphrases shorter than this many characters
        #[arg(long, value_name = "N", default_value_t = DEFAULT_MIN_PASSPHRASE_LEN)]
        min_passphrase_len: usize,
    },

    /// Decrypt an encrypted file
    #[command(alias = "d")]
    Decrypt {
        /// Path to the file whose contents is to be decrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the unencrypted text to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Export a connection setup JSON file as an encrypted key file
    Export {
        /// Path to the connection setup JSON
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to write the key file to [default: derived from the
        /// identity and registration name, in the current directory]
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Refuse passphrases shorter than this many characters
        #[arg(long, value_name = "N", default_value_t = DEFAULT_MIN_PASSPHRASE_LEN)]
        min_passphrase_len: usize,
    },

    /// Restore a connection setup JSON file from an encrypted key file
    #[command(alias = "r")]
    Restore {
        /// Path to the encrypted key file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to write the restored connection setup JSON to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Show the salt, nonce and payload size of an encrypted file
    Inspect {
        /// Path to the encrypted file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        debug!(error = ?e, "command failed");
        eprintln!("Error: {}", e.user_message());
        process::exit(1);
    }
}

fn run(cli: &Cli) -> connseal::Result<()> {
    match &cli.command {
        Commands::Encrypt {
            input,
            output,
            min_passphrase_len,
        } => {
            let mut reader = new_passphrase_reader(cli.passphrase_stdin, *min_passphrase_len);
            file_ops::encrypt_file(input, output, &mut *reader)
        }
        Commands::Decrypt { input, output } => {
            let mut reader = get_passphrase_reader(cli.passphrase_stdin);
            file_ops::decrypt_file(input, output, &mut *reader)
        }
        Commands::Export {
            input,
            output,
            min_passphrase_len,
        } => {
            let mut reader = new_passphrase_reader(cli.passphrase_stdin, *min_passphrase_len);
            let written = file_ops::export_connection_file(
                input,
                output.as_deref(),
                Path::new("."),
                &mut *reader,
            )?;
            println!("{}", written.display());
            Ok(())
        }
        Commands::Restore { input, output } => {
            let mut reader = get_passphrase_reader(cli.passphrase_stdin);
            let setup = file_ops::restore_connection_file(input, output, &mut *reader)?;
            println!("{}", setup.shinkai_identity);
            Ok(())
        }
        Commands::Inspect { input } => {
            let envelope = file_ops::inspect_file(input)?;
            println!("salt: {}", hex::encode(envelope.salt));
            println!("nonce: {}", hex::encode(envelope.nonce));
            println!("sealed bytes: {}", envelope.ciphertext.len());
            Ok(())
        }
    }
}

/// Reader for an existing passphrase.
fn get_passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalPassphraseReader::new())
    }
}

/// Reader for a passphrase being chosen; the terminal asks for confirmation.
fn new_passphrase_reader(use_stdin: bool, min_chars: usize) -> Box<dyn PassphraseReader> {
    let upstream: Box<dyn PassphraseReader> = if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(ConfirmingPassphraseReader::terminal())
    };
    Box::new(MinLengthPassphraseReader::new(upstream, min_chars))
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("connseal={default_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
