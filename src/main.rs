//! Puff - layered, age-encrypted configuration for apps, environments and targets.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use puff::cli::output;
use puff::cli::{execute, Cli};
use puff::error::{CipherError, ConfigError, Error, FormatError, KeyError};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("PUFF_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("puff=debug")
        } else {
            EnvFilter::new("puff=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = execute(cli.command, &cli.root) {
        let suggestion = match &e {
            Error::Key(KeyError::NoRecipients(_)) => Some("run: puff init --age-keys age1..."),
            Error::Cipher(CipherError::NoMatchingIdentity(_)) => {
                Some("set PUFF_AGE_KEY_FILE to a key file holding one of the document's identities")
            }
            Error::Config(ConfigError::AlreadyInitialized(_)) => {
                Some("run: puff keys add -k age1... to authorize more keys")
            }
            Error::Format(FormatError::MissingOption { .. }) => {
                Some("pass --secret-name NAME or set generate.secret_name in .puff.toml")
            }
            Error::Cleanup { .. } => Some("delete the working copy manually"),
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::error_hint(hint);
        }
        std::process::exit(1);
    }
}
