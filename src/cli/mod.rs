//! Command-line interface.

pub mod completions;
pub mod generate;
pub mod init;
pub mod keys;
pub mod output;
pub mod secrets;
pub mod workcopy;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::core::config::Settings;
use crate::core::identity::Keyring;
use crate::core::layout::QueryContext;
use crate::core::store::DocumentStore;
use crate::error::Result;

/// Puff - layered, encrypted configuration for every app, env and target.
#[derive(Parser)]
#[command(
    name = "puff",
    about = "Layered, age-encrypted configuration for apps, environments and targets",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Root directory of the configuration tree
    #[arg(short, long, global = true, env = "PUFF_ROOT", default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Which documents a command reads or writes.
#[derive(Args, Debug, Clone, Default)]
pub struct ScopeArgs {
    /// Application name
    #[arg(short, long)]
    pub app: Option<String>,

    /// Environment name
    #[arg(short, long)]
    pub env: Option<String>,

    /// Deployment target
    #[arg(short, long)]
    pub target: Option<String>,
}

impl ScopeArgs {
    pub fn context(&self, root: &Path) -> QueryContext {
        QueryContext::new(root)
            .with_app(self.app.as_deref())
            .with_env(self.env.as_deref())
            .with_target(self.target.as_deref())
    }
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Initialize an encrypted configuration tree
    Init {
        /// age public keys, comma separated
        #[arg(short = 'k', long = "age-keys", value_delimiter = ',', required = true)]
        keys: Vec<String>,
        /// Comment recorded for the keys in the ledger
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Print one resolved value
    Get {
        /// Key to look up
        #[arg(short, long)]
        key: String,
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Set a value in the most specific document the scope names
    Set {
        /// Key to set
        #[arg(short, long)]
        key: String,
        /// Value to store
        #[arg(short = 'v', long)]
        value: String,
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Render the full resolved configuration
    Generate {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Output format: env, json, yaml, k8s
        #[arg(short, long)]
        format: Option<String>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Secret name (k8s format)
        #[arg(long)]
        secret_name: Option<String>,
        /// Base64 values under `data` (k8s format)
        #[arg(long)]
        base64: bool,
    },

    /// Manage recipient keys
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },

    /// Decrypt a document into a .dec working copy
    Decrypt {
        /// Encrypted document
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Re-encrypt a .dec working copy and delete it
    Encrypt {
        /// Working copy (name.dec.yml)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Key subcommands.
#[derive(Subcommand)]
pub enum KeysAction {
    /// List recipients with comments and where they are used
    List,

    /// Authorize a key on every encrypted document
    Add {
        /// age public key
        #[arg(short, long)]
        key: String,
        /// Ledger comment
        #[arg(short, long)]
        comment: Option<String>,
        /// Only documents of this environment ("base" for global)
        #[arg(short, long)]
        env: Option<String>,
    },

    /// Revoke a key and rotate affected documents
    Rm {
        /// age public key
        #[arg(short, long)]
        key: String,
        /// Only documents of this environment ("base" for global)
        #[arg(short, long)]
        env: Option<String>,
    },
}

/// Settings and identities for `root`.
pub fn open_store(root: &Path) -> Result<(Settings, DocumentStore)> {
    let settings = Settings::load(root)?;
    let keyring = Keyring::discover(settings.identity.key_file.as_deref())?;
    Ok((settings, DocumentStore::new(keyring)))
}

/// Execute a command.
pub fn execute(command: Command, root: &Path) -> Result<()> {
    use Command::*;

    match command {
        Init { keys, comment } => init::execute(root, &keys, comment.as_deref()),
        Get { key, scope } => secrets::get(root, &scope, &key),
        Set { key, value, scope } => secrets::set(root, &scope, &key, &value),
        Generate {
            scope,
            format,
            output,
            secret_name,
            base64,
        } => generate::execute(
            root,
            &scope,
            generate::Request {
                format,
                output,
                secret_name,
                base64,
            },
        ),
        Keys { action } => match action {
            KeysAction::List => keys::list(root),
            KeysAction::Add { key, comment, env } => {
                keys::add(root, &key, comment.as_deref(), env.as_deref())
            }
            KeysAction::Rm { key, env } => keys::rm(root, &key, env.as_deref()),
        },
        Decrypt { file } => workcopy::decrypt(root, &file),
        Encrypt { file } => workcopy::encrypt(root, &file),
        Completions { shell } => completions::execute(shell),
    }
}
