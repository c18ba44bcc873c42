//! Puff - layered, age-encrypted configuration for apps, environments and targets.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── init          # Create base/shared.yml and the ledger
//! │   ├── secrets       # get / set
//! │   ├── generate      # Render env, json, yaml or k8s
//! │   ├── keys/         # Recipient list / add / rm
//! │   ├── workcopy      # decrypt / encrypt working copies
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── cipher/       # Encryption primitives
//!     │   ├── mod       # Cipher trait
//!     │   ├── age       # age key wrapping
//!     │   └── aead      # AES-256-GCM value sealing
//!     ├── store/        # Document storage
//!     │   ├── mod       # Store trait, DocumentStore
//!     │   └── fs        # Private file writes
//!     ├── document      # Encrypted document model
//!     ├── layout        # Tiers, locations and scopes
//!     ├── resolve       # Layered merge
//!     ├── template      # ${NAME} expansion
//!     ├── format        # Output encodings
//!     ├── ledger        # .sops.yaml recipient ledger
//!     ├── recipients    # Recipient lifecycle across the tree
//!     ├── workcopy      # Plaintext working copies
//!     ├── secrets       # init / set / get / generate
//!     └── config        # .puff.toml settings
//! ```
//!
//! # Resolution order
//!
//! Lowest to highest precedence:
//!
//! 1. `base/shared.yml`, `base/<app>.yml`
//! 2. `<env>/shared.yml`, `<env>/<app>.yml`
//! 3. `target-overrides/<target>/<env>/shared.yml`, `.../<app>.yml`
//!
//! Maps merge recursively; everything else is replaced by the higher tier.

pub mod cli;
pub mod core;
pub mod error;
