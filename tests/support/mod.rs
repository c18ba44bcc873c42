//! Test support utilities for puff integration tests.
//!
//! Provides reusable test environment setup and helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use age::secrecy::ExposeSecret;
use age::x25519::Identity;
use tempfile::TempDir;

/// Test environment with an isolated tree, home dir and age identity.
///
/// Child processes use `.current_dir()` and explicit env vars, so tests can
/// run in parallel.
pub struct Test {
    /// Root of the configuration tree
    pub dir: TempDir,
    /// Temporary home directory
    pub home: TempDir,
    /// Private key handed to puff through `PUFF_AGE_KEY`
    pub secret: String,
    /// Matching public key
    pub public: String,
}

/// A fresh age key pair as (secret, public).
pub fn keypair() -> (String, String) {
    let identity = Identity::generate();
    let public = identity.to_public().to_string();
    (identity.to_string().expose_secret().to_string(), public)
}

impl Test {
    /// Create an empty tree with a new identity.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");
        let (secret, public) = keypair();

        Self {
            dir,
            home,
            secret,
            public,
        }
    }

    /// Create a tree initialized for this test's identity.
    pub fn init() -> Self {
        let t = Self::new();
        let output = t.init_cmd(&[t.public.as_str()]);
        assert!(
            output.status.success(),
            "Failed to initialize: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        t
    }

    /// Initialized tree with values set at the given scopes.
    ///
    /// Each entry is (scope args, key, value).
    pub fn with_values(values: &[(&[&str], &str, &str)]) -> Self {
        let t = Self::init();
        for (scope, k, v) in values {
            let output = t.set_in(scope, k, v);
            assert!(
                output.status.success(),
                "Failed to set {}: {}",
                k,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        t
    }

    /// Path inside the tree.
    pub fn path(&self, relative: &str) -> std::path::PathBuf {
        self.dir.path().join(relative)
    }

    /// Read a file inside the tree.
    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative)).expect("failed to read file")
    }
}
