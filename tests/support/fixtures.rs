//! Test fixtures and constants.

/// A valid age public key nobody in the tests holds the identity for.
pub const BOB_PUBLIC_KEY: &str = "age1ql3z7hjy54pw3hyww5ayyfg7zqgvc7w3j2elw8zmrj2kg5sfn9aqmcac8p";

/// An invalid public key for negative tests.
pub const INVALID_PUBLIC_KEY: &str = "not-a-valid-age-key";

/// Scope args for the `api` app in `dev`.
pub const DEV_API: &[&str] = &["-a", "api", "-e", "dev"];

/// Scope args for the `api` app in `dev` on the `eks` target.
pub const DEV_API_EKS: &[&str] = &["-a", "api", "-e", "dev", "-t", "eks"];
