//! Core library components.
//!
//! Document model, encryption, layered resolution and rendering. Nothing in
//! here prints; the CLI layer owns all output.

pub mod cipher;
pub mod config;
pub mod constants;
pub mod document;
pub mod format;
pub mod identity;
pub mod layout;
pub mod ledger;
pub mod recipients;
pub mod resolve;
pub mod secrets;
pub mod store;
pub mod template;
pub mod types;
pub mod value;
pub mod workcopy;
