//! Vault Dump - export every secret of a Vault KV v2 engine to local JSON files.
//!
//! The secret tree under a mount is walked depth-first and mirrored under a
//! timestamped dump directory, one pretty-printed `.json` file per secret.

pub mod config;
pub mod dump;
pub mod error;
pub mod export;
pub mod vault;

pub use config::Credentials;
pub use error::DumpError;
pub use export::{ExportSummary, Exporter, SecretStore};
pub use vault::VaultClient;
