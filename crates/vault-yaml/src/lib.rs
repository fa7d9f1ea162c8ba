//! vault-yaml - Vault secrets in and out as YAML
//!
//! "Secrets belong in Vault; editing them belongs in a text file."
//!
//! `write` takes a YAML document mapping secret paths to field mappings
//! and writes each path in order, stopping at the first failure. `read`
//! fetches one path and prints it back in the same shape, multi-line values
//! as literal blocks so certificates and notes stay readable.

pub mod cli;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod document;
pub mod dump;
pub mod error;
pub mod sanitize;
pub mod store;

pub use commands::{read_secret, write_document};
pub use config::{ConnectionConfig, Settings};
pub use credentials::{CredentialProvider, StaticCredentials, TerminalPrompt};
pub use document::SecretDocument;
pub use dump::{dump, DumpOptions, MultilineStyle};
pub use error::VaultYamlError;
pub use sanitize::sanitize;
pub use store::{SecretStore, VaultClient};
