//! vault-yaml - Vault secrets in and out as YAML
//!
//! Commands:
//! - write <FILE>: Write every path in a YAML file to vault
//! - read <PATH>: Dump the fields at a path as YAML
//!
//! Any error prints a message to stderr and exits with status 1.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vault_yaml::cli::{self, Cli};

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the YAML output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cli::run(cli)
}
