//! CLI command definitions and handlers

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::commands::{read_secret, write_document};
use crate::config::{ConnectOverrides, ConnectionConfig, Settings};
use crate::credentials::TerminalPrompt;
use crate::document;
use crate::store::VaultClient;

/// vault-yaml - Vault secrets in and out as YAML
#[derive(Parser)]
#[command(name = "vault-yaml")]
#[command(version)]
#[command(about = "Read and write Vault secrets as YAML documents")]
#[command(after_help = r#"INPUT FORMAT (write):
    secret/app/db:
      user: admin
      password: hunter2
    secret/app/tls:
      cert: |
        -----BEGIN CERTIFICATE-----
        ...

ENVIRONMENT:
    VAULT_ADDR          Vault server URL (required)
    VAULT_TOKEN         Token for token auth (required unless --userpass)
    VAULT_NAMESPACE     Namespace sent with every request
    VAULT_CACERT        Extra PEM bundle to trust
    VAULT_SKIP_VERIFY   Default for --tls_skip_verify
    RUST_LOG            Log filter, e.g. vault_yaml=debug

EXAMPLES:
    vault-yaml write secrets.yaml
    vault-yaml read secret/app/db > db.yaml
    vault-yaml read secret/app/db --userpass --tls_skip_verify=false"#)]
pub struct Cli {
    /// Config file (default: ~/.config/vault-yaml/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Writes contents of a YAML file to vault
    Write {
        /// YAML file mapping secret paths to fields
        filename: PathBuf,

        #[command(flatten)]
        connect: ConnectArgs,
    },

    /// Dumps key values from vault in YAML format
    Read {
        /// Path of the secret in vault
        path: String,

        #[command(flatten)]
        connect: ConnectArgs,
    },
}

/// Connection flags shared by both commands
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectArgs {
    /// Log in with username and password instead of VAULT_TOKEN
    #[arg(long)]
    pub userpass: bool,

    /// Username for --userpass (prompted when omitted)
    #[arg(long, requires = "userpass")]
    pub username: Option<String>,

    /// Skip TLS certificate verification (default: true; `=false` to verify)
    #[arg(
        long = "tls_skip_verify",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub tls_skip_verify: Option<bool>,
}

impl From<ConnectArgs> for ConnectOverrides {
    fn from(args: ConnectArgs) -> Self {
        Self {
            userpass: args.userpass,
            username: args.username,
            tls_skip_verify: args.tls_skip_verify,
        }
    }
}

/// Run a parsed command line
pub fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    match cli.command {
        Commands::Write { filename, connect } => cmd_write(&settings, &filename, connect),
        Commands::Read { path, connect } => cmd_read(&settings, &path, connect),
    }
}

fn connect(settings: &Settings, args: ConnectArgs) -> Result<VaultClient> {
    let config = ConnectionConfig::from_env(settings, &args.into())?;
    let client = VaultClient::connect(&config, &TerminalPrompt)?;
    Ok(client)
}

/// Write every path in a YAML file
fn cmd_write(settings: &Settings, filename: &Path, args: ConnectArgs) -> Result<()> {
    let client = connect(settings, args)?;
    let doc = document::load(filename)?;

    let written = write_document(&client, &doc)
        .with_context(|| format!("Aborted writing {}", filename.display()))?;

    info!(file = %filename.display(), written, "write complete");
    println!("success: wrote {} secret path(s)", written);

    Ok(())
}

/// Dump one path as YAML
fn cmd_read(settings: &Settings, path: &str, args: ConnectArgs) -> Result<()> {
    let client = connect(settings, args)?;
    let output = read_secret(&client, path, &settings.dump_options())?;

    print!("{}", output);

    Ok(())
}
