//! Configuration
//!
//! Connection parameters come from, in order of precedence:
//! - command-line flags (`--userpass`, `--username`, `--tls_skip_verify`)
//! - environment (`VAULT_ADDR`, `VAULT_TOKEN`, `VAULT_NAMESPACE`,
//!   `VAULT_CACERT`, `VAULT_SKIP_VERIFY`)
//! - ~/.config/vault-yaml/config.yaml
//!
//! The token is only ever read from the environment.

use crate::dump::DumpOptions;
use crate::error::{Result as VaultResult, VaultYamlError};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_ADDR: &str = "VAULT_ADDR";
pub const ENV_TOKEN: &str = "VAULT_TOKEN";
pub const ENV_NAMESPACE: &str = "VAULT_NAMESPACE";
pub const ENV_CACERT: &str = "VAULT_CACERT";
pub const ENV_SKIP_VERIFY: &str = "VAULT_SKIP_VERIFY";

/// Skip certificate verification unless told otherwise. Self-signed
/// deployments are the common case for this tool.
pub const DEFAULT_TLS_SKIP_VERIFY: bool = true;

/// Authentication method selected in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    #[default]
    Token,
    Userpass,
}

/// Contents of config.yaml. Every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Fallback when VAULT_ADDR is unset
    pub address: Option<String>,
    pub auth: AuthMethod,
    /// Mount path of the userpass auth method
    pub userpass_mount: String,
    pub tls_skip_verify: Option<bool>,
    /// PEM bundle trusted in addition to the system roots
    pub ca_cert: Option<PathBuf>,
    pub namespace: Option<String>,
    pub timeout_secs: u64,
    /// KV secrets engine version, 1 or 2
    pub kv_version: u8,
    pub output: OutputSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            address: None,
            auth: AuthMethod::Token,
            userpass_mount: "userpass".to_string(),
            tls_skip_verify: None,
            ca_cert: None,
            namespace: None,
            timeout_secs: 30,
            kv_version: 1,
            output: OutputSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Write multi-line strings as literal blocks
    pub literal_multiline: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            literal_multiline: true,
        }
    }
}

impl Settings {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("vault-yaml")
            .join("config.yaml")
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from a specific path; a missing file means defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            let settings: Self = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config from {:?}", path))?;
            Ok(settings)
        } else {
            Ok(Self::default())
        }
    }

    pub fn dump_options(&self) -> DumpOptions {
        DumpOptions::literal_multiline(self.output.literal_multiline)
    }
}

/// Command-line overrides shared by both commands
#[derive(Debug, Clone, Default)]
pub struct ConnectOverrides {
    pub userpass: bool,
    pub username: Option<String>,
    pub tls_skip_verify: Option<bool>,
}

/// How the client authenticates
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
    Token(String),
    UserPass {
        mount: String,
        username: Option<String>,
    },
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Token(_) => f.write_str("Token(<redacted>)"),
            AuthMode::UserPass { mount, username } => f
                .debug_struct("UserPass")
                .field("mount", mount)
                .field("username", username)
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvVersion {
    V1,
    V2,
}

impl KvVersion {
    fn from_number(version: u8) -> VaultResult<Self> {
        match version {
            1 => Ok(KvVersion::V1),
            2 => Ok(KvVersion::V2),
            other => Err(VaultYamlError::Config(format!(
                "kv_version must be 1 or 2, got {}",
                other
            ))),
        }
    }
}

/// Everything needed to open one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub address: String,
    pub auth: AuthMode,
    pub tls_skip_verify: bool,
    pub namespace: Option<String>,
    pub ca_cert: Option<PathBuf>,
    pub timeout: Duration,
    pub kv_version: KvVersion,
}

impl ConnectionConfig {
    /// Resolve from the process environment
    pub fn from_env(settings: &Settings, overrides: &ConnectOverrides) -> VaultResult<Self> {
        Self::resolve(settings, overrides, |name| std::env::var(name).ok())
    }

    /// Resolve using `env` for variable lookups
    pub fn resolve<F>(
        settings: &Settings,
        overrides: &ConnectOverrides,
        env: F,
    ) -> VaultResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).filter(|value| !value.is_empty());

        let address = lookup(ENV_ADDR)
            .or_else(|| settings.address.clone())
            .ok_or_else(|| {
                VaultYamlError::Connection(format!(
                    "{} is not set (export the Vault server URL)",
                    ENV_ADDR
                ))
            })?;

        let auth = if overrides.userpass || settings.auth == AuthMethod::Userpass {
            AuthMode::UserPass {
                mount: settings.userpass_mount.trim_matches('/').to_string(),
                username: overrides.username.clone(),
            }
        } else {
            let token = lookup(ENV_TOKEN).ok_or_else(|| {
                VaultYamlError::Connection(format!(
                    "{} is not set (export a token or use --userpass)",
                    ENV_TOKEN
                ))
            })?;
            AuthMode::Token(token)
        };

        let tls_skip_verify = match overrides.tls_skip_verify {
            Some(skip) => skip,
            None => match lookup(ENV_SKIP_VERIFY) {
                Some(value) => parse_bool(ENV_SKIP_VERIFY, &value)?,
                None => settings.tls_skip_verify.unwrap_or(DEFAULT_TLS_SKIP_VERIFY),
            },
        };

        Ok(Self {
            address,
            auth,
            tls_skip_verify,
            namespace: lookup(ENV_NAMESPACE).or_else(|| settings.namespace.clone()),
            ca_cert: lookup(ENV_CACERT)
                .map(PathBuf::from)
                .or_else(|| settings.ca_cert.clone()),
            timeout: Duration::from_secs(settings.timeout_secs.max(1)),
            kv_version: KvVersion::from_number(settings.kv_version)?,
        })
    }
}

fn parse_bool(name: &str, value: &str) -> VaultResult<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(VaultYamlError::Config(format!(
            "{} must be true or false, got {:?}",
            name, value
        ))),
    }
}
