//! Username/password sources for userpass login

use crate::error::{Result, VaultYamlError};
use std::io::{self, BufRead, Write};

/// Supplies userpass credentials to the connector
pub trait CredentialProvider {
    fn username(&self) -> Result<String>;
    fn password(&self, username: &str) -> Result<String>;
}

/// Prompts on the terminal: username echoed, password hidden.
///
/// Prompts go to stderr so `read` output on stdout stays clean.
pub struct TerminalPrompt;

impl CredentialProvider for TerminalPrompt {
    fn username(&self) -> Result<String> {
        let mut stderr = io::stderr();
        write!(stderr, "Username: ")
            .and_then(|_| stderr.flush())
            .map_err(|e| {
                VaultYamlError::Connection(format!("Failed to prompt for username: {}", e))
            })?;

        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| VaultYamlError::Connection(format!("Failed to read username: {}", e)))?;

        let username = line.trim().to_string();
        if username.is_empty() {
            return Err(VaultYamlError::Connection(
                "Empty username not allowed".to_string(),
            ));
        }
        Ok(username)
    }

    fn password(&self, _username: &str) -> Result<String> {
        rpassword::prompt_password("Password: ")
            .map_err(|e| VaultYamlError::Connection(format!("Failed to read password: {}", e)))
    }
}

/// Fixed credentials, for non-interactive callers
#[derive(Clone)]
pub struct StaticCredentials {
    username: String,
    password: String,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn username(&self) -> Result<String> {
        Ok(self.username.clone())
    }

    fn password(&self, _username: &str) -> Result<String> {
        Ok(self.password.clone())
    }
}
