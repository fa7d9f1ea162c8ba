//! Error types shared by the loader, connector and commands

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// 1-indexed location of a YAML parse failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

fn position_prefix(position: &Option<Position>) -> String {
    match position {
        Some(position) => format!(":{}", position),
        None => String::new(),
    }
}

#[derive(Error, Debug)]
pub enum VaultYamlError {
    #[error("Error connecting to vault: {0}")]
    Connection(String),

    #[error(
        "Error while loading YAML file {}{}: {message}",
        .file.display(),
        position_prefix(.position)
    )]
    Parse {
        file: PathBuf,
        message: String,
        position: Option<Position>,
    },

    #[error("Error writing to vault at {path}: {message}")]
    Write { path: String, message: String },

    #[error("Error reading from vault at {path}: {message}")]
    Read { path: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, VaultYamlError>;
