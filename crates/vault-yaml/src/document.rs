//! Secret documents - YAML files mapping store paths to field mappings
//!
//! ```yaml
//! secret/app/db:
//!   user: admin
//!   password: hunter2
//! secret/app/tls:
//!   cert: |
//!     -----BEGIN CERTIFICATE-----
//!     ...
//! ```

use crate::error::{Position, Result, VaultYamlError};
use crate::sanitize::key_to_string;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Ordered mapping of secret path to the value found under it.
///
/// Values are kept as parsed; whether each one is a usable field mapping is
/// decided when it is submitted.
#[derive(Debug, Clone, Default)]
pub struct SecretDocument {
    entries: Vec<(String, Value)>,
}

impl SecretDocument {
    /// Parse YAML text. `origin` only names the source in errors.
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let root: Value = serde_yaml::from_str(content).map_err(|e| VaultYamlError::Parse {
            file: origin.to_path_buf(),
            position: e.location().map(|loc| Position {
                line: loc.line(),
                column: loc.column(),
            }),
            message: e.to_string(),
        })?;

        let mapping = match root {
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(VaultYamlError::Parse {
                    file: origin.to_path_buf(),
                    message: format!(
                        "expected a mapping of secret paths, found {}",
                        kind(&other)
                    ),
                    position: None,
                })
            }
        };

        let mut entries = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let path = match key {
                Value::Sequence(_) | Value::Mapping(_) => {
                    return Err(VaultYamlError::Parse {
                        file: origin.to_path_buf(),
                        message: format!("secret path must be a scalar, found {}", kind(&key)),
                        position: None,
                    })
                }
                other => key_to_string(&other),
            };
            entries.push((path, value));
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(path, _)| path.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(path, value)| (path.as_str(), value))
    }
}

/// Load a secret document from a file
pub fn load(path: &Path) -> Result<SecretDocument> {
    let content = fs::read_to_string(path).map_err(|source| VaultYamlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    SecretDocument::parse(&content, path)
}

/// Field mapping stored under a path.
///
/// A missing value (`path:` with nothing after it) is an empty mapping.
pub fn fields_of(path: &str, value: &Value) -> Result<Mapping> {
    match value {
        Value::Mapping(fields) => Ok(fields.clone()),
        Value::Null => Ok(Mapping::new()),
        other => Err(VaultYamlError::Write {
            path: path.to_string(),
            message: format!("expected a mapping of fields, found {}", kind(other)),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(content: &str) -> Result<SecretDocument> {
        SecretDocument::parse(content, Path::new("test.yaml"))
    }

    #[test]
    fn test_paths_keep_file_order() {
        let doc = parse("secret/b:\n  k: v\nsecret/a:\n  k: v\nsecret/c:\n  k: v\n").unwrap();
        let paths: Vec<&str> = doc.paths().collect();
        assert_eq!(paths, vec!["secret/b", "secret/a", "secret/c"]);
    }

    #[test]
    fn test_load_from_file() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "secret/app:")?;
        writeln!(file, "  user: admin")?;
        writeln!(file, "  port: 5432")?;

        let doc = load(file.path())?;
        assert_eq!(doc.len(), 1);

        let (path, value) = doc.entries().next().unwrap();
        assert_eq!(path, "secret/app");
        let fields = fields_of(path, value)?;
        assert_eq!(fields.get("user"), Some(&Value::String("admin".to_string())));
        assert_eq!(fields.get("port"), Some(&Value::Number(5432u64.into())));

        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let err = load(Path::new("/nonexistent/secrets.yaml")).unwrap_err();
        assert!(matches!(err, VaultYamlError::Io { .. }));
    }

    #[test]
    fn test_syntax_error_reports_position() {
        let err = parse("secret/app: {user: admin\nsecret/other: 1\n").unwrap_err();
        let message = err.to_string();
        match err {
            VaultYamlError::Parse {
                position: Some(position),
                ..
            } => {
                assert!(position.line >= 1);
                assert!(position.column >= 1);
                assert!(message.contains(&format!(
                    "test.yaml:{}:{}",
                    position.line, position.column
                )));
            }
            other => panic!("Expected parse error with position, got {:?}", other),
        }
    }

    #[test]
    fn test_position_is_one_indexed() {
        // Tab indentation is rejected on the second line
        let err = parse("secret/app:\n\tuser: admin\n").unwrap_err();
        match err {
            VaultYamlError::Parse {
                position: Some(position),
                ..
            } => assert_eq!(position.line, 2),
            other => panic!("Expected parse error with position, got {:?}", other),
        }
    }

    #[test]
    fn test_top_level_must_be_mapping() {
        assert!(matches!(
            parse("- secret/app\n- secret/db\n"),
            Err(VaultYamlError::Parse { position: None, .. })
        ));
        assert!(matches!(parse(""), Err(VaultYamlError::Parse { .. })));
    }

    #[test]
    fn test_scalar_path_keys_coerced() {
        let doc = parse("42:\n  k: v\n").unwrap();
        assert_eq!(doc.paths().collect::<Vec<_>>(), vec!["42"]);
    }

    #[test]
    fn test_fields_of() {
        let doc = parse("secret/empty:\nsecret/bad: just a string\nsecret/ok:\n  a: 1\n").unwrap();
        let entries: Vec<_> = doc.entries().collect();

        assert!(fields_of(entries[0].0, entries[0].1).unwrap().is_empty());
        assert!(matches!(
            fields_of(entries[1].0, entries[1].1),
            Err(VaultYamlError::Write { ref path, .. }) if path == "secret/bad"
        ));
        assert_eq!(fields_of(entries[2].0, entries[2].1).unwrap().len(), 1);
    }
}
