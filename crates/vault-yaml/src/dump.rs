//! YAML output for read results
//!
//! A read result is printed as a single-entry document:
//!
//! ```yaml
//! secret/app/tls:
//!   name: frontend
//!   cert: |
//!     -----BEGIN CERTIFICATE-----
//!     MIIB...
//!     -----END CERTIFICATE-----
//! ```
//!
//! serde_yaml picks scalar styles itself and offers no way to configure
//! them, so the document frame, keys and multi-line strings are emitted here
//! while every other value is rendered by serde_yaml and re-indented.

use crate::error::Result;
use crate::sanitize::key_to_string;
use serde_yaml::{Mapping, Value};

const FIELD_INDENT: &str = "  ";
const CONTENT_INDENT: &str = "    ";

/// How strings containing newlines are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultilineStyle {
    /// Literal block scalar (`|`), one source line per output line
    #[default]
    Literal,
    /// Whatever serde_yaml chooses
    Default,
}

/// Serialization options for [`dump`]
#[derive(Debug, Clone, Default)]
pub struct DumpOptions {
    pub multiline: MultilineStyle,
}

impl DumpOptions {
    pub fn literal_multiline(enabled: bool) -> Self {
        Self {
            multiline: if enabled {
                MultilineStyle::Literal
            } else {
                MultilineStyle::Default
            },
        }
    }
}

/// Render `fields` under `path` as a YAML document
pub fn dump(path: &str, fields: &Mapping, options: &DumpOptions) -> Result<String> {
    let mut out = render_key(&Value::String(path.to_string()))?;
    out.push(':');

    if fields.is_empty() {
        out.push_str(" {}\n");
        return Ok(out);
    }
    out.push('\n');

    for (key, value) in fields {
        out.push_str(FIELD_INDENT);
        out.push_str(&render_key(key)?);
        out.push(':');

        match value {
            Value::String(s)
                if options.multiline == MultilineStyle::Literal && literal_allowed(s) =>
            {
                out.push(' ');
                write_literal_block(&mut out, s);
            }
            _ => write_default(&mut out, value)?,
        }
    }

    Ok(out)
}

fn render_default(value: &Value) -> Result<String> {
    Ok(serde_yaml::to_string(value)?)
}

/// A key as a single-line scalar, safe to follow with `:`
fn render_key(key: &Value) -> Result<String> {
    if let Value::String(s) = key {
        if s.chars().any(needs_escape) {
            return Ok(double_quoted(s));
        }
    }

    let rendered = render_default(key)?;
    let rendered = rendered.trim_end();
    if rendered.contains('\n') {
        return Ok(double_quoted(&key_to_string(key)));
    }
    Ok(rendered.to_string())
}

/// Characters a YAML reader may treat as a line break or reject unescaped
fn needs_escape(c: char) -> bool {
    c.is_control() || matches!(c, '\u{feff}' | '\u{2028}' | '\u{2029}')
}

/// Double-quoted scalar with every [`needs_escape`] character escaped
fn double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if needs_escape(c) => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Append `value` after `key:` in serde_yaml's own style
fn write_default(out: &mut String, value: &Value) -> Result<()> {
    let rendered = render_default(value)?;
    let rendered = rendered.strip_suffix('\n').unwrap_or(&rendered);
    let mut lines = rendered.split('\n');

    let nested = match value {
        Value::Mapping(m) => !m.is_empty(),
        Value::Sequence(s) => !s.is_empty(),
        _ => false,
    };

    if nested {
        out.push('\n');
    } else if let Some(first) = lines.next() {
        out.push(' ');
        out.push_str(first);
        out.push('\n');
    }

    for line in lines {
        push_content_line(out, line);
    }
    Ok(())
}

/// True when `s` spans lines and survives a literal block unchanged
fn literal_allowed(s: &str) -> bool {
    s.contains('\n') && s.chars().all(|c| c == '\n' || c == '\t' || !needs_escape(c))
}

fn write_literal_block(out: &mut String, s: &str) {
    // Chomping: strip when there is no final newline, keep when there are
    // several or when the text is nothing but newlines.
    let chomping = if !s.ends_with('\n') {
        "-"
    } else if s.ends_with("\n\n") || s.trim_end_matches('\n').is_empty() {
        "+"
    } else {
        ""
    };

    let body = s.strip_suffix('\n').unwrap_or(s);

    // Indentation is auto-detected from the first non-empty line, which
    // breaks when that line starts with whitespace.
    let indentation = match body.split('\n').find(|line| !line.is_empty()) {
        Some(line) if line.starts_with([' ', '\t']) => "2",
        _ => "",
    };

    out.push('|');
    out.push_str(indentation);
    out.push_str(chomping);
    out.push('\n');

    for line in body.split('\n') {
        push_content_line(out, line);
    }
}

fn push_content_line(out: &mut String, line: &str) {
    if !line.is_empty() {
        out.push_str(CONTENT_INDENT);
        out.push_str(line);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fields(pairs: &[(&str, Value)]) -> Mapping {
        pairs
            .iter()
            .map(|(k, v)| (Value::String(k.to_string()), v.clone()))
            .collect()
    }

    fn string(s: &str) -> Value {
        Value::String(s.to_string())
    }

    /// Parse dumped output and return the value of `field` under `path`
    fn reparse(output: &str, path: &str, field: &str) -> Value {
        let doc: Mapping = serde_yaml::from_str(output).unwrap();
        doc.get(path).unwrap().get(field).unwrap().clone()
    }

    #[test]
    fn test_read_result_layout() {
        let fields = fields(&[("a", string("x")), ("b", string("y\nz"))]);
        let out = dump("secret/app", &fields, &DumpOptions::default()).unwrap();

        assert_eq!(out, "secret/app:\n  a: x\n  b: |-\n    y\n    z\n");
        assert_eq!(reparse(&out, "secret/app", "b"), string("y\nz"));
    }

    #[test]
    fn test_store_order_preserved() {
        let fields = fields(&[("zeta", string("1")), ("alpha", string("2"))]);
        let out = dump("secret/app", &fields, &DumpOptions::default()).unwrap();
        assert!(out.find("zeta").unwrap() < out.find("alpha").unwrap());
    }

    #[test]
    fn test_scalar_types_use_default_style() {
        let fields = fields(&[
            ("port", Value::Number(5432u64.into())),
            ("enabled", Value::Bool(true)),
            ("empty", Value::Null),
            ("looks_bool", string("yes")),
            ("blank", string("")),
        ]);
        let out = dump("secret/app", &fields, &DumpOptions::default()).unwrap();

        let doc: Mapping = serde_yaml::from_str(&out).unwrap();
        assert_eq!(doc.get("secret/app"), Some(&Value::Mapping(fields)));
        assert!(out.contains("  port: 5432\n"));
        assert!(out.contains("  enabled: true\n"));
    }

    #[test]
    fn test_empty_fields() {
        let out = dump("secret/app", &Mapping::new(), &DumpOptions::default()).unwrap();
        assert_eq!(out, "secret/app: {}\n");
    }

    #[test]
    fn test_trailing_newline_clipped() {
        let cert = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";
        let out = dump("pki/cert", &fields(&[("cert", string(cert))]), &DumpOptions::default())
            .unwrap();
        assert!(out.contains("  cert: |\n    -----BEGIN CERTIFICATE-----\n"));
        assert_eq!(reparse(&out, "pki/cert", "cert"), string(cert));
    }

    #[test]
    fn test_leading_space_gets_indentation_indicator() {
        let text = "  indented\nflush\n";
        let out = dump("secret/app", &fields(&[("note", string(text))]), &DumpOptions::default())
            .unwrap();
        assert!(out.contains("  note: |2\n"));
        assert_eq!(reparse(&out, "secret/app", "note"), string(text));
    }

    #[test]
    fn test_leading_tab_gets_indentation_indicator() {
        let text = "\n\tcol1\tcol2\nrow\n";
        let out = dump("secret/app", &fields(&[("table", string(text))]), &DumpOptions::default())
            .unwrap();
        assert!(out.contains("  table: |2\n"));
        assert_eq!(reparse(&out, "secret/app", "table"), string(text));
    }

    #[test]
    fn test_extra_trailing_newlines_kept() {
        for text in ["a\n\n", "\n", "\n\n\n", "a\n\nb\n\n"] {
            let out =
                dump("secret/app", &fields(&[("k", string(text))]), &DumpOptions::default())
                    .unwrap();
            assert!(out.contains("  k: |"), "not literal: {:?}", out);
            assert_eq!(reparse(&out, "secret/app", "k"), string(text), "{:?}", out);
        }
    }

    #[test]
    fn test_carriage_return_falls_back() {
        let text = "line one\r\nline two";
        let out = dump("secret/app", &fields(&[("k", string(text))]), &DumpOptions::default())
            .unwrap();
        assert!(!out.contains("k: |"));
        assert_eq!(reparse(&out, "secret/app", "k"), string(text));
    }

    #[test]
    fn test_default_style_option() {
        let text = "y\nz";
        let options = DumpOptions::literal_multiline(false);
        let out = dump("secret/app", &fields(&[("b", string(text))]), &options).unwrap();
        assert_eq!(reparse(&out, "secret/app", "b"), string(text));
    }

    #[test]
    fn test_nested_values() {
        let nested: Mapping = serde_yaml::from_str("inner: 1\nlist:\n- a\n- b\n").unwrap();
        let fields = fields(&[
            ("nested", Value::Mapping(nested)),
            ("tags", serde_yaml::from_str("[x, y]").unwrap()),
            ("none", Value::Sequence(vec![])),
        ]);
        let out = dump("secret/app", &fields, &DumpOptions::default()).unwrap();

        let doc: Mapping = serde_yaml::from_str(&out).unwrap();
        assert_eq!(doc.get("secret/app"), Some(&Value::Mapping(fields)));
    }

    #[test]
    fn test_path_needing_quotes() {
        let out = dump("secret: odd", &fields(&[("k", string("v"))]), &DumpOptions::default())
            .unwrap();
        let doc: Mapping = serde_yaml::from_str(&out).unwrap();
        assert!(doc.get("secret: odd").is_some());
    }

    #[test]
    fn test_key_with_newline_stays_a_key() {
        let out =
            dump("p", &fields(&[("a\nb", string("v"))]), &DumpOptions::default()).unwrap();
        assert_eq!(out, "p:\n  \"a\\nb\": v\n");
        assert_eq!(reparse(&out, "p", "a\nb"), string("v"));
    }

    #[test]
    fn test_path_with_newline_stays_a_key() {
        let path = "secret/odd\r\npath\t\u{2028}\"q\"\\";
        let out = dump(path, &fields(&[("k", string("v"))]), &DumpOptions::default()).unwrap();
        assert!(out.starts_with('"'));
        assert_eq!(reparse(&out, path, "k"), string("v"));
    }

    #[test]
    fn test_non_string_multiline_key() {
        let key: Value = serde_yaml::from_str("[a, b]").unwrap();
        let mut fields = Mapping::new();
        fields.insert(key, string("v"));
        let out = dump("p", &fields, &DumpOptions::default()).unwrap();

        let doc: Mapping = serde_yaml::from_str(&out).unwrap();
        let inner = doc.get("p").unwrap().as_mapping().unwrap();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner.values().next(), Some(&string("v")));
    }

    proptest! {
        #[test]
        fn prop_multiline_round_trips_as_literal(
            text in "[a-z #:-]{0,8}(\n[a-z \t#:-]{0,8}){1,4}\n{0,3}"
        ) {
            let out = dump("secret/app", &fields(&[("k", string(&text))]), &DumpOptions::default())
                .unwrap();
            prop_assert!(out.contains("\n  k: |"));
            prop_assert_eq!(reparse(&out, "secret/app", "k"), string(&text));
        }

        #[test]
        fn prop_single_line_matches_default(text in "[a-zA-Z0-9 :#'\"-]{0,16}") {
            let out = dump("secret/app", &fields(&[("k", string(&text))]), &DumpOptions::default())
                .unwrap();
            let expected = serde_yaml::to_string(&string(&text)).unwrap();
            prop_assert_eq!(out, format!("secret/app:\n  k: {}", expected));
        }
    }
}
