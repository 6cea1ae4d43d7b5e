//! Parsers for repeatable `key=value` style arguments.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldArg {
    Text { name: String, value: String },
    File { name: String, path: PathBuf },
}

/// Parse `key=value`. The value may be empty and may itself contain `=`.
pub fn parse_pair(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{}`", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parse a form field: `name=value` for text, `name=@path` for a file.
pub fn parse_field(s: &str) -> Result<FieldArg, String> {
    let (name, value) = parse_pair(s)?;
    match value.strip_prefix('@') {
        Some("") => Err(format!("missing file path in `{}`", s)),
        Some(path) => Ok(FieldArg::File {
            name,
            path: PathBuf::from(path),
        }),
        None => Ok(FieldArg::Text { name, value }),
    }
}
