//! File and console helpers shared by the commands.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum UtilError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON at {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl UtilError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        UtilError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        UtilError::Json {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Parses a JSON file into `T`.
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, UtilError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| UtilError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| UtilError::json(path, e))
}

/// Parses a JSON file, returning `fallback` on any read or parse failure.
pub fn read_json_or<T: DeserializeOwned>(path: impl AsRef<Path>, fallback: T) -> T {
    read_json(path).unwrap_or(fallback)
}

/// Writes pretty JSON, creating missing parent directories first.
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), UtilError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| UtilError::io(path, e))?;
        }
    }
    let content = serde_json::to_string_pretty(value).map_err(|e| UtilError::json(path, e))?;
    fs::write(path, content).map_err(|e| UtilError::io(path, e))
}

/// Renders rows as an aligned text table: two-space gutters and a
/// dashed rule under the first (header) row.
pub fn render_table(rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for (r, row) in rows.iter().enumerate() {
        let mut line = String::new();
        for i in 0..columns {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            if i + 1 == columns {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{:<width$}", cell, width = widths[i]));
                line.push_str("  ");
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
        if r == 0 {
            let rule = widths.iter().sum::<usize>() + 2 * columns.saturating_sub(1);
            out.push_str(&"-".repeat(rule));
            out.push('\n');
        }
    }
    out
}

/// Prints rows to stdout as a table.
pub fn table_to_console(rows: &[Vec<String>]) {
    print!("{}", render_table(rows));
}

/// Substitutes `{{key}}` placeholders in `text` with values from a
/// `;`-separated `key:value` argument string. Pairs without exactly one
/// `:` (or with an empty key) are reported and skipped. `None` returns
/// the text untouched.
pub fn render_job_template(text: &str, args: Option<&str>) -> String {
    let Some(args) = args else {
        return text.to_string();
    };
    let mut rendered = text.to_string();
    for pair in args.split(';') {
        match pair.split_once(':') {
            Some((key, value)) if !key.is_empty() && !value.contains(':') => {
                let placeholder = format!("{{{{{}}}}}", key);
                rendered = rendered.replace(&placeholder, &escape(value));
            }
            _ => warn!(pair, "skipping malformed template argument"),
        }
    }
    rendered
}

/// Escape substituted content so a value can never break out of the
/// surrounding document.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
