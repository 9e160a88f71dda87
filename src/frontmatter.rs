//! YAML frontmatter parsing and serialization.
//!
//! A content document is an optional metadata block followed by a markdown body:
//!
//! ```text
//! ---
//! title: Field Notes
//! date: 2024-03-01
//! labels: [travel, film]
//! ---
//! # Field Notes
//!
//! Body text.
//! ```
//!
//! The block must open on the very first line. A closing `---` (or `...`) line
//! ends it. Text without an opening delimiter, or with an opening delimiter but
//! no closing one, has no frontmatter and is returned whole as the body.
//!
//! Metadata is kept as a [`serde_yaml::Mapping`], which preserves key order, so
//! `serialize(parse(text))` yields the same value set and the same key order.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("malformed frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("frontmatter must be a key-value mapping, found {0}")]
    NotAMapping(&'static str),
    #[error("{path}: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: Box<FrontmatterError>,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed content file: ordered metadata plus the raw markdown body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentDocument {
    pub frontmatter: Mapping,
    pub body: String,
}

const OPEN: &str = "---";
const CLOSERS: &[&str] = &["---", "..."];

/// Split `text` into metadata and body.
pub fn parse(text: &str) -> Result<ContentDocument, FrontmatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let Some((yaml, body)) = split_block(text) else {
        return Ok(ContentDocument {
            frontmatter: Mapping::new(),
            body: text.to_string(),
        });
    };

    if yaml.trim().is_empty() {
        return Ok(ContentDocument {
            frontmatter: Mapping::new(),
            body: body.to_string(),
        });
    }

    let frontmatter = match serde_yaml::from_str::<Value>(yaml)? {
        Value::Null => Mapping::new(),
        Value::Mapping(map) => map,
        other => return Err(FrontmatterError::NotAMapping(kind_name(&other))),
    };

    Ok(ContentDocument {
        frontmatter,
        body: body.to_string(),
    })
}

/// Read and parse a content file. Errors carry the document path.
pub fn parse_file(path: &Path) -> Result<ContentDocument, FrontmatterError> {
    let wrap = |source: FrontmatterError| FrontmatterError::Document {
        path: path.to_path_buf(),
        source: Box::new(source),
    };
    let text = fs::read_to_string(path).map_err(|e| wrap(e.into()))?;
    parse(&text).map_err(wrap)
}

/// Render metadata and body back into document text.
///
/// An empty map emits the body alone, without an empty delimiter pair.
pub fn serialize(frontmatter: &Mapping, body: &str) -> Result<String, FrontmatterError> {
    if frontmatter.is_empty() {
        return Ok(body.to_string());
    }
    let yaml = serde_yaml::to_string(frontmatter)?;
    Ok(format!("{OPEN}\n{yaml}{OPEN}\n{body}"))
}

/// Locate the delimited block, returning `(yaml, body)` slices.
fn split_block(text: &str) -> Option<(&str, &str)> {
    let first_end = text.find('\n')?;
    if text[..first_end].trim_end() != OPEN {
        return None;
    }

    let yaml_start = first_end + 1;
    let mut pos = yaml_start;
    while pos <= text.len() {
        let line_end = text[pos..].find('\n').map_or(text.len(), |i| pos + i);
        let line = text[pos..line_end].trim_end();
        if CLOSERS.contains(&line) {
            let body_start = (line_end + 1).min(text.len());
            return Some((&text[yaml_start..pos], &text[body_start..]));
        }
        if line_end == text.len() {
            break;
        }
        pos = line_end + 1;
    }
    None
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

// ============================================================================
// Typed accessors
// ============================================================================

/// Render a scalar as display text. Lists and maps yield `None`.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}

/// A string field; numbers and booleans are stringified. Blank values are `None`.
pub fn str_field(map: &Mapping, key: &str) -> Option<String> {
    map.get(key)
        .and_then(scalar_to_string)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// A list of strings. Accepts a YAML list or a comma-separated string.
pub fn string_list(map: &Mapping, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(scalar_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(value) => scalar_to_string(value)
            .map(|s| {
                s.split(',')
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
        None => Vec::new(),
    }
}

pub fn bool_field(map: &Mapping, key: &str) -> Option<bool> {
    match map.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn u32_field(map: &Mapping, key: &str) -> Option<u32> {
    match map.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A calendar date. Accepts `2024-03-01`, RFC 3339 timestamps, and
/// `2024-03-01 10:30:00`.
pub fn date_field(map: &Mapping, key: &str) -> Option<NaiveDate> {
    str_field(map, key).and_then(|s| parse_date(&s))
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}
