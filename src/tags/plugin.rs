//! Component manifests: tags declared in TOML files.
//!
//! Every `*.toml` file directly inside the components directory is a
//! manifest. Files ending in `.test.toml`, `.spec.toml` or `_test.toml` are
//! fixtures and are skipped. A manifest lists zero or more tags:
//!
//! ```toml
//! [[tag]]
//! name = "badge"                          # exact name, or…
//! html = '<span class="badge">{title}</span>'
//! label = "Badge"                         # optional
//! icon = "star"                           # optional
//! description = "Page title as a badge"   # optional
//!
//! [[tag]]
//! prefix = "icon."                        # …every name starting with `icon.`
//! html = '<i class="icon-{param}"></i>'
//!
//! [[tag]]
//! name = "subtitle"
//! frontmatter_key = "subtitle"            # renders nothing when the key is unset
//! html = '<p class="subtitle">{value}</p>'
//! ```
//!
//! `html` may use these single-brace variables, all HTML-escaped:
//!
//! | Variable | Value |
//! |----------|-------|
//! | `{name}` | the tag name as written in the skeleton |
//! | `{param}` | for prefix tags, the part after the prefix |
//! | `{value}` | the declared frontmatter key's value |
//! | `{title}` | page title |
//! | `{base}` | site base path |
//!
//! A manifest that fails to parse or declares an invalid tag is rejected as
//! a whole and logged; the remaining manifests still load.

use super::builtin::frontmatter_text;
use super::{TagDefinition, TagError};
use crate::compile::escape_html;
use crate::template::TemplateContext;
use crate::template::engine::SCALAR_TAGS;
use crate::template::structural::STRUCTURAL_TAGS;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const FIXTURE_SUFFIXES: &[&str] = &[".test.toml", ".spec.toml", "_test.toml"];

/// What a discovery pass found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryReport {
    /// Manifests that loaded, in load order.
    pub loaded: Vec<PathBuf>,
    /// Fixture files that were skipped.
    pub skipped: Vec<PathBuf>,
    /// Manifests that were rejected, with the reason.
    pub rejected: Vec<(PathBuf, String)>,
    /// Number of tags registered.
    pub tags: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default)]
    tag: Vec<TagSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TagSpec {
    name: Option<String>,
    prefix: Option<String>,
    html: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    description: String,
    frontmatter_key: Option<String>,
}

/// Load every manifest in `dir`. A missing directory yields nothing.
pub fn discover(dir: &Path) -> Result<(Vec<TagDefinition>, DiscoveryReport), TagError> {
    let mut report = DiscoveryReport::default();
    let mut definitions = Vec::new();
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "no component directory");
        return Ok((definitions, report));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|source| TagError::Io {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == "toml"))
        .collect();
    paths.sort();

    for path in paths {
        if is_fixture(&path) {
            report.skipped.push(path);
            continue;
        }
        match load_manifest(&path) {
            Ok(loaded) => {
                tracing::debug!(manifest = %path.display(), tags = loaded.len(), "loaded components");
                report.tags += loaded.len();
                definitions.extend(loaded);
                report.loaded.push(path);
            }
            Err(reason) => {
                tracing::warn!(manifest = %path.display(), %reason, "rejected component manifest");
                report.rejected.push((path, reason));
            }
        }
    }

    Ok((definitions, report))
}

fn is_fixture(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .is_some_and(|name| FIXTURE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)))
}

fn load_manifest(path: &Path) -> Result<Vec<TagDefinition>, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let manifest: Manifest = toml::from_str(&text).map_err(|e| e.message().to_string())?;
    manifest
        .tag
        .into_iter()
        .enumerate()
        .map(|(i, spec)| spec.into_definition().map_err(|e| format!("tag #{}: {e}", i + 1)))
        .collect()
}

impl TagSpec {
    fn into_definition(self) -> Result<TagDefinition, String> {
        if self.html.trim().is_empty() {
            return Err("`html` must not be empty".to_string());
        }
        if let Some(key) = &self.frontmatter_key
            && key.trim().is_empty()
        {
            return Err("`frontmatter_key` must not be empty".to_string());
        }

        let html = self.html;
        let frontmatter_key = self.frontmatter_key;
        let definition = match (self.name, self.prefix) {
            (Some(name), None) => {
                validate_name(&name)?;
                if SCALAR_TAGS.contains(&name.as_str()) || STRUCTURAL_TAGS.contains(&name.as_str()) {
                    tracing::warn!(tag = %name, "component tag is shadowed by a built-in field");
                }
                let key = frontmatter_key.clone();
                TagDefinition::exact(name, move |ctx, matched| {
                    render_html(&html, ctx, matched, "", key.as_deref())
                })
            }
            (None, Some(prefix)) => {
                validate_name(&prefix)?;
                let key = frontmatter_key.clone();
                let accepts_prefix = prefix.clone();
                TagDefinition::predicate(
                    move |name| name.len() > accepts_prefix.len() && name.starts_with(&accepts_prefix),
                    move |ctx, matched| {
                        let param = matched.get(prefix.len()..).unwrap_or_default();
                        render_html(&html, ctx, matched, param, key.as_deref())
                    },
                )
            }
            (Some(_), Some(_)) => return Err("set either `name` or `prefix`, not both".to_string()),
            (None, None) => return Err("one of `name` or `prefix` is required".to_string()),
        };

        let definition = definition
            .with_label(self.label)
            .with_icon(self.icon)
            .with_description(self.description);
        Ok(match frontmatter_key {
            Some(key) => definition.with_frontmatter_key(key),
            None => definition,
        })
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
    if valid {
        Ok(())
    } else {
        Err(format!("`{name}` is not a valid tag name"))
    }
}

fn render_html(
    html: &str,
    ctx: &TemplateContext,
    name: &str,
    param: &str,
    frontmatter_key: Option<&str>,
) -> String {
    let value = match frontmatter_key {
        Some(key) => {
            let value = frontmatter_text(ctx, key);
            if value.is_empty() {
                return String::new();
            }
            value
        }
        None => String::new(),
    };
    interpolate(html, |var| match var {
        "name" => Some(name.to_string()),
        "param" => Some(param.to_string()),
        "value" => Some(value.clone()),
        "title" => Some(ctx.title.clone()),
        "base" => Some(ctx.base_path().to_string()),
        _ => None,
    })
}

/// Replace `{var}` occurrences that `lookup` knows, escaping the values.
/// Double braces are copied untouched.
fn interpolate(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        if let Some(stripped) = after.strip_prefix('{') {
            out.push_str("{{");
            rest = stripped;
            continue;
        }
        match after
            .find('}')
            .and_then(|end| lookup(&after[..end]).map(|value| (end, value)))
        {
            Some((end, value)) => {
                out.push_str(&escape_html(&value));
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
