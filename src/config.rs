//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML table and the user's file in the source root is
//! merged on top, so the file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! name = "My Site"
//! url = ""                  # https://example.com, used for absolute links
//! base_path = ""            # /docs when served from a subdirectory
//! description = ""
//! author = ""
//!
//! [templates]
//! dir = "templates"         # *.html skeletons overriding the stock set
//! theme = ""                # subdirectory of `dir` overlaid last
//! components = "components" # *.toml tag manifests
//!
//! [markdown]
//! html_passthrough = true   # false escapes raw HTML in prose
//!
//! [output]
//! index = true              # page-index.json
//! sitemap = true
//! robots = true
//! llms = true
//! label_pages = true        # /labels/<slug>/ listing pages
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site identity and URLs.
    pub site: SiteSection,
    /// Where skeletons and component manifests live.
    pub templates: TemplatesConfig,
    /// Markdown conversion settings.
    pub markdown: MarkdownConfig,
    /// Which site-level files to write.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.site.url;
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Validation(
                "site.url must start with http:// or https://".into(),
            ));
        }
        if url.ends_with('/') {
            return Err(ConfigError::Validation(
                "site.url must not end with /".into(),
            ));
        }
        let base = &self.site.base_path;
        if !base.is_empty() && (!base.starts_with('/') || base.ends_with('/')) {
            return Err(ConfigError::Validation(
                "site.base_path must start with / and not end with / (use \"\" for the root)"
                    .into(),
            ));
        }
        if self.templates.dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "templates.dir must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    pub name: String,
    /// Absolute site URL without trailing slash.
    pub url: String,
    /// Path prefix the site is served under, without trailing slash.
    pub base_path: String,
    pub description: String,
    /// Author for pages whose frontmatter names none.
    pub author: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            name: "My Site".to_string(),
            url: String::new(),
            base_path: String::new(),
            description: String::new(),
            author: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Skeleton directory, relative to the source root.
    pub dir: String,
    /// Theme subdirectory of `dir`, overlaid after it. Empty for none.
    pub theme: String,
    /// Component manifest directory, relative to the source root.
    pub components: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: "templates".to_string(),
            theme: String::new(),
            components: "components".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Pass raw HTML in prose through. When false it is escaped.
    pub html_passthrough: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            html_passthrough: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub index: bool,
    pub sitemap: bool,
    pub robots: bool,
    pub llms: bool,
    pub label_pages: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            index: true,
            sitemap: true,
            robots: true,
            llms: true,
            label_pages: true,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel compile workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.clamp(1, cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the source root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Quire Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site identity
# ---------------------------------------------------------------------------
[site]
name = "My Site"

# Absolute URL the site is published at, without trailing slash.
# Needed for canonical links, sitemap.xml and llms.txt.
url = ""

# Path prefix when the site is served from a subdirectory, e.g. "/docs".
base_path = ""

description = ""

# Author for pages without an `author:` frontmatter key.
author = ""

# ---------------------------------------------------------------------------
# Templates and components
# ---------------------------------------------------------------------------
[templates]
# Directory of *.html skeletons. Each file replaces the stock skeleton
# with the same name (default, blank, labels) or adds a new one.
dir = "templates"

# Subdirectory of `dir` overlaid on top of it.
theme = ""

# Directory of *.toml component manifests declaring extra {{tags}}.
components = "components"

# ---------------------------------------------------------------------------
# Markdown
# ---------------------------------------------------------------------------
[markdown]
# Pass raw HTML written in prose through unchanged.
# Set to false to escape it; :::html blocks are always kept.
html_passthrough = true

# ---------------------------------------------------------------------------
# Generated files
# ---------------------------------------------------------------------------
[output]
index = true         # page-index.json
sitemap = true       # sitemap.xml
robots = true        # robots.txt
llms = true          # llms.txt
label_pages = true   # /labels/<slug>/ listing pages

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel compile workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_expected_values() {
        let config = SiteConfig::default();
        assert_eq!(config.site.name, "My Site");
        assert_eq!(config.templates.dir, "templates");
        assert_eq!(config.templates.components, "components");
        assert!(config.markdown.html_passthrough);
        assert!(config.output.sitemap);
        assert!(config.output.label_pages);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[site]
name = "Notes"
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.site.name, "Notes");
        // Defaults preserved
        assert_eq!(config.site.base_path, "");
        assert!(config.output.llms);
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.site.name, "My Site");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"
[site]
url = "https://example.com"
base_path = "/docs"

[output]
llms = false
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.site.url, "https://example.com");
        assert_eq!(config.site.base_path, "/docs");
        assert!(!config.output.llms);
        assert!(config.output.sitemap);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[site\nname = ").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_scalar_override() {
        let merged = merge_toml(toml::Value::Integer(1), toml::Value::Integer(2));
        assert_eq!(merged.as_integer(), Some(2));
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[site]\nnmae = \"typo\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[themes]\ndir = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_bad_url() {
        let mut config = SiteConfig::default();
        config.site.url = "example.com".into();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.site.url = "https://example.com/".into();
        assert!(config.validate().is_err());
        config.site.url = "https://example.com".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_base_path() {
        let mut config = SiteConfig::default();
        for bad in ["docs", "/docs/", "/"] {
            config.site.base_path = bad.into();
            assert!(config.validate().is_err(), "{bad} should be rejected");
        }
        config.site.base_path = "/docs".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[site]\nbase_path = \"docs\"\n").unwrap();
        assert!(matches!(
            resolve_config(base, Some(overlay)),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(config.site.name, defaults.site.name);
        assert_eq!(config.templates.dir, defaults.templates.dir);
        assert_eq!(config.output.index, defaults.output.index);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let value = stock_defaults_value().unwrap();
        let table = value.as_table().unwrap();
        for section in ["site", "templates", "markdown", "output", "processing"] {
            assert!(table.contains_key(section), "missing [{section}]");
        }
    }
}
