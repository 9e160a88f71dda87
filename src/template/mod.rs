//! Named page skeletons and the placeholder engine that fills them.
//!
//! A skeleton is plain HTML with `{{tag}}` placeholders (see [`engine`]).
//! The store starts from the embedded stock set and is overlaid from disk:
//!
//! ```text
//! stock (embedded)  →  <source>/templates/*.html  →  <source>/templates/<theme>/*.html
//! ```
//!
//! Each layer replaces skeletons with the same name and adds new ones. A
//! skeleton's name is its file stem, so `templates/post.html` is selected by
//! `template: post` in frontmatter.

pub mod context;
pub mod engine;
pub mod structural;

pub use context::{SiteContext, TemplateContext};
pub use engine::process;

use crate::tags::TagRegistry;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const STOCK_DEFAULT: &str = include_str!("../../static/templates/default.html");
const STOCK_BLANK: &str = include_str!("../../static/templates/blank.html");
const STOCK_LABELS: &str = include_str!("../../static/templates/labels.html");

/// Skeleton used for generated label pages.
pub const LABELS_TEMPLATE: &str = "labels";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),
    #[error("failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    skeletons: BTreeMap<String, String>,
}

impl TemplateStore {
    /// The embedded `default`, `blank` and `labels` skeletons.
    pub fn stock() -> Self {
        let mut store = Self::default();
        store.register("default", STOCK_DEFAULT);
        store.register("blank", STOCK_BLANK);
        store.register(LABELS_TEMPLATE, STOCK_LABELS);
        store
    }

    /// Add or replace a skeleton.
    pub fn register(&mut self, name: impl Into<String>, skeleton: impl Into<String>) {
        self.skeletons.insert(name.into(), skeleton.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.skeletons.get(name).map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.skeletons.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.skeletons.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.skeletons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skeletons.is_empty()
    }

    /// Fill the named skeleton for one page.
    pub fn render(
        &self,
        name: &str,
        ctx: &TemplateContext,
        registry: &TagRegistry,
    ) -> Result<String, TemplateError> {
        let skeleton = self
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
        Ok(engine::process(skeleton, ctx, registry))
    }

    /// A store holding every `*.html` file directly inside `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Self, TemplateError> {
        let mut store = Self::default();
        overlay_from_dir(dir, &mut store)?;
        Ok(store)
    }
}

/// Replace or add skeletons in `store` from the `*.html` files directly
/// inside `dir`. A missing directory is not an error. Returns the names
/// loaded.
pub fn overlay_from_dir(dir: &Path, store: &mut TemplateStore) -> Result<Vec<String>, TemplateError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let io_err = |source| TemplateError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == "html"))
        .collect();
    paths.sort();

    let mut loaded = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        let skeleton = fs::read_to_string(&path).map_err(|source| TemplateError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(template = %name, path = %path.display(), "loaded template");
        store.register(name.clone(), skeleton);
        loaded.push(name);
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ctx() -> TemplateContext {
        TemplateContext {
            title: "Home".to_string(),
            content: "<h1>Hi</h1>".to_string(),
            ..TemplateContext::default()
        }
    }

    #[test]
    fn stock_has_three_skeletons() {
        let store = TemplateStore::stock();
        assert_eq!(store.names(), ["blank", "default", "labels"]);
        assert!(store.get("default").unwrap().contains("{{content}}"));
    }

    #[test]
    fn render_unknown_is_not_found() {
        let store = TemplateStore::default();
        let err = store
            .render("missing", &ctx(), &TagRegistry::default())
            .unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(name) if name == "missing"));
    }

    #[test]
    fn render_fills_registered_skeleton() {
        let mut store = TemplateStore::default();
        store.register("page", "<title>{{title}}</title>{{content}}");
        let html = store.render("page", &ctx(), &TagRegistry::default()).unwrap();
        assert_eq!(html, "<title>Home</title><h1>Hi</h1>");
    }

    #[test]
    fn stock_default_renders_without_leftover_tags() {
        let store = TemplateStore::stock();
        let html = store.render("default", &ctx(), &TagRegistry::default()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Home</title>"));
        assert!(html.contains("<h1>Hi</h1>"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn overlay_replaces_same_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("default.html"), "B").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut store = TemplateStore::default();
        store.register("default", "A");
        let loaded = overlay_from_dir(dir.path(), &mut store).unwrap();

        assert_eq!(loaded, ["default"]);
        assert_eq!(store.get("default"), Some("B"));
        assert!(!store.has("notes"));
    }

    #[test]
    fn overlay_adds_new_names() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("post.html"), "{{content}}").unwrap();

        let mut store = TemplateStore::stock();
        overlay_from_dir(dir.path(), &mut store).unwrap();
        assert!(store.has("post"));
        assert!(store.has("default"));
    }

    #[test]
    fn missing_overlay_dir_is_noop() {
        let mut store = TemplateStore::stock();
        let loaded = overlay_from_dir(Path::new("/nonexistent/templates"), &mut store).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn load_from_dir_keys_by_stem() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.html"), "A").unwrap();
        fs::write(dir.path().join("b.html"), "B").unwrap();
        let store = TemplateStore::load_from_dir(dir.path()).unwrap();
        assert_eq!(store.names(), ["a", "b"]);
    }
}
