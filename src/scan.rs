//! Content discovery and metadata parsing.
//!
//! Phase 1 of the build. Walks the source directory for markdown documents,
//! parses every document's frontmatter and derives the site-wide data that
//! page compilation needs: navigation, the label set and each page's URL.
//! No body is compiled here, so phase 2 can start from complete sibling
//! metadata.
//!
//! ## Directory Structure
//!
//! ```text
//! content/                         # Source root
//! ├── config.toml                  # Site configuration (optional)
//! ├── index.md                     # → /
//! ├── 010-about.md                 # → /about/          (numbered = in nav)
//! ├── 020-Blog/
//! │   ├── index.md                 # → /blog/           (in nav)
//! │   └── first-post.md            # → /blog/first-post/
//! ├── notes.md                     # → /notes/          (hidden from nav)
//! ├── assets/                      # copied verbatim, never scanned
//! ├── templates/                   # *.html skeletons, never scanned
//! └── components/                  # *.toml tag manifests, never scanned
//! ```
//!
//! Hidden files and directories (leading `.`) are skipped. Documents with
//! `draft: true` are counted but not published.
//!
//! ## Failures
//!
//! A document whose frontmatter does not parse is recorded in
//! [`Site::failures`] with its path; scanning carries on with the rest. So
//! does a document whose URL collides with an earlier one.

use crate::config::{self, SiteConfig};
use crate::frontmatter::{self, ContentDocument};
use crate::naming::{self, slugify};
use crate::types::{NavEntry, PageFailure, PageMeta};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Static files copied to the output root.
pub const ASSETS_DIR: &str = "assets";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Source directory not found: {0}")]
    MissingSource(PathBuf),
}

/// A parsed content document.
#[derive(Debug, Clone)]
pub struct SourcePage {
    /// Path relative to the source root.
    pub rel_path: PathBuf,
    /// Site-relative URL, without the base path.
    pub url: String,
    pub meta: PageMeta,
    pub document: ContentDocument,
}

impl SourcePage {
    pub fn is_index(&self) -> bool {
        naming::is_index_file(&self.rel_path)
    }

    /// Directory the page lists siblings from.
    pub fn dir(&self) -> &Path {
        self.rel_path.parent().unwrap_or(Path::new(""))
    }
}

/// Everything phase 1 learned about the source directory.
#[derive(Debug)]
pub struct Site {
    pub root: PathBuf,
    pub config: SiteConfig,
    /// Published pages in source path order.
    pub pages: Vec<SourcePage>,
    pub nav: Vec<NavEntry>,
    /// Every label used by a published page, first-seen spelling, sorted.
    pub labels: Vec<String>,
    pub drafts: usize,
    pub failures: Vec<PageFailure>,
}

/// Load `config.toml` from `root`, then scan.
pub fn scan(root: &Path) -> Result<Site, ScanError> {
    let config = config::load_config(root)?;
    scan_with_config(root, config)
}

pub fn scan_with_config(root: &Path, config: SiteConfig) -> Result<Site, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingSource(root.to_path_buf()));
    }

    let mut pages = Vec::new();
    let mut failures = Vec::new();
    let mut drafts = 0;
    let mut seen_urls: HashMap<String, PathBuf> = HashMap::new();

    for rel_path in content_files(root, &config)? {
        let document = match frontmatter::parse_file(&root.join(&rel_path)) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(path = %rel_path.display(), error = %e, "skipping document");
                failures.push(PageFailure::new(&rel_path, e));
                continue;
            }
        };

        let meta = PageMeta::from_frontmatter(&document.frontmatter, &rel_path);
        if meta.draft {
            tracing::debug!(path = %rel_path.display(), "skipping draft");
            drafts += 1;
            continue;
        }

        let url = naming::url_for(&rel_path);
        if let Some(first) = seen_urls.get(&url) {
            let message = format!("URL {url} is already used by {}", first.display());
            tracing::warn!(path = %rel_path.display(), %message, "skipping document");
            failures.push(PageFailure::new(&rel_path, message));
            continue;
        }
        seen_urls.insert(url.clone(), rel_path.clone());

        pages.push(SourcePage {
            rel_path,
            url,
            meta,
            document,
        });
    }

    let nav = build_nav(&pages);
    let labels = collect_labels(&pages);
    tracing::info!(
        pages = pages.len(),
        drafts,
        failures = failures.len(),
        "scanned {}",
        root.display()
    );

    Ok(Site {
        root: root.to_path_buf(),
        config,
        pages,
        nav,
        labels,
        drafts,
        failures,
    })
}

/// Markdown files under `root`, relative to it, in path order.
fn content_files(root: &Path, config: &SiteConfig) -> Result<Vec<PathBuf>, ScanError> {
    let excluded = [
        root.join(ASSETS_DIR),
        root.join(&config.templates.dir),
        root.join(&config.templates.components),
    ];

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !(is_hidden(entry.file_name()) || excluded.iter().any(|p| p == entry.path()))
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        let is_markdown = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("md"));
        if entry.file_type().is_file()
            && is_markdown
            && let Ok(rel) = path.strip_prefix(root)
        {
            files.push(rel.to_path_buf());
        }
    }
    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Navigation entries for pages marked in-nav, by order then URL.
pub fn build_nav(pages: &[SourcePage]) -> Vec<NavEntry> {
    let mut nav: Vec<NavEntry> = pages
        .iter()
        .filter(|p| p.meta.in_nav)
        .map(|p| NavEntry {
            title: p.meta.title.clone(),
            url: p.url.clone(),
            order: p.meta.order,
        })
        .collect();
    nav.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.url.cmp(&b.url)));
    nav
}

/// Distinct labels across pages. Labels that slugify alike are one label.
pub fn collect_labels(pages: &[SourcePage]) -> Vec<String> {
    let mut by_slug: BTreeMap<String, String> = BTreeMap::new();
    for label in pages.iter().flat_map(|p| &p.meta.labels) {
        let slug = slugify(label);
        if !slug.is_empty() {
            by_slug.entry(slug).or_insert_with(|| label.clone());
        }
    }
    by_slug.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn scan_finds_published_pages() {
        let tmp = setup_fixtures();
        let site = scan(tmp.path()).unwrap();

        assert_eq!(
            page_urls(&site),
            [
                "/about/",
                "/blog/first-post/",
                "/blog/",
                "/blog/second-post/",
                "/",
                "/notes/",
            ]
        );
        assert!(site.failures.is_empty());
    }

    #[test]
    fn drafts_are_counted_not_published() {
        let tmp = setup_fixtures();
        let site = scan(tmp.path()).unwrap();
        assert_eq!(site.drafts, 1);
        assert!(site.pages.iter().all(|p| !p.url.contains("draft")));
    }

    #[test]
    fn support_directories_are_not_scanned() {
        let tmp = setup_fixtures();
        fs::write(tmp.path().join("templates/README.md"), "# not a page").unwrap();
        fs::write(tmp.path().join("assets/notes.md"), "# nor this").unwrap();
        fs::create_dir_all(tmp.path().join(".git")).unwrap();
        fs::write(tmp.path().join(".git/HEAD.md"), "x").unwrap();

        let site = scan(tmp.path()).unwrap();
        assert!(site.pages.iter().all(|p| {
            !p.rel_path.starts_with("templates")
                && !p.rel_path.starts_with("assets")
                && !p.rel_path.starts_with(".git")
        }));
    }

    #[test]
    fn nav_follows_order_prefix() {
        let tmp = setup_fixtures();
        let site = scan(tmp.path()).unwrap();
        assert_nav(&site, &[("About", "/about/"), ("Blog", "/blog/")]);
    }

    #[test]
    fn labels_are_merged_by_slug() {
        let tmp = setup_fixtures();
        let site = scan(tmp.path()).unwrap();
        assert_eq!(site.labels, ["Rust", "web"]);
    }

    #[test]
    fn config_loaded_from_fixtures() {
        let tmp = setup_fixtures();
        let site = scan(tmp.path()).unwrap();
        assert_eq!(site.config.site.name, "Fixture Site");
    }

    #[test]
    fn malformed_frontmatter_is_recorded_and_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("good.md"), "---\ntitle: Good\n---\nbody").unwrap();
        fs::write(tmp.path().join("bad.md"), "---\ntitle: [unclosed\n---\nbody").unwrap();

        let site = scan(tmp.path()).unwrap();
        assert_eq!(site.pages.len(), 1);
        assert_eq!(site.failures.len(), 1);
        assert_eq!(site.failures[0].path, Path::new("bad.md"));
        assert!(site.failures[0].message.contains("bad.md"));
    }

    #[test]
    fn duplicate_urls_are_failures() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("blog")).unwrap();
        fs::write(tmp.path().join("blog/_index.md"), "a").unwrap();
        fs::write(tmp.path().join("blog/index.md"), "b").unwrap();

        let site = scan(tmp.path()).unwrap();
        assert_eq!(site.pages.len(), 1);
        assert_eq!(site.failures.len(), 1);
        assert!(site.failures[0].message.contains("/blog/"));
    }

    #[test]
    fn missing_source_is_error() {
        let result = scan_with_config(Path::new("/nonexistent/content"), SiteConfig::default());
        assert!(matches!(result, Err(ScanError::MissingSource(_))));
    }
}
