//! Shared test utilities for the quire test suite.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let site = scan(tmp.path()).unwrap();
//!
//! let post = find_page(&site, "/blog/first-post/");
//! assert_eq!(post.meta.page_type, "post");
//!
//! assert_nav(&site, &[("About", "/about/"), ("Blog", "/blog/")]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::scan::{Site, SourcePage};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Lookups
// =========================================================================

/// Find a page by URL. Panics with the known URLs if absent.
pub fn find_page<'a>(site: &'a Site, url: &str) -> &'a SourcePage {
    site.pages
        .iter()
        .find(|p| p.url == url)
        .unwrap_or_else(|| panic!("no page at {url}; have {:?}", page_urls(site)))
}

/// Every published URL, in scan order.
pub fn page_urls(site: &Site) -> Vec<&str> {
    site.pages.iter().map(|p| p.url.as_str()).collect()
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert the navigation is exactly `expected` `(title, url)` pairs.
pub fn assert_nav(site: &Site, expected: &[(&str, &str)]) {
    let actual: Vec<(&str, &str)> = site
        .nav
        .iter()
        .map(|e| (e.title.as_str(), e.url.as_str()))
        .collect();
    assert_eq!(actual, expected, "navigation mismatch");
}
