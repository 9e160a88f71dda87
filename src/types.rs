//! Shared page types used across scan, build and index generation.

use crate::compile::ChildPageRecord;
use crate::frontmatter::{self as fm};
use crate::naming;
use chrono::NaiveDate;
use serde::Serialize;
use serde_yaml::Mapping;
use std::path::{Path, PathBuf};

/// Page type assumed when a document declares none.
pub const DEFAULT_PAGE_TYPE: &str = "page";
/// Skeleton used when a document declares none.
pub const DEFAULT_TEMPLATE: &str = "default";

/// Navigation link (numbered pages, or pages with `nav: true`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavEntry {
    pub title: String,
    /// Site-relative URL, without the base path.
    pub url: String,
    #[serde(skip)]
    pub order: u32,
}

/// A content file that could not be processed. The rest of the batch
/// continues without it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageFailure {
    pub path: PathBuf,
    pub message: String,
}

impl PageFailure {
    pub fn new(path: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        Self {
            path: path.into(),
            message: error.to_string(),
        }
    }
}

/// Typed view of the frontmatter keys the compiler understands.
///
/// Everything else stays available in the raw map.
#[derive(Debug, Clone, PartialEq)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub author: String,
    pub date: Option<NaiveDate>,
    pub category: String,
    pub labels: Vec<String>,
    pub page_type: String,
    pub template: String,
    pub short_uri: String,
    pub order: u32,
    pub in_nav: bool,
    pub draft: bool,
}

impl PageMeta {
    /// Read metadata for the content file at `rel_path`, falling back to
    /// path-derived values for title and order.
    pub fn from_frontmatter(map: &Mapping, rel_path: &Path) -> Self {
        let path_order = naming::order_for(rel_path);
        let order = fm::u32_field(map, "order").or(path_order);
        let labels = match fm::string_list(map, "labels") {
            labels if labels.is_empty() => fm::string_list(map, "tags"),
            labels => labels,
        };
        let short_uri = fm::str_field(map, "shortUri")
            .or_else(|| fm::str_field(map, "short_uri"))
            .unwrap_or_else(|| {
                rel_path
                    .file_stem()
                    .map(|s| naming::parse_entry_name(&s.to_string_lossy()).slug)
                    .unwrap_or_default()
            });

        Self {
            title: fm::str_field(map, "title").unwrap_or_else(|| naming::title_for(rel_path)),
            description: fm::str_field(map, "description").unwrap_or_default(),
            keywords: fm::string_list(map, "keywords"),
            author: fm::str_field(map, "author").unwrap_or_default(),
            date: fm::date_field(map, "date"),
            category: fm::str_field(map, "category").unwrap_or_default(),
            labels,
            page_type: fm::str_field(map, "type").unwrap_or_else(|| DEFAULT_PAGE_TYPE.to_string()),
            template: fm::str_field(map, "template")
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
            short_uri,
            order: order.unwrap_or(u32::MAX),
            in_nav: fm::bool_field(map, "nav").unwrap_or(path_order.is_some()),
            draft: fm::bool_field(map, "draft").unwrap_or(false),
        }
    }

    /// Project into the record the `:::children` directive renders.
    /// `href` is the link target, base path included.
    pub fn to_child_record(&self, href: &str) -> ChildPageRecord {
        ChildPageRecord {
            title: self.title.clone(),
            url: href.to_string(),
            description: self.description.clone(),
            date: self.date,
            category: self.category.clone(),
            labels: self.labels.clone(),
            author: self.author.clone(),
            page_type: self.page_type.clone(),
            short_uri: self.short_uri.clone(),
            order: self.order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::parse;

    fn meta(text: &str, path: &str) -> PageMeta {
        let doc = parse(text).unwrap();
        PageMeta::from_frontmatter(&doc.frontmatter, Path::new(path))
    }

    #[test]
    fn defaults_from_path() {
        let m = meta("no frontmatter", "030-Field-Notes.md");
        assert_eq!(m.title, "Field Notes");
        assert_eq!(m.order, 30);
        assert!(m.in_nav);
        assert_eq!(m.page_type, "page");
        assert_eq!(m.template, "default");
        assert_eq!(m.short_uri, "field-notes");
    }

    #[test]
    fn frontmatter_overrides() {
        let m = meta(
            "---\ntitle: Hello\norder: 2\nnav: false\ntype: post\ntags: [a, b]\nshortUri: hi\ndate: 2024-05-06\n---\n",
            "010-x.md",
        );
        assert_eq!(m.title, "Hello");
        assert_eq!(m.order, 2);
        assert!(!m.in_nav);
        assert_eq!(m.page_type, "post");
        assert_eq!(m.labels, ["a", "b"]);
        assert_eq!(m.short_uri, "hi");
        assert_eq!(m.date, NaiveDate::from_ymd_opt(2024, 5, 6));
    }

    #[test]
    fn unnumbered_pages_stay_out_of_nav() {
        let m = meta("---\ntitle: Notes\n---\n", "notes.md");
        assert!(!m.in_nav);
        assert_eq!(m.order, u32::MAX);
    }

    #[test]
    fn child_record_projection() {
        let m = meta("---\ntitle: Post\nlabels: [x]\n---\n", "blog/post.md");
        let r = m.to_child_record("/base/blog/post/");
        assert_eq!(r.title, "Post");
        assert_eq!(r.url, "/base/blog/post/");
        assert_eq!(r.labels, ["x"]);
    }
}
