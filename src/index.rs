//! Page index and the site-level files derived from it.
//!
//! The index is a flat row per published page, written as `page-index.json`
//! for client-side lookup. The same rows feed the generators:
//!
//! | File | Contents |
//! |------|----------|
//! | `sitemap.xml` | one `<url>` per page, `<lastmod>` when dated |
//! | `robots.txt` | allow-all policy plus the sitemap location |
//! | `llms.txt` | pages grouped by category, posts under `## Optional` |
//!
//! Generated label pages (`/labels/<slug>/`) stay in the raw index but are
//! left out of all three files.

use crate::naming::slugify;
use crate::types::{DEFAULT_PAGE_TYPE, PageMeta};
use serde::Serialize;
use std::collections::BTreeMap;

/// URL prefix of generated label pages.
pub const LABEL_PAGE_PREFIX: &str = "/labels/";
/// Heading for pages without a category in `llms.txt`.
pub const DEFAULT_CATEGORY: &str = "Pages";

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const POST_TYPE: &str = "post";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageIndexEntry {
    /// Site-relative URL, without the base path.
    pub url: String,
    pub title: String,
    pub description: String,
    pub labels: Vec<String>,
    pub category: String,
    /// `YYYY-MM-DD`, or `null` when undated.
    pub date: Option<String>,
    /// Omitted for ordinary pages.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub page_type: Option<String>,
}

impl PageIndexEntry {
    pub fn from_meta(url: &str, meta: &PageMeta) -> Self {
        Self {
            url: url.to_string(),
            title: meta.title.clone(),
            description: meta.description.clone(),
            labels: meta.labels.clone(),
            category: meta.category.clone(),
            date: meta.date.map(|d| d.format("%Y-%m-%d").to_string()),
            page_type: (meta.page_type != DEFAULT_PAGE_TYPE).then(|| meta.page_type.clone()),
        }
    }

    pub fn is_post(&self) -> bool {
        self.page_type.as_deref() == Some(POST_TYPE)
    }
}

/// One row per page, in the order given.
pub fn build_index<'a>(
    pages: impl IntoIterator<Item = (&'a str, &'a PageMeta)>,
) -> Vec<PageIndexEntry> {
    pages
        .into_iter()
        .map(|(url, meta)| PageIndexEntry::from_meta(url, meta))
        .collect()
}

pub fn is_label_page(url: &str) -> bool {
    url.starts_with(LABEL_PAGE_PREFIX)
}

/// Site-relative URL of the listing page for `label`.
pub fn label_url(label: &str) -> String {
    format!("{LABEL_PAGE_PREFIX}{}/", slugify(label))
}

/// Pages per label, keyed by label slug. Each value keeps the first-seen
/// spelling of the label and the matching entries in index order.
pub fn group_by_label(entries: &[PageIndexEntry]) -> BTreeMap<String, (String, Vec<&PageIndexEntry>)> {
    let mut groups: BTreeMap<String, (String, Vec<&PageIndexEntry>)> = BTreeMap::new();
    for entry in entries.iter().filter(|e| !is_label_page(&e.url)) {
        for label in &entry.labels {
            let slug = slugify(label);
            if slug.is_empty() {
                continue;
            }
            let group = groups
                .entry(slug)
                .or_insert_with(|| (label.clone(), Vec::new()));
            if !group.1.iter().any(|e| e.url == entry.url) {
                group.1.push(entry);
            }
        }
    }
    groups
}

fn absolute(site_url: &str, base_path: &str, url: &str) -> String {
    format!("{site_url}{base_path}{url}")
}

pub fn generate_sitemap(entries: &[PageIndexEntry], site_url: &str, base_path: &str) -> String {
    let mut xml = String::with_capacity(256 + entries.len() * 96);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for entry in entries.iter().filter(|e| !is_label_page(&e.url)) {
        xml.push_str("  <url>\n");
        xml.push_str(&format!(
            "    <loc>{}</loc>\n",
            escape_xml(&absolute(site_url, base_path, &entry.url))
        ));
        if let Some(date) = &entry.date {
            xml.push_str(&format!("    <lastmod>{date}</lastmod>\n"));
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

pub fn generate_robots(site_url: &str, base_path: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\n\nSitemap: {}\n",
        absolute(site_url, base_path, "/sitemap.xml")
    )
}

/// Markdown manifest for language-model crawlers, in the `llms.txt` layout:
/// a title, an optional summary quote, a section per category in first-seen
/// order, then posts under `## Optional`.
pub fn generate_llms_manifest(
    entries: &[PageIndexEntry],
    site_url: &str,
    base_path: &str,
    site_name: &str,
    description: Option<&str>,
) -> String {
    let mut out = format!("# {site_name}\n");
    if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
        out.push_str(&format!("\n> {}\n", description.trim()));
    }

    let published = entries.iter().filter(|e| !is_label_page(&e.url));
    let (posts, pages): (Vec<_>, Vec<_>) = published.partition(|e| e.is_post());

    let mut categories: Vec<(&str, Vec<&PageIndexEntry>)> = Vec::new();
    for entry in pages {
        let name = match entry.category.trim() {
            "" => DEFAULT_CATEGORY,
            name => name,
        };
        match categories.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, group)) => group.push(entry),
            None => categories.push((name, vec![entry])),
        }
    }

    for (name, group) in &categories {
        out.push_str(&format!("\n## {name}\n\n"));
        for entry in group {
            push_manifest_line(&mut out, entry, site_url, base_path);
        }
    }

    if !posts.is_empty() {
        out.push_str("\n## Optional\n\n");
        for entry in &posts {
            push_manifest_line(&mut out, entry, site_url, base_path);
        }
    }
    out
}

fn push_manifest_line(out: &mut String, entry: &PageIndexEntry, site_url: &str, base_path: &str) {
    let url = absolute(site_url, base_path, &entry.url);
    if entry.description.is_empty() {
        out.push_str(&format!("- [{}]({url})\n", entry.title));
    } else {
        out.push_str(&format!("- [{}]({url}): {}\n", entry.title, entry.description));
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
