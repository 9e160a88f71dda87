//! The per-page value bag every tag reads from.

use crate::types::{NavEntry, PageMeta};
use chrono::NaiveDate;
use serde_yaml::Mapping;
use std::sync::Arc;

/// Site-wide values, built once per build and shared by every page.
#[derive(Debug, Clone, Default)]
pub struct SiteContext {
    pub site_name: String,
    /// Absolute site URL without trailing slash, e.g. `https://example.com`.
    pub site_url: String,
    /// Path prefix the site is served under, e.g. `/docs`. Empty for root.
    pub base_path: String,
    pub description: String,
    /// Author for pages whose frontmatter names none.
    pub author: String,
    pub nav: Vec<NavEntry>,
    /// Every label used by any page, sorted.
    pub labels: Vec<String>,
    pub css_files: Vec<String>,
    pub js_files: Vec<String>,
}

/// Immutable page context. Tags read it; nothing writes to it after
/// construction.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub site: Arc<SiteContext>,
    /// Site-relative page URL, without the base path.
    pub url: String,
    pub title: String,
    /// Compiled page body.
    pub content: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub author: String,
    pub date: Option<NaiveDate>,
    pub category: String,
    pub labels: Vec<String>,
    pub page_type: String,
    pub frontmatter: Mapping,
}

impl TemplateContext {
    pub fn for_page(
        site: Arc<SiteContext>,
        url: &str,
        meta: &PageMeta,
        frontmatter: Mapping,
        content: String,
    ) -> Self {
        let author = if meta.author.is_empty() {
            site.author.clone()
        } else {
            meta.author.clone()
        };
        Self {
            site,
            url: url.to_string(),
            title: meta.title.clone(),
            content,
            description: meta.description.clone(),
            keywords: meta.keywords.clone(),
            author,
            date: meta.date,
            category: meta.category.clone(),
            labels: meta.labels.clone(),
            page_type: meta.page_type.clone(),
            frontmatter,
        }
    }

    pub fn base_path(&self) -> &str {
        &self.site.base_path
    }

    /// Link target for a site-relative URL.
    pub fn href(&self, url: &str) -> String {
        format!("{}{}", self.site.base_path, url)
    }

    /// Absolute URL for a site-relative URL, when the site URL is known.
    pub fn absolute_url(&self, url: &str) -> Option<String> {
        (!self.site.site_url.is_empty())
            .then(|| format!("{}{}{}", self.site.site_url, self.site.base_path, url))
    }

    pub fn is_post(&self) -> bool {
        self.page_type == "post"
    }
}
