//! Site build: page compilation and output.
//!
//! Phase 2 of the build. Runs after [`scan`](crate::scan) has parsed every
//! document, so directive expansion sees complete sibling metadata.
//!
//! ```text
//! Site (phase 1)
//!   │  prepare: stock templates → templates/ → templates/<theme>/,
//!   │           built-in tags + components/*.toml
//!   ▼
//! compile_pages (parallel, read-only Renderer)
//!   │  expand_children → DocumentCompiler::compile → TemplateStore::render
//!   ▼
//! label pages, page index, sitemap.xml, robots.txt, llms.txt
//! ```
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html                 # /
//! ├── about/index.html           # /about/
//! ├── blog/
//! │   ├── index.html             # /blog/
//! │   └── first-post/index.html
//! ├── labels/rust/index.html     # generated label page
//! ├── css/site.css               # copied from assets/
//! ├── page-index.json
//! ├── sitemap.xml
//! ├── robots.txt
//! └── llms.txt
//! ```
//!
//! A page that fails to compile or render is reported in
//! [`BuildReport::failures`] and left out; the other pages are still written.

use crate::compile::{ChildPageRecord, CompileOptions, DocumentCompiler, expand_children};
use crate::config;
use crate::index::{self, PageIndexEntry};
use crate::scan::{self, ASSETS_DIR, ScanError, Site, SourcePage};
use crate::tags::{DiscoveryReport, TagError, TagRegistry};
use crate::template::{
    self, LABELS_TEMPLATE, SiteContext, TemplateContext, TemplateError, TemplateStore,
};
use crate::types::PageFailure;
use maud::html;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

pub const INDEX_FILE: &str = "page-index.json";
pub const SITEMAP_FILE: &str = "sitemap.xml";
pub const ROBOTS_FILE: &str = "robots.txt";
pub const LLMS_FILE: &str = "llms.txt";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
    #[error("Component error: {0}")]
    Tags(#[from] TagError),
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// One finished HTML page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Site-relative URL, without the base path.
    pub url: String,
    pub html: String,
}

/// What a build (or check) did.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// URLs of content pages, in source order.
    pub pages: Vec<String>,
    /// URLs of generated label pages.
    pub label_pages: Vec<String>,
    pub drafts: usize,
    /// Skeletons available to pages, sorted.
    pub templates: Vec<String>,
    pub components: DiscoveryReport,
    /// Files copied from the assets directory.
    pub assets: usize,
    /// Site-level files written (`sitemap.xml`, …).
    pub files: Vec<String>,
    pub index: Vec<PageIndexEntry>,
    pub failures: Vec<PageFailure>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Everything page rendering reads. Built once, then shared read-only by
/// the worker pool.
pub struct Renderer {
    pub compiler: DocumentCompiler,
    pub templates: TemplateStore,
    pub registry: TagRegistry,
    pub site: Arc<SiteContext>,
}

/// Scan `source` and write the site to `output`.
pub fn build(source: &Path, output: &Path) -> Result<BuildReport, BuildError> {
    let site = scan::scan(source)?;
    run(&site, Some(output))
}

/// Scan and compile everything without writing.
pub fn check(source: &Path) -> Result<BuildReport, BuildError> {
    let site = scan::scan(source)?;
    run(&site, None)
}

/// Phase 2 for an already scanned site. Writes to `output` when given.
pub fn run(site: &Site, output: Option<&Path>) -> Result<BuildReport, BuildError> {
    let (renderer, components) = prepare(site)?;
    let mut report = BuildReport {
        drafts: site.drafts,
        templates: renderer.templates.names().into_iter().map(String::from).collect(),
        components,
        failures: site.failures.clone(),
        ..BuildReport::default()
    };

    let threads = config::effective_threads(&site.config.processing);
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    let results: Vec<Result<RenderedPage, PageFailure>> =
        pool.install(|| compile_pages(site, &renderer));

    let mut rendered = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(page) => rendered.push(page),
            Err(failure) => {
                tracing::warn!(path = %failure.path.display(), error = %failure.message, "page failed");
                report.failures.push(failure);
            }
        }
    }
    report.pages = rendered.iter().map(|p| p.url.clone()).collect();

    let published: HashSet<&str> = report.pages.iter().map(String::as_str).collect();
    let mut entries = index::build_index(
        site.pages
            .iter()
            .filter(|p| published.contains(p.url.as_str()))
            .map(|p| (p.url.as_str(), &p.meta)),
    );
    if site.config.output.label_pages {
        let label_pages = render_label_pages(&entries, &renderer);
        for page in label_pages {
            match page {
                Ok((page, entry)) => {
                    report.label_pages.push(page.url.clone());
                    entries.push(entry);
                    rendered.push(page);
                }
                Err(failure) => report.failures.push(failure),
            }
        }
    }
    report.index = entries;

    if let Some(output) = output {
        write_site(site, &rendered, output, &mut report)?;
    }
    tracing::info!(
        pages = report.pages.len(),
        label_pages = report.label_pages.len(),
        failures = report.failures.len(),
        "build finished"
    );
    Ok(report)
}

/// Build the template store, tag registry and site context.
pub fn prepare(site: &Site) -> Result<(Renderer, DiscoveryReport), BuildError> {
    let mut templates = TemplateStore::stock();
    let template_dir = site.root.join(&site.config.templates.dir);
    template::overlay_from_dir(&template_dir, &mut templates)?;
    let theme = site.config.templates.theme.trim();
    if !theme.is_empty() {
        let theme_dir = template_dir.join(theme);
        if !theme_dir.is_dir() {
            tracing::warn!(theme, dir = %theme_dir.display(), "theme directory not found");
        }
        template::overlay_from_dir(&theme_dir, &mut templates)?;
    }

    // Components may replace built-in tags of the same name.
    let mut components = TagRegistry::default();
    let discovery = components.discover(&site.root.join(&site.config.templates.components))?;
    let mut registry = TagRegistry::with_builtins();
    registry.register(components.all().iter().cloned());

    let (css_files, js_files) = asset_urls(&site.root.join(ASSETS_DIR));
    let context = SiteContext {
        site_name: site.config.site.name.clone(),
        site_url: site.config.site.url.clone(),
        base_path: site.config.site.base_path.clone(),
        description: site.config.site.description.clone(),
        author: site.config.site.author.clone(),
        nav: site.nav.clone(),
        labels: site.labels.clone(),
        css_files,
        js_files,
    };

    let compiler = DocumentCompiler::new(CompileOptions {
        html_passthrough: site.config.markdown.html_passthrough,
    });

    Ok((
        Renderer {
            compiler,
            templates,
            registry,
            site: Arc::new(context),
        },
        discovery,
    ))
}

/// Compile and render every page in parallel. Results keep source order.
pub fn compile_pages(site: &Site, renderer: &Renderer) -> Vec<Result<RenderedPage, PageFailure>> {
    site.pages
        .par_iter()
        .map(|page| render_page(site, page, renderer))
        .collect()
}

fn render_page(site: &Site, page: &SourcePage, renderer: &Renderer) -> Result<RenderedPage, PageFailure> {
    let fail = |e: &dyn std::fmt::Display| PageFailure::new(&page.rel_path, e);

    let siblings = siblings_for(site, page);
    let body = expand_children(&page.document.body, &siblings).map_err(|e| fail(&e))?;
    let content = renderer.compiler.compile(&body).map_err(|e| fail(&e))?;

    let ctx = TemplateContext::for_page(
        Arc::clone(&renderer.site),
        &page.url,
        &page.meta,
        page.document.frontmatter.clone(),
        content,
    );
    let html = renderer
        .templates
        .render(&page.meta.template, &ctx, &renderer.registry)
        .map_err(|e| fail(&e))?;

    tracing::debug!(url = %page.url, template = %page.meta.template, "rendered");
    Ok(RenderedPage {
        url: page.url.clone(),
        html,
    })
}

/// Pages a `:::children` directive on `page` lists: the other pages in the
/// same directory, plus the index pages of direct subdirectories when `page`
/// is itself an index.
pub fn siblings_for(site: &Site, page: &SourcePage) -> Vec<ChildPageRecord> {
    let dir = page.dir();
    let base = &site.config.site.base_path;
    site.pages
        .iter()
        .filter(|other| other.url != page.url)
        .filter(|other| {
            other.dir() == dir
                || (page.is_index() && other.is_index() && other.dir().parent() == Some(dir))
        })
        .map(|other| other.meta.to_child_record(&format!("{base}{}", other.url)))
        .collect()
}

fn render_label_pages(
    entries: &[PageIndexEntry],
    renderer: &Renderer,
) -> Vec<Result<(RenderedPage, PageIndexEntry), PageFailure>> {
    index::group_by_label(entries)
        .into_iter()
        .map(|(_, (label, pages))| -> Result<(RenderedPage, PageIndexEntry), PageFailure> {
            let url = index::label_url(&label);
            let content = html! {
                ul.label-pages {
                    @for entry in &pages {
                        li {
                            a href=(format!("{}{}", renderer.site.base_path, entry.url)) { (entry.title) }
                            @if let Some(date) = &entry.date {
                                " " time datetime=(date) { (date) }
                            }
                            @if !entry.description.is_empty() {
                                p { (entry.description) }
                            }
                        }
                    }
                }
            }
            .into_string();

            let ctx = TemplateContext {
                site: Arc::clone(&renderer.site),
                url: url.clone(),
                title: label.clone(),
                content,
                description: format!("Pages labelled {label}"),
                page_type: "labels".to_string(),
                ..TemplateContext::default()
            };
            let html = renderer
                .templates
                .render(LABELS_TEMPLATE, &ctx, &renderer.registry)
                .map_err(|e| PageFailure::new(url.trim_matches('/'), e))?;

            let entry = PageIndexEntry {
                url: url.clone(),
                title: label,
                description: ctx.description,
                labels: Vec::new(),
                category: String::new(),
                date: None,
                page_type: Some("labels".to_string()),
            };
            let page = RenderedPage {
                url,
                html,
            };
            Ok((page, entry))
        })
        .collect()
}

/// Stylesheet and script URLs under the assets directory, as they will be
/// served once the directory is copied to the output root.
pub fn asset_urls(assets: &Path) -> (Vec<String>, Vec<String>) {
    let mut css = Vec::new();
    let mut js = Vec::new();
    if !assets.is_dir() {
        return (css, js);
    }
    for entry in WalkDir::new(assets)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let Ok(rel) = entry.path().strip_prefix(assets) else {
            continue;
        };
        let url = format!("/{}", rel.to_string_lossy().replace('\\', "/"));
        match rel.extension().and_then(|e| e.to_str()) {
            Some("css") => css.push(url),
            Some("js") => js.push(url),
            _ => {}
        }
    }
    (css, js)
}

fn page_path(output: &Path, url: &str) -> PathBuf {
    output.join(url.trim_matches('/')).join("index.html")
}

fn write_site(
    site: &Site,
    pages: &[RenderedPage],
    output: &Path,
    report: &mut BuildReport,
) -> Result<(), BuildError> {
    fs::create_dir_all(output)?;

    let assets = site.root.join(ASSETS_DIR);
    if assets.is_dir() {
        report.assets = copy_dir_recursive(&assets, output)?;
    }

    for page in pages {
        let path = page_path(output, &page.url);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &page.html)?;
    }

    let out = &site.config.output;
    let site_cfg = &site.config.site;
    if out.index {
        let json = serde_json::to_string_pretty(&report.index)?;
        write_file(output, INDEX_FILE, &json, report)?;
    }
    if out.sitemap {
        if site_cfg.url.is_empty() {
            tracing::warn!("site.url is not set; sitemap.xml will use relative URLs");
        }
        let xml = index::generate_sitemap(&report.index, &site_cfg.url, &site_cfg.base_path);
        write_file(output, SITEMAP_FILE, &xml, report)?;
    }
    if out.robots {
        let robots = index::generate_robots(&site_cfg.url, &site_cfg.base_path);
        write_file(output, ROBOTS_FILE, &robots, report)?;
    }
    if out.llms {
        let description = Some(site_cfg.description.as_str()).filter(|d| !d.is_empty());
        let llms = index::generate_llms_manifest(
            &report.index,
            &site_cfg.url,
            &site_cfg.base_path,
            &site_cfg.name,
            description,
        );
        write_file(output, LLMS_FILE, &llms, report)?;
    }
    Ok(())
}

fn write_file(
    output: &Path,
    name: &str,
    contents: &str,
    report: &mut BuildReport,
) -> Result<(), BuildError> {
    fs::write(output.join(name), contents)?;
    report.files.push(name.to_string());
    Ok(())
}

/// Copy a directory tree, returning the number of files copied.
fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<usize> {
    let mut copied = 0;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copied += copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
            copied += 1;
        }
    }
    Ok(copied)
}
