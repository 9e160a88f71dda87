//! CLI output formatting for scan and build results.
//!
//! Output is **information-centric, not file-centric**: each page is shown
//! by position and title, with its source file as an indented `Source:` line.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Pages
//! 001 About → /about/
//!     Source: 010-about.md
//! 002 First Post → /blog/first-post/
//!     Source: 020-Blog/first-post.md
//!
//! Navigation
//!     About → /about/
//!     Blog → /blog/
//!
//! Labels
//!     Rust, web
//!
//! Config
//!     config.toml
//!     assets/
//! ```
//!
//! ## Build
//!
//! ```text
//! Templates: blank, default, labels, post
//! Components: 2 tags from 1 manifest (1 skipped)
//!
//! Pages
//! 001 /about/ → about/index.html
//! 002 / → index.html
//!
//! Label pages
//!     /labels/rust/
//!
//! Files: page-index.json, sitemap.xml, robots.txt, llms.txt
//! Built 2 pages, 1 label page, copied 2 assets
//! ```
//!
//! Failures are listed last in both, one `path: message` line each.
//!
//! # Architecture
//!
//! Each result has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::build::BuildReport;
use crate::config::CONFIG_FILE;
use crate::scan::{ASSETS_DIR, Site};
use crate::types::PageFailure;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Output path of a page URL, relative to the output root.
fn output_file(url: &str) -> String {
    match url.trim_matches('/') {
        "" => "index.html".to_string(),
        dir => format!("{dir}/index.html"),
    }
}

fn failure_lines(failures: &[PageFailure], lines: &mut Vec<String>) {
    if failures.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push("Failures".to_string());
    for failure in failures {
        lines.push(format!("    {}: {}", failure.path.display(), failure.message));
    }
}

pub fn format_scan_output(site: &Site) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];
    for (i, page) in site.pages.iter().enumerate() {
        lines.push(format!("{} {} → {}", format_index(i + 1), page.meta.title, page.url));
        lines.push(format!("    Source: {}", page.rel_path.display()));
    }
    if site.drafts > 0 {
        lines.push(format!("    ({} skipped)", plural(site.drafts, "draft")));
    }

    if !site.nav.is_empty() {
        lines.push(String::new());
        lines.push("Navigation".to_string());
        for entry in &site.nav {
            lines.push(format!("    {} → {}", entry.title, entry.url));
        }
    }

    if !site.labels.is_empty() {
        lines.push(String::new());
        lines.push("Labels".to_string());
        lines.push(format!("    {}", site.labels.join(", ")));
    }

    lines.push(String::new());
    lines.push("Config".to_string());
    if site.root.join(CONFIG_FILE).exists() {
        lines.push(format!("    {CONFIG_FILE}"));
    }
    if site.root.join(ASSETS_DIR).is_dir() {
        lines.push(format!("    {ASSETS_DIR}/"));
    }

    failure_lines(&site.failures, &mut lines);
    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(site: &Site) {
    for line in format_scan_output(site) {
        println!("{}", line);
    }
}

pub fn format_build_output(report: &BuildReport, wrote: bool) -> Vec<String> {
    let mut lines = vec![format!("Templates: {}", report.templates.join(", "))];

    let components = &report.components;
    let mut summary = format!(
        "Components: {} from {}",
        plural(components.tags, "tag"),
        plural(components.loaded.len(), "manifest")
    );
    if !components.skipped.is_empty() {
        summary.push_str(&format!(" ({} skipped)", components.skipped.len()));
    }
    lines.push(summary);
    for (path, reason) in &components.rejected {
        lines.push(format!("    rejected {}: {}", path.display(), reason));
    }

    lines.push(String::new());
    lines.push("Pages".to_string());
    for (i, url) in report.pages.iter().enumerate() {
        if wrote {
            lines.push(format!("{} {} → {}", format_index(i + 1), url, output_file(url)));
        } else {
            lines.push(format!("{} {}", format_index(i + 1), url));
        }
    }

    if !report.label_pages.is_empty() {
        lines.push(String::new());
        lines.push("Label pages".to_string());
        for url in &report.label_pages {
            lines.push(format!("    {url}"));
        }
    }

    if wrote {
        lines.push(String::new());
        if !report.files.is_empty() {
            lines.push(format!("Files: {}", report.files.join(", ")));
        }
        lines.push(format!(
            "Built {}, {}, copied {}",
            plural(report.pages.len(), "page"),
            plural(report.label_pages.len(), "label page"),
            plural(report.assets, "asset")
        ));
    }

    failure_lines(&report.failures, &mut lines);
    lines
}

/// Print build output to stdout.
pub fn print_build_output(report: &BuildReport, output_dir: Option<&Path>) {
    for line in format_build_output(report, output_dir.is_some()) {
        println!("{}", line);
    }
    if let Some(dir) = output_dir {
        println!("Site written to {}", dir.display());
    }
}
