//! # Quire
//!
//! A static site compiler for markdown content. Each document carries a YAML
//! frontmatter block; its body is markdown with a few extensions, and the
//! compiled page is poured into an HTML skeleton whose `{{tags}}` are filled
//! from the page, the site, and a pluggable tag registry.
//!
//! # Architecture: Two Phases
//!
//! ```text
//! 1. Scan    content/  →  Site       (every document's metadata, nav, labels)
//! 2. Build   Site      →  dist/      (compiled pages, label pages, site files)
//! ```
//!
//! Phase 2 only starts once every document's frontmatter is known, so a
//! `:::children` directive on an index page can list siblings that appear
//! later in path order.
//!
//! # Document Pipeline
//!
//! ```text
//! source ─▶ frontmatter ─▶ expand :::children ─▶ shield :::html blocks
//!        ─▶ rewrite attribute links ─▶ markdown ─▶ restore raw blocks
//!        ─▶ template skeleton ─▶ page HTML
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Phase 1: walks the source directory, parses frontmatter, builds nav and labels |
//! | [`build`] | Phase 2: compiles pages in parallel, renders label pages, writes the site |
//! | [`frontmatter`] | Splits a document into YAML frontmatter and body, and serializes it back |
//! | [`compile`] | Markdown to HTML: raw-block shielding, directives, attribute links |
//! | [`template`] | Skeleton store and `{{tag}}` substitution |
//! | [`tags`] | Tag registry: built-in tags and TOML component manifests |
//! | [`index`] | Page index, `sitemap.xml`, `robots.txt` and `llms.txt` |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`types`] | Page metadata shared by every phase |
//! | [`naming`] | `NNN-name` filename convention, slugs and URLs |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Maud For Generated Markup
//!
//! Markup the compiler produces itself (navigation, page headers, label pages,
//! built-in tags) is written with [Maud](https://maud.lambda.xyz/), so every
//! interpolated value is escaped at compile time. User skeletons stay plain
//! HTML files with `{{tag}}` holes.
//!
//! ## Raw Blocks Are Opaque
//!
//! `:::html` blocks, including the ones `:::children` expands into, are
//! replaced by placeholder tokens before links are rewritten and restored
//! byte-for-byte after markdown conversion. Fenced code samples are left to
//! the markdown converter; directive lines inside them are ignored.
//!
//! ## Components Are Data
//!
//! Custom tags are declared in `components/*.toml` rather than loaded as
//! code. A manifest that fails to parse is reported and skipped; the build
//! carries on with the tags that did load.
//!
//! ## NNN-Prefix Ordering
//!
//! Files and directories use a numeric prefix (`010-`, `020-`) for explicit
//! navigation order, parsed by [`naming::parse_entry_name`]. Pages without a
//! prefix are published but hidden from navigation unless their frontmatter
//! says otherwise.

pub mod build;
pub mod compile;
pub mod config;
pub mod frontmatter;
pub mod index;
pub mod naming;
pub mod output;
pub mod scan;
pub mod tags;
pub mod template;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
