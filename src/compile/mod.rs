//! Markdown document compilation.
//!
//! Turns a page body into HTML through a fixed sequence of passes:
//!
//! ```text
//! raw body
//!   │  (caller) directive::expand_children   :::children → :::html literal block
//!   ▼
//! shield::extract        :::html blocks → RAWBLOCKPH<n>ZZ tokens
//!   ▼
//! links::rewrite         [text](target){attrs} → RAWINLINEPH<n>ZZ tokens
//!   ▼
//! markdown_to_html       pulldown-cmark (tables, footnotes, strikethrough, task lists)
//!   ▼
//! shield::restore        tokens → literal markup
//! ```
//!
//! Directive expansion needs sibling page data, which a single document does
//! not have, so the build runs it before calling [`DocumentCompiler::compile`].
//!
//! Each pass is a line or character tokenizer. Fenced code samples (```` ``` ````
//! and `~~~`) are tracked by [`FenceState`] so directive-looking lines inside
//! a code sample are left alone.

pub mod directive;
pub mod links;
pub mod shield;

pub use directive::{ChildPageRecord, ListOptions, SortKey, expand_children};
pub use shield::{RawBlock, RawBlocks};

use crate::frontmatter::{self, FrontmatterError};
use maud::html;
use pulldown_cmark::{Event, Options, Parser, html as md_html};
use serde_yaml::Mapping;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("line {line}: `{directive}` directive opened inside another directive")]
    NestedDirective { line: usize, directive: String },
    #[error("line {line}: `{directive}` directive is never closed with `:::`")]
    UnterminatedDirective { line: usize, directive: String },
    #[error("line {line}: invalid directive option `{option}`: {reason}")]
    InvalidOption {
        line: usize,
        option: String,
        reason: String,
    },
    #[error("Frontmatter error: {0}")]
    Frontmatter(#[from] FrontmatterError),
}

/// Prose conversion settings.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    /// Pass raw HTML written directly in prose through to the output.
    /// When false it is escaped; shielded blocks are unaffected.
    pub html_passthrough: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            html_passthrough: true,
        }
    }
}

/// Output of [`DocumentCompiler::compile_with_frontmatter`].
#[derive(Debug, Clone)]
pub struct CompiledDocument {
    pub html: String,
    pub metadata: Mapping,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentCompiler {
    options: CompileOptions,
}

impl DocumentCompiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    /// Compile a markdown body (frontmatter already removed) to HTML.
    pub fn compile(&self, raw_body: &str) -> Result<String, CompileError> {
        let (shielded, mut blocks) = shield::extract(raw_body)?;
        let rewritten = links::rewrite(&shielded, &mut blocks);
        let converted = markdown_to_html(&rewritten, self.options.html_passthrough);
        let html = shield::restore(&converted, &blocks);

        let leftover = shield::unrestored(&html);
        if !leftover.is_empty() {
            tracing::warn!(tokens = ?leftover, "placeholder tokens survived restore");
        }
        Ok(html)
    }

    /// Parse frontmatter, then compile the remaining body.
    pub fn compile_with_frontmatter(
        &self,
        raw_text: &str,
    ) -> Result<CompiledDocument, CompileError> {
        let doc = frontmatter::parse(raw_text)?;
        let html = self.compile(&doc.body)?;
        Ok(CompiledDocument {
            html,
            metadata: doc.frontmatter,
        })
    }
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

fn markdown_to_html(source: &str, html_passthrough: bool) -> String {
    let parser = Parser::new_ext(source, markdown_options());
    let mut out = String::with_capacity(source.len() + source.len() / 2);
    if html_passthrough {
        md_html::push_html(&mut out, parser);
    } else {
        let escaped = parser.map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });
        md_html::push_html(&mut out, escaped);
    }
    out
}

/// HTML-escape text for element content or a quoted attribute value.
pub(crate) fn escape_html(text: &str) -> String {
    html! { (text) }.into_string()
}

// ============================================================================
// Line classification shared by the passes
// ============================================================================

pub(crate) const CLOSE_MARKER: &str = ":::";
pub(crate) const RAW_MARKER: &str = ":::html";
pub(crate) const CHILDREN_MARKER: &str = ":::children";

/// Directive opener found on a line, with the text after the marker.
#[derive(Debug, PartialEq)]
pub(crate) enum Opener<'a> {
    Raw,
    Children(&'a str),
}

impl Opener<'_> {
    pub(crate) fn marker(&self) -> &'static str {
        match self {
            Opener::Raw => RAW_MARKER,
            Opener::Children(_) => CHILDREN_MARKER,
        }
    }
}

pub(crate) fn opener(line: &str) -> Option<Opener<'_>> {
    let trimmed = line.trim();
    if trimmed == RAW_MARKER {
        return Some(Opener::Raw);
    }
    let rest = trimmed.strip_prefix(CHILDREN_MARKER)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(Opener::Children(rest.trim()))
    } else {
        None
    }
}

pub(crate) fn is_closer(line: &str) -> bool {
    line.trim() == CLOSE_MARKER
}

/// Tracks whether lines belong to a fenced code sample.
#[derive(Debug, Default)]
pub(crate) struct FenceState {
    open: Option<(char, usize)>,
}

impl FenceState {
    /// Feed the next line. Returns true when the line is part of a code
    /// sample, fences included.
    pub(crate) fn observe(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();
        let fence = fence_run(trimmed);
        match (self.open, fence) {
            (Some((ch, len)), Some((c, n)))
                if c == ch && n >= len && trimmed[n..].trim().is_empty() =>
            {
                self.open = None;
                true
            }
            (Some(_), _) => true,
            (None, Some(run)) => {
                self.open = Some(run);
                true
            }
            (None, None) => false,
        }
    }
}

fn fence_run(line: &str) -> Option<(char, usize)> {
    let c = line.chars().next()?;
    if c != '`' && c != '~' {
        return None;
    }
    let n = line.chars().take_while(|&x| x == c).count();
    (n >= 3).then_some((c, n))
}
