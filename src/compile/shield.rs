//! Literal-block protection around markdown conversion.
//!
//! A `:::html` … `:::` block is lifted out of the text before conversion and
//! replaced with a token on a paragraph of its own. After conversion the token
//! (bare, or wrapped in the `<p>` the converter put around it) is swapped back
//! for the untouched markup.
//!
//! Inline literals use a separate token family. The attribute-link rewriter
//! registers its generated elements this way so they survive strict mode.

use super::{CompileError, FenceState, Opener, is_closer, opener};

const BLOCK_PREFIX: &str = "RAWBLOCKPH";
const INLINE_PREFIX: &str = "RAWINLINEPH";
const TOKEN_SUFFIX: &str = "ZZ";

#[derive(Debug, Clone, PartialEq)]
pub struct RawBlock {
    pub id: String,
    pub literal: String,
    pub inline: bool,
}

/// Literals lifted out during one compile pass, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RawBlocks {
    blocks: Vec<RawBlock>,
    next_block: usize,
    next_inline: usize,
}

impl RawBlocks {
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawBlock> {
        self.blocks.iter()
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.blocks
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.literal.as_str())
    }

    /// Register a block-level literal and return its token.
    pub fn push_block(&mut self, literal: String) -> String {
        let id = format!("{BLOCK_PREFIX}{}{TOKEN_SUFFIX}", self.next_block);
        self.next_block += 1;
        self.blocks.push(RawBlock {
            id: id.clone(),
            literal,
            inline: false,
        });
        id
    }

    /// Register an inline literal and return its token.
    pub fn push_inline(&mut self, literal: String) -> String {
        let id = format!("{INLINE_PREFIX}{}{TOKEN_SUFFIX}", self.next_inline);
        self.next_inline += 1;
        self.blocks.push(RawBlock {
            id: id.clone(),
            literal,
            inline: true,
        });
        id
    }
}

/// Replace every `:::html` block with a placeholder token.
///
/// Text without a block comes back unchanged. A directive opener inside an
/// open block, or a block left open at the end of the text, is an error.
pub fn extract(text: &str) -> Result<(String, RawBlocks), CompileError> {
    let mut blocks = RawBlocks::default();
    if !text.contains(super::RAW_MARKER) {
        return Ok((text.to_string(), blocks));
    }

    let mut out = String::with_capacity(text.len());
    let mut fence = FenceState::default();
    // (line the block opened on, collected literal)
    let mut open: Option<(usize, String)> = None;

    for (idx, line) in text.split_inclusive('\n').enumerate() {
        let line_no = idx + 1;

        if let Some((start, literal)) = open.as_mut() {
            if is_closer(line) {
                let literal = std::mem::take(literal);
                let literal = literal.strip_suffix('\n').unwrap_or(&literal).to_string();
                let token = blocks.push_block(literal);
                out.push('\n');
                out.push_str(&token);
                out.push_str("\n\n");
                open = None;
            } else if let Some(nested) = opener(line) {
                tracing::debug!(outer = *start, "nested directive inside literal block");
                return Err(CompileError::NestedDirective {
                    line: line_no,
                    directive: nested.marker().to_string(),
                });
            } else {
                literal.push_str(line);
            }
            continue;
        }

        if fence.observe(line) {
            out.push_str(line);
        } else if opener(line) == Some(Opener::Raw) {
            open = Some((line_no, String::new()));
        } else {
            out.push_str(line);
        }
    }

    if let Some((start, _)) = open {
        return Err(CompileError::UnterminatedDirective {
            line: start,
            directive: super::RAW_MARKER.to_string(),
        });
    }

    Ok((out, blocks))
}

/// Put every literal back in place of its token.
pub fn restore(html: &str, blocks: &RawBlocks) -> String {
    let mut out = html.to_string();
    for block in blocks.iter() {
        if !block.inline {
            let wrapped = format!("<p>{}</p>", block.id);
            out = out.replace(&wrapped, &block.literal);
        }
        out = out.replace(&block.id, &block.literal);
    }
    out
}

/// Tokens still present in `html`. Empty after a correct restore.
pub fn unrestored(html: &str) -> Vec<String> {
    let mut found = Vec::new();
    for prefix in [BLOCK_PREFIX, INLINE_PREFIX] {
        let mut rest = html;
        while let Some(pos) = rest.find(prefix) {
            let after = &rest[pos + prefix.len()..];
            let digits = after.chars().take_while(char::is_ascii_digit).count();
            if digits > 0 && after[digits..].starts_with(TOKEN_SUFFIX) {
                found.push(format!("{prefix}{}{TOKEN_SUFFIX}", &after[..digits]));
            }
            rest = after;
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn text_without_blocks_is_unchanged() {
        let text = "# Title\n\nSome *prose*.\n";
        let (out, blocks) = extract(text).unwrap();
        assert_eq!(out, text);
        assert!(blocks.is_empty());
    }

    #[test]
    fn blocks_get_sequential_tokens() {
        let text = ":::html\n<a>\n:::\nmid\n:::html\n<b>\n:::\n";
        let (out, blocks) = extract(text).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks.get("RAWBLOCKPH0ZZ"), Some("<a>"));
        assert_eq!(blocks.get("RAWBLOCKPH1ZZ"), Some("<b>"));
        assert!(out.contains("RAWBLOCKPH0ZZ"));
        assert!(out.contains("mid"));
        assert!(!out.contains("<a>"));
    }

    #[test]
    fn counter_resets_per_call() {
        let text = ":::html\nx\n:::\n";
        let (_, first) = extract(text).unwrap();
        let (_, second) = extract(text).unwrap();
        assert_eq!(first.iter().next().unwrap().id, "RAWBLOCKPH0ZZ");
        assert_eq!(second.iter().next().unwrap().id, "RAWBLOCKPH0ZZ");
    }

    #[test]
    fn multi_line_literal_preserved() {
        let text = ":::html\n<ul>\n  <li>one</li>\n\n  <li>two</li>\n</ul>\n:::";
        let (_, blocks) = extract(text).unwrap();
        assert_eq!(
            blocks.get("RAWBLOCKPH0ZZ"),
            Some("<ul>\n  <li>one</li>\n\n  <li>two</li>\n</ul>")
        );
    }

    #[test]
    fn directive_inside_code_sample_is_ignored() {
        let text = "```\n:::html\n<b>\n:::\n```\n";
        let (out, blocks) = extract(text).unwrap();
        assert!(blocks.is_empty());
        assert_eq!(out, text);
    }

    #[test]
    fn nested_directive_fails() {
        let text = ":::html\n<div>\n:::children\n:::\n";
        let err = extract(text).unwrap_err();
        assert!(matches!(err, CompileError::NestedDirective { line: 3, .. }));
    }

    #[test]
    fn restore_handles_wrapped_and_bare_tokens() {
        let mut blocks = RawBlocks::default();
        let a = blocks.push_block("<x/>".into());
        let b = blocks.push_block("<y/>".into());
        let html = format!("<p>{a}</p>\n<div>{b}</div>");
        assert_eq!(restore(&html, &blocks), "<x/>\n<div><y/></div>");
    }

    #[test]
    fn inline_tokens_keep_surrounding_paragraph() {
        let mut blocks = RawBlocks::default();
        let t = blocks.push_inline("<a>go</a>".into());
        let html = format!("<p>{t}</p>");
        assert_eq!(restore(&html, &blocks), "<p><a>go</a></p>");
    }

    #[test]
    fn ten_blocks_do_not_collide() {
        let text: String = (0..12).map(|i| format!(":::html\n<i{i}>\n:::\n")).collect();
        let (out, blocks) = extract(&text).unwrap();
        let restored = restore(&out, &blocks);
        for i in 0..12 {
            assert!(restored.contains(&format!("<i{i}>")));
        }
        assert!(unrestored(&restored).is_empty());
    }

    #[test]
    fn unrestored_reports_leftovers() {
        let html = "<p>RAWBLOCKPH3ZZ</p> RAWINLINEPH0ZZ RAWBLOCKPHxZZ";
        assert_eq!(unrestored(html), ["RAWBLOCKPH3ZZ", "RAWINLINEPH0ZZ"]);
    }

    proptest! {
        #[test]
        fn k_blocks_yield_k_tokens_and_restore(literals in prop::collection::vec("[a-z<>/ ]{1,12}", 0..6)) {
            let text: String = literals
                .iter()
                .map(|lit| format!("para\n\n:::html\n{lit}\n:::\n\n"))
                .collect();
            let (out, blocks) = extract(&text).unwrap();
            prop_assert_eq!(blocks.len(), literals.len());

            let html = crate::compile::markdown_to_html(&out, true);
            let restored = restore(&html, &blocks);
            for lit in &literals {
                prop_assert!(restored.contains(lit.as_str()));
            }
            prop_assert!(unrestored(&restored).is_empty());
        }
    }
}
