//! Declarative attribute links.
//!
//! `[text](target){key=value key2="quoted value"}` becomes an element carrying
//! those attributes:
//!
//! - with any request or trigger attribute (`hx-post`, `hx-put`, `hx-patch`,
//!   `hx-delete`, `hx-trigger`, `data-method`) it is a `<button>`. A real
//!   target is kept as `data-href`; a placeholder target (`#` or empty) is dropped.
//! - otherwise it is an `<a href="target">`.
//!
//! Unquoted values run until the next `key=` token, so
//! `{hx-trigger=click delay:1s hx-post=/x}` gives `hx-trigger="click delay:1s"`.
//!
//! Image references (`![alt](src){…}`), inline code spans and fenced code
//! samples are left alone. Generated elements are registered as inline raw
//! literals so markdown conversion never touches them.

use super::{FenceState, RawBlocks, escape_html};

const ACTION_ATTRIBUTES: &[&str] = &[
    "hx-post",
    "hx-put",
    "hx-patch",
    "hx-delete",
    "hx-trigger",
    "data-method",
];

/// An attribute from a `{…}` list. Bare keys have no value.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: String,
    pub value: Option<String>,
}

pub fn rewrite(text: &str, blocks: &mut RawBlocks) -> String {
    if !text.contains("){") {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut fence = FenceState::default();
    for line in text.split_inclusive('\n') {
        if fence.observe(line) {
            out.push_str(line);
        } else {
            rewrite_line(line, blocks, &mut out);
        }
    }
    out
}

fn rewrite_line(line: &str, blocks: &mut RawBlocks, out: &mut String) {
    let bytes = line.as_bytes();
    let mut i = 0;
    let mut copied = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'`' => {
                let run = bytes[i..].iter().take_while(|&&b| b == b'`').count();
                let ticks = &line[i..i + run];
                i = match line[i + run..].find(ticks) {
                    Some(close) => i + run + close + run,
                    None => i + run,
                };
            }
            b'\\' => i += 2,
            b'[' if i == 0 || bytes[i - 1] != b'!' => match parse_span(&line[i..]) {
                Some(span) => {
                    out.push_str(&line[copied..i]);
                    let element = render_element(span.text, span.target, &span.attributes);
                    out.push_str(&blocks.push_inline(element));
                    i += span.len;
                    copied = i;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }
    out.push_str(&line[copied.min(line.len())..]);
}

struct Span<'a> {
    text: &'a str,
    target: &'a str,
    attributes: Vec<Attribute>,
    len: usize,
}

/// Parse `[text](target){attrs}` at the start of `s`.
fn parse_span(s: &str) -> Option<Span<'_>> {
    let text_end = s[1..].find([']', '['])? + 1;
    if s.as_bytes()[text_end] != b']' {
        return None;
    }
    let rest = s[text_end + 1..].strip_prefix('(')?;
    let target_end = find_target_end(rest)?;
    let target = rest[..target_end].trim();
    if target.contains(char::is_whitespace) {
        return None;
    }
    let rest = rest[target_end + 1..].strip_prefix('{')?;
    let list_end = find_list_end(rest)?;
    let attributes = parse_attributes(&rest[..list_end]).ok()?;
    if attributes.is_empty() {
        return None;
    }

    // `[` + text + `](` + target + `){` + list + `}`
    let len = text_end + 2 + target_end + 2 + list_end + 1;
    Some(Span {
        text: &s[1..text_end],
        target,
        attributes,
        len,
    })
}

/// Offset of the `)` closing a link target. Parentheses inside the target
/// must balance, as in `/wiki/Foo_(bar)`.
fn find_target_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            '\n' => return None,
            _ => {}
        }
    }
    None
}

/// Offset of the `}` closing an attribute list. A brace inside a quoted
/// value (`title="a}b"`) does not count.
fn find_list_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut prev = ' ';
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (_, '\n') => return None,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') if prev == '=' => quote = Some(c),
            (None, '}') => return Some(i),
            _ => {}
        }
        prev = c;
    }
    None
}

/// Tokenize a `key=value key2="v 2" flag` attribute list.
pub fn parse_attributes(list: &str) -> Result<Vec<Attribute>, String> {
    let mut attributes = Vec::new();
    let mut rest = list.trim();

    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let key = &rest[..key_end];
        if !is_valid_key(key) {
            return Err(format!("`{key}` is not a valid attribute name"));
        }
        rest = &rest[key_end..];

        let Some(after) = rest.strip_prefix('=') else {
            attributes.push(Attribute {
                key: key.to_string(),
                value: None,
            });
            rest = rest.trim_start();
            continue;
        };

        let (value, remaining) = match after.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let inner = &after[1..];
                let close = inner
                    .find(quote)
                    .ok_or_else(|| format!("unterminated quote in `{key}`"))?;
                (&inner[..close], &inner[close + 1..])
            }
            _ => {
                let end = unquoted_value_end(after);
                (after[..end].trim_end(), &after[end..])
            }
        };

        attributes.push(Attribute {
            key: key.to_string(),
            value: Some(value.to_string()),
        });
        rest = remaining.trim_start();
    }

    Ok(attributes)
}

/// Byte offset where an unquoted value stops: the start of the next
/// whitespace-separated word shaped like `key=`, or the end.
fn unquoted_value_end(s: &str) -> usize {
    let mut pos = s.find(char::is_whitespace).unwrap_or(s.len());
    while pos < s.len() {
        let word_start = s[pos..]
            .find(|c: char| !c.is_whitespace())
            .map_or(s.len(), |i| pos + i);
        if word_start == s.len() {
            return pos;
        }
        let word_end = s[word_start..]
            .find(char::is_whitespace)
            .map_or(s.len(), |i| word_start + i);
        let word = &s[word_start..word_end];
        if word.split_once('=').is_some_and(|(k, _)| is_valid_key(k)) {
            return pos;
        }
        pos = word_end;
    }
    pos
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || matches!(first, '_' | ':' | '@'))
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.' | '@'))
}

fn is_placeholder_target(target: &str) -> bool {
    target.is_empty() || target == "#"
}

fn render_element(text: &str, target: &str, attributes: &[Attribute]) -> String {
    let is_action = attributes
        .iter()
        .any(|a| ACTION_ATTRIBUTES.contains(&a.key.to_ascii_lowercase().as_str()));

    let mut html = String::new();
    if is_action {
        html.push_str("<button");
        if !attributes.iter().any(|a| a.key.eq_ignore_ascii_case("type")) {
            html.push_str(" type=\"button\"");
        }
        if !is_placeholder_target(target) {
            push_attribute(&mut html, "data-href", Some(target));
        }
    } else {
        html.push_str("<a");
        push_attribute(&mut html, "href", Some(target));
    }
    for attr in attributes {
        push_attribute(&mut html, &attr.key, attr.value.as_deref());
    }
    html.push('>');
    html.push_str(&escape_html(text));
    html.push_str(if is_action { "</button>" } else { "</a>" });
    html
}

fn push_attribute(html: &mut String, key: &str, value: Option<&str>) {
    html.push(' ');
    html.push_str(key);
    if let Some(value) = value {
        html.push_str("=\"");
        html.push_str(&escape_html(value));
        html.push('"');
    }
}
