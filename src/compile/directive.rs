//! The `:::children` repeating-list directive.
//!
//! ```text
//! :::children sort=date-desc limit=3 class="cards wide" label=travel
//! <li><a href="{{url}}">{{title}}</a> <time>{{date}}</time></li>
//! :::
//! ```
//!
//! The option line picks, orders and trims the sibling pages; the body is a
//! micro-template rendered once per page. An empty body falls back to a
//! built-in card. The expansion is emitted as a `:::html` literal block so the
//! markdown pass leaves it alone. No matching pages means no output at all.
//!
//! ## Options
//!
//! | Option | Values | Default |
//! |--------|--------|---------|
//! | `sort` | `date-desc`, `date-asc`, `order`, `title` | `date-desc` |
//! | `limit` | non-negative integer | none |
//! | `class` | extra CSS classes on the wrapper | none |
//! | `category`, `label`, `type` | case-insensitive filters | none |
//!
//! Pages without a date sort as the earliest.
//!
//! Existing `:::html` blocks and fenced code samples are copied through
//! untouched; a `:::children` line inside either is not a directive.

use super::links::parse_attributes;
use super::{CompileError, FenceState, Opener, escape_html, is_closer, opener};
use chrono::NaiveDate;

/// Read-only projection of a sibling page's metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildPageRecord {
    pub title: String,
    pub url: String,
    pub description: String,
    pub date: Option<NaiveDate>,
    pub category: String,
    pub labels: Vec<String>,
    pub author: String,
    pub page_type: String,
    pub short_uri: String,
    pub order: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    DateDesc,
    DateAsc,
    Order,
    Title,
}

impl SortKey {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "date-desc" => Some(Self::DateDesc),
            "date-asc" => Some(Self::DateAsc),
            "order" => Some(Self::Order),
            "title" => Some(Self::Title),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    pub sort: SortKey,
    pub limit: Option<usize>,
    pub class: Option<String>,
    pub category: Option<String>,
    pub label: Option<String>,
    pub page_type: Option<String>,
}

impl ListOptions {
    /// Parse the text after `:::children`. `line` is used for error reporting.
    pub fn parse(raw: &str, line: usize) -> Result<Self, CompileError> {
        let invalid = |option: &str, reason: String| CompileError::InvalidOption {
            line,
            option: option.to_string(),
            reason,
        };

        let attributes = parse_attributes(raw).map_err(|reason| invalid(raw, reason))?;
        let mut options = ListOptions::default();
        for attr in attributes {
            let value = attr.value.unwrap_or_default();
            match attr.key.as_str() {
                "sort" => {
                    options.sort = SortKey::parse(&value).ok_or_else(|| {
                        invalid("sort", format!("unknown sort `{value}`"))
                    })?;
                }
                "limit" => {
                    let n = value
                        .parse()
                        .map_err(|_| invalid("limit", format!("`{value}` is not a number")))?;
                    options.limit = Some(n);
                }
                "class" => options.class = Some(value),
                "category" => options.category = Some(value),
                "label" => options.label = Some(value),
                "type" => options.page_type = Some(value),
                other => return Err(invalid(other, "unknown option".to_string())),
            }
        }
        Ok(options)
    }

    /// Filter, sort and trim `siblings`.
    pub fn select<'a>(&self, siblings: &'a [ChildPageRecord]) -> Vec<&'a ChildPageRecord> {
        let accepts = |wanted: &Option<String>, actual: &str| {
            wanted
                .as_deref()
                .is_none_or(|w| w.eq_ignore_ascii_case(actual))
        };

        let mut picked: Vec<&ChildPageRecord> = siblings
            .iter()
            .filter(|r| accepts(&self.category, &r.category))
            .filter(|r| accepts(&self.page_type, &r.page_type))
            .filter(|r| {
                self.label.as_deref().is_none_or(|label| {
                    r.labels.iter().any(|l| l.eq_ignore_ascii_case(label))
                })
            })
            .collect();

        match self.sort {
            SortKey::DateDesc => picked.sort_by(|a, b| b.date.cmp(&a.date)),
            SortKey::DateAsc => picked.sort_by(|a, b| a.date.cmp(&b.date)),
            SortKey::Order => picked.sort_by_key(|r| r.order),
            SortKey::Title => picked.sort_by_key(|r| r.title.to_lowercase()),
        }

        if let Some(limit) = self.limit {
            picked.truncate(limit);
        }
        picked
    }
}

const DEFAULT_ITEM_TEMPLATE: &str = concat!(
    r#"<article class="child-page">"#,
    r#"<h3><a href="{{url}}">{{title}}</a></h3>"#,
    r#"<p>{{description}}</p>"#,
    r#"<time datetime="{{date-iso}}">{{date}}</time>"#,
    "</article>",
);

/// Micro-template placeholders, longest first. A name only matches when
/// followed directly by `}}`.
const PLACEHOLDERS: &[&str] = &[
    "labels-as-badges",
    "description",
    "short-uri",
    "category",
    "date-iso",
    "author",
    "labels",
    "title",
    "date",
    "type",
    "url",
];

/// Expand every `:::children` directive in `text` against `siblings`.
pub fn expand_children(text: &str, siblings: &[ChildPageRecord]) -> Result<String, CompileError> {
    if !text.contains(super::CHILDREN_MARKER) {
        return Ok(text.to_string());
    }

    let mut out = String::with_capacity(text.len());
    let mut fence = FenceState::default();
    // Inside a `:::html` block, copied through as the shield will see it.
    let mut in_literal = false;
    // (opening line, options, collected body)
    let mut open: Option<(usize, ListOptions, String)> = None;

    for (idx, line) in text.split_inclusive('\n').enumerate() {
        let line_no = idx + 1;

        if let Some((_, options, body)) = open.as_mut() {
            if is_closer(line) {
                out.push_str(&render_list(options, body, siblings));
                open = None;
            } else if let Some(nested) = opener(line) {
                return Err(CompileError::NestedDirective {
                    line: line_no,
                    directive: nested.marker().to_string(),
                });
            } else {
                body.push_str(line);
            }
            continue;
        }

        if in_literal {
            in_literal = !is_closer(line);
            out.push_str(line);
            continue;
        }
        if fence.observe(line) {
            out.push_str(line);
            continue;
        }
        match opener(line) {
            Some(Opener::Children(raw)) => {
                open = Some((line_no, ListOptions::parse(raw, line_no)?, String::new()));
            }
            Some(Opener::Raw) => {
                in_literal = true;
                out.push_str(line);
            }
            None => out.push_str(line),
        }
    }

    if let Some((start, _, _)) = open {
        return Err(CompileError::UnterminatedDirective {
            line: start,
            directive: super::CHILDREN_MARKER.to_string(),
        });
    }
    Ok(out)
}

fn render_list(options: &ListOptions, body: &str, siblings: &[ChildPageRecord]) -> String {
    let items = options.select(siblings);
    if items.is_empty() {
        return String::new();
    }

    let template = match body.trim() {
        "" => DEFAULT_ITEM_TEMPLATE,
        custom => custom,
    };
    let class = match options.class.as_deref().map(str::trim) {
        Some(extra) if !extra.is_empty() => format!("child-pages {}", escape_html(extra)),
        _ => "child-pages".to_string(),
    };

    let mut html = format!("{}\n<div class=\"{class}\">\n", super::RAW_MARKER);
    for item in items {
        html.push_str(&defuse_markers(&render_item(template, item)));
        html.push('\n');
    }
    html.push_str("</div>\n");
    html.push_str(super::CLOSE_MARKER);
    html.push('\n');
    html
}

/// Page data can render a line that reads as `:::` or an opener, which
/// would end or nest the literal block. Its first colon becomes a character
/// reference, so the browser shows the same text.
fn defuse_markers(item: &str) -> String {
    item.split_inclusive('\n')
        .map(|line| {
            if is_closer(line) || opener(line).is_some() {
                line.replacen(':', "&#58;", 1)
            } else {
                line.to_string()
            }
        })
        .collect()
}

/// Substitute micro-template placeholders for one record.
pub fn render_item(template: &str, record: &ChildPageRecord) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let hit = PLACEHOLDERS.iter().find(|name| {
            after
                .strip_prefix(**name)
                .is_some_and(|tail| tail.starts_with("}}"))
        });
        match hit {
            Some(name) => {
                out.push_str(&field_value(record, name));
                rest = &after[name.len() + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn field_value(record: &ChildPageRecord, name: &str) -> String {
    match name {
        "title" => text(&record.title),
        "url" => text(&record.url),
        "description" => text(&record.description),
        "date" => record.date.map(format_date_words).unwrap_or_default(),
        "date-iso" => record
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        "category" => text(&record.category),
        "labels" => text(&record.labels.join(", ")),
        "labels-as-badges" => record
            .labels
            .iter()
            .map(|l| format!("<span class=\"badge\">{}</span>", text(l)))
            .collect::<Vec<_>>()
            .join(" "),
        "author" => text(&record.author),
        "type" => text(&record.page_type),
        "short-uri" => text(&record.short_uri),
        _ => String::new(),
    }
}

/// Escaped, single-line text for a micro-template slot.
fn text(value: &str) -> String {
    escape_html(&value.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// `March 1, 2024`
pub fn format_date_words(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}
