//! Placeholder substitution over a skeleton.
//!
//! Two passes:
//!
//! 1. `{{#if name}}…{{/if}}` keeps its body when `name` resolves to a
//!    non-empty value and drops it otherwise. Blocks do not nest; an `{{#if`
//!    without a matching `{{/if}}` is left as written.
//! 2. `{{name}}` is replaced by its resolved value. Unknown names stay in the
//!    output verbatim. Substituted values are never scanned again, so a value
//!    that itself contains `{{…}}` is emitted as is.
//!
//! A name resolves against the context's scalar fields first, then the
//! structural tags, then the tag registry.

use super::context::TemplateContext;
use super::structural;
use crate::compile::escape_html;
use crate::tags::TagRegistry;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const IF_OPEN: &str = "{{#if ";
const IF_CLOSE: &str = "{{/if}}";

/// Scalar names read straight off the context. Values are HTML-escaped.
pub const SCALAR_TAGS: &[&str] = &[
    "title",
    "description",
    "keywords",
    "author",
    "date",
    "date-iso",
    "category",
    "labels",
    "type",
    "url",
    "base",
    "site-name",
    "site-url",
];

pub fn process(skeleton: &str, ctx: &TemplateContext, registry: &TagRegistry) -> String {
    let conditioned = resolve_conditionals(skeleton, ctx, registry);
    substitute(&conditioned, ctx, registry)
}

/// Resolve a single tag name, or `None` when nothing claims it.
pub fn resolve_tag(name: &str, ctx: &TemplateContext, registry: &TagRegistry) -> Option<String> {
    scalar(name, ctx)
        .map(|value| escape_html(&value))
        .or_else(|| structural::render(name, ctx))
        .or_else(|| registry.resolve(name, ctx))
}

fn scalar(name: &str, ctx: &TemplateContext) -> Option<String> {
    let value = match name {
        "title" => ctx.title.clone(),
        "description" => ctx.description.clone(),
        "keywords" => ctx.keywords.join(", "),
        "author" => ctx.author.clone(),
        "date" => ctx
            .date
            .map(|d| d.format("%B %-d, %Y").to_string())
            .unwrap_or_default(),
        "date-iso" => ctx
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        "category" => ctx.category.clone(),
        "labels" => ctx.labels.join(", "),
        "type" => ctx.page_type.clone(),
        "url" => ctx.href(&ctx.url),
        "base" => ctx.base_path().to_string(),
        "site-name" => ctx.site.site_name.clone(),
        "site-url" => ctx.site.site_url.clone(),
        _ => return None,
    };
    Some(value)
}

fn is_truthy(name: &str, ctx: &TemplateContext, registry: &TagRegistry) -> bool {
    resolve_tag(name, ctx, registry).is_some_and(|value| !value.is_empty())
}

fn resolve_conditionals(skeleton: &str, ctx: &TemplateContext, registry: &TagRegistry) -> String {
    let mut out = String::with_capacity(skeleton.len());
    let mut rest = skeleton;

    while let Some(start) = rest.find(IF_OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + IF_OPEN.len()..];
        let Some((name, body_and_rest)) = after_open.split_once(CLOSE) else {
            rest = &rest[start..];
            break;
        };
        let Some(body_end) = body_and_rest.find(IF_CLOSE) else {
            rest = &rest[start..];
            break;
        };
        if is_truthy(name.trim(), ctx, registry) {
            out.push_str(&body_and_rest[..body_end]);
        }
        rest = &body_and_rest[body_end + IF_CLOSE.len()..];
    }

    // Whatever is left, including an unterminated `{{#if`, is copied as is.
    out.push_str(rest);
    out
}

fn substitute(text: &str, ctx: &TemplateContext, registry: &TagRegistry) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            rest = &rest[start..];
            break;
        };
        let raw = &after_open[..end];
        let token_len = OPEN.len() + end + CLOSE.len();
        let name = raw.trim();

        match is_tag_name(name)
            .then(|| resolve_tag(name, ctx, registry))
            .flatten()
        {
            Some(value) => {
                out.push_str(&value);
                rest = &rest[start + token_len..];
            }
            None => {
                // Keep the first brace and rescan, so `{{{title}}` still
                // finds the inner token.
                out.push('{');
                rest = &rest[start + 1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Tag names are words of letters, digits, `-`, `_`, `.` and `:`.
fn is_tag_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagDefinition;
    use crate::template::context::SiteContext;
    use crate::types::NavEntry;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn ctx() -> TemplateContext {
        TemplateContext {
            title: "Home".to_string(),
            content: "<h1>Hi</h1>".to_string(),
            ..TemplateContext::default()
        }
    }

    fn with_nav(mut ctx: TemplateContext) -> TemplateContext {
        ctx.site = Arc::new(SiteContext {
            nav: vec![NavEntry {
                title: "About".to_string(),
                url: "/about/".to_string(),
                order: 1,
            }],
            ..SiteContext::default()
        });
        ctx
    }

    #[test]
    fn title_and_content() {
        let out = process(
            "<title>{{title}}</title>{{content}}",
            &ctx(),
            &TagRegistry::default(),
        );
        assert_eq!(out, "<title>Home</title><h1>Hi</h1>");
    }

    #[test]
    fn conditional_follows_nav() {
        let registry = TagRegistry::default();
        let skeleton = "{{#if nav}}<n>{{/if}}";
        assert_eq!(process(skeleton, &ctx(), &registry), "");
        assert_eq!(process(skeleton, &with_nav(ctx()), &registry), "<n>");
    }

    #[test]
    fn unknown_tag_stays_literal() {
        let out = process("a {{nope}} b", &ctx(), &TagRegistry::default());
        assert_eq!(out, "a {{nope}} b");
    }

    #[test]
    fn unterminated_conditional_stays_literal() {
        let out = process("x {{#if title}}kept", &ctx(), &TagRegistry::default());
        assert_eq!(out, "x {{#if title}}kept");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let mut ctx = ctx();
        ctx.content = "literal {{title}}".to_string();
        let out = process("{{content}}", &ctx, &TagRegistry::default());
        assert_eq!(out, "literal {{title}}");
    }

    #[test]
    fn scalar_values_are_escaped() {
        let mut ctx = ctx();
        ctx.title = "<script>".to_string();
        let out = process("{{title}}", &ctx, &TagRegistry::default());
        assert_eq!(out, "&lt;script&gt;");
    }

    #[test]
    fn dates_render_two_ways() {
        let mut ctx = ctx();
        ctx.date = NaiveDate::from_ymd_opt(2024, 1, 5);
        let out = process("{{date}} / {{date-iso}}", &ctx, &TagRegistry::default());
        assert_eq!(out, "January 5, 2024 / 2024-01-05");
    }

    #[test]
    fn registry_tags_resolve_last() {
        let mut registry = TagRegistry::default();
        registry.register([
            TagDefinition::exact("shout", |ctx, _| ctx.title.to_uppercase()),
            TagDefinition::exact("title", |_, _| "shadowed".to_string()),
        ]);
        let out = process("{{shout}} {{title}}", &ctx(), &registry);
        assert_eq!(out, "HOME Home");
    }

    #[test]
    fn empty_registry_value_is_falsy() {
        let mut registry = TagRegistry::default();
        registry.register([TagDefinition::exact("blank", |_, _| String::new())]);
        let out = process("[{{#if blank}}x{{/if}}]", &ctx(), &registry);
        assert_eq!(out, "[]");
    }

    #[test]
    fn whitespace_value_is_truthy() {
        let mut registry = TagRegistry::default();
        registry.register([TagDefinition::exact("gap", |_, _| " ".to_string())]);
        let out = process("[{{#if gap}}x{{/if}}]", &ctx(), &registry);
        assert_eq!(out, "[x]");
    }

    #[test]
    fn whitespace_inside_braces_is_trimmed() {
        let out = process("{{ title }}", &ctx(), &TagRegistry::default());
        assert_eq!(out, "Home");
    }

    #[test]
    fn stray_braces_survive() {
        let out = process("{{ not a tag }} {{{title}}", &ctx(), &TagRegistry::default());
        assert_eq!(out, "{{ not a tag }} {Home");
    }
}
