//! Built-in structural tags: page chrome rendered from the context.
//!
//! These sit between the scalar fields and the tag registry in resolution
//! order, so a plugin cannot shadow `{{content}}` or `{{nav}}`.

use super::context::TemplateContext;
use crate::index;
use maud::{Markup, html};

/// Names handled here.
pub const STRUCTURAL_TAGS: &[&str] = &[
    "content",
    "nav",
    "head",
    "footer",
    "css",
    "js",
    "page-header",
    "post-header",
];

pub fn render(name: &str, ctx: &TemplateContext) -> Option<String> {
    let markup = match name {
        "content" => return Some(ctx.content.clone()),
        "nav" => render_nav(ctx),
        "head" => render_head(ctx),
        "footer" => render_footer(ctx),
        "css" => render_css(ctx),
        "js" => render_js(ctx),
        "page-header" => render_page_header(ctx),
        "post-header" => render_post_header(ctx),
        _ => return None,
    };
    Some(markup.into_string())
}

/// Site navigation. Empty when no page is in the nav, so `{{#if nav}}`
/// can wrap surrounding chrome.
pub fn render_nav(ctx: &TemplateContext) -> Markup {
    let entries = &ctx.site.nav;
    if entries.is_empty() {
        return html! {};
    }
    html! {
        nav.site-nav {
            ul {
                @for entry in entries {
                    @let is_current = entry.url == ctx.url
                        || (entry.url != "/" && ctx.url.starts_with(&entry.url));
                    li class=[is_current.then_some("current")] {
                        a href=(ctx.href(&entry.url)) { (entry.title) }
                    }
                }
            }
        }
    }
}

fn render_head(ctx: &TemplateContext) -> Markup {
    let title = if ctx.site.site_name.is_empty() || ctx.title == ctx.site.site_name {
        ctx.title.clone()
    } else {
        format!("{} | {}", ctx.title, ctx.site.site_name)
    };
    let description = if ctx.description.is_empty() {
        ctx.site.description.as_str()
    } else {
        ctx.description.as_str()
    };
    html! {
        meta charset="UTF-8";
        meta name="viewport" content="width=device-width, initial-scale=1.0";
        title { (title) }
        @if !description.is_empty() {
            meta name="description" content=(description);
        }
        @if !ctx.keywords.is_empty() {
            meta name="keywords" content=(ctx.keywords.join(", "));
        }
        @if !ctx.author.is_empty() {
            meta name="author" content=(ctx.author);
        }
        @if let Some(url) = ctx.absolute_url(&ctx.url) {
            link rel="canonical" href=(url);
        }
        (render_css(ctx))
    }
}

fn render_footer(ctx: &TemplateContext) -> Markup {
    html! {
        footer.site-footer {
            @if !ctx.site.site_name.is_empty() {
                p { (ctx.site.site_name) }
            }
            @if !ctx.site.labels.is_empty() {
                nav.label-index {
                    @for label in &ctx.site.labels {
                        a href=(ctx.href(&index::label_url(label))) { (label) } " "
                    }
                }
            }
        }
    }
}

fn render_css(ctx: &TemplateContext) -> Markup {
    html! {
        @for file in &ctx.site.css_files {
            link rel="stylesheet" href=(ctx.href(file));
        }
    }
}

fn render_js(ctx: &TemplateContext) -> Markup {
    html! {
        @for file in &ctx.site.js_files {
            script src=(ctx.href(file)) defer {}
        }
    }
}

/// Header for everything that is not a post.
fn render_page_header(ctx: &TemplateContext) -> Markup {
    if ctx.is_post() {
        return html! {};
    }
    html! {
        header.page-header {
            h1 { (ctx.title) }
            @if !ctx.description.is_empty() {
                p.description { (ctx.description) }
            }
        }
    }
}

/// Header for `type: post` pages: byline, date and label badges.
fn render_post_header(ctx: &TemplateContext) -> Markup {
    if !ctx.is_post() {
        return html! {};
    }
    html! {
        header.post-header {
            h1 { (ctx.title) }
            p.byline {
                @if let Some(date) = ctx.date {
                    time datetime=(date.format("%Y-%m-%d")) {
                        (date.format("%B %-d, %Y"))
                    }
                }
                @if !ctx.author.is_empty() {
                    " " span.author { (ctx.author) }
                }
            }
            @if !ctx.labels.is_empty() {
                ul.labels {
                    @for label in &ctx.labels {
                        li {
                            a.badge href=(ctx.href(&index::label_url(label))) { (label) }
                        }
                    }
                }
            }
        }
    }
}
