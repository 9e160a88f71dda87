//! Compiled-in tags, available to every skeleton.
//!
//! | Tag | Renders |
//! |-----|---------|
//! | `year` | current year |
//! | `reading-time` | `N min read` from the compiled body |
//! | `hero` | `<img class="hero">` from the `hero` frontmatter key |
//! | `label-cloud` | links to every label page on the site |
//! | `canonical` | `<link rel="canonical">` when the site URL is set |
//! | `fm.<key>` | any frontmatter value, escaped |

use super::TagDefinition;
use crate::compile::escape_html;
use crate::frontmatter;
use crate::index;
use crate::template::TemplateContext;
use chrono::Datelike;
use maud::html;

const WORDS_PER_MINUTE: usize = 200;
const FRONTMATTER_PREFIX: &str = "fm.";

pub fn builtin_tags() -> Vec<TagDefinition> {
    vec![
        TagDefinition::exact("year", |_, _| chrono::Local::now().year().to_string())
            .with_label("Year")
            .with_description("The current year"),
        TagDefinition::exact("reading-time", |ctx, _| reading_time(&ctx.content))
            .with_label("Reading time")
            .with_icon("clock")
            .with_description("Estimated reading time of the page body"),
        TagDefinition::exact("hero", render_hero)
            .with_label("Hero image")
            .with_icon("image")
            .with_description("Hero image from the `hero` frontmatter key")
            .with_frontmatter_key("hero"),
        TagDefinition::exact("label-cloud", render_label_cloud)
            .with_label("Label cloud")
            .with_icon("tag")
            .with_description("Links to every label page"),
        TagDefinition::exact("canonical", |ctx, _| {
            ctx.absolute_url(&ctx.url)
                .map(|url| html! { link rel="canonical" href=(url); }.into_string())
                .unwrap_or_default()
        })
        .with_label("Canonical link")
        .with_description("Canonical URL of the page"),
        TagDefinition::predicate(
            |name| name.len() > FRONTMATTER_PREFIX.len() && name.starts_with(FRONTMATTER_PREFIX),
            |ctx, name| {
                let key = &name[FRONTMATTER_PREFIX.len()..];
                escape_html(&frontmatter_text(ctx, key))
            },
        )
        .with_label("Frontmatter value")
        .with_description("Any frontmatter key, as `fm.<key>`"),
    ]
}

/// A frontmatter value as display text. Lists join with `, `.
pub fn frontmatter_text(ctx: &TemplateContext, key: &str) -> String {
    match frontmatter::str_field(&ctx.frontmatter, key) {
        Some(value) => value,
        None => frontmatter::string_list(&ctx.frontmatter, key).join(", "),
    }
}

fn reading_time(html: &str) -> String {
    let words = strip_tags(html).split_whitespace().count();
    if words == 0 {
        return String::new();
    }
    let minutes = words.div_ceil(WORDS_PER_MINUTE);
    format!("{minutes} min read")
}

fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

fn render_hero(ctx: &TemplateContext, _: &str) -> String {
    let Some(src) = frontmatter::str_field(&ctx.frontmatter, "hero") else {
        return String::new();
    };
    let src = if src.starts_with('/') { ctx.href(&src) } else { src };
    html! { img.hero src=(src) alt=(ctx.title); }.into_string()
}

fn render_label_cloud(ctx: &TemplateContext, _: &str) -> String {
    if ctx.site.labels.is_empty() {
        return String::new();
    }
    html! {
        ul.label-cloud {
            @for label in &ctx.site.labels {
                li { a.badge href=(ctx.href(&index::label_url(label))) { (label) } }
            }
        }
    }
    .into_string()
}
