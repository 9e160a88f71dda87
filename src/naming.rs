//! Path naming conventions for content files.
//!
//! Files and directories may carry a numeric ordering prefix (`NNN-name`).
//! The prefix orders navigation and `sort=order` listings and is dropped from
//! URLs:
//!
//! ```text
//! content/index.md                 → /
//! content/010-about.md             → /about/          (order 10, in nav)
//! content/020-Blog/index.md        → /blog/           (order 20, in nav)
//! content/020-Blog/first-post.md   → /blog/first-post/
//! content/notes.md                 → /notes/          (unnumbered, hidden from nav)
//! ```
//!
//! URL segments are slugified: lowercased, runs of anything that is not
//! alphanumeric collapse into one dash.

use std::path::Path;

/// File stems that stand for their directory.
pub const INDEX_STEMS: &[&str] = &["index", "_index"];

/// A path segment split into its ordering prefix and name.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Numeric prefix, if present (`10` from `010-about`).
    pub order: Option<u32>,
    /// URL segment for the name part (`first-post`).
    pub slug: String,
    /// Human title derived from the name (`first post`).
    pub title: String,
}

pub fn parse_entry_name(segment: &str) -> ParsedName {
    let (order, rest) = match segment.split_once('-') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) => {
            (prefix.parse().ok(), rest)
        }
        _ => (None, segment),
    };
    ParsedName {
        order,
        slug: slugify(rest),
        title: rest.replace(['-', '_'], " ").trim().to_string(),
    }
}

/// Lowercase and collapse non-alphanumeric runs into single dashes.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Whether a content file stands for its directory (`index.md`).
pub fn is_index_file(rel_path: &Path) -> bool {
    rel_path
        .file_stem()
        .is_some_and(|stem| INDEX_STEMS.iter().any(|index| stem == *index))
}

/// Site-relative URL for a content file path relative to the content root.
///
/// Always starts and ends with `/`.
pub fn url_for(rel_path: &Path) -> String {
    let mut segments: Vec<String> = rel_path
        .parent()
        .into_iter()
        .flat_map(|p| p.components())
        .map(|c| parse_entry_name(&c.as_os_str().to_string_lossy()).slug)
        .filter(|s| !s.is_empty())
        .collect();

    if !is_index_file(rel_path)
        && let Some(stem) = rel_path.file_stem()
    {
        let slug = parse_entry_name(&stem.to_string_lossy()).slug;
        if !slug.is_empty() {
            segments.push(slug);
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", segments.join("/"))
    }
}

/// Ordering prefix for a content file: the file's own, or its directory's
/// for index files.
pub fn order_for(rel_path: &Path) -> Option<u32> {
    let segment = if is_index_file(rel_path) {
        rel_path.parent()?.file_name()?
    } else {
        rel_path.file_stem()?
    };
    parse_entry_name(&segment.to_string_lossy()).order
}

/// Title fallback when a document sets none: the file or directory name.
pub fn title_for(rel_path: &Path) -> String {
    let segment = if is_index_file(rel_path) {
        rel_path.parent().and_then(Path::file_name)
    } else {
        rel_path.file_stem()
    };
    segment
        .map(|s| parse_entry_name(&s.to_string_lossy()).title)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Home".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_segment() {
        let p = parse_entry_name("010-About-Me");
        assert_eq!(p.order, Some(10));
        assert_eq!(p.slug, "about-me");
        assert_eq!(p.title, "About Me");
    }

    #[test]
    fn unnumbered_segment() {
        let p = parse_entry_name("wip-drafts");
        assert_eq!(p.order, None);
        assert_eq!(p.slug, "wip-drafts");
        assert_eq!(p.title, "wip drafts");
    }

    #[test]
    fn number_only_segment_has_no_dash() {
        let p = parse_entry_name("2024");
        assert_eq!(p.order, None);
        assert_eq!(p.slug, "2024");
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Hello,  World!"), "hello-world");
        assert_eq!(slugify("--Rust & Web--"), "rust-web");
        assert_eq!(slugify("Café Notes"), "café-notes");
    }

    #[test]
    fn urls() {
        assert_eq!(url_for(Path::new("index.md")), "/");
        assert_eq!(url_for(Path::new("010-about.md")), "/about/");
        assert_eq!(url_for(Path::new("020-Blog/index.md")), "/blog/");
        assert_eq!(url_for(Path::new("020-Blog/_index.md")), "/blog/");
        assert_eq!(
            url_for(Path::new("020-Blog/First Post.md")),
            "/blog/first-post/"
        );
    }

    #[test]
    fn order_uses_directory_for_index_files() {
        assert_eq!(order_for(Path::new("020-Blog/index.md")), Some(20));
        assert_eq!(order_for(Path::new("020-Blog/005-intro.md")), Some(5));
        assert_eq!(order_for(Path::new("index.md")), None);
        assert_eq!(order_for(Path::new("notes.md")), None);
    }

    #[test]
    fn title_fallbacks() {
        assert_eq!(title_for(Path::new("index.md")), "Home");
        assert_eq!(title_for(Path::new("020-Blog/index.md")), "Blog");
        assert_eq!(title_for(Path::new("010-who-am-i.md")), "who am i");
    }
}
