//! Template tags: named renderers that skeletons reference as `{{name}}`.
//!
//! A tag matches either one exact name or any name a predicate accepts
//! (`fm.*` style families). Lookup tries exact names first, then predicates
//! in registration order. Registering an exact name that already exists
//! replaces the earlier definition.
//!
//! Tags come from two places: the compiled-in set in [`builtin`], and TOML
//! component manifests discovered at build time (see [`plugin`]).

pub mod builtin;
pub mod plugin;

pub use builtin::builtin_tags;
pub use plugin::DiscoveryReport;

use crate::template::TemplateContext;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub type RenderFn = Arc<dyn Fn(&TemplateContext, &str) -> String + Send + Sync>;
pub type PredicateFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

#[derive(Error, Debug)]
pub enum TagError {
    #[error("failed to read component directory {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Clone)]
pub enum TagMatcher {
    Exact(String),
    Predicate(PredicateFn),
}

impl TagMatcher {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            TagMatcher::Exact(exact) => exact == name,
            TagMatcher::Predicate(accepts) => accepts(name),
        }
    }
}

impl fmt::Debug for TagMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagMatcher::Exact(name) => f.debug_tuple("Exact").field(name).finish(),
            TagMatcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// One tag. `resolve` receives the page context and the name that matched,
/// which lets a predicate tag tell `fm.author` from `fm.hero`.
#[derive(Clone)]
pub struct TagDefinition {
    pub matcher: TagMatcher,
    pub resolve: RenderFn,
    pub label: String,
    pub icon: String,
    pub description: String,
    /// Frontmatter key the tag reads, when it reads one.
    pub frontmatter_key: Option<String>,
}

impl TagDefinition {
    pub fn exact<F>(name: impl Into<String>, resolve: F) -> Self
    where
        F: Fn(&TemplateContext, &str) -> String + Send + Sync + 'static,
    {
        Self::new(TagMatcher::Exact(name.into()), Arc::new(resolve))
    }

    pub fn predicate<P, F>(accepts: P, resolve: F) -> Self
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
        F: Fn(&TemplateContext, &str) -> String + Send + Sync + 'static,
    {
        Self::new(TagMatcher::Predicate(Arc::new(accepts)), Arc::new(resolve))
    }

    fn new(matcher: TagMatcher, resolve: RenderFn) -> Self {
        Self {
            matcher,
            resolve,
            label: String::new(),
            icon: String::new(),
            description: String::new(),
            frontmatter_key: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_frontmatter_key(mut self, key: impl Into<String>) -> Self {
        self.frontmatter_key = Some(key.into());
        self
    }

    /// The exact name, for exact-match tags.
    pub fn name(&self) -> Option<&str> {
        match &self.matcher {
            TagMatcher::Exact(name) => Some(name),
            TagMatcher::Predicate(_) => None,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.matcher.matches(name)
    }

    pub fn render(&self, ctx: &TemplateContext, name: &str) -> String {
        (self.resolve)(ctx, name)
    }
}

impl fmt::Debug for TagDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagDefinition")
            .field("matcher", &self.matcher)
            .field("label", &self.label)
            .field("icon", &self.icon)
            .field("description", &self.description)
            .field("frontmatter_key", &self.frontmatter_key)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    definitions: Vec<TagDefinition>,
    exact: HashMap<String, usize>,
}

impl TagRegistry {
    /// A registry holding the compiled-in tags.
    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        registry.register(builtin_tags());
        registry
    }

    pub fn register(&mut self, definitions: impl IntoIterator<Item = TagDefinition>) {
        for definition in definitions {
            match definition.name().map(str::to_string) {
                Some(name) => match self.exact.get(&name) {
                    Some(&slot) => self.definitions[slot] = definition,
                    None => {
                        self.exact.insert(name, self.definitions.len());
                        self.definitions.push(definition);
                    }
                },
                None => self.definitions.push(definition),
            }
        }
    }

    /// The definition that would handle `name`.
    pub fn get(&self, name: &str) -> Option<&TagDefinition> {
        match self.exact.get(name) {
            Some(&slot) => self.definitions.get(slot),
            None => self
                .definitions
                .iter()
                .find(|d| matches!(d.matcher, TagMatcher::Predicate(_)) && d.matches(name)),
        }
    }

    pub fn resolve(&self, name: &str, ctx: &TemplateContext) -> Option<String> {
        self.get(name).map(|definition| definition.render(ctx, name))
    }

    pub fn clear(&mut self) {
        self.definitions.clear();
        self.exact.clear();
    }

    /// Every definition, in registration order.
    pub fn all(&self) -> &[TagDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Replace the registry's contents with the tags declared by component
    /// manifests in `dir`. See [`plugin`] for the manifest format.
    pub fn discover(&mut self, dir: &Path) -> Result<DiscoveryReport, TagError> {
        self.clear();
        let (definitions, report) = plugin::discover(dir)?;
        self.register(definitions);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(name: &str, value: &'static str) -> TagDefinition {
        TagDefinition::exact(name, move |_, _| value.to_string())
    }

    #[test]
    fn exact_registration_replaces_in_place() {
        let mut registry = TagRegistry::default();
        registry.register([constant("a", "1"), constant("b", "2")]);
        registry.register([constant("a", "3")]);

        let ctx = TemplateContext::default();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("a", &ctx).as_deref(), Some("3"));
        assert_eq!(registry.all()[0].name(), Some("a"));
    }

    #[test]
    fn exact_wins_over_predicate() {
        let mut registry = TagRegistry::default();
        registry.register([
            TagDefinition::predicate(|n| n.starts_with("x."), |_, n| format!("pred:{n}")),
            constant("x.special", "exact"),
        ]);
        let ctx = TemplateContext::default();
        assert_eq!(registry.resolve("x.special", &ctx).as_deref(), Some("exact"));
        assert_eq!(registry.resolve("x.other", &ctx).as_deref(), Some("pred:x.other"));
        assert_eq!(registry.resolve("y", &ctx), None);
    }

    #[test]
    fn predicates_checked_in_registration_order() {
        let mut registry = TagRegistry::default();
        registry.register([
            TagDefinition::predicate(|n| n.starts_with('a'), |_, _| "first".to_string()),
            TagDefinition::predicate(|n| n.starts_with("ab"), |_, _| "second".to_string()),
        ]);
        let ctx = TemplateContext::default();
        assert_eq!(registry.resolve("abc", &ctx).as_deref(), Some("first"));
    }

    #[test]
    fn clear_empties_registry() {
        let mut registry = TagRegistry::with_builtins();
        assert!(!registry.is_empty());
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.get("year").is_none());
    }

    #[test]
    fn debug_omits_closures() {
        let def = constant("a", "1").with_label("A");
        let text = format!("{def:?}");
        assert!(text.contains("Exact(\"a\")"));
        assert!(text.contains("label: \"A\""));
    }
}
