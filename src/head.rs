use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::node::Attributes;

/// Document-wide settings serialized into `<mj-head>`. Kept apart from the body tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadSettings {
    /// `<mj-title>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `<mj-preview>`: inbox preview text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// `<mj-font>` declarations
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fonts: Vec<FontImport>,
    /// `<mj-breakpoint width>`: switch point between mobile and desktop layout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakpoint: Option<String>,
    /// Per-tag default attributes from `<mj-attributes>`; `mj-all` applies to every tag
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Attributes>,
    /// Named attribute sets from `<mj-class name>`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub classes: BTreeMap<String, Attributes>,
    /// `<mj-style>` blocks
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<StyleBlock>,
}

/// A web font declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontImport {
    /// Family name as used in `font-family` (e.g. "Roboto")
    pub name: String,
    /// Stylesheet URL
    pub href: String,
}

/// A CSS block; `inline` blocks are meant to be inlined into elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleBlock {
    pub css: String,
    #[serde(default)]
    pub inline: bool,
}

/// Tag name used for attributes that apply to every component.
pub const ALL_TAG: &str = "mj-all";

pub const DEFAULT_BREAKPOINT: &str = "480px";

impl HeadSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing would be written to `<mj-head>`.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.preview.is_none()
            && self.fonts.is_empty()
            && self.breakpoint.is_none()
            && self.attributes.is_empty()
            && self.classes.is_empty()
            && self.styles.is_empty()
    }

    pub fn breakpoint_or_default(&self) -> &str {
        self.breakpoint.as_deref().unwrap_or(DEFAULT_BREAKPOINT)
    }

    /// Default for `attribute` on `tag` from `<mj-attributes>`, falling back to `mj-all`.
    pub fn tag_default(&self, tag: &str, attribute: &str) -> Option<&str> {
        self.attributes
            .get(tag)
            .and_then(|attrs| attrs.get(attribute))
            .or_else(|| {
                self.attributes
                    .get(ALL_TAG)
                    .and_then(|attrs| attrs.get(attribute))
            })
            .map(String::as_str)
    }

    /// Value of `attribute` in the first of `class_names` that defines it.
    pub fn class_value<'a>(&'a self, class_names: &str, attribute: &str) -> Option<&'a str> {
        class_names
            .split_whitespace()
            .filter_map(|name| self.classes.get(name))
            .find_map(|attrs| attrs.get(attribute))
            .map(String::as_str)
    }

    /// Add a font unless one with the same name is already declared.
    pub fn add_font(&mut self, name: impl Into<String>, href: impl Into<String>) {
        let name = name.into();
        if self.fonts.iter().any(|f| f.name == name) {
            return;
        }
        self.fonts.push(FontImport {
            name,
            href: href.into(),
        });
    }

    pub fn set_tag_default(
        &mut self,
        tag: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.attributes
            .entry(tag.into())
            .or_default()
            .insert(attribute.into(), value.into());
    }

    /// Returns all declared font names
    pub fn font_names(&self) -> Vec<&str> {
        self.fonts.iter().map(|f| f.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_default_falls_back_to_mj_all() {
        let mut head = HeadSettings::new();
        head.set_tag_default("mj-all", "font-family", "Arial");
        head.set_tag_default("mj-text", "color", "#333333");
        assert_eq!(head.tag_default("mj-text", "color"), Some("#333333"));
        assert_eq!(head.tag_default("mj-text", "font-family"), Some("Arial"));
        assert_eq!(head.tag_default("mj-button", "color"), None);
    }

    #[test]
    fn test_class_value_uses_first_match() {
        let mut head = HeadSettings::new();
        head.classes.insert(
            "blue".to_string(),
            Attributes::from([("color".to_string(), "blue".to_string())]),
        );
        head.classes.insert(
            "red".to_string(),
            Attributes::from([("color".to_string(), "red".to_string())]),
        );
        assert_eq!(head.class_value("missing red blue", "color"), Some("red"));
        assert_eq!(head.class_value("blue", "font-size"), None);
    }

    #[test]
    fn test_add_font_deduplicates() {
        let mut head = HeadSettings::new();
        assert!(head.is_empty());
        head.add_font("Roboto", "https://fonts.googleapis.com/css?family=Roboto");
        head.add_font("Roboto", "https://example.com/other.css");
        assert_eq!(head.fonts.len(), 1);
        assert_eq!(head.font_names(), vec!["Roboto"]);
        assert!(!head.is_empty());
    }

    #[test]
    fn test_breakpoint_default() {
        let mut head = HeadSettings::new();
        assert_eq!(head.breakpoint_or_default(), "480px");
        head.breakpoint = Some("320px".to_string());
        assert_eq!(head.breakpoint_or_default(), "320px");
    }
}
