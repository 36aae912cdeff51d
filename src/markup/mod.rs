//! Shared markup scanning for the MJML parser, the HTML bridge and locked-region
//! detection.

pub mod regions;
pub mod tokenizer;
pub mod tree;

pub use regions::{is_locked, locked_regions, LockedRegion};
pub use tokenizer::decode_entities;
pub use tree::{build_tree, Element, Item, TreeRules};

use crate::schema::ComponentType;

/// Tag rules for MJML input: ending tags and head text tags keep their body
/// verbatim; MJML void components and HTML void tags never take children.
pub const MJML_RULES: TreeRules = TreeRules {
    is_void: is_mjml_void,
    is_raw_text: is_mjml_raw_text,
};

/// Tag rules for plain HTML input.
pub const HTML_RULES: TreeRules = TreeRules {
    is_void: is_html_void,
    is_raw_text: is_html_raw_text,
};

/// Head children whose body is text, not markup.
pub const HEAD_TEXT_TAGS: &[&str] = &["mj-style", "mj-title", "mj-preview"];

fn is_mjml_raw_text(name: &str) -> bool {
    ComponentType::from_tag(name).is_some_and(|ty| ty.is_ending_tag())
        || HEAD_TEXT_TAGS.iter().any(|t| t.eq_ignore_ascii_case(name))
}

fn is_mjml_void(name: &str) -> bool {
    ComponentType::from_tag(name).is_some_and(|ty| ty.is_void()) || is_html_void(name)
}

fn is_html_raw_text(name: &str) -> bool {
    ["script", "style", "textarea", "title"]
        .iter()
        .any(|t| t.eq_ignore_ascii_case(name))
}

/// HTML elements that cannot have content.
pub fn is_html_void(name: &str) -> bool {
    [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
        "source", "track", "wbr",
    ]
    .iter()
    .any(|t| t.eq_ignore_ascii_case(name))
}
