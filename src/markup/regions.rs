use std::ops::Range;

use serde::Serialize;

use super::tree::{build_tree, Element, Item};
use super::MJML_RULES;
use crate::error::MjmlResult;
use crate::schema::LOCKED_ATTRIBUTE;

/// Source range of an element marked `mj-locked="true"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockedRegion {
    pub tag: String,
    /// Byte range from the opening `<` to the end of the closing tag
    pub span: Range<usize>,
    /// 1-based, inclusive
    pub start_line: usize,
    pub end_line: usize,
}

/// Find the locked elements of an MJML text, outermost only.
///
/// Boundaries come from the same tree builder the parser uses, so an editor
/// protecting these ranges agrees with what the parser will read.
pub fn locked_regions(text: &str) -> MjmlResult<Vec<LockedRegion>> {
    let items = build_tree(text, MJML_RULES)?;
    let mut regions = Vec::new();
    collect(text, &items, &mut regions);
    Ok(regions)
}

fn collect(text: &str, items: &[Item], out: &mut Vec<LockedRegion>) {
    for item in items {
        let Item::Element(el) = item else { continue };
        if is_locked(el) {
            out.push(LockedRegion {
                tag: el.tag(),
                span: el.span.clone(),
                start_line: line_of(text, el.span.start),
                end_line: line_of(text, el.span.end.saturating_sub(1).max(el.span.start)),
            });
        } else {
            collect(text, &el.children, out);
        }
    }
}

/// `mj-locked="true"` or a bare `mj-locked`.
pub fn is_locked(el: &Element) -> bool {
    matches!(el.attr(LOCKED_ATTRIBUTE), Some(v) if v.is_empty() || v.eq_ignore_ascii_case("true"))
}

fn line_of(text: &str, offset: usize) -> usize {
    text.as_bytes()[..offset.min(text.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}
