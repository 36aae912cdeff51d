//! Open-element stack that turns tokens into a loose element tree.
//!
//! No schema knowledge lives here: mismatched closing tags close everything above the
//! matching open element, stray closing tags are dropped, and anything still open at
//! end of input is closed there.

use std::ops::Range;

use tracing::debug;

use super::tokenizer::{Token, Tokenizer};
use crate::error::MjmlResult;

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Item>,
    /// Body of a raw-text tag, verbatim.
    pub raw_text: Option<String>,
    pub self_closing: bool,
    /// From the `<` of the opening tag to the end of the closing tag, or to the
    /// point where the element was implicitly closed.
    pub span: Range<usize>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Lowercased tag name
    pub fn tag(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    /// Child elements, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|item| match item {
            Item::Element(el) => Some(el),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Element(Element),
    Text { text: String, span: Range<usize> },
    Comment { text: String, span: Range<usize> },
}

impl Item {
    pub fn span(&self) -> &Range<usize> {
        match self {
            Item::Element(el) => &el.span,
            Item::Text { span, .. } | Item::Comment { span, .. } => span,
        }
    }
}

/// Tag classification used while building the tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeRules {
    /// Tags that never have children even without `/>`
    pub is_void: fn(&str) -> bool,
    /// Tags whose body is kept verbatim
    pub is_raw_text: fn(&str) -> bool,
}

#[derive(Default)]
struct Builder {
    stack: Vec<Element>,
    roots: Vec<Item>,
}

impl Builder {
    fn push_item(&mut self, item: Item) {
        match self.stack.last_mut() {
            Some(top) => top.children.push(item),
            None => self.roots.push(item),
        }
    }

    fn close_top(&mut self, end: usize) {
        if let Some(mut el) = self.stack.pop() {
            el.span.end = end;
            self.push_item(Item::Element(el));
        }
    }

    fn close_tag(&mut self, name: &str, span: Range<usize>) {
        let Some(idx) = self
            .stack
            .iter()
            .rposition(|el| el.name.eq_ignore_ascii_case(name))
        else {
            debug!(tag = name, offset = span.start, "ignoring stray closing tag");
            return;
        };
        while self.stack.len() > idx + 1 {
            if let Some(top) = self.stack.last() {
                debug!(tag = %top.name, closed_by = name, "implicitly closing element");
            }
            self.close_top(span.start);
        }
        self.close_top(span.end);
    }
}

/// Build the element tree for `src`. Top-level items are returned in source order.
pub fn build_tree(src: &str, rules: TreeRules) -> MjmlResult<Vec<Item>> {
    let mut builder = Builder::default();
    let mut tokens = Tokenizer::new(src, rules.is_raw_text);

    while let Some(token) = tokens.next_token()? {
        match token {
            Token::OpenTag {
                name,
                attrs,
                self_closing,
                span,
            } => {
                let void = self_closing || (rules.is_void)(name);
                let el = Element {
                    name: name.to_string(),
                    attrs,
                    children: Vec::new(),
                    raw_text: None,
                    self_closing,
                    span,
                };
                if void {
                    builder.push_item(Item::Element(el));
                } else {
                    builder.stack.push(el);
                }
            }
            Token::RawText { text, span, closed } => {
                // Whitespace before the tag that cut an unclosed body short is layout.
                let text = if closed { text } else { text.trim_end() };
                if let Some(top) = builder.stack.last_mut() {
                    top.raw_text = Some(text.to_string());
                    top.span.end = span.end;
                }
                if !closed {
                    debug!(offset = span.end, "raw text ended without its closing tag");
                    builder.close_top(span.end);
                }
            }
            Token::CloseTag { name, span } => builder.close_tag(name, span),
            Token::Text { text, span } => builder.push_item(Item::Text {
                text: text.to_string(),
                span,
            }),
            Token::Comment { text, span } => builder.push_item(Item::Comment {
                text: text.to_string(),
                span,
            }),
        }
    }

    while !builder.stack.is_empty() {
        builder.close_top(src.len());
    }
    Ok(builder.roots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> TreeRules {
        TreeRules {
            is_void: |name| name.eq_ignore_ascii_case("mj-image"),
            is_raw_text: |name| name.eq_ignore_ascii_case("mj-text"),
        }
    }

    fn only_element(items: Vec<Item>) -> Element {
        let mut els: Vec<Element> = items
            .into_iter()
            .filter_map(|i| match i {
                Item::Element(el) => Some(el),
                _ => None,
            })
            .collect();
        assert_eq!(els.len(), 1);
        els.remove(0)
    }

    #[test]
    fn test_nested_elements_and_spans() {
        let src = "<mj-column><mj-image src=\"a\"><mj-text>Hi</mj-text></mj-column>";
        let col = only_element(build_tree(src, rules()).unwrap());
        assert_eq!(col.span, 0..src.len());
        let kids: Vec<&Element> = col.elements().collect();
        assert_eq!(kids.len(), 2);
        assert_eq!(kids[0].name, "mj-image");
        assert_eq!(kids[1].raw_text.as_deref(), Some("Hi"));
        assert_eq!(&src[kids[1].span.clone()], "<mj-text>Hi</mj-text>");
    }

    #[test]
    fn test_mismatched_close_tag_closes_intervening() {
        let src = "<mj-section><mj-column><mj-spacer></mj-section><mj-section></mj-section>";
        let items = build_tree(src, rules()).unwrap();
        assert_eq!(items.len(), 2);
        let Item::Element(first) = &items[0] else { panic!("expected element") };
        let col = first.elements().next().unwrap();
        assert_eq!(col.name, "mj-column");
        assert_eq!(col.elements().next().unwrap().name, "mj-spacer");
    }

    #[test]
    fn test_stray_close_tag_is_ignored() {
        let items = build_tree("<mj-column></mj-section></mj-column>", rules()).unwrap();
        let col = only_element(items);
        assert!(col.children.is_empty());
    }

    #[test]
    fn test_unclosed_elements_close_at_eof() {
        let src = "<mj-section><mj-column>";
        let section = only_element(build_tree(src, rules()).unwrap());
        assert_eq!(section.span.end, src.len());
        assert_eq!(section.elements().next().unwrap().span.end, src.len());
    }

    #[test]
    fn test_unclosed_raw_text_does_not_adopt_siblings() {
        let src = "<mj-column><mj-text>Hello<mj-image /></mj-column>";
        let col = only_element(build_tree(src, rules()).unwrap());
        let kids: Vec<&Element> = col.elements().collect();
        assert_eq!(kids.len(), 2);
        assert_eq!(kids[0].raw_text.as_deref(), Some("Hello"));
        assert!(kids[0].children.is_empty());
        assert_eq!(kids[1].name, "mj-image");
    }
}
