//! MJML markup → tree.
//!
//! Parsing runs in two steps: the shared open-element stack in [`crate::markup`] builds a
//! loose element tree, then each element is lowered into a [`Node`] against the schema.
//! Anything the schema cannot place is kept as an `mj-raw` node holding the original
//! markup, so nothing the user typed is lost.

use std::ops::Range;

use tracing::debug;

use crate::document::MjmlDocument;
use crate::error::MjmlResult;
use crate::head::{FontImport, HeadSettings, StyleBlock};
use crate::markup::{build_tree, Element, Item, MJML_RULES};
use crate::node::{create_default_node, Attributes, Node};
use crate::schema::{can_contain, get_component_definition, ComponentType};

const HEAD_TAG: &str = "mj-head";

/// Containers tried, in order, when the input has several top-level elements.
const IMPLICIT_CONTAINERS: [ComponentType; 4] = [
    ComponentType::Mjml,
    ComponentType::Body,
    ComponentType::Section,
    ComponentType::Column,
];

/// Parse MJML markup into a node tree. `<mj-head>` is skipped; use [`parse_mjml`] to
/// read it.
pub fn parse_mjml_to_node(text: &str) -> MjmlResult<Node> {
    let items = build_tree(text, MJML_RULES)?;
    Ok(lower_document(text, &items))
}

/// Parse MJML markup into the body tree and the head settings.
pub fn parse_mjml(text: &str) -> MjmlResult<MjmlDocument> {
    let items = build_tree(text, MJML_RULES)?;
    let head = extract_head(&items);
    let root = lower_document(text, &items);
    Ok(MjmlDocument::new(root, head))
}

fn lower_document(src: &str, items: &[Item]) -> Node {
    let mut nodes: Vec<(Node, Range<usize>)> = Vec::new();
    for item in items {
        match item {
            Item::Element(el) if el.tag() == HEAD_TAG => {}
            Item::Element(el) => {
                let node = match ComponentType::from_tag(&el.name) {
                    Some(ty) => lower_element(src, el, ty),
                    None => raw_from_span(src, &el.span),
                };
                nodes.push((node, el.span.clone()));
            }
            Item::Text { text, span } if !text.trim().is_empty() => {
                nodes.push((implicit_text(text), span.clone()));
            }
            _ => {}
        }
    }

    match nodes.len() {
        0 => create_default_node(ComponentType::Mjml),
        1 => nodes.remove(0).0,
        _ => wrap_top_level(src, nodes),
    }
}

/// Put several top-level nodes under the first container that accepts all of them.
fn wrap_top_level(src: &str, nodes: Vec<(Node, Range<usize>)>) -> Node {
    let container = IMPLICIT_CONTAINERS
        .into_iter()
        .find(|&container| {
            nodes
                .iter()
                .all(|(node, _)| node.is_raw() || can_contain(container, node.node_type))
        })
        .unwrap_or(ComponentType::Body);
    debug!(container = %container, count = nodes.len(), "wrapping top-level elements");

    let children = nodes
        .into_iter()
        .map(|(node, span)| {
            if node.is_raw() || can_contain(container, node.node_type) {
                node
            } else {
                raw_from_span(src, &span)
            }
        })
        .collect();
    Node::empty(container).with_children(children)
}

fn lower_element(src: &str, el: &Element, node_type: ComponentType) -> Node {
    let def = get_component_definition(node_type);
    let props: Attributes = el.attrs.iter().cloned().collect();
    let mut node = Node::empty(node_type);
    node.props = props;

    if def.ending_tag {
        if !el.self_closing {
            node.content = Some(el.raw_text.clone().unwrap_or_default());
        }
        return node;
    }
    if def.void {
        return node;
    }
    node.children = lower_children(src, node_type, &el.children);
    node
}

fn lower_children(src: &str, parent: ComponentType, items: &[Item]) -> Vec<Node> {
    let mut out = Vec::new();
    for item in items {
        match item {
            Item::Element(el) => {
                if parent == ComponentType::Mjml && el.tag() == HEAD_TAG {
                    continue;
                }
                match ComponentType::from_tag(&el.name) {
                    Some(ty) if can_contain(parent, ty) => out.push(lower_element(src, el, ty)),
                    Some(ty) => {
                        debug!(parent = %parent, child = %ty, "keeping misplaced element as mj-raw");
                        out.push(raw_from_span(src, &el.span));
                    }
                    None => {
                        debug!(parent = %parent, tag = %el.name, "keeping unknown element as mj-raw");
                        out.push(raw_from_span(src, &el.span));
                    }
                }
            }
            Item::Text { text, .. } => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if can_contain(parent, ComponentType::Text) {
                    out.push(implicit_text(trimmed));
                } else if can_contain(parent, ComponentType::Raw) {
                    out.push(Node::empty(ComponentType::Raw).with_content(trimmed));
                } else {
                    debug!(parent = %parent, "dropping text with no place in the schema");
                }
            }
            Item::Comment { .. } => {}
        }
    }
    out
}

fn implicit_text(text: &str) -> Node {
    Node::empty(ComponentType::Text).with_content(text.trim())
}

fn raw_from_span(src: &str, span: &Range<usize>) -> Node {
    Node::empty(ComponentType::Raw).with_content(&src[span.clone()])
}

// ─── Head ────────────────────────────────────────────────────────────────────

fn extract_head(items: &[Item]) -> HeadSettings {
    let mut head = HeadSettings::new();
    for el in head_elements(items) {
        read_head(el, &mut head);
    }
    head
}

/// `<mj-head>` elements at the top level or directly under `<mjml>`.
fn head_elements(items: &[Item]) -> Vec<&Element> {
    let mut out = Vec::new();
    for item in items {
        let Item::Element(el) = item else { continue };
        match el.tag().as_str() {
            HEAD_TAG => out.push(el),
            "mjml" => out.extend(el.elements().filter(|c| c.tag() == HEAD_TAG)),
            _ => {}
        }
    }
    out
}

fn read_head(el: &Element, head: &mut HeadSettings) {
    for child in el.elements() {
        let text = || child.raw_text.as_deref().unwrap_or_default().trim().to_string();
        match child.tag().as_str() {
            "mj-title" => head.title = Some(text()),
            "mj-preview" => head.preview = Some(text()),
            "mj-font" => match child.attr("name") {
                Some(name) => {
                    if !head.fonts.iter().any(|f| f.name == name) {
                        head.fonts.push(FontImport {
                            name: name.to_string(),
                            href: child.attr("href").unwrap_or_default().to_string(),
                        });
                    }
                }
                None => debug!("skipping mj-font without a name"),
            },
            "mj-breakpoint" => {
                if let Some(width) = child.attr("width") {
                    head.breakpoint = Some(width.to_string());
                }
            }
            "mj-attributes" => read_head_attributes(child, head),
            "mj-style" => head.styles.push(StyleBlock {
                css: text(),
                inline: child.attr("inline") == Some("inline"),
            }),
            other => debug!(tag = other, "ignoring unknown head element"),
        }
    }
}

fn read_head_attributes(el: &Element, head: &mut HeadSettings) {
    for entry in el.elements() {
        let tag = entry.tag();
        if tag == "mj-class" {
            let Some(name) = entry.attr("name") else {
                debug!("skipping mj-class without a name");
                continue;
            };
            let attrs = head.classes.entry(name.to_string()).or_default();
            for (k, v) in entry.attrs.iter().filter(|(k, _)| k != "name") {
                attrs.insert(k.clone(), v.clone());
            }
        } else {
            let attrs = head.attributes.entry(tag).or_default();
            for (k, v) in &entry.attrs {
                attrs.insert(k.clone(), v.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MjmlError;
    use pretty_assertions::assert_eq;

    fn types(nodes: &[Node]) -> Vec<ComponentType> {
        nodes.iter().map(|n| n.node_type).collect()
    }

    #[test]
    fn test_parse_section_column_text() {
        let node =
            parse_mjml_to_node("<mj-section><mj-column><mj-text>Hi</mj-text></mj-column></mj-section>")
                .unwrap();
        assert_eq!(node.node_type, ComponentType::Section);
        assert_eq!(types(&node.children), vec![ComponentType::Column]);
        let column = &node.children[0];
        assert_eq!(types(&column.children), vec![ComponentType::Text]);
        assert_eq!(column.children[0].content.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_props_are_taken_verbatim() {
        let node = parse_mjml_to_node(r#"<mj-image src="a.png" data-x='1' />"#).unwrap();
        assert_eq!(node.node_type, ComponentType::Image);
        assert_eq!(
            node.props,
            Attributes::from([
                ("data-x".to_string(), "1".to_string()),
                ("src".to_string(), "a.png".to_string()),
            ])
        );
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_text_content_keeps_inline_html() {
        let node = parse_mjml_to_node("<mj-text>\n  Hello <a href=\"#\">world</a>\n</mj-text>").unwrap();
        assert_eq!(node.content.as_deref(), Some("\n  Hello <a href=\"#\">world</a>\n"));

        let padded = parse_mjml_to_node("<mj-button> Buy now  </mj-button>").unwrap();
        assert_eq!(padded.content.as_deref(), Some(" Buy now  "));
    }

    #[test]
    fn test_section_inside_column_becomes_raw() {
        let node = parse_mjml_to_node("<mj-column><mj-section>x</mj-section></mj-column>").unwrap();
        assert_eq!(node.node_type, ComponentType::Column);
        assert_eq!(types(&node.children), vec![ComponentType::Raw]);
        assert_eq!(node.children[0].content.as_deref(), Some("<mj-section>x</mj-section>"));
    }

    #[test]
    fn test_unknown_tag_is_preserved_verbatim() {
        let node = parse_mjml_to_node(
            "<mj-body><mj-fancy a=\"1\"><b>x</b></mj-fancy><mj-section></mj-section></mj-body>",
        )
        .unwrap();
        assert_eq!(types(&node.children), vec![ComponentType::Raw, ComponentType::Section]);
        assert_eq!(
            node.children[0].content.as_deref(),
            Some("<mj-fancy a=\"1\"><b>x</b></mj-fancy>")
        );
    }

    #[test]
    fn test_stray_text_in_column_becomes_text_node() {
        let node = parse_mjml_to_node("<mj-column>  loose words  </mj-column>").unwrap();
        assert_eq!(types(&node.children), vec![ComponentType::Text]);
        assert_eq!(node.children[0].content.as_deref(), Some("loose words"));
    }

    #[test]
    fn test_stray_text_in_section_becomes_raw_and_comments_drop() {
        let node = parse_mjml_to_node("<mj-section><!-- c -->oops</mj-section>").unwrap();
        assert_eq!(types(&node.children), vec![ComponentType::Raw]);
        assert_eq!(node.children[0].content.as_deref(), Some("oops"));
    }

    #[test]
    fn test_self_closing_container_has_no_children() {
        let node = parse_mjml_to_node("<mj-section />").unwrap();
        assert!(node.children.is_empty());
        let text = parse_mjml_to_node("<mj-text />").unwrap();
        assert_eq!(text.content, None);
    }

    #[test]
    fn test_empty_input_is_empty_document() {
        let node = parse_mjml_to_node("   ").unwrap();
        assert_eq!(node.node_type, ComponentType::Mjml);
        assert_eq!(types(&node.children), vec![ComponentType::Body]);
    }

    #[test]
    fn test_several_top_level_elements_are_wrapped() {
        let node = parse_mjml_to_node("<mj-text>a</mj-text><mj-image />").unwrap();
        assert_eq!(node.node_type, ComponentType::Column);
        assert_eq!(types(&node.children), vec![ComponentType::Text, ComponentType::Image]);

        let sections = parse_mjml_to_node("<mj-section></mj-section><mj-wrapper></mj-wrapper>").unwrap();
        assert_eq!(sections.node_type, ComponentType::Body);
    }

    #[test]
    fn test_unfitting_top_level_elements_fall_back_to_body() {
        let node = parse_mjml_to_node("<mj-section></mj-section><mj-text>a</mj-text>").unwrap();
        assert_eq!(node.node_type, ComponentType::Body);
        assert_eq!(types(&node.children), vec![ComponentType::Section, ComponentType::Raw]);
        assert_eq!(node.children[1].content.as_deref(), Some("<mj-text>a</mj-text>"));
    }

    #[test]
    fn test_unclosed_tags_are_tolerated() {
        let closed = parse_mjml_to_node(
            "<mj-section><mj-column><mj-text>Hi</mj-text></mj-column></mj-section>",
        )
        .unwrap();
        let open_column =
            parse_mjml_to_node("<mj-section><mj-column><mj-text>Hi</mj-text></mj-section>").unwrap();
        let open_text =
            parse_mjml_to_node("<mj-section><mj-column><mj-text>Hi</mj-column></mj-section>").unwrap();
        let truncated = parse_mjml_to_node("<mj-section><mj-column><mj-text>Hi").unwrap();
        assert!(closed.structurally_eq(&open_column));
        assert!(closed.structurally_eq(&open_text));
        assert!(closed.structurally_eq(&truncated));
    }

    #[test]
    fn test_unterminated_quote_is_a_parse_error() {
        let err = parse_mjml_to_node("<mj-section padding=\"10px>\n</mj-section>").unwrap_err();
        assert!(matches!(err, MjmlError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_parse_mjml_reads_head() {
        let doc = parse_mjml(
            r##"<mjml lang="en">
  <mj-head>
    <mj-title>Welcome</mj-title>
    <mj-preview>Hello there</mj-preview>
    <mj-font name="Roboto" href="https://fonts.googleapis.com/css?family=Roboto" />
    <mj-font href="https://nameless.test" />
    <mj-breakpoint width="320px" />
    <mj-attributes>
      <mj-all font-family="Roboto, Arial" />
      <mj-text color="#333333" />
      <mj-class name="blue" color="blue" />
    </mj-attributes>
    <mj-style inline="inline">.a { color: red; }</mj-style>
    <mj-unknown />
  </mj-head>
  <mj-body></mj-body>
</mjml>"##,
        )
        .unwrap();

        assert_eq!(doc.root.node_type, ComponentType::Mjml);
        assert_eq!(doc.root.props.get("lang").map(String::as_str), Some("en"));
        assert_eq!(types(&doc.root.children), vec![ComponentType::Body]);

        let head = &doc.head;
        assert_eq!(head.title.as_deref(), Some("Welcome"));
        assert_eq!(head.preview.as_deref(), Some("Hello there"));
        assert_eq!(head.font_names(), vec!["Roboto"]);
        assert_eq!(head.breakpoint.as_deref(), Some("320px"));
        assert_eq!(head.tag_default("mj-text", "color"), Some("#333333"));
        assert_eq!(head.tag_default("mj-image", "font-family"), Some("Roboto, Arial"));
        assert_eq!(head.class_value("blue", "color"), Some("blue"));
        assert_eq!(head.styles.len(), 1);
        assert!(head.styles[0].inline);
    }
}
