//! Tree → MJML markup.
//!
//! Output is deterministic: attributes follow the schema's declaration order, unknown
//! attributes come after in name order, and every prop is written (defaults included)
//! so the parser can rebuild the exact attribute map.

use crate::head::{HeadSettings, ALL_TAG};
use crate::node::{Attributes, Node};
use crate::schema::{get_component_definition, ComponentType};

const INDENT: &str = "  ";

/// Markup for `node` and its subtree, indented `depth` levels.
pub fn node_to_mjml(node: &Node, depth: usize) -> String {
    let mut out = String::new();
    write_node(&mut out, node, depth);
    trim_newline(out)
}

/// The `<mj-head>` block for `head`, or an empty string when there is nothing to write.
pub fn head_to_mjml(head: &HeadSettings, depth: usize) -> String {
    let mut out = String::new();
    write_head(&mut out, head, depth);
    trim_newline(out)
}

/// Full document markup: the `<mjml>` envelope, the head block and the body.
///
/// An `mjml` root supplies its own attributes and children; an `mj-body` root is
/// wrapped in `<mjml>`; any other node is wrapped in `<mjml><mj-body>`.
pub fn generate_mjml(root: &Node, head: &HeadSettings) -> String {
    let mut out = String::new();
    match root.node_type {
        ComponentType::Mjml => {
            out.push_str(&open_tag(root));
            out.push('\n');
            write_head(&mut out, head, 1);
            for child in &root.children {
                write_node(&mut out, child, 1);
            }
        }
        ComponentType::Body => {
            out.push_str("<mjml>\n");
            write_head(&mut out, head, 1);
            write_node(&mut out, root, 1);
        }
        _ => {
            out.push_str("<mjml>\n");
            write_head(&mut out, head, 1);
            out.push_str(INDENT);
            out.push_str("<mj-body>\n");
            write_node(&mut out, root, 2);
            out.push_str(INDENT);
            out.push_str("</mj-body>\n");
        }
    }
    out.push_str("</mjml>\n");
    out
}

fn trim_newline(mut s: String) -> String {
    if s.ends_with('\n') {
        s.pop();
    }
    s
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    let def = get_component_definition(node.node_type);
    let pad = INDENT.repeat(depth);
    let tag = node.node_type.tag();
    let open = open_tag(node);

    out.push_str(&pad);
    if def.ending_tag {
        match &node.content {
            Some(content) => {
                out.push_str(&open);
                out.push_str(content);
                out.push_str(&format!("</{}>\n", tag));
            }
            None => {
                out.push_str(&self_closing(&open));
                out.push('\n');
            }
        }
        return;
    }
    if def.void {
        out.push_str(&self_closing(&open));
        out.push('\n');
        return;
    }
    if node.children.is_empty() {
        out.push_str(&format!("{}</{}>\n", open, tag));
        return;
    }

    out.push_str(&open);
    out.push('\n');
    for child in &node.children {
        write_node(out, child, depth + 1);
    }
    out.push_str(&pad);
    out.push_str(&format!("</{}>\n", tag));
}

fn open_tag(node: &Node) -> String {
    format!("<{}{}>", node.node_type.tag(), attribute_list(node))
}

fn self_closing(open: &str) -> String {
    format!("{} />", open.trim_end_matches('>'))
}

/// ` name="value"` pairs: declared attributes first, in schema order, then the rest.
fn attribute_list(node: &Node) -> String {
    let def = get_component_definition(node.node_type);
    let mut names: Vec<&String> = node.props.keys().collect();
    names.sort_by_key(|name| (def.attribute_index(name).unwrap_or(usize::MAX), name.as_str()));

    names
        .into_iter()
        .map(|name| format!(" {}=\"{}\"", name, escape_attr(&node.props[name])))
        .collect()
}

fn sorted_attribute_list(attrs: &Attributes) -> String {
    attrs
        .iter()
        .map(|(name, value)| format!(" {}=\"{}\"", name, escape_attr(value)))
        .collect()
}

fn write_head(out: &mut String, head: &HeadSettings, depth: usize) {
    if head.is_empty() {
        return;
    }
    let pad = INDENT.repeat(depth);
    let inner = INDENT.repeat(depth + 1);

    out.push_str(&format!("{}<mj-head>\n", pad));
    if let Some(title) = &head.title {
        out.push_str(&format!("{}<mj-title>{}</mj-title>\n", inner, title));
    }
    if let Some(preview) = &head.preview {
        out.push_str(&format!("{}<mj-preview>{}</mj-preview>\n", inner, preview));
    }
    for font in &head.fonts {
        out.push_str(&format!(
            "{}<mj-font name=\"{}\" href=\"{}\" />\n",
            inner,
            escape_attr(&font.name),
            escape_attr(&font.href)
        ));
    }
    if let Some(width) = &head.breakpoint {
        out.push_str(&format!(
            "{}<mj-breakpoint width=\"{}\" />\n",
            inner,
            escape_attr(width)
        ));
    }
    if !head.attributes.is_empty() || !head.classes.is_empty() {
        let entry = INDENT.repeat(depth + 2);
        out.push_str(&format!("{}<mj-attributes>\n", inner));
        // mj-all first so per-tag entries read as overrides.
        let tags = head
            .attributes
            .iter()
            .filter(|(tag, _)| tag.as_str() == ALL_TAG)
            .chain(head.attributes.iter().filter(|(tag, _)| tag.as_str() != ALL_TAG));
        for (tag, attrs) in tags {
            out.push_str(&format!("{}<{}{} />\n", entry, tag, sorted_attribute_list(attrs)));
        }
        for (name, attrs) in &head.classes {
            out.push_str(&format!(
                "{}<mj-class name=\"{}\"{} />\n",
                entry,
                escape_attr(name),
                sorted_attribute_list(attrs)
            ));
        }
        out.push_str(&format!("{}</mj-attributes>\n", inner));
    }
    for style in &head.styles {
        let inline = if style.inline { " inline=\"inline\"" } else { "" };
        out.push_str(&format!("{}<mj-style{}>{}</mj-style>\n", inner, inline, style.css));
    }
    out.push_str(&format!("{}</mj-head>\n", pad));
}

/// Escape an attribute value for a double-quoted context.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::head::StyleBlock;
    use pretty_assertions::assert_eq;

    fn section_with_text(text: &str) -> Node {
        Node::empty(ComponentType::Section).with_children(vec![Node::empty(ComponentType::Column)
            .with_children(vec![Node::empty(ComponentType::Text).with_content(text)])])
    }

    #[test]
    fn test_node_to_mjml_nesting_and_content() {
        let markup = node_to_mjml(&section_with_text("Hi <b>there</b>"), 0);
        assert_eq!(
            markup,
            "<mj-section>\n  <mj-column>\n    <mj-text>Hi <b>there</b></mj-text>\n  </mj-column>\n</mj-section>"
        );
    }

    #[test]
    fn test_attribute_order_and_escaping() {
        let node = Node::empty(ComponentType::Button)
            .with_prop("zz-custom", "1")
            .with_prop("href", "https://x.test/?a=1&b=\"2\"")
            .with_prop("background-color", "#ff0000")
            .with_content("Go");
        let markup = node_to_mjml(&node, 0);
        let def = get_component_definition(ComponentType::Button);
        let bg = def.attribute_index("background-color").unwrap();
        let href = def.attribute_index("href").unwrap();
        let (first, second) = if bg < href {
            ("background-color", "href")
        } else {
            ("href", "background-color")
        };
        assert!(markup.find(first).unwrap() < markup.find(second).unwrap());
        assert!(markup.find("href").unwrap() < markup.find("zz-custom").unwrap());
        assert!(markup.contains(r#"href="https://x.test/?a=1&amp;b=&quot;2&quot;""#));
    }

    #[test]
    fn test_void_empty_and_contentless_tags() {
        assert_eq!(
            node_to_mjml(&Node::empty(ComponentType::Image).with_prop("src", "a.png"), 1),
            r#"  <mj-image src="a.png" />"#
        );
        assert_eq!(node_to_mjml(&Node::empty(ComponentType::Column), 0), "<mj-column></mj-column>");
        assert_eq!(node_to_mjml(&Node::empty(ComponentType::Text), 0), "<mj-text />");
        assert_eq!(
            node_to_mjml(&Node::empty(ComponentType::Text).with_content(""), 0),
            "<mj-text></mj-text>"
        );
    }

    #[test]
    fn test_generate_mjml_wraps_fragments() {
        let head = HeadSettings::new();
        let doc = generate_mjml(&section_with_text("Hi"), &head);
        assert!(doc.starts_with("<mjml>\n  <mj-body>\n    <mj-section>"));
        assert!(doc.ends_with("  </mj-body>\n</mjml>\n"));

        let body = Node::empty(ComponentType::Body).with_prop("width", "640px");
        assert_eq!(
            generate_mjml(&body, &head),
            "<mjml>\n  <mj-body width=\"640px\"></mj-body>\n</mjml>\n"
        );
    }

    #[test]
    fn test_generate_mjml_with_head() {
        let mut head = HeadSettings::new();
        head.title = Some("Hello".to_string());
        head.add_font("Roboto", "https://fonts.googleapis.com/css?family=Roboto");
        head.breakpoint = Some("320px".to_string());
        head.set_tag_default("mj-text", "color", "#333333");
        head.set_tag_default("mj-all", "font-family", "Roboto, Arial");
        head.classes.insert(
            "blue".to_string(),
            Attributes::from([("color".to_string(), "blue".to_string())]),
        );
        head.styles.push(StyleBlock {
            css: ".x { color: red; }".to_string(),
            inline: true,
        });
        let root = Node::empty(ComponentType::Mjml)
            .with_children(vec![Node::empty(ComponentType::Body)]);

        let expected = "\
<mjml>
  <mj-head>
    <mj-title>Hello</mj-title>
    <mj-font name=\"Roboto\" href=\"https://fonts.googleapis.com/css?family=Roboto\" />
    <mj-breakpoint width=\"320px\" />
    <mj-attributes>
      <mj-all font-family=\"Roboto, Arial\" />
      <mj-text color=\"#333333\" />
      <mj-class name=\"blue\" color=\"blue\" />
    </mj-attributes>
    <mj-style inline=\"inline\">.x { color: red; }</mj-style>
  </mj-head>
  <mj-body></mj-body>
</mjml>
";
        assert_eq!(generate_mjml(&root, &head), expected);
    }

    #[test]
    fn test_empty_head_writes_nothing() {
        assert_eq!(head_to_mjml(&HeadSettings::new(), 1), "");
    }
}
