//! Best-effort conversion of pasted HTML into content components.
//!
//! Block elements with an obvious MJML counterpart are mapped; everything else is
//! gathered into `mj-text` blocks holding the original HTML. When nothing maps, the
//! whole input becomes a single `mj-text`.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::markup::{build_tree, Element, Item, HTML_RULES};
use crate::node::Node;
use crate::schema::ComponentType;
use crate::serializer::node_to_mjml;

const TEXT_BLOCKS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "dl", "blockquote", "pre",
];

const CONTAINERS: &[&str] = &[
    "html", "body", "div", "section", "article", "main", "center", "header", "footer",
    "aside", "nav", "form",
];

const STRIPPED: &[&str] = &["head", "script", "style", "title", "meta", "link", "noscript"];

fn script_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").unwrap()
    })
}

fn handler_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).unwrap()
    })
}

/// Drop `<script>`/`<style>` blocks and inline event handlers.
pub fn sanitize_html(html: &str) -> String {
    let without_scripts = script_regex().replace_all(html, "");
    handler_regex().replace_all(&without_scripts, "").into_owned()
}

/// Content nodes for an HTML fragment, in document order.
pub fn parse_html_to_nodes(html: &str) -> Vec<Node> {
    let clean = sanitize_html(html);
    if clean.trim().is_empty() {
        return Vec::new();
    }
    let items = match build_tree(&clean, HTML_RULES) {
        Ok(items) => items,
        Err(err) => {
            debug!(error = %err, "html could not be tokenized, keeping it as text");
            return vec![fallback_text(&clean)];
        }
    };

    let mut converter = Converter::new(&clean);
    converter.visit(&items);
    converter.flush();
    if converter.nodes.is_empty() {
        return vec![fallback_text(&clean)];
    }
    converter.nodes
}

/// A single node for an HTML fragment: the only mapped node, or a column holding all
/// of them.
pub fn parse_html_to_node(html: &str) -> Node {
    let mut nodes = parse_html_to_nodes(html);
    match nodes.len() {
        0 => fallback_text(html),
        1 => nodes.remove(0),
        _ => Node::empty(ComponentType::Column).with_children(nodes),
    }
}

/// MJML markup for an HTML fragment.
pub fn parse_html_to_mjml(html: &str) -> String {
    node_to_mjml(&parse_html_to_node(html), 0)
}

fn fallback_text(html: &str) -> Node {
    Node::empty(ComponentType::Text).with_content(html.trim())
}

struct Converter<'a> {
    src: &'a str,
    nodes: Vec<Node>,
    inline: String,
}

impl<'a> Converter<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            nodes: Vec::new(),
            inline: String::new(),
        }
    }

    /// Emit the pending inline run as one `mj-text`.
    fn flush(&mut self) {
        let text = self.inline.trim();
        if !text.is_empty() {
            self.nodes
                .push(Node::empty(ComponentType::Text).with_content(text));
        }
        self.inline.clear();
    }

    fn push_block(&mut self, node: Node) {
        self.flush();
        self.nodes.push(node);
    }

    fn visit(&mut self, items: &[Item]) {
        for item in items {
            match item {
                Item::Text { span, .. } => self.inline.push_str(&self.src[span.clone()]),
                Item::Comment { .. } => {}
                Item::Element(el) => self.visit_element(el),
            }
        }
    }

    fn visit_element(&mut self, el: &Element) {
        let tag = el.tag();
        let tag = tag.as_str();

        if STRIPPED.contains(&tag) {
            return;
        }
        if CONTAINERS.contains(&tag) {
            self.flush();
            self.visit(&el.children);
            self.flush();
            return;
        }
        if TEXT_BLOCKS.contains(&tag) {
            let html = self.src[el.span.clone()].trim().to_string();
            self.push_block(Node::empty(ComponentType::Text).with_content(html));
            return;
        }
        match tag {
            "img" => self.push_block(image_node(el)),
            "hr" => self.push_block(Node::empty(ComponentType::Divider)),
            "table" => {
                let inner = inner_html(self.src, el);
                self.push_block(Node::empty(ComponentType::Table).with_content(inner));
            }
            "button" => {
                let inner = inner_html(self.src, el);
                self.push_block(Node::empty(ComponentType::Button).with_content(inner));
            }
            "a" if has_button_class(el) => {
                let mut button =
                    Node::empty(ComponentType::Button).with_content(inner_html(self.src, el));
                if let Some(href) = el.attr("href") {
                    button = button.with_prop("href", href);
                }
                self.push_block(button);
            }
            _ => self.inline.push_str(&self.src[el.span.clone()]),
        }
    }
}

fn image_node(el: &Element) -> Node {
    let mut node = Node::empty(ComponentType::Image);
    if let Some(src) = el.attr("src") {
        node = node.with_prop("src", src);
    }
    if let Some(alt) = el.attr("alt") {
        node = node.with_prop("alt", alt);
    }
    if let Some(width) = el.attr("width").and_then(pixel_width) {
        node = node.with_prop("width", width);
    }
    node
}

/// `300` or `300px` → `300px`; relative widths are dropped.
fn pixel_width(value: &str) -> Option<String> {
    let digits = value.trim().trim_end_matches("px");
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(format!("{}px", digits))
    } else {
        None
    }
}

fn has_button_class(el: &Element) -> bool {
    el.attr("class").is_some_and(|class| {
        class
            .split_whitespace()
            .any(|c| c.eq_ignore_ascii_case("button") || c.eq_ignore_ascii_case("btn"))
    })
}

fn inner_html(src: &str, el: &Element) -> String {
    if let Some(raw) = &el.raw_text {
        return raw.trim().to_string();
    }
    match (el.children.first(), el.children.last()) {
        (Some(first), Some(last)) => src[first.span().start..last.span().end].trim().to_string(),
        _ => String::new(),
    }
}
