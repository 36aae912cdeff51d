use std::collections::{BTreeMap, BTreeSet};

use crate::config::CompileOptions;
use crate::head::HeadSettings;
use crate::node::Node;
use crate::schema::get_component_definition;

/// State threaded through rendering: the head and options, the width of the box the
/// current node renders into, and what the document shell must declare afterwards.
pub struct RenderContext<'a> {
    pub head: &'a HeadSettings,
    pub options: &'a CompileOptions,
    /// Content width of the current container, in pixels
    pub box_width: f64,
    /// `mj-column-*` class → CSS width, for the responsive media query
    pub column_classes: BTreeMap<String, String>,
    /// Every `font-family` value written to the output
    pub font_families: BTreeSet<String>,
    pub lang: String,
    pub dir: String,
}

impl<'a> RenderContext<'a> {
    pub fn new(head: &'a HeadSettings, options: &'a CompileOptions, body_width: f64) -> Self {
        Self {
            head,
            options,
            box_width: body_width,
            column_classes: BTreeMap::new(),
            font_families: BTreeSet::new(),
            lang: options.lang.clone(),
            dir: "auto".to_string(),
        }
    }

    /// Resolved attribute value: the node's own prop, then its `mj-class` sets, then the
    /// head defaults for its tag, then `mj-all`, then the schema default.
    pub fn attr<'n>(&self, node: &'n Node, name: &str) -> Option<&'n str>
    where
        'a: 'n,
    {
        if let Some(value) = node.props.get(name) {
            return Some(value);
        }
        if let Some(value) = node
            .props
            .get("mj-class")
            .and_then(|classes| self.head.class_value(classes, name))
        {
            return Some(value);
        }
        self.head
            .tag_default(node.node_type.tag(), name)
            .or_else(|| get_component_definition(node.node_type).default_value(name))
    }

    /// Like [`RenderContext::attr`], empty values count as unset.
    pub fn attr_or<'n>(&self, node: &'n Node, name: &str, fallback: &'n str) -> &'n str
    where
        'a: 'n,
    {
        self.attr(node, name)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(fallback)
    }

    /// Resolved `font-family`, recorded for font imports.
    pub fn font_family<'n>(&mut self, node: &'n Node) -> Option<&'n str>
    where
        'a: 'n,
    {
        let family = self.attr(node, "font-family")?;
        self.font_families.insert(family.to_string());
        Some(family)
    }

    /// Run `f` with `box_width` narrowed to `width`, restoring it afterwards.
    pub fn with_box<T>(&mut self, width: f64, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.box_width;
        self.box_width = width.max(0.0);
        let out = f(self);
        self.box_width = saved;
        out
    }

    pub fn register_column_class(&mut self, class: String, width: String) {
        self.column_classes.entry(class).or_insert(width);
    }
}

/// `"600px"` or `"600"` → 600.0
pub fn parse_px(value: &str) -> Option<f64> {
    let v = value.trim();
    let number = v.strip_suffix("px").unwrap_or(v).trim();
    number.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// `"50%"` → 50.0
pub fn parse_percent(value: &str) -> Option<f64> {
    value
        .trim()
        .strip_suffix('%')
        .and_then(|n| n.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// CSS padding shorthand → `[top, right, bottom, left]` in pixels; non-pixel parts
/// count as zero.
pub fn padding_box(value: Option<&str>) -> [f64; 4] {
    let parts: Vec<f64> = value
        .unwrap_or_default()
        .split_whitespace()
        .map(|p| parse_px(p).unwrap_or(0.0))
        .collect();
    match parts.as_slice() {
        [all] => [*all; 4],
        [v, h] => [*v, *h, *v, *h],
        [t, h, b] => [*t, *h, *b, *h],
        [t, r, b, l, ..] => [*t, *r, *b, *l],
        [] => [0.0; 4],
    }
}

/// Horizontal padding of a shorthand value.
pub fn horizontal_padding(value: Option<&str>) -> f64 {
    let [_, right, _, left] = padding_box(value);
    right + left
}

/// Shortest decimal form: `50.0` → `50`, `33.3333333` → `33.333333`.
pub fn format_number(n: f64) -> String {
    let rounded = (n * 1_000_000.0).round() / 1_000_000.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

/// `prop:value;` pairs for every set, non-empty value.
pub fn css(declarations: &[(&str, Option<&str>)]) -> String {
    declarations
        .iter()
        .filter_map(|(prop, value)| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(|v| format!("{}:{};", prop, v))
        })
        .collect()
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Attributes;
    use crate::schema::ComponentType;

    #[test]
    fn test_attribute_resolution_order() {
        let mut head = HeadSettings::new();
        head.set_tag_default("mj-all", "color", "#111111");
        head.set_tag_default("mj-all", "font-size", "20px");
        head.set_tag_default("mj-text", "color", "#222222");
        head.classes.insert(
            "brand".to_string(),
            Attributes::from([("color".to_string(), "#333333".to_string())]),
        );
        let options = CompileOptions::default();
        let ctx = RenderContext::new(&head, &options, 600.0);

        let plain = Node::empty(ComponentType::Text);
        assert_eq!(ctx.attr(&plain, "color"), Some("#222222"));
        assert_eq!(ctx.attr(&plain, "font-size"), Some("20px"));
        assert_eq!(ctx.attr(&plain, "line-height"), Some("1"));

        let classed = plain.clone().with_prop("mj-class", "brand");
        assert_eq!(ctx.attr(&classed, "color"), Some("#333333"));

        let own = classed.with_prop("color", "#444444");
        assert_eq!(ctx.attr(&own, "color"), Some("#444444"));
    }

    #[test]
    fn test_padding_box_shorthands() {
        assert_eq!(padding_box(Some("10px")), [10.0; 4]);
        assert_eq!(padding_box(Some("10px 25px")), [10.0, 25.0, 10.0, 25.0]);
        assert_eq!(padding_box(Some("1px 2px 3px")), [1.0, 2.0, 3.0, 2.0]);
        assert_eq!(padding_box(Some("1px 2px 3px 4px")), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(horizontal_padding(Some("0 5% 0 10px")), 10.0);
        assert_eq!(horizontal_padding(None), 0.0);
    }

    #[test]
    fn test_units_and_numbers() {
        assert_eq!(parse_px("600px"), Some(600.0));
        assert_eq!(parse_px(" 320 "), Some(320.0));
        assert_eq!(parse_px("50%"), None);
        assert_eq!(parse_percent("33.5%"), Some(33.5));
        assert_eq!(format_number(50.0), "50");
        assert_eq!(format_number(100.0 / 3.0), "33.333333");
    }

    #[test]
    fn test_css_skips_unset() {
        assert_eq!(
            css(&[("color", Some("red")), ("margin", None), ("padding", Some(" "))]),
            "color:red;"
        );
    }
}
