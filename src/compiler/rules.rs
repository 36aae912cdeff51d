//! Per-component lowering rules.
//!
//! Each component type has one [`LayoutRule`]: where it sits inside a column and the
//! function that writes its HTML. Containers render their children through the table,
//! so adding a component means adding one row here.

use std::fmt::{self, Write};

use super::context::{
    css, escape_html, format_number, horizontal_padding, parse_percent, parse_px, RenderContext,
};
use crate::node::Node;
use crate::schema::{find_social_platform, ComponentType};

/// How a component sits inside a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Own padded `<tr><td>` with alignment and container background
    Cell,
    /// Written as is; the parent decides the wrapping
    Bare,
}

pub type RenderFn = fn(&Node, &mut RenderContext<'_>, &mut String) -> fmt::Result;

#[derive(Clone, Copy)]
pub struct LayoutRule {
    pub component: ComponentType,
    pub placement: Placement,
    pub render: RenderFn,
}

const fn rule(component: ComponentType, placement: Placement, render: RenderFn) -> LayoutRule {
    LayoutRule {
        component,
        placement,
        render,
    }
}

use ComponentType as C;
use Placement::{Bare, Cell};

/// Indexed by `ComponentType` discriminant.
static RULES: [LayoutRule; 22] = [
    rule(C::Mjml, Bare, render_mjml),
    rule(C::Body, Bare, render_body),
    rule(C::Wrapper, Bare, render_wrapper),
    rule(C::Section, Bare, render_section),
    rule(C::Column, Bare, render_column),
    rule(C::Text, Cell, render_text),
    rule(C::Image, Cell, render_image),
    rule(C::Button, Cell, render_button),
    rule(C::Divider, Cell, render_divider),
    rule(C::Spacer, Cell, render_spacer),
    rule(C::Social, Cell, render_social),
    rule(C::SocialElement, Bare, render_social_element),
    rule(C::Navbar, Cell, render_navbar),
    rule(C::NavbarLink, Bare, render_navbar_link),
    rule(C::Accordion, Cell, render_accordion),
    rule(C::AccordionElement, Bare, render_accordion_element),
    rule(C::AccordionTitle, Bare, render_accordion_title),
    rule(C::AccordionText, Bare, render_accordion_text),
    rule(C::Carousel, Cell, render_carousel),
    rule(C::CarouselImage, Bare, render_carousel_image),
    rule(C::Table, Cell, render_table),
    rule(C::Raw, Bare, render_raw),
];

pub fn rule_for(component: ComponentType) -> &'static LayoutRule {
    &RULES[component as usize]
}

pub fn all_rules() -> &'static [LayoutRule] {
    &RULES
}

pub fn render_node(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    (rule_for(node.node_type).render)(node, ctx, out)
}

fn render_children(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    for child in &node.children {
        render_node(child, ctx, out)?;
    }
    Ok(())
}

/// ` class="…"` for a `css-class` value, or nothing.
fn class_attr(extra: &[&str], css_class: Option<&str>) -> String {
    let classes: Vec<&str> = extra
        .iter()
        .copied()
        .chain(css_class)
        .filter(|c| !c.trim().is_empty())
        .collect();
    if classes.is_empty() {
        String::new()
    } else {
        format!(" class=\"{}\"", escape_html(&classes.join(" ")))
    }
}

/// First value among the node's own props, its ancestors (nearest first) and the
/// node's resolved defaults.
fn inherited<'a: 'n, 'n>(
    ctx: &RenderContext<'a>,
    node: &'n Node,
    ancestors: &[&'n Node],
    name: &str,
) -> Option<&'n str> {
    node.props
        .get(name)
        .map(String::as_str)
        .or_else(|| ancestors.iter().find_map(|&a| a.props.get(name).map(String::as_str)))
        .or_else(|| ctx.attr(node, name))
        .or_else(|| ancestors.iter().find_map(|&a| ctx.attr(a, name)))
}

// ─── Document structure ─────────────────────────────────────────────────────

fn render_mjml(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    for body in node
        .children
        .iter()
        .filter(|c| c.node_type == ComponentType::Body)
    {
        render_body(body, ctx, out)?;
    }
    Ok(())
}

fn render_body(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    let width = ctx
        .attr(node, "width")
        .and_then(parse_px)
        .unwrap_or(600.0);
    let style = css(&[("background-color", ctx.attr(node, "background-color"))]);
    writeln!(
        out,
        "<div{} style=\"{}\" lang=\"{}\" dir=\"{}\">",
        class_attr(&[], ctx.attr(node, "css-class")),
        style,
        escape_html(&ctx.lang),
        escape_html(&ctx.dir)
    )?;
    ctx.with_box(width, |ctx| render_children(node, ctx, out))?;
    writeln!(out, "</div>")
}

/// Background shorthand from `background-color` and `background-url`.
fn background(ctx: &RenderContext<'_>, node: &Node) -> Option<String> {
    let color = ctx.attr(node, "background-color");
    match ctx.attr(node, "background-url").filter(|u| !u.is_empty()) {
        Some(url) => {
            let repeat = ctx.attr_or(node, "background-repeat", "repeat");
            Some(
                format!(
                    "{} url('{}') center top / auto {}",
                    color.unwrap_or_default(),
                    escape_html(url),
                    repeat
                )
                .trim()
                .to_string(),
            )
        }
        None => color.map(str::to_string),
    }
}

/// Outer box shared by sections and wrappers: centered, at most `box_width` wide,
/// padded, with `inner` rendered in a box narrowed by the horizontal padding.
fn render_section_shell(
    node: &Node,
    ctx: &mut RenderContext<'_>,
    out: &mut String,
    inner: fn(&Node, &mut RenderContext<'_>, &mut String) -> fmt::Result,
) -> fmt::Result {
    let width = ctx.box_width;
    let px = format_number(width);
    let full_width = ctx.attr(node, "full-width") == Some("full-width");
    let background = background(ctx, node);
    let background = background.as_deref();
    let radius = ctx.attr(node, "border-radius");
    let padding = ctx.attr(node, "padding");
    let class = class_attr(&[], ctx.attr(node, "css-class"));

    if full_width {
        writeln!(
            out,
            "<table align=\"center\"{} border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" style=\"{}width:100%;\"><tbody><tr><td>",
            class,
            css(&[("background", background)])
        )?;
    }
    writeln!(
        out,
        "<!--[if mso | IE]><table align=\"center\" border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" style=\"width:{px}px;\" width=\"{px}\"><tr><td style=\"line-height:0px;font-size:0px;mso-line-height-rule:exactly;\"><![endif]-->"
    )?;
    let box_background = if full_width { None } else { background };
    writeln!(
        out,
        "<div{} style=\"margin:0px auto;max-width:{}px;{}\">",
        if full_width { String::new() } else { class },
        px,
        css(&[("background", box_background), ("border-radius", radius)])
    )?;
    writeln!(
        out,
        "<table align=\"center\" border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" style=\"{}width:100%;\">",
        css(&[("background", box_background), ("border-radius", radius)])
    )?;
    writeln!(
        out,
        "<tbody><tr><td style=\"{}\">",
        css(&[
            ("border", ctx.attr(node, "border")),
            ("direction", ctx.attr(node, "direction")),
            ("font-size", Some("0px")),
            ("padding", padding),
            ("text-align", ctx.attr(node, "text-align")),
        ])
    )?;
    ctx.with_box(width - horizontal_padding(padding), |ctx| inner(node, ctx, out))?;
    writeln!(out, "</td></tr></tbody></table>")?;
    writeln!(out, "</div>")?;
    writeln!(out, "<!--[if mso | IE]></td></tr></table><![endif]-->")?;
    if full_width {
        writeln!(out, "</td></tr></tbody></table>")?;
    }
    Ok(())
}

fn render_wrapper(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    render_section_shell(node, ctx, out, render_children)
}

fn render_section(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    render_section_shell(node, ctx, out, render_section_columns)
}

/// Column width as declared or as an equal share of what is left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnWidth {
    Percent(f64),
    Pixels(f64),
}

impl ColumnWidth {
    /// Responsive class name, e.g. `mj-column-per-50` or `mj-column-px-200`.
    pub fn class_name(&self) -> String {
        match self {
            ColumnWidth::Percent(p) => {
                format!("mj-column-per-{}", format_number(*p).replace('.', "-"))
            }
            ColumnWidth::Pixels(px) => {
                format!("mj-column-px-{}", format_number(*px).replace('.', "-"))
            }
        }
    }

    pub fn css_width(&self) -> String {
        match self {
            ColumnWidth::Percent(p) => format!("{}%", format_number(*p)),
            ColumnWidth::Pixels(px) => format!("{}px", format_number(*px)),
        }
    }

    pub fn pixels(&self, box_width: f64) -> f64 {
        match self {
            ColumnWidth::Percent(p) => box_width * p / 100.0,
            ColumnWidth::Pixels(px) => *px,
        }
    }
}

/// Widths of the columns among `columns`, within a section box of `box_width`.
pub fn column_widths(ctx: &RenderContext<'_>, columns: &[&Node], box_width: f64) -> Vec<ColumnWidth> {
    let declared: Vec<Option<ColumnWidth>> = columns
        .iter()
        .map(|col| {
            ctx.attr(col, "width").and_then(|w| {
                parse_percent(w)
                    .map(ColumnWidth::Percent)
                    .or_else(|| parse_px(w).map(ColumnWidth::Pixels))
            })
        })
        .collect();

    let used: f64 = declared
        .iter()
        .flatten()
        .map(|w| match w {
            ColumnWidth::Percent(p) => *p,
            ColumnWidth::Pixels(px) if box_width > 0.0 => px / box_width * 100.0,
            ColumnWidth::Pixels(_) => 0.0,
        })
        .sum();
    let auto = declared.iter().filter(|w| w.is_none()).count();
    let share = if auto == 0 {
        0.0
    } else if used < 100.0 {
        (100.0 - used) / auto as f64
    } else {
        100.0 / columns.len() as f64
    };

    declared
        .into_iter()
        .map(|w| w.unwrap_or(ColumnWidth::Percent(share)))
        .collect()
}

fn render_section_columns(
    node: &Node,
    ctx: &mut RenderContext<'_>,
    out: &mut String,
) -> fmt::Result {
    let box_width = ctx.box_width;
    let columns: Vec<&Node> = node
        .children
        .iter()
        .filter(|c| c.node_type == ComponentType::Column)
        .collect();
    let mut widths = column_widths(ctx, &columns, box_width).into_iter();

    writeln!(
        out,
        "<!--[if mso | IE]><table role=\"presentation\" border=\"0\" cellpadding=\"0\" cellspacing=\"0\"><tr><![endif]-->"
    )?;
    for child in &node.children {
        if child.node_type != ComponentType::Column {
            render_node(child, ctx, out)?;
            continue;
        }
        let width = widths.next().unwrap_or(ColumnWidth::Percent(100.0));
        writeln!(
            out,
            "<!--[if mso | IE]><td style=\"vertical-align:{};width:{}px;\"><![endif]-->",
            ctx.attr_or(child, "vertical-align", "top"),
            format_number(width.pixels(box_width))
        )?;
        render_column_with_width(child, ctx, out, width)?;
        writeln!(out, "<!--[if mso | IE]></td><![endif]-->")?;
    }
    writeln!(out, "<!--[if mso | IE]></tr></table><![endif]-->")
}

fn render_column(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    let box_width = ctx.box_width;
    let width = column_widths(ctx, &[node], box_width)
        .pop()
        .unwrap_or(ColumnWidth::Percent(100.0));
    render_column_with_width(node, ctx, out, width)
}

fn render_column_with_width(
    node: &Node,
    ctx: &mut RenderContext<'_>,
    out: &mut String,
    width: ColumnWidth,
) -> fmt::Result {
    let class = width.class_name();
    ctx.register_column_class(class.clone(), width.css_width());
    let column_px = width.pixels(ctx.box_width);
    let valign = ctx.attr_or(node, "vertical-align", "top");
    let padding = ctx.attr(node, "padding").filter(|p| !p.trim().is_empty());

    writeln!(
        out,
        "<div{} style=\"font-size:0px;text-align:left;direction:ltr;display:inline-block;vertical-align:{};width:100%;\">",
        class_attr(&[&class, "mj-outlook-group-fix"], ctx.attr(node, "css-class")),
        valign
    )?;
    let table_style = css(&[
        ("background-color", ctx.attr(node, "background-color")),
        ("border", ctx.attr(node, "border")),
        ("border-radius", ctx.attr(node, "border-radius")),
        ("vertical-align", Some(valign)),
    ]);
    if let Some(padding) = padding {
        writeln!(
            out,
            "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" width=\"100%\"><tbody><tr><td style=\"padding:{};vertical-align:{};\">",
            padding, valign
        )?;
    }
    writeln!(
        out,
        "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" style=\"{}\" width=\"100%\"><tbody>",
        table_style
    )?;
    ctx.with_box(column_px - horizontal_padding(padding), |ctx| {
        node.children
            .iter()
            .try_for_each(|child| render_column_child(child, ctx, out))
    })?;
    writeln!(out, "</tbody></table>")?;
    if padding.is_some() {
        writeln!(out, "</td></tr></tbody></table>")?;
    }
    writeln!(out, "</div>")
}

/// One row of a column: padded cell for `Cell` components, plain cell otherwise.
fn render_column_child(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    let rule = rule_for(node.node_type);
    match rule.placement {
        Placement::Cell => {
            let padding = ctx.attr(node, "padding");
            writeln!(
                out,
                "<tr><td align=\"{}\"{} style=\"{}\">",
                ctx.attr_or(node, "align", "left"),
                class_attr(&[], ctx.attr(node, "css-class")),
                css(&[
                    ("background", ctx.attr(node, "container-background-color")),
                    ("font-size", Some("0px")),
                    ("padding", padding),
                    ("word-break", Some("break-word")),
                ])
            )?;
            let inner = ctx.box_width - horizontal_padding(padding);
            ctx.with_box(inner, |ctx| (rule.render)(node, ctx, out))?;
            writeln!(out, "</td></tr>")
        }
        Placement::Bare => {
            writeln!(out, "<tr><td>")?;
            (rule.render)(node, ctx, out)?;
            writeln!(out, "</td></tr>")
        }
    }
}

// ─── Content ────────────────────────────────────────────────────────────────

fn render_text(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    let font = ctx.font_family(node);
    let style = css(&[
        ("font-family", font),
        ("font-size", ctx.attr(node, "font-size")),
        ("font-style", ctx.attr(node, "font-style")),
        ("font-weight", ctx.attr(node, "font-weight")),
        ("letter-spacing", ctx.attr(node, "letter-spacing")),
        ("line-height", ctx.attr(node, "line-height")),
        ("text-align", ctx.attr(node, "align")),
        ("text-decoration", ctx.attr(node, "text-decoration")),
        ("text-transform", ctx.attr(node, "text-transform")),
        ("color", ctx.attr(node, "color")),
    ]);
    writeln!(
        out,
        "<div style=\"{}\">{}</div>",
        style,
        node.content.as_deref().unwrap_or_default()
    )
}

fn render_image(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    let box_width = ctx.box_width;
    let width = ctx
        .attr(node, "width")
        .and_then(parse_px)
        .map_or(box_width, |w| w.min(box_width));
    let width = format_number(width.max(0.0));
    let height = ctx
        .attr(node, "height")
        .and_then(parse_px)
        .map(|h| format!("{}px", format_number(h)));
    let href = ctx.attr(node, "href").filter(|h| !h.is_empty());

    writeln!(
        out,
        "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" style=\"border-collapse:collapse;border-spacing:0px;\"><tbody><tr><td style=\"width:{}px;\">",
        width
    )?;
    if let Some(href) = href {
        write!(
            out,
            "<a href=\"{}\" target=\"{}\"",
            escape_html(href),
            ctx.attr_or(node, "target", "_blank")
        )?;
        if let Some(rel) = ctx.attr(node, "rel") {
            write!(out, " rel=\"{}\"", escape_html(rel))?;
        }
        write!(out, ">")?;
    }
    let style = css(&[
        ("border", ctx.attr(node, "border")),
        ("border-radius", ctx.attr(node, "border-radius")),
        ("display", Some("block")),
        ("outline", Some("none")),
        ("text-decoration", Some("none")),
        ("height", Some(height.as_deref().unwrap_or("auto"))),
        ("width", Some("100%")),
        ("font-size", Some("13px")),
    ]);
    write!(
        out,
        "<img alt=\"{}\" src=\"{}\" style=\"{}\"",
        escape_html(ctx.attr(node, "alt").unwrap_or_default()),
        escape_html(ctx.attr(node, "src").unwrap_or_default()),
        style
    )?;
    if let Some(title) = ctx.attr(node, "title") {
        write!(out, " title=\"{}\"", escape_html(title))?;
    }
    write!(
        out,
        " width=\"{}\" height=\"{}\" />",
        width,
        height.as_deref().map_or("auto", |h| h.trim_end_matches("px"))
    )?;
    if href.is_some() {
        write!(out, "</a>")?;
    }
    writeln!(out, "</td></tr></tbody></table>")
}

fn render_button(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    let background = ctx.attr(node, "background-color");
    let radius = ctx.attr(node, "border-radius");
    let inner_padding = ctx.attr(node, "inner-padding");
    let font = ctx.font_family(node);

    writeln!(
        out,
        "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" style=\"border-collapse:separate;{}line-height:100%;\"><tbody><tr>",
        css(&[("width", ctx.attr(node, "width"))])
    )?;
    writeln!(
        out,
        "<td align=\"center\" bgcolor=\"{}\" role=\"presentation\" style=\"{}\" valign=\"{}\">",
        escape_html(background.unwrap_or("none")),
        css(&[
            ("border", ctx.attr(node, "border")),
            ("border-radius", radius),
            ("cursor", Some("auto")),
            ("height", ctx.attr(node, "height")),
            ("mso-padding-alt", inner_padding),
            ("background", background),
        ]),
        ctx.attr_or(node, "vertical-align", "middle")
    )?;
    let link_style = css(&[
        ("display", Some("inline-block")),
        ("background", background),
        ("color", ctx.attr(node, "color")),
        ("font-family", font),
        ("font-size", ctx.attr(node, "font-size")),
        ("font-weight", ctx.attr(node, "font-weight")),
        ("line-height", ctx.attr(node, "line-height")),
        ("margin", Some("0")),
        ("text-decoration", ctx.attr(node, "text-decoration")),
        ("text-transform", ctx.attr(node, "text-transform")),
        ("padding", inner_padding),
        ("mso-padding-alt", Some("0px")),
        ("border-radius", radius),
    ]);
    writeln!(
        out,
        "<a href=\"{}\" style=\"{}\" target=\"{}\">{}</a>",
        escape_html(ctx.attr_or(node, "href", "#")),
        link_style,
        ctx.attr_or(node, "target", "_blank"),
        node.content.as_deref().unwrap_or_default()
    )?;
    writeln!(out, "</td></tr></tbody></table>")
}

fn render_divider(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    let margin = match ctx.attr_or(node, "align", "center") {
        "left" => "0px",
        "right" => "0px 0px 0px auto",
        _ => "0px auto",
    };
    let border = format!(
        "{} {} {}",
        ctx.attr_or(node, "border-style", "solid"),
        ctx.attr_or(node, "border-width", "4px"),
        ctx.attr_or(node, "border-color", "#000000")
    );
    writeln!(
        out,
        "<p style=\"{}\"></p>",
        css(&[
            ("border-top", Some(border.as_str())),
            ("font-size", Some("1px")),
            ("margin", Some(margin)),
            ("width", ctx.attr(node, "width")),
        ])
    )
}

fn render_spacer(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    let height = ctx.attr_or(node, "height", "20px");
    writeln!(
        out,
        "<div style=\"height:{};line-height:{};\">&#8202;</div>",
        height, height
    )
}

fn render_table(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    let font = ctx.font_family(node);
    let style = css(&[
        ("color", ctx.attr(node, "color")),
        ("font-family", font),
        ("font-size", ctx.attr(node, "font-size")),
        ("line-height", ctx.attr(node, "line-height")),
        ("table-layout", ctx.attr(node, "table-layout")),
        ("width", ctx.attr(node, "width")),
        ("border", ctx.attr(node, "border")),
    ]);
    writeln!(
        out,
        "<table cellpadding=\"{}\" cellspacing=\"{}\" width=\"{}\" border=\"0\" style=\"{}\">{}</table>",
        escape_html(ctx.attr_or(node, "cellpadding", "0")),
        escape_html(ctx.attr_or(node, "cellspacing", "0")),
        escape_html(ctx.attr_or(node, "width", "100%")),
        style,
        node.content.as_deref().unwrap_or_default()
    )
}

fn render_raw(node: &Node, _ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    writeln!(out, "{}", node.content.as_deref().unwrap_or_default())
}

// ─── Social ─────────────────────────────────────────────────────────────────

fn render_social(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    let vertical = ctx.attr(node, "mode") == Some("vertical");
    let elements = node
        .children
        .iter()
        .filter(|c| c.node_type == ComponentType::SocialElement);

    if vertical {
        writeln!(
            out,
            "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" style=\"margin:0px;\"><tbody>"
        )?;
        for element in elements {
            write!(out, "<tr>")?;
            social_element_cells(element, &[node], ctx, out)?;
            writeln!(out, "</tr>")?;
        }
        return writeln!(out, "</tbody></table>");
    }

    let align = ctx.attr_or(node, "align", "center");
    for element in elements {
        write!(
            out,
            "<table align=\"{}\" border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" style=\"float:none;display:inline-table;\"><tbody><tr>",
            align
        )?;
        social_element_cells(element, &[node], ctx, out)?;
        writeln!(out, "</tr></tbody></table>")?;
    }
    Ok(())
}

fn render_social_element(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    write!(
        out,
        "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\"><tbody><tr>"
    )?;
    social_element_cells(node, &[], ctx, out)?;
    writeln!(out, "</tr></tbody></table>")
}

fn social_element_cells(
    node: &Node,
    ancestors: &[&Node],
    ctx: &mut RenderContext<'_>,
    out: &mut String,
) -> fmt::Result {
    let platform = node.props.get("name").and_then(|n| find_social_platform(n));
    let icon_size = inherited(ctx, node, ancestors, "icon-size").unwrap_or("20px");
    let icon_px = parse_px(icon_size).map_or_else(|| "20".to_string(), format_number);
    let radius = inherited(ctx, node, ancestors, "border-radius");
    let padding = node
        .props
        .get("padding")
        .map(String::as_str)
        .or_else(|| ancestors.iter().find_map(|&a| ctx.attr(a, "inner-padding")))
        .unwrap_or("4px");
    let background = ctx
        .attr(node, "background-color")
        .or(platform.map(|p| p.color));
    let src = ctx
        .attr(node, "src")
        .map(str::to_string)
        .or_else(|| platform.map(|p| p.icon_url()))
        .unwrap_or_default();
    let href = escape_html(ctx.attr_or(node, "href", "#"));
    let target = ctx.attr_or(node, "target", "_blank");
    let alt = ctx
        .attr(node, "alt")
        .or(platform.map(|p| p.label))
        .unwrap_or_default();

    write!(
        out,
        "<td style=\"padding:{};vertical-align:middle;\"><table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" style=\"{}width:{};\"><tbody><tr><td style=\"font-size:0;height:{};vertical-align:middle;width:{};\">",
        padding,
        css(&[("background", background), ("border-radius", radius)]),
        icon_size,
        icon_size,
        icon_size
    )?;
    write!(
        out,
        "<a href=\"{}\" target=\"{}\"><img alt=\"{}\" height=\"{}\" src=\"{}\" style=\"{}display:block;\" width=\"{}\" /></a></td></tr></tbody></table></td>",
        href,
        target,
        escape_html(alt),
        icon_px,
        escape_html(&src),
        css(&[("border-radius", radius)]),
        icon_px
    )?;

    let label = node.content.as_deref().unwrap_or_default();
    if !label.trim().is_empty() {
        let font = ancestors
            .iter()
            .find_map(|&a| ctx.font_family(a))
            .or_else(|| ctx.font_family(node));
        let style = css(&[
            ("color", inherited(ctx, node, ancestors, "color")),
            ("font-size", inherited(ctx, node, ancestors, "font-size")),
            ("font-family", font),
            ("line-height", inherited(ctx, node, ancestors, "line-height")),
            ("text-decoration", inherited(ctx, node, ancestors, "text-decoration")),
        ]);
        write!(
            out,
            "<td style=\"vertical-align:middle;padding:4px 4px 4px 0;\"><a href=\"{}\" style=\"{}\" target=\"{}\">{}</a></td>",
            href, style, target, label
        )?;
    }
    Ok(())
}

// ─── Navigation ─────────────────────────────────────────────────────────────

fn render_navbar(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    let base_url = ctx.attr(node, "base-url").unwrap_or_default();
    writeln!(out, "<div class=\"mj-inline-links\">")?;
    for link in node
        .children
        .iter()
        .filter(|c| c.node_type == ComponentType::NavbarLink)
    {
        navbar_link(link, base_url, ctx, out)?;
    }
    writeln!(out, "</div>")
}

fn render_navbar_link(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    navbar_link(node, "", ctx, out)
}

fn navbar_link(
    node: &Node,
    base_url: &str,
    ctx: &mut RenderContext<'_>,
    out: &mut String,
) -> fmt::Result {
    let font = ctx.font_family(node);
    let href = format!("{}{}", base_url, ctx.attr_or(node, "href", "#"));
    let style = css(&[
        ("display", Some("inline-block")),
        ("color", ctx.attr(node, "color")),
        ("font-family", font),
        ("font-size", ctx.attr(node, "font-size")),
        ("font-weight", ctx.attr(node, "font-weight")),
        ("line-height", ctx.attr(node, "line-height")),
        ("text-decoration", ctx.attr(node, "text-decoration")),
        ("text-transform", ctx.attr(node, "text-transform")),
        ("padding", ctx.attr(node, "padding")),
    ]);
    write!(
        out,
        "<a{} href=\"{}\"",
        class_attr(&["mj-link"], ctx.attr(node, "css-class")),
        escape_html(&href)
    )?;
    if let Some(target) = ctx.attr(node, "target") {
        write!(out, " target=\"{}\"", target)?;
    }
    writeln!(
        out,
        " style=\"{}\">{}</a>",
        style,
        node.content.as_deref().unwrap_or_default()
    )
}

// ─── Interactive ────────────────────────────────────────────────────────────

// Accordions render expanded; there is no checkbox toggle.
fn render_accordion(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    let font = ctx.font_family(node);
    writeln!(
        out,
        "<div class=\"mj-accordion\" style=\"{}\">",
        css(&[("border", ctx.attr(node, "border")), ("font-family", font)])
    )?;
    for element in node
        .children
        .iter()
        .filter(|c| c.node_type == ComponentType::AccordionElement)
    {
        accordion_element(element, &[node], ctx, out)?;
    }
    writeln!(out, "</div>")
}

fn render_accordion_element(
    node: &Node,
    ctx: &mut RenderContext<'_>,
    out: &mut String,
) -> fmt::Result {
    accordion_element(node, &[], ctx, out)
}

fn accordion_element(
    node: &Node,
    ancestors: &[&Node],
    ctx: &mut RenderContext<'_>,
    out: &mut String,
) -> fmt::Result {
    writeln!(
        out,
        "<div class=\"mj-accordion-element\" style=\"{}\">",
        css(&[
            ("background-color", ctx.attr(node, "background-color")),
            ("border-bottom", inherited(ctx, node, ancestors, "border")),
        ])
    )?;
    let mut chain: Vec<&Node> = vec![node];
    chain.extend_from_slice(ancestors);
    for part in &node.children {
        match part.node_type {
            ComponentType::AccordionTitle => accordion_part(part, "mj-accordion-title", &chain, ctx, out)?,
            ComponentType::AccordionText => accordion_part(part, "mj-accordion-content", &chain, ctx, out)?,
            _ => render_node(part, ctx, out)?,
        }
    }
    writeln!(out, "</div>")
}

fn render_accordion_title(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    accordion_part(node, "mj-accordion-title", &[], ctx, out)
}

fn render_accordion_text(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    accordion_part(node, "mj-accordion-content", &[], ctx, out)
}

fn accordion_part(
    node: &Node,
    class: &str,
    ancestors: &[&Node],
    ctx: &mut RenderContext<'_>,
    out: &mut String,
) -> fmt::Result {
    let font = inherited(ctx, node, ancestors, "font-family");
    if let Some(font) = font {
        ctx.font_families.insert(font.to_string());
    }
    let style = css(&[
        ("background-color", inherited(ctx, node, ancestors, "background-color")),
        ("color", inherited(ctx, node, ancestors, "color")),
        ("font-family", font),
        ("font-size", ctx.attr(node, "font-size")),
        ("line-height", ctx.attr(node, "line-height")),
        ("padding", ctx.attr(node, "padding")),
    ]);
    writeln!(
        out,
        "<div class=\"{}\" style=\"{}\">{}</div>",
        class,
        style,
        node.content.as_deref().unwrap_or_default()
    )
}

/// First image shown, the rest hidden; thumbnails link to nothing.
fn render_carousel(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    let images: Vec<&Node> = node
        .children
        .iter()
        .filter(|c| c.node_type == ComponentType::CarouselImage)
        .collect();
    let radius = ctx.attr(node, "border-radius");
    writeln!(
        out,
        "<div class=\"mj-carousel\" style=\"text-align:{};\">",
        ctx.attr_or(node, "align", "center")
    )?;
    for (i, image) in images.iter().enumerate() {
        let hidden = if i == 0 { "" } else { "display:none;mso-hide:all;" };
        write!(
            out,
            "<div class=\"mj-carousel-image mj-carousel-image-{}\" style=\"{}\">",
            i + 1,
            hidden
        )?;
        carousel_image(image, radius, ctx, out)?;
        writeln!(out, "</div>")?;
    }

    if ctx.attr(node, "thumbnails") == Some("visible") && images.len() > 1 {
        let thumb = format_number((ctx.box_width / images.len() as f64).min(110.0).floor());
        let border = ctx.attr_or(node, "tb-border", "2px solid transparent");
        writeln!(out, "<div class=\"mj-carousel-thumbnails\">")?;
        for (i, image) in images.iter().enumerate() {
            let src = ctx
                .attr(image, "thumbnails-src")
                .or_else(|| ctx.attr(image, "src"))
                .unwrap_or_default();
            writeln!(
                out,
                "<a class=\"mj-carousel-thumbnail mj-carousel-thumbnail-{}\" href=\"#\" style=\"{}display:inline-block;overflow:hidden;width:{}px;\"><img alt=\"{}\" src=\"{}\" style=\"display:block;width:100%;height:auto;\" width=\"{}\" /></a>",
                i + 1,
                css(&[("border", Some(border)), ("border-radius", radius)]),
                thumb,
                escape_html(ctx.attr(image, "alt").unwrap_or_default()),
                escape_html(src),
                thumb
            )?;
        }
        writeln!(out, "</div>")?;
    }
    writeln!(out, "</div>")
}

fn render_carousel_image(node: &Node, ctx: &mut RenderContext<'_>, out: &mut String) -> fmt::Result {
    carousel_image(node, None, ctx, out)?;
    writeln!(out)
}

fn carousel_image(
    node: &Node,
    radius: Option<&str>,
    ctx: &mut RenderContext<'_>,
    out: &mut String,
) -> fmt::Result {
    let width = format_number(ctx.box_width.max(0.0));
    let href = ctx.attr(node, "href").filter(|h| !h.is_empty());
    if let Some(href) = href {
        write!(
            out,
            "<a href=\"{}\" target=\"{}\">",
            escape_html(href),
            ctx.attr_or(node, "target", "_blank")
        )?;
    }
    write!(
        out,
        "<img alt=\"{}\" src=\"{}\" style=\"{}display:block;width:{}px;max-width:100%;height:auto;\" width=\"{}\" border=\"0\" />",
        escape_html(ctx.attr(node, "alt").unwrap_or_default()),
        escape_html(ctx.attr(node, "src").unwrap_or_default()),
        css(&[("border-radius", radius)]),
        width,
        width
    )?;
    if href.is_some() {
        write!(out, "</a>")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompileOptions;
    use crate::head::HeadSettings;
    use crate::node::create_default_node;

    fn render(node: &Node, box_width: f64) -> String {
        let head = HeadSettings::new();
        let options = CompileOptions::default();
        let mut ctx = RenderContext::new(&head, &options, box_width);
        let mut out = String::new();
        render_node(node, &mut ctx, &mut out).unwrap();
        out
    }

    #[test]
    fn test_every_component_has_its_rule() {
        for ty in ComponentType::ALL {
            assert_eq!(rule_for(ty).component, ty);
        }
        assert_eq!(all_rules().len(), ComponentType::ALL.len());
    }

    #[test]
    fn test_column_widths_share_remaining_space() {
        let head = HeadSettings::new();
        let options = CompileOptions::default();
        let ctx = RenderContext::new(&head, &options, 600.0);
        let fixed = Node::empty(ComponentType::Column).with_prop("width", "200px");
        let auto = Node::empty(ComponentType::Column);
        let widths = column_widths(&ctx, &[&fixed, &auto, &auto], 600.0);
        assert_eq!(widths[0], ColumnWidth::Pixels(200.0));
        assert_eq!(widths[1].class_name(), "mj-column-per-33-333333");
        assert_eq!(widths[2].css_width(), "33.333333%");
    }

    #[test]
    fn test_image_is_clamped_to_its_box() {
        let image = Node::empty(ComponentType::Image)
            .with_prop("src", "a.png")
            .with_prop("width", "900px");
        let html = render(&image, 550.0);
        assert!(html.contains("width=\"550\""));
        assert!(html.contains("<td style=\"width:550px;\">"));

        let small = Node::empty(ComponentType::Image).with_prop("width", "120px");
        assert!(render(&small, 550.0).contains("width=\"120\""));
    }

    #[test]
    fn test_section_lays_out_columns() {
        let mut section = create_default_node(ComponentType::Section);
        section.children.push(create_default_node(ComponentType::Column));
        let html = render(&section, 600.0);
        assert!(html.contains("max-width:600px;"));
        assert!(html.contains("class=\"mj-column-per-50 mj-outlook-group-fix\""));
        assert!(html.contains("padding:20px 0;"));
    }

    #[test]
    fn test_text_keeps_inline_html() {
        let text = Node::empty(ComponentType::Text).with_content("Hello <b>you</b>");
        let html = render(&text, 600.0);
        assert!(html.contains(">Hello <b>you</b></div>"));
        assert!(html.contains("font-size:13px;"));
    }

    #[test]
    fn test_social_uses_platform_catalog() {
        let social = create_default_node(ComponentType::Social);
        let html = render(&social, 600.0);
        assert!(html.contains("facebook"));
        assert_eq!(html.matches("display:inline-table;").count(), 3);
    }

    #[test]
    fn test_raw_passes_through() {
        let raw = Node::empty(ComponentType::Raw).with_content("<mj-weird>x</mj-weird>");
        assert_eq!(render(&raw, 600.0), "<mj-weird>x</mj-weird>\n");
    }
}
