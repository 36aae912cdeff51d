//! MJML → email-safe HTML.
//!
//! The body tree is lowered through the per-component rule table in [`rules`]; this
//! module validates the input, picks the body to render and writes the document shell
//! around it (head, fonts, responsive CSS, preview text).

mod context;
mod rules;

pub use context::{
    css, escape_html, format_number, horizontal_padding, padding_box, parse_percent, parse_px,
    RenderContext,
};
pub use rules::{
    all_rules, column_widths, render_node, rule_for, ColumnWidth, LayoutRule, Placement, RenderFn,
};

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::{CompileOptions, ValidationLevel};
use crate::error::MjmlResult;
use crate::head::HeadSettings;
use crate::node::Node;
use crate::parser::parse_mjml;
use crate::schema::ComponentType;
use crate::validator::{collect_issues, validate_head, validate_tree};

const BASE_CSS: &str = "#outlook a { padding:0; }
body { margin:0;padding:0;-webkit-text-size-adjust:100%;-ms-text-size-adjust:100%; }
table, td { border-collapse:collapse;mso-table-lspace:0pt;mso-table-rspace:0pt; }
img { border:0;height:auto;line-height:100%; outline:none;text-decoration:none;-ms-interpolation-mode:bicubic; }
p { display:block;margin:13px 0; }";

const MSO_SETTINGS: &str = "<!--[if mso]>
<noscript>
<xml>
<o:OfficeDocumentSettings>
<o:AllowPNG/>
<o:PixelsPerInch>96</o:PixelsPerInch>
</o:OfficeDocumentSettings>
</xml>
</noscript>
<![endif]-->
<!--[if lte mso 11]>
<style type=\"text/css\">
.mj-outlook-group-fix { width:100% !important; }
</style>
<![endif]-->";

const PREVIEW_STYLE: &str = "display:none;font-size:1px;color:#ffffff;line-height:1px;max-height:0px;max-width:0px;opacity:0;overflow:hidden;";

/// HTML for a document tree with default options. Never fails: validation problems are
/// logged, not raised.
pub fn compile_document(root: &Node, head: &HeadSettings) -> String {
    compile_document_with_options(root, head, &CompileOptions::default()).unwrap_or_default()
}

/// HTML for a document tree. With [`ValidationLevel::Strict`] the first validation
/// problem is returned instead.
pub fn compile_document_with_options(
    root: &Node,
    head: &HeadSettings,
    options: &CompileOptions,
) -> MjmlResult<String> {
    match options.validation_level {
        ValidationLevel::Strict => {
            validate_tree(root)?;
            validate_head(head)?;
        }
        ValidationLevel::Soft => {
            for issue in collect_issues(root) {
                warn!(%issue, "compiling despite validation issue");
            }
            if let Err(issue) = validate_head(head) {
                warn!(%issue, "compiling despite head issue");
            }
        }
        ValidationLevel::Skip => {}
    }

    let body = document_body(root);
    let mut ctx = RenderContext::new(head, options, 600.0);
    if root.node_type == ComponentType::Mjml {
        if let Some(lang) = root.props.get("lang").filter(|l| !l.trim().is_empty()) {
            ctx.lang = lang.clone();
        }
        if let Some(dir) = root.props.get("dir").filter(|d| !d.trim().is_empty()) {
            ctx.dir = dir.clone();
        }
    }

    let mut content = String::new();
    render_node(&body, &mut ctx, &mut content)?;
    debug!(
        nodes = body.descendant_count(),
        columns = ctx.column_classes.len(),
        "rendered body"
    );

    let html = write_shell(&ctx, &body, &content)?;
    Ok(if options.minify { minify(&html) } else { html })
}

/// Parse MJML text and compile it with default options.
pub fn compile_mjml(text: &str) -> MjmlResult<String> {
    compile_mjml_with_options(text, &CompileOptions::default())
}

pub fn compile_mjml_with_options(text: &str, options: &CompileOptions) -> MjmlResult<String> {
    let document = parse_mjml(text)?;
    compile_document_with_options(&document.root, &document.head, options)
}

/// The `mj-body` to render for `root`. Fragments are wrapped in the containers they
/// need: a section goes into a body, a leaf into body → section → column.
pub fn document_body(root: &Node) -> Cow<'_, Node> {
    use ComponentType as C;
    match root.node_type {
        C::Mjml => match root.children.iter().find(|c| c.node_type == C::Body) {
            Some(body) => Cow::Borrowed(body),
            None => Cow::Owned(Node::empty(C::Body)),
        },
        C::Body => Cow::Borrowed(root),
        C::Section | C::Wrapper | C::Raw => {
            Cow::Owned(Node::empty(C::Body).with_children(vec![root.clone()]))
        }
        C::Column => Cow::Owned(wrap(root.clone(), &[C::Section, C::Body])),
        _ => Cow::Owned(wrap(root.clone(), &[C::Column, C::Section, C::Body])),
    }
}

fn wrap(node: Node, containers: &[ComponentType]) -> Node {
    containers.iter().fold(node, |inner, &container| {
        Node::empty(container).with_children(vec![inner])
    })
}

/// Family names in a `font-family` list, without quotes.
fn family_names(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(',')
        .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|f| !f.is_empty())
}

/// Fonts to import: every head font, plus configured fonts a rendered family uses.
fn font_imports<'c>(ctx: &'c RenderContext<'_>) -> BTreeMap<&'c str, &'c str> {
    let used: Vec<&str> = ctx
        .font_families
        .iter()
        .flat_map(|f| family_names(f))
        .collect();
    let mut imports: BTreeMap<&str, &str> = ctx
        .options
        .fonts
        .iter()
        .filter(|(name, _)| used.iter().any(|u| u.eq_ignore_ascii_case(name)))
        .map(|(name, href)| (name.as_str(), href.as_str()))
        .collect();
    for font in &ctx.head.fonts {
        imports.insert(font.name.as_str(), font.href.as_str());
    }
    imports
}

fn write_shell(ctx: &RenderContext<'_>, body: &Node, content: &str) -> MjmlResult<String> {
    let head = ctx.head;
    let mut out = String::with_capacity(content.len() + 4096);

    writeln!(out, "<!doctype html>")?;
    writeln!(
        out,
        "<html lang=\"{}\" dir=\"{}\" xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:v=\"urn:schemas-microsoft-com:vml\" xmlns:o=\"urn:schemas-microsoft-com:office:office\">",
        escape_html(&ctx.lang),
        escape_html(&ctx.dir)
    )?;
    writeln!(out, "<head>")?;
    writeln!(
        out,
        "<title>{}</title>",
        escape_html(head.title.as_deref().unwrap_or_default())
    )?;
    writeln!(out, "<!--[if !mso]><!-->")?;
    writeln!(out, "<meta http-equiv=\"X-UA-Compatible\" content=\"IE=edge\">")?;
    writeln!(out, "<!--<![endif]-->")?;
    writeln!(out, "<meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\">")?;
    writeln!(out, "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">")?;
    writeln!(out, "<style type=\"text/css\">\n{}\n</style>", BASE_CSS)?;
    writeln!(out, "{}", MSO_SETTINGS)?;

    let fonts = font_imports(ctx);
    if !fonts.is_empty() {
        writeln!(out, "<!--[if !mso]><!-->")?;
        for href in fonts.values() {
            writeln!(out, "<link href=\"{}\" rel=\"stylesheet\" type=\"text/css\">", escape_html(href))?;
        }
        writeln!(out, "<style type=\"text/css\">")?;
        for href in fonts.values() {
            writeln!(out, "@import url({});", href)?;
        }
        writeln!(out, "</style>")?;
        writeln!(out, "<!--<![endif]-->")?;
    }

    if !ctx.column_classes.is_empty() {
        writeln!(out, "<style type=\"text/css\">")?;
        writeln!(
            out,
            "@media only screen and (min-width:{}) {{",
            head.breakpoint_or_default()
        )?;
        for (class, width) in &ctx.column_classes {
            writeln!(out, ".{} {{ width:{} !important; max-width: {}; }}", class, width, width)?;
        }
        writeln!(out, "}}")?;
        writeln!(out, "</style>")?;
    }

    for style in &head.styles {
        writeln!(out, "<style type=\"text/css\">\n{}\n</style>", style.css.trim())?;
    }
    writeln!(out, "</head>")?;

    let body_style = css(&[
        ("word-spacing", Some("normal")),
        ("background-color", ctx.attr(body, "background-color")),
    ]);
    writeln!(out, "<body style=\"{}\">", body_style)?;
    if let Some(preview) = head.preview.as_deref().filter(|p| !p.is_empty()) {
        writeln!(out, "<div style=\"{}\">{}</div>", PREVIEW_STYLE, escape_html(preview))?;
    }
    out.push_str(content);
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;
    Ok(out)
}

fn minify(html: &str) -> String {
    static BETWEEN_TAGS: OnceLock<Regex> = OnceLock::new();
    let re = BETWEEN_TAGS.get_or_init(|| Regex::new(r">\s+<").unwrap());
    re.replace_all(html.trim(), "><").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::create_default_node;

    #[test]
    fn test_document_body_wraps_fragments() {
        let text = Node::empty(ComponentType::Text).with_content("hi");
        let body = document_body(&text);
        assert_eq!(body.node_type, ComponentType::Body);
        assert_eq!(body.children[0].node_type, ComponentType::Section);
        assert_eq!(body.children[0].children[0].node_type, ComponentType::Column);
        assert_eq!(body.children[0].children[0].children[0].content.as_deref(), Some("hi"));

        let mjml = create_default_node(ComponentType::Mjml);
        assert!(matches!(document_body(&mjml), Cow::Borrowed(_)));
    }

    #[test]
    fn test_shell_declares_columns_and_fonts() {
        let html = compile_mjml(
            "<mjml><mj-body><mj-section><mj-column><mj-text>Hi</mj-text></mj-column></mj-section></mj-body></mjml>",
        )
        .unwrap();
        assert!(html.starts_with("<!doctype html>"));
        assert!(html.contains("@media only screen and (min-width:480px)"));
        assert!(html.contains(".mj-column-per-100 { width:100% !important; max-width: 100%; }"));
        assert!(html.contains("family=Ubuntu"));
        assert!(html.contains(">Hi</div>"));
    }

    #[test]
    fn test_minify_collapses_whitespace_between_tags() {
        assert_eq!(minify("<a>\n  <b>x</b>\n</a>\n"), "<a><b>x</b></a>");
    }

    #[test]
    fn test_body_background_reaches_body_tag() {
        let html = compile_mjml(
            "<mjml><mj-body background-color=\"#eeeeee\"><mj-section></mj-section></mj-body></mjml>",
        )
        .unwrap();
        assert!(html.contains("<body style=\"word-spacing:normal;background-color:#eeeeee;\">"));
    }
}
