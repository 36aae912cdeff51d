use mailcraft_mjml::{
    compile_document, compile_document_with_options, compile_mjml, compile_mjml_with_options,
    create_default_node, empty_document, instantiate_template, templates, CompileOptions,
    ComponentType, HeadSettings, MjmlError, Node,
};
use std::fs;
use std::path::PathBuf;

fn get_fixture_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(filename);
    path
}

fn compile_fixture(filename: &str) -> String {
    let mjml = fs::read_to_string(get_fixture_path(filename)).unwrap();
    compile_mjml(&mjml).unwrap()
}

fn options(yaml: &str) -> CompileOptions {
    CompileOptions::from_yaml(yaml).unwrap()
}

#[test]
fn test_fixture_compiles_to_full_document() {
    let html = compile_fixture("newsletter.mjml");
    assert!(html.starts_with("<!doctype html>\n<html lang=\"en\""));
    assert!(html.contains("<title>Spring newsletter</title>"));
    assert!(html.contains("What is new this spring</div>"));
    assert!(html.contains(".footer a { color: #888888; }"));
    assert!(html.contains("<body style=\"word-spacing:normal;background-color:#f0f0f0;\">"));
    assert!(html.trim_end().ends_with("</html>"));
}

#[test]
fn test_fixture_responsive_columns_and_breakpoint() {
    let html = compile_fixture("newsletter.mjml");
    assert!(html.contains("@media only screen and (min-width:320px)"));
    assert!(html.contains(".mj-column-per-100 { width:100% !important; max-width: 100%; }"));
    assert!(html.contains(".mj-column-per-50 { width:50% !important; max-width: 50%; }"));
    assert!(html.contains("class=\"mj-column-per-50 mj-outlook-group-fix\""));
}

#[test]
fn test_fixture_fonts_and_head_attributes() {
    let html = compile_fixture("newsletter.mjml");
    assert!(html.contains(
        "<link href=\"https://fonts.googleapis.com/css?family=Roboto:300,400,500,700\" rel=\"stylesheet\" type=\"text/css\">"
    ));
    assert!(html.contains("font-family:Roboto, Arial, sans-serif;"));
    // mj-attributes default for mj-text, then the mj-class override
    assert!(html.contains("color:#333333;\">First <b>story</b></div>"));
    assert!(html.contains("color:#888888;\">Second story</div>"));
}

#[test]
fn test_fixture_passthrough_markup_is_kept() {
    let html = compile_fixture("newsletter.mjml");
    assert!(html.contains("<p class=\"legal\">Unsubscribe</p>"));
    assert!(html.contains("<mj-fancy sparkle=\"yes\"><p>kept as is</p></mj-fancy>"));
    assert!(html.contains("class=\"footer\""));
    assert!(!html.contains("mj-locked"));
}

#[test]
fn test_image_is_clamped_to_column() {
    let html = compile_mjml(
        r#"<mjml><mj-body><mj-section padding="0">
  <mj-column><mj-image src="a.png" width="450px" padding="0" /></mj-column>
  <mj-column><mj-text>side</mj-text></mj-column>
</mj-section></mj-body></mjml>"#,
    )
    .unwrap();
    assert!(html.contains("<td style=\"width:300px;\">"));
    assert!(html.contains("width=\"300\""));
}

#[test]
fn test_fragments_compile() {
    let text = Node::empty(ComponentType::Text).with_content("Just text");
    let html = compile_document(&text, &HeadSettings::new());
    assert!(html.contains(">Just text</div>"));
    assert!(html.contains("mj-column-per-100"));

    let html = compile_document(&create_default_node(ComponentType::Section), &HeadSettings::new());
    assert!(html.contains("max-width:600px;"));
}

#[test]
fn test_strict_soft_and_skip_validation() {
    let mut doc = empty_document();
    let column = doc.root.children[0].children[0].children[0].id.clone();
    let bad = Node::empty(ComponentType::Text)
        .with_prop("color", "not-a-color")
        .with_content("Hi");
    doc.root.insert_child(&column, 0, bad).unwrap();

    let strict = options("validation-level: strict");
    let err = compile_document_with_options(&doc.root, &doc.head, &strict).unwrap_err();
    assert!(matches!(
        err,
        MjmlError::InvalidAttribute { ref attribute, .. } if attribute == "color"
    ));

    let soft = compile_document_with_options(&doc.root, &doc.head, &CompileOptions::default())
        .unwrap();
    assert!(soft.contains("color:not-a-color;"));

    let skip = options("validation-level: skip");
    assert_eq!(
        compile_document_with_options(&doc.root, &doc.head, &skip).unwrap(),
        soft
    );
}

#[test]
fn test_strict_mode_rejects_bad_head() {
    let strict = options("validation-level: strict");
    let result = compile_mjml_with_options(
        "<mjml><mj-head><mj-breakpoint width=\"wide\" /></mj-head><mj-body></mj-body></mjml>",
        &strict,
    );
    assert!(matches!(result, Err(MjmlError::ValidationError(_))));
}

#[test]
fn test_parse_errors_propagate() {
    let result = compile_mjml("<mjml><mj-body><mj-text color='red>");
    assert!(matches!(result, Err(MjmlError::ParseError { .. })));
}

#[test]
fn test_lang_and_minify_options() {
    let opts = options("lang: de\nminify: true\n");
    let html = compile_mjml_with_options("<mjml><mj-body></mj-body></mjml>", &opts).unwrap();
    assert!(html.starts_with("<!doctype html><html lang=\"de\""));
    assert!(!html.contains(">\n<"));

    let html = compile_mjml("<mjml lang=\"fr\" dir=\"rtl\"><mj-body></mj-body></mjml>").unwrap();
    assert!(html.contains("<html lang=\"fr\" dir=\"rtl\""));
}

#[test]
fn test_configured_fonts_follow_usage() {
    let opts = options("fonts:\n  Lato: https://fonts.test/lato.css\n");
    let used = compile_mjml_with_options(
        "<mjml><mj-body><mj-section><mj-column><mj-text font-family=\"'Lato', serif\">x</mj-text></mj-column></mj-section></mj-body></mjml>",
        &opts,
    )
    .unwrap();
    assert!(used.contains("@import url(https://fonts.test/lato.css);"));

    let unused = compile_mjml_with_options(
        "<mjml><mj-body><mj-section><mj-column><mj-text>x</mj-text></mj-column></mj-section></mj-body></mjml>",
        &opts,
    )
    .unwrap();
    assert!(!unused.contains("lato.css"));
}

#[test]
fn test_every_template_compiles_strictly() {
    let strict = options("validation-level: strict");
    for template in templates() {
        let doc = template.instantiate();
        let html = compile_document_with_options(&doc.root, &doc.head, &strict)
            .unwrap_or_else(|e| panic!("{}: {}", template.id, e));
        assert!(html.contains("</body>"), "{}", template.id);
    }
    let receipt = instantiate_template("receipt").unwrap().to_html();
    assert!(receipt.contains("<td>Widget</td>"));
}
