use mailcraft_mjml::node::default_social_elements;
use mailcraft_mjml::{
    can_contain, clone_document_with_new_ids, create_default_node, create_node, generate_mjml,
    instantiate_template, locked_regions, node_to_mjml, parse_html_to_node, parse_mjml,
    parse_mjml_to_node, ComponentType, HeadSettings, MjmlError, Node,
};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

fn get_fixture_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(filename);
    path
}

fn read_fixture(filename: &str) -> String {
    fs::read_to_string(get_fixture_path(filename)).unwrap()
}

fn assert_containment(node: &Node) {
    for child in &node.children {
        assert!(
            child.is_raw() || can_contain(node.node_type, child.node_type),
            "<{}> inside <{}>",
            child.node_type,
            node.node_type
        );
        assert_containment(child);
    }
}

fn types(nodes: &[Node]) -> Vec<ComponentType> {
    nodes.iter().map(|n| n.node_type).collect()
}

// Round trips

#[test]
fn test_default_trees_round_trip() {
    for ty in ComponentType::ALL {
        let node = create_default_node(ty);
        let markup = node_to_mjml(&node, 0);
        let parsed = parse_mjml_to_node(&markup).unwrap();
        assert!(
            parsed.structurally_eq(&node),
            "{} did not round-trip through:\n{}",
            ty,
            markup
        );
    }
}

#[test]
fn test_document_round_trip_with_head() {
    let doc = instantiate_template("welcome").unwrap();
    let markup = generate_mjml(&doc.root, &doc.head);
    let parsed = parse_mjml(&markup).unwrap();
    assert!(parsed.root.structurally_eq(&doc.root));
    assert_eq!(parsed.head, doc.head);
    assert_eq!(generate_mjml(&parsed.root, &parsed.head), markup);
}

#[test]
fn test_fixture_round_trip_is_stable() {
    let doc = parse_mjml(&read_fixture("newsletter.mjml")).unwrap();
    let first = generate_mjml(&doc.root, &doc.head);
    let again = parse_mjml(&first).unwrap();
    assert!(again.root.structurally_eq(&doc.root));
    assert_eq!(again.head, doc.head);
    assert_eq!(generate_mjml(&again.root, &again.head), first);
}

#[test]
fn test_attribute_values_survive_escaping() {
    let node = create_node(
        ComponentType::Button,
        [("href", "https://x.test/?a=1&b=\"2\""), ("title", "<Buy> & 'save'")],
    );
    let parsed = parse_mjml_to_node(&node_to_mjml(&node, 0)).unwrap();
    assert!(parsed.structurally_eq(&node));
}

#[test]
fn test_coerced_markup_holding_mj_raw_round_trips() {
    for markup in [
        "<mj-column><mj-section><mj-raw>x</mj-raw></mj-section></mj-column>",
        "<mj-body><mj-column><mj-raw>a</mj-raw></mj-column></mj-body>",
    ] {
        let first = parse_mjml_to_node(markup).unwrap();
        let raw = first.children.iter().find(|c| c.is_raw()).unwrap();
        assert!(raw.content.as_deref().unwrap().contains("</mj-raw>"));

        let again = parse_mjml_to_node(&node_to_mjml(&first, 0)).unwrap();
        assert!(again.structurally_eq(&first), "{} lost content", markup);
    }
}

#[test]
fn test_text_content_with_mjml_tags_round_trips() {
    let mut column = create_default_node(ComponentType::Column);
    column.children = vec![
        Node::empty(ComponentType::Text).with_content("Use <mj-text> tags"),
        create_default_node(ComponentType::Image),
    ];
    let parsed = parse_mjml_to_node(&node_to_mjml(&column, 0)).unwrap();
    assert_eq!(types(&parsed.children), vec![ComponentType::Text, ComponentType::Image]);
    assert!(parsed.structurally_eq(&column));
}

#[test]
fn test_content_whitespace_round_trips() {
    let mut text = create_default_node(ComponentType::Text);
    text.content = Some("  Hi ".to_string());
    let parsed = parse_mjml_to_node(&node_to_mjml(&text, 0)).unwrap();
    assert_eq!(parsed.content.as_deref(), Some("  Hi "));
}

// Concrete scenarios

#[test]
fn test_section_column_text_scenario() {
    let markup = "<mj-section><mj-column><mj-text>Hi</mj-text></mj-column></mj-section>";
    let node = parse_mjml_to_node(markup).unwrap();
    assert_eq!(node.node_type, ComponentType::Section);
    assert_eq!(types(&node.children), vec![ComponentType::Column]);
    assert_eq!(types(&node.children[0].children), vec![ComponentType::Text]);
    assert_eq!(node.children[0].children[0].content.as_deref(), Some("Hi"));

    assert_eq!(
        node_to_mjml(&node, 0),
        "<mj-section>\n  <mj-column>\n    <mj-text>Hi</mj-text>\n  </mj-column>\n</mj-section>"
    );
}

#[test]
fn test_section_inside_column_scenario() {
    let node = parse_mjml_to_node("<mj-column><mj-section>x</mj-section></mj-column>").unwrap();
    assert_eq!(node.node_type, ComponentType::Column);
    assert!(node
        .children
        .iter()
        .all(|c| c.node_type != ComponentType::Section));
    assert_containment(&node);
}

#[test]
fn test_social_block_scenario() {
    let social = create_default_node(ComponentType::Social);
    let expected = default_social_elements();
    assert!(!social.children.is_empty());
    assert_eq!(social.children.len(), expected.len());
    for (got, want) in social.children.iter().zip(&expected) {
        assert!(got.structurally_eq(want));
    }
}

// Invariants

#[test]
fn test_cloned_ids_are_unique() {
    let doc = instantiate_template("newsletter").unwrap();
    let copies = [
        clone_document_with_new_ids(&doc.root),
        clone_document_with_new_ids(&doc.root),
    ];
    let mut seen = HashSet::new();
    let mut total = 0;
    for tree in std::iter::once(&doc.root).chain(copies.iter()) {
        for node in tree.walk() {
            seen.insert(node.id.clone());
            total += 1;
        }
    }
    assert_eq!(seen.len(), total);
}

#[test]
fn test_parsed_fixture_respects_containment() {
    let doc = parse_mjml(&read_fixture("newsletter.mjml")).unwrap();
    assert_containment(&doc.root);

    let body = doc.body().unwrap();
    assert_eq!(
        types(&body.children),
        vec![
            ComponentType::Section,
            ComponentType::Section,
            ComponentType::Raw,
            ComponentType::Section,
        ]
    );
    assert_eq!(
        body.children[2].content.as_deref(),
        Some("<mj-fancy sparkle=\"yes\"><p>kept as is</p></mj-fancy>")
    );
    let second_column = &body.children[1].children[1];
    assert_eq!(
        types(&second_column.children),
        vec![ComponentType::Text, ComponentType::Raw]
    );
}

#[test]
fn test_default_nodes_are_idempotent() {
    for ty in ComponentType::ALL {
        let a = create_default_node(ty);
        let b = create_default_node(ty);
        assert_ne!(a.id, b.id);
        assert!(a.structurally_eq(&b), "{} defaults differ", ty);
    }
}

#[test]
fn test_unclosed_tag_keeps_valid_prefix() {
    let closed = "<mjml><mj-body><mj-section><mj-column><mj-text>Hi</mj-text><mj-image src=\"a.png\" /></mj-column></mj-section></mj-body></mjml>";
    let unclosed = closed.replace("</mj-column>", "");
    let a = parse_mjml_to_node(closed).unwrap();
    let b = parse_mjml_to_node(&unclosed).unwrap();
    assert!(a.structurally_eq(&b));
}

#[test]
fn test_parse_error_position() {
    let err = parse_mjml_to_node("<mjml>\n  <mj-body>\n    <mj-text color=\"red>Hi</mj-text>")
        .unwrap_err();
    assert_eq!(
        err,
        MjmlError::ParseError {
            line: 3,
            column: 20,
            message: "unterminated attribute value for 'color' in <mj-text>".to_string(),
        }
    );
}

// Locked regions

#[test]
fn test_locked_region_matches_parser_nesting() {
    let text = read_fixture("newsletter.mjml");
    let regions = locked_regions(&text).unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].tag, "mj-section");

    let fragment = parse_mjml_to_node(&text[regions[0].span.clone()]).unwrap();
    let doc = parse_mjml_to_node(&text).unwrap();
    let body = &doc.children[0];
    assert!(fragment.structurally_eq(&body.children[0]));
}

// HTML bridge

#[test]
fn test_pasted_html_lands_in_a_column() {
    let pasted = parse_html_to_node("<h2>Hello</h2><p>Some <i>pasted</i> text</p>");
    assert_eq!(pasted.node_type, ComponentType::Column);

    let mut section = create_default_node(ComponentType::Section);
    section.children = vec![pasted];
    let markup = generate_mjml(&section, &HeadSettings::new());
    let reparsed = parse_mjml_to_node(&markup).unwrap();
    let column = &reparsed.children[0].children[0].children[0];
    assert_eq!(types(&column.children), vec![ComponentType::Text, ComponentType::Text]);
    assert_eq!(column.children[1].content.as_deref(), Some("<p>Some <i>pasted</i> text</p>"));
}
