use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::error::{MjmlError, MjmlResult};
use crate::head::HeadSettings;
use crate::node::Node;
use crate::schema::{can_contain, get_component_definition, AttributeKind, LOCKED_ATTRIBUTE};

/// Validate a tree, returning the first problem found in document order.
pub fn validate_tree(root: &Node) -> MjmlResult<()> {
    match collect_issues(root).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Every problem in the tree: duplicate ids, schema violations and invalid
/// attribute values. `mj-raw` nodes may appear under any parent.
pub fn collect_issues(root: &Node) -> Vec<MjmlError> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    check_node(root, None, &mut seen, &mut issues);
    issues
}

fn check_node<'a>(
    node: &'a Node,
    parent: Option<&Node>,
    seen: &mut HashSet<&'a str>,
    issues: &mut Vec<MjmlError>,
) {
    if !seen.insert(node.id.as_str()) {
        issues.push(MjmlError::DuplicateId {
            id: node.id.clone(),
        });
    }
    if let Some(parent) = parent {
        if !node.is_raw() && !can_contain(parent.node_type, node.node_type) {
            issues.push(MjmlError::SchemaViolation {
                parent: parent.node_type.tag().to_string(),
                child: node.node_type.tag().to_string(),
            });
        }
    }
    let def = get_component_definition(node.node_type);
    if node.content.is_some() && !def.ending_tag {
        issues.push(MjmlError::ValidationError(format!(
            "<{}> cannot carry text content",
            def.tag
        )));
    }
    for (name, value) in &node.props {
        if let Err(err) = validate_attribute(node, name, value) {
            issues.push(err);
        }
    }
    for child in &node.children {
        check_node(child, Some(node), seen, issues);
    }
}

/// Check one attribute value against the component's declared kind. Attributes the
/// schema does not declare are accepted as is.
pub fn validate_attribute(node: &Node, name: &str, value: &str) -> MjmlResult<()> {
    let def = get_component_definition(node.node_type);
    let invalid = |reason: String| MjmlError::InvalidAttribute {
        component: def.tag.to_string(),
        attribute: name.to_string(),
        value: value.to_string(),
        reason,
    };

    if name == LOCKED_ATTRIBUTE {
        return match value {
            "" | "true" | "false" => Ok(()),
            _ => Err(invalid("must be \"true\" or \"false\"".to_string())),
        };
    }
    let Some(attr) = def.attribute(name) else {
        return Ok(());
    };

    match attr.kind {
        AttributeKind::Color => validate_color(value).map_err(invalid),
        AttributeKind::Unit => validate_unit(value).map_err(invalid),
        AttributeKind::Enum(allowed) => {
            if allowed.contains(&value) {
                Ok(())
            } else {
                Err(invalid(format!("must be one of: {}", allowed.join(", "))))
            }
        }
        AttributeKind::Url => validate_url(value).map_err(invalid),
        AttributeKind::Boolean => match value {
            "true" | "false" => Ok(()),
            _ => Err(invalid("must be \"true\" or \"false\"".to_string())),
        },
        AttributeKind::Integer => value
            .trim()
            .parse::<i64>()
            .map(|_| ())
            .map_err(|_| invalid("must be an integer".to_string())),
        AttributeKind::Text => Ok(()),
    }
}

/// Hex (`#rgb`, `#rrggbb`, `#rrggbbaa`), `rgb()`/`rgba()` or a named color.
pub fn validate_color(value: &str) -> Result<(), String> {
    static COLOR_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = COLOR_REGEX.get_or_init(|| {
        Regex::new(
            r"^(#([0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})|rgba?\(\s*\d{1,3}\s*,\s*\d{1,3}\s*,\s*\d{1,3}\s*(,\s*(0|1|0?\.\d+)\s*)?\)|[a-zA-Z]+)$",
        )
        .unwrap()
    });
    if re.is_match(value.trim()) {
        Ok(())
    } else {
        Err("must be a hex color (e.g. #ff0000), rgb()/rgba() or a named color".to_string())
    }
}

/// One to four lengths (`10px`, `50%`, `1.5em`, `0`), as in CSS shorthands.
pub fn validate_unit(value: &str) -> Result<(), String> {
    static UNIT_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = UNIT_REGEX.get_or_init(|| {
        Regex::new(r"^(-?\d+(\.\d+)?(px|%|em|rem|pt)?|auto)(\s+(-?\d+(\.\d+)?(px|%|em|rem|pt)?|auto)){0,3}$")
            .unwrap()
    });
    if re.is_match(value.trim()) {
        Ok(())
    } else {
        Err("must be 1 to 4 lengths such as 10px, 50% or 0".to_string())
    }
}

fn validate_url(value: &str) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.to_ascii_lowercase().starts_with("javascript:") {
        return Err("script URLs are not allowed".to_string());
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err("must not contain whitespace".to_string());
    }
    Ok(())
}

/// Validate head settings: named fonts with usable URLs and a length breakpoint.
pub fn validate_head(head: &HeadSettings) -> MjmlResult<()> {
    for font in &head.fonts {
        if font.name.trim().is_empty() {
            return Err(MjmlError::ValidationError(
                "mj-font must have a name".to_string(),
            ));
        }
        validate_url(&font.href).map_err(|reason| {
            MjmlError::ValidationError(format!("mj-font '{}' href: {}", font.name, reason))
        })?;
    }
    if let Some(breakpoint) = &head.breakpoint {
        validate_unit(breakpoint).map_err(|reason| {
            MjmlError::ValidationError(format!("mj-breakpoint width '{}': {}", breakpoint, reason))
        })?;
    }
    Ok(())
}
