//! The document tree: nodes, the factory that builds schema-default nodes, identity
//! regeneration and the structural mutations used by the canvas.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{MjmlError, MjmlResult};
use crate::schema::{
    can_contain, find_social_platform, get_component_definition, ComponentType,
    DEFAULT_SOCIAL_PLATFORMS,
};

/// Attribute name → attribute value.
pub type Attributes = BTreeMap<String, String>;

/// One element of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: ComponentType,
    #[serde(default)]
    pub props: Attributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Fresh identifier, unique for the lifetime of the process.
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Build a node with every schema default, its default children and content,
/// then apply `overrides` on top of the default attributes.
pub fn create_node<I, K, V>(node_type: ComponentType, overrides: I) -> Node
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let def = get_component_definition(node_type);
    let mut props: Attributes = def
        .attributes
        .iter()
        .filter_map(|a| a.default.map(|d| (a.name.to_string(), d.to_string())))
        .collect();
    for (k, v) in overrides {
        props.insert(k.into(), v.into());
    }

    Node {
        id: generate_id(),
        node_type,
        props,
        children: default_children(node_type),
        content: def.default_content.map(str::to_string),
    }
}

/// `create_node` without overrides.
pub fn create_default_node(node_type: ComponentType) -> Node {
    create_node(node_type, std::iter::empty::<(String, String)>())
}

fn default_children(node_type: ComponentType) -> Vec<Node> {
    match node_type {
        ComponentType::Mjml => vec![create_default_node(ComponentType::Body)],
        ComponentType::Section | ComponentType::Wrapper => {
            let child = if node_type == ComponentType::Section {
                ComponentType::Column
            } else {
                ComponentType::Section
            };
            vec![create_default_node(child)]
        }
        ComponentType::Social => default_social_elements(),
        ComponentType::Navbar => vec![
            create_node(ComponentType::NavbarLink, [("href", "/")])
                .with_content("Home"),
            create_node(ComponentType::NavbarLink, [("href", "/about")])
                .with_content("About"),
        ],
        ComponentType::Accordion => vec![create_default_node(ComponentType::AccordionElement)],
        ComponentType::AccordionElement => vec![
            create_default_node(ComponentType::AccordionTitle),
            create_default_node(ComponentType::AccordionText),
        ],
        ComponentType::Carousel => vec![
            create_default_node(ComponentType::CarouselImage),
            create_default_node(ComponentType::CarouselImage),
        ],
        _ => Vec::new(),
    }
}

/// The social elements a new social block starts with.
pub fn default_social_elements() -> Vec<Node> {
    DEFAULT_SOCIAL_PLATFORMS
        .iter()
        .filter_map(|name| find_social_platform(name))
        .map(|platform| {
            create_node(ComponentType::SocialElement, [("name", platform.name)])
                .with_content(platform.label)
        })
        .collect()
}

/// Deep copy of `root` where every node gets a new id. Attributes, content and
/// child order are kept exactly.
pub fn clone_document_with_new_ids(root: &Node) -> Node {
    Node {
        id: generate_id(),
        node_type: root.node_type,
        props: root.props.clone(),
        children: root
            .children
            .iter()
            .map(clone_document_with_new_ids)
            .collect(),
        content: root.content.clone(),
    }
}

impl Node {
    /// Bare node of `node_type` with no attributes, children or content.
    pub fn empty(node_type: ComponentType) -> Self {
        Node {
            id: generate_id(),
            node_type,
            props: Attributes::new(),
            children: Vec::new(),
            content: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    /// Replace the children; no containment check, use [`Node::append_child`] for that.
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Attribute value, falling back to the schema default.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.props
            .get(name)
            .map(String::as_str)
            .or_else(|| get_component_definition(self.node_type).default_value(name))
    }

    pub fn is_raw(&self) -> bool {
        self.node_type == ComponentType::Raw
    }

    /// Pre-order traversal of this node and all descendants.
    pub fn walk(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn descendant_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(Node::descendant_count)
            .sum::<usize>()
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Parent of the node with `id`, or `None` for the root or a missing id.
    pub fn parent_of(&self, id: &str) -> Option<&Node> {
        if self.children.iter().any(|c| c.id == id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.parent_of(id))
    }

    /// Equality of type, attributes, content and child structure, ignoring ids.
    pub fn structurally_eq(&self, other: &Node) -> bool {
        self.node_type == other.node_type
            && self.props == other.props
            && self.content == other.content
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.structurally_eq(b))
    }

    // ─── Mutations ───────────────────────────────────────────────────────────

    /// Append `child` to `self`, rejecting pairs the schema forbids.
    pub fn append_child(&mut self, child: Node) -> MjmlResult<()> {
        check_containment(self.node_type, child.node_type)?;
        self.children.push(child);
        Ok(())
    }

    /// Insert `child` under the node `parent_id` at `index` (clamped to the end).
    pub fn insert_child(&mut self, parent_id: &str, index: usize, child: Node) -> MjmlResult<()> {
        let parent = self
            .find_mut(parent_id)
            .ok_or_else(|| MjmlError::NodeNotFound {
                id: parent_id.to_string(),
            })?;
        check_containment(parent.node_type, child.node_type)?;
        let index = index.min(parent.children.len());
        parent.children.insert(index, child);
        Ok(())
    }

    /// Detach and return the node with `id`. The root itself cannot be removed.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        if let Some(pos) = self.children.iter().position(|c| c.id == id) {
            return Some(self.children.remove(pos));
        }
        self.children.iter_mut().find_map(|c| c.remove_node(id))
    }

    /// Move the node `id` under `new_parent_id` at `index`. On error the tree is
    /// left untouched.
    pub fn move_node(&mut self, id: &str, new_parent_id: &str, index: usize) -> MjmlResult<()> {
        if id == self.id {
            return Err(MjmlError::InvalidMove {
                id: id.to_string(),
                reason: "the root cannot be moved".to_string(),
            });
        }
        let moving = self.find(id).ok_or_else(|| MjmlError::NodeNotFound {
            id: id.to_string(),
        })?;
        if moving.contains_id(new_parent_id) {
            return Err(MjmlError::InvalidMove {
                id: id.to_string(),
                reason: "a node cannot be moved into itself or its descendants".to_string(),
            });
        }
        let new_parent = self
            .find(new_parent_id)
            .ok_or_else(|| MjmlError::NodeNotFound {
                id: new_parent_id.to_string(),
            })?;
        check_containment(new_parent.node_type, moving.node_type)?;

        // Index is interpreted against the parent's children after removal.
        let node = self.remove_node(id).ok_or_else(|| MjmlError::NodeNotFound {
            id: id.to_string(),
        })?;
        let parent = self
            .find_mut(new_parent_id)
            .ok_or_else(|| MjmlError::NodeNotFound {
                id: new_parent_id.to_string(),
            })?;
        let index = index.min(parent.children.len());
        parent.children.insert(index, node);
        Ok(())
    }

    /// Clone the node `id` with fresh ids and insert the copy right after it.
    /// Returns the id of the copy.
    pub fn duplicate_node(&mut self, id: &str) -> MjmlResult<String> {
        let parent_id = self
            .parent_of(id)
            .map(|p| p.id.clone())
            .ok_or_else(|| MjmlError::NodeNotFound { id: id.to_string() })?;
        let parent = self
            .find_mut(&parent_id)
            .ok_or_else(|| MjmlError::NodeNotFound { id: parent_id.clone() })?;
        let pos = parent
            .children
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| MjmlError::NodeNotFound { id: id.to_string() })?;
        let copy = clone_document_with_new_ids(&parent.children[pos]);
        let copy_id = copy.id.clone();
        parent.children.insert(pos + 1, copy);
        Ok(copy_id)
    }

    pub fn set_prop(&mut self, id: &str, name: &str, value: &str) -> MjmlResult<()> {
        let node = self.find_mut(id).ok_or_else(|| MjmlError::NodeNotFound {
            id: id.to_string(),
        })?;
        node.props.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Remove an attribute so lookups fall back to the schema default.
    pub fn remove_prop(&mut self, id: &str, name: &str) -> MjmlResult<Option<String>> {
        let node = self.find_mut(id).ok_or_else(|| MjmlError::NodeNotFound {
            id: id.to_string(),
        })?;
        Ok(node.props.remove(name))
    }

    /// Replace text content. Only components that carry content accept it.
    pub fn set_content(&mut self, id: &str, content: &str) -> MjmlResult<()> {
        let node = self.find_mut(id).ok_or_else(|| MjmlError::NodeNotFound {
            id: id.to_string(),
        })?;
        if !node.node_type.is_ending_tag() {
            return Err(MjmlError::ValidationError(format!(
                "<{}> does not carry text content",
                node.node_type
            )));
        }
        node.content = Some(content.to_string());
        Ok(())
    }
}

fn check_containment(parent: ComponentType, child: ComponentType) -> MjmlResult<()> {
    if can_contain(parent, child) {
        Ok(())
    } else {
        Err(MjmlError::SchemaViolation {
            parent: parent.tag().to_string(),
            child: child.tag().to_string(),
        })
    }
}
