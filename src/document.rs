use serde::{Deserialize, Serialize};

use crate::head::HeadSettings;
use crate::node::Node;
use crate::schema::ComponentType;

/// A document tree together with its head settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MjmlDocument {
    pub root: Node,
    #[serde(default)]
    pub head: HeadSettings,
}

impl MjmlDocument {
    pub fn new(root: Node, head: HeadSettings) -> Self {
        Self { root, head }
    }

    /// The `mj-body` node: the root itself, or the root's body child.
    pub fn body(&self) -> Option<&Node> {
        find_body(&self.root)
    }

    pub fn body_mut(&mut self) -> Option<&mut Node> {
        if self.root.node_type == ComponentType::Body {
            return Some(&mut self.root);
        }
        self.root
            .children
            .iter_mut()
            .find(|c| c.node_type == ComponentType::Body)
    }

    /// Canonical MJML text for this document
    pub fn to_mjml(&self) -> String {
        crate::serializer::generate_mjml(&self.root, &self.head)
    }

    /// Email-ready HTML for this document
    pub fn to_html(&self) -> String {
        crate::compiler::compile_document(&self.root, &self.head)
    }
}

fn find_body(root: &Node) -> Option<&Node> {
    if root.node_type == ComponentType::Body {
        return Some(root);
    }
    root.children
        .iter()
        .find(|c| c.node_type == ComponentType::Body)
}
