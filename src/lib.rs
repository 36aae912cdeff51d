//! # MJML document model and compiler
//!
//! The core of a drag-and-drop email builder: a schema-driven tree of MJML components,
//! a serializer and a tolerant parser that round-trip it through MJML markup, and a
//! compiler that lowers it to table-based, email-safe HTML.
//!
//! ## Features
//! - Static component schema with attribute defaults and containment rules
//! - Canonical MJML output (`generate_mjml`) and a parser that never loses markup:
//!   unknown or misplaced tags are kept as `mj-raw`
//! - Shared tag-nesting utility, also used for locked-region detection
//! - HTML compiler driven by one layout rule per component
//! - Starter templates instantiated with fresh node ids
//!
//! ## Example
//! ```ignore
//! use mailcraft_mjml::{compile_mjml, generate_mjml, parse_mjml};
//!
//! let doc = parse_mjml(r#"
//! <mjml>
//!   <mj-body>
//!     <mj-section><mj-column><mj-text>Hello</mj-text></mj-column></mj-section>
//!   </mj-body>
//! </mjml>
//! "#).expect("Failed to parse MJML");
//!
//! let mjml = generate_mjml(&doc.root, &doc.head);
//! let html = compile_mjml(&mjml).expect("Failed to compile MJML");
//! ```

pub mod compiler;
pub mod config;
pub mod document;
pub mod error;
pub mod head;
pub mod html_import;
pub mod markup;
pub mod node;
pub mod parser;
pub mod schema;
pub mod serializer;
pub mod templates;
pub mod validator;

// --- Core types ---
pub use config::{CompileOptions, ValidationLevel};
pub use document::MjmlDocument;
pub use error::{MjmlError, MjmlResult};
pub use head::{FontImport, HeadSettings, StyleBlock};
pub use node::{Attributes, Node};
pub use schema::{
    can_contain, get_allowed_children, get_component_definition, ComponentDefinition,
    ComponentType,
};

// --- Factory ---
pub use node::{clone_document_with_new_ids, create_default_node, create_node, generate_id};

// --- Markup ---
pub use compiler::{compile_document, compile_document_with_options, compile_mjml, compile_mjml_with_options};
pub use html_import::{parse_html_to_mjml, parse_html_to_node, parse_html_to_nodes};
pub use markup::{locked_regions, LockedRegion};
pub use parser::{parse_mjml, parse_mjml_to_node};
pub use serializer::{generate_mjml, node_to_mjml};

// --- Templates ---
pub use templates::{empty_document, instantiate_template, templates, Template};

// --- Validation ---
pub use validator::{collect_issues, validate_tree};
