//! Starter documents.
//!
//! Each template is kept as MJML source and parsed once into a prototype. Callers only
//! ever receive copies with fresh ids, so two instantiations never share a node id.

use serde::Serialize;
use std::sync::OnceLock;

use crate::document::MjmlDocument;
use crate::head::HeadSettings;
use crate::node::{clone_document_with_new_ids, Node};
use crate::parser::parse_mjml;
use crate::schema::ComponentType;

#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    #[serde(skip)]
    source: &'static str,
}

static TEMPLATES: &[Template] = &[
    Template {
        id: "blank",
        name: "Blank",
        description: "One empty section with a single column",
        category: "basic",
        source: "",
    },
    Template {
        id: "welcome",
        name: "Welcome",
        description: "Greeting for new subscribers with a call to action",
        category: "onboarding",
        source: WELCOME,
    },
    Template {
        id: "newsletter",
        name: "Newsletter",
        description: "Header, two-column stories and a social footer",
        category: "content",
        source: NEWSLETTER,
    },
    Template {
        id: "promotion",
        name: "Promotion",
        description: "Hero image, discount code and a large button",
        category: "marketing",
        source: PROMOTION,
    },
    Template {
        id: "receipt",
        name: "Receipt",
        description: "Order summary table with totals",
        category: "transactional",
        source: RECEIPT,
    },
    Template {
        id: "announcement",
        name: "Announcement",
        description: "Single headline with supporting text and a divider",
        category: "content",
        source: ANNOUNCEMENT,
    },
];

const WELCOME: &str = r##"<mjml>
  <mj-head>
    <mj-title>Welcome aboard</mj-title>
    <mj-preview>Thanks for signing up</mj-preview>
    <mj-attributes>
      <mj-all font-family="Helvetica, Arial, sans-serif" />
    </mj-attributes>
  </mj-head>
  <mj-body background-color="#f4f4f4">
    <mj-section background-color="#ffffff">
      <mj-column>
        <mj-image src="https://placehold.co/200x60" width="200px" alt="Logo" />
        <mj-text font-size="24px" align="center">Welcome aboard!</mj-text>
        <mj-text align="center">We are glad to have you. Here is how to get started.</mj-text>
        <mj-button href="https://example.com/start" background-color="#2e58ff">Get started</mj-button>
      </mj-column>
    </mj-section>
  </mj-body>
</mjml>
"##;

const NEWSLETTER: &str = r##"<mjml>
  <mj-head>
    <mj-title>Monthly newsletter</mj-title>
  </mj-head>
  <mj-body>
    <mj-section>
      <mj-column>
        <mj-text font-size="28px" font-weight="bold">This month</mj-text>
        <mj-divider border-width="1px" border-color="#dddddd" />
      </mj-column>
    </mj-section>
    <mj-section>
      <mj-column>
        <mj-image src="https://placehold.co/280x160" alt="First story" />
        <mj-text font-size="18px">First story</mj-text>
        <mj-text>A short summary of the first story.</mj-text>
      </mj-column>
      <mj-column>
        <mj-image src="https://placehold.co/280x160" alt="Second story" />
        <mj-text font-size="18px">Second story</mj-text>
        <mj-text>A short summary of the second story.</mj-text>
      </mj-column>
    </mj-section>
    <mj-section>
      <mj-column>
        <mj-social>
          <mj-social-element name="facebook" href="https://facebook.com">Facebook</mj-social-element>
          <mj-social-element name="twitter" href="https://twitter.com">Twitter</mj-social-element>
        </mj-social>
      </mj-column>
    </mj-section>
  </mj-body>
</mjml>
"##;

const PROMOTION: &str = r##"<mjml>
  <mj-head>
    <mj-title>Sale</mj-title>
    <mj-preview>25% off everything this weekend</mj-preview>
  </mj-head>
  <mj-body>
    <mj-section padding="0">
      <mj-column>
        <mj-image src="https://placehold.co/600x300" alt="Sale" padding="0" />
      </mj-column>
    </mj-section>
    <mj-section background-color="#fff4e5">
      <mj-column>
        <mj-text font-size="32px" align="center" color="#c2410c">25% OFF</mj-text>
        <mj-text align="center">Use code <b>WEEKEND25</b> at checkout.</mj-text>
        <mj-button href="https://example.com/shop" background-color="#c2410c" font-size="18px">Shop now</mj-button>
      </mj-column>
    </mj-section>
  </mj-body>
</mjml>
"##;

const RECEIPT: &str = r##"<mjml>
  <mj-head>
    <mj-title>Your receipt</mj-title>
  </mj-head>
  <mj-body>
    <mj-section>
      <mj-column>
        <mj-text font-size="20px">Thanks for your order</mj-text>
        <mj-table>
          <tr style="border-bottom:1px solid #ecedee;text-align:left;">
            <th>Item</th>
            <th>Qty</th>
            <th>Price</th>
          </tr>
          <tr>
            <td>Widget</td>
            <td>1</td>
            <td>$10.00</td>
          </tr>
        </mj-table>
        <mj-divider border-width="1px" border-color="#ecedee" />
        <mj-text align="right" font-weight="bold">Total: $10.00</mj-text>
      </mj-column>
    </mj-section>
  </mj-body>
</mjml>
"##;

const ANNOUNCEMENT: &str = r##"<mjml>
  <mj-body>
    <mj-section>
      <mj-column>
        <mj-text font-size="26px" align="center">Big news</mj-text>
        <mj-divider width="50%" />
        <mj-text align="center">Tell your readers what changed and why it matters to them.</mj-text>
        <mj-spacer height="30px" />
      </mj-column>
    </mj-section>
  </mj-body>
</mjml>
"##;

fn prototypes() -> &'static [MjmlDocument] {
    static PROTOTYPES: OnceLock<Vec<MjmlDocument>> = OnceLock::new();
    PROTOTYPES.get_or_init(|| TEMPLATES.iter().map(build_prototype).collect())
}

fn build_prototype(template: &Template) -> MjmlDocument {
    if template.source.is_empty() {
        return blank_document();
    }
    parse_mjml(template.source).unwrap_or_else(|err| {
        tracing::debug!(template = template.id, error = %err, "template source did not parse");
        blank_document()
    })
}

fn blank_document() -> MjmlDocument {
    MjmlDocument::new(empty_root(), HeadSettings::new())
}

/// `mjml` → `mj-body` → `mj-section` → `mj-column`, with fresh ids.
fn empty_root() -> Node {
    let column = Node::empty(ComponentType::Column);
    let section = Node::empty(ComponentType::Section).with_children(vec![column]);
    let body = Node::empty(ComponentType::Body).with_children(vec![section]);
    Node::empty(ComponentType::Mjml).with_children(vec![body])
}

/// The template catalog.
pub fn templates() -> &'static [Template] {
    TEMPLATES
}

pub fn find_template(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.id == id)
}

impl Template {
    /// A new document from this template. Every node gets a fresh id.
    pub fn instantiate(&self) -> MjmlDocument {
        let prototype = TEMPLATES
            .iter()
            .position(|t| t.id == self.id)
            .and_then(|i| prototypes().get(i));
        match prototype {
            Some(doc) => MjmlDocument::new(clone_document_with_new_ids(&doc.root), doc.head.clone()),
            None => blank_document(),
        }
    }
}

/// Instantiate a catalog entry by id.
pub fn instantiate_template(id: &str) -> Option<MjmlDocument> {
    find_template(id).map(Template::instantiate)
}

/// The minimal valid document used when no template is chosen.
pub fn empty_document() -> MjmlDocument {
    blank_document()
}
