//! Static component registry: tags, attributes with defaults, containment rules,
//! categories and the social platform catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute that marks a subtree as non-editable in the source editor.
/// Preserved verbatim; the compiler never renders it.
pub const LOCKED_ATTRIBUTE: &str = "mj-locked";

/// Attributes accepted on every component in addition to its own.
pub const GLOBAL_ATTRIBUTES: &[&str] = &["mj-class", "css-class", LOCKED_ATTRIBUTE];

const DEFAULT_FONT: &str = "Ubuntu, Helvetica, Arial, sans-serif";
const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x200";

/// Every component kind a document tree can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentType {
    #[serde(rename = "mjml")]
    Mjml,
    #[serde(rename = "mj-body")]
    Body,
    #[serde(rename = "mj-wrapper")]
    Wrapper,
    #[serde(rename = "mj-section")]
    Section,
    #[serde(rename = "mj-column")]
    Column,
    #[serde(rename = "mj-text")]
    Text,
    #[serde(rename = "mj-image")]
    Image,
    #[serde(rename = "mj-button")]
    Button,
    #[serde(rename = "mj-divider")]
    Divider,
    #[serde(rename = "mj-spacer")]
    Spacer,
    #[serde(rename = "mj-social")]
    Social,
    #[serde(rename = "mj-social-element")]
    SocialElement,
    #[serde(rename = "mj-navbar")]
    Navbar,
    #[serde(rename = "mj-navbar-link")]
    NavbarLink,
    #[serde(rename = "mj-accordion")]
    Accordion,
    #[serde(rename = "mj-accordion-element")]
    AccordionElement,
    #[serde(rename = "mj-accordion-title")]
    AccordionTitle,
    #[serde(rename = "mj-accordion-text")]
    AccordionText,
    #[serde(rename = "mj-carousel")]
    Carousel,
    #[serde(rename = "mj-carousel-image")]
    CarouselImage,
    #[serde(rename = "mj-table")]
    Table,
    #[serde(rename = "mj-raw")]
    Raw,
}

impl ComponentType {
    /// All component types, in declaration order.
    pub const ALL: [ComponentType; 22] = [
        ComponentType::Mjml,
        ComponentType::Body,
        ComponentType::Wrapper,
        ComponentType::Section,
        ComponentType::Column,
        ComponentType::Text,
        ComponentType::Image,
        ComponentType::Button,
        ComponentType::Divider,
        ComponentType::Spacer,
        ComponentType::Social,
        ComponentType::SocialElement,
        ComponentType::Navbar,
        ComponentType::NavbarLink,
        ComponentType::Accordion,
        ComponentType::AccordionElement,
        ComponentType::AccordionTitle,
        ComponentType::AccordionText,
        ComponentType::Carousel,
        ComponentType::CarouselImage,
        ComponentType::Table,
        ComponentType::Raw,
    ];

    /// The markup tag name, e.g. `mj-section`.
    pub fn tag(self) -> &'static str {
        get_component_definition(self).tag
    }

    /// Look up a component by tag name (ASCII case-insensitive).
    pub fn from_tag(tag: &str) -> Option<ComponentType> {
        DEFINITIONS
            .iter()
            .find(|def| def.tag.eq_ignore_ascii_case(tag))
            .map(|def| def.component)
    }

    /// True for components whose markup body is raw text/HTML content.
    pub fn is_ending_tag(self) -> bool {
        get_component_definition(self).ending_tag
    }

    /// True for leaves that never have a body (`<mj-image />`).
    pub fn is_void(self) -> bool {
        get_component_definition(self).void
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Palette grouping shown by the component picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Document,
    Layout,
    Content,
    Social,
    Navigation,
    Interactive,
    Advanced,
}

/// Value shape an attribute accepts. Checked by the validator, never by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Color,
    /// One to four lengths (`10px`, `50%`, `10px 25px`).
    Unit,
    Enum(&'static [&'static str]),
    Url,
    Text,
    Boolean,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub default: Option<&'static str>,
}

const fn attr(
    name: &'static str,
    kind: AttributeKind,
    default: Option<&'static str>,
) -> AttributeSpec {
    AttributeSpec {
        name,
        kind,
        default,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ComponentDefinition {
    pub component: ComponentType,
    pub tag: &'static str,
    pub name: &'static str,
    pub category: Category,
    pub icon: &'static str,
    pub attributes: &'static [AttributeSpec],
    pub children: &'static [ComponentType],
    /// Body is captured verbatim as `content`.
    pub ending_tag: bool,
    /// Leaf that is always childless and content-less.
    pub void: bool,
    pub default_content: Option<&'static str>,
}

impl ComponentDefinition {
    pub fn accepts_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn attribute(&self, name: &str) -> Option<&'static AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn default_value(&self, name: &str) -> Option<&'static str> {
        self.attribute(name).and_then(|a| a.default)
    }

    /// Position of `name` in the declared attribute order, used for stable output.
    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }
}

use AttributeKind::*;
use ComponentType as C;

const ALIGN: AttributeKind = Enum(&["left", "center", "right"]);
const TEXT_ALIGN: AttributeKind = Enum(&["left", "center", "right", "justify"]);
const DIRECTION: AttributeKind = Enum(&["ltr", "rtl"]);
const VALIGN: AttributeKind = Enum(&["top", "middle", "bottom"]);
const TARGET: AttributeKind = Enum(&["_blank", "_self", "_parent", "_top"]);
const BORDER_STYLE: AttributeKind = Enum(&["solid", "dashed", "dotted"]);

const CONTENT_LEAVES: &[ComponentType] = &[
    C::Text,
    C::Image,
    C::Button,
    C::Divider,
    C::Spacer,
    C::Social,
    C::Navbar,
    C::Accordion,
    C::Carousel,
    C::Table,
    C::Raw,
];

static DEFINITIONS: [ComponentDefinition; 22] = [
    ComponentDefinition {
        component: C::Mjml,
        tag: "mjml",
        name: "Document",
        category: Category::Document,
        icon: "file",
        attributes: &[
            attr("lang", Text, None),
            attr("dir", DIRECTION, None),
        ],
        children: &[C::Body],
        ending_tag: false,
        void: false,
        default_content: None,
    },
    ComponentDefinition {
        component: C::Body,
        tag: "mj-body",
        name: "Body",
        category: Category::Document,
        icon: "layout",
        attributes: &[
            attr("width", Unit, Some("600px")),
            attr("background-color", Color, None),
        ],
        children: &[C::Section, C::Wrapper, C::Raw],
        ending_tag: false,
        void: false,
        default_content: None,
    },
    ComponentDefinition {
        component: C::Wrapper,
        tag: "mj-wrapper",
        name: "Wrapper",
        category: Category::Layout,
        icon: "box",
        attributes: &[
            attr("background-color", Color, None),
            attr("background-url", Url, None),
            attr("border", Text, None),
            attr("border-radius", Unit, None),
            attr("full-width", Enum(&["full-width"]), None),
            attr("padding", Unit, Some("20px 0")),
            attr("text-align", ALIGN, Some("center")),
        ],
        children: &[C::Section, C::Raw],
        ending_tag: false,
        void: false,
        default_content: None,
    },
    ComponentDefinition {
        component: C::Section,
        tag: "mj-section",
        name: "Section",
        category: Category::Layout,
        icon: "rows",
        attributes: &[
            attr("background-color", Color, None),
            attr("background-url", Url, None),
            attr("background-repeat", Enum(&["repeat", "no-repeat"]), Some("repeat")),
            attr("border", Text, None),
            attr("border-radius", Unit, None),
            attr("direction", DIRECTION, Some("ltr")),
            attr("full-width", Enum(&["full-width"]), None),
            attr("padding", Unit, Some("20px 0")),
            attr("text-align", ALIGN, Some("center")),
        ],
        children: &[C::Column, C::Raw],
        ending_tag: false,
        void: false,
        default_content: None,
    },
    ComponentDefinition {
        component: C::Column,
        tag: "mj-column",
        name: "Column",
        category: Category::Layout,
        icon: "columns",
        attributes: &[
            attr("background-color", Color, None),
            attr("border", Text, None),
            attr("border-radius", Unit, None),
            attr("padding", Unit, None),
            attr("vertical-align", VALIGN, Some("top")),
            attr("width", Unit, None),
        ],
        children: CONTENT_LEAVES,
        ending_tag: false,
        void: false,
        default_content: None,
    },
    ComponentDefinition {
        component: C::Text,
        tag: "mj-text",
        name: "Text",
        category: Category::Content,
        icon: "type",
        attributes: &[
            attr("align", TEXT_ALIGN, Some("left")),
            attr("color", Color, Some("#000000")),
            attr("container-background-color", Color, None),
            attr("font-family", Text, Some(DEFAULT_FONT)),
            attr("font-size", Unit, Some("13px")),
            attr("font-style", Enum(&["normal", "italic", "oblique"]), None),
            attr("font-weight", Text, None),
            attr("letter-spacing", Unit, None),
            attr("line-height", Text, Some("1")),
            attr("padding", Unit, Some("10px 25px")),
            attr("text-decoration", Text, None),
            attr("text-transform", Enum(&["none", "uppercase", "lowercase", "capitalize"]), None),
        ],
        children: &[],
        ending_tag: true,
        void: false,
        default_content: Some("Write your text here"),
    },
    ComponentDefinition {
        component: C::Image,
        tag: "mj-image",
        name: "Image",
        category: Category::Content,
        icon: "image",
        attributes: &[
            attr("align", ALIGN, Some("center")),
            attr("alt", Text, None),
            attr("border", Text, Some("0")),
            attr("border-radius", Unit, None),
            attr("container-background-color", Color, None),
            attr("height", Text, Some("auto")),
            attr("href", Url, None),
            attr("padding", Unit, Some("10px 25px")),
            attr("rel", Text, None),
            attr("src", Url, Some(PLACEHOLDER_IMAGE)),
            attr("target", TARGET, Some("_blank")),
            attr("title", Text, None),
            attr("width", Unit, None),
        ],
        children: &[],
        ending_tag: false,
        void: true,
        default_content: None,
    },
    ComponentDefinition {
        component: C::Button,
        tag: "mj-button",
        name: "Button",
        category: Category::Content,
        icon: "mouse-pointer-click",
        attributes: &[
            attr("align", ALIGN, Some("center")),
            attr("background-color", Color, Some("#414141")),
            attr("border", Text, Some("none")),
            attr("border-radius", Unit, Some("3px")),
            attr("color", Color, Some("#ffffff")),
            attr("container-background-color", Color, None),
            attr("font-family", Text, Some(DEFAULT_FONT)),
            attr("font-size", Unit, Some("13px")),
            attr("font-weight", Text, Some("normal")),
            attr("height", Unit, None),
            attr("href", Url, Some("#")),
            attr("inner-padding", Unit, Some("10px 25px")),
            attr("line-height", Text, Some("120%")),
            attr("padding", Unit, Some("10px 25px")),
            attr("target", TARGET, Some("_blank")),
            attr("text-decoration", Text, Some("none")),
            attr("text-transform", Enum(&["none", "uppercase", "lowercase", "capitalize"]), Some("none")),
            attr("vertical-align", VALIGN, Some("middle")),
            attr("width", Unit, None),
        ],
        children: &[],
        ending_tag: true,
        void: false,
        default_content: Some("Click me"),
    },
    ComponentDefinition {
        component: C::Divider,
        tag: "mj-divider",
        name: "Divider",
        category: Category::Content,
        icon: "minus",
        attributes: &[
            attr("align", ALIGN, Some("center")),
            attr("border-color", Color, Some("#000000")),
            attr("border-style", BORDER_STYLE, Some("solid")),
            attr("border-width", Unit, Some("4px")),
            attr("container-background-color", Color, None),
            attr("padding", Unit, Some("10px 25px")),
            attr("width", Unit, Some("100%")),
        ],
        children: &[],
        ending_tag: false,
        void: true,
        default_content: None,
    },
    ComponentDefinition {
        component: C::Spacer,
        tag: "mj-spacer",
        name: "Spacer",
        category: Category::Content,
        icon: "move-vertical",
        attributes: &[
            attr("container-background-color", Color, None),
            attr("height", Unit, Some("20px")),
            attr("padding", Unit, None),
        ],
        children: &[],
        ending_tag: false,
        void: true,
        default_content: None,
    },
    ComponentDefinition {
        component: C::Social,
        tag: "mj-social",
        name: "Social",
        category: Category::Social,
        icon: "share-2",
        attributes: &[
            attr("align", ALIGN, Some("center")),
            attr("border-radius", Unit, Some("3px")),
            attr("color", Color, Some("#333333")),
            attr("container-background-color", Color, None),
            attr("font-family", Text, Some(DEFAULT_FONT)),
            attr("font-size", Unit, Some("13px")),
            attr("icon-size", Unit, Some("20px")),
            attr("inner-padding", Unit, Some("4px")),
            attr("line-height", Text, Some("22px")),
            attr("mode", Enum(&["horizontal", "vertical"]), Some("horizontal")),
            attr("padding", Unit, Some("10px 25px")),
            attr("text-decoration", Text, Some("none")),
        ],
        children: &[C::SocialElement],
        ending_tag: false,
        void: false,
        default_content: None,
    },
    ComponentDefinition {
        component: C::SocialElement,
        tag: "mj-social-element",
        name: "Social Element",
        category: Category::Social,
        icon: "at-sign",
        attributes: &[
            attr("alt", Text, None),
            attr("background-color", Color, None),
            attr("color", Color, None),
            attr("href", Url, Some("#")),
            attr("icon-size", Unit, None),
            attr("name", Text, None),
            attr("padding", Unit, None),
            attr("src", Url, None),
            attr("target", TARGET, Some("_blank")),
        ],
        children: &[],
        ending_tag: true,
        void: false,
        default_content: None,
    },
    ComponentDefinition {
        component: C::Navbar,
        tag: "mj-navbar",
        name: "Navbar",
        category: Category::Navigation,
        icon: "menu",
        attributes: &[
            attr("align", ALIGN, Some("center")),
            attr("base-url", Url, None),
            attr("hamburger", Enum(&["hamburger"]), None),
            attr("ico-color", Color, Some("#000000")),
        ],
        children: &[C::NavbarLink],
        ending_tag: false,
        void: false,
        default_content: None,
    },
    ComponentDefinition {
        component: C::NavbarLink,
        tag: "mj-navbar-link",
        name: "Navbar Link",
        category: Category::Navigation,
        icon: "link",
        attributes: &[
            attr("color", Color, Some("#000000")),
            attr("font-family", Text, Some(DEFAULT_FONT)),
            attr("font-size", Unit, Some("13px")),
            attr("font-weight", Text, Some("normal")),
            attr("href", Url, Some("#")),
            attr("line-height", Text, Some("22px")),
            attr("padding", Unit, Some("15px 10px")),
            attr("target", TARGET, None),
            attr("text-decoration", Text, Some("none")),
            attr("text-transform", Enum(&["none", "uppercase", "lowercase", "capitalize"]), Some("uppercase")),
        ],
        children: &[],
        ending_tag: true,
        void: false,
        default_content: Some("Link"),
    },
    ComponentDefinition {
        component: C::Accordion,
        tag: "mj-accordion",
        name: "Accordion",
        category: Category::Interactive,
        icon: "chevrons-down-up",
        attributes: &[
            attr("border", Text, Some("2px solid black")),
            attr("container-background-color", Color, None),
            attr("font-family", Text, Some(DEFAULT_FONT)),
            attr("icon-align", VALIGN, Some("middle")),
            attr("icon-position", Enum(&["left", "right"]), Some("right")),
            attr("padding", Unit, Some("10px 25px")),
        ],
        children: &[C::AccordionElement],
        ending_tag: false,
        void: false,
        default_content: None,
    },
    ComponentDefinition {
        component: C::AccordionElement,
        tag: "mj-accordion-element",
        name: "Accordion Element",
        category: Category::Interactive,
        icon: "list",
        attributes: &[
            attr("background-color", Color, None),
            attr("border", Text, None),
            attr("font-family", Text, None),
        ],
        children: &[C::AccordionTitle, C::AccordionText],
        ending_tag: false,
        void: false,
        default_content: None,
    },
    ComponentDefinition {
        component: C::AccordionTitle,
        tag: "mj-accordion-title",
        name: "Accordion Title",
        category: Category::Interactive,
        icon: "heading",
        attributes: &[
            attr("background-color", Color, None),
            attr("color", Color, None),
            attr("font-family", Text, None),
            attr("font-size", Unit, Some("13px")),
            attr("padding", Unit, Some("16px")),
        ],
        children: &[],
        ending_tag: true,
        void: false,
        default_content: Some("Accordion title"),
    },
    ComponentDefinition {
        component: C::AccordionText,
        tag: "mj-accordion-text",
        name: "Accordion Text",
        category: Category::Interactive,
        icon: "align-left",
        attributes: &[
            attr("background-color", Color, None),
            attr("color", Color, None),
            attr("font-family", Text, None),
            attr("font-size", Unit, Some("13px")),
            attr("line-height", Text, Some("1")),
            attr("padding", Unit, Some("16px")),
        ],
        children: &[],
        ending_tag: true,
        void: false,
        default_content: Some("Accordion content"),
    },
    ComponentDefinition {
        component: C::Carousel,
        tag: "mj-carousel",
        name: "Carousel",
        category: Category::Interactive,
        icon: "gallery-horizontal",
        attributes: &[
            attr("align", ALIGN, Some("center")),
            attr("border-radius", Unit, Some("6px")),
            attr("container-background-color", Color, None),
            attr("tb-border", Text, Some("2px solid transparent")),
            attr("tb-selected-border-color", Color, Some("#cccccc")),
            attr("thumbnails", Enum(&["visible", "hidden"]), Some("visible")),
        ],
        children: &[C::CarouselImage],
        ending_tag: false,
        void: false,
        default_content: None,
    },
    ComponentDefinition {
        component: C::CarouselImage,
        tag: "mj-carousel-image",
        name: "Carousel Image",
        category: Category::Interactive,
        icon: "image-plus",
        attributes: &[
            attr("alt", Text, None),
            attr("href", Url, None),
            attr("rel", Text, None),
            attr("src", Url, Some(PLACEHOLDER_IMAGE)),
            attr("target", TARGET, Some("_blank")),
            attr("thumbnails-src", Url, None),
            attr("title", Text, None),
        ],
        children: &[],
        ending_tag: false,
        void: true,
        default_content: None,
    },
    ComponentDefinition {
        component: C::Table,
        tag: "mj-table",
        name: "Table",
        category: Category::Content,
        icon: "table",
        attributes: &[
            attr("align", ALIGN, Some("left")),
            attr("border", Text, Some("none")),
            attr("cellpadding", Integer, Some("0")),
            attr("cellspacing", Integer, Some("0")),
            attr("color", Color, Some("#000000")),
            attr("container-background-color", Color, None),
            attr("font-family", Text, Some(DEFAULT_FONT)),
            attr("font-size", Unit, Some("13px")),
            attr("line-height", Text, Some("22px")),
            attr("padding", Unit, Some("10px 25px")),
            attr("table-layout", Enum(&["auto", "fixed", "initial", "inherit"]), Some("auto")),
            attr("width", Unit, Some("100%")),
        ],
        children: &[],
        ending_tag: true,
        void: false,
        default_content: Some(
            "<tr><th>Item</th><th>Price</th></tr><tr><td>Example</td><td>$0.00</td></tr>",
        ),
    },
    ComponentDefinition {
        component: C::Raw,
        tag: "mj-raw",
        name: "Raw HTML",
        category: Category::Advanced,
        icon: "code",
        attributes: &[],
        children: &[],
        ending_tag: true,
        void: false,
        default_content: Some(""),
    },
];

/// Definition of `component`. Every component type has exactly one.
pub fn get_component_definition(component: ComponentType) -> &'static ComponentDefinition {
    &DEFINITIONS[component as usize]
}

/// Definition for a tag name, or `None` for tags outside the vocabulary.
pub fn definition_for_tag(tag: &str) -> Option<&'static ComponentDefinition> {
    ComponentType::from_tag(tag).map(get_component_definition)
}

/// Child types allowed under `component`, in palette order. Empty for leaves.
pub fn get_allowed_children(component: ComponentType) -> &'static [ComponentType] {
    get_component_definition(component).children
}

pub fn can_contain(parent: ComponentType, child: ComponentType) -> bool {
    get_allowed_children(parent).contains(&child)
}

/// Components belonging to `category`, in declaration order.
pub fn components_in_category(category: Category) -> Vec<ComponentType> {
    DEFINITIONS
        .iter()
        .filter(|def| def.category == category)
        .map(|def| def.component)
        .collect()
}

// ─── Social catalog ──────────────────────────────────────────────────────────

const SOCIAL_ICON_BASE: &str = "https://www.mailjet.com/images/theme/v1/icons/ico-social/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocialPlatform {
    pub name: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    /// File name under the shared icon host.
    pub icon: &'static str,
}

impl SocialPlatform {
    pub fn icon_url(&self) -> String {
        format!("{}{}", SOCIAL_ICON_BASE, self.icon)
    }
}

pub static SOCIAL_PLATFORMS: &[SocialPlatform] = &[
    SocialPlatform { name: "facebook", label: "Facebook", color: "#3b5998", icon: "facebook.png" },
    SocialPlatform { name: "twitter", label: "Twitter", color: "#55acee", icon: "twitter.png" },
    SocialPlatform { name: "x", label: "X", color: "#000000", icon: "twitter-x.png" },
    SocialPlatform { name: "instagram", label: "Instagram", color: "#3f729b", icon: "instagram.png" },
    SocialPlatform { name: "linkedin", label: "LinkedIn", color: "#0077b5", icon: "linkedin.png" },
    SocialPlatform { name: "pinterest", label: "Pinterest", color: "#bd081c", icon: "pinterest.png" },
    SocialPlatform { name: "youtube", label: "YouTube", color: "#eb3323", icon: "youtube.png" },
    SocialPlatform { name: "github", label: "GitHub", color: "#000000", icon: "github.png" },
    SocialPlatform { name: "dribbble", label: "Dribbble", color: "#d95988", icon: "dribbble.png" },
    SocialPlatform { name: "medium", label: "Medium", color: "#000000", icon: "medium.png" },
    SocialPlatform { name: "snapchat", label: "Snapchat", color: "#fffa54", icon: "snapchat.png" },
    SocialPlatform { name: "tumblr", label: "Tumblr", color: "#344356", icon: "tumblr.png" },
    SocialPlatform { name: "vimeo", label: "Vimeo", color: "#53b4e7", icon: "vimeo.png" },
    SocialPlatform { name: "soundcloud", label: "SoundCloud", color: "#ef7f31", icon: "soundcloud.png" },
    SocialPlatform { name: "xing", label: "Xing", color: "#296366", icon: "xing.png" },
    SocialPlatform { name: "web", label: "Website", color: "#4bade9", icon: "web.png" },
];

/// Platforms a freshly created social block starts with.
pub const DEFAULT_SOCIAL_PLATFORMS: &[&str] = &["facebook", "twitter", "linkedin"];

/// Look up a platform; names like `facebook-noshare` resolve to `facebook`.
pub fn find_social_platform(name: &str) -> Option<&'static SocialPlatform> {
    let base = name.strip_suffix("-noshare").unwrap_or(name);
    SOCIAL_PLATFORMS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(base))
}
