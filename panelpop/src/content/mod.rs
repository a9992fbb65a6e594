//! Content-block document model.
//!
//! A panel variant carries its content as a separately encoded JSON document:
//! an ordered list of blocks, each tagged with a type and carrying a payload
//! whose shape depends on that type. Tags this client does not know about are
//! kept as [`BlockData::Unknown`] so a renderer can show a fallback.

mod decode;
pub mod markup;

pub use decode::{SchemaOutcome, SchemaStatus, decode, decode_or_empty};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// Open key-value metadata attached to lists and list items, e.g. `checked`
/// or `counterType`. Key order follows the source document.
pub type Meta = IndexMap<String, serde_json::Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentDocument {
    /// Authoring time in epoch milliseconds. Informational only.
    pub time: Option<i64>,
    pub version: Option<String>,
    /// Blocks in rendering order.
    pub blocks: Vec<Block>,
}

impl ContentDocument {
    pub fn empty() -> Self {
        ContentDocument::default()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Unique within its document; suitable as a list key.
    pub id: String,
    pub data: BlockData,
}

impl Block {
    /// The block's type tag as it appeared in the document.
    pub fn type_tag(&self) -> &str {
        match &self.data {
            BlockData::Paragraph(_) => "paragraph",
            BlockData::Header(_) => "header",
            BlockData::Image(_) => "image",
            BlockData::List(_) => "list",
            BlockData::Unknown { kind, .. } => kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockData {
    Paragraph(ParagraphData),
    Header(HeaderData),
    Image(ImageData),
    List(ListData),
    /// A block type this client does not understand, with its raw payload.
    Unknown {
        kind: String,
        data: serde_json::Value,
    },
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ParagraphData {
    /// May contain the inline markup subset understood by [`markup::parse_inline`].
    pub text: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct HeaderData {
    pub text: Option<String>,
    /// As sent. Renderers clamp this to the levels they support.
    pub level: Option<i64>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub file: Option<ImageFile>,
    pub caption: Option<String>,
    #[serde(default)]
    pub stretched: bool,
    #[serde(default)]
    pub with_border: bool,
    #[serde(default)]
    pub with_background: bool,
}

impl ImageData {
    pub fn url(&self) -> Option<&str> {
        self.file.as_ref().and_then(|file| file.url.as_deref())
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ImageFile {
    pub url: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ListData {
    pub style: Option<ListStyle>,
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub items: Vec<ListItem>,
}

impl ListData {
    /// Numbering scheme of an ordered list, e.g. `numeric`.
    pub fn counter_type(&self) -> Option<&str> {
        self.meta.get("counterType").and_then(|v| v.as_str())
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String")]
pub enum ListStyle {
    Unordered,
    Ordered,
    Checklist,
    Unrecognized(String),
}

impl From<String> for ListStyle {
    fn from(style: String) -> Self {
        match style.as_str() {
            "unordered" => ListStyle::Unordered,
            "ordered" => ListStyle::Ordered,
            "checklist" => ListStyle::Checklist,
            _ => ListStyle::Unrecognized(style),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ListItem {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub items: Vec<ListItem>,
}

impl ListItem {
    /// Checked state of a checklist item. `None` when absent or not a boolean.
    pub fn checked(&self) -> Option<bool> {
        self.meta.get("checked").and_then(|v| v.as_bool())
    }

    /// Depth of the deepest nested sub-list below this item, counting this item as 1.
    pub fn depth(&self) -> usize {
        1 + self.items.iter().map(ListItem::depth).max().unwrap_or(0)
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
