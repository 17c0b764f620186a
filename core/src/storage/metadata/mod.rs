use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::storage::Result;

mod content;

pub use content::{Content, DocumentInfo, Orientation};

/// Value of the `type` field for documents.
pub const DOCUMENT_TYPE: &str = "DocumentType";
/// Value of the `type` field for collections (folders).
pub const COLLECTION_TYPE: &str = "CollectionType";

/// The flat store: identifier -> metadata record.
///
/// Keyed by identifier in sorted order, so every traversal of the store visits
/// records in the same order.
pub type MetadataStore = BTreeMap<String, ItemMetadata>;

/// Discriminator of a metadata record.
///
/// Unknown values are kept rather than rejected while parsing, so that a store
/// can be loaded and the tree builder can report which record is at fault.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemType {
    Document,
    Collection,
    Unsupported(String),
}

impl From<String> for ItemType {
    fn from(value: String) -> Self {
        match value.as_str() {
            DOCUMENT_TYPE => ItemType::Document,
            COLLECTION_TYPE => ItemType::Collection,
            _ => ItemType::Unsupported(value),
        }
    }
}

impl From<ItemType> for String {
    fn from(value: ItemType) -> Self {
        match value {
            ItemType::Document => DOCUMENT_TYPE.to_string(),
            ItemType::Collection => COLLECTION_TYPE.to_string(),
            ItemType::Unsupported(other) => other,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Document => f.write_str(DOCUMENT_TYPE),
            ItemType::Collection => f.write_str(COLLECTION_TYPE),
            ItemType::Unsupported(other) => f.write_str(other),
        }
    }
}

/// Content of a `<identifier>.metadata` record.
///
/// The identifier itself is the key of the record in the store and is not
/// part of the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    /// Creation time, milliseconds since the epoch, as a decimal string.
    #[serde(default)]
    pub created_time: String,
    /// Modification time, milliseconds since the epoch, as a decimal string.
    #[serde(default)]
    pub last_modified: String,
    #[serde(default)]
    pub last_opened: String,
    #[serde(default)]
    pub last_opened_page: u32,
    /// Identifier of the enclosing collection, empty for the root.
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default)]
    pub visible_name: String,

    // Fields written by the device that this model does not interpret
    // (`deleted`, `version`, `synced`, ...). Kept so records round-trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ItemMetadata {
    fn with_type(item_type: ItemType, visible_name: &str, parent: &str) -> Self {
        ItemMetadata {
            created_time: String::new(),
            last_modified: String::new(),
            last_opened: String::new(),
            last_opened_page: 0,
            parent: parent.to_string(),
            pinned: false,
            item_type,
            visible_name: visible_name.to_string(),
            extra: Map::new(),
        }
    }

    /// Minimal document record with the given name and parent.
    pub fn document(visible_name: &str, parent: &str) -> Self {
        Self::with_type(ItemType::Document, visible_name, parent)
    }

    /// Minimal collection record with the given name and parent.
    pub fn collection(visible_name: &str, parent: &str) -> Self {
        Self::with_type(ItemType::Collection, visible_name, parent)
    }

    pub fn is_document(&self) -> bool {
        self.item_type == ItemType::Document
    }

    pub fn is_collection(&self) -> bool {
        self.item_type == ItemType::Collection
    }
}

/// Content of a `<identifier>.local` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalState {
    pub content_format_version: u32,
}

impl Default for LocalState {
    fn default() -> Self {
        LocalState { content_format_version: 1 }
    }
}

/// Serializes a record the way the device lays out its JSON files
/// (pretty-printed, tab indentation).
pub(crate) fn to_record_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
