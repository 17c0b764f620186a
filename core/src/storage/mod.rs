//! Access to the tablet's document store and the records it is made of.
//!
//! The device keeps every item (document or folder) as a set of sibling files in
//! one flat directory, all named after the item's identifier:
//!
//! *   `<id>.metadata` - an [`ItemMetadata`] record: name, type, parent collection,
//!     timestamps. This is the only record every item has.
//! *   `<id>.content` - a [`Content`] descriptor telling the reader how to render a
//!     document (page identifiers, zoom defaults, authors, source format).
//! *   `<id>.local` - a [`LocalState`] record holding the content format version.
//! *   `<id>.pagedata` - one layout tag per page, newline terminated.
//! *   `<id>.<ext>` - the document itself (e.g. `<id>.pdf`), plus the `<id>/` and
//!     `<id>.thumbnails/` directories the reader fills in on its own.
//!
//! # Core Concepts
//!
//! *   **Store:** the flat mapping identifier -> [`ItemMetadata`]
//!     ([`MetadataStore`]). Folders exist only through `parent` references.
//! *   **[`CollectionTree`]:** the folder hierarchy rebuilt from a store, with
//!     [`CollectionTree::resolve`] turning a `//`-delimited path of collection
//!     names into the identifier of that collection.
//! *   **[`DocumentBundle`]:** the four records needed to introduce a new document,
//!     synthesized from a source file.
//! *   **[`Store`]:** a local copy or mount of the device directory, used to load
//!     all metadata records and to write new bundles.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use paperstack_core::storage::{CollectionTree, DocumentBundle, SourceFile, Store};
//! use paperstack_core::id::UuidSource;
//! use paperstack_core::parse::PdfParser;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Store::open(Path::new("/mnt/xochitl")).await?;
//!     let tree = CollectionTree::build(&store.load().await?)?;
//!     let parent = tree.resolve("Books//Manga");
//!
//!     let mut ids = UuidSource;
//!     let source = SourceFile::open(Path::new("volume.pdf")).await?;
//!     let bundle = DocumentBundle::from_source(&source, parent, &PdfParser, &mut ids).await?;
//!     store.write_bundle(&uuid::Uuid::new_v4().to_string(), &source, &bundle).await?;
//!     Ok(())
//! }
//! ```

pub use self::bundle::DocumentBundle;
pub use self::collection::{CollectionNode, CollectionTree, PATH_DELIMITER, ROOT_ID};
pub use self::file::{SourceAttributes, SourceFile};
pub use self::metadata::{
    Content, DocumentInfo, ItemMetadata, ItemType, LocalState, MetadataStore, Orientation,
    COLLECTION_TYPE, DOCUMENT_TYPE,
};
pub use self::store::{DocumentWritten, Store, StoreEvents, XOCHITL_DIR};

mod bundle;
mod collection;
mod document;
mod file;
mod metadata;
mod store;

use std::path::PathBuf;
use thiserror::Error;

use crate::parse::ParseError;

pub const METADATA_EXTENSION: &str = "metadata";
pub const CONTENT_EXTENSION: &str = "content";
pub const LOCAL_EXTENSION: &str = "local";
pub const PAGEDATA_EXTENSION: &str = "pagedata";
pub const THUMBNAILS_EXTENSION: &str = "thumbnails";
pub const TOMBSTONE_EXTENSION: &str = "tombstone";

#[derive(Debug, Error)]
pub enum Error {
    #[error("Record '{identifier}' has unsupported type '{item_type}'")]
    UnsupportedItemType { identifier: String, item_type: String },

    #[error("Invalid path provided: {0}")]
    InvalidPath(String),

    #[error("Metadata serialization/deserialization error")]
    Metadata(#[from] serde_json::Error),

    #[error("Malformed metadata record {path}")]
    MetadataFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("No document parser for file type '{0}'")]
    UnsupportedFileType(String),

    #[error("Could not parse source document")]
    Parse(#[from] ParseError),

    #[error("Record already exists in the store: {0}")]
    RecordExists(PathBuf),
}

// Define a standard Result type for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Maps a "not found" I/O error to [`Error::FileNotFound`] for the given path.
pub(crate) fn not_found_as_file(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    }
}
