use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use futures::future::try_join_all;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::event::{define_event_listeners, Event};
use crate::storage::document::{record_path, write_document};
use crate::storage::{
    DocumentBundle, Error, ItemMetadata, MetadataStore, Result, SourceFile, METADATA_EXTENSION,
    TOMBSTONE_EXTENSION,
};

/// Location of the document store on the device.
pub const XOCHITL_DIR: &str = "/home/root/.local/share/remarkable/xochitl";

// Index file kept by the device next to the records.
const TREE_FILE: &str = ".tree";

/// Dispatched after a new document has been written to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentWritten {
    pub identifier: String,
    pub visible_name: String,
}

impl Event for DocumentWritten {
    type HandlerReturnType = ();
}

define_event_listeners! { StoreEvents {
    document_written: DocumentWritten,
}}

/// A directory laid out like the device's document store, e.g. a mounted or
/// synced copy of [`XOCHITL_DIR`].
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    pub on: StoreEvents,
}

impl Store {
    /// Opens an existing store directory.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::DirectoryNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        if !meta.is_dir() {
            return Err(Error::NotADirectory(path.to_path_buf()));
        }

        debug!("Store opened");
        Ok(Store { path: path.to_path_buf(), on: StoreEvents::new() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifiers of all items with at least one record in the store, sorted.
    ///
    /// Deleted items (`*.tombstone`) and the device's index file are skipped.
    #[instrument(skip(self))]
    pub async fn list_identifiers(&self) -> Result<Vec<String>> {
        let mut identifiers = BTreeSet::new();
        let mut entries = fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                warn!("Skipping non UTF-8 file name {:?}", file_name);
                continue;
            };
            if name == TREE_FILE || name.split('.').nth(1) == Some(TOMBSTONE_EXTENSION) {
                continue;
            }
            match name.split('.').next() {
                Some(identifier) if !identifier.is_empty() => {
                    identifiers.insert(identifier.to_string());
                }
                _ => {}
            }
        }
        debug!(count = identifiers.len(), "Listed identifiers");
        Ok(identifiers.into_iter().collect())
    }

    /// Reads the metadata records of `identifiers` concurrently.
    ///
    /// Identifiers without a `.metadata` record are skipped with a warning.
    #[instrument(skip(self, identifiers), fields(count = identifiers.len()))]
    pub async fn read_metadata(&self, identifiers: &[String]) -> Result<MetadataStore> {
        let reads = identifiers.iter().map(|identifier| async move {
            let record = self.read_record(identifier).await?;
            Ok::<_, Error>(record.map(|record| (identifier.clone(), record)))
        });
        let records = try_join_all(reads).await?;
        Ok(records.into_iter().flatten().collect())
    }

    async fn read_record(&self, identifier: &str) -> Result<Option<ItemMetadata>> {
        let path = record_path(&self.path, identifier, METADATA_EXTENSION);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(identifier = %identifier, "No metadata record, skipping");
                return Ok(None);
            }
            Err(e) => return Err(Error::Io(e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| Error::MetadataFile { path, source })
    }

    /// Loads every metadata record in the store.
    pub async fn load(&self) -> Result<MetadataStore> {
        let identifiers = self.list_identifiers().await?;
        let store = self.read_metadata(&identifiers).await?;
        info!(records = store.len(), "Store loaded");
        Ok(store)
    }

    /// Adds a new document to the store under `identifier`.
    ///
    /// Copies `source` next to the bundle's records and notifies
    /// `on.document_written` listeners once everything is on disk.
    #[instrument(skip(self, source, bundle), fields(name = %bundle.metadata.visible_name))]
    pub async fn write_bundle(&self, identifier: &str, source: &SourceFile, bundle: &DocumentBundle) -> Result<()> {
        write_document(&self.path, identifier, source, bundle).await?;
        info!("Document written");

        let mut event = DocumentWritten {
            identifier: identifier.to_string(),
            visible_name: bundle.metadata.visible_name.clone(),
        };
        self.on.document_written.dispatch(&mut event);
        Ok(())
    }
}
