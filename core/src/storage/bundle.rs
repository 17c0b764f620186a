use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::id::IdSource;
use crate::parse::{DocumentParser, ParsedDocument};
use crate::storage::{Content, ItemMetadata, LocalState, Result, SourceAttributes, SourceFile, ROOT_ID};

/// Layout tag written for every page of a new document.
pub const BLANK_PAGE: &str = "blank";

/// The records that introduce a new document into a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentBundle {
    pub metadata: ItemMetadata,
    pub content: Content,
    pub local: LocalState,
    /// One `blank` line per page identifier.
    pub page_data: String,
}

impl DocumentBundle {
    /// Builds the bundle for a document with the given attributes.
    ///
    /// `parent` is the identifier of the destination collection, `None` for the
    /// root. A document of `p` pages gets `p + 1` page identifiers: one per page
    /// plus a trailing one the reader expects.
    pub fn synthesize(
        source: &SourceAttributes,
        parsed: &ParsedDocument,
        parent: Option<&str>,
        ids: &mut dyn IdSource,
    ) -> Self {
        let page_count = parsed.page_count;
        let pages: Vec<String> = (0..=page_count).map(|_| ids.next_id()).collect();

        let mut metadata = ItemMetadata::document(&source.file_name, parent.unwrap_or(ROOT_ID));
        metadata.created_time = source.created_ms.to_string();
        metadata.last_modified = source.modified_ms.to_string();
        metadata.last_opened = "0".to_string();

        let content = Content::new(&source.extension, page_count, pages, parsed.authors());

        let page_data = format!("{BLANK_PAGE}\n").repeat(page_count + 1);

        DocumentBundle { metadata, content, local: LocalState::default(), page_data }
    }

    /// Reads and parses `source`, then synthesizes its bundle.
    #[instrument(skip(source, parser, ids), fields(path = %source.path().display()))]
    pub async fn from_source(
        source: &SourceFile,
        parent: Option<&str>,
        parser: &dyn DocumentParser,
        ids: &mut dyn IdSource,
    ) -> Result<Self> {
        let bytes = source.read_content().await?;
        let parsed = parser.parse(&bytes).await?;
        debug!(page_count = parsed.page_count, "Synthesizing bundle");
        Ok(Self::synthesize(source.attributes(), &parsed, parent, ids))
    }
}
