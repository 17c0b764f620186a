use std::path::Path;
use std::sync::{Arc, Mutex};

use tempfile::tempdir;
use tokio::fs;

use paperstack_core::event::Listener;
use paperstack_core::id::UuidSource;
use paperstack_core::parse::PdfParser;
use paperstack_core::storage::{
    CollectionTree, DocumentBundle, DocumentWritten, Error, ItemMetadata, SourceFile, Store,
};

async fn create_dummy(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.expect("Test helper: Failed to create parent dir");
    }
    fs::write(path, content).await.expect("Test helper: Failed to create dummy file");
}

async fn write_record(dir: &Path, identifier: &str, record: &ItemMetadata) {
    let json = serde_json::to_string_pretty(record).unwrap();
    create_dummy(&dir.join(format!("{identifier}.metadata")), &json).await;
}

/// A store with `Books//Manga` and one document in `Books`.
async fn seed_store(dir: &Path) {
    write_record(dir, "A", &ItemMetadata::collection("Books", "")).await;
    write_record(dir, "M", &ItemMetadata::collection("Manga", "A")).await;
    write_record(dir, "B", &ItemMetadata::document("Doc1", "A")).await;
    create_dummy(&dir.join("B.pdf"), "%PDF").await;
    create_dummy(&dir.join("B.local"), "{}").await;
    create_dummy(&dir.join("Z.tombstone"), "").await;
    fs::create_dir_all(dir.join("B.thumbnails")).await.unwrap();
}

/// Minimal three-page PDF without document information.
fn three_page_pdf() -> Vec<u8> {
    use lopdf::{dictionary, Document, Object};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..3)
        .map(|_| doc.add_object(dictionary! { "Type" => "Page", "Parent" => pages_id }).into())
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => 3 }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

#[tokio::test]
async fn integration_load_and_resolve() {
    let dir = tempdir().unwrap();
    seed_store(dir.path()).await;

    let store = Store::open(dir.path()).await.expect("Failed to open store");
    let records = store.load().await.expect("Failed to load store");
    assert_eq!(records.len(), 3);

    let tree = CollectionTree::build(&records).unwrap();
    assert_eq!(tree.resolve("Books"), Some("A"));
    assert_eq!(tree.resolve("Books//Manga"), Some("M"));
    assert_eq!(tree.resolve("Missing"), None);
    assert_eq!(tree.collection("A").unwrap().documents.get("Doc1").map(String::as_str), Some("B"));
}

#[tokio::test]
async fn integration_push_document_into_collection() {
    let store_dir = tempdir().unwrap();
    let src_dir = tempdir().unwrap();
    seed_store(store_dir.path()).await;
    let pdf_path = src_dir.path().join("Volume 67.pdf");
    fs::write(&pdf_path, three_page_pdf()).await.unwrap();

    let store = Store::open(store_dir.path()).await.unwrap();
    let tree = CollectionTree::build(&store.load().await.unwrap()).unwrap();
    let parent = tree.resolve("Books//Manga");

    let source = SourceFile::open(&pdf_path).await.unwrap();
    let bundle = DocumentBundle::from_source(&source, parent, &PdfParser, &mut UuidSource)
        .await
        .expect("Failed to synthesize bundle");
    assert_eq!(bundle.content.page_count, 3);
    assert_eq!(bundle.content.pages.len(), 4);
    assert!(bundle.content.document_metadata.authors.is_empty());

    let notified = Arc::new(Mutex::new(Vec::new()));
    let sink = notified.clone();
    let _listener = Listener::new(&store.on.document_written, move |e: &DocumentWritten| {
        sink.lock().unwrap().push(e.identifier.clone());
    });

    let identifier = uuid::Uuid::new_v4().to_string();
    store.write_bundle(&identifier, &source, &bundle).await.expect("Failed to write bundle");
    assert_eq!(*notified.lock().unwrap(), vec![identifier.clone()]);
    assert!(store_dir.path().join(format!("{identifier}.pdf")).is_file());

    // The new document shows up where it was filed
    let tree = CollectionTree::build(&store.load().await.unwrap()).unwrap();
    let manga = tree.collection("M").unwrap();
    assert_eq!(manga.documents.get("Volume 67.pdf"), Some(&identifier));
    assert!(tree.document_ids().contains(&identifier));
}

#[tokio::test]
async fn integration_unsupported_record_fails_whole_build() {
    let dir = tempdir().unwrap();
    seed_store(dir.path()).await;
    create_dummy(&dir.path().join("T.metadata"), r#"{"type": "TemplateType", "visibleName": "Grid"}"#).await;

    let store = Store::open(dir.path()).await.unwrap();
    let records = store.load().await.unwrap();
    let result = CollectionTree::build(&records);
    assert!(matches!(result, Err(Error::UnsupportedItemType { identifier, .. }) if identifier == "T"));
}
