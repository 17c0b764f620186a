//! Writing a document's records into a store directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, instrument, warn};

use crate::storage::metadata::to_record_json;
use crate::storage::{
    not_found_as_file, DocumentBundle, Error, Result, SourceFile, CONTENT_EXTENSION, LOCAL_EXTENSION,
    METADATA_EXTENSION, PAGEDATA_EXTENSION, THUMBNAILS_EXTENSION,
};

/// Path of `<identifier>.<extension>` inside `dir`.
pub(crate) fn record_path(dir: &Path, identifier: &str, extension: &str) -> PathBuf {
    if extension.is_empty() {
        dir.join(identifier)
    } else {
        dir.join(format!("{identifier}.{extension}"))
    }
}

/// Fails if `identifier` is unusable as a file name or already has a metadata
/// record in `dir`.
pub(crate) async fn check_for_conflicts(dir: &Path, identifier: &str) -> Result<()> {
    if identifier.is_empty() || identifier.contains(['/', '\\', '.']) {
        return Err(Error::InvalidPath(format!("Invalid identifier: '{identifier}'")));
    }
    let metadata = record_path(dir, identifier, METADATA_EXTENSION);
    if fs::try_exists(&metadata).await? {
        return Err(Error::RecordExists(metadata));
    }
    Ok(())
}

/// Writes the source file and every record of `bundle` under `identifier`.
///
/// The metadata record is written last: the device only considers an item to
/// exist once it has one.
#[instrument(skip(dir, source, bundle), fields(dir = %dir.display()))]
pub(crate) async fn write_document(
    dir: &Path,
    identifier: &str,
    source: &SourceFile,
    bundle: &DocumentBundle,
) -> Result<()> {
    check_for_conflicts(dir, identifier).await?;
    // `<id>` without extension is the document's directory
    if source.extension().is_empty() {
        return Err(Error::UnsupportedFileType(String::new()));
    }

    let content = to_record_json(&bundle.content)?;
    let local = to_record_json(&bundle.local)?;
    let metadata = to_record_json(&bundle.metadata)?;

    let written = async {
        // Every write has settled before cleanup may run
        let (document_dir, thumbnails) = tokio::join!(
            fs::create_dir_all(record_path(dir, identifier, "")),
            fs::create_dir_all(record_path(dir, identifier, THUMBNAILS_EXTENSION)),
        );
        document_dir?;
        thumbnails?;

        let copy_target = record_path(dir, identifier, source.extension());
        fs::copy(source.path(), &copy_target)
            .await
            .map_err(not_found_as_file(source.path()))?;
        debug!("Copied source to {}", copy_target.display());

        let (pagedata_written, content_written, local_written) = tokio::join!(
            fs::write(record_path(dir, identifier, PAGEDATA_EXTENSION), &bundle.page_data),
            fs::write(record_path(dir, identifier, CONTENT_EXTENSION), content),
            fs::write(record_path(dir, identifier, LOCAL_EXTENSION), local),
        );
        pagedata_written?;
        content_written?;
        local_written?;
        fs::write(record_path(dir, identifier, METADATA_EXTENSION), metadata).await?;
        Ok::<_, Error>(())
    }
    .await;

    if let Err(e) = written {
        remove_partial(dir, identifier, source.extension()).await;
        return Err(e);
    }

    debug!("Document records written");
    Ok(())
}

/// Removes whatever a failed [`write_document`] left behind for `identifier`.
async fn remove_partial(dir: &Path, identifier: &str, extension: &str) {
    for directory in ["", THUMBNAILS_EXTENSION] {
        let path = record_path(dir, identifier, directory);
        report_removal(&path, fs::remove_dir_all(&path).await);
    }
    for extension in [
        extension,
        PAGEDATA_EXTENSION,
        CONTENT_EXTENSION,
        LOCAL_EXTENSION,
        METADATA_EXTENSION,
    ] {
        let path = record_path(dir, identifier, extension);
        report_removal(&path, fs::remove_file(&path).await);
    }
}

fn report_removal(path: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => debug!("Removed partial record {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial record {}: {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ParsedDocument;
    use tempfile::tempdir;

    async fn create_dummy_file(path: &Path) {
        fs::write(path, b"%PDF-1.5 dummy").await.unwrap();
    }

    async fn dummy_bundle(dir: &Path) -> (SourceFile, DocumentBundle) {
        let path = dir.join("Doc1.pdf");
        create_dummy_file(&path).await;
        let source = SourceFile::open(&path).await.unwrap();
        let parsed = ParsedDocument { page_count: 2, author: None };
        let mut n = 0;
        let mut ids = move || {
            n += 1;
            format!("p{n}")
        };
        let bundle = DocumentBundle::synthesize(source.attributes(), &parsed, Some("A"), &mut ids);
        (source, bundle)
    }

    #[tokio::test]
    async fn test_write_document_layout() {
        let src_dir = tempdir().unwrap();
        let store_dir = tempdir().unwrap();
        let (source, bundle) = dummy_bundle(src_dir.path()).await;

        write_document(store_dir.path(), "new-id", &source, &bundle).await.unwrap();

        let dir = store_dir.path();
        assert!(dir.join("new-id").is_dir());
        assert!(dir.join("new-id.thumbnails").is_dir());
        assert_eq!(fs::read(dir.join("new-id.pdf")).await.unwrap(), b"%PDF-1.5 dummy");
        assert_eq!(
            fs::read_to_string(dir.join("new-id.pagedata")).await.unwrap(),
            "blank\nblank\nblank\n"
        );
        assert_eq!(
            fs::read_to_string(dir.join("new-id.local")).await.unwrap(),
            "{\n\t\"contentFormatVersion\": 1\n}"
        );

        let content = fs::read_to_string(dir.join("new-id.content")).await.unwrap();
        assert!(content.starts_with("{\n\t\"coverPageNumber\": 0,"));
        let content: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(content["pages"], serde_json::json!(["p1", "p2", "p3"]));

        let metadata = fs::read_to_string(dir.join("new-id.metadata")).await.unwrap();
        let metadata: crate::storage::ItemMetadata = serde_json::from_str(&metadata).unwrap();
        assert_eq!(metadata, bundle.metadata);
    }

    #[tokio::test]
    async fn test_existing_record_is_a_conflict() {
        let src_dir = tempdir().unwrap();
        let store_dir = tempdir().unwrap();
        let (source, bundle) = dummy_bundle(src_dir.path()).await;
        create_dummy_file(&store_dir.path().join("taken.metadata")).await;

        let result = write_document(store_dir.path(), "taken", &source, &bundle).await;
        assert!(matches!(result, Err(Error::RecordExists(_))));
        // Nothing else was created
        assert!(!store_dir.path().join("taken").exists());
        assert!(!store_dir.path().join("taken.pdf").exists());
    }

    async fn store_entries(dir: &Path) -> Vec<String> {
        let mut entries = fs::read_dir(dir).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names
    }

    #[tokio::test]
    async fn test_failed_copy_leaves_no_records() {
        let src_dir = tempdir().unwrap();
        let store_dir = tempdir().unwrap();
        let (source, bundle) = dummy_bundle(src_dir.path()).await;
        fs::remove_file(source.path()).await.unwrap();

        let result = write_document(store_dir.path(), "fresh", &source, &bundle).await;
        assert!(matches!(result, Err(Error::FileNotFound(_))));
        assert_eq!(store_entries(store_dir.path()).await, Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_failed_record_write_removes_earlier_files() {
        let src_dir = tempdir().unwrap();
        let store_dir = tempdir().unwrap();
        let (source, bundle) = dummy_bundle(src_dir.path()).await;
        // A directory where the content record should go makes that write fail
        // after the source has been copied
        fs::create_dir(store_dir.path().join("fresh.content")).await.unwrap();

        let result = write_document(store_dir.path(), "fresh", &source, &bundle).await;
        assert!(matches!(result, Err(Error::Io(_))));
        let mut leftover = store_entries(store_dir.path()).await;
        leftover.sort();
        // The pre-existing directory is not ours to remove
        assert_eq!(leftover, vec!["fresh.content".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_identifiers() {
        let dir = tempdir().unwrap();
        for id in ["", "a/b", "a.b", "..", "a\\b"] {
            let result = check_for_conflicts(dir.path(), id).await;
            assert!(matches!(result, Err(Error::InvalidPath(_))), "accepted {id:?}");
        }
        assert!(check_for_conflicts(dir.path(), "fine-id").await.is_ok());
    }
}
