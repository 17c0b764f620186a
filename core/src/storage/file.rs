use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::fs;
use tracing::{debug, instrument};

use crate::parse::{parser_for_extension, DocumentParser};
use crate::storage::{not_found_as_file, Error, Result};

/// Filesystem attributes of a source document that end up in its bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAttributes {
    /// Milliseconds since the epoch.
    pub created_ms: u64,
    /// Milliseconds since the epoch.
    pub modified_ms: u64,
    /// Base name including the extension.
    pub file_name: String,
    /// Extension without the leading dot, empty if there is none.
    pub extension: String,
}

/// A document on the local filesystem that is about to be added to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
    attributes: SourceAttributes,
}

impl SourceFile {
    /// Stats the file at `path`.
    ///
    /// On Unix the creation time is the inode change time, which is what the
    /// tablet tooling has always recorded; elsewhere it is the file's birth time.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path).await.map_err(not_found_as_file(path))?;
        if !meta.is_file() {
            return Err(Error::InvalidPath(format!("Path is not a file: {}", path.display())));
        }

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::InvalidPath(format!("Invalid file name: {}", path.display())))?
            .to_string();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_string();

        let modified_ms = millis(meta.modified()?);
        let created_ms = created_millis(&meta)?;

        debug!(created_ms, modified_ms, "Source file attributes read");
        Ok(SourceFile {
            path: path.to_path_buf(),
            attributes: SourceAttributes { created_ms, modified_ms, file_name, extension },
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn attributes(&self) -> &SourceAttributes {
        &self.attributes
    }

    pub fn file_name(&self) -> &str {
        &self.attributes.file_name
    }

    pub fn extension(&self) -> &str {
        &self.attributes.extension
    }

    /// The built-in parser for this file's extension.
    pub fn parser(&self) -> Result<Box<dyn DocumentParser>> {
        parser_for_extension(self.extension())
            .ok_or_else(|| Error::UnsupportedFileType(self.extension().to_string()))
    }

    /// Asynchronously reads the entire content of the file into a byte vector.
    pub async fn read_content(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).await.map_err(not_found_as_file(&self.path))
    }
}

// Times before the epoch are clamped to zero.
fn millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(unix)]
fn created_millis(meta: &std::fs::Metadata) -> Result<u64> {
    use std::os::unix::fs::MetadataExt;
    let ms = meta.ctime().saturating_mul(1000) + meta.ctime_nsec() / 1_000_000;
    Ok(ms.max(0) as u64)
}

#[cfg(not(unix))]
fn created_millis(meta: &std::fs::Metadata) -> Result<u64> {
    Ok(millis(meta.created()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_reads_attributes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("One Piece T067.pdf");
        fs::write(&path, b"%PDF-1.5").await.unwrap();

        let before = millis(SystemTime::now()).saturating_sub(5_000);
        let source = SourceFile::open(&path).await.unwrap();
        let attrs = source.attributes();

        assert_eq!(attrs.file_name, "One Piece T067.pdf");
        assert_eq!(attrs.extension, "pdf");
        assert!(attrs.modified_ms >= before);
        assert!(attrs.created_ms >= before);
        assert_eq!(source.read_content().await.unwrap(), b"%PDF-1.5");
        assert_eq!(source.parser().unwrap().extension(), "pdf");
    }

    #[tokio::test]
    async fn test_open_without_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("README");
        fs::write(&path, b"x").await.unwrap();

        let source = SourceFile::open(&path).await.unwrap();
        assert_eq!(source.extension(), "");
        assert_eq!(source.file_name(), "README");
        assert!(matches!(source.parser(), Err(Error::UnsupportedFileType(ext)) if ext.is_empty()));
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.pdf");
        let result = SourceFile::open(&path).await;
        assert!(matches!(result, Err(Error::FileNotFound(p)) if p == path));
    }

    #[tokio::test]
    async fn test_open_directory_is_invalid() {
        let dir = tempdir().unwrap();
        let result = SourceFile::open(dir.path()).await;
        assert!(matches!(result, Err(Error::InvalidPath(_))));
    }
}
