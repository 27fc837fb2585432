//! Local filesystem binary store.
//!
//! Uploads live flat in `upload_dir` as `<uuid>.<ext>`; thumbnails live in
//! `thumbnail_dir` as `thumb_<uuid>.<ext>`. Locators are bare file names, so
//! anything carrying a path separator is rejected.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use board_core::error::StorageError;
use board_core::ports::{BinaryStore, StoredBlob};

const THUMBNAIL_PREFIX: &str = "thumb_";
const TEMP_EXTENSION: &str = "tmp";

/// Local store configuration.
#[derive(Debug, Clone)]
pub struct LocalStoreConfig {
    pub upload_dir: PathBuf,
    pub thumbnail_dir: PathBuf,
    /// Thumbnails fit in a square of this many pixels.
    pub thumbnail_size: u32,
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            thumbnail_dir: PathBuf::from("thumbnails"),
            thumbnail_size: 200,
        }
    }
}

impl LocalStoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            thumbnail_dir: std::env::var("THUMBNAIL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.thumbnail_dir),
            thumbnail_size: std::env::var("THUMBNAIL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.thumbnail_size),
        }
    }
}

/// Binary store writing to local directories.
pub struct LocalFileStore {
    config: LocalStoreConfig,
}

impl LocalFileStore {
    pub fn new(config: LocalStoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocalStoreConfig {
        &self.config
    }

    fn blob_path(&self, locator: &str) -> Result<PathBuf, StorageError> {
        validate_locator(locator)?;
        Ok(self.config.upload_dir.join(locator))
    }

    fn thumbnail_locator(locator: &str) -> String {
        format!("{}{}", THUMBNAIL_PREFIX, locator)
    }

    fn thumbnail_path(&self, locator: &str) -> PathBuf {
        self.config
            .thumbnail_dir
            .join(Self::thumbnail_locator(locator))
    }
}

fn validate_locator(locator: &str) -> Result<(), StorageError> {
    let is_plain_name = !locator.is_empty()
        && locator != "."
        && locator != ".."
        && !locator.contains(['/', '\\'])
        && !locator.contains("..");

    if is_plain_name {
        Ok(())
    } else {
        Err(StorageError::InvalidLocator(locator.to_string()))
    }
}

/// Keep a short alphanumeric extension from the client's file name.
fn sanitized_extension(original_name: &str) -> Option<String> {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
}

fn io_error(path: &Path, e: std::io::Error) -> StorageError {
    StorageError::Io(format!("{}: {}", path.display(), e))
}

async fn remove_if_present(path: &Path) -> Result<bool, StorageError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error(path, e)),
    }
}

#[cfg(feature = "thumbnails")]
fn render_thumbnail(source: &Path, target: &Path, size: u32) -> Result<(), StorageError> {
    let thumbnail_error = |e: image::ImageError| StorageError::Thumbnail(e.to_string());

    // Locators keep the client's extension, so sniff the content instead.
    let reader = image::ImageReader::open(source)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| io_error(source, e))?;
    let format = reader.format().unwrap_or(image::ImageFormat::Png);
    let image = reader.decode().map_err(thumbnail_error)?;

    image
        .thumbnail(size, size)
        .save_with_format(target, format)
        .map_err(thumbnail_error)
}

#[async_trait]
impl BinaryStore for LocalFileStore {
    async fn store(&self, bytes: &[u8], original_name: &str) -> Result<String, StorageError> {
        let locator = match sanitized_extension(original_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let path = self.blob_path(&locator)?;

        fs::create_dir_all(&self.config.upload_dir)
            .await
            .map_err(|e| io_error(&self.config.upload_dir, e))?;

        // Atomic write: temp file + rename
        let temp_path = path.with_extension(TEMP_EXTENSION);
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| io_error(&temp_path, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| io_error(&temp_path, e))?;
        file.sync_all().await.map_err(|e| io_error(&temp_path, e))?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(io_error(&path, e));
        }

        tracing::debug!(locator = %locator, size = bytes.len(), "Blob stored");
        Ok(locator)
    }

    #[cfg(feature = "thumbnails")]
    async fn derive_thumbnail(&self, locator: &str) -> Result<String, StorageError> {
        let source = self.blob_path(locator)?;
        let target = self.thumbnail_path(locator);
        let size = self.config.thumbnail_size;

        fs::create_dir_all(&self.config.thumbnail_dir)
            .await
            .map_err(|e| io_error(&self.config.thumbnail_dir, e))?;

        // Decoding and resizing are CPU-bound.
        tokio::task::spawn_blocking(move || render_thumbnail(&source, &target, size))
            .await
            .map_err(|e| StorageError::Thumbnail(e.to_string()))??;

        let thumbnail = Self::thumbnail_locator(locator);
        tracing::debug!(locator = %locator, thumbnail = %thumbnail, "Thumbnail derived");
        Ok(thumbnail)
    }

    #[cfg(not(feature = "thumbnails"))]
    async fn derive_thumbnail(&self, locator: &str) -> Result<String, StorageError> {
        validate_locator(locator)?;
        Err(StorageError::Unsupported(
            "built without the thumbnails feature".to_string(),
        ))
    }

    async fn delete(&self, locator: &str) -> Result<(), StorageError> {
        let path = self.blob_path(locator)?;

        let removed = remove_if_present(&path).await?;
        remove_if_present(&self.thumbnail_path(locator)).await?;

        tracing::debug!(locator = %locator, removed, "Blob deleted");
        Ok(())
    }

    async fn exists(&self, locator: &str) -> Result<bool, StorageError> {
        let path = self.blob_path(locator)?;
        fs::try_exists(&path).await.map_err(|e| io_error(&path, e))
    }

    async fn list_locators(&self) -> Result<Vec<StoredBlob>, StorageError> {
        let dir = &self.config.upload_dir;
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(dir, e)),
        };

        let mut blobs = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(dir, e))? {
            let path = entry.path();
            let Some(locator) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if path.extension().is_some_and(|ext| ext == TEMP_EXTENSION) {
                continue;
            }

            let metadata = entry.metadata().await.map_err(|e| io_error(&path, e))?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().map_err(|e| io_error(&path, e))?;

            blobs.push(StoredBlob {
                locator,
                modified_at: DateTime::<Utc>::from(modified),
            });
        }

        Ok(blobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> LocalFileStore {
        LocalFileStore::new(LocalStoreConfig {
            upload_dir: dir.path().join("uploads"),
            thumbnail_dir: dir.path().join("thumbnails"),
            thumbnail_size: 200,
        })
    }

    #[test]
    fn test_extension_is_sanitized() {
        assert_eq!(sanitized_extension("photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(sanitized_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(sanitized_extension("noext"), None);
        assert_eq!(sanitized_extension("weird.p$p"), None);
        assert_eq!(sanitized_extension(""), None);
    }

    #[tokio::test]
    async fn test_store_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let locator = store.store(b"hello", "greeting.txt").await.unwrap();
        assert!(locator.ends_with(".txt"));
        assert!(store.exists(&locator).await.unwrap());

        let on_disk = std::fs::read(dir.path().join("uploads").join(&locator)).unwrap();
        assert_eq!(on_disk, b"hello");

        store.delete(&locator).await.unwrap();
        assert!(!store.exists(&locator).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_blob_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.delete("never-stored.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_traversal_locators_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        for locator in ["../etc/passwd", "a/b.png", "..", "", "a\\b"] {
            let result = store.delete(locator).await;
            assert!(
                matches!(result, Err(StorageError::InvalidLocator(_))),
                "{locator:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_list_locators() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.list_locators().await.unwrap().is_empty());

        let a = store.store(b"a", "a.png").await.unwrap();
        let b = store.store(b"b", "").await.unwrap();

        let mut listed: Vec<String> = store
            .list_locators()
            .await
            .unwrap()
            .into_iter()
            .map(|blob| blob.locator)
            .collect();
        listed.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(listed, expected);
    }

    #[cfg(feature = "thumbnails")]
    #[tokio::test]
    async fn test_thumbnail_fits_bounds_and_is_deleted_with_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut png = std::io::Cursor::new(Vec::new());
        image::RgbImage::new(400, 300)
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();

        let locator = store.store(png.get_ref(), "wide.png").await.unwrap();
        let thumbnail = store.derive_thumbnail(&locator).await.unwrap();
        assert_eq!(thumbnail, format!("thumb_{}", locator));

        let thumb_path = dir.path().join("thumbnails").join(&thumbnail);
        let (width, height) = image::image_dimensions(&thumb_path).unwrap();
        assert!(width <= 200 && height <= 200);

        store.delete(&locator).await.unwrap();
        assert!(!thumb_path.exists());
    }

    #[cfg(feature = "thumbnails")]
    #[tokio::test]
    async fn test_thumbnail_of_non_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let locator = store.store(b"not an image", "fake.png").await.unwrap();
        let result = store.derive_thumbnail(&locator).await;
        assert!(matches!(result, Err(StorageError::Thumbnail(_))));
    }

    #[cfg(feature = "thumbnails")]
    fn encoded(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
        let mut out = std::io::Cursor::new(Vec::new());
        image::RgbImage::new(width, height)
            .write_to(&mut out, format)
            .unwrap();
        out.into_inner()
    }

    #[cfg(feature = "thumbnails")]
    fn sniffed(path: &Path) -> (Option<image::ImageFormat>, (u32, u32)) {
        let reader = image::ImageReader::open(path)
            .unwrap()
            .with_guessed_format()
            .unwrap();
        let format = reader.format();
        (format, reader.into_dimensions().unwrap())
    }

    #[cfg(feature = "thumbnails")]
    #[tokio::test]
    async fn test_thumbnail_of_extensionless_upload() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let png = encoded(320, 240, image::ImageFormat::Png);
        let locator = store.store(&png, "photo").await.unwrap();
        assert!(!locator.contains('.'));

        let thumbnail = store.derive_thumbnail(&locator).await.unwrap();
        let (format, (width, height)) = sniffed(&dir.path().join("thumbnails").join(&thumbnail));
        assert_eq!(format, Some(image::ImageFormat::Png));
        assert!(width <= 200 && height <= 200);
    }

    #[cfg(feature = "thumbnails")]
    #[tokio::test]
    async fn test_thumbnail_keeps_content_format_over_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let jpeg = encoded(300, 300, image::ImageFormat::Jpeg);
        let locator = store.store(&jpeg, "camera.png").await.unwrap();

        let thumbnail = store.derive_thumbnail(&locator).await.unwrap();
        let (format, (width, height)) = sniffed(&dir.path().join("thumbnails").join(&thumbnail));
        assert_eq!(format, Some(image::ImageFormat::Jpeg));
        assert_eq!((width, height), (200, 200));
    }
}
