//! Thumbnail download and storage.
//!
//! [`HttpImageFetcher`] downloads an image URL with `reqwest` and hands the
//! bytes to an [`ImageStore`] under a sanitized file name. A failed download
//! is a per-article problem: the caller keeps the article and leaves the
//! picture column empty.
//!
//! Different URLs can end in the same file name. Within one run each name is
//! handed out once; later collisions get a numeric suffix before the
//! extension (`photo.jpg`, `photo-2.jpg`, ...), so every row points at its
//! own picture.

use crate::error::{Result, ScrapeError};
use crate::utils::sanitize_filename;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::{debug, instrument};

/// Destination for image bytes.
pub trait ImageStore {
    async fn store(&self, bytes: &[u8], filename: &str) -> Result<()>;
}

/// Retrieve an image by URL and return the file name it was stored under.
pub trait ImageFetcher {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Writes images into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    dir: PathBuf,
}

impl FsImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ImageStore for FsImageStore {
    async fn store(&self, bytes: &[u8], filename: &str) -> Result<()> {
        if filename.is_empty() {
            return Err(ScrapeError::ExtractionFailed(
                "image has no usable file name".to_string(),
            ));
        }
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.dir.join(filename), bytes).await?;
        Ok(())
    }
}

/// File names already handed out during this run.
#[derive(Debug, Default)]
pub struct FileNames {
    taken: Mutex<HashSet<String>>,
}

impl FileNames {
    /// Reserve `name`, or the first free `stem-N.ext` variant of it.
    pub fn claim(&self, name: &str) -> String {
        let mut taken = self.taken.lock().unwrap_or_else(|e| e.into_inner());
        if taken.insert(name.to_string()) {
            return name.to_string();
        }
        let path = Path::new(name);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let mut n = 2;
        loop {
            let candidate = format!("{stem}-{n}{ext}");
            if taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[derive(Debug)]
pub struct HttpImageFetcher<S> {
    client: reqwest::Client,
    store: S,
    names: FileNames,
}

impl<S: ImageStore> HttpImageFetcher<S> {
    pub fn new(store: S, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            store,
            names: FileNames::default(),
        })
    }
}

impl<S: ImageStore> ImageFetcher for HttpImageFetcher<S> {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let t0 = Instant::now();
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        let filename = self.names.claim(&sanitize_filename(url));
        self.store.store(&bytes, &filename).await?;
        debug!(
            %filename,
            bytes = bytes.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Stored image"
        );
        Ok(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fs_store_writes_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("images");
        let store = FsImageStore::new(&dir);
        store.store(b"\x89PNG", "a.png").await.unwrap();
        let written = std::fs::read(dir.join("a.png")).unwrap();
        assert_eq!(written, b"\x89PNG");
    }

    #[tokio::test]
    async fn test_fs_store_rejects_empty_name() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(tmp.path());
        let err = store.store(b"x", "").await.unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_colliding_names_get_suffixes() {
        let names = FileNames::default();
        assert_eq!(names.claim("photo.jpg"), "photo.jpg");
        assert_eq!(names.claim("photo.jpg"), "photo-2.jpg");
        assert_eq!(names.claim("photo.jpg"), "photo-3.jpg");
        assert_eq!(names.claim("other.jpg"), "other.jpg");
        assert_eq!(names.claim("noext"), "noext");
        assert_eq!(names.claim("noext"), "noext-2");
    }

    #[test]
    fn test_suffix_skips_names_already_taken() {
        let names = FileNames::default();
        assert_eq!(names.claim("a-2.png"), "a-2.png");
        assert_eq!(names.claim("a.png"), "a.png");
        assert_eq!(names.claim("a.png"), "a-3.png");
    }

    #[tokio::test]
    async fn test_http_fetch_failure_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let fetcher =
            HttpImageFetcher::new(FsImageStore::new(tmp.path()), Duration::from_secs(1)).unwrap();
        // Nothing listens on port 9 of the loopback address.
        let res = fetcher.fetch("http://127.0.0.1:9/photo.jpg").await;
        assert!(res.is_err());
        assert!(!tmp.path().join("photo.jpg").exists());
    }
}
