use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::io::AsyncWriteExt;

use super::types::{ArticleRecord, StorageError};
use crate::util::sanitize_title;

/// Directory under the storage root holding links to the latest batch's articles.
pub const NEW_DIRECTORY: &str = "new";

/// Disambiguates staging files created within the same nanosecond.
static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Filesystem-backed article storage.
///
/// Layout under `root`:
///
/// ```text
/// <root>/<feed>/<sanitized title>   JSON ArticleRecord
/// <root>/new/<sanitized title>      symlink -> ../<feed>/<sanitized title>
/// ```
///
/// A feed's directory is only ever touched by the task updating that feed.
/// The `new` directory is shared by all tasks of a batch run; entries are
/// created with `symlink`, which never overwrites, so concurrent feeds cannot
/// clobber each other's pointers.
#[derive(Debug, Clone)]
pub struct ArticleStore {
    root: PathBuf,
}

impl ArticleStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn feed_dir(&self, feed: &str) -> PathBuf {
        self.root.join(feed)
    }

    pub fn new_dir(&self) -> PathBuf {
        self.root.join(NEW_DIRECTORY)
    }

    pub fn article_path(&self, feed: &str, title: &str) -> PathBuf {
        self.feed_dir(feed).join(title)
    }

    // ========================================================================
    // Directory Operations
    // ========================================================================

    /// Recursively delete `<root>/<scope>`.
    ///
    /// `scope` is a feed name or [`NEW_DIRECTORY`]. A missing directory is not
    /// an error. The `new` directory is recreated right away so links can be
    /// written into it during the same run.
    pub async fn reset(&self, scope: &str) -> Result<(), StorageError> {
        let dir = self.root.join(scope);
        if scope.is_empty() || scope == "." || scope == ".." || scope.contains('/') {
            return Err(StorageError::io(
                dir,
                std::io::Error::new(ErrorKind::InvalidInput, "refusing to reset this scope"),
            ));
        }

        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => tracing::debug!(path = %dir.display(), "Removed directory"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::io(&dir, e)),
        }

        if scope == NEW_DIRECTORY {
            self.ensure_new_dir().await?;
        }
        Ok(())
    }

    /// Clear the `new` view and recreate it empty.
    pub async fn reset_new(&self) -> Result<(), StorageError> {
        self.reset(NEW_DIRECTORY).await
    }

    /// Create the feed's directory if it does not exist yet.
    pub async fn ensure_feed_dir(&self, feed: &str) -> Result<(), StorageError> {
        let dir = self.feed_dir(feed);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::io(&dir, e))
    }

    /// Create the `new` directory without clearing it.
    pub async fn ensure_new_dir(&self) -> Result<(), StorageError> {
        let dir = self.new_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::io(&dir, e))
    }

    // ========================================================================
    // Article Operations
    // ========================================================================

    /// Whether an entry already occupies the article's path.
    ///
    /// Uses `symlink_metadata`, so anything at that name counts, including a
    /// dangling link. An empty title resolves to the feed directory itself and
    /// always reports `true`.
    pub async fn exists(&self, feed: &str, title: &str) -> bool {
        tokio::fs::symlink_metadata(self.article_path(feed, title))
            .await
            .is_ok()
    }

    /// Persist `record` as the article's JSON file and return its path.
    ///
    /// The record is encoded before anything touches disk. Bytes go to a hidden
    /// staging file that is renamed over the final name once fully written, so
    /// a failed write never leaves a truncated record behind. The file handle
    /// is closed before this returns on every path.
    pub async fn write(
        &self,
        feed: &str,
        title: &str,
        record: &ArticleRecord,
    ) -> Result<PathBuf, StorageError> {
        let bytes = serde_json::to_vec(record)?;
        let dir = self.feed_dir(feed);
        let path = dir.join(title);
        let staging = dir.join(staging_name());

        match write_staged(&staging, &path, &bytes).await {
            Ok(()) => Ok(path),
            Err(e) => {
                let _ = tokio::fs::remove_file(&staging).await;
                Err(e)
            }
        }
    }

    /// Expose an article through the `new` directory and return the link path.
    ///
    /// The link is `new/<title>` pointing at `../<feed>/<title>`. When another
    /// feed already claimed that name during this run, the link is created as
    /// `new/<feed> - <title>` instead. Existing links are never replaced; a
    /// link that already points at this article counts as success.
    pub async fn link_new(&self, feed: &str, title: &str) -> Result<PathBuf, StorageError> {
        let target = Path::new("..").join(feed).join(title);
        let new_dir = self.new_dir();

        let primary = new_dir.join(title);
        if try_link(&target, &primary).await? {
            return Ok(primary);
        }

        let qualified = new_dir.join(sanitize_title(&format!("{feed} - {title}")));
        tracing::debug!(
            feed = %feed,
            link = %primary.display(),
            fallback = %qualified.display(),
            "New-article link taken by another feed, using feed-qualified name"
        );
        if try_link(&target, &qualified).await? {
            return Ok(qualified);
        }
        Err(StorageError::LinkExists(qualified))
    }
}

fn staging_name() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(".{nanos:x}.{seq}.partial")
}

async fn write_staged(staging: &Path, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(staging)
        .await
        .map_err(|e| StorageError::io(staging, e))?;

    file.write_all(bytes)
        .await
        .map_err(|e| StorageError::io(staging, e))?;
    file.sync_all()
        .await
        .map_err(|e| StorageError::io(staging, e))?;
    drop(file);

    tokio::fs::rename(staging, path)
        .await
        .map_err(|e| StorageError::io(path, e))
}

/// Create `link -> target`. Returns `false` when the name is held by a
/// different entry.
async fn try_link(target: &Path, link: &Path) -> Result<bool, StorageError> {
    match symlink(target, link).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let existing = tokio::fs::read_link(link).await.ok();
            Ok(existing.as_deref() == Some(target))
        }
        Err(e) => Err(StorageError::io(link, e)),
    }
}

#[cfg(unix)]
async fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    tokio::fs::symlink(target, link).await
}

#[cfg(windows)]
async fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    tokio::fs::symlink_file(target, link).await
}
