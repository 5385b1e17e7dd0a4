use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Filesystem errors raised by [`ArticleStore`](super::ArticleStore).
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O call failed on the given path
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The article record could not be encoded
    #[error("Failed to serialize article record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Every candidate name for a "new" pointer is already taken
    #[error("A new-article link already exists at '{}'", .0.display())]
    LinkExists(PathBuf),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// Metadata persisted for one downloaded article.
///
/// Serialized as `{"link": "...", "pubDate": "..."}`. The publish date is kept
/// exactly as the fetcher reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub link: String,
    #[serde(rename = "pubDate")]
    pub pub_date: String,
}
