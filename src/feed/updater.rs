use thiserror::Error;

use crate::config::FeedConfig;
use crate::feed::fetcher::{FeedFetcher, FetchError};
use crate::storage::{ArticleRecord, ArticleStore, StorageError};
use crate::util::sanitize_title;

/// Errors that end one feed's update.
///
/// Per-article failures never show up here; they are logged and counted in
/// [`UpdateReport::failed`].
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The feed could not be fetched; nothing was written for it
    #[error("Failed to fetch feed '{feed}': {source}")]
    Fetch {
        feed: String,
        #[source]
        source: FetchError,
    },
    /// The feed's directory could not be reset or created
    #[error("Storage error for feed '{feed}': {source}")]
    Storage {
        feed: String,
        #[source]
        source: StorageError,
    },
    /// No configured feed has this name
    #[error("Feed '{0}' not found in configuration")]
    FeedNotFound(String),
    /// The update task panicked or was aborted
    #[error("Update task for feed '{feed}' failed: {message}")]
    TaskFailed { feed: String, message: String },
}

/// Counters for one feed's run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub feed: String,
    /// Articles written this run
    pub downloaded: usize,
    /// Articles already on disk (including repeats within the same fetch)
    pub skipped: usize,
    /// Articles whose record could not be written
    pub failed: usize,
    /// Items returned by the fetch
    pub total: usize,
}

/// Update a single feed: fetch, optionally wipe, then store unseen articles.
///
/// Items are handled in fetch order. The sanitized title is the dedup key, so
/// an item whose title is already on disk (from an earlier run or earlier in
/// this fetch) is skipped. A failed record write is logged and counted, and
/// the loop moves on. A failed `new` link is logged only; the article still
/// counts as downloaded.
///
/// # Errors
///
/// - [`UpdateError::Fetch`] - the fetch failed; the feed's directory is untouched
/// - [`UpdateError::Storage`] - the feed directory could not be reset or created
pub async fn update_feed(
    store: &ArticleStore,
    fetcher: &dyn FeedFetcher,
    feed: &FeedConfig,
    delete_existing: bool,
) -> Result<UpdateReport, UpdateError> {
    tracing::info!(feed = %feed.name, "Updating feed");

    let items = match fetcher.fetch(&feed.url).await {
        Ok(items) => items,
        Err(e) => {
            tracing::error!(feed = %feed.name, url = %feed.url, error = %e, "Failed to fetch feed");
            return Err(UpdateError::Fetch {
                feed: feed.name.clone(),
                source: e,
            });
        }
    };

    let storage_err = |source| UpdateError::Storage {
        feed: feed.name.clone(),
        source,
    };

    if delete_existing {
        store.reset(&feed.name).await.map_err(storage_err)?;
    }
    store.ensure_feed_dir(&feed.name).await.map_err(storage_err)?;

    let mut report = UpdateReport {
        feed: feed.name.clone(),
        total: items.len(),
        ..Default::default()
    };

    for item in items {
        let title = sanitize_title(&item.title);

        if store.exists(&feed.name, &title).await {
            tracing::debug!(feed = %feed.name, title = %title, "Article already exists - skipping");
            report.skipped += 1;
            continue;
        }

        let record = ArticleRecord {
            link: item.link,
            pub_date: item.published,
        };
        if let Err(e) = store.write(&feed.name, &title, &record).await {
            tracing::error!(
                feed = %feed.name,
                title = %item.title,
                error = %e,
                "Failed to store article"
            );
            report.failed += 1;
            continue;
        }
        report.downloaded += 1;

        if let Err(e) = store.link_new(&feed.name, &title).await {
            tracing::error!(
                feed = %feed.name,
                title = %title,
                error = %e,
                "Could not link newly downloaded article"
            );
        }
    }

    tracing::info!(
        feed = %feed.name,
        downloaded = report.downloaded,
        skipped = report.skipped,
        failed = report.failed,
        total = report.total,
        "Feed updated"
    );
    Ok(report)
}
