use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::config::{Config, FeedConfig};
use crate::feed::fetcher::FeedFetcher;
use crate::feed::updater::{update_feed, UpdateError, UpdateReport};
use crate::storage::{ArticleStore, StorageError};

/// Outcome of one feed within a batch update.
#[derive(Debug)]
pub struct FeedOutcome {
    /// Name of the feed that was updated
    pub feed: String,
    /// Run counters, or the error that ended the feed's update
    pub result: Result<UpdateReport, UpdateError>,
}

/// Runs feed updates against a shared store and fetcher.
///
/// Cheap to clone; the feed list and fetcher are reference counted.
#[derive(Clone)]
pub struct Coordinator {
    store: ArticleStore,
    fetcher: Arc<dyn FeedFetcher>,
    feeds: Arc<Vec<FeedConfig>>,
}

impl Coordinator {
    pub fn new(store: ArticleStore, fetcher: Arc<dyn FeedFetcher>, feeds: Vec<FeedConfig>) -> Self {
        Self {
            store,
            fetcher,
            feeds: Arc::new(feeds),
        }
    }

    pub fn from_config(config: &Config, fetcher: Arc<dyn FeedFetcher>) -> Self {
        Self::new(
            ArticleStore::new(&config.feed_directory),
            fetcher,
            config.feeds.clone(),
        )
    }

    /// Update one named feed in the calling task.
    ///
    /// Like a batch run, this clears the `new` directory first, so afterwards it
    /// holds only the articles this feed just downloaded.
    ///
    /// # Errors
    ///
    /// [`UpdateError::FeedNotFound`] when `name` is not configured; nothing is
    /// written in that case. [`UpdateError::Storage`] when `new` cannot be
    /// reset. Otherwise whatever [`update_feed`] returns.
    pub async fn update_one(
        &self,
        name: &str,
        delete_existing: bool,
    ) -> Result<UpdateReport, UpdateError> {
        let Some(feed) = self.feeds.iter().find(|f| f.name == name) else {
            tracing::error!(feed = %name, "Feed not found in configuration");
            return Err(UpdateError::FeedNotFound(name.to_string()));
        };

        self.store
            .reset_new()
            .await
            .map_err(|source| UpdateError::Storage {
                feed: feed.name.clone(),
                source,
            })?;

        update_feed(&self.store, self.fetcher.as_ref(), feed, delete_existing).await
    }

    /// Update every configured feed concurrently.
    ///
    /// Clears the `new` directory once, then spawns one task per feed and
    /// waits for all of them. Outcomes are returned in completion order. A
    /// failing feed (fetch error, storage error, panic) does not affect the
    /// others.
    ///
    /// # Errors
    ///
    /// Only when the `new` directory cannot be reset, in which case no feed
    /// is updated.
    pub async fn update_all(&self, delete_existing: bool) -> Result<Vec<FeedOutcome>, StorageError> {
        if self.feeds.is_empty() {
            tracing::info!("No feeds configured, nothing to update");
            return Ok(Vec::new());
        }

        self.store.reset_new().await?;

        let mut tasks = JoinSet::new();
        let mut names = HashMap::with_capacity(self.feeds.len());

        for feed in self.feeds.iter().cloned() {
            let store = self.store.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let name = feed.name.clone();

            let handle = tasks.spawn(async move {
                let result = update_feed(&store, fetcher.as_ref(), &feed, delete_existing).await;
                FeedOutcome {
                    feed: feed.name,
                    result,
                }
            });
            names.insert(handle.id(), name);
        }

        let mut outcomes = Vec::with_capacity(self.feeds.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, outcome)) => outcomes.push(outcome),
                Err(e) => {
                    let feed = names.remove(&e.id()).unwrap_or_default();
                    tracing::error!(feed = %feed, error = %e, "Feed update task failed");
                    outcomes.push(FeedOutcome {
                        feed: feed.clone(),
                        result: Err(UpdateError::TaskFailed {
                            feed,
                            message: e.to_string(),
                        }),
                    });
                }
            }
        }

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        let downloaded: usize = outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|r| r.downloaded)
            .sum();
        tracing::info!(
            feeds = outcomes.len(),
            failed = failed,
            downloaded = downloaded,
            "All feeds updated"
        );

        Ok(outcomes)
    }
}
