//! Feed updating: fetch feeds and store their unseen articles.
//!
//! - [`parser`] - turns RSS/Atom/JSON Feed bytes into [`FeedItem`]s via `feed-rs`
//! - [`fetcher`] - the [`FeedFetcher`] seam and its HTTP implementation
//! - [`updater`] - one feed's run: fetch, optional reset, dedup, write, link
//! - [`coordinator`] - single-feed and concurrent all-feed updates
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use feedstash::feed::{Coordinator, HttpFetcher};
//!
//! let coordinator = Coordinator::from_config(&config, Arc::new(HttpFetcher::default()));
//!
//! // Refresh every feed concurrently, keeping what is already on disk
//! let outcomes = coordinator.update_all(false).await?;
//!
//! // Re-download one feed from scratch
//! let report = coordinator.update_one("tech", true).await?;
//! ```

mod coordinator;
mod fetcher;
mod parser;
mod updater;

pub use coordinator::{Coordinator, FeedOutcome};
pub use fetcher::{FeedFetcher, FetchError, HttpFetcher};
pub use parser::{parse_feed, FeedItem};
pub use updater::{update_feed, UpdateError, UpdateReport};
