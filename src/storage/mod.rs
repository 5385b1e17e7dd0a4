mod articles;
mod types;

pub use articles::{ArticleStore, NEW_DIRECTORY};
pub use types::{ArticleRecord, StorageError};
