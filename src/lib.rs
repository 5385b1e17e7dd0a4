//! feedstash keeps a directory of feed articles up to date.
//!
//! Each configured feed gets a directory of small JSON records (one per
//! article, named after its sanitized title). Articles downloaded by the most
//! recent batch run are linked from a shared `new` directory.

pub mod config;
pub mod feed;
pub mod storage;
pub mod util;
