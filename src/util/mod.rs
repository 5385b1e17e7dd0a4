//! Utility functions for common operations.
//!
//! - **Filename safety**: turning untrusted article titles into bounded,
//!   separator-free filenames
//!
//! # Examples
//!
//! ```
//! use feedstash::util::{sanitize_title, MAX_FILENAME_BYTES};
//!
//! let name = sanitize_title("Rust 2024/2025 roadmap");
//! assert_eq!(name, "Rust 20242025 roadmap");
//! assert!(name.len() <= MAX_FILENAME_BYTES);
//! ```

mod filename;

pub use filename::{sanitize_title, MAX_FILENAME_BYTES};
