//! In-memory document store for testing.
//!
//! [`MemoryStore`] evaluates the full [`Query`](crate::Query) shape
//! (filters, ordering, cursors, limits and projections) over documents held
//! in memory. It records every executed query so tests can assert on page
//! sizes and cursor usage, and it can be told to fail a query on demand.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! docwalk-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use docwalk_core::mock::MemoryStore;
//!
//! let store = MemoryStore::new();
//! store.seed("users", 3, |i| serde_json::json!({ "index": i })).await?;
//! assert_eq!(store.count("users").await, 3);
//! ```

mod evaluate;
mod memory_store;

pub use memory_store::{MemoryStore, QueryRecord};
