#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for store round trips.
///
/// Use this target for logging query execution, single reads and committed writes.
pub const TRACING_TARGET_STORE: &str = "docwalk_core::store";

/// Tracing target for transaction operations.
///
/// Use this target for logging buffered writes and commits.
pub const TRACING_TARGET_TRANSACTION: &str = "docwalk_core::transaction";

mod error;
mod path;
mod query;
mod reference;
mod snapshot;
mod store;
mod transaction;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

pub mod prelude;

pub use error::{StoreError, StoreResult};
pub use path::{CollectionPath, DocumentPath};
pub use query::{Cursor, Direction, Filter, FilterOp, OrderBy, Query, QuerySource};
pub use reference::{CollectionGroupRef, CollectionRef, DocumentRef, QueryRef};
pub use snapshot::{DocumentData, DocumentSnapshot};
pub use store::{DocumentStore, SetOptions, SharedStore, Write};
pub use transaction::{MAX_TRANSACTION_WRITES, Transaction};
