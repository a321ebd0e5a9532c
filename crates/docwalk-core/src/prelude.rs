//! Convenient re-exports for common use.

pub use crate::error::{StoreError, StoreResult};
pub use crate::path::{CollectionPath, DocumentPath};
pub use crate::query::{Cursor, Direction, FilterOp, Query};
pub use crate::reference::{CollectionGroupRef, CollectionRef, DocumentRef, QueryRef};
pub use crate::snapshot::{DocumentData, DocumentSnapshot};
pub use crate::store::{DocumentStore, SetOptions, SharedStore};
pub use crate::transaction::Transaction;
