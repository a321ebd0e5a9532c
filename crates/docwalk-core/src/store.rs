//! Document store trait implemented by database backends.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{DocumentData, DocumentPath, DocumentSnapshot, Query, StoreResult};

/// Options for [`Write::Set`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOptions {
    /// Merge the data into an existing document instead of replacing it.
    #[serde(default)]
    pub merge: bool,
}

impl SetOptions {
    /// Options that merge into an existing document.
    pub fn merge() -> Self {
        Self { merge: true }
    }
}

/// A single mutation, applied directly or buffered in a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Create a document, failing if it already exists.
    Create {
        path: DocumentPath,
        data: DocumentData,
    },
    /// Create or overwrite (or merge into) a document.
    Set {
        path: DocumentPath,
        data: DocumentData,
        options: SetOptions,
    },
    /// Update fields of an existing document, failing if it is missing.
    ///
    /// Keys may be dotted field paths addressing nested fields.
    Update {
        path: DocumentPath,
        data: DocumentData,
    },
    /// Delete a document. Deleting a missing document is not an error.
    Delete { path: DocumentPath },
}

impl Write {
    /// Returns the path of the document this write targets.
    pub fn path(&self) -> &DocumentPath {
        match self {
            Self::Create { path, .. }
            | Self::Set { path, .. }
            | Self::Update { path, .. }
            | Self::Delete { path } => path,
        }
    }

    /// Returns a short name of the write kind for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Set { .. } => "set",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Trait for document store backends.
///
/// Backends execute data-only [`Query`] values and apply [`Write`]s. The
/// consistency model and transaction isolation are properties of the
/// backend; callers only rely on `commit` being all-or-nothing.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the backend name for logging.
    fn backend_name(&self) -> &'static str;

    /// Executes a query and returns the matching documents in query order.
    ///
    /// Each returned snapshot carries a cursor usable with
    /// [`Query::start_after`] on the same query.
    async fn run_query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>>;

    /// Reads a single document, returning `None` if it does not exist.
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<DocumentSnapshot>>;

    /// Applies all writes atomically.
    async fn commit(&self, writes: Vec<Write>) -> StoreResult<()>;

    /// Allocates a new random document id.
    fn allocate_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    /// Creates a document, failing if it already exists.
    async fn create(&self, path: &DocumentPath, data: DocumentData) -> StoreResult<()> {
        self.commit(vec![Write::Create {
            path: path.clone(),
            data,
        }])
        .await
    }

    /// Creates or overwrites a document.
    async fn set(
        &self,
        path: &DocumentPath,
        data: DocumentData,
        options: SetOptions,
    ) -> StoreResult<()> {
        self.commit(vec![Write::Set {
            path: path.clone(),
            data,
            options,
        }])
        .await
    }

    /// Updates fields of an existing document.
    async fn update(&self, path: &DocumentPath, data: DocumentData) -> StoreResult<()> {
        self.commit(vec![Write::Update {
            path: path.clone(),
            data,
        }])
        .await
    }

    /// Deletes a document.
    async fn delete(&self, path: &DocumentPath) -> StoreResult<()> {
        self.commit(vec![Write::Delete { path: path.clone() }])
            .await
    }
}

/// Shared handle to a document store backend.
pub type SharedStore = Arc<dyn DocumentStore>;
