//! Transactions that buffer writes until commit.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    DocumentData, DocumentPath, DocumentSnapshot, Query, SetOptions, SharedStore, StoreError,
    StoreResult, TRACING_TARGET_TRANSACTION, Write,
};

/// Maximum number of writes a single commit accepts.
pub const MAX_TRANSACTION_WRITES: usize = 500;

#[derive(Debug, Default)]
struct PendingWrites {
    writes: Vec<Write>,
    committed: bool,
}

/// A transaction context.
///
/// Reads go straight to the store. Writes are buffered and applied
/// atomically by [`Transaction::commit`]. Cloning yields another handle to
/// the same transaction.
#[derive(Clone)]
pub struct Transaction {
    store: SharedStore,
    pending: Arc<Mutex<PendingWrites>>,
}

impl Transaction {
    /// Begins a transaction against the given store.
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            pending: Arc::new(Mutex::new(PendingWrites::default())),
        }
    }

    /// Runs `operation` in a new transaction and commits it if it succeeds.
    ///
    /// Buffered writes are discarded when `operation` returns an error.
    pub async fn run<F, Fut, T, E>(store: SharedStore, operation: F) -> Result<T, E>
    where
        F: FnOnce(Transaction) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<StoreError>,
    {
        let tx = Self::new(store);
        let output = operation(tx.clone()).await?;
        tx.commit().await?;
        Ok(output)
    }

    /// Returns the store the transaction runs against.
    #[inline]
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Reads a single document.
    pub async fn get(&self, path: &DocumentPath) -> StoreResult<Option<DocumentSnapshot>> {
        self.store.get(path).await
    }

    /// Executes a query.
    pub async fn run_query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        self.store.run_query(query).await
    }

    /// Allocates a new random document id.
    pub fn allocate_id(&self) -> String {
        self.store.allocate_id()
    }

    /// Buffers a create.
    pub async fn create(&self, path: &DocumentPath, data: DocumentData) -> StoreResult<()> {
        self.push(Write::Create {
            path: path.clone(),
            data,
        })
        .await
    }

    /// Buffers a set.
    pub async fn set(
        &self,
        path: &DocumentPath,
        data: DocumentData,
        options: SetOptions,
    ) -> StoreResult<()> {
        self.push(Write::Set {
            path: path.clone(),
            data,
            options,
        })
        .await
    }

    /// Buffers an update.
    pub async fn update(&self, path: &DocumentPath, data: DocumentData) -> StoreResult<()> {
        self.push(Write::Update {
            path: path.clone(),
            data,
        })
        .await
    }

    /// Buffers a delete.
    pub async fn delete(&self, path: &DocumentPath) -> StoreResult<()> {
        self.push(Write::Delete { path: path.clone() }).await
    }

    /// Returns the number of buffered writes.
    pub async fn pending_writes(&self) -> usize {
        self.pending.lock().await.writes.len()
    }

    /// Applies all buffered writes atomically and closes the transaction.
    ///
    /// Returns the number of applied writes.
    pub async fn commit(&self) -> StoreResult<usize> {
        let writes = {
            let mut pending = self.pending.lock().await;
            if pending.committed {
                return Err(StoreError::TransactionClosed);
            }
            pending.committed = true;
            std::mem::take(&mut pending.writes)
        };

        let count = writes.len();
        if count > 0 {
            self.store.commit(writes).await?;
        }

        tracing::debug!(
            target: TRACING_TARGET_TRANSACTION,
            writes = count,
            backend = self.store.backend_name(),
            "Committed transaction"
        );
        Ok(count)
    }

    async fn push(&self, write: Write) -> StoreResult<()> {
        let mut pending = self.pending.lock().await;
        if pending.committed {
            return Err(StoreError::TransactionClosed);
        }
        if pending.writes.len() >= MAX_TRANSACTION_WRITES {
            return Err(StoreError::TooManyWrites {
                limit: MAX_TRANSACTION_WRITES,
            });
        }

        tracing::trace!(
            target: TRACING_TARGET_TRANSACTION,
            kind = write.kind(),
            path = %write.path(),
            "Buffered write"
        );
        pending.writes.push(write);
        Ok(())
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("backend", &self.store.backend_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::mock::MemoryStore;

    fn data(value: serde_json::Value) -> DocumentData {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn writes_are_invisible_until_commit() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let path = DocumentPath::new("users/u1").unwrap();
        let tx = Transaction::new(store.clone());

        tx.set(&path, data(json!({ "name": "Ada" })), SetOptions::default())
            .await
            .unwrap();
        assert_eq!(tx.pending_writes().await, 1);
        assert!(store.get(&path).await.unwrap().is_none());

        assert_eq!(tx.commit().await.unwrap(), 1);
        assert!(store.get(&path).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn committed_transaction_rejects_writes() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let path = DocumentPath::new("users/u1").unwrap();
        let tx = Transaction::new(store);

        tx.commit().await.unwrap();
        assert!(matches!(
            tx.delete(&path).await,
            Err(StoreError::TransactionClosed)
        ));
        assert!(matches!(
            tx.commit().await,
            Err(StoreError::TransactionClosed)
        ));
    }

    #[tokio::test]
    async fn write_limit_is_enforced() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let tx = Transaction::new(store);

        for i in 0..MAX_TRANSACTION_WRITES {
            let path = DocumentPath::new(format!("users/u{i}")).unwrap();
            tx.delete(&path).await.unwrap();
        }

        let path = DocumentPath::new("users/overflow").unwrap();
        assert!(matches!(
            tx.delete(&path).await,
            Err(StoreError::TooManyWrites { limit: 500 })
        ));
    }

    #[tokio::test]
    async fn run_discards_writes_on_error() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let path = DocumentPath::new("users/u1").unwrap();

        let result: Result<(), StoreError> = Transaction::run(store.clone(), |tx| {
            let path = path.clone();
            async move {
                tx.set(&path, data(json!({ "a": 1 })), SetOptions::default())
                    .await?;
                Err(StoreError::invalid_data("abort"))
            }
        })
        .await;

        assert!(result.is_err());
        assert!(store.get(&path).await.unwrap().is_none());
    }
}
