use std::fmt;

use docwalk_core::{DocumentData, DocumentRef, DocumentSnapshot, SharedStore, Transaction};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{Document, to_document_data};
use crate::{Result, TRACING_TARGET_DOCUMENT};

/// Where the writes of a [`MutableDocument`] go.
#[derive(Clone, Default)]
pub enum DocumentWriter {
    /// Writes execute immediately against the store.
    #[default]
    Direct,
    /// Writes are buffered in the transaction and applied by its commit.
    Transaction(Transaction),
}

impl DocumentWriter {
    /// Returns whether writes are buffered in a transaction.
    #[inline]
    pub fn is_transactional(&self) -> bool {
        matches!(self, Self::Transaction(_))
    }
}

impl fmt::Debug for DocumentWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("Direct"),
            Self::Transaction(_) => f.write_str("Transaction"),
        }
    }
}

/// A fetched document bound to its location in the store.
///
/// `data` holds the fetched fields deserialized into `T`; when a read
/// selected only some fields, `T` should describe that narrower shape.
/// Updates address the full document regardless of the selection.
#[derive(Debug, Clone)]
pub struct MutableDocument<T> {
    /// Id of the document within its collection.
    pub id: String,
    /// Fetched fields deserialized into `T`.
    pub data: T,
    /// Reference used by the write methods.
    pub reference: DocumentRef,
    writer: DocumentWriter,
}

impl<T: DeserializeOwned> MutableDocument<T> {
    /// Wraps a snapshot, deserializing its data into `T`.
    pub fn from_snapshot(
        snapshot: DocumentSnapshot,
        store: SharedStore,
        writer: DocumentWriter,
    ) -> Result<Self> {
        let data = snapshot.deserialize::<T>()?;
        let path = snapshot.path().clone();
        Ok(Self {
            id: path.id().to_owned(),
            data,
            reference: DocumentRef::new(store, path),
            writer,
        })
    }
}

impl<T> MutableDocument<T> {
    /// Returns where writes of this document go.
    #[inline]
    pub fn writer(&self) -> &DocumentWriter {
        &self.writer
    }

    /// Updates the document with the top-level fields of `data`.
    ///
    /// `data` must serialize to an object. Fields not present in it are
    /// left untouched.
    pub async fn update<U: Serialize>(&self, data: &U) -> Result<()> {
        let fields = to_document_data(data, self.reference.path())?;
        self.update_fields(fields).await
    }

    /// Updates individual fields. Keys may be dotted paths into nested objects.
    pub async fn update_fields(&self, fields: DocumentData) -> Result<()> {
        tracing::debug!(
            target: TRACING_TARGET_DOCUMENT,
            path = %self.reference.path(),
            fields = fields.len(),
            transactional = self.writer.is_transactional(),
            "Updating document"
        );
        match &self.writer {
            DocumentWriter::Direct => self.reference.update(fields).await?,
            DocumentWriter::Transaction(tx) => tx.update(self.reference.path(), fields).await?,
        }
        Ok(())
    }

    /// Deletes the document.
    pub async fn delete(&self) -> Result<()> {
        tracing::debug!(
            target: TRACING_TARGET_DOCUMENT,
            path = %self.reference.path(),
            transactional = self.writer.is_transactional(),
            "Deleting document"
        );
        match &self.writer {
            DocumentWriter::Direct => self.reference.delete().await?,
            DocumentWriter::Transaction(tx) => tx.delete(self.reference.path()).await?,
        }
        Ok(())
    }

    /// Drops the store binding and keeps the id and data.
    pub fn into_document(self) -> Document<T> {
        Document {
            id: self.id,
            data: self.data,
        }
    }

    /// Consumes the document and returns its data.
    pub fn into_data(self) -> T {
        self.data
    }
}
