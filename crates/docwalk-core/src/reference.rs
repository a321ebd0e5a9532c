//! References binding a path to a shared store handle.

use std::fmt;

use crate::{
    CollectionPath, DocumentData, DocumentPath, DocumentSnapshot, Query, SetOptions, SharedStore,
    StoreResult, TRACING_TARGET_STORE,
};

/// Anything a query can start from: a collection or a collection group.
pub trait QueryRef: Send + Sync {
    /// Returns the store the reference reads from.
    fn store(&self) -> &SharedStore;

    /// Returns an unfiltered query over the referenced documents.
    fn query(&self) -> Query;
}

/// Reference to a collection.
#[derive(Clone)]
pub struct CollectionRef {
    store: SharedStore,
    path: CollectionPath,
}

impl CollectionRef {
    /// Creates a reference to the collection at `path`.
    pub fn new(store: SharedStore, path: impl AsRef<str>) -> StoreResult<Self> {
        Ok(Self {
            store,
            path: CollectionPath::new(path)?,
        })
    }

    /// Creates a reference from an already parsed path.
    pub fn from_path(store: SharedStore, path: CollectionPath) -> Self {
        Self { store, path }
    }

    /// Returns the collection path.
    #[inline]
    pub fn path(&self) -> &CollectionPath {
        &self.path
    }

    /// Returns the collection id.
    #[inline]
    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Returns a reference to the document with the given id.
    pub fn doc(&self, id: impl AsRef<str>) -> StoreResult<DocumentRef> {
        Ok(DocumentRef {
            store: self.store.clone(),
            path: self.path.doc(id)?,
        })
    }

    /// Returns a reference to a new document with a store-allocated id.
    pub fn new_doc(&self) -> StoreResult<DocumentRef> {
        let id = self.store.allocate_id();
        self.doc(id)
    }
}

impl QueryRef for CollectionRef {
    fn store(&self) -> &SharedStore {
        &self.store
    }

    fn query(&self) -> Query {
        Query::collection(self.path.clone())
    }
}

impl fmt::Debug for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionRef")
            .field("path", &self.path)
            .field("backend", &self.store.backend_name())
            .finish()
    }
}

/// Reference to every collection sharing a collection id.
#[derive(Clone)]
pub struct CollectionGroupRef {
    store: SharedStore,
    collection_id: String,
}

impl CollectionGroupRef {
    /// Creates a reference to the collection group `collection_id`.
    pub fn new(store: SharedStore, collection_id: impl Into<String>) -> Self {
        Self {
            store,
            collection_id: collection_id.into(),
        }
    }

    /// Returns the collection id shared by the group.
    #[inline]
    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }
}

impl QueryRef for CollectionGroupRef {
    fn store(&self) -> &SharedStore {
        &self.store
    }

    fn query(&self) -> Query {
        Query::collection_group(self.collection_id.clone())
    }
}

impl fmt::Debug for CollectionGroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionGroupRef")
            .field("collection_id", &self.collection_id)
            .field("backend", &self.store.backend_name())
            .finish()
    }
}

/// Reference to a single document.
#[derive(Clone)]
pub struct DocumentRef {
    store: SharedStore,
    path: DocumentPath,
}

impl DocumentRef {
    /// Creates a reference to the document at `path`.
    pub fn new(store: SharedStore, path: DocumentPath) -> Self {
        Self { store, path }
    }

    /// Returns the document id.
    #[inline]
    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Returns the document path.
    #[inline]
    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    /// Returns the store this reference writes to.
    #[inline]
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Returns a reference to a sub-collection of this document.
    pub fn collection(&self, collection_id: impl AsRef<str>) -> StoreResult<CollectionRef> {
        Ok(CollectionRef {
            store: self.store.clone(),
            path: self.path.child(collection_id)?,
        })
    }

    /// Reads the document, returning `None` if it does not exist.
    pub async fn get(&self) -> StoreResult<Option<DocumentSnapshot>> {
        tracing::debug!(
            target: TRACING_TARGET_STORE,
            path = %self.path,
            "Reading document"
        );
        self.store.get(&self.path).await
    }

    /// Creates the document, failing if it already exists.
    pub async fn create(&self, data: DocumentData) -> StoreResult<()> {
        self.store.create(&self.path, data).await
    }

    /// Creates or overwrites the document.
    pub async fn set(&self, data: DocumentData, options: SetOptions) -> StoreResult<()> {
        self.store.set(&self.path, data, options).await
    }

    /// Updates fields of the existing document.
    pub async fn update(&self, data: DocumentData) -> StoreResult<()> {
        self.store.update(&self.path, data).await
    }

    /// Deletes the document.
    pub async fn delete(&self) -> StoreResult<()> {
        self.store.delete(&self.path).await
    }
}

impl fmt::Debug for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentRef")
            .field("path", &self.path)
            .field("backend", &self.store.backend_name())
            .finish()
    }
}
