//! Collection and document paths.
//!
//! Paths are slash-separated and alternate between collection ids and
//! document ids: `users` is a collection, `users/u1` a document in it and
//! `users/u1/posts` a sub-collection of that document.

use std::fmt;
use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{StoreError, StoreResult};

fn split_segments(path: &str) -> StoreResult<Vec<&str>> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(StoreError::invalid_path("path cannot be empty"));
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(StoreError::invalid_path(format!(
            "path '{path}' contains an empty segment"
        )));
    }

    Ok(segments)
}

/// Path of a collection, e.g. `users` or `users/u1/posts`.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Parses a collection path. It must have an odd number of segments.
    pub fn new(path: impl AsRef<str>) -> StoreResult<Self> {
        let path = path.as_ref();
        let segments = split_segments(path)?;
        if segments.len() % 2 == 0 {
            return Err(StoreError::invalid_path(format!(
                "'{path}' points at a document, not a collection"
            )));
        }

        Ok(Self(segments.join("/")))
    }

    /// Returns the collection id, the last segment of the path.
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns the full path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the document this collection is nested under, if any.
    pub fn parent(&self) -> Option<DocumentPath> {
        let (parent, _) = self.0.rsplit_once('/')?;
        DocumentPath::new(parent).ok()
    }

    /// Returns the path of a document in this collection.
    pub fn doc(&self, id: impl AsRef<str>) -> StoreResult<DocumentPath> {
        let id = id.as_ref();
        if id.is_empty() || id.contains('/') {
            return Err(StoreError::invalid_path(format!(
                "'{id}' is not a valid document id"
            )));
        }

        Ok(DocumentPath {
            collection: self.clone(),
            id: id.to_owned(),
        })
    }
}

impl FromStr for CollectionPath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CollectionPath {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CollectionPath> for String {
    fn from(path: CollectionPath) -> Self {
        path.0
    }
}

/// Path of a single document, e.g. `users/u1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl DocumentPath {
    /// Parses a document path. It must have an even number of segments.
    pub fn new(path: impl AsRef<str>) -> StoreResult<Self> {
        let path = path.as_ref();
        let segments = split_segments(path)?;
        if segments.len() % 2 != 0 {
            return Err(StoreError::invalid_path(format!(
                "'{path}' points at a collection, not a document"
            )));
        }

        let (id, collection) = segments
            .split_last()
            .ok_or_else(|| StoreError::invalid_path("path cannot be empty"))?;

        Ok(Self {
            collection: CollectionPath(collection.join("/")),
            id: (*id).to_owned(),
        })
    }

    /// Returns the document id, the last segment of the path.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the collection containing this document.
    #[inline]
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// Returns the path of a sub-collection of this document.
    pub fn child(&self, collection_id: impl AsRef<str>) -> StoreResult<CollectionPath> {
        CollectionPath::new(format!("{self}/{}", collection_id.as_ref()))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

impl FromStr for DocumentPath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DocumentPath {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocumentPath> for String {
    fn from(path: DocumentPath) -> Self {
        path.to_string()
    }
}
