//! Document snapshots returned by store reads.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Cursor, DocumentPath, StoreResult};

/// Raw document payload: a JSON object keyed by field name.
pub type DocumentData = serde_json::Map<String, Value>;

/// A document read from the store at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    path: DocumentPath,
    data: DocumentData,
    cursor: Option<Cursor>,
}

impl DocumentSnapshot {
    /// Creates a snapshot of the document at `path` holding `data`.
    pub fn new(path: DocumentPath, data: DocumentData) -> Self {
        Self {
            path,
            data,
            cursor: None,
        }
    }

    /// Attaches the query position of this snapshot.
    ///
    /// Backends set this on query results so the snapshot can be used as a
    /// start-after cursor for the same query.
    #[must_use]
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
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

    /// Returns the raw document data.
    #[inline]
    pub fn data(&self) -> &DocumentData {
        &self.data
    }

    /// Consumes the snapshot and returns the raw document data.
    pub fn into_data(self) -> DocumentData {
        self.data
    }

    /// Returns a start-after cursor positioned at this snapshot.
    pub fn cursor(&self) -> Cursor {
        self.cursor
            .clone()
            .unwrap_or_else(|| Cursor::new(self.path.clone(), Vec::new()))
    }

    /// Deserializes the document data into a typed value.
    pub fn deserialize<T: DeserializeOwned>(&self) -> StoreResult<T> {
        let value = serde_json::from_value(Value::Object(self.data.clone()))?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        name: String,
    }

    fn snapshot(data: Value) -> DocumentSnapshot {
        let Value::Object(data) = data else {
            panic!("expected an object");
        };
        DocumentSnapshot::new(DocumentPath::new("users/u1").unwrap(), data)
    }

    #[test]
    fn deserialize_into_typed_value() {
        let snapshot = snapshot(json!({ "name": "Ada", "age": 36 }));
        let user: User = snapshot.deserialize().unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(snapshot.id(), "u1");
    }

    #[test]
    fn cursor_defaults_to_path_only() {
        let snapshot = snapshot(json!({}));
        let cursor = snapshot.cursor();
        assert_eq!(cursor.path().to_string(), "users/u1");
        assert!(cursor.values().is_empty());
    }
}
