use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use super::evaluate;
use crate::{
    CollectionPath, Cursor, DocumentData, DocumentPath, DocumentSnapshot, DocumentStore, Query,
    StoreError, StoreResult, TRACING_TARGET_STORE, Write,
};

/// A query executed by a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct QueryRecord {
    /// The query as received by the store.
    pub query: Query,
    /// Number of documents returned, zero for a failed query.
    pub returned: usize,
}

#[derive(Debug)]
struct InjectedFailure {
    remaining: usize,
    message: String,
}

/// Document store keeping every document in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<DocumentPath, DocumentData>>,
    queries: Mutex<Vec<QueryRecord>>,
    failure: Mutex<Option<InjectedFailure>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the document at `path`.
    pub async fn insert(&self, path: impl AsRef<str>, data: Value) -> StoreResult<()> {
        let path = DocumentPath::new(path)?;
        let Value::Object(data) = data else {
            return Err(StoreError::invalid_data(format!(
                "document '{path}' must be a JSON object"
            )));
        };
        self.documents.write().await.insert(path, data);
        Ok(())
    }

    /// Inserts `count` documents into `collection`.
    ///
    /// Ids are zero-padded indices (`00000`, `00001`, ...) so that the
    /// default path ordering matches insertion order.
    pub async fn seed<F>(&self, collection: impl AsRef<str>, count: usize, make: F) -> StoreResult<()>
    where
        F: Fn(usize) -> Value,
    {
        let collection = CollectionPath::new(collection)?;
        let mut documents = self.documents.write().await;
        for index in 0..count {
            let path = collection.doc(format!("{index:05}"))?;
            let Value::Object(data) = make(index) else {
                return Err(StoreError::invalid_data(format!(
                    "document '{path}' must be a JSON object"
                )));
            };
            documents.insert(path, data);
        }
        Ok(())
    }

    /// Returns a copy of the document at `path`, if present.
    pub async fn document(&self, path: impl AsRef<str>) -> Option<DocumentData> {
        let path = DocumentPath::new(path).ok()?;
        self.documents.read().await.get(&path).cloned()
    }

    /// Returns the number of documents directly in `collection`.
    pub async fn count(&self, collection: impl AsRef<str>) -> usize {
        let Ok(collection) = CollectionPath::new(collection) else {
            return 0;
        };
        self.documents
            .read()
            .await
            .keys()
            .filter(|path| path.collection() == &collection)
            .count()
    }

    /// Returns every query executed so far, in execution order.
    pub async fn queries(&self) -> Vec<QueryRecord> {
        self.queries.lock().await.clone()
    }

    /// Returns the number of queries executed so far.
    pub async fn query_count(&self) -> usize {
        self.queries.lock().await.len()
    }

    /// Makes a future query fail with a backend error.
    ///
    /// The next `skip` queries succeed; the one after fails once.
    pub async fn fail_query_after(&self, skip: usize, message: impl Into<String>) {
        *self.failure.lock().await = Some(InjectedFailure {
            remaining: skip,
            message: message.into(),
        });
    }

    async fn take_failure(&self) -> Option<String> {
        let mut failure = self.failure.lock().await;
        match failure.as_mut() {
            Some(injected) if injected.remaining == 0 => failure.take().map(|f| f.message),
            Some(injected) => {
                injected.remaining -= 1;
                None
            }
            None => None,
        }
    }

    async fn record(&self, query: &Query, returned: usize) {
        self.queries.lock().await.push(QueryRecord {
            query: query.clone(),
            returned,
        });
    }

    fn evaluate(documents: &BTreeMap<DocumentPath, DocumentData>, query: &Query) -> Vec<DocumentSnapshot> {
        let orderings = query.orderings();

        let mut candidates: Vec<(&DocumentPath, &DocumentData, Vec<Value>)> = documents
            .iter()
            .filter(|(path, _)| query.source().contains(path.collection()))
            .filter(|(_, data)| query.filters().iter().all(|f| evaluate::matches(data, f)))
            .filter_map(|(path, data)| {
                evaluate::order_values(data, orderings).map(|values| (path, data, values))
            })
            .collect();

        candidates.sort_by(|(a_path, _, a_values), (b_path, _, b_values)| {
            evaluate::compare_positions((a_values, a_path), (b_values, b_path), orderings)
        });

        if let Some(cursor) = query.cursor() {
            candidates.retain(|(path, _, values)| {
                evaluate::compare_positions(
                    (values, path),
                    (cursor.values(), cursor.path()),
                    orderings,
                )
                .is_gt()
            });
        }

        let limit = query.limit_value().unwrap_or(usize::MAX);
        candidates
            .into_iter()
            .take(limit)
            .map(|(path, data, values)| {
                let data = match query.projection() {
                    Some(fields) => evaluate::project(data, fields),
                    None => data.clone(),
                };
                DocumentSnapshot::new(path.clone(), data)
                    .with_cursor(Cursor::new(path.clone(), values))
            })
            .collect()
    }

    fn apply(documents: &mut BTreeMap<DocumentPath, DocumentData>, write: Write) -> StoreResult<()> {
        match write {
            Write::Create { path, data } => {
                if documents.contains_key(&path) {
                    return Err(StoreError::already_exists(&path));
                }
                documents.insert(path, data);
            }
            Write::Set {
                path,
                data,
                options,
            } => {
                let existing = documents.entry(path).or_default();
                if options.merge {
                    evaluate::merge(existing, data);
                } else {
                    *existing = data;
                }
            }
            Write::Update { path, data } => {
                let Some(existing) = documents.get_mut(&path) else {
                    return Err(StoreError::not_found(&path));
                };
                for (field, value) in data {
                    evaluate::set_field(existing, &field, value);
                }
            }
            Write::Delete { path } => {
                documents.remove(&path);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn run_query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        if let Some(message) = self.take_failure().await {
            self.record(query, 0).await;
            return Err(StoreError::backend("run_query", message));
        }

        let results = {
            let documents = self.documents.read().await;
            Self::evaluate(&documents, query)
        };

        tracing::trace!(
            target: TRACING_TARGET_STORE,
            source = %query.source(),
            returned = results.len(),
            "Evaluated in-memory query"
        );
        self.record(query, results.len()).await;
        Ok(results)
    }

    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<DocumentSnapshot>> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(path)
            .map(|data| DocumentSnapshot::new(path.clone(), data.clone())))
    }

    async fn commit(&self, writes: Vec<Write>) -> StoreResult<()> {
        let mut documents = self.documents.write().await;
        let mut staged = documents.clone();
        for write in writes {
            Self::apply(&mut staged, write)?;
        }
        *documents = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{Direction, FilterOp, SetOptions};

    fn data(value: Value) -> DocumentData {
        value.as_object().cloned().unwrap_or_default()
    }

    fn users() -> Query {
        Query::collection(CollectionPath::new("users").unwrap())
    }

    #[tokio::test]
    async fn filters_order_and_limit() {
        let store = MemoryStore::new();
        store
            .seed("users", 10, |i| json!({ "age": 20 + i, "even": i % 2 == 0 }))
            .await
            .unwrap();

        let query = users()
            .filter("even", FilterOp::Equal, true)
            .order_by("age", Direction::Descending)
            .limit(2);
        let results = store.run_query(&query).await.unwrap();

        let ages: Vec<_> = results.iter().map(|s| s.data()["age"].clone()).collect();
        assert_eq!(ages, vec![json!(28), json!(26)]);
        assert_eq!(store.query_count().await, 1);
    }

    #[tokio::test]
    async fn cursor_resumes_after_last_document() {
        let store = MemoryStore::new();
        store.seed("users", 5, |i| json!({ "i": i })).await.unwrap();

        let first = store.run_query(&users().limit(2)).await.unwrap();
        let cursor = first[1].cursor();
        let second = store
            .run_query(&users().limit(2).start_after(cursor))
            .await
            .unwrap();

        let ids: Vec<_> = second.iter().map(|s| s.id().to_owned()).collect();
        assert_eq!(ids, vec!["00002", "00003"]);
    }

    #[tokio::test]
    async fn ordered_cursor_uses_field_values() {
        let store = MemoryStore::new();
        store.insert("users/a", json!({ "score": 3 })).await.unwrap();
        store.insert("users/b", json!({ "score": 1 })).await.unwrap();
        store.insert("users/c", json!({ "score": 2 })).await.unwrap();
        store.insert("users/d", json!({})).await.unwrap();

        let query = users().order_by("score", Direction::Ascending);
        let all = store.run_query(&query).await.unwrap();
        assert_eq!(all.len(), 3);

        let rest = store
            .run_query(&query.clone().start_after(all[0].cursor()))
            .await
            .unwrap();
        let ids: Vec<_> = rest.iter().map(|s| s.id().to_owned()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[tokio::test]
    async fn projection_and_collection_groups() {
        let store = MemoryStore::new();
        store
            .insert("users/u1/posts/p1", json!({ "title": "a", "body": "x" }))
            .await
            .unwrap();
        store
            .insert("posts/p2", json!({ "title": "b", "body": "y" }))
            .await
            .unwrap();

        let query = Query::collection_group("posts").select(["title"]);
        let results = store.run_query(&query).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|s| s.data().get("body").is_none()));

        let empty = store
            .run_query(&Query::collection_group("posts").select(Vec::<String>::new()))
            .await
            .unwrap();
        assert!(empty.iter().all(|s| s.data().is_empty()));
    }

    #[tokio::test]
    async fn injected_failure_hits_one_query() {
        let store = MemoryStore::new();
        store.seed("users", 1, |_| json!({})).await.unwrap();
        store.fail_query_after(1, "unavailable").await;

        assert!(store.run_query(&users()).await.is_ok());
        let err = store.run_query(&users()).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend { .. }));
        assert!(store.run_query(&users()).await.is_ok());
        assert_eq!(store.queries().await[1].returned, 0);
    }

    #[tokio::test]
    async fn commit_is_all_or_nothing() {
        let store = MemoryStore::new();
        let u1 = DocumentPath::new("users/u1").unwrap();
        let missing = DocumentPath::new("users/missing").unwrap();

        let result = store
            .commit(vec![
                Write::Set {
                    path: u1.clone(),
                    data: data(json!({ "a": 1 })),
                    options: SetOptions::default(),
                },
                Write::Update {
                    path: missing,
                    data: data(json!({ "a": 2 })),
                },
            ])
            .await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert!(store.get(&u1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_and_merge_semantics() {
        let store = MemoryStore::new();
        let path = DocumentPath::new("users/u1").unwrap();
        store
            .insert("users/u1", json!({ "profile": { "name": "Ada", "age": 36 } }))
            .await
            .unwrap();

        store
            .update(&path, data(json!({ "profile.age": 37 })))
            .await
            .unwrap();
        store
            .set(&path, data(json!({ "active": true })), SetOptions::merge())
            .await
            .unwrap();

        let doc = store.document("users/u1").await.unwrap();
        assert_eq!(
            Value::Object(doc),
            json!({ "profile": { "name": "Ada", "age": 37 }, "active": true })
        );

        let err = store.create(&path, DocumentData::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }
}
