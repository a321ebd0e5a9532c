//! Data-only query shape interpreted by store backends.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display};

use crate::{CollectionPath, DocumentPath};

/// Where a query reads its documents from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "path", rename_all = "snake_case")]
pub enum QuerySource {
    /// A single collection.
    Collection(CollectionPath),
    /// Every collection with the given collection id, at any depth.
    CollectionGroup(String),
}

impl QuerySource {
    /// Returns whether documents of the given collection belong to this source.
    pub fn contains(&self, collection: &CollectionPath) -> bool {
        match self {
            Self::Collection(path) => path == collection,
            Self::CollectionGroup(id) => collection.id() == id,
        }
    }
}

impl std::fmt::Display for QuerySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collection(path) => write!(f, "{path}"),
            Self::CollectionGroup(id) => write!(f, "group:{id}"),
        }
    }
}

/// Comparison operator of a field filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FilterOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    /// The field equals one of the values of an array operand.
    In,
    /// The field equals none of the values of an array operand.
    NotIn,
    /// The field is an array containing the operand.
    ArrayContains,
    /// The field is an array containing any value of an array operand.
    ArrayContainsAny,
}

/// A single `field <op> value` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Dotted field path, e.g. `address.city`.
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

/// Sort direction of an ordering clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// A single ordering clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Position marker referencing the last document of a page.
///
/// A cursor is only meaningful for the query (filters and ordering) that
/// produced it. Backends fill `values` with the ordering field values of
/// the referenced document; the document path acts as the tiebreaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    path: DocumentPath,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    values: Vec<Value>,
}

impl Cursor {
    /// Creates a cursor at the given document and ordering values.
    pub fn new(path: DocumentPath, values: Vec<Value>) -> Self {
        Self { path, values }
    }

    /// Returns the path of the referenced document.
    #[inline]
    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    /// Returns the ordering values captured from the referenced document.
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// A query against a collection or collection group.
///
/// Queries are plain data: builder methods return a modified copy and
/// execution happens in a [`DocumentStore`](crate::DocumentStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    source: QuerySource,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    order_by: Vec<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_after: Option<Cursor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    projection: Option<Vec<String>>,
}

impl Query {
    /// Creates an unfiltered query over the given source.
    pub fn new(source: QuerySource) -> Self {
        Self {
            source,
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            start_after: None,
            projection: None,
        }
    }

    /// Creates an unfiltered query over a collection.
    pub fn collection(path: CollectionPath) -> Self {
        Self::new(QuerySource::Collection(path))
    }

    /// Creates an unfiltered query over a collection group.
    pub fn collection_group(collection_id: impl Into<String>) -> Self {
        Self::new(QuerySource::CollectionGroup(collection_id.into()))
    }

    /// Adds a field filter.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Adds an ordering clause.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Bounds the number of returned documents.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Resumes the query after the document referenced by the cursor.
    #[must_use]
    pub fn start_after(mut self, cursor: Cursor) -> Self {
        self.start_after = Some(cursor);
        self
    }

    /// Restricts the returned data to the given fields.
    ///
    /// An empty field list returns documents without any data.
    #[must_use]
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Returns the query source.
    #[inline]
    pub fn source(&self) -> &QuerySource {
        &self.source
    }

    /// Returns the field filters.
    #[inline]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Returns the ordering clauses.
    #[inline]
    pub fn orderings(&self) -> &[OrderBy] {
        &self.order_by
    }

    /// Returns the result count bound, if any.
    #[inline]
    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    /// Returns the start-after cursor, if any.
    #[inline]
    pub fn cursor(&self) -> Option<&Cursor> {
        self.start_after.as_ref()
    }

    /// Returns the field projection, if any.
    #[inline]
    pub fn projection(&self) -> Option<&[String]> {
        self.projection.as_deref()
    }
}
