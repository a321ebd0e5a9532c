//! Query introspection and validation.
//!
//! Callers shape queries with a closure before handing them to the engine.
//! The engine owns paging and projection, so the shaped query is inspected
//! for a limit (which decides between a single fetch and a chunked walk)
//! and for a projection (which is rejected).

use docwalk_core::{Query, QueryRef};

use crate::error::invariant;
use crate::Result;

/// Limit and projection already applied to a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryInfo {
    /// Result count bound, if any.
    pub limit: Option<usize>,
    /// Projected fields, if any.
    pub select: Option<Vec<String>>,
}

impl QueryInfo {
    /// Reads the limit and projection of a query.
    pub fn inspect(query: &Query) -> Self {
        Self {
            limit: query.limit_value(),
            select: query.projection().map(<[String]>::to_vec),
        }
    }
}

/// A validated query ready for the page fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    /// Shaped query with the option projection applied.
    pub query: Query,
    /// The query carries a limit within the store ceiling, so a single
    /// fetch returns everything.
    pub disable_chunking: bool,
    /// Limit the caller applied to the query.
    pub limit: Option<usize>,
}

pub(crate) const SELECT_ON_QUERY: &str =
    "Select is not allowed to be set on the query. Use the options instead.";

/// Shapes the base query of `reference` and validates it.
///
/// Fails with an invariant violation if `query_fn` applies a projection or
/// a zero limit. A limit up to `max_query_limit` disables chunking; a
/// larger limit is kept as the total bound of a chunked walk.
pub fn build_query<R, Q>(
    reference: &R,
    query_fn: Q,
    select: Option<&[String]>,
    max_query_limit: usize,
) -> Result<BuiltQuery>
where
    R: QueryRef + ?Sized,
    Q: FnOnce(Query) -> Query,
{
    let shaped = query_fn(reference.query());
    let QueryInfo {
        limit,
        select: query_select,
    } = QueryInfo::inspect(&shaped);

    invariant(query_select.is_none(), || SELECT_ON_QUERY.to_owned())?;
    invariant(limit != Some(0), || {
        "Limit must be a positive number".to_owned()
    })?;

    let disable_chunking = limit.is_some_and(|limit| limit <= max_query_limit);
    let query = match select {
        Some(fields) => shaped.select(fields.iter().cloned()),
        None => shaped,
    };

    Ok(BuiltQuery {
        query,
        disable_chunking,
        limit,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use docwalk_core::mock::MemoryStore;
    use docwalk_core::{CollectionRef, FilterOp};

    use super::*;

    fn users() -> CollectionRef {
        CollectionRef::new(Arc::new(MemoryStore::new()), "users").unwrap()
    }

    #[test]
    fn inspect_reads_limit_and_projection() {
        let query = users().query().limit(5).select(["name"]);
        let info = QueryInfo::inspect(&query);
        assert_eq!(info.limit, Some(5));
        assert_eq!(info.select, Some(vec!["name".to_string()]));

        assert_eq!(QueryInfo::inspect(&users().query()), QueryInfo::default());
    }

    #[test]
    fn small_limit_disables_chunking() {
        let built = build_query(&users(), |q| q.limit(10), None, 1000).unwrap();
        assert!(built.disable_chunking);
        assert_eq!(built.limit, Some(10));
    }

    #[test]
    fn large_limit_keeps_chunking() {
        let built = build_query(&users(), |q| q.limit(1500), None, 1000).unwrap();
        assert!(!built.disable_chunking);
        assert_eq!(built.limit, Some(1500));
    }

    #[test]
    fn option_select_is_applied() {
        let select = vec!["name".to_string()];
        let built = build_query(
            &users(),
            |q| q.filter("age", FilterOp::GreaterThan, 18),
            Some(&select),
            1000,
        )
        .unwrap();
        assert_eq!(built.query.projection(), Some(&select[..]));
        assert_eq!(built.query.filters().len(), 1);
        assert!(!built.disable_chunking);
    }

    #[test]
    fn select_on_query_is_rejected() {
        let err = build_query(&users(), |q| q.select(["name"]), None, 1000).unwrap_err();
        assert!(err.is_invariant());
        assert!(err.to_string().contains("Use the options instead"));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err = build_query(&users(), |q| q.limit(0), None, 1000).unwrap_err();
        assert!(err.is_invariant());
    }
}
