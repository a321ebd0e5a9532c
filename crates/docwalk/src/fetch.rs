//! Bounded page fetches and the cursor walk built on them.

use std::collections::VecDeque;

use docwalk_core::{Cursor, DocumentSnapshot, Query, SharedStore};
use serde::de::DeserializeOwned;

use crate::error::invariant;
use crate::{BuiltQuery, DocumentWriter, MutableDocument, Result, TRACING_TARGET_FETCH};

/// One bounded fetch's worth of documents.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Documents of this page, in query order.
    pub items: Vec<T>,
    /// Cursor to fetch the next page. Present only when the page was full.
    pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    /// Creates an empty final page.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    /// Returns whether another page may follow.
    #[inline]
    pub fn has_next(&self) -> bool {
        self.next_cursor.is_some()
    }

    /// Returns the number of documents in this page.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether this page holds no documents.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Fetches a single page of at most `page_size` documents.
///
/// The query is bounded to `page_size` and resumed after `cursor` when one
/// is given. A page shorter than `page_size` is the last one and carries no
/// cursor. Store failures propagate unchanged.
pub async fn fetch_page<T>(
    store: &SharedStore,
    query: &Query,
    cursor: Option<&Cursor>,
    page_size: usize,
) -> Result<Page<MutableDocument<T>>>
where
    T: DeserializeOwned,
{
    invariant(page_size > 0, || {
        "Page size must be a positive number".to_owned()
    })?;

    let mut paged = query.clone().limit(page_size);
    if let Some(cursor) = cursor {
        paged = paged.start_after(cursor.clone());
    }

    let snapshots = store.run_query(&paged).await?;
    tracing::debug!(
        target: TRACING_TARGET_FETCH,
        source = %query.source(),
        page_size,
        resumed = cursor.is_some(),
        fetched = snapshots.len(),
        "Fetched page"
    );

    if snapshots.is_empty() {
        return Ok(Page::empty());
    }

    let next_cursor = if snapshots.len() < page_size {
        None
    } else {
        snapshots.last().map(DocumentSnapshot::cursor)
    };

    let items = wrap_snapshots(snapshots, store, &DocumentWriter::Direct)?;
    Ok(Page { items, next_cursor })
}

/// Wraps raw snapshots into mutable documents bound to `writer`.
pub(crate) fn wrap_snapshots<T>(
    snapshots: Vec<DocumentSnapshot>,
    store: &SharedStore,
    writer: &DocumentWriter,
) -> Result<Vec<MutableDocument<T>>>
where
    T: DeserializeOwned,
{
    snapshots
        .into_iter()
        .map(|snapshot| MutableDocument::from_snapshot(snapshot, store.clone(), writer.clone()))
        .collect()
}

enum WalkState<T> {
    /// The query limit fits one fetch; its result is handed out in
    /// chunk-sized slices.
    Single {
        limit: usize,
        buffer: Option<VecDeque<MutableDocument<T>>>,
    },
    /// Cursor-driven paging, optionally bounded by a total limit.
    Paged {
        cursor: Option<Cursor>,
        remaining: Option<usize>,
    },
}

/// Drives [`fetch_page`] over a whole result set, one page at a time.
pub(crate) struct PageWalk<'a, T> {
    store: &'a SharedStore,
    query: &'a Query,
    chunk_size: usize,
    first_batch_only: bool,
    state: WalkState<T>,
    pages: usize,
    done: bool,
}

impl<'a, T: DeserializeOwned> PageWalk<'a, T> {
    /// Creates a walk over `built` with pages of at most `chunk_size`.
    ///
    /// `total_limit` caps the number of yielded documents on top of any
    /// limit carried by the query.
    pub fn new(
        store: &'a SharedStore,
        built: &'a BuiltQuery,
        chunk_size: usize,
        total_limit: Option<usize>,
        first_batch_only: bool,
    ) -> Self {
        let limit = match (built.limit, total_limit) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        let state = match limit {
            Some(limit) if built.disable_chunking => WalkState::Single {
                limit,
                buffer: None,
            },
            remaining => WalkState::Paged {
                cursor: None,
                remaining,
            },
        };

        Self {
            store,
            query: &built.query,
            chunk_size,
            first_batch_only,
            state,
            pages: 0,
            done: false,
        }
    }

    /// Returns the number of pages yielded so far.
    #[inline]
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Returns whether another page may follow the last yielded one.
    pub fn has_more(&self) -> bool {
        !self.done
    }

    /// Yields the next non-empty page, or `None` when the walk is over.
    pub async fn next_page(&mut self) -> Result<Option<Vec<MutableDocument<T>>>> {
        if self.done {
            return Ok(None);
        }

        let items = match &mut self.state {
            WalkState::Single { limit, buffer } => {
                if *limit == 0 {
                    self.done = true;
                    return Ok(None);
                }
                if buffer.is_none() {
                    let page = fetch_page::<T>(self.store, self.query, None, *limit).await?;
                    *buffer = Some(page.items.into());
                }
                let pending = buffer.get_or_insert_with(VecDeque::new);
                let take = self.chunk_size.min(pending.len());
                let items: Vec<_> = pending.drain(..take).collect();
                self.done = pending.is_empty();
                items
            }
            WalkState::Paged { cursor, remaining } => {
                let page_size = remaining.map_or(self.chunk_size, |r| r.min(self.chunk_size));
                if page_size == 0 {
                    self.done = true;
                    return Ok(None);
                }

                let page = fetch_page::<T>(self.store, self.query, cursor.as_ref(), page_size).await?;
                if let Some(remaining) = remaining.as_mut() {
                    *remaining = remaining.saturating_sub(page.len());
                }
                *cursor = page.next_cursor;
                self.done = cursor.is_none() || *remaining == Some(0);
                page.items
            }
        };

        if self.first_batch_only {
            self.done = true;
        }
        if items.is_empty() {
            self.done = true;
            return Ok(None);
        }

        self.pages += 1;
        Ok(Some(items))
    }
}
