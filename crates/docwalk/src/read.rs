//! Chunked reads.

use docwalk_core::{Query, QueryRef, Transaction};
use serde::de::DeserializeOwned;

use crate::error::invariant;
use crate::fetch::{PageWalk, wrap_snapshots};
use crate::{
    DocumentWriter, GetDocumentsOptions, MutableDocument, Result, TRACING_TARGET_READ, Walker,
    build_query, fetch_page,
};

const LIMIT_ON_FIRST_DOCUMENT: &str =
    "You should not set a limit when calling get_first_document. It returns only one document.";

impl Walker {
    /// Reads every document matched by `query_fn` applied to `reference`.
    ///
    /// A query limit up to the store ceiling is served by one fetch. Larger
    /// or absent limits are walked page by page with cursors, in pages of
    /// `options.chunk_size`. The first failed fetch aborts the read.
    pub async fn get_documents<T, R, Q>(
        &self,
        reference: &R,
        query_fn: Q,
        options: GetDocumentsOptions,
    ) -> Result<Vec<MutableDocument<T>>>
    where
        T: DeserializeOwned,
        R: QueryRef + ?Sized,
        Q: FnOnce(Query) -> Query,
    {
        self.read(reference, query_fn, None, options).await
    }

    /// Reads at most `limit` documents.
    ///
    /// Returns exactly `min(limit, available)` documents.
    pub async fn get_documents_up_to<T, R, Q>(
        &self,
        reference: &R,
        limit: usize,
        query_fn: Q,
        options: GetDocumentsOptions,
    ) -> Result<Vec<MutableDocument<T>>>
    where
        T: DeserializeOwned,
        R: QueryRef + ?Sized,
        Q: FnOnce(Query) -> Query,
    {
        invariant(limit > 0, || "Limit must be a positive number".to_owned())?;
        self.read(reference, query_fn, Some(limit), options).await
    }

    /// Like [`get_documents`](Self::get_documents), returning only the data.
    pub async fn get_documents_data<T, R, Q>(
        &self,
        reference: &R,
        query_fn: Q,
        options: GetDocumentsOptions,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        R: QueryRef + ?Sized,
        Q: FnOnce(Query) -> Query,
    {
        let documents = self.get_documents(reference, query_fn, options).await?;
        Ok(documents.into_iter().map(MutableDocument::into_data).collect())
    }

    /// Reads the first document matched by the query, if any.
    ///
    /// The query must not carry a limit or a projection; pass `select` to
    /// narrow the fetched fields.
    pub async fn get_first_document<T, R, Q>(
        &self,
        reference: &R,
        query_fn: Q,
        select: Option<&[String]>,
    ) -> Result<Option<MutableDocument<T>>>
    where
        T: DeserializeOwned,
        R: QueryRef + ?Sized,
        Q: FnOnce(Query) -> Query,
    {
        let query = self.first_document_query(reference, query_fn, select)?;
        let page = fetch_page(reference.store(), &query, None, 1).await?;
        Ok(page.items.into_iter().next())
    }

    /// Like [`get_first_document`](Self::get_first_document), returning only the data.
    pub async fn get_first_document_data<T, R, Q>(
        &self,
        reference: &R,
        query_fn: Q,
        select: Option<&[String]>,
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        R: QueryRef + ?Sized,
        Q: FnOnce(Query) -> Query,
    {
        let document = self.get_first_document(reference, query_fn, select).await?;
        Ok(document.map(MutableDocument::into_data))
    }

    /// Reads the first matching document through a transaction.
    ///
    /// The returned document buffers its writes in `tx`.
    pub async fn get_first_document_tx<T, R, Q>(
        &self,
        tx: &Transaction,
        reference: &R,
        query_fn: Q,
        select: Option<&[String]>,
    ) -> Result<Option<MutableDocument<T>>>
    where
        T: DeserializeOwned,
        R: QueryRef + ?Sized,
        Q: FnOnce(Query) -> Query,
    {
        let query = self.first_document_query(reference, query_fn, select)?.limit(1);
        let snapshots = tx.run_query(&query).await?;
        let writer = DocumentWriter::Transaction(tx.clone());
        let documents = wrap_snapshots(snapshots, tx.store(), &writer)?;
        Ok(documents.into_iter().next())
    }

    /// Like [`get_first_document_tx`](Self::get_first_document_tx), returning only the data.
    pub async fn get_first_document_data_tx<T, R, Q>(
        &self,
        tx: &Transaction,
        reference: &R,
        query_fn: Q,
        select: Option<&[String]>,
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        R: QueryRef + ?Sized,
        Q: FnOnce(Query) -> Query,
    {
        let document = self
            .get_first_document_tx(tx, reference, query_fn, select)
            .await?;
        Ok(document.map(MutableDocument::into_data))
    }

    /// Reads matching documents through a transaction in a single query.
    ///
    /// Transactions are bounded in size, so no paging takes place and
    /// `options.chunk_size` is ignored. `options.limit` bounds the query.
    pub async fn get_documents_tx<T, R, Q>(
        &self,
        tx: &Transaction,
        reference: &R,
        query_fn: Q,
        options: GetDocumentsOptions,
    ) -> Result<Vec<MutableDocument<T>>>
    where
        T: DeserializeOwned,
        R: QueryRef + ?Sized,
        Q: FnOnce(Query) -> Query,
    {
        let built = build_query(
            reference,
            query_fn,
            options.select.as_deref(),
            self.config().max_query_limit,
        )?;
        invariant(options.limit != Some(0), || {
            "Limit must be a positive number".to_owned()
        })?;
        let query = match (built.limit, options.limit) {
            (Some(a), Some(b)) => built.query.limit(a.min(b)),
            (None, Some(limit)) => built.query.limit(limit),
            _ => built.query,
        };

        let snapshots = tx.run_query(&query).await?;
        tracing::debug!(
            target: TRACING_TARGET_READ,
            source = %query.source(),
            fetched = snapshots.len(),
            "Read documents in transaction"
        );

        let writer = DocumentWriter::Transaction(tx.clone());
        wrap_snapshots(snapshots, tx.store(), &writer)
    }

    /// Like [`get_documents_tx`](Self::get_documents_tx), returning only the data.
    pub async fn get_documents_data_tx<T, R, Q>(
        &self,
        tx: &Transaction,
        reference: &R,
        query_fn: Q,
        options: GetDocumentsOptions,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        R: QueryRef + ?Sized,
        Q: FnOnce(Query) -> Query,
    {
        let documents = self.get_documents_tx(tx, reference, query_fn, options).await?;
        Ok(documents.into_iter().map(MutableDocument::into_data).collect())
    }

    fn first_document_query<R, Q>(
        &self,
        reference: &R,
        query_fn: Q,
        select: Option<&[String]>,
    ) -> Result<Query>
    where
        R: QueryRef + ?Sized,
        Q: FnOnce(Query) -> Query,
    {
        let built = build_query(reference, query_fn, select, self.config().max_query_limit)?;
        invariant(built.limit.is_none(), || LIMIT_ON_FIRST_DOCUMENT.to_owned())?;
        Ok(built.query)
    }

    async fn read<T, R, Q>(
        &self,
        reference: &R,
        query_fn: Q,
        up_to: Option<usize>,
        options: GetDocumentsOptions,
    ) -> Result<Vec<MutableDocument<T>>>
    where
        T: DeserializeOwned,
        R: QueryRef + ?Sized,
        Q: FnOnce(Query) -> Query,
    {
        let chunk_size = self.page_size(options.chunk_size)?;
        let built = build_query(
            reference,
            query_fn,
            options.select.as_deref(),
            self.config().max_query_limit,
        )?;

        let total_limit = match (up_to, options.limit) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        invariant(total_limit != Some(0), || {
            "Limit must be a positive number".to_owned()
        })?;

        if options.limit_to_first_batch {
            tracing::warn!(
                target: TRACING_TARGET_READ,
                source = %built.query.source(),
                "limit_to_first_batch is set, only the first page will be read"
            );
        }

        let store = reference.store();
        let mut documents = Vec::new();

        if built.disable_chunking {
            let query_limit = built.limit.unwrap_or(chunk_size);
            let limit = total_limit.map_or(query_limit, |total| total.min(query_limit));
            invariant(limit <= self.config().max_query_limit, || {
                format!(
                    "Single page limit {limit} exceeds the maximum query limit {}",
                    self.config().max_query_limit
                )
            })?;
            let page = fetch_page(store, &built.query, None, limit).await?;
            documents = page.items;
        } else {
            let mut walk = PageWalk::new(
                store,
                &built,
                chunk_size,
                total_limit,
                options.limit_to_first_batch,
            );
            while let Some(page) = walk.next_page().await? {
                documents.extend(page);
                if self.config().verbose {
                    tracing::info!(
                        target: TRACING_TARGET_READ,
                        pages = walk.pages(),
                        "Read {} documents",
                        documents.len()
                    );
                }
            }
        }

        if let Some(limit) = total_limit {
            documents.truncate(limit);
        }

        tracing::debug!(
            target: TRACING_TARGET_READ,
            source = %built.query.source(),
            count = documents.len(),
            "Read documents"
        );
        Ok(documents)
    }
}
