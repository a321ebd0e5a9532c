//! Bulk processing of query results.
//!
//! Pages are fetched and dispatched strictly one after the other. Handler
//! failures never abort a walk: they are collected and logged once the walk
//! is over. Fetch failures abort it.

mod errors;

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use docwalk_core::{DocumentData, DocumentRef, Query, QueryRef};
use futures::StreamExt;
use futures::stream;
use serde::Serialize;
use serde::de::DeserializeOwned;

use self::errors::{ErrorLog, ProcessingError};
use crate::error::invariant;
use crate::fetch::PageWalk;
use crate::walker::{Progress, throttle_delay};
use crate::{
    BuiltQuery, MutableDocument, ProcessOptions, Result, TRACING_TARGET_PROCESS, Walker,
    build_query,
};

/// Counts of a finished processing call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessReport {
    /// Pages fetched and dispatched.
    pub pages: usize,
    /// Documents handed to the handler.
    pub processed: usize,
    /// Failed handler invocations: documents in per-document mode, pages in
    /// chunk mode.
    pub failed: usize,
}

impl ProcessReport {
    /// Returns the number of successful handler invocations.
    pub fn succeeded(&self) -> usize {
        self.processed.saturating_sub(self.failed)
    }

    /// Returns whether any handler invocation failed.
    #[inline]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Settings of one processing call resolved against the walker config.
struct Plan {
    built: BuiltQuery,
    chunk_size: usize,
    concurrency: usize,
    throttle: Option<Duration>,
    first_batch_only: bool,
}

impl Walker {
    /// Runs `handler` on every document matched by the query.
    ///
    /// Up to `options.concurrency` handler calls of a page are in flight at
    /// once. A failed call is recorded and the walk goes on.
    pub async fn process_documents<T, R, Q, F, Fut, O, E>(
        &self,
        reference: &R,
        query_fn: Q,
        handler: F,
        options: ProcessOptions,
    ) -> Result<ProcessReport>
    where
        T: DeserializeOwned,
        R: QueryRef + ?Sized,
        Q: FnOnce(Query) -> Query,
        F: Fn(MutableDocument<T>) -> Fut,
        Fut: Future<Output = std::result::Result<O, E>>,
        E: Display,
    {
        let plan = self.plan(reference, query_fn, &options)?;
        let mut walk = PageWalk::<T>::new(
            reference.store(),
            &plan.built,
            plan.chunk_size,
            None,
            plan.first_batch_only,
        );

        let mut report = ProcessReport::default();
        let mut errors = ErrorLog::new(self.config().max_stored_errors);
        let mut progress = self.progress("Processing page");

        while let Some(page) = walk.next_page().await? {
            report.pages += 1;
            report.processed += page.len();

            let mut outcomes = stream::iter(page)
                .map(|document| {
                    let id = document.id.clone();
                    let call = handler(document);
                    async move { (id, call.await) }
                })
                .buffer_unordered(plan.concurrency);

            while let Some((id, outcome)) = outcomes.next().await {
                if let Err(err) = outcome {
                    report.failed += 1;
                    errors.record(ProcessingError::Document {
                        id,
                        message: err.to_string(),
                    });
                }
            }

            progress.tick();
            if let Some(delay) = plan.throttle
                && walk.has_more()
            {
                tokio::time::sleep(delay).await;
            }
        }

        self.finish(report, errors, &progress);
        Ok(report)
    }

    /// Runs `handler` on every page of documents matched by the query.
    ///
    /// A failed page is recorded and the walk goes on to the next one.
    /// Empty pages are never handed to the handler.
    pub async fn process_documents_by_chunk<T, R, Q, F, Fut, O, E>(
        &self,
        reference: &R,
        query_fn: Q,
        handler: F,
        options: ProcessOptions,
    ) -> Result<ProcessReport>
    where
        T: DeserializeOwned,
        R: QueryRef + ?Sized,
        Q: FnOnce(Query) -> Query,
        F: Fn(Vec<MutableDocument<T>>) -> Fut,
        Fut: Future<Output = std::result::Result<O, E>>,
        E: Display,
    {
        let plan = self.plan(reference, query_fn, &options)?;
        let mut walk = PageWalk::<T>::new(
            reference.store(),
            &plan.built,
            plan.chunk_size,
            None,
            plan.first_batch_only,
        );

        let mut report = ProcessReport::default();
        let mut errors = ErrorLog::new(self.config().max_stored_errors);
        let mut progress = self.progress("Processing chunk");

        while let Some(page) = walk.next_page().await? {
            report.pages += 1;
            report.processed += page.len();

            if let Err(err) = handler(page).await {
                report.failed += 1;
                errors.record(ProcessingError::Chunk {
                    page: report.pages,
                    message: err.to_string(),
                });
            }

            progress.tick();
            if let Some(delay) = plan.throttle
                && walk.has_more()
            {
                tokio::time::sleep(delay).await;
            }
        }

        self.finish(report, errors, &progress);
        Ok(report)
    }

    /// Runs `handler` on the reference of every matched document.
    ///
    /// No data fields are fetched, which suits bulk deletes and touches.
    /// Any `options.select` is replaced by the empty projection.
    pub async fn process_references<R, Q, F, Fut, O, E>(
        &self,
        reference: &R,
        query_fn: Q,
        handler: F,
        options: ProcessOptions,
    ) -> Result<ProcessReport>
    where
        R: QueryRef + ?Sized,
        Q: FnOnce(Query) -> Query,
        F: Fn(DocumentRef) -> Fut,
        Fut: Future<Output = std::result::Result<O, E>>,
        E: Display,
    {
        let options = ProcessOptions {
            select: Some(Vec::new()),
            ..options
        };
        self.process_documents(
            reference,
            query_fn,
            |document: MutableDocument<DocumentData>| handler(document.reference),
            options,
        )
        .await
    }

    fn plan<R, Q>(&self, reference: &R, query_fn: Q, options: &ProcessOptions) -> Result<Plan>
    where
        R: QueryRef + ?Sized,
        Q: FnOnce(Query) -> Query,
    {
        let chunk_size = self.page_size(options.chunk_size)?;
        let concurrency = options.concurrency.unwrap_or(chunk_size);
        invariant(concurrency > 0, || {
            "Concurrency must be a positive number".to_owned()
        })?;
        let throttle = throttle_delay(options.throttle_secs)?;

        let built = build_query(
            reference,
            query_fn,
            options.select.as_deref(),
            self.config().max_query_limit,
        )?;

        if options.limit_to_first_batch {
            tracing::warn!(
                target: TRACING_TARGET_PROCESS,
                source = %built.query.source(),
                "limit_to_first_batch is set, only the first page will be processed"
            );
        }

        Ok(Plan {
            built,
            chunk_size,
            concurrency,
            throttle,
            first_batch_only: options.limit_to_first_batch,
        })
    }

    fn finish(&self, report: ProcessReport, errors: ErrorLog, progress: &Progress) {
        errors.flush();
        progress.finish(report.processed);
        tracing::debug!(
            target: TRACING_TARGET_PROCESS,
            pages = report.pages,
            processed = report.processed,
            failed = report.failed,
            "Processing finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use docwalk_core::mock::MemoryStore;
    use docwalk_core::{CollectionRef, FilterOp};
    use serde::Deserialize;
    use serde_json::json;
    use tokio::sync::Mutex;

    use super::*;
    use crate::{Error, WalkConfig};

    #[derive(Debug, Clone, Deserialize)]
    struct Item {
        index: usize,
    }

    async fn setup(count: usize) -> (Arc<MemoryStore>, CollectionRef) {
        let memory = Arc::new(MemoryStore::new());
        memory
            .seed("items", count, |i| json!({ "index": i, "touched": false }))
            .await
            .unwrap();
        let items = CollectionRef::new(memory.clone(), "items").unwrap();
        (memory, items)
    }

    #[tokio::test]
    async fn failing_documents_do_not_stop_their_siblings() {
        let (memory, items) = setup(500).await;
        let handled = Arc::new(AtomicUsize::new(0));

        let report = Walker::default()
            .process_documents(
                &items,
                |q| q,
                |document: MutableDocument<Item>| {
                    let handled = handled.clone();
                    async move {
                        if [10, 250, 499].contains(&document.data.index) {
                            return Err(format!("cannot handle {}", document.id));
                        }
                        handled.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
                ProcessOptions::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.pages, 1);
        assert_eq!(report.processed, 500);
        assert_eq!(report.failed, 3);
        assert_eq!(report.succeeded(), 497);
        assert_eq!(handled.load(Ordering::SeqCst), 497);
        // A full page needs one more fetch to learn it was the last.
        assert_eq!(memory.query_count().await, 2);
    }

    #[tokio::test]
    async fn failures_in_one_page_do_not_stop_later_pages() {
        let (_memory, items) = setup(10).await;
        let seen = Arc::new(Mutex::new(Vec::new()));

        let report = Walker::default()
            .process_documents(
                &items,
                |q| q,
                |document: MutableDocument<Item>| {
                    let seen = seen.clone();
                    async move {
                        seen.lock().await.push(document.data.index);
                        if document.data.index < 4 {
                            Err("first page fails")
                        } else {
                            Ok(())
                        }
                    }
                },
                ProcessOptions::new().with_chunk_size(4),
            )
            .await
            .unwrap();

        assert_eq!(report.pages, 3);
        assert_eq!(report.failed, 4);
        let mut seen = seen.lock().await.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn errors_past_the_cap_are_still_counted() {
        let (_memory, items) = setup(20).await;
        let walker = Walker::new(WalkConfig::default().with_max_stored_errors(3)).unwrap();

        let report = walker
            .process_documents(
                &items,
                |q| q,
                |_: MutableDocument<Item>| async { Err::<(), _>("always") },
                ProcessOptions::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.processed, 20);
        assert_eq!(report.failed, 20);
    }

    #[tokio::test]
    async fn documents_can_update_themselves() {
        let (memory, items) = setup(6).await;

        Walker::default()
            .process_documents(
                &items,
                |q| q.filter("index", FilterOp::GreaterThanOrEqual, 3),
                |document: MutableDocument<Item>| async move {
                    document.update(&json!({ "touched": true })).await
                },
                ProcessOptions::new().with_chunk_size(2),
            )
            .await
            .unwrap();

        let touched = memory.document("items/00004").await.unwrap();
        assert_eq!(touched["touched"], json!(true));
        let untouched = memory.document("items/00001").await.unwrap();
        assert_eq!(untouched["touched"], json!(false));
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_waits_between_pages_only() {
        let (_memory, items) = setup(10).await;
        let started = tokio::time::Instant::now();

        let report = Walker::default()
            .process_documents(
                &items,
                |q| q,
                |_: MutableDocument<Item>| async { Ok::<_, Error>(()) },
                ProcessOptions::new().with_chunk_size(4).with_throttle_secs(1.0),
            )
            .await
            .unwrap();

        assert_eq!(report.pages, 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "{elapsed:?}");
    }

    #[tokio::test]
    async fn negative_throttle_is_rejected() {
        let (memory, items) = setup(3).await;
        let err = Walker::default()
            .process_documents(
                &items,
                |q| q,
                |_: MutableDocument<Item>| async { Ok::<_, Error>(()) },
                ProcessOptions::new().with_throttle_secs(-1.0),
            )
            .await
            .unwrap_err();
        assert!(err.is_invariant());
        assert_eq!(memory.query_count().await, 0);
    }

    #[tokio::test]
    async fn unrepresentable_throttle_is_rejected() {
        let (memory, items) = setup(3).await;
        let err = Walker::default()
            .process_documents(
                &items,
                |q| q,
                |_: MutableDocument<Item>| async { Ok::<_, Error>(()) },
                ProcessOptions::new().with_throttle_secs(1e20),
            )
            .await
            .unwrap_err();
        assert!(err.is_invariant());
        assert_eq!(memory.query_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_bounds_in_flight_handlers() {
        let (_memory, items) = setup(12).await;
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        Walker::default()
            .process_documents(
                &items,
                |q| q,
                |_: MutableDocument<Item>| {
                    let in_flight = in_flight.clone();
                    let peak = peak.clone();
                    async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok::<_, Error>(())
                    }
                },
                ProcessOptions::new().with_chunk_size(6).with_concurrency(2),
            )
            .await
            .unwrap();

        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_concurrency_is_rejected() {
        let (_memory, items) = setup(3).await;
        let err = Walker::default()
            .process_documents(
                &items,
                |q| q,
                |_: MutableDocument<Item>| async { Ok::<_, Error>(()) },
                ProcessOptions::new().with_concurrency(0),
            )
            .await
            .unwrap_err();
        assert!(err.is_invariant());
    }

    #[tokio::test]
    async fn first_batch_only_processes_one_page() {
        let (memory, items) = setup(25).await;

        let report = Walker::default()
            .process_documents(
                &items,
                |q| q,
                |_: MutableDocument<Item>| async { Ok::<_, Error>(()) },
                ProcessOptions::new()
                    .with_chunk_size(10)
                    .with_limit_to_first_batch(),
            )
            .await
            .unwrap();

        assert_eq!(report.pages, 1);
        assert_eq!(report.processed, 10);
        assert_eq!(memory.query_count().await, 1);
    }

    #[tokio::test]
    async fn fetch_errors_abort_processing() {
        let (memory, items) = setup(25).await;
        memory.fail_query_after(1, "unavailable").await;

        let err = Walker::default()
            .process_documents(
                &items,
                |q| q,
                |_: MutableDocument<Item>| async { Ok::<_, Error>(()) },
                ProcessOptions::new().with_chunk_size(10),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }

    #[tokio::test]
    async fn chunks_receive_whole_pages() {
        let (_memory, items) = setup(10).await;
        let sizes = Arc::new(Mutex::new(Vec::new()));

        let report = Walker::default()
            .process_documents_by_chunk(
                &items,
                |q| q,
                |page: Vec<MutableDocument<Item>>| {
                    let sizes = sizes.clone();
                    async move {
                        sizes.lock().await.push(page.len());
                        Ok::<_, Error>(())
                    }
                },
                ProcessOptions::new().with_chunk_size(4),
            )
            .await
            .unwrap();

        assert_eq!(*sizes.lock().await, vec![4, 4, 2]);
        assert_eq!(report.pages, 3);
        assert_eq!(report.processed, 10);
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn failing_chunk_does_not_block_the_walk() {
        let (_memory, items) = setup(9).await;
        let calls = Arc::new(AtomicUsize::new(0));

        let report = Walker::default()
            .process_documents_by_chunk(
                &items,
                |q| q,
                |page: Vec<MutableDocument<Item>>| {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        if page[0].data.index == 0 {
                            return Err("first chunk fails".to_owned());
                        }
                        Ok(())
                    }
                },
                ProcessOptions::new().with_chunk_size(3),
            )
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn empty_collection_never_calls_the_chunk_handler() {
        let (_memory, items) = setup(0).await;
        let calls = Arc::new(AtomicUsize::new(0));

        let report = Walker::default()
            .process_documents_by_chunk(
                &items,
                |q| q,
                |_: Vec<MutableDocument<Item>>| {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, Error>(())
                    }
                },
                ProcessOptions::new(),
            )
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(report, ProcessReport::default());
    }

    #[tokio::test]
    async fn references_fetch_no_data() {
        let (memory, items) = setup(5).await;

        let report = Walker::default()
            .process_references(
                &items,
                |q| q.filter("index", FilterOp::LessThan, 2),
                |reference: DocumentRef| async move { reference.delete().await },
                ProcessOptions::new().with_select(["index"]),
            )
            .await
            .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(memory.count("items").await, 3);
        assert_eq!(memory.queries().await[0].query.projection(), Some(&[][..]));
    }
}
