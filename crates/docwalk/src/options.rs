//! Per-call options of reads and bulk processing.

use serde::{Deserialize, Serialize};

/// Options of [`Walker::get_documents`](crate::Walker::get_documents) and
/// the other read operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetDocumentsOptions {
    /// Fields to fetch. An empty list fetches no data, only document identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
    /// Page size; the walker default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    /// Maximum number of documents to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Stop after the first page.
    #[serde(default)]
    pub limit_to_first_batch: bool,
}

impl GetDocumentsOptions {
    /// Creates options with every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the fetched data to the given fields.
    #[must_use]
    pub fn with_select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Set the page size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Cap the number of returned documents.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Stop after the first page.
    #[must_use]
    pub fn with_limit_to_first_batch(mut self) -> Self {
        self.limit_to_first_batch = true;
        self
    }
}

/// Options of [`Walker::process_documents`](crate::Walker::process_documents)
/// and [`Walker::process_documents_by_chunk`](crate::Walker::process_documents_by_chunk).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Fields to fetch. An empty list fetches no data, only document identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
    /// Page size; the walker default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    /// Delay in seconds between finishing one page and fetching the next.
    #[serde(default)]
    pub throttle_secs: f64,
    /// Stop after the first page.
    #[serde(default)]
    pub limit_to_first_batch: bool,
    /// Maximum number of handler invocations in flight within a page.
    /// Defaults to the page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
}

impl ProcessOptions {
    /// Creates options with every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the fetched data to the given fields.
    #[must_use]
    pub fn with_select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Set the page size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Set the delay between pages.
    #[must_use]
    pub fn with_throttle_secs(mut self, secs: f64) -> Self {
        self.throttle_secs = secs;
        self
    }

    /// Stop after the first page.
    #[must_use]
    pub fn with_limit_to_first_batch(mut self) -> Self {
        self.limit_to_first_batch = true;
        self
    }

    /// Bound the number of handler invocations in flight within a page.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }
}
