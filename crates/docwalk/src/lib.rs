#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for page fetches.
///
/// Use this target for logging bounded queries, page sizes and cursor hand-off.
pub const TRACING_TARGET_FETCH: &str = "docwalk::fetch";

/// Tracing target for chunked reads.
///
/// Use this target for logging full and limited reads and their progress.
pub const TRACING_TARGET_READ: &str = "docwalk::read";

/// Tracing target for bulk processing.
///
/// Use this target for logging handler failures, throttling and walk progress.
pub const TRACING_TARGET_PROCESS: &str = "docwalk::process";

/// Tracing target for single-document operations.
///
/// Use this target for logging document reads and writes made through
/// [`MutableDocument`] and the CRUD helpers.
pub const TRACING_TARGET_DOCUMENT: &str = "docwalk::document";

mod config;
pub mod document;
mod error;
pub mod event;
mod fetch;
mod inspect;
mod options;
mod process;
mod read;
mod readable;
mod walker;

pub mod prelude;

pub use config::WalkConfig;
pub use document::{Document, DocumentWriter, MutableDocument};
pub use error::{Error, Result};
pub use fetch::{Page, fetch_page};
pub use inspect::{BuiltQuery, QueryInfo, build_query};
pub use options::{GetDocumentsOptions, ProcessOptions};
pub use process::ProcessReport;
pub use readable::make_document_human_readable;
pub use walker::Walker;

// Re-export the store contract so most users only depend on this crate.
pub use docwalk_core as core;
