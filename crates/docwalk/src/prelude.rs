//! Convenient re-exports for common use.

pub use docwalk_core::prelude::*;

pub use crate::config::WalkConfig;
pub use crate::document::{Document, DocumentWriter, MutableDocument};
pub use crate::error::{Error, Result};
pub use crate::options::{GetDocumentsOptions, ProcessOptions};
pub use crate::process::ProcessReport;
pub use crate::walker::Walker;
