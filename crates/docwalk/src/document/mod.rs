//! Documents returned by reads, and single-document helpers.

mod crud;
mod mutable;

use std::fmt::Display;

use docwalk_core::{DocumentData, StoreError};
use serde::{Deserialize, Serialize};

use crate::Result;

pub use crud::{
    add_document, add_document_tx, delete_document, delete_document_tx, get_document,
    get_document_data, get_document_data_maybe, get_document_data_maybe_tx, get_document_data_tx,
    get_document_maybe, get_document_maybe_tx, get_document_tx, get_specific_document,
    get_specific_document_data, get_specific_document_data_maybe,
    get_specific_document_data_maybe_tx, get_specific_document_maybe,
    get_specific_document_maybe_tx, get_specific_document_tx, set_document, set_document_tx,
    set_specific_document, set_specific_document_tx, update_document, update_document_tx,
    update_specific_document, update_specific_document_tx,
};
pub use mutable::{DocumentWriter, MutableDocument};

/// A plain document: its id and typed data.
///
/// Use this in functions that take a document but never write it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document<T> {
    /// Id of the document within its collection.
    pub id: String,
    /// Typed document data.
    pub data: T,
}

/// Serializes `value` into document data, failing unless it is an object.
pub(crate) fn to_document_data<T>(value: &T, path: impl Display) -> Result<DocumentData>
where
    T: Serialize + ?Sized,
{
    match serde_json::to_value(value)? {
        serde_json::Value::Object(data) => Ok(data),
        _ => Err(StoreError::invalid_data(format!(
            "data written to '{path}' must serialize to an object"
        ))
        .into()),
    }
}
