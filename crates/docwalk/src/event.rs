//! Accessors for payloads of change-triggered functions.
//!
//! Each accessor is named after the trigger it belongs to, so a handler for
//! a "document updated" trigger calls [`get_before_and_after_on_updated`]
//! and gets both states or an invariant violation.

use std::collections::BTreeMap;

use docwalk_core::DocumentSnapshot;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// Before and after states of a changed document.
///
/// `before` is `None` for a creation and `after` is `None` for a deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// State before the change.
    pub before: Option<DocumentSnapshot>,
    /// State after the change.
    pub after: Option<DocumentSnapshot>,
}

impl Change {
    /// Creates a change between two optional states.
    pub fn new(before: Option<DocumentSnapshot>, after: Option<DocumentSnapshot>) -> Self {
        Self { before, after }
    }
}

/// Event delivered to a change-triggered function.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEvent<D> {
    /// Payload: a [`DocumentSnapshot`] for creations, a [`Change`] for
    /// updates and writes. May be absent.
    pub data: Option<D>,
    /// Values of the wildcards in the trigger path, keyed by wildcard name.
    pub params: BTreeMap<String, String>,
}

impl<D> DocumentEvent<D> {
    /// Creates an event carrying `data` and no parameters.
    pub fn new(data: Option<D>) -> Self {
        Self {
            data,
            params: BTreeMap::new(),
        }
    }

    /// Adds a wildcard parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// Returns the data of a created document.
pub fn get_data_on_created<T: DeserializeOwned>(event: &DocumentEvent<DocumentSnapshot>) -> Result<T> {
    let Some(snapshot) = event.data.as_ref() else {
        return Err(Error::invariant("event.data is required"));
    };
    Ok(snapshot.deserialize()?)
}

/// Returns the data after a write, or `None` if the document was deleted.
pub fn get_data_on_written<T: DeserializeOwned>(event: &DocumentEvent<Change>) -> Result<Option<T>> {
    event_data_after_maybe(event)
}

/// Returns the data before and after an update.
pub fn get_before_and_after_on_updated<T: DeserializeOwned>(
    event: &DocumentEvent<Change>,
) -> Result<(T, T)> {
    Ok((event_data_before(event)?, event_data_after(event)?))
}

/// Returns the data before and after a write. Either side is `None` when
/// the write created or deleted the document.
pub fn get_before_and_after_on_written<T: DeserializeOwned>(
    event: &DocumentEvent<Change>,
) -> Result<(Option<T>, Option<T>)> {
    Ok((event_data_before_maybe(event)?, event_data_after_maybe(event)?))
}

/// Returns the data before the change, failing if it is absent.
pub fn event_data_before<T: DeserializeOwned>(event: &DocumentEvent<Change>) -> Result<T> {
    event_data_before_maybe(event)?.ok_or_else(|| Error::invariant("event.data.before is required"))
}

/// Returns the data after the change, failing if it is absent.
pub fn event_data_after<T: DeserializeOwned>(event: &DocumentEvent<Change>) -> Result<T> {
    event_data_after_maybe(event)?.ok_or_else(|| Error::invariant("event.data.after is required"))
}

/// Returns the data before the change, if any.
pub fn event_data_before_maybe<T: DeserializeOwned>(
    event: &DocumentEvent<Change>,
) -> Result<Option<T>> {
    event
        .data
        .as_ref()
        .and_then(|change| change.before.as_ref())
        .map(|snapshot| snapshot.deserialize().map_err(Into::into))
        .transpose()
}

/// Returns the data after the change, if any.
pub fn event_data_after_maybe<T: DeserializeOwned>(
    event: &DocumentEvent<Change>,
) -> Result<Option<T>> {
    event
        .data
        .as_ref()
        .and_then(|change| change.after.as_ref())
        .map(|snapshot| snapshot.deserialize().map_err(Into::into))
        .transpose()
}

#[cfg(test)]
mod tests {
    use docwalk_core::DocumentPath;
    use serde::Deserialize;
    use serde_json::{Value, json};

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order {
        status: String,
    }

    fn snapshot(value: Value) -> DocumentSnapshot {
        DocumentSnapshot::new(
            DocumentPath::new("orders/o1").unwrap(),
            value.as_object().cloned().unwrap_or_default(),
        )
    }

    fn status(value: &str) -> DocumentSnapshot {
        snapshot(json!({ "status": value }))
    }

    #[test]
    fn created_requires_data() {
        let event = DocumentEvent::new(Some(status("new"))).with_param("orderId", "o1");
        let order: Order = get_data_on_created(&event).unwrap();
        assert_eq!(order.status, "new");
        assert_eq!(event.params["orderId"], "o1");

        let empty = DocumentEvent::<DocumentSnapshot>::new(None);
        assert!(get_data_on_created::<Order>(&empty).unwrap_err().is_invariant());
    }

    #[test]
    fn updated_returns_both_states() {
        let event = DocumentEvent::new(Some(Change::new(
            Some(status("new")),
            Some(status("paid")),
        )));
        let (before, after): (Order, Order) = get_before_and_after_on_updated(&event).unwrap();
        assert_eq!(before.status, "new");
        assert_eq!(after.status, "paid");
    }

    #[test]
    fn updated_without_before_is_an_invariant_violation() {
        let event = DocumentEvent::new(Some(Change::new(None, Some(status("paid")))));
        let err = get_before_and_after_on_updated::<Order>(&event).unwrap_err();
        assert!(err.is_invariant());
        assert!(err.to_string().contains("event.data.before is required"));
    }

    #[test]
    fn written_handles_creation_and_deletion() {
        let created = DocumentEvent::new(Some(Change::new(None, Some(status("new")))));
        let (before, after): (Option<Order>, Option<Order>) =
            get_before_and_after_on_written(&created).unwrap();
        assert!(before.is_none());
        assert_eq!(after.unwrap().status, "new");

        let deleted = DocumentEvent::new(Some(Change::new(Some(status("done")), None)));
        assert!(get_data_on_written::<Order>(&deleted).unwrap().is_none());

        let missing = DocumentEvent::<Change>::new(None);
        assert!(get_data_on_written::<Order>(&missing).unwrap().is_none());
    }
}
