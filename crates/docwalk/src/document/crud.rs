//! Single-document reads and writes, addressed by collection and id or by
//! document reference.

use docwalk_core::{CollectionRef, DocumentRef, SetOptions, Transaction};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{DocumentWriter, MutableDocument, to_document_data};
use crate::{Error, Result, TRACING_TARGET_DOCUMENT};

/// Reads a document, failing with [`Error::NotFound`] if it does not exist.
pub async fn get_document<T>(collection: &CollectionRef, id: &str) -> Result<MutableDocument<T>>
where
    T: DeserializeOwned,
{
    get_specific_document(&collection.doc(id)?).await
}

/// Reads a document, returning `None` if it does not exist or `id` is empty.
pub async fn get_document_maybe<T>(
    collection: &CollectionRef,
    id: Option<&str>,
) -> Result<Option<MutableDocument<T>>>
where
    T: DeserializeOwned,
{
    match id.filter(|id| !id.is_empty()) {
        Some(id) => get_specific_document_maybe(&collection.doc(id)?).await,
        None => Ok(None),
    }
}

/// Reads a document through a transaction, failing if it does not exist.
///
/// The returned document buffers its writes in `tx`.
pub async fn get_document_tx<T>(
    tx: &Transaction,
    collection: &CollectionRef,
    id: &str,
) -> Result<MutableDocument<T>>
where
    T: DeserializeOwned,
{
    get_specific_document_tx(tx, &collection.doc(id)?).await
}

/// Reads a document through a transaction, returning `None` if it does not
/// exist or `id` is empty.
pub async fn get_document_maybe_tx<T>(
    tx: &Transaction,
    collection: &CollectionRef,
    id: Option<&str>,
) -> Result<Option<MutableDocument<T>>>
where
    T: DeserializeOwned,
{
    match id.filter(|id| !id.is_empty()) {
        Some(id) => get_specific_document_maybe_tx(tx, &collection.doc(id)?).await,
        None => Ok(None),
    }
}

/// Reads the data of a document, failing if it does not exist.
pub async fn get_document_data<T>(collection: &CollectionRef, id: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    Ok(get_document(collection, id).await?.into_data())
}

/// Reads the data of a document, if it exists and `id` is not empty.
pub async fn get_document_data_maybe<T>(
    collection: &CollectionRef,
    id: Option<&str>,
) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let document = get_document_maybe(collection, id).await?;
    Ok(document.map(MutableDocument::into_data))
}

/// Reads the data of a document through a transaction, failing if it does
/// not exist.
pub async fn get_document_data_tx<T>(
    tx: &Transaction,
    collection: &CollectionRef,
    id: &str,
) -> Result<T>
where
    T: DeserializeOwned,
{
    Ok(get_document_tx(tx, collection, id).await?.into_data())
}

/// Reads the data of a document through a transaction, if it exists and
/// `id` is not empty.
pub async fn get_document_data_maybe_tx<T>(
    tx: &Transaction,
    collection: &CollectionRef,
    id: Option<&str>,
) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let document = get_document_maybe_tx(tx, collection, id).await?;
    Ok(document.map(MutableDocument::into_data))
}

/// Reads the document at `reference`, failing if it does not exist.
///
/// Use this when documents of one collection have different shapes and
/// each is addressed by its own reference.
pub async fn get_specific_document<T>(reference: &DocumentRef) -> Result<MutableDocument<T>>
where
    T: DeserializeOwned,
{
    get_specific_document_maybe(reference)
        .await?
        .ok_or_else(|| Error::not_found(reference.path()))
}

/// Reads the document at `reference`, returning `None` if it does not exist.
pub async fn get_specific_document_maybe<T>(
    reference: &DocumentRef,
) -> Result<Option<MutableDocument<T>>>
where
    T: DeserializeOwned,
{
    let Some(snapshot) = reference.get().await? else {
        return Ok(None);
    };

    let document =
        MutableDocument::from_snapshot(snapshot, reference.store().clone(), DocumentWriter::Direct)?;
    Ok(Some(document))
}

/// Reads the document at `reference` through a transaction, failing if it
/// does not exist.
pub async fn get_specific_document_tx<T>(
    tx: &Transaction,
    reference: &DocumentRef,
) -> Result<MutableDocument<T>>
where
    T: DeserializeOwned,
{
    get_specific_document_maybe_tx(tx, reference)
        .await?
        .ok_or_else(|| Error::not_found(reference.path()))
}

/// Reads the document at `reference` through a transaction, returning
/// `None` if it does not exist.
pub async fn get_specific_document_maybe_tx<T>(
    tx: &Transaction,
    reference: &DocumentRef,
) -> Result<Option<MutableDocument<T>>>
where
    T: DeserializeOwned,
{
    let Some(snapshot) = tx.get(reference.path()).await? else {
        return Ok(None);
    };

    let writer = DocumentWriter::Transaction(tx.clone());
    let document = MutableDocument::from_snapshot(snapshot, tx.store().clone(), writer)?;
    Ok(Some(document))
}

/// Reads the data of the document at `reference`, failing if it does not exist.
pub async fn get_specific_document_data<T>(reference: &DocumentRef) -> Result<T>
where
    T: DeserializeOwned,
{
    Ok(get_specific_document(reference).await?.into_data())
}

/// Reads the data of the document at `reference`, if it exists.
pub async fn get_specific_document_data_maybe<T>(reference: &DocumentRef) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let document = get_specific_document_maybe(reference).await?;
    Ok(document.map(MutableDocument::into_data))
}

/// Reads the data of the document at `reference` through a transaction, if
/// it exists.
pub async fn get_specific_document_data_maybe_tx<T>(
    tx: &Transaction,
    reference: &DocumentRef,
) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let document = get_specific_document_maybe_tx(tx, reference).await?;
    Ok(document.map(MutableDocument::into_data))
}

/// Creates or overwrites the document at `reference`.
pub async fn set_specific_document<T>(
    reference: &DocumentRef,
    data: &T,
    options: SetOptions,
) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let data = to_document_data(data, reference.path())?;
    tracing::debug!(
        target: TRACING_TARGET_DOCUMENT,
        path = %reference.path(),
        merge = options.merge,
        "Setting document"
    );
    reference.set(data, options).await?;
    Ok(())
}

/// Buffers a set of the document at `reference` in a transaction.
pub async fn set_specific_document_tx<T>(
    tx: &Transaction,
    reference: &DocumentRef,
    data: &T,
    options: SetOptions,
) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let data = to_document_data(data, reference.path())?;
    tx.set(reference.path(), data, options).await?;
    Ok(())
}

/// Updates fields of the existing document at `reference`.
pub async fn update_specific_document<T>(reference: &DocumentRef, data: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let data = to_document_data(data, reference.path())?;
    tracing::debug!(
        target: TRACING_TARGET_DOCUMENT,
        path = %reference.path(),
        fields = data.len(),
        "Updating document"
    );
    reference.update(data).await?;
    Ok(())
}

/// Buffers an update of the document at `reference` in a transaction.
pub async fn update_specific_document_tx<T>(
    tx: &Transaction,
    reference: &DocumentRef,
    data: &T,
) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let data = to_document_data(data, reference.path())?;
    tx.update(reference.path(), data).await?;
    Ok(())
}

/// Creates or overwrites a document.
pub async fn set_document<T>(
    collection: &CollectionRef,
    id: &str,
    data: &T,
    options: SetOptions,
) -> Result<()>
where
    T: Serialize + ?Sized,
{
    set_specific_document(&collection.doc(id)?, data, options).await
}

/// Buffers a set of a document in a transaction.
pub async fn set_document_tx<T>(
    tx: &Transaction,
    collection: &CollectionRef,
    id: &str,
    data: &T,
    options: SetOptions,
) -> Result<()>
where
    T: Serialize + ?Sized,
{
    set_specific_document_tx(tx, &collection.doc(id)?, data, options).await
}

/// Updates fields of an existing document.
///
/// Prefer [`MutableDocument::update`] when the document was already read.
pub async fn update_document<T>(collection: &CollectionRef, id: &str, data: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    update_specific_document(&collection.doc(id)?, data).await
}

/// Buffers an update of an existing document in a transaction.
pub async fn update_document_tx<T>(
    tx: &Transaction,
    collection: &CollectionRef,
    id: &str,
    data: &T,
) -> Result<()>
where
    T: Serialize + ?Sized,
{
    update_specific_document_tx(tx, &collection.doc(id)?, data).await
}

/// Deletes a document. Deleting a missing document succeeds.
pub async fn delete_document(collection: &CollectionRef, id: &str) -> Result<()> {
    let reference = collection.doc(id)?;
    tracing::debug!(
        target: TRACING_TARGET_DOCUMENT,
        path = %reference.path(),
        "Deleting document"
    );
    reference.delete().await?;
    Ok(())
}

/// Buffers a delete in a transaction.
pub async fn delete_document_tx(
    tx: &Transaction,
    collection: &CollectionRef,
    id: &str,
) -> Result<()> {
    let reference = collection.doc(id)?;
    tx.delete(reference.path()).await?;
    Ok(())
}

/// Adds a document with a store-allocated id and returns the id.
pub async fn add_document<T>(collection: &CollectionRef, data: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    let reference = collection.new_doc()?;
    let data = to_document_data(data, reference.path())?;
    reference.create(data).await?;

    tracing::debug!(
        target: TRACING_TARGET_DOCUMENT,
        path = %reference.path(),
        "Added document"
    );
    Ok(reference.id().to_owned())
}

/// Buffers the creation of a document with a store-allocated id in a
/// transaction and returns the id.
pub async fn add_document_tx<T>(
    tx: &Transaction,
    collection: &CollectionRef,
    data: &T,
) -> Result<String>
where
    T: Serialize + ?Sized,
{
    let id = tx.allocate_id();
    let reference: DocumentRef = collection.doc(&id)?;
    let data = to_document_data(data, reference.path())?;
    tx.create(reference.path(), data).await?;
    Ok(id)
}
