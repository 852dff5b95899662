//! Storage abstraction for persistence.
//!
//! Shapes are persisted as flat [`ShapeRecord`]s grouped by document. A
//! [`RecordStore`] stages record changes and makes them durable on
//! [`RecordStore::commit`]; a [`DocumentCatalog`] manages the documents
//! themselves.

mod bridge;
mod file;
mod memory;
mod record;

pub use bridge::PersistenceBridge;
pub use file::FileRecordStore;
pub use memory::MemoryRecordStore;
pub use record::{DocumentId, RecordError, ShapeRecord};

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Commit failed: {0}")]
    CommitFailed(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Summary of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub id: DocumentId,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: u64,
}

/// Backend holding shape records, grouped by document.
pub trait RecordStore {
    /// Records of `document` in creation order, including staged changes.
    fn fetch(&self, document: &str) -> StorageResult<Vec<ShapeRecord>>;

    /// Insert or replace the record with the same id.
    ///
    /// A replaced record keeps its position.
    fn upsert(&mut self, record: ShapeRecord) -> StorageResult<()>;

    /// Remove every record of `document`.
    fn delete_all(&mut self, document: &str) -> StorageResult<()>;

    /// Make staged changes durable.
    fn commit(&mut self) -> StorageResult<()>;
}

/// The user's list of documents.
pub trait DocumentCatalog {
    /// All documents, newest first.
    fn list_documents(&self) -> StorageResult<Vec<DocumentInfo>>;

    /// Create an empty document and return its id.
    fn create_document(&mut self) -> StorageResult<DocumentId>;

    /// Delete a document together with all of its shape records.
    fn delete_document(&mut self, id: &str) -> StorageResult<()>;
}

/// Current time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Newest first; ties broken by id so the order is stable.
pub(crate) fn sort_newest_first(documents: &mut [DocumentInfo]) {
    documents.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}
