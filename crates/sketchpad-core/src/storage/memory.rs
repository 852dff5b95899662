//! In-memory storage implementation.

use super::{
    now_millis, sort_newest_first, DocumentCatalog, DocumentId, DocumentInfo, RecordStore,
    ShapeRecord, StorageError, StorageResult,
};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
struct StoredDocument {
    created_at: u64,
    records: Vec<ShapeRecord>,
}

impl StoredDocument {
    fn new() -> Self {
        Self {
            created_at: now_millis(),
            records: Vec::new(),
        }
    }
}

/// In-memory storage for testing and ephemeral use.
///
/// Changes are staged and copied to the committed state by `commit`, so
/// tests can observe exactly what a durable backend would hold. Deleted
/// documents reject further record writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    staged: HashMap<DocumentId, StoredDocument>,
    committed: HashMap<DocumentId, StoredDocument>,
    deleted: HashSet<DocumentId>,
    fail_commits: bool,
}

impl MemoryRecordStore {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `commit` fail (or succeed again).
    pub fn set_fail_commits(&mut self, fail: bool) {
        self.fail_commits = fail;
    }

    /// Records of `document` as of the last successful commit.
    pub fn committed_records(&self, document: &str) -> Vec<ShapeRecord> {
        self.committed
            .get(document)
            .map(|doc| doc.records.clone())
            .unwrap_or_default()
    }

    /// Whether staged state differs from the committed state.
    pub fn has_uncommitted_changes(&self) -> bool {
        if self.staged.len() != self.committed.len() {
            return true;
        }
        self.staged.iter().any(|(id, doc)| {
            self.committed
                .get(id)
                .map_or(true, |committed| committed.records != doc.records)
        })
    }
}

impl RecordStore for MemoryRecordStore {
    fn fetch(&self, document: &str) -> StorageResult<Vec<ShapeRecord>> {
        Ok(self
            .staged
            .get(document)
            .map(|doc| doc.records.clone())
            .unwrap_or_default())
    }

    fn upsert(&mut self, record: ShapeRecord) -> StorageResult<()> {
        if self.deleted.contains(&record.document_id) {
            return Err(StorageError::NotFound(record.document_id));
        }
        let doc = self
            .staged
            .entry(record.document_id.clone())
            .or_insert_with(StoredDocument::new);
        match doc.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => doc.records.push(record),
        }
        Ok(())
    }

    fn delete_all(&mut self, document: &str) -> StorageResult<()> {
        if self.deleted.contains(document) {
            return Err(StorageError::NotFound(document.to_string()));
        }
        if let Some(doc) = self.staged.get_mut(document) {
            doc.records.clear();
        }
        Ok(())
    }

    fn commit(&mut self) -> StorageResult<()> {
        if self.fail_commits {
            return Err(StorageError::CommitFailed("memory store set to fail".to_string()));
        }
        self.committed = self.staged.clone();
        Ok(())
    }
}

impl DocumentCatalog for MemoryRecordStore {
    fn list_documents(&self) -> StorageResult<Vec<DocumentInfo>> {
        let mut docs: Vec<DocumentInfo> = self
            .staged
            .iter()
            .map(|(id, doc)| DocumentInfo {
                id: id.clone(),
                created_at: doc.created_at,
            })
            .collect();
        sort_newest_first(&mut docs);
        Ok(docs)
    }

    fn create_document(&mut self) -> StorageResult<DocumentId> {
        let id = uuid::Uuid::new_v4().to_string();
        self.staged.insert(id.clone(), StoredDocument::new());
        self.commit()?;
        log::info!("Created document {}", id);
        Ok(id)
    }

    fn delete_document(&mut self, id: &str) -> StorageResult<()> {
        self.staged
            .remove(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        self.deleted.insert(id.to_string());
        self.commit()?;
        log::info!("Deleted document {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;
    use kurbo::Rect;

    fn record(doc: &str) -> ShapeRecord {
        ShapeRecord::from_shape(&Shape::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0)), doc)
    }

    #[test]
    fn test_upsert_and_fetch() {
        let mut storage = MemoryRecordStore::new();
        let a = record("doc");
        let b = record("doc");
        storage.upsert(a.clone()).unwrap();
        storage.upsert(b.clone()).unwrap();

        let fetched = storage.fetch("doc").unwrap();
        assert_eq!(fetched, vec![a, b]);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut storage = MemoryRecordStore::new();
        let a = record("doc");
        let b = record("doc");
        storage.upsert(a.clone()).unwrap();
        storage.upsert(b.clone()).unwrap();

        let moved = ShapeRecord { x: 99.0, ..a.clone() };
        storage.upsert(moved.clone()).unwrap();
        assert_eq!(storage.fetch("doc").unwrap(), vec![moved, b]);
    }

    #[test]
    fn test_unknown_document_is_empty() {
        let storage = MemoryRecordStore::new();
        assert!(storage.fetch("nonexistent").unwrap().is_empty());
    }

    #[test]
    fn test_commit_makes_durable() {
        let mut storage = MemoryRecordStore::new();
        storage.upsert(record("doc")).unwrap();
        assert!(storage.committed_records("doc").is_empty());
        assert!(storage.has_uncommitted_changes());

        storage.commit().unwrap();
        assert_eq!(storage.committed_records("doc").len(), 1);
        assert!(!storage.has_uncommitted_changes());
    }

    #[test]
    fn test_failed_commit_keeps_staged() {
        let mut storage = MemoryRecordStore::new();
        storage.set_fail_commits(true);
        storage.upsert(record("doc")).unwrap();

        assert!(matches!(storage.commit(), Err(StorageError::CommitFailed(_))));
        assert!(storage.committed_records("doc").is_empty());
        assert_eq!(storage.fetch("doc").unwrap().len(), 1);
    }

    #[test]
    fn test_delete_all_only_touches_document() {
        let mut storage = MemoryRecordStore::new();
        storage.upsert(record("a")).unwrap();
        storage.upsert(record("b")).unwrap();
        storage.delete_all("a").unwrap();
        assert!(storage.fetch("a").unwrap().is_empty());
        assert_eq!(storage.fetch("b").unwrap().len(), 1);
    }

    #[test]
    fn test_catalog_cascade_delete() {
        let mut storage = MemoryRecordStore::new();
        let id = storage.create_document().unwrap();
        storage.upsert(record(&id)).unwrap();
        storage.commit().unwrap();

        storage.delete_document(&id).unwrap();
        assert!(storage.fetch(&id).unwrap().is_empty());
        assert!(storage.committed_records(&id).is_empty());
        assert!(storage.list_documents().unwrap().is_empty());
        assert!(matches!(storage.delete_document(&id), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_deleted_document_rejects_writes() {
        let mut storage = MemoryRecordStore::new();
        let id = storage.create_document().unwrap();
        storage.delete_document(&id).unwrap();

        assert!(matches!(storage.upsert(record(&id)), Err(StorageError::NotFound(_))));
        assert!(matches!(storage.delete_all(&id), Err(StorageError::NotFound(_))));
        assert!(storage.list_documents().unwrap().is_empty());
        assert!(!storage.has_uncommitted_changes());
    }

    #[test]
    fn test_list_documents() {
        let mut storage = MemoryRecordStore::new();
        let first = storage.create_document().unwrap();
        let second = storage.create_document().unwrap();

        let list = storage.list_documents().unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().any(|d| d.id == first));
        assert!(list.iter().any(|d| d.id == second));
        assert!(list[0].created_at >= list[1].created_at);
    }
}
