//! File-based storage implementation for native platforms.

use super::{
    now_millis, sort_newest_first, DocumentCatalog, DocumentId, DocumentInfo, RecordStore,
    ShapeRecord, StorageError, StorageResult,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk form of one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentFile {
    id: DocumentId,
    created_at: u64,
    #[serde(default)]
    shapes: Vec<ShapeRecord>,
}

impl DocumentFile {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            created_at: now_millis(),
            shapes: Vec::new(),
        }
    }
}

/// File-based storage for native platforms.
///
/// Stores each document as a JSON file in a specified directory. Record
/// changes are staged in memory and written by `commit`. Documents deleted
/// through this store reject further record writes.
#[derive(Debug)]
pub struct FileRecordStore {
    /// Base directory for document storage.
    base_path: PathBuf,
    /// Documents read or modified since the last commit.
    cache: HashMap<DocumentId, DocumentFile>,
    dirty: HashSet<DocumentId>,
    deleted: HashSet<DocumentId>,
}

impl FileRecordStore {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self {
            base_path,
            cache: HashMap::new(),
            dirty: HashSet::new(),
            deleted: HashSet::new(),
        })
    }

    /// Create file storage in the default location.
    ///
    /// On Linux: `~/.local/share/sketchpad/documents/`
    /// On Windows: `%LOCALAPPDATA%\sketchpad\documents\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("sketchpad").join("documents"))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the file path for a document ID.
    fn document_path(&self, id: &str) -> PathBuf {
        // Sanitize ID to be safe for filenames
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    fn read_file(path: &Path) -> StorageResult<DocumentFile> {
        let json = fs::read_to_string(path).map_err(|e| {
            StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&json).map_err(|e| {
            StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Document as currently staged, falling back to disk.
    fn read_document(&self, id: &str) -> StorageResult<Option<DocumentFile>> {
        if let Some(doc) = self.cache.get(id) {
            return Ok(Some(doc.clone()));
        }
        let path = self.document_path(id);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_file(&path).map(Some)
    }

    /// Cached, mutable copy of a document, created if unknown.
    fn staged_document(&mut self, id: &str) -> StorageResult<&mut DocumentFile> {
        if self.deleted.contains(id) {
            return Err(StorageError::NotFound(id.to_string()));
        }
        if !self.cache.contains_key(id) {
            let doc = self
                .read_document(id)?
                .unwrap_or_else(|| DocumentFile::new(id));
            self.cache.insert(id.to_string(), doc);
        }
        self.dirty.insert(id.to_string());
        self.cache
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    /// Write a temporary sibling, then rename it over the document file.
    fn write_document(&self, doc: &DocumentFile) -> StorageResult<()> {
        let path = self.document_path(&doc.id);
        let json = serde_json::to_string_pretty(doc)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        fs::write(&tmp_path, json).map_err(|e| {
            StorageError::CommitFailed(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StorageError::CommitFailed(format!("Failed to replace {}: {}", path.display(), e))
        })
    }
}

impl RecordStore for FileRecordStore {
    fn fetch(&self, document: &str) -> StorageResult<Vec<ShapeRecord>> {
        Ok(self
            .read_document(document)?
            .map(|doc| doc.shapes)
            .unwrap_or_default())
    }

    fn upsert(&mut self, record: ShapeRecord) -> StorageResult<()> {
        let doc = self.staged_document(&record.document_id)?;
        match doc.shapes.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => doc.shapes.push(record),
        }
        Ok(())
    }

    fn delete_all(&mut self, document: &str) -> StorageResult<()> {
        self.staged_document(document)?.shapes.clear();
        Ok(())
    }

    fn commit(&mut self) -> StorageResult<()> {
        let mut ids: Vec<DocumentId> = self.dirty.iter().cloned().collect();
        ids.sort();
        for id in ids {
            if let Some(doc) = self.cache.get(&id) {
                self.write_document(doc)?;
            }
            self.dirty.remove(&id);
        }
        log::debug!("Committed storage at {}", self.base_path.display());
        Ok(())
    }
}

impl DocumentCatalog for FileRecordStore {
    fn list_documents(&self) -> StorageResult<Vec<DocumentInfo>> {
        if !self.base_path.exists() {
            return Ok(vec![]);
        }

        let entries = fs::read_dir(&self.base_path)
            .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

        let mut docs = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            // Only include .json files
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match Self::read_file(&path) {
                    Ok(doc) => docs.push(DocumentInfo {
                        id: doc.id,
                        created_at: doc.created_at,
                    }),
                    Err(e) => log::warn!("Skipping unreadable document: {}", e),
                }
            }
        }
        sort_newest_first(&mut docs);
        Ok(docs)
    }

    fn create_document(&mut self) -> StorageResult<DocumentId> {
        let id = uuid::Uuid::new_v4().to_string();
        let doc = DocumentFile::new(&id);
        self.write_document(&doc)?;
        self.cache.insert(id.clone(), doc);
        log::info!("Created document {}", id);
        Ok(id)
    }

    fn delete_document(&mut self, id: &str) -> StorageResult<()> {
        let path = self.document_path(id);
        let was_staged = self.cache.remove(id).is_some();
        self.dirty.remove(id);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
            })?;
        } else if !was_staged {
            return Err(StorageError::NotFound(id.to_string()));
        }
        self.deleted.insert(id.to_string());
        log::info!("Deleted document {}", id);
        Ok(())
    }
}
