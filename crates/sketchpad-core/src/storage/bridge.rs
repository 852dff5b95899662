//! Write-through link between one document's shapes and a record store.

use super::{DocumentId, RecordStore, ShapeRecord, StorageResult};
use crate::shapes::Shape;

/// Persists the shapes of a single document.
///
/// Writes are staged in the underlying store until [`PersistenceBridge::commit`].
#[derive(Debug)]
pub struct PersistenceBridge<S: RecordStore> {
    store: S,
    document_id: DocumentId,
}

impl<S: RecordStore> PersistenceBridge<S> {
    pub fn new(store: S, document_id: impl Into<DocumentId>) -> Self {
        Self {
            store,
            document_id: document_id.into(),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Insert or update the record for `shape`.
    pub fn save(&mut self, shape: &Shape) -> StorageResult<()> {
        self.store
            .upsert(ShapeRecord::from_shape(shape, &self.document_id))
    }

    /// Replace every record of the document with records for `shapes`.
    pub fn save_all<'a, I>(&mut self, shapes: I) -> StorageResult<()>
    where
        I: IntoIterator<Item = &'a Shape>,
    {
        self.store.delete_all(&self.document_id)?;
        let mut count = 0;
        for shape in shapes {
            self.save(shape)?;
            count += 1;
        }
        log::debug!("Staged {} records for document {}", count, self.document_id);
        Ok(())
    }

    /// Records of the document in creation order.
    pub fn load(&self) -> StorageResult<Vec<ShapeRecord>> {
        self.store.fetch(&self.document_id)
    }

    /// Flush staged writes.
    pub fn commit(&mut self) -> StorageResult<()> {
        self.store.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryRecordStore;
    use crate::store::ShapeStore;
    use kurbo::Rect;

    #[test]
    fn test_save_is_keyed_by_id() {
        let mut bridge = PersistenceBridge::new(MemoryRecordStore::new(), "doc");
        let mut shape = Shape::rectangle(Rect::new(0.0, 0.0, 100.0, 100.0));
        bridge.save(&shape).unwrap();
        shape.set_frame(Rect::new(10.0, 10.0, 110.0, 110.0));
        bridge.save(&shape).unwrap();

        let records = bridge.load().unwrap();
        assert_eq!(records.len(), 1);
        assert!((records[0].x - 10.0).abs() < f64::EPSILON);
        assert_eq!(records[0].document_id, "doc");
    }

    #[test]
    fn test_save_all_round_trip() {
        let shapes = vec![
            Shape::rectangle(Rect::new(0.0, 0.0, 100.0, 100.0)),
            Shape::circle(Rect::new(12.25, 40.5, 72.25, 100.5)),
            Shape::text(Rect::new(5.0, 5.0, 205.0, 35.0), "Hello"),
        ];
        let mut bridge = PersistenceBridge::new(MemoryRecordStore::new(), "doc");
        bridge.save_all(&shapes).unwrap();
        bridge.commit().unwrap();

        let mut store = ShapeStore::new();
        let report = store.load(&bridge.load().unwrap());
        assert!(report.is_clean());
        let loaded = store.snapshot();
        assert_eq!(loaded.len(), shapes.len());
        for (a, b) in loaded.iter().zip(&shapes) {
            assert!(a.approx_eq(b, 1e-9));
        }
    }

    #[test]
    fn test_save_all_drops_deleted() {
        let a = Shape::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = Shape::rectangle(Rect::new(20.0, 0.0, 30.0, 10.0));
        let mut bridge = PersistenceBridge::new(MemoryRecordStore::new(), "doc");
        bridge.save_all([&a, &b]).unwrap();
        bridge.save_all([&b]).unwrap();

        let ids: Vec<_> = bridge.load().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![b.id().to_string()]);
    }

    #[test]
    fn test_documents_are_isolated() {
        let mut store = MemoryRecordStore::new();
        store
            .upsert(ShapeRecord::from_shape(&Shape::rectangle(Rect::ZERO), "other"))
            .unwrap();
        let mut bridge = PersistenceBridge::new(store, "doc");
        bridge.save_all(std::iter::empty()).unwrap();
        assert!(bridge.load().unwrap().is_empty());
        assert_eq!(bridge.store().fetch("other").unwrap().len(), 1);
    }
}
