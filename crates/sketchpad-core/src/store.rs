//! Ordered shape collection for one document.

use crate::shapes::{Shape, ShapeId};
use crate::storage::{RecordError, ShapeRecord};
use kurbo::Rect;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Shape store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Shape {0} already exists")]
    ShapeIdentityConflict(ShapeId),
    #[error("Shape not found: {0}")]
    ShapeNotFound(ShapeId),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of loading persisted records.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Number of shapes loaded into the store.
    pub loaded: usize,
    /// Records that were rejected, in input order.
    pub skipped: Vec<RecordError>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Shapes of one document, keyed by id and kept in creation order.
///
/// Creation order doubles as z-order: the last shape is drawn on top.
#[derive(Debug, Clone, Default)]
pub struct ShapeStore {
    shapes: HashMap<ShapeId, Shape>,
    order: Vec<ShapeId>,
}

impl ShapeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new shape on top of the others.
    pub fn add(&mut self, shape: Shape) -> StoreResult<()> {
        let id = shape.id();
        if self.shapes.contains_key(&id) {
            return Err(StoreError::ShapeIdentityConflict(id));
        }
        self.order.push(id);
        self.shapes.insert(id, shape);
        Ok(())
    }

    /// Replace the frame of an existing shape.
    pub fn update(&mut self, id: ShapeId, frame: Rect) -> StoreResult<&Shape> {
        let shape = self
            .shapes
            .get_mut(&id)
            .ok_or(StoreError::ShapeNotFound(id))?;
        shape.set_frame(frame);
        Ok(shape)
    }

    /// Remove a shape, returning it.
    pub fn remove(&mut self, id: ShapeId) -> StoreResult<Shape> {
        let shape = self
            .shapes
            .remove(&id)
            .ok_or(StoreError::ShapeNotFound(id))?;
        self.order.retain(|&shape_id| shape_id != id);
        Ok(shape)
    }

    /// Swap the whole collection.
    ///
    /// Either every shape is taken or the store is left untouched.
    pub fn replace_all(&mut self, shapes: Vec<Shape>) -> StoreResult<()> {
        let mut seen = HashSet::with_capacity(shapes.len());
        for shape in &shapes {
            if !seen.insert(shape.id()) {
                return Err(StoreError::ShapeIdentityConflict(shape.id()));
            }
        }
        self.order = shapes.iter().map(Shape::id).collect();
        self.shapes = shapes.into_iter().map(|s| (s.id(), s)).collect();
        Ok(())
    }

    /// Replace the contents with shapes rebuilt from persisted records.
    ///
    /// Corrupt records are skipped and reported; the remaining records
    /// still load, in their stored order.
    pub fn load(&mut self, records: &[ShapeRecord]) -> LoadReport {
        let mut report = LoadReport::default();
        let mut shapes: Vec<Shape> = Vec::with_capacity(records.len());
        let mut seen = HashSet::with_capacity(records.len());

        for record in records {
            let shape = match record.to_shape() {
                Ok(shape) => shape,
                Err(e) => {
                    log::warn!("Skipping shape record: {}", e);
                    report.skipped.push(e);
                    continue;
                }
            };
            if !seen.insert(shape.id()) {
                let e = RecordError::MalformedShapeRecord {
                    id: record.id.clone(),
                    reason: "duplicate id".to_string(),
                };
                log::warn!("Skipping shape record: {}", e);
                report.skipped.push(e);
                continue;
            }
            shapes.push(shape);
        }

        report.loaded = shapes.len();
        self.order = shapes.iter().map(Shape::id).collect();
        self.shapes = shapes.into_iter().map(|s| (s.id(), s)).collect();
        report
    }

    /// Get a shape by ID.
    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.shapes.contains_key(&id)
    }

    /// Get shapes in creation order (back to front).
    pub fn shapes_ordered(&self) -> impl DoubleEndedIterator<Item = &Shape> + '_ {
        self.order.iter().filter_map(|id| self.shapes.get(id))
    }

    /// Owned copy of the shapes in creation order.
    pub fn snapshot(&self) -> Vec<Shape> {
        self.shapes_ordered().cloned().collect()
    }

    /// Ids in creation order.
    pub fn ids(&self) -> &[ShapeId] {
        &self.order
    }

    /// Get the bounding box of all shapes.
    pub fn bounds(&self) -> Option<Rect> {
        self.shapes_ordered()
            .map(Shape::frame)
            .reduce(|acc, frame| acc.union(frame))
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn square(x: f64, y: f64) -> Shape {
        Shape::rectangle(Rect::new(x, y, x + 100.0, y + 100.0))
    }

    #[test]
    fn test_add_shape() {
        let mut store = ShapeStore::new();
        let shape = square(0.0, 0.0);
        let id = shape.id();

        store.add(shape).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(id).is_some());
    }

    #[test]
    fn test_add_duplicate_id_fails() {
        let mut store = ShapeStore::new();
        let shape = square(0.0, 0.0);
        let id = shape.id();

        store.add(shape.clone()).unwrap();
        assert_eq!(store.add(shape), Err(StoreError::ShapeIdentityConflict(id)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_frame() {
        let mut store = ShapeStore::new();
        let shape = square(0.0, 0.0);
        let id = shape.id();
        store.add(shape).unwrap();

        let updated = store.update(id, Rect::new(10.0, 10.0, 60.0, 60.0)).unwrap();
        assert!((updated.frame().x0 - 10.0).abs() < f64::EPSILON);
        assert!((store.get(id).unwrap().frame().width() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_update_missing_fails() {
        let mut store = ShapeStore::new();
        let id = uuid::Uuid::new_v4();
        assert!(matches!(
            store.update(id, Rect::ZERO),
            Err(StoreError::ShapeNotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn test_remove_shape() {
        let mut store = ShapeStore::new();
        let shape = square(0.0, 0.0);
        let id = shape.id();
        store.add(shape).unwrap();

        let removed = store.remove(id).unwrap();
        assert_eq!(removed.id(), id);
        assert!(store.is_empty());
        assert!(store.ids().is_empty());
        assert_eq!(store.remove(id), Err(StoreError::ShapeNotFound(id)));
    }

    #[test]
    fn test_creation_order_is_kept() {
        let mut store = ShapeStore::new();
        let a = square(0.0, 0.0);
        let b = square(50.0, 50.0);
        let c = square(100.0, 100.0);
        let ids = vec![a.id(), b.id(), c.id()];
        store.add(a).unwrap();
        store.add(b).unwrap();
        store.add(c).unwrap();

        store.update(ids[0], Rect::new(500.0, 500.0, 510.0, 510.0)).unwrap();
        let ordered: Vec<_> = store.shapes_ordered().map(Shape::id).collect();
        assert_eq!(ordered, ids);

        store.remove(ids[1]).unwrap();
        assert_eq!(store.ids(), &[ids[0], ids[2]]);
    }

    #[test]
    fn test_replace_all_rejects_duplicates() {
        let mut store = ShapeStore::new();
        let existing = square(0.0, 0.0);
        let existing_id = existing.id();
        store.add(existing).unwrap();

        let dup = square(10.0, 10.0);
        let result = store.replace_all(vec![dup.clone(), dup]);
        assert!(matches!(result, Err(StoreError::ShapeIdentityConflict(_))));
        assert_eq!(store.ids(), &[existing_id]);
    }

    #[test]
    fn test_replace_all() {
        let mut store = ShapeStore::new();
        store.add(square(0.0, 0.0)).unwrap();

        let a = square(1.0, 1.0);
        let b = Shape::circle(Rect::new(0.0, 0.0, 20.0, 20.0));
        let ids = vec![a.id(), b.id()];
        store.replace_all(vec![a, b]).unwrap();
        assert_eq!(store.ids(), ids.as_slice());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_load_skips_bad_records() {
        let good = square(0.0, 0.0);
        let mut records = vec![ShapeRecord::from_shape(&good, "doc")];
        records.push(ShapeRecord {
            id: uuid::Uuid::new_v4().to_string(),
            kind: "text".to_string(),
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            text: None,
            document_id: "doc".to_string(),
        });
        records.push(ShapeRecord {
            kind: "hexagon".to_string(),
            ..ShapeRecord::from_shape(&square(5.0, 5.0), "doc")
        });
        let sibling = Shape::text(Rect::new(0.0, 0.0, 80.0, 20.0), "ok");
        records.push(ShapeRecord::from_shape(&sibling, "doc"));

        let mut store = ShapeStore::new();
        let report = store.load(&records);

        assert_eq!(report.loaded, 2);
        assert_eq!(report.skipped.len(), 2);
        assert!(matches!(report.skipped[0], RecordError::MalformedShapeRecord { .. }));
        assert!(matches!(report.skipped[1], RecordError::InvalidShapeKind { .. }));
        assert_eq!(store.ids(), &[good.id(), sibling.id()]);
    }

    #[test]
    fn test_load_skips_duplicate_ids() {
        let shape = square(0.0, 0.0);
        let record = ShapeRecord::from_shape(&shape, "doc");
        let mut store = ShapeStore::new();
        let report = store.load(&[record.clone(), record]);
        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_ids_stay_unique_under_mixed_operations() {
        let mut store = ShapeStore::new();
        let mut kept = Vec::new();
        for i in 0..20 {
            let shape = square(i as f64, i as f64);
            let id = shape.id();
            store.add(shape.clone()).unwrap();
            assert!(store.add(shape).is_err());
            if i % 3 == 0 {
                store.remove(id).unwrap();
            } else {
                store.update(id, Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();
                kept.push(id);
            }
        }
        let unique: HashSet<_> = store.ids().iter().copied().collect();
        assert_eq!(unique.len(), store.len());
        assert_eq!(store.ids(), kept.as_slice());
    }

    #[test]
    fn test_bounds() {
        let mut store = ShapeStore::new();
        assert!(store.bounds().is_none());
        store.add(square(0.0, 0.0)).unwrap();
        store.add(Shape::circle(Rect::from_center_size(Point::new(300.0, 300.0), (20.0, 20.0)))).unwrap();
        let bounds = store.bounds().unwrap();
        assert!((bounds.x1 - 310.0).abs() < f64::EPSILON);
        assert!((bounds.y0).abs() < f64::EPSILON);
    }
}
