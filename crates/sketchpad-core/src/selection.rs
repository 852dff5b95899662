//! Hit-testing and single-shape selection.

use crate::shapes::{Shape, ShapeId};
use crate::store::ShapeStore;
use kurbo::Point;

/// Find the topmost shape whose frame contains `point`.
///
/// `shapes` must be in creation order; the walk runs back to front so the
/// most recently added shape wins on overlap.
pub fn hit_test<'a, I>(point: Point, shapes: I) -> Option<&'a Shape>
where
    I: IntoIterator<Item = &'a Shape>,
    I::IntoIter: DoubleEndedIterator,
{
    shapes.into_iter().rev().find(|shape| shape.contains(point))
}

/// Single-selection state for one editor session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<ShapeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected shape, if any.
    pub fn selected(&self) -> Option<ShapeId> {
        self.selected
    }

    pub fn is_selected(&self, id: ShapeId) -> bool {
        self.selected == Some(id)
    }

    /// Toggle selection at `point`.
    ///
    /// A miss clears the selection, hitting the selected shape deselects it,
    /// and hitting any other shape selects that shape.
    pub fn toggle_at<'a, I>(&mut self, point: Point, shapes: I) -> Option<ShapeId>
    where
        I: IntoIterator<Item = &'a Shape>,
        I::IntoIter: DoubleEndedIterator,
    {
        self.selected = match hit_test(point, shapes) {
            None => None,
            Some(hit) if self.selected == Some(hit.id()) => None,
            Some(hit) => Some(hit.id()),
        };
        log::debug!("Selection is now {:?}", self.selected);
        self.selected
    }

    /// Select a shape that exists in `store`.
    ///
    /// Returns false (and leaves the selection alone) for unknown ids.
    pub fn select(&mut self, id: ShapeId, store: &ShapeStore) -> bool {
        if !store.contains(id) {
            return false;
        }
        self.selected = Some(id);
        true
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Forget the selection if it refers to the removed shape.
    pub fn shape_removed(&mut self, id: ShapeId) {
        if self.selected == Some(id) {
            self.selected = None;
        }
    }

    /// Drop a selection that no longer exists in `store`.
    pub fn retain_existing(&mut self, store: &ShapeStore) {
        if let Some(id) = self.selected {
            if !store.contains(id) {
                self.selected = None;
            }
        }
    }
}
