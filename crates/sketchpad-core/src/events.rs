//! Shape change notifications.

use crate::shapes::{Shape, ShapeId};
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// A change to a document's shapes, queued by the editor.
///
/// Consumers (redraw, persistence) drain the queue with
/// `CanvasEditor::take_events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanvasEvent {
    ShapeAdded { shape: Shape },
    ShapeMoved { id: ShapeId, frame: Rect },
    ShapeDeleted { id: ShapeId },
}

impl CanvasEvent {
    /// Id of the shape the event is about.
    pub fn shape_id(&self) -> ShapeId {
        match self {
            CanvasEvent::ShapeAdded { shape } => shape.id(),
            CanvasEvent::ShapeMoved { id, .. } | CanvasEvent::ShapeDeleted { id } => *id,
        }
    }
}
