//! Shape definitions for the canvas.

mod frame;

pub use frame::{centered_square, frame_contains, normalize_frame};

use crate::storage::RecordError;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// The closed set of drawable shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Text,
}

impl ShapeKind {
    /// Name used in persisted records.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Text => "text",
        }
    }

    /// All kinds, in declaration order.
    pub fn all() -> &'static [ShapeKind] {
        &[ShapeKind::Rectangle, ShapeKind::Circle, ShapeKind::Text]
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a kind name is not one of the known kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownShapeKind(pub String);

impl FromStr for ShapeKind {
    type Err = UnknownShapeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rectangle" => Ok(ShapeKind::Rectangle),
            "circle" => Ok(ShapeKind::Circle),
            "text" => Ok(ShapeKind::Text),
            other => Err(UnknownShapeKind(other.to_string())),
        }
    }
}

/// A drawable shape: identity, kind, frame and (for text) its content.
///
/// Only the frame is mutable. The id, kind and text are fixed when the
/// shape is created, and the frame never has a negative width or height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ShapeData")]
pub struct Shape {
    id: ShapeId,
    kind: ShapeKind,
    frame: Rect,
    text: Option<String>,
}

impl Shape {
    /// Create a rectangle occupying `frame`.
    pub fn rectangle(frame: Rect) -> Self {
        Self::reconstruct(Uuid::new_v4(), ShapeKind::Rectangle, frame, None)
    }

    /// Create a circle inscribed in `frame`.
    pub fn circle(frame: Rect) -> Self {
        Self::reconstruct(Uuid::new_v4(), ShapeKind::Circle, frame, None)
    }

    /// Create a text label drawn inside `frame`.
    pub fn text(frame: Rect, content: impl Into<String>) -> Self {
        Self::reconstruct(
            Uuid::new_v4(),
            ShapeKind::Text,
            frame,
            Some(content.into()),
        )
    }

    /// Reconstruct a shape with a specific ID (for storage).
    ///
    /// Callers validate the parts with [`check_parts`] first.
    pub(crate) fn reconstruct(
        id: ShapeId,
        kind: ShapeKind,
        frame: Rect,
        text: Option<String>,
    ) -> Self {
        Self {
            id,
            kind,
            frame: normalize_frame(frame),
            text,
        }
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Frame in canvas-local coordinates.
    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// Text content (only for text shapes).
    pub fn text_content(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Replace the frame. Negative extents are normalized away.
    pub fn set_frame(&mut self, frame: Rect) {
        self.frame = normalize_frame(frame);
    }

    /// Translate the frame by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        self.frame = self.frame + delta;
    }

    /// Check if a point lies in the frame, boundary included.
    pub fn contains(&self, point: Point) -> bool {
        frame_contains(self.frame, point)
    }

    /// Check whether two shapes describe the same data within `tolerance`
    /// on every frame coordinate.
    pub fn approx_eq(&self, other: &Shape, tolerance: f64) -> bool {
        let a = self.frame;
        let b = other.frame;
        self.id == other.id
            && self.kind == other.kind
            && self.text == other.text
            && (a.x0 - b.x0).abs() <= tolerance
            && (a.y0 - b.y0).abs() <= tolerance
            && (a.x1 - b.x1).abs() <= tolerance
            && (a.y1 - b.y1).abs() <= tolerance
    }
}

/// Check that `kind`, `text` and `frame` can form a shape.
///
/// Text is present iff the kind is text, and every frame coordinate is
/// finite.
pub(crate) fn check_parts(kind: ShapeKind, text: Option<&str>, frame: Rect) -> Result<(), String> {
    match (kind, text) {
        (ShapeKind::Text, None) => return Err("text shape without text".to_string()),
        (ShapeKind::Rectangle | ShapeKind::Circle, Some(_)) => {
            return Err(format!("{} shape carries text", kind));
        }
        _ => {}
    }
    if [frame.x0, frame.y0, frame.x1, frame.y1]
        .iter()
        .any(|v| !v.is_finite())
    {
        return Err("non-finite frame".to_string());
    }
    Ok(())
}

/// Serialized form of a [`Shape`], validated on the way in.
#[derive(Deserialize)]
struct ShapeData {
    id: ShapeId,
    kind: ShapeKind,
    frame: Rect,
    #[serde(default)]
    text: Option<String>,
}

impl TryFrom<ShapeData> for Shape {
    type Error = RecordError;

    fn try_from(data: ShapeData) -> Result<Self, Self::Error> {
        check_parts(data.kind, data.text.as_deref(), data.frame).map_err(|reason| {
            RecordError::MalformedShapeRecord {
                id: data.id.to_string(),
                reason,
            }
        })?;
        Ok(Self::reconstruct(data.id, data.kind, data.frame, data.text))
    }
}
