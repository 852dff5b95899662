//! Persisted shape records.

use crate::shapes::{Shape, ShapeId, ShapeKind, check_parts};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a document (canvas) that owns shape records.
pub type DocumentId = String;

/// Flat, storage-friendly form of a [`Shape`].
///
/// Mirrors the `Shape(id, kind, x, y, width, height, text, documentId)`
/// table of the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeRecord {
    pub id: String,
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub text: Option<String>,
    pub document_id: DocumentId,
}

/// Errors for records that cannot become shapes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("Invalid shape kind {kind:?} in record {id}")]
    InvalidShapeKind { id: String, kind: String },
    #[error("Malformed shape record {id}: {reason}")]
    MalformedShapeRecord { id: String, reason: String },
}

impl RecordError {
    /// Id of the offending record, as stored.
    pub fn record_id(&self) -> &str {
        match self {
            RecordError::InvalidShapeKind { id, .. } => id,
            RecordError::MalformedShapeRecord { id, .. } => id,
        }
    }

    fn malformed(record: &ShapeRecord, reason: impl Into<String>) -> Self {
        RecordError::MalformedShapeRecord {
            id: record.id.clone(),
            reason: reason.into(),
        }
    }
}

impl ShapeRecord {
    /// Build the record for `shape` owned by `document_id`.
    pub fn from_shape(shape: &Shape, document_id: &str) -> Self {
        let frame = shape.frame();
        Self {
            id: shape.id().to_string(),
            kind: shape.kind().as_str().to_string(),
            x: frame.x0,
            y: frame.y0,
            width: frame.width(),
            height: frame.height(),
            text: shape.text_content().map(str::to_string),
            document_id: document_id.to_string(),
        }
    }

    /// Validate the record and convert it back into a shape.
    pub fn to_shape(&self) -> Result<Shape, RecordError> {
        let kind: ShapeKind = self.kind.parse().map_err(|_| RecordError::InvalidShapeKind {
            id: self.id.clone(),
            kind: self.kind.clone(),
        })?;

        let id: ShapeId = self
            .id
            .parse()
            .map_err(|e| RecordError::malformed(self, format!("invalid id: {}", e)))?;

        let frame = Rect::new(self.x, self.y, self.x + self.width, self.y + self.height);
        check_parts(kind, self.text.as_deref(), frame)
            .map_err(|reason| RecordError::malformed(self, reason))?;
        if self.width < 0.0 || self.height < 0.0 {
            return Err(RecordError::malformed(self, "negative frame size"));
        }

        Ok(Shape::reconstruct(id, kind, frame, self.text.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: &str, text: Option<&str>) -> ShapeRecord {
        ShapeRecord {
            id: uuid::Uuid::new_v4().to_string(),
            kind: kind.to_string(),
            x: 10.0,
            y: 20.0,
            width: 30.0,
            height: 40.0,
            text: text.map(str::to_string),
            document_id: "doc".to_string(),
        }
    }

    #[test]
    fn test_shape_to_record_and_back() {
        let shape = Shape::text(Rect::new(1.5, 2.5, 101.5, 22.5), "label");
        let record = ShapeRecord::from_shape(&shape, "doc");
        assert_eq!(record.kind, "text");
        assert_eq!(record.document_id, "doc");

        let back = record.to_shape().unwrap();
        assert!(back.approx_eq(&shape, 1e-9));
    }

    #[test]
    fn test_unknown_kind() {
        let err = record("triangle", None).to_shape().unwrap_err();
        assert!(matches!(err, RecordError::InvalidShapeKind { ref kind, .. } if kind == "triangle"));
    }

    #[test]
    fn test_text_without_content_is_malformed() {
        let err = record("text", None).to_shape().unwrap_err();
        assert!(matches!(err, RecordError::MalformedShapeRecord { .. }));
    }

    #[test]
    fn test_rectangle_with_text_is_malformed() {
        let err = record("rectangle", Some("oops")).to_shape().unwrap_err();
        assert!(matches!(err, RecordError::MalformedShapeRecord { .. }));
    }

    #[test]
    fn test_bad_id_is_malformed() {
        let mut rec = record("circle", None);
        rec.id = "not-a-uuid".to_string();
        let err = rec.to_shape().unwrap_err();
        assert_eq!(err.record_id(), "not-a-uuid");
        assert!(matches!(err, RecordError::MalformedShapeRecord { .. }));
    }

    #[test]
    fn test_negative_size_is_malformed() {
        let mut rec = record("rectangle", None);
        rec.width = -1.0;
        assert!(rec.to_shape().is_err());

        let mut rec = record("rectangle", None);
        rec.height = f64::NAN;
        assert!(rec.to_shape().is_err());
    }

    #[test]
    fn test_json_field_names() {
        let rec = record("circle", None);
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("documentId").is_some());
        assert!(json.get("text").unwrap().is_null());
    }
}
