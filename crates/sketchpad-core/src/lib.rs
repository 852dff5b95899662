//! Sketchpad Core Library
//!
//! Platform-agnostic data structures and logic for the sketchpad canvas:
//! shapes, their ordered store, selection, tap disambiguation and
//! document persistence.

pub mod camera;
pub mod config;
pub mod editor;
pub mod events;
pub mod gesture;
pub mod selection;
pub mod shapes;
pub mod storage;
pub mod store;

pub use camera::Camera;
pub use config::{ConfigError, EditorConfig, ExportConfig};
pub use editor::{CanvasEditor, DocumentSession, SaveStatus};
pub use events::CanvasEvent;
pub use gesture::{GestureAction, GestureEvent, TapArbiter};
pub use selection::{Selection, hit_test};
pub use shapes::{Shape, ShapeId, ShapeKind};
pub use storage::{
    DocumentCatalog, DocumentId, DocumentInfo, FileRecordStore, MemoryRecordStore,
    PersistenceBridge, RecordError, RecordStore, ShapeRecord, StorageError, StorageResult,
};
pub use store::{LoadReport, ShapeStore, StoreError, StoreResult};
