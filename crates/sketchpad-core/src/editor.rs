//! Editing session state and document write-through.

use crate::camera::Camera;
use crate::config::EditorConfig;
use crate::events::CanvasEvent;
use crate::gesture::{GestureAction, GestureEvent, TapArbiter};
use crate::selection::Selection;
use crate::shapes::{Shape, ShapeId, centered_square};
use crate::storage::{PersistenceBridge, RecordStore, ShapeRecord, StorageError, StorageResult};
use crate::store::{LoadReport, ShapeStore, StoreResult};
use kurbo::{Point, Rect, Size};
use std::time::Instant;

/// Runtime editor state for one open document (not persisted).
#[derive(Debug, Clone)]
pub struct CanvasEditor {
    store: ShapeStore,
    selection: Selection,
    arbiter: TapArbiter,
    config: EditorConfig,
    /// Camera for view transform.
    pub camera: Camera,
    /// Viewport size.
    pub viewport_size: Size,
    events: Vec<CanvasEvent>,
}

impl Default for CanvasEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl CanvasEditor {
    /// Create an editor over an empty store.
    pub fn new(config: EditorConfig) -> Self {
        Self {
            store: ShapeStore::new(),
            selection: Selection::new(),
            arbiter: config.tap_arbiter(),
            camera: config.camera(),
            viewport_size: Size::new(800.0, 600.0),
            config,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &ShapeStore {
        &self.store
    }

    /// Currently selected shape, if any.
    pub fn selected(&self) -> Option<ShapeId> {
        self.selection.selected()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Whether a tap is waiting to be classified.
    pub fn has_pending_tap(&self) -> bool {
        self.arbiter.is_pending()
    }

    /// Replace the document contents with persisted records.
    ///
    /// Bad records are skipped; see [`ShapeStore::load`].
    pub fn load(&mut self, records: &[ShapeRecord]) -> LoadReport {
        let report = self.store.load(records);
        self.selection.retain_existing(&self.store);
        self.arbiter.reset();
        self.events.clear();
        log::info!(
            "Loaded {} shapes ({} skipped)",
            report.loaded,
            report.skipped.len()
        );
        report
    }

    /// Dispatch a gesture that was already classified by its source.
    pub fn handle_gesture(&mut self, event: GestureEvent) {
        self.apply(event.action());
    }

    /// Feed a raw tap through the double-tap arbiter.
    pub fn tap(&mut self, point: Point, at: Instant) {
        if let Some(action) = self.arbiter.tap(point, at) {
            self.apply(action);
        }
    }

    /// Resolve a pending tap whose double-tap window has closed.
    pub fn poll(&mut self, now: Instant) {
        if let Some(action) = self.arbiter.poll(now) {
            self.apply(action);
        }
    }

    /// Resolve a pending tap immediately, as a single tap.
    pub fn flush_taps(&mut self) {
        if let Some(action) = self.arbiter.flush() {
            self.apply(action);
        }
    }

    /// Perform a resolved gesture action.
    pub fn apply(&mut self, action: GestureAction) {
        match action {
            GestureAction::CreateShape(point) => match self.place_rectangle(point) {
                Ok(id) => log::debug!("Tap placed {}", id),
                Err(e) => log::debug!("Tap placed nothing: {}", e),
            },
            GestureAction::ToggleSelection(point) => {
                self.toggle_selection(point);
            }
        }
    }

    /// Add a default-size rectangle centered on `center`.
    pub fn place_rectangle(&mut self, center: Point) -> StoreResult<ShapeId> {
        let frame = centered_square(center, self.config.new_shape_size);
        self.add_shape(Shape::rectangle(frame))
    }

    /// Add a shape on top of the others.
    pub fn add_shape(&mut self, shape: Shape) -> StoreResult<ShapeId> {
        let id = shape.id();
        if let Err(e) = self.store.add(shape.clone()) {
            log::error!("Rejected shape: {}", e);
            return Err(e);
        }
        log::debug!("Added {} {}", shape.kind(), id);
        self.events.push(CanvasEvent::ShapeAdded { shape });
        Ok(id)
    }

    /// Move a shape to a new frame.
    pub fn move_shape(&mut self, id: ShapeId, frame: Rect) -> StoreResult<()> {
        let frame = self.store.update(id, frame)?.frame();
        log::debug!("Moved {} to {:?}", id, frame);
        self.events.push(CanvasEvent::ShapeMoved { id, frame });
        Ok(())
    }

    /// Remove a shape. Removing an unknown shape does nothing.
    ///
    /// Returns whether a shape was removed.
    pub fn remove_shape(&mut self, id: ShapeId) -> bool {
        match self.store.remove(id) {
            Ok(_) => {
                self.selection.shape_removed(id);
                log::debug!("Removed {}", id);
                self.events.push(CanvasEvent::ShapeDeleted { id });
                true
            }
            Err(e) => {
                log::debug!("Nothing to remove: {}", e);
                false
            }
        }
    }

    /// Remove the selected shape, if any.
    pub fn delete_selected(&mut self) -> Option<ShapeId> {
        let id = self.selection.selected()?;
        self.remove_shape(id).then_some(id)
    }

    /// Toggle selection of the topmost shape under `point`.
    pub fn toggle_selection(&mut self, point: Point) -> Option<ShapeId> {
        self.selection.toggle_at(point, self.store.shapes_ordered())
    }

    /// Select a shape by id. Unknown ids are ignored.
    pub fn select(&mut self, id: ShapeId) -> bool {
        self.selection.select(id, &self.store)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Drain queued change events, oldest first.
    pub fn take_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }

    /// Owned copy of the shapes in creation order.
    pub fn snapshot(&self) -> Vec<Shape> {
        self.store.snapshot()
    }
}

/// Outcome of persisting an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    /// Every change so far is durable.
    Saved,
    /// The edit is applied in memory but could not be made durable.
    NotSaved(StorageError),
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveStatus::Saved)
    }
}

/// An editor bound to a persisted document.
///
/// Every mutation is written through to the record store and committed.
/// A failed write leaves the in-memory edit in place. The next mutation
/// rewrites the whole document from memory before committing again.
#[derive(Debug)]
pub struct DocumentSession<S: RecordStore> {
    editor: CanvasEditor,
    bridge: PersistenceBridge<S>,
    events: Vec<CanvasEvent>,
    /// Staged changes not yet committed.
    uncommitted: bool,
    /// Staging failed; the record store may be missing edits.
    needs_resync: bool,
}

impl<S: RecordStore> DocumentSession<S> {
    /// Open `document_id` from `store`.
    pub fn open(
        store: S,
        document_id: impl Into<String>,
        config: EditorConfig,
    ) -> StorageResult<(Self, LoadReport)> {
        let bridge = PersistenceBridge::new(store, document_id);
        let records = bridge.load()?;
        let mut editor = CanvasEditor::new(config);
        let report = editor.load(&records);
        log::info!("Opened document {}", bridge.document_id());
        Ok((
            Self {
                editor,
                bridge,
                events: Vec::new(),
                uncommitted: false,
                needs_resync: false,
            },
            report,
        ))
    }

    pub fn document_id(&self) -> &str {
        self.bridge.document_id()
    }

    pub fn editor(&self) -> &CanvasEditor {
        &self.editor
    }

    pub fn bridge(&self) -> &PersistenceBridge<S> {
        &self.bridge
    }

    pub fn into_store(self) -> S {
        self.bridge.into_store()
    }

    pub fn handle_gesture(&mut self, event: GestureEvent) -> SaveStatus {
        self.editor.handle_gesture(event);
        self.write_through()
    }

    pub fn tap(&mut self, point: Point, at: Instant) -> SaveStatus {
        self.editor.tap(point, at);
        self.write_through()
    }

    pub fn poll(&mut self, now: Instant) -> SaveStatus {
        self.editor.poll(now);
        self.write_through()
    }

    pub fn flush_taps(&mut self) -> SaveStatus {
        self.editor.flush_taps();
        self.write_through()
    }

    pub fn add_shape(&mut self, shape: Shape) -> StoreResult<SaveStatus> {
        self.editor.add_shape(shape)?;
        Ok(self.write_through())
    }

    pub fn move_shape(&mut self, id: ShapeId, frame: Rect) -> StoreResult<SaveStatus> {
        self.editor.move_shape(id, frame)?;
        Ok(self.write_through())
    }

    pub fn remove_shape(&mut self, id: ShapeId) -> SaveStatus {
        self.editor.remove_shape(id);
        self.write_through()
    }

    pub fn delete_selected(&mut self) -> SaveStatus {
        self.editor.delete_selected();
        self.write_through()
    }

    pub fn toggle_selection(&mut self, point: Point) -> Option<ShapeId> {
        self.editor.toggle_selection(point)
    }

    pub fn select(&mut self, id: ShapeId) -> bool {
        self.editor.select(id)
    }

    /// Rewrite every record of the document from the current shapes.
    pub fn save(&mut self) -> SaveStatus {
        let result = self
            .bridge
            .save_all(self.editor.store.shapes_ordered())
            .and_then(|()| self.bridge.commit());
        self.finish(result)
    }

    /// Drain change events that have been written through, oldest first.
    pub fn take_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }

    fn write_through(&mut self) -> SaveStatus {
        let events = self.editor.take_events();
        if events.is_empty() && !self.uncommitted && !self.needs_resync {
            return SaveStatus::Saved;
        }
        let staged = if self.needs_resync {
            self.bridge.save_all(self.editor.store.shapes_ordered())
        } else {
            self.stage(&events)
        };
        if staged.is_err() {
            self.needs_resync = true;
        }
        let result = staged.and_then(|()| self.bridge.commit());
        self.events.extend(events);
        self.finish(result)
    }

    fn stage(&mut self, events: &[CanvasEvent]) -> StorageResult<()> {
        let mut deleted = false;
        for event in events {
            match event {
                CanvasEvent::ShapeAdded { shape } => self.bridge.save(shape)?,
                CanvasEvent::ShapeMoved { id, .. } => {
                    if let Some(shape) = self.editor.store.get(*id) {
                        self.bridge.save(shape)?;
                    }
                }
                CanvasEvent::ShapeDeleted { .. } => deleted = true,
            }
        }
        if deleted {
            self.bridge.save_all(self.editor.store.shapes_ordered())?;
        }
        Ok(())
    }

    fn finish(&mut self, result: StorageResult<()>) -> SaveStatus {
        match result {
            Ok(()) => {
                self.uncommitted = false;
                self.needs_resync = false;
                SaveStatus::Saved
            }
            Err(e) => {
                log::warn!("Changes to {} not saved: {}", self.bridge.document_id(), e);
                self.uncommitted = true;
                SaveStatus::NotSaved(e)
            }
        }
    }
}
