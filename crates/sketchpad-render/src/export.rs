//! Export artifacts and where they are written.

use crate::pdf::PdfExporter;
use sketchpad_core::shapes::Shape;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use thiserror::Error;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Render failed: {0}")]
    Render(String),
    #[error("Failed to write export: {0}")]
    WriteFailed(String),
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Where a written artifact ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    File(PathBuf),
    Memory { len: usize },
}

/// Destination for a finished export.
pub trait ArtifactSink {
    /// Write the complete artifact.
    ///
    /// Either the whole artifact is written or nothing is observable.
    fn write(&mut self, bytes: &[u8]) -> ExportResult<ArtifactLocation>;
}

/// Writes the artifact to a file path.
///
/// Bytes go to a temporary sibling first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileArtifactSink {
    path: PathBuf,
}

impl FileArtifactSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "export".to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }
}

impl ArtifactSink for FileArtifactSink {
    fn write(&mut self, bytes: &[u8]) -> ExportResult<ArtifactLocation> {
        let temp = self.temp_path();
        let result = fs::write(&temp, bytes).and_then(|()| fs::rename(&temp, &self.path));
        if let Err(e) = result {
            // Never leave a partial artifact behind
            let _ = fs::remove_file(&temp);
            return Err(ExportError::WriteFailed(format!(
                "{}: {}",
                self.path.display(),
                e
            )));
        }
        log::info!("Wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(ArtifactLocation::File(self.path.clone()))
    }
}

/// Keeps the artifact in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifactSink {
    bytes: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemoryArtifactSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last written artifact, if any.
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.bytes.lock().ok().and_then(|guard| guard.clone())
    }
}

impl ArtifactSink for MemoryArtifactSink {
    fn write(&mut self, bytes: &[u8]) -> ExportResult<ArtifactLocation> {
        let mut guard = self
            .bytes
            .lock()
            .map_err(|e| ExportError::WriteFailed(format!("Lock error: {}", e)))?;
        *guard = Some(bytes.to_vec());
        Ok(ArtifactLocation::Memory { len: bytes.len() })
    }
}

/// Render `shapes` and hand the artifact to `sink`.
pub fn export_to<'a, I, S>(exporter: &PdfExporter, shapes: I, sink: &mut S) -> ExportResult<ArtifactLocation>
where
    I: IntoIterator<Item = &'a Shape>,
    S: ArtifactSink + ?Sized,
{
    let bytes = exporter.export(shapes)?;
    sink.write(&bytes)
}

/// Export a snapshot on a background thread.
///
/// The location is only available once the artifact has been written.
pub fn spawn_export<S>(
    exporter: PdfExporter,
    snapshot: Vec<Shape>,
    mut sink: S,
) -> JoinHandle<ExportResult<ArtifactLocation>>
where
    S: ArtifactSink + Send + 'static,
{
    std::thread::spawn(move || {
        log::debug!("Exporting {} shapes in background", snapshot.len());
        export_to(&exporter, &snapshot, &mut sink)
    })
}
