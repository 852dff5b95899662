//! Sketchpad Render Library
//!
//! Maps canvas shapes to draw primitives and draws them on two targets:
//! the live Vello scene and a single-page PDF export.

pub mod export;
mod pdf;
mod primitives;
mod renderer;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use export::{
    ArtifactLocation, ArtifactSink, ExportError, ExportResult, FileArtifactSink, MemoryArtifactSink, export_to,
    spawn_export,
};
pub use pdf::PdfExporter;
pub use primitives::{DrawPrimitive, RenderStyle, TextAlign};
pub use renderer::{RenderContext, Renderer, ShapeRenderer, render};

#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloRenderer;
