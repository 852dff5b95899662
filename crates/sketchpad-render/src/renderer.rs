//! Renderer trait abstraction.

use crate::primitives::{DrawPrimitive, RenderStyle, TextAlign};
use kurbo::{Affine, Rect, Size};
use peniko::Color;
use sketchpad_core::editor::CanvasEditor;
use sketchpad_core::shapes::{Shape, ShapeId};

/// Context for a single live render frame.
pub struct RenderContext<'a> {
    /// Shapes to draw, back to front.
    pub shapes: Vec<&'a Shape>,
    /// Shape to highlight.
    pub selected: Option<ShapeId>,
    /// Canvas-to-screen transform.
    pub transform: Affine,
    /// Size of the scrollable canvas surface, in canvas units.
    pub canvas_size: Size,
    /// Viewport size in physical pixels.
    pub viewport_size: Size,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    /// Background color.
    pub background_color: Color,
    pub style: RenderStyle,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new<I>(shapes: I, viewport_size: Size) -> Self
    where
        I: IntoIterator<Item = &'a Shape>,
    {
        Self {
            shapes: shapes.into_iter().collect(),
            selected: None,
            transform: Affine::IDENTITY,
            canvas_size: viewport_size,
            viewport_size,
            scale_factor: 1.0,
            background_color: Color::from_rgba8(255, 255, 255, 255),
            style: RenderStyle::default(),
        }
    }

    /// Context showing an editor's shapes through its camera.
    pub fn for_editor(editor: &'a CanvasEditor) -> Self {
        Self::new(editor.store().shapes_ordered(), editor.viewport_size)
            .with_selection(editor.selected())
            .with_transform(editor.camera.transform())
            .with_canvas_size(editor.camera.content_size)
    }

    pub fn with_selection(mut self, selected: Option<ShapeId>) -> Self {
        self.selected = selected;
        self
    }

    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_canvas_size(mut self, size: Size) -> Self {
        self.canvas_size = size;
        self
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }
}

/// Trait for live rendering backends.
pub trait Renderer {
    /// Build the scene for a frame.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}

/// A surface that draws primitives: the live scene or an export page.
pub trait ShapeRenderer {
    /// How this target places text inside its frame.
    fn text_align(&self) -> TextAlign;

    /// Whether the selected shape is highlighted on this target.
    fn shows_selection(&self) -> bool;

    /// Draw one primitive on top of everything drawn so far.
    fn draw_primitive(&mut self, primitive: &DrawPrimitive);

    /// Draw the selection outline.
    fn draw_selection(&mut self, outline: Rect, color: Color, width: f64);
}

/// Draw `shapes` in creation order onto `target`.
///
/// The selection outline, when the target shows one, goes on top of every
/// shape.
pub fn render<'a, I, R>(shapes: I, selected: Option<ShapeId>, style: &RenderStyle, target: &mut R)
where
    I: IntoIterator<Item = &'a Shape>,
    R: ShapeRenderer + ?Sized,
{
    let align = target.text_align();
    let mut highlight = None;
    for shape in shapes {
        target.draw_primitive(&DrawPrimitive::for_shape(shape, style, align));
        if selected == Some(shape.id()) {
            highlight = Some(shape.frame());
        }
    }

    if !target.shows_selection() {
        return;
    }
    if let Some(frame) = highlight {
        target.draw_selection(
            style.selection_outline(frame),
            style.selection_color,
            style.selection_width,
        );
    }
}
