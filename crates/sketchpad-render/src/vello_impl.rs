//! Vello-based renderer implementation.

use crate::primitives::{DrawPrimitive, TextAlign};
use crate::renderer::{RenderContext, Renderer, ShapeRenderer, render};
use kurbo::{Affine, Ellipse, Point, Rect, Shape as KurboShape, Stroke};
use parley::layout::PositionedLayoutItem;
use parley::{FontContext, LayoutContext};
use peniko::{Brush, Color, Fill};
use vello::Scene;

/// Width of the border drawn around the canvas surface.
const CANVAS_BORDER_WIDTH: f64 = 2.0;

/// Vello-based renderer for the live canvas.
pub struct VelloRenderer {
    /// The Vello scene being built.
    scene: Scene,
    /// Font context for text rendering (cached to avoid reloading fonts).
    font_cx: FontContext,
    /// Layout context for text rendering.
    layout_cx: LayoutContext<Brush>,
    /// Canvas-to-surface transform of the frame being built.
    transform: Affine,
}

impl Default for VelloRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl VelloRenderer {
    /// Create a new Vello renderer.
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
            transform: Affine::IDENTITY,
        }
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    fn fill_and_stroke(&mut self, shape: &impl KurboShape, fill: Color, stroke: Color, width: f64) {
        self.scene.fill(Fill::NonZero, self.transform, fill, None, shape);
        self.scene
            .stroke(&Stroke::new(width), self.transform, stroke, None, shape);
    }

    /// Render text inside `frame` using Parley for layout.
    fn render_text(&mut self, frame: Rect, content: &str, color: Color, font_size: f64, align: TextAlign) {
        use parley::StyleProperty;

        if content.is_empty() {
            return;
        }

        let brush = Brush::Solid(color);
        let mut builder = self
            .layout_cx
            .ranged_builder(&mut self.font_cx, content, 1.0, false);
        builder.push_default(StyleProperty::FontSize(font_size as f32));
        builder.push_default(StyleProperty::Brush(brush.clone()));
        builder.push_default(StyleProperty::FontStack(parley::FontStack::Single(
            parley::FontFamily::Generic(parley::GenericFamily::SansSerif),
        )));
        let mut layout = builder.build(content);

        let max_width = frame.width() as f32;
        layout.break_all_lines(Some(max_width));
        let (alignment, top) = match align {
            // Block is centered vertically as well
            TextAlign::Center => (
                parley::Alignment::Center,
                frame.y0 + (frame.height() - layout.height() as f64) / 2.0,
            ),
            TextAlign::TopLeft => (parley::Alignment::Start, frame.y0),
        };
        layout.align(Some(max_width), alignment, parley::AlignmentOptions::default());

        let text_transform = self.transform * Affine::translate((frame.x0, top));

        let mut glyph_count = 0;
        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let run = glyph_run.run();
                let font = run.font();
                let font_size = run.font_size();
                let synthesis = run.synthesis();
                let glyph_xform = synthesis
                    .skew()
                    .map(|angle| Affine::skew(angle.to_radians().tan() as f64, 0.0));

                let glyphs: Vec<vello::Glyph> = glyph_run
                    .glyphs()
                    .map(|glyph| {
                        let gx = x + glyph.x;
                        let gy = y - glyph.y;
                        x += glyph.advance;
                        glyph_count += 1;
                        vello::Glyph {
                            id: glyph.id,
                            x: gx,
                            y: gy,
                        }
                    })
                    .collect();

                if !glyphs.is_empty() {
                    self.scene
                        .draw_glyphs(font)
                        .brush(&brush)
                        .hint(true)
                        .transform(text_transform)
                        .glyph_transform(glyph_xform)
                        .font_size(font_size)
                        .normalized_coords(run.normalized_coords())
                        .draw(Fill::NonZero, glyphs.into_iter());
                }
            }
        }

        // No font available: mark the text box instead
        if glyph_count == 0 {
            log::debug!("No glyphs for text {:?}, drawing placeholder", content);
            let height = (font_size * 1.2).min(frame.height());
            let placeholder = Rect::from_center_size(frame.center(), (frame.width(), height));
            self.scene.fill(
                Fill::NonZero,
                self.transform,
                Color::from_rgba8(255, 100, 100, 100),
                None,
                &placeholder,
            );
        }
    }
}

impl Renderer for VelloRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        // Clear the scene
        self.scene.reset();
        self.transform = Affine::scale(ctx.scale_factor) * ctx.transform;

        let surface = Rect::from_origin_size(Point::ORIGIN, ctx.canvas_size);
        self.scene.fill(
            Fill::NonZero,
            self.transform,
            ctx.background_color,
            None,
            &surface,
        );
        self.scene.stroke(
            &Stroke::new(CANVAS_BORDER_WIDTH),
            self.transform,
            Color::from_rgba8(0, 0, 0, 255),
            None,
            &surface,
        );

        render(ctx.shapes.iter().copied(), ctx.selected, &ctx.style, self);
    }
}

impl ShapeRenderer for VelloRenderer {
    fn text_align(&self) -> TextAlign {
        TextAlign::Center
    }

    fn shows_selection(&self) -> bool {
        true
    }

    fn draw_primitive(&mut self, primitive: &DrawPrimitive) {
        match primitive {
            DrawPrimitive::Rect {
                frame,
                fill,
                stroke,
                stroke_width,
            } => self.fill_and_stroke(frame, *fill, *stroke, *stroke_width),
            DrawPrimitive::Ellipse {
                frame,
                fill,
                stroke,
                stroke_width,
            } => self.fill_and_stroke(&Ellipse::from_rect(*frame), *fill, *stroke, *stroke_width),
            DrawPrimitive::Text {
                frame,
                content,
                color,
                font_size,
                align,
            } => self.render_text(*frame, content, *color, *font_size, *align),
        }
    }

    fn draw_selection(&mut self, outline: Rect, color: Color, width: f64) {
        self.scene
            .stroke(&Stroke::new(width), self.transform, color, None, &outline);
    }
}
