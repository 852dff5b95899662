//! Shape to draw-primitive mapping shared by every render target.

use kurbo::Rect;
use peniko::Color;
use sketchpad_core::shapes::{Shape, ShapeKind};

/// Fixed per-kind styling.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub rectangle_fill: Color,
    pub circle_fill: Color,
    pub stroke_color: Color,
    pub stroke_width: f64,
    pub text_color: Color,
    pub font_size: f64,
    /// Selection outline color (live target only).
    pub selection_color: Color,
    pub selection_width: f64,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            rectangle_fill: Color::from_rgba8(0, 0, 255, 255),
            circle_fill: Color::from_rgba8(255, 0, 0, 255),
            stroke_color: Color::from_rgba8(0, 0, 0, 255),
            stroke_width: 5.0,
            text_color: Color::from_rgba8(0, 0, 0, 255),
            font_size: 16.0,
            selection_color: Color::from_rgba8(59, 130, 246, 255),
            selection_width: 3.0,
        }
    }
}

impl RenderStyle {
    /// Selection outline around `frame`, clear of the shape's stroke.
    pub fn selection_outline(&self, frame: Rect) -> Rect {
        let pad = self.stroke_width / 2.0;
        frame.inflate(pad, pad)
    }
}

/// How text is placed inside its frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    /// Horizontally centered lines, block vertically centered.
    Center,
    /// Lines flow from the top-left corner.
    TopLeft,
}

/// A target-independent drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawPrimitive {
    /// Filled and stroked rectangle.
    Rect {
        frame: Rect,
        fill: Color,
        stroke: Color,
        stroke_width: f64,
    },
    /// Filled and stroked ellipse inscribed in `frame`.
    Ellipse {
        frame: Rect,
        fill: Color,
        stroke: Color,
        stroke_width: f64,
    },
    /// Text laid out inside `frame`.
    Text {
        frame: Rect,
        content: String,
        color: Color,
        font_size: f64,
        align: TextAlign,
    },
}

impl DrawPrimitive {
    /// Map one shape to its primitive; `align` is the target's text placement.
    pub fn for_shape(shape: &Shape, style: &RenderStyle, align: TextAlign) -> Self {
        let frame = shape.frame();
        match shape.kind() {
            ShapeKind::Rectangle => DrawPrimitive::Rect {
                frame,
                fill: style.rectangle_fill,
                stroke: style.stroke_color,
                stroke_width: style.stroke_width,
            },
            ShapeKind::Circle => DrawPrimitive::Ellipse {
                frame,
                fill: style.circle_fill,
                stroke: style.stroke_color,
                stroke_width: style.stroke_width,
            },
            ShapeKind::Text => DrawPrimitive::Text {
                frame,
                content: shape.text_content().unwrap_or_default().to_string(),
                color: style.text_color,
                font_size: style.font_size,
                align,
            },
        }
    }

    pub fn frame(&self) -> Rect {
        match self {
            DrawPrimitive::Rect { frame, .. }
            | DrawPrimitive::Ellipse { frame, .. }
            | DrawPrimitive::Text { frame, .. } => *frame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_styles() {
        let style = RenderStyle::default();
        let align = TextAlign::Center;
        let rect = DrawPrimitive::for_shape(&Shape::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0)), &style, align);
        let circle = DrawPrimitive::for_shape(&Shape::circle(Rect::new(0.0, 0.0, 10.0, 10.0)), &style, align);
        let text = DrawPrimitive::for_shape(&Shape::text(Rect::new(0.0, 0.0, 10.0, 10.0), "hi"), &style, align);

        assert!(matches!(rect, DrawPrimitive::Rect { fill, stroke_width, .. }
            if fill == Color::from_rgba8(0, 0, 255, 255) && (stroke_width - 5.0).abs() < f64::EPSILON));
        assert!(matches!(circle, DrawPrimitive::Ellipse { fill, .. } if fill == Color::from_rgba8(255, 0, 0, 255)));
        assert!(matches!(text, DrawPrimitive::Text { ref content, font_size, align: TextAlign::Center, .. }
            if content == "hi" && (font_size - 16.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_selection_outline_clears_stroke() {
        let style = RenderStyle::default();
        let outline = style.selection_outline(Rect::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(outline, Rect::new(7.5, 7.5, 22.5, 22.5));
    }
}
