//! Single-page PDF export.

use crate::export::{ExportError, ExportResult};
use crate::primitives::{DrawPrimitive, RenderStyle, TextAlign};
use crate::renderer::{ShapeRenderer, render};
use kurbo::{BezPath, Ellipse, PathEl, Point, Rect, Shape as KurboShape};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};
use peniko::Color;
use sketchpad_core::config::ExportConfig;
use sketchpad_core::shapes::Shape;

/// Font resource name used for all text.
const FONT_NAME: &str = "F1";
/// Heading position and size, in page units from the top-left.
const HEADING_ORIGIN: (f64, f64) = (72.0, 72.0);
const HEADING_FONT_SIZE: f64 = 24.0;
/// Average Helvetica glyph advance, as a fraction of the font size.
const AVERAGE_ADVANCE: f64 = 0.5;
const LINE_SPACING: f64 = 1.2;

/// Renders a shape snapshot into a one-page PDF.
#[derive(Debug, Clone, Default)]
pub struct PdfExporter {
    config: ExportConfig,
    style: RenderStyle,
}

impl PdfExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            style: RenderStyle::default(),
        }
    }

    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Encode `shapes`, in creation order, as a PDF document.
    ///
    /// An empty snapshot still yields a valid single blank page. Content
    /// outside the page is clipped by it.
    pub fn export<'a, I>(&self, shapes: I) -> ExportResult<Vec<u8>>
    where
        I: IntoIterator<Item = &'a Shape>,
    {
        let mut page = PdfPage::new(self.config.page_height);
        if let Some(heading) = &self.config.heading {
            page.heading(heading);
        }
        render(shapes, None, &self.style, &mut page);
        let operations = page.finish();
        log::debug!("Encoding PDF page with {} operations", operations.len());

        let mut doc = Document::with_version("1.4");
        let id_pages = doc.new_object_id();

        let id_font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| ExportError::Render(e.to_string()))?;
        let id_content = doc.add_object(Stream::new(dictionary! {}, encoded));

        let id_resources = doc.add_object(dictionary! {
            "Font" => dictionary! {
                FONT_NAME => id_font,
            },
        });

        let id_page = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => id_pages,
            "Contents" => id_content,
            "Resources" => id_resources,
        });

        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![id_page.into()],
            "MediaBox" => vec![
                0.into(),
                0.into(),
                real(self.config.page_width),
                real(self.config.page_height),
            ],
        };
        doc.set_object(id_pages, pages);

        let id_catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => id_pages,
        });
        doc.trailer.set("Root", id_catalog);

        let mut info = dictionary! {
            "Creator" => Object::string_literal(self.config.creator.as_str()),
        };
        if let Some(title) = &self.config.title {
            info.set("Title", Object::string_literal(title.as_str()));
        }
        if let Some(author) = &self.config.author {
            info.set("Author", Object::string_literal(author.as_str()));
        }
        let id_info = doc.add_object(info);
        doc.trailer.set("Info", id_info);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| ExportError::Render(e.to_string()))?;
        log::info!("Exported PDF ({} bytes)", buffer.len());
        Ok(buffer)
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// PDF text strings for the standard fonts hold single-byte characters.
fn pdf_text(text: &str) -> Object {
    let bytes = text
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() {
                c as u8
            } else {
                b'?'
            }
        })
        .collect();
    Object::String(bytes, StringFormat::Literal)
}

/// Greedy word wrap by estimated advance width.
fn wrap_lines(text: &str, max_width: f64, font_size: f64) -> Vec<String> {
    let max_chars = ((max_width / (font_size * AVERAGE_ADVANCE)).floor() as usize).max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let needed = line.chars().count() + 1 + word.chars().count();
            if !line.is_empty() && needed > max_chars {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}

/// Content stream of the page being built.
///
/// Canvas coordinates have y pointing down; PDF user space has y up.
struct PdfPage {
    height: f64,
    operations: Vec<Operation>,
}

impl PdfPage {
    fn new(height: f64) -> Self {
        Self {
            height,
            operations: Vec::new(),
        }
    }

    fn finish(self) -> Vec<Operation> {
        self.operations
    }

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    fn point(&self, p: Point) -> Vec<Object> {
        vec![real(p.x), real(self.height - p.y)]
    }

    fn set_colors(&mut self, fill: Color, stroke: Color, width: f64) {
        let [r, g, b, _] = fill.components;
        self.op("rg", vec![r.into(), g.into(), b.into()]);
        let [r, g, b, _] = stroke.components;
        self.op("RG", vec![r.into(), g.into(), b.into()]);
        self.op("w", vec![real(width)]);
    }

    fn rect(&mut self, frame: Rect) {
        self.op(
            "re",
            vec![
                real(frame.x0),
                real(self.height - frame.y1),
                real(frame.width()),
                real(frame.height()),
            ],
        );
    }

    fn path(&mut self, path: &BezPath) {
        let mut last = Point::ZERO;
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => {
                    let operands = self.point(p);
                    self.op("m", operands);
                    last = p;
                }
                PathEl::LineTo(p) => {
                    let operands = self.point(p);
                    self.op("l", operands);
                    last = p;
                }
                PathEl::QuadTo(p1, p2) => {
                    let cubic = kurbo::QuadBez::new(last, p1, p2).raise();
                    let mut operands = self.point(cubic.p1);
                    operands.extend(self.point(cubic.p2));
                    operands.extend(self.point(cubic.p3));
                    self.op("c", operands);
                    last = p2;
                }
                PathEl::CurveTo(p1, p2, p3) => {
                    let mut operands = self.point(p1);
                    operands.extend(self.point(p2));
                    operands.extend(self.point(p3));
                    self.op("c", operands);
                    last = p3;
                }
                PathEl::ClosePath => self.op("h", vec![]),
            }
        }
    }

    fn text_line(&mut self, line: &str, origin: Point, font_size: f64) {
        self.op("Tf", vec![FONT_NAME.into(), real(font_size)]);
        let mut operands: Vec<Object> = vec![1.into(), 0.into(), 0.into(), 1.into()];
        operands.extend(self.point(origin));
        self.op("Tm", operands);
        self.op("Tj", vec![pdf_text(line)]);
    }

    fn heading(&mut self, heading: &str) {
        let (x, y) = HEADING_ORIGIN;
        self.op("BT", vec![]);
        self.op("rg", vec![0.into(), 0.into(), 0.into()]);
        self.text_line(heading, Point::new(x, y + HEADING_FONT_SIZE), HEADING_FONT_SIZE);
        self.op("ET", vec![]);
    }

    fn text(&mut self, frame: Rect, content: &str, color: Color, font_size: f64, align: TextAlign) {
        let line_height = font_size * LINE_SPACING;
        let lines = wrap_lines(content, frame.width(), font_size);
        // Lines past the bottom of the frame are dropped; the first always shows
        let fitting = ((frame.height() / line_height).floor() as usize).clamp(1, lines.len().max(1));
        let lines = &lines[..fitting.min(lines.len())];

        let block_height = lines.len() as f64 * line_height;
        let top = match align {
            TextAlign::Center => frame.y0 + (frame.height() - block_height).max(0.0) / 2.0,
            TextAlign::TopLeft => frame.y0,
        };

        let [r, g, b, _] = color.components;
        self.op("BT", vec![]);
        self.op("rg", vec![r.into(), g.into(), b.into()]);
        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let x = match align {
                TextAlign::Center => {
                    let width = line.chars().count() as f64 * font_size * AVERAGE_ADVANCE;
                    frame.x0 + (frame.width() - width).max(0.0) / 2.0
                }
                TextAlign::TopLeft => frame.x0,
            };
            let baseline = top + i as f64 * line_height + font_size;
            self.text_line(line, Point::new(x, baseline), font_size);
        }
        self.op("ET", vec![]);
    }
}

impl ShapeRenderer for PdfPage {
    fn text_align(&self) -> TextAlign {
        TextAlign::TopLeft
    }

    fn shows_selection(&self) -> bool {
        false
    }

    fn draw_primitive(&mut self, primitive: &DrawPrimitive) {
        match primitive {
            DrawPrimitive::Rect {
                frame,
                fill,
                stroke,
                stroke_width,
            } => {
                self.set_colors(*fill, *stroke, *stroke_width);
                self.rect(*frame);
                self.op("B", vec![]);
            }
            DrawPrimitive::Ellipse {
                frame,
                fill,
                stroke,
                stroke_width,
            } => {
                self.set_colors(*fill, *stroke, *stroke_width);
                self.path(&Ellipse::from_rect(*frame).to_path(0.1));
                self.op("B", vec![]);
            }
            DrawPrimitive::Text {
                frame,
                content,
                color,
                font_size,
                align,
            } => self.text(*frame, content, *color, *font_size, *align),
        }
    }

    fn draw_selection(&mut self, _outline: Rect, _color: Color, _width: f64) {
        // Selection is never part of an export
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_operators(bytes: &[u8]) -> Vec<Operation> {
        let doc = Document::load_mem(bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        Content::decode(&content).unwrap().operations
    }

    fn count(ops: &[Operation], operator: &str) -> usize {
        ops.iter().filter(|op| op.operator == operator).count()
    }

    #[test]
    fn test_empty_export_is_blank_page() {
        let bytes = PdfExporter::default().export(std::iter::empty()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        let ops = page_operators(&bytes);
        assert!(ops.is_empty());
    }

    #[test]
    fn test_page_size_is_letter() {
        let bytes = PdfExporter::default().export(std::iter::empty()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let media_box = doc
            .get_dictionary(page_id)
            .and_then(|page| page.get(b"Parent"))
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id))
            .and_then(|pages| pages.get(b"MediaBox"))
            .and_then(Object::as_array)
            .unwrap();
        let width = media_box[2].as_float().unwrap();
        let height = media_box[3].as_float().unwrap();
        assert!((width - 612.0).abs() < f32::EPSILON);
        assert!((height - 792.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_shapes_in_creation_order() {
        let shapes = vec![
            Shape::circle(Rect::new(0.0, 0.0, 100.0, 100.0)),
            Shape::rectangle(Rect::new(150.0, 150.0, 250.0, 250.0)),
        ];
        let bytes = PdfExporter::default().export(&shapes).unwrap();
        let ops = page_operators(&bytes);

        assert_eq!(count(&ops, "B"), 2);
        assert_eq!(count(&ops, "re"), 1);
        let first_curve = ops.iter().position(|op| op.operator == "c").unwrap();
        let rect = ops.iter().position(|op| op.operator == "re").unwrap();
        assert!(first_curve < rect);

        // Rectangle at y=150 with height 100 sits at 792 - 250 in PDF space
        let re = &ops[rect];
        assert!((re.operands[1].as_float().unwrap() - 542.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_text_flows_from_top_left() {
        let shapes = vec![Shape::text(Rect::new(100.0, 100.0, 300.0, 200.0), "Hello")];
        let bytes = PdfExporter::default().export(&shapes).unwrap();
        let ops = page_operators(&bytes);

        let tm = ops.iter().find(|op| op.operator == "Tm").unwrap();
        assert!((tm.operands[4].as_float().unwrap() - 100.0).abs() < f32::EPSILON);
        assert!((tm.operands[5].as_float().unwrap() - (792.0 - 116.0)).abs() < f32::EPSILON);
        let tj = ops.iter().find(|op| op.operator == "Tj").unwrap();
        assert_eq!(tj.operands[0].as_str().unwrap(), b"Hello");
    }

    #[test]
    fn test_heading_and_metadata() {
        let config = ExportConfig {
            heading: Some("Hello, PDF!".to_string()),
            title: Some("Board".to_string()),
            author: Some("Sketcher".to_string()),
            ..ExportConfig::default()
        };
        let bytes = PdfExporter::new(config).export(std::iter::empty()).unwrap();
        let ops = page_operators(&bytes);
        assert_eq!(count(&ops, "Tj"), 1);

        let doc = Document::load_mem(&bytes).unwrap();
        let info = doc
            .trailer
            .get(b"Info")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id))
            .unwrap();
        assert_eq!(info.get(b"Title").and_then(Object::as_str).unwrap(), b"Board");
        assert_eq!(info.get(b"Creator").and_then(Object::as_str).unwrap(), b"sketchpad");
    }

    #[test]
    fn test_wrap_lines() {
        let lines = wrap_lines("one two three four", 80.0, 16.0);
        assert_eq!(lines, vec!["one two", "three four"]);
        assert_eq!(wrap_lines("a\n\nb", 80.0, 16.0), vec!["a", "", "b"]);
        assert!(wrap_lines("", 80.0, 16.0).is_empty());
    }

    #[test]
    fn test_non_ascii_is_replaced() {
        assert_eq!(pdf_text("café").as_str().unwrap(), b"caf?");
    }
}
