//! Frame helpers shared by the store, hit-testing and renderers.

use kurbo::{Point, Rect};

/// Normalize a frame so that width and height are non-negative.
pub fn normalize_frame(frame: Rect) -> Rect {
    frame.abs()
}

/// Inclusive point-in-frame test.
///
/// `kurbo::Rect::contains` excludes the far edges; taps landing exactly on a
/// shape's border must still hit it.
pub fn frame_contains(frame: Rect, point: Point) -> bool {
    let frame = frame.abs();
    point.x >= frame.x0 && point.x <= frame.x1 && point.y >= frame.y0 && point.y <= frame.y1
}

/// A `size` x `size` square centered on `center`.
pub fn centered_square(center: Point, size: f64) -> Rect {
    Rect::from_center_size(center, (size, size))
}
