//! View transform for the live canvas.
//!
//! The canvas is a fixed-size surface viewed through a scroll-view style
//! camera: it can be zoomed between configured limits and panned, but the
//! surface never scrolls past its own edges.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Default canvas surface size in canvas units.
pub const DEFAULT_CANVAS_SIZE: f64 = 3000.0;
/// Default zoom limits.
pub const DEFAULT_MIN_ZOOM: f64 = 0.5;
pub const DEFAULT_MAX_ZOOM: f64 = 3.0;

/// Maps canvas-local coordinates to screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Screen position of the canvas origin.
    pub offset: Vec2,
    /// Current zoom level (1.0 = 100%).
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Size of the scrollable canvas surface.
    pub content_size: Size,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            content_size: Size::new(DEFAULT_CANVAS_SIZE, DEFAULT_CANVAS_SIZE),
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera with custom zoom limits and canvas size.
    pub fn with_limits(min_zoom: f64, max_zoom: f64, content_size: Size) -> Self {
        let (min_zoom, max_zoom) = if min_zoom <= max_zoom {
            (min_zoom, max_zoom)
        } else {
            (max_zoom, min_zoom)
        };
        Self {
            zoom: 1.0_f64.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
            content_size,
            ..Self::default()
        }
    }

    /// Canvas-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Screen-to-canvas transform.
    pub fn inverse_transform(&self) -> Affine {
        self.transform().inverse()
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Pan by a screen-space delta, keeping the canvas inside `viewport`.
    pub fn pan(&mut self, delta: Vec2, viewport: Size) {
        self.offset += delta;
        self.clamp_offset(viewport);
    }

    /// Zoom by `factor`, keeping `screen_point` fixed over the same canvas point.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64, viewport: Size) {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }
        let anchor = self.screen_to_world(screen_point);
        self.zoom = new_zoom;
        self.offset = screen_point.to_vec2() - anchor.to_vec2() * self.zoom;
        self.clamp_offset(viewport);
    }

    /// Canvas-space rectangle currently visible in `viewport`.
    pub fn visible_rect(&self, viewport: Size) -> Rect {
        let top_left = self.screen_to_world(Point::ZERO);
        let bottom_right = self.screen_to_world(Point::new(viewport.width, viewport.height));
        Rect::from_points(top_left, bottom_right)
    }

    fn clamp_offset(&mut self, viewport: Size) {
        let scaled_w = self.content_size.width * self.zoom;
        let scaled_h = self.content_size.height * self.zoom;
        // A canvas smaller than the viewport stays pinned at the origin.
        let min_x = (viewport.width - scaled_w).min(0.0);
        let min_y = (viewport.height - scaled_h).min(0.0);
        self.offset.x = self.offset.x.clamp(min_x, 0.0);
        self.offset.y = self.offset.y.clamp(min_y, 0.0);
    }
}
