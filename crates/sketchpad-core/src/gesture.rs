//! Tap disambiguation.
//!
//! Taps arrive as raw `(point, time)` pairs. A tap is held back until it is
//! known not to be the first half of a double tap, so a double tap never
//! also produces the single-tap action.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Default double-tap window.
pub const DEFAULT_DOUBLE_TAP_MS: u64 = 300;
/// Default maximum distance between the two taps of a double tap.
pub const DEFAULT_TAP_SLOP: f64 = 10.0;

/// Already-classified gesture delivered by a gesture source.
///
/// Points are in canvas-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GestureEvent {
    SingleTap { x: f64, y: f64 },
    DoubleTap { x: f64, y: f64 },
}

impl GestureEvent {
    pub fn point(&self) -> Point {
        match *self {
            GestureEvent::SingleTap { x, y } | GestureEvent::DoubleTap { x, y } => Point::new(x, y),
        }
    }

    /// The action this gesture maps to.
    pub fn action(&self) -> GestureAction {
        match self {
            GestureEvent::SingleTap { .. } => GestureAction::CreateShape(self.point()),
            GestureEvent::DoubleTap { .. } => GestureAction::ToggleSelection(self.point()),
        }
    }
}

/// What a resolved gesture asks the editor to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureAction {
    /// Place a default rectangle centered on the point.
    CreateShape(Point),
    /// Toggle selection of the shape under the point.
    ToggleSelection(Point),
}

#[derive(Debug, Clone, Copy)]
struct PendingTap {
    point: Point,
    at: Instant,
}

/// Debounce state machine turning raw taps into gesture actions.
///
/// States are idle and pending. A tap while idle becomes pending. A second
/// tap within `window` and `slop` of the pending one resolves both into a
/// single [`GestureAction::ToggleSelection`]. Once the window has elapsed,
/// observed through [`TapArbiter::poll`] or the next tap, the pending tap
/// resolves into [`GestureAction::CreateShape`].
#[derive(Debug, Clone)]
pub struct TapArbiter {
    window: Duration,
    slop: f64,
    pending: Option<PendingTap>,
}

impl Default for TapArbiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_DOUBLE_TAP_MS), DEFAULT_TAP_SLOP)
    }
}

impl TapArbiter {
    pub fn new(window: Duration, slop: f64) -> Self {
        Self {
            window,
            slop,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether a tap is waiting for its double-tap window to close.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Feed a raw tap.
    ///
    /// Returns the action resolved by this tap: the double tap it completes,
    /// or the earlier single tap it proves was not a double tap.
    pub fn tap(&mut self, point: Point, at: Instant) -> Option<GestureAction> {
        let Some(pending) = self.pending.take() else {
            self.pending = Some(PendingTap { point, at });
            return None;
        };

        let elapsed = at.saturating_duration_since(pending.at);
        if elapsed <= self.window && pending.point.distance(point) <= self.slop {
            log::debug!("Double tap at {:?}", pending.point);
            return Some(GestureAction::ToggleSelection(pending.point));
        }

        self.pending = Some(PendingTap { point, at });
        Some(GestureAction::CreateShape(pending.point))
    }

    /// Resolve a pending tap whose window has closed by `now`.
    pub fn poll(&mut self, now: Instant) -> Option<GestureAction> {
        let pending = self.pending?;
        if now.saturating_duration_since(pending.at) > self.window {
            self.pending = None;
            return Some(GestureAction::CreateShape(pending.point));
        }
        None
    }

    /// Resolve any pending tap as a single tap, regardless of time.
    pub fn flush(&mut self) -> Option<GestureAction> {
        self.pending
            .take()
            .map(|pending| GestureAction::CreateShape(pending.point))
    }

    /// Drop a pending tap without resolving it.
    pub fn reset(&mut self) {
        self.pending = None;
    }
}
