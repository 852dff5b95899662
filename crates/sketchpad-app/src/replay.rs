//! Replay of recorded raw taps.

use anyhow::{Context, Result, bail};
use kurbo::Point;
use serde::Deserialize;
use sketchpad_core::{DocumentSession, RecordStore, SaveStatus};
use std::time::{Duration, Instant};

/// One raw tap, `at_ms` milliseconds after the start of the recording.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTap {
    pub x: f64,
    pub y: f64,
    pub at_ms: u64,
}

/// Parse a JSON array of taps in time order.
pub fn parse_taps(json: &str) -> Result<Vec<RawTap>> {
    let taps: Vec<RawTap> = serde_json::from_str(json).context("Invalid tap recording")?;
    if let Some(pair) = taps.windows(2).find(|pair| pair[1].at_ms < pair[0].at_ms) {
        bail!("Taps out of order at {} ms", pair[1].at_ms);
    }
    Ok(taps)
}

/// Feed `taps` through the session's tap arbiter.
///
/// A tap still pending at the end of the recording resolves as a single tap.
/// Returns the last failed save, if any write-through did not commit.
pub fn replay<S: RecordStore>(session: &mut DocumentSession<S>, taps: &[RawTap]) -> SaveStatus {
    let start = Instant::now();
    let mut status = SaveStatus::Saved;
    for tap in taps {
        let at = start + Duration::from_millis(tap.at_ms);
        keep_failure(&mut status, session.tap(Point::new(tap.x, tap.y), at));
    }
    keep_failure(&mut status, session.flush_taps());
    status
}

fn keep_failure(status: &mut SaveStatus, next: SaveStatus) {
    if !next.is_saved() {
        *status = next;
    }
}
