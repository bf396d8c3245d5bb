//! Display countdown for the next regenerated life.
//!
//! The countdown is a read-only projection of a confirmed [`ResourceState`].
//! It does not use internal threads - the caller is responsible for calling
//! `tick()` periodically, typically once per second.
//!
//! ## Usage
//!
//! ```ignore
//! let mut countdown = session.countdown();
//! // In a loop:
//! let frame = countdown.tick(clock.now());
//! if frame.unit_ready {
//!     session.refresh()?; // persist the regenerated unit
//!     countdown.sync(session.profile().resource.clone());
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resource::{PoolStatus, ResourceState};

/// What to show on one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownFrame {
    /// Count including units regenerated since the last sync.
    pub count: u32,
    pub max_count: u32,
    pub status: PoolStatus,
    pub next_in_ms: Option<u64>,
    pub full_in_ms: Option<u64>,
    /// `mm:ss` until the next unit, empty when full.
    pub label: String,
    /// A unit regenerated since the previous tick.
    pub unit_ready: bool,
}

/// Caller-ticked countdown over a confirmed snapshot.
#[derive(Debug, Clone)]
pub struct Countdown {
    confirmed: ResourceState,
    last_count: Option<u32>,
}

impl Countdown {
    pub fn new(confirmed: ResourceState) -> Self {
        Self {
            confirmed,
            last_count: None,
        }
    }

    /// Replace the projected snapshot after a committed write.
    pub fn sync(&mut self, confirmed: ResourceState) {
        self.confirmed = confirmed;
        self.last_count = None;
    }

    pub fn confirmed(&self) -> &ResourceState {
        &self.confirmed
    }

    /// Recompute the frame for `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> CountdownFrame {
        let (projected, _) = self.confirmed.reconcile(now);
        let next_in_ms = projected
            .time_to_next(now)
            .map(|d| d.num_milliseconds().max(0) as u64);
        let full_in_ms = projected
            .time_to_full(now)
            .map(|d| d.num_milliseconds().max(0) as u64);

        let unit_ready = matches!(self.last_count, Some(prev) if projected.count > prev);
        self.last_count = Some(projected.count);

        CountdownFrame {
            count: projected.count,
            max_count: projected.max_count,
            status: projected.status(),
            next_in_ms,
            full_in_ms,
            label: next_in_ms.map(format_mm_ss).unwrap_or_default(),
            unit_ready,
        }
    }
}

/// Round up to whole seconds so `00:00` is never shown while waiting.
pub fn format_mm_ss(ms: u64) -> String {
    let secs = ms.div_ceil(1000);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
