use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::shared::timestamp::{Clock, ManualClock, Timestamp};

/// Source of render-frame callbacks. Each call blocks until the next
/// display refresh and returns its time, or `None` once no more frames will
/// be delivered.
pub trait RenderTicker {
    fn next_tick(&mut self) -> Option<Timestamp>;
}

/// Fixed-rate ticker for hosts without a compositor callback.
///
/// Deadlines are laid out on a grid from the first tick so sleeping never
/// accumulates drift. When the caller falls more than one interval behind,
/// missed frames are dropped rather than replayed in a burst.
pub struct IntervalTicker {
    clock: Arc<dyn Clock>,
    interval: Duration,
    limit: Option<Duration>,
    started_at: Option<Timestamp>,
    ticks: u64,
}

impl IntervalTicker {
    pub fn new(clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            clock,
            interval: interval.max(Duration::from_millis(1)),
            limit: None,
            started_at: None,
            ticks: 0,
        }
    }

    /// Stop delivering ticks once `limit` has elapsed since the first one.
    pub fn with_limit(mut self, limit: Option<Duration>) -> Self {
        self.limit = limit;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn deadline(&self, start: Timestamp, tick: u64) -> Timestamp {
        start.saturating_add(self.interval.mul_f64(tick as f64))
    }
}

impl RenderTicker for IntervalTicker {
    fn next_tick(&mut self) -> Option<Timestamp> {
        let now = self.clock.now();
        let start = *self.started_at.get_or_insert(now);
        if let Some(limit) = self.limit {
            if now.saturating_since(start) >= limit {
                return None;
            }
        }

        let deadline = self.deadline(start, self.ticks);
        if deadline > now {
            std::thread::sleep(deadline.saturating_since(now));
        } else if now.saturating_since(deadline) >= self.interval {
            let elapsed = now.saturating_since(start).as_secs_f64();
            self.ticks = (elapsed / self.interval.as_secs_f64()).floor() as u64;
        }
        self.ticks += 1;
        Some(self.clock.now())
    }
}

/// Replays a fixed list of tick times. Optionally moves a [`ManualClock`]
/// to each tick so clock-driven collaborators see the same time.
#[derive(Default)]
pub struct ScriptedTicker {
    ticks: VecDeque<Timestamp>,
    clock: Option<ManualClock>,
}

impl ScriptedTicker {
    pub fn new(ticks: impl IntoIterator<Item = Timestamp>) -> Self {
        Self {
            ticks: ticks.into_iter().collect(),
            clock: None,
        }
    }

    pub fn from_millis(ticks: impl IntoIterator<Item = u64>) -> Self {
        Self::new(ticks.into_iter().map(Timestamp::from_millis))
    }

    /// Evenly spaced ticks in `[start, end)`.
    pub fn every(step_ms: u64, start_ms: u64, end_ms: u64) -> Self {
        Self::from_millis((start_ms..end_ms).step_by(step_ms.max(1) as usize))
    }

    pub fn with_clock(mut self, clock: ManualClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn remaining(&self) -> usize {
        self.ticks.len()
    }
}

impl RenderTicker for ScriptedTicker {
    fn next_tick(&mut self) -> Option<Timestamp> {
        let tick = self.ticks.pop_front()?;
        if let Some(clock) = &self.clock {
            clock.set(tick);
        }
        Some(tick)
    }
}
