//! Move-time budgeting and the deadline timer that enforces it.
//!
//! [`allocate`] turns a `go` command's clock parameters into a hard deadline;
//! [`DeadlineTimer`] is a background thread that sets a [`StopFlag`] once
//! that deadline passes.

use crate::config::search as cfg_search;
use crate::sync::StopFlag;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Clock state reported by the `go` command, in milliseconds, from the
/// perspective of the side to move.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClockInfo {
    pub time_ms: Option<u64>,
    pub inc_ms: Option<u64>,
    pub moves_to_go: Option<u32>,
    pub move_time_ms: Option<u64>,
}

/// Allocates a soft move-time budget from a `go` command's clock fields.
/// Returns `None` for `infinite`/depth-only searches, where the caller
/// should rely on the depth limit (or an explicit `stop`) instead.
pub fn allocate(clock: ClockInfo) -> Option<Duration> {
    if let Some(move_time) = clock.move_time_ms {
        return Some(Duration::from_millis(move_time.saturating_sub(cfg_search::TIME_SAFETY_BUFFER_MS)));
    }

    let time_ms = clock.time_ms?;
    let inc_ms = clock.inc_ms.unwrap_or(0);
    let moves_to_go = clock.moves_to_go.unwrap_or(cfg_search::DEFAULT_MOVES_TO_GO).max(1) as u64;

    let budget = time_ms / moves_to_go + inc_ms / 2;
    let budget = budget.min(time_ms.saturating_sub(cfg_search::TIME_SAFETY_BUFFER_MS));
    Some(Duration::from_millis(budget))
}

fn duration_until(deadline: Instant) -> Option<Duration> {
    let now = Instant::now();
    if deadline > now {
        Some(deadline - now)
    } else {
        None
    }
}

/// Background thread that sets a [`StopFlag`] when a deadline passes.
pub struct DeadlineTimer {
    handle: Option<JoinHandle<()>>,
}

impl DeadlineTimer {
    /// Starts a timer that stops `stop_flag` after `duration`. Returns
    /// `None` (no thread spawned) for a zero duration.
    #[must_use]
    pub fn start(duration: Duration, stop_flag: StopFlag) -> Option<DeadlineTimer> {
        if duration.is_zero() {
            return None;
        }
        let handle = thread::spawn(move || {
            thread::sleep(duration);
            stop_flag.stop();
        });
        Some(DeadlineTimer { handle: Some(handle) })
    }

    /// Starts a timer at an absolute deadline. Stops `stop_flag` immediately
    /// if the deadline has already passed.
    #[must_use]
    pub fn start_at(deadline: Option<Instant>, stop_flag: StopFlag) -> Option<DeadlineTimer> {
        let deadline = deadline?;
        match duration_until(deadline) {
            Some(duration) => DeadlineTimer::start(duration, stop_flag),
            None => {
                stop_flag.stop();
                None
            }
        }
    }

    /// Drops the handle without joining; the sleeping thread still runs to
    /// completion but nothing waits on it.
    pub fn cancel(mut self) {
        self.handle.take();
    }
}
