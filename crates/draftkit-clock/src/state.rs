//! Stored clock state and its read/commit paths.

use std::time::Duration;

use chrono::{DateTime, Utc};
use draftkit_protocol::{PerSide, Side};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ClockConfig, reconcile};

/// The turn whose clock is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveTurn {
    pub side: Side,
    /// Exempt turns (each side's first ban) never burn time.
    pub exempt: bool,
}

/// Clock values as they should be displayed at a given instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockView {
    /// Side whose clock is running, `None` once the draft is complete.
    pub running: Option<Side>,
    pub grace_left: Duration,
    pub reserve_left: PerSide<Duration>,
    /// Running totals, including cycles incurred since the last sync.
    pub penalty_cycles: PerSide<u32>,
    pub paused: PerSide<bool>,
}

/// Persisted clock of one draft session.
///
/// Times are stored in milliseconds so the JSON stays readable for the
/// browser client. Syncs happen only at whole-millisecond instants, which
/// keeps the stored values exact: committing a span in pieces gives the
/// same state as committing it once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub config: ClockConfig,
    pub grace_left_ms: u64,
    pub reserve_left_ms: PerSide<u64>,
    pub penalty_cycles: PerSide<u32>,
    pub paused: PerSide<bool>,
    pub last_sync: DateTime<Utc>,
}

impl TimerState {
    /// A fresh clock: full reserve for both sides, a full grace window for
    /// the first turn.
    pub fn new(config: ClockConfig, now: DateTime<Utc>) -> Self {
        let config = config.validated();
        Self {
            config,
            grace_left_ms: millis(config.grace_window),
            reserve_left_ms: PerSide::splat(millis(config.reserve)),
            penalty_cycles: PerSide::splat(0),
            paused: PerSide::splat(false),
            last_sync: whole_millis(now),
        }
    }

    /// Grace left as of the last sync.
    pub fn grace_left(&self) -> Duration {
        Duration::from_millis(self.grace_left_ms)
    }

    /// Reserve left for `side` as of the last sync.
    pub fn reserve_left(&self, side: Side) -> Duration {
        Duration::from_millis(self.reserve_left_ms[side])
    }

    /// Time since the last sync. A `now` earlier than `last_sync` (clock
    /// skew between server processes) counts as zero.
    pub fn elapsed_since_sync(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_sync).to_std().unwrap_or(Duration::ZERO)
    }

    /// The clock as it should be displayed at `now`. Never mutates.
    pub fn read(&self, now: DateTime<Utc>, turn: Option<ActiveTurn>) -> ClockView {
        let mut view = ClockView {
            running: turn.map(|t| t.side),
            grace_left: self.grace_left(),
            reserve_left: self.reserve_left_ms.map(|_, ms| Duration::from_millis(ms)),
            penalty_cycles: self.penalty_cycles,
            paused: self.paused,
        };

        let Some(turn) = turn else {
            return view;
        };
        if turn.exempt || self.paused[turn.side] {
            return view;
        }

        let reading = reconcile(
            view.grace_left,
            view.reserve_left[turn.side],
            self.elapsed_since_sync(now),
            self.config.grace_window,
        );
        view.grace_left = reading.grace_left;
        view.reserve_left[turn.side] = reading.reserve_left;
        view.penalty_cycles[turn.side] =
            view.penalty_cycles[turn.side].saturating_add(reading.penalty_cycles);
        view
    }

    /// Folds the time elapsed since the last sync into the stored state.
    ///
    /// `now` is cut to the millisecond; the remainder is picked up by the
    /// next sync.
    pub fn commit(&mut self, now: DateTime<Utc>, turn: Option<ActiveTurn>) {
        let now = whole_millis(now);
        let view = self.read(now, turn);
        self.grace_left_ms = millis(view.grace_left);
        self.reserve_left_ms = view.reserve_left.map(|_, d| millis(d));
        self.penalty_cycles = view.penalty_cycles;
        self.last_sync = now;
    }

    /// Commits the finished turn, then opens a full grace window for the
    /// next one.
    pub fn start_turn(&mut self, now: DateTime<Utc>, finished: Option<ActiveTurn>) {
        self.commit(now, finished);
        self.grace_left_ms = millis(self.config.grace_window);
        debug!(
            blue_reserve_ms = self.reserve_left_ms.blue,
            red_reserve_ms = self.reserve_left_ms.red,
            "clock turn started"
        );
    }

    /// Stops `side`'s clock. Idempotent.
    pub fn pause(&mut self, side: Side, now: DateTime<Utc>, turn: Option<ActiveTurn>) {
        if !self.paused[side] {
            self.commit(now, turn);
            self.paused[side] = true;
            debug!(%side, "clock paused");
        }
    }

    /// Restarts `side`'s clock. Idempotent.
    ///
    /// The paused span is skipped by committing with the side still
    /// paused, which only moves `last_sync` forward for it.
    pub fn resume(&mut self, side: Side, now: DateTime<Utc>, turn: Option<ActiveTurn>) {
        if self.paused[side] {
            self.commit(now, turn);
            self.paused[side] = false;
            debug!(%side, "clock resumed");
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn whole_millis(t: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(t.timestamp_millis()).unwrap_or(t)
}
