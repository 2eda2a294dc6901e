//! Draft clock for Draftkit.
//!
//! Each side has a *reserve* that lasts the whole draft, and every turn
//! starts with a shared *grace* window. Time burns grace first, then the
//! acting side's reserve. Once both are gone, the side starts collecting
//! timer-penalty cycles.
//!
//! # No running clock
//!
//! Nothing in this crate sleeps or ticks. The authoritative clock is a
//! stored [`TimerState`] plus the timestamp it was last synced at. Every
//! reader (the owner's screen, each spectator) recomputes the displayed
//! clock from those stored values with [`reconcile`], which is a pure
//! function. Two spectators that reconnect at different moments compute
//! the same clock for the same `now`, so nobody drifts.
//!
//! The writer folds elapsed time into the stored state with
//! [`TimerState::commit`] whenever the turn changes or a pause toggles.

mod config;
mod reconcile;
mod state;

pub use config::ClockConfig;
pub use reconcile::{ClockReading, reconcile};
pub use state::{ActiveTurn, ClockView, TimerState};
