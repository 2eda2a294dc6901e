//! Derived per-render values.
//!
//! Nothing here is stored. A [`DraftView`] is recomputed from the session,
//! the catalog, and the current instant every time something is drawn.

use chrono::{DateTime, Utc};
use draftkit_clock::ClockView;
use draftkit_protocol::{PerSide, Side};
use serde::Serialize;

use crate::catalog::UnitCatalog;
use crate::cost::SlotCost;
use crate::draft::{DraftSession, Pick};
use crate::sequence::TurnToken;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotView {
    pub token: TurnToken,
    pub pick: Option<Pick>,
    /// `None` for bans and empty slots.
    pub cost: Option<SlotCost>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftView {
    pub current_turn: usize,
    pub current: Option<TurnToken>,
    pub complete: bool,
    pub slots: Vec<SlotView>,
    pub team_cost: PerSide<f64>,
    pub penalty: PerSide<f64>,
    pub final_score: PerSide<Option<f64>>,
    pub locked: PerSide<bool>,
    pub clock: Option<ClockView>,
}

impl DraftSession {
    /// Everything a renderer needs, computed for `now`.
    pub fn view(&self, catalog: &UnitCatalog, now: DateTime<Utc>) -> DraftView {
        let slots = self
            .sequence()
            .iter()
            .enumerate()
            .map(|(slot, token)| SlotView {
                token: *token,
                pick: self.pick(slot).cloned(),
                cost: self.slot_cost(slot, catalog),
            })
            .collect();

        DraftView {
            current_turn: self.current_turn(),
            current: self.current_token(),
            complete: self.is_complete(),
            slots,
            team_cost: both(|side| self.team_cost(side, catalog)),
            penalty: both(|side| self.penalty(side, catalog)),
            final_score: both(|side| self.final_score(side, catalog)),
            locked: self.locked(),
            clock: self.timer().map(|t| t.read(now, self.active_turn())),
        }
    }
}

fn both<T>(f: impl Fn(Side) -> T) -> PerSide<T> {
    PerSide::new(f(Side::Blue), f(Side::Red))
}
