//! The draft state machine.
//!
//! A [`DraftSession`] holds the fixed sequence, a cursor into it, and one
//! optional [`Pick`] per slot. Slots before the cursor are filled and
//! slots from the cursor on are empty, always. Only [`apply_pick`] and
//! [`undo`] move the cursor, and they move it by exactly one.
//!
//! Validation happens before mutation: an `Err` from any method means the
//! session is unchanged.
//!
//! The mutation methods here do not touch the clock. Clock bookkeeping
//! happens in [`DraftSession::execute`](crate::DraftCommand), which wraps
//! them, so `undo(apply_pick(s)) == s` holds for the bare state machine.
//!
//! [`apply_pick`]: DraftSession::apply_pick
//! [`undo`]: DraftSession::undo

use chrono::{DateTime, Utc};
use draftkit_clock::{ActiveTurn, TimerState};
use draftkit_protocol::{PerSide, Side, UnitId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Unit, UnitCatalog, UnitKind};
use crate::config::SessionConfig;
use crate::cost::{CostContext, SlotCost, round2};
use crate::featured::{FeaturedRule, rule_for};
use crate::sequence::{TurnKind, TurnToken, sequence};
use crate::{CorruptSession, DraftError};

// ---------------------------------------------------------------------------
// Picks
// ---------------------------------------------------------------------------

/// An attachment equipped on a picked unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentPick {
    pub unit: UnitId,
    /// 1–5.
    pub phase: u8,
}

/// What fills one slot. For ban slots only `unit` is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
    pub unit: UnitId,
    /// 0–6.
    #[serde(default)]
    pub level: u8,
    #[serde(default)]
    pub attachment: Option<AttachmentPick>,
}

impl Pick {
    /// A level-0 pick with no attachment. Also the form bans are stored in.
    pub fn unit(unit: impl Into<UnitId>) -> Self {
        Self {
            unit: unit.into(),
            level: 0,
            attachment: None,
        }
    }

    pub fn at_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn with_attachment(mut self, unit: impl Into<UnitId>, phase: u8) -> Self {
        self.attachment = Some(AttachmentPick {
            unit: unit.into(),
            phase,
        });
        self
    }

    fn check_levels(&self) -> Result<(), DraftError> {
        if !UnitKind::Primary.accepts(self.level) {
            return Err(DraftError::LevelOutOfRange {
                unit: self.unit.clone(),
                level: self.level,
            });
        }
        if let Some(att) = &self.attachment {
            if !UnitKind::Attachment.accepts(att.phase) {
                return Err(DraftError::LevelOutOfRange {
                    unit: att.unit.clone(),
                    level: att.phase,
                });
            }
        }
        Ok(())
    }

    /// Rejects units the catalog knows as the other kind. Unknown units
    /// pass.
    pub fn check_kinds(&self, catalog: &UnitCatalog) -> Result<(), DraftError> {
        if catalog
            .get(&self.unit)
            .is_some_and(|u| u.kind != UnitKind::Primary)
        {
            return Err(DraftError::KindMismatch(self.unit.clone()));
        }
        if let Some(att) = &self.attachment {
            if catalog
                .get(&att.unit)
                .is_some_and(|u| u.kind != UnitKind::Attachment)
            {
                return Err(DraftError::KindMismatch(att.unit.clone()));
            }
        }
        Ok(())
    }
}

/// A change to an already filled pick slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum SlotEdit {
    Level { level: u8 },
    /// `None` removes the attachment.
    Attachment { attachment: Option<AttachmentPick> },
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One draft between the blue and red sides.
///
/// Deserializing checks the structure (see [`CorruptSession`]), so a
/// session loaded from disk upholds the same rules as one built through
/// [`new`](Self::new).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDraftSession")]
pub struct DraftSession {
    config: SessionConfig,
    sequence: Vec<TurnToken>,
    current_turn: usize,
    picks: Vec<Option<Pick>>,
    scores: PerSide<Option<f64>>,
    locked: PerSide<bool>,
    timer: Option<TimerState>,
}

/// Wire form of [`DraftSession`], before its structure is checked.
#[derive(Deserialize)]
struct RawDraftSession {
    config: SessionConfig,
    sequence: Vec<TurnToken>,
    current_turn: usize,
    picks: Vec<Option<Pick>>,
    scores: PerSide<Option<f64>>,
    locked: PerSide<bool>,
    timer: Option<TimerState>,
}

impl TryFrom<RawDraftSession> for DraftSession {
    type Error = CorruptSession;

    fn try_from(raw: RawDraftSession) -> Result<Self, Self::Error> {
        let config = raw.config.validated();
        if raw.sequence != sequence(config.format, config.team_size) {
            return Err(CorruptSession::SequenceMismatch);
        }
        let len = raw.sequence.len();
        if raw.picks.len() != len {
            return Err(CorruptSession::PickCount {
                picks: raw.picks.len(),
                slots: len,
            });
        }
        if raw.current_turn > len {
            return Err(CorruptSession::CursorOutOfRange {
                cursor: raw.current_turn,
                len,
            });
        }
        for (slot, pick) in raw.picks.iter().enumerate() {
            if pick.is_some() != (slot < raw.current_turn) {
                return Err(CorruptSession::SlotOutOfOrder(slot));
            }
            if pick.as_ref().is_some_and(|p| p.check_levels().is_err()) {
                return Err(CorruptSession::BadPick(slot));
            }
        }
        let scores_ok = [raw.scores.blue, raw.scores.red]
            .into_iter()
            .flatten()
            .all(|score| score.is_finite() && score >= 0.0);
        if !scores_ok {
            return Err(CorruptSession::InvalidScore);
        }

        Ok(Self {
            config,
            sequence: raw.sequence,
            current_turn: raw.current_turn,
            picks: raw.picks,
            scores: raw.scores,
            locked: raw.locked,
            timer: raw.timer,
        })
    }
}

impl DraftSession {
    /// A fresh draft. The clock, if configured, starts at `now`.
    pub fn new(config: SessionConfig, now: DateTime<Utc>) -> Self {
        let config = config.validated();
        let sequence = sequence(config.format, config.team_size);
        let timer = config.clock.map(|c| TimerState::new(c, now));
        Self {
            picks: vec![None; sequence.len()],
            sequence,
            config,
            current_turn: 0,
            scores: PerSide::splat(None),
            locked: PerSide::splat(false),
            timer,
        }
    }

    // -- queries ------------------------------------------------------------

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn sequence(&self) -> &[TurnToken] {
        &self.sequence
    }

    /// Index of the next slot to fill. Equals the sequence length once
    /// the draft is complete.
    pub fn current_turn(&self) -> usize {
        self.current_turn
    }

    pub fn current_token(&self) -> Option<TurnToken> {
        self.sequence.get(self.current_turn).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.current_turn >= self.sequence.len()
    }

    pub fn picks(&self) -> &[Option<Pick>] {
        &self.picks
    }

    pub fn pick(&self, slot: usize) -> Option<&Pick> {
        self.picks.get(slot).and_then(Option::as_ref)
    }

    pub fn scores(&self) -> PerSide<Option<f64>> {
        self.scores
    }

    pub fn locked(&self) -> PerSide<bool> {
        self.locked
    }

    pub fn timer(&self) -> Option<&TimerState> {
        self.timer.as_ref()
    }

    pub(crate) fn timer_mut(&mut self) -> Option<&mut TimerState> {
        self.timer.as_mut()
    }

    /// Filled slots with their tokens.
    pub fn filled(&self) -> impl Iterator<Item = (usize, TurnToken, &Pick)> {
        self.sequence
            .iter()
            .zip(&self.picks)
            .enumerate()
            .filter_map(|(i, (tok, pick))| pick.as_ref().map(|p| (i, *tok, p)))
    }

    /// Whether `unit` is out of the draft: featured as a universal ban, or
    /// taken by a ban slot.
    pub fn is_banned(&self, unit: &UnitId) -> bool {
        rule_for(&self.config.featured, unit) == FeaturedRule::UniversalBan
            || self
                .filled()
                .any(|(_, tok, p)| tok.is_ban() && &p.unit == unit)
    }

    /// Whether `side` has `unit` in a pick or ace slot.
    pub fn is_picked_by(&self, side: Side, unit: &UnitId) -> bool {
        self.filled()
            .any(|(_, tok, p)| !tok.is_ban() && tok.side == side && &p.unit == unit)
    }

    /// Whether `side` already spent its ace on a unit that was also picked
    /// elsewhere.
    pub fn ace_duplicate_used(&self, side: Side) -> bool {
        self.filled()
            .filter(|(_, tok, _)| tok.kind == TurnKind::Ace && tok.side == side)
            .any(|(ace_slot, _, ace)| {
                self.filled()
                    .any(|(i, tok, p)| i != ace_slot && !tok.is_ban() && p.unit == ace.unit)
            })
    }

    /// Checks whether `unit` may fill a slot with `token`.
    pub fn check_available(&self, token: TurnToken, unit: &UnitId) -> Result<(), DraftError> {
        let unavailable = || DraftError::UnitUnavailable {
            unit: unit.clone(),
            side: token.side,
        };

        if self.is_banned(unit) {
            return Err(unavailable());
        }

        let mine = self.is_picked_by(token.side, unit);
        let theirs = self.is_picked_by(token.side.opponent(), unit);
        let rule = rule_for(&self.config.featured, unit);

        match token.kind {
            TurnKind::Ban => {
                if rule == FeaturedRule::UniversalPick || mine || theirs {
                    return Err(unavailable());
                }
            }
            TurnKind::Pick => {
                if mine || (theirs && rule != FeaturedRule::UniversalPick) {
                    return Err(unavailable());
                }
            }
            TurnKind::Ace => {
                if (mine || theirs) && self.ace_duplicate_used(token.side) {
                    return Err(DraftError::AceAlreadyUsed(token.side));
                }
            }
        }
        Ok(())
    }

    /// Catalog units of the right kind that `side` could put in a slot of
    /// `kind` right now, sorted by id.
    pub fn available_for<'a>(
        &self,
        side: Side,
        kind: TurnKind,
        catalog: &'a UnitCatalog,
    ) -> Vec<&'a Unit> {
        let token = TurnToken::new(side, kind);
        let mut units: Vec<&Unit> = catalog
            .units()
            .filter(|u| u.kind == UnitKind::Primary)
            .filter(|u| self.check_available(token, &u.id).is_ok())
            .collect();
        units.sort_by(|a, b| a.id.cmp(&b.id));
        units
    }

    /// The running turn as the clock sees it. `None` once complete.
    ///
    /// Each side's first ban is exempt from time burn.
    pub fn active_turn(&self) -> Option<ActiveTurn> {
        let token = self.current_token()?;
        let exempt = token.is_ban()
            && self.sequence[..self.current_turn]
                .iter()
                .all(|t| !(t.is_ban() && t.side == token.side));
        Some(ActiveTurn {
            side: token.side,
            exempt,
        })
    }

    // -- mutations ----------------------------------------------------------

    /// Fills the slot at the cursor and advances it.
    ///
    /// Bans are stored as a bare unit: level and attachment are dropped.
    pub fn apply_pick(&mut self, slot: usize, pick: Pick) -> Result<(), DraftError> {
        let token = self.current_token().ok_or(DraftError::DraftComplete)?;
        if slot != self.current_turn {
            return Err(DraftError::WrongTurn {
                expected: self.current_turn,
                got: slot,
            });
        }

        let pick = if token.is_ban() {
            Pick::unit(pick.unit)
        } else {
            pick.check_levels()?;
            pick
        };
        self.check_available(token, &pick.unit)?;

        debug!(slot, token = %token, unit = %pick.unit, "slot filled");
        self.picks[slot] = Some(pick);
        self.current_turn += 1;
        Ok(())
    }

    /// Empties the last filled slot and moves the cursor back onto it.
    ///
    /// Reopening the draft also clears both sides' locks.
    pub fn undo(&mut self) -> Result<(), DraftError> {
        if self.current_turn == 0 {
            return Err(DraftError::NothingToUndo);
        }
        self.current_turn -= 1;
        self.picks[self.current_turn] = None;
        self.locked = PerSide::splat(false);
        debug!(slot = self.current_turn, "slot undone");
        Ok(())
    }

    /// Changes the level or attachment of a filled pick slot. The cursor
    /// does not move.
    pub fn edit_slot(&mut self, slot: usize, edit: SlotEdit) -> Result<(), DraftError> {
        let token = *self
            .sequence
            .get(slot)
            .ok_or(DraftError::SlotOutOfRange(slot))?;
        if token.is_ban() {
            return Err(DraftError::SlotIsBan(slot));
        }
        let current = self.picks[slot].as_ref().ok_or(DraftError::SlotEmpty(slot))?;

        let mut edited = current.clone();
        match edit {
            SlotEdit::Level { level } => edited.level = level,
            SlotEdit::Attachment { attachment } => edited.attachment = attachment,
        }
        edited.check_levels()?;

        self.picks[slot] = Some(edited);
        Ok(())
    }

    /// Marks `side`'s lineup as final. Needs a complete draft.
    pub fn lock_side(&mut self, side: Side) -> Result<(), DraftError> {
        if !self.is_complete() {
            return Err(DraftError::NotComplete);
        }
        self.locked[side] = true;
        Ok(())
    }

    /// Records `side`'s raw match score. Needs a complete draft.
    pub fn record_score(&mut self, side: Side, score: f64) -> Result<(), DraftError> {
        if !score.is_finite() || score < 0.0 {
            return Err(DraftError::InvalidScore(score));
        }
        if !self.is_complete() {
            return Err(DraftError::NotComplete);
        }
        self.scores[side] = Some(score);
        Ok(())
    }

    // -- costs --------------------------------------------------------------

    fn cost_context(&self) -> CostContext<'_> {
        CostContext {
            costs: &self.config.costs,
            featured: &self.config.featured,
        }
    }

    /// Cost of a filled pick slot. `None` for bans and empty slots.
    pub fn slot_cost(&self, slot: usize, catalog: &UnitCatalog) -> Option<SlotCost> {
        let token = *self.sequence.get(slot)?;
        if token.is_ban() {
            return None;
        }
        let pick = self.pick(slot)?;
        let ctx = self.cost_context();

        let unit = catalog.resolve(&pick.unit, UnitKind::Primary);
        let primary = ctx.unit_cost(token.side, &unit, pick.level);
        let attachment = pick.attachment.as_ref().map_or(0.0, |att| {
            let unit = catalog.resolve(&att.unit, UnitKind::Attachment);
            ctx.unit_cost(token.side, &unit, att.phase)
        });

        Some(SlotCost {
            primary,
            attachment,
            total: round2(primary + attachment),
        })
    }

    /// Sum of `side`'s pick slot costs.
    pub fn team_cost(&self, side: Side, catalog: &UnitCatalog) -> f64 {
        let total = self
            .sequence
            .iter()
            .enumerate()
            .filter(|(_, tok)| tok.side == side)
            .filter_map(|(slot, _)| self.slot_cost(slot, catalog))
            .map(|c| c.total)
            .sum::<f64>();
        round2(total)
    }

    /// Cost penalty for `side` under the session's penalty model.
    pub fn penalty(&self, side: Side, catalog: &UnitCatalog) -> f64 {
        self.config.penalty.penalty(self.team_cost(side, catalog))
    }

    /// `side`'s final score, once a raw score is recorded.
    pub fn final_score(&self, side: Side, catalog: &UnitCatalog) -> Option<f64> {
        let raw = self.scores[side]?;
        let cycles = self.timer.as_ref().map_or(0, |t| t.penalty_cycles[side]);
        Some(
            self.config
                .penalty
                .final_score(raw, self.team_cost(side, catalog), cycles),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::featured::FeaturedOverride;
    use crate::sequence::{DraftFormat, TeamSize};

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn session(format: DraftFormat, size: TeamSize) -> DraftSession {
        DraftSession::new(SessionConfig::new(format, size), now())
    }

    fn fill(s: &mut DraftSession, units: &[&str]) {
        for u in units {
            let slot = s.current_turn();
            s.apply_pick(slot, Pick::unit(*u)).unwrap();
        }
    }

    #[test]
    fn test_apply_pick_advances_cursor() {
        let mut s = session(DraftFormat::Standard, TeamSize::Two);
        s.apply_pick(0, Pick::unit("a")).unwrap();
        assert_eq!(s.current_turn(), 1);
        assert_eq!(s.pick(0).unwrap().unit, UnitId::from("a"));
    }

    #[test]
    fn test_apply_pick_wrong_slot_rejected() {
        let mut s = session(DraftFormat::Standard, TeamSize::Two);
        let err = s.apply_pick(1, Pick::unit("a")).unwrap_err();
        assert_eq!(err, DraftError::WrongTurn { expected: 0, got: 1 });
        assert_eq!(s.current_turn(), 0);
    }

    #[test]
    fn test_apply_pick_same_slot_twice_is_wrong_turn() {
        let mut s = session(DraftFormat::Standard, TeamSize::Two);
        s.apply_pick(0, Pick::unit("a")).unwrap();
        let before = s.clone();
        let err = s.apply_pick(0, Pick::unit("b")).unwrap_err();
        assert!(matches!(err, DraftError::WrongTurn { .. }));
        assert_eq!(s, before);
    }

    #[test]
    fn test_apply_pick_on_complete_draft() {
        let mut s = session(DraftFormat::Standard, TeamSize::Two);
        fill(&mut s, &["a", "b", "c", "d", "e", "f", "g", "h"]);
        assert!(s.is_complete());
        assert_eq!(
            s.apply_pick(8, Pick::unit("z")).unwrap_err(),
            DraftError::DraftComplete
        );
    }

    #[test]
    fn test_ban_strips_level_and_attachment() {
        let mut s = session(DraftFormat::Standard, TeamSize::Two);
        fill(&mut s, &["a", "b", "c", "d"]);
        s.apply_pick(4, Pick::unit("x").at_level(6).with_attachment("cone", 5))
            .unwrap();
        assert_eq!(s.pick(4), Some(&Pick::unit("x")));
    }

    #[test]
    fn test_level_out_of_range_rejected() {
        let mut s = session(DraftFormat::Standard, TeamSize::Two);
        let err = s.apply_pick(0, Pick::unit("a").at_level(7)).unwrap_err();
        assert!(matches!(err, DraftError::LevelOutOfRange { level: 7, .. }));
        let err = s
            .apply_pick(0, Pick::unit("a").with_attachment("cone", 0))
            .unwrap_err();
        assert!(matches!(err, DraftError::LevelOutOfRange { level: 0, .. }));
    }

    #[test]
    fn test_banned_unit_unavailable() {
        let mut s = session(DraftFormat::Standard, TeamSize::Two);
        fill(&mut s, &["a", "b", "c", "d", "x"]);
        let err = s.apply_pick(5, Pick::unit("x")).unwrap_err();
        assert!(matches!(err, DraftError::UnitUnavailable { .. }));
    }

    #[test]
    fn test_cannot_ban_picked_unit() {
        let mut s = session(DraftFormat::Standard, TeamSize::Two);
        fill(&mut s, &["a", "b", "c", "d"]);
        let err = s.apply_pick(4, Pick::unit("a")).unwrap_err();
        assert!(matches!(err, DraftError::UnitUnavailable { side: Side::Red, .. }));
    }

    #[test]
    fn test_universal_pick_shared_but_not_bannable() {
        let config = SessionConfig::new(DraftFormat::Standard, TeamSize::Two).with_featured(
            FeaturedOverride::Primary {
                unit: UnitId::from("u"),
                rule: FeaturedRule::UniversalPick,
                custom_base: None,
            },
        );
        let mut s = DraftSession::new(config, now());
        fill(&mut s, &["u", "u", "c", "d"]);
        let err = s.apply_pick(4, Pick::unit("u")).unwrap_err();
        assert!(matches!(err, DraftError::UnitUnavailable { .. }));
    }

    #[test]
    fn test_universal_ban_unavailable_everywhere() {
        let config = SessionConfig::new(DraftFormat::Ace, TeamSize::Two).with_featured(
            FeaturedOverride::Primary {
                unit: UnitId::from("u"),
                rule: FeaturedRule::UniversalBan,
                custom_base: None,
            },
        );
        let mut s = DraftSession::new(config, now());
        assert!(s.apply_pick(0, Pick::unit("u")).is_err());
        assert!(s.is_banned(&UnitId::from("u")));
    }

    #[test]
    fn test_active_turn_marks_first_ban_exempt() {
        let mut s = session(DraftFormat::Standard, TeamSize::Two);
        assert!(!s.active_turn().unwrap().exempt);
        fill(&mut s, &["a", "b", "c", "d"]);
        let turn = s.active_turn().unwrap();
        assert_eq!(turn.side, Side::Red);
        assert!(turn.exempt);
        fill(&mut s, &["x", "y", "g", "h"]);
        assert_eq!(s.active_turn(), None);
    }

    #[test]
    fn test_undo_on_empty_draft() {
        let mut s = session(DraftFormat::Standard, TeamSize::Two);
        assert_eq!(s.undo().unwrap_err(), DraftError::NothingToUndo);
    }

    #[test]
    fn test_undo_clears_locks() {
        let mut s = session(DraftFormat::Standard, TeamSize::Two);
        fill(&mut s, &["a", "b", "c", "d", "e", "f", "g", "h"]);
        s.lock_side(Side::Blue).unwrap();
        s.undo().unwrap();
        assert_eq!(s.locked(), PerSide::splat(false));
        assert!(s.pick(7).is_none());
    }

    #[test]
    fn test_edit_slot_rules() {
        let mut s = session(DraftFormat::Standard, TeamSize::Two);
        fill(&mut s, &["a", "b", "c", "d", "e"]);

        s.edit_slot(1, SlotEdit::Level { level: 4 }).unwrap();
        assert_eq!(s.pick(1).unwrap().level, 4);

        assert_eq!(
            s.edit_slot(4, SlotEdit::Level { level: 1 }).unwrap_err(),
            DraftError::SlotIsBan(4)
        );
        assert_eq!(
            s.edit_slot(6, SlotEdit::Level { level: 1 }).unwrap_err(),
            DraftError::SlotEmpty(6)
        );
        assert_eq!(
            s.edit_slot(20, SlotEdit::Level { level: 1 }).unwrap_err(),
            DraftError::SlotOutOfRange(20)
        );
        assert!(s.edit_slot(1, SlotEdit::Level { level: 9 }).is_err());
        assert_eq!(s.pick(1).unwrap().level, 4);
        assert_eq!(s.current_turn(), 5);
    }

    #[test]
    fn test_lock_and_score_need_complete_draft() {
        let mut s = session(DraftFormat::Standard, TeamSize::Two);
        assert_eq!(s.lock_side(Side::Red).unwrap_err(), DraftError::NotComplete);
        assert_eq!(
            s.record_score(Side::Red, 10.0).unwrap_err(),
            DraftError::NotComplete
        );
        fill(&mut s, &["a", "b", "c", "d", "e", "f", "g", "h"]);
        assert!(matches!(
            s.record_score(Side::Red, f64::NAN),
            Err(DraftError::InvalidScore(_))
        ));
        assert!(s.record_score(Side::Red, -1.0).is_err());
        s.record_score(Side::Red, 10.0).unwrap();
        assert_eq!(s.scores()[Side::Red], Some(10.0));
    }

    #[test]
    fn test_available_for_filters_taken_and_attachments() {
        let catalog = UnitCatalog::new([
            Unit::unknown(UnitId::from("a"), UnitKind::Primary),
            Unit::unknown(UnitId::from("b"), UnitKind::Primary),
            Unit::unknown(UnitId::from("c"), UnitKind::Primary),
            Unit::unknown(UnitId::from("cone"), UnitKind::Attachment),
        ]);
        let mut s = session(DraftFormat::Standard, TeamSize::Two);
        fill(&mut s, &["a"]);

        let ids = |units: Vec<&Unit>| -> Vec<String> {
            units.iter().map(|u| u.id.to_string()).collect()
        };
        assert_eq!(ids(s.available_for(Side::Red, TurnKind::Pick, &catalog)), ["b", "c"]);
        assert_eq!(
            ids(s.available_for(Side::Red, TurnKind::Ace, &catalog)),
            ["a", "b", "c"]
        );
    }

    #[test]
    fn test_check_kinds_uses_catalog() {
        let catalog = UnitCatalog::new([
            Unit::unknown(UnitId::from("cone"), UnitKind::Attachment),
            Unit::unknown(UnitId::from("hero"), UnitKind::Primary),
        ]);
        assert!(Pick::unit("hero").with_attachment("cone", 1).check_kinds(&catalog).is_ok());
        assert_eq!(
            Pick::unit("cone").check_kinds(&catalog).unwrap_err(),
            DraftError::KindMismatch(UnitId::from("cone"))
        );
        assert!(Pick::unit("hero").with_attachment("hero", 1).check_kinds(&catalog).is_err());
        assert!(Pick::unit("unknown").check_kinds(&catalog).is_ok());
    }

    fn reload(
        s: &DraftSession,
        tamper: impl FnOnce(&mut serde_json::Value),
    ) -> Result<DraftSession, serde_json::Error> {
        let mut value = serde_json::to_value(s).unwrap();
        tamper(&mut value);
        serde_json::from_value(value)
    }

    #[test]
    fn test_deserialize_accepts_consistent_session() {
        let mut s = session(DraftFormat::Standard, TeamSize::Two);
        fill(&mut s, &["a", "b", "c"]);
        assert_eq!(reload(&s, |_| {}).unwrap(), s);
    }

    #[test]
    fn test_deserialize_rejects_cursor_past_end() {
        let s = session(DraftFormat::Standard, TeamSize::Two);
        let len = s.sequence().len();
        let err = reload(&s, |v| v["current_turn"] = serde_json::json!(20)).unwrap_err();
        assert!(
            err.to_string()
                .contains(&format!("cursor 20 is past the end of {len} slots")),
            "{err}"
        );
    }

    #[test]
    fn test_deserialize_rejects_gap_below_cursor() {
        let mut s = session(DraftFormat::Standard, TeamSize::Two);
        fill(&mut s, &["a", "b", "c"]);
        let err = reload(&s, |v| v["picks"][1] = serde_json::Value::Null).unwrap_err();
        assert!(err.to_string().contains("slot 1 disagrees"), "{err}");
    }

    #[test]
    fn test_deserialize_rejects_pick_count_mismatch() {
        let s = session(DraftFormat::Standard, TeamSize::Two);
        let err = reload(&s, |v| {
            v["picks"].as_array_mut().unwrap().pop();
        })
        .unwrap_err();
        assert!(err.to_string().contains("picks stored for"), "{err}");
    }

    #[test]
    fn test_deserialize_rejects_foreign_sequence() {
        let s = session(DraftFormat::Standard, TeamSize::Two);
        assert_ne!(
            sequence(DraftFormat::Ace, TeamSize::Two),
            sequence(DraftFormat::Standard, TeamSize::Two)
        );
        let err = reload(&s, |v| v["config"]["format"] = serde_json::json!("ace")).unwrap_err();
        assert!(err.to_string().contains("sequence does not match"), "{err}");
    }
}
