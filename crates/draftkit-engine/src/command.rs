//! Owner commands and the clock bookkeeping around them.

use chrono::{DateTime, Utc};
use draftkit_clock::ActiveTurn;
use draftkit_protocol::Side;
use serde::{Deserialize, Serialize};

use crate::catalog::{UnitCatalog, UnitKind};
use crate::draft::{DraftSession, Pick, SlotEdit};
use crate::DraftError;

/// A mutation requested by the session owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DraftCommand {
    Pick { slot: usize, pick: Pick },
    Undo,
    Edit { slot: usize, edit: SlotEdit },
    Lock { side: Side },
    Score { side: Side, score: f64 },
    PauseClock { side: Side },
    ResumeClock { side: Side },
}

impl DraftCommand {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pick { .. } => "pick",
            Self::Undo => "undo",
            Self::Edit { .. } => "edit",
            Self::Lock { .. } => "lock",
            Self::Score { .. } => "score",
            Self::PauseClock { .. } => "pause_clock",
            Self::ResumeClock { .. } => "resume_clock",
        }
    }
}

impl DraftSession {
    /// Applies an owner command at `now`.
    ///
    /// Turn changes (a pick or an undo) commit the finished turn's time and
    /// open a fresh grace window for the next one. Pause and resume commit
    /// first so the paused span is never charged.
    pub fn execute(
        &mut self,
        command: DraftCommand,
        catalog: &UnitCatalog,
        now: DateTime<Utc>,
    ) -> Result<(), DraftError> {
        match command {
            DraftCommand::Pick { slot, pick } => {
                // Bans keep only the unit, so only the unit is checked.
                if self.current_token().is_some_and(|t| t.is_ban()) {
                    Pick::unit(pick.unit.clone()).check_kinds(catalog)?;
                } else {
                    pick.check_kinds(catalog)?;
                }
                let finished = self.active_turn();
                self.apply_pick(slot, pick)?;
                self.restart_clock(now, finished);
            }
            DraftCommand::Undo => {
                let finished = self.active_turn();
                self.undo()?;
                self.restart_clock(now, finished);
            }
            DraftCommand::Edit { slot, edit } => {
                if let SlotEdit::Attachment {
                    attachment: Some(att),
                } = &edit
                {
                    if catalog
                        .get(&att.unit)
                        .is_some_and(|u| u.kind != UnitKind::Attachment)
                    {
                        return Err(DraftError::KindMismatch(att.unit.clone()));
                    }
                }
                self.edit_slot(slot, edit)?;
            }
            DraftCommand::Lock { side } => self.lock_side(side)?,
            DraftCommand::Score { side, score } => self.record_score(side, score)?,
            DraftCommand::PauseClock { side } => {
                let turn = self.active_turn();
                self.timer_mut()
                    .ok_or(DraftError::NoClock)?
                    .pause(side, now, turn);
            }
            DraftCommand::ResumeClock { side } => {
                let turn = self.active_turn();
                self.timer_mut()
                    .ok_or(DraftError::NoClock)?
                    .resume(side, now, turn);
            }
        }
        Ok(())
    }

    fn restart_clock(&mut self, now: DateTime<Utc>, finished: Option<ActiveTurn>) {
        if let Some(timer) = self.timer_mut() {
            timer.start_turn(now, finished);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeDelta;
    use draftkit_clock::ClockConfig;

    use super::*;
    use crate::config::SessionConfig;
    use crate::sequence::{DraftFormat, TeamSize};

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap() + TimeDelta::seconds(secs)
    }

    fn timed() -> DraftSession {
        let config = SessionConfig::new(DraftFormat::Standard, TeamSize::Two).with_clock(
            ClockConfig {
                reserve: Duration::from_secs(60),
                grace_window: Duration::from_secs(30),
            },
        );
        DraftSession::new(config, at(0))
    }

    fn pick(slot: usize, unit: &str) -> DraftCommand {
        DraftCommand::Pick {
            slot,
            pick: Pick::unit(unit),
        }
    }

    #[test]
    fn test_execute_pick_charges_finished_turn() {
        let mut s = timed();
        let catalog = UnitCatalog::default();
        s.execute(pick(0, "a"), &catalog, at(40)).unwrap();

        let timer = s.timer().unwrap();
        assert_eq!(timer.reserve_left(Side::Blue), Duration::from_secs(50));
        assert_eq!(timer.reserve_left(Side::Red), Duration::from_secs(60));
        assert_eq!(timer.grace_left(), Duration::from_secs(30));
    }

    #[test]
    fn test_execute_first_ban_is_free() {
        let mut s = timed();
        let catalog = UnitCatalog::default();
        for (slot, unit) in ["a", "b", "c", "d"].iter().enumerate() {
            s.execute(pick(slot, unit), &catalog, at(0)).unwrap();
        }
        // Red's ban takes ten minutes and costs nothing.
        s.execute(pick(4, "x"), &catalog, at(600)).unwrap();
        let timer = s.timer().unwrap();
        assert_eq!(timer.reserve_left(Side::Red), Duration::from_secs(60));
        assert_eq!(timer.penalty_cycles[Side::Red], 0);
    }

    #[test]
    fn test_execute_rejected_command_leaves_clock_alone() {
        let mut s = timed();
        let before = s.clone();
        let err = s
            .execute(pick(3, "a"), &UnitCatalog::default(), at(90))
            .unwrap_err();
        assert!(matches!(err, DraftError::WrongTurn { .. }));
        assert_eq!(s, before);
    }

    #[test]
    fn test_execute_pause_without_clock() {
        let mut s = DraftSession::new(
            SessionConfig::new(DraftFormat::Standard, TeamSize::Two),
            at(0),
        );
        let err = s
            .execute(
                DraftCommand::PauseClock { side: Side::Blue },
                &UnitCatalog::default(),
                at(1),
            )
            .unwrap_err();
        assert_eq!(err, DraftError::NoClock);
    }

    #[test]
    fn test_command_json_shape() {
        let cmd: DraftCommand = serde_json::from_str(
            r#"{"type":"pick","slot":0,"pick":{"unit":"a","level":2}}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            DraftCommand::Pick {
                slot: 0,
                pick: Pick::unit("a").at_level(2)
            }
        );
        let edit: DraftCommand = serde_json::from_str(
            r#"{"type":"edit","slot":1,"edit":{"field":"attachment","attachment":null}}"#,
        )
        .unwrap();
        assert_eq!(edit.name(), "edit");
    }
}
