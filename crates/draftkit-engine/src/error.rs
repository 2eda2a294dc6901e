//! Error types for the draft engine.

use draftkit_protocol::{Side, UnitId};

/// A draft mutation that was refused.
///
/// Every variant means "nothing changed". The engine validates before it
/// mutates, so a rejected call never leaves a half-applied session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DraftError {
    /// The slot is not the one the cursor points at.
    #[error("wrong turn: expected slot {expected}, got {got}")]
    WrongTurn { expected: usize, got: usize },

    /// Every slot is filled.
    #[error("draft is already complete")]
    DraftComplete,

    /// The unit is banned, or already taken in a way this slot forbids.
    #[error("unit {unit} is unavailable to {side}")]
    UnitUnavailable { unit: UnitId, side: Side },

    /// The side already used its one duplicate ace pick.
    #[error("{0} already used its ace pick")]
    AceAlreadyUsed(Side),

    /// `undo` on an empty draft.
    #[error("nothing to undo")]
    NothingToUndo,

    /// The slot index is past the end of the sequence.
    #[error("slot {0} is out of range")]
    SlotOutOfRange(usize),

    /// `edit` on a slot that has not been filled yet.
    #[error("slot {0} is empty")]
    SlotEmpty(usize),

    /// `edit` on a ban slot. Bans have no level or attachment.
    #[error("slot {0} is a ban")]
    SlotIsBan(usize),

    /// Level outside 0–6, or attachment phase outside 1–5.
    #[error("level {level} is out of range for {unit}")]
    LevelOutOfRange { unit: UnitId, level: u8 },

    /// The catalog knows this unit as the other kind (an attachment used
    /// as a primary pick, or the reverse).
    #[error("unit {0} cannot be used in this position")]
    KindMismatch(UnitId),

    /// The operation needs a complete draft.
    #[error("draft is not complete")]
    NotComplete,

    /// Scores must be finite and non-negative.
    #[error("invalid score {0}")]
    InvalidScore(f64),

    /// Clock command on a session created without a clock.
    #[error("session has no clock")]
    NoClock,
}

impl DraftError {
    /// Short machine-readable reason, used in rejection replies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::WrongTurn { .. } => "wrong_turn",
            Self::DraftComplete => "draft_complete",
            Self::UnitUnavailable { .. } => "unit_unavailable",
            Self::AceAlreadyUsed(_) => "ace_already_used",
            Self::NothingToUndo => "nothing_to_undo",
            Self::SlotOutOfRange(_) => "slot_out_of_range",
            Self::SlotEmpty(_) => "slot_empty",
            Self::SlotIsBan(_) => "slot_is_ban",
            Self::LevelOutOfRange { .. } => "level_out_of_range",
            Self::KindMismatch(_) => "kind_mismatch",
            Self::NotComplete => "not_complete",
            Self::InvalidScore(_) => "invalid_score",
            Self::NoClock => "no_clock",
        }
    }
}

/// Why a stored session was refused on load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorruptSession {
    /// The turn order is not the one for the configured format and size.
    #[error("sequence does not match the configured format and team size")]
    SequenceMismatch,

    #[error("{picks} picks stored for {slots} slots")]
    PickCount { picks: usize, slots: usize },

    #[error("cursor {cursor} is past the end of {len} slots")]
    CursorOutOfRange { cursor: usize, len: usize },

    /// A slot is filled at or after the cursor, or empty before it.
    #[error("slot {0} disagrees with the cursor")]
    SlotOutOfOrder(usize),

    /// A stored pick has a level or phase outside its range.
    #[error("slot {0} holds an out-of-range pick")]
    BadPick(usize),

    #[error("stored score is negative or not finite")]
    InvalidScore,
}

/// Errors raised while reading external reference data.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog document is not a JSON array.
    #[error("catalog must be a JSON array, got {0}")]
    NotAnArray(&'static str),

    /// One catalog entry could not be turned into a unit.
    #[error("malformed catalog entry {index}: {reason}")]
    MalformedEntry { index: usize, reason: String },

    /// The catalog file could not be parsed as JSON at all.
    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
