//! Draft engine for Draftkit.
//!
//! Pure game logic: no I/O, no tasks, no locks besides the catalog cache.
//! Everything that needs the time takes `now` as an argument.
//!
//! - [`sequence`] gives the fixed turn order for a format and team size.
//! - [`DraftSession`] is the state machine: picks, bans, undo, edits,
//!   locks, and scores.
//! - [`unit_cost`] and [`CostConfig`] price picks from cost tables, with
//!   rarity formulas as the fallback.
//! - [`PenaltyModel`] turns a team's total cost into a score adjustment.
//! - [`DraftSession::view`] derives everything a renderer shows.

mod catalog;
mod command;
mod config;
mod cost;
mod draft;
mod error;
mod featured;
mod penalty;
mod sequence;
mod view;

pub use catalog::{CatalogCache, Rarity, Unit, UnitCatalog, UnitKind};
pub use command::DraftCommand;
pub use config::SessionConfig;
pub use cost::{
    CostConfig, CostContext, CostTable, SlotCost, formula_cost, round2, round_quarter, unit_cost,
};
pub use draft::{AttachmentPick, DraftSession, Pick, SlotEdit};
pub use error::{CatalogError, CorruptSession, DraftError};
pub use featured::{FeaturedOverride, FeaturedRule};
pub use penalty::PenaltyModel;
pub use sequence::{DraftFormat, TeamSize, TurnKind, TurnToken, sequence};
pub use view::{DraftView, SlotView};
