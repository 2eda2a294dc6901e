//! Point costs.
//!
//! A unit's cost at a level comes from, in order of preference:
//!
//! 1. the acting side's own cost table, if it lists the unit,
//! 2. the shared cost table,
//! 3. a fallback formula keyed on rarity and the limited flag.
//!
//! Table values are snapped to the nearest 0.25 before use. A featured
//! override with a custom base cost replaces the level-0 value while
//! keeping the table's (or formula's) step between level 0 and the
//! requested level:
//!
//! ```text
//! cost = base + (value[level] - value[0])
//! ```
//!
//! Results never go below zero and are rounded to 2 decimals.

use std::collections::BTreeMap;

use draftkit_protocol::{PerSide, Side, UnitId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::{Rarity, Unit, UnitKind};
use crate::featured::FeaturedOverride;

/// Flat cost of a common primary at every level.
pub const COMMON_PRIMARY_COST: f64 = 0.5;

/// Non-limited rare primary: base cost, and the cost at max level.
pub const RARE_PRIMARY_COST: f64 = 1.0;
pub const RARE_PRIMARY_MAX_LEVEL_COST: f64 = 1.5;

/// Limited rare primary, levels 0 through 6.
pub const LIMITED_PRIMARY_COSTS: [f64; 7] = [2.0, 2.5, 3.0, 3.0, 3.5, 3.5, 4.5];

/// Non-limited rare attachment: phases 1–4, and phase 5.
pub const RARE_ATTACHMENT_COST: f64 = 0.25;
pub const RARE_ATTACHMENT_MAX_PHASE_COST: f64 = 0.5;

/// Limited rare attachment, phases 1 through 5.
pub const LIMITED_ATTACHMENT_COSTS: [f64; 5] = [0.5, 0.5, 0.75, 0.75, 1.0];

/// Rounds to the nearest 0.25.
pub fn round_quarter(value: f64) -> f64 {
    (value * 4.0).round() / 4.0
}

/// Rounds to 2 decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn settle(value: f64) -> f64 {
    if value.is_finite() {
        round2(value.max(0.0))
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// A named cost table: unit id to one cost per level (or phase).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostTable {
    #[serde(default)]
    pub name: String,
    pub costs: BTreeMap<UnitId, Vec<f64>>,
}

impl CostTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            costs: BTreeMap::new(),
        }
    }

    pub fn with(mut self, unit: impl Into<UnitId>, costs: impl Into<Vec<f64>>) -> Self {
        self.costs.insert(unit.into(), costs.into());
        self
    }

    pub fn get(&self, unit: &UnitId) -> Option<&[f64]> {
        self.costs.get(unit).map(Vec::as_slice)
    }

    /// Drops rows that cannot be costed: empty rows, rows longer than a
    /// primary table, and rows holding negative or non-finite values.
    pub fn validated(mut self) -> Self {
        let max_len = UnitKind::Primary.table_len();
        let name = self.name.clone();
        self.costs.retain(|unit, row| {
            let ok = !row.is_empty()
                && row.len() <= max_len
                && row.iter().all(|v| v.is_finite() && *v >= 0.0);
            if !ok {
                warn!(table = %name, %unit, "dropping invalid cost table row");
            }
            ok
        });
        self
    }
}

/// Cost tables used by one session: a shared preset, plus optional
/// per-side presets that take priority for that side's picks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostConfig {
    #[serde(default)]
    pub shared: Vec<CostTable>,
    #[serde(default)]
    pub per_side: PerSide<Vec<CostTable>>,
}

impl CostConfig {
    pub fn shared(tables: impl IntoIterator<Item = CostTable>) -> Self {
        Self {
            shared: tables.into_iter().collect(),
            per_side: PerSide::default(),
        }
    }

    /// The row for `unit`, looking at `side`'s tables before the shared
    /// ones. Earlier tables win within each group.
    pub fn lookup(&self, side: Side, unit: &UnitId) -> Option<&[f64]> {
        self.per_side[side]
            .iter()
            .chain(&self.shared)
            .find_map(|t| t.get(unit))
    }

    pub fn validated(self) -> Self {
        Self {
            shared: self.shared.into_iter().map(CostTable::validated).collect(),
            per_side: self
                .per_side
                .map(|_, tables| tables.into_iter().map(CostTable::validated).collect()),
        }
    }
}

// ---------------------------------------------------------------------------
// Costing
// ---------------------------------------------------------------------------

/// Fallback cost for a unit at a table index.
pub fn formula_cost(unit: &Unit, index: usize) -> f64 {
    let last = unit.kind.table_len() - 1;
    let index = index.min(last);
    match (unit.kind, unit.rarity, unit.limited) {
        (UnitKind::Primary, Rarity::Common, _) => COMMON_PRIMARY_COST,
        (UnitKind::Primary, Rarity::Rare, false) if index == last => RARE_PRIMARY_MAX_LEVEL_COST,
        (UnitKind::Primary, Rarity::Rare, false) => RARE_PRIMARY_COST,
        (UnitKind::Primary, Rarity::Rare, true) => LIMITED_PRIMARY_COSTS[index],
        (UnitKind::Attachment, Rarity::Common, _) => 0.0,
        (UnitKind::Attachment, Rarity::Rare, false) if index == last => {
            RARE_ATTACHMENT_MAX_PHASE_COST
        }
        (UnitKind::Attachment, Rarity::Rare, false) => RARE_ATTACHMENT_COST,
        (UnitKind::Attachment, Rarity::Rare, true) => LIMITED_ATTACHMENT_COSTS[index],
    }
}

/// Cost of `unit` at `level` (a phase for attachments).
///
/// `table` is the unit's cost row if one was found; `base` is a featured
/// custom base cost. Out-of-range levels are clamped.
pub fn unit_cost(unit: &Unit, level: u8, table: Option<&[f64]>, base: Option<f64>) -> f64 {
    let index = unit.kind.level_index(level);

    let (at_level, at_zero) = match table {
        Some(row) if !row.is_empty() => {
            let i = index.min(row.len() - 1);
            (round_quarter(row[i]), round_quarter(row[0]))
        }
        _ => (formula_cost(unit, index), formula_cost(unit, 0)),
    };

    let cost = match base {
        Some(base) => base + (at_level - at_zero),
        None => at_level,
    };
    settle(cost)
}

/// Cost of one filled pick slot, split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SlotCost {
    pub primary: f64,
    pub attachment: f64,
    pub total: f64,
}

/// Everything needed to cost a pick that does not live on the pick itself.
pub struct CostContext<'a> {
    pub costs: &'a CostConfig,
    pub featured: &'a [FeaturedOverride],
}

impl CostContext<'_> {
    pub fn unit_cost(&self, side: Side, unit: &Unit, level: u8) -> f64 {
        let table = self.costs.lookup(side, &unit.id);
        let base = self
            .featured
            .iter()
            .find(|f| f.unit() == &unit.id && f.kind() == unit.kind)
            .and_then(FeaturedOverride::custom_base);
        unit_cost(unit, level, table, base)
    }
}
