//! Cost penalties and final scores.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cost::round2;

/// Cost steps the deduction model charges for. Matches the table
/// quantization, so every overage is a whole number of steps.
pub const COST_STEP: f64 = 0.25;

// Absorbs float noise in `total - limit` before flooring.
const EPSILON: f64 = 1e-9;

/// How a team's total cost turns into a score adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum PenaltyModel {
    /// Every 0.25 over `cost_limit` deducts `penalty_per_point` from the
    /// raw score.
    Deduction {
        cost_limit: f64,
        penalty_per_point: f64,
    },
    /// Cost adds `total / cycle_breakpoint` cycles to the score (lower is
    /// better), on top of any timer penalty cycles.
    Cycle { cycle_breakpoint: f64 },
}

impl Default for PenaltyModel {
    fn default() -> Self {
        Self::Deduction {
            cost_limit: 6.0,
            penalty_per_point: 2500.0,
        }
    }
}

impl PenaltyModel {
    /// Penalty for a team with `total_cost`. Never negative.
    ///
    /// For [`Deduction`](Self::Deduction) this is the amount taken off the
    /// score; for [`Cycle`](Self::Cycle) the number of cycles added.
    pub fn penalty(&self, total_cost: f64) -> f64 {
        match *self {
            Self::Deduction {
                cost_limit,
                penalty_per_point,
            } => {
                let over = total_cost - cost_limit;
                if over <= 0.0 {
                    return 0.0;
                }
                let steps = ((over + EPSILON) / COST_STEP).floor();
                round2(steps * penalty_per_point)
            }
            Self::Cycle { cycle_breakpoint } => {
                if cycle_breakpoint <= 0.0 || total_cost <= 0.0 {
                    return 0.0;
                }
                round2(total_cost / cycle_breakpoint)
            }
        }
    }

    /// Final score from the raw score, team cost, and timer penalty cycles.
    ///
    /// Timer cycles only count under the cycle model; the deduction model
    /// has no cycle term to add them to.
    pub fn final_score(&self, raw: f64, total_cost: f64, timer_cycles: u32) -> f64 {
        let penalty = self.penalty(total_cost);
        match self {
            Self::Deduction { .. } => round2(raw - penalty),
            Self::Cycle { .. } => round2(raw + penalty + f64::from(timer_cycles)),
        }
    }

    /// Replaces unusable parameters with the defaults for the model.
    pub fn validated(self) -> Self {
        match self {
            Self::Deduction {
                cost_limit,
                penalty_per_point,
            } => {
                let mut cost_limit = cost_limit;
                let mut penalty_per_point = penalty_per_point;
                if !cost_limit.is_finite() || cost_limit < 0.0 {
                    warn!(cost_limit, "invalid cost limit, using 6.0");
                    cost_limit = 6.0;
                }
                if !penalty_per_point.is_finite() || penalty_per_point < 0.0 {
                    warn!(penalty_per_point, "invalid penalty per point, using 0");
                    penalty_per_point = 0.0;
                }
                Self::Deduction {
                    cost_limit,
                    penalty_per_point,
                }
            }
            Self::Cycle { cycle_breakpoint } => {
                if cycle_breakpoint.is_finite() && cycle_breakpoint > 0.0 {
                    self
                } else {
                    warn!(cycle_breakpoint, "invalid cycle breakpoint, using 4.0");
                    Self::Cycle {
                        cycle_breakpoint: 4.0,
                    }
                }
            }
        }
    }
}
