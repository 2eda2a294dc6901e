//! Per-session configuration.

use std::collections::HashSet;

use draftkit_clock::ClockConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cost::CostConfig;
use crate::featured::FeaturedOverride;
use crate::penalty::PenaltyModel;
use crate::sequence::{DraftFormat, TeamSize};

/// Everything fixed at session creation.
///
/// Only `format` and `team_size` are required in JSON. A session without
/// a `clock` runs untimed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub format: DraftFormat,
    pub team_size: TeamSize,
    #[serde(default)]
    pub costs: CostConfig,
    #[serde(default)]
    pub featured: Vec<FeaturedOverride>,
    #[serde(default)]
    pub penalty: PenaltyModel,
    #[serde(default)]
    pub clock: Option<ClockConfig>,
}

impl SessionConfig {
    pub fn new(format: DraftFormat, team_size: TeamSize) -> Self {
        Self {
            format,
            team_size,
            ..Self::default()
        }
    }

    pub fn with_clock(mut self, clock: ClockConfig) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_featured(mut self, featured: FeaturedOverride) -> Self {
        self.featured.push(featured);
        self
    }

    pub fn with_costs(mut self, costs: CostConfig) -> Self {
        self.costs = costs;
        self
    }

    pub fn with_penalty(mut self, penalty: PenaltyModel) -> Self {
        self.penalty = penalty;
        self
    }

    /// Returns a copy that is safe to run a draft with.
    ///
    /// - invalid cost table rows are dropped,
    /// - unusable penalty parameters fall back to defaults,
    /// - the clock is clamped into range,
    /// - a unit featured twice with the same kind keeps its first entry.
    pub fn validated(self) -> Self {
        let mut seen = HashSet::new();
        let featured = self
            .featured
            .into_iter()
            .filter(|f| {
                let fresh = seen.insert((f.unit().clone(), f.kind()));
                if !fresh {
                    warn!(unit = %f.unit(), "duplicate featured override ignored");
                }
                fresh
            })
            .collect();

        Self {
            format: self.format,
            team_size: self.team_size,
            costs: self.costs.validated(),
            featured,
            penalty: self.penalty.validated(),
            clock: self.clock.map(ClockConfig::validated),
        }
    }
}

#[cfg(test)]
mod tests {
    use draftkit_protocol::UnitId;

    use super::*;
    use crate::featured::FeaturedRule;

    #[test]
    fn test_config_minimal_json() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"format": "ace", "team_size": 3}"#).unwrap();
        assert_eq!(config.format, DraftFormat::Ace);
        assert_eq!(config.team_size, TeamSize::Three);
        assert!(config.clock.is_none());
        assert_eq!(config.penalty, PenaltyModel::default());
    }

    #[test]
    fn test_validated_dedupes_featured() {
        let primary = |rule| FeaturedOverride::Primary {
            unit: UnitId::from("x"),
            rule,
            custom_base: None,
        };
        let config = SessionConfig::default()
            .with_featured(primary(FeaturedRule::UniversalBan))
            .with_featured(primary(FeaturedRule::UniversalPick))
            .with_featured(FeaturedOverride::Attachment {
                unit: UnitId::from("x"),
                custom_base: Some(0.5),
            })
            .validated();
        assert_eq!(config.featured.len(), 2);
        assert_eq!(config.featured[0].rule(), FeaturedRule::UniversalBan);
    }
}
