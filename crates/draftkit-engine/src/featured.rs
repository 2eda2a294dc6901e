//! Featured units: per-session rule and cost overrides.

use draftkit_protocol::UnitId;
use serde::{Deserialize, Serialize};

use crate::catalog::UnitKind;

/// Availability rule attached to a featured primary unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeaturedRule {
    /// Cost override only.
    #[default]
    None,
    /// Banned for both sides without spending a ban slot.
    UniversalBan,
    /// Both sides may pick it. It cannot be banned.
    UniversalPick,
}

/// A session-level override for one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeaturedOverride {
    Primary {
        unit: UnitId,
        #[serde(default)]
        rule: FeaturedRule,
        #[serde(default)]
        custom_base: Option<f64>,
    },
    Attachment {
        unit: UnitId,
        #[serde(default)]
        custom_base: Option<f64>,
    },
}

impl FeaturedOverride {
    pub fn unit(&self) -> &UnitId {
        match self {
            Self::Primary { unit, .. } | Self::Attachment { unit, .. } => unit,
        }
    }

    pub fn kind(&self) -> UnitKind {
        match self {
            Self::Primary { .. } => UnitKind::Primary,
            Self::Attachment { .. } => UnitKind::Attachment,
        }
    }

    pub fn rule(&self) -> FeaturedRule {
        match self {
            Self::Primary { rule, .. } => *rule,
            Self::Attachment { .. } => FeaturedRule::None,
        }
    }

    pub fn custom_base(&self) -> Option<f64> {
        match self {
            Self::Primary { custom_base, .. } | Self::Attachment { custom_base, .. } => {
                *custom_base
            }
        }
    }
}

/// The rule in force for a primary unit under a list of overrides.
pub fn rule_for(featured: &[FeaturedOverride], unit: &UnitId) -> FeaturedRule {
    featured
        .iter()
        .find(|f| f.kind() == UnitKind::Primary && f.unit() == unit)
        .map_or(FeaturedRule::None, FeaturedOverride::rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_featured_override_json_shape() {
        let json = r#"[
            {"kind": "primary", "unit": "acheron", "rule": "universalBan"},
            {"kind": "attachment", "unit": "cone", "custom_base": 0.25}
        ]"#;
        let list: Vec<FeaturedOverride> = serde_json::from_str(json).unwrap();
        assert_eq!(list[0].rule(), FeaturedRule::UniversalBan);
        assert_eq!(list[0].custom_base(), None);
        assert_eq!(list[1].kind(), UnitKind::Attachment);
        assert_eq!(list[1].custom_base(), Some(0.25));
    }

    #[test]
    fn test_rule_for_ignores_attachments() {
        let list = vec![FeaturedOverride::Attachment {
            unit: UnitId::from("x"),
            custom_base: None,
        }];
        assert_eq!(rule_for(&list, &UnitId::from("x")), FeaturedRule::None);
    }
}
