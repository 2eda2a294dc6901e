//! Draft sequences.
//!
//! A draft's turn order is a game-format constant, not something derived
//! from rules at runtime. Each (format, team size) pair maps to one fixed
//! layout:
//!
//! ```text
//! Standard / 2   B  R  R  B  RR BB R  B
//! Standard / 3   B  R  R  B  RR BB R  B  B  R
//! Ace      / 2   B  R  R  B  RR BB RA BA B  R
//! Ace      / 3   B  R  R  B  RR BB RA BA B  R  R  B
//! ```
//!
//! `B`/`R` are picks, `BB`/`RR` bans, `BA`/`RA` ace picks. Bans always sit
//! at the 5th and 6th positions.

use std::fmt;
use std::str::FromStr;

use draftkit_protocol::Side;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// What a turn lets the acting side do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    Pick,
    Ban,
    /// A pick that may take a unit already picked by either side.
    Ace,
}

/// One slot of a draft sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnToken {
    pub side: Side,
    pub kind: TurnKind,
}

impl TurnToken {
    pub const fn new(side: Side, kind: TurnKind) -> Self {
        Self { side, kind }
    }

    pub fn is_ban(&self) -> bool {
        self.kind == TurnKind::Ban
    }
}

impl fmt::Display for TurnToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self.side {
            Side::Blue => 'B',
            Side::Red => 'R',
        };
        match self.kind {
            TurnKind::Pick => write!(f, "{s}"),
            TurnKind::Ban => write!(f, "{s}{s}"),
            TurnKind::Ace => write!(f, "{s}A"),
        }
    }
}

// ---------------------------------------------------------------------------
// Format and team size
// ---------------------------------------------------------------------------

/// Draft format family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftFormat {
    #[default]
    Standard,
    /// Adds one ace pick per side after the bans.
    Ace,
}

impl FromStr for DraftFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "ace" => Ok(Self::Ace),
            other => Err(format!("unknown draft format {other:?}")),
        }
    }
}

/// How many units each team fields per match. Serialized as the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TeamSize {
    #[default]
    Two,
    Three,
}

impl TryFrom<u8> for TeamSize {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(format!("unsupported team size {other}")),
        }
    }
}

impl From<TeamSize> for u8 {
    fn from(size: TeamSize) -> u8 {
        match size {
            TeamSize::Two => 2,
            TeamSize::Three => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Layouts
// ---------------------------------------------------------------------------

const B: TurnToken = TurnToken::new(Side::Blue, TurnKind::Pick);
const R: TurnToken = TurnToken::new(Side::Red, TurnKind::Pick);
const BB: TurnToken = TurnToken::new(Side::Blue, TurnKind::Ban);
const RR: TurnToken = TurnToken::new(Side::Red, TurnKind::Ban);
const BA: TurnToken = TurnToken::new(Side::Blue, TurnKind::Ace);
const RA: TurnToken = TurnToken::new(Side::Red, TurnKind::Ace);

const STANDARD_TWO: &[TurnToken] = &[B, R, R, B, RR, BB, R, B];
const STANDARD_THREE: &[TurnToken] = &[B, R, R, B, RR, BB, R, B, B, R];
const ACE_TWO: &[TurnToken] = &[B, R, R, B, RR, BB, RA, BA, B, R];
const ACE_THREE: &[TurnToken] = &[B, R, R, B, RR, BB, RA, BA, B, R, R, B];

/// The fixed turn order for a format and team size.
pub fn sequence(format: DraftFormat, team_size: TeamSize) -> Vec<TurnToken> {
    layout(format, team_size).to_vec()
}

fn layout(format: DraftFormat, team_size: TeamSize) -> &'static [TurnToken] {
    match (format, team_size) {
        (DraftFormat::Standard, TeamSize::Two) => STANDARD_TWO,
        (DraftFormat::Standard, TeamSize::Three) => STANDARD_THREE,
        (DraftFormat::Ace, TeamSize::Two) => ACE_TWO,
        (DraftFormat::Ace, TeamSize::Three) => ACE_THREE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [(DraftFormat, TeamSize); 4] = [
        (DraftFormat::Standard, TeamSize::Two),
        (DraftFormat::Standard, TeamSize::Three),
        (DraftFormat::Ace, TeamSize::Two),
        (DraftFormat::Ace, TeamSize::Three),
    ];

    #[test]
    fn test_sequence_lengths_are_fixed() {
        let lens: Vec<usize> = ALL.iter().map(|(f, t)| sequence(*f, *t).len()).collect();
        assert_eq!(lens, vec![8, 10, 10, 12]);
    }

    #[test]
    fn test_sequence_is_deterministic() {
        for (f, t) in ALL {
            assert_eq!(sequence(f, t), sequence(f, t));
        }
    }

    #[test]
    fn test_sequence_bans_only_at_fifth_and_sixth() {
        for (f, t) in ALL {
            let seq = sequence(f, t);
            let bans: Vec<usize> = seq
                .iter()
                .enumerate()
                .filter(|(_, tok)| tok.is_ban())
                .map(|(i, _)| i)
                .collect();
            assert_eq!(bans, vec![4, 5], "{f:?}/{t:?}");
        }
    }

    #[test]
    fn test_sequence_one_ban_per_side() {
        for (f, t) in ALL {
            let seq = sequence(f, t);
            for side in Side::ALL {
                let n = seq.iter().filter(|tok| tok.is_ban() && tok.side == side).count();
                assert_eq!(n, 1);
            }
        }
    }

    #[test]
    fn test_sequence_ace_format_has_one_ace_per_side() {
        for t in [TeamSize::Two, TeamSize::Three] {
            let seq = sequence(DraftFormat::Ace, t);
            for side in Side::ALL {
                let n = seq
                    .iter()
                    .filter(|tok| tok.kind == TurnKind::Ace && tok.side == side)
                    .count();
                assert_eq!(n, 1);
            }
        }
        assert!(
            sequence(DraftFormat::Standard, TeamSize::Three)
                .iter()
                .all(|tok| tok.kind != TurnKind::Ace)
        );
    }

    #[test]
    fn test_sequence_sides_get_equal_turns() {
        for (f, t) in ALL {
            let seq = sequence(f, t);
            let blue = seq.iter().filter(|tok| tok.side == Side::Blue).count();
            assert_eq!(blue * 2, seq.len());
        }
    }

    #[test]
    fn test_standard_two_matches_notation() {
        let text: Vec<String> = sequence(DraftFormat::Standard, TeamSize::Two)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(text, ["B", "R", "R", "B", "RR", "BB", "R", "B"]);
    }

    #[test]
    fn test_team_size_serializes_as_number() {
        assert_eq!(serde_json::to_string(&TeamSize::Three).unwrap(), "3");
        let size: TeamSize = serde_json::from_str("2").unwrap();
        assert_eq!(size, TeamSize::Two);
        assert!(serde_json::from_str::<TeamSize>("4").is_err());
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("ACE".parse::<DraftFormat>().unwrap(), DraftFormat::Ace);
        assert!("blitz".parse::<DraftFormat>().is_err());
    }
}
