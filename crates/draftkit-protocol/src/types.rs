//! Identity types shared by every Draftkit crate.
//!
//! These are the small values that show up everywhere: which session a
//! message is about, which side is acting, which unit was drafted. They
//! travel on the wire, get stored in the session store, and appear in log
//! fields, so each one has a stable JSON shape and a `Display` impl.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// SessionKey
// ---------------------------------------------------------------------------

/// Opaque key of a draft session.
///
/// The store hands these out when a session is created. Spectators use
/// the key to subscribe; the owner uses it (plus the owner token) to
/// mutate. `#[serde(transparent)]` keeps it a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(pub String);

impl SessionKey {
    /// Wraps a raw key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrows the raw key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// UnitId
// ---------------------------------------------------------------------------

/// Stable identifier of a draftable unit (character or attachment).
///
/// The catalog owns the unit data; everything else refers to units by
/// this id only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub String);

impl UnitId {
    /// Wraps a raw unit id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// One of the two teams in a draft.
///
/// Serialized in lowercase (`"blue"`, `"red"`) to match the client
/// rendering code, which uses the side name as a CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Blue,
    Red,
}

impl Side {
    /// Both sides, Blue first.
    pub const ALL: [Side; 2] = [Side::Blue, Side::Red];

    /// The other team.
    pub fn opponent(self) -> Self {
        match self {
            Self::Blue => Self::Red,
            Self::Red => Self::Blue,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blue => write!(f, "blue"),
            Self::Red => write!(f, "red"),
        }
    }
}

impl FromStr for Side {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blue" | "b" => Ok(Self::Blue),
            "red" | "r" => Ok(Self::Red),
            other => Err(ProtocolError::InvalidMessage(format!(
                "unknown side {other:?}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// PerSide
// ---------------------------------------------------------------------------

/// A value held once per side.
///
/// Scores, lock flags, reserve clocks and cost presets all come in pairs.
/// Indexing with a [`Side`] keeps call sites free of `match side { .. }`
/// boilerplate:
///
/// ```rust
/// use draftkit_protocol::{PerSide, Side};
///
/// let mut locked = PerSide::splat(false);
/// locked[Side::Red] = true;
/// assert!(!locked[Side::Blue]);
/// assert!(locked[Side::Red]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerSide<T> {
    pub blue: T,
    pub red: T,
}

impl<T> PerSide<T> {
    /// Builds a pair from explicit values.
    pub fn new(blue: T, red: T) -> Self {
        Self { blue, red }
    }

    /// Applies `f` to both values, keeping the side association.
    pub fn map<U>(self, mut f: impl FnMut(Side, T) -> U) -> PerSide<U> {
        PerSide {
            blue: f(Side::Blue, self.blue),
            red: f(Side::Red, self.red),
        }
    }

    /// Iterates `(side, &value)` pairs, Blue first.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        [(Side::Blue, &self.blue), (Side::Red, &self.red)].into_iter()
    }
}

impl<T: Clone> PerSide<T> {
    /// The same value for both sides.
    pub fn splat(value: T) -> Self {
        Self {
            blue: value.clone(),
            red: value,
        }
    }
}

impl<T> Index<Side> for PerSide<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        match side {
            Side::Blue => &self.blue,
            Side::Red => &self.red,
        }
    }
}

impl<T> IndexMut<Side> for PerSide<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Blue => &mut self.blue,
            Side::Red => &mut self.red,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_serializes_as_plain_string() {
        let json = serde_json::to_string(&SessionKey::new("abc123")).unwrap();
        assert_eq!(json, "\"abc123\"");
    }

    #[test]
    fn test_session_key_display_is_prefixed() {
        assert_eq!(SessionKey::new("k9").to_string(), "D-k9");
    }

    #[test]
    fn test_unit_id_deserializes_from_plain_string() {
        let id: UnitId = serde_json::from_str("\"acheron\"").unwrap();
        assert_eq!(id, UnitId::from("acheron"));
    }

    #[test]
    fn test_side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Blue).unwrap(), "\"blue\"");
        assert_eq!(serde_json::to_string(&Side::Red).unwrap(), "\"red\"");
    }

    #[test]
    fn test_side_opponent_flips() {
        assert_eq!(Side::Blue.opponent(), Side::Red);
        assert_eq!(Side::Red.opponent(), Side::Blue);
    }

    #[test]
    fn test_side_from_str_accepts_short_and_long_forms() {
        assert_eq!("B".parse::<Side>().unwrap(), Side::Blue);
        assert_eq!("red".parse::<Side>().unwrap(), Side::Red);
        assert!("green".parse::<Side>().is_err());
    }

    #[test]
    fn test_per_side_index_and_map() {
        let mut totals = PerSide::new(1.5, 2.0);
        totals[Side::Blue] += 1.0;
        let doubled = totals.map(|_, v| v * 2.0);
        assert_eq!(doubled[Side::Blue], 5.0);
        assert_eq!(doubled[Side::Red], 4.0);
    }

    #[test]
    fn test_per_side_iter_is_blue_first() {
        let pair = PerSide::new("b", "r");
        let sides: Vec<Side> = pair.iter().map(|(s, _)| s).collect();
        assert_eq!(sides, vec![Side::Blue, Side::Red]);
    }
}
