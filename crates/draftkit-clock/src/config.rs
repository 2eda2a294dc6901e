//! Clock configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Clock settings chosen when a session is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Reserve time each side starts the draft with.
    #[serde(with = "secs")]
    pub reserve: Duration,
    /// Grace window that every turn starts with. Also the length of one
    /// timer-penalty cycle once a side has run out of reserve.
    #[serde(with = "secs")]
    pub grace_window: Duration,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            reserve: Duration::from_secs(180),
            grace_window: Duration::from_secs(30),
        }
    }
}

impl ClockConfig {
    /// Shortest grace window accepted. A zero window would make every
    /// instant past the reserve an infinite number of penalty cycles.
    pub const MIN_GRACE_WINDOW: Duration = Duration::from_secs(1);

    /// Longest reserve accepted.
    pub const MAX_RESERVE: Duration = Duration::from_secs(60 * 60);

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// - `grace_window` raised to [`Self::MIN_GRACE_WINDOW`].
    /// - `reserve` capped at [`Self::MAX_RESERVE`].
    /// - Both cut to whole milliseconds, the clock's resolution.
    pub fn validated(mut self) -> Self {
        if self.grace_window < Self::MIN_GRACE_WINDOW {
            warn!(
                grace_ms = self.grace_window.as_millis() as u64,
                "grace window below minimum, clamping"
            );
            self.grace_window = Self::MIN_GRACE_WINDOW;
        }
        if self.reserve > Self::MAX_RESERVE {
            warn!(
                reserve_secs = self.reserve.as_secs(),
                max_secs = Self::MAX_RESERVE.as_secs(),
                "reserve exceeds maximum, clamping"
            );
            self.reserve = Self::MAX_RESERVE;
        }
        self.grace_window = whole_millis(self.grace_window);
        self.reserve = whole_millis(self.reserve);
        self
    }
}

fn whole_millis(d: Duration) -> Duration {
    Duration::from_millis(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Durations as whole seconds on the wire.
mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
