//! Retention policy.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::SessionMeta;

/// Shortest allowed retention window.
pub const MIN_RETENTION: Duration = Duration::from_secs(60);

/// Longest allowed retention window (30 days).
pub const MAX_RETENTION: Duration = Duration::from_secs(30 * 24 * 3600);

/// How long sessions are kept after their last activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    pub retention: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(24 * 3600),
        }
    }
}

impl StoreConfig {
    /// Clamps the retention window into `MIN_RETENTION..=MAX_RETENTION`.
    pub fn validated(mut self) -> Self {
        if self.retention < MIN_RETENTION {
            warn!(
                retention_secs = self.retention.as_secs(),
                "retention too short, clamping to 60s"
            );
            self.retention = MIN_RETENTION;
        } else if self.retention > MAX_RETENTION {
            warn!(
                retention_secs = self.retention.as_secs(),
                "retention too long, clamping to 30 days"
            );
            self.retention = MAX_RETENTION;
        }
        self
    }

    /// Whether a session went quiet longer than the retention window ago.
    pub fn is_expired(&self, meta: &SessionMeta, now: DateTime<Utc>) -> bool {
        let idle = (now - meta.last_activity).to_std().unwrap_or(Duration::ZERO);
        idle > self.retention
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use draftkit_protocol::SessionKey;

    use super::*;

    fn meta(last_activity: DateTime<Utc>) -> SessionMeta {
        SessionMeta {
            key: SessionKey::new("k"),
            revision: 0,
            complete: false,
            last_activity,
        }
    }

    #[test]
    fn test_validated_clamps_both_ends() {
        let short = StoreConfig {
            retention: Duration::from_secs(1),
        };
        assert_eq!(short.validated().retention, MIN_RETENTION);
        let long = StoreConfig {
            retention: Duration::from_secs(u64::MAX / 2),
        };
        assert_eq!(long.validated().retention, MAX_RETENTION);
    }

    #[test]
    fn test_is_expired_after_window() {
        let config = StoreConfig {
            retention: Duration::from_secs(600),
        };
        let t0 = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert!(!config.is_expired(&meta(t0), t0 + TimeDelta::seconds(600)));
        assert!(config.is_expired(&meta(t0), t0 + TimeDelta::seconds(601)));
        // Activity stamped in the future never counts as idle.
        assert!(!config.is_expired(&meta(t0 + TimeDelta::hours(1)), t0));
    }
}
