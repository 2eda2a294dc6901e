//! Hub configuration.

use std::time::Duration;

use draftkit_store::StoreConfig;
use tracing::warn;

/// Settings for a [`DraftHub`](crate::DraftHub).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubConfig {
    /// Capacity of each room actor's command channel. Owners wait when it
    /// is full.
    pub command_channel_size: usize,
    /// How long idle sessions are kept.
    pub store: StoreConfig,
    /// How often the background sweeper looks for expired sessions.
    pub sweep_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            command_channel_size: 64,
            store: StoreConfig::default(),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl HubConfig {
    pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

    /// Clamps out-of-range values:
    /// - `command_channel_size` at least 1,
    /// - `sweep_interval` at least [`Self::MIN_SWEEP_INTERVAL`],
    /// - the retention window via [`StoreConfig::validated`].
    pub fn validated(mut self) -> Self {
        if self.command_channel_size == 0 {
            warn!("command_channel_size is 0, using 1");
            self.command_channel_size = 1;
        }
        if self.sweep_interval < Self::MIN_SWEEP_INTERVAL {
            warn!(
                sweep_ms = self.sweep_interval.as_millis() as u64,
                "sweep interval too short, clamping to 1s"
            );
            self.sweep_interval = Self::MIN_SWEEP_INTERVAL;
        }
        self.store = self.store.validated();
        self
    }
}
