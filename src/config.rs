use serde::{Deserialize, Serialize};

/// Default heartbeat collection interval, in seconds.
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u32 = 3600;

/// Shortest supported collection interval, in seconds. Intervals below this
/// produce more events than the upload path is provisioned for.
pub const MIN_HEARTBEAT_INTERVAL_SECS: u32 = 900;

/// Heartbeat scheduling configuration, consumed by the platform timer that
/// triggers collection. The engine itself never sleeps or schedules.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Seconds between heartbeat collection attempts.
    pub interval_secs: u32,
}

impl HeartbeatConfig {
    /// The configured interval, clamped to the supported minimum.
    pub fn effective_interval_secs(&self) -> u32 {
        self.interval_secs.max(MIN_HEARTBEAT_INTERVAL_SECS)
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_HEARTBEAT_INTERVAL_SECS,
        }
    }
}
