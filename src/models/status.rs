use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Externally visible health classification of a channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    #[default]
    Ok,
    Warning,
    Error,
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusLevel::Ok => "ok",
            StatusLevel::Warning => "warning",
            StatusLevel::Error => "error",
        };
        f.write_str(name)
    }
}

/// Per-channel health record, keyed by the channel source URL
#[derive(Debug, Clone, Serialize)]
pub struct ChannelStatus {
    pub status: StatusLevel,
    pub message: String,
    /// Wall clock time of the last status transition, for display
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Monotonic time of the last status transition, drives the cooldown
    #[serde(skip)]
    pub last_checked: Option<Instant>,
    /// Consecutive failed reparse attempts
    pub retry_count: u32,
    pub cooldown_multiplier: u32,
}

impl Default for ChannelStatus {
    fn default() -> Self {
        Self {
            status: StatusLevel::Ok,
            message: String::new(),
            last_checked_at: None,
            last_checked: None,
            retry_count: 0,
            cooldown_multiplier: 1,
        }
    }
}

impl ChannelStatus {
    /// Remaining backoff if the channel was checked within `interval` of `now`
    ///
    /// A channel that was never checked is never cooling down.
    pub fn cooldown_remaining(&self, interval: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_checked?;
        let elapsed = now.saturating_duration_since(last);
        (elapsed <= interval).then(|| interval - elapsed)
    }
}
