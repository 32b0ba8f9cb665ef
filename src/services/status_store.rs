//! Per-channel health records
//!
//! Keyed by channel source URL. Every mutation goes through the map's entry
//! API, so updates to one key are atomic and different keys only contend
//! when they hash to the same shard.

use chrono::Utc;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::models::{ChannelStatus, StatusLevel};

#[derive(Debug, Default)]
pub struct StatusStore {
    entries: DashMap<String, ChannelStatus>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status of `key`, creating the default record on first lookup
    pub fn get_status(&self, key: &str) -> ChannelStatus {
        self.entries
            .entry(key.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Current status of `key` without creating a record
    pub fn peek(&self, key: &str) -> Option<ChannelStatus> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Overwrite status, message and check time; counters are left alone
    pub fn update_status(&self, key: &str, status: StatusLevel, message: impl Into<String>) {
        let mut entry = self.entries.entry(key.to_string()).or_default();
        entry.status = status;
        entry.message = message.into();
        entry.last_checked = Some(Instant::now());
        entry.last_checked_at = Some(Utc::now());
    }

    /// Increment the consecutive retry count, returning the new value
    pub fn increment_retry(&self, key: &str) -> u32 {
        let mut entry = self.entries.entry(key.to_string()).or_default();
        entry.retry_count = entry.retry_count.saturating_add(1);
        entry.retry_count
    }

    pub fn reset_retry(&self, key: &str) {
        self.entries.entry(key.to_string()).or_default().retry_count = 0;
    }

    /// Double the cooldown multiplier up to `max`, returning the new value
    pub fn bump_cooldown(&self, key: &str, max: u32) -> u32 {
        let mut entry = self.entries.entry(key.to_string()).or_default();
        entry.cooldown_multiplier = entry
            .cooldown_multiplier
            .saturating_mul(2)
            .clamp(1, max.max(1));
        entry.cooldown_multiplier
    }

    pub fn reset_cooldown(&self, key: &str) {
        self.entries
            .entry(key.to_string())
            .or_default()
            .cooldown_multiplier = 1;
    }

    /// Reset retry count and cooldown multiplier under a single entry lock
    pub fn reset_counters(&self, key: &str) {
        let mut entry = self.entries.entry(key.to_string()).or_default();
        entry.retry_count = 0;
        entry.cooldown_multiplier = 1;
    }

    /// Every known channel with its status, sorted by key
    pub fn snapshot(&self) -> Vec<(String, ChannelStatus)> {
        let mut statuses: Vec<(String, ChannelStatus)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        statuses.sort_by(|a, b| a.0.cmp(&b.0));
        statuses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
