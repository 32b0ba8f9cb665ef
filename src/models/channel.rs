use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A channel as supplied by the configuration store
///
/// The resolver never persists these; it only reads the fields it needs to
/// resolve and fetch the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    /// Source URL, also the key for status and cache entries
    pub url: String,
    /// Forward proxy for this channel, direct dial when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    /// Resolution strategy name, empty selects the configured default
    #[serde(default)]
    pub parser: String,
}

impl ChannelConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>, parser: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            proxy_url: None,
            parser: parser.into(),
        }
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy_url.as_deref().filter(|p| !p.is_empty())
    }
}

/// Result of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveInfo {
    /// Directly fetchable manifest URL
    pub live_url: String,
    /// Opaque resolver state handed back on the next resolution
    #[serde(default)]
    pub extra_info: String,
    pub created_at: DateTime<Utc>,
}

impl LiveInfo {
    pub fn new(live_url: impl Into<String>) -> Self {
        Self {
            live_url: live_url.into(),
            extra_info: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_extra_info(mut self, extra_info: impl Into<String>) -> Self {
        self.extra_info = extra_info.into();
        self
    }
}

/// A resolvable feed exposed by a channel provider (e.g. one quality of a multi-feed channel)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubChannel {
    pub name: String,
    pub url: String,
}
