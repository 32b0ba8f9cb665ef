//! Resolution pipeline
//!
//! Turns a channel source URL into a live manifest URL:
//! cache lookup, then cooldown check, then plugin dispatch, then caching and
//! status bookkeeping. Concurrent resolutions of the same channel are not
//! deduplicated; they race and the last successful store wins, while the
//! status counters stay consistent because every mutation is per-key atomic.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ResolverConfig;
use crate::errors::{ResolutionError, ResolutionResult};
use crate::models::{ChannelConfig, ChannelStatus, LiveInfo, StatusLevel, SubChannel};
use crate::plugins::ResolverRegistry;
use crate::services::{ResolutionCache, StatusStore};
use crate::utils::UrlUtils;

/// Status message recorded for a healthy channel
pub const LIVE_MESSAGE: &str = "Live!";

pub struct ResolutionService {
    registry: Arc<ResolverRegistry>,
    status: StatusStore,
    cache: ResolutionCache,
    config: ResolverConfig,
}

impl ResolutionService {
    pub fn new(registry: Arc<ResolverRegistry>, config: ResolverConfig) -> Self {
        Self {
            registry,
            status: StatusStore::new(),
            cache: ResolutionCache::new(),
            config,
        }
    }

    pub fn registry(&self) -> &ResolverRegistry {
        &self.registry
    }

    pub fn status_store(&self) -> &StatusStore {
        &self.status
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Strategy actually used for `strategy`; empty names select the default parser
    pub fn effective_strategy<'a>(&'a self, strategy: &'a str) -> &'a str {
        if strategy.trim().is_empty() {
            &self.config.default_parser
        } else {
            strategy
        }
    }

    pub fn get_status(&self, source_url: &str) -> ChannelStatus {
        self.status.get_status(source_url)
    }

    /// Status of every channel seen so far, sorted by source URL
    pub fn statuses(&self) -> Vec<(String, ChannelStatus)> {
        self.status.snapshot()
    }

    /// Resolve a channel, serving from cache when possible
    ///
    /// On a cache miss the channel's cooldown is honored: a channel whose
    /// last status transition lies within its backoff window fails fast with
    /// [`ResolutionError::CoolingDown`] and no plugin is invoked.
    pub async fn resolve(
        &self,
        source_url: &str,
        proxy: Option<&str>,
        strategy: &str,
    ) -> ResolutionResult<LiveInfo> {
        if let Some(live_info) = self.cache.load(source_url) {
            return Ok(live_info);
        }

        let display_url = UrlUtils::obfuscate_credentials(source_url);
        debug!("Cache miss for {}", display_url);

        let status = self.status.peek(source_url).unwrap_or_default();
        let interval = self.config.cooldown_interval(status.cooldown_multiplier);
        if let Some(remaining) = status.cooldown_remaining(interval, Instant::now()) {
            debug!(
                "Resolver cooling down for {} ({:?} of {:?} remaining)",
                display_url, remaining, interval
            );
            return Err(ResolutionError::CoolingDown {
                source_url: source_url.to_string(),
                remaining,
            });
        }

        self.force_resolve(source_url, proxy, strategy, true).await
    }

    /// Resolve a channel through its plugin, bypassing cache and cooldown
    ///
    /// Success replaces the cache entry; with `reset_cooldown` it also marks
    /// the channel live and clears its retry count and cooldown multiplier.
    /// Failure records an error status, doubles the cooldown multiplier and
    /// leaves the cached entry untouched. An unknown strategy changes nothing.
    pub async fn force_resolve(
        &self,
        source_url: &str,
        proxy: Option<&str>,
        strategy: &str,
        reset_cooldown: bool,
    ) -> ResolutionResult<LiveInfo> {
        let strategy = self.effective_strategy(strategy);
        let resolver = self.registry.get(strategy)?;
        let extra_info = self.cache.extra_info(source_url);
        let display_url = UrlUtils::obfuscate_credentials(source_url);

        debug!("Resolving {} with '{}'", display_url, strategy);
        let outcome = tokio::time::timeout(
            self.config.resolve_timeout,
            resolver.resolve(source_url, proxy, &extra_info),
        )
        .await;

        let result = match outcome {
            Ok(Ok(live_info)) => Ok(live_info),
            Ok(Err(err)) => Err(ResolutionError::from_plugin(strategy, err)),
            Err(_) => Err(ResolutionError::Timeout {
                strategy: strategy.to_string(),
                timeout: self.config.resolve_timeout,
            }),
        };

        match result {
            Ok(live_info) => {
                self.cache.store(source_url, live_info.clone());
                if reset_cooldown {
                    self.status.reset_counters(source_url);
                    self.status
                        .update_status(source_url, StatusLevel::Ok, LIVE_MESSAGE);
                }
                info!(
                    "Resolved {} to {}",
                    display_url,
                    UrlUtils::obfuscate_credentials(&live_info.live_url)
                );
                Ok(live_info)
            }
            Err(err) => {
                self.status
                    .update_status(source_url, StatusLevel::Error, err.to_string());
                let multiplier = self
                    .status
                    .bump_cooldown(source_url, self.config.max_cooldown_multiplier);
                warn!(
                    "Failed to resolve {}: {} (cooldown multiplier now {})",
                    display_url, err, multiplier
                );
                Err(err)
            }
        }
    }

    /// Force-resolve a configured channel
    pub async fn update_url_cache_single(
        &self,
        channel: &ChannelConfig,
        reset_cooldown: bool,
    ) -> ResolutionResult<LiveInfo> {
        self.force_resolve(&channel.url, channel.proxy(), &channel.parser, reset_cooldown)
            .await
    }

    /// Resolve a freshly created or updated channel in the background
    ///
    /// The outcome is only logged; the handle is returned so callers that
    /// care (tests, graceful shutdown) can await it.
    pub fn spawn_warm_up(self: &Arc<Self>, channel: ChannelConfig) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            match service.update_url_cache_single(&channel, true).await {
                Ok(_) => debug!("Warmed up channel '{}'", channel.name),
                Err(e) => warn!("Warm-up of channel '{}' failed: {}", channel.name, e),
            }
        })
    }

    /// Sub-channels exposed by the channel's plugin
    ///
    /// Plugins without the channel provider capability expose none.
    pub async fn sub_channels(&self, channel: &ChannelConfig) -> ResolutionResult<Vec<SubChannel>> {
        let strategy = self.effective_strategy(&channel.parser);
        let resolver = self.registry.get(strategy)?;
        let Some(provider) = resolver.as_channel_provider() else {
            return Ok(Vec::new());
        };

        match tokio::time::timeout(
            self.config.resolve_timeout,
            provider.sub_channels(&channel.url, channel.proxy()),
        )
        .await
        {
            Ok(result) => result.map_err(|e| ResolutionError::from_plugin(strategy, e)),
            Err(_) => Err(ResolutionError::Timeout {
                strategy: strategy.to_string(),
                timeout: self.config.resolve_timeout,
            }),
        }
    }
}
