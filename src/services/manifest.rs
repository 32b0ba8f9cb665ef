//! Manifest fetch and validation
//!
//! Fetches the manifest behind a resolved stream URL, validates it and, when
//! the upstream looks unhealthy, gives the channel exactly one chance to
//! recover through a forced re-resolution:
//!
//! ```text
//! attempt(stream_url) ── ok ──────────────────────────────▶ body
//!        │ retryable failure, budget left
//!        ▼
//! Warning "Unhealthy" ─▶ force_resolve ─▶ attempt(new_url) ── ok ─▶ Ok "Live!", body
//!                              │ err            │ err
//!                              ▼                ▼
//!                         Error, retry_count += 1, propagate
//! ```
//!
//! A body that is not a live playlist is never an error: it degrades to a
//! synthetic VOD playlist pointing at the stream URL.

use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::FetchConfig;
use crate::errors::{FetchError, FetchResult};
use crate::models::{DeviceProfile, LiveInfo, StatusLevel};
use crate::plugins::Resolver;
use crate::services::resolution::LIVE_MESSAGE;
use crate::services::{DurationProber, ResolutionService};
use crate::utils::playlist;
use crate::utils::{HttpClientFactory, UrlUtils};

/// Status message recorded while a channel is being reparsed
pub const UNHEALTHY_MESSAGE: &str = "Unhealthy";

/// Status message recorded when a source serves something other than a live playlist
pub const NOT_LIVE_MESSAGE: &str = "Url is not a live stream";

/// A manifest fetch for one channel
#[derive(Debug, Clone, Default)]
pub struct ManifestRequest {
    /// Channel source URL, the key for status and cache entries
    pub source_url: String,
    /// Resolved manifest URL to fetch
    pub stream_url: String,
    pub proxy: Option<String>,
    pub strategy: String,
    /// Caller query parameters; internal keys are dropped before forwarding
    pub forwarded_query: Vec<(String, String)>,
    /// Set when the caller is itself retrying; disables the reparse step
    pub is_retry: bool,
}

impl ManifestRequest {
    pub fn new(
        source_url: impl Into<String>,
        stream_url: impl Into<String>,
        strategy: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            stream_url: stream_url.into(),
            strategy: strategy.into(),
            ..Self::default()
        }
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy.filter(|p| !p.is_empty());
        self
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.forwarded_query = query;
        self
    }

    fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }
}

/// A fetched manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestResponse {
    pub body: String,
    /// Stream URL the body was fetched from; differs from the request after a reparse
    pub stream_url: String,
}

pub struct ManifestService {
    resolution: Arc<ResolutionService>,
    http: Arc<HttpClientFactory>,
    prober: Arc<dyn DurationProber>,
    device: DeviceProfile,
    max_manifest_size: u64,
}

impl ManifestService {
    pub fn new(
        resolution: Arc<ResolutionService>,
        http: Arc<HttpClientFactory>,
        prober: Arc<dyn DurationProber>,
        config: &FetchConfig,
    ) -> Self {
        Self {
            resolution,
            http,
            prober,
            device: DeviceProfile::from_name_or_default(&config.default_device),
            max_manifest_size: config.max_manifest_size,
        }
    }

    /// Fetch and validate the manifest for `request`
    ///
    /// Returns the manifest body and the stream URL it came from. At most one
    /// reparse and one second attempt happen per call.
    pub async fn fetch_manifest(&self, request: &ManifestRequest) -> FetchResult<ManifestResponse> {
        let source_url = request.source_url.as_str();
        let strategy = self.resolution.effective_strategy(&request.strategy);

        let first_error = match self.attempt(request, &request.stream_url, strategy).await {
            Ok(body) => {
                return Ok(ManifestResponse {
                    body,
                    stream_url: request.stream_url.clone(),
                })
            }
            Err(err) => err,
        };

        let display_url = UrlUtils::obfuscate_credentials(source_url);
        let status = self.resolution.get_status(source_url);
        if request.is_retry
            || !first_error.is_retryable()
            || status.retry_count >= self.resolution.config().max_retry_count
        {
            return Err(self.give_up(source_url, first_error));
        }

        info!("{} is unhealthy ({}), doing a reparse", display_url, first_error);
        self.resolution
            .status_store()
            .update_status(source_url, StatusLevel::Warning, UNHEALTHY_MESSAGE);

        let live_info = match self
            .resolution
            .force_resolve(source_url, request.proxy(), strategy, false)
            .await
        {
            Ok(live_info) => live_info,
            Err(err) => return Err(self.give_up(source_url, err.into())),
        };

        match self.attempt(request, &live_info.live_url, strategy).await {
            Ok(body) => {
                info!("{} is back online", display_url);
                self.resolution
                    .status_store()
                    .update_status(source_url, StatusLevel::Ok, LIVE_MESSAGE);
                Ok(ManifestResponse {
                    body,
                    stream_url: live_info.live_url,
                })
            }
            Err(err) => Err(self.give_up(source_url, err)),
        }
    }

    /// Record a terminal failure for the channel and hand the error back
    fn give_up(&self, source_url: &str, err: FetchError) -> FetchError {
        let store = self.resolution.status_store();
        store.update_status(source_url, StatusLevel::Error, err.to_string());
        let retries = store.increment_retry(source_url);
        warn!(
            "{} is still unhealthy, giving up: {} (retry count {})",
            UrlUtils::obfuscate_credentials(source_url),
            err,
            retries
        );
        err
    }

    /// One fetch of `stream_url`, returning the manifest body to serve
    async fn attempt(
        &self,
        request: &ManifestRequest,
        stream_url: &str,
        strategy: &str,
    ) -> FetchResult<String> {
        let mut url = Url::parse(stream_url).map_err(|e| FetchError::InvalidUrl {
            url: UrlUtils::obfuscate_credentials(stream_url),
            message: e.to_string(),
        })?;
        UrlUtils::append_forwarded_query(&mut url, &request.forwarded_query);

        // A missing plugin only means no decoration and no health check
        let plugin: Option<Arc<dyn Resolver>> = self.resolution.registry().get(strategy).ok();
        let live_info = self.resolution.cache().load(&request.source_url);

        let mut outbound = self.http.manifest_request(url, self.device);
        if let (Some(transformer), Some(live_info)) = (
            plugin.as_deref().and_then(|p| p.as_transformer()),
            live_info.as_ref(),
        ) {
            transformer.decorate(&mut outbound, live_info);
        }

        let response = self.http.execute(outbound, request.proxy()).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let within_limit = response
            .content_length()
            .map_or(true, |len| len < self.max_manifest_size);

        let body = if within_limit && playlist::is_playlist_content_type(&content_type) {
            self.read_capped(response).await?
        } else {
            None
        };

        match body {
            Some(body) if playlist::is_valid_m3u(&body) => {
                self.health_check(plugin.as_deref(), &body, live_info.as_ref())?;
                Ok(body)
            }
            _ => Ok(self.not_live_fallback(&request.source_url, stream_url).await),
        }
    }

    /// Read the body up to the size ceiling; `None` when it is larger
    async fn read_capped(&self, mut response: reqwest::Response) -> FetchResult<Option<String>> {
        let mut buffer: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if (buffer.len() + chunk.len()) as u64 >= self.max_manifest_size {
                debug!(
                    "Manifest exceeds {} bytes, not treating it as a playlist",
                    self.max_manifest_size
                );
                return Ok(None);
            }
            buffer.extend_from_slice(&chunk);
        }
        Ok(Some(String::from_utf8_lossy(&buffer).trim().to_string()))
    }

    fn health_check(
        &self,
        plugin: Option<&dyn Resolver>,
        body: &str,
        live_info: Option<&LiveInfo>,
    ) -> FetchResult<()> {
        match plugin.and_then(|p| p.as_health_check()) {
            Some(checker) => checker
                .check(body, live_info)
                .map_err(|e| FetchError::health_check(e.to_string())),
            None => Ok(()),
        }
    }

    /// Synthetic VOD playlist for a source that is not a live stream
    async fn not_live_fallback(&self, source_url: &str, stream_url: &str) -> String {
        let display_url = UrlUtils::obfuscate_credentials(source_url);
        self.resolution
            .status_store()
            .update_status(source_url, StatusLevel::Warning, NOT_LIVE_MESSAGE);

        let duration = match self.prober.probe_duration(source_url).await {
            Ok(duration) => {
                debug!("{} duration is {}s", display_url, duration);
                Some(duration)
            }
            Err(e) => {
                debug!("Failed to get duration of {}: {}", display_url, e);
                None
            }
        };

        playlist::fallback_playlist(duration, stream_url)
    }
}
