#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use live_resolver::config::Config;
use live_resolver::errors::{PluginError, PluginResult, ProbeError, ProbeResult};
use live_resolver::models::LiveInfo;
use live_resolver::plugins::{HealthCheck, Resolver, ResolverRegistry, Transformer};
use live_resolver::services::{DurationProber, ManifestService, ResolutionService};
use live_resolver::utils::HttpClientFactory;
use reqwest::header::{HeaderName, HeaderValue};
use tokio::net::TcpListener;
use url::Url;

// ============================================================================
// Test server infrastructure
// ============================================================================

pub struct TestServer {
    base_url: Url,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn new(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let server = axum::serve(listener, router).with_graceful_shutdown(async {
            shutdown_rx.await.ok();
        });

        tokio::spawn(async move {
            server.await.unwrap();
        });

        Self {
            base_url: Url::parse(&format!("http://{}", addr)).unwrap(),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        self.base_url.join(path).unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}

// ============================================================================
// Scripted resolver
// ============================================================================

/// Resolver that replays a fixed script of outcomes, repeating the last one
pub struct ScriptedResolver {
    name: String,
    script: Mutex<VecDeque<PluginResult<String>>>,
    last: Mutex<Option<PluginResult<String>>>,
    calls: AtomicUsize,
    header: Option<(&'static str, String)>,
    reject_marker: Option<String>,
}

impl ScriptedResolver {
    pub fn new(name: &str, script: Vec<PluginResult<String>>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            header: None,
            reject_marker: None,
        }
    }

    /// Always resolves to `url`
    pub fn fixed(name: &str, url: &str) -> Self {
        Self::new(name, vec![Ok(url.to_string())])
    }

    /// Always fails as not live
    pub fn failing(name: &str) -> Self {
        Self::new(name, vec![Err(PluginError::NotLive)])
    }

    /// Decorate manifest requests with a header
    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.header = Some((name, value.to_string()));
        self
    }

    /// Fail health checks for manifests containing `marker`
    pub fn with_health_check(mut self, marker: &str) -> Self {
        self.reject_marker = Some(marker.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> PluginResult<String> {
        let mut last = self.last.lock().unwrap();
        if let Some(outcome) = self.script.lock().unwrap().pop_front() {
            *last = Some(outcome);
        }
        last.clone().unwrap_or(Err(PluginError::NotLive))
    }
}

#[async_trait]
impl Resolver for ScriptedResolver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(
        &self,
        _source_url: &str,
        _proxy: Option<&str>,
        extra_info: &str,
    ) -> PluginResult<LiveInfo> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let url = self.next_outcome()?;
        Ok(LiveInfo::new(url).with_extra_info(format!("{extra_info}#{call}")))
    }

    fn as_transformer(&self) -> Option<&dyn Transformer> {
        self.header.as_ref().map(|_| self as &dyn Transformer)
    }

    fn as_health_check(&self) -> Option<&dyn HealthCheck> {
        self.reject_marker.as_ref().map(|_| self as &dyn HealthCheck)
    }
}

impl Transformer for ScriptedResolver {
    fn decorate(&self, request: &mut reqwest::Request, _live_info: &LiveInfo) {
        if let Some((name, value)) = &self.header {
            request.headers_mut().insert(
                HeaderName::from_static(*name),
                HeaderValue::from_str(value).unwrap(),
            );
        }
    }
}

impl HealthCheck for ScriptedResolver {
    fn check(&self, body: &str, _live_info: Option<&LiveInfo>) -> PluginResult<()> {
        match &self.reject_marker {
            Some(marker) if body.contains(marker.as_str()) => {
                Err(PluginError::Unhealthy(format!("found {marker}")))
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Duration prober
// ============================================================================

/// Prober with a canned answer that records what it was asked
pub struct StaticProber {
    duration: Option<f64>,
    probed: Mutex<Vec<String>>,
}

impl StaticProber {
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            duration,
            probed: Mutex::new(Vec::new()),
        }
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl DurationProber for StaticProber {
    async fn probe_duration(&self, url: &str) -> ProbeResult<f64> {
        self.probed.lock().unwrap().push(url.to_string());
        self.duration.ok_or_else(|| ProbeError::Output {
            message: "no duration".to_string(),
        })
    }
}

// ============================================================================
// Service wiring
// ============================================================================

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.fetch.request_timeout = Duration::from_secs(5);
    config.fetch.connect_timeout = Duration::from_secs(2);
    config.resolver.resolve_timeout = Duration::from_secs(5);
    config
}

pub fn resolution_service(resolver: Arc<dyn Resolver>, config: &Config) -> Arc<ResolutionService> {
    let mut registry = ResolverRegistry::with_builtins();
    registry.register(resolver);
    Arc::new(ResolutionService::new(
        Arc::new(registry),
        config.resolver.clone(),
    ))
}

pub fn manifest_service(
    resolution: &Arc<ResolutionService>,
    prober: Arc<dyn DurationProber>,
    config: &Config,
) -> ManifestService {
    ManifestService::new(
        Arc::clone(resolution),
        Arc::new(HttpClientFactory::new(&config.fetch)),
        prober,
        &config.fetch,
    )
}
