//! Resolution plugins
//!
//! A plugin turns a channel source URL into a directly fetchable manifest
//! URL. Only [`Resolver::resolve`] is mandatory; plugins opt into the
//! optional capabilities by overriding the matching `as_*` accessor:
//!
//! - [`Transformer`] decorates outbound manifest requests
//! - [`HealthCheck`] validates manifest bodies beyond the `#EXTM3U` check
//! - [`ChannelProvider`] exposes resolvable sub-channels

use async_trait::async_trait;

use crate::errors::PluginResult;
use crate::models::{LiveInfo, SubChannel};

pub mod direct;
pub mod registry;

pub use direct::DirectResolver;
pub use registry::{PluginInfo, ResolverRegistry};

/// Resolution plugin trait
///
/// Implementations must be cheap to share: the registry hands out
/// `Arc<dyn Resolver>` and many requests call into the same instance
/// concurrently.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Strategy name this plugin is registered under (e.g. "youtube")
    fn name(&self) -> &str;

    /// Resolve `source_url` to a live manifest URL
    ///
    /// `extra_info` is whatever the previous successful resolution of the
    /// same source stored in [`LiveInfo::extra_info`], or empty.
    async fn resolve(
        &self,
        source_url: &str,
        proxy: Option<&str>,
        extra_info: &str,
    ) -> PluginResult<LiveInfo>;

    fn as_transformer(&self) -> Option<&dyn Transformer> {
        None
    }

    fn as_health_check(&self) -> Option<&dyn HealthCheck> {
        None
    }

    fn as_channel_provider(&self) -> Option<&dyn ChannelProvider> {
        None
    }
}

/// Decorates the outbound manifest request, e.g. with signed headers
pub trait Transformer: Send + Sync {
    fn decorate(&self, request: &mut reqwest::Request, live_info: &LiveInfo);
}

/// Plugin specific validation of a manifest body
pub trait HealthCheck: Send + Sync {
    /// Return an error to send the manifest through the reparse path
    fn check(&self, body: &str, live_info: Option<&LiveInfo>) -> PluginResult<()>;
}

/// Plugins whose sources expose several resolvable feeds
#[async_trait]
pub trait ChannelProvider: Send + Sync {
    async fn sub_channels(
        &self,
        source_url: &str,
        proxy: Option<&str>,
    ) -> PluginResult<Vec<SubChannel>>;
}
