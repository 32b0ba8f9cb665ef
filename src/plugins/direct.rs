use async_trait::async_trait;
use url::Url;

use super::Resolver;
use crate::errors::{PluginError, PluginResult};
use crate::models::LiveInfo;

/// Resolver for sources that already are playable manifests
///
/// Accepts any absolute http(s) URL and hands it back unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectResolver;

#[async_trait]
impl Resolver for DirectResolver {
    fn name(&self) -> &str {
        "direct"
    }

    async fn resolve(
        &self,
        source_url: &str,
        _proxy: Option<&str>,
        _extra_info: &str,
    ) -> PluginResult<LiveInfo> {
        let url = Url::parse(source_url)
            .map_err(|e| PluginError::InvalidSource(format!("{source_url}: {e}")))?;

        match url.scheme() {
            "http" | "https" => Ok(LiveInfo::new(url.as_str())),
            other => Err(PluginError::InvalidSource(format!(
                "unsupported scheme '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_source_passes_through() {
        let info = DirectResolver
            .resolve("https://cdn.example.com/live/index.m3u8", None, "")
            .await
            .unwrap();
        assert_eq!(info.live_url, "https://cdn.example.com/live/index.m3u8");
        assert!(info.extra_info.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_non_http_sources() {
        assert!(matches!(
            DirectResolver.resolve("rtmp://example.com/live", None, "").await,
            Err(PluginError::InvalidSource(_))
        ));
        assert!(matches!(
            DirectResolver.resolve("not a url", None, "").await,
            Err(PluginError::InvalidSource(_))
        ));
    }
}
