//! HTTP Client Factory
//!
//! Centralizes creation of the outbound HTTP clients used for manifest
//! fetches. Clients are built once per proxy hint and reused, so connection
//! pools survive across requests for the same upstream route.

use dashmap::DashMap;
use reqwest::header::{HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, Proxy, Request, Response};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::FetchConfig;
use crate::errors::{FetchError, FetchResult};
use crate::models::DeviceProfile;
use crate::utils::UrlUtils;

/// Cache key for clients that dial directly
const DIRECT_KEY: &str = "";

/// Factory for proxy aware HTTP clients
#[derive(Debug)]
pub struct HttpClientFactory {
    request_timeout: Duration,
    connect_timeout: Duration,
    user_agent: String,
    clients: DashMap<String, Client>,
}

impl HttpClientFactory {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            request_timeout: config.request_timeout,
            connect_timeout: config.connect_timeout,
            user_agent: config.user_agent.clone(),
            clients: DashMap::new(),
        }
    }

    /// Client for the given proxy hint, building it on first use
    ///
    /// `None` or an empty hint dials directly. A hint that cannot be turned
    /// into a proxy also dials directly.
    pub fn client_for(&self, proxy: Option<&str>) -> FetchResult<Client> {
        let key = proxy.map(str::trim).unwrap_or(DIRECT_KEY);

        if let Some(client) = self.clients.get(key) {
            return Ok(client.value().clone());
        }

        let client = self.build_client(key)?;
        // A concurrent builder may have won the race; either client is fine
        Ok(self
            .clients
            .entry(key.to_string())
            .or_insert(client)
            .value()
            .clone())
    }

    fn build_client(&self, proxy: &str) -> FetchResult<Client> {
        let builder = Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str());

        let builder = if proxy.is_empty() {
            debug!("Creating direct HTTP client");
            builder.no_proxy()
        } else {
            match Proxy::all(proxy) {
                Ok(p) => {
                    debug!(
                        "Creating HTTP client via proxy {}",
                        UrlUtils::obfuscate_credentials(proxy)
                    );
                    builder.proxy(p)
                }
                Err(e) => {
                    warn!(
                        "Invalid proxy '{}': {}. Falling back to direct connection.",
                        UrlUtils::obfuscate_credentials(proxy),
                        e
                    );
                    builder.no_proxy()
                }
            }
        };

        builder
            .build()
            .map_err(|e| FetchError::transport(format!("Failed to create HTTP client: {e}")))
    }

    /// GET request for `url` carrying the device profile's fingerprint headers
    pub fn manifest_request(&self, url: Url, device: DeviceProfile) -> Request {
        let mut request = Request::new(Method::GET, url);
        let headers = request.headers_mut();
        headers.insert(USER_AGENT, HeaderValue::from_static(device.user_agent()));
        for &(name, value) in device.common_headers() {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        request
    }

    /// Execute `request` through the client for `proxy`
    pub async fn execute(&self, request: Request, proxy: Option<&str>) -> FetchResult<Response> {
        let client = self.client_for(proxy)?;
        client.execute(request).await.map_err(FetchError::from)
    }

    /// Number of distinct clients built so far
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> HttpClientFactory {
        HttpClientFactory::new(&FetchConfig::default())
    }

    #[test]
    fn test_clients_are_cached_per_proxy() {
        let factory = factory();
        factory.client_for(None).unwrap();
        factory.client_for(Some("")).unwrap();
        assert_eq!(factory.client_count(), 1);

        factory.client_for(Some("socks5://127.0.0.1:1080")).unwrap();
        factory.client_for(Some("http://127.0.0.1:3128")).unwrap();
        factory.client_for(Some("http://127.0.0.1:3128")).unwrap();
        assert_eq!(factory.client_count(), 3);
    }

    #[test]
    fn test_invalid_proxy_falls_back_to_direct() {
        let factory = factory();
        assert!(factory.client_for(Some("::not a proxy::")).is_ok());
    }

    #[test]
    fn test_manifest_request_uses_device_profile() {
        let factory = factory();
        let url = Url::parse("https://cdn.example.com/live.m3u8").unwrap();

        let request = factory.manifest_request(url, DeviceProfile::Iphone);
        assert_eq!(request.method(), &Method::GET);
        let agent = request.headers().get(USER_AGENT).unwrap().to_str().unwrap();
        assert!(agent.contains("iPhone"));
        assert_eq!(
            request.headers().get("sec-fetch-mode").unwrap(),
            "navigate"
        );
    }
}
