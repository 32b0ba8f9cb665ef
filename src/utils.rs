//! Utility modules shared by the resolution and manifest services
//!
//! - `url` for credential obfuscation and query forwarding
//! - `http_client_factory` for proxy aware outbound HTTP clients
//! - `playlist` for manifest validation and synthetic fallback playlists

pub mod http_client_factory;
pub mod playlist;
pub mod url;

pub use http_client_factory::HttpClientFactory;
pub use url::UrlUtils;
