//! Service layer
//!
//! - [`ResolutionService`]: cache, cooldown and plugin dispatch
//! - [`ManifestService`]: manifest fetch, validation and reparse-retry
//! - [`StatusStore`] and [`ResolutionCache`]: shared per-channel state
//! - [`DurationProber`]: duration lookup for the non-live fallback

pub mod manifest;
pub mod resolution;
pub mod status_store;
pub mod stream_prober;
pub mod url_cache;

pub use manifest::{ManifestRequest, ManifestResponse, ManifestService};
pub use resolution::ResolutionService;
pub use status_store::StatusStore;
pub use stream_prober::{DurationProber, FfprobeDurationProber};
pub use url_cache::ResolutionCache;
