//! Centralized error handling for the live resolver
//!
//! # Error Categories
//!
//! - **Resolution Errors**: unknown strategy, cooldown rejection, resolver failures
//! - **Fetch Errors**: transport, upstream status and health check failures
//! - **Plugin Errors**: failures reported by resolution plugins
//! - **Probe Errors**: duration probing failures, always absorbed by the fallback path
//!
//! Invalid manifests never surface as errors; they degrade to a synthetic
//! playlist inside the manifest service.

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for resolution Results
pub type ResolutionResult<T> = Result<T, ResolutionError>;

/// Convenience type alias for manifest fetch Results
pub type FetchResult<T> = Result<T, FetchError>;

/// Convenience type alias for plugin Results
pub type PluginResult<T> = Result<T, PluginError>;

/// Convenience type alias for probe Results
pub type ProbeResult<T> = Result<T, ProbeError>;
