//! Error type definitions for the live resolver
//!
//! This module defines all error types used throughout the crate, following a
//! small hierarchy: resolution failures, manifest fetch failures and duration
//! probe failures, all convertible into the top-level [`AppError`].

use std::time::Duration;
use thiserror::Error;

/// Top-level application error type
///
/// Every layer specific error converts into this enum, which is what the
/// binary and any embedding request handler ultimately deal with.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resolution pipeline errors
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Manifest fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Duration probe errors
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Errors raised while turning a channel source URL into a live URL
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// No resolver is registered under the requested strategy name
    #[error("Resolver not found: {strategy}")]
    NotFound { strategy: String },

    /// The channel failed recently and its backoff window has not elapsed
    #[error("Parser cooling down for {source_url} ({remaining:?} remaining)")]
    CoolingDown {
        source_url: String,
        remaining: Duration,
    },

    /// The resolver itself reported a failure
    #[error("Resolver '{strategy}' failed: {message}")]
    Plugin { strategy: String, message: String },

    /// The resolver did not answer within the configured timeout
    #[error("Resolver '{strategy}' timed out after {timeout:?}")]
    Timeout { strategy: String, timeout: Duration },
}

/// Errors raised while fetching and validating a manifest
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The stream URL could not be turned into a request
    #[error("Invalid stream URL: {url} - {message}")]
    InvalidUrl { url: String, message: String },

    /// Network level failure (connect, timeout, body read)
    #[error("Transport failure: {message}")]
    Transport { message: String },

    /// Upstream answered with a non-success status
    #[error("Server response: HTTP {status}")]
    Status { status: u16 },

    /// Resolver health check declared the manifest unhealthy
    #[error("Health check failed: {message}")]
    HealthCheck { message: String },

    /// Reparse during a retry failed to resolve
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// Errors reported by resolution plugins
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// The source exists but is not broadcasting right now
    #[error("This channel is not currently live")]
    NotLive,

    /// The source URL is not something this plugin understands
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// Upstream API or page could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered but the response could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Health check rejected a manifest
    #[error("Unhealthy manifest: {0}")]
    Unhealthy(String),
}

/// Errors raised by the duration prober
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The probe did not finish in time
    #[error("Probe timeout after {timeout:?}: {url}")]
    Timeout { url: String, timeout: Duration },

    /// The probe command could not be started
    #[error("Failed to execute {command}: {message}")]
    Execution { command: String, message: String },

    /// The probe ran but produced no usable duration
    #[error("Unusable probe output: {message}")]
    Output { message: String },
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl ResolutionError {
    /// Create a plugin failure error
    pub fn plugin<S: Into<String>, M: Into<String>>(strategy: S, message: M) -> Self {
        Self::Plugin {
            strategy: strategy.into(),
            message: message.into(),
        }
    }

    /// Wrap a plugin failure for the named strategy
    pub fn from_plugin(strategy: &str, err: PluginError) -> Self {
        Self::plugin(strategy, err.to_string())
    }

    /// Whether this error is the passive backoff rejection
    pub fn is_cooling_down(&self) -> bool {
        matches!(self, Self::CoolingDown { .. })
    }
}

impl FetchError {
    /// Create a transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a health check error
    pub fn health_check<S: Into<String>>(message: S) -> Self {
        Self::HealthCheck {
            message: message.into(),
        }
    }

    /// Whether a reparse may fix this failure
    ///
    /// Transport, status and health check failures are bounded-retry errors;
    /// a failed reparse is terminal.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Resolution(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::Status {
                status: status.as_u16(),
            };
        }
        // reqwest errors embed the request URL, which may carry credentials
        let message = crate::utils::url::UrlUtils::obfuscate_credentials(&err.to_string());
        Self::Transport { message }
    }
}
