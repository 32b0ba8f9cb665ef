use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::ProbeConfig;
use crate::errors::{ProbeError, ProbeResult};
use crate::utils::UrlUtils;

/// Measures the playable duration of a media URL
///
/// Used by the manifest service to build a VOD playlist when a source turns
/// out not to be a live stream.
#[async_trait]
pub trait DurationProber: Send + Sync {
    /// Duration in seconds; zero means unknown
    async fn probe_duration(&self, url: &str) -> ProbeResult<f64>;
}

/// ffprobe backed [`DurationProber`]
#[derive(Debug, Clone)]
pub struct FfprobeDurationProber {
    ffprobe_command: String,
    probe_timeout: Duration,
}

impl FfprobeDurationProber {
    pub fn new(ffprobe_command: impl Into<String>, probe_timeout: Duration) -> Self {
        Self {
            ffprobe_command: ffprobe_command.into(),
            probe_timeout,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(&config.ffprobe_command, config.probe_timeout)
    }

    /// Extract `format.duration` from ffprobe JSON output
    fn parse_duration(stdout: &str) -> ProbeResult<f64> {
        let data: serde_json::Value = serde_json::from_str(stdout).map_err(|e| ProbeError::Output {
            message: format!("Failed to parse ffprobe output: {e}"),
        })?;

        if let Some(error) = data.get("error") {
            let message = error
                .get("string")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown ffprobe error");
            return Err(ProbeError::Output {
                message: message.to_string(),
            });
        }

        // ffprobe prints durations as strings, but accept plain numbers too
        let duration = data
            .get("format")
            .and_then(|f| f.get("duration"))
            .and_then(|v| {
                v.as_str()
                    .and_then(|s| s.parse::<f64>().ok())
                    .or_else(|| v.as_f64())
            })
            .ok_or_else(|| ProbeError::Output {
                message: "No format.duration in ffprobe output".to_string(),
            })?;

        Ok(duration)
    }
}

#[async_trait]
impl DurationProber for FfprobeDurationProber {
    async fn probe_duration(&self, url: &str) -> ProbeResult<f64> {
        let display_url = UrlUtils::obfuscate_credentials(url);
        debug!("Probing duration of {}", display_url);

        let mut cmd = Command::new(&self.ffprobe_command);
        cmd.args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_error",
            "-show_entries", "format=duration",
            url,
        ]);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let output = tokio::time::timeout(self.probe_timeout, cmd.output())
            .await
            .map_err(|_| ProbeError::Timeout {
                url: display_url.clone(),
                timeout: self.probe_timeout,
            })?
            .map_err(|e| ProbeError::Execution {
                command: self.ffprobe_command.clone(),
                message: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                "ffprobe produced no output for {} (exit code {:?})",
                display_url,
                output.status.code()
            );
            return Err(ProbeError::Output {
                message: stderr.trim().to_string(),
            });
        }

        let duration = Self::parse_duration(&stdout)?;
        debug!("Duration of {} is {}s", display_url, duration);
        Ok(duration)
    }
}
