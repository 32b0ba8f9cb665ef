/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
use std::time::Duration;

// Resolver defaults
/// Strategy used when a channel record carries no strategy name
pub const DEFAULT_PARSER: &str = "youtube";
pub const DEFAULT_MAX_RETRY_COUNT: u32 = 3;
pub const DEFAULT_COOLDOWN_UNIT: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_COOLDOWN: Duration = Duration::from_secs(120);
pub const DEFAULT_MAX_COOLDOWN_MULTIPLIER: u32 = 1024;
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(30);

// Fetch defaults
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_MANIFEST_SIZE: u64 = 10 * 1024 * 1024; // 10MiB
pub const DEFAULT_DEVICE: &str = "chrome";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

// Probe defaults
pub const DEFAULT_FFPROBE_COMMAND: &str = "ffprobe";
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(15);
