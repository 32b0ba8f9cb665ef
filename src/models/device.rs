use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Client fingerprint presented on outbound fetches
///
/// Each profile selects a user agent and a set of common request headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceProfile {
    #[default]
    Chrome,
    Safari,
    Firefox,
    Iphone,
    Ipad,
    Android,
}

impl DeviceProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceProfile::Chrome => "chrome",
            DeviceProfile::Safari => "safari",
            DeviceProfile::Firefox => "firefox",
            DeviceProfile::Iphone => "iphone",
            DeviceProfile::Ipad => "ipad",
            DeviceProfile::Android => "android",
        }
    }

    /// Parse a profile name, falling back to Chrome for unknown or empty names
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }

    pub fn user_agent(&self) -> &'static str {
        match self {
            DeviceProfile::Chrome => "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
            DeviceProfile::Safari => "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.3 Safari/605.1.15",
            DeviceProfile::Firefox => "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:123.0) Gecko/20100101 Firefox/123.0",
            DeviceProfile::Iphone => "Mozilla/5.0 (iPhone; CPU iPhone OS 14_0 like Mac OS X) AppleWebKit/603.1.30 (KHTML, like Gecko) Version/12.0.0 Mobile/15A5370a Safari/602.1",
            DeviceProfile::Ipad => "Mozilla/5.0 (iPad; CPU iPhone OS 14_3 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0.2 Mobile/15E148 Safari/604.1",
            DeviceProfile::Android => "Mozilla/5.0 (Linux; Android 8.0.0; SM-G955U Build/R16NW) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Mobile Safari/537.36",
        }
    }

    /// Headers sent alongside the user agent
    pub fn common_headers(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            DeviceProfile::Chrome | DeviceProfile::Safari | DeviceProfile::Firefox => &[
                ("accept", "*/*"),
                ("accept-language", "en-US,en;q=0.9"),
            ],
            DeviceProfile::Iphone | DeviceProfile::Ipad => &[
                ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
                ("sec-fetch-site", "same-origin"),
                ("sec-fetch-dest", "document"),
                ("accept-language", "zh-CN,zh-Hans;q=0.9"),
                ("sec-fetch-mode", "navigate"),
            ],
            DeviceProfile::Android => &[
                ("pragma", "no-cache"),
                ("cache-control", "no-cache"),
                ("sec-ch-ua", "\"Not/A)Brand\";v=\"8\", \"Chromium\";v=\"126\", \"Google Chrome\";v=\"126\""),
                ("sec-ch-ua-mobile", "?1"),
                ("sec-ch-ua-platform", "\"Android\""),
                ("upgrade-insecure-requests", "1"),
                ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7"),
                ("sec-fetch-site", "same-origin"),
                ("sec-fetch-mode", "navigate"),
                ("sec-fetch-user", "?1"),
                ("sec-fetch-dest", "document"),
                ("accept-language", "zh-CN,zh;q=0.9,en;q=0.8,zh-TW;q=0.7,it;q=0.6"),
            ],
        }
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chrome" => Ok(DeviceProfile::Chrome),
            "safari" => Ok(DeviceProfile::Safari),
            "firefox" => Ok(DeviceProfile::Firefox),
            "iphone" => Ok(DeviceProfile::Iphone),
            "ipad" => Ok(DeviceProfile::Ipad),
            "android" => Ok(DeviceProfile::Android),
            other => Err(format!("Unknown device profile: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_profiles() {
        assert_eq!("iPhone".parse::<DeviceProfile>(), Ok(DeviceProfile::Iphone));
        assert_eq!(" android ".parse::<DeviceProfile>(), Ok(DeviceProfile::Android));
        assert!("netscape".parse::<DeviceProfile>().is_err());
    }

    #[test]
    fn test_unknown_falls_back_to_chrome() {
        assert_eq!(DeviceProfile::from_name_or_default(""), DeviceProfile::Chrome);
        assert_eq!(DeviceProfile::from_name_or_default("lynx"), DeviceProfile::Chrome);
        assert_eq!(DeviceProfile::from_name_or_default("ipad"), DeviceProfile::Ipad);
    }

    #[test]
    fn test_mobile_profiles_carry_mobile_agent() {
        assert!(DeviceProfile::Iphone.user_agent().contains("iPhone"));
        assert!(DeviceProfile::Android.user_agent().contains("Android"));
        assert!(DeviceProfile::Android
            .common_headers()
            .iter()
            .any(|(name, _)| *name == "sec-ch-ua-platform"));
    }
}
