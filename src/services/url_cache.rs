use dashmap::DashMap;

use crate::models::LiveInfo;

/// Last known good resolution per channel source URL
///
/// Entries have no TTL and are only replaced by a newer successful
/// resolution; a failed re-resolution never evicts.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: DashMap<String, LiveInfo>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, key: &str) -> Option<LiveInfo> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn store(&self, key: &str, live_info: LiveInfo) {
        self.entries.insert(key.to_string(), live_info);
    }

    /// Opaque plugin state of the cached entry, or empty
    pub fn extra_info(&self, key: &str) -> String {
        self.entries
            .get(key)
            .map(|entry| entry.extra_info.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_replaces_entry() {
        let cache = ResolutionCache::new();
        let key = "https://www.youtube.com/@news/live";
        assert!(cache.load(key).is_none());
        assert_eq!(cache.extra_info(key), "");

        cache.store(key, LiveInfo::new("https://a.example.com/1.m3u8").with_extra_info("v1"));
        cache.store(key, LiveInfo::new("https://a.example.com/2.m3u8").with_extra_info("v2"));

        let cached = cache.load(key).unwrap();
        assert_eq!(cached.live_url, "https://a.example.com/2.m3u8");
        assert_eq!(cache.extra_info(key), "v2");
        assert_eq!(cache.len(), 1);
    }
}
