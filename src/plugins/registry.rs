use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{DirectResolver, Resolver};
use crate::errors::{ResolutionError, ResolutionResult};

/// Registered plugin as shown in plugin listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub provides_sub_channels: bool,
}

/// Lookup from strategy name to resolution plugin
///
/// Registration happens once during startup through `&mut self`; after that
/// the registry is shared read-only, so lookups need no locking.
#[derive(Default, Clone)]
pub struct ResolverRegistry {
    resolvers: HashMap<String, Arc<dyn Resolver>>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in resolvers
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DirectResolver));
        registry
    }

    /// Register a resolver under its own name
    pub fn register(&mut self, resolver: Arc<dyn Resolver>) {
        let name = resolver.name().to_string();
        self.register_as(name, resolver);
    }

    /// Register a resolver under an explicit strategy name
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn register_as(&mut self, name: impl Into<String>, resolver: Arc<dyn Resolver>) {
        let name = name.into();
        if self.resolvers.insert(name.clone(), resolver).is_some() {
            warn!("Replacing previously registered resolver '{}'", name);
        } else {
            debug!("Registered resolver '{}'", name);
        }
    }

    pub fn get(&self, name: &str) -> ResolutionResult<Arc<dyn Resolver>> {
        self.resolvers
            .get(name)
            .cloned()
            .ok_or_else(|| ResolutionError::NotFound {
                strategy: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }

    /// Route `name` to the direct resolver when nothing is registered under it
    ///
    /// Returns `true` when the fallback was installed.
    pub fn ensure_strategy(&mut self, name: &str) -> bool {
        if name.trim().is_empty() || self.contains(name) {
            return false;
        }
        self.register_as(name, Arc::new(DirectResolver));
        true
    }

    /// Whether the named plugin exposes sub-channels
    ///
    /// Unknown names report `false`.
    pub fn provides_sub_channels(&self, name: &str) -> bool {
        self.resolvers
            .get(name)
            .is_some_and(|resolver| resolver.as_channel_provider().is_some())
    }

    /// All registered plugins, sorted by name
    pub fn list(&self) -> Vec<PluginInfo> {
        let mut plugins: Vec<PluginInfo> = self
            .resolvers
            .iter()
            .map(|(name, resolver)| PluginInfo {
                name: name.clone(),
                provides_sub_channels: resolver.as_channel_provider().is_some(),
            })
            .collect();
        plugins.sort_by(|a, b| a.name.cmp(&b.name));
        plugins
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PluginResult;
    use crate::models::{LiveInfo, SubChannel};
    use crate::plugins::ChannelProvider;
    use async_trait::async_trait;

    struct MultiFeed;

    #[async_trait]
    impl Resolver for MultiFeed {
        fn name(&self) -> &str {
            "multifeed"
        }

        async fn resolve(
            &self,
            source_url: &str,
            _proxy: Option<&str>,
            _extra_info: &str,
        ) -> PluginResult<LiveInfo> {
            Ok(LiveInfo::new(format!("{source_url}/main.m3u8")))
        }

        fn as_channel_provider(&self) -> Option<&dyn ChannelProvider> {
            Some(self)
        }
    }

    #[async_trait]
    impl ChannelProvider for MultiFeed {
        async fn sub_channels(
            &self,
            source_url: &str,
            _proxy: Option<&str>,
        ) -> PluginResult<Vec<SubChannel>> {
            Ok(vec![SubChannel {
                name: "backup".to_string(),
                url: format!("{source_url}#backup"),
            }])
        }
    }

    #[test]
    fn test_unknown_strategy_is_not_found() {
        let registry = ResolverRegistry::with_builtins();
        let err = registry.get("doesnotexist").err().unwrap();
        assert_eq!(
            err,
            ResolutionError::NotFound {
                strategy: "doesnotexist".to_string()
            }
        );
    }

    #[test]
    fn test_list_is_sorted_with_capabilities() {
        let mut registry = ResolverRegistry::with_builtins();
        registry.register(Arc::new(MultiFeed));
        registry.register_as("alias", Arc::new(DirectResolver));

        let names: Vec<String> = registry.list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["alias", "direct", "multifeed"]);

        assert!(registry.provides_sub_channels("multifeed"));
        assert!(!registry.provides_sub_channels("direct"));
        assert!(!registry.provides_sub_channels("missing"));
    }

    #[tokio::test]
    async fn test_missing_default_strategy_falls_back_to_direct() {
        let mut registry = ResolverRegistry::with_builtins();
        assert!(!registry.contains("youtube"));

        assert!(registry.ensure_strategy("youtube"));
        assert!(registry.contains("youtube"));
        assert!(!registry.ensure_strategy("youtube"));
        assert!(!registry.ensure_strategy("direct"));
        assert!(!registry.ensure_strategy(""));

        let live = registry
            .get("youtube")
            .unwrap()
            .resolve("https://cdn.example.com/live.m3u8", None, "")
            .await
            .unwrap();
        assert_eq!(live.live_url, "https://cdn.example.com/live.m3u8");
    }

    #[test]
    fn test_registered_strategy_is_kept() {
        let mut registry = ResolverRegistry::new();
        registry.register(Arc::new(MultiFeed));

        assert!(!registry.ensure_strategy("multifeed"));
        assert!(registry.provides_sub_channels("multifeed"));
    }

    #[tokio::test]
    async fn test_channel_provider_is_reachable_through_registry() {
        let mut registry = ResolverRegistry::new();
        registry.register(Arc::new(MultiFeed));

        let resolver = registry.get("multifeed").unwrap();
        let provider = resolver.as_channel_provider().unwrap();
        let subs = provider
            .sub_channels("https://example.com/tv", None)
            .await
            .unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].url, "https://example.com/tv#backup");
    }
}
