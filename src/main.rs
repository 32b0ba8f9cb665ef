use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Use the library instead of redeclaring modules
use live_resolver::{
    config::Config,
    models::{ChannelConfig, DeviceProfile},
    plugins::ResolverRegistry,
    services::{FfprobeDurationProber, ManifestRequest, ManifestService, ResolutionService},
    utils::{HttpClientFactory, UrlUtils},
};

#[derive(Parser)]
#[command(name = "live-resolver")]
#[command(version)]
#[command(about = "Resolve a live channel and print its current manifest")]
#[command(long_about = None)]
struct Cli {
    /// Channel source URL
    #[arg(short, long, value_name = "URL")]
    url: String,

    /// Resolution strategy (defaults to resolver.default_parser)
    #[arg(short = 'P', long, default_value = "")]
    parser: String,

    /// Forward proxy for resolution and manifest fetches (http, https or socks5)
    #[arg(short = 'x', long, value_name = "URL")]
    proxy: Option<String>,

    /// Device profile for manifest fetches (overrides config file)
    #[arg(short, long)]
    device: Option<DeviceProfile>,

    /// Configuration file path (defaults to $CONFIG_FILE, then config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the manifest
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("live_resolver={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting live-resolver v{}", env!("CARGO_PKG_VERSION"));

    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_from_file(&config_path)?;
    info!("Configuration loaded from: {}", config_path);

    if let Some(device) = cli.device {
        config.fetch.default_device = device.to_string();
    }

    let mut registry = ResolverRegistry::with_builtins();
    if registry.ensure_strategy(&config.resolver.default_parser) {
        warn!(
            "No resolver registered for default parser '{}', treating sources as direct stream URLs",
            config.resolver.default_parser
        );
    }
    let registry = Arc::new(registry);
    let plugins: Vec<String> = registry.list().into_iter().map(|p| p.name).collect();
    info!("Registered resolvers: {}", plugins.join(", "));

    let resolution = Arc::new(ResolutionService::new(registry, config.resolver.clone()));
    let manifests = ManifestService::new(
        Arc::clone(&resolution),
        Arc::new(HttpClientFactory::new(&config.fetch)),
        Arc::new(FfprobeDurationProber::from_config(&config.probe)),
        &config.fetch,
    );

    let mut channel = ChannelConfig::new("cli", cli.url.as_str(), cli.parser.as_str());
    if let Some(proxy) = cli.proxy {
        channel = channel.with_proxy(proxy);
    }

    let live_info = resolution
        .resolve(&channel.url, channel.proxy(), &channel.parser)
        .await?;
    info!(
        "Resolved {} to {}",
        UrlUtils::obfuscate_credentials(&channel.url),
        UrlUtils::obfuscate_credentials(&live_info.live_url)
    );

    let request = ManifestRequest::new(&channel.url, &live_info.live_url, &channel.parser)
        .with_proxy(channel.proxy_url.clone());
    let result = manifests.fetch_manifest(&request).await;

    let status = resolution.get_status(&channel.url);
    info!(
        "Channel status: {} {} (retries: {}, cooldown multiplier: {})",
        status.status, status.message, status.retry_count, status.cooldown_multiplier
    );

    match result {
        Ok(manifest) => {
            if manifest.stream_url != live_info.live_url {
                warn!(
                    "Stream moved to {}",
                    UrlUtils::obfuscate_credentials(&manifest.stream_url)
                );
            }
            println!("{}", manifest.body);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
