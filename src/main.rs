//! Shadow server binary.
//!
//! ```text
//!     Browser ──▶ listener ──▶ [cache] ──▶ shadow (local files under prefix)
//!                                     └──▶ proxy  (everything else) ──▶ Upstream
//! ```

use std::path::PathBuf;

use clap::Parser;

use shadow_serve::config::{load_config, ShadowConfig};
use shadow_serve::lifecycle::shutdown_signal;
use shadow_serve::observability::{logging, metrics};
use shadow_serve::ShadowServer;

#[derive(Parser, Debug)]
#[command(name = "shadow-serve")]
#[command(about = "Serve local files in place of parts of a remote web app", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Upstream base URL
    #[arg(short, long)]
    upstream: Option<String>,

    /// URL prefix served from the local root
    #[arg(long)]
    shadow_path: Option<String>,

    /// Local directory to serve
    #[arg(short, long)]
    root: Option<String>,

    /// Index file for directory requests (empty disables)
    #[arg(long)]
    index: Option<String>,

    /// Enable the response cache
    #[arg(long)]
    cache: bool,

    #[arg(long)]
    cache_max_bytes: Option<u64>,

    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut ShadowConfig) {
        if let Some(host) = self.host {
            config.listener.host = host;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(upstream) = self.upstream {
            config.upstream.url = upstream;
        }
        if let Some(prefix) = self.shadow_path {
            config.shadow.path_prefix = prefix;
        }
        if let Some(root) = self.root {
            config.shadow.local_root = root;
        }
        if let Some(index) = self.index {
            config.shadow.index_file = Some(index);
        }
        if self.cache {
            config.cache.enabled = true;
        }
        if let Some(max_bytes) = self.cache_max_bytes {
            config.cache.max_bytes = max_bytes;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ShadowConfig::default(),
    };
    cli.apply(&mut config);

    logging::init_logging(&config.observability.log_level);
    tracing::info!("shadow-serve v{} starting", env!("CARGO_PKG_VERSION"));

    let validated = match config.validate() {
        Ok(validated) => validated,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = ShadowServer::new(validated)?;
    server.start().await?;

    let route = &server.config().route;
    tracing::info!("Server Address: {}", server.address().unwrap_or_default());
    tracing::info!("Shadow Root: {}", route.local_root.display());
    tracing::info!("Shadow Path: {}", route.shadow_prefix);
    tracing::info!("Web URL: {}", route.upstream);

    shutdown_signal().await?;
    server.stop().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
