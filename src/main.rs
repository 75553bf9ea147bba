use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mashup_catalog_server::catalog_store::{CatalogStore, SqliteCatalogStore};
use mashup_catalog_server::config;
use mashup_catalog_server::mix::MixService;
use mashup_catalog_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};

/// Makes `s` absolute, resolving symlinks when the path already exists.
fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    match path.canonicalize() {
        Ok(resolved) => Ok(resolved),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            std::path::absolute(&path).map_err(|e| format!("Cannot make '{}' absolute: {}", s, e))
        }
        Err(err) => Err(format!("Error resolving path '{}': {}", s, err)),
    }
}

fn parse_db_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("Not an existing directory: {}", s))
    }
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory containing the catalog database (catalog.db).
    /// Can also be specified in config file.
    #[clap(long, value_parser = parse_db_dir)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Number of read-only connections to the catalog database.
    #[clap(long, default_value_t = config::DEFAULT_READ_POOL_SIZE)]
    pub read_pool_size: usize,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_dir: args.db_dir.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            frontend_dir_path: args.frontend_dir_path.clone(),
            read_pool_size: args.read_pool_size,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_dir: {:?}", app_config.db_dir);
    info!("  port: {}", app_config.port);
    info!("  read_pool_size: {}", app_config.read_pool_size);
    info!(
        "  mix: tempo window ±{} BPM, pool of at most {}, top {} (max {})",
        app_config.mix.tempo_window_bpm,
        app_config.mix.max_pool_size,
        app_config.mix.default_top_n,
        app_config.mix.max_top_n
    );

    if !app_config.catalog_db_path().exists() {
        info!(
            "Creating new catalog database at {:?}",
            app_config.catalog_db_path()
        );
    }
    let catalog_store = Arc::new(SqliteCatalogStore::new(
        app_config.catalog_db_path(),
        app_config.read_pool_size,
    )?);

    info!("Initializing metrics...");
    metrics::init_metrics();
    metrics::init_catalog_metrics(
        catalog_store.get_artists_count(),
        catalog_store.get_albums_count(),
        catalog_store.get_tracks_count(),
    );

    let mix_service = Arc::new(MixService::new(
        catalog_store.clone(),
        app_config.mix.clone(),
    ));

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        metrics_port: app_config.metrics_port,
        frontend_dir_path: app_config.frontend_dir_path.clone(),
    };

    info!("Ready to serve at port {}!", app_config.port);
    info!("Metrics available at port {}!", app_config.metrics_port);
    run_server(server_config, catalog_store, mix_service).await
}
