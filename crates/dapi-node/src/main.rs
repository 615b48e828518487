//! dAPI data feed node - entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// dAPI data feed node
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via DAPI_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Newline-delimited JSON requests to apply (defaults to stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Print Prometheus metrics to stdout after ingestion
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    dapi_telemetry::init_logging()?;

    info!("Starting dAPI node v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > DAPI_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("DAPI_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = dapi_node::NodeConfig::load(&config_path)?;
    info!(
        manager = %config.manager,
        dapi_names = config.dapi_names.len(),
        "Configuration loaded"
    );

    let app = dapi_node::Application::new(config);
    let report = match &args.input {
        Some(path) => {
            info!(path = %path.display(), "Reading requests from file");
            app.run(tokio::fs::File::open(path).await?).await?
        }
        None => app.run(tokio::io::stdin()).await?,
    };

    app.report_dapi_names();
    if args.metrics {
        print!("{}", app.metrics_text()?);
    }
    info!(?report, "Done");
    Ok(())
}
