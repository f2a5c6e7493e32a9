use clap::Parser;
use relayer::{
    config::Config,
    load_tokens,
    metrics::{install_prometheus_exporter, Metrics},
    timed_cycle,
};
use tokio::time;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "relayer")]
#[command(about = "Track outbound withdrawals and redeem them on L1")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Private key for signing transactions (hex string, with or without 0x prefix)
    #[arg(short = 'k', long, env = "PRIVATE_KEY")]
    private_key: String,

    /// Dry-run mode: log redemptions without executing transactions
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Relayer");

    let cli = Cli::parse();
    let mut config = Config::from_file(&cli.config)?;
    if cli.dry_run {
        config.dry_run = true;
    }

    let network = config.network_config();

    info!("Loaded config:");
    info!("  Network: {:?}", config.network);
    info!("  L1 Outbox: {}", network.ethereum.outbox);
    info!("  L2 Gateways: {}", network.arbitrum.gateways.len());
    info!("  State dir: {}", config.state_dir.display());
    if config.dry_run {
        info!("  Mode: DRY-RUN (no transactions will be executed)");
    }

    if let Some(port) = config.relayer.metrics_port {
        install_prometheus_exporter(port)?;
        info!(port, "Prometheus exporter listening");
    }
    let metrics = Metrics::new();

    let session = relayer::connect(&config, &cli.private_key)?;
    load_tokens(&session, &config.token_lists).await?;

    let mut interval = time::interval(config.interval());

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        }

        match timed_cycle(&session, &metrics, &config).await {
            Ok(report) => info!(
                pending = report.pending,
                confirmed = report.confirmed,
                skipped = report.skipped,
                redeemed = report.redeemed,
                reverted = report.reverted,
                failed = report.failed,
                "Cycle completed"
            ),
            Err(e) => error!(error = %e, "Cycle failed"),
        }
    }
}
