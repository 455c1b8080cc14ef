use clap::Parser;
use depth_mirror::cli::{Cli, Commands};
use depth_mirror::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            toml::from_str(include_str!("../config.toml.example"))?
        }
    };
    config.credentials = config.credentials.with_env_overrides();

    // Initialize telemetry
    depth_mirror::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!(market = %config.market.symbol, "Starting order book mirror");
            args.execute(&config).await?;
        }
        Commands::Snapshot(args) => {
            args.execute(&config).await?;
        }
        Commands::Order(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Market: {}", config.market.symbol);
            println!("  Stream: {}", config.exchange.ws_url);
            println!("  Snapshots: {}", config.exchange.snapshot_url);
            println!("  Orders: {}", config.exchange.order_url);
            println!(
                "  Book: depth={}/{}, spread={}, max_levels={}, max_amount={}",
                config.book.depth,
                config.book.refresh_depth,
                config.book.spread,
                config.book.max_levels,
                config.book.max_amount_per_order
            );
            println!(
                "  Sync: snapshot every {}s, reconnect {}ms..{}s",
                config.sync.snapshot_interval_secs,
                config.sync.reconnect_initial_delay_ms,
                config.sync.reconnect_max_delay_secs
            );
            println!(
                "  Credentials: {}",
                if config.credentials.api_key.is_some() {
                    "configured"
                } else {
                    "missing"
                }
            );
        }
    }

    Ok(())
}
