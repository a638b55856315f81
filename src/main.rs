//! Propolis gateway entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use propolis_gateway::api::{create_router, AppState};
use propolis_gateway::config::Config;
use propolis_gateway::diagnostics::run_health_check;
use propolis_gateway::metrics;
use propolis_gateway::store::SupabaseClient;
use propolis_gateway::utils::shutdown_signal;

/// Property data gateway for the Propolis dashboard.
#[derive(Parser, Debug)]
#[command(name = "propolis-gateway")]
#[command(about = "Property data gateway: Supabase unit lookups, DoorLoop occupancy and health diagnostics")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP listen port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve {
        /// HTTP listen port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Run the store health check and print the report.
    CheckStore,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("propolis_gateway=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    if args.json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::CheckStore) => cmd_check_store().await,
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        None => cmd_serve(args.port).await,
    }
}

fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    Ok(config)
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("PROPOLIS GATEWAY - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Credentials:");
    for (name, present) in config.credential_presence() {
        println!("  {:<18} {}", name, if present { "set" } else { "MISSING" });
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Unit tables: {}", config.unit_tables().join(", "));
    println!("  Property column: {}", config.units_property_column);
    println!("  Reservations table: {}", config.reservations_table);
    println!("  Listings table: {}", config.listings_table);
    println!("  Lease RPC: {}", config.leases_rpc);
    println!("  DoorLoop: {}", config.doorloop_base_url);
    println!("  Guesty: {}", config.guesty_base_url);
    println!("  JWT: {} / {} min", config.jwt_algorithm, config.jwt_expiration_minutes);
    println!("  CORS origins: {}", config.cors_origin_list().join(", "));
    println!("  Port: {}", config.port);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the health check against the configured store.
async fn cmd_check_store() -> anyhow::Result<()> {
    let config = load_config()?;

    let store = match SupabaseClient::from_config(&config) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!("Store client unavailable: {}", e);
            None
        }
    };

    let report = run_health_check(&config, store.as_ref()).await;

    println!("======================================================================");
    println!("PROPOLIS GATEWAY - STORE CHECK");
    println!("======================================================================");
    for check in &report.checks {
        println!(
            "  [{}] {:<22} {:<20} {}",
            if check.passed { "PASS" } else { "FAIL" },
            check.name,
            check.outcome,
            check.detail.as_deref().unwrap_or("")
        );
    }
    println!("----------------------------------------------------------------------");
    println!("  {} passed, {} failed", report.passed, report.failed);
    println!("======================================================================");

    if report.is_healthy() {
        Ok(())
    } else {
        Err(anyhow::anyhow!("{} check(s) failed", report.failed))
    }
}

/// Serve the HTTP API until shutdown.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let mut config = load_config()?;

    if let Some(port) = port_override {
        config.port = port;
    }

    for (name, present) in config.credential_presence() {
        if !present {
            warn!("{} is not set; dependent endpoints will report a configuration error", name);
        }
    }

    let mut app_state = AppState::from_config(config);
    match metrics::install_prometheus() {
        Ok(handle) => app_state = app_state.with_prometheus(handle),
        Err(e) => warn!("Prometheus recorder not installed: {}", e),
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], app_state.config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
