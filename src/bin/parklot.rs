//! Parklot command-line binary
//!
//! Runs the parking-lot allocator as an interactive shell or as an HTTP
//! service.
//!
//! # Examples
//!
//! ```bash
//! # Interactive session with 10 car, 5 bike and 2 truck slots
//! parklot shell --car 10 --bike 5 --truck 2
//!
//! # HTTP service configured from a file
//! parklot --config parklot.toml serve --port 9090
//!
//! # Print the effective configuration
//! parklot config
//! ```

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use parklot::config::LotConfig;
use parklot::shell::Shell;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Parklot - slot allocation, waitlists and billing for a parking facility
#[derive(Parser, Debug)]
#[command(name = "parklot")]
#[command(version = parklot::VERSION)]
#[command(about = "Parking-lot slot allocator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "PARKLOT_CONFIG")]
    config: Option<PathBuf>,

    /// Log directory path
    #[arg(long, global = true, default_value = "logs", env = "PARKLOT_LOG_DIR")]
    log_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive session on stdin/stdout
    Shell(ShellArgs),

    /// Start the HTTP service
    Serve(ServeArgs),

    /// Print the effective configuration as TOML
    Config,

    /// Show version
    Version,
}

/// Slot counts; each overrides the configured value
#[derive(Args, Debug)]
struct ShellArgs {
    /// Number of car slots
    #[arg(long)]
    car: Option<u32>,

    /// Number of bike slots
    #[arg(long)]
    bike: Option<u32>,

    /// Number of truck slots
    #[arg(long)]
    truck: Option<u32>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// HTTP bind address
    #[arg(short, long, env = "PARKLOT_BIND")]
    bind: Option<String>,

    /// HTTP port
    #[arg(short, long, env = "PARKLOT_PORT")]
    port: Option<u16>,

    /// Enable permissive CORS
    #[arg(long)]
    cors: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The shell owns stdout, so its console logs go to stderr
    let interactive = matches!(cli.command, Commands::Shell(_));
    setup_logging(&cli, interactive)?;

    let config = LotConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Shell(args) => shell_command(config, args),
        Commands::Serve(args) => serve_command(config, args).await,
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Commands::Version => {
            println!("parklot {}", parklot::VERSION);
            Ok(())
        }
    }
}

/// Setup logging with rolling files and console output
fn setup_logging(cli: &Cli, interactive: bool) -> anyhow::Result<()> {
    std::fs::create_dir_all(&cli.log_dir)
        .with_context(|| format!("Failed to create log dir {}", cli.log_dir.display()))?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &cli.log_dir, "parklot.log");

    let log_level = cli
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    // Interactive sessions only show warnings on the console
    let console_filter = if interactive {
        tracing_subscriber::filter::LevelFilter::WARN
    } else {
        tracing_subscriber::filter::LevelFilter::TRACE
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color)
                .with_filter(console_filter),
        )
        .with(fmt::layer().with_writer(file_appender).with_ansi(false))
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    Ok(())
}

fn shell_command(mut config: LotConfig, args: ShellArgs) -> anyhow::Result<()> {
    if let Some(car) = args.car {
        config.slots.car = car;
    }
    if let Some(bike) = args.bike {
        config.slots.bike = bike;
    }
    if let Some(truck) = args.truck {
        config.slots.truck = truck;
    }

    let engine = config.build_engine();
    info!(slots = ?config.slots, rates = ?config.rates, "Starting interactive session");
    if engine.total_slots() == 0 {
        warn!("Facility has no slots; use 'init' or --car/--bike/--truck");
    }

    let stdin = std::io::stdin();
    let prompt = stdin.is_terminal();
    let mut shell = Shell::new(engine, stdin.lock(), std::io::stdout().lock()).with_prompt(prompt);
    shell.run()
}

async fn serve_command(mut config: LotConfig, args: ServeArgs) -> anyhow::Result<()> {
    info!("🚀 Parklot starting...");
    info!(version = %parklot::VERSION, "Version information");

    if let Some(bind) = args.bind {
        config.server.http_addr = bind;
    }
    if let Some(port) = args.port {
        config.server.http_port = port;
    }
    if args.cors {
        config.server.enable_cors = true;
    }

    let engine = config.build_engine();
    info!(
        total = engine.total_slots(),
        car = config.slots.car,
        bike = config.slots.bike,
        truck = config.slots.truck,
        "✅ Facility ready"
    );

    parklot::server::start_server(config.server, engine).await
}
