//! Telemetry demo CLI
//!
//! Drives the logging facades against the console backend: counter actions,
//! simulated errors, screen views, and a forced crash.

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use telemetry_facade::{
    CapturedError, ConsoleBackend, Data, ErrorReport, Params, StackTrace, Telemetry,
    TelemetryConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "telemetry-demo")]
#[command(about = "Exercise the crash reporting and analytics facades from the terminal")]
struct Cli {
    /// JSON config file
    #[arg(short, long, env = "TELEMETRY_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// User identifier attached to crash records
    #[arg(short, long, env = "TELEMETRY_USER_ID", global = true)]
    user_id: Option<String>,

    /// Disable crash collection for this run
    #[arg(long, global = true)]
    no_collection: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Increment the demo counter, logging an action for each step
    Increment {
        /// Number of increments
        #[arg(short, long, default_value = "1")]
        times: u32,
    },

    /// Report a screen view
    Screen {
        /// Screen name
        name: String,

        /// Screen class (defaults to the name)
        #[arg(long)]
        class: Option<String>,
    },

    /// Raise and log a simulated error
    SimulateError {
        /// Record the error as fatal
        #[arg(long)]
        fatal: bool,

        /// Skip the visibility keys for non-fatal errors
        #[arg(long)]
        no_force_visible: bool,
    },

    /// Raise and log a simulated non-fatal error with a detailed log block
    NonFatal,

    /// Reset the event context keys
    Clear,

    /// Show collection status and context keys
    Status,

    /// Terminate the process through the crash backend
    Crash,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => TelemetryConfig::from_file(path)?,
        None => TelemetryConfig {
            app_name: env!("CARGO_PKG_NAME").into(),
            app_version: env!("CARGO_PKG_VERSION").into(),
            ..TelemetryConfig::default()
        },
    };
    if cli.user_id.is_some() {
        config.user_id = cli.user_id.clone();
    }
    if cli.no_collection {
        config.collection_enabled = false;
    }

    let backend = Arc::new(ConsoleBackend::new(config.collection_enabled));
    let telemetry = Telemetry::init(&config, backend.clone(), backend.clone()).await;

    match cli.command {
        Commands::Increment { times } => increment(&telemetry, times).await,
        Commands::Screen { name, class } => {
            telemetry
                .analytics
                .log_screen_view(&name, class.as_deref())
                .await;
        }
        Commands::SimulateError {
            fatal,
            no_force_visible,
        } => simulate_error(&telemetry, fatal, !no_force_visible).await,
        Commands::NonFatal => non_fatal(&telemetry).await,
        Commands::Clear => {
            telemetry.crash.clear_custom_keys().await;
            println!("{} event keys cleared", "✓".green());
        }
        Commands::Status => print_status(&telemetry, &backend),
        Commands::Crash => {
            println!("{} forcing crash", "!".red().bold());
            telemetry.crash.force_crash();
        }
    }

    Ok(())
}

async fn increment(telemetry: &Telemetry, times: u32) {
    for value in 1..=times {
        let mut params = Params::new();
        params.insert("value".into(), value.into());
        telemetry
            .actions
            .log_action(
                "counter_incremented",
                Some(&params),
                Some("counter_increment"),
                Some("Counter Incremented"),
            )
            .await;
        println!("  {} counter = {}", "▸".cyan(), value);
    }
}

async fn simulate_error(telemetry: &Telemetry, fatal: bool, force_visible: bool) {
    let err = match "not-a-number".parse::<i32>() {
        Ok(_) => return,
        Err(e) => e,
    };

    let mut data = Data::new();
    data.insert("input".into(), json!("not-a-number"));
    let report = ErrorReport::new("simulated_error", "Simulated Error", &err)
        .with_stack_trace(StackTrace::capture())
        .with_data(data)
        .fatal(fatal)
        .force_visible(force_visible);

    telemetry.crash.log_error(&report).await;

    let kind = if fatal { "fatal".red() } else { "non-fatal".yellow() };
    println!("{} {} error logged: {}", "✓".green(), kind, err);
}

async fn non_fatal(telemetry: &Telemetry) {
    let error = CapturedError::from_message("StateError", "simulated state corruption");
    let mut data = Data::new();
    data.insert("screen".into(), json!("home"));
    data.insert("retry_count".into(), json!(0));

    telemetry
        .crash
        .log_non_fatal_error(
            "simulated_non_fatal",
            "Simulated Non-Fatal",
            error,
            None,
            Some(&data),
        )
        .await;

    println!("{} non-fatal error logged", "✓".green());
}

fn print_status(telemetry: &Telemetry, backend: &ConsoleBackend) {
    let enabled = telemetry.crash.is_collection_enabled();

    println!("{}", "━".repeat(60).dimmed());
    println!(
        "  {} {}",
        "Collection:".cyan(),
        if enabled { "enabled".green() } else { "disabled".red() }
    );
    println!("{}", "━".repeat(60).dimmed());
    for (key, value) in backend.keys() {
        println!("  {} {}", format!("{}:", key).cyan(), value);
    }
}
