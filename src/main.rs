//! Leveraged position calculator.
//!
//! Give any two of entry price, exit price, and percentage change; the third
//! is derived from the two most recently edited, and the base and leveraged
//! return are reported for a long or short position.

mod calculator;
mod db;
mod debounce;
mod error;
mod models;
mod repl;

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::calculator::{Calculator, CalculatorConfig, ResultView};
use crate::db::{MemorySettingsStore, SettingsStore, SqliteSettingsStore};
use crate::models::{Direction, FieldId};

/// Leveraged long/short position calculator.
#[derive(Parser)]
#[command(name = "levcalc")]
#[command(about = "Derive entry, exit, or change and the leveraged return", long_about = None)]
struct Cli {
    /// Settings database URL
    #[arg(
        short,
        long,
        env = "LEVCALC_DATABASE",
        default_value = "sqlite:./levcalc.db?mode=rwc"
    )]
    database: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Quiet period after the last edit before recalculating (ms)
    #[arg(long, env = "LEVCALC_DEBOUNCE_MS")]
    debounce_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit fields interactively; settings persist between sessions
    Interactive,

    /// One-shot calculation from exactly two of entry, exit and change
    Calc {
        /// Entry price
        #[arg(long, allow_hyphen_values = true)]
        entry: Option<String>,

        /// Exit price
        #[arg(long, allow_hyphen_values = true)]
        exit: Option<String>,

        /// Percentage change
        #[arg(long, allow_hyphen_values = true)]
        change: Option<String>,

        /// Leverage multiplier
        #[arg(short = 'x', long, default_value = "20", allow_hyphen_values = true)]
        leverage: String,

        /// Position direction (long, short)
        #[arg(long, default_value = "long")]
        direction: Direction,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the saved settings and their result
    Show {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clear the saved settings
    Reset,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = CalculatorConfig::default();
    if let Some(ms) = cli.debounce_ms {
        config.debounce_ms = ms;
    }

    match cli.command {
        Commands::Interactive => {
            let store = SqliteSettingsStore::new(&cli.database).await?;
            info!(database = %cli.database, "Starting interactive session");

            let mut calc = Calculator::new(config, Arc::new(store));
            repl::run(&mut calc).await?;
        }

        Commands::Calc {
            entry,
            exit,
            change,
            leverage,
            direction,
            json,
        } => {
            let anchors: Vec<(FieldId, String)> = [
                (FieldId::Entry, entry),
                (FieldId::Exit, exit),
                (FieldId::Change, change),
            ]
            .into_iter()
            .filter_map(|(field, value)| value.map(|v| (field, v)))
            .collect();

            if anchors.len() != 2 {
                bail!(
                    "Give exactly two of --entry, --exit and --change (got {})",
                    anchors.len()
                );
            }

            let mut calc = Calculator::new(config, Arc::new(MemorySettingsStore::new()));
            calc.set_leverage(&leverage);
            for (field, value) in &anchors {
                calc.record_edit(*field, value);
            }
            calc.set_direction(direction).await?;

            print_result(&calc, json)?;
        }

        Commands::Show { json } => {
            let store = SqliteSettingsStore::new(&cli.database).await?;
            let entries = store.entries().await?;

            if entries.is_empty() && !json {
                println!("No saved settings. Use 'levcalc interactive' to start.");
                return Ok(());
            }

            let mut calc = Calculator::new(config, Arc::new(store));
            calc.load_settings().await?;
            calc.on_edit_burst_settled().await?;

            print_result(&calc, json)?;
        }

        Commands::Reset => {
            let store = SqliteSettingsStore::new(&cli.database).await?;
            let mut calc = Calculator::new(config, Arc::new(store));
            calc.reset().await?;
            println!("Settings cleared.");
        }

        Commands::Config => {
            println!("\n=== Calculator Configuration ===\n");
            println!("  Database:           {}", cli.database);
            println!("  Default Leverage:   {}x", config.default_leverage);
            println!("  Default Direction:  {}", config.default_direction);
            println!("  Debounce:           {}ms", config.debounce_ms);
        }
    }

    Ok(())
}

fn print_result(calc: &Calculator, json: bool) -> Result<()> {
    if json {
        let body = serde_json::json!({
            "direction": calc.direction(),
            "leverage": calc.leverage_text(),
            "entry": calc.input(FieldId::Entry),
            "exit": calc.input(FieldId::Exit),
            "change": calc.input(FieldId::Change),
            "output": calc.output(),
            "view": ResultView::render(calc.output()),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{}", repl::render(calc));
    }
    Ok(())
}
