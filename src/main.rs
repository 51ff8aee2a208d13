use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod config;
mod models;

use commands::{
    log_water, open_ledger, ConfigCommand, HistoryCommand, MealCommand, TargetCommand,
    TodayCommand, WatchCommand, WorkoutCommand,
};
use config::Config;

#[derive(Parser)]
#[command(name = "fitcal")]
#[command(version)]
#[command(about = "A daily fitness and calorie tracker", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's overview
    Today(TodayCommand),

    /// Log a workout
    Workout(WorkoutCommand),

    /// Log a meal
    Meal(MealCommand),

    /// Add a glass of water
    Water,

    /// Set today's calorie target
    Target(TargetCommand),

    /// Show past days
    History(HistoryCommand),

    /// Keep running and roll the day over at midnight
    Watch(WatchCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fitcal=info,fitcal_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Save config path for config init
    let cli_config_path = cli.config.clone();

    let config = Config::load(cli.config)?;

    match &cli.command {
        Some(Commands::Today(cmd)) => {
            cmd.run(&open_ledger(&config))?;
        }
        Some(Commands::Workout(cmd)) => {
            cmd.run(&open_ledger(&config), &config)?;
        }
        Some(Commands::Meal(cmd)) => {
            cmd.run(&open_ledger(&config))?;
        }
        Some(Commands::Water) => {
            log_water(&open_ledger(&config));
        }
        Some(Commands::Target(cmd)) => {
            cmd.run(&open_ledger(&config))?;
        }
        Some(Commands::History(cmd)) => {
            cmd.run(&open_ledger(&config))?;
        }
        Some(Commands::Watch(cmd)) => {
            cmd.run(&config)?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config, cli_config_path)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
