use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{ConfigCommand, PlanCommand, RecipeCommand, SessionCommand};
use config::Config;

const DEFAULT_LOG_FILTER: &str = "mealplan=warn,mealplan_core=warn";
const VERBOSE_LOG_FILTER: &str = "mealplan=debug,mealplan_core=debug";

#[derive(Parser)]
#[command(name = "mealplan")]
#[command(version)]
#[command(about = "Plan a week of lunches and dinners from a seasonal recipe catalog", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log engine activity to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage weekly plan files
    Plans(PlanCommand),

    /// Browse and import the recipe catalog
    Recipes(RecipeCommand),

    /// Edit plans interactively
    Session(SessionCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config)?;
    tracing::debug!("Data directory: {}", config.data_dir.value.display());

    match cli.command {
        Some(Commands::Plans(cmd)) => cmd.run(&config)?,
        Some(Commands::Recipes(cmd)) => cmd.run(&config)?,
        Some(Commands::Session(cmd)) => cmd.run(&config).await?,
        Some(Commands::Config(cmd)) => cmd.run(&config)?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
