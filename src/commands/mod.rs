mod config_cmd;
mod plan;
mod recipe;
mod session;

pub use config_cmd::ConfigCommand;
pub use plan::PlanCommand;
pub use recipe::RecipeCommand;
pub use session::SessionCommand;

use clap::ValueEnum;
use mealplan_core::{FsBlobStore, PlanEngine, RecipeCatalog, SystemClock};
use std::io::{self, Write};

use crate::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub fn open_store(config: &Config) -> FsBlobStore {
    FsBlobStore::new(config.data_dir.value.clone())
}

/// Opens a plan session on the configured data directory with the newest
/// recipe catalog loaded.
pub fn open_engine(
    config: &Config,
) -> Result<PlanEngine<FsBlobStore>, Box<dyn std::error::Error>> {
    let store = open_store(config);
    let (catalog, source) = RecipeCatalog::load_latest(&store)?;
    if let Some(source) = source {
        tracing::debug!("Using recipes from {}", source);
    }
    let engine = PlanEngine::open(store, SystemClock, catalog, config.engine_options())?;
    Ok(engine)
}

/// Asks a yes/no question on stdout; anything but `y` means no.
pub fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
