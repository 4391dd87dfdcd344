use clap::{Args, Subcommand};
use mealplan_core::{Ingredient, RecipeCatalog, RecipeRecord, ReconcileReport, Season};
use std::path::PathBuf;

use super::{open_engine, open_store, CommandResult, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct RecipeCommand {
    #[command(subcommand)]
    pub command: RecipeSubcommand,
}

#[derive(Subcommand)]
pub enum RecipeSubcommand {
    /// List recipes in the catalog
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Filter by season (winter, summer)
        #[arg(long)]
        season: Option<Season>,

        /// Filter by section
        #[arg(long)]
        section: Option<String>,

        /// Filter by name (case-insensitive)
        #[arg(long)]
        search: Option<String>,
    },

    /// List the sections of a season's collection
    Sections {
        /// Season (winter, summer)
        #[arg(long, default_value = "winter")]
        season: Season,
    },

    /// Show recipe details
    Show {
        /// Recipe name
        name: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Save a recipe catalog file as today's snapshot
    Import {
        /// JSON file with winter_recipes and summer_recipes
        file: PathBuf,
    },

    /// Add a recipe, or replace the one with the same name in that season
    Add {
        /// Recipe name
        name: String,

        /// Season collection (winter, summer)
        #[arg(long, default_value = "winter")]
        season: Season,

        /// Section (e.g. Soups)
        #[arg(long)]
        section: Option<String>,

        /// Tag (can be repeated)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Ingredient line (can be repeated)
        #[arg(long = "ingredient", value_name = "INGREDIENT")]
        ingredients: Vec<String>,

        /// Link to the full recipe
        #[arg(long)]
        link: Option<String>,

        /// Recipe number
        #[arg(long)]
        number: Option<i64>,
    },

    /// Remove a recipe from one season's collection
    Remove {
        /// Recipe name
        name: String,

        /// Season collection (winter, summer)
        #[arg(long, default_value = "winter")]
        season: Season,
    },
}

impl RecipeCommand {
    pub fn run(&self, config: &Config) -> CommandResult {
        match &self.command {
            RecipeSubcommand::List {
                format,
                season,
                section,
                search,
            } => {
                let (catalog, _) = RecipeCatalog::load_latest(&open_store(config))?;
                let recipes = catalog.filter(
                    *season,
                    section.as_deref(),
                    search.as_deref().unwrap_or(""),
                );

                if recipes.is_empty() {
                    println!("No recipes found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&recipes)?);
                    }
                    OutputFormat::Text => {
                        print_recipe_table(&recipes);
                        println!("\nTotal: {} recipe(s)", recipes.len());
                    }
                }
                Ok(())
            }

            RecipeSubcommand::Sections { season } => {
                let (catalog, _) = RecipeCatalog::load_latest(&open_store(config))?;
                for section in catalog.sections(*season) {
                    println!("{}", section);
                }
                Ok(())
            }

            RecipeSubcommand::Show { name, format } => {
                let (catalog, _) = RecipeCatalog::load_latest(&open_store(config))?;
                let recipe = catalog
                    .find(name)
                    .or_else(|| {
                        catalog
                            .iter()
                            .find(|r| r.name.eq_ignore_ascii_case(name))
                    })
                    .ok_or_else(|| format!("Recipe not found: {}", name))?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(recipe)?);
                    }
                    OutputFormat::Text => {
                        print!("{}", recipe);
                    }
                }
                Ok(())
            }

            RecipeSubcommand::Import { file } => {
                let contents = std::fs::read_to_string(file)
                    .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
                let value: serde_json::Value = serde_json::from_str(&contents)
                    .map_err(|e| format!("Failed to parse '{}': {}", file.display(), e))?;
                let catalog = RecipeCatalog::from_value(&value)
                    .map_err(|e| format!("Not a recipe catalog '{}': {}", file.display(), e))?;

                let mut engine = open_engine(config)?;
                let count = catalog.len();
                let (name, report) = engine.save_recipes(catalog)?;
                engine.close()?;

                println!("Saved {} recipe(s) to {}", count, name);
                print_report(&report, engine.selected_filename());
                Ok(())
            }

            RecipeSubcommand::Add {
                name,
                season,
                section,
                tags,
                ingredients,
                link,
                number,
            } => {
                let mut recipe = RecipeRecord::new(name.trim(), *season)
                    .with_tags(tags.iter().cloned())
                    .with_ingredients(ingredients.iter().map(Ingredient::new).collect());
                if recipe.name.is_empty() {
                    return Err("Recipe name cannot be empty".into());
                }
                if let Some(section) = section {
                    recipe = recipe.with_section(section.clone());
                }
                if let Some(link) = link {
                    recipe = recipe.with_link(link.clone());
                }
                if let Some(number) = number {
                    recipe = recipe.with_number(*number);
                }

                let mut engine = open_engine(config)?;
                let mut catalog = engine.catalog().clone();
                let verb = match catalog.upsert(recipe) {
                    Some(_) => "Updated",
                    None => "Added",
                };
                let (file, report) = engine.save_recipes(catalog)?;
                engine.close()?;

                println!("{} {} recipe '{}' in {}", verb, season, name.trim(), file);
                print_report(&report, engine.selected_filename());
                Ok(())
            }

            RecipeSubcommand::Remove { name, season } => {
                let mut engine = open_engine(config)?;
                let mut catalog = engine.catalog().clone();
                if catalog.remove(*season, name).is_none() {
                    return Err(format!("No {} recipe named '{}'", season, name).into());
                }
                let (file, report) = engine.save_recipes(catalog)?;
                engine.close()?;

                println!("Removed {} recipe '{}' in {}", season, name, file);
                print_report(&report, engine.selected_filename());
                Ok(())
            }
        }
    }
}

fn print_report(report: &ReconcileReport, plan: &str) {
    if report.changed() {
        println!("Refreshed {} slot(s) in {}", report.refreshed, plan);
    }
    for orphan in &report.orphaned {
        println!("No longer in the catalog: {}", orphan);
    }
}

fn print_recipe_table(recipes: &[&RecipeRecord]) {
    let mut current: Option<(Season, Option<&str>)> = None;
    for recipe in recipes {
        let group = (recipe.season, recipe.section.as_deref());
        if current != Some(group) {
            if current.is_some() {
                println!();
            }
            let heading = format!("{} / {}", group.0, group.1.unwrap_or("Other"));
            println!("{}", heading);
            println!("{}", "-".repeat(heading.len()));
            current = Some(group);
        }
        match &recipe.recipe_number {
            Some(number) => println!("  {:>4}  {}", number.to_string(), recipe.name),
            None => println!("        {}", recipe.name),
        }
    }
}
