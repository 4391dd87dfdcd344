use clap::{Args, Subcommand};
use mealplan_core::filename::format_label;
use mealplan_core::{
    BlobStore, Day, DeleteConfirmed, FilterState, PlanEngine, PlanRecord, Season, SlotFilter,
};
use serde_json::json;

use super::{confirm, open_engine, CommandResult, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct PlanCommand {
    #[command(subcommand)]
    pub command: PlanSubcommand,
}

#[derive(Subcommand)]
pub enum PlanSubcommand {
    /// List plan files, newest first
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a plan (defaults to the newest)
    Show {
        /// Plan file name, e.g. MP_2025-01-01.json
        file: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create an empty plan for today
    New,

    /// Delete a plan file
    Delete {
        /// Plan file name
        file: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Put a recipe into a meal slot
    Set {
        /// Day of the week (monday, tue, ...)
        day: Day,

        /// Meal slot (e.g. lunch, dinner)
        meal: String,

        /// Recipe name as it appears in the catalog
        recipe: String,

        /// Plan file to edit (defaults to the newest)
        #[arg(long)]
        file: Option<String>,
    },

    /// Empty a meal slot
    Clear {
        /// Day of the week
        day: Day,

        /// Meal slot
        meal: String,

        /// Plan file to edit (defaults to the newest)
        #[arg(long)]
        file: Option<String>,
    },

    /// Fill empty slots with random recipes matching a filter
    Autofill {
        /// Season to pick from
        #[arg(long, default_value = "winter")]
        season: Season,

        /// Section to pick from (can be repeated)
        #[arg(long = "section", value_name = "SECTION", required = true)]
        sections: Vec<String>,

        /// Only recipes with one of these tags (can be repeated)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Only recipes whose name contains this text
        #[arg(long)]
        search: Option<String>,

        /// Days to fill (can be repeated, defaults to the whole week)
        #[arg(long = "day", value_name = "DAY")]
        days: Vec<Day>,

        /// Meal slots to fill (can be repeated, defaults to all)
        #[arg(long = "meal", value_name = "MEAL")]
        meals: Vec<String>,

        /// Plan file to edit (defaults to the newest)
        #[arg(long)]
        file: Option<String>,
    },
}

impl PlanCommand {
    pub fn run(&self, config: &Config) -> CommandResult {
        let mut engine = open_engine(config)?;

        match &self.command {
            PlanSubcommand::List { format } => {
                let files = engine.list_plan_files();
                match format {
                    OutputFormat::Json => {
                        let entries: Vec<_> = files
                            .iter()
                            .map(|f| {
                                json!({
                                    "file": f,
                                    "label": format_label(f),
                                    "selected": f == engine.selected_filename(),
                                })
                            })
                            .collect();
                        println!("{}", serde_json::to_string_pretty(&entries)?);
                    }
                    OutputFormat::Text => {
                        for file in files {
                            let marker = if file == engine.selected_filename() {
                                "*"
                            } else {
                                " "
                            };
                            println!("{} {:24} {}", marker, file, format_label(file));
                        }
                        println!("\nTotal: {} plan(s)", files.len());
                    }
                }
            }

            PlanSubcommand::Show { file, format } => {
                let name = file
                    .clone()
                    .unwrap_or_else(|| engine.selected_filename().to_string());
                let plan = engine.view_plan_file(&name)?;
                print_plan(&name, plan, format)?;
            }

            PlanSubcommand::New => {
                let name = engine.create_new_plan()?;
                println!("Created plan: {}", name);
            }

            PlanSubcommand::Delete { file, force } => {
                if !engine.list_plan_files().contains(file) {
                    return Err(format!("Plan not found: {}", file).into());
                }
                if !force && !confirm(&format!("Delete plan '{}'?", format_label(file)))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }
                engine.delete_plan_file(file, DeleteConfirmed)?;
                println!("Deleted plan: {}", file);
                println!("Now editing: {}", engine.selected_filename());
            }

            PlanSubcommand::Set {
                day,
                meal,
                recipe,
                file,
            } => {
                select(&mut engine, file.as_deref())?;
                let found = engine
                    .catalog()
                    .find(recipe)
                    .cloned()
                    .ok_or_else(|| format!("Recipe not found: {}", recipe))?;
                engine.mutate_slot(*day, meal, Some(found))?;
                println!("{} {}: {}", day, meal, recipe);
            }

            PlanSubcommand::Clear { day, meal, file } => {
                select(&mut engine, file.as_deref())?;
                engine.mutate_slot(*day, meal, None)?;
                println!("Cleared {} {}", day, meal);
            }

            PlanSubcommand::Autofill {
                season,
                sections,
                tags,
                search,
                days,
                meals,
                file,
            } => {
                select(&mut engine, file.as_deref())?;

                let mut filter = SlotFilter::new(*season)
                    .with_sections(sections.iter().cloned())
                    .with_tags(tags.iter().cloned());
                if let Some(text) = search {
                    filter = filter.with_search(text.clone());
                }

                let days = if days.is_empty() {
                    Day::ALL.to_vec()
                } else {
                    days.clone()
                };
                let meals = if meals.is_empty() {
                    engine.layout().meals().to_vec()
                } else {
                    meals
                        .iter()
                        .map(|m| {
                            engine
                                .layout()
                                .resolve(m)
                                .map(String::from)
                                .ok_or_else(|| format!("Unknown meal: {}", m))
                        })
                        .collect::<Result<Vec<_>, _>>()?
                };

                let mut filters = FilterState::new();
                for day in &days {
                    for meal in &meals {
                        filters.set(*day, meal.clone(), filter.clone());
                    }
                }

                let filled = engine.run_auto_fill(&filters);
                if filled.is_empty() {
                    println!("Nothing to fill");
                } else {
                    for (day, meal) in &filled {
                        if let Some(recipe) = engine
                            .get_active_plan()
                            .get(*day, meal)
                            .and_then(|s| s.recipe())
                        {
                            println!("{} {}: {}", day, meal, recipe.name);
                        }
                    }
                    println!("\nFilled {} slot(s)", filled.len());
                }
            }
        }

        engine.close()?;
        Ok(())
    }
}

fn select<S: BlobStore>(engine: &mut PlanEngine<S>, file: Option<&str>) -> CommandResult {
    if let Some(file) = file {
        engine.select_plan_file(file)?;
    }
    Ok(())
}

pub fn print_plan(name: &str, plan: &PlanRecord, format: &OutputFormat) -> CommandResult {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(plan)?);
        }
        OutputFormat::Text => {
            let label = format_label(name);
            println!("{}", label);
            println!("{}\n", "=".repeat(label.chars().count()));
            print!("{}", plan);
        }
    }
    Ok(())
}
