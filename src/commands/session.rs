//! Interactive editing session.
//!
//! One engine stays open for the whole session so edits are coalesced by
//! the debounce timer instead of being written on every command. The loop
//! waits on stdin, the pending save deadline and Ctrl+C at the same time.

use clap::Args;
use mealplan_core::filename::format_label;
use mealplan_core::{
    BlobStore, Day, DeleteConfirmed, EngineError, FilterState, PlanEngine, Season, SlotFilter,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;

use super::plan::print_plan;
use super::{open_engine, CommandResult, OutputFormat};
use crate::config::Config;

const HELP: &str = "\
Commands:
  show [FILE]                    show the plan being edited, or another plan
  list                           list plan files, newest first
  select FILE                    edit another plan
  new                            start an empty plan for today
  delete FILE                    delete a plan file (asks first)
  set DAY MEAL RECIPE...         put a recipe into a slot
  clear DAY MEAL                 empty a slot
  autofill SEASON SECTION...     fill empty slots from the given sections
  recipes [SEARCH]               list recipes
  save                           write pending edits now
  help                           show this help
  quit                           save and leave";

#[derive(Args)]
pub struct SessionCommand {}

/// One parsed line of session input.
#[derive(Debug, PartialEq)]
enum Input {
    Empty,
    Show(Option<String>),
    List,
    Select(String),
    New,
    Delete(String),
    Set { day: Day, meal: String, recipe: String },
    Clear { day: Day, meal: String },
    Autofill { season: Season, sections: Vec<String> },
    Recipes(String),
    Save,
    Help,
    Quit,
}

enum Flow {
    Continue,
    ConfirmDelete(String),
    Quit,
}

fn parse_line(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Input::Empty);
    };
    let rest: Vec<&str> = words.collect();

    let input = match (command.to_lowercase().as_str(), rest.as_slice()) {
        ("show", []) => Input::Show(None),
        ("show", [file]) => Input::Show(Some(file.to_string())),
        ("list" | "ls", []) => Input::List,
        ("select", [file]) => Input::Select(file.to_string()),
        ("new", []) => Input::New,
        ("delete" | "rm", [file]) => Input::Delete(file.to_string()),
        ("set", [day, meal, recipe @ ..]) if !recipe.is_empty() => Input::Set {
            day: day.parse()?,
            meal: meal.to_string(),
            recipe: recipe.join(" "),
        },
        ("clear", [day, meal]) => Input::Clear {
            day: day.parse()?,
            meal: meal.to_string(),
        },
        ("autofill", [season, sections @ ..]) if !sections.is_empty() => Input::Autofill {
            season: season.parse()?,
            sections: sections.iter().map(|s| s.to_string()).collect(),
        },
        ("recipes", search) => Input::Recipes(search.join(" ")),
        ("save", []) => Input::Save,
        ("help" | "?", _) => Input::Help,
        ("quit" | "exit" | "q", []) => Input::Quit,
        _ => return Err(format!("Unrecognized command '{}'. Type 'help'.", line.trim())),
    };
    Ok(input)
}

fn apply<S: BlobStore>(engine: &mut PlanEngine<S>, input: Input) -> Result<Flow, EngineError> {
    match input {
        Input::Empty => {}
        Input::Show(file) => {
            let name = file.unwrap_or_else(|| engine.selected_filename().to_string());
            let plan = engine.view_plan_file(&name)?;
            if let Err(e) = print_plan(&name, plan, &OutputFormat::Text) {
                eprintln!("Error: {}", e);
            }
        }
        Input::List => {
            for file in engine.list_plan_files() {
                let marker = if file == engine.selected_filename() {
                    "*"
                } else {
                    " "
                };
                println!("{} {:24} {}", marker, file, format_label(file));
            }
        }
        Input::Select(file) => {
            engine.select_plan_file(&file)?;
            println!("Editing {}", format_label(&file));
        }
        Input::New => {
            let name = engine.create_new_plan()?;
            println!("Created {}", name);
        }
        Input::Delete(file) => {
            if !engine.list_plan_files().contains(&file) {
                return Err(EngineError::UnknownPlan(file));
            }
            println!("Delete plan '{}'? [y/N]", format_label(&file));
            return Ok(Flow::ConfirmDelete(file));
        }
        Input::Set { day, meal, recipe } => {
            let Some(found) = engine.catalog().find(&recipe).cloned() else {
                println!("Recipe not found: {}", recipe);
                return Ok(Flow::Continue);
            };
            engine.mutate_slot(day, &meal, Some(found))?;
        }
        Input::Clear { day, meal } => {
            engine.mutate_slot(day, &meal, None)?;
        }
        Input::Autofill { season, sections } => {
            let filter = SlotFilter::new(season).with_sections(sections);
            let mut filters = FilterState::new();
            for day in Day::ALL {
                for meal in engine.layout().meals() {
                    filters.set(day, meal.clone(), filter.clone());
                }
            }
            let filled = engine.run_auto_fill(&filters);
            println!("Filled {} slot(s)", filled.len());
        }
        Input::Recipes(search) => {
            for recipe in engine.catalog().filter(None, None, &search) {
                println!("  [{}] {}", recipe.season, recipe.name);
            }
        }
        Input::Save => {
            engine.flush()?;
            println!("Saved {}", engine.selected_filename());
        }
        Input::Help => println!("{}", HELP),
        Input::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Reports a failed operation. Fatal errors end the session.
fn report(err: EngineError) -> Result<(), EngineError> {
    if err.is_fatal() {
        return Err(err);
    }
    eprintln!("Error: {}", err);
    Ok(())
}

impl SessionCommand {
    pub async fn run(&self, config: &Config) -> CommandResult {
        let mut engine = open_engine(config)?;
        println!(
            "Editing {}. Type 'help' for commands.",
            format_label(engine.selected_filename())
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut pending_delete: Option<String> = None;
        let mut shutdown = Box::pin(signal::ctrl_c());

        loop {
            let saving = engine.debounce_deadline().is_some();
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };

                    if let Some(file) = pending_delete.take() {
                        if line.trim().eq_ignore_ascii_case("y") {
                            match engine.delete_plan_file(&file, DeleteConfirmed) {
                                Ok(()) => println!(
                                    "Deleted {}. Editing {}",
                                    file,
                                    engine.selected_filename()
                                ),
                                Err(e) => report(e)?,
                            }
                        } else {
                            println!("Deletion cancelled.");
                        }
                        continue;
                    }

                    let input = match parse_line(&line) {
                        Ok(input) => input,
                        Err(e) => {
                            eprintln!("{}", e);
                            continue;
                        }
                    };
                    match apply(&mut engine, input) {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::ConfirmDelete(file)) => pending_delete = Some(file),
                        Ok(Flow::Quit) => break,
                        Err(e) => report(e)?,
                    }
                }
                _ = engine.debounce_expired(), if saving => {
                    if let Err(e) = engine.fire_debounce() {
                        report(e)?;
                    }
                }
                _ = &mut shutdown => {
                    println!();
                    break;
                }
            }
        }

        engine.close()?;
        println!("Saved {}", engine.selected_filename());
        Ok(())
    }
}
