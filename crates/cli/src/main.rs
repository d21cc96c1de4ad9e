//! RepForge CLI - workout sessions and progression from the terminal.

mod plan_file;
mod train;

use std::path::PathBuf;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use repforge_core::{ChangeMethod, PlanExerciseId, ProgressionAnalysis, TargetChange, WorkoutDayId};
use repforge_progression::{ProgressionError, ProgressionService};
use repforge_session::SessionController;
use repforge_storage::{JsonStorage, Storage};

use plan_file::{PlanFile, Settings};

#[derive(Parser)]
#[command(name = "repforge")]
#[command(about = "Workout sessions and progression analysis", long_about = None)]
struct Cli {
    /// Data directory
    #[arg(long, global = true, default_value = ".repforge")]
    data_dir: PathBuf,

    /// JSON settings file
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage workout plans
    Plan {
        #[command(subcommand)]
        action: PlanCommand,
    },
    /// Train a workout day interactively
    Train {
        /// Workout day ID
        day: String,
    },
    /// Analyze progression of a plan exercise
    Analyze {
        /// Plan exercise ID
        id: String,
    },
    /// Apply a target change to a plan exercise
    Apply {
        /// Plan exercise ID
        id: String,
        /// weight, reps, volume or keep
        method: String,
        /// Amount to change by
        #[arg(allow_hyphen_values = true)]
        delta: Option<f64>,
    },
}

#[derive(Subcommand)]
enum PlanCommand {
    /// Import a workout day from a JSON file
    Import {
        /// Plan file
        file: PathBuf,
    },
    /// Show a workout day
    Show {
        /// Workout day ID
        day: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.settings.as_deref())?;

    // Open storage
    let mut storage = JsonStorage::new(&cli.data_dir)
        .await
        .with_context(|| format!("opening data directory {}", cli.data_dir.display()))?;

    match cli.command {
        Commands::Plan { action: PlanCommand::Import { file } } => {
            let (day_id, exercises) = PlanFile::read(&file)?.into_exercises();
            for exercise in &exercises {
                storage.save_plan_exercise(exercise).await?;
            }
            println!("Imported workout day {} ({} exercises)", day_id, exercises.len());
            for exercise in &exercises {
                println!("  {} | {}", exercise.id, exercise.exercise.name);
            }
        }
        Commands::Plan { action: PlanCommand::Show { day } } => {
            let day_id = parse_day(&day)?;
            let plan = storage.load_plan(day_id).await?;
            if plan.is_empty() {
                println!("Workout day not found");
                return Ok(());
            }

            println!("Workout day: {}", day_id);
            for exercise in plan {
                println!("  {} | {} (rest {}s)", exercise.id, exercise.exercise.name, exercise.rest_seconds);
                for (i, set) in exercise.sets.iter().enumerate() {
                    println!("      {}. {:<8} {}", i + 1, set.kind().as_str(), train::describe_target(set));
                }
            }
        }
        Commands::Train { day } => {
            let day_id = parse_day(&day)?;
            let mut controller = SessionController::new(storage).with_config(settings.session);
            controller.start_day(day_id).await?;

            println!("Type 'help' for commands.");
            let Some(summary) = train::run(&mut controller).await? else {
                return Ok(());
            };
            info!("Session {} saved", summary.session_id);

            let service = ProgressionService::new(settings.progression);
            for exercise in controller.plan() {
                if let Some(analysis) = service.evaluate(controller.storage(), exercise).await {
                    if analysis.classification.is_actionable() {
                        println!();
                        println!("{} ({})", exercise.exercise.name, exercise.id);
                        print_analysis(&analysis);
                    }
                }
            }
        }
        Commands::Analyze { id } => {
            let exercise = load_exercise(&storage, &id).await?;
            let service = ProgressionService::new(settings.progression);
            match service.try_evaluate(&storage, &exercise).await {
                Ok(analysis) => {
                    println!("{}", exercise.exercise.name);
                    print_analysis(&analysis);
                }
                Err(ProgressionError::Storage(e)) => return Err(e.into()),
                Err(e) => println!("No analysis for {}: {}", exercise.exercise.name, e),
            }
        }
        Commands::Apply { id, method, delta } => {
            let exercise = load_exercise(&storage, &id).await?;
            let method: ChangeMethod = method.parse().map_err(|e: String| anyhow!(e))?;
            let delta = match (method, delta) {
                (ChangeMethod::KeepCurrent, _) => 0.0,
                (_, Some(delta)) => delta,
                (_, None) => return Err(anyhow!("a delta is required for {}", method.as_str())),
            };
            let change = TargetChange::from_method(method, delta)
                .ok_or_else(|| anyhow!("invalid delta {} for {}", delta, method.as_str()))?;

            let service = ProgressionService::new(settings.progression);
            let sets = service.apply(&mut storage, &exercise, change).await?;
            println!("{} targets:", exercise.exercise.name);
            for (i, set) in sets.iter().enumerate() {
                println!("  {}. {:<8} {}", i + 1, set.kind().as_str(), train::describe_target(set));
            }
        }
    }

    Ok(())
}

fn parse_day(id: &str) -> Result<WorkoutDayId> {
    id.parse().map_err(|_| anyhow!("Invalid workout day ID"))
}

async fn load_exercise<S: Storage>(storage: &S, id: &str) -> Result<repforge_core::WorkoutPlanExercise> {
    let id: PlanExerciseId = id.parse().map_err(|_| anyhow!("Invalid plan exercise ID"))?;
    storage
        .load_plan_exercise(id)
        .await?
        .ok_or_else(|| anyhow!("Plan exercise {} not found", id))
}

fn print_analysis(analysis: &ProgressionAnalysis) {
    println!("  Classification: {}", analysis.classification.as_str());
    println!("  Reason: {}", analysis.reason);
    for entry in &analysis.history {
        println!(
            "    {} | {} kg | {} of {} reps | {}",
            entry.date.format("%Y-%m-%d"),
            entry.weight,
            entry.actual_reps,
            entry.target_reps,
            if entry.success { "hit" } else { "missed" }
        );
    }

    if let Some(recommendation) = &analysis.recommendation {
        println!("  Suggested: {}", recommendation.suggested.label);
        println!("  {}", recommendation.rationale);
        println!("  Options:");
        for option in recommendation.options() {
            println!("    {}", option.label);
        }
    }
}
