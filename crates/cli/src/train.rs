//! Interactive training session on the terminal.

use anyhow::Result;
use repforge_core::{PerformanceEntry, SetTarget};
use repforge_session::{
    Advance, NextSetPreview, RestEventKind, RestOutcome, RestTimerState, SessionController,
    SessionState, SessionSummary, SetCompletion,
};
use repforge_storage::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};

/// A line typed during training.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Record the current set
    Done {
        /// Load used
        weight: f64,
        /// Reps performed
        reps: u32,
        /// Effort rating, if given
        effort: Option<u8>,
    },
    /// Skip the rest of the current exercise
    Skip,
    /// Add or remove rest seconds
    Rest(i64),
    /// Pause the rest countdown
    Pause,
    /// Resume the rest countdown
    Resume,
    /// End the rest now
    Next,
    /// Show where the session is
    Status,
    /// Save and end the session
    Finish,
    /// Leave without saving
    Quit,
    /// List commands
    Help,
}

impl std::str::FromStr for Input {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Err("empty command".to_string());
        };
        let args: Vec<&str> = words.collect();

        let input = match command.to_lowercase().as_str() {
            "done" | "d" => {
                let [weight, reps, rest @ ..] = args.as_slice() else {
                    return Err("usage: done <weight> <reps> [effort]".to_string());
                };
                let weight = weight.parse().map_err(|_| format!("invalid weight: {}", weight))?;
                let reps = reps.parse().map_err(|_| format!("invalid reps: {}", reps))?;
                let effort = match rest {
                    [] => None,
                    [effort] => Some(effort.parse().map_err(|_| format!("invalid effort: {}", effort))?),
                    _ => return Err("usage: done <weight> <reps> [effort]".to_string()),
                };
                Input::Done { weight, reps, effort }
            }
            "rest" | "r" => {
                let [delta] = args.as_slice() else {
                    return Err("usage: rest <+/-seconds>".to_string());
                };
                let delta = delta.trim_start_matches('+');
                Input::Rest(delta.parse().map_err(|_| format!("invalid seconds: {}", delta))?)
            }
            "skip" => Input::Skip,
            "pause" => Input::Pause,
            "resume" => Input::Resume,
            "next" | "n" => Input::Next,
            "status" | "s" => Input::Status,
            "finish" => Input::Finish,
            "quit" | "q" => Input::Quit,
            "help" | "?" => Input::Help,
            other => return Err(format!("unknown command: {} (type 'help')", other)),
        };
        Ok(input)
    }
}

const HELP: &str = "\
  done <weight> <reps> [effort]  record the current set
  skip                           skip the rest of this exercise
  rest <+/-seconds>              adjust the rest countdown
  pause | resume                 pause or resume the rest countdown
  next                           end the rest now
  status                         show progress
  finish                         save the session
  quit                           leave without saving";

/// Run a started session until it is finished or abandoned.
///
/// Returns the summary when the session was finished.
pub async fn run<S: Storage>(controller: &mut SessionController<S>) -> Result<Option<SessionSummary>> {
    let mut events = controller
        .take_rest_events()
        .ok_or_else(|| anyhow::anyhow!("rest events already taken"))?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_current(controller);

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                match controller.handle_rest_event(event).await {
                    Ok(RestOutcome::Advanced(advance)) => {
                        println!("Rest over.");
                        print_advance(controller, advance);
                    }
                    Ok(RestOutcome::Resting(_)) => {
                        if let RestEventKind::Tick { remaining } = event.kind {
                            if remaining % 15 == 0 || remaining <= 3 {
                                println!("  rest: {}", format_seconds(remaining.into()));
                            }
                        }
                    }
                    Ok(RestOutcome::Ignored) => {}
                    Err(e) => println!("Error: {}", e),
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    controller.abandon().await?;
                    println!("Input closed, session abandoned.");
                    return Ok(None);
                };
                if line.trim().is_empty() {
                    continue;
                }

                let input = match line.parse::<Input>() {
                    Ok(input) => input,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };

                match handle(controller, input).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Finished(summary)) => return Ok(Some(summary)),
                    Ok(Flow::Abandoned) => return Ok(None),
                    Err(e) => println!("Error: {}", e),
                }
            }
        }
    }
}

enum Flow {
    Continue,
    Finished(SessionSummary),
    Abandoned,
}

async fn handle<S: Storage>(controller: &mut SessionController<S>, input: Input) -> repforge_session::Result<Flow> {
    match input {
        Input::Done { weight, reps, effort } => {
            let defaults = controller.current_defaults();
            let performance = PerformanceEntry::new(weight, reps, effort.unwrap_or(defaults.effort));
            match controller.complete_current_set(performance).await? {
                SetCompletion::Recorded { record, preview } => {
                    let pr = if record.personal_record { "  (new personal record!)" } else { "" };
                    println!("Saved set {}: {} kg x {}{}", record.set_number, weight, reps, pr);
                    print_preview(&preview);
                    if let RestTimerState::Running { remaining, .. } = controller.rest_state().await {
                        println!("Resting {}", format_seconds(remaining.into()));
                    }
                }
                SetCompletion::Ignored => println!("Session is over."),
            }
        }
        Input::Skip => {
            let advance = controller.skip_exercise().await?;
            print_advance(controller, advance);
        }
        Input::Rest(delta) => {
            let outcome = controller.adjust_rest(delta).await?;
            print_rest(controller, outcome);
        }
        Input::Pause => {
            let outcome = controller.pause_rest().await?;
            print_rest(controller, outcome);
        }
        Input::Resume => {
            let outcome = controller.resume_rest().await?;
            print_rest(controller, outcome);
        }
        Input::Next => {
            if let RestOutcome::Advanced(advance) = controller.skip_rest().await? {
                print_advance(controller, advance);
            }
        }
        Input::Status => print_status(controller),
        Input::Finish => {
            let summary = controller.finish().await?;
            print_summary(&summary);
            return Ok(Flow::Finished(summary));
        }
        Input::Quit => {
            controller.abandon().await?;
            println!("Session abandoned.");
            return Ok(Flow::Abandoned);
        }
        Input::Help => println!("{}", HELP),
    }
    Ok(Flow::Continue)
}

fn print_rest<S: Storage>(controller: &SessionController<S>, outcome: RestOutcome) {
    match outcome {
        RestOutcome::Resting(RestTimerState::Running { remaining, .. }) => {
            println!("Resting {}", format_seconds(remaining.into()))
        }
        RestOutcome::Resting(RestTimerState::Paused { remaining, .. }) => {
            println!("Rest paused at {}", format_seconds(remaining.into()))
        }
        RestOutcome::Resting(_) | RestOutcome::Ignored => {}
        RestOutcome::Advanced(advance) => print_advance(controller, advance),
    }
}

fn print_advance<S: Storage>(controller: &SessionController<S>, advance: Advance) {
    match advance {
        Advance::Set(_) => print_current(controller),
        Advance::Finishing => println!("All sets done. Type 'finish' to save the session."),
        Advance::Ignored => {}
    }
}

fn print_current<S: Storage>(controller: &SessionController<S>) {
    let (Some(exercise), Some(pointer), Some(target)) = (
        controller.current_exercise(),
        controller.pointer(),
        controller.current_target(),
    ) else {
        return;
    };
    println!(
        "{} - set {}/{} ({}): {}",
        exercise.exercise.name,
        pointer.set_index() + 1,
        exercise.sets.len(),
        target.kind().as_str(),
        describe_target(target)
    );
}

fn print_preview(preview: &NextSetPreview) {
    match preview {
        NextSetPreview::Set {
            exercise_name,
            set_number,
            sets_in_exercise,
            target_reps,
            target_weight,
            ..
        } => println!(
            "Next: {} set {}/{} - {} kg x {}",
            exercise_name, set_number, sets_in_exercise, target_weight, target_reps
        ),
        NextSetPreview::WorkoutComplete => println!("Next: workout complete"),
    }
}

fn print_status<S: Storage>(controller: &SessionController<S>) {
    let progress = controller.progress();
    println!(
        "State: {} | set {} of {} ({:.0}%)",
        controller.state().name(),
        (progress.global_set_index + 1).min(progress.total_sets),
        progress.total_sets,
        progress.percentage
    );
    for (exercise, statuses) in controller.plan().iter().zip(controller.set_statuses()) {
        let marks: String = statuses
            .iter()
            .map(|s| match s {
                repforge_session::SetStatus::Completed => 'x',
                repforge_session::SetStatus::Current => '>',
                repforge_session::SetStatus::Pending => '.',
            })
            .collect();
        println!("  {:<24} {}", exercise.exercise.name, marks);
    }
    if let SessionState::RestPending { preview, .. } = controller.state() {
        print_preview(preview);
    }
}

fn print_summary(summary: &SessionSummary) {
    let totals = summary.completion.totals;
    println!("Session complete in {}", format_seconds(summary.completion.duration_seconds));
    println!("  Exercises: {}", totals.exercises);
    println!("  Sets: {}", totals.sets);
    println!("  Reps: {}", totals.reps);
    println!("  Volume: {:.1} kg", totals.volume);
    println!("  Personal records: {}", summary.personal_records);
    println!("  Points: {}", summary.completion.reward_points);
}

/// Target of a set as shown to the user.
pub fn describe_target(target: &SetTarget) -> String {
    format!("{} kg x {}", target.weight(), target.rep_target())
}

/// `M:SS`, or `H:MM:SS` past an hour.
pub fn format_seconds(total: u64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_done() {
        assert_eq!(
            "done 80 8".parse::<Input>().unwrap(),
            Input::Done { weight: 80.0, reps: 8, effort: None }
        );
        assert_eq!(
            "d 82.5 6 9".parse::<Input>().unwrap(),
            Input::Done { weight: 82.5, reps: 6, effort: Some(9) }
        );
        assert!("done 80".parse::<Input>().is_err());
        assert!("done heavy 8".parse::<Input>().is_err());
        assert!("done 80 8 7 extra".parse::<Input>().is_err());
    }

    #[test]
    fn test_parse_rest() {
        assert_eq!("rest +30".parse::<Input>().unwrap(), Input::Rest(30));
        assert_eq!("rest -15".parse::<Input>().unwrap(), Input::Rest(-15));
        assert!("rest".parse::<Input>().is_err());
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!("NEXT".parse::<Input>().unwrap(), Input::Next);
        assert_eq!("q".parse::<Input>().unwrap(), Input::Quit);
        assert!("".parse::<Input>().is_err());
        assert!("jump".parse::<Input>().is_err());
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(90), "1:30");
        assert_eq!(format_seconds(5), "0:05");
        assert_eq!(format_seconds(3725), "1:02:05");

        // Long sessions keep every hour.
        let long = (u64::from(u32::MAX) / 3600 + 1) * 3600;
        assert_eq!(format_seconds(long), format!("{}:00:00", long / 3600));
    }
}
