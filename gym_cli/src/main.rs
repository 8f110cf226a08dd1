use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use gym_core::providers::StorageProvider;
use gym_core::stats;
use gym_core::*;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gymlog")]
#[command(about = "Workout tracker: routines, sets, personal records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved routines (default)
    Routines,

    /// Create, edit or delete a routine
    Routine {
        #[command(subcommand)]
        action: RoutineCommand,
    },

    /// List the exercise catalog, including custom exercises
    Exercises {
        /// Only show one muscle group
        #[arg(long)]
        muscle: Option<MuscleGroup>,
    },

    /// Manage custom exercises
    Exercise {
        #[command(subcommand)]
        action: ExerciseCommand,
    },

    /// Start a workout from a routine
    Start { routine_id: String },

    /// Log a set in the current workout
    Log {
        exercise: String,
        weight: String,
        reps: String,
    },

    /// Add an exercise that is not in the routine to the current workout
    Add { exercise: String },

    /// Delete a logged set (1-based index as shown by `status`)
    Undo {
        exercise: String,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        index: u32,
    },

    /// Show the current workout
    Status,

    /// Finish the current workout and save it
    Finish,

    /// Discard the current workout
    Cancel,

    /// List finished sessions, newest first
    History {
        #[arg(long)]
        range: Option<ChartRange>,
    },

    /// Training statistics
    Stats {
        #[arg(long)]
        range: Option<ChartRange>,
    },

    /// Manage finished sessions
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },

    /// Export every logged set to CSV
    Export { path: PathBuf },

    /// Show or change preferences
    Prefs {
        /// Training days per week (1-7)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=7))]
        weekly_goal: Option<u8>,

        /// Interface language (es, en, fr)
        #[arg(long)]
        lang: Option<Lang>,

        /// Default rest between sets in seconds (60, 90, 120, 180)
        #[arg(long, value_parser = parse_rest_timer)]
        rest_timer: Option<RestTimer>,
    },
}

#[derive(Subcommand)]
enum RoutineCommand {
    /// Save a routine; `--mode edit --id <id>` updates an existing one
    Save {
        /// Form mode; defaults to new
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Routine to edit
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        name: Option<String>,

        /// Comma-separated exercise ids
        #[arg(long, value_delimiter = ',')]
        exercises: Option<Vec<String>>,
    },

    /// Delete a routine
    Delete { id: String },
}

#[derive(Subcommand)]
enum ExerciseCommand {
    /// Define a custom exercise
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        muscle: MuscleGroup,
    },
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Delete a finished session by id (as shown by `history`)
    Delete { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    New,
    Edit,
}

impl From<ModeArg> for FormMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::New => FormMode::New,
            ModeArg::Edit => FormMode::Edit,
        }
    }
}

fn parse_rest_timer(s: &str) -> std::result::Result<RestTimer, String> {
    let seconds: u32 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    RestTimer::try_from(seconds).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    gym_core::logging::init(cli.verbose);

    let config = Config::load()?.with_data_dir(cli.data_dir);
    tracing::debug!("Using data directory {:?}", config.data.data_dir);
    let storage = Arc::new(LocalStorage::new(config.data.data_dir.clone()));
    let tracker = Tracker::new(storage.clone());

    match cli.command.unwrap_or(Commands::Routines) {
        Commands::Routines => cmd_routines(&tracker).await,
        Commands::Routine { action } => match action {
            RoutineCommand::Save {
                mode,
                id,
                name,
                exercises,
            } => {
                let draft = RoutineDraft { name, exercises };
                cmd_routine_save(storage.as_ref(), mode.map(FormMode::from), id, draft).await
            }
            RoutineCommand::Delete { id } => {
                storage.delete_routine(&id).await?;
                println!("✓ Deleted routine {}", id);
                Ok(())
            }
        },
        Commands::Exercises { muscle } => cmd_exercises(&tracker, muscle).await,
        Commands::Exercise { action } => match action {
            ExerciseCommand::Add { id, name, muscle } => {
                cmd_exercise_add(storage.as_ref(), id, name, muscle).await
            }
        },
        Commands::Start { routine_id } => {
            let workout = tracker.start(&routine_id, Utc::now()).await?;
            println!("✓ Started {}", workout.routine_name);
            cmd_status(&tracker).await
        }
        Commands::Log {
            exercise,
            weight,
            reps,
        } => {
            let set = tracker.log_set(&exercise, &weight, &reps).await?;
            let catalog = tracker.catalog().await?;
            print!(
                "✓ {}: {} × {}",
                catalog.display_name(&exercise),
                set.weight,
                set.reps
            );
            if set.is_pr() {
                print!("  🏆 PR");
            }
            println!();
            Ok(())
        }
        Commands::Add { exercise } => {
            if tracker.add_exercise(&exercise).await? {
                println!("✓ Added {}", exercise);
            } else {
                println!("{} is already in this workout", exercise);
            }
            Ok(())
        }
        Commands::Undo { exercise, index } => {
            let removed = tracker.delete_set(&exercise, index as usize - 1).await?;
            println!("✓ Removed {} × {}", removed.weight, removed.reps);
            Ok(())
        }
        Commands::Status => cmd_status(&tracker).await,
        Commands::Finish => {
            let session = tracker.finish(Utc::now()).await?;
            println!(
                "✓ Saved {}: {} sets in {} min",
                session.routine_name,
                session.set_count(),
                session.duration
            );
            Ok(())
        }
        Commands::Cancel => {
            if tracker.cancel().await? {
                println!("✓ Workout discarded");
            } else {
                println!("No workout in progress.");
            }
            Ok(())
        }
        Commands::History { range } => {
            cmd_history(storage.as_ref(), range.unwrap_or(config.stats.default_range)).await
        }
        Commands::Stats { range } => {
            cmd_stats(&tracker, range.unwrap_or(config.stats.default_range)).await
        }
        Commands::Session { action } => match action {
            SessionCommand::Delete { id } => {
                storage.delete_session(&id).await?;
                println!("✓ Deleted session {}", id);
                Ok(())
            }
        },
        Commands::Export { path } => {
            let mut sessions = storage.get_sessions().await?;
            sessions.reverse();
            let rows = export_sessions(&sessions, &path)?;
            println!("✓ Exported {} sets to {}", rows, path.display());
            Ok(())
        }
        Commands::Prefs {
            weekly_goal,
            lang,
            rest_timer,
        } => {
            let patch = PreferencesPatch {
                weekly_goal,
                lang,
                rest_timer_default: rest_timer,
                ..Default::default()
            };
            cmd_prefs(storage.as_ref(), patch).await
        }
    }
}

async fn cmd_routines(tracker: &Tracker) -> Result<()> {
    let routines = tracker.storage().get_routines().await?;
    if routines.is_empty() {
        println!("No routines. Create one with `gymlog routine save`.");
        return Ok(());
    }

    let catalog = tracker.catalog().await?;
    for routine in routines {
        println!("{}  {}", routine.id, routine.name);
        let names: Vec<&str> = routine
            .exercises
            .iter()
            .map(|id| catalog.display_name(id))
            .collect();
        println!("    {}", names.join(", "));
    }
    Ok(())
}

async fn cmd_routine_save(
    storage: &dyn StorageProvider,
    mode: Option<FormMode>,
    id: Option<String>,
    draft: RoutineDraft,
) -> Result<()> {
    let form = RoutineForm::open(storage, mode, id.as_deref()).await?;
    let routine = form.submit(storage, draft).await?;
    let verb = match form.mode() {
        FormMode::New => "Created",
        FormMode::Edit => "Updated",
    };
    println!("✓ {} routine {} ({})", verb, routine.name, routine.id);
    Ok(())
}

async fn cmd_exercises(tracker: &Tracker, muscle: Option<MuscleGroup>) -> Result<()> {
    let catalog = tracker.catalog().await?;
    let groups = match muscle {
        Some(m) => vec![m],
        None => MuscleGroup::ALL.to_vec(),
    };
    for group in groups {
        println!("{}", group);
        for exercise in catalog.by_muscle(group) {
            println!("  {:<24} {}", exercise.id, exercise.name);
        }
    }
    Ok(())
}

async fn cmd_exercise_add(
    storage: &dyn StorageProvider,
    id: String,
    name: String,
    muscle: MuscleGroup,
) -> Result<()> {
    let id = id.trim().to_string();
    let name = name.trim().to_string();
    if id.is_empty() || name.is_empty() {
        return Err(Error::Validation("exercise id and name are required".into()));
    }
    let exercise = storage
        .save_custom_exercise(Exercise::new(id, name, muscle))
        .await?;
    println!("✓ Saved {} ({}, {})", exercise.name, exercise.id, exercise.muscle);
    Ok(())
}

async fn cmd_status(tracker: &Tracker) -> Result<()> {
    let Some(workout) = tracker.active().await? else {
        println!("No workout in progress.");
        return Ok(());
    };

    let routine = tracker.routine(&workout.routine_id).await?;
    let catalog = tracker.catalog().await?;

    println!(
        "{} · {} min · {} sets",
        workout.routine_name,
        workout.elapsed_minutes(Utc::now()),
        workout.set_count()
    );

    for exercise_id in workout.display_order(routine.as_ref()) {
        println!("  {} [{}]", catalog.display_name(&exercise_id), exercise_id);
        for (i, set) in workout.logs.get(&exercise_id).into_iter().flatten().enumerate() {
            let marker = if set.is_pr() { "  PR" } else { "" };
            println!("    {}. {} × {}{}", i + 1, set.weight, set.reps, marker);
        }
    }
    Ok(())
}

async fn cmd_history(storage: &dyn StorageProvider, range: ChartRange) -> Result<()> {
    let sessions = storage.get_sessions().await?;
    let recent = stats::filter_by_range(&sessions, range, Utc::now());
    if recent.is_empty() {
        println!("No sessions in the last {} ({} days).", range, range.days());
        return Ok(());
    }

    for session in recent {
        println!(
            "{}  {:<20} {:>4} min  {:>3} sets  {}",
            session.date.format("%Y-%m-%d %H:%M"),
            session.routine_name,
            session.duration,
            session.set_count(),
            session.id
        );
    }
    Ok(())
}

async fn cmd_stats(tracker: &Tracker, range: ChartRange) -> Result<()> {
    let now = Utc::now();
    let sessions = tracker.storage().get_sessions().await?;
    let prefs = tracker.storage().get_preferences().await?;
    let catalog = tracker.catalog().await?;
    let recent = stats::filter_by_range(&sessions, range, now);

    let volume: f64 = stats::volume_data(recent.iter().copied(), &catalog)
        .iter()
        .map(|p| p.volume)
        .sum();

    println!("Range: {}", range);
    println!("  Sessions:     {}", recent.len());
    println!("  Volume:       {:.0} kg", volume);
    println!("  Avg duration: {} min", stats::avg_duration(&sessions));
    println!(
        "  Streak:       {} weeks (goal {} days/week)",
        stats::compute_streak(&sessions, prefs.weekly_goal, now),
        prefs.weekly_goal
    );
    if let Some(fav) = stats::fav_exercise(&sessions) {
        println!("  Favourite:    {}", catalog.display_name(&fav));
    }

    let frequency = stats::frequency_data(recent.iter().copied());
    if !frequency.is_empty() {
        println!("Sessions per week");
        for week in frequency {
            println!("  {}  {}", week.week, week.count);
        }
    }

    let split = stats::muscle_split_data(recent.iter().copied(), &catalog);
    if !split.is_empty() {
        println!("Sets per muscle group");
        for entry in split {
            println!("  {:<12} {}", entry.muscle, entry.sets);
        }
    }

    let bests = pr::personal_bests(&sessions);
    if !bests.is_empty() {
        println!("Personal bests");
        for (exercise_id, weight) in bests {
            println!("  {:<24} {}", catalog.display_name(&exercise_id), weight);
        }
    }
    Ok(())
}

async fn cmd_prefs(storage: &dyn StorageProvider, patch: PreferencesPatch) -> Result<()> {
    if !patch.is_empty() {
        storage.save_preferences(patch).await?;
        println!("✓ Preferences updated");
    }

    let prefs = storage.get_preferences().await?;
    println!("weekly_goal = {}", prefs.weekly_goal);
    println!("lang        = {:?}", prefs.lang);
    println!("rest_timer  = {}s", prefs.rest_timer_default.seconds());
    println!("theme       = {:?}", prefs.theme);
    Ok(())
}
