use clap::{Parser, Subcommand, ValueEnum};
use liftlog_core::export::{
    export_weight_log_from, export_workout_log_from, weight_log_file_name, workout_log_file_name,
    write_export,
};
use liftlog_core::journal::{add_weight_entry, parse_set, record_session, remove_last_session};
use liftlog_core::merge::Progress;
use liftlog_core::slug::slugify;
use liftlog_core::state::{current_user, load_weight_logs, set_current_user};
use liftlog_core::store::keys;
use liftlog_core::*;
use std::cell::Cell;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Weight and workout logbook with CSV/JSON import and export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Act as this user instead of the current one
    #[arg(long, global = true)]
    user: Option<String>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Import workout sets, body stats or a logbook backup from CSV or JSON
    Import {
        file: PathBuf,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Export a log to CSV
    Export {
        #[arg(value_enum)]
        kind: ExportKind,

        /// Directory to write the file into
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Body weight log
    Weight {
        #[command(subcommand)]
        command: WeightCommand,
    },

    /// Workout sessions
    Log {
        #[command(subcommand)]
        command: LogCommand,
    },

    /// List built-in and imported exercises
    Exercises,

    /// List built-in and imported routines
    Routines,

    /// Select the current user
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportKind {
    Weight,
    Workouts,
}

#[derive(Subcommand)]
enum WeightCommand {
    /// Log a body weight measurement
    Add {
        /// Weight in kg
        kg: f64,

        #[arg(long)]
        body_fat: Option<f64>,

        #[arg(long)]
        water: Option<f64>,

        #[arg(long)]
        lean: Option<f64>,
    },

    /// Show the weight log
    List,
}

#[derive(Subcommand)]
enum LogCommand {
    /// Record a session for an exercise
    Add {
        /// Exercise id or name
        exercise: String,

        /// A set as REPSxWEIGHT, repeatable
        #[arg(long = "set", required = true)]
        sets: Vec<String>,
    },

    /// Remove the most recent session for an exercise
    Undo { exercise: String },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Remember a user id for later commands
    Set { id: String },

    /// Print the current user
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_with_level(logging::level_for_verbosity(cli.verbose));

    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);
    let mut store = FileStore::new(data_dir);

    match cli.command {
        Commands::Import { ref file, yes } => cmd_import(&mut store, file, yes, &config),
        Commands::Export { kind, ref out } => {
            let user = resolve_user(&cli, &store, &config)?;
            let out_dir = out.clone().unwrap_or_else(|| config.export.output_dir.clone());
            cmd_export(&store, kind, &user, &out_dir)
        }
        Commands::Weight { ref command } => {
            let user = resolve_user(&cli, &store, &config)?;
            match *command {
                WeightCommand::Add {
                    kg,
                    body_fat,
                    water,
                    lean,
                } => {
                    let input = journal::WeightInput {
                        weight: kg,
                        body_fat,
                        water,
                        lean,
                    };
                    cmd_weight_add(&mut store, &user, input)
                }
                WeightCommand::List => cmd_weight_list(&store, &user),
            }
        }
        Commands::Log { ref command } => match command {
            LogCommand::Add { exercise, sets } => cmd_log_add(&mut store, exercise, sets),
            LogCommand::Undo { exercise } => cmd_log_undo(&mut store, exercise),
        },
        Commands::Exercises => cmd_exercises(&store),
        Commands::Routines => cmd_routines(&store),
        Commands::User { ref command } => match command {
            UserCommand::Set { id } => cmd_user_set(&mut store, id),
            UserCommand::Show => {
                let user = resolve_user(&cli, &store, &config)?;
                println!("{}", user);
                Ok(())
            }
        },
    }
}

/// `--user`, then the stored current user, then the config file
fn resolve_user(cli: &Cli, store: &FileStore, config: &Config) -> Result<String> {
    if let Some(user) = cli.user.as_ref().filter(|u| !u.is_empty()) {
        if !keys::is_valid_user_id(user) {
            return Err(Error::Validation(format!("invalid user id {:?}", user)));
        }
        return Ok(user.clone());
    }
    if let Some(user) = current_user(store)? {
        return Ok(user);
    }
    config.user.current_user.clone().ok_or_else(|| {
        Error::Validation("No user selected. Run `liftlog user set <ID>` or pass --user.".into())
    })
}

fn now() -> Timestamp {
    Timestamp::new(chrono::Utc::now())
}

fn cmd_import(store: &mut FileStore, file: &Path, yes: bool, config: &Config) -> Result<()> {
    let chunk_size = config.import.chunk_size;
    let total = Cell::new(0);

    let outcome = import_file(
        store,
        file,
        now(),
        chunk_size,
        |preview| {
            total.set(preview.entry_count);
            yes || confirm_import(preview)
        },
        |progress: Progress| {
            println!("  merged {}/{} entries", progress.processed, total.get());
        },
    );

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e @ (Error::Format(_) | Error::Parse(_))) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        Err(e) => return Err(e),
    };

    match outcome {
        ImportOutcome::Empty(preview) => {
            println!("No entries found in {}", preview.file_name);
        }
        ImportOutcome::Declined(_) => {
            println!("Import cancelled.");
        }
        ImportOutcome::Imported { preview, report } => {
            println!("\n✓ Data imported successfully from {}", preview.file_name);
            display_report(&report);
        }
    }

    Ok(())
}

fn confirm_import(preview: &ImportPreview) -> bool {
    print!(
        "Import {} entries from {}? [y/N] ",
        preview.entry_count, preview.file_name
    );
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

fn display_report(report: &MergeReport) {
    println!(
        "  Sessions: {} added, {} already present",
        report.sessions_added, report.sessions_duplicate
    );
    println!(
        "  Body stats: {} added, {} already present",
        report.body_stats_added, report.body_stats_duplicate
    );
    if report.exercises_created > 0 || report.routines_created > 0 {
        println!(
            "  New exercises: {}, new routines: {}",
            report.exercises_created, report.routines_created
        );
    }
    if report.rows_skipped > 0 {
        println!("  Skipped: {}", report.rows_skipped);
    }

    if !report.diagnostics.is_empty() {
        println!();
        for diagnostic in &report.diagnostics {
            println!("  ! {}", diagnostic);
        }
    }
}

fn cmd_export(store: &FileStore, kind: ExportKind, user: &str, out_dir: &Path) -> Result<()> {
    let (contents, file_name) = match kind {
        ExportKind::Weight => (
            export_weight_log_from(store, user),
            weight_log_file_name(user),
        ),
        ExportKind::Workouts => (export_workout_log_from(store), workout_log_file_name(user)),
    };

    let contents = match contents {
        Ok(contents) => contents,
        Err(Error::NoData(message)) => {
            println!("{}", message);
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let path = write_export(out_dir, &file_name, &contents)?;
    println!("✓ Exported to {}", path.display());
    Ok(())
}

fn cmd_weight_add(store: &mut FileStore, user: &str, input: journal::WeightInput) -> Result<()> {
    let entry = add_weight_entry(store, user, input, now())?;
    println!("✓ Logged {} kg for {}", entry.weight, user);
    Ok(())
}

fn cmd_weight_list(store: &FileStore, user: &str) -> Result<()> {
    let entries = load_weight_logs(store, user)?;
    if entries.is_empty() {
        println!("No weight logs for {}", user);
        return Ok(());
    }

    let show = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
    println!(
        "{:<26} {:>8} {:>8} {:>8} {:>8}",
        "date", "weight", "bodyFat", "water", "lean"
    );
    for entry in &entries {
        println!(
            "{:<26} {:>8} {:>8} {:>8} {:>8}",
            entry.date,
            entry.weight,
            show(entry.body_fat),
            show(entry.water),
            show(entry.lean)
        );
    }
    Ok(())
}

/// Accept either an exercise id or a display name
fn resolve_exercise(logbook: &Logbook, exercise: &str) -> String {
    let catalog = get_default_catalog();
    if catalog
        .find_exercise(&logbook.imported_exercises, exercise)
        .is_some()
    {
        return exercise.to_string();
    }
    slugify(exercise)
}

fn cmd_log_add(store: &mut FileStore, exercise: &str, sets: &[String]) -> Result<()> {
    let sets = sets
        .iter()
        .map(|s| parse_set(s))
        .collect::<Result<Vec<_>>>()?;
    let count = sets.len();

    let mut id = String::new();
    let mut known = false;
    Logbook::update(store, |logbook| {
        id = resolve_exercise(logbook, exercise);
        known = get_default_catalog()
            .find_exercise(&logbook.imported_exercises, &id)
            .is_some();
        record_session(logbook, &id, sets, now())
    })?;

    println!("✓ Logged {} sets of {}", count, id);
    if !known {
        println!("  Note: '{}' is not in the exercise catalog", id);
    }
    Ok(())
}

fn cmd_log_undo(store: &mut FileStore, exercise: &str) -> Result<()> {
    let mut logbook = Logbook::load(store)?;
    let id = resolve_exercise(&logbook, exercise);

    match remove_last_session(&mut logbook, &id) {
        Some(session) => {
            logbook.save(store)?;
            println!("✓ Removed session of {} from {}", id, session.date);
        }
        None => println!("No sessions logged for {}", id),
    }
    Ok(())
}

fn cmd_exercises(store: &FileStore) -> Result<()> {
    let logbook = Logbook::load(store)?;
    let catalog = get_default_catalog();

    for exercise in catalog.all_exercises(&logbook.imported_exercises) {
        let sessions = logbook
            .exercise_logs
            .get(&exercise.id)
            .map_or(0, |s| s.len());
        println!(
            "{:<24} {:<28} {:<12} {} sessions",
            exercise.id, exercise.name, exercise.group, sessions
        );
    }
    Ok(())
}

fn cmd_routines(store: &FileStore) -> Result<()> {
    let logbook = Logbook::load(store)?;
    let catalog = get_default_catalog();

    for routine in catalog.all_routines(&logbook.imported_routines) {
        println!("{} ({})", routine.name, routine.id);
        if !routine.description.is_empty() {
            println!("  {}", routine.description);
        }
        for exercise in &routine.exercises {
            println!("  → {} x{} sets", exercise.name, exercise.sets.len());
        }
    }
    Ok(())
}

fn cmd_user_set(store: &mut FileStore, id: &str) -> Result<()> {
    let id = id.trim();
    set_current_user(store, id)?;
    println!("✓ Current user is now {}", id);
    Ok(())
}
