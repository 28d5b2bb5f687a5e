//! coachdesk - command line admin client for the coaching platform

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use coachdesk::api::{ExerciseId, ExerciseInput, ProgramId, WorkoutId};
use coachdesk::auth::{AuthState, DEFAULT_STORAGE_KEY};
use coachdesk::config::ClientOptions;
use coachdesk::editor::validation::validate_exercise_input;
use coachdesk::editor::{ExerciseDefaults, Field, SubmissionOutcome, WorkoutEditor};
use coachdesk::import::ProgramFile;
use coachdesk::Coachdesk;

const DEFAULT_TOKEN_FILE: &str = ".coachdesk-token.json";

#[derive(Parser)]
#[command(name = "coachdesk")]
#[command(author, version, about = "Admin client for the coaching platform")]
struct Cli {
    /// API server root
    #[arg(long, env = "COACHDESK_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// File the bearer token is kept in between runs
    #[arg(long, env = "COACHDESK_TOKEN_PATH", default_value = DEFAULT_TOKEN_FILE)]
    token_file: PathBuf,

    /// Key of the token inside the token file
    #[arg(long, env = "COACHDESK_STORAGE_KEY", default_value = DEFAULT_STORAGE_KEY)]
    storage_key: String,

    /// Request timeout in seconds, 0 for none
    #[arg(long, env = "COACHDESK_TIMEOUT_SECS", default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the token
    Login {
        /// Login email
        username: String,

        /// Read from stdin when not given
        #[arg(short, long, env = "COACHDESK_PASSWORD")]
        password: Option<String>,
    },

    /// Forget the stored token
    Logout,

    /// Show the current session
    Status,

    /// List users
    Users,

    /// Manage programs
    Programs {
        #[command(subcommand)]
        command: ProgramCommands,
    },

    /// List the workouts of a program
    Workouts {
        program: i64,
    },

    /// Manage the exercise catalog
    Exercises {
        #[command(subcommand)]
        command: ExerciseCommands,
    },

    /// List muscle groups
    MuscleGroups,

    /// Edit the exercises of one workout
    Workout {
        #[command(subcommand)]
        command: WorkoutCommands,
    },
}

#[derive(Subcommand)]
enum ProgramCommands {
    /// List programs
    List,

    /// Show one program
    Show { id: i64 },

    /// Delete a program
    Delete { id: i64 },

    /// Create a program from a JSON program file
    Import {
        file: PathBuf,

        /// Check the file and print the request without sending it
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum ExerciseCommands {
    /// List exercises
    List,

    /// Show one exercise
    Show { id: i64 },

    /// Create an exercise from a JSON file
    Create { file: PathBuf },

    /// Replace an exercise from a JSON file
    Update { id: i64, file: PathBuf },

    /// Delete an exercise
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum WorkoutCommands {
    /// Show the exercises and supersets
    Show { workout: i64 },

    /// Move the exercise at position FROM to position TO (1-based)
    Move { workout: i64, from: usize, to: usize },

    /// Put two exercises in a superset
    Pair { workout: i64, first: i64, second: i64 },

    /// Dissolve the superset an exercise is in
    Unpair { workout: i64, exercise: i64 },

    /// Remove an exercise from the workout
    Remove { workout: i64, exercise: i64 },

    /// Add a catalog exercise to the workout
    Add {
        workout: i64,
        exercise: i64,

        #[arg(short, long, default_value = "3")]
        sets: u32,

        #[arg(short, long, default_value = "10")]
        reps: u32,

        #[arg(short, long, default_value = "0")]
        weight: f64,
    },

    /// Step sets, reps or weight up or down
    Adjust {
        workout: i64,
        exercise: i64,

        /// sets, reps or weight
        field: Field,

        /// Steps to apply, negative to decrease
        #[arg(long, default_value = "1", allow_hyphen_values = true)]
        by: i32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("coachdesk=info")),
        )
        .init();

    let cli = Cli::parse();
    let options = ClientOptions::new(&cli.api_url)
        .with_token_file(cli.token_file)
        .with_storage_key(&cli.storage_key)
        .with_request_timeout((cli.timeout > 0).then(|| Duration::from_secs(cli.timeout)));
    let client = Coachdesk::new(options).context("failed to set up the client")?;

    match cli.command {
        Commands::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt("Password: ")?,
            };
            let session = client.login(&username, &password).await?;
            println!(
                "Logged in as {}",
                session.claims.username.as_deref().unwrap_or(&username)
            );
        }
        Commands::Logout => {
            client.logout()?;
            println!("Logged out");
        }
        Commands::Status => match client.auth().state() {
            AuthState::Anonymous => println!("Not logged in"),
            AuthState::Authenticated(session) => {
                println!("Logged in");
                print_claims(&session.claims);
            }
            AuthState::Expired(session) => {
                println!("Session expired, log in again");
                print_claims(&session.claims);
            }
        },
        Commands::Users => {
            for user in client.api().list_users().await? {
                let role = user.role.map(|r| r.to_string()).unwrap_or_default();
                println!(
                    "{:>5}  {:<30} {:<30} {}",
                    user.id,
                    user.display_name(),
                    user.username,
                    role
                );
            }
        }
        Commands::Programs { command } => programs(&client, command).await?,
        Commands::Workouts { program } => {
            for workout in client.api().list_program_workouts(ProgramId(program)).await? {
                println!("{:>5}  {}", workout.id, workout.name);
            }
        }
        Commands::Exercises { command } => exercises(&client, command).await?,
        Commands::MuscleGroups => {
            for group in client.api().list_muscle_groups().await? {
                println!("{:>5}  {}", group.id, group.name);
            }
        }
        Commands::Workout { command } => workout(&client, command).await?,
    }

    Ok(())
}

async fn programs(client: &Coachdesk, command: ProgramCommands) -> Result<()> {
    let api = client.api();
    match command {
        ProgramCommands::List => {
            for program in api.list_programs().await? {
                println!(
                    "{:>5}  {:<30} {:<12} {:<10} {}",
                    program.id, program.name, program.goal, program.program_type, program.start_date
                );
            }
        }
        ProgramCommands::Show { id } => {
            let program = api.get_program(ProgramId(id)).await?;
            println!("{} ({}, {})", program.name, program.goal, program.program_type);
            match program.end_date {
                Some(end) => println!("{} to {}", program.start_date, end),
                None => println!("from {}", program.start_date),
            }
            for workout in &program.workouts {
                println!(
                    "  {:>5}  {} ({} exercises)",
                    workout.id,
                    workout.name,
                    workout.exercises.len()
                );
            }
        }
        ProgramCommands::Delete { id } => {
            api.delete_program(ProgramId(id)).await?;
            println!("Deleted program {}", id);
        }
        ProgramCommands::Import { file, dry_run } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let program_file = ProgramFile::from_json(&text)?;
            let catalog = api.list_exercises().await?;
            let mut wizard = program_file.into_wizard(&catalog)?;

            for step in wizard.steps() {
                if step > wizard.current() {
                    wizard.go_to(step)?;
                }
            }
            let mut submission = wizard.build_submission()?;

            if dry_run {
                println!("{}", serde_json::to_string_pretty(submission.request())?);
                let planned = submission.request().workouts.iter();
                for (workout, editor) in planned.zip(submission.workouts()) {
                    println!("{}:", workout.name);
                    print_editor(editor);
                }
                return Ok(());
            }

            match submission.run(api).await {
                SubmissionOutcome::Completed { program } => {
                    info!("imported {}", file.display());
                    println!("Created program {} ({})", program.id, program.name);
                }
                SubmissionOutcome::Rejected { error } => {
                    bail!("program was not created: {}", error);
                }
                outcome @ SubmissionOutcome::PartiallyCommitted { .. }
                    if outcome.is_baseline_warning() =>
                {
                    if let Some(program) = outcome.program() {
                        println!("Created program {} ({})", program.id, program.name);
                    }
                    if let Some(error) = outcome.error() {
                        println!("warning: baselines were not saved: {}", error);
                    }
                }
                SubmissionOutcome::PartiallyCommitted {
                    program,
                    committed,
                    failed,
                    error,
                } => {
                    println!("Program {} was only partly saved", program.id);
                    for step in &committed {
                        println!("  done:   {}", step);
                    }
                    println!("  failed: {}", failed);
                    bail!("{}", error);
                }
            }
        }
    }
    Ok(())
}

async fn exercises(client: &Coachdesk, command: ExerciseCommands) -> Result<()> {
    let api = client.api();
    match command {
        ExerciseCommands::List => {
            for exercise in api.list_exercises().await? {
                println!(
                    "{:>5}  {:<30} {:<10} {}",
                    exercise.id, exercise.name, exercise.category, exercise.equipment
                );
            }
        }
        ExerciseCommands::Show { id } => {
            let exercise = api.get_exercise(ExerciseId(id)).await?;
            println!("{} ({}, {})", exercise.name, exercise.category, exercise.equipment);
            let groups: Vec<&str> = exercise
                .muscle_groups
                .iter()
                .map(|g| g.name.as_str())
                .collect();
            if !groups.is_empty() {
                println!("Muscle groups: {}", groups.join(", "));
            }
            if let Some(url) = &exercise.video_url {
                println!("Video: {}", url);
            }
            if let Some(notes) = &exercise.notes {
                println!("{}", notes);
            }
        }
        ExerciseCommands::Create { file } => {
            let input = read_exercise_input(&file)?;
            let exercise = api.create_exercise(&input).await?;
            println!("Created exercise {} ({})", exercise.id, exercise.name);
        }
        ExerciseCommands::Update { id, file } => {
            let input = read_exercise_input(&file)?;
            let exercise = api.update_exercise(ExerciseId(id), &input).await?;
            println!("Updated exercise {} ({})", exercise.id, exercise.name);
        }
        ExerciseCommands::Delete { id } => {
            api.delete_exercise(ExerciseId(id)).await?;
            println!("Deleted exercise {}", id);
        }
    }
    Ok(())
}

async fn workout(client: &Coachdesk, command: WorkoutCommands) -> Result<()> {
    let workout_id = WorkoutId(match &command {
        WorkoutCommands::Show { workout }
        | WorkoutCommands::Move { workout, .. }
        | WorkoutCommands::Pair { workout, .. }
        | WorkoutCommands::Unpair { workout, .. }
        | WorkoutCommands::Remove { workout, .. }
        | WorkoutCommands::Add { workout, .. }
        | WorkoutCommands::Adjust { workout, .. } => *workout,
    });

    let Some(mut editor) = client.workout_selector().select(workout_id).await? else {
        bail!("workout {} selection was superseded", workout_id);
    };

    match command {
        WorkoutCommands::Show { .. } => {
            print_editor(&editor);
            return Ok(());
        }
        WorkoutCommands::Move { from, to, .. } => {
            if from == 0 || to == 0 {
                bail!("positions start at 1");
            }
            editor.reorder(from - 1, to - 1)?;
        }
        WorkoutCommands::Pair { first, second, .. } => {
            editor.pair(ExerciseId(first), ExerciseId(second))?;
        }
        WorkoutCommands::Unpair { exercise, .. } => {
            editor.remove_from_superset(ExerciseId(exercise))?;
        }
        WorkoutCommands::Remove { exercise, .. } => {
            let removed = editor.remove_exercise(ExerciseId(exercise))?;
            println!("Removed {}", removed.name);
        }
        WorkoutCommands::Add {
            exercise,
            sets,
            reps,
            weight,
            ..
        } => {
            let exercise = client.api().get_exercise(ExerciseId(exercise)).await?;
            if !editor.add_exercise(&exercise, ExerciseDefaults { sets, reps, weight }) {
                println!("{} is already in this workout", exercise.name);
                return Ok(());
            }
        }
        WorkoutCommands::Adjust {
            exercise, field, by, ..
        } => {
            let id = ExerciseId(exercise);
            for _ in 0..by.unsigned_abs() {
                if by > 0 {
                    editor.increment(id, field)?;
                } else {
                    editor.decrement(id, field)?;
                }
            }
        }
    }

    let report = editor.validate();
    if !report.is_valid {
        bail!("not saved: {}", report.errors.join("; "));
    }
    editor.save(client.api(), workout_id).await?;
    print_editor(&editor);
    Ok(())
}

fn read_exercise_input(file: &Path) -> Result<ExerciseInput> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let input: ExerciseInput = serde_json::from_str(&text)?;
    let report = validate_exercise_input(&input);
    if !report.is_valid {
        let errors: Vec<String> = report
            .errors
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        bail!("invalid exercise: {}", errors.join("; "));
    }
    Ok(input)
}

fn print_editor(editor: &WorkoutEditor) {
    for (position, entry) in editor.entries().iter().enumerate() {
        let superset = entry
            .superset_with
            .map(|partner| format!("  superset with {}", partner))
            .unwrap_or_default();
        println!(
            "{:>3}. [{:>4}] {:<30} {}x{} @ {}kg{}",
            position + 1,
            entry.exercise_id,
            entry.name,
            entry.sets,
            entry.reps,
            entry.weight,
            superset
        );
    }
}

fn print_claims(claims: &coachdesk::auth::TokenClaims) {
    if let Some(username) = &claims.username {
        println!("  user:    {}", username);
    }
    if let Some(role) = &claims.role {
        println!("  role:    {}", role);
    }
    if let Some(exp) = claims.exp.and_then(|exp| chrono::DateTime::from_timestamp(exp, 0)) {
        println!("  expires: {}", exp);
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
