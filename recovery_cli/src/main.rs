use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand};
use recovery_core::*;
use serde_json::Value;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "heal")]
#[command(about = "Post-surgery recovery tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Patient record to use (defaults to patient.default_id from config)
    #[arg(long, global = true)]
    patient: Option<String>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a daily check-in and show the recovery score
    Checkin(CheckinArgs),

    /// Show recent check-ins, newest first
    History {
        /// Number of check-ins to show
        #[arg(long, default_value_t = 7)]
        limit: usize,
    },

    /// Today's recovery overview
    Dashboard {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask the recovery assistant a question
    Ask {
        /// The question, as one or more words
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,

        /// Conversation id to group related questions
        #[arg(long)]
        session: Option<Uuid>,
    },

    /// Show or update the patient profile
    Profile(ProfileArgs),

    /// Manage medications and log doses
    Med {
        #[command(subcommand)]
        command: MedCommand,
    },

    /// Manage prescribed exercises and log sessions
    Exercise {
        #[command(subcommand)]
        command: ExerciseCommand,
    },

    /// Manage reminders
    Reminder {
        #[command(subcommand)]
        command: ReminderCommand,
    },

    /// Manage family members and what they can see
    Family {
        #[command(subcommand)]
        command: FamilyCommand,
    },

    /// Export the recovery history to CSV
    Export {
        /// Destination CSV file
        path: PathBuf,
    },

    /// Roll up the assistant audit journal to CSV
    Rollup {
        /// Clean up processed journal files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

#[derive(Args)]
struct CheckinArgs {
    /// Share of medicine doses taken, 0-100
    #[arg(long)]
    adherence: Option<u8>,

    /// Share of exercises completed, 0-100
    #[arg(long)]
    exercise: Option<u8>,

    /// Pain score, 0 (none) to 10 (worst)
    #[arg(long)]
    pain: Option<u8>,

    /// great, good, ok, low or struggling
    #[arg(long)]
    mood: Option<Mood>,

    /// none, mild, moderate or severe
    #[arg(long)]
    swelling: Option<Swelling>,

    /// Sleep quality, 0-10
    #[arg(long)]
    sleep: Option<u8>,

    /// Energy level, 0-10
    #[arg(long)]
    energy: Option<u8>,

    #[arg(long)]
    notes: Option<String>,

    /// Symptom to note (repeatable)
    #[arg(long = "symptom")]
    symptoms: Vec<String>,

    /// Date of the check-in (default: today)
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(long)]
    name: Option<String>,

    /// Date of surgery or injury (YYYY-MM-DD)
    #[arg(long)]
    surgery_date: Option<NaiveDate>,

    /// bone_fracture, surgery, injury, physiotherapy or other
    #[arg(long)]
    recovery_type: Option<RecoveryType>,

    #[arg(long)]
    expected_days: Option<u32>,
}

#[derive(Subcommand)]
enum MedCommand {
    /// Add a medication
    Add {
        name: String,
        #[arg(long)]
        dosage: Option<String>,
        #[arg(long)]
        frequency: Option<TaskFrequency>,
        /// Dose time as HH:MM (repeatable, default 08:00)
        #[arg(long = "time")]
        times: Vec<String>,
        #[arg(long)]
        with_food: bool,
        #[arg(long)]
        instructions: Option<String>,
    },
    /// List medications
    List,
    /// Change a medication
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        dosage: Option<String>,
        #[arg(long)]
        frequency: Option<TaskFrequency>,
        /// Replacement dose times (repeatable)
        #[arg(long = "time")]
        times: Vec<String>,
        #[arg(long)]
        instructions: Option<String>,
        /// true or false
        #[arg(long)]
        active: Option<bool>,
        #[arg(long)]
        end_date: Option<NaiveDate>,
    },
    /// Remove a medication
    Remove { id: Uuid },
    /// Log a dose
    Log {
        id: Uuid,
        /// Dose slot (default: next unlogged slot)
        #[arg(long)]
        time: Option<String>,
        /// taken, missed, skipped or pending
        #[arg(long, default_value = "taken")]
        status: DoseStatus,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show the dose schedule for a day
    Today {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum ExerciseCommand {
    /// Add an exercise to the plan
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        minutes: Option<u32>,
        /// Day of week, 0 = Sunday (repeatable, default every day)
        #[arg(long = "day")]
        days: Vec<u8>,
        /// Instruction step (repeatable)
        #[arg(long = "step")]
        steps: Vec<String>,
    },
    /// List exercises
    List,
    /// Change an exercise
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        minutes: Option<u32>,
        /// Replacement days of week, 0 = Sunday (repeatable)
        #[arg(long = "day")]
        days: Vec<u8>,
        /// true or false
        #[arg(long)]
        active: Option<bool>,
    },
    /// Remove an exercise
    Remove { id: Uuid },
    /// Log an exercise session
    Log {
        id: Uuid,
        /// completed, partial, skipped or pending
        #[arg(long, default_value = "completed")]
        status: ExerciseStatus,
        /// Pain during the exercise, 0-10
        #[arg(long)]
        pain: Option<u8>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show the exercises planned for a day
    Today {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum ReminderCommand {
    /// Add a reminder
    Add {
        title: String,
        /// When, as "YYYY-MM-DD HH:MM" local time or RFC 3339
        #[arg(long)]
        at: String,
        /// medication, exercise, meal, hydration or custom
        #[arg(long, default_value = "custom")]
        kind: ReminderKind,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        recurring: bool,
    },
    /// List all reminders
    List,
    /// Show the next active reminders
    Upcoming,
    /// Pause or resume a reminder
    Toggle { id: Uuid },
    /// Delete a reminder
    Remove { id: Uuid },
}

#[derive(Subcommand)]
enum FamilyCommand {
    /// Give a family member access
    Add {
        name: String,
        email: String,
        #[arg(long, default_value = "")]
        relationship: String,
    },
    /// List family members and their permissions
    List,
    /// Change what a family member can see
    Permit {
        id: Uuid,
        #[arg(long)]
        progress: Option<bool>,
        #[arg(long)]
        medications: Option<bool>,
        #[arg(long)]
        exercises: Option<bool>,
        #[arg(long)]
        mood: Option<bool>,
        #[arg(long)]
        pain: Option<bool>,
        /// realtime, daily, weekly or milestone_only
        #[arg(long)]
        frequency: Option<UpdateFrequency>,
    },
    /// Revoke a family member's access
    Remove { id: Uuid },
    /// Show what a family member sees
    Summary {
        id: Uuid,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
}

/// Resolved paths and settings shared by every command
struct App {
    data_dir: PathBuf,
    patient: String,
    config: Config,
    store: PatientStore,
}

impl App {
    fn wal_dir(&self) -> PathBuf {
        self.data_dir.join("wal")
    }

    fn audit_wal_path(&self) -> PathBuf {
        self.wal_dir().join("ai_interactions.wal")
    }

    fn audit_csv_path(&self) -> PathBuf {
        self.data_dir.join("ai_interactions.csv")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        recovery_core::logging::init_with_level("debug");
    } else {
        recovery_core::logging::init();
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let patient = cli
        .patient
        .unwrap_or_else(|| config.patient.default_id.clone());

    let app = App {
        store: PatientStore::new(&data_dir),
        data_dir,
        patient,
        config,
    };

    match cli.command {
        Commands::Checkin(args) => cmd_checkin(&app, args),
        Commands::History { limit } => cmd_history(&app, limit),
        Commands::Dashboard { json } => cmd_dashboard(&app, json),
        Commands::Ask { message, session } => cmd_ask(&app, &message.join(" "), session),
        Commands::Profile(args) => cmd_profile(&app, args),
        Commands::Med { command } => cmd_med(&app, command),
        Commands::Exercise { command } => cmd_exercise(&app, command),
        Commands::Reminder { command } => cmd_reminder(&app, command),
        Commands::Family { command } => cmd_family(&app, command),
        Commands::Export { path } => cmd_export(&app, path),
        Commands::Rollup { cleanup } => cmd_rollup(&app, cleanup),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// snake_case wire name of an enum value
fn label<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(Value::String(s)) => s,
        _ => String::from("?"),
    }
}

fn parse_when(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%d %H:%M")
        .ok()
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            Error::Validation(format!(
                "invalid time '{}', expected \"YYYY-MM-DD HH:MM\" or RFC 3339",
                value
            ))
        })
}

fn cmd_checkin(app: &App, args: CheckinArgs) -> Result<()> {
    let date = args.date.unwrap_or_else(today);
    let check_in = CheckIn {
        medicine_adherence_percent: args.adherence,
        exercise_completion_percent: args.exercise,
        pain_score: args.pain,
        mood: args.mood,
        swelling: args.swelling,
        sleep_quality: args.sleep,
        energy_level: args.energy,
        notes: args.notes,
        symptoms: args.symptoms,
    };

    let log = app
        .store
        .update(&app.patient, |record| log_check_in(record, date, &check_in, Utc::now()))?;

    println!("✓ Check-in saved for {}", log.log_date);
    if let Some(day) = log.day_number {
        println!("  Day {} of recovery", day);
    }
    println!("  Recovery score: {}/100", log.recovery_score);
    println!("  Trend: {}", log.trend);

    match log.trend {
        Trend::Critical => println!(
            "\n  Your score is far below last week's average. Please contact your care team."
        ),
        Trend::Warning => {
            println!("\n  Your score has dropped compared with last week. Keep an eye on it.")
        }
        Trend::Improving | Trend::Stable => {}
    }

    Ok(())
}

fn cmd_history(app: &App, limit: usize) -> Result<()> {
    let record = app.store.load(&app.patient)?;

    if record.recovery_logs.is_empty() {
        println!("No check-ins yet.");
        return Ok(());
    }

    println!("Date        Score  Trend      Pain  Mood");
    for log in record.recovery_logs.values().rev().take(limit) {
        println!(
            "{}  {:>5}  {:<9}  {:>4}  {}",
            log.log_date,
            log.recovery_score,
            log.trend.as_str(),
            log.pain_score,
            log.mood.as_str()
        );
    }
    Ok(())
}

fn cmd_dashboard(app: &App, json: bool) -> Result<()> {
    let record = app.store.load(&app.patient)?;
    let board = dashboard(&record, today());

    if json {
        println!("{}", serde_json::to_string_pretty(&board)?);
        return Ok(());
    }

    if let Some(name) = &record.profile.name {
        println!("{}", name);
    }
    if let Some(day) = board.days_since_surgery {
        println!("Day {} of recovery", day);
    }
    match (board.recovery_score, board.trend, board.last_check_in) {
        (Some(score), Some(trend), Some(date)) => {
            println!("Recovery score: {}/100 ({}, last check-in {})", score, trend, date)
        }
        _ => println!("No check-ins yet. Run `heal checkin` to get a recovery score."),
    }
    println!(
        "Weekly averages: adherence {}%, exercise {}%, pain {}/10",
        board.weekly.medicine_adherence, board.weekly.exercise_completion, board.weekly.pain_score
    );
    println!(
        "Today: {}/{} doses taken, {}/{} exercises done",
        board.doses_taken_today,
        board.doses_scheduled_today,
        board.exercises_completed_today,
        board.exercises_scheduled_today
    );
    Ok(())
}

fn cmd_ask(app: &App, message: &str, session: Option<Uuid>) -> Result<()> {
    // Reject ids that could not name a record before auditing under them
    app.store.record_path(&app.patient)?;

    let assistant = Assistant::from_config(&app.config.assistant)?;
    let mut audit = JsonlSink::new(app.audit_wal_path());
    let session = session.unwrap_or_else(Uuid::new_v4);

    let reply = assistant.chat(&mut audit, &app.patient, session, message, Utc::now())?;

    println!("{}", reply.message);
    if reply.safety_flag != SafetyFlag::Safe {
        println!("\n[safety: {}]", reply.safety_flag);
    }
    tracing::debug!("Interaction {} in session {}", reply.interaction_id, session);
    Ok(())
}

fn cmd_profile(app: &App, args: ProfileArgs) -> Result<()> {
    let changed = args.name.is_some()
        || args.surgery_date.is_some()
        || args.recovery_type.is_some()
        || args.expected_days.is_some();

    let profile = if changed {
        app.store.update(&app.patient, |record| {
            let profile = &mut record.profile;
            if let Some(name) = args.name {
                profile.name = Some(name);
            }
            if let Some(date) = args.surgery_date {
                profile.surgery_date = Some(date);
            }
            if let Some(kind) = args.recovery_type {
                profile.recovery_type = Some(kind);
            }
            if let Some(days) = args.expected_days {
                profile.expected_recovery_days = Some(days);
            }
            Ok(profile.clone())
        })?
    } else {
        app.store.load(&app.patient)?.profile
    };

    println!("Patient: {}", app.patient);
    println!("  Name: {}", profile.name.as_deref().unwrap_or("-"));
    match (profile.surgery_date, profile.day_number(today())) {
        (Some(date), Some(day)) => println!("  Surgery date: {} (day {})", date, day),
        (Some(date), None) => println!("  Surgery date: {} (upcoming)", date),
        (None, _) => println!("  Surgery date: -"),
    }
    println!(
        "  Recovery type: {}",
        profile.recovery_type.map_or_else(|| "-".to_string(), |t| label(&t))
    );
    if let Some(days) = profile.expected_recovery_days {
        println!("  Expected recovery: {} days", days);
    }
    Ok(())
}

fn cmd_med(app: &App, command: MedCommand) -> Result<()> {
    match command {
        MedCommand::Add {
            name,
            dosage,
            frequency,
            times,
            with_food,
            instructions,
        } => {
            let new = NewMedication {
                name,
                dosage,
                frequency,
                times: (!times.is_empty()).then_some(times),
                with_food,
                instructions,
            };
            let med = app.store.update(&app.patient, |record| {
                medications::add_medication(record, new, today())
            })?;
            println!("✓ Added {} {} at {}", med.name, med.dosage, med.times.join(", "));
            println!("  id: {}", med.id);
        }

        MedCommand::List => {
            let record = app.store.load(&app.patient)?;
            if record.medications.is_empty() {
                println!("No medications.");
            }
            for med in &record.medications {
                println!(
                    "{}  {} {}  {} at {}{}{}",
                    med.id,
                    med.name,
                    med.dosage,
                    label(&med.frequency),
                    med.times.join(", "),
                    if med.with_food { ", with food" } else { "" },
                    if med.is_active { "" } else { " (inactive)" }
                );
            }
        }

        MedCommand::Update {
            id,
            name,
            dosage,
            frequency,
            times,
            instructions,
            active,
            end_date,
        } => {
            let update = MedicationUpdate {
                name,
                dosage,
                frequency,
                times: (!times.is_empty()).then_some(times),
                instructions,
                is_active: active,
                end_date,
            };
            let med = app.store.update(&app.patient, |record| {
                medications::update_medication(record, id, update)
            })?;
            println!("✓ Updated {} {}", med.name, med.dosage);
        }

        MedCommand::Remove { id } => {
            let med = app
                .store
                .update(&app.patient, |record| medications::remove_medication(record, id))?;
            println!("✓ Removed {}", med.name);
        }

        MedCommand::Log {
            id,
            time,
            status,
            date,
        } => {
            let date = date.unwrap_or_else(today);
            let log = app.store.update(&app.patient, |record| {
                medications::log_dose(record, id, date, time.as_deref(), status, Utc::now())
            })?;
            println!(
                "✓ Dose {} {} marked {}",
                log.scheduled_date,
                log.scheduled_time,
                label(&log.status)
            );
        }

        MedCommand::Today { date } => {
            let record = app.store.load(&app.patient)?;
            let schedule = medications::today_schedule(&record, date.unwrap_or_else(today));
            if schedule.is_empty() {
                println!("No doses scheduled.");
            }
            for slot in schedule {
                println!("{}  {:<8} {}", slot.time, label(&slot.status), slot.medication);
            }
        }
    }
    Ok(())
}

fn cmd_exercise(app: &App, command: ExerciseCommand) -> Result<()> {
    match command {
        ExerciseCommand::Add {
            name,
            description,
            minutes,
            days,
            steps,
        } => {
            let new = NewExercise {
                name,
                description,
                duration_minutes: minutes,
                frequency: None,
                days_of_week: (!days.is_empty()).then_some(days),
                instructions: steps,
            };
            let exercise = app
                .store
                .update(&app.patient, |record| exercises::add_exercise(record, new))?;
            println!("✓ Added {} ({} min)", exercise.name, exercise.duration_minutes);
            println!("  id: {}", exercise.id);
        }

        ExerciseCommand::List => {
            let record = app.store.load(&app.patient)?;
            if record.exercises.is_empty() {
                println!("No exercises.");
            }
            for exercise in &record.exercises {
                let days: Vec<String> =
                    exercise.days_of_week.iter().map(|d| d.to_string()).collect();
                println!(
                    "{}  {}  {} min  days {}{}",
                    exercise.id,
                    exercise.name,
                    exercise.duration_minutes,
                    days.join(","),
                    if exercise.is_active { "" } else { " (inactive)" }
                );
                for (i, step) in exercise.instructions.iter().enumerate() {
                    println!("      {}. {}", i + 1, step);
                }
            }
        }

        ExerciseCommand::Update {
            id,
            name,
            description,
            minutes,
            days,
            active,
        } => {
            let update = ExerciseUpdate {
                name,
                description,
                duration_minutes: minutes,
                days_of_week: (!days.is_empty()).then_some(days),
                is_active: active,
            };
            let exercise = app.store.update(&app.patient, |record| {
                exercises::update_exercise(record, id, update)
            })?;
            println!("✓ Updated {} ({} min)", exercise.name, exercise.duration_minutes);
        }

        ExerciseCommand::Remove { id } => {
            let exercise = app
                .store
                .update(&app.patient, |record| exercises::remove_exercise(record, id))?;
            println!("✓ Removed {}", exercise.name);
        }

        ExerciseCommand::Log {
            id,
            status,
            pain,
            notes,
            date,
        } => {
            let date = date.unwrap_or_else(today);
            let log = app.store.update(&app.patient, |record| {
                exercises::log_exercise(record, id, date, status, pain, notes, Utc::now())
            })?;
            println!("✓ Exercise on {} marked {}", log.scheduled_date, label(&log.status));
        }

        ExerciseCommand::Today { date } => {
            let record = app.store.load(&app.patient)?;
            let plan = exercises::today_schedule(&record, date.unwrap_or_else(today));
            if plan.is_empty() {
                println!("No exercises planned.");
            }
            for slot in plan {
                println!(
                    "{:<9} {} ({} min)",
                    label(&slot.status),
                    slot.exercise,
                    slot.duration_minutes
                );
            }
        }
    }
    Ok(())
}

fn print_reminder(reminder: &Reminder) {
    println!(
        "{}  {}  [{}] {}{}{}",
        reminder.id,
        reminder.scheduled_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        label(&reminder.kind),
        reminder.title,
        if reminder.recurring { " (recurring)" } else { "" },
        if reminder.is_active { "" } else { " (paused)" }
    );
}

fn cmd_reminder(app: &App, command: ReminderCommand) -> Result<()> {
    match command {
        ReminderCommand::Add {
            title,
            at,
            kind,
            message,
            recurring,
        } => {
            let scheduled_at = parse_when(&at)?;
            let reminder = app.store.update(&app.patient, |record| {
                reminders::add_reminder(record, kind, &title, message, scheduled_at, recurring)
            })?;
            println!("✓ Reminder set");
            print_reminder(&reminder);
        }

        ReminderCommand::List => {
            let record = app.store.load(&app.patient)?;
            let all = reminders::list_reminders(&record);
            if all.is_empty() {
                println!("No reminders.");
            }
            all.into_iter().for_each(print_reminder);
        }

        ReminderCommand::Upcoming => {
            let record = app.store.load(&app.patient)?;
            let next = reminders::upcoming(&record, Utc::now());
            if next.is_empty() {
                println!("Nothing coming up.");
            }
            next.into_iter().for_each(print_reminder);
        }

        ReminderCommand::Toggle { id } => {
            let reminder = app
                .store
                .update(&app.patient, |record| reminders::toggle_reminder(record, id))?;
            let state = if reminder.is_active { "resumed" } else { "paused" };
            println!("✓ {} {}", reminder.title, state);
        }

        ReminderCommand::Remove { id } => {
            let reminder = app
                .store
                .update(&app.patient, |record| reminders::remove_reminder(record, id))?;
            println!("✓ Removed {}", reminder.title);
        }
    }
    Ok(())
}

fn cmd_family(app: &App, command: FamilyCommand) -> Result<()> {
    match command {
        FamilyCommand::Add {
            name,
            email,
            relationship,
        } => {
            let member = app.store.update(&app.patient, |record| {
                family::add_member(record, &name, &email, &relationship, Utc::now())
            })?;
            println!("✓ Added {} <{}>", member.name, member.email);
            println!("  id: {}", member.id);
        }

        FamilyCommand::List => {
            let record = app.store.load(&app.patient)?;
            if record.family.is_empty() {
                println!("No family members.");
            }
            for member in &record.family {
                let p = &member.permissions;
                let visible: Vec<&str> = [
                    (p.can_view_progress, "progress"),
                    (p.can_view_medications, "medications"),
                    (p.can_view_exercises, "exercises"),
                    (p.can_view_mood, "mood"),
                    (p.can_view_pain_score, "pain"),
                ]
                .into_iter()
                .filter_map(|(allowed, name)| allowed.then_some(name))
                .collect();
                println!(
                    "{}  {} <{}> {}  sees: {}  updates: {}",
                    member.id,
                    member.name,
                    member.email,
                    member.relationship,
                    visible.join(", "),
                    label(&p.update_frequency)
                );
            }
        }

        FamilyCommand::Permit {
            id,
            progress,
            medications,
            exercises,
            mood,
            pain,
            frequency,
        } => {
            let update = PermissionUpdate {
                can_view_progress: progress,
                can_view_medications: medications,
                can_view_exercises: exercises,
                can_view_mood: mood,
                can_view_pain_score: pain,
                update_frequency: frequency,
            };
            let member = app.store.update(&app.patient, |record| {
                family::update_permissions(record, id, update)
            })?;
            println!("✓ Updated permissions for {}", member.name);
        }

        FamilyCommand::Remove { id } => {
            let member = app
                .store
                .update(&app.patient, |record| family::remove_member(record, id))?;
            println!("✓ Removed {}", member.name);
        }

        FamilyCommand::Summary { id, date, json } => {
            let record = app.store.load(&app.patient)?;
            let summary = family_summary(&record, id, date.unwrap_or_else(today))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }
            if let Some(score) = summary.recovery_score {
                println!("Recovery score: {}/100", score);
            }
            if let Some(trend) = summary.trend {
                println!("Trend: {}", trend);
            }
            if let Some(day) = summary.days_since_surgery {
                println!("Day {} of recovery", day);
            }
            if let Some(mood) = summary.current_mood {
                println!("Mood: {}", mood.as_str());
            }
            if let Some(pain) = summary.pain_score {
                println!("Pain: {}/10", pain);
            }
            if let Some(taken) = summary.medications_taken {
                println!("Medications taken today: {}", if taken { "yes" } else { "no" });
            }
            if let Some(done) = summary.exercises_completed {
                println!("Exercises done today: {}", if done { "yes" } else { "no" });
            }
            if summary == FamilySummary::default() {
                println!("Nothing to share yet.");
            }
        }
    }
    Ok(())
}

fn cmd_export(app: &App, path: PathBuf) -> Result<()> {
    let record = app.store.load(&app.patient)?;
    let count = csv_rollup::export_recovery_csv(&record, &path)?;
    println!("✓ Exported {} check-ins to {}", count, path.display());
    Ok(())
}

fn cmd_rollup(app: &App, cleanup: bool) -> Result<()> {
    let wal_dir = app.wal_dir();
    let wal_path = app.audit_wal_path();
    let csv_path = app.audit_csv_path();

    if !wal_path.exists() {
        println!("No audit journal found - nothing to roll up.");
        return Ok(());
    }

    let count = csv_rollup::wal_to_csv_and_archive(&wal_path, &csv_path)?;

    println!("✓ Rolled up {} assistant interactions to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        let cleaned = csv_rollup::cleanup_processed_wals(&wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed journal files", cleaned);
        }
    }

    Ok(())
}
