use chrono::{DateTime, NaiveDate, Utc, Weekday};
use clap::{Parser, Subcommand};
use medledger_core::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "medledger")]
#[command(about = "Medication supply and adherence tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a medication and print its id
    Add(AddArgs),

    /// List medications
    List,

    /// Show a medication's current status
    Show {
        id: String,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a medication's intake log
    Log { id: String },

    /// Record a dose
    Take {
        id: String,

        /// Dose amount
        #[arg(long, default_value_t = 1.0)]
        dose: f64,

        /// Dose unit (mg, pill, ml, spray, drop, puff, application)
        #[arg(long, default_value = "pill")]
        unit: DosageUnit,
    },

    /// Refill a prescription with one full supply
    Refill { id: String },

    /// Restock a non-prescription bottle
    Restock {
        id: String,

        /// Pills added
        #[arg(long)]
        quantity: f64,
    },

    /// Correct the timestamp or intake of a log entry
    EditLog {
        id: String,
        entry: String,

        /// New timestamp (RFC 3339)
        #[arg(long)]
        timestamp: Option<DateTime<Utc>>,

        /// New signed intake in mg (negative for doses)
        #[arg(long, allow_negative_numbers = true)]
        mg: Option<f64>,
    },

    /// Set or clear the intake goal
    Goal(GoalArgs),

    /// Delete a medication and its log
    Delete { id: String },

    /// Export intake logs
    Export {
        /// Output format (csv, json)
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Output file or directory (stdout if omitted)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Only export this medication
        #[arg(long)]
        id: Option<String>,
    },

    /// Fire-and-forget action for shortcuts (take-full, take-half, refill)
    Quick { action: QuickAction, id: String },
}

#[derive(clap::Args)]
struct AddArgs {
    name: String,

    /// prescription or non-prescription
    #[arg(long = "type", default_value = "prescription")]
    medication_type: MedicationType,

    #[arg(long, default_value = "tablet")]
    form: MedicationForm,

    /// Milligrams per pill (or other unit)
    #[arg(long)]
    mg_per_pill: f64,

    /// Pills in one full refill or bottle
    #[arg(long)]
    count: f64,

    /// Current supply in mg (defaults to one full supply)
    #[arg(long)]
    remaining_mg: Option<f64>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    daily_dosage: Option<f64>,

    #[arg(long)]
    daily_dosage_unit: Option<DosageUnit>,

    // Prescription fields
    #[arg(long)]
    days_supply: Option<f64>,
    #[arg(long)]
    refills: Option<u32>,
    #[arg(long)]
    last_filled: Option<DateTime<Utc>>,
    #[arg(long)]
    next_fill: Option<DateTime<Utc>>,
    #[arg(long)]
    prescriber: Option<String>,
    #[arg(long)]
    pharmacy: Option<String>,
    #[arg(long)]
    rx_number: Option<String>,

    // Non-prescription fields
    #[arg(long)]
    brand: Option<String>,
    #[arg(long)]
    supplement_type: Option<String>,
    #[arg(long)]
    serving_size: Option<u32>,
    #[arg(long)]
    servings_per_container: Option<u32>,
    #[arg(long)]
    purchase_location: Option<String>,
    #[arg(long)]
    expires: Option<NaiveDate>,
}

#[derive(clap::Args)]
struct GoalArgs {
    id: String,

    /// Minimum doses per period (or the cap for no-more-than)
    #[arg(long, required_unless_present = "clear")]
    target: Option<f64>,

    /// per-day, per-week or per-month
    #[arg(long, default_value = "per-day")]
    period: GoalPeriod,

    /// at-least, no-more-than or both
    #[arg(long, default_value = "at-least")]
    constraint: GoalConstraint,

    /// Upper bound for no-more-than / both
    #[arg(long)]
    max: Option<f64>,

    /// Comma-separated weekdays (mon,wed,fri)
    #[arg(long, value_delimiter = ',')]
    days: Vec<Weekday>,

    /// Comma-separated dose times (08:00,20:00)
    #[arg(long, value_delimiter = ',')]
    times: Vec<TimeOfDay>,

    /// Remove the goal
    #[arg(long, conflicts_with_all = ["target", "max", "days", "times"])]
    clear: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Quick actions always exit 0, so they run on defaults over a bad config
    let quick = matches!(cli.command, Commands::Quick { .. });
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) if quick => {
            eprintln!("Warning: {}; using default settings", e);
            Config::default()
        }
        Err(e) => return Err(e),
    };
    medledger_core::logging::init_with_level(&config.logging.level);

    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let calendar = match config.calendar.to_calendar() {
        Ok(calendar) => calendar,
        Err(e) if quick => {
            eprintln!("Warning: {}; using default calendar", e);
            Config::default().calendar.to_calendar()?
        }
        Err(e) => return Err(e),
    };
    let mut store = JsonFileStore::in_dir(&data_dir);
    let now = Utc::now();

    match cli.command {
        Commands::Add(args) => cmd_add(&mut store, args),
        Commands::List => cmd_list(&store),
        Commands::Show { id, json } => cmd_show(&store, &id, json, now, &calendar),
        Commands::Log { id } => cmd_log(&store, &id),
        Commands::Take { id, dose, unit } => {
            let med = engine::take_medication(&mut store, &id, Dose::new(dose, unit), now)?;
            println!("✓ Took {} {} of {}", dose, unit, med.name);
            print_supply(&med);
            Ok(())
        }
        Commands::Refill { id } => {
            let med = engine::refill_medication(&mut store, &id, now)?;
            println!("✓ Refilled {}", med.name);
            print_supply(&med);
            if let Some(next_fill) = med.prescription_details().and_then(|d| d.next_fill_date) {
                println!("  Next fill: {}", next_fill.format("%Y-%m-%d"));
            }
            Ok(())
        }
        Commands::Restock { id, quantity } => {
            let med = engine::restock_bottle(&mut store, &id, quantity, now)?;
            println!("✓ Restocked {} with {} pills", med.name, quantity);
            print_supply(&med);
            Ok(())
        }
        Commands::EditLog {
            id,
            entry,
            timestamp,
            mg,
        } => {
            engine::edit_log_entry(&mut store, &id, &entry, timestamp, mg)?;
            println!("✓ Updated log entry {}", entry);
            Ok(())
        }
        Commands::Goal(args) => cmd_goal(&mut store, args),
        Commands::Delete { id } => {
            let med = engine::delete_medication(&mut store, &id)?;
            println!("✓ Deleted {} ({} log entries)", med.name, med.log.len());
            Ok(())
        }
        Commands::Export { format, out, id } => cmd_export(&store, format, out, id, now),
        Commands::Quick { action, id } => {
            if let Some(med) = quick::perform(&mut store, &id, action, now) {
                println!("✓ {} {}", action, med.name);
                print_supply(&med);
            }
            Ok(())
        }
    }
}

fn cmd_add(store: &mut JsonFileStore, args: AddArgs) -> Result<()> {
    let has_rx_fields = args.days_supply.is_some()
        || args.refills.is_some()
        || args.last_filled.is_some()
        || args.next_fill.is_some()
        || args.prescriber.is_some()
        || args.pharmacy.is_some()
        || args.rx_number.is_some();
    let has_otc_fields = args.brand.is_some()
        || args.supplement_type.is_some()
        || args.serving_size.is_some()
        || args.servings_per_container.is_some()
        || args.purchase_location.is_some()
        || args.expires.is_some();

    let details = match args.medication_type {
        MedicationType::Prescription => {
            if has_otc_fields {
                return Err(Error::Invalid(
                    "brand/supplement fields only apply to non-prescription medications".into(),
                ));
            }
            MedicationDetails::Prescription(PrescriptionDetails {
                last_filled_on: args.last_filled,
                next_fill_date: args.next_fill,
                number_of_days_supply: args.days_supply,
                refills_remaining: args.refills,
                prescriber_name: args.prescriber,
                pharmacy_name: args.pharmacy,
                rx_number: args.rx_number,
            })
        }
        MedicationType::NonPrescription => {
            if has_rx_fields {
                return Err(Error::Invalid(
                    "refill fields only apply to prescription medications".into(),
                ));
            }
            MedicationDetails::NonPrescription(NonPrescriptionDetails {
                brand_name: args.brand,
                supplement_type: args.supplement_type,
                serving_size: args.serving_size,
                servings_per_container: args.servings_per_container,
                purchase_location: args.purchase_location,
                expiration_date: args.expires,
            })
        }
    };

    let mut med = Medication::new(args.name, details, args.mg_per_pill, args.count)
        .with_form(args.form);
    if let Some(remaining) = args.remaining_mg {
        med = med.with_total_mg_remaining(remaining);
    }
    if let Some(description) = args.description {
        med = med.with_description(description);
    }
    if let Some(amount) = args.daily_dosage {
        med = med.with_daily_dosage(amount, args.daily_dosage_unit.unwrap_or_default());
    }

    let med = engine::add_medication(store, med)?;
    println!("{}", med.id);
    Ok(())
}

fn cmd_list(store: &JsonFileStore) -> Result<()> {
    let meds = store.fetch_all()?;
    if meds.is_empty() {
        println!("No medications.");
        return Ok(());
    }

    for med in meds {
        println!(
            "{}  {}  [{}]  {:.1} pills left",
            med.id,
            med.name,
            med.medication_type(),
            med.pills_remaining()
        );
    }
    Ok(())
}

fn cmd_show(
    store: &JsonFileStore,
    id: &str,
    json: bool,
    now: DateTime<Utc>,
    calendar: &Calendar,
) -> Result<()> {
    let med = engine::get_medication(store, id)?;
    let snap = MedicationSnapshot::new(&med, now, calendar);

    if json {
        println!("{}", serde_json::to_string_pretty(&snap)?);
        return Ok(());
    }

    println!("{} ({}, {})", snap.name, snap.medication_type, snap.form);
    println!("  Id: {}", snap.id);
    println!(
        "  Remaining: {:.1} mg ({:.1} pills)",
        snap.total_mg_remaining, snap.pills_remaining
    );
    if let Some(next_dose) = snap.next_dose_time {
        println!("  Next dose: {}", fmt_local(next_dose, calendar));
    }
    if snap.medication_type == MedicationType::Prescription {
        if let Some(next_fill) = snap.next_fill_date {
            println!(
                "  Next fill: {} ({} days, {:.1} pills/day)",
                fmt_local(next_fill, calendar),
                snap.days_until_refill,
                snap.pills_per_day_left
            );
        }
        if let Some(refills) = snap.refills_remaining {
            println!("  Refills remaining: {}", refills);
        }
    }
    if let (Some(completed), Some(target)) = (snap.goal_completed, snap.goal_target) {
        println!("  Goal: {}/{} this period", completed, target);
        if let Some(streak) = snap.adherence_streak {
            println!("  Streak: {} periods", streak);
        }
    }
    if let Some(last) = snap.last_dose_at {
        println!("  Last dose: {}", fmt_local(last, calendar));
    }
    println!(
        "  Today: {:.1} mg, this week: {:.1} mg, 7-day average: {:.1} mg/day",
        snap.total_today_mg, snap.weekly_intake_mg, snap.average_daily_intake_mg
    );
    Ok(())
}

fn cmd_log(store: &JsonFileStore, id: &str) -> Result<()> {
    let med = engine::get_medication(store, id)?;
    if med.log.is_empty() {
        println!("No log entries for {}.", med.name);
        return Ok(());
    }

    for entry in med.sorted_log() {
        println!(
            "{}  {}  {:+.1} mg  {:.1} mg left  {}",
            entry.id,
            entry.timestamp.to_rfc3339(),
            entry.mg_intake,
            entry.total_mg_remaining,
            if entry.is_refill() { "refill" } else { "dose" }
        );
    }
    Ok(())
}

fn cmd_goal(store: &mut JsonFileStore, args: GoalArgs) -> Result<()> {
    if args.clear {
        let med = engine::set_goal(store, &args.id, None)?;
        println!("✓ Cleared goal for {}", med.name);
        return Ok(());
    }

    let target = args
        .target
        .ok_or_else(|| Error::Invalid("--target is required".into()))?;
    let mut goal = IntakeGoal::at_least(target, args.period).with_constraint(args.constraint, args.max);
    if !args.days.is_empty() {
        goal = goal.with_specific_days(args.days);
    }
    if !args.times.is_empty() {
        goal = goal.with_times_of_day(args.times);
    }

    let med = engine::set_goal(store, &args.id, Some(goal))?;
    println!("✓ Goal set for {}", med.name);
    Ok(())
}

fn cmd_export(
    store: &JsonFileStore,
    format: ExportFormat,
    out: Option<PathBuf>,
    id: Option<String>,
    now: DateTime<Utc>,
) -> Result<()> {
    let meds = match id {
        Some(id) => vec![engine::get_medication(store, &id)?],
        None => store.fetch_all()?,
    };

    let Some(out) = out else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        match format {
            ExportFormat::Csv => export::export_csv(&meds, &mut handle)?,
            ExportFormat::Json => export::export_json(&meds, &mut handle)?,
        };
        handle.flush()?;
        return Ok(());
    };

    let path = if out.is_dir() {
        out.join(export::export_filename(format, meds.len(), now))
    } else {
        out
    };
    let rows = export::export_to_file(&meds, format, &path)?;
    println!("✓ Exported {} log entries to {}", rows, path.display());
    Ok(())
}

fn print_supply(med: &Medication) {
    println!(
        "  Remaining: {:.1} mg ({:.1} pills)",
        med.total_mg_remaining,
        med.pills_remaining()
    );
}

fn fmt_local(at: DateTime<Utc>, calendar: &Calendar) -> String {
    at.with_timezone(&calendar.offset())
        .format("%Y-%m-%d %H:%M")
        .to_string()
}
