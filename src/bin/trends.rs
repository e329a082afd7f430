//! Trends CLI - Command-line interface for wellness-trends
//!
//! Commands:
//! - health / fitness / sleep / journal: Run one domain report
//! - predict-calories / predict-sleep: Next-day point estimates
//! - insights: Run every report in a combined user document and narrate them
//! - config: Print the effective configuration

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use wellness_trends::schema::{FitnessActivity, PredictionInput, RecordAdapter, SleepMetric};
use wellness_trends::{
    aggregated_insights, record_report, CoachConfig, CoachError, Domain, MemoryInsightStore,
    SummaryNarrator, TrendsProcessor, TRENDS_VERSION,
};

/// Trends - Weekly wellness trends and coaching advice
#[derive(Parser)]
#[command(name = "trends")]
#[command(author = "Synheart AI Inc")]
#[command(version = TRENDS_VERSION)]
#[command(about = "Turn daily wellness records into weekly trends and advice", long_about = None)]
struct Cli {
    /// Log pipeline stages to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize health vitals
    Health(ReportArgs),

    /// Weekly fitness trends and recommendations
    Fitness(ReportArgs),

    /// Weekly sleep patterns and recommendations
    Sleep(ReportArgs),

    /// Sentiment summary of recent journal entries
    Journal(ReportArgs),

    /// Predict next-day calories from fitness history
    PredictCalories {
        #[command(flatten)]
        report: ReportArgs,

        /// Day of week for the prediction (Monday = 0)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..7))]
        day_of_week: u32,

        /// Planned active minutes
        #[arg(long)]
        active_minutes: u32,

        /// Planned steps
        #[arg(long)]
        steps: u32,
    },

    /// Forecast next-day sleep duration from sleep history
    PredictSleep(ReportArgs),

    /// Run every report in a combined user document and narrate the result
    Insights {
        #[command(flatten)]
        report: ReportArgs,

        /// User id when the document carries none
        #[arg(long, default_value = "local")]
        user_id: String,
    },

    /// Print the effective configuration
    Config {
        /// Load configuration from file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ReportArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Output format
    #[arg(long, default_value = "json-pretty")]
    output_format: OutputFormat,

    /// Load configuration from file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the daily step goal
    #[arg(long)]
    step_goal: Option<u32>,

    /// Override the number of journal entries scored
    #[arg(long)]
    journal_window: Option<usize>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "wellness_trends=debug,trends=debug"
    } else {
        "wellness_trends=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), TrendsCliError> {
    match cli.command {
        Commands::Health(args) => cmd_report(Domain::Health, &args),
        Commands::Fitness(args) => cmd_report(Domain::Fitness, &args),
        Commands::Sleep(args) => cmd_report(Domain::Sleep, &args),
        Commands::Journal(args) => cmd_report(Domain::Journal, &args),
        Commands::PredictCalories {
            report,
            day_of_week,
            active_minutes,
            steps,
        } => cmd_predict_calories(
            &report,
            PredictionInput {
                day_of_week,
                active_minutes,
                steps,
            },
        ),
        Commands::PredictSleep(args) => cmd_predict_sleep(&args),
        Commands::Insights { report, user_id } => cmd_insights(&report, &user_id),
        Commands::Config { config } => cmd_config(config.as_deref()),
    }
}

fn cmd_report(domain: Domain, args: &ReportArgs) -> Result<(), TrendsCliError> {
    let processor = build_processor(args)?;
    let input_data = read_input(&args.input)?;

    let (user_id, report) = processor.process_json(domain, &input_data)?;
    debug!(domain = domain.as_str(), user_id = ?user_id, "Report computed");

    write_output(&report, &args.output_format)
}

fn cmd_predict_calories(args: &ReportArgs, input: PredictionInput) -> Result<(), TrendsCliError> {
    let processor = build_processor(args)?;
    let input_data = read_input(&args.input)?;
    let envelope = RecordAdapter::parse::<FitnessActivity>(&input_data)?;

    let calories = processor.predict_calories(&envelope.records, &input)?;
    write_output(
        &serde_json::json!({ "predicted_calories": calories }),
        &args.output_format,
    )
}

fn cmd_predict_sleep(args: &ReportArgs) -> Result<(), TrendsCliError> {
    let processor = build_processor(args)?;
    let input_data = read_input(&args.input)?;
    let envelope = RecordAdapter::parse::<SleepMetric>(&input_data)?;

    let hours = processor.predict_sleep_duration(&envelope.records)?;
    write_output(
        &serde_json::json!({ "predicted_sleep_duration": hours }),
        &args.output_format,
    )
}

/// Document shape: `{"user_id"?, "health"?, "fitness"?, "sleep"?, "journal"?}`,
/// each domain holding a record array or its request envelope.
fn cmd_insights(args: &ReportArgs, default_user: &str) -> Result<(), TrendsCliError> {
    let processor = build_processor(args)?;
    let input_data = read_input(&args.input)?;

    let serde_json::Value::Object(mut document) =
        serde_json::from_str::<serde_json::Value>(&input_data)?
    else {
        return Err(TrendsCliError::InvalidDocument(
            "expected an object keyed by domain".to_string(),
        ));
    };

    let user_id = match document.remove("user_id") {
        Some(serde_json::Value::String(id)) => id,
        _ => default_user.to_string(),
    };

    let store = MemoryInsightStore::new();
    for domain in [Domain::Health, Domain::Fitness, Domain::Sleep, Domain::Journal] {
        let Some(section) = document.remove(domain.as_str()) else {
            continue;
        };
        let (_, report) = processor.process_value(domain, section)?;
        record_report(&store, &user_id, report);
    }

    if store.is_empty() {
        return Err(TrendsCliError::NoReports);
    }

    let narrative = aggregated_insights(&store, &user_id, &SummaryNarrator)?;
    info!(user_id = %user_id, "Insights generated");

    write_output(
        &InsightsOutput {
            user_id,
            insights: narrative,
        },
        &args.output_format,
    )
}

fn cmd_config(config: Option<&Path>) -> Result<(), TrendsCliError> {
    let config = load_config(config)?;
    println!("{}", config.to_json()?);
    Ok(())
}

// Helper functions

fn build_processor(args: &ReportArgs) -> Result<TrendsProcessor, TrendsCliError> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(step_goal) = args.step_goal {
        config.step_goal = step_goal;
    }
    if let Some(window) = args.journal_window {
        config.journal_window = window;
    }
    config.validate()?;

    Ok(TrendsProcessor::with_config(config))
}

fn load_config(path: Option<&Path>) -> Result<CoachConfig, TrendsCliError> {
    match path {
        Some(path) => Ok(CoachConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(CoachConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String, TrendsCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output<T: Serialize>(value: &T, format: &OutputFormat) -> Result<(), TrendsCliError> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
    };
    println!("{}", rendered);
    Ok(())
}

// Error types

#[derive(Debug, Error)]
enum TrendsCliError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Coach(#[from] CoachError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Invalid insights document: {0}")]
    InvalidDocument(String),

    #[error("No domain reports found in input")]
    NoReports,
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TrendsCliError> for CliError {
    fn from(e: TrendsCliError) -> Self {
        let message = e.to_string();
        let (code, hint) = match &e {
            TrendsCliError::Io(_) => ("IO_ERROR", Some("Check file paths and permissions")),
            TrendsCliError::Json(_) | TrendsCliError::Coach(CoachError::JsonError(_)) => {
                ("JSON_ERROR", Some("Check JSON syntax"))
            }
            TrendsCliError::Coach(CoachError::MalformedInput(_)) => (
                "MALFORMED_INPUT",
                Some("Pass a record array or a {\"user_id\", \"<records>\"} envelope"),
            ),
            TrendsCliError::Coach(CoachError::InsufficientData { .. }) => (
                "INSUFFICIENT_DATA",
                Some("Provide more historical records"),
            ),
            TrendsCliError::Coach(_) => ("COMPUTE_ERROR", None),
            TrendsCliError::InvalidDocument(_) => (
                "INVALID_DOCUMENT",
                Some("Key each domain by health, fitness, sleep or journal"),
            ),
            TrendsCliError::NoReports => (
                "NO_REPORTS",
                Some("Include at least one of health, fitness, sleep or journal"),
            ),
        };

        CliError {
            code: code.to_string(),
            message,
            hint: hint.map(str::to_string),
        }
    }
}

// Report types

#[derive(Serialize)]
struct InsightsOutput {
    user_id: String,
    insights: String,
}
