//! CLI entry point for the stock and project analyses.

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use wrangle::config::{
    DEFAULT_DATABASE_CODE, DEFAULT_DATASET_CODE, DEFAULT_TIMEOUT_SECS, DEFAULT_TOP_N,
};
use wrangle::reporting::DEFAULT_BAR_WIDTH;
use wrangle::{
    AnalysisError, BarChart, FillScope, ProjectTable, ProjectsConfig, ProjectsReport, ReportWriter,
    StockDataset, StockQuery, StockReport, StockSummary, projects,
};

#[cfg(feature = "fetch")]
use wrangle::StockClient;
#[cfg(feature = "fetch")]
use wrangle::config::API_KEY_ENV;

/// CLI-compatible fill scope enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFillScope {
    /// Only fill from entries with the same theme code
    WithinCode,
    /// Plain backward fill over the sorted column
    Global,
}

impl From<CliFillScope> for FillScope {
    fn from(cli: CliFillScope) -> Self {
        match cli {
            CliFillScope::WithinCode => FillScope::WithinCode,
            CliFillScope::Global => FillScope::Global,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Stock summary statistics and project frequency counts",
    long_about = "Summarize a year of daily stock-exchange records and count development \
                  projects by country and theme.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  QUANDL_API_KEY    API key for the datasets endpoint (optional)\n\n\
                  EXAMPLES:\n  \
                  # Fetch FSE/AFX_X for 2017 and summarize it\n  \
                  wrangle stocks\n\n  \
                  # Summarize a previously saved response\n  \
                  wrangle stocks -i afx_x_2017.json\n\n  \
                  # Top 10 countries and themes, JSON output\n  \
                  wrangle projects -i world_bank_projects.json --json"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only outputs the final JSON report.
    #[arg(long, global = true)]
    json: bool,

    /// Write a JSON report into this directory
    #[arg(short = 'r', long, value_name = "DIR", global = true)]
    emit_report: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch (or load) daily stock records and print summary statistics
    Stocks(StocksArgs),
    /// Count project records by country and theme
    Projects(ProjectsArgs),
}

#[derive(Args, Debug)]
struct StocksArgs {
    /// Read a saved API response instead of fetching
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// First day of the requested range
    #[arg(long, default_value = "2017-01-01")]
    start_date: NaiveDate,

    /// Last day of the requested range
    #[arg(long, default_value = "2017-12-31")]
    end_date: NaiveDate,

    /// Database code
    #[arg(long, default_value = DEFAULT_DATABASE_CODE)]
    database: String,

    /// Dataset code
    #[arg(long, default_value = DEFAULT_DATASET_CODE)]
    dataset: String,

    /// API key (defaults to QUANDL_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL of the datasets endpoint
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,
}

#[derive(Args, Debug)]
struct ProjectsArgs {
    /// Path to the JSON file of project records
    #[arg(short, long)]
    input: PathBuf,

    /// Number of categories per chart
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    top: usize,

    /// How far missing theme names may be filled from
    #[arg(long, value_enum, default_value = "within-code")]
    fill_scope: CliFillScope,

    /// Field counted for the country chart
    #[arg(long, default_value = "countryshortname")]
    country_field: String,

    /// Skip bar charts in the human-readable output
    #[arg(long)]
    no_charts: bool,

    /// Width of the longest bar, in characters
    #[arg(long, default_value_t = DEFAULT_BAR_WIDTH)]
    bar_width: usize,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Exit status when the input data could not be analyzed.
const EXIT_DATA_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.quiet, cli.json);

    // Load environment variables from .env file
    dotenv().ok();

    let result = match &cli.command {
        Command::Stocks(args) => run_stocks(&cli, args),
        Command::Projects(args) => run_projects(&cli, args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, cli.json);
            exit_code(&e)
        }
    }
}

/// Print a failure once: as a log line, or as a JSON object under `--json`.
fn report_error(err: &anyhow::Error, json_output: bool) {
    if !json_output {
        error!("{:#}", err);
        return;
    }

    let body = match err.downcast_ref::<AnalysisError>() {
        Some(analysis) => serde_json::json!({ "error": analysis }),
        None => serde_json::json!({ "error": { "code": "ERROR", "message": format!("{:#}", err) } }),
    };
    println!("{}", body);
}

/// Data problems exit with [`EXIT_DATA_ERROR`]; everything else with 1.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<AnalysisError>() {
        Some(analysis) if analysis.is_data_error() => ExitCode::from(EXIT_DATA_ERROR),
        _ => ExitCode::FAILURE,
    }
}

fn run_stocks(cli: &Cli, args: &StocksArgs) -> Result<()> {
    let (source, dataset, base_name) = match args.input {
        Some(ref path) => {
            info!("Loading saved response from: {}", path.display());
            let dataset = StockDataset::from_path(path)?;
            (path.display().to_string(), dataset, extract_file_stem(path))
        }
        None => {
            let query = build_query(args)?;
            let source = query.redacted_url();
            let dataset = fetch_dataset(query)?;
            let base_name = format!("{}_{}", args.database, args.dataset).to_lowercase();
            (source, dataset, base_name)
        }
    };

    let summary = StockSummary::from_dataset(&dataset)?;
    let report = StockReport::new(source, &dataset, summary);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.to_text());
    }

    if let Some(ref dir) = cli.emit_report {
        let path = ReportWriter::new(dir).write(&report, &base_name)?;
        info!("Report written to: {}", path.display());
    }

    Ok(())
}

fn build_query(args: &StocksArgs) -> Result<StockQuery> {
    let mut builder = StockQuery::builder()
        .database_code(&args.database)
        .dataset_code(&args.dataset)
        .start_date(args.start_date)
        .end_date(args.end_date)
        .timeout_secs(args.timeout);

    if let Some(ref url) = args.base_url {
        builder = builder.base_url(url);
    }

    if let Some(key) = resolve_api_key(args) {
        builder = builder.api_key(key);
    }

    Ok(builder.build()?)
}

#[cfg(feature = "fetch")]
fn resolve_api_key(args: &StocksArgs) -> Option<String> {
    args.api_key
        .clone()
        .or_else(|| std::env::var(API_KEY_ENV).ok())
}

#[cfg(not(feature = "fetch"))]
fn resolve_api_key(args: &StocksArgs) -> Option<String> {
    args.api_key.clone()
}

#[cfg(feature = "fetch")]
fn fetch_dataset(query: StockQuery) -> Result<StockDataset> {
    if query.api_key.is_none() {
        info!("No API key set; sending an anonymous request");
    }
    Ok(StockClient::new(query)?.fetch()?)
}

/// Fetching is not compiled in; only saved responses can be read.
#[cfg(not(feature = "fetch"))]
fn fetch_dataset(_query: StockQuery) -> Result<StockDataset> {
    Err(anyhow!(
        "Fetching support not compiled in. Pass --input with a saved response, \
         or compile with --features fetch."
    ))
}

fn run_projects(cli: &Cli, args: &ProjectsArgs) -> Result<()> {
    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    let config = ProjectsConfig::builder()
        .top_n(args.top)
        .fill_scope(args.fill_scope.into())
        .country_field(&args.country_field)
        .build()?;

    let mut table = ProjectTable::from_path(&args.input, &config.theme_field)?;
    let analysis = projects::analyze(&mut table, &config)?;
    let report = ProjectsReport::new(args.input.display().to_string(), analysis);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_projects_summary(&report, &config, args);
    }

    if let Some(ref dir) = cli.emit_report {
        let path = ReportWriter::new(dir).write(&report, &extract_file_stem(&args.input))?;
        info!("Report written to: {}", path.display());
    }

    Ok(())
}

/// Print the frequency charts and fill statistics.
///
/// Uses `println!` because this is the command's primary output and must be
/// visible regardless of log level.
fn print_projects_summary(report: &ProjectsReport, config: &ProjectsConfig, args: &ProjectsArgs) {
    let analysis = &report.analysis;
    let n = config.top_n;

    println!("{}", "=".repeat(60));
    println!(
        "PROJECTS: {} records, {} theme entries",
        analysis.record_count, analysis.theme_entries
    );
    println!("{}", "=".repeat(60));
    println!();

    let charts = [
        (
            format!("The {} Countries with the Most Projects", n),
            "# of projects",
            &analysis.top_countries,
        ),
        (
            format!("The {} Most Frequent Project Themes", n),
            "Project Theme Count",
            &analysis.top_themes_before_fill,
        ),
    ];
    for (title, label, entries) in &charts {
        print_frequencies(title, label, entries, args);
    }

    let fill = &analysis.fill;
    println!(
        "Missing theme names: {} before, {} filled ({:?}), {} remaining",
        fill.missing_before, fill.filled, fill.scope, fill.still_missing
    );
    println!();

    print_frequencies(
        &format!("The {} Most Frequent Project Themes (names filled)", n),
        "Project Theme Count",
        &analysis.top_themes_after_fill,
        args,
    );
}

fn print_frequencies(
    title: &str,
    label: &str,
    entries: &[wrangle::FrequencyEntry],
    args: &ProjectsArgs,
) {
    if args.no_charts {
        println!("{}", title);
        for entry in entries {
            println!("  {:<40} {:>6}", entry.value, entry.count);
        }
    } else {
        print!(
            "{}",
            BarChart::new(title, label, entries)
                .bar_width(args.bar_width)
                .render()
        );
    }
    println!();
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}
