#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use resource_analytics_lib::commands::analytics::{
    resource_analytics_chart, resource_analytics_export, resource_analytics_fetch,
    resource_baseline_get, resource_baseline_update,
};
use resource_analytics_lib::commands::{AppState, CommandError};
use resource_analytics_lib::db::DbPool;
use resource_analytics_lib::error::AppError;
use resource_analytics_lib::models::resource_analytics::AnalyticsQueryParams;
use resource_analytics_lib::services::resource_analytics_service::render_csv;
use resource_analytics_lib::services::settings_service::load_settings;
use resource_analytics_lib::utils::iso_week::WeekRange;
use resource_analytics_lib::utils::logger::init_logging;

const DEFAULT_DB_FILE: &str = "resource-analytics.sqlite";

#[derive(Parser)]
#[command(name = "resource-analytics")]
#[command(about = "Weekly capacity, planned and actual hours per department or project")]
struct Cli {
    /// SQLite database file.
    #[arg(long, global = true, default_value = DEFAULT_DB_FILE)]
    db: PathBuf,
    /// YAML settings file; RESOURCE_ANALYTICS_* variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory for daily rolling log files.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute analytics for one scope and print them.
    Analytics {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write a report file into the reports directory.
    Export {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },
    /// Print the stacked area chart configuration.
    Chart {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// List the ISO week keys of an inclusive range.
    Weeks { from: String, to: String },
    /// Show or set the PMO baseline hours per week.
    Baseline {
        #[arg(long)]
        set: Option<f64>,
    },
}

#[derive(Args)]
struct QueryArgs {
    /// `department` or `project`.
    scope: String,
    /// Department name, `__ALL__`, or project UUID.
    scope_id: String,
    #[arg(long)]
    from: Option<String>,
    #[arg(long)]
    to: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            match serde_json::to_string(&error) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{error}"),
            }
            if error.status() < 500 {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let settings = load_settings(cli.config.as_deref())?;
    init_logging(cli.log_dir.as_deref(), Some(settings.log_directives.as_str()))?;
    let default_range_weeks = settings.default_range_weeks;

    if let Commands::Weeks { from, to } = &cli.command {
        let range = WeekRange::parse(from, to)?;
        for week in range.weeks()? {
            println!("{week}");
        }
        return Ok(());
    }

    let pool = DbPool::new(&cli.db)?;
    let state = AppState::new(pool, settings);
    info!(target: "app::analytics", db = %cli.db.display(), "resource analytics cli ready");

    match cli.command {
        Commands::Analytics {
            query,
            format,
            output,
        } => {
            let params = query.into_params(default_range_weeks)?;
            let result = resource_analytics_fetch(&state, params).await?;
            let rendered = match format {
                OutputFormat::Json => {
                    serde_json::to_string_pretty(&result).map_err(AppError::from)?
                }
                OutputFormat::Csv => render_csv(&result)?,
            };
            match output {
                Some(path) => std::fs::write(&path, rendered).map_err(AppError::from)?,
                None => println!("{rendered}"),
            }
        }
        Commands::Export { query, format } => {
            let params = query.into_params(default_range_weeks)?;
            let exported =
                resource_analytics_export(&state, params, Some(format.as_str().to_string()))
                    .await?;
            print_json(&exported)?;
        }
        Commands::Chart { query } => {
            let params = query.into_params(default_range_weeks)?;
            let chart = resource_analytics_chart(&state, params).await?;
            print_json(&chart)?;
        }
        Commands::Baseline { set } => {
            let baseline = match set {
                Some(hours) => resource_baseline_update(&state, hours).await?,
                None => resource_baseline_get(&state).await?,
            };
            print_json(&baseline)?;
        }
        Commands::Weeks { .. } => {}
    }

    Ok(())
}

impl QueryArgs {
    /// Missing bounds fall back to the trailing default window ending this week.
    fn into_params(self, default_range_weeks: u32) -> Result<AnalyticsQueryParams, AppError> {
        let (from, to) = match (self.from, self.to) {
            (Some(from), Some(to)) => (from, to),
            (from, to) => {
                let fallback = WeekRange::trailing(Utc::now().date_naive(), default_range_weeks)?;
                (
                    from.unwrap_or_else(|| fallback.from_week.to_string()),
                    to.unwrap_or_else(|| fallback.to_week.to_string()),
                )
            }
        };
        Ok(AnalyticsQueryParams::new(self.scope, self.scope_id, from, to))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    let json = serde_json::to_string_pretty(value).map_err(AppError::from)?;
    println!("{json}");
    Ok(())
}
