//! Posting Ledger CLI - dedup checks and archival for job announcements

mod config;
mod logging;
mod output;
mod telemetry;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use config::{LogFormat, Settings, DEFAULT_DATA_DIR};
use posting_ledger_core::application::constants::{
    DEFAULT_ACTIVE_WINDOW_DAYS, DEFAULT_REOPENING_WINDOW_DAYS,
};
use posting_ledger_core::application::PostingLedger;
use posting_ledger_core::domain::job_data::parse_source_date;
use posting_ledger_core::domain::SourceMetadata;
use posting_ledger_core::port::SystemTimeProvider;
use posting_ledger_core::AppError;
use serde_json::Value;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

/// Exit status when a save could not be verified
const EXIT_INTEGRITY: u8 = 2;

#[derive(Parser)]
#[command(name = "posting-ledger")]
#[command(about = "Dedup and archival store for job announcements", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding posted_jobs.json and archive/
    #[arg(long, global = true, env = "POSTING_LEDGER_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: String,

    /// Days an announcement suppresses re-announcing the same job
    #[arg(long, global = true, env = "ACTIVE_WINDOW_DAYS", default_value_t = DEFAULT_ACTIVE_WINDOW_DAYS)]
    active_window_days: i64,

    /// Maximum source-date age accepted as evidence of a reopening
    #[arg(long, global = true, env = "REOPENING_WINDOW_DAYS", default_value_t = DEFAULT_REOPENING_WINDOW_DAYS)]
    reopening_window_days: i64,

    /// Log format
    #[arg(long, global = true, env = "POSTING_LEDGER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a job should be announced
    Check {
        /// Job ID
        job_id: String,

        /// Posting date reported by the source (RFC 3339, YYYY-MM-DD or epoch seconds)
        #[arg(long)]
        source_date: Option<String>,
    },

    /// Record an announcement
    Mark {
        /// Job ID
        job_id: String,

        /// Source record as JSON string
        #[arg(long, default_value = "{}")]
        data: String,

        /// Reference of the announcement in the downstream channel
        #[arg(long)]
        external_ref: Option<String>,
    },

    /// Move aged instances into monthly archive buckets
    Archive,

    /// Show active store statistics
    Stats,

    /// List every recorded announcement of a job
    History {
        /// Job ID
        job_id: String,
    },

    /// Check that no instance is lost or duplicated across files
    Audit,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_format) {
        eprintln!("{} {:#}", "✗ Error:".red().bold(), e);
        return ExitCode::FAILURE;
    }

    let result = run(cli).await;
    telemetry::shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "✗ Error:".red().bold(), e);
            let fatal = e.downcast_ref::<AppError>().is_some_and(AppError::is_fatal);
            if fatal {
                error!(error = %e, "Integrity fault; pipeline must stop");
                ExitCode::from(EXIT_INTEGRITY)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::new(
        &cli.data_dir,
        cli.active_window_days,
        cli.reopening_window_days,
    )?;
    info!(
        version = posting_ledger_core::VERSION,
        data_dir = %settings.data_dir.display(),
        active_window_days = settings.ledger.active_window_days,
        reopening_window_days = settings.ledger.reopening_window_days,
        "Opening posting ledger"
    );

    let mut ledger = posting_ledger_infra_fs::open_ledger(
        &settings.layout(),
        Arc::new(SystemTimeProvider),
        settings.ledger,
    )
    .await
    .context("Failed to open ledger")?;

    match cli.command {
        Commands::Check {
            job_id,
            source_date,
        } => check(&ledger, &job_id, source_date.as_deref(), cli.json),
        Commands::Mark {
            job_id,
            data,
            external_ref,
        } => mark(&mut ledger, &job_id, &data, external_ref, cli.json).await,
        Commands::Archive => {
            let outcome = ledger.save().await?;
            if cli.json {
                println!("{}", output::archive_json(&outcome));
            } else {
                output::print_archive(&outcome);
            }
            Ok(())
        }
        Commands::Stats => {
            let stats = ledger.stats();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                output::print_stats(&stats);
            }
            Ok(())
        }
        Commands::History { job_id } => {
            let instances = ledger.history(&job_id).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&instances)?);
            } else {
                output::print_history(&job_id, &instances);
            }
            Ok(())
        }
        Commands::Audit => {
            let report = ledger.audit().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_audit(&report);
            }
            if !report.is_consistent() {
                bail!(
                    "audit found {} duplicate and {} misfiled instance(s), {} unreadable bucket(s)",
                    report.duplicate_ids.len(),
                    report.misfiled_ids.len(),
                    report.unreadable_buckets.len()
                );
            }
            Ok(())
        }
    }
}

fn check(ledger: &PostingLedger, job_id: &str, source_date: Option<&str>, json: bool) -> Result<()> {
    let source = source_date
        .map(|raw| {
            parse_source_date(&Value::String(raw.to_string()))
                .map(|date| SourceMetadata::new(Some(date)))
                .with_context(|| format!("Unrecognized source date {:?}", raw))
        })
        .transpose()?;

    let decision = ledger.evaluate(job_id, source.as_ref());
    if json {
        println!("{}", output::decision_json(job_id, &decision));
    } else {
        output::print_decision(job_id, &decision);
    }
    Ok(())
}

async fn mark(
    ledger: &mut PostingLedger,
    job_id: &str,
    data: &str,
    external_ref: Option<String>,
    json: bool,
) -> Result<()> {
    let record: Value = serde_json::from_str(data).context("Invalid JSON in --data")?;
    let instance = ledger.mark_as_posted(job_id, &record, external_ref).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&instance)?);
    } else {
        output::print_recorded(&instance);
    }
    Ok(())
}
