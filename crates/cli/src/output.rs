//! Terminal rendering of ledger results

use colored::Colorize;
use posting_ledger_core::application::{
    ArchiveOutcome, AuditReport, Decision, LedgerStats, PostReason, SkipReason,
};
use posting_ledger_core::domain::JobInstance;
use serde_json::{json, Value};
use tabled::{Table, Tabled};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Tabled)]
struct InstanceRow {
    #[tabled(rename = "#")]
    number: u32,
    id: String,
    posted_at: String,
    company: String,
    title: String,
    external_ref: String,
}

impl From<&JobInstance> for InstanceRow {
    fn from(instance: &JobInstance) -> Self {
        Self {
            number: instance.instance_number,
            id: instance.id.clone(),
            posted_at: instance.posted_at.format(TIME_FORMAT).to_string(),
            company: instance.company.clone(),
            title: instance.title.clone(),
            external_ref: instance.external_ref.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Tabled)]
struct BucketRow {
    month: String,
    instances: usize,
}

pub fn describe(decision: &Decision) -> String {
    match decision {
        Decision::Post(PostReason::NeverSeen) => "never announced".to_string(),
        Decision::Post(PostReason::FreshSourceDate { age_days }) => {
            format!("reopened, source date {} day(s) old", age_days)
        }
        Decision::Post(PostReason::HeuristicReopening { months_since_oldest }) => {
            format!("first announced {:.1} month(s) ago", months_since_oldest)
        }
        Decision::Skip(SkipReason::RecentDuplicate { last_posted_at }) => {
            format!("announced {}", last_posted_at.format(TIME_FORMAT))
        }
        Decision::Skip(SkipReason::StaleSourceDate { age_days }) => {
            format!("source date {} day(s) old", age_days)
        }
        Decision::Skip(SkipReason::InsufficientEvidence { months_since_oldest }) => {
            format!(
                "no source date, first announced only {:.1} month(s) ago",
                months_since_oldest
            )
        }
    }
}

pub fn decision_json(job_id: &str, decision: &Decision) -> Value {
    json!({
        "jobId": job_id,
        "decision": if decision.should_skip() { "skip" } else { "post" },
        "reason": describe(decision),
    })
}

pub fn print_decision(job_id: &str, decision: &Decision) {
    let verdict = if decision.should_skip() {
        "SKIP".yellow().bold()
    } else {
        "POST".green().bold()
    };
    println!("{} {} ({})", verdict, job_id.cyan(), describe(decision));
}

pub fn print_recorded(instance: &JobInstance) {
    println!("{}", "✓ Announcement recorded".green().bold());
    println!("  {} {}", "Instance:".bold(), instance.id);
    println!("  {} {}", "Number:".bold(), instance.instance_number);
    println!("  {} {} / {}", "Job:".bold(), instance.company, instance.title);
}

pub fn print_archive(outcome: &ArchiveOutcome) {
    if outcome.archived_count == 0 {
        println!("{}", "✓ Nothing to archive".green());
    } else {
        println!(
            "{}",
            format!("✓ Archived {} instance(s)", outcome.archived_count)
                .green()
                .bold()
        );
        let months: Vec<String> = outcome.months_touched.iter().map(|m| m.to_string()).collect();
        println!("  {} {}", "Buckets:".bold(), months.join(", "));
    }
    println!("  {} {}", "Active:".bold(), outcome.active_remaining);
}

pub fn archive_json(outcome: &ArchiveOutcome) -> Value {
    json!({
        "archivedCount": outcome.archived_count,
        "activeRemaining": outcome.active_remaining,
        "monthsTouched": outcome.months_touched.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
    })
}

pub fn print_stats(stats: &LedgerStats) {
    println!("{}", "Posting Ledger".bold().underline());
    println!("  {} {}", "Instances:".bold(), stats.total);
    println!("  {} {}", "Unique jobs:".bold(), stats.unique_jobs);
    println!(
        "  {} {} (window {} days)",
        "Active:".bold(),
        stats.active,
        stats.active_window_days
    );
    println!("  {} {}", "To archive:".bold(), stats.to_archive);
    println!("  {} {}", "Max instances:".bold(), stats.max_instances);
    println!(
        "  {} {}",
        "Last updated:".bold(),
        stats.last_updated.format(TIME_FORMAT)
    );
}

pub fn print_history(job_id: &str, instances: &[JobInstance]) {
    if instances.is_empty() {
        println!("{} {}", "No announcements recorded for".yellow(), job_id.cyan());
        return;
    }
    let rows: Vec<InstanceRow> = instances.iter().map(InstanceRow::from).collect();
    println!("{}", Table::new(rows));
}

pub fn print_audit(report: &AuditReport) {
    if report.is_consistent() {
        println!("{}", "✓ Ledger is consistent".green().bold());
    } else {
        println!("{}", "✗ Ledger has inconsistencies".red().bold());
    }
    println!("  {} {}", "Active:".bold(), report.active_count);
    println!("  {} {}", "Archived:".bold(), report.archived_count);

    if !report.buckets.is_empty() {
        let rows: Vec<BucketRow> = report
            .buckets
            .iter()
            .map(|b| BucketRow {
                month: b.month.clone(),
                instances: b.count,
            })
            .collect();
        println!("{}", Table::new(rows));
    }
    if !report.duplicate_ids.is_empty() {
        println!("  {} {}", "Duplicates:".red().bold(), report.duplicate_ids.join(", "));
    }
    if !report.misfiled_ids.is_empty() {
        println!("  {} {}", "Misfiled:".red().bold(), report.misfiled_ids.join(", "));
    }
    if !report.unreadable_buckets.is_empty() {
        println!(
            "  {} {}",
            "Unreadable:".red().bold(),
            report.unreadable_buckets.join(", ")
        );
    }
}
