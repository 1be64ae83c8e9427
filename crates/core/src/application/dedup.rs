// Dedup decision engine
use crate::application::config::LedgerConfig;
use crate::application::constants::{DAYS_PER_MONTH, HEURISTIC_REOPENING_MONTHS};
use crate::domain::{JobHistory, SourceMetadata};
use chrono::{DateTime, Utc};

/// Why a job should be announced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostReason {
    /// No instance of the job was ever recorded
    NeverSeen,
    /// Aged history, but the source reports a fresh posting date
    FreshSourceDate { age_days: i64 },
    /// Aged history, no source date, first announcement long enough ago
    HeuristicReopening { months_since_oldest: f64 },
}

/// Why a job should be suppressed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    /// Announced within the active window
    RecentDuplicate { last_posted_at: DateTime<Utc> },
    /// Aged history and the source date is older than the reopening window
    StaleSourceDate { age_days: i64 },
    /// Aged history, no source date, not enough time has passed to assume a reopening
    InsufficientEvidence { months_since_oldest: f64 },
}

/// Outcome of a dedup query
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Post(PostReason),
    Skip(SkipReason),
}

impl Decision {
    pub fn should_skip(&self) -> bool {
        matches!(self, Decision::Skip(_))
    }
}

/// Decide whether a job should be announced.
///
/// `history` summarizes every recorded instance of the job, active and
/// archived. Algorithm:
/// 1. No history -> post
/// 2. Latest instance inside the active window -> skip
/// 3. Otherwise look for evidence of a reopening:
///    - with a source date: post iff `now - source_date <= reopening_window`
///    - without: post iff the first announcement is at least
///      `HEURISTIC_REOPENING_MONTHS` old
///
/// Pure: no state is read beyond the arguments and nothing is mutated.
pub fn decide(
    history: Option<&JobHistory>,
    source: Option<&SourceMetadata>,
    now: DateTime<Utc>,
    config: &LedgerConfig,
) -> Decision {
    let Some(history) = history else {
        return Decision::Post(PostReason::NeverSeen);
    };

    if now - history.last_posted_at < config.active_window() {
        return Decision::Skip(SkipReason::RecentDuplicate {
            last_posted_at: history.last_posted_at,
        });
    }

    if let Some(source_date) = source.and_then(|s| s.source_date) {
        let age = now - source_date;
        let age_days = age.num_days();
        return if age <= config.reopening_window() {
            Decision::Post(PostReason::FreshSourceDate { age_days })
        } else {
            Decision::Skip(SkipReason::StaleSourceDate { age_days })
        };
    }

    let months_since_oldest = months_between(history.first_posted_at, now);
    if months_since_oldest >= HEURISTIC_REOPENING_MONTHS {
        Decision::Post(PostReason::HeuristicReopening {
            months_since_oldest,
        })
    } else {
        Decision::Skip(SkipReason::InsufficientEvidence {
            months_since_oldest,
        })
    }
}

fn months_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let days = (to - from).num_seconds() as f64 / 86_400.0;
    days / DAYS_PER_MONTH
}
