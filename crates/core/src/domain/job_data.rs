// Job Data Extraction
//
// Upstream job sources disagree on field names and date formats, so the
// append path accepts a loose JSON record and pulls out what it can.

use crate::domain::instance::UNKNOWN;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

const COMPANY_KEYS: &[&str] = &["company", "company_name", "employer"];
const TITLE_KEYS: &[&str] = &["title", "job_title", "position"];
const SOURCE_DATE_KEYS: &[&str] = &["sourceDate", "date_posted", "posted_at", "date"];
const SOURCE_URL_KEYS: &[&str] = &["sourceUrl", "url", "job_url", "link"];

/// Freshness signal reported by the upstream source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceMetadata {
    pub source_date: Option<DateTime<Utc>>,
}

impl SourceMetadata {
    pub fn new(source_date: Option<DateTime<Utc>>) -> Self {
        Self { source_date }
    }
}

/// Fields of a job record that end up on a JobInstance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobData {
    pub company: String,
    pub title: String,
    pub source_date: Option<DateTime<Utc>>,
    pub source_url: Option<String>,
}

impl Default for JobData {
    fn default() -> Self {
        Self {
            company: UNKNOWN.to_string(),
            title: UNKNOWN.to_string(),
            source_date: None,
            source_url: None,
        }
    }
}

impl JobData {
    /// Extract job data from a loosely-typed source record.
    ///
    /// Missing, blank or mistyped fields fall back to "Unknown" / absent.
    /// Non-object values yield the defaults.
    pub fn from_value(value: &Value) -> Self {
        let Some(record) = value.as_object() else {
            return Self::default();
        };

        let text = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| record.get(*k))
                .filter_map(Value::as_str)
                .map(str::trim)
                .find(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            company: text(COMPANY_KEYS).unwrap_or_else(|| UNKNOWN.to_string()),
            title: text(TITLE_KEYS).unwrap_or_else(|| UNKNOWN.to_string()),
            source_date: SOURCE_DATE_KEYS
                .iter()
                .filter_map(|k| record.get(*k))
                .find_map(parse_source_date),
            source_url: text(SOURCE_URL_KEYS),
        }
    }

    pub fn source_metadata(&self) -> SourceMetadata {
        SourceMetadata::new(self.source_date)
    }
}

/// Parse a source date given as RFC 3339, `YYYY-MM-DD`, a naive ISO
/// timestamp, or Unix seconds.
pub fn parse_source_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
