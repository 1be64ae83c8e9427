// Ledger constants (no magic values)

/// Default active window: instances younger than this are live duplicates (days)
pub const DEFAULT_ACTIVE_WINDOW_DAYS: i64 = 7;

/// Default reopening window: max age of a source date that still counts as fresh (days)
pub const DEFAULT_REOPENING_WINDOW_DAYS: i64 = 30;

/// Months since the first announcement after which a job without a source
/// date is assumed to have reopened
pub const HEURISTIC_REOPENING_MONTHS: f64 = 3.0;

/// Month length used for `monthsSinceOldest`
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Upper bound accepted for either window (100 years)
pub const MAX_WINDOW_DAYS: i64 = 36_500;
