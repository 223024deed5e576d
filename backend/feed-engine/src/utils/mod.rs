// Time helpers shared by the scoring strategies

use chrono::{DateTime, Utc};

pub const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Milliseconds since the Unix epoch as a float score.
pub fn epoch_millis(ts: &DateTime<Utc>) -> f64 {
    ts.timestamp_millis() as f64
}

/// Hours elapsed from `then` to `now`; negative when `then` is in the future.
pub fn age_hours(now: &DateTime<Utc>, then: &DateTime<Utc>) -> f64 {
    (epoch_millis(now) - epoch_millis(then)) / MILLIS_PER_HOUR
}
