//! Wall-clock formatting for console output

use chrono::{DateTime, Local};
use std::time::Duration;

/// Current local wall-clock time.
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Time of day with millisecond precision, e.g. `14:03:07.412`.
pub fn clock(at: &DateTime<Local>) -> String {
    at.format("%H:%M:%S%.3f").to_string()
}

/// Date and time with millisecond precision, e.g. `10/18/2026, 02:03:07.412 PM`.
pub fn wall(at: &DateTime<Local>) -> String {
    at.format("%m/%d/%Y, %I:%M:%S%.3f %p").to_string()
}

/// Elapsed time in fractional seconds.
pub fn seconds(elapsed: Duration) -> String {
    format!("{:.6}s", elapsed.as_secs_f64())
}
