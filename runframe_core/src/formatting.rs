use time::format_description::well_known;
use time::{Duration, OffsetDateTime};

/// Formats 'date' into a string like "2024-09-01T05:10:44Z".
pub fn format_utc_date(date: OffsetDateTime) -> Result<String, time::error::Format> {
    date.format(&well_known::Rfc3339)
}

/// Formats a duration as "HH:MM:SS", rounding down to the second. Hours
/// are not wrapped at 24.
pub fn format_duration(duration: Duration) -> String {
    let sign = if duration.is_negative() { "-" } else { "" };
    let total = duration.whole_seconds().unsigned_abs();
    format!(
        "{sign}{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Formats a pace given per metre as minutes and seconds per kilometre,
/// e.g. "5:07/km". Returns None if the pace per kilometre overflows a
/// Duration.
pub fn format_pace_per_km(pace_per_metre: Duration) -> Option<String> {
    let per_km = pace_per_metre.checked_mul(1000)?.whole_seconds();
    Some(format!("{}:{:02}/km", per_km / 60, per_km % 60))
}
