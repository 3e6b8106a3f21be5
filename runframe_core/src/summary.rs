//! A one-stop summary of an Activity's metrics.

use std::fmt::{self, Display};

use serde::{Serialize, Serializer};
use time::{Duration, OffsetDateTime};

use crate::{
    activity::Activity,
    column::mps_to_kph,
    formatting::{format_duration, format_pace_per_km, format_utc_date},
};

/// The headline metrics of an Activity. A metric whose inputs have not
/// been computed (no moving state, no heart rate channel...) is `None`.
/// Speeds and paces are distance over time, not averages of the
/// instantaneous values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummary {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    pub distance_metres: Option<f64>,
    #[serde(serialize_with = "as_seconds")]
    pub elapsed_time: Option<Duration>,
    #[serde(serialize_with = "as_seconds")]
    pub moving_time: Option<Duration>,
    pub mean_speed: Option<f64>,
    pub mean_moving_speed: Option<f64>,
    #[serde(serialize_with = "as_seconds")]
    pub mean_pace: Option<Duration>,
    #[serde(serialize_with = "as_seconds")]
    pub mean_moving_pace: Option<Duration>,
    pub mean_heart_rate: Option<f64>,
    pub mean_moving_heart_rate: Option<f64>,
    pub mean_cadence: Option<f64>,
    pub mean_moving_cadence: Option<f64>,
    pub total_ascent_metres: Option<f64>,
    pub total_descent_metres: Option<f64>,
}

fn as_seconds<S: Serializer>(
    duration: &Option<Duration>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match duration {
        Some(d) => serializer.serialize_some(&d.as_seconds_f64()),
        None => serializer.serialize_none(),
    }
}

impl Activity {
    /// Computes every metric the Activity can currently answer.
    pub fn summary(&self) -> ActivitySummary {
        ActivitySummary {
            start: self.start(),
            distance_metres: self.distance().ok(),
            elapsed_time: self.elapsed_time().ok(),
            moving_time: self.moving_time().ok(),
            mean_speed: self.mean_speed(false, false).ok(),
            mean_moving_speed: self.mean_speed(true, false).ok(),
            mean_pace: self.mean_pace(false, false).ok(),
            mean_moving_pace: self.mean_pace(true, false).ok(),
            mean_heart_rate: self.mean_heart_rate(false).ok(),
            mean_moving_heart_rate: self.mean_heart_rate(true).ok(),
            mean_cadence: self.mean_cadence(false).ok(),
            mean_moving_cadence: self.mean_cadence(true).ok(),
            total_ascent_metres: self.total_ascent().ok(),
            total_descent_metres: self.total_descent().ok(),
        }
    }
}

fn write_line<T: Display>(f: &mut fmt::Formatter<'_>, label: &str, value: Option<T>) -> fmt::Result {
    match value {
        Some(v) => writeln!(f, "{label:<20}{v}"),
        None => writeln!(f, "{label:<20}-"),
    }
}

impl Display for ActivitySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = format_utc_date(self.start).map_err(|_| fmt::Error)?;
        write_line(f, "Start", Some(start))?;
        write_line(f, "Distance", self.distance_metres.map(|m| format!("{:.2} km", m / 1000.0)))?;
        write_line(f, "Elapsed time", self.elapsed_time.map(format_duration))?;
        write_line(f, "Moving time", self.moving_time.map(format_duration))?;

        let kph = |s: Option<f64>| s.map(|s| format!("{:.2} km/h", mps_to_kph(s)));
        write_line(f, "Mean speed", kph(self.mean_speed))?;
        write_line(f, "Mean moving speed", kph(self.mean_moving_speed))?;
        write_line(f, "Mean pace", self.mean_pace.and_then(format_pace_per_km))?;
        write_line(f, "Mean moving pace", self.mean_moving_pace.and_then(format_pace_per_km))?;

        let whole = |v: Option<f64>| v.map(|v| format!("{v:.0}"));
        write_line(f, "Mean heart rate", whole(self.mean_heart_rate))?;
        write_line(f, "Moving heart rate", whole(self.mean_moving_heart_rate))?;
        write_line(f, "Mean cadence", whole(self.mean_cadence))?;
        write_line(f, "Moving cadence", whole(self.mean_moving_cadence))?;
        write_line(f, "Ascent", whole(self.total_ascent_metres).map(|m| m + " m"))?;
        write_line(f, "Descent", whole(self.total_descent_metres).map(|m| m + " m"))
    }
}
