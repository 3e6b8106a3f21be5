//! Moving/stopped classification of the samples of an Activity.

use log::debug;
use logging_timer::time;
use time::Duration;

use crate::{
    activity::{time_steps, Activity},
    channel::ChannelKind,
    column::{mps_to_kph, Column},
    error::{Error, Result},
};

/// These are the parameters that control moving-state detection.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingParameters {
    /// You are considered "Stopped" at any sample where your speed is at
    /// or below this. Samples with no speed are also stopped.
    pub stopped_speed_kmh: f64,

    /// Noisy data produces tiny stops, for example when pulling away at
    /// a junction. Stops shorter than this, in seconds, are treated as
    /// moving. Zero keeps every stop.
    pub min_stop_seconds: f64,
}

impl Default for MovingParameters {
    fn default() -> Self {
        Self {
            stopped_speed_kmh: 1.8,
            min_stop_seconds: 0.0,
        }
    }
}

/// Classifies each sample of `speed` (m/s) as moving (true) or stopped.
/// `steps` is the time step leading to each sample.
pub fn classify_moving(
    speed: &Column,
    steps: &[Duration],
    params: &MovingParameters,
) -> Result<Vec<bool>> {
    if steps.len() != speed.len() {
        return Err(Error::LengthMismatch {
            expected: speed.len(),
            actual: steps.len(),
        });
    }

    let mut flags = speed
        .iter()
        .map(|v| mps_to_kph(v) > params.stopped_speed_kmh)
        .collect::<Vec<_>>();

    if params.min_stop_seconds > 0.0 {
        absorb_short_stops(&mut flags, steps, params.min_stop_seconds);
    }

    Ok(flags)
}

/// Flips every run of stopped samples lasting less than `min_stop_seconds`
/// to moving.
fn absorb_short_stops(flags: &mut [bool], steps: &[Duration], min_stop_seconds: f64) {
    let mut idx = 0;
    while idx < flags.len() {
        if flags[idx] {
            idx += 1;
            continue;
        }

        let run_start = idx;
        while idx < flags.len() && !flags[idx] {
            idx += 1;
        }

        let stop_duration: Duration = steps[run_start..idx].iter().sum();
        if stop_duration.as_seconds_f64() < min_stop_seconds {
            debug!(
                "Ignoring a {stop_duration} stop at samples {run_start}..{idx}, shorter than {min_stop_seconds}s"
            );
            flags[run_start..idx].fill(true);
        }
    }
}

impl Activity {
    /// Classifies every sample as moving or stopped from the speed column
    /// and attaches the result, enabling [`Activity::only_moving`] and
    /// [`Activity::moving_time`].
    #[time]
    pub fn compute_moving(&mut self, params: &MovingParameters) -> Result<()> {
        const METRIC: &str = "moving state";
        let speed = self.get(ChannelKind::Speed).ok_or(Error::NotYetComputed {
            metric: METRIC,
            requires: "speed",
        })?;

        let steps = time_steps(self.elapsed(METRIC)?);
        let flags = classify_moving(speed, &steps, params)?;
        self.set_moving(flags)
    }
}
