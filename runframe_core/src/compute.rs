//! Derived columns computed from the raw position, altitude and time
//! data: per-step and cumulative distance, speed, pace, gradient and VAM.
//! Each step attaches its result to the Activity in place.

use geo::{point, HaversineDistance};
use log::{debug, warn};
use logging_timer::time;

use crate::{
    activity::Activity,
    channel::ChannelKind,
    column::Column,
    error::{Error, Result},
};

/// Divides `numerator` by the time step leading to each sample. The first
/// sample, and samples with a zero time step, are NaN.
fn per_second(numerator: &[f64], activity: &Activity, metric: &'static str) -> Result<Vec<f64>> {
    let elapsed = activity.elapsed(metric)?;
    let mut zero_steps = 0;

    let values = numerator
        .iter()
        .enumerate()
        .map(|(idx, value)| {
            if idx == 0 {
                return f64::NAN;
            }

            let seconds = (elapsed[idx] - elapsed[idx - 1]).as_seconds_f64();
            if seconds > 0.0 {
                value / seconds
            } else {
                zero_steps += 1;
                f64::NAN
            }
        })
        .collect();

    if zero_steps > 0 {
        warn!("{metric}: {zero_steps} samples share a timestamp with their predecessor");
    }

    Ok(values)
}

impl Activity {
    /// Computes the distance between consecutive positions (`distpos`) and
    /// the running total (`dist`), in metres.
    #[time]
    pub fn compute_distance(&mut self) -> Result<()> {
        let lat = self.column("lat")?;
        let lon = self.column("lon")?;

        // n.b. x=lon, y=lat. If you do it the other way round the
        // distances are wrong - a lot wrong.
        let mut previous = None;
        let steps = lat
            .iter()
            .zip(lon.iter())
            .map(|(lat, lon)| {
                let p2 = point!(x: lon, y: lat);
                let metres = previous.map_or(0.0, |p1: geo::Point| p1.haversine_distance(&p2));
                previous = Some(p2);
                metres
            })
            .collect::<Vec<_>>();

        let distpos = Column::new(ChannelKind::DistancePerPosition, steps);
        let dist = distpos.distance()?;
        debug!(
            "Computed distance over {} positions: {:.2}m",
            distpos.len(),
            distpos.sum()
        );

        self.add_column(distpos)?;
        self.add_column(dist)
    }

    /// Computes the speed in m/s from the per-step distance and the time
    /// steps.
    #[time]
    pub fn compute_speed(&mut self) -> Result<()> {
        const METRIC: &str = "speed";
        let distpos = self
            .get(ChannelKind::DistancePerPosition)
            .ok_or(Error::NotYetComputed {
                metric: METRIC,
                requires: "distpos",
            })?;

        let speed = per_second(distpos.values(), self, METRIC)?;
        self.add_column(Column::new(ChannelKind::Speed, speed))
    }

    /// Computes the pace in seconds per metre from the speed. Samples with
    /// no speed, or a speed of zero, have no pace.
    pub fn compute_pace(&mut self) -> Result<()> {
        let speed = self.get(ChannelKind::Speed).ok_or(Error::NotYetComputed {
            metric: "pace",
            requires: "speed",
        })?;

        let pace = speed
            .iter()
            .map(|v| if v > 0.0 { 1.0 / v } else { f64::NAN })
            .collect::<Vec<_>>();
        self.add_column(Column::new(ChannelKind::Pace, pace))
    }

    /// Computes the gradient from the altitude change (rise) over the
    /// per-step distance (run). The rise and run are kept, so the angle
    /// views of the gradient are available.
    #[time]
    pub fn compute_gradient(&mut self) -> Result<()> {
        let rise = self.column("alt")?.diff().into_values();
        let run = self
            .get(ChannelKind::DistancePerPosition)
            .ok_or(Error::NotYetComputed {
                metric: "gradient",
                requires: "distpos",
            })?
            .values()
            .to_vec();

        self.add_column(Column::gradient_from_rise_run(rise, run)?)
    }

    /// Computes the vertical ascent speed in m/s: the altitude change over
    /// each time step.
    pub fn compute_vam(&mut self) -> Result<()> {
        let rise = self.column("alt")?.diff().into_values();
        let vam = per_second(&rise, self, "vam")?;
        self.add_column(Column::new(ChannelKind::Vam, vam))
    }
}
