//! The Activity: a time-indexed set of Columns recorded during one
//! workout, and the activity-level metrics computed from it.

use log::debug;
use time::{Duration, OffsetDateTime};

use crate::{
    channel::ChannelKind,
    column::Column,
    error::{Error, Result},
};

/// The row index of an Activity.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeIndex {
    /// Offsets from the activity start, non-decreasing.
    Elapsed(Vec<Duration>),
    /// Plain row numbers `0..n`. Temporal metrics are not available.
    Positional(usize),
}

impl TimeIndex {
    pub fn len(&self) -> usize {
        match self {
            TimeIndex::Elapsed(offsets) => offsets.len(),
            TimeIndex::Positional(n) => *n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn filter(&self, mask: &[bool]) -> TimeIndex {
        match self {
            TimeIndex::Elapsed(offsets) => TimeIndex::Elapsed(
                offsets
                    .iter()
                    .zip(mask)
                    .filter_map(|(t, &keep)| keep.then_some(*t))
                    .collect(),
            ),
            TimeIndex::Positional(_) => {
                TimeIndex::Positional(mask.iter().filter(|&&keep| keep).count())
            }
        }
    }
}

/// Per-sample moving/stopped classification, as produced by a stillness
/// detector. Each sample also remembers the time step that led to it, so
/// moving time stays correct after the stopped rows have been dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingState {
    flags: Vec<bool>,
    steps: Vec<Duration>,
}

impl MovingState {
    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    /// The time between each sample and the one before it, as it was when
    /// the state was attached. Zero for the first sample.
    pub fn steps(&self) -> &[Duration] {
        &self.steps
    }

    fn filter(&self, mask: &[bool]) -> MovingState {
        let (flags, steps) = self
            .flags
            .iter()
            .zip(&self.steps)
            .zip(mask)
            .filter_map(|((&flag, &step), &keep)| keep.then_some((flag, step)))
            .unzip();

        MovingState { flags, steps }
    }
}

/// Returns the time between each offset and the previous one. The first
/// step is zero.
pub(crate) fn time_steps(offsets: &[Duration]) -> Vec<Duration> {
    std::iter::once(Duration::ZERO)
        .chain(offsets.windows(2).map(|w| w[1] - w[0]))
        .take(offsets.len())
        .collect()
}

/// One recorded activity. Columns are index-aligned and there is at most
/// one Column per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    start: OffsetDateTime,
    index: TimeIndex,
    columns: Vec<Column>,
    moving: Option<MovingState>,
}

impl Activity {
    /// Creates an Activity with no columns. `elapsed` holds each sample's
    /// offset from `start` and must not decrease.
    pub fn new(start: OffsetDateTime, elapsed: Vec<Duration>) -> Result<Self> {
        if let Some(position) = elapsed.windows(2).position(|w| w[1] < w[0]) {
            return Err(Error::UnorderedIndex {
                position: position + 1,
            });
        }

        Ok(Self {
            start,
            index: TimeIndex::Elapsed(elapsed),
            columns: Vec::new(),
            moving: None,
        })
    }

    /// Creates an Activity from absolute sample times. The first time
    /// becomes the start.
    pub fn from_timestamps(times: &[OffsetDateTime]) -> Result<Self> {
        let start = *times.first().ok_or(Error::Degenerate {
            metric: "start time",
        })?;
        Self::new(start, times.iter().map(|&t| t - start).collect())
    }

    /// Builder-style [`Activity::add_column`].
    pub fn with_column(mut self, column: Column) -> Result<Self> {
        self.add_column(column)?;
        Ok(self)
    }

    /// Attaches a column, replacing any existing column of the same channel.
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if column.len() != self.len() {
            return Err(Error::LengthMismatch {
                expected: self.len(),
                actual: column.len(),
            });
        }

        match self.columns.iter_mut().find(|c| c.channel() == column.channel()) {
            Some(existing) => {
                debug!("Replacing the '{}' column", column.name());
                *existing = column;
            }
            None => {
                debug!("Attaching the '{}' column", column.name());
                self.columns.push(column);
            }
        }

        Ok(())
    }

    /// Attaches `values` under a registered channel name.
    pub fn attach<V: Into<Vec<f64>>>(&mut self, name: &str, values: V) -> Result<()> {
        self.add_column(Column::from_name(name, values)?)
    }

    pub fn start(&self) -> OffsetDateTime {
        self.start
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    pub fn get(&self, channel: ChannelKind) -> Option<&Column> {
        self.columns.iter().find(|c| c.channel() == channel)
    }

    pub fn has(&self, channel: ChannelKind) -> bool {
        self.get(channel).is_some()
    }

    /// Looks a column up by its canonical name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        let channel = ChannelKind::from_name(name)?;
        self.get(channel)
            .ok_or_else(|| Error::UnknownColumn(name.to_owned()))
    }

    pub fn moving_state(&self) -> Option<&MovingState> {
        self.moving.as_ref()
    }

    /// Attaches the moving/stopped classification, one flag per sample.
    pub fn set_moving(&mut self, flags: Vec<bool>) -> Result<()> {
        if flags.len() != self.len() {
            return Err(Error::LengthMismatch {
                expected: self.len(),
                actual: flags.len(),
            });
        }

        let steps = time_steps(self.elapsed("moving state")?);
        debug!(
            "Attaching moving state, {} of {} samples moving",
            flags.iter().filter(|&&m| m).count(),
            flags.len()
        );
        self.moving = Some(MovingState { flags, steps });
        Ok(())
    }

    /// The elapsed-time offsets, or `TimeIndexLost` naming `metric`.
    pub(crate) fn elapsed(&self, metric: &'static str) -> Result<&[Duration]> {
        match &self.index {
            TimeIndex::Elapsed(offsets) => Ok(offsets),
            TimeIndex::Positional(_) => Err(Error::TimeIndexLost { metric }),
        }
    }

    pub(crate) fn require_moving(&self, metric: &'static str) -> Result<&MovingState> {
        self.moving.as_ref().ok_or(Error::NotYetComputed {
            metric,
            requires: "moving",
        })
    }

    /// Keeps the rows where `mask` is true. The start, remaining index,
    /// columns and moving state all carry over.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Activity> {
        if mask.len() != self.len() {
            return Err(Error::LengthMismatch {
                expected: self.len(),
                actual: mask.len(),
            });
        }

        Ok(Activity {
            start: self.start,
            index: self.index.filter(mask),
            columns: self
                .columns
                .iter()
                .map(|c| c.filter(mask))
                .collect::<Result<_>>()?,
            moving: self.moving.as_ref().map(|m| m.filter(mask)),
        })
    }

    /// Keeps only the named columns, in the order each is first named.
    pub fn select(&self, names: &[&str]) -> Result<Activity> {
        let mut selected = Activity {
            start: self.start,
            index: self.index.clone(),
            columns: Vec::with_capacity(names.len()),
            moving: self.moving.clone(),
        };

        for name in names {
            selected.add_column(self.column(name)?.clone())?;
        }

        Ok(selected)
    }

    /// Replaces the time index with plain row numbers. The result keeps its
    /// columns but can no longer answer temporal questions such as
    /// [`Activity::elapsed_time`].
    pub fn reset_index(&self) -> Activity {
        Activity {
            start: self.start,
            index: TimeIndex::Positional(self.len()),
            columns: self.columns.clone(),
            moving: self.moving.clone(),
        }
    }

    /// The rows classified as moving.
    pub fn only_moving(&self) -> Result<Activity> {
        let moving = self.require_moving("only moving")?;
        self.filter_rows(&moving.flags)
    }

    /// Time from the first sample to the last.
    pub fn elapsed_time(&self) -> Result<Duration> {
        let offsets = self.elapsed("elapsed time")?;
        Ok(match (offsets.first(), offsets.last()) {
            (Some(first), Some(last)) => *last - *first,
            _ => Duration::ZERO,
        })
    }

    /// Total time spent in samples classified as moving.
    pub fn moving_time(&self) -> Result<Duration> {
        const METRIC: &str = "moving time";
        self.elapsed(METRIC)?;
        let moving = self.require_moving(METRIC)?;

        Ok(moving
            .flags
            .iter()
            .zip(&moving.steps)
            .filter(|(flag, _)| **flag)
            .map(|(_, &step)| step)
            .sum())
    }

    /// Total distance in metres: the sum of the per-step distances, or
    /// failing that the largest cumulative distance.
    pub fn distance(&self) -> Result<f64> {
        if let Some(distpos) = self.get(ChannelKind::DistancePerPosition) {
            return Ok(distpos.sum());
        }

        match self.get(ChannelKind::Distance) {
            Some(dist) => dist.max().ok_or(Error::Degenerate { metric: "distance" }),
            None => Err(Error::UnknownColumn("distpos/dist".into())),
        }
    }

    /// Mean speed in m/s.
    ///
    /// With `smoothing` this is the average of the instantaneous speeds.
    /// Without it, it is distance divided by time: the elapsed time, or
    /// the moving time when `only_moving` is set. `only_moving` restricts
    /// both paths to the rows classified as moving.
    pub fn mean_speed(&self, only_moving: bool, smoothing: bool) -> Result<f64> {
        const METRIC: &str = "mean speed";

        let moving_rows;
        let frame = if only_moving {
            moving_rows = self.filter_rows(&self.require_moving(METRIC)?.flags)?;
            &moving_rows
        } else {
            self
        };

        if smoothing {
            let speed = frame.get(ChannelKind::Speed).ok_or(Error::NotYetComputed {
                metric: METRIC,
                requires: "speed",
            })?;
            return speed.mean().ok_or(Error::Degenerate { metric: METRIC });
        }

        let distance = match frame.distance() {
            Err(Error::UnknownColumn(_)) => Err(Error::NotYetComputed {
                metric: METRIC,
                requires: "distance",
            }),
            other => other,
        }?;

        let duration = if only_moving {
            frame.moving_time()?
        } else {
            frame.elapsed_time()?
        };

        let seconds = duration.as_seconds_f64();
        if seconds <= 0.0 {
            return Err(Error::Degenerate { metric: METRIC });
        }

        Ok(distance / seconds)
    }

    /// Mean pace, the time taken to cover one metre. Same policies as
    /// [`Activity::mean_speed`].
    pub fn mean_pace(&self, only_moving: bool, smoothing: bool) -> Result<Duration> {
        let speed = self.mean_speed(only_moving, smoothing)?;
        let seconds_per_metre = 1.0 / speed;

        // Also rejects a zero or negative speed.
        if !(seconds_per_metre.is_finite()
            && seconds_per_metre > 0.0
            && seconds_per_metre < i64::MAX as f64)
        {
            return Err(Error::Degenerate {
                metric: "mean pace",
            });
        }

        Ok(Duration::seconds_f64(seconds_per_metre))
    }

    pub fn mean_heart_rate(&self, only_moving: bool) -> Result<f64> {
        self.channel_mean(ChannelKind::HeartRate, only_moving, "mean heart rate")
    }

    pub fn mean_cadence(&self, only_moving: bool) -> Result<f64> {
        self.channel_mean(ChannelKind::Cadence, only_moving, "mean cadence")
    }

    fn channel_mean(
        &self,
        channel: ChannelKind,
        only_moving: bool,
        metric: &'static str,
    ) -> Result<f64> {
        let column = self
            .get(channel)
            .ok_or_else(|| Error::UnknownColumn(channel.name().to_owned()))?;

        let mean = if only_moving {
            column.filter(&self.require_moving(metric)?.flags)?.mean()
        } else {
            column.mean()
        };

        mean.ok_or(Error::Degenerate { metric })
    }

    /// Metres climbed over the whole activity.
    pub fn total_ascent(&self) -> Result<f64> {
        Ok(self.column("alt")?.ascent()?.sum())
    }

    /// Metres descended over the whole activity, as a positive number.
    pub fn total_descent(&self) -> Result<f64> {
        Ok(-self.column("alt")?.descent()?.sum())
    }
}
