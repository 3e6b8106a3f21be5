//! A single measurement channel as a sequence of samples, plus the
//! channel-specific properties derived from it.
//!
//! Missing samples are stored as `NaN`. Aggregates skip them, the same
//! way a dataframe engine would.

use std::ops::Range;

use crate::{
    channel::{registry, ChannelKind, DerivedProperty},
    error::{Error, Result},
};

/// FIT files store coordinates as signed 32-bit "semicircles", where
/// 2^31 semicircles make 180 degrees.
const SEMICIRCLES_PER_180_DEGREES: f64 = 2_147_483_648.0;

/// Converts a speed in m/s to km/h.
pub fn mps_to_kph(metres_per_second: f64) -> f64 {
    metres_per_second * 3600.0 / 1000.0
}

/// Converts a speed in km/h to m/s.
pub fn kph_to_mps(kph: f64) -> f64 {
    kph * 1000.0 / 3600.0
}

/// Decodes a FIT semicircle value into degrees in the range [-180, 180).
pub fn semicircles_to_degrees(semicircles: i32) -> f64 {
    (f64::from(semicircles) * 180.0 / SEMICIRCLES_PER_180_DEGREES + 180.0).rem_euclid(360.0)
        - 180.0
}

/// The raw vertical and horizontal components a Gradient was built from.
#[derive(Debug, Clone, PartialEq)]
struct RiseRun {
    rise: Vec<f64>,
    run: Vec<f64>,
}

/// One channel's samples. The channel (and with it the name and base
/// unit) is fixed at construction and survives every transformation that
/// produces a new Column from this one.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    channel: ChannelKind,
    values: Vec<f64>,
    rise_run: Option<RiseRun>,
}

impl Column {
    pub fn new<V: Into<Vec<f64>>>(channel: ChannelKind, values: V) -> Self {
        Self {
            channel,
            values: values.into(),
            rise_run: None,
        }
    }

    /// Creates a Column for the channel registered under `name`.
    pub fn from_name<V: Into<Vec<f64>>>(name: &str, values: V) -> Result<Self> {
        let desc = registry().lookup(name)?;
        Ok(Self::new(desc.kind, values))
    }

    /// Builds a Gradient from its vertical (`rise`) and horizontal (`run`)
    /// components. The fraction is `rise / run`; the components are kept so
    /// that [`Column::radians`] and [`Column::degrees`] can use them.
    pub fn gradient_from_rise_run<V1, V2>(rise: V1, run: V2) -> Result<Self>
    where
        V1: Into<Vec<f64>>,
        V2: Into<Vec<f64>>,
    {
        let rise = rise.into();
        let run = run.into();
        if rise.len() != run.len() {
            return Err(Error::LengthMismatch {
                expected: rise.len(),
                actual: run.len(),
            });
        }

        let values = rise.iter().zip(&run).map(|(r, h)| r / h).collect();

        Ok(Self {
            channel: ChannelKind::Gradient,
            values,
            rise_run: Some(RiseRun { rise, run }),
        })
    }

    /// Decodes FIT semicircles into a coordinate Column. Only the
    /// longitude/latitude channels accept this.
    pub fn from_semicircles(channel: ChannelKind, semicircles: &[i32]) -> Result<Self> {
        if !channel.is_lon_lat() {
            return Err(Error::UnsupportedProperty {
                channel: channel.name(),
                property: "semicircles",
            });
        }

        let values = semicircles
            .iter()
            .map(|&s| semicircles_to_degrees(s))
            .collect::<Vec<_>>();
        Ok(Self::new(channel, values))
    }

    /// Makes a new Column of the same channel holding `values`. This is
    /// how every transformation produces its output. Gradient rise/run
    /// components are not carried over.
    pub fn with_values<V: Into<Vec<f64>>>(&self, values: V) -> Self {
        Self::new(self.channel, values)
    }

    pub fn channel(&self) -> ChannelKind {
        self.channel
    }

    pub fn name(&self) -> &'static str {
        self.channel.name()
    }

    pub fn base_unit(&self) -> &'static str {
        self.channel.base_unit()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    fn valid(&self) -> impl Iterator<Item = f64> + '_ {
        self.iter().filter(|v| !v.is_nan())
    }

    /// Sum of the valid samples. Zero when there are none.
    pub fn sum(&self) -> f64 {
        self.valid().sum()
    }

    /// Number of valid (non-NaN) samples.
    pub fn count(&self) -> usize {
        self.valid().count()
    }

    pub fn mean(&self) -> Option<f64> {
        match self.count() {
            0 => None,
            n => Some(self.sum() / n as f64),
        }
    }

    pub fn max(&self) -> Option<f64> {
        self.valid().reduce(f64::max)
    }

    pub fn min(&self) -> Option<f64> {
        self.valid().reduce(f64::min)
    }

    /// Sample-to-sample differences. The first sample has no predecessor
    /// and is NaN.
    pub fn diff(&self) -> Self {
        let values = std::iter::once(f64::NAN)
            .chain(self.values.windows(2).map(|w| w[1] - w[0]))
            .take(self.len())
            .collect::<Vec<_>>();
        self.with_values(values)
    }

    /// Running total. NaN samples stay NaN and do not interrupt the total.
    pub fn cumsum(&self) -> Self {
        let mut total = 0.0;
        let values = self
            .iter()
            .map(|v| {
                if v.is_nan() {
                    v
                } else {
                    total += v;
                    total
                }
            })
            .collect::<Vec<_>>();
        self.with_values(values)
    }

    pub fn map<F: FnMut(f64) -> f64>(&self, f: F) -> Self {
        self.with_values(self.iter().map(f).collect::<Vec<_>>())
    }

    pub fn scale(&self, factor: f64) -> Self {
        self.map(|v| v * factor)
    }

    /// Keeps the samples where `mask` is true.
    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.len() {
            return Err(Error::LengthMismatch {
                expected: self.len(),
                actual: mask.len(),
            });
        }

        let values = self
            .iter()
            .zip(mask)
            .filter_map(|(v, &keep)| keep.then_some(v))
            .collect::<Vec<_>>();
        Ok(self.with_values(values))
    }

    /// The samples in `range`, clamped to the Column's length.
    pub fn slice(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        self.with_values(&self.values[start..end])
    }

    fn require(&self, property: DerivedProperty) -> Result<()> {
        if self.channel.descriptor().supports(property) {
            Ok(())
        } else {
            Err(Error::UnsupportedProperty {
                channel: self.name(),
                property: property.name(),
            })
        }
    }

    /// Altitude gained at each sample: the positive deltas, zero elsewhere.
    pub fn ascent(&self) -> Result<Self> {
        self.require(DerivedProperty::Ascent)?;
        Ok(self.diff().map(|d| if d > 0.0 { d } else { 0.0 }))
    }

    /// Altitude lost at each sample: the negative deltas, zero elsewhere.
    pub fn descent(&self) -> Result<Self> {
        self.require(DerivedProperty::Descent)?;
        Ok(self.diff().map(|d| if d < 0.0 { d } else { 0.0 }))
    }

    /// The cumulative distance built from per-step distances.
    pub fn distance(&self) -> Result<Self> {
        self.require(DerivedProperty::Distance)?;
        Ok(Column::new(ChannelKind::Distance, self.cumsum().into_values()))
    }

    /// Speed in km/h.
    pub fn kph(&self) -> Result<Vec<f64>> {
        self.require(DerivedProperty::Kph)?;
        Ok(self.iter().map(mps_to_kph).collect())
    }

    /// Gradient as a percentage.
    pub fn pct(&self) -> Result<Vec<f64>> {
        self.require(DerivedProperty::Pct)?;
        Ok(self.iter().map(|v| v * 100.0).collect())
    }

    /// Gradient as an angle, `atan2(rise, run)`.
    pub fn radians(&self) -> Result<Vec<f64>> {
        self.require(DerivedProperty::Radians)?;
        let rr = self.rise_run.as_ref().ok_or(Error::MissingRiseRun)?;
        Ok(rr
            .rise
            .iter()
            .zip(&rr.run)
            .map(|(rise, run)| rise.atan2(*run))
            .collect())
    }

    pub fn degrees(&self) -> Result<Vec<f64>> {
        self.require(DerivedProperty::Degrees)?;
        Ok(self.radians()?.into_iter().map(f64::to_degrees).collect())
    }

    /// True if this is a Gradient built from rise and run.
    pub fn has_rise_run(&self) -> bool {
        self.rise_run.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < EPS, "{x} != {y}");
        }
    }

    #[test]
    fn transformations_keep_the_channel() {
        let alt = Column::new(ChannelKind::Altitude, vec![10.0, 12.0, 11.0]);
        assert_eq!(alt.slice(1..3).channel(), ChannelKind::Altitude);
        assert_eq!(alt.scale(2.0).base_unit(), "m");
        assert_eq!(alt.filter(&[true, false, true]).unwrap().name(), "alt");
        assert_eq!(alt.diff().channel(), ChannelKind::Altitude);
    }

    #[test]
    fn from_name_uses_the_registry() {
        let hr = Column::from_name("hr", vec![120.0]).unwrap();
        assert_eq!(hr.channel(), ChannelKind::HeartRate);
        assert_eq!(hr.base_unit(), "bpm");

        assert_eq!(
            Column::from_name("heartrate", vec![120.0]),
            Err(Error::UnknownChannel("heartrate".into()))
        );
    }

    #[test]
    fn ascent_and_descent_split_the_deltas() {
        let alt = Column::new(ChannelKind::Altitude, vec![100.0, 102.5, 101.0, 101.0, 104.0]);
        let ascent = alt.ascent().unwrap();
        let descent = alt.descent().unwrap();

        assert_close(ascent.values(), &[0.0, 2.5, 0.0, 0.0, 3.0]);
        assert_close(descent.values(), &[0.0, 0.0, -1.5, 0.0, 0.0]);
        assert!(ascent.iter().all(|v| v >= 0.0));
        assert!(descent.iter().all(|v| v <= 0.0));

        let diff = alt.diff();
        for ((a, d), delta) in ascent.iter().zip(descent.iter()).zip(diff.iter()) {
            let delta = if delta.is_nan() { 0.0 } else { delta };
            assert!((a + d - delta).abs() < EPS);
        }
    }

    #[test]
    fn ascent_needs_an_altitude_column() {
        let hr = Column::new(ChannelKind::HeartRate, vec![100.0, 110.0]);
        assert_eq!(
            hr.ascent(),
            Err(Error::UnsupportedProperty {
                channel: "hr",
                property: "ascent"
            })
        );
    }

    #[test]
    fn distance_is_the_running_total() {
        let distpos = Column::new(ChannelKind::DistancePerPosition, vec![0.0, 3.2, 4.1, 0.0, 5.5]);
        let dist = distpos.distance().unwrap();

        assert_eq!(dist.channel(), ChannelKind::Distance);
        assert!(dist.values().windows(2).all(|w| w[1] >= w[0]));
        assert!((dist.values()[4] - distpos.sum()).abs() < EPS);
    }

    #[test]
    fn cumsum_skips_missing_samples() {
        let distpos = Column::new(ChannelKind::DistancePerPosition, vec![1.0, f64::NAN, 2.0]);
        let dist = distpos.distance().unwrap();
        assert_eq!(dist.values()[0], 1.0);
        assert!(dist.values()[1].is_nan());
        assert_eq!(dist.values()[2], 3.0);
    }

    #[test]
    fn aggregates_skip_nan() {
        let speed = Column::new(ChannelKind::Speed, vec![f64::NAN, 2.0, 4.0]);
        assert_eq!(speed.count(), 2);
        assert_eq!(speed.sum(), 6.0);
        assert_eq!(speed.mean(), Some(3.0));
        assert_eq!(speed.max(), Some(4.0));
        assert_eq!(speed.min(), Some(2.0));

        let empty = Column::new(ChannelKind::Speed, Vec::new());
        assert_eq!(empty.mean(), None);
        assert_eq!(empty.max(), None);
        assert_eq!(empty.sum(), 0.0);
    }

    #[test]
    fn kph_converts_from_metres_per_second() {
        let speed = Column::new(ChannelKind::Speed, vec![1.0, 2.5, 10.0]);
        assert_close(&speed.kph().unwrap(), &[3.6, 9.0, 36.0]);
        assert!((kph_to_mps(mps_to_kph(4.2)) - 4.2).abs() < EPS);
    }

    #[test]
    fn gradient_from_rise_run() {
        let grad = Column::gradient_from_rise_run(vec![1.0, -2.0, 0.0], vec![10.0, 4.0, 5.0]).unwrap();
        assert_close(grad.values(), &[0.1, -0.5, 0.0]);
        assert_close(&grad.pct().unwrap(), &[10.0, -50.0, 0.0]);

        let radians = grad.radians().unwrap();
        assert_close(&radians, &[0.1f64.atan(), (-0.5f64).atan(), 0.0]);

        let degrees = grad.degrees().unwrap();
        assert!((degrees[0] - 5.710593137499643).abs() < 1e-9);
        assert!((degrees[1] + 26.56505117707799).abs() < 1e-9);
    }

    #[test]
    fn gradient_angles_need_rise_and_run() {
        let grad = Column::new(ChannelKind::Gradient, vec![0.1, 0.2]);
        assert_close(&grad.pct().unwrap(), &[10.0, 20.0]);
        assert_eq!(grad.radians(), Err(Error::MissingRiseRun));
        assert_eq!(grad.degrees(), Err(Error::MissingRiseRun));
    }

    #[test]
    fn generic_transformations_drop_rise_and_run() {
        let grad = Column::gradient_from_rise_run(vec![1.0, 2.0], vec![10.0, 10.0]).unwrap();
        assert!(grad.has_rise_run());

        let sliced = grad.slice(0..1);
        assert_eq!(sliced.channel(), ChannelKind::Gradient);
        assert!(!sliced.has_rise_run());
        assert_eq!(sliced.radians(), Err(Error::MissingRiseRun));
    }

    #[test]
    fn rise_and_run_must_have_the_same_length() {
        assert_eq!(
            Column::gradient_from_rise_run(vec![1.0, 2.0], vec![10.0]),
            Err(Error::LengthMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn semicircles_decode_per_formula() {
        assert_eq!(semicircles_to_degrees(0), 0.0);
        assert_eq!(semicircles_to_degrees(i32::MIN), -180.0);
        assert_eq!(semicircles_to_degrees(1 << 30), 90.0);
        assert_eq!(semicircles_to_degrees(-(1 << 30)), -90.0);
        assert!(semicircles_to_degrees(i32::MAX) < 180.0);

        // Roughly 51.5 degrees north.
        let lat = semicircles_to_degrees(614_418_933);
        assert!((lat - 51.5).abs() < 1e-6, "{lat}");
    }

    #[test]
    fn semicircles_stay_in_range() {
        for s in [i32::MIN, -1_000_000_000, -1, 0, 1, 123_456_789, i32::MAX] {
            let deg = semicircles_to_degrees(s);
            assert!((-180.0..180.0).contains(&deg), "{s} -> {deg}");
        }
    }

    #[test]
    fn only_coordinates_decode_semicircles() {
        let lon = Column::from_semicircles(ChannelKind::Longitude, &[0, 1 << 30]).unwrap();
        assert_eq!(lon.values(), &[0.0, 90.0]);
        assert_eq!(lon.base_unit(), "degrees");

        assert!(matches!(
            Column::from_semicircles(ChannelKind::Altitude, &[0]),
            Err(Error::UnsupportedProperty { .. })
        ));
    }

    #[test]
    fn filter_checks_the_mask_length() {
        let cad = Column::new(ChannelKind::Cadence, vec![80.0, 82.0]);
        assert_eq!(
            cad.filter(&[true]),
            Err(Error::LengthMismatch {
                expected: 2,
                actual: 1
            })
        );
    }
}
