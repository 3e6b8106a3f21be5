//! The channels (measurement streams) the library understands, and the
//! process-wide registry that maps their canonical names to descriptors.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use log::debug;

use crate::error::{Error, Result};

/// Identity of a measurement channel. Every Column is tagged with one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelKind {
    Altitude,
    Cadence,
    DistancePerPosition,
    Distance,
    HeartRate,
    LonLat,
    Longitude,
    Latitude,
    Pace,
    Power,
    Speed,
    Temperature,
    Vam,
    Gradient,
}

/// A view computed on demand from a Column of a particular channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedProperty {
    Ascent,
    Descent,
    Distance,
    Kph,
    Pct,
    Radians,
    Degrees,
}

impl DerivedProperty {
    pub fn name(self) -> &'static str {
        match self {
            DerivedProperty::Ascent => "ascent",
            DerivedProperty::Descent => "descent",
            DerivedProperty::Distance => "distance",
            DerivedProperty::Kph => "kph",
            DerivedProperty::Pct => "pct",
            DerivedProperty::Radians => "radians",
            DerivedProperty::Degrees => "degrees",
        }
    }
}

/// What the registry knows about a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDescriptor {
    pub kind: ChannelKind,
    /// The canonical (case-sensitive) column name, e.g. "alt".
    pub name: &'static str,
    pub base_unit: &'static str,
    pub properties: &'static [DerivedProperty],
}

impl ChannelDescriptor {
    pub fn supports(&self, property: DerivedProperty) -> bool {
        self.properties.contains(&property)
    }
}

impl ChannelKind {
    /// Every built-in channel, in registration order.
    pub const ALL: [ChannelKind; 14] = [
        ChannelKind::Altitude,
        ChannelKind::Cadence,
        ChannelKind::DistancePerPosition,
        ChannelKind::Distance,
        ChannelKind::HeartRate,
        ChannelKind::LonLat,
        ChannelKind::Longitude,
        ChannelKind::Latitude,
        ChannelKind::Pace,
        ChannelKind::Power,
        ChannelKind::Speed,
        ChannelKind::Temperature,
        ChannelKind::Vam,
        ChannelKind::Gradient,
    ];

    pub const fn descriptor(self) -> ChannelDescriptor {
        use DerivedProperty::*;

        let (name, base_unit, properties): (_, _, &'static [DerivedProperty]) = match self {
            ChannelKind::Altitude => ("alt", "m", &[Ascent, Descent]),
            ChannelKind::Cadence => ("cad", "rpm", &[]),
            ChannelKind::DistancePerPosition => ("distpos", "m", &[Distance]),
            ChannelKind::Distance => ("dist", "m", &[]),
            ChannelKind::HeartRate => ("hr", "bpm", &[]),
            ChannelKind::LonLat => ("lonlat", "degrees", &[]),
            ChannelKind::Longitude => ("lon", "degrees", &[]),
            ChannelKind::Latitude => ("lat", "degrees", &[]),
            ChannelKind::Pace => ("pace", "sec/m", &[]),
            ChannelKind::Power => ("pwr", "watts", &[]),
            ChannelKind::Speed => ("speed", "m/s", &[Kph]),
            ChannelKind::Temperature => ("temp", "degrees_C", &[]),
            ChannelKind::Vam => ("vam", "m/s", &[]),
            ChannelKind::Gradient => ("grad", "fraction", &[Pct, Radians, Degrees]),
        };

        ChannelDescriptor {
            kind: self,
            name,
            base_unit,
            properties,
        }
    }

    pub const fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub const fn base_unit(self) -> &'static str {
        self.descriptor().base_unit
    }

    /// True for the channels holding GPS coordinates in degrees.
    pub fn is_lon_lat(self) -> bool {
        matches!(
            self,
            ChannelKind::LonLat | ChannelKind::Longitude | ChannelKind::Latitude
        )
    }

    /// Resolves a canonical column name through the registry.
    pub fn from_name(name: &str) -> Result<ChannelKind> {
        registry().lookup(name).map(|desc| desc.kind)
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Maps canonical channel names to their descriptors.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: HashMap<&'static str, ChannelDescriptor>,
}

impl ChannelRegistry {
    /// Creates an empty registry. Most code wants the populated,
    /// process-wide one returned by [`registry`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `descriptor.name` to the descriptor. Names are unique.
    pub fn register(&mut self, descriptor: ChannelDescriptor) -> Result<()> {
        if self.channels.contains_key(descriptor.name) {
            return Err(Error::DuplicateChannel(descriptor.name.to_owned()));
        }

        self.channels.insert(descriptor.name, descriptor);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&ChannelDescriptor> {
        self.channels
            .get(name)
            .ok_or_else(|| Error::UnknownChannel(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// The registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.channels.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// The registry of built-in channels. Populated on first use and
/// read-only afterwards.
pub fn registry() -> &'static ChannelRegistry {
    static REGISTRY: OnceLock<ChannelRegistry> = OnceLock::new();
    REGISTRY.get_or_init(register_builtin_channels)
}

fn register_builtin_channels() -> ChannelRegistry {
    let mut registry = ChannelRegistry::new();

    for kind in ChannelKind::ALL {
        let registered = registry.register(kind.descriptor());
        debug_assert!(registered.is_ok(), "built-in channel {kind} registered twice");
    }

    debug!("Registered {} built-in channels", registry.len());
    registry
}
