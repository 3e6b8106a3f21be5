//! Typed time-series columns and activity-level metrics for GPS and
//! fitness-tracker recordings.
//!
//! A parser produces an [`Activity`]: a start time, an elapsed-time index
//! and one [`Column`] per recorded channel. Distance, speed and the moving
//! state are then computed on top of it, and the metrics are read back.
//!
//! ```
//! use runframe_core::{Activity, MovingParameters};
//! use time::{macros::datetime, Duration};
//!
//! let elapsed = (0..4).map(|s| Duration::seconds(s * 10)).collect();
//! let mut activity = Activity::new(datetime!(2024-06-01 07:30:00 UTC), elapsed)?;
//! activity.attach("lat", vec![51.0, 51.001, 51.002, 51.003])?;
//! activity.attach("lon", vec![-1.0; 4])?;
//!
//! activity.compute_distance()?;
//! activity.compute_speed()?;
//! activity.compute_moving(&MovingParameters::default())?;
//!
//! assert_eq!(activity.elapsed_time()?, Duration::seconds(30));
//! assert_eq!(activity.moving_time()?, Duration::seconds(30));
//! # Ok::<(), runframe_core::Error>(())
//! ```

pub mod activity;
pub mod channel;
pub mod column;
pub mod compute;
pub mod error;
pub mod formatting;
pub mod moving;
pub mod summary;

pub use activity::{Activity, MovingState, TimeIndex};
pub use channel::{registry, ChannelDescriptor, ChannelKind, ChannelRegistry, DerivedProperty};
pub use column::Column;
pub use error::{Error, Result};
pub use moving::MovingParameters;
pub use summary::ActivitySummary;
