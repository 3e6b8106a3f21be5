use thiserror::Error;

/// Everything that can go wrong when building an Activity or asking it
/// for a metric. All of these are usage errors: nothing is retried and no
/// partial result is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("'{0}' is not a registered channel")]
    UnknownChannel(String),

    #[error("a channel named '{0}' is already registered")]
    DuplicateChannel(String),

    #[error("the activity has no '{0}' column")]
    UnknownColumn(String),

    /// The metric exists, but an upstream compute step has not been run
    /// on this activity yet.
    #[error("{metric} is not available yet, '{requires}' must be computed first")]
    NotYetComputed {
        metric: &'static str,
        requires: &'static str,
    },

    /// The activity no longer has its elapsed-time index, e.g. after
    /// `reset_index()`.
    #[error("{metric} is not available, the activity has lost its time index")]
    TimeIndexLost { metric: &'static str },

    #[error("the '{channel}' channel has no '{property}' property")]
    UnsupportedProperty {
        channel: &'static str,
        property: &'static str,
    },

    #[error("gradient angles need the rise and run the gradient was built from")]
    MissingRiseRun,

    #[error("expected {expected} values but got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("the time index decreases at position {position}")]
    UnorderedIndex { position: usize },

    /// Division by a zero duration, or an average over no valid samples.
    #[error("{metric} cannot be computed from this data")]
    Degenerate { metric: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;
