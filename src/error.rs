use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the simulation core and its front-end layers.
///
/// The simulator is deterministic given its inputs, so every variant is
/// fatal; there are no transient errors and no retries.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Overlapping or out-of-bounds particle, or malformed container polygon,
    /// detected before the first event.
    #[error("invalid initial state: {0}")]
    InvalidState(String),

    /// Numerical or geometric issue (e.g., degenerate contact normal).
    #[error("numerical error: {0}")]
    MathError(String),

    /// The event queue emptied with steps remaining to produce. A closed
    /// bounded system with non-zero kinetic energy always has a next event,
    /// so this indicates a geometry bug (a particle escaped the container).
    #[error("event queue exhausted at step {step}: a particle escaped the container")]
    HeapExhausted { step: u64 },

    /// Too many consecutive events advanced simulated time by less than
    /// machine precision; accumulated drift has wedged the trajectory.
    #[error("numerical stall at step {step}, t = {time}: {run} consecutive zero-advance events")]
    NumericalStall { step: u64, time: f64, run: u32 },

    /// Propagated I/O errors from the snapshot sink.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed JSON configuration.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}
