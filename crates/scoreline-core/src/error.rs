use thiserror::Error;

/// Failures surfaced by the probability engine.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Normalization found zero total mass (every hypothesis was ruled out).
    #[error("distribution has zero total mass; every hypothesis was ruled out")]
    DegenerateDistribution,
    #[error("invalid rate {rate}: rates must be finite and non-negative")]
    InvalidRate { rate: f64 },
    #[error("invalid probability mass {mass}: masses and weights must be finite and non-negative")]
    InvalidMass { mass: f64 },
    #[error("invalid duration {minutes} min: durations must be finite and non-negative")]
    InvalidDuration { minutes: f64 },
    #[error("hypothesis set is empty")]
    EmptyHypotheses,
    #[error("invalid rate grid: {0}")]
    InvalidGrid(String),
    #[error("invalid percentile {0}: expected a value within [0, 100]")]
    InvalidPercentile(f64),
    /// Advisory: the Poisson cutoff discards a meaningful share of the mass.
    #[error(
        "poisson truncation at {max_count} keeps only {retained:.5} of the mass for expected count {expected:.3}"
    )]
    TruncationRisk {
        expected: f64,
        max_count: u32,
        retained: f64,
    },
    #[error("game {game}, event {event}: {source}")]
    Observation {
        game: usize,
        event: usize,
        #[source]
        source: Box<ModelError>,
    },
    #[error("poisson parameter rejected: {0}")]
    Poisson(#[from] statrs::StatsError),
    #[error("failed to decode event log: {0}")]
    EventLog(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;

pub(crate) fn check_rate(rate: f64) -> Result<f64> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(rate)
    } else {
        Err(ModelError::InvalidRate { rate })
    }
}

pub(crate) fn check_mass(mass: f64) -> Result<f64> {
    if mass.is_finite() && mass >= 0.0 {
        Ok(mass)
    } else {
        Err(ModelError::InvalidMass { mass })
    }
}

pub(crate) fn check_duration(minutes: f64) -> Result<f64> {
    if minutes.is_finite() && minutes >= 0.0 {
        Ok(minutes)
    } else {
        Err(ModelError::InvalidDuration { minutes })
    }
}
