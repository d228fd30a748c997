//! Truncated Poisson count distributions.

use crate::error::{Result, check_rate};
use crate::pmf::Pmf;
use statrs::distribution::{Discrete, Poisson};
use tracing::warn;

/// Default upper bound on the event count considered per prediction window.
pub const DEFAULT_MAX_COUNT: u32 = 20;

/// Truncation is acceptable while at least this share of the untruncated mass survives.
pub const MIN_RETAINED_MASS: f64 = 0.999;

/// A normalized Poisson PMF over `0..=max_count` together with the mass it kept.
#[derive(Debug, Clone)]
pub struct TruncatedPoisson {
    pub pmf: Pmf<i64>,
    /// Mass on `0..=max_count` before normalization.
    pub retained: f64,
}

impl TruncatedPoisson {
    pub fn is_adequate(&self) -> bool {
        self.retained >= MIN_RETAINED_MASS
    }
}

/// Builds the Poisson distribution for `expected` events, truncated at `max_count`.
pub fn truncated_poisson(expected: f64, max_count: u32) -> Result<TruncatedPoisson> {
    let expected = check_rate(expected)?;

    let mut pmf = Pmf::new();
    if expected == 0.0 {
        pmf.set(0, 1.0);
        for k in 1..=max_count {
            pmf.set(i64::from(k), 0.0);
        }
        return Ok(TruncatedPoisson { pmf, retained: 1.0 });
    }

    let poisson = Poisson::new(expected)?;
    for k in 0..=max_count {
        pmf.set(i64::from(k), poisson.pmf(u64::from(k)));
    }
    let retained = pmf.normalize()?;
    Ok(TruncatedPoisson { pmf, retained })
}

/// Like [`truncated_poisson`] but only returns the PMF, logging when the cutoff is too low.
pub fn poisson_pmf(expected: f64, max_count: u32) -> Result<Pmf<i64>> {
    let truncated = truncated_poisson(expected, max_count)?;
    if !truncated.is_adequate() {
        warn!(
            expected,
            max_count,
            retained = truncated.retained,
            "poisson truncation drops a significant share of the mass"
        );
    }
    Ok(truncated.pmf)
}

/// Smallest cutoff (never below [`DEFAULT_MAX_COUNT`]) leaving a negligible tail.
///
/// Uses the mean plus six standard deviations plus a fixed margin for small means.
pub fn suggested_max_count(expected: f64) -> u32 {
    if !(expected.is_finite() && expected > 0.0) {
        return DEFAULT_MAX_COUNT;
    }
    let bound = (expected + 6.0 * expected.sqrt() + 10.0).ceil();
    (bound as u32).max(DEFAULT_MAX_COUNT)
}
