//! Posterior over the scoring rate of a single Poisson scoring process.

use crate::error::{ModelError, Result, check_duration};
use crate::pmf::{Mixture, Pmf, Rate};
use crate::poisson::{DEFAULT_MAX_COUNT, MIN_RETAINED_MASS, truncated_poisson};
use tracing::{debug, warn};

/// Evenly spaced rate hypotheses over `[min, max]` (inclusive), like `linspace`.
pub fn rate_grid(min: f64, max: f64, points: usize) -> Result<Vec<Rate>> {
    if points == 0 {
        return Err(ModelError::EmptyHypotheses);
    }
    if !(min.is_finite() && max.is_finite()) || min > max {
        return Err(ModelError::InvalidGrid(format!(
            "bounds [{min}, {max}] must be finite and ordered"
        )));
    }
    if points == 1 {
        return Ok(vec![Rate::new(min)?]);
    }
    let step = (max - min) / (points - 1) as f64;
    (0..points)
        .map(|i| {
            let value = if i == points - 1 {
                max
            } else {
                min + step * i as f64
            };
            Rate::new(value)
        })
        .collect()
}

/// Exponential inter-arrival density for a process scoring `rate` times per game.
pub fn interarrival_likelihood(rate: Rate, gap_minutes: f64) -> f64 {
    let lambda = rate.per_minute();
    lambda * (-lambda * gap_minutes).exp()
}

/// Hypotheses about how often one kind of score happens, in events per game.
///
/// The distribution is normalized at construction and after every successful update.
#[derive(Debug, Clone)]
pub struct ScoreRateSuite {
    pmf: Pmf<Rate>,
    max_count: u32,
    strict_truncation: bool,
}

impl ScoreRateSuite {
    /// Uniform prior over the given hypotheses.
    pub fn uniform(hypotheses: impl IntoIterator<Item = Rate>) -> Result<Self> {
        Self::from_prior(Pmf::uniform(hypotheses)?)
    }

    /// Uniform prior over `rate_grid(min, max, points)`.
    pub fn with_grid(min: f64, max: f64, points: usize) -> Result<Self> {
        Self::uniform(rate_grid(min, max, points)?)
    }

    pub fn from_prior(mut prior: Pmf<Rate>) -> Result<Self> {
        if prior.is_empty() {
            return Err(ModelError::EmptyHypotheses);
        }
        prior.normalize()?;
        Ok(Self {
            pmf: prior,
            max_count: DEFAULT_MAX_COUNT,
            strict_truncation: false,
        })
    }

    /// Largest event count modeled per prediction window.
    pub fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = max_count;
        self
    }

    /// Fail predictions with [`ModelError::TruncationRisk`] instead of logging a warning.
    pub fn with_strict_truncation(mut self, strict: bool) -> Self {
        self.strict_truncation = strict;
        self
    }

    pub fn pmf(&self) -> &Pmf<Rate> {
        &self.pmf
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    pub fn mean_rate(&self) -> f64 {
        self.pmf.mean()
    }

    pub fn max_likelihood(&self) -> Option<Rate> {
        self.pmf.max_likelihood()
    }

    pub fn credible_interval(&self, percent: f64) -> Result<(Rate, Rate)> {
        self.pmf.credible_interval(percent)
    }

    /// Conditions the suite on one observed gap between consecutive scores.
    ///
    /// The suite is left untouched when the update fails.
    pub fn update(&mut self, gap_minutes: f64) -> Result<()> {
        let gap = check_duration(gap_minutes)?;
        let mut posterior = Pmf::new();
        for (rate, prior) in self.pmf.items() {
            posterior.set(rate, prior * interarrival_likelihood(rate, gap));
        }
        posterior.normalize()?;
        self.pmf = posterior;
        debug!(
            gap_minutes = gap,
            mean_rate = self.pmf.mean(),
            "rate suite updated"
        );
        Ok(())
    }

    /// Conditions on several gaps at once through their joint likelihood.
    ///
    /// Equivalent to calling [`update`](Self::update) for each gap, but accumulated in log
    /// space and normalized once.
    pub fn update_all(&mut self, gaps: &[f64]) -> Result<()> {
        if gaps.is_empty() {
            return Ok(());
        }
        let gaps = gaps
            .iter()
            .map(|gap| check_duration(*gap))
            .collect::<Result<Vec<_>>>()?;

        let log_posterior: Vec<(Rate, f64)> = self
            .pmf
            .items()
            .map(|(rate, prior)| {
                let log_like: f64 = gaps
                    .iter()
                    .map(|gap| interarrival_likelihood(rate, *gap).ln())
                    .sum();
                (rate, prior.ln() + log_like)
            })
            .collect();

        let peak = log_posterior
            .iter()
            .map(|(_, log_mass)| *log_mass)
            .fold(f64::NEG_INFINITY, f64::max);
        if !peak.is_finite() {
            return Err(ModelError::DegenerateDistribution);
        }

        let mut posterior = Pmf::new();
        for (rate, log_mass) in log_posterior {
            posterior.set(rate, (log_mass - peak).exp());
        }
        posterior.normalize()?;
        self.pmf = posterior;
        debug!(
            observations = gaps.len(),
            mean_rate = self.pmf.mean(),
            "rate suite batch-updated"
        );
        Ok(())
    }

    /// Predictive distribution of the final count given `remaining_minutes` of play and
    /// `already_scored` events so far.
    ///
    /// Each hypothesis contributes a Poisson count distribution weighted by its posterior
    /// probability, so the result carries both sampling noise and rate uncertainty.
    pub fn predict_remaining(
        &self,
        remaining_minutes: f64,
        already_scored: i64,
    ) -> Result<Pmf<i64>> {
        let remaining = check_duration(remaining_minutes)?;

        let mut mixture = Mixture::with_capacity(self.pmf.len());
        let mut retained = 0.0;
        let mut worst_expected = 0.0_f64;
        for (rate, weight) in self.pmf.items() {
            let expected = rate.per_minute() * remaining;
            let truncated = truncated_poisson(expected, self.max_count)?;
            retained += weight * truncated.retained;
            if !truncated.is_adequate() {
                worst_expected = worst_expected.max(expected);
            }
            mixture.push(truncated.pmf, weight)?;
        }

        if retained < MIN_RETAINED_MASS {
            if self.strict_truncation {
                return Err(ModelError::TruncationRisk {
                    expected: worst_expected,
                    max_count: self.max_count,
                    retained,
                });
            }
            warn!(
                max_count = self.max_count,
                retained,
                worst_expected,
                "posterior-weighted poisson truncation drops a significant share of the mass"
            );
        }

        Ok(mixture.flatten().shift(already_scored))
    }
}
