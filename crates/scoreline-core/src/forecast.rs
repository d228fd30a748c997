//! Head-to-head summaries of two predictive final-score distributions.

use crate::error::Result;
use crate::pmf::Pmf;
use rand::Rng;
use serde::Serialize;

/// Summary statistics for one side of a matchup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamOutlook {
    pub name: String,
    pub mean: f64,
    pub most_likely: Option<i64>,
    pub credible_percent: f64,
    pub credible_interval: (i64, i64),
    pub win_probability: f64,
}

/// Win, loss and tie probabilities for two independent final-score distributions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupForecast {
    pub first: TeamOutlook,
    pub second: TeamOutlook,
    pub tie_probability: f64,
}

impl MatchupForecast {
    /// "First wins" means `P(first total > second total)`; ties are reported separately.
    pub fn from_predictions(
        (first_name, first): (&str, &Pmf<i64>),
        (second_name, second): (&str, &Pmf<i64>),
        credible_percent: f64,
    ) -> Result<Self> {
        let first_wins = first.prob_greater(second);
        let second_wins = first.prob_less(second);
        let tie_probability = first.prob_equal(second);

        Ok(Self {
            first: outlook(first_name, first, credible_percent, first_wins)?,
            second: outlook(second_name, second, credible_percent, second_wins)?,
            tie_probability,
        })
    }
}

fn outlook(
    name: &str,
    pmf: &Pmf<i64>,
    credible_percent: f64,
    win_probability: f64,
) -> Result<TeamOutlook> {
    Ok(TeamOutlook {
        name: name.to_string(),
        mean: pmf.mean(),
        most_likely: pmf.max_likelihood(),
        credible_percent,
        credible_interval: pmf.credible_interval(credible_percent)?,
        win_probability,
    })
}

/// Win and tie frequencies from repeated independent draws of both distributions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulatedMatchup {
    pub trials: usize,
    pub first_win_rate: f64,
    pub second_win_rate: f64,
    pub tie_rate: f64,
}

/// Monte-Carlo estimate of the head-to-head probabilities.
pub fn simulate_matchup<R: Rng + ?Sized>(
    first: &Pmf<i64>,
    second: &Pmf<i64>,
    trials: usize,
    rng: &mut R,
) -> Result<SimulatedMatchup> {
    let first_cdf = first.to_cdf()?;
    let second_cdf = second.to_cdf()?;

    let (mut first_wins, mut second_wins, mut ties) = (0usize, 0usize, 0usize);
    for _ in 0..trials {
        let a = first_cdf.sample(rng);
        let b = second_cdf.sample(rng);
        match a.cmp(&b) {
            std::cmp::Ordering::Greater => first_wins += 1,
            std::cmp::Ordering::Less => second_wins += 1,
            std::cmp::Ordering::Equal => ties += 1,
        }
    }

    let rate = |count: usize| {
        if trials == 0 {
            0.0
        } else {
            count as f64 / trials as f64
        }
    };
    Ok(SimulatedMatchup {
        trials,
        first_win_rate: rate(first_wins),
        second_win_rate: rate(second_wins),
        tie_rate: rate(ties),
    })
}
