//! Discrete probability distributions over ordered outcomes.
//!
//! [`Pmf`] maps outcomes to probability mass and backs both the rate-hypothesis posteriors
//! (keyed by [`Rate`]) and the predictive count/score distributions (keyed by `i64`).
//! [`Cdf`] is the derived cumulative view used for percentile and credible-interval queries,
//! and [`Mixture`] marginalizes a weighted set of component distributions.

use crate::error::{ModelError, Result, check_mass, check_rate};
use rand::Rng;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Outcomes a [`Pmf`] can be keyed by.
pub trait Outcome: Copy + Ord + fmt::Debug {
    fn as_f64(self) -> f64;
}

impl Outcome for i64 {
    fn as_f64(self) -> f64 {
        self as f64
    }
}

/// Scoring-rate hypothesis in events per 60-minute game.
///
/// Ordering and equality follow `f64::total_cmp`, which is total for the finite,
/// non-negative values [`Rate::new`] admits.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rate(f64);

impl Rate {
    pub fn new(per_game: f64) -> Result<Self> {
        check_rate(per_game).map(Self)
    }

    pub const fn per_game(self) -> f64 {
        self.0
    }

    pub fn per_minute(self) -> f64 {
        self.0 / crate::GAME_MINUTES
    }
}

impl TryFrom<f64> for Rate {
    type Error = ModelError;

    fn try_from(per_game: f64) -> Result<Self> {
        Self::new(per_game)
    }
}

impl From<Rate> for f64 {
    fn from(rate: Rate) -> f64 {
        rate.0
    }
}

impl PartialEq for Rate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Rate {}

impl PartialOrd for Rate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Outcome for Rate {
    fn as_f64(self) -> f64 {
        self.0
    }
}

/// Probability mass function over outcomes of type `K`.
///
/// Iteration order is ascending by key, so every pass over the same distribution visits the
/// same sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Pmf<K: Ord> {
    masses: BTreeMap<K, f64>,
}

impl<K: Ord> Default for Pmf<K> {
    fn default() -> Self {
        Self {
            masses: BTreeMap::new(),
        }
    }
}

impl<K: Outcome> Pmf<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equal mass on every distinct key.
    pub fn uniform(keys: impl IntoIterator<Item = K>) -> Result<Self> {
        let mut pmf = Self::new();
        for key in keys {
            pmf.set(key, 1.0);
        }
        if pmf.is_empty() {
            return Err(ModelError::EmptyHypotheses);
        }
        pmf.normalize()?;
        Ok(pmf)
    }

    /// Builds an unnormalized distribution; repeated keys accumulate.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (K, f64)>) -> Self {
        let mut pmf = Self::new();
        for (key, mass) in pairs {
            pmf.increment(key, mass);
        }
        pmf
    }

    /// Stores `mass` as is; invalid masses surface at [`normalize`](Self::normalize).
    pub fn set(&mut self, key: K, mass: f64) {
        self.masses.insert(key, mass);
    }

    pub fn increment(&mut self, key: K, delta: f64) {
        *self.masses.entry(key).or_insert(0.0) += delta;
    }

    /// Mass for `key`, zero when absent.
    pub fn mass(&self, key: K) -> f64 {
        self.masses.get(&key).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.masses.values().sum()
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = (K, f64)> + '_ {
        self.masses.iter().map(|(key, mass)| (*key, *mass))
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.masses.keys().copied()
    }

    /// Rescales masses to sum to one and returns the total before rescaling.
    ///
    /// Fails with [`ModelError::InvalidMass`] if any mass is negative or non-finite.
    pub fn normalize(&mut self) -> Result<f64> {
        self.check_masses()?;
        let total = self.total();
        if !(total.is_finite() && total > 0.0) {
            return Err(ModelError::DegenerateDistribution);
        }
        for mass in self.masses.values_mut() {
            *mass /= total;
        }
        Ok(total)
    }

    fn check_masses(&self) -> Result<()> {
        self.masses
            .values()
            .try_for_each(|mass| check_mass(*mass).map(|_| ()))
    }

    pub fn mean(&self) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        self.items()
            .map(|(key, mass)| key.as_f64() * mass)
            .sum::<f64>()
            / total
    }

    /// Key with the largest mass; ties resolve to the smallest key.
    pub fn max_likelihood(&self) -> Option<K> {
        self.items()
            .fold(None, |best: Option<(K, f64)>, (key, mass)| match best {
                Some((_, best_mass)) if best_mass >= mass => best,
                _ => Some((key, mass)),
            })
            .map(|(key, _)| key)
    }

    pub fn to_cdf(&self) -> Result<Cdf<K>> {
        Cdf::from_pmf(self)
    }

    pub fn credible_interval(&self, percent: f64) -> Result<(K, K)> {
        self.to_cdf()?.credible_interval(percent)
    }
}

impl Pmf<i64> {
    /// Relabels every outcome `k` as `k + amount`.
    pub fn shift(&self, amount: i64) -> Self {
        Self {
            masses: self.items().map(|(k, mass)| (k + amount, mass)).collect(),
        }
    }

    /// Relabels every outcome `k` as `k * factor`, merging keys that collide.
    pub fn scale(&self, factor: i64) -> Self {
        Self::from_pairs(self.items().map(|(k, mass)| (k * factor, mass)))
    }

    /// Distribution of the sum of two independent variables.
    pub fn convolve(&self, other: &Self) -> Self {
        let mut sum = Self::new();
        for (a, p) in self.items() {
            for (b, q) in other.items() {
                sum.increment(a + b, p * q);
            }
        }
        sum
    }

    /// `P(X > Y)` for independent `X ~ self`, `Y ~ other`.
    pub fn prob_greater(&self, other: &Self) -> f64 {
        self.joint_where(other, |a, b| a > b)
    }

    /// `P(X < Y)` for independent `X ~ self`, `Y ~ other`.
    pub fn prob_less(&self, other: &Self) -> f64 {
        self.joint_where(other, |a, b| a < b)
    }

    pub fn prob_equal(&self, other: &Self) -> f64 {
        self.joint_where(other, |a, b| a == b)
    }

    fn joint_where(&self, other: &Self, predicate: impl Fn(i64, i64) -> bool) -> f64 {
        let predicate = &predicate;
        self.items()
            .flat_map(|(a, p)| {
                other
                    .items()
                    .filter(move |(b, _)| predicate(a, *b))
                    .map(move |(_, q)| p * q)
            })
            .sum()
    }
}

impl<K: Outcome + Serialize> Serialize for Pmf<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for pair in self.items() {
            seq.serialize_element(&pair)?;
        }
        seq.end()
    }
}

/// Weighted components awaiting marginalization.
///
/// Components are kept as an ordered list of `(distribution, weight)` pairs instead of being
/// keyed by the distributions themselves.
#[derive(Debug, Clone)]
pub struct Mixture<K: Ord> {
    components: Vec<(Pmf<K>, f64)>,
}

impl<K: Ord> Default for Mixture<K> {
    fn default() -> Self {
        Self {
            components: Vec::new(),
        }
    }
}

impl<K: Outcome> Mixture<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            components: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, component: Pmf<K>, weight: f64) -> Result<()> {
        check_mass(weight)?;
        self.components.push((component, weight));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.components.iter().map(|(_, weight)| weight).sum()
    }

    /// Accumulates `weight * mass` for every outcome of every component.
    ///
    /// The result sums to one when the weights and each component are normalized.
    pub fn flatten(&self) -> Pmf<K> {
        let mut mix = Pmf::new();
        for (component, weight) in &self.components {
            for (key, mass) in component.items() {
                mix.increment(key, weight * mass);
            }
        }
        mix
    }
}

/// Cumulative distribution derived from a [`Pmf`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cdf<K> {
    xs: Vec<K>,
    ps: Vec<f64>,
}

impl<K: Outcome> Cdf<K> {
    pub fn from_pmf(pmf: &Pmf<K>) -> Result<Self> {
        pmf.check_masses()?;
        let total = pmf.total();
        if !(total.is_finite() && total > 0.0) {
            return Err(ModelError::DegenerateDistribution);
        }
        let mut running = 0.0;
        let (xs, ps) = pmf
            .items()
            .map(|(key, mass)| {
                running += mass;
                (key, running / total)
            })
            .unzip();
        Ok(Self { xs, ps })
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = (K, f64)> + '_ {
        self.xs.iter().copied().zip(self.ps.iter().copied())
    }

    /// `P(X < x)`.
    pub fn prob_less_than(&self, x: K) -> f64 {
        let index = self.xs.partition_point(|key| *key < x);
        self.cumulative_before(index)
    }

    /// `P(X <= x)`.
    pub fn prob_less_or_equal(&self, x: K) -> f64 {
        let index = self.xs.partition_point(|key| *key <= x);
        self.cumulative_before(index)
    }

    /// Smallest outcome whose cumulative probability reaches `p`.
    pub fn value(&self, p: f64) -> Result<K> {
        if !(0.0..=1.0).contains(&p) {
            return Err(ModelError::InvalidPercentile(p * 100.0));
        }
        Ok(self.value_at(p))
    }

    pub fn percentile(&self, percent: f64) -> Result<K> {
        self.value(percent / 100.0)
    }

    /// Interval between the `(50 - percent/2)` and `(50 + percent/2)` percentiles.
    pub fn credible_interval(&self, percent: f64) -> Result<(K, K)> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(ModelError::InvalidPercentile(percent));
        }
        let tail = (1.0 - percent / 100.0) / 2.0;
        Ok((self.value_at(tail), self.value_at(1.0 - tail)))
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> K {
        self.value_at(rng.r#gen::<f64>())
    }

    fn value_at(&self, p: f64) -> K {
        let index = self.ps.partition_point(|cumulative| *cumulative < p);
        self.xs[index.min(self.xs.len() - 1)]
    }

    fn cumulative_before(&self, index: usize) -> f64 {
        if index == 0 { 0.0 } else { self.ps[index - 1] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    const TOLERANCE: f64 = 1e-9;

    fn digits() -> Pmf<i64> {
        Pmf::uniform(0..10).expect("non-empty")
    }

    #[test]
    fn normalize_sums_to_one_and_reports_total() {
        let mut pmf = Pmf::from_pairs([(1, 2.0), (2, 3.0), (5, 5.0)]);
        let total = pmf.normalize().expect("positive mass");
        assert!((total - 10.0).abs() < TOLERANCE);
        assert!((pmf.total() - 1.0).abs() < TOLERANCE);
        assert!((pmf.mass(5) - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn normalize_rejects_zero_mass() {
        let mut pmf = Pmf::from_pairs([(1, 0.0), (2, 0.0)]);
        assert!(matches!(
            pmf.normalize(),
            Err(ModelError::DegenerateDistribution)
        ));
        let mut empty: Pmf<i64> = Pmf::new();
        assert!(empty.normalize().is_err());
    }

    #[test]
    fn normalize_rejects_negative_and_non_finite_mass() {
        let mut pmf = Pmf::from_pairs([(0, -0.5), (1, 1.5)]);
        assert!(matches!(
            pmf.normalize(),
            Err(ModelError::InvalidMass { mass }) if mass == -0.5
        ));
        assert!((pmf.mass(1) - 1.5).abs() < TOLERANCE);

        let mut pmf = Pmf::from_pairs([(0, f64::NAN), (1, 1.0)]);
        assert!(matches!(
            pmf.normalize(),
            Err(ModelError::InvalidMass { .. })
        ));

        let mut pmf = Pmf::new();
        pmf.set(2, 1.0);
        pmf.increment(2, -3.0);
        assert!(pmf.normalize().is_err());
    }

    #[test]
    fn uniform_rejects_empty_keys() {
        let err = Pmf::<i64>::uniform(std::iter::empty()).expect_err("empty");
        assert!(matches!(err, ModelError::EmptyHypotheses));
    }

    #[test]
    fn set_overwrites_and_increment_accumulates() {
        let mut pmf = Pmf::new();
        pmf.increment(3, 0.25);
        pmf.increment(3, 0.25);
        assert!((pmf.mass(3) - 0.5).abs() < TOLERANCE);
        pmf.set(3, 0.1);
        assert!((pmf.mass(3) - 0.1).abs() < TOLERANCE);
        assert_eq!(pmf.mass(4), 0.0);
    }

    #[test]
    fn shift_round_trips_exactly() {
        let pmf = Pmf::from_pairs([(0, 0.2), (3, 0.3), (7, 0.5)]);
        assert_eq!(pmf.shift(17).shift(-17), pmf);
        assert!((pmf.shift(17).mass(24) - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn scale_relabels_by_point_value() {
        let pmf = Pmf::from_pairs([(0, 0.5), (1, 0.3), (2, 0.2)]);
        let scaled = pmf.scale(7);
        assert_eq!(scaled.keys().collect::<Vec<_>>(), vec![0, 7, 14]);
        assert!((scaled.mass(14) - 0.2).abs() < TOLERANCE);
    }

    #[test]
    fn convolve_matches_two_dice() {
        let die = Pmf::uniform(1..=6).expect("die");
        let sum = die.convolve(&die);
        assert_eq!(sum.len(), 11);
        assert!((sum.mass(7) - 6.0 / 36.0).abs() < TOLERANCE);
        assert!((sum.mass(2) - 1.0 / 36.0).abs() < TOLERANCE);
        assert!((sum.total() - 1.0).abs() < TOLERANCE);
        assert!((sum.mean() - 7.0).abs() < TOLERANCE);
    }

    #[test]
    fn comparisons_partition_probability() {
        let a = Pmf::from_pairs([(10, 0.5), (20, 0.5)]);
        let b = Pmf::from_pairs([(10, 0.25), (15, 0.75)]);
        let greater = a.prob_greater(&b);
        let less = a.prob_less(&b);
        let equal = a.prob_equal(&b);
        assert!((greater - 0.5).abs() < TOLERANCE);
        assert!((less - 0.375).abs() < TOLERANCE);
        assert!((equal - 0.125).abs() < TOLERANCE);
        assert!((greater + less + equal - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn mixture_preserves_total_probability() {
        let mut mixture = Mixture::new();
        mixture
            .push(Pmf::uniform(0..4).expect("first"), 0.3)
            .expect("weight");
        mixture
            .push(Pmf::uniform(2..8).expect("second"), 0.7)
            .expect("weight");
        assert_eq!(mixture.len(), 2);
        assert!((mixture.total_weight() - 1.0).abs() < TOLERANCE);

        let flat = mixture.flatten();
        assert!((flat.total() - 1.0).abs() < TOLERANCE);
        assert!((flat.mass(0) - 0.3 / 4.0).abs() < TOLERANCE);
        assert!((flat.mass(3) - (0.3 / 4.0 + 0.7 / 6.0)).abs() < TOLERANCE);
    }

    #[test]
    fn mixture_rejects_invalid_weights() {
        let mut mixture = Mixture::new();
        let component = Pmf::uniform(0..4).expect("component");
        assert!(matches!(
            mixture.push(component.clone(), -0.2),
            Err(ModelError::InvalidMass { .. })
        ));
        assert!(mixture.push(component, f64::NAN).is_err());
        assert!(mixture.is_empty());
    }

    #[test]
    fn max_likelihood_prefers_smallest_key_on_ties() {
        let pmf = Pmf::from_pairs([(4, 0.4), (2, 0.4), (9, 0.2)]);
        assert_eq!(pmf.max_likelihood(), Some(2));
        assert_eq!(Pmf::<i64>::new().max_likelihood(), None);
    }

    #[test]
    fn cdf_probabilities_on_uniform_digits() {
        let cdf = digits().to_cdf().expect("cdf");
        assert_eq!(cdf.len(), 10);
        assert_eq!(cdf.prob_less_than(0), 0.0);
        assert!((cdf.prob_less_than(5) - 0.5).abs() < TOLERANCE);
        assert!((cdf.prob_less_or_equal(5) - 0.6).abs() < TOLERANCE);
        assert!((cdf.prob_less_or_equal(42) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn credible_interval_on_uniform_digits() {
        let cdf = digits().to_cdf().expect("cdf");
        assert_eq!(cdf.credible_interval(90.0).expect("interval"), (0, 9));
        assert_eq!(cdf.credible_interval(50.0).expect("interval"), (2, 7));
        assert_eq!(cdf.percentile(45.0).expect("percentile"), 4);
        assert!(cdf.credible_interval(120.0).is_err());
    }

    #[test]
    fn cdf_of_empty_distribution_is_degenerate() {
        assert!(matches!(
            Pmf::<i64>::new().to_cdf(),
            Err(ModelError::DegenerateDistribution)
        ));
    }

    #[test]
    fn cdf_rejects_negative_mass() {
        let pmf = Pmf::from_pairs([(0, -0.5), (1, 1.5)]);
        assert!(matches!(
            pmf.to_cdf(),
            Err(ModelError::InvalidMass { .. })
        ));
    }

    #[test]
    fn samples_stay_within_support() {
        let pmf = Pmf::from_pairs([(3, 0.5), (11, 0.5)]);
        let cdf = pmf.to_cdf().expect("cdf");
        let mut rng = SmallRng::seed_from_u64(7);
        let draws: Vec<i64> = (0..200).map(|_| cdf.sample(&mut rng)).collect();
        assert!(draws.iter().all(|k| *k == 3 || *k == 11));
        assert!(draws.contains(&3) && draws.contains(&11));
    }

    #[test]
    fn rate_rejects_negative_and_non_finite() {
        assert!(Rate::new(-0.5).is_err());
        assert!(Rate::new(f64::NAN).is_err());
        assert!(Rate::new(f64::INFINITY).is_err());
        let rate = Rate::new(6.0).expect("valid");
        assert!((rate.per_minute() - 0.1).abs() < TOLERANCE);
    }

    #[test]
    fn rate_deserialization_validates() {
        let rate: Rate = serde_json::from_str("6.0").expect("valid rate");
        assert_eq!(rate.per_game(), 6.0);
        assert_eq!(serde_json::to_string(&rate).expect("serialize"), "6.0");
        assert!(serde_json::from_str::<Rate>("-6.0").is_err());
    }

    #[test]
    fn serializes_as_ordered_pairs() {
        let pmf = Pmf::from_pairs([(7, 0.25), (0, 0.75)]);
        let json = serde_json::to_string(&pmf).expect("serialize");
        assert_eq!(json, "[[0,0.75],[7,0.25]]");
    }
}
