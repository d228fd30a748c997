#![deny(warnings)]
//! Bayesian touchdown and field-goal rate estimation with predictive final scores.

pub mod error;
pub mod events;
pub mod forecast;
pub mod pmf;
pub mod poisson;
pub mod suite;
pub mod team;

pub use error::{ModelError, Result};
pub use events::{EventLog, EventLogSource, GameLog, ScoringEvent, TrainingSummary, train_team};
pub use forecast::{MatchupForecast, SimulatedMatchup, TeamOutlook, simulate_matchup};
pub use pmf::{Cdf, Mixture, Pmf, Rate};
pub use poisson::{poisson_pmf, suggested_max_count, truncated_poisson};
pub use suite::{ScoreRateSuite, rate_grid};
pub use team::{ScoreKind, TeamModel};

/// Length of a regulation game on the clock.
pub const GAME_MINUTES: f64 = 60.0;
