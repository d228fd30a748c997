use std::fs;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use scoreline_core::{
    EventLogSource, MatchupForecast, ModelError, ScoreRateSuite, TeamModel, simulate_matchup,
    train_team,
};
use thiserror::Error;
use tracing::{Level, event, warn};

use crate::config::{ForecastConfig, GridConfig, ResolvedOutputs, TeamConfig};
use crate::report::{ForecastReport, RateSummary, ReportError, TeamReport};
use crate::source::{JsonFileSource, SourceError};

/// Orchestrates prior construction, prediction and reporting for one matchup.
pub struct ForecastRunner<S = JsonFileSource> {
    config: ForecastConfig,
    outputs: ResolvedOutputs,
    source: S,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub report: ForecastReport,
    pub json_path: PathBuf,
    pub summary_path: PathBuf,
    pub plot_path: Option<PathBuf>,
}

impl ForecastRunner<JsonFileSource> {
    /// Build a runner reading event logs from files next to the configuration.
    pub fn new(config: ForecastConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let source = JsonFileSource::new(config.base_dir.clone());
        Self::with_source(config, outputs, source)
    }
}

impl<S> ForecastRunner<S>
where
    S: EventLogSource,
    RunnerError: From<S::Error>,
{
    pub fn with_source(
        mut config: ForecastConfig,
        outputs: ResolvedOutputs,
        source: S,
    ) -> Result<Self, RunnerError> {
        config.validate()?;
        Ok(Self {
            config,
            outputs,
            source,
        })
    }

    /// Execute the forecast and write every configured artifact.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        let report = self.forecast()?;

        ensure_parent(self.outputs.json.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        report.write_json(&self.outputs.json)?;
        report.write_markdown(&self.outputs.summary_md)?;
        let plot_path = match report.render_plot(&self.outputs.plots_dir) {
            Ok(path) => Some(path),
            Err(err) => {
                warn!(error = %err, "skipping final score plot");
                None
            }
        };

        Ok(RunSummary {
            report,
            json_path: self.outputs.json.clone(),
            summary_path: self.outputs.summary_md.clone(),
            plot_path,
        })
    }

    /// Train both teams and compute the matchup without touching the filesystem outputs.
    pub fn forecast(&self) -> Result<ForecastReport, RunnerError> {
        let scenario = &self.config.scenario;
        let mut teams = Vec::with_capacity(self.config.teams.len());
        for team in &self.config.teams {
            teams.push(self.forecast_team(team)?);
        }

        let (first, second) = match teams.as_slice() {
            [first, second] => (first, second),
            _ => {
                return Err(RunnerError::TeamCount {
                    found: teams.len(),
                });
            }
        };

        let matchup = MatchupForecast::from_predictions(
            (first.name.as_str(), &first.final_score),
            (second.name.as_str(), &second.final_score),
            scenario.credible_percent,
        )?;

        let simulation = if self.config.simulation.enabled() {
            let mut rng = StdRng::seed_from_u64(self.config.simulation.seed.unwrap_or(0));
            Some(simulate_matchup(
                &first.final_score,
                &second.final_score,
                self.config.simulation.trials,
                &mut rng,
            )?)
        } else {
            None
        };

        event!(
            Level::INFO,
            run_id = %self.config.run_id,
            first = %matchup.first.name,
            first_win = matchup.first.win_probability,
            second = %matchup.second.name,
            second_win = matchup.second.win_probability,
            tie = matchup.tie_probability,
            "matchup forecast complete"
        );

        Ok(ForecastReport {
            run_id: self.config.run_id.clone(),
            remaining_minutes: scenario.remaining_minutes,
            credible_percent: scenario.credible_percent,
            teams,
            matchup,
            simulation,
        })
    }

    fn forecast_team(&self, team: &TeamConfig) -> Result<TeamReport, RunnerError> {
        let prior = &self.config.prior;
        let scenario = &self.config.scenario;

        let log = self.source.fetch(&team.events)?;
        let mut model = TeamModel::new(
            build_suite(&prior.touchdowns, prior.max_count, prior.strict_truncation)?,
            build_suite(&prior.field_goals, prior.max_count, prior.strict_truncation)?,
        );
        let training =
            train_team(&mut model, &team.name, &log).map_err(|source| RunnerError::Training {
                team: team.name.clone(),
                source,
            })?;
        if training.touchdowns + training.field_goals == 0 {
            warn!(team = %team.name, "event log holds no scores for this team; prior is unchanged");
        }

        let final_score = model.predict_remaining(scenario.remaining_minutes, team.points_scored)?;

        Ok(TeamReport {
            name: team.name.clone(),
            events: team.events.clone(),
            points_scored: team.points_scored,
            training,
            touchdown_rate: RateSummary::from_suite(model.touchdowns(), scenario.credible_percent)?,
            field_goal_rate: RateSummary::from_suite(
                model.field_goals(),
                scenario.credible_percent,
            )?,
            final_score,
        })
    }
}

fn build_suite(grid: &GridConfig, max_count: u32, strict: bool) -> Result<ScoreRateSuite, ModelError> {
    Ok(ScoreRateSuite::with_grid(grid.min, grid.max, grid.points)?
        .with_max_count(max_count)
        .with_strict_truncation(strict))
}

fn ensure_parent(parent: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = parent {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("exactly two teams are required, found {found}")]
    TeamCount { found: usize },
    #[error("invalid configuration: {0}")]
    Config(#[from] crate::config::ValidationError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("training {team}: {source}")]
    Training {
        team: String,
        #[source]
        source: ModelError,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoreline_core::{EventLog, GameLog, ScoreKind, ScoringEvent};
    use std::collections::HashMap;
    use std::convert::Infallible;

    impl From<Infallible> for RunnerError {
        fn from(value: Infallible) -> Self {
            match value {}
        }
    }

    /// Serves logs from memory, keyed by locator.
    struct FixtureSource(HashMap<String, EventLog>);

    impl EventLogSource for FixtureSource {
        type Error = Infallible;

        fn fetch(&self, locator: &str) -> Result<EventLog, Infallible> {
            Ok(self.0.get(locator).cloned().unwrap_or_default())
        }
    }

    fn season(team: &str, touchdown_times: &[f64], field_goal_times: &[f64]) -> EventLog {
        let mut events: Vec<ScoringEvent> = touchdown_times
            .iter()
            .map(|t| ScoringEvent::new(*t, ScoreKind::Touchdown, team))
            .chain(
                field_goal_times
                    .iter()
                    .map(|t| ScoringEvent::new(*t, ScoreKind::FieldGoal, team)),
            )
            .collect();
        events.sort_by(|a, b| b.remaining_minutes.total_cmp(&a.remaining_minutes));
        EventLog {
            games: vec![
                GameLog {
                    label: None,
                    events,
                };
                8
            ],
        }
    }

    fn config() -> ForecastConfig {
        let yaml = r#"
run_id: "fixture"
teams:
  - name: "Harbor"
    events: "harbor"
  - name: "Ridge"
    events: "ridge"
    points_scored: 7
scenario:
  remaining_minutes: 30
simulation:
  trials: 2000
  seed: 11
outputs:
  json: "unused/forecast.json"
  summary_md: "unused/summary.md"
  plots_dir: "unused/plots"
"#;
        serde_yaml::from_str(yaml).expect("fixture yaml")
    }

    fn runner() -> ForecastRunner<FixtureSource> {
        let cfg = config();
        let outputs = cfg.resolved_outputs();
        let logs = HashMap::from([
            (
                "harbor".to_string(),
                season("Harbor", &[50.0, 35.0, 20.0, 5.0], &[42.0, 12.0]),
            ),
            ("ridge".to_string(), season("Ridge", &[30.0], &[45.0])),
        ]);
        ForecastRunner::with_source(cfg, outputs, FixtureSource(logs)).expect("runner")
    }

    #[test]
    fn forecast_reports_both_teams() {
        let report = runner().forecast().expect("forecast");
        assert_eq!(report.teams.len(), 2);
        assert_eq!(report.teams[0].training.touchdowns, 32);
        assert_eq!(report.teams[1].training.field_goals, 8);

        let ridge = &report.teams[1].final_score;
        assert_eq!(ridge.keys().next(), Some(7));

        let matchup = &report.matchup;
        let total = matchup.first.win_probability
            + matchup.second.win_probability
            + matchup.tie_probability;
        assert!((total - 1.0).abs() < 1e-9);
        assert!(report.teams[0].touchdown_rate.mean > report.teams[1].touchdown_rate.mean);

        let simulated = report.simulation.expect("simulation enabled");
        assert_eq!(simulated.trials, 2000);
        assert!((simulated.first_win_rate - matchup.first.win_probability).abs() < 0.05);
    }

    #[test]
    fn missing_scores_keep_the_prior() {
        let cfg = config();
        let outputs = cfg.resolved_outputs();
        let runner = ForecastRunner::with_source(cfg, outputs, FixtureSource(HashMap::new()))
            .expect("runner");
        let report = runner.forecast().expect("forecast");
        assert_eq!(report.teams[0].training.touchdowns, 0);
        assert!((report.teams[0].touchdown_rate.mean - 10.0).abs() < 1e-9);
    }
}
