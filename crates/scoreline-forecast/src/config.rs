use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

use scoreline_core::GAME_MINUTES;
use scoreline_core::poisson::DEFAULT_MAX_COUNT;

const DEFAULT_CREDIBLE_PERCENT: f64 = 90.0;
const DEFAULT_GRID_MAX: f64 = 20.0;
const DEFAULT_GRID_POINTS: usize = 201;
const MAX_GRID_POINTS: usize = 10_001;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root forecast configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ForecastConfig {
    pub run_id: String,
    #[serde(default)]
    pub scenario: ScenarioConfig,
    pub teams: Vec<TeamConfig>,
    #[serde(default)]
    pub prior: PriorConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Directory relative event-log locators resolve against; set by [`Self::from_path`].
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl ForecastConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: ForecastConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.scenario.validate()?;
        validate_teams(&self.teams)?;
        self.prior.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            json: resolve_template(&self.run_id, &self.outputs.json),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
            plots_dir: resolve_template(&self.run_id, &self.outputs.plots_dir),
        }
    }
}

/// The game situation being forecast.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScenarioConfig {
    #[serde(default = "default_remaining_minutes")]
    pub remaining_minutes: f64,
    #[serde(default = "default_credible_percent")]
    pub credible_percent: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            remaining_minutes: default_remaining_minutes(),
            credible_percent: default_credible_percent(),
        }
    }
}

impl ScenarioConfig {
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=GAME_MINUTES).contains(&self.remaining_minutes) {
            return Err(ValidationError::InvalidField {
                field: "scenario.remaining_minutes".to_string(),
                message: format!("must be within [0, {GAME_MINUTES}]"),
            });
        }

        if !(self.credible_percent > 0.0 && self.credible_percent < 100.0) {
            return Err(ValidationError::InvalidField {
                field: "scenario.credible_percent".to_string(),
                message: "must be strictly between 0 and 100".to_string(),
            });
        }

        Ok(())
    }
}

fn default_remaining_minutes() -> f64 {
    GAME_MINUTES
}

fn default_credible_percent() -> f64 {
    DEFAULT_CREDIBLE_PERCENT
}

/// One side of the matchup.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TeamConfig {
    /// Team label as it appears in the event log.
    pub name: String,
    /// Event-log locator handed to the event source.
    pub events: String,
    #[serde(default)]
    pub points_scored: i64,
}

/// Rate-hypothesis grids and prediction bounds.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PriorConfig {
    #[serde(default)]
    pub touchdowns: GridConfig,
    #[serde(default)]
    pub field_goals: GridConfig,
    #[serde(default = "default_max_count")]
    pub max_count: u32,
    #[serde(default)]
    pub strict_truncation: bool,
}

impl Default for PriorConfig {
    fn default() -> Self {
        Self {
            touchdowns: GridConfig::default(),
            field_goals: GridConfig::default(),
            max_count: default_max_count(),
            strict_truncation: false,
        }
    }
}

impl PriorConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        self.touchdowns.validate("prior.touchdowns")?;
        self.field_goals.validate("prior.field_goals")?;
        if self.max_count == 0 {
            return Err(ValidationError::InvalidField {
                field: "prior.max_count".to_string(),
                message: "max_count must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn default_max_count() -> u32 {
    DEFAULT_MAX_COUNT
}

/// Uniform prior over evenly spaced rates, in scores per game.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct GridConfig {
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_grid_max")]
    pub max: f64,
    #[serde(default = "default_grid_points")]
    pub points: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: default_grid_max(),
            points: default_grid_points(),
        }
    }
}

impl GridConfig {
    fn validate(&self, label: &str) -> Result<(), ValidationError> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min < 0.0 || self.min > self.max
        {
            return Err(ValidationError::InvalidField {
                field: label.to_string(),
                message: "grid bounds must be finite with 0 <= min <= max".to_string(),
            });
        }

        if self.points == 0 || self.points > MAX_GRID_POINTS {
            return Err(ValidationError::InvalidField {
                field: format!("{label}.points"),
                message: format!("points must be within [1, {MAX_GRID_POINTS}]"),
            });
        }

        Ok(())
    }
}

fn default_grid_max() -> f64 {
    DEFAULT_GRID_MAX
}

fn default_grid_points() -> usize {
    DEFAULT_GRID_POINTS
}

/// Optional Monte-Carlo cross-check of the exact matchup probabilities.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SimulationConfig {
    #[serde(default)]
    pub trials: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub fn enabled(&self) -> bool {
        self.trials > 0
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub json: String,
    pub summary_md: String,
    pub plots_dir: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.json", &self.json),
            ("outputs.summary_md", &self.summary_md),
            ("outputs.plots_dir", &self.plots_dir),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to console output at `info`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn validate_teams(teams: &[TeamConfig]) -> Result<(), ValidationError> {
    if teams.len() != 2 {
        return Err(ValidationError::InvalidField {
            field: "teams".to_string(),
            message: format!("exactly two teams are required, found {}", teams.len()),
        });
    }

    let mut seen = HashSet::new();
    for (index, team) in teams.iter().enumerate() {
        if team.name.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: format!("teams[{index}].name"),
                message: "team name must not be empty".to_string(),
            });
        }

        if team.events.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: format!("teams[{index}].events"),
                message: "event log locator must not be empty".to_string(),
            });
        }

        if team.points_scored < 0 {
            return Err(ValidationError::InvalidField {
                field: format!("teams[{index}].points_scored"),
                message: "points already scored cannot be negative".to_string(),
            });
        }

        if !seen.insert(team.name.clone()) {
            return Err(ValidationError::InvalidField {
                field: "teams".to_string(),
                message: format!("team '{}' defined more than once", team.name),
            });
        }
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub json: PathBuf,
    pub summary_md: PathBuf,
    pub plots_dir: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
