//! Historical scoring logs and the driver that turns them into rate posteriors.

use crate::GAME_MINUTES;
use crate::error::{ModelError, Result};
use crate::team::{ScoreKind, TeamModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A single score, stamped with the game clock remaining when it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringEvent {
    pub remaining_minutes: f64,
    pub kind: ScoreKind,
    pub team: String,
}

impl ScoringEvent {
    pub fn new(remaining_minutes: f64, kind: ScoreKind, team: impl Into<String>) -> Self {
        Self {
            remaining_minutes,
            kind,
            team: team.into(),
        }
    }
}

/// Scores of one game, ordered by decreasing remaining time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameLog {
    #[serde(default)]
    pub label: Option<String>,
    pub events: Vec<ScoringEvent>,
}

/// A season (or any run of games) for one team, in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    pub games: Vec<GameLog>,
}

impl EventLog {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn event_count(&self) -> usize {
        self.games.iter().map(|game| game.events.len()).sum()
    }
}

/// Supplies event logs for a team locator (a path, a URL, a fixture name).
pub trait EventLogSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn fetch(&self, locator: &str) -> std::result::Result<EventLog, Self::Error>;
}

/// Observation counts gathered while training a [`TeamModel`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrainingSummary {
    pub games: usize,
    pub touchdowns: usize,
    pub field_goals: usize,
}

impl TrainingSummary {
    fn record(&mut self, kind: ScoreKind) {
        match kind {
            ScoreKind::Touchdown => self.touchdowns += 1,
            ScoreKind::FieldGoal => self.field_goals += 1,
        }
    }
}

/// Minutes elapsed since the last score of each kind, carried across games.
#[derive(Debug, Clone, Copy, Default)]
struct ScoreClocks {
    touchdown: f64,
    field_goal: f64,
}

impl ScoreClocks {
    fn start_game(&mut self) {
        self.touchdown += GAME_MINUTES;
        self.field_goal += GAME_MINUTES;
    }

    fn slot(&mut self, kind: ScoreKind) -> &mut f64 {
        match kind {
            ScoreKind::Touchdown => &mut self.touchdown,
            ScoreKind::FieldGoal => &mut self.field_goal,
        }
    }

    /// Gap since the previous score of `kind`, resetting that clock to `remaining`.
    fn lap(&mut self, kind: ScoreKind, remaining: f64) -> f64 {
        let slot = self.slot(kind);
        let gap = *slot - remaining;
        *slot = remaining;
        gap
    }
}

/// Feeds every inter-arrival gap of `team`'s scores into `model`.
///
/// Both clocks start at zero and gain a full game at every kickoff, so the first score of a
/// season measures from the opening whistle and droughts carry across games. Scores by other
/// teams are skipped. A gap the model rejects aborts training with
/// [`ModelError::Observation`] naming the offending game and event.
pub fn train_team(model: &mut TeamModel, team: &str, log: &EventLog) -> Result<TrainingSummary> {
    let mut clocks = ScoreClocks::default();
    let mut summary = TrainingSummary::default();

    for (game_index, game) in log.games.iter().enumerate() {
        clocks.start_game();
        summary.games += 1;

        for (event_index, event) in game.events.iter().enumerate() {
            if event.team != team {
                continue;
            }
            let gap = clocks.lap(event.kind, event.remaining_minutes);
            model
                .observe(event.kind, gap)
                .map_err(|source| ModelError::Observation {
                    game: game_index,
                    event: event_index,
                    source: Box::new(source),
                })?;
            summary.record(event.kind);
            debug!(team, game = game_index, kind = %event.kind, gap, "observed scoring gap");
        }
    }

    info!(
        team,
        games = summary.games,
        touchdowns = summary.touchdowns,
        field_goals = summary.field_goals,
        "trained team model"
    );
    Ok(summary)
}
