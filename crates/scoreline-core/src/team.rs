use crate::error::Result;
use crate::pmf::Pmf;
use crate::suite::ScoreRateSuite;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two scoring processes modeled per team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreKind {
    #[serde(rename = "TD")]
    Touchdown,
    #[serde(rename = "FG")]
    FieldGoal,
}

impl ScoreKind {
    pub const ALL: [ScoreKind; 2] = [ScoreKind::Touchdown, ScoreKind::FieldGoal];

    /// Points credited per event.
    pub const fn points(self) -> i64 {
        match self {
            ScoreKind::Touchdown => 7,
            ScoreKind::FieldGoal => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ScoreKind::Touchdown => "TD",
            ScoreKind::FieldGoal => "FG",
        }
    }
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoreKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TD" | "TOUCHDOWN" => Ok(ScoreKind::Touchdown),
            "FG" | "FIELD GOAL" | "FIELDGOAL" => Ok(ScoreKind::FieldGoal),
            other => Err(format!("unknown score type '{other}'")),
        }
    }
}

/// Independent touchdown and field-goal rate posteriors for one team.
#[derive(Debug, Clone)]
pub struct TeamModel {
    touchdowns: ScoreRateSuite,
    field_goals: ScoreRateSuite,
}

impl TeamModel {
    pub fn new(touchdowns: ScoreRateSuite, field_goals: ScoreRateSuite) -> Self {
        Self {
            touchdowns,
            field_goals,
        }
    }

    pub fn touchdowns(&self) -> &ScoreRateSuite {
        &self.touchdowns
    }

    pub fn field_goals(&self) -> &ScoreRateSuite {
        &self.field_goals
    }

    pub fn suite(&self, kind: ScoreKind) -> &ScoreRateSuite {
        match kind {
            ScoreKind::Touchdown => &self.touchdowns,
            ScoreKind::FieldGoal => &self.field_goals,
        }
    }

    fn suite_mut(&mut self, kind: ScoreKind) -> &mut ScoreRateSuite {
        match kind {
            ScoreKind::Touchdown => &mut self.touchdowns,
            ScoreKind::FieldGoal => &mut self.field_goals,
        }
    }

    /// Routes a gap to the suite for its score type; the sibling suite is untouched.
    pub fn observe(&mut self, kind: ScoreKind, gap_minutes: f64) -> Result<()> {
        self.suite_mut(kind).update(gap_minutes)
    }

    pub fn update_touchdown(&mut self, gap_minutes: f64) -> Result<()> {
        self.observe(ScoreKind::Touchdown, gap_minutes)
    }

    pub fn update_field_goal(&mut self, gap_minutes: f64) -> Result<()> {
        self.observe(ScoreKind::FieldGoal, gap_minutes)
    }

    /// Applies `(touchdown gap, field-goal gap)` to the respective suites.
    ///
    /// Both suites advance or neither does.
    pub fn update(&mut self, observation: (f64, f64)) -> Result<()> {
        let (touchdown_gap, field_goal_gap) = observation;
        let mut touchdowns = self.touchdowns.clone();
        touchdowns.update(touchdown_gap)?;
        self.field_goals.update(field_goal_gap)?;
        self.touchdowns = touchdowns;
        Ok(())
    }

    /// Predictive distribution of a single score type's point contribution.
    pub fn predict_points(&self, kind: ScoreKind, remaining_minutes: f64) -> Result<Pmf<i64>> {
        Ok(self
            .suite(kind)
            .predict_remaining(remaining_minutes, 0)?
            .scale(kind.points()))
    }

    /// Predictive distribution of the final point total.
    pub fn predict_remaining(
        &self,
        remaining_minutes: f64,
        points_scored: i64,
    ) -> Result<Pmf<i64>> {
        let field_goals = self.predict_points(ScoreKind::FieldGoal, remaining_minutes)?;
        let touchdowns = self.predict_points(ScoreKind::Touchdown, remaining_minutes)?;
        Ok(field_goals.convolve(&touchdowns).shift(points_scored))
    }
}
