use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use scoreline_core::{
    MatchupForecast, ModelError, Pmf, ScoreRateSuite, SimulatedMatchup, TrainingSummary,
};
use serde::Serialize;
use thiserror::Error;

const PLOT_COLORS: [RGBColor; 2] = [RGBColor(0x1f, 0x5f, 0xa8), RGBColor(0xc0, 0x39, 0x2b)];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode report JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to summarise posterior: {0}")]
    Model(#[from] ModelError),
    #[error("failed to render plot: {0}")]
    Plot(String),
}

/// Posterior summary for one scoring rate, in scores per game.
#[derive(Debug, Clone, Serialize)]
pub struct RateSummary {
    pub mean: f64,
    pub most_likely: Option<f64>,
    pub credible_interval: (f64, f64),
}

impl RateSummary {
    pub fn from_suite(suite: &ScoreRateSuite, credible_percent: f64) -> Result<Self, ReportError> {
        let (low, high) = suite.credible_interval(credible_percent)?;
        Ok(Self {
            mean: suite.mean_rate(),
            most_likely: suite.max_likelihood().map(|rate| rate.per_game()),
            credible_interval: (low.per_game(), high.per_game()),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamReport {
    pub name: String,
    pub events: String,
    pub points_scored: i64,
    pub training: TrainingSummary,
    pub touchdown_rate: RateSummary,
    pub field_goal_rate: RateSummary,
    pub final_score: Pmf<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub run_id: String,
    pub remaining_minutes: f64,
    pub credible_percent: f64,
    pub teams: Vec<TeamReport>,
    pub matchup: MatchupForecast,
    pub simulation: Option<SimulatedMatchup>,
}

impl ForecastReport {
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json).map_err(|e| ReportError::Io {
            context: "writing forecast json",
            source: e,
        })
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let mut rows = String::new();
        rows.push_str(&format!("# Forecast `{}`\n\n", self.run_id));
        rows.push_str(&format!(
            "Remaining time: {:.1} min · credible level: {:.0}%\n\n",
            self.remaining_minutes, self.credible_percent
        ));
        rows.push_str("| Team | Scored | TD/game | FG/game | Mean final | Credible interval | Win % |\n");
        rows.push_str("|------|--------|---------|---------|------------|-------------------|-------|\n");

        for (team, outlook) in self
            .teams
            .iter()
            .zip([&self.matchup.first, &self.matchup.second])
        {
            rows.push_str(&format!(
                "| {name} | {scored} | {td:.2} [{td_low:.1}, {td_high:.1}] | {fg:.2} [{fg_low:.1}, {fg_high:.1}] | {mean:.1} | [{low}, {high}] | {win:.1}% |\n",
                name = team.name,
                scored = team.points_scored,
                td = team.touchdown_rate.mean,
                td_low = team.touchdown_rate.credible_interval.0,
                td_high = team.touchdown_rate.credible_interval.1,
                fg = team.field_goal_rate.mean,
                fg_low = team.field_goal_rate.credible_interval.0,
                fg_high = team.field_goal_rate.credible_interval.1,
                mean = outlook.mean,
                low = outlook.credible_interval.0,
                high = outlook.credible_interval.1,
                win = outlook.win_probability * 100.0,
            ));
        }

        rows.push_str(&format!(
            "\nTie probability: {:.1}%\n",
            self.matchup.tie_probability * 100.0
        ));

        if let Some(simulated) = self.simulation.as_ref() {
            rows.push_str(&format!(
                "\nSimulation ({} trials): {} {:.1}% · {} {:.1}% · tie {:.1}%\n",
                simulated.trials,
                self.matchup.first.name,
                simulated.first_win_rate * 100.0,
                self.matchup.second.name,
                simulated.second_win_rate * 100.0,
                simulated.tie_rate * 100.0,
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|e| ReportError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }

    pub fn render_plot(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ReportError> {
        let dir = dir.as_ref();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| ReportError::Io {
                context: "creating plots directory",
                source: e,
            })?;
        }

        let output_path = dir.join("final_score.png");
        let series: Vec<(String, Vec<(i64, f64)>)> = self
            .teams
            .iter()
            .map(|team| (team.name.clone(), team.final_score.items().collect()))
            .collect();

        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let plot_attempt = std::panic::catch_unwind(move || {
            let root = BitMapBackend::new(&output_path, (800, 480)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| ReportError::Plot(e.to_string()))?;

            let x_max = series
                .iter()
                .flat_map(|(_, points)| points.iter().map(|(score, _)| *score))
                .max()
                .unwrap_or(0)
                .max(1);
            let y_max = series
                .iter()
                .flat_map(|(_, points)| points.iter().map(|(_, mass)| *mass))
                .fold(0.0f64, f64::max)
                .max(0.01);

            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .caption("Predictive final score", ("sans-serif", 22))
                .set_label_area_size(LabelAreaPosition::Left, 60)
                .set_label_area_size(LabelAreaPosition::Bottom, 40)
                .build_cartesian_2d(0i64..x_max, 0.0..y_max * 1.1)
                .map_err(|e| ReportError::Plot(e.to_string()))?;

            chart
                .configure_mesh()
                .disable_mesh()
                .x_desc("Points")
                .y_desc("Probability")
                .draw()
                .map_err(|e| ReportError::Plot(e.to_string()))?;

            for (index, (name, points)) in series.iter().enumerate() {
                let color = PLOT_COLORS[index % PLOT_COLORS.len()];
                chart
                    .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
                    .map_err(|e| ReportError::Plot(e.to_string()))?
                    .label(name.as_str())
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
                    });
            }

            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(|e| ReportError::Plot(e.to_string()))?;

            drop(chart);

            root.present()
                .map_err(|e| ReportError::Plot(e.to_string()))?;

            drop(root);

            Ok(output_path)
        });

        std::panic::set_hook(prev_hook);

        match plot_attempt {
            Ok(result) => result,
            Err(_) => Err(ReportError::Plot(
                "plotters panicked while rendering (missing font support?)".into(),
            )),
        }
    }
}
