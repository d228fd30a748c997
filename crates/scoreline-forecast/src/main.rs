use std::path::PathBuf;

use clap::Parser;

use scoreline_forecast::config::{ForecastConfig, ResolvedOutputs};
use scoreline_forecast::logging::init_logging;
use scoreline_forecast::runner::ForecastRunner;

/// Bayesian final-score forecaster for a two-team matchup.
#[derive(Debug, Parser)]
#[command(
    name = "scoreline",
    author,
    version,
    about = "Predict final scores from touchdown and field-goal arrival rates"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "forecast/matchup.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the minutes left to play.
    #[arg(long, value_name = "MINUTES")]
    remaining_minutes: Option<f64>,

    /// Override the credible interval width, in percent.
    #[arg(long, value_name = "PERCENT")]
    credible_percent: Option<f64>,

    /// Override the number of Monte-Carlo trials (0 disables simulation).
    #[arg(long, value_name = "TRIALS")]
    trials: Option<usize>,

    /// Override the simulation RNG seed.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Exit after validating the configuration (no forecast is run).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match ForecastConfig::from_path(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            let context = format!("loading configuration {}", err.path().display());
            return Err(anyhow::Error::new(err).context(context));
        }
    };

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(minutes) = cli.remaining_minutes {
        config.scenario.remaining_minutes = minutes;
    }

    if let Some(percent) = cli.credible_percent {
        config.scenario.credible_percent = percent;
    }

    if let Some(trials) = cli.trials {
        config.simulation.trials = trials;
    }

    if let Some(seed) = cli.seed {
        config.simulation.seed = Some(seed);
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let names: Vec<&str> = config.teams.iter().map(|team| team.name.as_str()).collect();

    println!(
        "Loaded configuration '{run_id}': {} with {:.1} minutes remaining",
        names.join(" vs "),
        config.scenario.remaining_minutes
    );

    let logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let runner = ForecastRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: forecast skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    let matchup = &summary.report.matchup;
    for outlook in [&matchup.first, &matchup.second] {
        println!(
            "{}: win {:.1}%, mean final {:.1}, {:.0}% credible interval [{}, {}]",
            outlook.name,
            outlook.win_probability * 100.0,
            outlook.mean,
            outlook.credible_percent,
            outlook.credible_interval.0,
            outlook.credible_interval.1
        );
    }
    println!("Tie: {:.1}%", matchup.tie_probability * 100.0);

    if let Some(simulated) = summary.report.simulation.as_ref() {
        println!(
            "Simulation ({} trials): {:.1}% / {:.1}% / tie {:.1}%",
            simulated.trials,
            simulated.first_win_rate * 100.0,
            simulated.second_win_rate * 100.0,
            simulated.tie_rate * 100.0
        );
    }

    println!("Forecast JSON: {}", summary.json_path.display());
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(plot_path) = summary.plot_path.as_ref() {
        println!("Final score plot: {}", plot_path.display());
    }
    if let Some(guard) = logging_guard.as_ref() {
        println!("Telemetry log: {}", guard.telemetry_path.display());
    }

    Ok(())
}
