use scoreline_core::{
    EventLog, GameLog, MatchupForecast, ScoreKind, ScoreRateSuite, ScoringEvent, TeamModel,
    train_team,
};

fn flat_model() -> TeamModel {
    TeamModel::new(
        ScoreRateSuite::with_grid(0.0, 20.0, 201).expect("td grid"),
        ScoreRateSuite::with_grid(0.0, 20.0, 201).expect("fg grid"),
    )
}

/// A team that scores a touchdown every 15 minutes and a field goal every 30.
fn steady_season(team: &str, games: usize) -> EventLog {
    let games = (0..games)
        .map(|week| {
            let mut events = Vec::new();
            for quarter in 0..4 {
                let remaining = 60.0 - 15.0 * quarter as f64 - 7.5;
                events.push(ScoringEvent::new(remaining, ScoreKind::Touchdown, team));
                if quarter % 2 == 1 {
                    events.push(ScoringEvent::new(remaining - 1.0, ScoreKind::FieldGoal, team));
                }
                events.push(ScoringEvent::new(remaining - 2.0, ScoreKind::Touchdown, "Opponent"));
            }
            GameLog {
                label: Some(format!("week {}", week + 1)),
                events,
            }
        })
        .collect();
    EventLog { games }
}

#[test]
fn posterior_concentrates_near_observed_rates() {
    let mut model = flat_model();
    let summary = train_team(&mut model, "Harbor", &steady_season("Harbor", 12)).expect("train");
    assert_eq!(summary.games, 12);
    assert_eq!(summary.touchdowns, 48);
    assert_eq!(summary.field_goals, 24);

    let touchdown_rate = model.touchdowns().mean_rate();
    let field_goal_rate = model.field_goals().mean_rate();
    assert!((touchdown_rate - 4.0).abs() < 0.75, "td rate {touchdown_rate}");
    assert!((field_goal_rate - 2.0).abs() < 0.6, "fg rate {field_goal_rate}");

    let (low, high) = model.touchdowns().credible_interval(90.0).expect("interval");
    assert!(low.per_game() < 4.0 && 4.0 < high.per_game());
}

#[test]
fn stronger_offense_is_favored() {
    let mut strong = flat_model();
    train_team(&mut strong, "Harbor", &steady_season("Harbor", 10)).expect("train strong");

    let sparse = EventLog {
        games: (0..10)
            .map(|_| GameLog {
                label: None,
                events: vec![
                    ScoringEvent::new(40.0, ScoreKind::FieldGoal, "Ridge"),
                    ScoringEvent::new(10.0, ScoreKind::Touchdown, "Ridge"),
                ],
            })
            .collect(),
    };
    let mut weak = flat_model();
    train_team(&mut weak, "Ridge", &sparse).expect("train weak");

    let strong_total = strong.predict_remaining(60.0, 0).expect("strong prediction");
    let weak_total = weak.predict_remaining(60.0, 0).expect("weak prediction");
    assert!((strong_total.total() - 1.0).abs() < 1e-9);
    assert!((weak_total.total() - 1.0).abs() < 1e-9);

    let forecast =
        MatchupForecast::from_predictions(("Harbor", &strong_total), ("Ridge", &weak_total), 90.0)
            .expect("forecast");
    assert!(forecast.first.win_probability > 0.8);
    assert!(forecast.first.mean > forecast.second.mean);
    let (low, high) = forecast.second.credible_interval;
    assert!(low <= high);
}

#[test]
fn mid_game_prediction_starts_at_current_score() {
    let mut model = flat_model();
    train_team(&mut model, "Harbor", &steady_season("Harbor", 6)).expect("train");
    let total = model.predict_remaining(20.0, 14).expect("predict");
    assert_eq!(total.keys().next(), Some(14));
    assert!(total.mean() > 14.0);
    assert!(total.to_cdf().expect("cdf").prob_less_than(14) == 0.0);
}
