use criterion::{Criterion, black_box, criterion_group, criterion_main};
use scoreline_core::{ScoreRateSuite, TeamModel};

fn trained_model() -> TeamModel {
    let mut model = TeamModel::new(
        ScoreRateSuite::with_grid(0.0, 20.0, 201).expect("td grid"),
        ScoreRateSuite::with_grid(0.0, 20.0, 201).expect("fg grid"),
    );
    for gap in [14.0, 22.5, 9.0, 31.0, 17.5, 12.0] {
        model.update_touchdown(gap).expect("td");
    }
    for gap in [28.0, 41.0, 19.5, 55.0] {
        model.update_field_goal(gap).expect("fg");
    }
    model
}

fn predict_remaining_bench(c: &mut Criterion) {
    let model = trained_model();
    let mut group = c.benchmark_group("predict_remaining");
    for remaining in [60.0, 30.0, 5.0] {
        group.bench_function(format!("full_grid_{remaining}min"), |b| {
            b.iter(|| black_box(model.predict_remaining(black_box(remaining), 0)))
        });
    }
    group.finish();
}

criterion_group!(benches, predict_remaining_bench);
criterion_main!(benches);
