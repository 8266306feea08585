use cohort_quarantine::random::SimRng;
use cohort_quarantine::{Model, Parameters, Study};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

static SEED: u64 = 123;
static REPETITIONS: u32 = 100;

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("repetitions");
    for study in [Study::Regular, Study::Additional] {
        let parameters = Parameters::for_study(study);
        for scenario in study.scenarios(&parameters) {
            let index = scenario.index;
            let model = Model::new(study, scenario, &parameters);
            group.bench_with_input(
                BenchmarkId::new(study.to_string(), index),
                &model,
                |bencher, model| {
                    bencher.iter(|| {
                        let mut rng = SimRng::seed_from(SEED);
                        black_box(model.run(REPETITIONS, &mut rng))
                    });
                },
            );
        }
    }
    group.finish();
}

criterion_group!(repetition_benches, criterion_benchmark);
criterion_main!(repetition_benches);
