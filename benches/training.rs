//! Training benchmark: labeled matrix → boosted ensemble.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use driverisk::config::TrainingConfig;
use driverisk::model::GbdtClassifier;
use ndarray::Array2;

fn make_dataset(n: usize, d: usize) -> (Array2<f64>, Vec<f64>) {
    let mut x = Array2::zeros((n, d));
    let mut y = Vec::with_capacity(n);
    for i in 0..n {
        let hot = i % 6 == 0;
        for j in 0..d {
            x[[i, j]] = ((i * 31 + j * 7) % 97) as f64
                + if hot && j == 0 { 120.0 } else { 0.0 };
        }
        y.push(if hot { 1.0 } else { 0.0 });
    }
    (x, y)
}

fn bench_training(c: &mut Criterion) {
    let config = TrainingConfig {
        n_estimators: 50,
        early_stopping_rounds: 50,
        ..TrainingConfig::default()
    };

    let mut g = c.benchmark_group("gbdt_training");
    for n in [200usize, 500] {
        let (x, y) = make_dataset(n, 20);
        let split = n * 4 / 5;
        let x_train = x.slice(ndarray::s![..split, ..]).to_owned();
        let x_val = x.slice(ndarray::s![split.., ..]).to_owned();
        g.bench_function(format!("rows_{}", n).as_str(), |b| {
            b.iter(|| {
                black_box(
                    GbdtClassifier::train(
                        black_box(&x_train),
                        &y[..split],
                        &x_val,
                        &y[split..],
                        &config,
                    )
                    .unwrap(),
                )
            })
        });
    }
    g.finish();
}

criterion_group!(benches, bench_training);
criterion_main!(benches);
