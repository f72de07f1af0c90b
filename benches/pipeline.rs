//! Pipeline benchmark: telemetry → engineered features → scored series.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use driverisk::config::AnalyzerConfig;
use driverisk::features::{Preprocessor, TemporalFeatureEngine};
use driverisk::labeling::LabelPolicy;
use driverisk::pipeline::RiskPipeline;
use driverisk::telemetry::TelemetryRecord;

fn make_series(n: usize) -> Vec<TelemetryRecord> {
    (0..n)
        .map(|i| TelemetryRecord {
            speed: if i % 9 == 0 { 102.0 } else { 42.0 + (i % 7) as f64 },
            acceleration: ((i % 5) as f64 - 2.0) * 0.1,
            rpm: 1800.0 + (i % 13) as f64 * 60.0,
            throttle_position: 22.0 + (i % 9) as f64,
            engine_temperature: 92.0 + (i % 5) as f64,
            system_voltage: 13.8,
            engine_load_value: 38.0 + (i % 11) as f64,
            distance_travelled: i as f64 * 12.0,
            brake: 0.0,
            ..TelemetryRecord::default()
        })
        .collect()
}

fn bench_feature_engineering(c: &mut Criterion) {
    let config = AnalyzerConfig::default();
    let records = make_series(600);

    c.bench_function("feature_engineering_600_records", |b| {
        b.iter(|| {
            let (mut frame, schema) = Preprocessor::run(black_box(&records)).unwrap();
            TemporalFeatureEngine::new(config.features.clone()).augment(&mut frame, &schema);
            black_box(frame)
        })
    });
}

fn bench_labeling(c: &mut Criterion) {
    let config = AnalyzerConfig::default();
    let records = make_series(600);
    let (mut frame, schema) = Preprocessor::run(&records).unwrap();
    TemporalFeatureEngine::new(config.features.clone()).augment(&mut frame, &schema);

    c.bench_function("composite_labeling_600_records", |b| {
        b.iter(|| black_box(LabelPolicy::Composite.label(black_box(&frame), &config.labeling)))
    });
}

fn bench_score_series(c: &mut Criterion) {
    let records = make_series(600);
    let (model, _) = RiskPipeline::with_defaults()
        .train(&records, LabelPolicy::Composite)
        .unwrap();

    c.bench_function("score_series_600_records", |b| {
        b.iter(|| black_box(model.score_series(black_box(&records)).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_feature_engineering,
    bench_labeling,
    bench_score_series
);
criterion_main!(benches);
