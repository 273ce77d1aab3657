//! Benchmarks for report assembly and error budget arithmetic

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use slo_engine::backend::Measurement;
use slo_engine::config::{
    BackendConfig, ErrorBudgetPolicyStep, MeasurementConfig, SloConfig,
};
use slo_engine::report::Report;

fn sample_slo() -> SloConfig {
    SloConfig {
        service_name: "web".to_string(),
        feature_name: "checkout".to_string(),
        slo_name: "availability".to_string(),
        slo_description: "Checkout availability".to_string(),
        slo_target: 0.999,
        backend: BackendConfig {
            provider: "memory".to_string(),
            method: "good_bad_ratio".to_string(),
            url: None,
            index: None,
            date_field: None,
            measurement: MeasurementConfig::default(),
        },
        exporters: Vec::new(),
    }
}

fn sample_step() -> ErrorBudgetPolicyStep {
    ErrorBudgetPolicyStep {
        name: "28 days".to_string(),
        window_seconds: 2419200,
        burn_rate_threshold: 1.0,
        alerting_burn_rate_threshold: Some(2.0),
        message_alert: "Freeze releases until the budget recovers".to_string(),
        message_ok: "Within budget".to_string(),
    }
}

fn bench_report_build(c: &mut Criterion) {
    let slo = sample_slo();
    let step = sample_step();
    let timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();

    c.bench_function("report_build", |b| {
        b.iter(|| {
            Report::build(
                black_box(&slo),
                black_box(&step),
                black_box(timestamp),
                black_box(0.9971),
            )
        })
    });
}

fn bench_sli_derivation(c: &mut Criterion) {
    c.bench_function("sli_from_counts", |b| {
        b.iter(|| {
            Measurement::GoodBad {
                good: black_box(998_213.0),
                bad: black_box(1_787.0),
            }
            .sli_value()
        })
    });
}

fn bench_report_serialization(c: &mut Criterion) {
    let slo = sample_slo();
    let step = sample_step();
    let timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
    let report = Report::build(&slo, &step, timestamp, 0.9971);

    c.bench_function("report_to_json", |b| {
        b.iter(|| serde_json::to_string(black_box(&report)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_report_build,
    bench_sli_derivation,
    bench_report_serialization
);
criterion_main!(benches);
