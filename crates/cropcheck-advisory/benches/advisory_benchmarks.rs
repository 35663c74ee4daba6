//! Benchmarks for the advisory path that follows every classification
//!
//! Run with: cargo bench -p cropcheck-advisory

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cropcheck_advisory::{Advisor, Catalog, DosageRequest};
use cropcheck_core::{CanonicalKey, ClassProbability, Ranking, Severity};
use std::sync::Arc;

fn advisor() -> Advisor {
    Advisor::new(Arc::new(Catalog::embedded().unwrap()))
}

fn benchmark_catalog_load(c: &mut Criterion) {
    c.bench_function("catalog_embedded", |b| {
        b.iter(|| Catalog::embedded().unwrap())
    });
}

fn benchmark_resolve(c: &mut Criterion) {
    let catalog = Catalog::embedded().unwrap();
    let mut group = c.benchmark_group("Resolve");

    for raw in [
        "Potato___Late_blight",
        "Tomato__Tomato_YellowLeaf__Curl_Virus",
        "Mango___Anthracnose",
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(raw), raw, |b, raw| {
            b.iter(|| catalog.normalizer().resolve(black_box(raw)))
        });
    }

    group.finish();
}

fn benchmark_dosage(c: &mut Criterion) {
    let catalog = Catalog::embedded().unwrap();
    let key = CanonicalKey::from("Potato_Late_blight");
    let mut group = c.benchmark_group("Dosage");

    for area in [100.0, 1000.0, 250_000.0] {
        group.bench_with_input(BenchmarkId::new("calculate", area), &area, |b, &area| {
            b.iter(|| {
                catalog
                    .pesticides()
                    .calculate(black_box(&key), black_box(area), Severity::Severe)
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn benchmark_advise(c: &mut Criterion) {
    let advisor = advisor();
    let ranking = Ranking {
        entries: vec![
            ClassProbability::new(21, "Potato___Late_blight", 0.81),
            ClassProbability::new(20, "Potato___Early_blight", 0.12),
            ClassProbability::new(22, "Potato___healthy", 0.07),
        ],
        total_classes: 38,
    };
    let request = DosageRequest {
        area_sqft: 1000.0,
        severity: Severity::Moderate,
    };

    let mut group = c.benchmark_group("Advise");
    group.bench_function("without_dosage", |b| {
        b.iter(|| advisor.advise(black_box(&ranking), None).unwrap())
    });
    group.bench_function("with_dosage", |b| {
        b.iter(|| advisor.advise(black_box(&ranking), Some(request)).unwrap())
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_catalog_load,
    benchmark_resolve,
    benchmark_dosage,
    benchmark_advise
);
criterion_main!(benches);
