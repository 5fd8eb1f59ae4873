// Performance benchmarks for fitting, recommending and evaluating
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fusionrec::{EngineConfig, Matrix, Recommender, TfidfExtractor};
use rand::prelude::*;
use std::sync::Arc;
use std::thread;

const WORDS: [&str; 16] = [
    "sugar", "cocoa", "butter", "milk", "oats", "water", "salt", "wheat", "flour", "honey",
    "almonds", "hazelnuts", "soy", "rice", "vanilla", "yeast",
];

fn generate_catalog(n: usize) -> (Matrix, Vec<String>, Vec<u32>) {
    let mut rng = StdRng::seed_from_u64(42);
    let rows: Vec<Vec<f32>> = (0..n)
        .map(|_| (0..4).map(|_| rng.random_range(0.0f32..500.0)).collect())
        .collect();
    let texts = (0..n)
        .map(|i| {
            let words: Vec<&str> = (0..8)
                .map(|_| WORDS[rng.random_range(0..WORDS.len())])
                .collect();
            format!("product {}. {}", i, words.join(", "))
        })
        .collect();
    let labels = (0..n).map(|i| (i % 5) as u32).collect();
    (Matrix::from_rows(&rows).unwrap(), texts, labels)
}

fn fitted(n: usize) -> Recommender {
    let (tabular, texts, labels) = generate_catalog(n);
    Recommender::new(EngineConfig::default())
        .fit(Some(&tabular), Some(&texts), &labels)
        .unwrap()
}

fn benchmark_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");

    for size in [100, 1000, 5000].iter() {
        let (tabular, texts, labels) = generate_catalog(*size);
        let engine = Recommender::new(EngineConfig::default());
        group.bench_with_input(BenchmarkId::new("fusionrec", size), size, |b, _| {
            b.iter(|| {
                let trained = engine.fit(Some(&tabular), Some(&texts), &labels).unwrap();
                black_box(trained);
            });
        });
    }

    group.finish();
}

fn benchmark_tfidf(c: &mut Criterion) {
    let mut group = c.benchmark_group("tfidf");
    let (_, texts, _) = generate_catalog(5000);

    group.bench_function("fit_5000", |b| {
        b.iter(|| black_box(TfidfExtractor::fit(black_box(&texts), 100).unwrap()));
    });

    let tfidf = TfidfExtractor::fit(&texts, 100).unwrap();
    group.bench_function("transform_one", |b| {
        b.iter(|| {
            black_box(tfidf.transform_one(black_box("Cocoa bar. sugar, cocoa butter, milk")))
        });
    });

    group.finish();
}

fn benchmark_recommend(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommend");

    for size in [1000, 10000].iter() {
        let engine = fitted(*size);
        group.bench_with_input(BenchmarkId::new("item_k5", size), size, |b, _| {
            b.iter(|| black_box(engine.recommend(black_box(7), 5).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    group.sample_size(10);

    let engine = fitted(2000);
    group.bench_function("report_2000_k5", |b| {
        b.iter(|| black_box(engine.evaluate(5).unwrap()));
    });

    group.finish();
}

fn benchmark_concurrent_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_reads");

    let engine = fitted(1000);
    let model = Arc::clone(engine.model().unwrap());

    group.bench_function("fusionrec_concurrent", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..10)
                .map(|t| {
                    let model = Arc::clone(&model);
                    thread::spawn(move || model.recommend(t * 13, 10))
                })
                .collect();

            for handle in handles {
                black_box(handle.join().unwrap().unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_fit,
    benchmark_tfidf,
    benchmark_recommend,
    benchmark_evaluate,
    benchmark_concurrent_reads
);
criterion_main!(benches);
