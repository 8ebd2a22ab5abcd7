//! Latency benchmarks for the sentiment engine
//!
//! Run with: cargo bench -p reviewsense-classifiers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tokio::runtime::Runtime;

use reviewsense_classifiers::{Classifier, SentimentEngine, TrainingConfig, TrainingPipeline};
use reviewsense_core::{LabeledExample, Sentiment};

const POSITIVE: [&str; 4] = [
    "great app works perfectly",
    "love the new update",
    "excellent support and fast",
    "best app i have used",
];

const NEGATIVE: [&str; 4] = [
    "crashes every time i open it",
    "terrible update lost my data",
    "awful support never replied",
    "worst app slow and buggy",
];

fn engine() -> SentimentEngine {
    let examples: Vec<LabeledExample> = (0..50)
        .flat_map(|i| {
            [
                LabeledExample::new(
                    format!("{} {}", POSITIVE[i % POSITIVE.len()], i),
                    Sentiment::Positive,
                ),
                LabeledExample::new(
                    format!("{} {}", NEGATIVE[i % NEGATIVE.len()], i),
                    Sentiment::Negative,
                ),
            ]
        })
        .collect();

    let outcome = TrainingPipeline::new(TrainingConfig::default())
        .run(examples)
        .expect("Failed to train benchmark model");
    SentimentEngine::new(outcome.artifacts)
}

fn benchmark_predict(c: &mut Criterion) {
    let engine = engine();

    let test_cases = vec![
        ("empty", String::new()),
        ("short", "great app".to_string()),
        (
            "medium",
            "The update crashes every time I open the settings page, please fix".to_string(),
        ),
        ("long", POSITIVE.join(" ").repeat(20)),
    ];

    let mut group = c.benchmark_group("Sentiment_Predict");
    group.sample_size(100);

    for (name, text) in &test_cases {
        group.bench_with_input(BenchmarkId::new("predict_sentiment", name), text, |b, text| {
            b.iter(|| engine.predict_sentiment(black_box(text)))
        });
    }

    group.finish();
}

fn benchmark_classify(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let engine = engine();

    c.bench_function("classify_with_scores", |b| {
        b.iter(|| {
            rt.block_on(async {
                engine
                    .classify(black_box("love the new update but it is slow"))
                    .await
                    .unwrap()
            })
        })
    });
}

fn benchmark_batch(c: &mut Criterion) {
    let engine = engine();
    let batch: Vec<&str> = POSITIVE.iter().chain(NEGATIVE.iter()).copied().collect();

    c.bench_function("predict_batch_8", |b| {
        b.iter(|| engine.predict_batch(black_box(&batch)))
    });
}

criterion_group!(benches, benchmark_predict, benchmark_classify, benchmark_batch);
criterion_main!(benches);
