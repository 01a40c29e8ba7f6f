//! Criterion benchmarks for Colloquy.
//!
//! Covers the per-turn hot path: analysis, bag-of-words encoding, the
//! forward pass and full classification on a trained engine.

use std::hint::black_box;
use std::sync::Arc;

use colloquy::analysis::IntentAnalyzer;
use colloquy::ml::intent_classifier::{
    EngineConfig, IntentCorpus, IntentEngine, Vocabulary, encode_text,
};
use colloquy::ml::network::{LayerSpec, Sequential};
use colloquy::storage::MemoryStorage;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Generate utterances for benchmarking.
fn generate_utterances(count: usize) -> Vec<String> {
    let words = [
        "show", "my", "portfolio", "buy", "sell", "shares", "stock", "chart", "plot", "price",
        "history", "hello", "goodbye", "what", "is", "worth", "running", "holdings", "value",
        "today",
    ];

    (0..count)
        .map(|i| {
            let len = 3 + (i % 6);
            (0..len)
                .map(|j| words[(i * 7 + j * 13) % words.len()])
                .collect::<Vec<_>>()
                .join(" ")
                + "?"
        })
        .collect()
}

fn corpus() -> IntentCorpus {
    IntentCorpus::from_json_str(include_str!("../demos/intents.json"))
        .expect("demo corpus is valid")
}

fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");

    let analyzer = IntentAnalyzer::new();
    let texts = generate_utterances(100);

    group.bench_function("lemmas_single", |b| {
        b.iter(|| black_box(analyzer.lemmas(black_box(&texts[0]))))
    });

    group.throughput(Throughput::Elements(texts.len() as u64));
    group.bench_function("lemmas_batch", |b| {
        b.iter(|| {
            for text in &texts {
                let _ = black_box(analyzer.lemmas(black_box(text)));
            }
        })
    });

    group.finish();
}

fn bench_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoding");

    let analyzer = IntentAnalyzer::new();
    let texts = generate_utterances(100);
    let vocabulary = Vocabulary::from_words(
        texts
            .iter()
            .flat_map(|text| analyzer.lemmas(text).unwrap_or_default()),
    );

    group.throughput(Throughput::Elements(texts.len() as u64));
    group.bench_function("encode_text_batch", |b| {
        b.iter(|| {
            for text in &texts {
                let _ = black_box(encode_text(&analyzer, black_box(text), &vocabulary));
            }
        })
    });

    group.finish();
}

fn bench_forward_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("network");

    let mut rng = StdRng::seed_from_u64(42);
    for input_dim in [64, 512] {
        let network = Sequential::build(input_dim, &LayerSpec::default_hidden(), 8, &mut rng)
            .expect("valid network");
        let input: Vec<f32> = (0..input_dim).map(|i| (i % 3 == 0) as u8 as f32).collect();

        group.bench_function(format!("predict_{input_dim}"), |b| {
            b.iter(|| black_box(network.predict(black_box(&input))))
        });
    }

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");

    let mut engine = IntentEngine::with_storage(
        corpus(),
        EngineConfig::default().with_seed(42).with_epochs(50),
        Arc::new(MemoryStorage::new_default()),
    )
    .expect("engine");
    engine.fit().expect("fit");

    let texts = generate_utterances(50);
    group.throughput(Throughput::Elements(texts.len() as u64));
    group.bench_function("classify_batch", |b| {
        b.iter(|| {
            for text in &texts {
                let _ = black_box(engine.classify(black_box(text)));
            }
        })
    });

    group.finish();
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10);

    group.bench_function("fit_demo_corpus_20_epochs", |b| {
        b.iter(|| {
            let mut engine = IntentEngine::with_storage(
                corpus(),
                EngineConfig::default().with_seed(7).with_epochs(20),
                Arc::new(MemoryStorage::new_default()),
            )
            .expect("engine");
            black_box(engine.fit().expect("fit"))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_analysis,
    bench_encoding,
    bench_forward_pass,
    bench_classify
);

// Separate group for slower benchmarks
criterion_group!(slow_benches, bench_training);

criterion_main!(benches, slow_benches);
