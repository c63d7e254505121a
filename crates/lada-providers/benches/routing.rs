use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lada_providers::{suggest_models, ModelRegistry};

// Identifier parsing runs once per command; suggestions scale with the
// size of the engine's model list.

fn benchmark_parse(c: &mut Criterion) {
    let registry = ModelRegistry::new();
    let mut group = c.benchmark_group("parse");

    for identifier in ["codellama:7b", "mlx:Qwen2.5-3B-Instruct", "ollama:llama2:13b", "mistral"] {
        group.bench_with_input(BenchmarkId::from_parameter(identifier), identifier, |b, id| {
            b.iter(|| registry.parse(black_box(id)))
        });
    }
    group.finish();
}

fn benchmark_suggestions(c: &mut Criterion) {
    let mut group = c.benchmark_group("suggest_models");

    for size in [10usize, 100, 1000] {
        let available: Vec<String> = (0..size).map(|i| format!("model-{}:{}b", i, i % 70)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &available, |b, available| {
            b.iter(|| suggest_models(black_box("mdel-42:42b"), available))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_parse, benchmark_suggestions);
criterion_main!(benches);
