use criterion::{Criterion, criterion_group, criterion_main};
use docs_qa::embeddings::{Embedder, HashingEmbedder};
use docs_qa::index::{DistanceMetric, VectorIndex};
use docs_qa::ingest::{ChunkingConfig, ChunkingPolicy, load_document};
use std::hint::black_box;
use std::path::Path;

pub fn criterion_benchmark(c: &mut Criterion) {
    let sample_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("benches/business_knowledge.txt");
    let policy = ChunkingPolicy::Paragraphs(ChunkingConfig {
        target_chunk_size: 40,
        max_chunk_size: 80,
        min_chunk_size: 10,
        overlap_size: 0,
        ..ChunkingConfig::default()
    });
    let segments = load_document(sample_path, &policy).expect("can load test file");
    let embedder = HashingEmbedder::default();

    for metric in [DistanceMetric::L2, DistanceMetric::Cosine] {
        let index =
            VectorIndex::build(segments.clone(), &embedder, metric).expect("index should build");
        let query = embedder
            .embed("How long do refunds take after a return?")
            .expect("query should embed");
        c.bench_function(&format!("search_{metric}"), |b| {
            b.iter(|| index.search(black_box(&query), black_box(3)))
        });
    }

    c.bench_function("embed_query", |b| {
        b.iter(|| embedder.embed(black_box("What are the payment terms for new accounts?")))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
