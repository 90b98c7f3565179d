use criterion::{Criterion, criterion_group, criterion_main};
use pdf_rag::embeddings::chunk_document;
use std::hint::black_box;

fn sample_document() -> String {
    (0..2_000)
        .map(|i| {
            format!(
                "Section {} covers retrieval over extracted PDF text.\nLines inside a paragraph stay together.",
                i
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let document = sample_document();
    c.bench_function("chunking", |b| {
        b.iter(|| chunk_document(black_box(&document)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
