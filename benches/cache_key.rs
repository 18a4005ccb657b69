//! Benchmarks for the cache hot path
//!
//! This benchmark measures:
//! - Key derivation for short and long prompts
//! - Payload encode/decode
//! - A full cache-hit lookup through the client

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use completion_cache::cache::{decode_payload, derive_key, encode_payload, CacheStore, MemoryStore};
use completion_cache::drivers::NoopBackend;
use completion_cache::{CancellationToken, CompletionClient};
use std::sync::Arc;

fn prompt_fragments(words: usize) -> Vec<String> {
    (0..words).map(|i| format!("fragment-{}", i)).collect()
}

fn bench_key_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_derivation");

    for words in [2usize, 64, 2048] {
        let fragments = prompt_fragments(words);
        group.bench_with_input(BenchmarkId::new("derive_key", words), &fragments, |b, f| {
            b.iter(|| derive_key(black_box("openai"), black_box("english"), black_box(f.as_slice())))
        });
    }

    group.finish();
}

fn bench_payload_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload_codec");

    let text = "Error: container OOMKilled.\nSolution: 1. raise memory limits 2. redeploy. ".repeat(40);
    let encoded = encode_payload(&text);
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("encode", |b| b.iter(|| encode_payload(black_box(&text))));
    group.bench_function("decode", |b| b.iter(|| decode_payload(black_box(&encoded)).unwrap()));

    group.finish();
}

fn bench_cache_hit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = Arc::new(MemoryStore::default());
    let client = CompletionClient::new(Arc::new(NoopBackend::new()), store.clone(), "english");
    let fragments = ["pod", "crashloopbackoff"];
    rt.block_on(async {
        store
            .store(&client.cache_key(&fragments), &encode_payload("Increase memory limits."))
            .await
            .unwrap();
    });
    let cancel = CancellationToken::new();

    c.bench_function("complete_cache_hit", |b| {
        b.to_async(&rt)
            .iter(|| async { client.complete(&cancel, black_box(&fragments)).await.unwrap() })
    });
}

criterion_group!(benches, bench_key_derivation, bench_payload_codec, bench_cache_hit);
criterion_main!(benches);
