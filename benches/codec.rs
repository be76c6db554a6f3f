//! Benchmarks for the envelope codec
//!
//! This benchmark measures:
//! - Encoding values of growing size into request bodies
//! - Decoding response bodies back into values
//! - Cache definition rendering

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use infinispan_rest_client::client::build_definition;
use infinispan_rest_client::codec;
use infinispan_rest_client::config::CacheSettings;
use serde_json::{json, Value};

fn sample_value(entries: usize) -> Value {
    let items: Vec<Value> = (0..entries)
        .map(|i| {
            json!({
                "id": i,
                "name": format!("user-{}", i),
                "roles": ["reader", "writer"],
                "active": i % 2 == 0,
            })
        })
        .collect();
    json!({ "session": "abc123", "items": items })
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_encode");
    for entries in [1usize, 100, 1000] {
        let value = sample_value(entries);
        let size = serde_json::to_vec(&value).map(|v| v.len()).unwrap_or(0);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(entries), &value, |b, v| {
            b.iter(|| codec::encode_body(black_box(v)).unwrap())
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_decode");
    for entries in [1usize, 100, 1000] {
        let body = codec::encode_body(&sample_value(entries)).unwrap();
        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(entries), &body, |b, body| {
            b.iter(|| codec::decode_body(black_box(body)).unwrap())
        });
    }
    group.finish();
}

fn bench_definition(c: &mut Criterion) {
    let mut settings = CacheSettings::default();
    settings.persistence.enabled = true;
    settings.persistence.write_behind.enabled = true;

    c.bench_function("build_definition", |b| {
        b.iter(|| build_definition(black_box(&settings)))
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_definition);
criterion_main!(benches);
