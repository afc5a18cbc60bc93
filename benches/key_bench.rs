use criterion::{criterion_group, criterion_main, Criterion};
use slicedb::{CompressionMethod, SliceBlob, SliceKey, SliceKind, SlicePlane};
use std::hint::black_box;

fn sample_key() -> SliceKey {
    SliceKey::builder()
        .counter(45_678)
        .unwrap()
        .group_id(12_345)
        .unwrap()
        .kind(SliceKind::Image)
        .plane(SlicePlane::Yz)
        .position(1_234)
        .unwrap()
        .sub_index(7)
        .unwrap()
        .build()
        .unwrap()
}

fn bench_key_encode(c: &mut Criterion) {
    c.bench_function("SliceKey::encode", |b| {
        let key = sample_key();
        b.iter(|| black_box(&key).encode())
    });
}

fn bench_key_decode(c: &mut Criterion) {
    c.bench_function("SliceKey::decode", |b| {
        let text = sample_key().encode();
        b.iter(|| SliceKey::decode(black_box(&text)).unwrap())
    });
}

fn bench_blob_encode(c: &mut Criterion) {
    c.bench_function("SliceBlob::encode 512x512 uncompressed", |b| {
        let blob = SliceBlob::from_bytes(512, 512, vec![128; 512 * 512]);
        b.iter(|| black_box(&blob).encode(CompressionMethod::None).unwrap())
    });
}

fn bench_blob_decode(c: &mut Criterion) {
    c.bench_function("SliceBlob::decode 512x512 zstd", |b| {
        let raw = SliceBlob::from_bytes(512, 512, vec![128; 512 * 512])
            .encode(CompressionMethod::Zstd)
            .unwrap();
        b.iter(|| SliceBlob::decode(black_box(&raw)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_key_encode,
    bench_key_decode,
    bench_blob_encode,
    bench_blob_decode,
);
criterion_main!(benches);
