use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pixelrts_api::{Decoder, Encoder, UserMetadata};
use std::hint::black_box;

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Dense Encode/Decode");
    let user = UserMetadata::default();

    for size in [4 * 1024usize, 256 * 1024, 1024 * 1024] {
        let data: Vec<u8> = (0..size).map(|i| (i * 7 % 251) as u8).collect();
        group.throughput(Throughput::Bytes(size as u64));

        let encoder = Encoder::new();
        group.bench_with_input(BenchmarkId::new("encode", size), &data, |b, data| {
            b.iter(|| encoder.encode(black_box(data), &user).unwrap())
        });

        let container = encoder.encode(&data, &user).unwrap();
        let decoder = Decoder::builder().verify_hash(false).build();
        group.bench_with_input(BenchmarkId::new("decode", size), &container, |b, container| {
            b.iter(|| decoder.decode(black_box(container)).unwrap())
        });

        let png = container.to_png_bytes().unwrap();
        group.bench_with_input(BenchmarkId::new("decode_png", size), &png, |b, png| {
            b.iter(|| decoder.decode_png(black_box(png)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
