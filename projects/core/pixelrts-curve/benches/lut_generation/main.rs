use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pixelrts_curve::{HilbertCurve, LutBackend, LutGenerator};
use std::hint::black_box;

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Hilbert LUT Generation");

    for order in [6u32, 8, 10] {
        let cells = 1u64 << (2 * order);
        group.throughput(Throughput::Elements(cells));

        for backend in [LutBackend::Scalar, LutBackend::Parallel] {
            let mut generator = LutGenerator::with_backend(backend);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", generator.backend()), order),
                &order,
                |b, &order| b.iter(|| generator.generate(black_box(order)).unwrap()),
            );
        }

        let curve = HilbertCurve::new(order).unwrap();
        group.bench_with_input(BenchmarkId::new("direct", order), &curve, |b, curve| {
            b.iter(|| curve.coords().fold(0u64, |acc, c| acc + u64::from(c.x ^ c.y)))
        });
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
