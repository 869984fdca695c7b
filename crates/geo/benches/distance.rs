//! Benchmarks for distance calculations.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use findixi_geo::{calculate_distances, haversine_distance, Coordinate, DistancePoint};

fn bench_haversine(c: &mut Criterion) {
    let from = Coordinate::new(18.4655, -66.1057);
    let to = Coordinate::new(18.0111, -66.6140);

    c.bench_function("haversine_single", |b| {
        b.iter(|| haversine_distance(black_box(&from), black_box(&to)))
    });
}

fn bench_batch(c: &mut Criterion) {
    let reference = Coordinate::new(18.2341, -66.0485);
    let items: Vec<DistancePoint> = (0..1000)
        .map(|i| DistancePoint {
            id: i,
            location: Some(Coordinate::new(
                18.0 + (i as f64 % 100.0) * 0.005,
                -67.0 + (i as f64 % 100.0) * 0.01,
            )),
        })
        .collect();

    c.bench_function("batch_1000_listings", |b| {
        b.iter(|| calculate_distances(black_box(&reference), black_box(&items)))
    });
}

criterion_group!(benches, bench_haversine, bench_batch);
criterion_main!(benches);
