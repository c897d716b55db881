//! Benchmarks for the STL codec.
//!
//! Run with: cargo bench -p mesh-io
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p mesh-io -- --save-baseline main
//! 2. After changes: cargo bench -p mesh-io -- --baseline main

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::cast_precision_loss)]

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use mesh_io::{decode_with, encode, StlReader, VertexMode};
use mesh_types::IndexedMesh;

/// A wavy `n x n` height field, two triangles per cell.
fn create_terrain(n: u32) -> IndexedMesh {
    let mut positions = Vec::with_capacity(((n + 1) * (n + 1) * 3) as usize);
    for j in 0..=n {
        for i in 0..=n {
            let (x, y) = (f64::from(i), f64::from(j));
            positions.extend_from_slice(&[x, y, (x * 0.3).sin() * (y * 0.2).cos()]);
        }
    }

    let mut indices = Vec::with_capacity((n * n * 6) as usize);
    let row = n + 1;
    for j in 0..n {
        for i in 0..n {
            let a = j * row + i;
            indices.extend_from_slice(&[a, a + 1, a + row + 1, a, a + row + 1, a + row]);
        }
    }

    IndexedMesh::from_raw(&positions, &indices)
}

fn bench_stl(c: &mut Criterion) {
    let mut group = c.benchmark_group("STL");

    let terrain = create_terrain(100); // 20k triangles
    let bytes = encode(&terrain, "bench").expect("encode terrain");

    group.throughput(Throughput::Elements(terrain.faces.len() as u64));

    group.bench_function("encode", |b| {
        b.iter(|| encode(black_box(&terrain), "bench"));
    });

    group.bench_function("decode_merged", |b| {
        b.iter(|| decode_with(black_box(&bytes), VertexMode::Merged));
    });

    group.bench_function("decode_soup", |b| {
        b.iter(|| decode_with(black_box(&bytes), VertexMode::Soup));
    });

    group.bench_function("stream_centroids", |b| {
        b.iter(|| {
            let reader = StlReader::new(black_box(bytes.as_slice())).unwrap();
            reader
                .filter_map(Result::ok)
                .map(|t| t.centroid().z)
                .sum::<f64>()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_stl);
criterion_main!(benches);
