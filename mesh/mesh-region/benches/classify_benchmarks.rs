//! Benchmarks for region classification and partitioning.
//!
//! Run with: cargo bench -p mesh-region
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p mesh-region -- --save-baseline main
//! 2. After changes: cargo bench -p mesh-region -- --baseline main

#![allow(missing_docs, clippy::unwrap_used, clippy::cast_precision_loss)]

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use mesh_region::{classify_mesh, label_components, partition, ClassifyConfig, Preset};
use mesh_types::IndexedMesh;

/// A cylinder-like column of `rings x segments` quads, standing on z.
fn create_column(rings: u32, segments: u32) -> IndexedMesh {
    let mut positions = Vec::with_capacity(((rings + 1) * segments * 3) as usize);
    for r in 0..=rings {
        let z = f64::from(r);
        for s in 0..segments {
            let angle = std::f64::consts::TAU * f64::from(s) / f64::from(segments);
            positions.extend_from_slice(&[angle.cos() * 20.0, angle.sin() * 20.0, z]);
        }
    }

    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);
    for r in 0..rings {
        for s in 0..segments {
            let a = r * segments + s;
            let b = r * segments + (s + 1) % segments;
            let c = a + segments;
            let d = b + segments;
            indices.extend_from_slice(&[a, b, d, a, d, c]);
        }
    }

    IndexedMesh::from_raw(&positions, &indices)
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("Classify");

    let column = create_column(250, 200); // 100k triangles
    group.throughput(Throughput::Elements(column.faces.len() as u64));

    for preset in Preset::ALL {
        let table = preset.table();

        group.bench_function(format!("{preset}_parallel"), |b| {
            b.iter(|| classify_mesh(black_box(&column), &table, &ClassifyConfig::default()));
        });

        group.bench_function(format!("{preset}_sequential"), |b| {
            b.iter(|| classify_mesh(black_box(&column), &table, &ClassifyConfig::sequential()));
        });
    }

    group.finish();
}

fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("Partition");

    let column = create_column(250, 200);
    let table = Preset::Fine.table();
    let classes = classify_mesh(&column, &table, &ClassifyConfig::default()).unwrap();
    group.throughput(Throughput::Elements(column.faces.len() as u64));

    group.bench_function("fine", |b| {
        b.iter(|| partition(black_box(&column), &classes));
    });

    group.bench_function("components", |b| {
        b.iter(|| label_components(black_box(&column)));
    });

    group.finish();
}

criterion_group!(benches, bench_classify, bench_partition);
criterion_main!(benches);
