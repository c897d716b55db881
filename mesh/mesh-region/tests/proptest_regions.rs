//! Property-based tests for classification and partitioning.
//!
//! These tests generate random meshes and check coverage, conservation,
//! and determinism across every built-in rule table.
//!
//! Run with: cargo test -p mesh-region -- proptest

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::cast_possible_truncation)]

use hashbrown::HashSet;
use mesh_region::{
    classify_mesh, emit, partition, partition_with, ClassifyConfig, Preset, RuleTable,
};
use mesh_types::{IndexedMesh, MeshTopology, Vertex};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_vertex() -> impl Strategy<Value = Vertex> {
    prop::array::uniform3(-100.0..100.0f64).prop_map(Vertex::from)
}

/// A mesh whose face indices are all valid.
fn arb_mesh(max_vertices: usize, max_faces: usize) -> impl Strategy<Value = IndexedMesh> {
    prop::collection::vec(arb_vertex(), 3..=max_vertices).prop_flat_map(move |vertices| {
        let n = vertices.len() as u32;
        prop::collection::vec(prop::array::uniform3(0..n), 0..=max_faces)
            .prop_map(move |faces| IndexedMesh::from_parts(vertices.clone(), faces))
    })
}

fn arb_table() -> impl Strategy<Value = RuleTable> {
    prop::sample::select(Preset::ALL.to_vec()).prop_map(Preset::table)
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_every_face_gets_a_valid_region(mesh in arb_mesh(40, 80), table in arb_table()) {
        let classes = classify_mesh(&mesh, &table, &ClassifyConfig::default()).unwrap();

        prop_assert_eq!(classes.len(), mesh.face_count());
        for &region in classes.assignments() {
            prop_assert!((region as usize) < table.region_count());
        }
    }

    #[test]
    fn proptest_partition_conserves_faces(mesh in arb_mesh(40, 80), table in arb_table()) {
        let classes = classify_mesh(&mesh, &table, &ClassifyConfig::default()).unwrap();
        let parts = partition(&mesh, &classes).unwrap();

        let total: usize = parts.parts.iter().map(|p| p.face_count()).sum();
        prop_assert_eq!(total, mesh.face_count());

        let mut seen = HashSet::new();
        for part in &parts.parts {
            prop_assert!(part.face_count() > 0);
            for &face in &part.source_faces {
                prop_assert!(seen.insert(face), "face {} in two regions", face);
                prop_assert_eq!(classes.region_of(face as usize), Some(part.region));
            }
        }
    }

    #[test]
    fn proptest_sub_meshes_are_compact_copies(mesh in arb_mesh(30, 60), table in arb_table()) {
        let classes = classify_mesh(&mesh, &table, &ClassifyConfig::default()).unwrap();
        let parts = partition(&mesh, &classes).unwrap();

        for part in &parts.parts {
            let sub = &part.mesh;
            prop_assert!(sub.first_invalid_index().is_none());

            // Every kept vertex is referenced
            let used: HashSet<u32> = sub.faces.iter().flatten().copied().collect();
            prop_assert_eq!(used.len(), sub.vertex_count());

            // Same triangles, same winding
            for (i, &source) in part.source_faces.iter().enumerate() {
                prop_assert_eq!(sub.triangle(i), mesh.triangle(source as usize));
            }
        }
    }

    #[test]
    fn proptest_parallel_matches_sequential(mesh in arb_mesh(40, 120), table in arb_table()) {
        let par = ClassifyConfig::default().with_parallel_threshold(0);
        let seq = ClassifyConfig::sequential();

        let a = classify_mesh(&mesh, &table, &par).unwrap();
        let b = classify_mesh(&mesh, &table, &seq).unwrap();
        prop_assert_eq!(&a, &b);

        prop_assert_eq!(
            partition_with(&mesh, &a, &par).unwrap(),
            partition_with(&mesh, &b, &seq).unwrap()
        );
    }

    #[test]
    fn proptest_face_order_does_not_change_regions(mesh in arb_mesh(30, 60), table in arb_table()) {
        let mut reversed = mesh.clone();
        reversed.faces.reverse();

        let config = ClassifyConfig::default();
        let forward = classify_mesh(&mesh, &table, &config).unwrap();
        let backward = classify_mesh(&reversed, &table, &config).unwrap();

        let n = mesh.face_count();
        for i in 0..n {
            prop_assert_eq!(forward.region_of(i), backward.region_of(n - 1 - i));
        }
    }

    #[test]
    fn proptest_percentages_sum_to_hundred(mesh in arb_mesh(30, 60), table in arb_table()) {
        prop_assume!(mesh.face_count() > 0);
        let classes = classify_mesh(&mesh, &table, &ClassifyConfig::default()).unwrap();
        let parts = partition(&mesh, &classes).unwrap();
        let records = emit(&parts, table.regions(), "m");

        let share: f64 = records.iter().map(|r| r.percentage).sum();
        prop_assert!((share - 100.0).abs() < 1e-9);
        prop_assert_eq!(records.len(), parts.len());
    }
}
