//! End-to-end tests of the file pipeline.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use mesh_io::{encode, load_stl, open_stl, save_stl, IoError};
use mesh_region::{ClassifyConfig, Preset, RegionMap};
use mesh_split::{split_components_file, split_file, stream_split, SplitError, SplitOptions};
use mesh_types::{unit_cube, IndexedMesh, MeshTopology};

/// A unit cube stacked on a taller box, as one file.
fn figure() -> IndexedMesh {
    let mut body = unit_cube();
    for v in &mut body.vertices {
        v.position.z *= 4.0;
        v.position.x *= 2.0;
    }
    let mut head = unit_cube();
    for v in &mut head.vertices {
        v.position.x += 0.5;
        v.position.z += 4.5;
    }
    body.merge(&head);
    body
}

fn write_input(dir: &Path, mesh: &IndexedMesh) -> PathBuf {
    let path = dir.join("figure.stl");
    save_stl(mesh, &path, "figure").unwrap();
    path
}

fn sorted_centroids(mesh: &IndexedMesh) -> Vec<[f64; 3]> {
    let mut centroids: Vec<[f64; 3]> = mesh
        .triangles()
        .map(|t| {
            let c = t.centroid();
            [c.x, c.y, c.z]
        })
        .collect();
    centroids.sort_by(|p, q| {
        p.iter()
            .zip(q)
            .fold(std::cmp::Ordering::Equal, |o, (a, b)| o.then(a.total_cmp(b)))
    });
    centroids
}

fn read_map(path: &Path) -> RegionMap {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[test]
fn split_writes_one_file_per_region() {
    let dir = tempfile::tempdir().unwrap();
    let mesh = figure();
    let input = write_input(dir.path(), &mesh);
    let out = dir.path().join("out");

    let table = Preset::Fine.table();
    let outcome = split_file(&input, &table, &SplitOptions::new(&out)).unwrap();

    assert!(outcome.report.is_complete());
    assert_eq!(outcome.report.written.len(), outcome.region_map.regions.len());
    assert_eq!(outcome.region_map.total_triangles, mesh.face_count());

    let mut total = 0;
    for record in &outcome.region_map.regions {
        let path = out.join(&record.filename);
        let reader = open_stl(&path).unwrap();
        assert_eq!(reader.header().label(), format!("Region: {}", record.region));
        assert_eq!(reader.triangle_count() as usize, record.triangle_count);
        total += record.triangle_count;
    }
    assert_eq!(total, mesh.face_count());

    let map = read_map(&out.join("figure_region_map.json"));
    assert_eq!(map, outcome.region_map);
    let share: f64 = map.regions.iter().map(|r| r.percentage).sum();
    assert_relative_eq!(share, 100.0, epsilon = 1e-9);
}

#[test]
fn streaming_matches_in_memory_split() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &figure());
    let table = Preset::Triangle.table();

    let loaded = split_file(&input, &table, &SplitOptions::new(dir.path().join("a"))).unwrap();
    let streamed = stream_split(&input, &table, &SplitOptions::new(dir.path().join("b"))).unwrap();

    assert_eq!(loaded.region_map.regions, streamed.region_map.regions);
    for record in &loaded.region_map.regions {
        let a = load_stl(dir.path().join("a").join(&record.filename)).unwrap();
        let b = load_stl(dir.path().join("b").join(&record.filename)).unwrap();
        assert_eq!(a.faces.len(), b.faces.len());
        assert_eq!(sorted_centroids(&a), sorted_centroids(&b));
    }
}

#[test]
fn streaming_copies_records_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &unit_cube());
    let out = dir.path().join("out");

    // One region takes everything, so the single output is the input with a new header
    let table = mesh_region::RuleTable::from_toml_str(
        r##"
        [[region]]
        id = "all"
        hex = "#FFFFFF"
        label = "White"

        [[rule]]
        region = "all"
        when = "always"
        "##,
    )
    .unwrap();
    let outcome = stream_split(&input, &table, &SplitOptions::new(&out)).unwrap();
    assert_eq!(outcome.report.written.len(), 1);

    let original = std::fs::read(&input).unwrap();
    let copied = std::fs::read(&outcome.report.written[0]).unwrap();
    assert_eq!(original.len(), copied.len());
    assert_eq!(original[80..], copied[80..]);
}

#[test]
fn ids_sharing_a_filename_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("slash.toml");
    std::fs::write(
        &rules,
        r##"
        [[region]]
        id = "a/b"
        hex = "#000000"
        label = "Black"

        [[region]]
        id = "a_b"
        hex = "#FFFFFF"
        label = "White"

        [[rule]]
        region = "a/b"
        when = "z > 0.5"

        [[rule]]
        region = "a_b"
        when = "always"
        "##,
    )
    .unwrap();

    let err = mesh_region::RuleTable::load(&rules).unwrap_err();
    assert!(err.is_config_error());
    assert!(matches!(
        err,
        mesh_region::RegionError::FilenameCollision { .. }
    ));
}

#[test]
fn truncated_input_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = encode(&unit_cube(), "cube").unwrap();
    bytes.truncate(bytes.len() - 10);
    let input = dir.path().join("broken.stl");
    std::fs::write(&input, &bytes).unwrap();
    let out = dir.path().join("out");

    let table = Preset::Coarse.table();
    for result in [
        split_file(&input, &table, &SplitOptions::new(&out)),
        stream_split(&input, &table, &SplitOptions::new(&out)),
    ] {
        let err = result.unwrap_err();
        assert!(matches!(err, SplitError::Mesh(IoError::Truncated { .. })));
    }
    assert!(!out.exists());
}

#[test]
fn empty_input_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &IndexedMesh::new());
    let out = dir.path().join("out");
    let table = Preset::Coarse.table();

    assert!(split_file(&input, &table, &SplitOptions::new(&out))
        .unwrap_err()
        .is_empty_mesh());
    assert!(stream_split(&input, &table, &SplitOptions::new(&out))
        .unwrap_err()
        .is_empty_mesh());
    assert!(!out.exists());
}

#[test]
fn failed_region_does_not_stop_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &figure());
    let out = dir.path().join("out");
    let table = Preset::Coarse.table();

    let first = split_file(&input, &table, &SplitOptions::new(&out)).unwrap();
    assert!(first.region_map.regions.len() > 1);
    let blocked = &first.region_map.regions[0];
    let blocked_path = out.join(&blocked.filename);
    std::fs::remove_file(&blocked_path).unwrap();
    std::fs::create_dir(&blocked_path).unwrap();

    for outcome in [
        split_file(&input, &table, &SplitOptions::new(&out)).unwrap(),
        stream_split(&input, &table, &SplitOptions::new(&out)).unwrap(),
    ] {
        assert_eq!(outcome.report.failed.len(), 1);
        assert_eq!(outcome.report.failed[0].region, blocked.region);
        assert_eq!(
            outcome.report.written.len(),
            first.region_map.regions.len() - 1
        );
        // The map still describes every populated region
        assert_eq!(outcome.region_map.regions, first.region_map.regions);
    }
}

#[test]
fn components_split_separates_bodies() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &figure());
    let out = dir.path().join("out");

    let palette = Preset::Coarse.table();
    let options = SplitOptions::new(&out).with_base_name("fig");
    let outcome = split_components_file(&input, palette.regions(), &options).unwrap();

    assert_eq!(outcome.region_map.assignment_method, "connected_components");
    let names: Vec<_> = outcome
        .region_map
        .regions
        .iter()
        .map(|r| r.filename.as_str())
        .collect();
    assert_eq!(names, ["fig_01_limbs.stl", "fig_02_helmet.stl"]);
    for record in &outcome.region_map.regions {
        assert_eq!(record.triangle_count, 12);
        assert_eq!(load_stl(out.join(&record.filename)).unwrap().vertex_count(), 8);
    }
}

#[test]
fn options_control_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &figure());
    let out = dir.path().join("out");

    let options = SplitOptions::new(&out)
        .with_base_name("robot")
        .with_classify(ClassifyConfig::sequential())
        .with_header_prefix("robot part ")
        .without_region_map();
    let outcome = split_file(&input, &Preset::Coarse.table(), &options).unwrap();

    assert!(outcome.region_map_path.is_none());
    assert!(!out.join("robot_region_map.json").exists());
    assert!(outcome
        .region_map
        .regions
        .iter()
        .all(|r| r.filename.starts_with("robot_")));

    let first = &outcome.region_map.regions[0];
    let reader = open_stl(out.join(&first.filename)).unwrap();
    assert_eq!(reader.header().label(), format!("robot part {}", first.region));
}
