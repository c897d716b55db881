//! In-memory split pipeline.
//!
//! Load a mesh, classify and partition it, then write one binary STL per
//! populated region plus a region map document. Region files are written
//! concurrently; a failure writing one region is logged and reported while
//! the others are still written.

use std::path::{Path, PathBuf};

use mesh_io::{load_stl_with, save_stl, IoError, VertexMode};
use mesh_region::{
    classify_mesh, component_regions, emit, label_components, partition_with, Classification,
    ClassifyConfig, MetadataRecord, Partition, RegionError, RegionMap, RegionSpec, RuleTable,
};
use mesh_types::IndexedMesh;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{SplitError, SplitResult};

/// Prefix of the header text written into each region file.
pub const DEFAULT_HEADER_PREFIX: &str = "Region: ";

/// Header text for a region file, truncated to 80 bytes on write.
#[must_use]
pub fn region_header(prefix: &str, id: &str) -> String {
    format!("{prefix}{id}")
}

/// File stem used to name outputs, `"mesh"` when the path has none.
#[must_use]
pub fn base_name(input: &Path) -> String {
    input
        .file_stem()
        .map_or_else(|| "mesh".to_string(), |s| s.to_string_lossy().into_owned())
}

/// Path of the region map written for `base`.
#[must_use]
pub fn region_map_path(dir: &Path, base: &str) -> PathBuf {
    dir.join(format!("{base}_region_map.json"))
}

/// Options for splitting a file.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Directory receiving region files and the region map.
    pub output_dir: PathBuf,
    /// Output name prefix; defaults to the input file stem.
    pub base_name: Option<String>,
    /// Classification settings.
    pub classify: ClassifyConfig,
    /// How decoded triangle corners become vertices.
    pub vertex_mode: VertexMode,
    /// Whether to write `<base>_region_map.json`.
    pub write_region_map: bool,
    /// Header text placed before the region id in each output file.
    pub header_prefix: String,
}

impl SplitOptions {
    /// Default options writing into `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            base_name: None,
            classify: ClassifyConfig::default(),
            vertex_mode: VertexMode::default(),
            write_region_map: true,
            header_prefix: DEFAULT_HEADER_PREFIX.to_string(),
        }
    }

    /// Override the output name prefix.
    #[must_use]
    pub fn with_base_name(mut self, base: impl Into<String>) -> Self {
        self.base_name = Some(base.into());
        self
    }

    /// Set classification settings.
    #[must_use]
    pub const fn with_classify(mut self, classify: ClassifyConfig) -> Self {
        self.classify = classify;
        self
    }

    /// Set the decode vertex mode.
    #[must_use]
    pub const fn with_vertex_mode(mut self, mode: VertexMode) -> Self {
        self.vertex_mode = mode;
        self
    }

    /// Skip writing the region map document.
    #[must_use]
    pub const fn without_region_map(mut self) -> Self {
        self.write_region_map = false;
        self
    }

    /// Set the header text written before each region id.
    #[must_use]
    pub fn with_header_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.header_prefix = prefix.into();
        self
    }

    pub(crate) fn base_for(&self, input: &Path) -> String {
        self.base_name.clone().unwrap_or_else(|| base_name(input))
    }
}

/// A classified and partitioned mesh, ready to write.
#[derive(Debug, Clone)]
pub struct SplitPlan {
    /// Region per source triangle.
    pub classification: Classification,
    /// Compact sub-meshes of populated regions.
    pub partition: Partition,
    /// One record per populated region, in region order.
    pub records: Vec<MetadataRecord>,
}

/// Classify and partition a mesh with a rule table.
///
/// # Errors
///
/// Returns [`RegionError::EmptyMesh`] for a mesh without triangles, or
/// any error from classification or partitioning.
pub fn plan_split(
    mesh: &IndexedMesh,
    table: &RuleTable,
    base: &str,
    config: &ClassifyConfig,
) -> SplitResult<SplitPlan> {
    if mesh.faces.is_empty() {
        return Err(RegionError::EmptyMesh.into());
    }
    let classification = classify_mesh(mesh, table, config)?;
    plan_from(mesh, classification, table.regions(), base, config)
}

/// Split a mesh into connected bodies named after a cycling palette.
///
/// Returns the plan and the generated region descriptions.
///
/// # Errors
///
/// Returns [`RegionError::EmptyMesh`] for a mesh without triangles.
pub fn plan_components(
    mesh: &IndexedMesh,
    palette: &[RegionSpec],
    base: &str,
    config: &ClassifyConfig,
) -> SplitResult<(SplitPlan, Vec<RegionSpec>)> {
    if mesh.faces.is_empty() {
        return Err(RegionError::EmptyMesh.into());
    }
    let classification = label_components(mesh)?;
    let regions = component_regions(classification.region_count(), palette);
    info!(components = regions.len(), "found separate parts");
    let plan = plan_from(mesh, classification, &regions, base, config)?;
    Ok((plan, regions))
}

fn plan_from(
    mesh: &IndexedMesh,
    classification: Classification,
    regions: &[RegionSpec],
    base: &str,
    config: &ClassifyConfig,
) -> SplitResult<SplitPlan> {
    let partition = partition_with(mesh, &classification, config)?;
    let records = emit(&partition, regions, base);

    for (region, count) in regions.iter().zip(classification.counts()) {
        if count == 0 {
            debug!(region = %region.id, "no triangles assigned, skipping");
        }
    }
    for record in &records {
        info!(
            region = %record.region,
            triangles = record.triangle_count,
            percentage = format_args!("{:.1}", record.percentage),
            color = %record.hex,
            "region"
        );
    }

    Ok(SplitPlan {
        classification,
        partition,
        records,
    })
}

/// A region file that could not be written.
#[derive(Debug)]
pub struct FailedWrite {
    /// Region id.
    pub region: String,
    /// Destination path.
    pub path: PathBuf,
    /// What went wrong.
    pub error: IoError,
}

/// Outcome of writing region files.
#[derive(Debug, Default)]
pub struct WriteReport {
    /// Files written, in region order.
    pub written: Vec<PathBuf>,
    /// Regions that were skipped because their file could not be written.
    pub failed: Vec<FailedWrite>,
}

impl WriteReport {
    /// Whether every region was written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub(crate) fn record(&mut self, region: &str, path: PathBuf, result: Result<(), IoError>) {
        match result {
            Ok(()) => {
                info!(path = %path.display(), "wrote region");
                self.written.push(path);
            }
            Err(error) => {
                warn!(region, path = %path.display(), %error, "failed to write region, skipping");
                self.failed.push(FailedWrite {
                    region: region.to_string(),
                    path,
                    error,
                });
            }
        }
    }
}

/// Write each populated region of a plan as a binary STL in `dir`.
///
/// Regions are written in parallel, each with the header
/// `<header_prefix><region id>`. Errors are collected per region.
#[must_use]
pub fn write_regions(plan: &SplitPlan, dir: &Path, header_prefix: &str) -> WriteReport {
    let results: Vec<(&MetadataRecord, PathBuf, Result<(), IoError>)> = plan
        .partition
        .parts
        .par_iter()
        .zip(plan.records.par_iter())
        .map(|(part, record)| {
            let path = dir.join(&record.filename);
            let result = save_stl(
                &part.mesh,
                &path,
                &region_header(header_prefix, &record.region),
            );
            (record, path, result)
        })
        .collect();

    let mut report = WriteReport::default();
    for (record, path, result) in results {
        report.record(&record.region, path, result);
    }
    report
}

/// Everything produced by splitting one file.
#[derive(Debug)]
pub struct SplitOutcome {
    /// Region map describing the written files.
    pub region_map: RegionMap,
    /// Where the region map was written, if it was.
    pub region_map_path: Option<PathBuf>,
    /// Per-region write results.
    pub report: WriteReport,
}

/// Split a binary STL file with a rule table.
///
/// # Errors
///
/// Returns format errors from decoding, [`RegionError::EmptyMesh`] for an
/// input without triangles, and errors creating the output directory or
/// writing the region map. Region file failures are reported in
/// [`SplitOutcome::report`].
pub fn split_file(
    input: &Path,
    table: &RuleTable,
    options: &SplitOptions,
) -> SplitResult<SplitOutcome> {
    let mesh = load_stl_with(input, options.vertex_mode)?;
    info!(
        path = %input.display(),
        triangles = mesh.faces.len(),
        vertices = mesh.vertices.len(),
        "loaded mesh"
    );

    let base = options.base_for(input);
    let plan = plan_split(&mesh, table, &base, &options.classify)?;
    finish(input, &plan, table.name(), options)
}

/// Split a binary STL file into its connected bodies.
///
/// # Errors
///
/// See [`split_file`].
pub fn split_components_file(
    input: &Path,
    palette: &[RegionSpec],
    options: &SplitOptions,
) -> SplitResult<SplitOutcome> {
    let mesh = load_stl_with(input, options.vertex_mode)?;
    info!(path = %input.display(), triangles = mesh.faces.len(), "loaded mesh");

    let base = options.base_for(input);
    let (plan, _) = plan_components(&mesh, palette, &base, &options.classify)?;
    finish(input, &plan, "connected_components", options)
}

fn finish(
    input: &Path,
    plan: &SplitPlan,
    method: &str,
    options: &SplitOptions,
) -> SplitResult<SplitOutcome> {
    prepare_output_dir(&options.output_dir)?;
    let report = write_regions(plan, &options.output_dir, &options.header_prefix);

    let region_map = RegionMap {
        original_file: input.display().to_string(),
        total_triangles: plan.partition.total_faces,
        assignment_method: method.to_string(),
        regions: plan.records.clone(),
    };
    let region_map_path = if options.write_region_map {
        let path = region_map_path(&options.output_dir, &options.base_for(input));
        write_json(&path, &region_map)?;
        info!(path = %path.display(), "wrote region map");
        Some(path)
    } else {
        None
    };

    Ok(SplitOutcome {
        region_map,
        region_map_path,
        report,
    })
}

pub(crate) fn prepare_output_dir(dir: &Path) -> SplitResult<()> {
    std::fs::create_dir_all(dir).map_err(|source| SplitError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Write a value as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`SplitError::Json`] if serialization fails or
/// [`SplitError::Metadata`] if the file cannot be written.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> SplitResult<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).map_err(|source| SplitError::Metadata {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mesh_region::Preset;
    use mesh_types::unit_cube;

    #[test]
    fn test_names() {
        assert_eq!(base_name(Path::new("/models/robot.stl")), "robot");
        assert_eq!(region_header(DEFAULT_HEADER_PREFIX, "helmet"), "Region: helmet");
        assert_eq!(
            region_map_path(Path::new("out"), "robot"),
            Path::new("out/robot_region_map.json")
        );
    }

    #[test]
    fn test_plan_rejects_empty_mesh() {
        let table = Preset::Coarse.table();
        let err = plan_split(&IndexedMesh::new(), &table, "m", &ClassifyConfig::default())
            .unwrap_err();
        assert!(err.is_empty_mesh());
    }

    #[test]
    fn test_plan_records_match_parts() {
        let table = Preset::Fine.table();
        let plan = plan_split(&unit_cube(), &table, "cube", &ClassifyConfig::default()).unwrap();

        assert_eq!(plan.records.len(), plan.partition.len());
        for (record, part) in plan.records.iter().zip(&plan.partition.parts) {
            assert_eq!(record.triangle_count, part.face_count());
            assert_eq!(table.region_index(&record.region), Some(part.region));
        }
    }

    #[test]
    fn test_write_report_keeps_going() {
        let dir = tempfile::tempdir().unwrap();
        let table = Preset::Coarse.table();
        let plan = plan_split(&unit_cube(), &table, "cube", &ClassifyConfig::default()).unwrap();

        // Block the first region's file with a directory of the same name
        std::fs::create_dir(dir.path().join(&plan.records[0].filename)).unwrap();

        let report = write_regions(&plan, dir.path(), DEFAULT_HEADER_PREFIX);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].region, plan.records[0].region);
        assert_eq!(report.written.len(), plan.records.len() - 1);
        assert!(!report.is_complete());
    }
}
