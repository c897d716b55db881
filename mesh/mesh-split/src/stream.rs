//! Streaming split for inputs too large to hold in memory.
//!
//! Three passes over the file, one triangle at a time:
//!
//! 1. Bounding box from the first triangles (see [`BoundsSampling`]).
//! 2. Classify every triangle and count per region.
//! 3. Classify again and copy each raw 50-byte record into its region's
//!    writer. Counts are known by now, so headers are correct up front.
//!
//! Peak memory is one writer buffer per populated region.

use std::fs::File;
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};

use mesh_io::{create_stl, open_stl, IoError, StlReader, StlTriangle, StlWriter};
use mesh_region::{emit_records, Aabb, BoundsSampling, RegionError, RegionMap, RuleTable};
use tracing::{debug, info};

use crate::error::SplitResult;
use crate::pipeline::{
    prepare_output_dir, region_header, region_map_path, write_json, SplitOptions, SplitOutcome,
    WriteReport,
};

/// Bounding box of the first triangles a sampling policy selects.
///
/// # Errors
///
/// Returns read errors from the underlying stream.
pub fn sample_bounds<R: Read>(
    reader: &mut StlReader<R>,
    sampling: BoundsSampling,
) -> SplitResult<Aabb> {
    let n = sampling.sample_len(reader.remaining() as usize);
    let mut bounds = Aabb::empty();
    for _ in 0..n {
        let Some(triangle) = reader.read_triangle()? else {
            break;
        };
        for vertex in &triangle.triangle().vertices() {
            bounds.expand_to_include(vertex);
        }
    }
    Ok(bounds)
}

/// Count triangles per region without keeping them.
///
/// # Errors
///
/// Returns read errors from the underlying stream.
pub fn count_regions<R: Read>(
    reader: &mut StlReader<R>,
    table: &RuleTable,
    bounds: &Aabb,
) -> SplitResult<Vec<usize>> {
    let mut counts = vec![0usize; table.region_count()];
    while let Some(triangle) = reader.read_triangle()? {
        counts[table.classify(&triangle.centroid(), bounds) as usize] += 1;
    }
    Ok(counts)
}

struct RegionSink {
    region: String,
    path: PathBuf,
    state: SinkState,
}

enum SinkState {
    Open(StlWriter<BufWriter<File>>),
    Failed(IoError),
}

impl RegionSink {
    fn write(&mut self, record: &[u8; mesh_io::TRIANGLE_SIZE]) {
        if let SinkState::Open(writer) = &mut self.state {
            if let Err(error) = writer.write_raw(record) {
                self.state = SinkState::Failed(error);
            }
        }
    }

    fn finish(self) -> (String, PathBuf, Result<(), IoError>) {
        let result = match self.state {
            SinkState::Open(writer) => writer.finish().map(drop),
            SinkState::Failed(error) => Err(error),
        };
        (self.region, self.path, result)
    }
}

/// Split a binary STL file without decoding it into a mesh.
///
/// Bounds come from `options.classify.bounds`; use
/// [`ClassifyConfig::streaming`](mesh_region::ClassifyConfig::streaming) to
/// sample a prefix. Decode and parallel settings are ignored.
///
/// # Errors
///
/// Returns [`IoError::Truncated`] before any output exists if the file is
/// shorter than its header declares, [`RegionError::EmptyMesh`] for a file
/// with no triangles, and errors creating the output directory or writing
/// the region map. Region file failures are reported in
/// [`SplitOutcome::report`].
pub fn stream_split(
    input: &Path,
    table: &RuleTable,
    options: &SplitOptions,
) -> SplitResult<SplitOutcome> {
    let mut reader = open_stl(input)?;
    let total = reader.triangle_count() as usize;
    if total == 0 {
        return Err(RegionError::EmptyMesh.into());
    }
    info!(path = %input.display(), triangles = total, "streaming split");

    let bounds = sample_bounds(&mut reader, options.classify.bounds)?;
    debug!(min = ?bounds.min, max = ?bounds.max, "sampled bounds");

    let counts = count_regions(&mut open_stl(input)?, table, &bounds)?;

    let base = options.base_for(input);
    let records = emit_records(&counts, total, table.regions(), &base);
    for record in &records {
        info!(
            region = %record.region,
            triangles = record.triangle_count,
            percentage = format_args!("{:.1}", record.percentage),
            "region"
        );
    }

    prepare_output_dir(&options.output_dir)?;
    let report = copy_records(input, table, &bounds, &counts, &base, options)?;

    let region_map = RegionMap {
        original_file: input.display().to_string(),
        total_triangles: total,
        assignment_method: format!("{} (streaming)", table.name()),
        regions: records,
    };
    let region_map_path = if options.write_region_map {
        let path = region_map_path(&options.output_dir, &base);
        write_json(&path, &region_map)?;
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

fn copy_records(
    input: &Path,
    table: &RuleTable,
    bounds: &Aabb,
    counts: &[usize],
    base: &str,
    options: &SplitOptions,
) -> SplitResult<WriteReport> {
    let dir = &options.output_dir;
    let mut report = WriteReport::default();
    let mut sinks: Vec<Option<RegionSink>> = Vec::with_capacity(counts.len());

    for (spec, &count) in table.regions().iter().zip(counts) {
        if count == 0 {
            debug!(region = %spec.id, "no triangles assigned, skipping");
            sinks.push(None);
            continue;
        }
        let path = dir.join(mesh_region::region_filename(base, &spec.id));
        // Counts come from a u32 header, so each fits
        let declared = u32::try_from(count).unwrap_or(u32::MAX);
        match create_stl(
            &path,
            &region_header(&options.header_prefix, &spec.id),
            declared,
        ) {
            Ok(writer) => sinks.push(Some(RegionSink {
                region: spec.id.clone(),
                path,
                state: SinkState::Open(writer),
            })),
            Err(error) => {
                report.record(&spec.id, path, Err(error));
                sinks.push(None);
            }
        }
    }

    let mut reader = open_stl(input)?;
    while let Some(record) = reader.read_raw()? {
        let centroid = StlTriangle::from_bytes(&record).centroid();
        let region = table.classify(&centroid, bounds) as usize;
        if let Some(Some(sink)) = sinks.get_mut(region) {
            sink.write(&record);
        }
    }

    for sink in sinks.into_iter().flatten() {
        let (region, path, result) = sink.finish();
        report.record(&region, path, result);
    }
    Ok(report)
}
