//! 3MF packaging of a source mesh with its region documents.

use std::path::Path;

use mesh_io::{
    decode, IoError, ModelGeometry, NamedMesh, ThreeMfPackage, COLOR_ASSIGNMENT_PATH,
    PAINTING_INSTRUCTIONS_PATH, REGION_RECORDS_PATH,
};
use mesh_region::{
    classify_mesh, emit_records, partition_with, ClassifyConfig, ColorAssignment,
    PaintingInstructions, RegionError, RuleTable,
};
use mesh_types::VertexColor;
use tracing::info;

use crate::error::SplitResult;
use crate::pipeline::base_name;

/// How the source geometry is carried in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackMode {
    /// The decoded mesh as model XML.
    #[default]
    Mesh,
    /// The original STL bytes stored verbatim beside a placeholder object.
    Reference,
    /// One named, colored object per populated region.
    Parts,
}

/// Color assignment for every region of a table, populated or not.
#[must_use]
pub fn assignment_for(input: &Path, table: &RuleTable) -> ColorAssignment {
    ColorAssignment::from_regions(file_name(input), table.regions())
}

fn file_name(input: &Path) -> String {
    input
        .file_name()
        .map_or_else(|| input.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn read_input(input: &Path) -> SplitResult<Vec<u8>> {
    std::fs::read(input).map_err(|e| {
        let error = if e.kind() == std::io::ErrorKind::NotFound {
            IoError::FileNotFound {
                path: input.to_path_buf(),
            }
        } else {
            IoError::Io(e)
        };
        error.into()
    })
}

/// Build a 3MF archive for a binary STL file.
///
/// The mesh is classified with `table` in every mode. The archive carries
/// the metadata records of populated regions at `metadata/regions.json`,
/// the color assignment built from them, and painting instructions.
///
/// # Errors
///
/// Returns decode errors, [`RegionError::EmptyMesh`] for an input without
/// triangles, and archive errors.
pub fn package_file(
    input: &Path,
    table: &RuleTable,
    mode: PackMode,
    config: &ClassifyConfig,
) -> SplitResult<Vec<u8>> {
    let bytes = read_input(input)?;
    let mesh = decode(&bytes)?;
    if mesh.faces.is_empty() {
        return Err(RegionError::EmptyMesh.into());
    }

    let name = base_name(input);
    let classification = classify_mesh(&mesh, table, config)?;
    let records = emit_records(
        &classification.counts(),
        mesh.faces.len(),
        table.regions(),
        &name,
    );
    let assignment = ColorAssignment::from_records(file_name(input), &records);
    let painting = PaintingInstructions::from_assignment(&assignment);

    let partition = match mode {
        PackMode::Parts => Some(partition_with(&mesh, &classification, config)?),
        PackMode::Mesh | PackMode::Reference => None,
    };
    let geometry = match (&partition, mode) {
        (Some(partition), _) => ModelGeometry::Objects(
            partition
                .parts
                .iter()
                .zip(&records)
                .map(|(part, record)| NamedMesh {
                    name: record.region.clone(),
                    mesh: &part.mesh,
                    color: VertexColor::from_hex(&record.hex).ok(),
                })
                .collect(),
        ),
        (None, PackMode::Reference) => ModelGeometry::stl_reference(name.clone(), &bytes),
        (None, _) => ModelGeometry::mesh(name.clone(), &mesh),
    };

    let archive = ThreeMfPackage::new(geometry)
        .with_title(name)
        .with_designer(concat!("mesh-split ", env!("CARGO_PKG_VERSION")))
        .with_json(REGION_RECORDS_PATH, &records)?
        .with_json(COLOR_ASSIGNMENT_PATH, &assignment)?
        .with_json(PAINTING_INSTRUCTIONS_PATH, &painting)?
        .to_bytes()?;
    info!(
        path = %input.display(),
        mode = ?mode,
        regions = records.len(),
        bytes = archive.len(),
        "built 3MF package"
    );
    Ok(archive)
}
