//! Per-region metadata documents.
//!
//! After partitioning, each populated region is described by a
//! [`MetadataRecord`]. Records feed three JSON documents:
//!
//! - [`RegionMap`] - written beside the split files
//! - [`ColorAssignment`] - part number to filament mapping for slicers
//! - [`PaintingInstructions`] - a manual painting guide bundled into 3MF archives

use serde::{Deserialize, Serialize};

use crate::partition::Partition;
use crate::rules::RegionSpec;

/// Description of one populated region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Region id.
    pub region: String,
    /// Name of the file holding the region's triangles.
    pub filename: String,
    /// Triangles assigned to the region.
    pub triangle_count: usize,
    /// Share of the source mesh's triangles, in percent.
    pub percentage: f64,
    /// Display color as `#RRGGBB`.
    pub hex: String,
    /// Material or color name.
    pub label: String,
    /// Usage note.
    #[serde(rename = "use")]
    pub usage: String,
}

/// Output filename for a region: `<base>_<id>.stl`.
///
/// Characters other than ASCII alphanumerics, `-`, and `_` become `_`.
///
/// # Example
///
/// ```
/// use mesh_region::region_filename;
///
/// assert_eq!(region_filename("robot", "chest_body"), "robot_chest_body.stl");
/// assert_eq!(region_filename("robot", "left arm/2"), "robot_left_arm_2.stl");
/// ```
#[must_use]
pub fn region_filename(base: &str, id: &str) -> String {
    format!("{base}_{}.stl", filename_stem(id))
}

/// Filesystem-safe form of a region id.
pub(crate) fn filename_stem(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Build records from per-region triangle counts.
///
/// `counts` is indexed like `regions`. Regions with no triangles are
/// skipped; the rest appear in declaration order. Percentages are
/// relative to `total`, which may exceed the sum of `counts`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn emit_records(
    counts: &[usize],
    total: usize,
    regions: &[RegionSpec],
    base: &str,
) -> Vec<MetadataRecord> {
    regions
        .iter()
        .zip(counts)
        .filter(|(_, &count)| count > 0)
        .map(|(spec, &count)| MetadataRecord {
            region: spec.id.clone(),
            filename: region_filename(base, &spec.id),
            triangle_count: count,
            percentage: if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            },
            hex: spec.hex.clone(),
            label: spec.label.clone(),
            usage: spec.usage.clone(),
        })
        .collect()
}

/// Build records for every populated region of a partition.
///
/// # Example
///
/// ```
/// use mesh_region::{classify_mesh, emit, partition, ClassifyConfig, Preset};
/// use mesh_types::unit_cube;
///
/// let cube = unit_cube();
/// let table = Preset::Coarse.table();
/// let classes = classify_mesh(&cube, &table, &ClassifyConfig::default()).unwrap();
/// let parts = partition(&cube, &classes).unwrap();
///
/// let records = emit(&parts, table.regions(), "cube");
/// let share: f64 = records.iter().map(|r| r.percentage).sum();
/// assert!((share - 100.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn emit(partition: &Partition, regions: &[RegionSpec], base: &str) -> Vec<MetadataRecord> {
    let mut counts = vec![0; regions.len()];
    for (region, count) in partition.counts() {
        if let Some(slot) = counts.get_mut(region as usize) {
            *slot = count;
        }
    }
    emit_records(&counts, partition.total_faces, regions, base)
}

/// Summary written beside the split files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMap {
    /// Path of the source mesh as given.
    pub original_file: String,
    /// Triangles in the source mesh.
    pub total_triangles: usize,
    /// Rule table or method that produced the assignment.
    pub assignment_method: String,
    /// Populated regions in rule-table order.
    pub regions: Vec<MetadataRecord>,
}

/// One numbered part of a color assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorGroup {
    /// 1-based part number.
    pub part: usize,
    /// Material or color name.
    pub material: String,
    /// Display color as `#RRGGBB`.
    pub hex: String,
    /// Usage note.
    #[serde(rename = "use")]
    pub usage: String,
}

/// Part-to-color mapping consumed by slicers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorAssignment {
    /// Model filename the assignment belongs to.
    pub model: String,
    /// Parts in order, numbered from 1.
    pub groups: Vec<ColorGroup>,
}

impl ColorAssignment {
    /// Number parts in record order.
    #[must_use]
    pub fn from_records(model: impl Into<String>, records: &[MetadataRecord]) -> Self {
        Self {
            model: model.into(),
            groups: records
                .iter()
                .enumerate()
                .map(|(i, r)| ColorGroup {
                    part: i + 1,
                    material: r.label.clone(),
                    hex: r.hex.clone(),
                    usage: r.usage.clone(),
                })
                .collect(),
        }
    }

    /// Number every declared region, populated or not.
    #[must_use]
    pub fn from_regions(model: impl Into<String>, regions: &[RegionSpec]) -> Self {
        Self {
            model: model.into(),
            groups: regions
                .iter()
                .enumerate()
                .map(|(i, r)| ColorGroup {
                    part: i + 1,
                    material: r.label.clone(),
                    hex: r.hex.clone(),
                    usage: r.usage.clone(),
                })
                .collect(),
        }
    }
}

/// One entry of a painting guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaintRegion {
    /// Part name, e.g. `Part 3`.
    pub region: String,
    /// Material or color name.
    pub color: String,
    /// Display color as `#RRGGBB`.
    pub hex: String,
    /// What to paint.
    pub areas: String,
}

/// Step-by-step guide for painting a single-body model by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaintingInstructions {
    /// Guide title.
    pub title: String,
    /// Ordered steps.
    pub instructions: Vec<String>,
    /// One entry per part.
    pub color_regions: Vec<PaintRegion>,
}

impl PaintingInstructions {
    /// Guide for an assignment.
    #[must_use]
    pub fn from_assignment(assignment: &ColorAssignment) -> Self {
        Self {
            title: "Manual Painting Guide".to_string(),
            instructions: vec![
                "1. Open this 3MF file in your slicer".to_string(),
                "2. Select the model and open the color painting tool".to_string(),
                "3. Paint each region below with its filament:".to_string(),
            ],
            color_regions: assignment
                .groups
                .iter()
                .map(|g| PaintRegion {
                    region: format!("Part {}", g.part),
                    color: g.material.clone(),
                    hex: g.hex.clone(),
                    areas: g.usage.clone(),
                })
                .collect(),
        }
    }
}
