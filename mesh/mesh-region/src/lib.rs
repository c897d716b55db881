//! Rule-table region classification and partitioning for triangle meshes.
//!
//! This crate splits a mesh into color regions for multi-material printing.
//! Every triangle is assigned to a region by testing its centroid, normalized
//! to the mesh's bounding box, against an ordered [`RuleTable`]. The first
//! matching rule wins and a terminal `always` rule guarantees total coverage.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero engine dependencies**. It can be used in:
//! - CLI tools
//! - Servers
//! - Batch pipelines
//!
//! # Overview
//!
//! - [`Condition`] - Predicate over a normalized position (`z > 0.8 && y > 0.5`)
//! - [`RuleTable`] - Validated regions plus ordered rules, loadable from TOML
//! - [`Preset`] - Built-in rule tables (`coarse`, `fine`, `triangle`)
//! - [`compute_bounds`] - Normalizing bounding box, full or sampled
//! - [`classify_mesh`] - Parallel per-triangle classification
//! - [`partition`] - Compact per-region sub-meshes
//! - [`emit`] - Per-region [`MetadataRecord`]s for the output documents
//! - [`label_components`] - Connected bodies as an alternative to spatial rules
//!
//! # Quick Start
//!
//! ```
//! use mesh_region::{classify_mesh, emit, partition, ClassifyConfig, Preset};
//! use mesh_types::unit_cube;
//!
//! let mesh = unit_cube();
//! let table = Preset::Coarse.table();
//!
//! let classification = classify_mesh(&mesh, &table, &ClassifyConfig::default()).unwrap();
//! let parts = partition(&mesh, &classification).unwrap();
//!
//! for record in emit(&parts, table.regions(), "cube") {
//!     println!("{}: {} triangles ({:.1}%)", record.region, record.triangle_count, record.percentage);
//! }
//! ```
//!
//! # Custom Rule Tables
//!
//! ```
//! use mesh_region::RuleTable;
//!
//! let table = RuleTable::from_toml_str(r##"
//! [[region]]
//! id = "top"
//! hex = "#C8102E"
//! label = "Red"
//!
//! [[region]]
//! id = "body"
//! hex = "#5C5C5C"
//! label = "Dark Gray"
//!
//! [[rule]]
//! region = "top"
//! when = "z > 0.8"
//!
//! [[rule]]
//! region = "body"
//! when = "always"
//! "##).unwrap();
//!
//! assert_eq!(table.region_count(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bounds;
mod classify;
mod components;
mod condition;
mod error;
mod metadata;
mod partition;
mod presets;
mod rules;

pub use bounds::{compute_bounds, triangle_bounds, BoundsSampling};
pub use classify::{classify_mesh, Classification, ClassifyConfig};
pub use components::{component_regions, label_components};
pub use condition::{Axis, Cmp, Condition, ConditionParseError};
pub use error::{RegionError, RegionResult};
pub use metadata::{
    emit, emit_records, region_filename, ColorAssignment, ColorGroup, MetadataRecord,
    PaintRegion, PaintingInstructions, RegionMap,
};
pub use partition::{partition, partition_with, Partition, SubMesh};
pub use presets::Preset;
pub use rules::{load_palette, parse_palette, RegionSpec, Rule, RuleTable};

// Re-export for convenience
pub use mesh_types::{Aabb, IndexedMesh, Point3};
