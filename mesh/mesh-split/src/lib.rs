//! Split binary STL meshes into per-color region files.
//!
//! This crate ties the codec in [`mesh_io`] to the classifier in
//! [`mesh_region`]:
//!
//! - [`split_file`] loads a mesh, classifies every triangle with a rule
//!   table and writes one STL per populated region plus a region map
//! - [`stream_split`] does the same in three passes over the file without
//!   ever holding the mesh, for inputs with tens of millions of triangles
//! - [`split_components_file`] writes one STL per connected body
//! - [`package_file`] builds a 3MF archive with color documents
//! - [`inspect_mesh`] reports size and edge topology
//!
//! Region files are written concurrently. A region whose file cannot be
//! written is logged and listed in [`WriteReport::failed`]; its siblings
//! are still written.
//!
//! # Example
//!
//! ```no_run
//! use mesh_region::Preset;
//! use mesh_split::{split_file, SplitOptions};
//! use std::path::Path;
//!
//! let table = Preset::Fine.table();
//! let options = SplitOptions::new("out");
//! let outcome = split_file(Path::new("robot.stl"), &table, &options).unwrap();
//!
//! for record in &outcome.region_map.regions {
//!     println!("{}: {} triangles", record.filename, record.triangle_count);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod inspect;
mod package;
mod pipeline;
mod stream;

pub use error::{SplitError, SplitResult};
pub use inspect::{inspect_file, inspect_mesh, MeshReport, DEGENERATE_AREA};
pub use package::{assignment_for, package_file, PackMode};
pub use pipeline::{
    base_name, plan_components, plan_split, region_header, region_map_path, split_components_file,
    split_file, write_json, write_regions, FailedWrite, SplitOptions, SplitOutcome, SplitPlan,
    WriteReport, DEFAULT_HEADER_PREFIX,
};
pub use stream::{count_regions, sample_bounds, stream_split};
