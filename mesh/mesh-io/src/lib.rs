//! Mesh codec and archive packaging.
//!
//! This crate moves triangle meshes in and out of bytes:
//!
//! - **Binary STL** - whole-mesh [`decode`]/[`encode`] plus the streaming
//!   [`StlReader`]/[`StlWriter`] pair for inputs too large to hold in memory
//! - **3MF** - [`ThreeMfPackage`] builds a ZIP archive around mesh XML, a
//!   verbatim STL reference, or one object per sub-mesh, with JSON metadata
//!   attachments; [`read_model`] parses it back for verification
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero engine dependencies**. It can be used in:
//! - CLI tools
//! - Servers
//! - Batch pipelines
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::{load_stl, save_stl};
//!
//! // Load a mesh
//! let mesh = load_stl("model.stl").unwrap();
//!
//! // Save it back
//! save_stl(&mesh, "output.stl", "copy of model.stl").unwrap();
//! ```
//!
//! # Streaming
//!
//! ```no_run
//! use mesh_io::{create_stl, open_stl};
//!
//! let mut reader = open_stl("huge.stl").unwrap();
//! let mut writer = create_stl("copy.stl", "copy", reader.triangle_count()).unwrap();
//! while let Some(record) = reader.read_raw().unwrap() {
//!     writer.write_raw(&record).unwrap();
//! }
//! writer.finish().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod stl;
mod threemf;

pub use error::{IoError, IoResult};
pub use stl::{
    create_stl, decode, decode_with, encode, encoded_len, header_bytes, load_stl, load_stl_with,
    open_stl, read_mesh, save_stl, write_mesh, MeshBuilder, StlHeader, StlReader, StlTriangle,
    StlWriter, VertexMode, DEFAULT_HEADER, HEADER_SIZE, PREAMBLE_SIZE, TRIANGLE_SIZE,
};
pub use threemf::{
    entry_names, load_3mf, pack, read_entry, read_model, ModelGeometry, ModelObject, NamedMesh,
    ThreeMfPackage, COLOR_ASSIGNMENT_PATH, MODEL_PATH, PAINTING_INSTRUCTIONS_PATH,
    REGION_RECORDS_PATH,
};
