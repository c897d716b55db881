//! Core mesh types for region painting.
//!
//! This crate provides the foundational types shared by the codec,
//! classifier and packager crates:
//!
//! - [`Vertex`] - A position in 3D space
//! - [`IndexedMesh`] - A triangle mesh with indexed vertices and optional face normals
//! - [`Triangle`] - A concrete triangle with vertex positions
//! - [`Aabb`] - Axis-aligned bounding box with degenerate-safe normalization
//! - [`VertexColor`] - 8-bit RGB color, parseable from `#RRGGBB`
//!
//! # Layer 0 Crate
//!
//! This crate has no I/O and no engine dependencies. It can be used in
//! CLI tools, servers, and WASM builds alike.
//!
//! # Units
//!
//! This library is **unit-agnostic**. All coordinates are `f64`.
//! Binary STL stores `f32`, so positions decoded from disk are exactly
//! representable as `f32`.
//!
//! # Coordinate System
//!
//! Uses a **right-handed coordinate system**:
//! - X: width (left/right)
//! - Y: depth (front/back)
//! - Z: height (up/down)
//!
//! Face winding is **counter-clockwise (CCW) when viewed from outside**.
//!
//! # Example
//!
//! ```
//! use mesh_types::{Vertex, IndexedMesh, Point3, MeshTopology};
//!
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Vertex::new(Point3::new(0.0, 0.0, 0.0)));
//! mesh.vertices.push(Vertex::new(Point3::new(1.0, 0.0, 0.0)));
//! mesh.vertices.push(Vertex::new(Point3::new(0.5, 1.0, 0.0)));
//! mesh.faces.push([0, 1, 2]);
//!
//! assert_eq!(mesh.face_count(), 1);
//! assert!(!mesh.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bounds;
mod color;
mod mesh;
mod traits;
mod triangle;
mod vertex;

pub use bounds::Aabb;
pub use color::{ColorParseError, VertexColor};
pub use mesh::{unit_cube, IndexedMesh};
pub use traits::{MeshBounds, MeshTopology};
pub use triangle::Triangle;
pub use vertex::Vertex;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
