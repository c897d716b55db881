//! Pre-flight inspection of an input mesh.
//!
//! Reports size, extents and edge topology so a user can see whether a
//! model is worth splitting before writing any files. Topology counts
//! assume identical positions share a vertex, so files are loaded with
//! [`VertexMode::Merged`].

use std::fmt;
use std::path::Path;

use hashbrown::HashMap;
use mesh_io::{load_stl_with, VertexMode};
use mesh_types::{Aabb, IndexedMesh, MeshBounds, MeshTopology, Vector3};

use crate::error::SplitResult;

/// Area below which a face counts as degenerate.
pub const DEGENERATE_AREA: f64 = 1e-12;

/// Summary of a mesh's size and health.
#[derive(Debug, Clone)]
pub struct MeshReport {
    /// Number of triangles.
    pub triangle_count: usize,
    /// Number of vertices.
    pub vertex_count: usize,
    /// Axis-aligned bounds.
    pub bounds: Aabb,
    /// Unsigned enclosed volume.
    pub volume: f64,
    /// Total surface area.
    pub surface_area: f64,

    /// Number of distinct edges.
    pub edge_count: usize,
    /// Edges used by exactly one face.
    pub boundary_edge_count: usize,
    /// Edges used by more than two faces.
    pub non_manifold_edge_count: usize,
    /// Faces with near-zero area.
    pub degenerate_face_count: usize,
}

impl MeshReport {
    /// Width, depth and height of the bounds.
    #[must_use]
    pub fn extents(&self) -> Vector3<f64> {
        if self.bounds.is_empty() {
            Vector3::zeros()
        } else {
            self.bounds.size()
        }
    }

    /// No boundary edges.
    #[must_use]
    pub const fn is_watertight(&self) -> bool {
        self.boundary_edge_count == 0
    }

    /// No edge shared by more than two faces.
    #[must_use]
    pub const fn is_manifold(&self) -> bool {
        self.non_manifold_edge_count == 0
    }

    /// Whether any topology problem was found.
    #[must_use]
    pub const fn has_issues(&self) -> bool {
        self.boundary_edge_count > 0
            || self.non_manifold_edge_count > 0
            || self.degenerate_face_count > 0
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

impl fmt::Display for MeshReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.extents();
        writeln!(f, "Mesh Report:")?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Edges: {}", self.edge_count)?;
        writeln!(
            f,
            "  Extents: {:.2} x {:.2} x {:.2}",
            size.x, size.y, size.z
        )?;
        writeln!(f, "  Volume: {:.2}", self.volume)?;
        writeln!(f, "  Surface area: {:.2}", self.surface_area)?;
        writeln!(f)?;
        writeln!(f, "  Status:")?;
        writeln!(f, "    Watertight: {}", yes_no(self.is_watertight()))?;
        writeln!(f, "    Manifold: {}", yes_no(self.is_manifold()))?;

        if self.has_issues() {
            writeln!(f)?;
            writeln!(f, "  Issues:")?;
            if self.boundary_edge_count > 0 {
                writeln!(f, "    Boundary edges: {}", self.boundary_edge_count)?;
            }
            if self.non_manifold_edge_count > 0 {
                writeln!(
                    f,
                    "    Non-manifold edges: {}",
                    self.non_manifold_edge_count
                )?;
            }
            if self.degenerate_face_count > 0 {
                writeln!(f, "    Degenerate faces: {}", self.degenerate_face_count)?;
            }
        }
        Ok(())
    }
}

/// Inspect a mesh.
///
/// # Example
///
/// ```
/// use mesh_split::inspect_mesh;
/// use mesh_types::unit_cube;
///
/// let report = inspect_mesh(&unit_cube());
/// assert_eq!(report.edge_count, 18);
/// assert!(report.is_watertight());
/// ```
#[must_use]
pub fn inspect_mesh(mesh: &IndexedMesh) -> MeshReport {
    let mut edge_faces: HashMap<(u32, u32), usize> =
        HashMap::with_capacity(mesh.faces.len() * 3 / 2);
    for face in &mesh.faces {
        for k in 0..3 {
            let (a, b) = (face[k], face[(k + 1) % 3]);
            *edge_faces.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }

    let degenerate_face_count = mesh
        .triangles()
        .filter(|t| t.area() < DEGENERATE_AREA)
        .count();

    MeshReport {
        triangle_count: mesh.face_count(),
        vertex_count: mesh.vertex_count(),
        bounds: mesh.bounds(),
        volume: mesh.volume(),
        surface_area: mesh.surface_area(),
        edge_count: edge_faces.len(),
        boundary_edge_count: edge_faces.values().filter(|&&n| n == 1).count(),
        non_manifold_edge_count: edge_faces.values().filter(|&&n| n > 2).count(),
        degenerate_face_count,
    }
}

/// Load and inspect a binary STL file.
///
/// # Errors
///
/// Returns decode errors from [`mesh_io`].
pub fn inspect_file(path: &Path) -> SplitResult<MeshReport> {
    let mesh = load_stl_with(path, VertexMode::Merged)?;
    Ok(inspect_mesh(&mesh))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::unit_cube;

    #[test]
    fn test_cube_is_closed() {
        let report = inspect_mesh(&unit_cube());
        assert_eq!(report.triangle_count, 12);
        assert_eq!(report.vertex_count, 8);
        assert_eq!(report.boundary_edge_count, 0);
        assert!(report.is_manifold());
        assert!(!report.has_issues());
        assert_relative_eq!(report.volume, 1.0, epsilon = 1e-10);
        assert_relative_eq!(report.surface_area, 6.0, epsilon = 1e-10);
        assert_relative_eq!(report.extents().z, 1.0);
    }

    #[test]
    fn test_open_cube_has_boundary() {
        let mut cube = unit_cube();
        cube.faces.truncate(10);
        let report = inspect_mesh(&cube);
        assert!(!report.is_watertight());
        assert_eq!(report.boundary_edge_count, 4);
        assert!(report.to_string().contains("Boundary edges: 4"));
    }

    #[test]
    fn test_degenerate_and_empty() {
        let mut mesh = unit_cube();
        mesh.faces.push([0, 0, 1]);
        let report = inspect_mesh(&mesh);
        assert_eq!(report.degenerate_face_count, 1);

        let empty = inspect_mesh(&IndexedMesh::new());
        assert_eq!(empty.edge_count, 0);
        assert_eq!(empty.extents(), Vector3::zeros());
    }
}
