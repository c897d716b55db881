//! Indexed triangle mesh.

use crate::{Aabb, MeshBounds, MeshTopology, Triangle, Vertex};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh.
///
/// Stores vertices and faces separately, with faces referencing vertices
/// by index. Every face index must lie in `[0, vertices.len())`; use
/// [`IndexedMesh::first_invalid_index`] to check meshes built by hand.
///
/// # Memory Layout
///
/// - `vertices`: `Vec<Vertex>` - Vertex positions
/// - `faces`: `Vec<[u32; 3]>` - Triangle faces as vertex indices
/// - `face_normals`: `Vec<Vector3<f64>>` - Either empty, or one normal per face
///
/// # Face Normals
///
/// Binary STL stores a normal per triangle. Decoders keep it in
/// `face_normals`; encoders write it back when present and recompute it
/// from winding otherwise. See [`IndexedMesh::face_normal`].
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex, MeshTopology};
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// assert!(!mesh.has_face_normals());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array.
    /// Each face is `[v0, v1, v2]` with counter-clockwise winding.
    pub faces: Vec<[u32; 3]>,

    /// Per-face normals, parallel to `faces`. Empty when not supplied.
    pub face_normals: Vec<Vector3<f64>>,
}

impl IndexedMesh {
    /// Create a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            face_normals: Vec::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
            face_normals: Vec::new(),
        }
    }

    /// Create a mesh from vertices and faces, without face normals.
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Vertex>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            faces,
            face_normals: Vec::new(),
        }
    }

    /// Create a mesh from raw coordinate and index data.
    ///
    /// Returns an empty mesh if either slice length is not a multiple of 3.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{IndexedMesh, MeshTopology};
    ///
    /// let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    /// let indices = [0, 1, 2];
    ///
    /// let mesh = IndexedMesh::from_raw(&positions, &indices);
    /// assert_eq!(mesh.vertex_count(), 3);
    /// assert_eq!(mesh.face_count(), 1);
    /// ```
    #[must_use]
    pub fn from_raw(positions: &[f64], indices: &[u32]) -> Self {
        if positions.len() % 3 != 0 || indices.len() % 3 != 0 {
            return Self::new();
        }

        let vertices = positions
            .chunks_exact(3)
            .map(|c| Vertex::from_coords(c[0], c[1], c[2]))
            .collect();

        let faces = indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();

        Self::from_parts(vertices, faces)
    }

    /// Whether per-face normals are attached (one per face).
    #[inline]
    #[must_use]
    pub fn has_face_normals(&self) -> bool {
        !self.faces.is_empty() && self.face_normals.len() == self.faces.len()
    }

    /// Normal for a face.
    ///
    /// Uses the supplied normal when [`has_face_normals`](Self::has_face_normals)
    /// holds, otherwise derives it from the vertex winding. Degenerate
    /// triangles yield the zero vector.
    #[must_use]
    pub fn face_normal(&self, face_index: usize) -> Option<Vector3<f64>> {
        if self.has_face_normals() {
            return self.face_normals.get(face_index).copied();
        }
        self.triangle(face_index).map(|t| t.normal_or_zero())
    }

    /// Find the first face index that points outside the vertex array.
    ///
    /// Returns `(face_index, vertex_index)` of the first offender.
    #[must_use]
    pub fn first_invalid_index(&self) -> Option<(usize, u32)> {
        let n = self.vertices.len();
        self.faces.iter().enumerate().find_map(|(fi, face)| {
            face.iter()
                .find(|&&vi| vi as usize >= n)
                .map(|&vi| (fi, vi))
        })
    }

    /// Compute the signed volume of the mesh.
    ///
    /// Sum of signed tetrahedra formed by each face and the origin.
    /// Positive for closed meshes with outward (CCW) winding. Only
    /// meaningful for closed meshes.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        let volume: f64 = self
            .triangles()
            .map(|t| {
                let (v0, v1, v2) = (t.v0.coords, t.v1.coords, t.v2.coords);
                v0.dot(&v1.cross(&v2))
            })
            .sum();
        volume / 6.0
    }

    /// Absolute value of [`signed_volume`](Self::signed_volume).
    #[inline]
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Total surface area of the mesh.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|tri| tri.area()).sum()
    }

    /// Append another mesh, offsetting its face indices.
    ///
    /// Face normals survive only if both meshes carry them (or `self` is empty).
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: mesh indices are u32, so vertex counts > 4B are unsupported
    pub fn merge(&mut self, other: &Self) {
        let keep_normals = (self.faces.is_empty() || self.has_face_normals())
            && other.has_face_normals();
        if !keep_normals {
            self.face_normals.clear();
        }

        let vertex_offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|f| [f[0] + vertex_offset, f[1] + vertex_offset, f[2] + vertex_offset]),
        );
        if keep_normals {
            self.face_normals.extend_from_slice(&other.face_normals);
        }
    }
}

impl MeshTopology for IndexedMesh {
    #[inline]
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn triangle(&self, face_index: usize) -> Option<Triangle> {
        let [i0, i1, i2] = *self.faces.get(face_index)?;
        Some(Triangle {
            v0: self.vertices.get(i0 as usize)?.position,
            v1: self.vertices.get(i1 as usize)?.position,
            v2: self.vertices.get(i2 as usize)?.position,
        })
    }

    fn triangles(&self) -> impl Iterator<Item = Triangle> {
        (0..self.faces.len()).filter_map(|i| self.triangle(i))
    }
}

impl MeshBounds for IndexedMesh {
    fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| &v.position))
    }
}

/// Create a unit cube mesh from (0,0,0) to (1,1,1) with outward winding.
///
/// # Example
///
/// ```
/// use mesh_types::{unit_cube, MeshTopology};
///
/// let cube = unit_cube();
/// assert_eq!(cube.vertex_count(), 8);
/// assert_eq!(cube.face_count(), 12);
/// ```
#[must_use]
pub fn unit_cube() -> IndexedMesh {
    let positions = [
        0.0, 0.0, 0.0, // 0
        1.0, 0.0, 0.0, // 1
        1.0, 1.0, 0.0, // 2
        0.0, 1.0, 0.0, // 3
        0.0, 0.0, 1.0, // 4
        1.0, 0.0, 1.0, // 5
        1.0, 1.0, 1.0, // 6
        0.0, 1.0, 1.0, // 7
    ];
    let indices = [
        0, 2, 1, 0, 3, 2, // bottom (-Z)
        4, 5, 6, 4, 6, 7, // top (+Z)
        0, 1, 5, 0, 5, 4, // front (-Y)
        3, 7, 6, 3, 6, 2, // back (+Y)
        0, 4, 7, 0, 7, 3, // left (-X)
        1, 2, 6, 1, 6, 5, // right (+X)
    ];
    IndexedMesh::from_raw(&positions, &indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mesh_is_empty() {
        let mesh = IndexedMesh::new();
        assert!(mesh.is_empty());

        let mut mesh2 = IndexedMesh::new();
        mesh2.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        assert!(mesh2.is_empty()); // no faces

        mesh2.faces.push([0, 0, 0]);
        assert!(!mesh2.is_empty());
    }

    #[test]
    fn mesh_bounds() {
        let mesh = IndexedMesh::from_raw(&[0.0, 0.0, 0.0, 10.0, 5.0, 3.0, -2.0, 8.0, 1.0], &[0, 1, 2]);
        let bounds = mesh.bounds();
        assert_relative_eq!(bounds.min.x, -2.0);
        assert_relative_eq!(bounds.max.y, 8.0);
        assert_relative_eq!(bounds.max.z, 3.0);
        assert!(IndexedMesh::new().bounds().is_empty());
    }

    #[test]
    fn unit_cube_volume_and_area() {
        let cube = unit_cube();
        assert_relative_eq!(cube.signed_volume(), 1.0, epsilon = 1e-10);
        assert_relative_eq!(cube.surface_area(), 6.0, epsilon = 1e-10);
    }

    #[test]
    fn face_normal_prefers_supplied() {
        let mut mesh = IndexedMesh::from_raw(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], &[0, 1, 2]);
        assert_relative_eq!(mesh.face_normal(0).map_or(0.0, |n| n.z), 1.0);

        mesh.face_normals.push(Vector3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(mesh.face_normal(0).map_or(0.0, |n| n.y), 1.0);
        assert!(mesh.face_normal(1).is_none());
    }

    #[test]
    fn invalid_index_detected() {
        let mut mesh = unit_cube();
        assert_eq!(mesh.first_invalid_index(), None);
        mesh.faces.push([0, 1, 8]);
        assert_eq!(mesh.first_invalid_index(), Some((12, 8)));
        assert!(mesh.triangle(12).is_none());
    }

    #[test]
    fn mesh_merge_offsets_indices() {
        let tri = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let mut a = IndexedMesh::from_raw(&tri, &[0, 1, 2]);
        let b = IndexedMesh::from_raw(&tri, &[0, 1, 2]);
        a.merge(&b);
        assert_eq!(a.vertex_count(), 6);
        assert_eq!(a.faces[1], [3, 4, 5]);
        assert!(!a.has_face_normals());
    }

    #[test]
    fn mesh_merge_keeps_normals_when_both_have_them() {
        let tri = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let mut a = IndexedMesh::new();
        let mut b = IndexedMesh::from_raw(&tri, &[0, 1, 2]);
        b.face_normals.push(Vector3::z());
        a.merge(&b);
        a.merge(&b);
        assert!(a.has_face_normals());
        assert_eq!(a.face_normals.len(), 2);
    }
}
