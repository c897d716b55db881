//! Bounding boxes used to normalize triangle positions.

use mesh_types::{Aabb, IndexedMesh, MeshBounds, Triangle};

/// Which part of a mesh the normalizing bounding box is computed from.
///
/// Sampling a prefix bounds the cost of a first pass over very large
/// inputs. Triangles outside a sampled box normalize outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundsSampling {
    /// All vertices of the mesh.
    #[default]
    Full,
    /// Vertices of the first `n` triangles only.
    FirstTriangles(usize),
}

impl BoundsSampling {
    /// Number of triangles that contribute, given the mesh size.
    #[must_use]
    pub fn sample_len(self, triangle_count: usize) -> usize {
        match self {
            Self::Full => triangle_count,
            Self::FirstTriangles(n) => n.min(triangle_count),
        }
    }
}

/// Compute the bounding box of a mesh under a sampling policy.
///
/// Returns an empty box for a mesh with no vertices, or with no triangles
/// when sampling by triangle.
///
/// # Example
///
/// ```
/// use mesh_region::{compute_bounds, BoundsSampling};
/// use mesh_types::unit_cube;
///
/// let cube = unit_cube();
/// let bounds = compute_bounds(&cube, BoundsSampling::Full);
/// assert_eq!(bounds.max.z, 1.0);
/// ```
#[must_use]
pub fn compute_bounds(mesh: &IndexedMesh, sampling: BoundsSampling) -> Aabb {
    match sampling {
        BoundsSampling::Full => mesh.bounds(),
        BoundsSampling::FirstTriangles(n) => {
            let mut bounds = Aabb::empty();
            for face in mesh.faces.iter().take(n) {
                for &index in face {
                    if let Some(vertex) = mesh.vertices.get(index as usize) {
                        bounds.expand_to_include(&vertex.position);
                    }
                }
            }
            bounds
        }
    }
}

/// Bounding box over a stream of triangles.
///
/// Used by single-pass readers that never hold the whole mesh.
#[must_use]
pub fn triangle_bounds(triangles: impl IntoIterator<Item = Triangle>) -> Aabb {
    triangles
        .into_iter()
        .fold(Aabb::empty(), |mut bounds, triangle| {
            for vertex in &triangle.vertices() {
                bounds.expand_to_include(vertex);
            }
            bounds
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{unit_cube, MeshTopology, Point3};

    #[test]
    fn test_full_matches_vertex_bounds() {
        let cube = unit_cube();
        let bounds = compute_bounds(&cube, BoundsSampling::Full);
        assert_eq!(bounds.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_prefix_sampling() {
        // Second triangle sits far above the first
        let mesh = IndexedMesh::from_raw(
            &[
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 50.0, 1.0, 0.0, 50.0, 0.0, 1.0, 60.0,
            ],
            &[0, 1, 2, 3, 4, 5],
        );

        let sampled = compute_bounds(&mesh, BoundsSampling::FirstTriangles(1));
        assert_eq!(sampled.max.z, 0.0);

        let all = compute_bounds(&mesh, BoundsSampling::FirstTriangles(100));
        assert_eq!(all, compute_bounds(&mesh, BoundsSampling::Full));
        assert_eq!(BoundsSampling::FirstTriangles(100).sample_len(2), 2);
    }

    #[test]
    fn test_empty_inputs() {
        let empty = IndexedMesh::new();
        assert!(compute_bounds(&empty, BoundsSampling::Full).is_empty());
        assert!(compute_bounds(&empty, BoundsSampling::FirstTriangles(10)).is_empty());
        assert!(triangle_bounds(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_triangle_stream_matches_mesh() {
        let cube = unit_cube();
        assert_eq!(triangle_bounds(cube.triangles()), cube.bounds());
    }
}
