//! Mesh vertices.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A mesh vertex.
///
/// Binary STL carries nothing per vertex beyond its position, so that is
/// all a vertex holds. Two vertices with the same position are distinct
/// unless the mesh shares the index; see `VertexMode` in the codec crate.
///
/// # Example
///
/// ```
/// use mesh_types::{Vertex, Point3};
///
/// let v = Vertex::from_coords(1.0, 2.0, 3.0);
/// assert_eq!(v.position, Point3::new(1.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// Position in 3D space.
    pub position: Point3<f64>,
}

impl Vertex {
    /// Vertex at a position.
    #[inline]
    #[must_use]
    pub const fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    /// Vertex from raw coordinates.
    #[inline]
    #[must_use]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Widen single-precision STL coordinates.
    #[inline]
    #[must_use]
    pub fn from_f32(coords: [f32; 3]) -> Self {
        Self::from_coords(
            f64::from(coords[0]),
            f64::from(coords[1]),
            f64::from(coords[2]),
        )
    }
}

impl From<Point3<f64>> for Vertex {
    fn from(position: Point3<f64>) -> Self {
        Self::new(position)
    }
}

impl From<[f64; 3]> for Vertex {
    fn from(c: [f64; 3]) -> Self {
        Self::from_coords(c[0], c[1], c[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_f32_widens_exactly() {
        let v = Vertex::from_f32([1.5, -2.25, 100.0]);
        assert_eq!(v.position, Point3::new(1.5, -2.25, 100.0));
    }

    #[test]
    fn conversions_agree() {
        let p = Point3::new(0.0, 1.0, 2.0);
        assert_eq!(Vertex::from([0.0, 1.0, 2.0]), Vertex::from(p));
    }
}
