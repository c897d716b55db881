//! Triangle-to-region classification.
//!
//! Each triangle is classified from its own centroid, the normalizing
//! bounding box, and the rule table. No triangle's result depends on any
//! other, so large meshes are classified with rayon.

use mesh_types::{Aabb, IndexedMesh};
use nalgebra::Point3;
use rayon::prelude::*;
use tracing::debug;

use crate::bounds::{compute_bounds, BoundsSampling};
use crate::error::{RegionError, RegionResult};
use crate::rules::RuleTable;

/// Configuration for classification and partitioning.
///
/// # Example
///
/// ```
/// use mesh_region::{BoundsSampling, ClassifyConfig};
///
/// let config = ClassifyConfig::default()
///     .with_parallel(false)
///     .with_bounds(BoundsSampling::FirstTriangles(500));
/// assert!(!config.parallel);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyConfig {
    /// Whether to use parallel processing (via rayon).
    pub parallel: bool,

    /// Minimum face count before work is split across threads.
    pub parallel_threshold: usize,

    /// Which vertices define the normalizing bounding box.
    pub bounds: BoundsSampling,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 10_000,
            bounds: BoundsSampling::Full,
        }
    }
}

impl ClassifyConfig {
    /// Number of triangles sampled for bounds when streaming.
    pub const STREAMING_SAMPLE: usize = 10_000;

    /// Settings for very large inputs: bounds from a prefix sample.
    #[must_use]
    pub fn streaming() -> Self {
        Self {
            bounds: BoundsSampling::FirstTriangles(Self::STREAMING_SAMPLE),
            ..Self::default()
        }
    }

    /// Single-threaded settings.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Enable or disable parallel processing.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the face count at which parallel processing starts.
    #[must_use]
    pub const fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Set the bounds sampling policy.
    #[must_use]
    pub const fn with_bounds(mut self, bounds: BoundsSampling) -> Self {
        self.bounds = bounds;
        self
    }

    pub(crate) fn use_parallel(&self, work_items: usize) -> bool {
        self.parallel && work_items >= self.parallel_threshold
    }
}

/// Region index per triangle, indexed by original face index.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    assignments: Vec<u32>,
    region_count: usize,
    bounds: Aabb,
}

impl Classification {
    /// Wrap precomputed assignments.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidRegionIndex`] if an entry is not below
    /// `region_count`.
    pub fn new(assignments: Vec<u32>, region_count: usize, bounds: Aabb) -> RegionResult<Self> {
        if let Some((face, &region)) = assignments
            .iter()
            .enumerate()
            .find(|(_, &r)| r as usize >= region_count)
        {
            return Err(RegionError::InvalidRegionIndex {
                face,
                region,
                region_count,
            });
        }
        Ok(Self {
            assignments,
            region_count,
            bounds,
        })
    }

    /// Region index of a face.
    #[must_use]
    pub fn region_of(&self, face: usize) -> Option<u32> {
        self.assignments.get(face).copied()
    }

    /// Number of classified faces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether no faces were classified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Number of regions in the table that produced this classification.
    #[must_use]
    pub const fn region_count(&self) -> usize {
        self.region_count
    }

    /// Bounding box positions were normalized against.
    #[must_use]
    pub const fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// All assignments, in face order.
    #[must_use]
    pub fn assignments(&self) -> &[u32] {
        &self.assignments
    }

    /// Face count per region index.
    #[must_use]
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.region_count];
        for &region in &self.assignments {
            counts[region as usize] += 1;
        }
        counts
    }

    /// Faces assigned to `region`, in original order.
    pub fn faces_in(&self, region: u32) -> impl Iterator<Item = usize> + '_ {
        self.assignments
            .iter()
            .enumerate()
            .filter(move |(_, &r)| r == region)
            .map(|(face, _)| face)
    }
}

/// Classify every triangle of a mesh.
///
/// The result is identical whether or not classification runs in
/// parallel. An empty mesh yields an empty classification.
///
/// # Errors
///
/// Returns [`RegionError::InvalidVertexIndex`] if a face references a
/// vertex that does not exist.
///
/// # Example
///
/// ```
/// use mesh_region::{classify_mesh, ClassifyConfig, Preset};
/// use mesh_types::unit_cube;
///
/// let cube = unit_cube();
/// let table = Preset::Coarse.table();
/// let classification = classify_mesh(&cube, &table, &ClassifyConfig::default()).unwrap();
/// assert_eq!(classification.len(), 12);
/// ```
pub fn classify_mesh(
    mesh: &IndexedMesh,
    table: &RuleTable,
    config: &ClassifyConfig,
) -> RegionResult<Classification> {
    if let Some((face, index)) = mesh.first_invalid_index() {
        return Err(RegionError::InvalidVertexIndex {
            face,
            index,
            vertex_count: mesh.vertices.len(),
        });
    }

    let bounds = compute_bounds(mesh, config.bounds);
    debug!(
        faces = mesh.faces.len(),
        min = ?bounds.min,
        max = ?bounds.max,
        "classifying"
    );

    let centroid = |face: &[u32; 3]| {
        let [a, b, c] = face.map(|i| mesh.vertices[i as usize].position.coords);
        Point3::from((a + b + c) / 3.0)
    };

    let assignments: Vec<u32> = if config.use_parallel(mesh.faces.len()) {
        mesh.faces
            .par_iter()
            .map(|face| table.classify(&centroid(face), &bounds))
            .collect()
    } else {
        mesh.faces
            .iter()
            .map(|face| table.classify(&centroid(face), &bounds))
            .collect()
    };

    Ok(Classification {
        assignments,
        region_count: table.region_count(),
        bounds,
    })
}
