//! Splitting a classified mesh into compact per-region sub-meshes.

use hashbrown::HashMap;
use mesh_types::IndexedMesh;
use rayon::prelude::*;
use tracing::debug;

use crate::classify::{Classification, ClassifyConfig};
use crate::error::{RegionError, RegionResult};

/// The triangles of one region, with only the vertices they reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    /// Region index in the rule table.
    pub region: u32,
    /// Compacted geometry. Face order and winding follow the source mesh.
    pub mesh: IndexedMesh,
    /// Source face index of each face in `mesh`.
    pub source_faces: Vec<u32>,
}

impl SubMesh {
    /// Number of triangles in this region.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.mesh.faces.len()
    }
}

/// All populated regions of a mesh.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Partition {
    /// Face count of the source mesh.
    pub total_faces: usize,
    /// Sub-meshes ordered by region index. Empty regions are absent.
    pub parts: Vec<SubMesh>,
}

impl Partition {
    /// Sub-mesh for a region, if it has any triangles.
    #[must_use]
    pub fn part(&self, region: u32) -> Option<&SubMesh> {
        self.parts.iter().find(|p| p.region == region)
    }

    /// Face count per populated region, as `(region, count)`.
    pub fn counts(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.parts.iter().map(|p| (p.region, p.face_count()))
    }

    /// Number of populated regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether no region has triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Partition a mesh with default settings.
///
/// # Errors
///
/// See [`partition_with`].
///
/// # Example
///
/// ```
/// use mesh_region::{classify_mesh, partition, ClassifyConfig, Preset};
/// use mesh_types::unit_cube;
///
/// let cube = unit_cube();
/// let classification = classify_mesh(&cube, &Preset::Coarse.table(), &ClassifyConfig::default()).unwrap();
/// let parts = partition(&cube, &classification).unwrap();
///
/// let total: usize = parts.parts.iter().map(|p| p.face_count()).sum();
/// assert_eq!(total, 12);
/// ```
pub fn partition(mesh: &IndexedMesh, classification: &Classification) -> RegionResult<Partition> {
    partition_with(mesh, classification, &ClassifyConfig::default())
}

/// Partition a mesh into one compact sub-mesh per populated region.
///
/// Faces keep their relative order within a region. Vertices are kept in
/// the order they are first referenced by the region's faces. Per-face
/// normals are carried over when present.
///
/// # Errors
///
/// - [`RegionError::ClassificationMismatch`] if the classification length
///   differs from the face count
/// - [`RegionError::InvalidVertexIndex`] if a face references a missing vertex
pub fn partition_with(
    mesh: &IndexedMesh,
    classification: &Classification,
    config: &ClassifyConfig,
) -> RegionResult<Partition> {
    if classification.len() != mesh.faces.len() {
        return Err(RegionError::ClassificationMismatch {
            expected: mesh.faces.len(),
            actual: classification.len(),
        });
    }
    if let Some((face, index)) = mesh.first_invalid_index() {
        return Err(RegionError::InvalidVertexIndex {
            face,
            index,
            vertex_count: mesh.vertices.len(),
        });
    }

    // Group face indices by region in one pass
    let mut groups: Vec<Vec<u32>> = vec![Vec::new(); classification.region_count()];
    for (face, &region) in (0u32..).zip(classification.assignments()) {
        groups[region as usize].push(face);
    }

    let populated: Vec<(u32, Vec<u32>)> = (0u32..)
        .zip(groups)
        .filter(|(_, faces)| !faces.is_empty())
        .collect();

    let parts: Vec<SubMesh> = if config.use_parallel(mesh.faces.len()) {
        populated
            .into_par_iter()
            .map(|(region, faces)| extract_region(mesh, region, faces))
            .collect()
    } else {
        populated
            .into_iter()
            .map(|(region, faces)| extract_region(mesh, region, faces))
            .collect()
    };

    for part in &parts {
        debug!(
            region = part.region,
            faces = part.face_count(),
            vertices = part.mesh.vertices.len(),
            "extracted region"
        );
    }

    Ok(Partition {
        total_faces: mesh.faces.len(),
        parts,
    })
}

/// Build a compact sub-mesh from the listed source faces.
fn extract_region(source: &IndexedMesh, region: u32, faces: Vec<u32>) -> SubMesh {
    let mut result = IndexedMesh::with_capacity(faces.len(), faces.len());
    let mut vertex_map: HashMap<u32, u32> = HashMap::with_capacity(faces.len());
    let keep_normals = source.has_face_normals();

    for &fi in &faces {
        let face = source.faces[fi as usize];
        let new_face = face.map(|vi| {
            *vertex_map.entry(vi).or_insert_with(|| {
                let idx = result.vertices.len() as u32;
                result.vertices.push(source.vertices[vi as usize].clone());
                idx
            })
        });
        result.faces.push(new_face);
        if keep_normals {
            result.face_normals.push(source.face_normals[fi as usize]);
        }
    }

    SubMesh {
        region,
        mesh: result,
        source_faces: faces,
    }
}
