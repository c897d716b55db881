//! Connected-component labelling.
//!
//! Splits a mesh into separate bodies instead of spatial regions. Faces are
//! connected when they share an edge, compared by vertex position, so meshes
//! decoded as triangle soup label the same as indexed ones. Bodies that
//! touch at a single point stay separate.

use hashbrown::HashMap;
use mesh_types::{IndexedMesh, MeshBounds};
use tracing::debug;

use crate::classify::Classification;
use crate::error::{RegionError, RegionResult};
use crate::rules::RegionSpec;

type PositionKey = [u64; 3];
type EdgeKey = (PositionKey, PositionKey);

const UNVISITED: u32 = u32::MAX;

fn position_key(mesh: &IndexedMesh, vertex: u32) -> PositionKey {
    let p = mesh.vertices[vertex as usize].position;
    // -0.0 and 0.0 are the same position
    [p.x + 0.0, p.y + 0.0, p.z + 0.0].map(f64::to_bits)
}

fn face_edges(mesh: &IndexedMesh, face: usize) -> [EdgeKey; 3] {
    let [a, b, c] = mesh.faces[face].map(|v| position_key(mesh, v));
    [(a, b), (b, c), (c, a)].map(|(p, q)| if p <= q { (p, q) } else { (q, p) })
}

/// Label each face with the index of its connected component.
///
/// Components are numbered in order of their lowest face index. The
/// returned classification has one region per component and is normalized
/// against the whole mesh's bounding box.
///
/// # Errors
///
/// Returns [`RegionError::InvalidVertexIndex`] if a face references a
/// vertex that does not exist.
///
/// # Example
///
/// ```
/// use mesh_region::label_components;
/// use mesh_types::unit_cube;
///
/// let mut mesh = unit_cube();
/// let mut other = unit_cube();
/// for v in &mut other.vertices {
///     v.position.x += 5.0;
/// }
/// mesh.merge(&other);
///
/// let labels = label_components(&mesh).unwrap();
/// assert_eq!(labels.region_count(), 2);
/// assert_eq!(labels.counts(), vec![12, 12]);
/// ```
pub fn label_components(mesh: &IndexedMesh) -> RegionResult<Classification> {
    if let Some((face, index)) = mesh.first_invalid_index() {
        return Err(RegionError::InvalidVertexIndex {
            face,
            index,
            vertex_count: mesh.vertices.len(),
        });
    }

    // Map each undirected edge to the faces bounded by it
    let mut edge_to_faces: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
    for face_idx in 0..mesh.faces.len() {
        for edge in face_edges(mesh, face_idx) {
            edge_to_faces.entry(edge).or_default().push(face_idx);
        }
    }

    let mut labels = vec![UNVISITED; mesh.faces.len()];
    let mut component: u32 = 0;
    let mut stack = Vec::new();

    for start in 0..mesh.faces.len() {
        if labels[start] != UNVISITED {
            continue;
        }
        labels[start] = component;
        stack.push(start);

        while let Some(face) = stack.pop() {
            for edge in face_edges(mesh, face) {
                let Some(neighbors) = edge_to_faces.get(&edge) else {
                    continue;
                };
                for &neighbor in neighbors {
                    if labels[neighbor] == UNVISITED {
                        labels[neighbor] = component;
                        stack.push(neighbor);
                    }
                }
            }
        }
        component += 1;
    }

    debug!(faces = mesh.faces.len(), components = component, "labelled components");
    Classification::new(labels, component as usize, mesh.bounds())
}

/// Region descriptions for `count` components.
///
/// Component `i` takes palette entry `i % palette.len()` and is named
/// `NN_<palette id>` with a 1-based, zero-padded number. An empty palette
/// yields white `NN_part` regions.
///
/// # Example
///
/// ```
/// use mesh_region::{component_regions, RegionSpec};
///
/// let palette = vec![
///     RegionSpec::new("gold", "#C78B2A", "Gold", "Trim"),
///     RegionSpec::new("black", "#1B1B1B", "Black", "Base"),
/// ];
/// let regions = component_regions(3, &palette);
/// assert_eq!(regions[0].id, "01_gold");
/// assert_eq!(regions[2].id, "03_gold");
/// assert_eq!(regions[1].hex, "#1B1B1B");
/// ```
#[must_use]
pub fn component_regions(count: usize, palette: &[RegionSpec]) -> Vec<RegionSpec> {
    let fallback = RegionSpec::new("part", "#FFFFFF", "White", "");
    (0..count)
        .map(|i| {
            let base = if palette.is_empty() {
                &fallback
            } else {
                &palette[i % palette.len()]
            };
            RegionSpec {
                id: format!("{:02}_{}", i + 1, base.id),
                ..base.clone()
            }
        })
        .collect()
}
