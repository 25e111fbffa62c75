//! Topology operators.
//!
//! Every operator is a one-shot, synchronous mutation of a [`MeshStore`].
//! Batch operators never fail as a whole: an id that is missing (or cannot be
//! processed) is recorded in [`BatchOutcome::skipped`] and the rest of the
//! batch proceeds. Outputs follow input order. Single-target operators return
//! [`MeshResult`](crate::MeshResult) and raise `NotFound`.

mod bevel;
mod bridge;
mod delete;
mod dissolve;
mod extrude;
mod inset;
mod loop_cut;
mod merge;
mod subdivide;
mod symmetry;
mod triangulate;

use std::collections::HashMap;
use std::hash::Hash;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::builder::MeshBuilder;
use crate::store::MeshStore;
use crate::types::{Face, FaceId, VertexId};

pub use bevel::{BevelResult, bevel_edge, bevel_edges};
pub use bridge::{bridge_edge_loops, bridge_edges};
pub use delete::{Removed, delete_edges, delete_faces, delete_vertices};
pub use dissolve::{dissolve_edges, dissolve_faces};
pub use extrude::{ExtrudedFace, extrude_faces};
pub use inset::{InsetFace, inset_faces};
pub use loop_cut::{EdgeRing, LoopCutResult, edge_ring, loop_cut};
pub use merge::{MergeResult, MergeTarget, merge_vertices};
pub use subdivide::{subdivide_edge, subdivide_edges};
pub use symmetry::{Axis, SymmetryOptions, SymmetryResult, symmetrize};
pub use triangulate::{quadrangulate_faces, triangulate_faces};

/// Why a batch item was not processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The id does not exist (or was consumed earlier in the same batch)
    NotFound,
    /// The element has too few corners or zero extent
    Degenerate,
    /// The edge lies on the boundary (or is loose) where faces on both sides are required
    Boundary,
    /// The edge is used by more than two faces
    NonManifold,
    /// The face region has holes or a pinched outline
    NonSimpleRegion,
    /// Neighbouring faces disagree on winding
    InconsistentWinding,
    /// The item needed a partner in the batch and had none
    Unpaired,
}

/// Per-item results of a batch operator, both lists in input order
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<I, T> {
    pub completed: Vec<(I, T)>,
    pub skipped: Vec<(I, SkipReason)>,
}

impl<I, T> Default for BatchOutcome<I, T> {
    fn default() -> Self {
        Self {
            completed: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<I: Copy, T> BatchOutcome<I, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn complete(&mut self, id: I, value: T) {
        self.completed.push((id, value));
    }

    pub(crate) fn skip(&mut self, id: I, reason: SkipReason) {
        self.skipped.push((id, reason));
    }

    /// Ids that were processed
    pub fn completed_ids(&self) -> Vec<I> {
        self.completed.iter().map(|(id, _)| *id).collect()
    }

    /// Ids that were skipped
    pub fn skipped_ids(&self) -> Vec<I> {
        self.skipped.iter().map(|(id, _)| *id).collect()
    }

    /// Whether no item was skipped
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

impl<I: Copy + Eq + Hash, T> BatchOutcome<I, T> {
    /// Lay out per-item results in request order, each id once.
    ///
    /// Used by operators that process items out of order (by region, or in
    /// several passes).
    pub(crate) fn in_request_order(
        ids: &[I],
        mut results: HashMap<I, Result<T, SkipReason>>,
    ) -> Self {
        let mut outcome = Self::new();
        for id in ids {
            match results.remove(id) {
                Some(Ok(value)) => outcome.complete(*id, value),
                Some(Err(reason)) => outcome.skip(*id, reason),
                None => {}
            }
        }
        outcome
    }
}

// ============================================================================
// Geometry helpers
// ============================================================================

/// Newell normal of a closed polygon, normalized (zero if degenerate)
pub fn newell_normal(points: &[Vec3]) -> Vec3 {
    let n = points.len();
    let mut normal = Vec3::ZERO;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        normal.x += (p.y - q.y) * (p.z + q.z);
        normal.y += (p.z - q.z) * (p.x + q.x);
        normal.z += (p.x - q.x) * (p.y + q.y);
    }
    normal.normalize_or_zero()
}

/// Unit normal of a face.
///
/// Taken from the cross product of the face's first two edges. When those are
/// collinear the Newell normal of the whole ring is used instead; a fully
/// degenerate face yields `Vec3::ZERO`. Returns `None` if the face is missing
/// or has fewer than three resolvable corners.
pub fn face_normal(store: &MeshStore, face_id: FaceId) -> Option<Vec3> {
    let points = store.face_positions(face_id)?;
    if points.len() < 3 {
        return None;
    }
    let first = (points[1] - points[0]).cross(points[2] - points[1]);
    let normal = first.normalize_or_zero();
    if normal != Vec3::ZERO {
        return Some(normal);
    }
    Some(newell_normal(&points))
}

/// Arithmetic mean of a face's corners
pub fn face_centroid(store: &MeshStore, face_id: FaceId) -> Option<Vec3> {
    let points = store.face_positions(face_id)?;
    if points.is_empty() {
        return None;
    }
    Some(points.iter().copied().sum::<Vec3>() / points.len() as f32)
}

// ============================================================================
// Shared rewiring helpers
// ============================================================================

/// Insert `chain` (ordered from `a` toward `b`) between every consecutive
/// `a`,`b` or `b`,`a` pair of a face's corner cycle, following the face's
/// own winding.
///
/// Returns `None` if the face never walks directly between `a` and `b`.
pub(crate) fn thread_chain(
    face: &Face,
    a: VertexId,
    b: VertexId,
    chain: &[VertexId],
) -> Option<Vec<VertexId>> {
    let n = face.vertex_ids.len();
    let mut cycle = Vec::with_capacity(n + chain.len());
    let mut threaded = false;
    for i in 0..n {
        let here = face.vertex_ids[i];
        let next = face.vertex_ids[(i + 1) % n];
        cycle.push(here);
        if here == a && next == b {
            cycle.extend_from_slice(chain);
            threaded = true;
        } else if here == b && next == a {
            cycle.extend(chain.iter().rev());
            threaded = true;
        }
    }
    threaded.then_some(cycle)
}

/// Replace a face's corners and derive its edges through the builder's table.
///
/// Faces that collapse below three corners are removed. Returns whether the
/// face survived.
pub(crate) fn rewire_face(
    builder: &mut MeshBuilder<'_>,
    face_id: FaceId,
    vertex_ids: Vec<VertexId>,
) -> bool {
    let cycle = crate::builder::collapse_repeats(&vertex_ids);
    if cycle.len() < 3 {
        builder.store_mut().remove_face(face_id);
        return false;
    }
    match builder.cycle_edges(&cycle) {
        Some(edges) => builder.store_mut().set_face_loop(face_id, cycle, edges),
        None => {
            builder.store_mut().remove_face(face_id);
            false
        }
    }
}

/// Add a face copying name/material from `template`, edges via the builder
pub(crate) fn add_face_like(
    builder: &mut MeshBuilder<'_>,
    template: &Face,
    vertex_ids: &[VertexId],
) -> Option<FaceId> {
    let cycle = crate::builder::collapse_repeats(vertex_ids);
    if cycle.len() < 3 {
        return None;
    }
    let edges = builder.cycle_edges(&cycle)?;
    Some(builder.store_mut().add_face_like(template, cycle, edges))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use glam::Vec3;

    use crate::builder::MeshBuilder;
    use crate::store::MeshStore;
    use crate::types::{FaceId, VertexId};

    /// Unit cube centred on the origin
    pub fn unit_cube() -> MeshStore {
        crate::primitives::cube(1.0, 1)
    }

    /// The face of a cube whose centroid lies furthest along `dir`
    pub fn face_towards(mesh: &MeshStore, dir: Vec3) -> FaceId {
        mesh.faces()
            .max_by(|a, b| {
                let ca = super::face_centroid(mesh, a.id).unwrap().dot(dir);
                let cb = super::face_centroid(mesh, b.id).unwrap().dot(dir);
                ca.total_cmp(&cb)
            })
            .map(|f| f.id)
            .unwrap()
    }

    /// A `cols × rows` quad grid on XY facing +Z
    pub fn quad_grid(cols: usize, rows: usize) -> MeshStore {
        let mut mesh = MeshStore::new();
        let mut builder = MeshBuilder::new(&mut mesh);
        let grid =
            builder.create_vertex_grid(rows + 1, cols + 1, |r, c| Vec3::new(c as f32, r as f32, 0.0));
        builder.create_faces_from_grid(&grid, false);
        mesh
    }

    /// Vertex nearest to a position
    pub fn vertex_at(mesh: &MeshStore, position: Vec3) -> VertexId {
        mesh.vertices()
            .min_by(|a, b| {
                a.position
                    .distance(position)
                    .total_cmp(&b.position.distance(position))
            })
            .map(|v| v.id)
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_newell_matches_cross_for_planar_quad() {
        let quad = [
            Vec3::ZERO,
            Vec3::X,
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::Y,
        ];
        assert!((newell_normal(&quad) - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_face_normal_falls_back_on_collinear_start() {
        let mut mesh = MeshStore::new();
        let mut builder = MeshBuilder::new(&mut mesh);
        // First three corners are collinear
        let face = builder
            .add_polygon(&[
                Vec3::ZERO,
                Vec3::new(0.5, 0.0, 0.0),
                Vec3::X,
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::Y,
            ])
            .unwrap();
        let normal = face_normal(&mesh, face).unwrap();
        assert_relative_eq!(normal.z, 1.0, epsilon = 1e-6);
        assert_relative_eq!(normal.x, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_centroid_of_cube_face() {
        let mesh = fixtures::unit_cube();
        let top = fixtures::face_towards(&mesh, Vec3::Z);
        let centroid = face_centroid(&mesh, top).unwrap();
        assert_relative_eq!(centroid.z, 0.5);
        assert_relative_eq!(centroid.x, 0.0);
        assert!(face_centroid(&mesh, FaceId(9999)).is_none());
    }

    #[test]
    fn test_thread_chain_respects_winding() {
        let face = Face {
            id: FaceId(0),
            vertex_ids: vec![VertexId(1), VertexId(2), VertexId(3)],
            edge_ids: Vec::new(),
            name: None,
            material: None,
        };
        let chain = [VertexId(10), VertexId(11)];
        let forward = thread_chain(&face, VertexId(1), VertexId(2), &chain).unwrap();
        assert_eq!(
            forward,
            vec![VertexId(1), VertexId(10), VertexId(11), VertexId(2), VertexId(3)]
        );
        let backward = thread_chain(&face, VertexId(2), VertexId(1), &chain).unwrap();
        assert_eq!(
            backward,
            vec![VertexId(1), VertexId(11), VertexId(10), VertexId(2), VertexId(3)]
        );
        assert!(thread_chain(&face, VertexId(1), VertexId(9), &chain).is_none());
    }
}
