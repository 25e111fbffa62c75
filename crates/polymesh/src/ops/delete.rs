//! Cascading deletes that also clean up what they leave loose.

use tracing::trace;

use super::{BatchOutcome, SkipReason};
use crate::store::MeshStore;
use crate::types::{EdgeId, FaceId, VertexId};

/// Elements removed by one delete
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Removed {
    pub vertices: Vec<VertexId>,
    pub edges: Vec<EdgeId>,
    pub faces: Vec<FaceId>,
}

/// Everything a delete might touch, recorded before it runs
#[derive(Default)]
struct Candidates {
    vertices: Vec<VertexId>,
    edges: Vec<EdgeId>,
    faces: Vec<FaceId>,
}

impl Candidates {
    fn add_face(&mut self, store: &MeshStore, face_id: FaceId) {
        if let Some(face) = store.face(face_id) {
            self.faces.push(face_id);
            self.edges.extend_from_slice(&face.edge_ids);
            self.vertices.extend_from_slice(&face.vertex_ids);
        }
    }

    /// Which candidates are gone now
    fn removed(mut self, store: &MeshStore) -> Removed {
        self.vertices.sort();
        self.vertices.dedup();
        self.edges.sort();
        self.edges.dedup();
        self.faces.sort();
        self.faces.dedup();
        Removed {
            vertices: self.vertices.into_iter().filter(|&v| store.vertex(v).is_none()).collect(),
            edges: self.edges.into_iter().filter(|&e| store.edge(e).is_none()).collect(),
            faces: self.faces.into_iter().filter(|&f| store.face(f).is_none()).collect(),
        }
    }
}

/// Delete vertices with every edge, face and UV that uses them.
///
/// Edges of the removed faces that no face references anymore are pruned
/// too. Vertices left loose stay in place.
pub fn delete_vertices(
    store: &mut MeshStore,
    vertex_ids: &[VertexId],
) -> BatchOutcome<VertexId, Removed> {
    let mut outcome = BatchOutcome::new();
    for &vertex_id in vertex_ids {
        if store.vertex(vertex_id).is_none() {
            outcome.skip(vertex_id, SkipReason::NotFound);
            continue;
        }
        let mut candidates = Candidates::default();
        candidates.vertices.push(vertex_id);
        candidates.edges.extend(store.edges_using_vertex(vertex_id));
        for face_id in store.faces_using_vertex(vertex_id) {
            candidates.add_face(store, face_id);
        }

        store.remove_vertex(vertex_id);
        store.prune_loose(&candidates.edges, &[]);
        let removed = candidates.removed(store);
        trace!(
            "delete_vertices: {:?} took {} faces and {} edges",
            vertex_id,
            removed.faces.len(),
            removed.edges.len()
        );
        outcome.complete(vertex_id, removed);
    }
    outcome
}

/// Delete edges with every face that uses them.
///
/// Other edges of those faces left without a face are pruned.
pub fn delete_edges(store: &mut MeshStore, edge_ids: &[EdgeId]) -> BatchOutcome<EdgeId, Removed> {
    let mut outcome = BatchOutcome::new();
    for &edge_id in edge_ids {
        if store.edge(edge_id).is_none() {
            outcome.skip(edge_id, SkipReason::NotFound);
            continue;
        }
        let mut candidates = Candidates::default();
        candidates.edges.push(edge_id);
        for face_id in store.faces_using_edge(edge_id) {
            candidates.add_face(store, face_id);
        }

        store.remove_edge(edge_id);
        store.prune_loose(&candidates.edges, &[]);
        outcome.complete(edge_id, candidates.removed(store));
    }
    outcome
}

/// Delete faces, then prune their edges and vertices left loose
pub fn delete_faces(store: &mut MeshStore, face_ids: &[FaceId]) -> BatchOutcome<FaceId, Removed> {
    let mut outcome = BatchOutcome::new();
    for &face_id in face_ids {
        if store.face(face_id).is_none() {
            outcome.skip(face_id, SkipReason::NotFound);
            continue;
        }
        let mut candidates = Candidates::default();
        candidates.add_face(store, face_id);

        store.remove_face(face_id);
        store.prune_loose(&candidates.edges, &candidates.vertices);
        outcome.complete(face_id, candidates.removed(store));
    }
    outcome
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::ops::fixtures::{quad_grid, unit_cube, vertex_at};
    use crate::validate::validate_mesh_topology;

    /// No face or edge may point at something that is gone
    fn assert_no_dangling(mesh: &MeshStore) {
        for face in mesh.faces() {
            for v in &face.vertex_ids {
                assert!(mesh.vertex(*v).is_some(), "face {:?} -> missing {:?}", face.id, v);
            }
            for e in &face.edge_ids {
                assert!(mesh.edge(*e).is_some(), "face {:?} -> missing {:?}", face.id, e);
            }
        }
        for edge in mesh.edges() {
            for v in &edge.vertex_ids {
                assert!(mesh.vertex(*v).is_some(), "edge {:?} -> missing {:?}", edge.id, v);
            }
        }
    }

    #[test]
    fn test_delete_cube_corner() {
        let mut mesh = unit_cube();
        let corner = vertex_at(&mesh, Vec3::splat(0.5));
        assert_eq!(mesh.faces_using_vertex(corner).len(), 3);

        let outcome = delete_vertices(&mut mesh, &[corner]);
        let removed = &outcome.completed[0].1;
        assert_eq!(removed.faces.len(), 3);
        assert_eq!(removed.edges.len(), 3);
        assert_eq!(mesh.vertex_count(), 7);
        assert_eq!(mesh.edge_count(), 9);
        assert_eq!(mesh.face_count(), 3);
        assert_no_dangling(&mesh);
        assert!(mesh.edges().all(|e| mesh.is_edge_used(e.id)));
    }

    #[test]
    fn test_delete_grid_centre_prunes_ring() {
        let mut mesh = quad_grid(2, 2);
        let centre = vertex_at(&mesh, Vec3::new(1.0, 1.0, 0.0));
        let outcome = delete_vertices(&mut mesh, &[centre, VertexId(9999)]);

        assert_eq!(outcome.skipped_ids(), vec![VertexId(9999)]);
        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.edge_count(), 0);
        assert_eq!(mesh.vertex_count(), 8, "loose vertices stay");
    }

    #[test]
    fn test_delete_edge_removes_faces() {
        let mut mesh = quad_grid(2, 1);
        let top = vertex_at(&mesh, Vec3::new(1.0, 1.0, 0.0));
        let bottom = vertex_at(&mesh, Vec3::new(1.0, 0.0, 0.0));
        let shared = mesh.find_edge(top, bottom).unwrap();

        let outcome = delete_edges(&mut mesh, &[shared]);
        assert_eq!(outcome.completed[0].1.faces.len(), 2);
        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.edge_count(), 0);
        assert_no_dangling(&mesh);
    }

    #[test]
    fn test_delete_face_prunes_loose() {
        let mut mesh = quad_grid(2, 1);
        let first = mesh.face_ids()[0];
        let outcome = delete_faces(&mut mesh, &[first]);

        let removed = &outcome.completed[0].1;
        assert_eq!(removed.edges.len(), 3);
        assert_eq!(removed.vertices.len(), 2);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.edge_count(), 4);
        assert!(validate_mesh_topology(&mesh).warnings.is_empty());
    }
}
