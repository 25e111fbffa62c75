//! Edge subdivision.

use tracing::trace;

use super::{BatchOutcome, SkipReason, rewire_face, thread_chain};
use crate::builder::MeshBuilder;
use crate::store::MeshStore;
use crate::types::{EdgeId, MeshError, MeshResult, VertexId};

/// Split an edge into `splits + 1` equal segments.
///
/// The new vertices are returned ordered from the edge's first endpoint to
/// its second. Every face using the edge is rewired through them in its own
/// winding. `splits == 0` leaves the mesh untouched.
pub fn subdivide_edge(
    store: &mut MeshStore,
    edge_id: EdgeId,
    splits: usize,
) -> MeshResult<Vec<VertexId>> {
    let edge = store
        .edge(edge_id)
        .cloned()
        .ok_or(MeshError::edge_not_found(edge_id))?;
    if splits == 0 {
        return Ok(Vec::new());
    }
    let [a, b] = edge.vertex_ids;
    let pa = store.position(a).ok_or(MeshError::vertex_not_found(a))?;
    let pb = store.position(b).ok_or(MeshError::vertex_not_found(b))?;
    let faces = store.faces_using_edge(edge_id);

    let mut builder = MeshBuilder::indexing(store);
    let chain: Vec<VertexId> = (1..=splits)
        .map(|k| {
            let t = k as f32 / (splits + 1) as f32;
            builder.store_mut().add_vertex(pa.lerp(pb, t), None)
        })
        .collect();

    let mut path = Vec::with_capacity(chain.len() + 2);
    path.push(a);
    path.extend_from_slice(&chain);
    path.push(b);
    for pair in path.windows(2) {
        builder.edge(pair[0], pair[1]);
    }

    for face_id in &faces {
        let Some(face) = builder.store().face(*face_id).cloned() else {
            continue;
        };
        if let Some(cycle) = thread_chain(&face, a, b, &chain) {
            rewire_face(&mut builder, *face_id, cycle);
        }
    }

    // Faces that listed the edge without walking it are dropped along with it
    builder.store_mut().remove_edge(edge_id);
    trace!(
        "subdivide_edge: {:?} split {} times across {} faces",
        edge_id,
        splits,
        faces.len()
    );
    Ok(chain)
}

/// Batch form of [`subdivide_edge`]
pub fn subdivide_edges(
    store: &mut MeshStore,
    edge_ids: &[EdgeId],
    splits: usize,
) -> BatchOutcome<EdgeId, Vec<VertexId>> {
    let mut outcome = BatchOutcome::new();
    for &edge_id in edge_ids {
        match subdivide_edge(store, edge_id, splits) {
            Ok(chain) => outcome.complete(edge_id, chain),
            Err(_) => outcome.skip(edge_id, SkipReason::NotFound),
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::ops::fixtures::{quad_grid, unit_cube, vertex_at};

    #[test]
    fn test_subdivide_shared_edge() {
        let mut mesh = quad_grid(2, 1);
        let top = vertex_at(&mesh, Vec3::new(1.0, 1.0, 0.0));
        let bottom = vertex_at(&mesh, Vec3::new(1.0, 0.0, 0.0));
        let shared = mesh.find_edge(top, bottom).unwrap();
        let faces = mesh.faces_using_edge(shared);

        let chain = subdivide_edge(&mut mesh, shared, 1).unwrap();
        assert_eq!(chain.len(), 1);
        let mid = chain[0];
        assert!((mesh.position(mid).unwrap() - Vec3::new(1.0, 0.5, 0.0)).length() < 1e-6);

        assert!(mesh.edge(shared).is_none());
        assert_eq!(mesh.edge_count(), 8);
        for face_id in faces {
            let face = mesh.face(face_id).unwrap();
            assert_eq!(face.len(), 5);
            assert_eq!(face.edge_ids.len(), 5);
            assert!(face.vertex_ids.contains(&mid));
            // mid sits between the old endpoints in the cycle
            let i = face.corner_of(mid).unwrap();
            let prev = face.vertex_ids[(i + 4) % 5];
            let next = face.vertex_ids[(i + 1) % 5];
            assert!(
                (prev == top && next == bottom) || (prev == bottom && next == top),
                "face {:?} not threaded through the new vertex",
                face_id
            );
        }
    }

    #[test]
    fn test_subdivide_orders_chain_from_first_endpoint() {
        let mut mesh = unit_cube();
        let edge = mesh.edge_ids()[0];
        let [a, b] = mesh.edge(edge).unwrap().vertex_ids;
        let (pa, pb) = (mesh.position(a).unwrap(), mesh.position(b).unwrap());

        let chain = subdivide_edge(&mut mesh, edge, 3).unwrap();
        assert_eq!(chain.len(), 3);
        for (k, v) in chain.iter().enumerate() {
            let expected = pa.lerp(pb, (k + 1) as f32 / 4.0);
            assert!((mesh.position(*v).unwrap() - expected).length() < 1e-6);
        }
        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.edge_count(), 15);
    }

    #[test]
    fn test_subdivide_zero_splits_is_noop() {
        let mut mesh = unit_cube();
        let edge = mesh.edge_ids()[0];
        assert!(subdivide_edge(&mut mesh, edge, 0).unwrap().is_empty());
        assert!(mesh.edge(edge).is_some());
        assert_eq!(mesh.vertex_count(), 8);
    }

    #[test]
    fn test_subdivide_missing_edge() {
        let mut mesh = unit_cube();
        assert!(matches!(
            subdivide_edge(&mut mesh, EdgeId(9999), 1),
            Err(MeshError::NotFound { .. })
        ));

        let edge = mesh.edge_ids()[0];
        let outcome = subdivide_edges(&mut mesh, &[edge, EdgeId(9999)], 1);
        assert_eq!(outcome.completed_ids(), vec![edge]);
        assert_eq!(outcome.skipped_ids(), vec![EdgeId(9999)]);
    }
}
