//! Face extrusion.

use glam::Vec3;
use tracing::{debug, trace};

use super::{BatchOutcome, SkipReason, add_face_like, face_normal, rewire_face};
use crate::builder::{MeshBuilder, collapse_repeats};
use crate::store::MeshStore;
use crate::types::{FaceId, VertexId};

/// What one face turned into
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrudedFace {
    /// The extruded face itself, now sitting on the offset ring (same id as before)
    pub cap: FaceId,
    /// Face kept over the original ring, wound opposite to the cap
    pub base: FaceId,
    /// One quad per original edge, in ring order
    pub sides: Vec<FaceId>,
    /// The offset ring, parallel to the original corners
    pub new_vertices: Vec<VertexId>,
}

/// Extrude each face along its normal by `distance`.
///
/// The ring is duplicated at `corner + normal * distance`; the face keeps its
/// id and moves onto the duplicate ring, a quad joins every original edge to
/// its offset copy, and a base face closes the original ring from the inside.
/// A face whose normal cannot be determined is duplicated in place.
pub fn extrude_faces(
    store: &mut MeshStore,
    face_ids: &[FaceId],
    distance: f32,
) -> BatchOutcome<FaceId, ExtrudedFace> {
    let mut outcome = BatchOutcome::new();
    let mut builder = MeshBuilder::indexing(store);

    for &face_id in face_ids {
        let Some(face) = builder.store().face(face_id).cloned() else {
            outcome.skip(face_id, SkipReason::NotFound);
            continue;
        };
        let Some(positions) = builder.store().face_positions(face_id) else {
            outcome.skip(face_id, SkipReason::NotFound);
            continue;
        };
        // The base face needs three distinct corners; check before adding anything
        if positions.len() < 3 || collapse_repeats(&face.vertex_ids).len() < 3 {
            outcome.skip(face_id, SkipReason::Degenerate);
            continue;
        }

        let normal = face_normal(builder.store(), face_id).unwrap_or(Vec3::ZERO);
        if normal == Vec3::ZERO {
            debug!("extrude_faces: {:?} has no normal, offset is a no-op", face_id);
        }
        let offset = normal * distance;

        let ring = face.vertex_ids.clone();
        let new_ring: Vec<VertexId> = positions
            .iter()
            .map(|&p| builder.store_mut().add_vertex(p + offset, None))
            .collect();

        let n = ring.len();
        let mut sides = Vec::with_capacity(n);
        for i in 0..n {
            let j = (i + 1) % n;
            let quad = [ring[i], ring[j], new_ring[j], new_ring[i]];
            if let Some(side) = add_face_like(&mut builder, &face, &quad) {
                sides.push(side);
            }
        }

        let reversed: Vec<VertexId> = ring.iter().rev().copied().collect();
        let Some(base) = add_face_like(&mut builder, &face, &reversed) else {
            outcome.skip(face_id, SkipReason::Degenerate);
            continue;
        };
        rewire_face(&mut builder, face_id, new_ring.clone());

        trace!(
            "extrude_faces: {:?} -> {} sides, base {:?}",
            face_id,
            sides.len(),
            base
        );
        outcome.complete(
            face_id,
            ExtrudedFace {
                cap: face_id,
                base,
                sides,
                new_vertices: new_ring,
            },
        );
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::face_centroid;
    use crate::ops::fixtures::{face_towards, unit_cube};

    #[test]
    fn test_extrude_cube_face_counts() {
        let mut mesh = unit_cube();
        let top = face_towards(&mesh, Vec3::Y);
        let old_vertices = mesh.vertex_ids();

        let outcome = extrude_faces(&mut mesh, &[top], 1.0);
        assert!(outcome.is_complete());
        assert_eq!(mesh.vertex_count(), 12, "4 new vertices expected");
        assert_eq!(mesh.face_count(), 11, "4 sides + cap + base expected");

        let (_, result) = &outcome.completed[0];
        assert_eq!(result.cap, top);
        assert_eq!(result.sides.len(), 4);
        let cap = mesh.face(top).unwrap();
        assert!(
            cap.vertex_ids.iter().all(|v| !old_vertices.contains(v)),
            "cap must only use new vertices"
        );
        assert_eq!(cap.vertex_ids.len(), cap.edge_ids.len());
    }

    #[test]
    fn test_extrude_pinched_face_leaves_store_untouched() {
        let mut mesh = MeshStore::new();
        let a = mesh.add_vertex(Vec3::ZERO, None);
        let b = mesh.add_vertex(Vec3::X, None);
        let ab = mesh.add_edge(a, b, None);
        let pinched = mesh.add_face(vec![a, b, a], vec![ab, ab, ab], None);

        let outcome = extrude_faces(&mut mesh, &[pinched], 1.0);
        assert_eq!(outcome.skipped, vec![(pinched, SkipReason::Degenerate)]);
        assert_eq!(mesh.vertex_count(), 2);
        assert_eq!(mesh.edge_count(), 1);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.face(pinched).unwrap().vertex_ids, vec![a, b, a]);
    }

    #[test]
    fn test_extrude_moves_cap_along_normal() {
        let mut mesh = unit_cube();
        let top = face_towards(&mesh, Vec3::Y);
        extrude_faces(&mut mesh, &[top], 0.25);
        let centroid = face_centroid(&mesh, top).unwrap();
        assert!((centroid - Vec3::new(0.0, 0.75, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_extrude_sides_face_outward() {
        let mut mesh = unit_cube();
        let top = face_towards(&mesh, Vec3::Y);
        let outcome = extrude_faces(&mut mesh, &[top], 1.0);
        for &side in &outcome.completed[0].1.sides {
            let normal = face_normal(&mesh, side).unwrap();
            let centroid = face_centroid(&mesh, side).unwrap();
            let radial = Vec3::new(centroid.x, 0.0, centroid.z);
            assert!(normal.dot(radial) > 0.0, "side {:?} faces inward", side);
        }
    }

    #[test]
    fn test_extrude_skips_missing_and_continues() {
        let mut mesh = unit_cube();
        let top = face_towards(&mesh, Vec3::Y);
        let outcome = extrude_faces(&mut mesh, &[FaceId(9999), top], 1.0);
        assert_eq!(outcome.skipped, vec![(FaceId(9999), SkipReason::NotFound)]);
        assert_eq!(outcome.completed_ids(), vec![top]);
    }

    #[test]
    fn test_extrude_flat_face_is_noop_offset() {
        let mut mesh = MeshStore::new();
        let mut builder = MeshBuilder::new(&mut mesh);
        let face = builder
            .add_polygon(&[Vec3::ZERO, Vec3::X, Vec3::new(2.0, 0.0, 0.0)])
            .unwrap();

        let outcome = extrude_faces(&mut mesh, &[face], 1.0);
        let (_, result) = &outcome.completed[0];
        for &v in &result.new_vertices {
            assert_eq!(mesh.position(v).unwrap().y, 0.0);
        }
    }
}
