//! Face insetting.

use tracing::trace;

use super::{BatchOutcome, SkipReason, add_face_like, rewire_face};
use crate::builder::MeshBuilder;
use crate::store::MeshStore;
use crate::types::{FaceId, VertexId};

/// What one face turned into
#[derive(Debug, Clone, PartialEq)]
pub struct InsetFace {
    /// The face itself, now on the inner ring
    pub inner: FaceId,
    /// Border quads, one per original edge
    pub sides: Vec<FaceId>,
    pub new_vertices: Vec<VertexId>,
}

/// Inset each face by `amount`.
///
/// Each corner is copied `amount` of the way toward the face centroid; the
/// face moves onto the inner ring and quads fill the border. `amount` must lie
/// in `[0, 1)`, otherwise every face is skipped as degenerate.
pub fn inset_faces(
    store: &mut MeshStore,
    face_ids: &[FaceId],
    amount: f32,
) -> BatchOutcome<FaceId, InsetFace> {
    let mut outcome = BatchOutcome::new();
    let amount_ok = (0.0..1.0).contains(&amount);
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
        if positions.len() < 3 || !amount_ok {
            outcome.skip(face_id, SkipReason::Degenerate);
            continue;
        }

        let centroid = positions.iter().copied().sum::<glam::Vec3>() / positions.len() as f32;
        let inner: Vec<VertexId> = positions
            .iter()
            .map(|&p| builder.store_mut().add_vertex(p.lerp(centroid, amount), None))
            .collect();

        let ring = &face.vertex_ids;
        let n = ring.len();
        let sides: Vec<FaceId> = (0..n)
            .filter_map(|i| {
                let j = (i + 1) % n;
                add_face_like(&mut builder, &face, &[ring[i], ring[j], inner[j], inner[i]])
            })
            .collect();
        rewire_face(&mut builder, face_id, inner.clone());

        trace!("inset_faces: {:?} -> {} border quads", face_id, sides.len());
        outcome.complete(
            face_id,
            InsetFace {
                inner: face_id,
                sides,
                new_vertices: inner,
            },
        );
    }
    outcome
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::ops::fixtures::{face_towards, unit_cube};
    use crate::ops::{face_centroid, face_normal};
    use crate::validate::is_watertight;

    #[test]
    fn test_inset_cube_face() {
        let mut mesh = unit_cube();
        let top = face_towards(&mesh, Vec3::Y);
        let outcome = inset_faces(&mut mesh, &[top], 0.5);

        assert!(outcome.is_complete());
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.face_count(), 10);
        assert!(is_watertight(&mesh));

        let inner = mesh.face_positions(top).unwrap();
        for p in inner {
            assert!((p.x.abs() - 0.25).abs() < 1e-6 && (p.z.abs() - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_inset_border_keeps_orientation() {
        let mut mesh = unit_cube();
        let top = face_towards(&mesh, Vec3::Y);
        let outcome = inset_faces(&mut mesh, &[top], 0.3);
        for &side in &outcome.completed[0].1.sides {
            let n = face_normal(&mesh, side).unwrap();
            assert!(n.y > 0.99, "border quad {:?} flipped: {:?}", side, n);
        }
        assert!((face_centroid(&mesh, top).unwrap().y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_inset_rejects_out_of_range_amount() {
        let mut mesh = unit_cube();
        let top = face_towards(&mesh, Vec3::Y);
        let outcome = inset_faces(&mut mesh, &[top, FaceId(9999)], 1.0);
        assert_eq!(
            outcome.skipped,
            vec![
                (top, SkipReason::Degenerate),
                (FaceId(9999), SkipReason::NotFound)
            ]
        );
        assert_eq!(mesh.face_count(), 6);
    }
}
