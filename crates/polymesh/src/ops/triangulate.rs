//! Triangulation and quadrangulation.

use std::collections::HashMap;

use tracing::trace;

use super::dissolve::join_across_edge;
use super::{BatchOutcome, SkipReason, add_face_like, face_normal, rewire_face};
use crate::builder::MeshBuilder;
use crate::store::MeshStore;
use crate::types::{Face, FaceId, VertexId};

/// Minimum normal alignment for two triangles to be joined into a quad
const PAIR_ALIGNMENT: f32 = 0.5;

/// Split a face into pieces given as corner index lists; the first piece
/// keeps the face id
fn split_face(builder: &mut MeshBuilder<'_>, face: &Face, pieces: &[Vec<usize>]) -> Vec<FaceId> {
    let mut result = Vec::with_capacity(pieces.len());
    for (k, piece) in pieces.iter().enumerate() {
        let cycle: Vec<VertexId> = piece.iter().map(|&i| face.vertex_ids[i]).collect();
        if k == 0 {
            if rewire_face(builder, face.id, cycle) {
                result.push(face.id);
            }
        } else if let Some(id) = add_face_like(builder, face, &cycle) {
            result.push(id);
        }
    }
    result
}

/// Fan-triangulate faces from their first corner.
///
/// Each face reports its triangles, the first of which keeps the face id.
/// Triangles are reported unchanged.
pub fn triangulate_faces(
    store: &mut MeshStore,
    face_ids: &[FaceId],
) -> BatchOutcome<FaceId, Vec<FaceId>> {
    let mut outcome = BatchOutcome::new();
    let mut builder = MeshBuilder::indexing(store);
    for &face_id in face_ids {
        let Some(face) = builder.store().face(face_id).cloned() else {
            outcome.skip(face_id, SkipReason::NotFound);
            continue;
        };
        let n = face.len();
        if n < 3 {
            outcome.skip(face_id, SkipReason::Degenerate);
            continue;
        }
        let pieces: Vec<Vec<usize>> = (1..n - 1).map(|i| vec![0, i, i + 1]).collect();
        let triangles = split_face(&mut builder, &face, &pieces);
        trace!("triangulate_faces: {:?} -> {} triangles", face_id, triangles.len());
        outcome.complete(face_id, triangles);
    }
    outcome
}

/// Corner index lists of a quad fan over an n-gon, closed by a triangle when
/// `n` is odd
fn quad_fan(n: usize) -> Vec<Vec<usize>> {
    let mut pieces = Vec::new();
    let mut i = 1;
    while i + 2 < n {
        pieces.push(vec![0, i, i + 1, i + 2]);
        i += 2;
    }
    if i + 1 < n {
        pieces.push(vec![0, i, i + 1]);
    }
    pieces
}

/// Turn faces into quads where possible.
///
/// N-gons are split into a quad fan from their first corner. Triangles in
/// the batch are paired with an adjacent, similarly facing triangle from the
/// same batch by dissolving the shared edge; a triangle with no partner is
/// skipped as `Unpaired`. Quads are reported unchanged.
pub fn quadrangulate_faces(
    store: &mut MeshStore,
    face_ids: &[FaceId],
) -> BatchOutcome<FaceId, Vec<FaceId>> {
    let mut results: HashMap<FaceId, Result<Vec<FaceId>, SkipReason>> = HashMap::new();
    let mut triangles: Vec<FaceId> = Vec::new();

    // ===== PHASE 1: n-gons and quads =====
    {
        let mut builder = MeshBuilder::indexing(store);
        for &face_id in face_ids {
            let Some(face) = builder.store().face(face_id).cloned() else {
                results.insert(face_id, Err(SkipReason::NotFound));
                continue;
            };
            match face.len() {
                0..=2 => {
                    results.insert(face_id, Err(SkipReason::Degenerate));
                }
                3 => {
                    if !triangles.contains(&face_id) {
                        triangles.push(face_id);
                    }
                }
                4 => {
                    results.insert(face_id, Ok(vec![face_id]));
                }
                n => {
                    let pieces = split_face(&mut builder, &face, &quad_fan(n));
                    results.insert(face_id, Ok(pieces));
                }
            }
        }
    }

    // ===== PHASE 2: pair triangles =====
    let mut paired: Vec<FaceId> = Vec::new();
    for &tri in &triangles {
        if paired.contains(&tri) {
            continue;
        }
        let Some(face) = store.face(tri).cloned() else {
            continue;
        };
        let view: &MeshStore = store;
        let normal = face_normal(view, tri).unwrap_or_default();
        let partner = face.edge_ids.iter().find_map(|&edge| {
            let faces = view.faces_using_edge(edge);
            let other = match faces.as_slice() {
                [x, y] if *x == tri => *y,
                [x, y] if *y == tri => *x,
                _ => return None,
            };
            let eligible = other != tri
                && triangles.contains(&other)
                && !paired.contains(&other)
                && face_normal(view, other).is_some_and(|n| n.dot(normal) > PAIR_ALIGNMENT);
            eligible.then_some((edge, other))
        });
        let Some((edge, other)) = partner else {
            continue;
        };
        if let Ok(quad) = join_across_edge(store, edge) {
            paired.push(tri);
            paired.push(other);
            results.insert(tri, Ok(vec![quad]));
            results.insert(other, Ok(vec![quad]));
        }
    }
    for &tri in &triangles {
        if !paired.contains(&tri) {
            results.insert(tri, Err(SkipReason::Unpaired));
        }
    }
    BatchOutcome::in_request_order(face_ids, results)
}
