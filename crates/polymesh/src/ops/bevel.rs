//! Edge chamfering.

use std::collections::HashMap;

use tracing::trace;

use super::{BatchOutcome, SkipReason, add_face_like, rewire_face};
use crate::builder::MeshBuilder;
use crate::store::MeshStore;
use crate::types::{EdgeId, Face, FaceId, MeshError, MeshResult, VertexId};

/// What one bevelled edge turned into
#[derive(Debug, Clone, PartialEq)]
pub struct BevelResult {
    /// Face filling the chamfer
    pub face: FaceId,
    /// Offset vertices slid along the neighbouring edges
    pub new_vertices: Vec<VertexId>,
    /// Endpoints that no face references anymore
    pub removed_vertices: Vec<VertexId>,
}

/// Offset vertices keyed by (corner, neighbour it slides toward)
struct Slides {
    width: f32,
    created: HashMap<(VertexId, VertexId), VertexId>,
    order: Vec<VertexId>,
}

impl Slides {
    fn get_or_create(
        &mut self,
        store: &mut MeshStore,
        corner: VertexId,
        toward: VertexId,
    ) -> Option<VertexId> {
        if let Some(&id) = self.created.get(&(corner, toward)) {
            return Some(id);
        }
        let from = store.position(corner)?;
        let to = store.position(toward)?;
        let length = from.distance(to);
        if length <= f32::EPSILON {
            return None;
        }
        let t = (self.width / length).min(0.5);
        let id = store.add_vertex(from.lerp(to, t), None);
        self.created.insert((corner, toward), id);
        self.order.push(id);
        Some(id)
    }

    fn get(&self, corner: VertexId, toward: VertexId) -> Option<VertexId> {
        self.created.get(&(corner, toward)).copied()
    }
}

/// Index `i` such that the face walks `from` then `to` at `i`, `i + 1`
fn directed_index(face: &Face, from: VertexId, to: VertexId) -> Option<usize> {
    let n = face.vertex_ids.len();
    (0..n).find(|&i| face.vertex_ids[i] == from && face.vertex_ids[(i + 1) % n] == to)
}

fn bevel_one(
    store: &mut MeshStore,
    edge_id: EdgeId,
    width: f32,
) -> Result<BevelResult, SkipReason> {
    let edge = store.edge(edge_id).cloned().ok_or(SkipReason::NotFound)?;
    if width <= 0.0 {
        return Err(SkipReason::Degenerate);
    }
    let faces = store.faces_using_edge(edge_id);
    match faces.len() {
        0 => return Err(SkipReason::Boundary),
        1 | 2 => {}
        _ => return Err(SkipReason::NonManifold),
    }

    // Orient the edge so the first face walks u -> v
    let [mut u, mut v] = edge.vertex_ids;
    let first = store.face(faces[0]).cloned().ok_or(SkipReason::NotFound)?;
    if directed_index(&first, u, v).is_none() {
        std::mem::swap(&mut u, &mut v);
    }
    let i = directed_index(&first, u, v).ok_or(SkipReason::Degenerate)?;
    let second = match faces.get(1) {
        Some(&id) => Some(store.face(id).cloned().ok_or(SkipReason::NotFound)?),
        None => None,
    };
    let j = match &second {
        Some(face) => Some(directed_index(face, v, u).ok_or(SkipReason::InconsistentWinding)?),
        None => None,
    };

    let old_edges: Vec<EdgeId> = store
        .edges_using_vertex(u)
        .into_iter()
        .chain(store.edges_using_vertex(v))
        .collect();
    let mut slides = Slides {
        width,
        created: HashMap::new(),
        order: Vec::new(),
    };
    let mut builder = MeshBuilder::indexing(store);

    // ===== PHASE 1: pull the edge's own faces off the edge =====
    let n = first.vertex_ids.len();
    let prev_u = first.vertex_ids[(i + n - 1) % n];
    let next_v = first.vertex_ids[(i + 2) % n];
    let s1u = slides
        .get_or_create(builder.store_mut(), u, prev_u)
        .ok_or(SkipReason::Degenerate)?;
    let s1v = slides
        .get_or_create(builder.store_mut(), v, next_v)
        .ok_or(SkipReason::Degenerate)?;

    let mut second_slides = None;
    if let (Some(face), Some(j)) = (&second, j) {
        let m = face.vertex_ids.len();
        let prev_v = face.vertex_ids[(j + m - 1) % m];
        let next_u = face.vertex_ids[(j + 2) % m];
        let s2v = slides
            .get_or_create(builder.store_mut(), v, prev_v)
            .ok_or(SkipReason::Degenerate)?;
        let s2u = slides
            .get_or_create(builder.store_mut(), u, next_u)
            .ok_or(SkipReason::Degenerate)?;
        second_slides = Some((s2u, s2v));
    }

    let mut cycle = first.vertex_ids.clone();
    cycle[i] = s1u;
    cycle[(i + 1) % n] = s1v;
    rewire_face(&mut builder, first.id, cycle);
    if let (Some(face), Some(j), Some((s2u, s2v))) = (&second, j, second_slides) {
        let m = face.vertex_ids.len();
        let mut cycle = face.vertex_ids.clone();
        cycle[j] = s2v;
        cycle[(j + 1) % m] = s2u;
        rewire_face(&mut builder, face.id, cycle);
    }

    // ===== PHASE 2: thread the other faces at each endpoint =====
    let mut retained_u = second.is_none();
    let mut retained_v = second.is_none();
    let others: Vec<FaceId> = {
        let store = builder.store();
        let mut ids = store.faces_using_vertex(u);
        for id in store.faces_using_vertex(v) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    };
    for face_id in others {
        let Some(face) = builder.store().face(face_id).cloned() else {
            continue;
        };
        let m = face.vertex_ids.len();
        let mut cycle = Vec::with_capacity(m + 2);
        for k in 0..m {
            let corner = face.vertex_ids[k];
            if corner != u && corner != v {
                cycle.push(corner);
                continue;
            }
            let prev = slides.get(corner, face.vertex_ids[(k + m - 1) % m]);
            let next = slides.get(corner, face.vertex_ids[(k + 1) % m]);
            cycle.extend(prev);
            if prev.is_none() || next.is_none() {
                cycle.push(corner);
                if corner == u {
                    retained_u = true;
                } else {
                    retained_v = true;
                }
            }
            cycle.extend(next);
        }
        rewire_face(&mut builder, face_id, cycle);
    }

    // ===== PHASE 3: fill the chamfer =====
    let mut ring = vec![s1v, s1u];
    if retained_u {
        ring.push(u);
    }
    if let Some((s2u, s2v)) = second_slides {
        ring.push(s2u);
        ring.push(s2v);
    }
    if retained_v {
        ring.push(v);
    }
    let face = add_face_like(&mut builder, &first, &ring).ok_or(SkipReason::Degenerate)?;

    let store = builder.store_mut();
    let mut dead_edges = old_edges;
    dead_edges.push(edge_id);
    store.prune_loose(&dead_edges, &[u, v]);
    let removed_vertices: Vec<VertexId> = [u, v]
        .into_iter()
        .filter(|&id| store.vertex(id).is_none())
        .collect();

    trace!(
        "bevel_edge: {:?} -> face {:?}, {} offset vertices",
        edge_id,
        face,
        slides.order.len()
    );
    Ok(BevelResult {
        face,
        new_vertices: slides.order,
        removed_vertices,
    })
}

/// Chamfer a single edge.
///
/// Fails with `NotFound` for a missing edge and `Unsupported` for edges that
/// cannot be bevelled (loose, non-manifold or inconsistently wound).
pub fn bevel_edge(store: &mut MeshStore, edge_id: EdgeId, width: f32) -> MeshResult<BevelResult> {
    bevel_one(store, edge_id, width).map_err(|reason| match reason {
        SkipReason::NotFound => MeshError::edge_not_found(edge_id),
        other => MeshError::Unsupported(format!("cannot bevel edge {}: {:?}", edge_id.0, other)),
    })
}

/// Chamfer each edge by `width`.
///
/// The endpoints of each edge slide `width` along the other edges of the
/// faces around it (at most halfway); a new face fills the gap. Endpoints
/// that no face references afterwards are removed with their loose edges.
pub fn bevel_edges(
    store: &mut MeshStore,
    edge_ids: &[EdgeId],
    width: f32,
) -> BatchOutcome<EdgeId, BevelResult> {
    let mut outcome = BatchOutcome::new();
    for &edge_id in edge_ids {
        match bevel_one(store, edge_id, width) {
            Ok(result) => outcome.complete(edge_id, result),
            Err(reason) => outcome.skip(edge_id, reason),
        }
    }
    outcome
}
