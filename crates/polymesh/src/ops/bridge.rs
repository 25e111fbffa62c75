//! Bridging edges with new faces.

use tracing::trace;

use super::{BatchOutcome, SkipReason};
use crate::builder::MeshBuilder;
use crate::store::MeshStore;
use crate::types::{EdgeId, FaceId, MeshError, MeshResult};

/// Span a face between two edges.
///
/// Endpoints are paired so the connecting sides are as short as possible. The
/// face is wound against any face already on `a`, so the bridge continues the
/// surface instead of folding over it. Edges sharing an endpoint produce a
/// triangle; bridging an edge to itself produces nothing.
pub fn bridge_edges(store: &mut MeshStore, a: EdgeId, b: EdgeId) -> MeshResult<Option<FaceId>> {
    let [a0, a1] = store
        .edge(a)
        .ok_or(MeshError::edge_not_found(a))?
        .vertex_ids;
    let [mut b0, mut b1] = store
        .edge(b)
        .ok_or(MeshError::edge_not_found(b))?
        .vertex_ids;
    if a == b {
        return Ok(None);
    }

    let position = |v| store.position(v).ok_or(MeshError::vertex_not_found(v));
    let (pa0, pa1, pb0, pb1) = (position(a0)?, position(a1)?, position(b0)?, position(b1)?);
    let straight = pa0.distance(pb0) + pa1.distance(pb1);
    let crossed = pa0.distance(pb1) + pa1.distance(pb0);
    if crossed < straight {
        std::mem::swap(&mut b0, &mut b1);
    }

    let a_walked_forward = store
        .faces_using_edge(a)
        .iter()
        .filter_map(|&f| store.face(f))
        .any(|f| f.has_directed_edge(a0, a1));
    let ring = if a_walked_forward {
        [a1, a0, b0, b1]
    } else {
        [a0, a1, b1, b0]
    };

    let mut builder = MeshBuilder::indexing(store);
    let face = builder.add_ngon(&ring);
    trace!("bridge_edges: {:?} + {:?} -> {:?}", a, b, face);
    Ok(face)
}

/// Bridge two edge loops pairwise by index.
///
/// Outcomes are keyed by the edge of `loop_a`. Edges without a partner are
/// skipped as `Unpaired`; pairs that yield no face as `Degenerate`.
pub fn bridge_edge_loops(
    store: &mut MeshStore,
    loop_a: &[EdgeId],
    loop_b: &[EdgeId],
) -> BatchOutcome<EdgeId, FaceId> {
    let mut outcome = BatchOutcome::new();
    for (i, &a) in loop_a.iter().enumerate() {
        let Some(&b) = loop_b.get(i) else {
            outcome.skip(a, SkipReason::Unpaired);
            continue;
        };
        match bridge_edges(store, a, b) {
            Ok(Some(face)) => outcome.complete(a, face),
            Ok(None) => outcome.skip(a, SkipReason::Degenerate),
            Err(_) => outcome.skip(a, SkipReason::NotFound),
        }
    }
    outcome
}
