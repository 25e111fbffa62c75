//! Edge and face dissolving.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use super::{BatchOutcome, SkipReason, rewire_face};
use crate::builder::{MeshBuilder, collapse_repeats};
use crate::store::MeshStore;
use crate::types::{EdgeId, FaceId, VertexId};

/// Rotate a cycle so it starts at `start`
fn rotated(cycle: &[VertexId], start: usize) -> Vec<VertexId> {
    cycle[start..].iter().chain(&cycle[..start]).copied().collect()
}

/// Remove back-and-forth spikes (`x, y, x`) left where two faces shared a
/// chain of edges
fn remove_spikes(mut cycle: Vec<VertexId>) -> Vec<VertexId> {
    loop {
        cycle = collapse_repeats(&cycle);
        let n = cycle.len();
        if n < 3 {
            return cycle;
        }
        let spike = (0..n).find(|&i| cycle[(i + n - 1) % n] == cycle[(i + 1) % n]);
        match spike {
            Some(i) => {
                // Drop the tip and one copy of its base
                let next = (i + 1) % n;
                let (first, second) = if i < next { (next, i) } else { (i, next) };
                cycle.remove(first);
                cycle.remove(second);
            }
            None => return cycle,
        }
    }
}

/// Join the two faces on either side of `edge_id` into the first one.
///
/// Returns the surviving face. The second face is removed and any edges or
/// vertices left loose are pruned.
pub(crate) fn join_across_edge(
    store: &mut MeshStore,
    edge_id: EdgeId,
) -> Result<FaceId, SkipReason> {
    let edge = store.edge(edge_id).cloned().ok_or(SkipReason::NotFound)?;
    let faces = store.faces_using_edge(edge_id);
    let [f1, f2] = match faces.as_slice() {
        [_] => return Err(SkipReason::Boundary),
        [a, b] => [*a, *b],
        [] => return Err(SkipReason::Boundary),
        _ => return Err(SkipReason::NonManifold),
    };
    let first = store.face(f1).cloned().ok_or(SkipReason::NotFound)?;
    let second = store.face(f2).cloned().ok_or(SkipReason::NotFound)?;

    let [mut u, mut v] = edge.vertex_ids;
    if !first.has_directed_edge(u, v) {
        std::mem::swap(&mut u, &mut v);
    }
    if !first.has_directed_edge(u, v) {
        return Err(SkipReason::Degenerate);
    }

    // First face from v around to u, second from u around to v
    let a = rotated(&first.vertex_ids, first.corner_of(v).ok_or(SkipReason::Degenerate)?);
    let mut other = second.vertex_ids.clone();
    if !second.has_directed_edge(v, u) {
        other.reverse();
    }
    let b = rotated(&other, other.iter().position(|&x| x == u).ok_or(SkipReason::Degenerate)?);
    if a.last() != Some(&u) || b.last() != Some(&v) {
        return Err(SkipReason::Degenerate);
    }

    let mut merged = a;
    merged.extend_from_slice(&b[1..b.len() - 1]);
    let merged = remove_spikes(merged);
    if merged.len() < 3 {
        return Err(SkipReason::Degenerate);
    }
    let distinct: HashSet<VertexId> = merged.iter().copied().collect();
    if distinct.len() != merged.len() {
        return Err(SkipReason::NonSimpleRegion);
    }

    let mut dead_edges = first.edge_ids.clone();
    dead_edges.extend_from_slice(&second.edge_ids);
    let mut dead_vertices = first.vertex_ids.clone();
    dead_vertices.extend_from_slice(&second.vertex_ids);

    let mut builder = MeshBuilder::indexing(store);
    builder.store_mut().remove_face(f2);
    if !rewire_face(&mut builder, f1, merged) {
        return Err(SkipReason::Degenerate);
    }
    builder.store_mut().prune_loose(&dead_edges, &dead_vertices);
    trace!("join_across_edge: {:?} merged {:?} into {:?}", edge_id, f2, f1);
    Ok(f1)
}

/// Dissolve each edge, joining the two faces on either side.
///
/// The surviving face keeps the lower id. A loose edge (used by no face) is
/// simply removed and reported as completed with `None`. Boundary and
/// non-manifold edges are skipped.
pub fn dissolve_edges(
    store: &mut MeshStore,
    edge_ids: &[EdgeId],
) -> BatchOutcome<EdgeId, Option<FaceId>> {
    let mut outcome = BatchOutcome::new();
    for &edge_id in edge_ids {
        let Some(edge) = store.edge(edge_id).cloned() else {
            outcome.skip(edge_id, SkipReason::NotFound);
            continue;
        };
        if !store.is_edge_used(edge_id) {
            store.remove_edge(edge_id);
            store.prune_loose(&[], &edge.vertex_ids);
            outcome.complete(edge_id, None);
            continue;
        }
        match join_across_edge(store, edge_id) {
            Ok(face) => outcome.complete(edge_id, Some(face)),
            Err(reason) => outcome.skip(edge_id, reason),
        }
    }
    outcome
}

/// Outline of a face region as a single directed cycle.
///
/// Fails if the region is closed, has holes, is pinched at a vertex, or its
/// faces disagree on winding.
fn region_outline(store: &MeshStore, region: &[FaceId]) -> Result<Vec<VertexId>, SkipReason> {
    let mut directed: Vec<(VertexId, VertexId)> = Vec::new();
    let mut seen = HashSet::new();
    for &face_id in region {
        let face = store.face(face_id).ok_or(SkipReason::NotFound)?;
        let n = face.vertex_ids.len();
        for i in 0..n {
            let pair = (face.vertex_ids[i], face.vertex_ids[(i + 1) % n]);
            if !seen.insert(pair) {
                return Err(SkipReason::InconsistentWinding);
            }
            directed.push(pair);
        }
    }

    let mut next: HashMap<VertexId, VertexId> = HashMap::new();
    let mut boundary = Vec::new();
    for &(a, b) in &directed {
        if seen.contains(&(b, a)) {
            continue;
        }
        if next.insert(a, b).is_some() {
            return Err(SkipReason::NonSimpleRegion);
        }
        boundary.push(a);
    }
    let Some(&start) = boundary.first() else {
        return Err(SkipReason::NonSimpleRegion);
    };

    let mut outline = vec![start];
    let mut current = start;
    loop {
        let Some(&to) = next.get(&current) else {
            return Err(SkipReason::NonSimpleRegion);
        };
        if to == start {
            break;
        }
        if outline.len() > boundary.len() {
            return Err(SkipReason::NonSimpleRegion);
        }
        outline.push(to);
        current = to;
    }
    if outline.len() != boundary.len() {
        return Err(SkipReason::NonSimpleRegion);
    }
    Ok(outline)
}

/// Dissolve faces, merging each edge-connected region into one face.
///
/// The region's first face (in input order) survives on the region outline;
/// the others are removed along with interior edges and vertices. Every input
/// face reports the surviving id. Regions with holes or pinched outlines are
/// skipped as a whole.
pub fn dissolve_faces(
    store: &mut MeshStore,
    face_ids: &[FaceId],
) -> BatchOutcome<FaceId, FaceId> {
    let mut results: HashMap<FaceId, Result<FaceId, SkipReason>> = HashMap::new();
    let mut pending: Vec<FaceId> = Vec::new();
    for &face_id in face_ids {
        if store.face(face_id).is_none() {
            results.insert(face_id, Err(SkipReason::NotFound));
        } else if !pending.contains(&face_id) {
            pending.push(face_id);
        }
    }

    // Group into regions connected through shared edges
    let mut regions: Vec<Vec<FaceId>> = Vec::new();
    let mut assigned: HashSet<FaceId> = HashSet::new();
    for &seed in &pending {
        if !assigned.insert(seed) {
            continue;
        }
        let mut region = vec![seed];
        let mut k = 0;
        while k < region.len() {
            for neighbor in store.adjacent_faces(region[k]) {
                if pending.contains(&neighbor) && assigned.insert(neighbor) {
                    region.push(neighbor);
                }
            }
            k += 1;
        }
        regions.push(region);
    }

    for region in regions {
        let keep = region[0];
        if region.len() == 1 {
            results.insert(keep, Ok(keep));
            continue;
        }
        let outline = match region_outline(store, &region) {
            Ok(outline) => outline,
            Err(reason) => {
                for &face_id in &region {
                    results.insert(face_id, Err(reason));
                }
                continue;
            }
        };

        let mut dead_edges = Vec::new();
        let mut dead_vertices = Vec::new();
        for &face_id in &region {
            if let Some(face) = store.face(face_id) {
                dead_edges.extend_from_slice(&face.edge_ids);
                dead_vertices.extend_from_slice(&face.vertex_ids);
            }
        }
        let mut builder = MeshBuilder::indexing(store);
        for &face_id in &region[1..] {
            builder.store_mut().remove_face(face_id);
        }
        rewire_face(&mut builder, keep, outline);
        let (edges, vertices) = builder.store_mut().prune_loose(&dead_edges, &dead_vertices);
        debug!(
            "dissolve_faces: {} faces into {:?}, pruned {} edges and {} vertices",
            region.len(),
            keep,
            edges,
            vertices
        );
        for &face_id in &region {
            results.insert(face_id, Ok(keep));
        }
    }
    BatchOutcome::in_request_order(face_ids, results)
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::ops::fixtures::{quad_grid, unit_cube, vertex_at};
    use crate::validate::is_watertight;

    #[test]
    fn test_dissolve_shared_edge() {
        let mut mesh = quad_grid(2, 1);
        let top = vertex_at(&mesh, Vec3::new(1.0, 1.0, 0.0));
        let bottom = vertex_at(&mesh, Vec3::new(1.0, 0.0, 0.0));
        let edge = mesh.find_edge(top, bottom).unwrap();
        let faces = mesh.faces_using_edge(edge);

        let outcome = dissolve_edges(&mut mesh, &[edge]);
        assert_eq!(outcome.completed, vec![(edge, Some(faces[0]))]);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.edge_count(), 6);
        let face = mesh.face(faces[0]).unwrap();
        assert_eq!(face.len(), 6);
        assert_eq!(face.edge_ids.len(), 6);
        assert!(face.has_directed_edge(bottom, vertex_at(&mesh, Vec3::new(2.0, 0.0, 0.0))));
    }

    #[test]
    fn test_dissolve_cube_edge_stays_closed() {
        let mut mesh = unit_cube();
        let edge = mesh.edge_ids()[0];
        dissolve_edges(&mut mesh, &[edge]);
        assert_eq!(mesh.face_count(), 5);
        assert_eq!(mesh.edge_count(), 11);
        assert_eq!(mesh.vertex_count(), 8);
        assert!(is_watertight(&mesh));
    }

    #[test]
    fn test_dissolve_loose_and_boundary_edges() {
        let mut mesh = quad_grid(1, 1);
        let boundary = mesh.edge_ids()[0];
        let a = mesh.add_vertex(Vec3::splat(5.0), None);
        let b = mesh.add_vertex(Vec3::splat(6.0), None);
        let loose = mesh.add_edge(a, b, None);

        let outcome = dissolve_edges(&mut mesh, &[boundary, loose, EdgeId(9999)]);
        assert_eq!(outcome.completed, vec![(loose, None)]);
        assert_eq!(
            outcome.skipped,
            vec![
                (boundary, SkipReason::Boundary),
                (EdgeId(9999), SkipReason::NotFound)
            ]
        );
        assert!(mesh.vertex(a).is_none());
    }

    #[test]
    fn test_dissolve_face_region() {
        let mut mesh = quad_grid(2, 2);
        let centre = vertex_at(&mesh, Vec3::new(1.0, 1.0, 0.0));
        let faces = mesh.face_ids();

        let outcome = dissolve_faces(&mut mesh, &faces);
        assert!(outcome.is_complete());
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.face(faces[0]).unwrap().len(), 8);
        assert_eq!(mesh.edge_count(), 8);
        assert!(mesh.vertex(centre).is_none());
        assert!(outcome.completed.iter().all(|(_, keep)| *keep == faces[0]));
    }

    #[test]
    fn test_dissolve_faces_reports_in_request_order() {
        let mut mesh = quad_grid(4, 1);
        let faces = mesh.face_ids();
        // faces[0] and faces[1] touch; faces[3] is on its own
        let request = [faces[0], faces[3], FaceId(9999), faces[1]];

        let outcome = dissolve_faces(&mut mesh, &request);
        assert_eq!(outcome.completed_ids(), vec![faces[0], faces[3], faces[1]]);
        assert_eq!(outcome.completed[2].1, faces[0]);
        assert_eq!(outcome.skipped, vec![(FaceId(9999), SkipReason::NotFound)]);
        assert_eq!(mesh.face_count(), 3);
    }

    #[test]
    fn test_dissolve_ring_with_hole_is_skipped() {
        let mut mesh = quad_grid(3, 3);
        let centre = crate::ops::face_centroid;
        let ring: Vec<FaceId> = mesh
            .face_ids()
            .into_iter()
            .filter(|&f| {
                let c = centre(&mesh, f).unwrap();
                (c - Vec3::new(1.5, 1.5, 0.0)).length() > 0.1
            })
            .collect();
        assert_eq!(ring.len(), 8);

        let outcome = dissolve_faces(&mut mesh, &ring);
        assert_eq!(outcome.skipped.len(), 8);
        assert!(outcome.skipped.iter().all(|(_, r)| *r == SkipReason::NonSimpleRegion));
        assert_eq!(mesh.face_count(), 9);
    }
}
