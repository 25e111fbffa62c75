//! Edge rings and loop cuts.
//!
//! An edge ring is the sequence of "rungs" crossed when walking from an edge
//! to the opposite edge of each quad beside it. The walk runs in both
//! directions from the seed and stops at a boundary, a non-quad face, a
//! non-manifold edge, or when it closes back on the seed. Each rung is stored
//! oriented so that consecutive rungs point the same way across their quad.

use std::collections::HashSet;

use tracing::{debug, trace};

use super::{add_face_like, rewire_face, thread_chain};
use crate::builder::MeshBuilder;
use crate::store::MeshStore;
use crate::types::{EdgeId, FaceId, MeshError, MeshResult, VertexId};

/// The rungs and quads of an edge ring
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRing {
    /// Rungs in walk order, the seed included
    pub edges: Vec<EdgeId>,
    /// Endpoints of each rung, oriented consistently along the ring
    pub rungs: Vec<[VertexId; 2]>,
    /// Quads between consecutive rungs; `faces[i]` lies between rung `i` and
    /// rung `i + 1` (wrapping when closed)
    pub faces: Vec<FaceId>,
    /// Whether the ring closes on itself
    pub closed: bool,
}

/// Result of a loop cut
#[derive(Debug, Clone, PartialEq)]
pub struct LoopCutResult {
    /// The rungs that were cut (and removed)
    pub ring_edges: Vec<EdgeId>,
    /// New vertices, `cuts` per rung in ring order
    pub new_vertices: Vec<VertexId>,
    /// Strip faces added next to the reused quads
    pub new_faces: Vec<FaceId>,
}

/// Rung opposite to `rung` in a quad, oriented parallel to it
fn opposite(store: &MeshStore, face_id: FaceId, rung: [VertexId; 2]) -> Option<(EdgeId, [VertexId; 2])> {
    let face = store.face(face_id)?;
    if face.len() != 4 || face.edge_ids.len() != 4 {
        return None;
    }
    let [a, b] = rung;
    let ia = face.corner_of(a)?;
    let ib = face.corner_of(b)?;
    // Neighbour of a that is not b, neighbour of b that is not a
    let across = |i: usize, skip: VertexId| {
        let prev = face.vertex_ids[(i + 3) % 4];
        let next = face.vertex_ids[(i + 1) % 4];
        if prev == skip { next } else { prev }
    };
    let c = across(ia, b);
    let d = across(ib, a);
    let k = (0..4).find(|&i| {
        let (x, y) = (face.vertex_ids[i], face.vertex_ids[(i + 1) % 4]);
        (x == c && y == d) || (x == d && y == c)
    })?;
    Some((face.edge_ids[k], [c, d]))
}

/// Walk one direction of the ring, entering through `via`
fn walk(
    store: &MeshStore,
    seed: EdgeId,
    seed_rung: [VertexId; 2],
    mut via: FaceId,
    visited: &mut HashSet<FaceId>,
) -> (Vec<(EdgeId, [VertexId; 2])>, Vec<FaceId>, bool) {
    let mut rungs = Vec::new();
    let mut faces = Vec::new();
    let mut rung = seed_rung;
    loop {
        if !visited.insert(via) {
            return (rungs, faces, false);
        }
        let Some((edge, next_rung)) = opposite(store, via, rung) else {
            return (rungs, faces, false);
        };
        faces.push(via);
        if edge == seed {
            return (rungs, faces, true);
        }
        rungs.push((edge, next_rung));
        let beyond: Vec<FaceId> = store
            .faces_using_edge(edge)
            .into_iter()
            .filter(|&f| f != via)
            .collect();
        match beyond.as_slice() {
            [next] => via = *next,
            _ => return (rungs, faces, false),
        }
        rung = next_rung;
    }
}

/// Find the edge ring through `edge_id`.
///
/// Fails with `NotFound` if the edge does not exist. An edge with no quad
/// beside it yields a ring holding just the seed.
pub fn edge_ring(store: &MeshStore, edge_id: EdgeId) -> MeshResult<EdgeRing> {
    let edge = store.edge(edge_id).ok_or(MeshError::edge_not_found(edge_id))?;
    let seed_rung = edge.vertex_ids;
    let faces = store.faces_using_edge(edge_id);
    let mut visited = HashSet::new();

    let (forward, forward_faces, closed) = match faces.first() {
        Some(&via) if faces.len() <= 2 => walk(store, edge_id, seed_rung, via, &mut visited),
        _ => (Vec::new(), Vec::new(), false),
    };
    let (backward, backward_faces) = match faces.get(1) {
        Some(&via) if !closed && faces.len() == 2 => {
            let (rungs, faces, _) = walk(store, edge_id, seed_rung, via, &mut visited);
            (rungs, faces)
        }
        _ => (Vec::new(), Vec::new()),
    };

    let mut ring = EdgeRing {
        edges: Vec::new(),
        rungs: Vec::new(),
        faces: Vec::new(),
        closed,
    };
    for (edge, rung) in backward.iter().rev() {
        ring.edges.push(*edge);
        ring.rungs.push(*rung);
    }
    ring.edges.push(edge_id);
    ring.rungs.push(seed_rung);
    for (edge, rung) in &forward {
        ring.edges.push(*edge);
        ring.rungs.push(*rung);
    }
    ring.faces.extend(backward_faces.iter().rev());
    ring.faces.extend(forward_faces);
    trace!(
        "edge_ring: {:?} -> {} rungs, closed = {}",
        edge_id,
        ring.edges.len(),
        closed
    );
    Ok(ring)
}

/// Cut `cuts` parallel loops across the edge ring through `edge_id`.
///
/// Every rung is split into `cuts + 1` equal segments and every quad of the
/// ring is replaced by `cuts + 1` strips; the first strip keeps the quad's id.
/// Faces outside the ring that touch a rung are threaded through the new
/// vertices. `cuts == 0` leaves the mesh untouched.
pub fn loop_cut(store: &mut MeshStore, edge_id: EdgeId, cuts: usize) -> MeshResult<LoopCutResult> {
    let ring = edge_ring(store, edge_id)?;
    let mut result = LoopCutResult {
        ring_edges: ring.edges.clone(),
        new_vertices: Vec::new(),
        new_faces: Vec::new(),
    };
    if cuts == 0 {
        return Ok(result);
    }

    let ring_faces: HashSet<FaceId> = ring.faces.iter().copied().collect();
    let mut threaded: Vec<(FaceId, usize)> = Vec::new();
    for (r, &edge) in ring.edges.iter().enumerate() {
        for face in store.faces_using_edge(edge) {
            if !ring_faces.contains(&face) {
                threaded.push((face, r));
            }
        }
    }

    // Resolve every rung before any vertex is added
    let endpoints = ring
        .rungs
        .iter()
        .map(|&[a, b]| match (store.position(a), store.position(b)) {
            (Some(pa), Some(pb)) => Ok(([a, b], [pa, pb])),
            _ => Err(MeshError::Malformed(format!(
                "edge ring rung {:?}-{:?} has a missing endpoint",
                a, b
            ))),
        })
        .collect::<MeshResult<Vec<_>>>()?;

    let mut builder = MeshBuilder::indexing(store);

    // ===== PHASE 1: rails =====
    let mut rails: Vec<Vec<VertexId>> = Vec::with_capacity(endpoints.len());
    for ([a, b], [pa, pb]) in endpoints {
        let mut rail = Vec::with_capacity(cuts + 2);
        rail.push(a);
        for k in 1..=cuts {
            let t = k as f32 / (cuts + 1) as f32;
            let id = builder.store_mut().add_vertex(pa.lerp(pb, t), None);
            result.new_vertices.push(id);
            rail.push(id);
        }
        rail.push(b);
        rails.push(rail);
    }

    // ===== PHASE 2: split the ring quads into strips =====
    let count = ring.rungs.len();
    for (i, &face_id) in ring.faces.iter().enumerate() {
        let j = (i + 1) % count;
        let Some(face) = builder.store().face(face_id).cloned() else {
            continue;
        };
        let [a, b] = ring.rungs[i];
        let along = face.has_directed_edge(a, b);
        for s in 0..=cuts {
            let mut strip = [rails[i][s], rails[i][s + 1], rails[j][s + 1], rails[j][s]];
            if !along {
                strip.reverse();
            }
            if s == 0 {
                rewire_face(&mut builder, face_id, strip.to_vec());
            } else if let Some(new_face) = add_face_like(&mut builder, &face, &strip) {
                result.new_faces.push(new_face);
            }
        }
    }

    // ===== PHASE 3: thread faces outside the ring =====
    for (face_id, r) in threaded {
        let Some(face) = builder.store().face(face_id).cloned() else {
            continue;
        };
        let [a, b] = ring.rungs[r];
        let chain = &rails[r][1..=cuts];
        if let Some(cycle) = thread_chain(&face, a, b, chain) {
            rewire_face(&mut builder, face_id, cycle);
        }
    }

    let (edges, _) = builder.store_mut().prune_loose(&ring.edges, &[]);
    debug!(
        "loop_cut: {:?} cut {} rungs {} times, {} rungs removed",
        edge_id,
        count,
        cuts,
        edges
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::ops::fixtures::{quad_grid, unit_cube, vertex_at};
    use crate::validate::is_watertight;

    fn vertical_edge(mesh: &MeshStore, x: f32) -> EdgeId {
        let top = vertex_at(mesh, Vec3::new(x, 1.0, 0.0));
        let bottom = vertex_at(mesh, Vec3::new(x, 0.0, 0.0));
        mesh.find_edge(top, bottom).unwrap()
    }

    #[test]
    fn test_edge_ring_open_strip() {
        let mesh = quad_grid(3, 1);
        let seed = vertical_edge(&mesh, 1.0);
        let ring = edge_ring(&mesh, seed).unwrap();
        assert!(!ring.closed);
        assert_eq!(ring.edges.len(), 4);
        assert_eq!(ring.faces.len(), 3);
        assert!(ring.edges.contains(&seed));
        // All rungs point the same way
        let dirs: Vec<f32> = ring
            .rungs
            .iter()
            .map(|[a, b]| mesh.position(*b).unwrap().y - mesh.position(*a).unwrap().y)
            .collect();
        assert!(dirs.iter().all(|d| d.signum() == dirs[0].signum()));
    }

    #[test]
    fn test_edge_ring_closes_on_cube() {
        let mesh = unit_cube();
        let seed = mesh.edge_ids()[0];
        let ring = edge_ring(&mesh, seed).unwrap();
        assert!(ring.closed);
        assert_eq!(ring.edges.len(), 4);
        assert_eq!(ring.faces.len(), 4);
    }

    #[test]
    fn test_loop_cut_strip() {
        let mut mesh = quad_grid(3, 1);
        let seed = vertical_edge(&mesh, 2.0);
        let result = loop_cut(&mut mesh, seed, 1).unwrap();

        assert_eq!(result.new_vertices.len(), 4);
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.edge_count(), 17);
        for &v in &result.new_vertices {
            assert!((mesh.position(v).unwrap().y - 0.5).abs() < 1e-6);
        }
        assert!(mesh.faces().all(|f| f.len() == 4 && f.edge_ids.len() == 4));
        for face in mesh.faces() {
            let n = crate::ops::face_normal(&mesh, face.id).unwrap();
            assert!(n.z > 0.99, "strip {:?} flipped", face.id);
        }
    }

    #[test]
    fn test_loop_cut_cube_stays_closed() {
        let mut mesh = unit_cube();
        let seed = mesh.edge_ids()[0];
        let result = loop_cut(&mut mesh, seed, 2).unwrap();
        assert_eq!(result.new_vertices.len(), 8);
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.face_count(), 14);
        assert!(is_watertight(&mesh));
    }

    #[test]
    fn test_loop_cut_threads_neighbouring_triangle() {
        let mut mesh = quad_grid(1, 1);
        let right_top = vertex_at(&mesh, Vec3::new(1.0, 1.0, 0.0));
        let right_bottom = vertex_at(&mesh, Vec3::new(1.0, 0.0, 0.0));
        let mut builder = MeshBuilder::indexing(&mut mesh);
        let tip = builder.vertex(Vec3::new(2.0, 0.5, 0.0));
        let tri = builder.add_triangle([right_bottom, tip, right_top]).unwrap();

        let left = vertical_edge(&mesh, 0.0);
        loop_cut(&mut mesh, left, 1).unwrap();
        assert_eq!(mesh.face(tri).unwrap().len(), 4);
        assert_eq!(mesh.face_count(), 3);
    }

    #[test]
    fn test_loop_cut_missing_edge() {
        let mut mesh = unit_cube();
        assert!(loop_cut(&mut mesh, EdgeId(9999), 1).is_err());
    }

    #[test]
    fn test_missing_rung_endpoint_leaves_store_untouched() {
        let mut mesh = quad_grid(2, 1);
        let seed = vertical_edge(&mesh, 0.0);
        let far_corner = vertex_at(&mesh, Vec3::new(2.0, 1.0, 0.0));
        mesh.vertices.remove(&far_corner);
        let (vertices, edges, faces) = (mesh.vertex_count(), mesh.edge_count(), mesh.face_count());

        let result = loop_cut(&mut mesh, seed, 2);
        assert!(matches!(result, Err(MeshError::Malformed(_))));
        assert_eq!(mesh.vertex_count(), vertices);
        assert_eq!(mesh.edge_count(), edges);
        assert_eq!(mesh.face_count(), faces);
    }
}
