//! Vertex welding.

use std::collections::{HashMap, HashSet};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rewire_face;
use crate::builder::{MeshBuilder, edge_key};
use crate::store::MeshStore;
use crate::types::{EdgeId, FaceId, UvId, VertexId};

/// Which vertices to weld
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MergeTarget {
    /// Every cluster of vertices within this distance of a seed vertex
    Threshold(f32),
    /// Exactly these vertices, as one cluster
    Vertices(Vec<VertexId>),
}

/// Summary of a weld
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeResult {
    /// One surviving vertex per cluster, in cluster order
    pub representatives: Vec<VertexId>,
    /// Vertices folded into a representative and removed
    pub removed_vertices: Vec<VertexId>,
    /// Faces that collapsed below three corners
    pub removed_faces: Vec<FaceId>,
    /// Self-loop and duplicate edges dropped after the weld
    pub removed_edges: Vec<EdgeId>,
    /// Requested ids that did not exist
    pub skipped: Vec<VertexId>,
}

/// Group vertices into clusters of two or more, seeds first
fn clusters(store: &MeshStore, target: &MergeTarget) -> (Vec<Vec<VertexId>>, Vec<VertexId>) {
    match target {
        MergeTarget::Vertices(ids) => {
            let mut members = Vec::new();
            let mut skipped = Vec::new();
            for &id in ids {
                if store.vertex(id).is_none() {
                    skipped.push(id);
                } else if !members.contains(&id) {
                    members.push(id);
                }
            }
            let found = if members.len() > 1 { vec![members] } else { Vec::new() };
            (found, skipped)
        }
        MergeTarget::Threshold(distance) => {
            let vertices: Vec<(VertexId, Vec3)> =
                store.vertices().map(|v| (v.id, v.position)).collect();
            let mut assigned = vec![false; vertices.len()];
            let mut found = Vec::new();
            for seed in 0..vertices.len() {
                if assigned[seed] {
                    continue;
                }
                assigned[seed] = true;
                let (seed_id, seed_pos) = vertices[seed];
                let mut cluster = vec![seed_id];
                for other in (seed + 1)..vertices.len() {
                    if !assigned[other] && vertices[other].1.distance(seed_pos) <= *distance {
                        assigned[other] = true;
                        cluster.push(vertices[other].0);
                    }
                }
                if cluster.len() > 1 {
                    found.push(cluster);
                }
            }
            (found, Vec::new())
        }
    }
}

/// Remove repeated ids anywhere in the cycle, keeping first occurrences
fn dedup_keep_first(vertex_ids: &[VertexId]) -> Vec<VertexId> {
    let mut seen = HashSet::new();
    vertex_ids.iter().copied().filter(|v| seen.insert(*v)).collect()
}

/// Weld vertices together.
///
/// Each cluster collapses onto its seed (the first id encountered) placed at
/// the mean position of the cluster. Faces, edges and UVs are re-pointed at
/// the seed; repeated corners are removed from faces, faces left with fewer
/// than three corners are removed, and self-loop or duplicate edges are
/// dropped.
pub fn merge_vertices(store: &mut MeshStore, target: &MergeTarget) -> MergeResult {
    let (clusters, skipped) = clusters(store, target);
    let mut result = MergeResult {
        skipped,
        ..MergeResult::default()
    };
    if clusters.is_empty() {
        return result;
    }

    // ===== PHASE 1: representatives =====
    let mut remap: HashMap<VertexId, VertexId> = HashMap::new();
    for cluster in &clusters {
        let seed = cluster[0];
        let positions: Vec<Vec3> = cluster.iter().filter_map(|&v| store.position(v)).collect();
        let mean = positions.iter().copied().sum::<Vec3>() / positions.len() as f32;
        if let Some(vertex) = store.vertices.get_mut(&seed) {
            vertex.position = mean;
        }
        for &member in &cluster[1..] {
            remap.insert(member, seed);
        }
        result.representatives.push(seed);
        result.removed_vertices.extend_from_slice(&cluster[1..]);
    }
    let resolve = |v: VertexId| remap.get(&v).copied().unwrap_or(v);

    // ===== PHASE 2: re-point edges =====
    let touched_edges: Vec<(EdgeId, [VertexId; 2])> = store
        .edges()
        .filter(|e| e.vertex_ids.iter().any(|v| remap.contains_key(v)))
        .map(|e| (e.id, [resolve(e.vertex_ids[0]), resolve(e.vertex_ids[1])]))
        .collect();
    for (edge_id, ends) in &touched_edges {
        store.set_edge_vertices(*edge_id, *ends);
    }

    // ===== PHASE 3: rewrite faces through a shared edge table =====
    let touched_faces: Vec<(FaceId, Vec<VertexId>)> = store
        .faces()
        .filter(|f| f.vertex_ids.iter().any(|v| remap.contains_key(v)))
        .map(|f| {
            let mapped: Vec<VertexId> = f.vertex_ids.iter().map(|&v| resolve(v)).collect();
            (f.id, dedup_keep_first(&mapped))
        })
        .collect();

    let mut builder = MeshBuilder::indexing(store);
    for (face_id, cycle) in touched_faces {
        if cycle.len() < 3 {
            builder.store_mut().remove_face(face_id);
            result.removed_faces.push(face_id);
        } else if !rewire_face(&mut builder, face_id, cycle) {
            result.removed_faces.push(face_id);
        }
    }

    // ===== PHASE 4: drop self-loops and duplicates =====
    // Every edge sharing a key with a re-pointed edge folds onto the lowest
    // id for that key, whether or not it was re-pointed itself.
    let merged_keys: HashSet<(VertexId, VertexId)> = touched_edges
        .iter()
        .filter(|(_, [a, b])| a != b)
        .map(|(_, [a, b])| edge_key(*a, *b))
        .collect();
    let mut survivors: HashMap<(VertexId, VertexId), EdgeId> = HashMap::new();
    let mut folded: HashMap<EdgeId, EdgeId> = HashMap::new();
    for edge in builder.store().edges() {
        let key = edge_key(edge.vertex_ids[0], edge.vertex_ids[1]);
        if edge.vertex_ids[0] == edge.vertex_ids[1] || !merged_keys.contains(&key) {
            continue;
        }
        match survivors.get(&key) {
            Some(&kept) => {
                folded.insert(edge.id, kept);
            }
            None => {
                survivors.insert(key, edge.id);
            }
        }
    }

    if !folded.is_empty() {
        let face_ids = builder.store().face_ids();
        for face_id in face_ids {
            if let Some(face) = builder.store_mut().face_mut(face_id) {
                for edge_id in face.edge_ids.iter_mut() {
                    if let Some(&kept) = folded.get(edge_id) {
                        *edge_id = kept;
                    }
                }
            }
        }
    }

    let mut dropped: Vec<EdgeId> = touched_edges
        .iter()
        .filter(|(_, [a, b])| a == b)
        .map(|(edge_id, _)| *edge_id)
        .collect();
    dropped.extend(folded.keys().copied());
    dropped.sort();
    for edge_id in dropped {
        builder.store_mut().remove_edge(edge_id);
        result.removed_edges.push(edge_id);
    }

    // ===== PHASE 5: UVs and merged vertices =====
    let uv_moves: Vec<(UvId, VertexId)> = builder
        .store()
        .uvs()
        .filter_map(|uv| remap.get(&uv.vertex_id).map(|&to| (uv.id, to)))
        .collect();
    for (uv_id, to) in uv_moves {
        builder.store_mut().set_uv_vertex(uv_id, to);
    }
    for vertex_id in &result.removed_vertices {
        builder.store_mut().remove_vertex(*vertex_id);
    }

    debug!(
        "merge_vertices: {} clusters, {} vertices removed, {} faces collapsed, {} edges dropped",
        clusters.len(),
        result.removed_vertices.len(),
        result.removed_faces.len(),
        result.removed_edges.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;

    /// A pentagon whose corners 0 and 2 coincide, plus a triangle hanging off
    /// the duplicate
    fn pinched() -> (MeshStore, [VertexId; 5], FaceId, FaceId) {
        let mut mesh = MeshStore::new();
        let a = mesh.add_vertex(Vec3::ZERO, None);
        let b = mesh.add_vertex(Vec3::X, None);
        let a2 = mesh.add_vertex(Vec3::ZERO, None);
        let c = mesh.add_vertex(Vec3::new(1.0, 1.0, 0.0), None);
        let d = mesh.add_vertex(Vec3::Y, None);
        let e = mesh.add_vertex(Vec3::NEG_Y, None);

        let mut builder = MeshBuilder::new(&mut mesh);
        let poly = builder.add_ngon(&[a, b, a2, c, d]).unwrap();
        let tri = builder.add_ngon(&[a2, e, b]).unwrap();
        (mesh, [a, b, a2, c, d], poly, tri)
    }

    #[test]
    fn test_threshold_merge_removes_one_vertex() {
        let (mut mesh, [a, b, a2, c, d], poly, tri) = pinched();
        mesh.add_uv(a2, Vec2::new(0.5, 0.5));

        let result = merge_vertices(&mut mesh, &MergeTarget::Threshold(0.001));
        assert_eq!(result.representatives, vec![a]);
        assert_eq!(result.removed_vertices, vec![a2]);
        assert_eq!(mesh.vertex_count(), 5);
        assert!(mesh.vertex(a2).is_none());

        let poly = mesh.face(poly).unwrap();
        assert_eq!(poly.vertex_ids, vec![a, b, c, d]);
        assert_eq!(poly.edge_ids.len(), 4);
        let tri = mesh.face(tri).unwrap();
        assert_eq!(tri.vertex_ids.iter().filter(|&&v| v == a).count(), 1);

        assert!(mesh.uvs().all(|uv| uv.vertex_id == a));
        assert!(mesh.edges().all(|e| !e.contains(a2)));
        assert!(mesh.edges().all(|e| e.vertex_ids[0] != e.vertex_ids[1]));
    }

    #[test]
    fn test_merge_drops_duplicate_edges() {
        let mut mesh = MeshStore::new();
        let a = mesh.add_vertex(Vec3::ZERO, None);
        let b = mesh.add_vertex(Vec3::X, None);
        let b2 = mesh.add_vertex(Vec3::new(1.0, 0.0005, 0.0), None);
        let ab = mesh.add_edge(a, b, None);
        let ab2 = mesh.add_edge(a, b2, None);
        let bb2 = mesh.add_edge(b, b2, None);

        let result = merge_vertices(&mut mesh, &MergeTarget::Threshold(0.001));
        assert_eq!(mesh.edge_count(), 1);
        assert!(mesh.edge(ab).is_some());
        assert!(result.removed_edges.contains(&ab2));
        assert!(result.removed_edges.contains(&bb2));
        let mean = mesh.position(b).unwrap();
        assert!((mean - Vec3::new(1.0, 0.00025, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_merge_folds_older_duplicate_onto_repointed_edge() {
        let mut mesh = MeshStore::new();
        let s = mesh.add_vertex(Vec3::ZERO, None);
        let x = mesh.add_vertex(Vec3::X, None);
        let y = mesh.add_vertex(Vec3::Y, None);
        let m = mesh.add_vertex(Vec3::ZERO, None);
        // The edge that gets re-pointed has the lower id
        let xm = mesh.add_edge(x, m, None);
        let xs = mesh.add_edge(x, s, None);
        let sy = mesh.add_edge(s, y, None);
        let yx = mesh.add_edge(y, x, None);
        let face = mesh.add_face(vec![s, x, y], vec![xs, yx, sy], None);

        let result = merge_vertices(&mut mesh, &MergeTarget::Threshold(0.001));
        assert_eq!(result.removed_vertices, vec![m]);
        assert_eq!(result.removed_edges, vec![xs]);

        let between: Vec<EdgeId> = mesh
            .edges()
            .filter(|e| e.connects(x, s))
            .map(|e| e.id)
            .collect();
        assert_eq!(between, vec![xm], "duplicate edges remain after merge");
        let face = mesh.face(face).unwrap();
        assert!(face.edge_ids.contains(&xm));
        assert!(face.edge_ids.iter().all(|e| mesh.edge(*e).is_some()));
        assert!(crate::validate::validate_mesh_topology(&mesh).is_valid);
    }

    #[test]
    fn test_explicit_merge_collapses_triangle() {
        let mut mesh = MeshStore::new();
        let mut builder = MeshBuilder::new(&mut mesh);
        let face = builder
            .add_polygon(&[Vec3::ZERO, Vec3::X, Vec3::Y])
            .unwrap();
        let ids = mesh.face(face).unwrap().vertex_ids.clone();

        let result = merge_vertices(
            &mut mesh,
            &MergeTarget::Vertices(vec![ids[1], ids[2], VertexId(9999)]),
        );
        assert_eq!(result.skipped, vec![VertexId(9999)]);
        assert_eq!(result.removed_faces, vec![face]);
        assert_eq!(mesh.face_count(), 0);
        let rep = mesh.position(ids[1]).unwrap();
        assert!((rep - Vec3::new(0.5, 0.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_nothing_to_merge() {
        let mut mesh = crate::primitives::cube(1.0, 1);
        let result = merge_vertices(&mut mesh, &MergeTarget::Threshold(0.001));
        assert!(result.representatives.is_empty());
        assert_eq!(mesh.vertex_count(), 8);
    }
}
