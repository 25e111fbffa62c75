//! Read-only topology checks.
//!
//! The validator never fails: it walks the store and reports what it finds.
//! Structural problems (faces that are too small, degenerate or dangling) are
//! errors and make the mesh invalid. Orphans and non-manifold edges are
//! warnings only.

use std::collections::HashMap;

use polymesh_config::Tolerances;
use serde::Serialize;
use tracing::debug;

use crate::store::MeshStore;
use crate::types::{EdgeId, FaceId, VertexId};

/// One finding of the validator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TopologyIssue {
    /// A face with fewer than three corners
    InvalidFace { face_id: FaceId, corners: usize },
    /// Three consecutive corners span (almost) no area
    DegenerateFace {
        face_id: FaceId,
        corner: usize,
        area: f32,
    },
    /// Vertex and edge lists of a face differ in length
    MismatchedEdges {
        face_id: FaceId,
        vertices: usize,
        edges: usize,
    },
    /// A face refers to a vertex that does not exist
    MissingFaceVertex { face_id: FaceId, vertex_id: VertexId },
    /// A face refers to an edge that does not exist
    MissingFaceEdge { face_id: FaceId, edge_id: EdgeId },
    /// An edge refers to a vertex that does not exist
    MissingEdgeVertex { edge_id: EdgeId, vertex_id: VertexId },
    /// An edge whose two endpoints are the same vertex
    SelfLoopEdge { edge_id: EdgeId },
    /// A vertex no face uses
    OrphanedVertex { vertex_id: VertexId },
    /// An edge no face uses
    OrphanedEdge { edge_id: EdgeId },
    /// An edge used by more than two faces
    NonManifoldEdge { edge_id: EdgeId, faces: usize },
}

impl std::fmt::Display for TopologyIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFace { face_id, corners } => {
                write!(f, "Face {:?} has {} corners, needs at least 3", face_id, corners)
            }
            Self::DegenerateFace {
                face_id,
                corner,
                area,
            } => write!(
                f,
                "Degenerate face {:?}: corners around {} span area {:e}",
                face_id, corner, area
            ),
            Self::MismatchedEdges {
                face_id,
                vertices,
                edges,
            } => write!(
                f,
                "Face {:?} lists {} vertices but {} edges",
                face_id, vertices, edges
            ),
            Self::MissingFaceVertex { face_id, vertex_id } => {
                write!(f, "Face {:?} refers to missing vertex {:?}", face_id, vertex_id)
            }
            Self::MissingFaceEdge { face_id, edge_id } => {
                write!(f, "Face {:?} refers to missing edge {:?}", face_id, edge_id)
            }
            Self::MissingEdgeVertex { edge_id, vertex_id } => {
                write!(f, "Edge {:?} refers to missing vertex {:?}", edge_id, vertex_id)
            }
            Self::SelfLoopEdge { edge_id } => {
                write!(f, "Edge {:?} starts and ends at the same vertex", edge_id)
            }
            Self::OrphanedVertex { vertex_id } => {
                write!(f, "Vertex {:?} is not used by any face", vertex_id)
            }
            Self::OrphanedEdge { edge_id } => {
                write!(f, "Edge {:?} is not used by any face", edge_id)
            }
            Self::NonManifoldEdge { edge_id, faces } => {
                write!(f, "Non-manifold edge {:?}: shared by {} faces", edge_id, faces)
            }
        }
    }
}

/// Outcome of [`validate_mesh_topology`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// True when there are no errors (warnings are allowed)
    pub is_valid: bool,
    pub errors: Vec<TopologyIssue>,
    pub warnings: Vec<TopologyIssue>,
}

/// Number of faces listing each edge, each face counted once per edge
fn edge_usage(store: &MeshStore) -> HashMap<EdgeId, usize> {
    let mut usage: HashMap<EdgeId, usize> = HashMap::new();
    for face in store.faces() {
        let mut listed: Vec<EdgeId> = face.edge_ids.clone();
        listed.sort();
        listed.dedup();
        for edge_id in listed {
            *usage.entry(edge_id).or_default() += 1;
        }
    }
    usage
}

/// Validate with default tolerances
pub fn validate_mesh_topology(store: &MeshStore) -> ValidationReport {
    validate_mesh_topology_with(store, &Tolerances::default())
}

/// Validate the mesh against `tolerances.degenerate_area`
pub fn validate_mesh_topology_with(store: &MeshStore, tolerances: &Tolerances) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // ===== Faces =====
    for face in store.faces() {
        let n = face.vertex_ids.len();
        if n < 3 {
            errors.push(TopologyIssue::InvalidFace {
                face_id: face.id,
                corners: n,
            });
            continue;
        }
        if face.edge_ids.len() != n {
            errors.push(TopologyIssue::MismatchedEdges {
                face_id: face.id,
                vertices: n,
                edges: face.edge_ids.len(),
            });
        }
        for &edge_id in &face.edge_ids {
            if store.edge(edge_id).is_none() {
                errors.push(TopologyIssue::MissingFaceEdge {
                    face_id: face.id,
                    edge_id,
                });
            }
        }

        let mut positions = Vec::with_capacity(n);
        for &vertex_id in &face.vertex_ids {
            match store.position(vertex_id) {
                Some(p) => positions.push(p),
                None => errors.push(TopologyIssue::MissingFaceVertex {
                    face_id: face.id,
                    vertex_id,
                }),
            }
        }
        if positions.len() != n {
            continue;
        }
        for i in 0..n {
            let a = positions[(i + n - 1) % n];
            let b = positions[i];
            let c = positions[(i + 1) % n];
            let area = 0.5 * (b - a).cross(c - b).length();
            if area < tolerances.degenerate_area {
                errors.push(TopologyIssue::DegenerateFace {
                    face_id: face.id,
                    corner: i,
                    area,
                });
                break;
            }
        }
    }

    // ===== Edges =====
    let usage = edge_usage(store);
    for edge in store.edges() {
        for &vertex_id in &edge.vertex_ids {
            if store.vertex(vertex_id).is_none() {
                errors.push(TopologyIssue::MissingEdgeVertex {
                    edge_id: edge.id,
                    vertex_id,
                });
            }
        }
        if edge.vertex_ids[0] == edge.vertex_ids[1] {
            errors.push(TopologyIssue::SelfLoopEdge { edge_id: edge.id });
        }
        match usage.get(&edge.id).copied().unwrap_or(0) {
            0 => warnings.push(TopologyIssue::OrphanedEdge { edge_id: edge.id }),
            1 | 2 => {}
            faces => warnings.push(TopologyIssue::NonManifoldEdge {
                edge_id: edge.id,
                faces,
            }),
        }
    }

    // ===== Vertices =====
    let mut used_vertices = std::collections::HashSet::new();
    for face in store.faces() {
        used_vertices.extend(face.vertex_ids.iter().copied());
    }
    for vertex in store.vertices() {
        if !used_vertices.contains(&vertex.id) {
            warnings.push(TopologyIssue::OrphanedVertex {
                vertex_id: vertex.id,
            });
        }
    }

    debug!(
        "validate_mesh_topology: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );
    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Edges used by exactly one face, in id order
pub fn boundary_edges(store: &MeshStore) -> Vec<EdgeId> {
    let usage = edge_usage(store);
    store
        .edges()
        .filter(|e| usage.get(&e.id) == Some(&1))
        .map(|e| e.id)
        .collect()
}

/// Valid and without boundary edges
pub fn is_watertight(store: &MeshStore) -> bool {
    validate_mesh_topology(store).is_valid && boundary_edges(store).is_empty()
}

/// `V - E + F`; 2 for a closed genus-0 surface
pub fn euler_characteristic(store: &MeshStore) -> i64 {
    store.vertex_count() as i64 - store.edge_count() as i64 + store.face_count() as i64
}
