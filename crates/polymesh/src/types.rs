//! Type definitions for the indexed polygon mesh.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Type-safe vertex identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub u32);

/// Type-safe edge identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

/// Type-safe face identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FaceId(pub u32);

/// Type-safe material identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

/// Type-safe UV identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UvId(pub u32);

/// A vertex in the mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub id: VertexId,
    pub position: Vec3,
    pub name: Option<String>,
}

/// An undirected edge between two distinct vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub vertex_ids: [VertexId; 2],
    pub name: Option<String>,
}

impl Edge {
    /// Whether this edge touches the given vertex
    pub fn contains(&self, vertex_id: VertexId) -> bool {
        self.vertex_ids[0] == vertex_id || self.vertex_ids[1] == vertex_id
    }

    /// The endpoint opposite to `vertex_id`, if `vertex_id` is an endpoint
    pub fn other(&self, vertex_id: VertexId) -> Option<VertexId> {
        if self.vertex_ids[0] == vertex_id {
            Some(self.vertex_ids[1])
        } else if self.vertex_ids[1] == vertex_id {
            Some(self.vertex_ids[0])
        } else {
            None
        }
    }

    /// Whether this edge connects `a` and `b` in either direction
    pub fn connects(&self, a: VertexId, b: VertexId) -> bool {
        (self.vertex_ids[0] == a && self.vertex_ids[1] == b)
            || (self.vertex_ids[0] == b && self.vertex_ids[1] == a)
    }
}

/// A polygon face
///
/// `vertex_ids` is the ordered corner cycle. `edge_ids[i]` joins
/// `vertex_ids[i]` and `vertex_ids[(i + 1) % n]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub id: FaceId,
    pub vertex_ids: Vec<VertexId>,
    pub edge_ids: Vec<EdgeId>,
    pub name: Option<String>,
    pub material: Option<MaterialId>,
}

impl Face {
    /// Number of corners
    pub fn len(&self) -> usize {
        self.vertex_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_ids.is_empty()
    }

    /// Position of a vertex in the corner cycle
    pub fn corner_of(&self, vertex_id: VertexId) -> Option<usize> {
        self.vertex_ids.iter().position(|&v| v == vertex_id)
    }

    /// Whether the cycle walks `from` directly into `to`
    pub fn has_directed_edge(&self, from: VertexId, to: VertexId) -> bool {
        let n = self.vertex_ids.len();
        (0..n).any(|i| self.vertex_ids[i] == from && self.vertex_ids[(i + 1) % n] == to)
    }
}

/// A material slot faces can refer to
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    /// Linear RGB base color
    pub color: Option<[f32; 3]>,
    pub opacity: Option<f32>,
    pub transparent: bool,
}

/// Texture coordinate attached to a vertex
#[derive(Debug, Clone, PartialEq)]
pub struct Uv {
    pub id: UvId,
    pub vertex_id: VertexId,
    pub coord: Vec2,
}

/// Kind of element an id refers to, used in error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Vertex,
    Edge,
    Face,
    Material,
    Uv,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Vertex => "vertex",
            Self::Edge => "edge",
            Self::Face => "face",
            Self::Material => "material",
            Self::Uv => "uv",
        };
        f.write_str(name)
    }
}

/// Errors raised by single-target mesh operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("{kind} {id} not found")]
    NotFound { kind: ElementKind, id: u32 },
    #[error("Malformed mesh data: {0}")]
    Malformed(String),
    #[error("Unsupported request: {0}")]
    Unsupported(String),
}

impl MeshError {
    pub fn vertex_not_found(id: VertexId) -> Self {
        Self::NotFound {
            kind: ElementKind::Vertex,
            id: id.0,
        }
    }

    pub fn edge_not_found(id: EdgeId) -> Self {
        Self::NotFound {
            kind: ElementKind::Edge,
            id: id.0,
        }
    }

    pub fn face_not_found(id: FaceId) -> Self {
        Self::NotFound {
            kind: ElementKind::Face,
            id: id.0,
        }
    }

    pub fn material_not_found(id: MaterialId) -> Self {
        Self::NotFound {
            kind: ElementKind::Material,
            id: id.0,
        }
    }
}

/// Result alias for mesh operations
pub type MeshResult<T> = Result<T, MeshError>;
