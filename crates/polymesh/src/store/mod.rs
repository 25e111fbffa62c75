//! Primitive storage for the indexed polygon mesh.
//!
//! [`MeshStore`] is an unchecked arena: it will happily hold duplicate edges or
//! faces with fewer than three corners. Deduplication lives in
//! [`MeshBuilder`](crate::MeshBuilder) and invariant checking in
//! [`validate`](crate::validate).

mod modification;
mod topology;

use std::collections::BTreeMap;

use glam::{Vec2, Vec3};

use crate::id::IdAllocator;
use crate::types::{
    Edge, EdgeId, Face, FaceId, Material, MaterialId, Uv, UvId, Vertex, VertexId,
};

/// Owner of every vertex, edge, face, material and UV of one mesh.
///
/// Collections are keyed by id and iterate in ascending id order, which is
/// creation order since ids are monotonic.
#[derive(Debug, Clone, Default)]
pub struct MeshStore {
    pub(crate) ids: IdAllocator,
    pub(crate) vertices: BTreeMap<VertexId, Vertex>,
    pub(crate) edges: BTreeMap<EdgeId, Edge>,
    pub(crate) faces: BTreeMap<FaceId, Face>,
    pub(crate) materials: BTreeMap<MaterialId, Material>,
    pub(crate) uvs: BTreeMap<UvId, Uv>,
}

impl MeshStore {
    /// Create an empty store with its own id space
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store drawing ids from an injected allocator
    pub fn with_allocator(ids: IdAllocator) -> Self {
        Self {
            ids,
            ..Self::default()
        }
    }

    /// The allocator ids are drawn from
    pub fn allocator(&self) -> &IdAllocator {
        &self.ids
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Add a vertex. No position dedup is performed.
    pub fn add_vertex(&mut self, position: Vec3, name: Option<String>) -> VertexId {
        let id = VertexId(self.ids.next_id());
        self.vertices.insert(id, Vertex { id, position, name });
        id
    }

    /// Add an edge. Duplicate edges are representable; dedup is the caller's job.
    pub fn add_edge(&mut self, v1: VertexId, v2: VertexId, name: Option<String>) -> EdgeId {
        let id = EdgeId(self.ids.next_id());
        self.edges.insert(
            id,
            Edge {
                id,
                vertex_ids: [v1, v2],
                name,
            },
        );
        id
    }

    /// Add a face from parallel vertex and edge lists.
    ///
    /// No count validation is performed; invalid faces are representable and
    /// reported later by the validator.
    pub fn add_face(
        &mut self,
        vertex_ids: Vec<VertexId>,
        edge_ids: Vec<EdgeId>,
        name: Option<String>,
    ) -> FaceId {
        let id = FaceId(self.ids.next_id());
        self.faces.insert(
            id,
            Face {
                id,
                vertex_ids,
                edge_ids,
                name,
                material: None,
            },
        );
        id
    }

    /// Add a material slot. It is marked transparent when `opacity < 1`.
    pub fn add_material(
        &mut self,
        name: impl Into<String>,
        color: Option<[f32; 3]>,
        opacity: Option<f32>,
    ) -> MaterialId {
        let id = MaterialId(self.ids.next_id());
        self.materials.insert(
            id,
            Material {
                id,
                name: name.into(),
                color,
                opacity,
                transparent: opacity.is_some_and(|o| o < 1.0),
            },
        );
        id
    }

    /// Attach a texture coordinate to a vertex
    pub fn add_uv(&mut self, vertex_id: VertexId, coord: Vec2) -> UvId {
        let id = UvId(self.ids.next_id());
        self.uvs.insert(
            id,
            Uv {
                id,
                vertex_id,
                coord,
            },
        );
        id
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get vertex by ID
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    /// Get edge by ID
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Get face by ID
    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(&id)
    }

    /// Get material by ID
    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    /// Get UV by ID
    pub fn uv(&self, id: UvId) -> Option<&Uv> {
        self.uvs.get(&id)
    }

    /// Get mutable material by ID
    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(&id)
    }

    pub(crate) fn face_mut(&mut self, id: FaceId) -> Option<&mut Face> {
        self.faces.get_mut(&id)
    }

    /// Position of a vertex
    pub fn position(&self, id: VertexId) -> Option<Vec3> {
        self.vertices.get(&id).map(|v| v.position)
    }

    /// All vertices in id order
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    /// All edges in id order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// All faces in id order
    pub fn faces(&self) -> impl Iterator<Item = &Face> {
        self.faces.values()
    }

    /// All materials in id order
    pub fn materials(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }

    /// All UVs in id order
    pub fn uvs(&self) -> impl Iterator<Item = &Uv> {
        self.uvs.values()
    }

    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertices.keys().copied().collect()
    }

    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.edges.keys().copied().collect()
    }

    pub fn face_ids(&self) -> Vec<FaceId> {
        self.faces.keys().copied().collect()
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn uv_count(&self) -> usize {
        self.uvs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty() && self.faces.is_empty()
    }

    /// Corner positions of a face, or `None` if the face or any corner is missing
    pub fn face_positions(&self, id: FaceId) -> Option<Vec<Vec3>> {
        let face = self.face(id)?;
        face.vertex_ids.iter().map(|&v| self.position(v)).collect()
    }

    /// Endpoint positions of an edge
    pub fn edge_positions(&self, id: EdgeId) -> Option<[Vec3; 2]> {
        let edge = self.edge(id)?;
        Some([
            self.position(edge.vertex_ids[0])?,
            self.position(edge.vertex_ids[1])?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_unique_across_collections() {
        let mut mesh = MeshStore::new();
        let a = mesh.add_vertex(Vec3::ZERO, None);
        let b = mesh.add_vertex(Vec3::X, None);
        let e = mesh.add_edge(a, b, None);
        let uv = mesh.add_uv(a, Vec2::ZERO);

        let raw = [a.0, b.0, e.0, uv.0];
        for i in 0..raw.len() {
            for j in (i + 1)..raw.len() {
                assert_ne!(raw[i], raw[j]);
            }
        }
    }

    #[test]
    fn test_unchecked_duplicates_allowed() {
        let mut mesh = MeshStore::new();
        let a = mesh.add_vertex(Vec3::ZERO, None);
        let b = mesh.add_vertex(Vec3::X, None);
        let e1 = mesh.add_edge(a, b, None);
        let e2 = mesh.add_edge(b, a, None);
        assert_ne!(e1, e2);
        assert_eq!(mesh.edge_count(), 2);

        // Faces with too few corners are representable
        let f = mesh.add_face(vec![a, b], vec![e1], Some("sliver".into()));
        assert_eq!(mesh.face(f).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_ids_return_none() {
        let mesh = MeshStore::new();
        assert!(mesh.vertex(VertexId(42)).is_none());
        assert!(mesh.edge(EdgeId(42)).is_none());
        assert!(mesh.face(FaceId(42)).is_none());
        assert!(mesh.material(MaterialId(42)).is_none());
        assert!(mesh.uv(UvId(42)).is_none());
    }

    #[test]
    fn test_iteration_in_creation_order() {
        let mut mesh = MeshStore::new();
        let ids: Vec<_> = (0..5)
            .map(|i| mesh.add_vertex(Vec3::splat(i as f32), None))
            .collect();
        let seen: Vec<_> = mesh.vertices().map(|v| v.id).collect();
        assert_eq!(seen, ids);
    }

    #[test]
    fn test_injected_allocator() {
        let mut mesh = MeshStore::with_allocator(IdAllocator::starting_at(500));
        let v = mesh.add_vertex(Vec3::ZERO, None);
        assert_eq!(v, VertexId(500));
        assert_eq!(mesh.allocator().peek(), 501);
    }

    #[test]
    fn test_material_transparency_from_opacity() {
        let mut mesh = MeshStore::new();
        let glass = mesh.add_material("glass", Some([0.8, 0.9, 1.0]), Some(0.3));
        let solid = mesh.add_material("solid", None, None);
        assert!(mesh.material(glass).unwrap().transparent);
        assert!(!mesh.material(solid).unwrap().transparent);
    }
}
