//! Mutation and cascading removal for MeshStore.

use glam::Vec3;
use tracing::trace;

use super::MeshStore;
use crate::types::{
    Edge, EdgeId, Face, FaceId, Material, MaterialId, MeshError, MeshResult, Uv, UvId, Vertex,
    VertexId,
};

impl MeshStore {
    /// Set the position of a vertex.
    ///
    /// Fails with `NotFound` if the vertex does not exist.
    pub fn move_vertex(&mut self, vertex_id: VertexId, position: Vec3) -> MeshResult<()> {
        let vertex = self
            .vertices
            .get_mut(&vertex_id)
            .ok_or(MeshError::vertex_not_found(vertex_id))?;
        vertex.position = position;
        Ok(())
    }

    /// Assign (or clear) a face's material slot.
    ///
    /// Fails with `NotFound` if the face, or the material when given, is absent.
    pub fn set_face_material(
        &mut self,
        face_id: FaceId,
        material: Option<MaterialId>,
    ) -> MeshResult<()> {
        if let Some(material_id) = material {
            if !self.materials.contains_key(&material_id) {
                return Err(MeshError::material_not_found(material_id));
            }
        }
        let face = self
            .faces
            .get_mut(&face_id)
            .ok_or(MeshError::face_not_found(face_id))?;
        face.material = material;
        Ok(())
    }

    /// Rename a vertex. Fails with `NotFound` if absent.
    pub fn set_vertex_name(&mut self, vertex_id: VertexId, name: Option<String>) -> MeshResult<()> {
        let vertex = self
            .vertices
            .get_mut(&vertex_id)
            .ok_or(MeshError::vertex_not_found(vertex_id))?;
        vertex.name = name;
        Ok(())
    }

    /// Remove a vertex along with every edge, face and UV that uses it
    pub fn remove_vertex(&mut self, vertex_id: VertexId) -> Option<Vertex> {
        let vertex = self.vertices.remove(&vertex_id)?;

        let dead_edges: Vec<EdgeId> = self.edges_using_vertex(vertex_id);
        for edge_id in &dead_edges {
            self.edges.remove(edge_id);
        }

        self.faces.retain(|_, face| {
            !face.vertex_ids.contains(&vertex_id)
                && !face.edge_ids.iter().any(|e| dead_edges.contains(e))
        });
        self.uvs.retain(|_, uv| uv.vertex_id != vertex_id);

        trace!(
            "remove_vertex: {:?} cascaded to {} edges",
            vertex_id,
            dead_edges.len()
        );
        Some(vertex)
    }

    /// Remove an edge and every face that lists it
    pub fn remove_edge(&mut self, edge_id: EdgeId) -> Option<Edge> {
        let edge = self.edges.remove(&edge_id)?;
        self.faces.retain(|_, face| !face.edge_ids.contains(&edge_id));
        Some(edge)
    }

    /// Remove a face. Its edges and vertices are left in place.
    pub fn remove_face(&mut self, face_id: FaceId) -> Option<Face> {
        self.faces.remove(&face_id)
    }

    /// Remove a material and clear the slot on faces that used it
    pub fn remove_material(&mut self, material_id: MaterialId) -> Option<Material> {
        let material = self.materials.remove(&material_id)?;
        for face in self.faces.values_mut() {
            if face.material == Some(material_id) {
                face.material = None;
            }
        }
        Some(material)
    }

    /// Remove a UV
    pub fn remove_uv(&mut self, uv_id: UvId) -> Option<Uv> {
        self.uvs.remove(&uv_id)
    }

    /// Replace a face's corner cycle and edge list in place.
    ///
    /// The face keeps its id, name and material.
    pub(crate) fn set_face_loop(
        &mut self,
        face_id: FaceId,
        vertex_ids: Vec<VertexId>,
        edge_ids: Vec<EdgeId>,
    ) -> bool {
        match self.faces.get_mut(&face_id) {
            Some(face) => {
                face.vertex_ids = vertex_ids;
                face.edge_ids = edge_ids;
                true
            }
            None => false,
        }
    }

    /// Add a face that copies name and material from `template`
    pub(crate) fn add_face_like(
        &mut self,
        template: &Face,
        vertex_ids: Vec<VertexId>,
        edge_ids: Vec<EdgeId>,
    ) -> FaceId {
        let id = self.add_face(vertex_ids, edge_ids, template.name.clone());
        if let Some(face) = self.faces.get_mut(&id) {
            face.material = template.material;
        }
        id
    }

    /// Re-point an edge at new endpoints
    pub(crate) fn set_edge_vertices(&mut self, edge_id: EdgeId, vertex_ids: [VertexId; 2]) {
        if let Some(edge) = self.edges.get_mut(&edge_id) {
            edge.vertex_ids = vertex_ids;
        }
    }

    /// Move a UV to a different owning vertex
    pub(crate) fn set_uv_vertex(&mut self, uv_id: UvId, vertex_id: VertexId) {
        if let Some(uv) = self.uvs.get_mut(&uv_id) {
            uv.vertex_id = vertex_id;
        }
    }

    /// Remove the listed edges that no face uses anymore and the listed
    /// vertices that no face or edge uses anymore.
    ///
    /// Returns the number of (edges, vertices) removed.
    pub(crate) fn prune_loose(
        &mut self,
        edges: &[EdgeId],
        vertices: &[VertexId],
    ) -> (usize, usize) {
        let mut removed_edges = 0;
        for &edge_id in edges {
            if self.edges.contains_key(&edge_id) && !self.is_edge_used(edge_id) {
                self.edges.remove(&edge_id);
                removed_edges += 1;
            }
        }

        let mut removed_vertices = 0;
        for &vertex_id in vertices {
            if self.vertices.contains_key(&vertex_id) && !self.is_vertex_used(vertex_id) {
                self.vertices.remove(&vertex_id);
                self.uvs.retain(|_, uv| uv.vertex_id != vertex_id);
                removed_vertices += 1;
            }
        }
        (removed_edges, removed_vertices)
    }
}
