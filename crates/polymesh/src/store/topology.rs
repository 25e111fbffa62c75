//! Adjacency queries for MeshStore.
//!
//! Every query is a linear scan over the relevant collection. Results are in
//! ascending id order so callers see deterministic output.

use super::MeshStore;
use crate::types::{EdgeId, FaceId, UvId, VertexId};

impl MeshStore {
    /// Get all faces whose corner cycle contains a vertex
    pub fn faces_using_vertex(&self, vertex_id: VertexId) -> Vec<FaceId> {
        self.faces
            .values()
            .filter(|f| f.vertex_ids.contains(&vertex_id))
            .map(|f| f.id)
            .collect()
    }

    /// Get all edges with the vertex as an endpoint
    pub fn edges_using_vertex(&self, vertex_id: VertexId) -> Vec<EdgeId> {
        self.edges
            .values()
            .filter(|e| e.contains(vertex_id))
            .map(|e| e.id)
            .collect()
    }

    /// Get all vertices connected to a vertex by an edge
    pub fn connected_vertices(&self, vertex_id: VertexId) -> Vec<VertexId> {
        let mut neighbors = Vec::new();
        for edge in self.edges.values() {
            if let Some(other) = edge.other(vertex_id) {
                if other != vertex_id && !neighbors.contains(&other) {
                    neighbors.push(other);
                }
            }
        }
        neighbors
    }

    /// Get all faces sharing at least one edge with a face
    pub fn adjacent_faces(&self, face_id: FaceId) -> Vec<FaceId> {
        let Some(face) = self.face(face_id) else {
            return Vec::new();
        };
        self.faces
            .values()
            .filter(|f| f.id != face_id && f.edge_ids.iter().any(|e| face.edge_ids.contains(e)))
            .map(|f| f.id)
            .collect()
    }

    /// Get all faces that list an edge
    pub fn faces_using_edge(&self, edge_id: EdgeId) -> Vec<FaceId> {
        self.faces
            .values()
            .filter(|f| f.edge_ids.contains(&edge_id))
            .map(|f| f.id)
            .collect()
    }

    /// Find the first edge joining two vertices, in either direction
    pub fn find_edge(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.edges.values().find(|e| e.connects(a, b)).map(|e| e.id)
    }

    /// Get all UVs owned by a vertex
    pub fn uvs_of_vertex(&self, vertex_id: VertexId) -> Vec<UvId> {
        self.uvs
            .values()
            .filter(|uv| uv.vertex_id == vertex_id)
            .map(|uv| uv.id)
            .collect()
    }

    /// Whether any face lists the edge
    pub fn is_edge_used(&self, edge_id: EdgeId) -> bool {
        self.faces.values().any(|f| f.edge_ids.contains(&edge_id))
    }

    /// Whether any face or edge references the vertex
    pub fn is_vertex_used(&self, vertex_id: VertexId) -> bool {
        self.faces.values().any(|f| f.vertex_ids.contains(&vertex_id))
            || self.edges.values().any(|e| e.contains(vertex_id))
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;

    /// Two quads sharing the edge b-e:
    ///
    /// ```text
    /// a---b---c
    /// |   |   |
    /// d---e---f
    /// ```
    fn two_quads() -> (MeshStore, [VertexId; 6], [FaceId; 2]) {
        let mut mesh = MeshStore::new();
        let a = mesh.add_vertex(Vec3::new(0.0, 1.0, 0.0), None);
        let b = mesh.add_vertex(Vec3::new(1.0, 1.0, 0.0), None);
        let c = mesh.add_vertex(Vec3::new(2.0, 1.0, 0.0), None);
        let d = mesh.add_vertex(Vec3::new(0.0, 0.0, 0.0), None);
        let e = mesh.add_vertex(Vec3::new(1.0, 0.0, 0.0), None);
        let f = mesh.add_vertex(Vec3::new(2.0, 0.0, 0.0), None);

        let ab = mesh.add_edge(a, b, None);
        let bc = mesh.add_edge(b, c, None);
        let ad = mesh.add_edge(a, d, None);
        let be = mesh.add_edge(b, e, None);
        let cf = mesh.add_edge(c, f, None);
        let de = mesh.add_edge(d, e, None);
        let ef = mesh.add_edge(e, f, None);

        let left = mesh.add_face(vec![d, e, b, a], vec![de, be, ab, ad], None);
        let right = mesh.add_face(vec![e, f, c, b], vec![ef, cf, bc, be], None);
        (mesh, [a, b, c, d, e, f], [left, right])
    }

    #[test]
    fn test_faces_using_vertex() {
        let (mesh, [a, b, ..], [left, right]) = two_quads();
        assert_eq!(mesh.faces_using_vertex(a), vec![left]);
        assert_eq!(mesh.faces_using_vertex(b), vec![left, right]);
    }

    #[test]
    fn test_connected_vertices() {
        let (mesh, [a, b, c, _, e, _], _) = two_quads();
        let neighbors = mesh.connected_vertices(b);
        assert_eq!(neighbors.len(), 3);
        assert!(neighbors.contains(&a));
        assert!(neighbors.contains(&c));
        assert!(neighbors.contains(&e));
    }

    #[test]
    fn test_adjacent_faces() {
        let (mesh, _, [left, right]) = two_quads();
        assert_eq!(mesh.adjacent_faces(left), vec![right]);
        assert_eq!(mesh.adjacent_faces(right), vec![left]);
        assert!(mesh.adjacent_faces(FaceId(999)).is_empty());
    }

    #[test]
    fn test_find_edge_either_direction() {
        let (mesh, [_, b, _, _, e, _], _) = two_quads();
        let be = mesh.find_edge(b, e).unwrap();
        assert_eq!(mesh.find_edge(e, b), Some(be));
        assert_eq!(mesh.faces_using_edge(be).len(), 2);
    }

    #[test]
    fn test_uvs_of_vertex() {
        let (mut mesh, [a, ..], _) = two_quads();
        let uv = mesh.add_uv(a, Vec2::new(0.25, 0.75));
        assert_eq!(mesh.uvs_of_vertex(a), vec![uv]);
    }
}
