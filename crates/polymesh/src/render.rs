//! Conversion into flat triangle buffers for a renderer.

use std::collections::HashMap;

use crate::store::MeshStore;
use crate::types::VertexId;

/// Triangle-list buffers ready for upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderMesh {
    /// One `x, y, z` triple per vertex, in vertex id order
    pub positions: Vec<f32>,
    /// Three indices per triangle; `None` when the mesh has no faces
    pub indices: Option<Vec<u32>>,
}

impl RenderMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.as_ref().map_or(0, |i| i.len() / 3)
    }

    /// Raw bytes of the position buffer
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Raw bytes of the index buffer (empty without faces)
    pub fn index_bytes(&self) -> &[u8] {
        match &self.indices {
            Some(indices) => bytemuck::cast_slice(indices),
            None => &[],
        }
    }
}

/// Buffer index of every vertex, in id order
fn vertex_slots(store: &MeshStore) -> HashMap<VertexId, u32> {
    store
        .vertices()
        .enumerate()
        .map(|(i, v)| (v.id, i as u32))
        .collect()
}

/// Fan-triangulate every face from its first corner.
///
/// Faces that refer to a missing vertex are left out.
pub fn to_render_mesh(store: &MeshStore) -> RenderMesh {
    let slots = vertex_slots(store);
    let positions: Vec<f32> = store
        .vertices()
        .flat_map(|v| v.position.to_array())
        .collect();

    if store.face_count() == 0 {
        return RenderMesh {
            positions,
            indices: None,
        };
    }

    let mut indices = Vec::new();
    for face in store.faces() {
        let Some(corners) = face
            .vertex_ids
            .iter()
            .map(|v| slots.get(v).copied())
            .collect::<Option<Vec<u32>>>()
        else {
            continue;
        };
        for i in 1..corners.len().saturating_sub(1) {
            indices.extend_from_slice(&[corners[0], corners[i], corners[i + 1]]);
        }
    }
    RenderMesh {
        positions,
        indices: Some(indices),
    }
}

/// Convert into a Bevy mesh with smooth normals and the first UV of each vertex
#[cfg(feature = "bevy")]
pub fn to_bevy_mesh(store: &MeshStore) -> bevy::prelude::Mesh {
    use bevy::asset::RenderAssetUsages;
    use bevy::mesh::{Indices, PrimitiveTopology};
    use bevy::prelude::*;

    let render = to_render_mesh(store);
    let slots = vertex_slots(store);

    let positions: Vec<[f32; 3]> = store.vertices().map(|v| v.position.to_array()).collect();
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for face in store.faces() {
        let Some(normal) = crate::ops::face_normal(store, face.id) else {
            continue;
        };
        for v in &face.vertex_ids {
            if let Some(&slot) = slots.get(v) {
                normals[slot as usize] += normal;
            }
        }
    }
    let normals: Vec<[f32; 3]> = normals
        .into_iter()
        .map(|n| n.normalize_or(Vec3::Y).to_array())
        .collect();

    let mut uvs = vec![[0.0f32; 2]; positions.len()];
    for uv in store.uvs() {
        if let Some(&slot) = slots.get(&uv.vertex_id) {
            if uvs[slot as usize] == [0.0, 0.0] {
                uvs[slot as usize] = uv.coord.to_array();
            }
        }
    }

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(render.indices.unwrap_or_default()));
    mesh
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::builder::MeshBuilder;
    use crate::primitives::cube;

    #[test]
    fn test_empty_store_has_no_indices() {
        let mut mesh = MeshStore::new();
        mesh.add_vertex(Vec3::ONE, None);
        let render = to_render_mesh(&mesh);
        assert_eq!(render.positions, vec![1.0, 1.0, 1.0]);
        assert!(render.indices.is_none());
        assert!(render.index_bytes().is_empty());
    }

    #[test]
    fn test_cube_fan_triangulation() {
        let render = to_render_mesh(&cube(2.0, 1));
        assert_eq!(render.vertex_count(), 8);
        assert_eq!(render.triangle_count(), 12);
        assert_eq!(render.position_bytes().len(), 8 * 3 * 4);
        assert_eq!(render.index_bytes().len(), 36 * 4);
    }

    #[test]
    fn test_pentagon_indices_follow_id_order() {
        let mut mesh = MeshStore::new();
        let lonely = mesh.add_vertex(Vec3::splat(5.0), None);
        MeshBuilder::new(&mut mesh)
            .add_polygon(&[
                Vec3::ZERO,
                Vec3::X,
                Vec3::new(1.5, 1.0, 0.0),
                Vec3::new(0.5, 2.0, 0.0),
                Vec3::new(-0.5, 1.0, 0.0),
            ])
            .unwrap();
        assert_eq!(mesh.vertex_ids()[0], lonely);

        let render = to_render_mesh(&mesh);
        assert_eq!(render.vertex_count(), 6);
        assert_eq!(
            render.indices.unwrap(),
            vec![1, 2, 3, 1, 3, 4, 1, 4, 5],
            "slot 0 is the loose vertex"
        );
    }
}
