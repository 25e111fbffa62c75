//! Mirroring across an axis plane.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::add_face_like;
use crate::builder::MeshBuilder;
use crate::store::MeshStore;
use crate::types::{FaceId, VertexId};

/// Axis whose coordinate is negated; the mirror plane is where it is zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Reflect a point across this axis' plane
    pub fn mirror(self, point: Vec3) -> Vec3 {
        let mut p = point;
        p[self.index()] = -p[self.index()];
        p
    }
}

/// Mirror settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymmetryOptions {
    pub axis: Axis,
    /// Vertices this close to the plane are snapped onto it and shared by
    /// both halves. `None` duplicates every vertex.
    pub merge_threshold: Option<f32>,
}

/// Summary of a mirror pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymmetryResult {
    /// Mirror copies created, parallel to the vertices they mirror
    pub new_vertices: Vec<VertexId>,
    /// Vertices on the plane shared by both halves
    pub shared_vertices: Vec<VertexId>,
    /// Mirrored faces, in the order of their source faces
    pub new_faces: Vec<FaceId>,
}

/// Mirror the whole mesh across an axis plane.
///
/// Every face gets a reflected copy with reversed winding, so both halves
/// face outward. Faces lying entirely on the plane are not copied. Loose
/// edges, UVs and face materials are carried over to the copy.
pub fn symmetrize(store: &mut MeshStore, options: SymmetryOptions) -> SymmetryResult {
    let axis = options.axis;
    let mut result = SymmetryResult::default();
    let mut builder = MeshBuilder::indexing(store);

    // ===== PHASE 1: vertices =====
    let sources: Vec<(VertexId, Vec3)> = builder
        .store()
        .vertices()
        .map(|v| (v.id, v.position))
        .collect();
    let mut mirror: HashMap<VertexId, VertexId> = HashMap::new();
    for (id, position) in sources {
        let on_plane = options
            .merge_threshold
            .is_some_and(|t| position[axis.index()].abs() <= t);
        if on_plane {
            if let Some(vertex) = builder.store_mut().vertices.get_mut(&id) {
                vertex.position[axis.index()] = 0.0;
            }
            mirror.insert(id, id);
            result.shared_vertices.push(id);
        } else {
            let copy = builder.store_mut().add_vertex(axis.mirror(position), None);
            mirror.insert(id, copy);
            result.new_vertices.push(copy);
        }
    }
    let map = |v: &VertexId| mirror.get(v).copied();

    // ===== PHASE 2: faces =====
    let faces: Vec<_> = builder.store().faces().cloned().collect();
    for face in &faces {
        let Some(mapped) = face.vertex_ids.iter().map(map).collect::<Option<Vec<VertexId>>>() else {
            continue;
        };
        if mapped == face.vertex_ids {
            continue;
        }
        let reversed: Vec<VertexId> = mapped.into_iter().rev().collect();
        if let Some(copy) = add_face_like(&mut builder, face, &reversed) {
            result.new_faces.push(copy);
        }
    }

    // ===== PHASE 3: loose edges and UVs =====
    let loose: Vec<[VertexId; 2]> = builder
        .store()
        .edges()
        .filter(|e| !builder.store().is_edge_used(e.id))
        .map(|e| e.vertex_ids)
        .collect();
    for [a, b] in loose {
        if let (Some(ma), Some(mb)) = (map(&a), map(&b)) {
            builder.edge(ma, mb);
        }
    }
    let uvs: Vec<(VertexId, glam::Vec2)> = builder
        .store()
        .uvs()
        .filter_map(|uv| {
            let to = map(&uv.vertex_id)?;
            (to != uv.vertex_id).then_some((to, uv.coord))
        })
        .collect();
    for (vertex, coord) in uvs {
        builder.store_mut().add_uv(vertex, coord);
    }

    debug!(
        "symmetrize: {:?} axis, {} new vertices, {} shared, {} faces",
        axis,
        result.new_vertices.len(),
        result.shared_vertices.len(),
        result.new_faces.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::ops::face_normal;

    /// Unit quad on the +X side of the YZ plane, one edge on the plane
    fn half_quad() -> (MeshStore, FaceId) {
        let mut mesh = MeshStore::new();
        let face = MeshBuilder::new(&mut mesh)
            .add_polygon(&[
                Vec3::ZERO,
                Vec3::X,
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.00001, 1.0, 0.0),
            ])
            .unwrap();
        (mesh, face)
    }

    #[test]
    fn test_symmetrize_shares_plane_vertices() {
        let (mut mesh, face) = half_quad();
        let result = symmetrize(
            &mut mesh,
            SymmetryOptions {
                axis: Axis::X,
                merge_threshold: Some(1e-4),
            },
        );
        assert_eq!(result.shared_vertices.len(), 2);
        assert_eq!(result.new_vertices.len(), 2);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.edge_count(), 7);

        let copy = result.new_faces[0];
        let n_src = face_normal(&mesh, face).unwrap();
        let n_copy = face_normal(&mesh, copy).unwrap();
        assert!((n_src - n_copy).length() < 1e-5, "mirror must keep facing");
        assert!(mesh.vertices().all(|v| v.position.x.abs() < 1e-9 || v.position.x.abs() > 0.5));
    }

    #[test]
    fn test_symmetrize_without_merge_duplicates_everything() {
        let (mut mesh, _) = half_quad();
        let v = mesh.vertex_ids()[1];
        mesh.add_uv(v, Vec2::new(0.25, 0.5));
        let result = symmetrize(
            &mut mesh,
            SymmetryOptions {
                axis: Axis::X,
                merge_threshold: None,
            },
        );
        assert!(result.shared_vertices.is_empty());
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.edge_count(), 8);
        assert_eq!(mesh.uv_count(), 2);
    }

    #[test]
    fn test_faces_on_plane_are_not_copied() {
        let mut mesh = MeshStore::new();
        MeshBuilder::new(&mut mesh)
            .add_polygon(&[Vec3::ZERO, Vec3::Y, Vec3::Z])
            .unwrap();
        let result = symmetrize(
            &mut mesh,
            SymmetryOptions {
                axis: Axis::X,
                merge_threshold: Some(1e-4),
            },
        );
        assert!(result.new_faces.is_empty());
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn test_plane_vertices_snap_onto_plane() {
        let mut mesh = MeshStore::new();
        MeshBuilder::new(&mut mesh)
            .add_polygon(&[
                Vec3::new(0.0, 0.0, -0.00005),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(0.0, 1.0, 1.0),
            ])
            .unwrap();
        let result = symmetrize(
            &mut mesh,
            SymmetryOptions {
                axis: Axis::Z,
                merge_threshold: Some(1e-4),
            },
        );
        assert_eq!(result.shared_vertices.len(), 1);
        let snapped = mesh.position(result.shared_vertices[0]).unwrap();
        assert_eq!(snapped, Vec3::ZERO);
        assert_eq!(mesh.face_count(), 2);
    }

    #[test]
    fn test_axis_mirror() {
        assert_eq!(Axis::Y.mirror(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, -2.0, 3.0));
    }
}
