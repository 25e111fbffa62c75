//! Box-style primitive generators built on the builder's grid helpers.

use glam::Vec3;

use crate::builder::MeshBuilder;
use crate::store::MeshStore;

/// One side of a box: grid origin plus the two axes spanning it.
/// `u × v` points outward so quads come out counter-clockwise.
struct Side {
    origin: Vec3,
    u: Vec3,
    v: Vec3,
}

/// Axis-aligned cube centred on the origin.
///
/// Each side is a `segments × segments` quad grid; corners and seams are
/// shared through the builder, so the result is closed. `segments == 0` is
/// treated as 1.
pub fn cube(size: f32, segments: usize) -> MeshStore {
    let mut mesh = MeshStore::new();
    let segments = segments.max(1);
    let h = size * 0.5;
    let step = size / segments as f32;

    let sides = [
        Side { origin: Vec3::new(h, -h, -h), u: Vec3::Y, v: Vec3::Z },
        Side { origin: Vec3::new(-h, -h, -h), u: Vec3::Z, v: Vec3::Y },
        Side { origin: Vec3::new(-h, h, -h), u: Vec3::Z, v: Vec3::X },
        Side { origin: Vec3::new(-h, -h, -h), u: Vec3::X, v: Vec3::Z },
        Side { origin: Vec3::new(-h, -h, h), u: Vec3::X, v: Vec3::Y },
        Side { origin: Vec3::new(-h, -h, -h), u: Vec3::Y, v: Vec3::X },
    ];

    let mut builder = MeshBuilder::new(&mut mesh);
    for side in &sides {
        let grid = builder.create_vertex_grid(segments + 1, segments + 1, |r, c| {
            side.origin + (side.u * c as f32 + side.v * r as f32) * step
        });
        builder.create_faces_from_grid(&grid, false);
    }
    mesh
}

/// Flat plane on XZ facing +Y, centred on the origin
pub fn plane(width: f32, depth: f32, subdivisions: usize) -> MeshStore {
    let mut mesh = MeshStore::new();
    let cells = subdivisions + 1;
    let origin = Vec3::new(-width * 0.5, 0.0, -depth * 0.5);
    let dx = width / cells as f32;
    let dz = depth / cells as f32;

    let mut builder = MeshBuilder::new(&mut mesh);
    let grid = builder.create_vertex_grid(cells + 1, cells + 1, |r, c| {
        origin + Vec3::new(r as f32 * dx, 0.0, c as f32 * dz)
    });
    builder.create_faces_from_grid(&grid, false);
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::face_normal;

    #[test]
    fn test_unit_cube_counts() {
        let mesh = cube(1.0, 1);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.edge_count(), 12);
        assert_eq!(mesh.face_count(), 6);
        assert!(mesh.faces().all(|f| f.vertex_ids.len() == 4));
    }

    #[test]
    fn test_cube_normals_point_outward() {
        let mesh = cube(2.0, 1);
        for face in mesh.faces() {
            let centroid = crate::ops::face_centroid(&mesh, face.id).unwrap();
            let normal = face_normal(&mesh, face.id).unwrap();
            assert!(
                normal.dot(centroid) > 0.0,
                "face {:?} normal {:?} points inward",
                face.id,
                normal
            );
        }
    }

    #[test]
    fn test_segmented_cube_counts() {
        let mesh = cube(1.0, 2);
        // 6 * 9 grid points minus shared seams: V = 6n^2 + 2 for n segments
        assert_eq!(mesh.vertex_count(), 26);
        assert_eq!(mesh.face_count(), 24);
        assert_eq!(mesh.edge_count(), 48);
    }

    #[test]
    fn test_plane_counts() {
        let mesh = plane(2.0, 2.0, 1);
        assert_eq!(mesh.vertex_count(), 9);
        assert_eq!(mesh.face_count(), 4);
        for face in mesh.faces() {
            let n = face_normal(&mesh, face.id).unwrap();
            assert!(n.y > 0.99, "plane face normal {:?} should face +Y", n);
        }
    }
}
