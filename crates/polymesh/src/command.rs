//! Serializable edit commands for interactive front-ends.
//!
//! Each [`EditCommand`] names one operator together with its arguments.
//! [`apply_command`] runs it and reports what changed, so a UI can send edits
//! as JSON and show the outcome without knowing the operator signatures.

use std::collections::BTreeSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::ops::{self, BatchOutcome, MergeTarget, SymmetryOptions};
use crate::store::MeshStore;
use crate::types::{EdgeId, FaceId, MaterialId, MeshResult, VertexId};

/// One edit applied to a mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EditCommand {
    /// Move a single vertex
    MoveVertex { vertex: VertexId, position: Vec3 },
    /// Assign or clear a face's material
    SetFaceMaterial {
        face: FaceId,
        material: Option<MaterialId>,
    },
    ExtrudeFaces { faces: Vec<FaceId>, distance: f32 },
    SubdivideEdges { edges: Vec<EdgeId>, splits: usize },
    BevelEdges { edges: Vec<EdgeId>, width: f32 },
    InsetFaces { faces: Vec<FaceId>, amount: f32 },
    DissolveEdges { edges: Vec<EdgeId> },
    DissolveFaces { faces: Vec<FaceId> },
    /// Cut the full edge ring through `edge`
    LoopCut { edge: EdgeId, cuts: usize },
    BridgeEdges { a: EdgeId, b: EdgeId },
    BridgeEdgeLoops {
        loop_a: Vec<EdgeId>,
        loop_b: Vec<EdgeId>,
    },
    MergeVertices(MergeTarget),
    Symmetrize(SymmetryOptions),
    TriangulateFaces { faces: Vec<FaceId> },
    QuadrangulateFaces { faces: Vec<FaceId> },
    DeleteVertices { vertices: Vec<VertexId> },
    DeleteEdges { edges: Vec<EdgeId> },
    DeleteFaces { faces: Vec<FaceId> },
}

impl EditCommand {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::MoveVertex { .. } => "move_vertex",
            Self::SetFaceMaterial { .. } => "set_face_material",
            Self::ExtrudeFaces { .. } => "extrude_faces",
            Self::SubdivideEdges { .. } => "subdivide_edges",
            Self::BevelEdges { .. } => "bevel_edges",
            Self::InsetFaces { .. } => "inset_faces",
            Self::DissolveEdges { .. } => "dissolve_edges",
            Self::DissolveFaces { .. } => "dissolve_faces",
            Self::LoopCut { .. } => "loop_cut",
            Self::BridgeEdges { .. } => "bridge_edges",
            Self::BridgeEdgeLoops { .. } => "bridge_edge_loops",
            Self::MergeVertices(_) => "merge_vertices",
            Self::Symmetrize(_) => "symmetrize",
            Self::TriangulateFaces { .. } => "triangulate_faces",
            Self::QuadrangulateFaces { .. } => "quadrangulate_faces",
            Self::DeleteVertices { .. } => "delete_vertices",
            Self::DeleteEdges { .. } => "delete_edges",
            Self::DeleteFaces { .. } => "delete_faces",
        }
    }
}

/// What a command changed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandReport {
    pub vertices_created: usize,
    pub vertices_removed: usize,
    pub edges_created: usize,
    pub edges_removed: usize,
    pub faces_created: usize,
    pub faces_removed: usize,
    /// Raw ids of batch items that were skipped
    pub skipped: Vec<u32>,
}

impl CommandReport {
    /// Whether the command left the mesh untouched
    pub fn is_noop(&self) -> bool {
        self.vertices_created == 0
            && self.vertices_removed == 0
            && self.edges_created == 0
            && self.edges_removed == 0
            && self.faces_created == 0
            && self.faces_removed == 0
    }
}

/// Ids present before a command ran
struct Snapshot {
    vertices: BTreeSet<VertexId>,
    edges: BTreeSet<EdgeId>,
    faces: BTreeSet<FaceId>,
}

impl Snapshot {
    fn take(store: &MeshStore) -> Self {
        Self {
            vertices: store.vertices().map(|v| v.id).collect(),
            edges: store.edges().map(|e| e.id).collect(),
            faces: store.faces().map(|f| f.id).collect(),
        }
    }

    fn diff(&self, store: &MeshStore, skipped: Vec<u32>) -> CommandReport {
        let after = Snapshot::take(store);
        CommandReport {
            vertices_created: after.vertices.difference(&self.vertices).count(),
            vertices_removed: self.vertices.difference(&after.vertices).count(),
            edges_created: after.edges.difference(&self.edges).count(),
            edges_removed: self.edges.difference(&after.edges).count(),
            faces_created: after.faces.difference(&self.faces).count(),
            faces_removed: self.faces.difference(&after.faces).count(),
            skipped,
        }
    }
}

fn skipped_raw<I: Copy, T>(outcome: &BatchOutcome<I, T>, raw: impl Fn(I) -> u32) -> Vec<u32> {
    outcome.skipped.iter().map(|(id, _)| raw(*id)).collect()
}

/// Run a command against a store.
///
/// Batch commands never fail; their skipped ids are listed in the report.
/// Single-target commands (`MoveVertex`, `SetFaceMaterial`, `LoopCut`,
/// `BridgeEdges`) propagate `NotFound` and leave the store unchanged.
pub fn apply_command(store: &mut MeshStore, command: &EditCommand) -> MeshResult<CommandReport> {
    trace!("apply_command: {}", command.name());
    let before = Snapshot::take(store);

    let skipped = match command {
        EditCommand::MoveVertex { vertex, position } => {
            store.move_vertex(*vertex, *position)?;
            Vec::new()
        }
        EditCommand::SetFaceMaterial { face, material } => {
            store.set_face_material(*face, *material)?;
            Vec::new()
        }
        EditCommand::ExtrudeFaces { faces, distance } => {
            skipped_raw(&ops::extrude_faces(store, faces, *distance), |f| f.0)
        }
        EditCommand::SubdivideEdges { edges, splits } => {
            skipped_raw(&ops::subdivide_edges(store, edges, *splits), |e| e.0)
        }
        EditCommand::BevelEdges { edges, width } => {
            skipped_raw(&ops::bevel_edges(store, edges, *width), |e| e.0)
        }
        EditCommand::InsetFaces { faces, amount } => {
            skipped_raw(&ops::inset_faces(store, faces, *amount), |f| f.0)
        }
        EditCommand::DissolveEdges { edges } => {
            skipped_raw(&ops::dissolve_edges(store, edges), |e| e.0)
        }
        EditCommand::DissolveFaces { faces } => {
            skipped_raw(&ops::dissolve_faces(store, faces), |f| f.0)
        }
        EditCommand::LoopCut { edge, cuts } => {
            ops::loop_cut(store, *edge, *cuts)?;
            Vec::new()
        }
        EditCommand::BridgeEdges { a, b } => match ops::bridge_edges(store, *a, *b)? {
            Some(_) => Vec::new(),
            None => vec![a.0, b.0],
        },
        EditCommand::BridgeEdgeLoops { loop_a, loop_b } => {
            skipped_raw(&ops::bridge_edge_loops(store, loop_a, loop_b), |e| e.0)
        }
        EditCommand::MergeVertices(target) => ops::merge_vertices(store, target)
            .skipped
            .iter()
            .map(|v| v.0)
            .collect(),
        EditCommand::Symmetrize(options) => {
            ops::symmetrize(store, *options);
            Vec::new()
        }
        EditCommand::TriangulateFaces { faces } => {
            skipped_raw(&ops::triangulate_faces(store, faces), |f| f.0)
        }
        EditCommand::QuadrangulateFaces { faces } => {
            skipped_raw(&ops::quadrangulate_faces(store, faces), |f| f.0)
        }
        EditCommand::DeleteVertices { vertices } => {
            skipped_raw(&ops::delete_vertices(store, vertices), |v| v.0)
        }
        EditCommand::DeleteEdges { edges } => {
            skipped_raw(&ops::delete_edges(store, edges), |e| e.0)
        }
        EditCommand::DeleteFaces { faces } => {
            skipped_raw(&ops::delete_faces(store, faces), |f| f.0)
        }
    };

    let report = before.diff(store, skipped);
    debug!(
        "{}: +{}/-{} vertices, +{}/-{} edges, +{}/-{} faces, {} skipped",
        command.name(),
        report.vertices_created,
        report.vertices_removed,
        report.edges_created,
        report.edges_removed,
        report.faces_created,
        report.faces_removed,
        report.skipped.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Axis;
    use crate::primitives::cube;
    use crate::types::MeshError;

    #[test]
    fn test_extrude_command_report() {
        let mut mesh = cube(1.0, 1);
        let face = mesh.face_ids()[0];
        let report = apply_command(
            &mut mesh,
            &EditCommand::ExtrudeFaces {
                faces: vec![face, FaceId(9999)],
                distance: 1.0,
            },
        )
        .unwrap();

        assert_eq!(report.vertices_created, 4);
        assert_eq!(report.faces_created, 5);
        assert_eq!(report.faces_removed, 0);
        assert_eq!(report.skipped, vec![9999]);
    }

    #[test]
    fn test_single_target_not_found_is_raised() {
        let mut mesh = cube(1.0, 1);
        let err = apply_command(
            &mut mesh,
            &EditCommand::LoopCut {
                edge: EdgeId(9999),
                cuts: 1,
            },
        )
        .unwrap_err();
        assert!(matches!(err, MeshError::NotFound { id: 9999, .. }));
        assert_eq!(mesh.face_count(), 6);
    }

    #[test]
    fn test_move_vertex_is_not_a_topology_change() {
        let mut mesh = cube(1.0, 1);
        let vertex = mesh.vertex_ids()[0];
        let report = apply_command(
            &mut mesh,
            &EditCommand::MoveVertex {
                vertex,
                position: Vec3::splat(3.0),
            },
        )
        .unwrap();
        assert!(report.is_noop());
        assert_eq!(mesh.position(vertex), Some(Vec3::splat(3.0)));
    }

    #[test]
    fn test_command_json_shape() {
        let command = EditCommand::DeleteFaces {
            faces: vec![FaceId(3)],
        };
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(json, r#"{"type":"DeleteFaces","data":{"faces":[3]}}"#);

        let parsed: EditCommand = serde_json::from_str(
            r#"{"type":"Symmetrize","data":{"axis":"X","merge_threshold":0.0001}}"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            EditCommand::Symmetrize(SymmetryOptions {
                axis: Axis::X,
                merge_threshold: Some(0.0001),
            })
        );
    }

    #[test]
    fn test_merge_command_lists_skipped_vertices() {
        let mut mesh = cube(1.0, 1);
        let report = apply_command(
            &mut mesh,
            &EditCommand::MergeVertices(MergeTarget::Vertices(vec![VertexId(9999)])),
        )
        .unwrap();
        assert_eq!(report.skipped, vec![9999]);
        assert!(report.is_noop());
    }
}
