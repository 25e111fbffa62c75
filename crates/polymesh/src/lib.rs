//! polymesh - editable polygon meshes
//!
//! This crate provides an indexed n-gon mesh and the operators that edit it:
//! - [`store::MeshStore`] - unchecked arena of vertices, edges, faces, materials and UVs
//! - [`builder::MeshBuilder`] - construction with vertex and edge deduplication
//! - [`primitives`] - procedural generators built on the builder
//! - [`ops`] - extrude, subdivide, bevel, inset, dissolve, loop cut, bridge, merge, symmetry
//! - [`validate`] - read-only topology checks
//! - [`render`] - triangle buffers for a renderer
//! - [`command`] - serializable edit commands

pub mod builder;
pub mod command;
pub mod id;
pub mod ops;
pub mod primitives;
pub mod render;
pub mod store;
pub mod types;
pub mod validate;

pub use builder::MeshBuilder;
pub use command::{CommandReport, EditCommand, apply_command};
pub use id::IdAllocator;
pub use ops::{BatchOutcome, SkipReason};
pub use polymesh_config::Tolerances;
pub use render::{RenderMesh, to_render_mesh};
pub use store::MeshStore;
pub use types::*;
pub use validate::{ValidationReport, is_watertight, validate_mesh_topology};
