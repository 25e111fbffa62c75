//! polymesh-codec - mesh file import and export
//!
//! | Format        | Tag   | Import | Export | Notes                                  |
//! |---------------|-------|--------|--------|----------------------------------------|
//! | Wavefront OBJ | `obj` | ✓      | ✓      | positions, UVs, polygons, `usemtl`     |
//! | Binary glTF   | `glb` | ✓      | ✓      | polygons kept via `faceVertexCounts`   |
//!
//! Use [`import_mesh`]/[`export_mesh`] with an [`ExportFormat`], or
//! [`load`]/[`save`] to pick the format from a file extension.

pub mod error;
pub mod glb;
pub mod obj;

use std::path::Path;

use polymesh::MeshStore;
use polymesh_config::CodecConfig;
use tracing::debug;

pub use error::{CodecError, CodecResult};

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Obj,
    Glb,
}

impl ExportFormat {
    /// Parse a format tag such as `"obj"` or `"GLB"`
    pub fn from_tag(tag: &str) -> CodecResult<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "obj" => Ok(Self::Obj),
            "glb" => Ok(Self::Glb),
            _ => Err(CodecError::Unsupported(format!("format '{tag}'"))),
        }
    }

    /// Format from a path's extension
    pub fn from_path(path: &Path) -> CodecResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)");
        Self::from_tag(extension)
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Obj => "obj",
            Self::Glb => "glb",
        }
    }
}

/// Decode a mesh from bytes
pub fn import_mesh(bytes: &[u8], format: ExportFormat) -> CodecResult<MeshStore> {
    match format {
        ExportFormat::Obj => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| CodecError::Malformed(format!("OBJ is not UTF-8: {e}")))?;
            obj::read_obj(text)
        }
        ExportFormat::Glb => glb::read_glb(bytes),
    }
}

/// Encode a mesh to bytes
pub fn export_mesh(
    store: &MeshStore,
    format: ExportFormat,
    config: &CodecConfig,
) -> CodecResult<Vec<u8>> {
    match format {
        ExportFormat::Obj => {
            let mut bytes = Vec::new();
            obj::write_obj(store, &mut bytes, config)?;
            Ok(bytes)
        }
        ExportFormat::Glb => glb::write_glb(store, config),
    }
}

/// Load a mesh, picking the format from the file extension
pub fn load<P: AsRef<Path>>(path: P) -> CodecResult<MeshStore> {
    let path = path.as_ref();
    let format = ExportFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    debug!("loading {} ({} bytes) as {}", path.display(), bytes.len(), format.tag());
    import_mesh(&bytes, format)
}

/// Save a mesh, picking the format from the file extension
pub fn save<P: AsRef<Path>>(store: &MeshStore, path: P, config: &CodecConfig) -> CodecResult<()> {
    let path = path.as_ref();
    let format = ExportFormat::from_path(path)?;
    let bytes = export_mesh(store, format, config)?;
    debug!("saving {} ({} bytes) as {}", path.display(), bytes.len(), format.tag());
    std::fs::write(path, bytes)?;
    Ok(())
}
