//! Error types for mesh import and export.

use polymesh::MeshError;
use thiserror::Error;

/// Errors raised while reading or writing mesh files
#[derive(Debug, Error)]
pub enum CodecError {
    /// The input does not follow the format
    #[error("Malformed input: {0}")]
    Malformed(String),

    /// A valid feature of the format this codec does not handle, or an unknown format tag
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The decoded data could not be applied to the mesh
    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),
}

/// Result alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
