//! Shared configuration for polymesh
//!
//! This crate provides the single source of truth for the numeric tolerances
//! used by the mesh engine (vertex welding, degeneracy checks, merging) and
//! the settings consumed by the file codecs.

use serde::{Deserialize, Serialize};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

/// Default absolute precision used to weld vertices by position
pub const DEFAULT_WELD_PRECISION: f64 = 1e-6;

/// Default minimum triangle area below which a face corner counts as degenerate
pub const DEFAULT_DEGENERATE_AREA: f32 = 1e-6;

/// Default distance used by threshold-based vertex merging
pub const DEFAULT_MERGE_DISTANCE: f32 = 1e-3;

/// Default distance from a mirror plane within which vertices are shared
pub const DEFAULT_PLANE_MERGE_DISTANCE: f32 = 1e-4;

/// Default number of decimal places written by the OBJ exporter
pub const DEFAULT_OBJ_PRECISION: usize = 6;

/// GLB header fields are written big-endian unless configured otherwise
pub const DEFAULT_GLB_BIG_ENDIAN_HEADER: bool = true;

/// Numeric tolerances for construction, editing and validation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct Tolerances {
    /// Per-axis rounding precision for position dedup keys
    pub weld_precision: f64,
    /// Triangle area below which a consecutive vertex triple is degenerate
    pub degenerate_area: f32,
    /// Euclidean distance for threshold vertex merging
    pub merge_distance: f32,
    /// Distance from a symmetry plane treated as "on the plane"
    pub plane_merge_distance: f32,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            weld_precision: DEFAULT_WELD_PRECISION,
            degenerate_area: DEFAULT_DEGENERATE_AREA,
            merge_distance: DEFAULT_MERGE_DISTANCE,
            plane_merge_distance: DEFAULT_PLANE_MERGE_DISTANCE,
        }
    }
}

impl Tolerances {
    /// Quantize one coordinate to the weld grid.
    ///
    /// Negative zero and values that round to zero both map to `0`, so
    /// mirrored seams produce identical keys.
    pub fn quantize(&self, value: f32) -> i64 {
        let scaled = (f64::from(value) / self.weld_precision).round();
        if scaled == 0.0 { 0 } else { scaled as i64 }
    }

    /// Quantize a full position to its weld key
    pub fn weld_key(&self, position: [f32; 3]) -> [i64; 3] {
        [
            self.quantize(position[0]),
            self.quantize(position[1]),
            self.quantize(position[2]),
        ]
    }
}

/// Settings for the OBJ and binary glTF codecs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct CodecConfig {
    /// Write the 12-byte GLB header big-endian; `false` writes it little-endian
    pub glb_big_endian_header: bool,
    /// Decimal places used for OBJ coordinates
    pub obj_precision: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            glb_big_endian_header: DEFAULT_GLB_BIG_ENDIAN_HEADER,
            obj_precision: DEFAULT_OBJ_PRECISION,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct EngineConfig {
    pub tolerances: Tolerances,
    pub codec: CodecConfig,
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the configuration as pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
