// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::types::{FeatureRef, ImageRole};
use gbxml_lite_geometry::EdgeDefect;
use thiserror::Error;

/// Result type for reconstruction
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal reconstruction errors. Recoverable conditions are
/// [`Warning`](crate::warning::Warning)s instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid scale for image '{image_id}': {reason}")]
    InvalidScale { image_id: String, reason: String },

    #[error("No floor plans supplied")]
    EmptyInput,

    #[error("Image '{image_id}' has role {actual:?}, expected {expected:?}")]
    RoleMismatch {
        image_id: String,
        expected: ImageRole,
        actual: ImageRole,
    },

    #[error("Floor plan '{0}' has no floor level")]
    MissingFloorLevel(String),

    #[error("Elevation '{0}' has no orientation")]
    MissingOrientation(String),

    #[error("Floor level {level} declared by both '{first}' and '{second}'")]
    DuplicateFloorLevel {
        level: i32,
        first: String,
        second: String,
    },

    #[error("Floor level {level} has invalid height {height}")]
    InvalidFloorHeight { level: i32, height: f64 },

    #[error("Floor level {upper} (base {upper_base:.3}) overlaps floor level {lower} (top {lower_top:.3})")]
    OverlappingFloors {
        lower: i32,
        upper: i32,
        lower_top: f64,
        upper_base: f64,
    },

    #[error("Building mesh is not manifold: {} defective edge(s)", .edges.len())]
    NonManifoldMesh { edges: Vec<EdgeDefect> },

    #[error("Room {room} has invalid volume {volume}")]
    InvalidShellVolume { room: FeatureRef, volume: f64 },

    #[error("Geometry error: {0}")]
    Geometry(#[from] gbxml_lite_geometry::Error),

    #[error("Malformed OBJ at line {line}: {reason}")]
    ObjParse { line: usize, reason: String },
}
