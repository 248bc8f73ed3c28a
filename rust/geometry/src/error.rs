// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Triangulation failed: {0}")]
    TriangulationError(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid extrusion parameters: {0}")]
    InvalidExtrusion(String),

    #[error("Boolean operation failed: {0}")]
    BooleanError(String),

    #[error("Mesh is not closed: {} defective edge(s)", .0.len())]
    OpenMesh(Vec<EdgeDefect>),
}

/// An undirected mesh edge whose triangle incidence is not exactly two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeDefect {
    /// Smaller vertex index
    pub a: u32,
    /// Larger vertex index
    pub b: u32,
    /// Number of triangles using this edge
    pub incidence: u32,
}
