// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # gbxml-lite Geometry
//!
//! Geometry primitives for building solid reconstruction: a triangle mesh
//! arena with closure and volume checks, canonical 2D outlines, vertical
//! prism extrusion, wall slabs with rectangular openings, footprint unions
//! and a spatial hash for tolerance welding.

pub mod bool2d;
pub mod error;
pub mod extrusion;
pub mod mesh;
pub mod profile;
pub mod slab;
pub mod triangulation;
pub mod weld;

pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use bool2d::{compute_signed_area, point_in_contour, union_outer_contours};
pub use error::{EdgeDefect, Error, Result};
pub use extrusion::{extrude_prism, Prism};
pub use mesh::Mesh;
pub use profile::{rings_coincide, Profile2D};
pub use slab::{extrude_slab, SlabFrame, VoidRect};
pub use triangulation::triangulate_polygon;
pub use weld::VertexGrid;
