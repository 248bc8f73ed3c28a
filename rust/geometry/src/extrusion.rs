// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extrusion operations - converting 2D profiles to closed prisms

use crate::bool2d::compute_signed_area;
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::profile::Profile2D;
use nalgebra::{Point2, Point3, Vector3};
use std::ops::Range;

/// A closed prism produced by [`extrude_prism`].
///
/// Cap and side faces share the ring vertices, so the mesh is closed as
/// built. The ring and cap ranges let callers fuse stacked prisms by
/// dropping a pair of caps and remapping one ring onto the other.
#[derive(Debug, Clone)]
pub struct Prism {
    pub mesh: Mesh,
    /// Bottom ring vertex indices, in profile order
    pub bottom_ring: Vec<u32>,
    /// Top ring vertex indices, in profile order
    pub top_ring: Vec<u32>,
    /// Triangle range of the bottom cap (faces -Z)
    pub bottom_cap: Range<usize>,
    /// Triangle range of the top cap (faces +Z)
    pub top_cap: Range<usize>,
}

/// Extrude a canonical profile vertically from `z0` to `z1`.
///
/// The profile is expected counter-clockwise (see
/// [`Profile2D::canonical`]); clockwise input is reversed first.
pub fn extrude_prism(profile: &Profile2D, z0: f64, z1: f64) -> Result<Prism> {
    let height = z1 - z0;
    if height <= 0.0 || !height.is_finite() {
        return Err(Error::InvalidExtrusion(format!(
            "Prism height must be positive (z0={}, z1={})",
            z0, z1
        )));
    }

    let ring: Vec<Point2<f64>> = if profile.area() < 0.0 {
        profile.outer.iter().rev().cloned().collect()
    } else {
        profile.outer.clone()
    };
    let n = ring.len();
    let cap = Profile2D::new(ring.clone()).triangulate()?;
    let cap_triangles = cap.len() / 3;

    let mut mesh = Mesh::with_capacity(n * 2, cap_triangles * 2 + n * 2);
    let bottom_ring: Vec<u32> = ring
        .iter()
        .map(|p| mesh.add_vertex(Point3::new(p.x, p.y, z0)))
        .collect();
    let top_ring: Vec<u32> = ring
        .iter()
        .map(|p| mesh.add_vertex(Point3::new(p.x, p.y, z1)))
        .collect();

    let bottom_start = mesh.triangle_count();
    for t in cap.chunks_exact(3) {
        let (a, b, c) = orient_ccw(&ring, t[0], t[1], t[2]);
        mesh.add_triangle(bottom_ring[a], bottom_ring[c], bottom_ring[b]);
    }
    let bottom_cap = bottom_start..mesh.triangle_count();

    let top_start = mesh.triangle_count();
    for t in cap.chunks_exact(3) {
        let (a, b, c) = orient_ccw(&ring, t[0], t[1], t[2]);
        mesh.add_triangle(top_ring[a], top_ring[b], top_ring[c]);
    }
    let top_cap = top_start..mesh.triangle_count();

    for i in 0..n {
        let j = (i + 1) % n;
        let edge = ring[j] - ring[i];
        let outward = Vector3::new(edge.y, -edge.x, 0.0);
        mesh.add_quad(
            [bottom_ring[i], bottom_ring[j], top_ring[j], top_ring[i]],
            &outward,
        );
    }

    Ok(Prism {
        mesh,
        bottom_ring,
        top_ring,
        bottom_cap,
        top_cap,
    })
}

/// Reorder a cap triangle so it is counter-clockwise in plan
#[inline]
fn orient_ccw(ring: &[Point2<f64>], a: usize, b: usize, c: usize) -> (usize, usize, usize) {
    if compute_signed_area(&[ring[a], ring[b], ring[c]]) < 0.0 {
        (a, c, b)
    } else {
        (a, b, c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rectangle(w: f64, h: f64) -> Profile2D {
        Profile2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(w, 0.0),
            Point2::new(w, h),
            Point2::new(0.0, h),
        ])
    }

    #[test]
    fn test_box_prism_is_closed_with_positive_volume() {
        let prism = extrude_prism(&rectangle(10.0, 8.0), 0.0, 3.0).unwrap();

        assert_eq!(prism.mesh.vertex_count(), 8);
        assert_eq!(prism.mesh.triangle_count(), 12);
        assert!(prism.mesh.check_closed().is_ok());
        assert_relative_eq!(prism.mesh.signed_volume(), 240.0, epsilon = 1e-9);
    }

    #[test]
    fn test_clockwise_profile_still_faces_outward() {
        let mut profile = rectangle(2.0, 2.0);
        profile.outer.reverse();

        let prism = extrude_prism(&profile, 3.0, 4.0).unwrap();
        assert_relative_eq!(prism.mesh.signed_volume(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cap_ranges_face_down_and_up() {
        let prism = extrude_prism(&rectangle(1.0, 1.0), 0.0, 1.0).unwrap();
        let normal_z = |t: usize| {
            let [a, b, c] = prism.mesh.triangle(t);
            let v = &prism.mesh.vertices;
            (v[b as usize] - v[a as usize])
                .cross(&(v[c as usize] - v[a as usize]))
                .z
        };

        assert!(prism.bottom_cap.clone().all(|t| normal_z(t) < 0.0));
        assert!(prism.top_cap.clone().all(|t| normal_z(t) > 0.0));
    }

    #[test]
    fn test_l_shaped_prism_volume() {
        let profile = Profile2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(6.0, 0.0),
            Point2::new(6.0, 3.0),
            Point2::new(3.0, 3.0),
            Point2::new(3.0, 6.0),
            Point2::new(0.0, 6.0),
        ]);

        let prism = extrude_prism(&profile, 0.0, 2.0).unwrap();
        assert!(prism.mesh.check_closed().is_ok());
        assert_relative_eq!(prism.mesh.signed_volume(), 54.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_height_rejected() {
        assert!(extrude_prism(&rectangle(1.0, 1.0), 2.0, 2.0).is_err());
    }
}
