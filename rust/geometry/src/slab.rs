// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall slabs with rectangular through-openings
//!
//! A slab is a box spanned by a horizontal centerline segment, a thickness
//! and a height. Openings are cut by splitting the face into a grid at every
//! opening edge and emitting only the solid cells, so neighbouring cells
//! share edges and the result stays closed without a general CSG step.

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use nalgebra::{Point2, Point3, Vector3};

/// Local frame of a wall slab
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlabFrame {
    /// Start of the centerline at the slab base
    pub origin: Point3<f64>,
    /// Unit direction along the centerline
    pub direction: Vector3<f64>,
    /// Unit horizontal normal, to the left of `direction`
    pub normal: Vector3<f64>,
}

impl SlabFrame {
    /// Build the frame for the segment `start -> end` at height `base_z`.
    /// Returns the frame and the segment length.
    pub fn from_segment(start: Point2<f64>, end: Point2<f64>, base_z: f64) -> Result<(Self, f64)> {
        let delta = end - start;
        let length = delta.norm();
        if length <= 0.0 || !length.is_finite() {
            return Err(Error::InvalidExtrusion(
                "Slab centerline has zero length".to_string(),
            ));
        }

        let direction = Vector3::new(delta.x / length, delta.y / length, 0.0);
        let frame = Self {
            origin: Point3::new(start.x, start.y, base_z),
            direction,
            normal: Vector3::new(-direction.y, direction.x, 0.0),
        };
        Ok((frame, length))
    }

    /// World position of slab-local coordinates (along, across, up)
    #[inline]
    pub fn point(&self, along: f64, across: f64, up: f64) -> Point3<f64> {
        self.origin + self.direction * along + self.normal * across + Vector3::z() * up
    }
}

/// A rectangular void in slab-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoidRect {
    /// Distance from the slab start to the near edge of the void
    pub offset: f64,
    pub width: f64,
    /// Height of the void bottom above the slab base
    pub sill: f64,
    pub height: f64,
}

impl VoidRect {
    #[inline]
    fn contains(&self, along: f64, up: f64) -> bool {
        along > self.offset
            && along < self.offset + self.width
            && up > self.sill
            && up < self.sill + self.height
    }
}

/// Extrude a slab of `thickness` and `height` along `frame`, cutting `voids`.
///
/// Voids are clipped to the slab face. Breakpoints closer than `tolerance`
/// collapse, which keeps slivers out of the mesh.
pub fn extrude_slab(
    frame: &SlabFrame,
    length: f64,
    thickness: f64,
    height: f64,
    voids: &[VoidRect],
    tolerance: f64,
) -> Result<Mesh> {
    let positive = |v: f64| v > 0.0 && v.is_finite();
    if !positive(length) || !positive(thickness) || !positive(height) {
        return Err(Error::InvalidExtrusion(format!(
            "Slab dimensions must be positive (length={}, thickness={}, height={})",
            length, thickness, height
        )));
    }

    let mut us = vec![0.0, length];
    let mut vs = vec![0.0, height];
    for void in voids {
        us.push(void.offset.clamp(0.0, length));
        us.push((void.offset + void.width).clamp(0.0, length));
        vs.push(void.sill.clamp(0.0, height));
        vs.push((void.sill + void.height).clamp(0.0, height));
    }
    let us = breakpoints(us, tolerance);
    let vs = breakpoints(vs, tolerance);
    let (nu, nv) = (us.len() - 1, vs.len() - 1);

    let solid = |i: isize, j: isize| -> bool {
        if i < 0 || j < 0 || i as usize >= nu || j as usize >= nv {
            return false;
        }
        let (i, j) = (i as usize, j as usize);
        let uc = (us[i] + us[i + 1]) * 0.5;
        let vc = (vs[j] + vs[j + 1]) * 0.5;
        !voids.iter().any(|v| v.contains(uc, vc))
    };

    // Nodes where two solid cells meet only diagonally get one vertex per
    // cell row, so each cell's border edges keep exactly two triangles
    let pinched = |i: usize, j: usize| -> bool {
        let (i, j) = (i as isize, j as isize);
        let (bl, br) = (solid(i - 1, j - 1), solid(i, j - 1));
        let (tl, tr) = (solid(i - 1, j), solid(i, j));
        (bl && tr && !br && !tl) || (br && tl && !bl && !tr)
    };

    let half = thickness * 0.5;
    let mut mesh = Mesh::with_capacity((nu + 1) * (nv + 1) * 2, nu * nv * 4);
    let mut nodes: Vec<Option<u32>> = vec![None; (nu + 1) * (nv + 1) * 4];
    // `row` is the cell row asking for the node
    let mut node = |mesh: &mut Mesh, row: usize, i: usize, j: usize, side: usize| -> u32 {
        let copy = usize::from(row == j && pinched(i, j));
        let key = ((j * (nu + 1) + i) * 2 + side) * 2 + copy;
        *nodes[key].get_or_insert_with(|| {
            let across = if side == 0 { -half } else { half };
            mesh.add_vertex(frame.point(us[i], across, vs[j]))
        })
    };

    let up = Vector3::z();
    for j in 0..nv {
        for i in 0..nu {
            let (ii, jj) = (i as isize, j as isize);
            if !solid(ii, jj) {
                continue;
            }

            for (side, outward) in [(0, -frame.normal), (1, frame.normal)] {
                let corners = [
                    node(&mut mesh, j, i, j, side),
                    node(&mut mesh, j, i + 1, j, side),
                    node(&mut mesh, j, i + 1, j + 1, side),
                    node(&mut mesh, j, i, j + 1, side),
                ];
                mesh.add_quad(corners, &outward);
            }

            // Exposed cell borders: (neighbour, edge nodes, outward)
            let borders = [
                ((ii - 1, jj), [(i, j), (i, j + 1)], -frame.direction),
                ((ii + 1, jj), [(i + 1, j), (i + 1, j + 1)], frame.direction),
                ((ii, jj - 1), [(i, j), (i + 1, j)], -up),
                ((ii, jj + 1), [(i, j + 1), (i + 1, j + 1)], up),
            ];
            for ((ni, nj), [(ai, aj), (bi, bj)], outward) in borders {
                if solid(ni, nj) {
                    continue;
                }
                let corners = [
                    node(&mut mesh, j, ai, aj, 0),
                    node(&mut mesh, j, bi, bj, 0),
                    node(&mut mesh, j, bi, bj, 1),
                    node(&mut mesh, j, ai, aj, 1),
                ];
                mesh.add_quad(corners, &outward);
            }
        }
    }

    Ok(mesh)
}

/// Sort and collapse breakpoints closer than `tolerance`
fn breakpoints(mut values: Vec<f64>, tolerance: f64) -> Vec<f64> {
    values.sort_by(|a, b| a.total_cmp(b));
    let last = values.last().copied().unwrap_or(0.0);
    let mut result: Vec<f64> = Vec::with_capacity(values.len());
    for v in values {
        match result.last() {
            Some(&prev) if v - prev <= tolerance => {}
            _ => result.push(v),
        }
    }
    // The far edge must stay exact
    if let Some(end) = result.last_mut() {
        *end = last;
    }
    result
}
