// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures
//!
//! A [`Mesh`] is a vertex arena plus a flat list of triangle index triples.
//! Vertices are kept in f64 so tolerance welding and volume checks work on
//! the same numbers that are later written to disk.

use crate::error::{EdgeDefect, Error, Result};
use nalgebra::{Point3, Vector3};
use rustc_hash::FxHashMap;

/// Triangle mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions
    pub vertices: Vec<Point3<f64>>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            indices: Vec::with_capacity(triangle_count * 3),
        }
    }

    /// Add a vertex and return its index
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>) -> u32 {
        self.vertices.push(position);
        (self.vertices.len() - 1) as u32
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Add a planar quad given in cyclic corner order.
    ///
    /// The two triangles are wound so their normal agrees with `outward`.
    pub fn add_quad(&mut self, corners: [u32; 4], outward: &Vector3<f64>) {
        let [a, b, c, d] = corners;
        let pa = self.vertices[a as usize];
        let normal = (self.vertices[b as usize] - pa).cross(&(self.vertices[c as usize] - pa));
        if normal.dot(outward) >= 0.0 {
            self.add_triangle(a, b, c);
            self.add_triangle(a, c, d);
        } else {
            self.add_triangle(a, c, b);
            self.add_triangle(a, d, c);
        }
    }

    /// Merge another mesh into this one, returning the vertex offset applied
    #[inline]
    pub fn merge(&mut self, other: &Mesh) -> u32 {
        let vertex_offset = self.vertices.len() as u32;
        if other.is_empty() {
            return vertex_offset;
        }

        self.vertices.reserve(other.vertices.len());
        self.indices.reserve(other.indices.len());

        self.vertices.extend_from_slice(&other.vertices);
        self.indices
            .extend(other.indices.iter().map(|&i| i + vertex_offset));
        vertex_offset
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Triangle `i` as an index triple
    #[inline]
    pub fn triangle(&self, i: usize) -> [u32; 3] {
        [
            self.indices[i * 3],
            self.indices[i * 3 + 1],
            self.indices[i * 3 + 2],
        ]
    }

    /// Iterate over triangles as index triples
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Calculate bounds (min, max)
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;

        for p in &self.vertices[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some((min, max))
    }

    /// Signed enclosed volume (divergence theorem).
    ///
    /// Positive for a closed mesh whose triangles face outward. Coordinates
    /// are taken relative to the bounds minimum to limit cancellation.
    pub fn signed_volume(&self) -> f64 {
        self.signed_volume_of(0..self.triangle_count())
    }

    /// Signed volume of a contiguous range of triangles
    pub fn signed_volume_of(&self, triangles: std::ops::Range<usize>) -> f64 {
        let origin = match self.bounds() {
            Some((min, _)) => min,
            None => return 0.0,
        };

        let mut six_volume = 0.0;
        for t in triangles {
            let [i0, i1, i2] = self.triangle(t);
            let a = self.vertices[i0 as usize] - origin;
            let b = self.vertices[i1 as usize] - origin;
            let c = self.vertices[i2 as usize] - origin;
            six_volume += a.dot(&b.cross(&c));
        }
        six_volume / 6.0
    }

    /// Undirected edges whose triangle incidence differs from two, sorted.
    ///
    /// Degenerate triangles (repeated indices) contribute a self-edge so they
    /// are reported rather than ignored.
    pub fn edge_defects(&self) -> Vec<EdgeDefect> {
        let mut incidence: FxHashMap<(u32, u32), u32> = FxHashMap::default();
        for [i0, i1, i2] in self.triangles() {
            for (a, b) in [(i0, i1), (i1, i2), (i2, i0)] {
                let key = if a <= b { (a, b) } else { (b, a) };
                *incidence.entry(key).or_insert(0) += 1;
            }
        }

        let mut defects: Vec<EdgeDefect> = incidence
            .into_iter()
            .filter(|&((a, b), count)| count != 2 || a == b)
            .map(|((a, b), incidence)| EdgeDefect { a, b, incidence })
            .collect();
        defects.sort();
        defects
    }

    /// Verify every edge is shared by exactly two triangles
    pub fn check_closed(&self) -> Result<()> {
        let defects = self.edge_defects();
        if defects.is_empty() {
            Ok(())
        } else {
            Err(Error::OpenMesh(defects))
        }
    }

    /// Keep only the triangles for which `keep` returns true, preserving order
    pub fn retain_triangles<F>(&mut self, mut keep: F)
    where
        F: FnMut(usize, [u32; 3]) -> bool,
    {
        let mut kept = Vec::with_capacity(self.indices.len());
        for (i, tri) in self.triangles().enumerate() {
            if keep(i, tri) {
                kept.extend_from_slice(&tri);
            }
        }
        self.indices = kept;
    }

    /// Drop vertices no triangle references, keeping the relative order of
    /// the survivors. Returns the number of vertices removed.
    pub fn compact(&mut self) -> usize {
        let mut used = vec![false; self.vertices.len()];
        for &i in &self.indices {
            used[i as usize] = true;
        }

        let mut remap = vec![u32::MAX; self.vertices.len()];
        let mut next = 0u32;
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for (i, p) in self.vertices.iter().enumerate() {
            if used[i] {
                remap[i] = next;
                vertices.push(*p);
                next += 1;
            }
        }

        let removed = self.vertices.len() - vertices.len();
        for i in self.indices.iter_mut() {
            *i = remap[*i as usize];
        }
        self.vertices = vertices;
        removed
    }

    /// Clear the mesh
    #[inline]
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }
}
