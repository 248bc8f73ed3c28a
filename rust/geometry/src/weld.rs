// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial hash for tolerance-based vertex lookup.
//!
//! Space is divided into cubic cells of side `cell_size`; a query scans the
//! 3x3x3 neighbourhood of its cell, so lookups are exact as long as the
//! query tolerance does not exceed the cell size.

use nalgebra::Point3;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

#[derive(Debug, Clone)]
pub struct VertexGrid {
    cell_size: f64,
    grid: FxHashMap<(i64, i64, i64), SmallVec<[u32; 4]>>,
}

impl VertexGrid {
    /// Creates an empty grid. `cell_size` should be >= the query tolerance.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            grid: FxHashMap::default(),
        }
    }

    /// Index the given vertices of `vertices`
    pub fn from_indices(
        vertices: &[Point3<f64>],
        indices: impl IntoIterator<Item = u32>,
        cell_size: f64,
    ) -> Self {
        let mut grid = Self::new(cell_size);
        for i in indices {
            grid.insert(i, &vertices[i as usize]);
        }
        grid
    }

    pub fn insert(&mut self, index: u32, position: &Point3<f64>) {
        let cell = self.cell_coords(position);
        self.grid.entry(cell).or_default().push(index);
    }

    /// Nearest indexed vertex within `tolerance` of `position`.
    ///
    /// Ties resolve to the smallest index so results do not depend on
    /// hash iteration order.
    pub fn find_near(
        &self,
        vertices: &[Point3<f64>],
        position: &Point3<f64>,
        tolerance: f64,
    ) -> Option<u32> {
        let (cx, cy, cz) = self.cell_coords(position);
        let tol_sq = tolerance * tolerance;
        let mut best: Option<(f64, u32)> = None;

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &i in bucket {
                        let dist_sq = (vertices[i as usize] - *position).norm_squared();
                        if dist_sq > tol_sq {
                            continue;
                        }
                        best = match best {
                            Some((d, j)) if d < dist_sq || (d == dist_sq && j < i) => Some((d, j)),
                            _ => Some((dist_sq, i)),
                        };
                    }
                }
            }
        }

        best.map(|(_, i)| i)
    }

    pub fn len(&self) -> usize {
        self.grid.values().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    fn cell_coords(&self, p: &Point3<f64>) -> (i64, i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
            (p.z / self.cell_size).floor() as i64,
        )
    }
}
