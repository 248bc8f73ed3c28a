// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Profile definitions and triangulation

use crate::bool2d::compute_signed_area;
use crate::error::{Error, Result};
use crate::triangulation::triangulate_polygon;
use nalgebra::Point2;

/// Simple closed 2D profile (no holes)
#[derive(Debug, Clone, PartialEq)]
pub struct Profile2D {
    /// Outer boundary (counter-clockwise once canonicalized)
    pub outer: Vec<Point2<f64>>,
}

impl Profile2D {
    /// Create a new profile
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self { outer }
    }

    /// Clean the outline and put it into canonical form.
    ///
    /// Consecutive points closer than `tolerance` collapse (including an
    /// explicit closing point), the winding becomes counter-clockwise and the
    /// ring starts at its lowest, then leftmost, vertex. Two outlines that
    /// describe the same polygon therefore produce the same vertex order.
    pub fn canonical(&self, tolerance: f64) -> Result<Self> {
        let mut points: Vec<Point2<f64>> = Vec::with_capacity(self.outer.len());
        for p in &self.outer {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(Error::InvalidProfile(
                    "Profile contains non-finite coordinates".to_string(),
                ));
            }
            match points.last() {
                Some(last) if (*p - *last).norm() <= tolerance => {}
                _ => points.push(*p),
            }
        }
        while points.len() > 1 {
            let first = points[0];
            match points.last() {
                Some(last) if (first - *last).norm() <= tolerance => {
                    points.pop();
                }
                _ => break,
            }
        }

        if points.len() < 3 {
            return Err(Error::InvalidProfile(
                "Profile must have at least 3 distinct vertices".to_string(),
            ));
        }

        let area = compute_signed_area(&points);
        if area.abs() <= tolerance * tolerance {
            return Err(Error::InvalidProfile("Profile has no area".to_string()));
        }
        if area < 0.0 {
            points.reverse();
        }

        let start = points
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)))
            .map(|(i, _)| i)
            .unwrap_or(0);
        points.rotate_left(start);

        Ok(Self { outer: points })
    }

    /// Signed area (positive for counter-clockwise)
    pub fn area(&self) -> f64 {
        compute_signed_area(&self.outer)
    }

    /// Triangulate the profile
    /// Returns triangle indices into `outer`
    pub fn triangulate(&self) -> Result<Vec<usize>> {
        if self.outer.len() < 3 {
            return Err(Error::InvalidProfile(
                "Profile must have at least 3 vertices".to_string(),
            ));
        }
        triangulate_polygon(&self.outer)
    }
}

/// Check whether two rings describe the same polygon within `tolerance`.
///
/// Rings must have the same vertex count and run in the same direction; the
/// starting vertex may differ.
pub fn rings_coincide(a: &[Point2<f64>], b: &[Point2<f64>], tolerance: f64) -> bool {
    let n = a.len();
    if n == 0 || n != b.len() {
        return false;
    }

    (0..n).any(|shift| (0..n).all(|i| (a[i] - b[(i + shift) % n]).norm() <= tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_canonical_drops_closing_point_and_reorders() {
        let profile = Profile2D::new(vec![
            Point2::new(10.0, 8.0),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 8.0),
            Point2::new(10.0, 8.0),
        ]);

        let canonical = profile.canonical(1e-6).unwrap();
        assert_eq!(canonical.outer.len(), 4);
        assert_eq!(canonical.outer[0], Point2::new(0.0, 0.0));
        assert_eq!(canonical.outer[1], Point2::new(10.0, 0.0));
        assert_relative_eq!(canonical.area(), 80.0);
    }

    #[test]
    fn test_canonical_rejects_degenerate() {
        let line = Profile2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 0.0),
        ]);
        assert!(line.canonical(1e-6).is_err());
    }

    #[test]
    fn test_rings_coincide_with_rotation() {
        let a = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 3.0),
            Point2::new(0.0, 3.0),
        ];
        let b = vec![
            Point2::new(4.0, 3.00001),
            Point2::new(0.0, 3.0),
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
        ];

        assert!(rings_coincide(&a, &b, 1e-4));
        assert!(!rings_coincide(&a, &b, 1e-6));

        let reversed: Vec<_> = a.iter().rev().cloned().collect();
        assert!(!rings_coincide(&a, &reversed, 1e-4));
    }
}
