// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D polygon helpers and footprint unions
//!
//! Uses the i_overlay crate for the boolean work. Only outer boundaries
//! survive a union: interior rings (courtyards enclosed by walls) are
//! covered by the result.

use crate::error::{Error, Result};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;

/// Cross-product threshold under which a vertex counts as collinear
const COLLINEAR_EPSILON: f64 = 1e-9;

/// Minimum area for a union result to be kept
const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// Union a set of simple contours and return the outer boundary of every
/// resulting shape, counter-clockwise and sorted by descending area.
pub fn union_outer_contours(contours: &[Vec<Point2<f64>>]) -> Result<Vec<Vec<Point2<f64>>>> {
    let mut paths = contours
        .iter()
        .filter(|c| c.len() >= 3 && compute_signed_area(c).abs() > MIN_AREA_THRESHOLD)
        .map(|c| contour_to_path(&ensure_ccw(c)));

    let subject: Vec<Vec<[f64; 2]>> = match paths.next() {
        Some(first) => vec![first],
        None => return Ok(Vec::new()),
    };
    let clip: Vec<Vec<[f64; 2]>> = paths.collect();

    let shapes = subject.overlay(&clip, OverlayRule::Union, FillRule::NonZero);
    if shapes.is_empty() {
        return Err(Error::BooleanError(
            "Union of non-empty footprints produced no geometry".to_string(),
        ));
    }

    let mut outers: Vec<Vec<Point2<f64>>> = shapes
        .into_iter()
        .filter_map(|shape| shape.into_iter().next())
        .map(|path| path.into_iter().map(|p| Point2::new(p[0], p[1])).collect::<Vec<_>>())
        .map(|outer| simplify_contour(&ensure_ccw(&outer), COLLINEAR_EPSILON))
        .filter(|outer| compute_signed_area(outer) > MIN_AREA_THRESHOLD)
        .collect();

    outers.sort_by(|a, b| compute_signed_area(b).total_cmp(&compute_signed_area(a)));
    Ok(outers)
}

/// Compute the signed area of a 2D contour
/// Positive = counter-clockwise, Negative = clockwise
pub fn compute_signed_area(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = contour.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].y;
        area -= contour[j].x * contour[i].y;
    }

    area * 0.5
}

/// Ensure contour has counter-clockwise winding (positive area)
pub fn ensure_ccw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if compute_signed_area(contour) < 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Simplify a contour by removing collinear points
pub fn simplify_contour(contour: &[Point2<f64>], epsilon: f64) -> Vec<Point2<f64>> {
    if contour.len() <= 3 {
        return contour.to_vec();
    }

    let n = contour.len();
    let mut result = Vec::with_capacity(n);

    for i in 0..n {
        let prev = &contour[(i + n - 1) % n];
        let curr = &contour[i];
        let next = &contour[(i + 1) % n];

        let cross = (curr.x - prev.x) * (next.y - prev.y) - (curr.y - prev.y) * (next.x - prev.x);
        if cross.abs() > epsilon {
            result.push(*curr);
        }
    }

    if result.len() < 3 {
        return contour.to_vec();
    }

    result
}

/// Check if a point is inside a contour using ray casting
pub fn point_in_contour(point: &Point2<f64>, contour: &[Point2<f64>]) -> bool {
    if contour.len() < 3 {
        return false;
    }

    let mut inside = false;
    let n = contour.len();
    let mut j = n - 1;

    for i in 0..n {
        let pi = &contour[i];
        let pj = &contour[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

fn contour_to_path(contour: &[Point2<f64>]) -> Vec<[f64; 2]> {
    contour.iter().map(|p| [p.x, p.y]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    #[test]
    fn test_compute_signed_area_ccw() {
        assert_relative_eq!(compute_signed_area(&rect(0.0, 0.0, 1.0, 1.0)), 1.0);
    }

    #[test]
    fn test_compute_signed_area_cw() {
        let cw: Vec<_> = rect(0.0, 0.0, 1.0, 1.0).into_iter().rev().collect();
        assert_relative_eq!(compute_signed_area(&cw), -1.0);
        assert_relative_eq!(compute_signed_area(&ensure_ccw(&cw)), 1.0);
    }

    #[test]
    fn test_simplify_drops_collinear_vertex() {
        let contour = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        assert_eq!(simplify_contour(&contour, 1e-9).len(), 4);
    }

    #[test]
    fn test_point_in_contour() {
        let square = rect(0.0, 0.0, 2.0, 2.0);
        assert!(point_in_contour(&Point2::new(1.0, 1.0), &square));
        assert!(!point_in_contour(&Point2::new(3.0, 1.0), &square));
    }

    #[test]
    fn test_union_of_wall_ring_keeps_outer_boundary() {
        // Four wall footprints around a 10 x 8 room
        let walls = vec![
            rect(-0.1, -0.1, 10.1, 0.1),
            rect(9.9, -0.1, 10.1, 8.1),
            rect(-0.1, 7.9, 10.1, 8.1),
            rect(-0.1, -0.1, 0.1, 8.1),
        ];

        let outers = union_outer_contours(&walls).unwrap();
        assert_eq!(outers.len(), 1);
        assert_relative_eq!(compute_signed_area(&outers[0]), 10.2 * 8.2, epsilon = 1e-6);
    }

    #[test]
    fn test_union_of_disjoint_shapes_sorted_by_area() {
        let outers =
            union_outer_contours(&[rect(0.0, 0.0, 1.0, 1.0), rect(5.0, 5.0, 8.0, 8.0)]).unwrap();
        assert_eq!(outers.len(), 2);
        assert_relative_eq!(compute_signed_area(&outers[0]), 9.0, epsilon = 1e-9);
        assert_relative_eq!(compute_signed_area(&outers[1]), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_union_of_nothing_is_empty() {
        assert!(union_outer_contours(&[]).unwrap().is_empty());
    }
}
