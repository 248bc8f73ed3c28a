// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! View alignment
//!
//! Floor plans give the X-Y layout of each level; elevations give floor
//! heights (from their horizontal band lines) and the vertical placement of
//! windows and doors. Plans use X east / Y north. An elevation's horizontal
//! axis is plan X for north and south façades and plan Y for east and west
//! façades; its vertical axis is Z up.

use crate::config::ReconstructionConfig;
use crate::error::{Error, Result};
use crate::types::{
    AlignedModel, Feature, FeatureRef, Floor, HeightSource, ImageRole,
    NormalizedFeatureSet, Opening, OpeningKind, OpeningSource, Orientation, Point2D, Room, Wall,
};
use crate::warning::{DeferredTo, Warning};
use gbxml_lite_geometry::{point_in_contour, union_outer_contours, Point2, Profile2D};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Base and height of one floor read off an elevation
#[derive(Debug, Clone, Copy, PartialEq)]
struct Band {
    base: f64,
    height: f64,
}

/// An elevation together with its clustered band lines
struct Facade<'a> {
    set: &'a NormalizedFeatureSet,
    orientation: Orientation,
    /// Distinct horizontal line heights, ascending
    lines: Vec<f64>,
}

impl Facade<'_> {
    /// Elevation Z of the lowest band line; opening heights are taken from here
    fn ground(&self) -> f64 {
        self.lines.first().copied().unwrap_or(0.0)
    }
}

/// Align floor plans and elevations into ordered floors with placed openings.
pub fn align(
    plans: &[NormalizedFeatureSet],
    elevations: &[NormalizedFeatureSet],
    config: &ReconstructionConfig,
    warnings: &mut Vec<Warning>,
) -> Result<AlignedModel> {
    check_roles(plans, ImageRole::FloorPlan)?;
    check_roles(elevations, ImageRole::Elevation)?;
    if plans.is_empty() {
        return Err(Error::EmptyInput);
    }

    let mut by_level: BTreeMap<i32, &NormalizedFeatureSet> = BTreeMap::new();
    for plan in plans {
        let level = plan
            .raw
            .floor_level
            .ok_or_else(|| Error::MissingFloorLevel(plan.image_id().to_string()))?;
        if let Some(first) = by_level.insert(level, plan) {
            return Err(Error::DuplicateFloorLevel {
                level,
                first: first.image_id().to_string(),
                second: plan.image_id().to_string(),
            });
        }
    }

    let mut facades = Vec::with_capacity(elevations.len());
    for set in elevations {
        let orientation = set
            .raw
            .orientation
            .ok_or_else(|| Error::MissingOrientation(set.image_id().to_string()))?;
        facades.push(Facade {
            set,
            orientation,
            lines: band_lines(set, config),
        });
    }
    // Stable: elevations sharing an orientation keep their input order
    facades.sort_by_key(|f| f.orientation);

    let bands = infer_bands(&facades, by_level.len());
    let mut floors = Vec::with_capacity(by_level.len());
    let mut next_base = 0.0;

    for (index, (level, plan)) in by_level.into_iter().enumerate() {
        let (mut base, mut height, mut height_source) = match &bands {
            Ok(bands) => (bands[index].base, bands[index].height, HeightSource::Bands),
            Err(_) => (next_base, config.default_floor_height, HeightSource::Default),
        };
        if let Some(declared) = plan.raw.declared_height {
            height = declared;
            height_source = HeightSource::Declared;
        }
        if let Some(declared) = plan.raw.declared_elevation {
            base = declared;
        }
        if !height.is_finite() || height <= 0.0 {
            return Err(Error::InvalidFloorHeight { level, height });
        }
        next_base = base + height;

        let (mut walls, rooms) = plan_geometry(plan, config, warnings);
        orient_walls(&mut walls);

        let mut floor = Floor {
            index,
            level,
            image_id: plan.image_id().to_string(),
            base,
            height,
            height_source,
            walls,
            rooms,
            deferred: Vec::new(),
        };
        place_plan_openings(plan, &mut floor, config, warnings);
        floors.push(floor);
    }

    if floors
        .iter()
        .any(|f| f.height_source == HeightSource::Default)
    {
        let reason = match &bands {
            Err(reason) => reason.clone(),
            Ok(_) => "bands unavailable".to_string(),
        };
        tracing::warn!(%reason, "Falling back to default floor height");
        warnings.push(Warning::HeightInferenceDegraded {
            reason,
            default_height: config.default_floor_height,
        });
    }

    check_overlaps(&floors, config.weld_tolerance)?;

    let mut model = AlignedModel {
        floors,
        deferred: Vec::new(),
    };
    for facade in &facades {
        place_elevation_openings(facade, &mut model, config, warnings);
    }

    tracing::info!(
        floors = model.floors.len(),
        elevations = facades.len(),
        bands = bands.is_ok(),
        "Aligned views"
    );
    Ok(model)
}

fn check_roles(sets: &[NormalizedFeatureSet], expected: ImageRole) -> Result<()> {
    match sets.iter().find(|s| s.role() != expected) {
        Some(set) => Err(Error::RoleMismatch {
            image_id: set.image_id().to_string(),
            expected,
            actual: set.role(),
        }),
        None => Ok(()),
    }
}

fn check_overlaps(floors: &[Floor], tolerance: f64) -> Result<()> {
    for pair in floors.windows(2) {
        let (lower, upper) = (&pair[0], &pair[1]);
        if upper.base < lower.top() - tolerance {
            return Err(Error::OverlappingFloors {
                lower: lower.level,
                upper: upper.level,
                lower_top: lower.top(),
                upper_base: upper.base,
            });
        }
    }
    Ok(())
}

/// Heights of the horizontal wall lines of an elevation, clustered
fn band_lines(set: &NormalizedFeatureSet, config: &ReconstructionConfig) -> Vec<f64> {
    let max_angle = config.band_angle_tolerance_deg.to_radians();
    let mut heights: Vec<f64> = Vec::new();

    for feature in &set.features {
        let Feature::Wall { points, .. } = feature else {
            continue;
        };
        for pair in points.windows(2) {
            let (dx, dy) = (pair[1].x - pair[0].x, pair[1].y - pair[0].y);
            if dx == 0.0 && dy == 0.0 {
                continue;
            }
            // Angle to the horizontal, folded into [0, pi/2]
            let angle = dy.abs().atan2(dx.abs());
            if angle <= max_angle {
                heights.push((pair[0].y + pair[1].y) * 0.5);
            }
        }
    }

    heights.retain(|h| h.is_finite());
    heights.sort_by(|a, b| a.total_cmp(b));

    let mut clusters: Vec<Vec<f64>> = Vec::new();
    for h in heights {
        if let Some(cluster) = clusters.last_mut() {
            if h - cluster[cluster.len() - 1] <= config.band_merge_tolerance {
                cluster.push(h);
                continue;
            }
        }
        clusters.push(vec![h]);
    }

    clusters
        .iter()
        .map(|c| c.iter().sum::<f64>() / c.len() as f64)
        .collect()
}

/// Average the bands of every elevation whose band count equals the floor count
fn infer_bands(facades: &[Facade<'_>], floor_count: usize) -> std::result::Result<Vec<Band>, String> {
    if facades.is_empty() {
        return Err("no elevations supplied".to_string());
    }

    let mut sums = vec![Band { base: 0.0, height: 0.0 }; floor_count];
    let mut matched = 0usize;
    for facade in facades {
        if facade.lines.len() != floor_count + 1 {
            tracing::debug!(
                image = %facade.set.image_id(),
                lines = facade.lines.len(),
                floor_count,
                "Elevation band count does not match floors"
            );
            continue;
        }
        let ground = facade.ground();
        for (sum, pair) in sums.iter_mut().zip(facade.lines.windows(2)) {
            sum.base += pair[0] - ground;
            sum.height += pair[1] - pair[0];
        }
        matched += 1;
    }

    if matched == 0 {
        return Err(format!(
            "no elevation shows {} floor band(s)",
            floor_count
        ));
    }

    let n = matched as f64;
    Ok(sums
        .into_iter()
        .map(|b| Band {
            base: b.base / n,
            height: b.height / n,
        })
        .collect())
}

/// Split plan walls into segments and canonicalize room outlines
fn plan_geometry(
    plan: &NormalizedFeatureSet,
    config: &ReconstructionConfig,
    warnings: &mut Vec<Warning>,
) -> (Vec<Wall>, Vec<Room>) {
    let mut walls = Vec::new();
    let mut rooms = Vec::new();
    let degenerate = |feature: FeatureRef, reason: &str| Warning::DegenerateFeature {
        feature,
        reason: reason.to_string(),
    };

    for (index, feature) in plan.features.iter().enumerate() {
        let source = FeatureRef::new(plan.image_id(), index);
        match feature {
            Feature::Wall {
                points, thickness, ..
            } => {
                let thickness = match thickness {
                    Some(t) if t.is_finite() && *t > 0.0 => *t,
                    Some(_) => {
                        warnings.push(degenerate(
                            source.clone(),
                            "non-positive wall thickness replaced by the default",
                        ));
                        config.default_wall_thickness
                    }
                    None => config.default_wall_thickness,
                };
                if points.len() < 2 {
                    warnings.push(degenerate(source, "wall needs at least two points"));
                    continue;
                }

                let polyline = points.len() > 2;
                for (segment, pair) in points.windows(2).enumerate() {
                    let source = if polyline {
                        source.clone().with_segment(segment)
                    } else {
                        source.clone()
                    };
                    if pair[0].distance_to(&pair[1]) <= config.weld_tolerance {
                        warnings.push(degenerate(source, "zero-length wall segment"));
                        continue;
                    }
                    walls.push(Wall {
                        source,
                        start: pair[0],
                        end: pair[1],
                        thickness,
                        outward: Point2D::new(0.0, 1.0),
                        orientation: Orientation::North,
                        exterior: true,
                        openings: Vec::new(),
                        deferred: Vec::new(),
                    });
                }
            }
            Feature::Room {
                id, points, name, ..
            } => {
                let outline: Vec<Point2<f64>> = points.iter().map(|p| p.to_nalgebra()).collect();
                match Profile2D::new(outline).canonical(config.weld_tolerance) {
                    Ok(profile) => rooms.push(Room {
                        source,
                        name: name.clone().or_else(|| id.clone()),
                        outline: profile.outer.iter().map(Point2D::from_nalgebra).collect(),
                    }),
                    Err(e) => warnings.push(degenerate(source, &e.to_string())),
                }
            }
            Feature::Window { .. } | Feature::Door { .. } => {}
        }
    }

    (walls, rooms)
}

/// Distance past a wall face at which the footprint side is sampled, metres
const FACE_CLEARANCE: f64 = 0.05;

/// Classify walls as exterior or partition and point every normal out of the
/// floor footprint. A wall is exterior when exactly one of its faces borders
/// the outside of the wall footprint union. Partitions, and walls the union
/// cannot decide, face away from the wall bounding-box centre.
fn orient_walls(walls: &mut [Wall]) {
    let (mut min, mut max) = (
        Point2D::new(f64::MAX, f64::MAX),
        Point2D::new(f64::MIN, f64::MIN),
    );
    for p in walls.iter().flat_map(|w| [w.start, w.end]) {
        min = Point2D::new(min.x.min(p.x), min.y.min(p.y));
        max = Point2D::new(max.x.max(p.x), max.y.max(p.y));
    }
    let center = Point2D::new((min.x + max.x) * 0.5, (min.y + max.y) * 0.5);

    let footprints: Vec<Vec<Point2<f64>>> = walls.iter().map(Wall::footprint).collect();
    let outlines = union_outer_contours(&footprints).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Wall footprint union failed, orienting by bounding box");
        Vec::new()
    });
    let outside = |p: Point2<f64>| !outlines.iter().any(|c| point_in_contour(&p, c));

    for wall in walls.iter_mut() {
        let length = wall.length();
        let (dx, dy) = (
            (wall.end.x - wall.start.x) / length,
            (wall.end.y - wall.start.y) / length,
        );
        let mid = Point2D::new(
            (wall.start.x + wall.end.x) * 0.5,
            (wall.start.y + wall.end.y) * 0.5,
        );
        let left = Point2D::new(-dy, dx);
        let right = Point2D::new(dy, -dx);
        let away = if (mid.x - center.x) * left.x + (mid.y - center.y) * left.y < 0.0 {
            right
        } else {
            left
        };

        let reach = wall.thickness * 0.5 + FACE_CLEARANCE;
        let beyond = |n: Point2D| outside(Point2::new(mid.x + n.x * reach, mid.y + n.y * reach));
        let (normal, exterior) = match (beyond(left), beyond(right)) {
            (true, false) => (left, true),
            (false, true) => (right, true),
            (false, false) => (away, false),
            (true, true) => (away, true),
        };
        wall.outward = normal;
        wall.exterior = exterior;
        wall.orientation = Orientation::from_normal(normal.x, normal.y);
    }
}

fn opening_kind(feature: &Feature) -> Option<OpeningKind> {
    match feature {
        Feature::Window { .. } => Some(OpeningKind::Window),
        Feature::Door { door_type, .. } => Some(OpeningKind::Door {
            door_type: *door_type,
        }),
        Feature::Wall { .. } | Feature::Room { .. } => None,
    }
}

/// Explicit (width, height, sill) of an opening feature
fn explicit_size(feature: &Feature) -> (Option<f64>, Option<f64>, Option<f64>) {
    match feature {
        Feature::Window {
            width,
            height,
            sill,
            ..
        } => (*width, *height, *sill),
        Feature::Door {
            width,
            height,
            radius,
            ..
        } => (width.or(*radius), *height, None),
        Feature::Wall { .. } | Feature::Room { .. } => (None, None, None),
    }
}

fn default_height(kind: OpeningKind, config: &ReconstructionConfig) -> f64 {
    match kind {
        OpeningKind::Window => config.default_window_height,
        OpeningKind::Door { .. } => config.default_door_height,
    }
}

/// Host plan-drawn windows and doors on the nearest wall of their floor
fn place_plan_openings(
    plan: &NormalizedFeatureSet,
    floor: &mut Floor,
    config: &ReconstructionConfig,
    warnings: &mut Vec<Warning>,
) {
    for (index, feature) in plan.features.iter().enumerate() {
        let Some(kind) = opening_kind(feature) else {
            continue;
        };
        let source_ref = FeatureRef::new(plan.image_id(), index);
        let points = feature.points();
        if points.is_empty() {
            warnings.push(Warning::DegenerateFeature {
                feature: source_ref,
                reason: "opening has no points".to_string(),
            });
            continue;
        }

        let n = points.len() as f64;
        let center = Point2D::new(
            points.iter().map(|p| p.x).sum::<f64>() / n,
            points.iter().map(|p| p.y).sum::<f64>() / n,
        );

        let nearest = floor
            .walls
            .iter()
            .enumerate()
            .map(|(i, w)| (i, w.distance_to(&center)))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        let (explicit_width, explicit_height, explicit_sill) = explicit_size(feature);
        let (sill, height) = match kind {
            OpeningKind::Window => (
                explicit_sill.unwrap_or(config.default_window_sill),
                explicit_height.unwrap_or(config.default_window_height),
            ),
            OpeningKind::Door { .. } => (0.0, explicit_height.unwrap_or(config.default_door_height)),
        };

        let Some((wall_index, distance)) = nearest else {
            let opening = Opening {
                source_ref: source_ref.clone(),
                kind,
                source: OpeningSource::Plan,
                offset: 0.0,
                width: explicit_width.unwrap_or(config.default_opening_width),
                sill,
                height,
            };
            floor.deferred.push(opening);
            warnings.push(Warning::UnmatchedOpening {
                opening: source_ref,
                orientation: None,
                distance: None,
                deferred_to: DeferredTo::Floor { floor: floor.index },
            });
            continue;
        };

        let wall = &mut floor.walls[wall_index];
        let (t_min, t_max) = points
            .iter()
            .map(|p| wall.project(p))
            .fold((f64::MAX, f64::MIN), |(lo, hi), t| (lo.min(t), hi.max(t)));
        let extent = t_max - t_min;
        let width = explicit_width
            .or((extent > config.weld_tolerance).then_some(extent))
            .unwrap_or(config.default_opening_width);
        let offset = (t_min + t_max) * 0.5 - width * 0.5;

        let opening = Opening {
            source_ref: source_ref.clone(),
            kind,
            source: OpeningSource::Plan,
            offset,
            width,
            sill,
            height,
        };

        if distance <= wall.thickness * 0.5 + config.opening_tolerance {
            wall.openings.push(opening);
        } else {
            let wall_ref = wall.source.clone();
            wall.deferred.push(opening);
            warnings.push(Warning::UnmatchedOpening {
                opening: source_ref,
                orientation: None,
                distance: Some(distance),
                deferred_to: DeferredTo::Wall { wall: wall_ref },
            });
        }
    }
}

/// Candidate ranking key: overhang, nearest-endpoint distance, offset, wall index
struct Candidate {
    wall: usize,
    overhang: f64,
    endpoint_distance: f64,
    offset: f64,
    width: f64,
}

impl Candidate {
    fn rank(&self, other: &Self) -> Ordering {
        self.overhang
            .total_cmp(&other.overhang)
            .then(self.endpoint_distance.total_cmp(&other.endpoint_distance))
            .then(self.offset.total_cmp(&other.offset))
            .then(self.wall.cmp(&other.wall))
    }
}

/// Place an elevation's windows and doors on the matching walls
fn place_elevation_openings(
    facade: &Facade<'_>,
    model: &mut AlignedModel,
    config: &ReconstructionConfig,
    warnings: &mut Vec<Warning>,
) {
    let orientation = facade.orientation;
    let ground = facade.ground();
    let tol = config.opening_tolerance;

    for (index, feature) in facade.set.features.iter().enumerate() {
        let Some(kind) = opening_kind(feature) else {
            continue;
        };
        let source_ref = FeatureRef::new(facade.set.image_id(), index);
        let points = feature.points();
        if points.is_empty() {
            warnings.push(Warning::DegenerateFeature {
                feature: source_ref,
                reason: "opening has no points".to_string(),
            });
            continue;
        }

        let (x_min, x_max, z_min, z_max) = points.iter().fold(
            (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
            |(x0, x1, z0, z1), p| (x0.min(p.x), x1.max(p.x), z0.min(p.y), z1.max(p.y)),
        );
        let (explicit_width, explicit_height, explicit_sill) = explicit_size(feature);
        let width = explicit_width
            .or((x_max - x_min > config.weld_tolerance).then_some(x_max - x_min))
            .unwrap_or(config.default_opening_width);
        let height = explicit_height
            .or((z_max - z_min > config.weld_tolerance).then_some(z_max - z_min))
            .unwrap_or_else(|| default_height(kind, config));
        let center_x = (x_min + x_max) * 0.5;
        let (x0, x1) = (center_x - width * 0.5, center_x + width * 0.5);
        // The drawn bottom picks the floor; an explicit sill is measured
        // from that floor's base like a plan window's
        let bottom_z = z_min - ground;

        let mut opening = Opening {
            source_ref: source_ref.clone(),
            kind,
            source: OpeningSource::Elevation(orientation),
            offset: 0.0,
            width,
            sill: explicit_sill.unwrap_or(bottom_z),
            height,
        };

        let Some(floor) = model
            .floors
            .iter_mut()
            .find(|f| bottom_z >= f.base - tol && bottom_z < f.top())
        else {
            model.deferred.push(opening);
            warnings.push(Warning::UnmatchedOpening {
                opening: source_ref,
                orientation: Some(orientation),
                distance: None,
                deferred_to: DeferredTo::Model,
            });
            continue;
        };
        opening.sill = explicit_sill.unwrap_or(bottom_z - floor.base);

        let best = floor
            .walls
            .iter()
            .enumerate()
            .filter(|(_, w)| w.exterior && w.orientation == orientation)
            .filter_map(|(i, w)| {
                let a = orientation.facade_coordinate(&w.start);
                let b = orientation.facade_coordinate(&w.end);
                let (lo, hi) = (a.min(b), a.max(b));
                if hi - lo <= config.weld_tolerance {
                    return None;
                }
                let length = w.length();
                let t0 = (x0 - a) / (b - a) * length;
                let t1 = (x1 - a) / (b - a) * length;
                Some(Candidate {
                    wall: i,
                    overhang: (lo - x0).max(0.0) + (x1 - hi).max(0.0),
                    endpoint_distance: (center_x - lo).abs().min((center_x - hi).abs()),
                    offset: t0.min(t1),
                    width: (t1 - t0).abs(),
                })
            })
            .min_by(|a, b| a.rank(b));

        let Some(best) = best else {
            floor.deferred.push(opening);
            warnings.push(Warning::UnmatchedOpening {
                opening: source_ref,
                orientation: Some(orientation),
                distance: None,
                deferred_to: DeferredTo::Floor { floor: floor.index },
            });
            continue;
        };

        opening.offset = best.offset;
        opening.width = best.width;
        let wall = &mut floor.walls[best.wall];
        if best.overhang <= tol {
            wall.openings.push(opening);
        } else {
            tracing::debug!(
                opening = %source_ref,
                wall = %wall.source,
                overhang = best.overhang,
                "Opening overhangs its closest wall"
            );
            let wall_ref = wall.source.clone();
            wall.deferred.push(opening);
            warnings.push(Warning::UnmatchedOpening {
                opening: source_ref,
                orientation: Some(orientation),
                distance: Some(best.overhang),
                deferred_to: DeferredTo::Wall { wall: wall_ref },
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::normalize;
    use crate::types::{DoorType, ImageFeatureSet};
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point2D {
        Point2D::new(x, y)
    }

    /// 10 x 8 box of walls plus one room, in meters
    fn box_plan(id: &str, level: i32) -> ImageFeatureSet {
        ImageFeatureSet::floor_plan(id, level, 1.0).with_features(vec![
            Feature::wall(vec![p(0.0, 0.0), p(10.0, 0.0)], 0.2),
            Feature::wall(vec![p(10.0, 0.0), p(10.0, 8.0)], 0.2),
            Feature::wall(vec![p(10.0, 8.0), p(0.0, 8.0)], 0.2),
            Feature::wall(vec![p(0.0, 8.0), p(0.0, 0.0)], 0.2),
            Feature::room(vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 8.0), p(0.0, 8.0)]),
        ])
    }

    fn north_elevation(lines: &[f64], openings: Vec<Feature>) -> ImageFeatureSet {
        let mut features: Vec<Feature> = lines
            .iter()
            .map(|&z| Feature::wall(vec![p(0.0, z), p(10.0, z)], 0.1))
            .collect();
        features.extend(openings);
        ImageFeatureSet::elevation("north", Orientation::North, 1.0).with_features(features)
    }

    fn run(
        plans: &[ImageFeatureSet],
        elevations: &[ImageFeatureSet],
    ) -> (Result<AlignedModel>, Vec<Warning>) {
        let plans: Vec<_> = plans.iter().map(|s| normalize(s).unwrap()).collect();
        let elevations: Vec<_> = elevations.iter().map(|s| normalize(s).unwrap()).collect();
        let mut warnings = Vec::new();
        let result = align(&plans, &elevations, &ReconstructionConfig::default(), &mut warnings);
        (result, warnings)
    }

    #[test]
    fn test_single_plan_degrades_to_default_height() {
        let (model, warnings) = run(&[box_plan("ground", 0)], &[]);
        let model = model.unwrap();

        assert_eq!(model.floors.len(), 1);
        assert_eq!(model.floors[0].height_source, HeightSource::Default);
        assert_relative_eq!(model.floors[0].height, 3.0);
        assert_eq!(model.floors[0].walls.len(), 4);
        assert!(matches!(
            warnings.as_slice(),
            [Warning::HeightInferenceDegraded { .. }]
        ));
    }

    #[test]
    fn test_wall_orientation_points_outward() {
        let (model, _) = run(&[box_plan("ground", 0)], &[]);
        let floor = &model.unwrap().floors[0];
        let orientations: Vec<_> = floor.walls.iter().map(|w| w.orientation).collect();

        assert_eq!(
            orientations,
            vec![
                Orientation::South,
                Orientation::East,
                Orientation::North,
                Orientation::West
            ]
        );
        assert_relative_eq!(floor.walls[0].outward.y, -1.0);
    }

    #[test]
    fn test_bands_set_floor_heights() {
        let plans = [box_plan("ground", 0), box_plan("first", 1)];
        let (model, warnings) = run(&plans, &[north_elevation(&[1.0, 4.2, 7.0, 7.3], vec![])]);
        let model = model.unwrap();

        // 7.0 and 7.3 merge into one line at 7.15
        assert_relative_eq!(model.floors[0].base, 0.0);
        assert_relative_eq!(model.floors[0].height, 3.2, epsilon = 1e-9);
        assert_relative_eq!(model.floors[1].base, 3.2, epsilon = 1e-9);
        assert_relative_eq!(model.floors[1].height, 2.95, epsilon = 1e-9);
        assert!(model
            .floors
            .iter()
            .all(|f| f.height_source == HeightSource::Bands));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_declared_height_overrides_default() {
        let mut plan = box_plan("ground", 0);
        plan.declared_height = Some(4.5);
        let (model, warnings) = run(&[plan], &[]);

        let floor = &model.unwrap().floors[0];
        assert_eq!(floor.height_source, HeightSource::Declared);
        assert_relative_eq!(floor.height, 4.5);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_duplicate_and_missing_levels() {
        let (result, _) = run(&[box_plan("a", 0), box_plan("b", 0)], &[]);
        assert!(matches!(
            result,
            Err(Error::DuplicateFloorLevel { level: 0, .. })
        ));

        let mut plan = box_plan("a", 0);
        plan.floor_level = None;
        let (result, _) = run(&[plan], &[]);
        assert_eq!(result, Err(Error::MissingFloorLevel("a".to_string())));
    }

    #[test]
    fn test_role_mismatch_and_empty_input() {
        let (result, _) = run(&[north_elevation(&[], vec![])], &[]);
        assert!(matches!(result, Err(Error::RoleMismatch { .. })));

        let (result, _) = run(&[], &[]);
        assert_eq!(result, Err(Error::EmptyInput));
    }

    #[test]
    fn test_overlapping_floors_rejected() {
        let mut upper = box_plan("first", 1);
        upper.declared_elevation = Some(2.0);
        let (result, _) = run(&[box_plan("ground", 0), upper], &[]);

        assert!(matches!(
            result,
            Err(Error::OverlappingFloors {
                lower: 0,
                upper: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_elevation_window_placed_on_north_wall() {
        let window = Feature::window(vec![p(3.0, 1.9), p(4.5, 3.1)]);
        let (model, warnings) = run(
            &[box_plan("ground", 0)],
            &[north_elevation(&[1.0, 4.0], vec![window])],
        );
        let model = model.unwrap();
        let north = &model.floors[0].walls[2];

        assert!(warnings.is_empty(), "{:?}", warnings);
        assert_eq!(north.openings.len(), 1);
        let opening = &north.openings[0];
        // North wall runs from x=10 to x=0
        assert_relative_eq!(opening.offset, 5.5, epsilon = 1e-9);
        assert_relative_eq!(opening.width, 1.5, epsilon = 1e-9);
        assert_relative_eq!(opening.sill, 0.9, epsilon = 1e-9);
        assert_relative_eq!(opening.height, 1.2, epsilon = 1e-9);
    }

    #[test]
    fn test_elevation_window_skips_partition() {
        let mut plan = box_plan("ground", 0);
        plan.features
            .insert(0, Feature::wall(vec![p(5.0, 0.0), p(5.0, 8.0)], 0.2));
        let west = ImageFeatureSet::elevation("west", Orientation::West, 1.0).with_features(vec![
            Feature::wall(vec![p(0.0, 1.0), p(8.0, 1.0)], 0.1),
            Feature::wall(vec![p(0.0, 4.0), p(8.0, 4.0)], 0.1),
            Feature::window(vec![p(3.0, 1.9), p(4.5, 3.1)]),
        ]);
        let (model, warnings) = run(&[plan], &[west]);
        let floor = &model.unwrap().floors[0];

        assert!(warnings.is_empty(), "{:?}", warnings);
        let partition = &floor.walls[0];
        assert!(!partition.exterior);
        assert!(partition.openings.is_empty());

        let west_wall = &floor.walls[4];
        assert!(west_wall.exterior);
        assert_eq!(west_wall.orientation, Orientation::West);
        assert_relative_eq!(west_wall.outward.x, -1.0);
        assert_eq!(west_wall.openings.len(), 1);
        assert_relative_eq!(west_wall.openings[0].width, 1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_explicit_elevation_sill_is_above_floor_base() {
        let window = Feature::Window {
            id: None,
            points: vec![p(3.0, 5.0), p(4.5, 6.2)],
            width: None,
            height: None,
            sill: Some(0.9),
        };
        let plans = [box_plan("ground", 0), box_plan("first", 1)];
        let (model, warnings) = run(&plans, &[north_elevation(&[1.0, 4.0, 7.0], vec![window])]);
        let model = model.unwrap();

        assert!(warnings.is_empty(), "{:?}", warnings);
        assert!(model.floors[0].walls[2].openings.is_empty());
        let upper = &model.floors[1].walls[2].openings;
        assert_eq!(upper.len(), 1);
        assert_relative_eq!(upper[0].sill, 0.9, epsilon = 1e-9);
        assert_relative_eq!(upper[0].height, 1.2, epsilon = 1e-9);
    }

    #[test]
    fn test_overhanging_window_is_deferred() {
        let window = Feature::window(vec![p(9.0, 1.9), p(10.5, 3.1)]);
        let (model, warnings) = run(
            &[box_plan("ground", 0)],
            &[north_elevation(&[1.0, 4.0], vec![window])],
        );
        let model = model.unwrap();
        let north = &model.floors[0].walls[2];

        assert!(north.openings.is_empty());
        assert_eq!(north.deferred.len(), 1);
        match &warnings[..] {
            [Warning::UnmatchedOpening {
                distance: Some(d),
                deferred_to: DeferredTo::Wall { wall },
                ..
            }] => {
                assert_relative_eq!(*d, 0.5, epsilon = 1e-9);
                assert_eq!(wall, &north.source);
            }
            other => panic!("unexpected warnings {:?}", other),
        }
    }

    #[test]
    fn test_plan_door_hosted_on_nearest_wall() {
        let mut plan = box_plan("ground", 0);
        plan.features.push(Feature::door(
            vec![p(2.0, 0.05), p(2.9, 0.05)],
            DoorType::Standard,
        ));
        let (model, _) = run(&[plan], &[]);
        let south = &model.unwrap().floors[0].walls[0];

        assert_eq!(south.openings.len(), 1);
        assert_relative_eq!(south.openings[0].offset, 2.0, epsilon = 1e-9);
        assert_relative_eq!(south.openings[0].width, 0.9, epsilon = 1e-9);
        assert_relative_eq!(south.openings[0].sill, 0.0);
        assert_relative_eq!(south.openings[0].height, 2.1);
    }

    #[test]
    fn test_degenerate_wall_reported() {
        let mut plan = box_plan("ground", 0);
        plan.features
            .push(Feature::wall(vec![p(1.0, 1.0), p(1.0, 1.0)], 0.2));
        let (model, warnings) = run(&[plan], &[]);

        assert_eq!(model.unwrap().floors[0].walls.len(), 4);
        assert!(warnings
            .iter()
            .any(|w| matches!(w, Warning::DegenerateFeature { feature, .. } if feature.index == 5)));
    }
}
