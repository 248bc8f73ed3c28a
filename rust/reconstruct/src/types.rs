// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for per-image features and the aligned building model

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D point (simplified for serialization)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_nalgebra(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn from_nalgebra(p: &Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn scaled(&self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s)
    }
}

/// A 3D point (Z up)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Door operation type
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DoorType {
    #[default]
    Standard,
    Swing,
    Sliding,
}

/// An extracted architectural feature in image (or, once scaled, real) units
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Feature {
    Wall {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Centerline polyline; the first point is the wall origin
        points: Vec<Point2D>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thickness: Option<f64>,
    },
    Window {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        points: Vec<Point2D>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sill: Option<f64>,
    },
    Door {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        points: Vec<Point2D>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
        #[serde(default)]
        door_type: DoorType,
        /// Swing arc radius, used as the width when no width is given
        #[serde(default, skip_serializing_if = "Option::is_none")]
        radius: Option<f64>,
    },
    Room {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        points: Vec<Point2D>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        area: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        centroid: Option<Point2D>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl Feature {
    pub fn wall(points: Vec<Point2D>, thickness: f64) -> Self {
        Feature::Wall {
            id: None,
            points,
            thickness: Some(thickness),
        }
    }

    pub fn window(points: Vec<Point2D>) -> Self {
        Feature::Window {
            id: None,
            points,
            width: None,
            height: None,
            sill: None,
        }
    }

    pub fn door(points: Vec<Point2D>, door_type: DoorType) -> Self {
        Feature::Door {
            id: None,
            points,
            width: None,
            height: None,
            door_type,
            radius: None,
        }
    }

    pub fn room(points: Vec<Point2D>) -> Self {
        Feature::Room {
            id: None,
            points,
            area: None,
            centroid: None,
            name: None,
        }
    }

    pub fn points(&self) -> &[Point2D] {
        match self {
            Feature::Wall { points, .. }
            | Feature::Window { points, .. }
            | Feature::Door { points, .. }
            | Feature::Room { points, .. } => points,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Feature::Wall { id, .. }
            | Feature::Window { id, .. }
            | Feature::Door { id, .. }
            | Feature::Room { id, .. } => id.as_deref(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Feature::Wall { .. } => "wall",
            Feature::Window { .. } => "window",
            Feature::Door { .. } => "door",
            Feature::Room { .. } => "room",
        }
    }

    /// Multiply every length by `s` and every area by `s²`
    pub fn scaled(&self, s: f64) -> Self {
        let pts = |points: &[Point2D]| points.iter().map(|p| p.scaled(s)).collect::<Vec<_>>();
        let len = |v: &Option<f64>| v.map(|v| v * s);

        match self {
            Feature::Wall {
                id,
                points,
                thickness,
            } => Feature::Wall {
                id: id.clone(),
                points: pts(points),
                thickness: len(thickness),
            },
            Feature::Window {
                id,
                points,
                width,
                height,
                sill,
            } => Feature::Window {
                id: id.clone(),
                points: pts(points),
                width: len(width),
                height: len(height),
                sill: len(sill),
            },
            Feature::Door {
                id,
                points,
                width,
                height,
                door_type,
                radius,
            } => Feature::Door {
                id: id.clone(),
                points: pts(points),
                width: len(width),
                height: len(height),
                door_type: *door_type,
                radius: len(radius),
            },
            Feature::Room {
                id,
                points,
                area,
                centroid,
                name,
            } => Feature::Room {
                id: id.clone(),
                points: pts(points),
                area: area.map(|a| a * s * s),
                centroid: centroid.map(|c| c.scaled(s)),
                name: name.clone(),
            },
        }
    }
}

/// What an image depicts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ImageRole {
    FloorPlan,
    Elevation,
}

/// Cardinal façade direction; declaration order is the processing order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    North,
    East,
    South,
    West,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::North,
        Orientation::East,
        Orientation::South,
        Orientation::West,
    ];

    /// Classify a horizontal outward normal by its dominant axis (+Y north, +X east)
    pub fn from_normal(nx: f64, ny: f64) -> Self {
        if ny.abs() >= nx.abs() {
            if ny >= 0.0 {
                Orientation::North
            } else {
                Orientation::South
            }
        } else if nx > 0.0 {
            Orientation::East
        } else {
            Orientation::West
        }
    }

    /// Plan coordinate that runs along this façade
    pub fn facade_coordinate(&self, p: &Point2D) -> f64 {
        match self {
            Orientation::North | Orientation::South => p.x,
            Orientation::East | Orientation::West => p.y,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::North => "north",
            Orientation::East => "east",
            Orientation::South => "south",
            Orientation::West => "west",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of the real-world lengths an image is calibrated in
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Meters,
    Feet,
    Inches,
    Centimeters,
}

impl LengthUnit {
    pub fn to_meters(&self) -> f64 {
        match self {
            LengthUnit::Meters => 1.0,
            LengthUnit::Feet => 0.3048,
            LengthUnit::Inches => 0.0254,
            LengthUnit::Centimeters => 0.01,
        }
    }
}

/// Two pixel points a known real distance apart
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Calibration {
    pub p1: Point2D,
    pub p2: Point2D,
    pub real_length: f64,
}

/// Features extracted from one image, with their scale metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageFeatureSet {
    pub image_id: String,
    pub role: ImageRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    /// Real units per pixel
    #[serde(default)]
    pub scale_factor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration: Option<Calibration>,
    #[serde(default)]
    pub unit: LengthUnit,
    /// Floor base elevation override (plans only, meters)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_elevation: Option<f64>,
    /// Floor height override (plans only, meters)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_height: Option<f64>,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl ImageFeatureSet {
    pub fn floor_plan(image_id: impl Into<String>, level: i32, scale_factor: f64) -> Self {
        Self {
            image_id: image_id.into(),
            role: ImageRole::FloorPlan,
            floor_level: Some(level),
            orientation: None,
            scale_factor,
            calibration: None,
            unit: LengthUnit::Meters,
            declared_elevation: None,
            declared_height: None,
            features: Vec::new(),
        }
    }

    pub fn elevation(
        image_id: impl Into<String>,
        orientation: Orientation,
        scale_factor: f64,
    ) -> Self {
        Self {
            role: ImageRole::Elevation,
            floor_level: None,
            orientation: Some(orientation),
            ..Self::floor_plan(image_id, 0, scale_factor)
        }
    }

    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features = features;
        self
    }
}

/// Stable identity of a feature (or one segment of a wall polyline)
#[derive(Debug, Clone, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureRef {
    pub image_id: String,
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<usize>,
}

impl FeatureRef {
    pub fn new(image_id: impl Into<String>, index: usize) -> Self {
        Self {
            image_id: image_id.into(),
            index,
            segment: None,
        }
    }

    pub fn with_segment(mut self, segment: usize) -> Self {
        self.segment = Some(segment);
        self
    }

    /// Deterministic identifier `<kind>-f<floor>-<image>-<index>[-<segment>]`.
    ///
    /// Characters outside `[A-Za-z0-9_.-]` become `_`, so the result is a
    /// valid XML NCName whenever `kind` starts with a letter.
    pub fn element_id(&self, kind: &str, floor: usize) -> String {
        let mut id = format!("{}-f{}-{}-{}", kind, floor, self.image_id, self.index);
        if let Some(segment) = self.segment {
            id.push_str(&format!("-{}", segment));
        }
        id.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for FeatureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.image_id, self.index)?;
        if let Some(segment) = self.segment {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

/// A feature set converted to meters
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFeatureSet {
    /// Effective meters per pixel
    pub meters_per_pixel: f64,
    pub features: Vec<Feature>,
    /// Untouched pixel-space input
    pub raw: ImageFeatureSet,
}

impl NormalizedFeatureSet {
    pub fn image_id(&self) -> &str {
        &self.raw.image_id
    }

    pub fn role(&self) -> ImageRole {
        self.raw.role
    }
}

/// Where a floor's height came from
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum HeightSource {
    /// Horizontal band lines of the elevations
    Bands,
    /// Override on the floor plan
    Declared,
    /// Configured default height
    Default,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OpeningKind {
    Window,
    Door { door_type: DoorType },
}

/// View an opening was placed from
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OpeningSource {
    Plan,
    Elevation(Orientation),
}

/// A window or door in wall-relative coordinates
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Opening {
    pub source_ref: FeatureRef,
    pub kind: OpeningKind,
    pub source: OpeningSource,
    /// Distance along the wall from its origin endpoint
    pub offset: f64,
    pub width: f64,
    /// Height of the opening bottom above the floor base
    pub sill: f64,
    pub height: f64,
}

impl Opening {
    /// True when the opening lies inside a wall face of `length` x `height`
    pub fn fits(&self, length: f64, height: f64, eps: f64) -> bool {
        self.offset >= -eps
            && self.offset + self.width <= length + eps
            && self.sill >= -eps
            && self.sill + self.height <= height + eps
    }
}

/// One straight segment of a plan wall
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Wall {
    pub source: FeatureRef,
    /// Origin endpoint; opening offsets are measured from here
    pub start: Point2D,
    pub end: Point2D,
    pub thickness: f64,
    /// Unit horizontal normal pointing away from the floor footprint
    pub outward: Point2D,
    pub orientation: Orientation,
    /// Whether one face of the wall lies on the outer floor outline.
    /// Only exterior walls receive elevation openings.
    pub exterior: bool,
    pub openings: Vec<Opening>,
    /// Openings that could not be placed on this wall
    pub deferred: Vec<Opening>,
}

impl Wall {
    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    /// Parameter of the orthogonal projection of `p` onto the wall, in length units
    pub fn project(&self, p: &Point2D) -> f64 {
        let length = self.length();
        if length <= 0.0 {
            return 0.0;
        }
        ((p.x - self.start.x) * (self.end.x - self.start.x)
            + (p.y - self.start.y) * (self.end.y - self.start.y))
            / length
    }

    /// Distance from `p` to the wall centerline segment
    pub fn distance_to(&self, p: &Point2D) -> f64 {
        let length = self.length();
        if length <= 0.0 {
            return self.start.distance_to(p);
        }
        let t = (self.project(p) / length).clamp(0.0, 1.0);
        let foot = Point2D::new(
            self.start.x + (self.end.x - self.start.x) * t,
            self.start.y + (self.end.y - self.start.y) * t,
        );
        foot.distance_to(p)
    }

    /// Footprint rectangle, extended by half the thickness at both ends
    pub fn footprint(&self) -> Vec<Point2<f64>> {
        let start = self.start.to_nalgebra();
        let end = self.end.to_nalgebra();
        let dir = (end - start) / self.length();
        let half = self.thickness * 0.5;
        let normal = nalgebra::Vector2::new(-dir.y, dir.x) * half;
        let (s, e) = (start - dir * half, end + dir * half);
        vec![s - normal, e - normal, e + normal, s + normal]
    }
}

/// A room outline, canonical counter-clockwise
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Room {
    pub source: FeatureRef,
    pub name: Option<String>,
    pub outline: Vec<Point2D>,
}

impl Room {
    pub fn area(&self) -> f64 {
        let n = self.outline.len();
        let mut twice = 0.0;
        for i in 0..n {
            let (a, b) = (&self.outline[i], &self.outline[(i + 1) % n]);
            twice += a.x * b.y - b.x * a.y;
        }
        twice * 0.5
    }
}

/// One storey of the aligned model
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Floor {
    /// Position in the ordered floor list
    pub index: usize,
    /// Declared level of the source plan
    pub level: i32,
    pub image_id: String,
    pub base: f64,
    pub height: f64,
    pub height_source: HeightSource,
    pub walls: Vec<Wall>,
    pub rooms: Vec<Room>,
    /// Openings with no wall to defer to
    pub deferred: Vec<Opening>,
}

impl Floor {
    pub fn top(&self) -> f64 {
        self.base + self.height
    }
}

/// Floors aligned across views, before any geometry is built
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AlignedModel {
    pub floors: Vec<Floor>,
    /// Openings that matched no floor
    pub deferred: Vec<Opening>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_feature_json_contract() {
        let json = r#"{
            "image_id": "ground",
            "role": "floorPlan",
            "floor_level": 0,
            "scale_factor": 0.01,
            "features": [
                { "kind": "wall", "points": [{"x": 0, "y": 0}, {"x": 100, "y": 0}], "thickness": 20 },
                { "kind": "door", "points": [{"x": 10, "y": 0}], "door_type": "swing", "radius": 90 },
                { "kind": "room", "points": [{"x": 0, "y": 0}, {"x": 1, "y": 0}, {"x": 1, "y": 1}] }
            ]
        }"#;

        let set: ImageFeatureSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.role, ImageRole::FloorPlan);
        assert_eq!(set.unit, LengthUnit::Meters);
        assert_eq!(set.features.len(), 3);
        assert!(matches!(
            set.features[1],
            Feature::Door {
                door_type: DoorType::Swing,
                radius: Some(r),
                ..
            } if r == 90.0
        ));
    }

    #[test]
    fn test_scaled_room_area_uses_square() {
        let room = Feature::Room {
            id: None,
            points: vec![Point2D::new(10.0, 0.0)],
            area: Some(100.0),
            centroid: Some(Point2D::new(5.0, 5.0)),
            name: None,
        };

        match room.scaled(0.1) {
            Feature::Room {
                points,
                area,
                centroid,
                ..
            } => {
                assert_relative_eq!(points[0].x, 1.0);
                assert_relative_eq!(area.unwrap(), 1.0);
                assert_relative_eq!(centroid.unwrap().y, 0.5);
            }
            other => panic!("unexpected feature {:?}", other),
        }
    }

    #[test]
    fn test_orientation_from_normal() {
        assert_eq!(Orientation::from_normal(0.0, 1.0), Orientation::North);
        assert_eq!(Orientation::from_normal(1.0, 0.2), Orientation::East);
        assert_eq!(Orientation::from_normal(0.1, -1.0), Orientation::South);
        assert_eq!(Orientation::from_normal(-1.0, 0.0), Orientation::West);
    }

    #[test]
    fn test_wall_projection_and_distance() {
        let wall = Wall {
            source: FeatureRef::new("p", 0),
            start: Point2D::new(10.0, 0.0),
            end: Point2D::new(0.0, 0.0),
            thickness: 0.2,
            outward: Point2D::new(0.0, -1.0),
            orientation: Orientation::South,
            exterior: true,
            openings: Vec::new(),
            deferred: Vec::new(),
        };

        assert_relative_eq!(wall.project(&Point2D::new(7.0, 3.0)), 3.0);
        assert_relative_eq!(wall.distance_to(&Point2D::new(12.0, 0.0)), 2.0);
        let footprint = wall.footprint();
        assert_eq!(footprint.len(), 4);
        assert_relative_eq!(footprint[0], Point2::new(10.1, 0.1), epsilon = 1e-12);
        assert_relative_eq!(footprint[2], Point2::new(-0.1, -0.1), epsilon = 1e-12);
        assert_eq!(FeatureRef::new("p", 4).with_segment(1).to_string(), "p#4.1");
        assert_eq!(
            FeatureRef::new("ground floor/a", 2)
                .with_segment(0)
                .element_id("wall", 1),
            "wall-f1-ground_floor_a-2-0"
        );
    }
}
