// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid model construction
//!
//! Floors are extruded independently (walls become slabs with their
//! openings cut, rooms become prisms), then merged into one mesh at a single
//! point where stacked rooms are fused and the manifold check runs.

use crate::config::ReconstructionConfig;
use crate::error::{Error, Result};
use crate::types::{AlignedModel, FeatureRef, Floor, Opening, Point2D, Wall};
use crate::warning::Warning;
use gbxml_lite_geometry::{
    extrude_prism, extrude_slab, rings_coincide, union_outer_contours, Mesh, Point2, Prism,
    Profile2D, SlabFrame, VertexGrid, VoidRect,
};
use rayon::prelude::*;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellKind {
    Wall,
    Room,
    Roof,
}

impl ShellKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShellKind::Wall => "wall",
            ShellKind::Room => "room",
            ShellKind::Roof => "roof",
        }
    }
}

/// A contiguous run of model triangles belonging to one solid
#[derive(Debug, Clone, PartialEq)]
pub struct Shell {
    pub kind: ShellKind,
    pub floor: Option<usize>,
    pub source: Option<FeatureRef>,
    pub triangles: Range<usize>,
    /// Enclosed volume of the shell as extruded, before stacked rooms are fused
    pub volume: f64,
}

impl Shell {
    pub fn name(&self) -> String {
        match (&self.source, self.floor) {
            (Some(source), Some(floor)) => source.element_id(self.kind.as_str(), floor),
            _ => self.kind.as_str().to_string(),
        }
    }
}

/// Flat roof slab over the topmost floor
#[derive(Debug, Clone, PartialEq)]
pub struct Roof {
    /// Counter-clockwise outline
    pub outline: Vec<Point2D>,
    pub base: f64,
    pub top: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoomKey {
    pub floor: usize,
    pub room: usize,
}

/// Two rooms on adjacent floors whose ceiling and floor caps coincide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackedRooms {
    pub lower: RoomKey,
    pub upper: RoomKey,
}

/// The reconstructed building
#[derive(Debug, Clone, PartialEq)]
pub struct SolidModel {
    /// Floors with openings clamped to their walls
    pub floors: Vec<Floor>,
    /// Openings that matched no floor
    pub deferred: Vec<Opening>,
    pub roof: Option<Roof>,
    pub mesh: Mesh,
    pub shells: Vec<Shell>,
    pub stacked_rooms: Vec<StackedRooms>,
}

impl SolidModel {
    /// Room fused onto the ceiling of `key`, if any
    pub fn room_above(&self, key: RoomKey) -> Option<RoomKey> {
        self.stacked_rooms
            .iter()
            .find(|s| s.lower == key)
            .map(|s| s.upper)
    }

    pub fn is_stacked_above(&self, key: RoomKey) -> bool {
        self.stacked_rooms.iter().any(|s| s.upper == key)
    }
}

/// Per-floor extrusion output
struct FloorShells {
    floor: Floor,
    walls: Vec<(FeatureRef, Mesh)>,
    rooms: Vec<(FeatureRef, Prism, f64)>,
    warnings: Vec<Warning>,
}

/// Room prism bookkeeping in model (post-append) indices
struct RoomSlot {
    key: RoomKey,
    outline: Vec<Point2<f64>>,
    bottom_ring: Vec<u32>,
    top_ring: Vec<u32>,
    bottom_cap: Range<usize>,
    top_cap: Range<usize>,
}

/// Mesh under assembly with the owning shell of every triangle
#[derive(Default)]
struct Assembly {
    mesh: Mesh,
    owners: Vec<usize>,
    shells: Vec<Shell>,
}

impl Assembly {
    /// Append a shell; returns its vertex and triangle offsets
    fn push(
        &mut self,
        part: &Mesh,
        kind: ShellKind,
        floor: Option<usize>,
        source: Option<FeatureRef>,
        volume: f64,
    ) -> (u32, usize) {
        let shell = self.shells.len();
        let triangle_offset = self.mesh.triangle_count();
        let vertex_offset = self.mesh.merge(part);
        self.owners
            .extend(std::iter::repeat(shell).take(part.triangle_count()));
        self.shells.push(Shell {
            kind,
            floor,
            source,
            triangles: triangle_offset..self.mesh.triangle_count(),
            volume,
        });
        (vertex_offset, triangle_offset)
    }
}

/// Build the solid model for an aligned set of floors.
pub fn build_solid(
    model: AlignedModel,
    config: &ReconstructionConfig,
    warnings: &mut Vec<Warning>,
) -> Result<SolidModel> {
    let AlignedModel { floors, deferred } = model;

    let built: Vec<FloorShells> = floors
        .into_par_iter()
        .map(|floor| build_floor(floor, config))
        .collect::<Result<Vec<_>>>()?;

    let mut assembly = Assembly::default();
    let mut slots = Vec::new();
    let mut floors = Vec::with_capacity(built.len());

    for shells in built {
        let FloorShells {
            floor,
            walls,
            rooms,
            warnings: floor_warnings,
        } = shells;
        warnings.extend(floor_warnings);

        for (source, mesh) in walls {
            let volume = mesh.signed_volume();
            assembly.push(&mesh, ShellKind::Wall, Some(floor.index), Some(source), volume);
        }

        for (room, (source, prism, volume)) in rooms.into_iter().enumerate() {
            let (v, t) = assembly.push(
                &prism.mesh,
                ShellKind::Room,
                Some(floor.index),
                Some(source),
                volume,
            );
            slots.push(RoomSlot {
                key: RoomKey {
                    floor: floor.index,
                    room,
                },
                outline: floor.rooms[room]
                    .outline
                    .iter()
                    .map(|p| p.to_nalgebra())
                    .collect(),
                bottom_ring: prism.bottom_ring.iter().map(|i| i + v).collect(),
                top_ring: prism.top_ring.iter().map(|i| i + v).collect(),
                bottom_cap: prism.bottom_cap.start + t..prism.bottom_cap.end + t,
                top_cap: prism.top_cap.start + t..prism.top_cap.end + t,
            });
        }

        floors.push(floor);
    }

    let roof = match floors.last() {
        Some(top) => build_roof(top, config, warnings)?,
        None => None,
    };
    if let Some((roof, prism)) = &roof {
        let volume = prism.mesh.signed_volume();
        assembly.push(&prism.mesh, ShellKind::Roof, None, None, volume);
        tracing::debug!(vertices = roof.outline.len(), base = roof.base, "Synthesized roof");
    }

    let stacked_rooms = fuse_stacked_rooms(&mut assembly, &slots, config.weld_tolerance);
    let Assembly {
        mesh,
        owners,
        mut shells,
    } = assembly;

    if let Err(err) = mesh.check_closed() {
        return Err(match err {
            gbxml_lite_geometry::Error::OpenMesh(edges) => Error::NonManifoldMesh { edges },
            other => other.into(),
        });
    }

    let mut cursor = 0;
    for (index, shell) in shells.iter_mut().enumerate() {
        let count = owners.iter().filter(|&&o| o == index).count();
        shell.triangles = cursor..cursor + count;
        cursor += count;
    }

    tracing::info!(
        floors = floors.len(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        shells = shells.len(),
        stacked = stacked_rooms.len(),
        "Built solid model"
    );

    Ok(SolidModel {
        floors,
        deferred,
        roof: roof.map(|(roof, _)| roof),
        mesh,
        shells,
        stacked_rooms,
    })
}

fn build_floor(mut floor: Floor, config: &ReconstructionConfig) -> Result<FloorShells> {
    let mut warnings = Vec::new();
    let mut walls = Vec::with_capacity(floor.walls.len());

    for wall in &mut floor.walls {
        clamp_openings(wall, floor.height, config, &mut warnings);
        let (frame, length) =
            SlabFrame::from_segment(wall.start.to_nalgebra(), wall.end.to_nalgebra(), floor.base)?;
        let voids: Vec<VoidRect> = wall
            .openings
            .iter()
            .map(|o| VoidRect {
                offset: o.offset,
                width: o.width,
                sill: o.sill,
                height: o.height,
            })
            .collect();
        let mesh = extrude_slab(
            &frame,
            length,
            wall.thickness,
            floor.height,
            &voids,
            config.weld_tolerance,
        )?;
        walls.push((wall.source.clone(), mesh));
    }

    let mut rooms = Vec::with_capacity(floor.rooms.len());
    for room in &floor.rooms {
        let profile = Profile2D::new(room.outline.iter().map(|p| p.to_nalgebra()).collect());
        let prism = extrude_prism(&profile, floor.base, floor.top())?;
        let volume = prism.mesh.signed_volume();
        if !volume.is_finite() || volume < 0.0 {
            return Err(Error::InvalidShellVolume {
                room: room.source.clone(),
                volume,
            });
        }
        rooms.push((room.source.clone(), prism, volume));
    }

    tracing::debug!(
        floor = floor.index,
        walls = walls.len(),
        rooms = rooms.len(),
        "Extruded floor"
    );

    Ok(FloorShells {
        floor,
        walls,
        rooms,
        warnings,
    })
}

/// Fit every opening inside its wall face; unusable openings are deferred
fn clamp_openings(
    wall: &mut Wall,
    height: f64,
    config: &ReconstructionConfig,
    warnings: &mut Vec<Warning>,
) {
    let length = wall.length();
    let tol = config.weld_tolerance;
    let mut kept = Vec::with_capacity(wall.openings.len());

    for mut opening in std::mem::take(&mut wall.openings) {
        let finite = [opening.offset, opening.width, opening.sill, opening.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || opening.width <= tol || opening.height <= tol {
            warnings.push(Warning::DegenerateFeature {
                feature: opening.source_ref.clone(),
                reason: "opening has no usable width or height".to_string(),
            });
            wall.deferred.push(opening);
            continue;
        }

        let before = (opening.offset, opening.width, opening.sill, opening.height);
        opening.width = opening.width.min(length);
        opening.offset = opening.offset.clamp(0.0, length - opening.width);
        opening.height = opening.height.min(height);
        opening.sill = opening.sill.clamp(0.0, height - opening.height);

        let after = (opening.offset, opening.width, opening.sill, opening.height);
        let moved = (before.0 - after.0).abs()
            + (before.1 - after.1).abs()
            + (before.2 - after.2).abs()
            + (before.3 - after.3).abs();
        if moved > 1e-9 {
            warnings.push(Warning::OpeningClamped {
                opening: opening.source_ref.clone(),
                wall: wall.source.clone(),
            });
        }
        kept.push(opening);
    }

    wall.openings = kept;
}

fn build_roof(
    top: &Floor,
    config: &ReconstructionConfig,
    warnings: &mut Vec<Warning>,
) -> Result<Option<(Roof, Prism)>> {
    let footprints: Vec<Vec<Point2<f64>>> = top.walls.iter().map(Wall::footprint).collect();
    let mut outlines = union_outer_contours(&footprints)?;
    if outlines.is_empty() {
        let rooms: Vec<Vec<Point2<f64>>> = top
            .rooms
            .iter()
            .map(|r| r.outline.iter().map(|p| p.to_nalgebra()).collect())
            .collect();
        outlines = union_outer_contours(&rooms)?;
    }

    let Some(outline) = outlines.into_iter().next() else {
        tracing::warn!(floor = top.index, "No roof outline");
        warnings.push(Warning::RoofOutlineMissing { floor: top.index });
        return Ok(None);
    };

    let profile = Profile2D::new(outline).canonical(config.weld_tolerance)?;
    let base = top.top();
    let roof_top = base + config.parapet_height;
    let prism = extrude_prism(&profile, base, roof_top)?;

    Ok(Some((
        Roof {
            outline: profile.outer.iter().map(Point2D::from_nalgebra).collect(),
            base,
            top: roof_top,
        },
        prism,
    )))
}

/// Fuse room prisms on adjacent floors whose rings coincide: the upper
/// floor-cap ring is welded onto the lower ceiling ring and both caps are
/// removed. Unreferenced vertices are compacted away afterwards.
fn fuse_stacked_rooms(
    assembly: &mut Assembly,
    slots: &[RoomSlot],
    tolerance: f64,
) -> Vec<StackedRooms> {
    let vertices = &assembly.mesh.vertices;
    let mut removed = vec![false; assembly.mesh.triangle_count()];
    let mut remap: Vec<u32> = (0..vertices.len() as u32).collect();
    let mut stacked = Vec::new();

    let top_floor = slots.iter().map(|s| s.key.floor).max().unwrap_or(0);
    for floor in 1..=top_floor {
        let lower: Vec<&RoomSlot> = slots.iter().filter(|s| s.key.floor == floor - 1).collect();
        if lower.is_empty() {
            continue;
        }

        let grids: Vec<VertexGrid> = lower
            .iter()
            .map(|s| VertexGrid::from_indices(vertices, s.top_ring.iter().copied(), tolerance))
            .collect();
        let mut used = vec![false; lower.len()];

        for upper in slots.iter().filter(|s| s.key.floor == floor) {
            let candidate = (0..lower.len()).find_map(|li| {
                if used[li]
                    || lower[li].top_ring.len() != upper.bottom_ring.len()
                    || !rings_coincide(&lower[li].outline, &upper.outline, tolerance)
                {
                    return None;
                }
                let matched: Vec<u32> = upper
                    .bottom_ring
                    .iter()
                    .map(|&v| grids[li].find_near(vertices, &vertices[v as usize], tolerance))
                    .collect::<Option<_>>()?;
                let mut distinct = matched.clone();
                distinct.sort_unstable();
                distinct.dedup();
                (distinct.len() == matched.len()).then_some((li, matched))
            });
            let Some((li, matched)) = candidate else {
                continue;
            };

            used[li] = true;
            for (&from, &to) in upper.bottom_ring.iter().zip(&matched) {
                remap[from as usize] = to;
            }
            for t in lower[li].top_cap.clone().chain(upper.bottom_cap.clone()) {
                removed[t] = true;
            }
            stacked.push(StackedRooms {
                lower: lower[li].key,
                upper: upper.key,
            });
        }
    }

    if stacked.is_empty() {
        return stacked;
    }

    let mut index = 0;
    assembly.owners.retain(|_| {
        let keep = !removed[index];
        index += 1;
        keep
    });
    assembly.mesh.retain_triangles(|t, _| !removed[t]);
    for i in assembly.mesh.indices.iter_mut() {
        *i = remap[*i as usize];
    }
    let dropped = assembly.mesh.compact();
    tracing::debug!(pairs = stacked.len(), dropped, "Fused stacked rooms");

    stacked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HeightSource, OpeningKind, OpeningSource, Orientation, Room};
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point2D {
        Point2D::new(x, y)
    }

    fn wall(index: usize, start: Point2D, end: Point2D, orientation: Orientation) -> Wall {
        Wall {
            source: FeatureRef::new("plan", index),
            start,
            end,
            thickness: 0.2,
            outward: p(0.0, 0.0),
            orientation,
            exterior: true,
            openings: Vec::new(),
            deferred: Vec::new(),
        }
    }

    fn box_floor(index: usize, base: f64) -> Floor {
        Floor {
            index,
            level: index as i32,
            image_id: format!("plan{}", index),
            base,
            height: 3.0,
            height_source: HeightSource::Default,
            walls: vec![
                wall(0, p(0.0, 0.0), p(10.0, 0.0), Orientation::South),
                wall(1, p(10.0, 0.0), p(10.0, 8.0), Orientation::East),
                wall(2, p(10.0, 8.0), p(0.0, 8.0), Orientation::North),
                wall(3, p(0.0, 8.0), p(0.0, 0.0), Orientation::West),
            ],
            rooms: vec![Room {
                source: FeatureRef::new(format!("plan{}", index), 4),
                name: None,
                outline: vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 8.0), p(0.0, 8.0)],
            }],
            deferred: Vec::new(),
        }
    }

    fn window(offset: f64, width: f64, sill: f64, height: f64) -> Opening {
        Opening {
            source_ref: FeatureRef::new("north", 9),
            kind: OpeningKind::Window,
            source: OpeningSource::Elevation(Orientation::North),
            offset,
            width,
            sill,
            height,
        }
    }

    fn build(floors: Vec<Floor>) -> (SolidModel, Vec<Warning>) {
        let mut warnings = Vec::new();
        let model = build_solid(
            AlignedModel {
                floors,
                deferred: Vec::new(),
            },
            &ReconstructionConfig::default(),
            &mut warnings,
        )
        .unwrap();
        (model, warnings)
    }

    #[test]
    fn test_single_box_floor_is_closed() {
        let (model, warnings) = build(vec![box_floor(0, 0.0)]);

        assert!(warnings.is_empty());
        assert!(model.mesh.check_closed().is_ok());
        assert_eq!(model.shells.len(), 6);
        assert_eq!(model.shells[5].kind, ShellKind::Roof);
        assert_relative_eq!(model.shells[4].volume, 240.0, epsilon = 1e-9);

        let roof = model.roof.unwrap();
        assert_relative_eq!(roof.base, 3.0);
        assert_relative_eq!(roof.top, 3.5);
        assert_eq!(roof.outline.len(), 4);
        assert_relative_eq!(roof.outline[0].x, -0.1, epsilon = 1e-6);
        assert_relative_eq!(roof.outline[0].y, -0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_shell_ranges_cover_mesh() {
        let (model, _) = build(vec![box_floor(0, 0.0)]);

        let mut cursor = 0;
        for shell in &model.shells {
            assert_eq!(shell.triangles.start, cursor);
            cursor = shell.triangles.end;
        }
        assert_eq!(cursor, model.mesh.triangle_count());
        assert_eq!(model.shells[0].name(), "wall-f0-plan-0");
    }

    #[test]
    fn test_stacked_rooms_are_fused() {
        let (single, _) = build(vec![box_floor(0, 0.0)]);
        let (model, _) = build(vec![box_floor(0, 0.0), box_floor(1, 3.0)]);

        assert_eq!(
            model.stacked_rooms,
            vec![StackedRooms {
                lower: RoomKey { floor: 0, room: 0 },
                upper: RoomKey { floor: 1, room: 0 },
            }]
        );
        assert!(model.mesh.check_closed().is_ok());
        // Two box floors minus two caps of two triangles each
        let walls_and_rooms = single.mesh.triangle_count() - single.shells[5].triangles.len();
        assert_eq!(
            model.mesh.triangle_count(),
            walls_and_rooms * 2 - 4 + single.shells[5].triangles.len()
        );
        assert_eq!(
            model.room_above(RoomKey { floor: 0, room: 0 }),
            Some(RoomKey { floor: 1, room: 0 })
        );
        assert!(model.is_stacked_above(RoomKey { floor: 1, room: 0 }));
    }

    fn split_floor(index: usize, base: f64) -> Floor {
        let mut floor = box_floor(index, base);
        let half = |n: usize, x0: f64, x1: f64| Room {
            source: FeatureRef::new(format!("plan{}", index), n),
            name: None,
            outline: vec![p(x0, 0.0), p(x1, 0.0), p(x1, 8.0), p(x0, 8.0)],
        };
        floor.rooms = vec![half(4, 0.0, 5.0), half(5, 5.0, 10.0)];
        floor
    }

    #[test]
    fn test_side_by_side_rooms_fuse_pairwise() {
        let (model, _) = build(vec![split_floor(0, 0.0), split_floor(1, 3.0)]);

        let key = |floor, room| RoomKey { floor, room };
        assert_eq!(
            model.stacked_rooms,
            vec![
                StackedRooms {
                    lower: key(0, 0),
                    upper: key(1, 0),
                },
                StackedRooms {
                    lower: key(0, 1),
                    upper: key(1, 1),
                },
            ]
        );
        assert!(model.mesh.check_closed().is_ok());
        assert_eq!(model.room_above(key(0, 1)), Some(key(1, 1)));
        assert_eq!(model.room_above(key(1, 0)), None);
    }

    #[test]
    fn test_openings_are_cut_and_clamped() {
        let mut floor = box_floor(0, 0.0);
        floor.walls[2].openings.push(window(3.0, 1.5, 0.9, 1.2));
        floor.walls[2].openings.push(window(9.5, 1.0, 2.5, 1.0));
        let (model, warnings) = build(vec![floor]);

        assert!(model.mesh.check_closed().is_ok());
        assert!(matches!(
            warnings.as_slice(),
            [Warning::OpeningClamped { .. }]
        ));

        let clamped = &model.floors[0].walls[2].openings[1];
        assert_relative_eq!(clamped.offset, 9.0);
        assert_relative_eq!(clamped.sill, 2.0);
        for opening in &model.floors[0].walls[2].openings {
            assert!(opening.fits(10.0, 3.0, 1e-9));
        }

        let north = &model.shells[2];
        let expected = (10.0 * 3.0 - 1.5 * 1.2 - 1.0) * 0.2;
        assert_relative_eq!(north.volume, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_width_opening_deferred() {
        let mut floor = box_floor(0, 0.0);
        floor.walls[0].openings.push(window(3.0, 0.0, 0.9, 1.2));
        let (model, warnings) = build(vec![floor]);

        assert!(model.floors[0].walls[0].openings.is_empty());
        assert_eq!(model.floors[0].walls[0].deferred.len(), 1);
        assert!(matches!(
            warnings.as_slice(),
            [Warning::DegenerateFeature { .. }]
        ));
    }

    #[test]
    fn test_roof_falls_back_to_rooms_then_warns() {
        let mut floor = box_floor(0, 0.0);
        floor.walls.clear();
        let (model, warnings) = build(vec![floor.clone()]);
        assert_eq!(model.roof.unwrap().outline.len(), 4);
        assert!(warnings.is_empty());

        floor.rooms.clear();
        let (model, warnings) = build(vec![floor]);
        assert!(model.roof.is_none());
        assert_eq!(warnings, vec![Warning::RoofOutlineMissing { floor: 0 }]);
    }
}
