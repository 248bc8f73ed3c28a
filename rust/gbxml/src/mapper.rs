// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid model to gbXML mapping
//!
//! One Space per room per floor. Surfaces are emitted floor by floor: wall
//! surfaces first, then the floor and ceiling caps of every room. A ceiling
//! that coincides with the floor cap of a room above is written once,
//! carrying both spaces; the floor cap it absorbs is not written.

use crate::config::GbxmlConfig;
use crate::document::{
    Building, BuildingStorey, Campus, GbXmlDocument, Opening, OpeningType, RectangularGeometry,
    Space, Surface, SurfaceType,
};
use gbxml_lite_reconstruct::{
    DoorType, Floor, OpeningKind, Point2D, Point3D, RoomKey, SolidModel, Wall,
};

/// Map a solid model into a gbXML document.
pub fn map_model(model: &SolidModel, config: &GbxmlConfig) -> GbXmlDocument {
    let k = config.unit.per_meter();
    let top_index = model.floors.len().saturating_sub(1);

    let storeys: Vec<BuildingStorey> = model
        .floors
        .iter()
        .map(|floor| BuildingStorey {
            id: storey_id(floor),
            name: if floor.index == 0 {
                "Ground Floor".to_string()
            } else {
                format!("Floor {}", floor.index)
            },
            level: floor.base * k,
        })
        .collect();

    let space_ids: Vec<Vec<String>> = model
        .floors
        .iter()
        .map(|floor| {
            floor
                .rooms
                .iter()
                .map(|room| room.source.element_id("space", floor.index))
                .collect()
        })
        .collect();

    let mut spaces = Vec::new();
    for floor in &model.floors {
        for (j, room) in floor.rooms.iter().enumerate() {
            let area = room.area();
            spaces.push(Space {
                id: space_ids[floor.index][j].clone(),
                name: space_name(floor, j),
                storey_id: storey_id(floor),
                area: area * k * k,
                volume: area * floor.height * k * k * k,
                polygon: ring(&room.outline, floor.base, k),
            });
        }
    }

    let mut surfaces = Vec::new();
    for floor in &model.floors {
        for wall in &floor.walls {
            let adjacent = adjacent_rooms(wall, floor, config.adjacency_tolerance);
            let surface_type = if adjacent.len() == 2 {
                SurfaceType::InteriorWall
            } else {
                SurfaceType::ExteriorWall
            };
            surfaces.push(wall_surface(
                wall,
                floor,
                surface_type,
                adjacent
                    .into_iter()
                    .map(|j| space_ids[floor.index][j].clone())
                    .collect(),
                k,
            ));
        }

        for (j, room) in floor.rooms.iter().enumerate() {
            let key = RoomKey {
                floor: floor.index,
                room: j,
            };
            let space = space_ids[floor.index][j].clone();

            // A stacked floor cap was already written as the ceiling below
            if !model.is_stacked_above(key) {
                let surface_type = if floor.index == 0 {
                    SurfaceType::SlabOnGrade
                } else {
                    SurfaceType::ExposedFloor
                };
                let mut polygon = ring(&room.outline, floor.base, k);
                polygon.reverse();
                surfaces.push(Surface {
                    id: room.source.element_id("floor", floor.index),
                    name: format!("Floor of {}", space_name(floor, j)),
                    surface_type,
                    adjacent_spaces: vec![space.clone()],
                    partner: None,
                    rectangle: horizontal_rectangle(&room.outline, floor.base, 180.0, k),
                    polygon,
                    openings: Vec::new(),
                });
            }

            let (surface_type, adjacent_spaces, partner) = match model.room_above(key) {
                Some(upper) => {
                    let upper_room = &model.floors[upper.floor].rooms[upper.room];
                    (
                        SurfaceType::Ceiling,
                        vec![space.clone(), space_ids[upper.floor][upper.room].clone()],
                        Some(upper_room.source.element_id("floor", upper.floor)),
                    )
                }
                None => (SurfaceType::Roof, vec![space.clone()], None),
            };
            surfaces.push(Surface {
                id: room.source.element_id("ceiling", floor.index),
                name: format!("Ceiling of {}", space_name(floor, j)),
                surface_type,
                adjacent_spaces,
                partner,
                rectangle: horizontal_rectangle(&room.outline, floor.top(), 0.0, k),
                polygon: ring(&room.outline, floor.top(), k),
                openings: Vec::new(),
            });
        }
    }

    if let (Some(top), Some(roof)) = (model.floors.get(top_index), &model.roof) {
        if top.rooms.is_empty() {
            surfaces.push(Surface {
                id: format!("roof-f{}", top.index),
                name: "Roof".to_string(),
                surface_type: SurfaceType::Roof,
                adjacent_spaces: Vec::new(),
                partner: None,
                rectangle: horizontal_rectangle(&roof.outline, roof.base, 0.0, k),
                polygon: ring(&roof.outline, roof.base, k),
                openings: Vec::new(),
            });
        }
    }

    let opening_count: usize = surfaces.iter().map(|s| s.openings.len()).sum();
    tracing::info!(
        storeys = storeys.len(),
        spaces = spaces.len(),
        surfaces = surfaces.len(),
        openings = opening_count,
        unit = config.unit.length_unit(),
        "Mapped gbXML document"
    );

    GbXmlDocument {
        unit: config.unit,
        created: config.created.clone(),
        campus: Campus {
            id: "campus-1".to_string(),
            location: config.location.clone(),
            building: Building {
                id: "building-1".to_string(),
                name: config.building_name.clone(),
                building_type: config.building_type.clone(),
                area: spaces.iter().map(|s| s.area).sum(),
                storeys,
                spaces,
            },
            surfaces,
        },
    }
}

fn storey_id(floor: &Floor) -> String {
    format!("storey-f{}", floor.index)
}

fn space_name(floor: &Floor, room: usize) -> String {
    floor.rooms[room]
        .name
        .clone()
        .unwrap_or_else(|| format!("Room {} on Floor {}", room + 1, floor.index + 1))
}

/// Outline lifted to elevation `z`, converted to the output unit
fn ring(outline: &[Point2D], z: f64, k: f64) -> Vec<Point3D> {
    outline
        .iter()
        .map(|p| Point3D::new(p.x * k, p.y * k, z * k))
        .collect()
}

/// Bounding rectangle of a horizontal outline
fn horizontal_rectangle(outline: &[Point2D], z: f64, tilt: f64, k: f64) -> RectangularGeometry {
    let (min_x, max_x, min_y, max_y) = outline.iter().fold(
        (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
        |(x0, x1, y0, y1), p| (x0.min(p.x), x1.max(p.x), y0.min(p.y), y1.max(p.y)),
    );
    if outline.is_empty() {
        return RectangularGeometry {
            azimuth: 0.0,
            origin: vec![0.0, 0.0, z * k],
            tilt,
            width: 0.0,
            height: 0.0,
        };
    }
    RectangularGeometry {
        azimuth: 0.0,
        origin: vec![min_x * k, min_y * k, z * k],
        tilt,
        width: (max_x - min_x) * k,
        height: (max_y - min_y) * k,
    }
}

/// Compass azimuth in degrees of a horizontal direction (+Y north, +X east)
fn azimuth(direction: &Point2D) -> f64 {
    let degrees = direction.x.atan2(direction.y).to_degrees();
    if degrees < 0.0 {
        degrees + 360.0
    } else {
        degrees
    }
}

/// Rooms along the wall centerline: the best match behind the wall (against
/// its outward normal) first, then the best match in front of it. The best
/// match on a side is the room sharing the longest length with the wall.
fn adjacent_rooms(wall: &Wall, floor: &Floor, tolerance: f64) -> Vec<usize> {
    let length = wall.length();
    if length <= 0.0 {
        return Vec::new();
    }
    let (dx, dy) = (
        (wall.end.x - wall.start.x) / length,
        (wall.end.y - wall.start.y) / length,
    );
    let reach = wall.thickness * 0.5 + tolerance;
    let off_line = |p: &Point2D| (dx * (p.y - wall.start.y) - dy * (p.x - wall.start.x)).abs();

    // (room, shared length) per side: [behind, in front]
    let mut best: [Option<(usize, f64)>; 2] = [None, None];
    for (j, room) in floor.rooms.iter().enumerate() {
        let n = room.outline.len();
        if n == 0 {
            continue;
        }
        let overlap: f64 = (0..n)
            .map(|i| (&room.outline[i], &room.outline[(i + 1) % n]))
            .filter(|(a, b)| off_line(a) <= reach && off_line(b) <= reach)
            .map(|(a, b)| {
                let (ta, tb) = (wall.project(a), wall.project(b));
                (ta.max(tb).min(length) - ta.min(tb).max(0.0)).max(0.0)
            })
            .sum();
        if overlap <= tolerance {
            continue;
        }

        let (cx, cy) = room.outline.iter().fold((0.0, 0.0), |(x, y), p| (x + p.x, y + p.y));
        let (cx, cy) = (cx / n as f64, cy / n as f64);
        let front = (cx - wall.start.x) * wall.outward.x + (cy - wall.start.y) * wall.outward.y;
        let side = usize::from(front > 0.0);
        // Strictly longer wins, so ties keep the lower room index
        if best[side].map_or(true, |(_, o)| overlap > o) {
            best[side] = Some((j, overlap));
        }
    }

    best.iter().flatten().map(|&(j, _)| j).collect()
}

fn wall_surface(
    wall: &Wall,
    floor: &Floor,
    surface_type: SurfaceType,
    adjacent_spaces: Vec<String>,
    k: f64,
) -> Surface {
    let length = wall.length();
    let (dx, dy) = if length > 0.0 {
        (
            (wall.end.x - wall.start.x) / length,
            (wall.end.y - wall.start.y) / length,
        )
    } else {
        (1.0, 0.0)
    };
    // Walking start to end with the outward normal on the right keeps the
    // loop counter-clockwise seen from outside
    let forward = dy * wall.outward.x - dx * wall.outward.y >= 0.0;
    let at = |t: f64, z: f64| {
        Point3D::new(
            (wall.start.x + dx * t) * k,
            (wall.start.y + dy * t) * k,
            z * k,
        )
    };
    let (z0, z1) = (floor.base, floor.top());

    let (near, far) = if forward { (0.0, length) } else { (length, 0.0) };
    let polygon = vec![at(near, z0), at(far, z0), at(far, z1), at(near, z1)];
    let wall_azimuth = azimuth(&wall.outward);

    let openings = wall
        .openings
        .iter()
        .map(|opening| {
            let (t0, t1) = (opening.offset, opening.offset + opening.width);
            let (o0, o1) = (z0 + opening.sill, z0 + opening.sill + opening.height);
            let (near, far, local_x) = if forward {
                (t0, t1, t0)
            } else {
                (t1, t0, length - t1)
            };
            let (kind, opening_type) = match opening.kind {
                OpeningKind::Window => ("window", OpeningType::FixedWindow),
                OpeningKind::Door {
                    door_type: DoorType::Sliding,
                } => ("door", OpeningType::SlidingDoor),
                OpeningKind::Door { .. } => ("door", OpeningType::NonSlidingDoor),
            };
            Opening {
                id: opening.source_ref.element_id(kind, floor.index),
                name: format!(
                    "{} {}",
                    if kind == "window" { "Window" } else { "Door" },
                    opening.source_ref
                ),
                opening_type,
                rectangle: RectangularGeometry {
                    azimuth: wall_azimuth,
                    origin: vec![local_x * k, opening.sill * k],
                    tilt: 90.0,
                    width: opening.width * k,
                    height: opening.height * k,
                },
                polygon: vec![at(near, o0), at(far, o0), at(far, o1), at(near, o1)],
            }
        })
        .collect();

    Surface {
        id: wall.source.element_id("wall", floor.index),
        name: format!("Wall {}", wall.source),
        surface_type,
        adjacent_spaces,
        partner: None,
        rectangle: RectangularGeometry {
            azimuth: wall_azimuth,
            origin: {
                let p = &polygon[0];
                vec![p.x, p.y, p.z]
            },
            tilt: 90.0,
            width: length * k,
            height: floor.height * k,
        },
        polygon,
        openings,
    }
}
