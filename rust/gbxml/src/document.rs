// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed gbXML document
//!
//! Lengths, areas and volumes are stored already converted to the document
//! unit; [`GbXmlDocument::to_xml`] only arranges them into elements.

use crate::config::{Location, OutputUnit};
use crate::xml::XmlElement;
use gbxml_lite_reconstruct::Point3D;

pub const GBXML_NAMESPACE: &str = "http://www.gbxml.org/schema";
pub const GBXML_VERSION: &str = "6.01";
pub const DEFAULT_CONSTRUCTION_ID: &str = "construction-default";
pub const DEFAULT_WINDOW_TYPE_ID: &str = "windowtype-default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceType {
    InteriorWall,
    ExteriorWall,
    Roof,
    Ceiling,
    InteriorFloor,
    ExposedFloor,
    SlabOnGrade,
}

impl SurfaceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceType::InteriorWall => "InteriorWall",
            SurfaceType::ExteriorWall => "ExteriorWall",
            SurfaceType::Roof => "Roof",
            SurfaceType::Ceiling => "Ceiling",
            SurfaceType::InteriorFloor => "InteriorFloor",
            SurfaceType::ExposedFloor => "ExposedFloor",
            SurfaceType::SlabOnGrade => "SlabOnGrade",
        }
    }

    /// Surfaces on the building envelope that receive sun
    pub fn is_exposed(&self) -> bool {
        matches!(
            self,
            SurfaceType::ExteriorWall | SurfaceType::Roof | SurfaceType::ExposedFloor
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpeningType {
    FixedWindow,
    NonSlidingDoor,
    SlidingDoor,
}

impl OpeningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpeningType::FixedWindow => "FixedWindow",
            OpeningType::NonSlidingDoor => "NonSlidingDoor",
            OpeningType::SlidingDoor => "SlidingDoor",
        }
    }

    pub fn is_window(&self) -> bool {
        matches!(self, OpeningType::FixedWindow)
    }
}

/// Insertion point, orientation and size of a planar rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct RectangularGeometry {
    /// Degrees clockwise from north of the outward normal
    pub azimuth: f64,
    /// Lower-left corner; openings use surface-local (x, y) coordinates
    pub origin: Vec<f64>,
    /// Degrees from straight up of the outward normal
    pub tilt: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Opening {
    pub id: String,
    pub name: String,
    pub opening_type: OpeningType,
    pub rectangle: RectangularGeometry,
    /// Outward-wound outline
    pub polygon: Vec<Point3D>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub id: String,
    pub name: String,
    pub surface_type: SurfaceType,
    /// At most two spaces
    pub adjacent_spaces: Vec<String>,
    /// Coincident surface of another space folded into this one
    pub partner: Option<String>,
    pub rectangle: RectangularGeometry,
    /// Outline wound counter-clockwise seen from outside the first space
    pub polygon: Vec<Point3D>,
    pub openings: Vec<Opening>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Space {
    pub id: String,
    pub name: String,
    pub storey_id: String,
    pub area: f64,
    pub volume: f64,
    /// Floor outline at the storey base
    pub polygon: Vec<Point3D>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildingStorey {
    pub id: String,
    pub name: String,
    pub level: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub id: String,
    pub name: String,
    pub building_type: String,
    pub area: f64,
    pub storeys: Vec<BuildingStorey>,
    pub spaces: Vec<Space>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Campus {
    pub id: String,
    pub location: Location,
    pub building: Building,
    pub surfaces: Vec<Surface>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GbXmlDocument {
    pub unit: OutputUnit,
    pub campus: Campus,
    pub created: Option<String>,
}

impl GbXmlDocument {
    pub fn surfaces_of_type(&self, surface_type: SurfaceType) -> impl Iterator<Item = &Surface> + '_ {
        self.campus
            .surfaces
            .iter()
            .filter(move |s| s.surface_type == surface_type)
    }

    pub fn to_xml(&self) -> XmlElement {
        let mut root = XmlElement::new("gbXML")
            .with_attr("xmlns", GBXML_NAMESPACE)
            .with_attr("version", GBXML_VERSION)
            .with_attr("temperatureUnit", "C")
            .with_attr("lengthUnit", self.unit.length_unit())
            .with_attr("areaUnit", self.unit.area_unit())
            .with_attr("volumeUnit", self.unit.volume_unit())
            .with_attr("useSIUnitsForResults", "true");

        root.push(self.campus.to_xml());
        root.push(
            XmlElement::new("Construction")
                .with_attr("id", DEFAULT_CONSTRUCTION_ID)
                .with_child(XmlElement::leaf("Name", "Default Construction")),
        );
        root.push(
            XmlElement::new("WindowType")
                .with_attr("id", DEFAULT_WINDOW_TYPE_ID)
                .with_child(XmlElement::leaf("Name", "Default Window")),
        );

        let mut history = XmlElement::new("DocumentHistory").with_child(
            XmlElement::new("ProgramInfo")
                .with_attr("id", "gbxml-lite")
                .with_child(XmlElement::leaf("ProductName", "gbxml-lite"))
                .with_child(XmlElement::leaf("Version", env!("CARGO_PKG_VERSION"))),
        );
        if let Some(created) = &self.created {
            history.push(
                XmlElement::new("CreatedBy")
                    .with_attr("programId", "gbxml-lite")
                    .with_attr("date", created.as_str()),
            );
        }
        root.push(history);
        root
    }
}

impl Campus {
    fn to_xml(&self) -> XmlElement {
        let location = XmlElement::new("Location")
            .with_child(XmlElement::leaf("Name", self.location.name.as_str()))
            .with_child(XmlElement::number("Latitude", self.location.latitude))
            .with_child(XmlElement::number("Longitude", self.location.longitude))
            .with_child(XmlElement::number("Elevation", self.location.elevation));

        let mut campus = XmlElement::new("Campus")
            .with_attr("id", self.id.as_str())
            .with_child(location)
            .with_child(self.building.to_xml());
        for surface in &self.surfaces {
            campus.push(surface.to_xml());
        }
        campus
    }
}

impl Building {
    fn to_xml(&self) -> XmlElement {
        let mut building = XmlElement::new("Building")
            .with_attr("id", self.id.as_str())
            .with_attr("buildingType", self.building_type.as_str())
            .with_child(XmlElement::leaf("Name", self.name.as_str()))
            .with_child(XmlElement::number("Area", self.area));

        for storey in &self.storeys {
            building.push(
                XmlElement::new("BuildingStorey")
                    .with_attr("id", storey.id.as_str())
                    .with_child(XmlElement::leaf("Name", storey.name.as_str()))
                    .with_child(XmlElement::number("Level", storey.level)),
            );
        }
        for space in &self.spaces {
            building.push(
                XmlElement::new("Space")
                    .with_attr("id", space.id.as_str())
                    .with_attr("buildingStoreyIdRef", space.storey_id.as_str())
                    .with_child(XmlElement::leaf("Name", space.name.as_str()))
                    .with_child(XmlElement::number("Area", space.area))
                    .with_child(XmlElement::number("Volume", space.volume))
                    .with_child(planar_geometry(&space.polygon)),
            );
        }
        building
    }
}

impl Surface {
    fn to_xml(&self) -> XmlElement {
        let mut surface = XmlElement::new("Surface")
            .with_attr("id", self.id.as_str())
            .with_attr("surfaceType", self.surface_type.as_str())
            .with_attr("constructionIdRef", DEFAULT_CONSTRUCTION_ID)
            .with_attr(
                "exposedToSun",
                if self.surface_type.is_exposed() { "true" } else { "false" },
            )
            .with_child(XmlElement::leaf("Name", self.name.as_str()));

        for space in &self.adjacent_spaces {
            surface.push(XmlElement::new("AdjacentSpaceId").with_attr("spaceIdRef", space.as_str()));
        }
        surface.push(self.rectangle.to_xml());
        surface.push(planar_geometry(&self.polygon));

        for opening in &self.openings {
            let mut element = XmlElement::new("Opening")
                .with_attr("id", opening.id.as_str())
                .with_attr("openingType", opening.opening_type.as_str());
            if opening.opening_type.is_window() {
                element = element.with_attr("windowTypeIdRef", DEFAULT_WINDOW_TYPE_ID);
            }
            element.push(XmlElement::leaf("Name", opening.name.as_str()));
            element.push(opening.rectangle.to_xml());
            element.push(planar_geometry(&opening.polygon));
            surface.push(element);
        }
        surface
    }
}

impl RectangularGeometry {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("RectangularGeometry")
            .with_child(XmlElement::number("Azimuth", self.azimuth))
            .with_child(cartesian_point(&self.origin))
            .with_child(XmlElement::number("Tilt", self.tilt))
            .with_child(XmlElement::number("Width", self.width))
            .with_child(XmlElement::number("Height", self.height))
    }
}

fn cartesian_point(coordinates: &[f64]) -> XmlElement {
    let mut point = XmlElement::new("CartesianPoint");
    for &c in coordinates {
        point.push(XmlElement::number("Coordinate", c));
    }
    point
}

fn planar_geometry(polygon: &[Point3D]) -> XmlElement {
    let mut poly_loop = XmlElement::new("PolyLoop");
    for p in polygon {
        poly_loop.push(cartesian_point(&[p.x, p.y, p.z]));
    }
    XmlElement::new("PlanarGeometry").with_child(poly_loop)
}
