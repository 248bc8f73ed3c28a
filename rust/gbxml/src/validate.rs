// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validation of a gbXML tree against the schema rules this exporter relies on
//!
//! Checked, in document order:
//! - Root element name, namespace, version and unit enumerations
//! - Allowed child elements per element, and required attributes
//! - Document-wide unique `id` attributes
//! - `*IdRef` attributes resolving to an element of the right kind
//! - `surfaceType` and `openingType` enumerations
//! - At most two `AdjacentSpaceId` per `Surface`
//! - `PolyLoop` with at least three points; `CartesianPoint` with two or
//!   three finite `Coordinate` values
//!
//! The first violation is reported with the XPath of the offending element
//! (or attribute).

use crate::document::GBXML_NAMESPACE;
use crate::error::{Error, Result};
use crate::xml::XmlElement;
use rustc_hash::{FxHashMap, FxHashSet};

const LENGTH_UNITS: &[&str] = &[
    "Kilometers",
    "Centimeters",
    "Millimeters",
    "Meters",
    "Miles",
    "Yards",
    "Feet",
    "Inches",
];
const AREA_UNITS: &[&str] = &[
    "SquareKilometers",
    "SquareCentimeters",
    "SquareMillimeters",
    "SquareMeters",
    "SquareMiles",
    "SquareYards",
    "SquareFeet",
    "SquareInches",
];
const VOLUME_UNITS: &[&str] = &[
    "CubicKilometers",
    "CubicCentimeters",
    "CubicMillimeters",
    "CubicMeters",
    "CubicMiles",
    "CubicYards",
    "CubicFeet",
    "CubicInches",
];
const TEMPERATURE_UNITS: &[&str] = &["F", "C", "K", "R"];

const SURFACE_TYPES: &[&str] = &[
    "InteriorWall",
    "ExteriorWall",
    "Roof",
    "InteriorFloor",
    "Shade",
    "UndergroundWall",
    "UndergroundSlab",
    "Ceiling",
    "Air",
    "UndergroundCeiling",
    "RaisedFloor",
    "SlabOnGrade",
    "FreestandingColumn",
    "EmbeddedColumn",
    "ExposedFloor",
];
const OPENING_TYPES: &[&str] = &[
    "FixedWindow",
    "OperableWindow",
    "FixedSkylight",
    "OperableSkylight",
    "SlidingDoor",
    "NonSlidingDoor",
    "Air",
];

/// Reference attributes and the element kind they must point at
const REFERENCES: &[(&str, &str)] = &[
    ("spaceIdRef", "Space"),
    ("buildingStoreyIdRef", "BuildingStorey"),
    ("constructionIdRef", "Construction"),
    ("windowTypeIdRef", "WindowType"),
];

/// Child elements allowed under each element; `None` for unknown elements
fn allowed_children(name: &str) -> Option<&'static [&'static str]> {
    let children: &'static [&'static str] = match name {
        "gbXML" => &[
            "Campus",
            "Construction",
            "Layer",
            "Material",
            "WindowType",
            "Schedule",
            "Zone",
            "DocumentHistory",
        ],
        "Campus" => &["Name", "Description", "Location", "Building", "Surface"],
        "Location" => &[
            "ZipcodeOrPostalCode",
            "Name",
            "Latitude",
            "Longitude",
            "Elevation",
            "CADModelAzimuth",
        ],
        "Building" => &["Name", "Description", "Area", "BuildingStorey", "Space"],
        "BuildingStorey" => &["Name", "Level", "PlanarGeometry"],
        "Space" => &[
            "Name",
            "Description",
            "Area",
            "Volume",
            "PlanarGeometry",
            "ShellGeometry",
        ],
        "Surface" => &[
            "Name",
            "AdjacentSpaceId",
            "RectangularGeometry",
            "PlanarGeometry",
            "Opening",
            "CADObjectId",
        ],
        "Opening" => &["Name", "RectangularGeometry", "PlanarGeometry"],
        "RectangularGeometry" => &["Azimuth", "CartesianPoint", "Tilt", "Width", "Height"],
        "PlanarGeometry" => &["PolyLoop"],
        "PolyLoop" => &["CartesianPoint"],
        "CartesianPoint" => &["Coordinate"],
        "Construction" => &["Name", "Description", "U-value", "Absorptance", "LayerId"],
        "WindowType" => &[
            "Name",
            "Description",
            "U-value",
            "SolarHeatGainCoeff",
            "Transmittance",
        ],
        "DocumentHistory" => &["ProgramInfo", "CreatedBy"],
        "ProgramInfo" => &["CompanyName", "ProductName", "Version", "Platform"],
        "Name" | "Description" | "Area" | "Volume" | "Level" | "Latitude" | "Longitude"
        | "Elevation" | "ZipcodeOrPostalCode" | "CADModelAzimuth" | "Azimuth" | "Tilt"
        | "Width" | "Height" | "Coordinate" | "AdjacentSpaceId" | "CADObjectId" | "U-value"
        | "Absorptance" | "LayerId" | "SolarHeatGainCoeff" | "Transmittance" | "CompanyName"
        | "ProductName" | "Version" | "Platform" | "CreatedBy" | "ShellGeometry" | "Layer"
        | "Material" | "Schedule" | "Zone" => &[],
        _ => return None,
    };
    Some(children)
}

fn required_attributes(name: &str) -> &'static [&'static str] {
    match name {
        "Campus" | "BuildingStorey" | "Space" | "Construction" | "WindowType" => &["id"],
        "Building" => &["id", "buildingType"],
        "Surface" => &["id", "surfaceType"],
        "Opening" => &["id", "openingType"],
        "AdjacentSpaceId" => &["spaceIdRef"],
        _ => &[],
    }
}

/// Validate a gbXML document tree, returning the first violation.
pub fn validate(root: &XmlElement) -> Result<()> {
    let path = "/gbXML".to_string();
    if root.name != "gbXML" {
        return Err(Error::schema(
            format!("/{}", root.name),
            "root element must be gbXML",
        ));
    }
    validate_root_attributes(root, &path)?;

    let mut targets: FxHashMap<&str, &str> = FxHashMap::default();
    collect_ids(root, &mut targets);

    let mut seen: FxHashSet<&str> = FxHashSet::default();
    validate_element(root, &path, &targets, &mut seen)
}

fn validate_root_attributes(root: &XmlElement, path: &str) -> Result<()> {
    match root.attr("xmlns") {
        Some(GBXML_NAMESPACE) => {}
        other => {
            return Err(Error::schema(
                format!("{}/@xmlns", path),
                format!("expected namespace {}, found {:?}", GBXML_NAMESPACE, other),
            ))
        }
    }
    if root.attr("version").map_or(true, str::is_empty) {
        return Err(Error::schema(
            format!("{}/@version", path),
            "missing schema version",
        ));
    }

    let units: [(&str, &[&str]); 4] = [
        ("temperatureUnit", TEMPERATURE_UNITS),
        ("lengthUnit", LENGTH_UNITS),
        ("areaUnit", AREA_UNITS),
        ("volumeUnit", VOLUME_UNITS),
    ];
    for (attribute, allowed) in units {
        check_enumeration(root, path, attribute, allowed)?;
    }
    check_enumeration(root, path, "useSIUnitsForResults", &["true", "false"])
}

/// An attribute, when present, must take one of the allowed values
fn check_enumeration(
    element: &XmlElement,
    path: &str,
    attribute: &str,
    allowed: &[&str],
) -> Result<()> {
    match element.attr(attribute) {
        Some(value) if !allowed.contains(&value) => Err(Error::schema(
            format!("{}/@{}", path, attribute),
            format!("'{}' is not a valid {}", value, attribute),
        )),
        _ => Ok(()),
    }
}

/// First element carrying each id, by element name
fn collect_ids<'a>(element: &'a XmlElement, targets: &mut FxHashMap<&'a str, &'a str>) {
    if let Some(id) = element.attr("id") {
        targets.entry(id).or_insert(element.name.as_str());
    }
    for child in &element.children {
        collect_ids(child, targets);
    }
}

fn validate_element<'a>(
    element: &'a XmlElement,
    path: &str,
    targets: &FxHashMap<&str, &str>,
    seen: &mut FxHashSet<&'a str>,
) -> Result<()> {
    let Some(allowed) = allowed_children(&element.name) else {
        return Err(Error::schema(
            path,
            format!("unexpected element {}", element.name),
        ));
    };

    for attribute in required_attributes(&element.name) {
        if element.attr(attribute).map_or(true, str::is_empty) {
            return Err(Error::schema(
                format!("{}/@{}", path, attribute),
                format!("{} requires attribute {}", element.name, attribute),
            ));
        }
    }

    if let Some(id) = element.attr("id") {
        if !seen.insert(id) {
            return Err(Error::schema(
                format!("{}/@id", path),
                format!("duplicate id '{}'", id),
            ));
        }
    }

    for (attribute, kind) in REFERENCES {
        let Some(reference) = element.attr(attribute) else {
            continue;
        };
        match targets.get(reference) {
            Some(found) if found == kind => {}
            Some(found) => {
                return Err(Error::schema(
                    format!("{}/@{}", path, attribute),
                    format!("'{}' refers to a {}, expected a {}", reference, found, kind),
                ))
            }
            None => {
                return Err(Error::schema(
                    format!("{}/@{}", path, attribute),
                    format!("unresolved reference '{}'", reference),
                ))
            }
        }
    }

    match element.name.as_str() {
        "Surface" => {
            check_enumeration(element, path, "surfaceType", SURFACE_TYPES)?;
            let adjacent = element.children_named("AdjacentSpaceId").count();
            if adjacent > 2 {
                return Err(Error::schema(
                    path,
                    format!("{} AdjacentSpaceId elements, at most 2 allowed", adjacent),
                ));
            }
        }
        "Opening" => check_enumeration(element, path, "openingType", OPENING_TYPES)?,
        "PolyLoop" => {
            let points = element.children_named("CartesianPoint").count();
            if points < 3 {
                return Err(Error::schema(
                    path,
                    format!("PolyLoop has {} points, at least 3 required", points),
                ));
            }
        }
        "CartesianPoint" => {
            let coordinates: Vec<&XmlElement> = element.children_named("Coordinate").collect();
            if !(2..=3).contains(&coordinates.len()) {
                return Err(Error::schema(
                    path,
                    format!(
                        "CartesianPoint has {} coordinates, expected 2 or 3",
                        coordinates.len()
                    ),
                ));
            }
            for (i, coordinate) in coordinates.iter().enumerate() {
                let finite = coordinate
                    .text
                    .as_deref()
                    .and_then(|t| t.trim().parse::<f64>().ok())
                    .is_some_and(f64::is_finite);
                if !finite {
                    return Err(Error::schema(
                        format!("{}/Coordinate[{}]", path, i + 1),
                        "coordinate is not a finite number",
                    ));
                }
            }
        }
        _ => {}
    }

    let mut positions: FxHashMap<&str, usize> = FxHashMap::default();
    for child in &element.children {
        let position = positions.entry(child.name.as_str()).or_insert(0);
        *position += 1;
        let child_path = format!("{}/{}[{}]", path, child.name, position);
        if !allowed.contains(&child.name.as_str()) {
            return Err(Error::schema(
                child_path,
                format!("{} is not allowed in {}", child.name, element.name),
            ));
        }
        validate_element(child, &child_path, targets, seen)?;
    }

    Ok(())
}
