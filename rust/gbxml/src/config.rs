// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Export options for the gbXML mapper

use serde::{Deserialize, Serialize};

/// Length unit of the exported document
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputUnit {
    #[default]
    Meters,
    Feet,
}

impl OutputUnit {
    /// Output lengths per meter
    pub fn per_meter(&self) -> f64 {
        match self {
            OutputUnit::Meters => 1.0,
            OutputUnit::Feet => 1.0 / 0.3048,
        }
    }

    pub fn length_unit(&self) -> &'static str {
        match self {
            OutputUnit::Meters => "Meters",
            OutputUnit::Feet => "Feet",
        }
    }

    pub fn area_unit(&self) -> &'static str {
        match self {
            OutputUnit::Meters => "SquareMeters",
            OutputUnit::Feet => "SquareFeet",
        }
    }

    pub fn volume_unit(&self) -> &'static str {
        match self {
            OutputUnit::Meters => "CubicMeters",
            OutputUnit::Feet => "CubicFeet",
        }
    }
}

impl std::str::FromStr for OutputUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "meters" | "m" => Ok(OutputUnit::Meters),
            "feet" | "ft" => Ok(OutputUnit::Feet),
            other => Err(format!("unknown output unit '{}'", other)),
        }
    }
}

/// Site of the building
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above sea level
    pub elevation: f64,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            name: "Unknown Location".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            elevation: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GbxmlConfig {
    pub unit: OutputUnit,
    pub building_name: String,
    pub building_type: String,
    pub location: Location,
    /// Creation timestamp written to the document history; omitted when unset
    /// so repeated exports stay byte-identical
    pub created: Option<String>,
    /// Spaces whose outline edge lies this close to a wall centerline
    /// (beyond half the wall thickness) are adjacent to it, in meters
    pub adjacency_tolerance: f64,
}

impl Default for GbxmlConfig {
    fn default() -> Self {
        Self {
            unit: OutputUnit::Meters,
            building_name: "Building Model".to_string(),
            building_type: "Unknown".to_string(),
            location: Location::default(),
            created: None,
            adjacency_tolerance: 0.05,
        }
    }
}
