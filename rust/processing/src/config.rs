// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration loaded from environment variables.

use gbxml_lite_gbxml::{GbxmlConfig, OutputUnit};
use gbxml_lite_reconstruct::ReconstructionConfig;
use std::str::FromStr;

/// Configuration for one generation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    /// Tolerances and defaults for reconstruction.
    pub reconstruction: ReconstructionConfig,
    /// gbXML export options.
    pub gbxml: GbxmlConfig,
}

/// Parse `GBXML_LITE_<name>`, keeping `default` when unset or malformed.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(format!("GBXML_LITE_{}", name))
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl PipelineConfig {
    /// Load configuration from `GBXML_LITE_*` environment variables.
    pub fn from_env() -> Self {
        let r = ReconstructionConfig::default();
        let g = GbxmlConfig::default();

        Self {
            reconstruction: ReconstructionConfig {
                default_floor_height: env_or("DEFAULT_FLOOR_HEIGHT", r.default_floor_height),
                band_angle_tolerance_deg: env_or(
                    "BAND_ANGLE_TOLERANCE_DEG",
                    r.band_angle_tolerance_deg,
                ),
                band_merge_tolerance: env_or("BAND_MERGE_TOLERANCE", r.band_merge_tolerance),
                opening_tolerance: env_or("OPENING_TOLERANCE", r.opening_tolerance),
                weld_tolerance: env_or("WELD_TOLERANCE", r.weld_tolerance),
                parapet_height: env_or("PARAPET_HEIGHT", r.parapet_height),
                default_wall_thickness: env_or("DEFAULT_WALL_THICKNESS", r.default_wall_thickness),
                ..r
            },
            gbxml: GbxmlConfig {
                unit: env_or::<OutputUnit>("UNIT", g.unit),
                building_name: env_or("BUILDING_NAME", g.building_name.clone()),
                location: gbxml_lite_gbxml::Location {
                    name: env_or("LOCATION_NAME", g.location.name.clone()),
                    latitude: env_or("LATITUDE", g.location.latitude),
                    longitude: env_or("LONGITUDE", g.location.longitude),
                    elevation: env_or("ELEVATION", g.location.elevation),
                },
                created: std::env::var("GBXML_LITE_CREATED").ok(),
                ..g
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_env_overrides_and_fallbacks() {
        std::env::set_var("GBXML_LITE_DEFAULT_FLOOR_HEIGHT", "3.5");
        std::env::set_var("GBXML_LITE_UNIT", "feet");
        std::env::set_var("GBXML_LITE_OPENING_TOLERANCE", "not-a-number");

        let config = PipelineConfig::from_env();
        assert_relative_eq!(config.reconstruction.default_floor_height, 3.5);
        assert_eq!(config.gbxml.unit, OutputUnit::Feet);
        assert_relative_eq!(config.reconstruction.opening_tolerance, 0.25);

        std::env::remove_var("GBXML_LITE_DEFAULT_FLOOR_HEIGHT");
        std::env::remove_var("GBXML_LITE_UNIT");
        std::env::remove_var("GBXML_LITE_OPENING_TOLERANCE");
    }
}
