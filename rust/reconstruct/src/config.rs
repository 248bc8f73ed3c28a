// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconstruction tolerances and defaults (meters, degrees)

#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionConfig {
    /// Floor height when neither bands nor a declared height are available
    pub default_floor_height: f64,
    /// Max deviation from horizontal for an elevation line to count as a band line
    pub band_angle_tolerance_deg: f64,
    /// Band lines closer than this collapse into one
    pub band_merge_tolerance: f64,
    /// Max distance for matching an opening to a wall
    pub opening_tolerance: f64,
    /// Vertex welding and ring coincidence tolerance
    pub weld_tolerance: f64,
    /// Height of the flat roof slab above the topmost floor
    pub parapet_height: f64,
    /// Used for walls with a missing or non-positive thickness
    pub default_wall_thickness: f64,
    pub default_window_sill: f64,
    pub default_window_height: f64,
    pub default_door_height: f64,
    /// Used for plan openings without a width, radius or extent
    pub default_opening_width: f64,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            default_floor_height: 3.0,
            band_angle_tolerance_deg: 10.0,
            band_merge_tolerance: 0.5,
            opening_tolerance: 0.25,
            weld_tolerance: 1e-4,
            parapet_height: 0.5,
            default_wall_thickness: 0.2,
            default_window_sill: 0.9,
            default_window_height: 1.2,
            default_door_height: 2.1,
            default_opening_width: 0.9,
        }
    }
}
