// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building reconstruction from floor plans and elevations
//!
//! This crate turns per-image architectural features into one closed
//! building solid:
//! 1. Scale normalization of every image to meters
//! 2. View alignment: floors, heights and opening placement
//! 3. Solid construction: wall slabs with openings, room prisms, roof
//! 4. Wavefront OBJ export
//!
//! # Usage
//!
//! ```rust,ignore
//! use gbxml_lite_reconstruct::{reconstruct, write_obj, ImageFeatureSet, ReconstructionConfig};
//!
//! let plans: Vec<ImageFeatureSet> = serde_json::from_str(&json)?;
//! let result = reconstruct(&plans, &[], &ReconstructionConfig::default())?;
//! let obj = write_obj(&result.model);
//! ```

pub mod align;
pub mod config;
pub mod error;
pub mod export;
pub mod scale;
pub mod solid;
pub mod types;
pub mod warning;

pub use align::align;
pub use config::ReconstructionConfig;
pub use error::{Error, Result};
pub use export::{parse_obj, write_obj};
pub use scale::normalize;
pub use solid::{build_solid, Roof, RoomKey, Shell, ShellKind, SolidModel, StackedRooms};
pub use types::{
    AlignedModel, Calibration, DoorType, Feature, FeatureRef, Floor, HeightSource,
    ImageFeatureSet, ImageRole, LengthUnit, NormalizedFeatureSet, Opening, OpeningKind,
    OpeningSource, Orientation, Point2D, Point3D, Room, Wall,
};
pub use warning::{DeferredTo, Warning};

/// A reconstructed model with everything that was recovered along the way
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub model: SolidModel,
    pub warnings: Vec<Warning>,
}

/// Run normalization, alignment and solid construction.
///
/// Every image is scaled before any floor is built, so an invalid scale
/// fails fast.
pub fn reconstruct(
    floor_plans: &[ImageFeatureSet],
    elevations: &[ImageFeatureSet],
    config: &ReconstructionConfig,
) -> Result<Reconstruction> {
    let plans = floor_plans
        .iter()
        .map(normalize)
        .collect::<Result<Vec<_>>>()?;
    let elevations = elevations
        .iter()
        .map(normalize)
        .collect::<Result<Vec<_>>>()?;

    let mut warnings = Vec::new();
    let aligned = align(&plans, &elevations, config, &mut warnings)?;
    let model = build_solid(aligned, config, &mut warnings)?;

    Ok(Reconstruction { model, warnings })
}
