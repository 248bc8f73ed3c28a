// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pixel to real-world scale normalization

use crate::error::{Error, Result};
use crate::types::{Calibration, Feature, ImageFeatureSet, NormalizedFeatureSet};

/// Real units per pixel from a calibration segment
pub fn calibrate(image_id: &str, calibration: &Calibration) -> Result<f64> {
    let pixels = calibration.p1.distance_to(&calibration.p2);
    if pixels <= 0.0 || !pixels.is_finite() {
        return Err(Error::InvalidScale {
            image_id: image_id.to_string(),
            reason: "calibration points coincide".to_string(),
        });
    }
    Ok(calibration.real_length / pixels)
}

/// Meters per pixel for an image: its calibration (when present) or its
/// declared scale factor, converted from the image's unit.
pub fn effective_scale(set: &ImageFeatureSet) -> Result<f64> {
    let scale = match &set.calibration {
        Some(calibration) => calibrate(&set.image_id, calibration)?,
        None => set.scale_factor,
    };

    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::InvalidScale {
            image_id: set.image_id.clone(),
            reason: format!("scale factor must be positive and finite, got {}", scale),
        });
    }
    Ok(scale * set.unit.to_meters())
}

/// Scale every feature by `s` (lengths by `s`, areas by `s²`)
pub fn scale_features(features: &[Feature], s: f64) -> Vec<Feature> {
    features.iter().map(|f| f.scaled(s)).collect()
}

/// Convert an image's features to meters
pub fn normalize(raw: &ImageFeatureSet) -> Result<NormalizedFeatureSet> {
    let meters_per_pixel = effective_scale(raw)?;
    tracing::debug!(
        image = %raw.image_id,
        meters_per_pixel,
        features = raw.features.len(),
        "Normalized image scale"
    );

    Ok(NormalizedFeatureSet {
        meters_per_pixel,
        features: scale_features(&raw.features, meters_per_pixel),
        raw: raw.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LengthUnit, Point2D};
    use approx::assert_relative_eq;

    fn plan_with_wall(scale: f64) -> ImageFeatureSet {
        ImageFeatureSet::floor_plan("plan", 0, scale).with_features(vec![Feature::wall(
            vec![Point2D::new(0.0, 0.0), Point2D::new(100.0, 0.0)],
            20.0,
        )])
    }

    fn wall_length_and_thickness(feature: &Feature) -> (f64, f64) {
        match feature {
            Feature::Wall {
                points, thickness, ..
            } => (points[0].distance_to(&points[1]), thickness.unwrap_or(0.0)),
            other => panic!("expected wall, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_scales_lengths() {
        let normalized = normalize(&plan_with_wall(0.1)).unwrap();
        let (length, thickness) = wall_length_and_thickness(&normalized.features[0]);

        assert_relative_eq!(length, 10.0, epsilon = 1e-12);
        assert_relative_eq!(thickness, 2.0, epsilon = 1e-12);
        assert_eq!(normalized.raw.features, plan_with_wall(0.1).features);
    }

    #[test]
    fn test_scale_composition() {
        let raw = plan_with_wall(1.0).features;
        let twice = scale_features(&scale_features(&raw, 0.5), 0.04);
        let once = scale_features(&raw, 0.5 * 0.04);

        let (l1, t1) = wall_length_and_thickness(&twice[0]);
        let (l2, t2) = wall_length_and_thickness(&once[0]);
        assert_relative_eq!(l1, l2, max_relative = 1e-12);
        assert_relative_eq!(t1, t2, max_relative = 1e-12);
    }

    #[test]
    fn test_zero_and_negative_scale_rejected() {
        for scale in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            let err = normalize(&plan_with_wall(scale)).unwrap_err();
            assert!(matches!(err, Error::InvalidScale { .. }), "scale {}", scale);
        }
    }

    #[test]
    fn test_calibration_and_unit() {
        let mut set = plan_with_wall(0.0);
        set.calibration = Some(Calibration {
            p1: Point2D::new(0.0, 0.0),
            p2: Point2D::new(0.0, 200.0),
            real_length: 20.0,
        });
        set.unit = LengthUnit::Feet;

        let scale = effective_scale(&set).unwrap();
        assert_relative_eq!(scale, 0.1 * 0.3048, epsilon = 1e-12);

        set.calibration = Some(Calibration {
            p1: Point2D::new(3.0, 3.0),
            p2: Point2D::new(3.0, 3.0),
            real_length: 20.0,
        });
        assert!(effective_scale(&set).is_err());
    }
}
