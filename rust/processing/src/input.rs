// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reading upstream feature-set JSON

use crate::error::{ProcessingError, Result};
use gbxml_lite_reconstruct::ImageFeatureSet;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<ImageFeatureSet>),
    One(Box<ImageFeatureSet>),
}

/// Parse a single feature set object or an array of them.
pub fn parse_feature_sets(json: &str) -> serde_json::Result<Vec<ImageFeatureSet>> {
    Ok(match serde_json::from_str(json)? {
        OneOrMany::Many(sets) => sets,
        OneOrMany::One(set) => vec![*set],
    })
}

/// Read feature sets from a JSON file.
pub fn read_feature_sets(path: impl AsRef<Path>) -> Result<Vec<ImageFeatureSet>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| ProcessingError::io(path, e))?;
    let sets = parse_feature_sets(&json).map_err(|source| ProcessingError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), count = sets.len(), "Read feature sets");
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbxml_lite_reconstruct::{Feature, ImageRole, Orientation};

    #[test]
    fn test_single_object_and_array() {
        let one = r#"{
            "image_id": "ground",
            "role": "floorPlan",
            "floor_level": 0,
            "scale_factor": 0.01,
            "features": [
                { "kind": "wall", "points": [{ "x": 0, "y": 0 }, { "x": 500, "y": 0 }], "thickness": 20 }
            ]
        }"#;
        let sets = parse_feature_sets(one).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].role, ImageRole::FloorPlan);
        assert!(matches!(sets[0].features[0], Feature::Wall { thickness: Some(t), .. } if t == 20.0));

        let many = r#"[
            { "image_id": "north", "role": "elevation", "orientation": "north", "scale_factor": 0.01 },
            { "image_id": "south", "role": "elevation", "orientation": "south", "scale_factor": 0.01 }
        ]"#;
        let sets = parse_feature_sets(many).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[1].orientation, Some(Orientation::South));
        assert!(sets[1].features.is_empty());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = read_feature_sets("/nonexistent/plan.json").unwrap_err();
        assert!(matches!(err, ProcessingError::Io { ref path, .. } if path.ends_with("plan.json")));
    }
}
