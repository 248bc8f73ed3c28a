// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use gbxml_lite_processing::{
    generate, parse_feature_sets, write_artifacts, PipelineConfig, ProcessingError,
};
use gbxml_lite_reconstruct::{
    parse_obj, Error, Feature, ImageFeatureSet, Orientation, Point2D, Warning,
};

fn p(x: f64, y: f64) -> Point2D {
    Point2D::new(x, y)
}

/// 10 m x 8 m single-room plan at 0.1 m per pixel
fn plan(id: &str, level: i32) -> ImageFeatureSet {
    ImageFeatureSet::floor_plan(id, level, 0.1).with_features(vec![
        Feature::wall(vec![p(0.0, 0.0), p(100.0, 0.0)], 2.0),
        Feature::wall(vec![p(100.0, 0.0), p(100.0, 80.0)], 2.0),
        Feature::wall(vec![p(100.0, 80.0), p(0.0, 80.0)], 2.0),
        Feature::wall(vec![p(0.0, 80.0), p(0.0, 0.0)], 2.0),
        Feature::room(vec![p(0.0, 0.0), p(100.0, 0.0), p(100.0, 80.0), p(0.0, 80.0)]),
    ])
}

fn north_elevation(bands: &[f64], openings: Vec<Feature>) -> ImageFeatureSet {
    let mut features: Vec<Feature> = bands
        .iter()
        .map(|&z| Feature::wall(vec![p(0.0, z), p(1000.0, z)], 5.0))
        .collect();
    features.extend(openings);
    ImageFeatureSet::elevation("north", Orientation::North, 0.01).with_features(features)
}

#[test]
fn plan_without_elevations_degrades_height_and_exports_one_space() {
    let output = generate(&[plan("ground", 0)], &[], &PipelineConfig::default()).unwrap();

    assert!(output
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::HeightInferenceDegraded { .. })));
    assert!(output.schema_violation.is_none());
    assert!(output.model.roof.is_some());
    assert!(output.model.floors[0].walls.iter().all(|w| w.openings.is_empty()));
    assert_eq!(output.gbxml_file.matches("<Space ").count(), 1);
    assert_eq!(output.gbxml_file.matches("surfaceType=\"ExteriorWall\"").count(), 4);
    assert_eq!(output.gbxml_file.matches("surfaceType=\"Roof\"").count(), 1);

    let mesh = parse_obj(&output.model_file).unwrap();
    assert_eq!(mesh.triangle_count(), output.model.mesh.triangle_count());
    assert!(mesh.check_closed().is_ok());
}

#[test]
fn two_floors_take_heights_from_elevation_bands() {
    let output = generate(
        &[plan("ground", 0), plan("first", 1)],
        &[north_elevation(&[0.0, 300.0, 600.0], Vec::new())],
        &PipelineConfig::default(),
    )
    .unwrap();

    let floors = &output.model.floors;
    assert_eq!(floors.len(), 2);
    assert_relative_eq!(floors[0].base, 0.0, epsilon = 1e-9);
    assert_relative_eq!(floors[0].height, 3.0, epsilon = 1e-9);
    assert_relative_eq!(floors[1].base, 3.0, epsilon = 1e-9);
    assert_relative_eq!(floors[1].height, 3.0, epsilon = 1e-9);
    assert!(!output
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::HeightInferenceDegraded { .. })));
    assert!(output.schema_violation.is_none());
    assert_eq!(output.gbxml_file.matches("<BuildingStorey ").count(), 2);
}

#[test]
fn window_past_wall_end_is_deferred_not_dropped() {
    let window = Feature::window(vec![p(900.0, 90.0), p(1050.0, 210.0)]);
    let output = generate(
        &[plan("ground", 0)],
        &[north_elevation(&[0.0, 300.0], vec![window])],
        &PipelineConfig::default(),
    )
    .unwrap();

    let north = &output.model.floors[0].walls[2];
    assert_eq!(north.deferred.len(), 1);
    assert!(output
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::UnmatchedOpening { .. })));
    assert!(!output.gbxml_file.contains("<Opening "));
}

#[test]
fn zero_scale_is_fatal() {
    let mut bad = plan("ground", 0);
    bad.scale_factor = 0.0;
    let err = generate(&[bad], &[], &PipelineConfig::default()).unwrap_err();

    assert!(matches!(
        err,
        ProcessingError::Reconstruction(Error::InvalidScale { ref image_id, .. }) if image_id == "ground"
    ));
}

#[test]
fn repeated_runs_are_byte_identical() {
    let plans = [plan("ground", 0), plan("first", 1)];
    let elevations = [north_elevation(
        &[0.0, 300.0, 600.0],
        vec![Feature::window(vec![p(300.0, 390.0), p(450.0, 510.0)])],
    )];
    let config = PipelineConfig::default();

    let first = generate(&plans, &elevations, &config).unwrap();
    let second = generate(&plans, &elevations, &config).unwrap();

    assert_eq!(first.gbxml_file, second.gbxml_file);
    assert_eq!(first.model_file, second.model_file);
}

#[test]
fn json_input_drives_the_pipeline_and_artifacts_are_written() {
    let json = r#"{
        "image_id": "ground",
        "role": "floorPlan",
        "floor_level": 0,
        "scale_factor": 0.1,
        "features": [
            { "kind": "wall", "points": [{ "x": 0, "y": 0 }, { "x": 100, "y": 0 }], "thickness": 2 },
            { "kind": "wall", "points": [{ "x": 100, "y": 0 }, { "x": 100, "y": 80 }], "thickness": 2 },
            { "kind": "wall", "points": [{ "x": 100, "y": 80 }, { "x": 0, "y": 80 }], "thickness": 2 },
            { "kind": "wall", "points": [{ "x": 0, "y": 80 }, { "x": 0, "y": 0 }], "thickness": 2 },
            { "kind": "room", "points": [
                { "x": 0, "y": 0 }, { "x": 100, "y": 0 }, { "x": 100, "y": 80 }, { "x": 0, "y": 80 }
            ] }
        ]
    }"#;
    let plans = parse_feature_sets(json).unwrap();
    let output = generate(&plans, &[], &PipelineConfig::default()).unwrap();

    let dir = std::env::temp_dir().join(format!("gbxml-lite-pipeline-{}", std::process::id()));
    let artifacts = write_artifacts(&output, &dir).unwrap();

    assert_eq!(std::fs::read_to_string(&artifacts.gbxml_path).unwrap(), output.gbxml_file);
    assert_eq!(std::fs::read_to_string(&artifacts.model_path).unwrap(), output.model_file);
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&artifacts.warnings_path).unwrap()).unwrap();
    assert_eq!(report[0]["type"], "HeightInferenceDegraded");

    std::fs::remove_dir_all(&dir).unwrap();
}
