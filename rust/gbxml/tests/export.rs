// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use gbxml_lite_gbxml::{export, GbxmlConfig, OutputUnit, SurfaceType};
use gbxml_lite_reconstruct::{
    reconstruct, Feature, ImageFeatureSet, Orientation, Point2D, ReconstructionConfig,
};

fn p(x: f64, y: f64) -> Point2D {
    Point2D::new(x, y)
}

fn plan(id: &str, level: i32) -> ImageFeatureSet {
    ImageFeatureSet::floor_plan(id, level, 0.01).with_features(vec![
        Feature::wall(vec![p(0.0, 0.0), p(1000.0, 0.0)], 20.0),
        Feature::wall(vec![p(1000.0, 0.0), p(1000.0, 800.0)], 20.0),
        Feature::wall(vec![p(1000.0, 800.0), p(0.0, 800.0)], 20.0),
        Feature::wall(vec![p(0.0, 800.0), p(0.0, 0.0)], 20.0),
        Feature::room(vec![p(0.0, 0.0), p(1000.0, 0.0), p(1000.0, 800.0), p(0.0, 800.0)]),
    ])
}

#[test]
fn single_room_building_maps_to_one_space_and_four_exterior_walls() {
    let built = reconstruct(&[plan("ground", 0)], &[], &ReconstructionConfig::default()).unwrap();
    let exported = export(&built.model, &GbxmlConfig::default());

    assert_eq!(exported.violation, None);
    assert_eq!(exported.document.campus.building.spaces.len(), 1);
    assert_eq!(
        exported
            .document
            .surfaces_of_type(SurfaceType::ExteriorWall)
            .count(),
        4
    );
    assert_eq!(
        exported
            .document
            .surfaces_of_type(SurfaceType::SlabOnGrade)
            .count(),
        1
    );
    assert_eq!(exported.document.surfaces_of_type(SurfaceType::Roof).count(), 1);

    let xml = &exported.xml;
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<gbXML xmlns=\"http://www.gbxml.org/schema\" version=\"6.01\""));
    assert!(xml.contains("<Space id=\"space-f0-ground-4\" buildingStoreyIdRef=\"storey-f0\">"));
    assert!(xml.contains("<Area>80.000000</Area>"));
    assert!(xml.contains("<Volume>240.000000</Volume>"));
    assert!(!xml.contains("-0.000000"));
}

#[test]
fn two_storey_export_is_valid_and_stable() {
    let elevation = ImageFeatureSet::elevation("north", Orientation::North, 0.01).with_features(vec![
        Feature::wall(vec![p(0.0, 0.0), p(1000.0, 0.0)], 5.0),
        Feature::wall(vec![p(0.0, 300.0), p(1000.0, 300.0)], 5.0),
        Feature::wall(vec![p(0.0, 600.0), p(1000.0, 600.0)], 5.0),
        Feature::window(vec![p(300.0, 90.0), p(450.0, 210.0)]),
        Feature::door(vec![p(600.0, 300.0), p(700.0, 510.0)], Default::default()),
    ]);
    let plans = [plan("ground", 0), plan("first", 1)];
    let config = GbxmlConfig {
        unit: OutputUnit::Feet,
        ..Default::default()
    };

    let first = reconstruct(&plans, &[elevation.clone()], &ReconstructionConfig::default()).unwrap();
    let second = reconstruct(&plans, &[elevation], &ReconstructionConfig::default()).unwrap();
    let a = export(&first.model, &config);
    let b = export(&second.model, &config);

    assert_eq!(a.violation, None);
    assert_eq!(a.xml, b.xml);
    assert!(a.xml.contains("lengthUnit=\"Feet\""));
    assert_eq!(a.document.campus.building.spaces.len(), 2);
    assert_eq!(a.document.surfaces_of_type(SurfaceType::Ceiling).count(), 1);
    assert!(a.xml.contains("openingType=\"FixedWindow\" windowTypeIdRef=\"windowtype-default\""));
    assert!(a.xml.contains("openingType=\"NonSlidingDoor\""));
}
