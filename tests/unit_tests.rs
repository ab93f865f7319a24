// Unit tests for Warehouse Finder

use serde_json::json;
use std::collections::BTreeSet;
use warehouse_finder::core::{
    audit::{audit, FilterSchema},
    distance::{haversine, passes_prefilter},
    tier::tier_rank,
};
use warehouse_finder::models::Coordinate;

#[test]
fn test_haversine_distance_zero() {
    let points = [
        Coordinate::new(40.7128, -74.0060),
        Coordinate::new(-33.8688, 151.2093),
        Coordinate::new(0.0, 0.0),
        Coordinate::new(89.9, 179.9),
    ];
    for p in points {
        assert_eq!(haversine(p, p), 0.0);
    }
}

#[test]
fn test_haversine_symmetric() {
    let a = Coordinate::new(40.7580, -73.9855);
    let b = Coordinate::new(40.6782, -73.9442);
    let c = Coordinate::new(51.5074, -0.1278);

    assert_eq!(haversine(a, b), haversine(b, a));
    assert_eq!(haversine(a, c), haversine(c, a));
}

#[test]
fn test_haversine_los_angeles_to_new_york() {
    let la = Coordinate::new(34.0522, -118.2437);
    let nyc = Coordinate::new(40.7128, -74.0060);

    let distance = haversine(la, nyc);
    assert!(distance >= 2400.0 && distance <= 2500.0, "got {}", distance);
}

#[test]
fn test_haversine_manhattan_to_brooklyn() {
    // Midtown to downtown Brooklyn is roughly 5-6 miles
    let manhattan = Coordinate::new(40.7580, -73.9855);
    let brooklyn = Coordinate::new(40.6782, -73.9442);

    let distance = haversine(manhattan, brooklyn);
    assert!(distance > 3.0 && distance < 9.0);
}

#[test]
fn test_prefilter_boundary_inclusive() {
    let origin = Coordinate::new(40.7128, -74.0060);
    let dest = Coordinate::new(40.7357, -74.1724);
    let straight = haversine(origin, dest);

    assert!(passes_prefilter(origin, dest, straight / 2.0, 2.0));
    assert!(!passes_prefilter(origin, dest, straight / 2.0 - 0.01, 2.0));
}

#[test]
fn test_tier_mapping() {
    assert_eq!(tier_rank(Some("Gold")), 0);
    assert_eq!(tier_rank(Some("gold ")), 0);
    assert_eq!(tier_rank(Some("Silver")), 1);
    assert_eq!(tier_rank(Some("Bronze")), 2);
    assert_eq!(tier_rank(None), 99);
    assert_eq!(tier_rank(Some("")), 99);
    assert_eq!(tier_rank(Some("Platinum")), 99);
}

#[test]
fn test_completeness_audit() {
    let schema = FilterSchema::new(1, ["City", "Zip", "Status", "Tier"]);
    let fields = json!({ "City": "X", "Zip": null, "Status": "" });

    let missing = audit(fields.as_object().unwrap(), &schema);

    let expected: BTreeSet<String> = ["Zip", "Status", "Tier"].into_iter().map(String::from).collect();
    assert_eq!(missing, expected);
}

#[test]
fn test_audit_complete_record() {
    let schema = FilterSchema::new(1, ["City", "State", "Zip", "Status"]);
    let fields = json!({ "City": "Test City", "State": "CA", "Zip": 90210, "Status": ["Active"] });

    assert!(audit(fields.as_object().unwrap(), &schema).is_empty());
}
