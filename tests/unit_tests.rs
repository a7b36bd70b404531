// Unit tests for Bloom discovery

use bloom_discovery::core::{
    distance::{calculate_bounding_box, haversine_distance, is_within_bounding_box},
    nearby::search_nearby,
    proximity::notification_message,
    text::{matches_text, normalize_query},
};
use bloom_discovery::models::{Business, BusinessResult, Coordinates};
use chrono::Utc;

fn business(id: i64, lat: f64, lon: f64, verified: bool) -> BusinessResult {
    BusinessResult::new(
        Business {
            id,
            business_name: format!("Business {}", id),
            owner_name: "Owner".to_string(),
            email: format!("owner{}@example.com", id),
            phone: "(416) 555-0000".to_string(),
            business_type: "Salon".to_string(),
            address: "1 Main St".to_string(),
            latitude: lat,
            longitude: lon,
            website: None,
            verified,
            created_at: Utc::now(),
        },
        vec![],
    )
}

#[test]
fn test_haversine_distance_zero() {
    assert_eq!(haversine_distance(43.6532, -79.3832, 43.6532, -79.3832), 0.0);
}

#[test]
fn test_haversine_distance_toronto_to_montreal() {
    let distance = haversine_distance(43.6532, -79.3832, 45.5017, -73.5673);
    assert!(distance > 503.0 && distance < 505.0, "got {}", distance);
}

#[test]
fn test_haversine_distance_is_symmetric() {
    let pairs = [
        ((43.6532, -79.3832), (49.2827, -123.1207)),
        ((-33.8688, 151.2093), (51.5074, -0.1278)),
        ((0.0, 179.9), (0.0, -179.9)),
    ];

    for ((lat1, lon1), (lat2, lon2)) in pairs {
        assert_eq!(
            haversine_distance(lat1, lon1, lat2, lon2),
            haversine_distance(lat2, lon2, lat1, lon1)
        );
    }
}

#[test]
fn test_haversine_distance_rounded_to_two_decimals() {
    let distance = haversine_distance(43.6532, -79.3832, 43.6708, -79.3899);
    assert_eq!((distance * 100.0).round() / 100.0, distance);
}

#[test]
fn test_haversine_distance_across_antimeridian() {
    // ~22km apart across the dateline, not ~40000km
    let distance = haversine_distance(0.0, 179.9, 0.0, -179.9);
    assert!(distance > 22.0 && distance < 23.0, "got {}", distance);
}

#[test]
fn test_haversine_distance_near_poles_is_finite() {
    let distance = haversine_distance(89.99, 0.0, -89.99, 180.0);
    assert!(distance.is_finite());
    assert!(distance <= 20015.09);
}

#[test]
fn test_bounding_box_creation() {
    let bbox = calculate_bounding_box(43.6532, -79.3832, 10.0);

    assert!(bbox.min_lat < 43.6532);
    assert!(bbox.max_lat > 43.6532);
    assert!(bbox.min_lon < -79.3832);
    assert!(bbox.max_lon > -79.3832);

    // Roughly 0.18 degrees of latitude (10km / 111km per degree)
    let lat_span = bbox.max_lat - bbox.min_lat;
    assert!((lat_span - 0.18).abs() < 0.02);
}

#[test]
fn test_point_within_bbox() {
    let bbox = calculate_bounding_box(43.6532, -79.3832, 10.0);

    assert!(is_within_bounding_box(43.6532, -79.3832, &bbox));
    assert!(is_within_bounding_box(43.6708, -79.3899, &bbox));
    // Ottawa is far outside
    assert!(!is_within_bounding_box(45.4215, -75.6972, &bbox));
    assert!(!is_within_bounding_box(bbox.max_lat + 0.01, -79.3832, &bbox));
}

#[test]
fn test_nearby_results_within_radius_and_sorted() {
    let origin = Coordinates::new(45.5017, -73.5673);
    let candidates = vec![
        business(1, 45.5234, -73.5800, true),
        business(2, 45.5017, -73.5673, true),
        business(3, 43.6532, -79.3832, true),
        business(4, 45.5100, -73.5700, false),
    ];

    let results = search_nearby(candidates, Some(origin), 50.0);

    assert_eq!(results.len(), 2);
    let distances: Vec<f64> = results.iter().map(|r| r.distance.unwrap()).collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    assert!(distances.iter().all(|d| *d <= 50.0));
    assert!(results.iter().all(|r| r.business.verified));
}

#[test]
fn test_nearby_radius_boundary_is_inclusive() {
    let origin = Coordinates::new(43.6532, -79.3832);
    let target = business(1, 43.6708, -79.3899, true);
    let exact = haversine_distance(43.6532, -79.3832, 43.6708, -79.3899);

    let results = search_nearby(vec![target], Some(origin), exact);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].distance, Some(exact));
}

#[test]
fn test_nearby_zero_radius_keeps_colocated_only() {
    let origin = Coordinates::new(43.6532, -79.3832);
    let candidates = vec![business(1, 43.6532, -79.3832, true), business(2, 43.6708, -79.3899, true)];

    let results = search_nearby(candidates, Some(origin), 0.0);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].business.id, 1);
}

#[test]
fn test_notification_message_format() {
    assert_eq!(
        notification_message("Queen Street Salon", 1.0),
        "Queen Street Salon just registered 1.00km away from you!"
    );
    assert_eq!(
        notification_message("Yorkville Beauty", 2.03),
        "Yorkville Beauty just registered 2.03km away from you!"
    );
}

#[test]
fn test_text_matching() {
    let spa = business(1, 43.6532, -79.3832, true);
    assert_eq!(normalize_query("  salon  "), Some("salon"));
    assert!(matches_text(&spa.business, "SALON"));
    assert!(matches_text(&spa.business, "main st"));
    assert!(!matches_text(&spa.business, "nails"));
}
