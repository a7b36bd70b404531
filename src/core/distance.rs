use std::f64::consts::{FRAC_PI_2, PI};

use crate::models::{BoundingBox, Coordinates};

/// Earth's radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Widening applied to bounding boxes so that points whose distance rounds
/// down onto the radius are still inside.
const ROUNDING_SLACK_KM: f64 = 0.01;

/// Calculate the Haversine distance between two points in kilometers
///
/// The result is rounded to two decimals. Every radius comparison in the
/// crate uses this rounded value so that what users see and what gets
/// filtered agree.
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    round_km(great_circle_km(lat1, lon1, lat2, lon2))
}

/// Unrounded great-circle distance in kilometers
#[inline]
pub fn great_circle_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Near-antipodal inputs can overshoot 1.0 by an ulp
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance between two coordinate pairs, rounded like [`haversine_distance`]
#[inline]
pub fn distance_between(from: Coordinates, to: Coordinates) -> f64 {
    haversine_distance(from.latitude, from.longitude, to.latitude, to.longitude)
}

#[inline]
pub fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

/// Calculate a bounding box around a center point
///
/// Used as a cheap pre-filter before Haversine. The box is exact for a
/// spherical cap (it never excludes a point within `radius_km`), collapses to
/// the full longitude range when the cap reaches a pole, and wraps when it
/// crosses the antimeridian.
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    let angular = (radius_km.max(0.0) + ROUNDING_SLACK_KM) / EARTH_RADIUS_KM;
    if angular >= PI {
        return BoundingBox::WORLD;
    }

    let lat_rad = lat.to_radians();
    let min_lat = lat_rad - angular;
    let max_lat = lat_rad + angular;

    if min_lat <= -FRAC_PI_2 || max_lat >= FRAC_PI_2 {
        return BoundingBox {
            min_lat: if min_lat <= -FRAC_PI_2 { -90.0 } else { min_lat.to_degrees() },
            max_lat: if max_lat >= FRAC_PI_2 { 90.0 } else { max_lat.to_degrees() },
            min_lon: -180.0,
            max_lon: 180.0,
        };
    }

    // |lat| + angular < 90°, so the asin argument stays below 1
    let delta_lon = (angular.sin() / lat_rad.cos()).asin().to_degrees();
    let mut min_lon = lon - delta_lon;
    let mut max_lon = lon + delta_lon;
    if min_lon < -180.0 {
        min_lon += 360.0;
    }
    if max_lon > 180.0 {
        max_lon -= 360.0;
    }

    BoundingBox {
        min_lat: min_lat.to_degrees(),
        max_lat: max_lat.to_degrees(),
        min_lon,
        max_lon,
    }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    if lat < bbox.min_lat || lat > bbox.max_lat {
        return false;
    }

    let within_lon = |lon: f64| {
        if bbox.crosses_antimeridian() {
            lon >= bbox.min_lon || lon <= bbox.max_lon
        } else {
            lon >= bbox.min_lon && lon <= bbox.max_lon
        }
    };

    // -180 and 180 are the same meridian
    within_lon(lon) || (lon.abs() == 180.0 && within_lon(-lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // Distance from London to Paris (approximately 344 km)
        let distance = haversine_distance(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((distance - 344.0).abs() < 10.0, "Distance should be ~344km, got {}", distance);
    }

    #[test]
    fn test_rounded_to_two_decimals() {
        let distance = haversine_distance(43.6532, -79.3832, 43.6487, -79.3962);
        assert_eq!(distance, (distance * 100.0).round() / 100.0);
    }

    #[test]
    fn test_antipodes_are_finite() {
        let distance = haversine_distance(0.0, 0.0, 0.0, 180.0);
        assert!(distance.is_finite());
        assert!(distance <= 20015.09, "got {}", distance);
        assert!(distance > 20015.0, "got {}", distance);
    }

    #[test]
    fn test_bounding_box() {
        let bbox = calculate_bounding_box(40.7128, -74.0060, 10.0);

        assert!(bbox.min_lat < 40.7128);
        assert!(bbox.max_lat > 40.7128);
        assert!(bbox.min_lon < -74.0060);
        assert!(bbox.max_lon > -74.0060);

        // 20km / ~111km per degree
        let lat_span = bbox.max_lat - bbox.min_lat;
        assert!((lat_span - 0.18).abs() < 0.02, "Lat span should be ~0.18 degrees");
    }

    #[test]
    fn test_point_within_bbox() {
        let bbox = calculate_bounding_box(40.7128, -74.0060, 10.0);

        assert!(is_within_bounding_box(40.7128, -74.0060, &bbox));
        assert!(is_within_bounding_box(40.71, -74.0, &bbox));
        assert!(!is_within_bounding_box(50.0, -80.0, &bbox));
    }

    #[test]
    fn test_bbox_wraps_antimeridian() {
        let bbox = calculate_bounding_box(-17.7, 179.95, 25.0);

        assert!(bbox.crosses_antimeridian());
        assert!(is_within_bounding_box(-17.7, -179.95, &bbox));
        assert!(is_within_bounding_box(-17.7, 180.0, &bbox));
        assert!(!is_within_bounding_box(-17.7, 0.0, &bbox));
    }

    #[test]
    fn test_bbox_edge_on_antimeridian() {
        let east = BoundingBox {
            min_lat: -18.0,
            max_lat: -17.0,
            min_lon: 179.5,
            max_lon: 180.0,
        };
        assert!(is_within_bounding_box(-17.5, 180.0, &east));
        assert!(is_within_bounding_box(-17.5, -180.0, &east));
        assert!(!is_within_bounding_box(-17.5, -179.9, &east));

        let west = BoundingBox {
            min_lat: -18.0,
            max_lat: -17.0,
            min_lon: -180.0,
            max_lon: -179.5,
        };
        assert!(is_within_bounding_box(-17.5, 180.0, &west));
        assert!(!is_within_bounding_box(-17.5, 179.9, &west));
    }

    #[test]
    fn test_bbox_covers_pole() {
        let bbox = calculate_bounding_box(89.95, 10.0, 20.0);

        assert_eq!(bbox.max_lat, 90.0);
        assert_eq!(bbox.min_lon, -180.0);
        assert_eq!(bbox.max_lon, 180.0);
        assert!(is_within_bounding_box(89.95, -170.0, &bbox));
    }

    #[test]
    fn test_bbox_never_drops_in_radius_points() {
        let (lat, lon) = (60.0, 25.0);
        let radius = 50.0;
        let bbox = calculate_bounding_box(lat, lon, radius);

        for step in 0..=400 {
            for lon_step in 0..=400 {
                let p_lat = lat - 1.0 + step as f64 * 0.005;
                let p_lon = lon - 2.0 + lon_step as f64 * 0.01;
                if haversine_distance(lat, lon, p_lat, p_lon) <= radius {
                    assert!(
                        is_within_bounding_box(p_lat, p_lon, &bbox),
                        "({}, {}) within radius but outside box",
                        p_lat,
                        p_lon
                    );
                }
            }
        }
    }
}
