use std::cmp::Ordering;

use crate::core::distance::distance_between;
use crate::models::{BusinessResult, Coordinates};

/// Default search radius in kilometers
pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 50.0;

/// Rank candidate businesses around a user location
///
/// # Pipeline
/// 1. Drop unverified businesses
/// 2. Without an origin: return the rest in store order with no distance
/// 3. With an origin: annotate the rounded distance, drop anything beyond
///    `radius_km`, then sort ascending (stable, so ties keep store order)
pub fn search_nearby(
    candidates: Vec<BusinessResult>,
    origin: Option<Coordinates>,
    radius_km: f64,
) -> Vec<BusinessResult> {
    let verified = candidates.into_iter().filter(|c| c.business.verified);

    let Some(origin) = origin else {
        return verified
            .map(|mut c| {
                c.distance = None;
                c
            })
            .collect();
    };

    let mut results: Vec<BusinessResult> = verified
        .filter_map(|mut c| {
            let distance = distance_between(origin, c.business.location());
            if distance <= radius_km {
                c.distance = Some(distance);
                Some(c)
            } else {
                None
            }
        })
        .collect();

    results.sort_by(|a, b| compare_distance(a.distance, b.distance));
    results
}

/// Unset distances sort last
#[inline]
fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    a.unwrap_or(f64::INFINITY).total_cmp(&b.unwrap_or(f64::INFINITY))
}
