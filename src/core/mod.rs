// Core algorithm exports
pub mod discovery;
pub mod distance;
pub mod nearby;
pub mod proximity;
pub mod text;

pub use discovery::{DiscoveryError, DiscoveryOptions, DiscoveryService, NearbyQuery, RegistrationOutcome};
pub use distance::{haversine_distance, calculate_bounding_box, is_within_bounding_box};
pub use nearby::search_nearby;
pub use proximity::ProximityNotifier;
