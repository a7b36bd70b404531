use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Build a location from nullable columns. Both halves must be present.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Self { latitude, longitude }),
            _ => None,
        }
    }
}

/// Registered end user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn location(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }
}

/// User row reduced to what proximity matching needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatedUser {
    pub id: i64,
    pub location: Coordinates,
}

/// Registered business
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Business {
    pub id: i64,
    pub business_name: String,
    pub owner_name: String,
    pub email: String,
    pub phone: String,
    pub business_type: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub website: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Business {
    pub fn location(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// A service offered by a business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub price: f64,
}

/// Business as returned by discovery surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessResult {
    #[serde(flatten)]
    pub business: Business,
    pub services: Vec<Service>,
    pub distance: Option<f64>,
}

impl BusinessResult {
    pub fn new(business: Business, services: Vec<Service>) -> Self {
        Self {
            business,
            services,
            distance: None,
        }
    }
}

/// Notification created by the proximity fan-out
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub business_id: i64,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification joined with the business it points at
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationView {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub notification: Notification,
    pub business_name: String,
    pub business_type: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: i64,
    pub business_id: i64,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub location: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBusiness {
    pub business_name: String,
    pub owner_name: String,
    pub email: String,
    pub phone: String,
    pub business_type: String,
    pub address: String,
    pub location: Coordinates,
    pub website: Option<String>,
    pub services: Vec<Service>,
}

/// Outcome of adding a bookmark. Both variants are a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteOutcome {
    Added,
    AlreadyPresent,
}

impl FavoriteOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            FavoriteOutcome::Added => "Added to favorites",
            FavoriteOutcome::AlreadyPresent => "Already in favorites",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    User,
    Business,
}

impl ActorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorType::User => "user",
            ActorType::Business => "business",
        }
    }
}

/// Append-only audit entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub actor_id: Option<i64>,
    pub actor_type: ActorType,
    pub email: String,
    pub ip_address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityRecord {
    pub fn new(
        actor_id: Option<i64>,
        actor_type: ActorType,
        email: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            actor_id,
            actor_type,
            email: email.into(),
            ip_address: None,
            latitude: None,
            longitude: None,
            action: action.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_ip(mut self, ip_address: Option<String>) -> Self {
        self.ip_address = ip_address;
        self
    }

    pub fn with_location(mut self, location: Option<Coordinates>) -> Self {
        self.latitude = location.map(|l| l.latitude);
        self.longitude = location.map(|l| l.longitude);
        self
    }
}

/// Geospatial bounding box
///
/// When `min_lon > max_lon` the box wraps across the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub const WORLD: BoundingBox = BoundingBox {
        min_lat: -90.0,
        max_lat: 90.0,
        min_lon: -180.0,
        max_lon: 180.0,
    };

    pub fn crosses_antimeridian(&self) -> bool {
        self.min_lon > self.max_lon
    }
}

/// Candidate filter for catalog reads
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    /// Exact business type match
    pub business_type: Option<String>,
    /// Optional pre-filter area; stores may ignore it
    pub area: Option<BoundingBox>,
}
