//! Store seams used by the discovery core.
//!
//! The core never talks to a database directly. Everything it reads or writes
//! goes through these traits so that the registration fan-out can run inside
//! one transaction and the user scan can be swapped for a spatial index.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    ActivityRecord, BusinessResult, CatalogFilter, Coordinates, FavoriteOutcome, LocatedUser,
    NewBusiness, NewNotification, NewUser, NotificationView, Service, User,
};

/// Errors raised by store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("{entity} already exists: {key}")]
    Conflict { entity: &'static str, key: String },

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Finds located users around a point.
///
/// Implementations may return a superset of the users actually in range but
/// must never leave out a user whose rounded distance is within `radius_km`.
/// Users without a stored location are never returned.
#[async_trait]
pub trait ProximityIndex: Send {
    async fn located_users_near(
        &mut self,
        origin: Coordinates,
        radius_km: f64,
    ) -> Result<Vec<LocatedUser>, StoreError>;
}

#[async_trait]
pub trait NotificationWriter: Send {
    async fn insert_notification(&mut self, notification: &NewNotification) -> Result<i64, StoreError>;
}

#[async_trait]
pub trait BusinessWriter: Send {
    /// Insert an unverified business and return its id
    async fn insert_business(&mut self, business: &NewBusiness) -> Result<i64, StoreError>;

    async fn insert_service(&mut self, business_id: i64, service: &Service) -> Result<(), StoreError>;

    /// Flag a business written in this transaction as verified
    async fn mark_verified(&mut self, business_id: i64) -> Result<(), StoreError>;
}

/// Write side of a business registration.
///
/// Dropping the transaction without calling [`RegistrationTx::commit`] rolls
/// back every write made through it.
#[async_trait]
pub trait RegistrationTx: BusinessWriter + ProximityIndex + NotificationWriter {
    async fn commit(&mut self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait BusinessCatalog: Send + Sync {
    /// Verified businesses with their services, in store order
    async fn verified_businesses(&self, filter: &CatalogFilter) -> Result<Vec<BusinessResult>, StoreError>;

    /// Verified businesses whose name, address or type contains `needle`, ignoring case
    async fn search_verified(&self, needle: &str, limit: usize) -> Result<Vec<BusinessResult>, StoreError>;

    /// Direct lookup, verified or not
    async fn business_by_id(&self, business_id: i64) -> Result<Option<BusinessResult>, StoreError>;

    async fn business_count(&self) -> Result<i64, StoreError>;

    /// Moderation hook. Returns false when the business does not exist.
    async fn set_verified(&self, business_id: i64, verified: bool) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError>;

    async fn user_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError>;

    async fn update_user_location(&self, user_id: i64, location: Coordinates) -> Result<bool, StoreError>;

    /// Delete a user together with their favorites, notifications and activity
    async fn delete_user(&self, user_id: i64) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait FavoritesStore: Send + Sync {
    async fn add_favorite(&self, user_id: i64, business_id: i64) -> Result<FavoriteOutcome, StoreError>;

    /// Returns false when the pair did not exist
    async fn remove_favorite(&self, user_id: i64, business_id: i64) -> Result<bool, StoreError>;

    async fn list_favorites(&self, user_id: i64) -> Result<Vec<BusinessResult>, StoreError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Newest first
    async fn notifications_for(&self, user_id: i64, limit: usize) -> Result<Vec<NotificationView>, StoreError>;

    async fn unread_count(&self, user_id: i64) -> Result<i64, StoreError>;

    /// Returns false when the notification does not exist
    async fn mark_read(&self, notification_id: i64) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait ActivityLogger: Send + Sync {
    async fn log_activity(&self, record: &ActivityRecord) -> Result<(), StoreError>;
}

/// Everything the discovery core needs from persistence
#[async_trait]
pub trait DiscoveryStore:
    BusinessCatalog + UserDirectory + FavoritesStore + NotificationStore + ActivityLogger
{
    async fn begin(&self) -> Result<Box<dyn RegistrationTx>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}
