use std::sync::Arc;

use thiserror::Error;

use crate::core::{
    distance::calculate_bounding_box,
    nearby::{search_nearby, DEFAULT_SEARCH_RADIUS_KM},
    proximity::{ProximityNotifier, DEFAULT_NOTIFY_RADIUS_KM},
    text::{normalize_query, DEFAULT_TEXT_SEARCH_LIMIT},
};
use crate::models::{
    ActivityRecord, BusinessResult, CatalogFilter, Coordinates, FavoriteOutcome, NewBusiness,
    NewUser, NotificationView, User,
};
use crate::services::store::{
    ActivityLogger, BusinessCatalog, BusinessWriter, DiscoveryStore, FavoritesStore,
    NotificationStore, RegistrationTx, StoreError, UserDirectory,
};
use crate::services::{CacheKey, CacheManager};

/// Errors surfaced by discovery operations
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DiscoveryError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict { entity, key } => {
                DiscoveryError::Conflict(format!("{} already exists: {}", entity, key))
            }
            StoreError::NotFound { entity, key } => DiscoveryError::NotFound { entity, key },
            other => DiscoveryError::Store(other),
        }
    }
}

impl From<validator::ValidationErrors> for DiscoveryError {
    fn from(value: validator::ValidationErrors) -> Self {
        DiscoveryError::Validation(value.to_string())
    }
}

/// Tunables for the discovery operations
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryOptions {
    pub notify_radius_km: f64,
    pub default_search_radius_km: f64,
    pub text_search_limit: usize,
    pub notification_list_limit: usize,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            notify_radius_km: DEFAULT_NOTIFY_RADIUS_KM,
            default_search_radius_km: DEFAULT_SEARCH_RADIUS_KM,
            text_search_limit: DEFAULT_TEXT_SEARCH_LIMIT,
            notification_list_limit: 50,
        }
    }
}

/// Nearby search parameters
#[derive(Debug, Clone, Default)]
pub struct NearbyQuery {
    pub origin: Option<Coordinates>,
    /// Falls back to the configured default radius
    pub radius_km: Option<f64>,
    pub business_type: Option<String>,
}

/// Result of a business registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationOutcome {
    pub business_id: i64,
    pub notifications_created: usize,
}

/// Discovery orchestrator
///
/// Owns the proximity notifier and runs every operation against the injected
/// store. Cheap to clone.
///
/// Text search results may be cached. Verification changes must go through
/// [`DiscoveryService::set_verified`] so the cached results are dropped.
#[derive(Clone)]
pub struct DiscoveryService {
    store: Arc<dyn DiscoveryStore>,
    notifier: ProximityNotifier,
    options: DiscoveryOptions,
    search_cache: Option<Arc<CacheManager>>,
}

impl DiscoveryService {
    pub fn new(store: Arc<dyn DiscoveryStore>, options: DiscoveryOptions) -> Self {
        Self {
            store,
            notifier: ProximityNotifier::new(options.notify_radius_km),
            options,
            search_cache: None,
        }
    }

    /// Cache text search results in `cache`
    pub fn with_search_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.search_cache = Some(cache);
        self
    }

    pub fn with_default_options(store: Arc<dyn DiscoveryStore>) -> Self {
        Self::new(store, DiscoveryOptions::default())
    }

    pub fn options(&self) -> &DiscoveryOptions {
        &self.options
    }

    pub fn store(&self) -> &Arc<dyn DiscoveryStore> {
        &self.store
    }

    /// Register a business and notify nearby users
    ///
    /// Business, services and notifications are written in one transaction.
    /// Any failure leaves no trace of the registration.
    pub async fn register_business(&self, business: NewBusiness) -> Result<RegistrationOutcome, DiscoveryError> {
        let mut tx = self.store.begin().await?;

        let business_id = tx.insert_business(&business).await?;
        for service in &business.services {
            tx.insert_service(business_id, service).await?;
        }

        let notifications_created = self
            .notifier
            .notify_nearby(&mut *tx, business_id, &business.business_name, business.location)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Registered business {} ({}) with {} services, {} nearby users notified",
            business_id,
            business.business_name,
            business.services.len(),
            notifications_created
        );

        Ok(RegistrationOutcome {
            business_id,
            notifications_created,
        })
    }

    /// Verified businesses around an optional location
    pub async fn find_nearby(&self, query: NearbyQuery) -> Result<Vec<BusinessResult>, DiscoveryError> {
        let radius_km = query.radius_km.unwrap_or(self.options.default_search_radius_km);
        if !(radius_km >= 0.0) {
            return Err(DiscoveryError::Validation(format!(
                "radius must be a non-negative number of kilometers, got {}",
                radius_km
            )));
        }

        let filter = CatalogFilter {
            business_type: query
                .business_type
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            area: query
                .origin
                .map(|o| calculate_bounding_box(o.latitude, o.longitude, radius_km)),
        };

        let candidates = self.store.verified_businesses(&filter).await?;
        let total_candidates = candidates.len();
        let results = search_nearby(candidates, query.origin, radius_km);

        tracing::debug!(
            "Nearby search returned {} of {} candidates (radius {}km, located: {})",
            results.len(),
            total_candidates,
            radius_km,
            query.origin.is_some()
        );

        Ok(results)
    }

    /// Substring search over verified businesses
    pub async fn find_by_text(&self, query: &str) -> Result<Vec<BusinessResult>, DiscoveryError> {
        let Some(needle) = normalize_query(query) else {
            return Ok(Vec::new());
        };

        let key = CacheKey::text_search(needle);
        if let Some(cache) = &self.search_cache {
            if let Ok(cached) = cache.get::<Vec<BusinessResult>>(&key).await {
                return Ok(cached);
            }
        }

        let limit = self.options.text_search_limit;
        let mut results = self.store.search_verified(needle, limit).await?;
        results.retain(|r| r.business.verified);
        results.truncate(limit);
        for result in &mut results {
            result.distance = None;
        }

        if let Some(cache) = &self.search_cache {
            if let Err(e) = cache.set(&key, &results).await {
                tracing::warn!("Failed to cache search results: {}", e);
            }
        }

        Ok(results)
    }

    /// Change a business's verified flag
    ///
    /// Cached search results are dropped so the change is visible to the
    /// next search.
    pub async fn set_verified(&self, business_id: i64, verified: bool) -> Result<(), DiscoveryError> {
        if !self.store.set_verified(business_id, verified).await? {
            return Err(not_found("Business", business_id));
        }
        self.clear_search_cache().await;

        tracing::info!("Business {} verified: {}", business_id, verified);
        Ok(())
    }

    /// Drop every cached text search result
    pub async fn clear_search_cache(&self) {
        if let Some(cache) = &self.search_cache {
            if let Err(e) = cache.invalidate_pattern(CacheKey::TEXT_SEARCH_PATTERN).await {
                tracing::warn!("Failed to invalidate cached search results: {}", e);
            }
        }
    }

    pub async fn business(&self, business_id: i64) -> Result<BusinessResult, DiscoveryError> {
        self.store
            .business_by_id(business_id)
            .await?
            .ok_or_else(|| not_found("Business", business_id))
    }

    pub async fn register_user(&self, user: NewUser) -> Result<User, DiscoveryError> {
        let user = self.store.create_user(&user).await?;
        tracing::info!("Registered user {} (located: {})", user.id, user.location().is_some());
        Ok(user)
    }

    /// Refresh a user's stored location, as done on login
    pub async fn refresh_location(&self, user_id: i64, location: Coordinates) -> Result<(), DiscoveryError> {
        if !self.store.update_user_location(user_id, location).await? {
            return Err(not_found("User", user_id));
        }
        Ok(())
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<(), DiscoveryError> {
        if !self.store.delete_user(user_id).await? {
            return Err(not_found("User", user_id));
        }
        tracing::info!("Deleted user {} and related records", user_id);
        Ok(())
    }

    pub async fn add_favorite(&self, user_id: i64, business_id: i64) -> Result<FavoriteOutcome, DiscoveryError> {
        Ok(self.store.add_favorite(user_id, business_id).await?)
    }

    /// Removing a missing bookmark is a no-op
    pub async fn remove_favorite(&self, user_id: i64, business_id: i64) -> Result<(), DiscoveryError> {
        let removed = self.store.remove_favorite(user_id, business_id).await?;
        tracing::debug!("Favorite {} -> {} removed: {}", user_id, business_id, removed);
        Ok(())
    }

    pub async fn favorites(&self, user_id: i64) -> Result<Vec<BusinessResult>, DiscoveryError> {
        Ok(self.store.list_favorites(user_id).await?)
    }

    pub async fn notifications(&self, user_id: i64) -> Result<Vec<NotificationView>, DiscoveryError> {
        Ok(self
            .store
            .notifications_for(user_id, self.options.notification_list_limit)
            .await?)
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<i64, DiscoveryError> {
        Ok(self.store.unread_count(user_id).await?)
    }

    pub async fn mark_read(&self, notification_id: i64) -> Result<(), DiscoveryError> {
        if !self.store.mark_read(notification_id).await? {
            return Err(not_found("Notification", notification_id));
        }
        Ok(())
    }

    pub async fn record_activity(&self, record: ActivityRecord) -> Result<(), DiscoveryError> {
        Ok(self.store.log_activity(&record).await?)
    }

    /// Record activity without failing the caller
    pub async fn record_activity_quietly(&self, record: ActivityRecord) {
        let action = record.action.clone();
        if let Err(e) = self.store.log_activity(&record).await {
            tracing::warn!("Failed to record '{}' activity for {}: {}", action, record.email, e);
        }
    }
}

fn not_found(entity: &'static str, id: i64) -> DiscoveryError {
    DiscoveryError::NotFound {
        entity,
        key: id.to_string(),
    }
}
