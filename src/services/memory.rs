use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::core::distance::{calculate_bounding_box, is_within_bounding_box};
use crate::core::text::matches_text;
use crate::models::{
    ActivityRecord, ActorType, Business, BusinessResult, CatalogFilter, Coordinates,
    FavoriteOutcome, LocatedUser, NewBusiness, NewNotification, NewUser, Notification,
    NotificationView, Service, User,
};
use crate::services::store::{
    ActivityLogger, BusinessCatalog, BusinessWriter, DiscoveryStore, FavoritesStore,
    NotificationStore, NotificationWriter, ProximityIndex, RegistrationTx, StoreError,
    UserDirectory,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: Vec<User>,
    businesses: Vec<Business>,
    services: Vec<(i64, Service)>,
    notifications: Vec<Notification>,
    favorites: Vec<(i64, i64)>,
    activity: Vec<ActivityRecord>,
    last_user_id: i64,
    last_business_id: i64,
    last_notification_id: i64,
}

impl MemoryState {
    fn services_for(&self, business_id: i64) -> Vec<Service> {
        self.services
            .iter()
            .filter(|(owner, _)| *owner == business_id)
            .map(|(_, service)| service.clone())
            .collect()
    }

    fn result_for(&self, business: &Business) -> BusinessResult {
        BusinessResult::new(business.clone(), self.services_for(business.id))
    }

    fn business(&self, business_id: i64) -> Option<&Business> {
        self.businesses.iter().find(|b| b.id == business_id)
    }

    fn user_exists(&self, user_id: i64) -> bool {
        self.users.iter().any(|u| u.id == user_id)
    }
}

/// Store kept entirely in process memory
///
/// Transactions take an exclusive lock and work on a copy of the state; the
/// copy replaces the shared state only on commit. Used for local development
/// and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    notification_write_limit: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose transactions refuse notification writes past `limit`
    pub fn failing_notifications_after(limit: usize) -> Self {
        Self {
            notification_write_limit: Some(limit),
            ..Self::default()
        }
    }

    pub async fn notification_count(&self) -> usize {
        self.state.lock().await.notifications.len()
    }

    pub async fn favorite_count(&self) -> usize {
        self.state.lock().await.favorites.len()
    }

    pub async fn service_count(&self) -> usize {
        self.state.lock().await.services.len()
    }

    pub async fn activity(&self) -> Vec<ActivityRecord> {
        self.state.lock().await.activity.clone()
    }
}

/// Transaction over a [`MemoryStore`]
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    notifications_written: usize,
    notification_write_limit: Option<usize>,
    finished: bool,
}

impl MemoryTx {
    fn working(&mut self) -> Result<&mut MemoryState, StoreError> {
        if self.finished {
            return Err(StoreError::Unavailable("transaction already committed".to_string()));
        }
        Ok(&mut self.working)
    }
}

#[async_trait]
impl BusinessWriter for MemoryTx {
    async fn insert_business(&mut self, business: &NewBusiness) -> Result<i64, StoreError> {
        let state = self.working()?;
        if state.businesses.iter().any(|b| b.email == business.email) {
            return Err(StoreError::Conflict {
                entity: "Business",
                key: business.email.clone(),
            });
        }

        state.last_business_id += 1;
        let id = state.last_business_id;
        state.businesses.push(Business {
            id,
            business_name: business.business_name.clone(),
            owner_name: business.owner_name.clone(),
            email: business.email.clone(),
            phone: business.phone.clone(),
            business_type: business.business_type.clone(),
            address: business.address.clone(),
            latitude: business.location.latitude,
            longitude: business.location.longitude,
            website: business.website.clone(),
            verified: false,
            created_at: Utc::now(),
        });

        Ok(id)
    }

    async fn insert_service(&mut self, business_id: i64, service: &Service) -> Result<(), StoreError> {
        let state = self.working()?;
        if state.business(business_id).is_none() {
            return Err(StoreError::NotFound {
                entity: "Business",
                key: business_id.to_string(),
            });
        }
        state.services.push((business_id, service.clone()));
        Ok(())
    }

    async fn mark_verified(&mut self, business_id: i64) -> Result<(), StoreError> {
        let state = self.working()?;
        match state.businesses.iter_mut().find(|b| b.id == business_id) {
            Some(business) => {
                business.verified = true;
                Ok(())
            }
            None => Err(StoreError::NotFound {
                entity: "Business",
                key: business_id.to_string(),
            }),
        }
    }
}

#[async_trait]
impl ProximityIndex for MemoryTx {
    async fn located_users_near(
        &mut self,
        origin: Coordinates,
        radius_km: f64,
    ) -> Result<Vec<LocatedUser>, StoreError> {
        let state = self.working()?;
        let bbox = calculate_bounding_box(origin.latitude, origin.longitude, radius_km);

        Ok(state
            .users
            .iter()
            .filter_map(|user| {
                user.location()
                    .filter(|l| is_within_bounding_box(l.latitude, l.longitude, &bbox))
                    .map(|location| LocatedUser { id: user.id, location })
            })
            .collect())
    }
}

#[async_trait]
impl NotificationWriter for MemoryTx {
    async fn insert_notification(&mut self, notification: &NewNotification) -> Result<i64, StoreError> {
        if let Some(limit) = self.notification_write_limit {
            if self.notifications_written >= limit {
                return Err(StoreError::Unavailable(format!(
                    "notification writes limited to {} per transaction",
                    limit
                )));
            }
        }

        let state = self.working()?;
        state.last_notification_id += 1;
        let id = state.last_notification_id;
        state.notifications.push(Notification {
            id,
            user_id: notification.user_id,
            business_id: notification.business_id,
            title: notification.title.clone(),
            message: notification.message.clone(),
            is_read: false,
            created_at: Utc::now(),
        });
        self.notifications_written += 1;

        Ok(id)
    }
}

#[async_trait]
impl RegistrationTx for MemoryTx {
    async fn commit(&mut self) -> Result<(), StoreError> {
        let working = std::mem::take(self.working()?);
        *self.guard = working;
        self.finished = true;
        Ok(())
    }
}

#[async_trait]
impl BusinessCatalog for MemoryStore {
    async fn verified_businesses(&self, filter: &CatalogFilter) -> Result<Vec<BusinessResult>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .businesses
            .iter()
            .filter(|b| b.verified)
            .filter(|b| {
                filter
                    .business_type
                    .as_deref()
                    .map_or(true, |t| b.business_type == t)
            })
            .filter(|b| {
                filter
                    .area
                    .as_ref()
                    .map_or(true, |area| is_within_bounding_box(b.latitude, b.longitude, area))
            })
            .map(|b| state.result_for(b))
            .collect())
    }

    async fn search_verified(&self, needle: &str, limit: usize) -> Result<Vec<BusinessResult>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .businesses
            .iter()
            .filter(|b| b.verified && matches_text(b, needle))
            .take(limit)
            .map(|b| state.result_for(b))
            .collect())
    }

    async fn business_by_id(&self, business_id: i64) -> Result<Option<BusinessResult>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.business(business_id).map(|b| state.result_for(b)))
    }

    async fn business_count(&self) -> Result<i64, StoreError> {
        Ok(self.state.lock().await.businesses.len() as i64)
    }

    async fn set_verified(&self, business_id: i64, verified: bool) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        match state.businesses.iter_mut().find(|b| b.id == business_id) {
            Some(business) => {
                business.verified = verified;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict {
                entity: "User",
                key: user.email.clone(),
            });
        }

        state.last_user_id += 1;
        let created = User {
            id: state.last_user_id,
            name: user.name.clone(),
            email: user.email.clone(),
            latitude: user.location.map(|l| l.latitude),
            longitude: user.location.map(|l| l.longitude),
            created_at: Utc::now(),
        };
        state.users.push(created.clone());

        Ok(created)
    }

    async fn user_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn update_user_location(&self, user_id: i64, location: Coordinates) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        match state.users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.latitude = Some(location.latitude);
                user.longitude = Some(location.longitude);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        if !state.user_exists(user_id) {
            return Ok(false);
        }

        state.favorites.retain(|(user, _)| *user != user_id);
        state.notifications.retain(|n| n.user_id != user_id);
        state
            .activity
            .retain(|a| !(a.actor_type == ActorType::User && a.actor_id == Some(user_id)));
        state.users.retain(|u| u.id != user_id);

        Ok(true)
    }
}

#[async_trait]
impl FavoritesStore for MemoryStore {
    async fn add_favorite(&self, user_id: i64, business_id: i64) -> Result<FavoriteOutcome, StoreError> {
        let mut state = self.state.lock().await;
        if !state.user_exists(user_id) {
            return Err(StoreError::NotFound {
                entity: "User",
                key: user_id.to_string(),
            });
        }
        if state.business(business_id).is_none() {
            return Err(StoreError::NotFound {
                entity: "Business",
                key: business_id.to_string(),
            });
        }

        if state.favorites.contains(&(user_id, business_id)) {
            return Ok(FavoriteOutcome::AlreadyPresent);
        }
        state.favorites.push((user_id, business_id));
        Ok(FavoriteOutcome::Added)
    }

    async fn remove_favorite(&self, user_id: i64, business_id: i64) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let before = state.favorites.len();
        state.favorites.retain(|pair| *pair != (user_id, business_id));
        Ok(state.favorites.len() < before)
    }

    async fn list_favorites(&self, user_id: i64) -> Result<Vec<BusinessResult>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .favorites
            .iter()
            .filter(|(user, _)| *user == user_id)
            .filter_map(|(_, business_id)| state.business(*business_id))
            .map(|b| state.result_for(b))
            .collect())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn notifications_for(&self, user_id: i64, limit: usize) -> Result<Vec<NotificationView>, StoreError> {
        let state = self.state.lock().await;
        let mut owned: Vec<&Notification> = state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(owned
            .into_iter()
            .filter_map(|n| {
                state.business(n.business_id).map(|b| NotificationView {
                    notification: n.clone(),
                    business_name: b.business_name.clone(),
                    business_type: b.business_type.clone(),
                    address: b.address.clone(),
                })
            })
            .take(limit)
            .collect())
    }

    async fn unread_count(&self, user_id: i64) -> Result<i64, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_read(&self, notification_id: i64) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        match state.notifications.iter_mut().find(|n| n.id == notification_id) {
            Some(notification) => {
                notification.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ActivityLogger for MemoryStore {
    async fn log_activity(&self, record: &ActivityRecord) -> Result<(), StoreError> {
        self.state.lock().await.activity.push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl DiscoveryStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn RegistrationTx>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            working,
            notifications_written: 0,
            notification_write_limit: self.notification_write_limit,
            finished: false,
        }))
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
