use crate::core::distance::distance_between;
use crate::models::{Coordinates, NewNotification};
use crate::services::store::{NotificationWriter, ProximityIndex, StoreError};

/// Default notification radius in kilometers
pub const DEFAULT_NOTIFY_RADIUS_KM: f64 = 10.0;

pub const NOTIFICATION_TITLE: &str = "New Business Near You! 🎉";

/// Message shown to a user when a business registers nearby
pub fn notification_message(business_name: &str, distance_km: f64) -> String {
    format!("{} just registered {:.2}km away from you!", business_name, distance_km)
}

/// Fans out "new business nearby" notifications on registration
///
/// There is no deduplication: registering the same business twice notifies
/// the same users twice.
#[derive(Debug, Clone, Copy)]
pub struct ProximityNotifier {
    radius_km: f64,
}

impl ProximityNotifier {
    pub fn new(radius_km: f64) -> Self {
        Self { radius_km }
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// Notify every located user within the radius of the new business
    ///
    /// Runs against the registration transaction; the first failed write is
    /// returned and the caller is expected to drop the transaction.
    ///
    /// # Returns
    /// Number of notifications written
    pub async fn notify_nearby<T>(
        &self,
        tx: &mut T,
        business_id: i64,
        business_name: &str,
        location: Coordinates,
    ) -> Result<usize, StoreError>
    where
        T: ProximityIndex + NotificationWriter + ?Sized,
    {
        let candidates = tx.located_users_near(location, self.radius_km).await?;
        let scanned = candidates.len();
        let mut created = 0;

        for user in candidates {
            let distance = distance_between(user.location, location);
            if distance > self.radius_km {
                continue;
            }

            let notification = NewNotification {
                user_id: user.id,
                business_id,
                title: NOTIFICATION_TITLE.to_string(),
                message: notification_message(business_name, distance),
            };

            tx.insert_notification(&notification).await.map_err(|e| {
                tracing::error!(
                    "Notification write failed for user {} (business {}): {}",
                    user.id,
                    business_id,
                    e
                );
                e
            })?;
            created += 1;
        }

        tracing::debug!(
            "Proximity fan-out for business {}: {} candidates scanned, {} notified within {}km",
            business_id,
            scanned,
            created,
            self.radius_km
        );

        Ok(created)
    }
}

impl Default for ProximityNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFY_RADIUS_KM)
    }
}
