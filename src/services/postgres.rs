use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnection, PgPoolOptions};
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::core::distance::calculate_bounding_box;
use crate::models::{
    ActivityRecord, Business, BusinessResult, CatalogFilter, Coordinates, FavoriteOutcome,
    LocatedUser, NewBusiness, NewNotification, NewUser, NotificationView, Service, User,
};
use crate::services::store::{
    ActivityLogger, BusinessCatalog, BusinessWriter, DiscoveryStore, FavoritesStore,
    NotificationStore, NotificationWriter, ProximityIndex, RegistrationTx, StoreError,
    UserDirectory,
};

const BUSINESS_COLUMNS: &str = r#"
    b.id, b.business_name, b.owner_name, b.email, b.phone, b.business_type,
    b.address, b.latitude, b.longitude, b.website, b.verified, b.created_at
"#;

const DEFAULT_SCAN_PAGE_SIZE: i64 = 1000;

/// Map unique and foreign key violations onto store errors
fn classify(err: sqlx::Error, entity: &'static str, key: impl Into<String>) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict { entity, key: key.into() };
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::NotFound { entity, key: key.into() };
        }
    }
    StoreError::SqlxError(err)
}

/// Escape `%`, `_` and `\` so user input is matched literally by LIKE
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len() + 2);
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[derive(sqlx::FromRow)]
struct ServiceRow {
    business_id: i64,
    service_name: String,
    price: f64,
}

/// PostgreSQL-backed discovery store
pub struct PostgresStore {
    pool: PgPool,
    scan_page_size: i64,
}

impl PostgresStore {
    /// Connect and run migrations on startup
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self {
            pool,
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
        })
    }

    /// Create a store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Page size used when scanning located users during a fan-out
    pub fn with_scan_page_size(mut self, page_size: usize) -> Self {
        self.scan_page_size = page_size.max(1) as i64;
        self
    }

    /// Attach ordered service lists to business rows
    async fn with_services(&self, businesses: Vec<Business>) -> Result<Vec<BusinessResult>, StoreError> {
        if businesses.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = businesses.iter().map(|b| b.id).collect();
        let rows = sqlx::query_as::<_, ServiceRow>(
            r#"
            SELECT business_id, service_name, price
            FROM services
            WHERE business_id = ANY($1)
            ORDER BY business_id, id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_business: HashMap<i64, Vec<Service>> = HashMap::new();
        for row in rows {
            by_business.entry(row.business_id).or_default().push(Service {
                name: row.service_name,
                price: row.price,
            });
        }

        Ok(businesses
            .into_iter()
            .map(|b| {
                let services = by_business.remove(&b.id).unwrap_or_default();
                BusinessResult::new(b, services)
            })
            .collect())
    }
}

/// Registration transaction; rolls back when dropped before commit
pub struct PostgresTx {
    tx: Option<Transaction<'static, Postgres>>,
    scan_page_size: i64,
}

impl PostgresTx {
    fn conn(&mut self) -> Result<&mut PgConnection, StoreError> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| StoreError::Unavailable("transaction already committed".to_string()))
    }
}

#[async_trait]
impl BusinessWriter for PostgresTx {
    async fn insert_business(&mut self, business: &NewBusiness) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO businesses (business_name, owner_name, email, phone, business_type,
                                    address, latitude, longitude, website)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&business.business_name)
        .bind(&business.owner_name)
        .bind(&business.email)
        .bind(&business.phone)
        .bind(&business.business_type)
        .bind(&business.address)
        .bind(business.location.latitude)
        .bind(business.location.longitude)
        .bind(&business.website)
        .fetch_one(conn)
        .await
        .map_err(|e| classify(e, "Business", business.email.as_str()))?;

        Ok(id)
    }

    async fn insert_service(&mut self, business_id: i64, service: &Service) -> Result<(), StoreError> {
        let conn = self.conn()?;
        sqlx::query(
            r#"
            INSERT INTO services (business_id, service_name, price)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(business_id)
        .bind(&service.name)
        .bind(service.price)
        .execute(conn)
        .await
        .map_err(|e| classify(e, "Business", business_id.to_string()))?;

        Ok(())
    }

    async fn mark_verified(&mut self, business_id: i64) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let result = sqlx::query("UPDATE businesses SET verified = TRUE WHERE id = $1")
            .bind(business_id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "Business",
                key: business_id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ProximityIndex for PostgresTx {
    /// Bounding-box scan of located users, paged by id
    async fn located_users_near(
        &mut self,
        origin: Coordinates,
        radius_km: f64,
    ) -> Result<Vec<LocatedUser>, StoreError> {
        let bbox = calculate_bounding_box(origin.latitude, origin.longitude, radius_km);
        let page_size = self.scan_page_size;
        let mut users = Vec::new();
        let mut after_id = 0_i64;

        loop {
            let conn = self.conn()?;
            let rows = sqlx::query(
                r#"
                SELECT id, latitude, longitude
                FROM users
                WHERE latitude IS NOT NULL
                  AND longitude IS NOT NULL
                  AND id > $1
                  AND latitude BETWEEN $2 AND $3
                  AND (CASE WHEN $4 <= $5
                            THEN longitude BETWEEN $4 AND $5
                            ELSE longitude >= $4 OR longitude <= $5
                       END
                       -- -180 and 180 are the same meridian
                       OR (ABS(longitude) = 180 AND
                           CASE WHEN $4 <= $5
                                THEN -longitude BETWEEN $4 AND $5
                                ELSE -longitude >= $4 OR -longitude <= $5
                           END))
                ORDER BY id
                LIMIT $6
                "#,
            )
            .bind(after_id)
            .bind(bbox.min_lat)
            .bind(bbox.max_lat)
            .bind(bbox.min_lon)
            .bind(bbox.max_lon)
            .bind(page_size)
            .fetch_all(conn)
            .await?;

            let fetched = rows.len() as i64;
            for row in rows {
                let id: i64 = row.get("id");
                after_id = id;
                users.push(LocatedUser {
                    id,
                    location: Coordinates::new(row.get("latitude"), row.get("longitude")),
                });
            }

            if fetched < page_size {
                break;
            }
        }

        tracing::debug!("Proximity scan found {} candidate users", users.len());
        Ok(users)
    }
}

#[async_trait]
impl NotificationWriter for PostgresTx {
    async fn insert_notification(&mut self, notification: &NewNotification) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO notifications (user_id, business_id, title, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.business_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .fetch_one(conn)
        .await?;

        Ok(id)
    }
}

#[async_trait]
impl RegistrationTx for PostgresTx {
    async fn commit(&mut self) -> Result<(), StoreError> {
        match self.tx.take() {
            Some(tx) => Ok(tx.commit().await?),
            None => Err(StoreError::Unavailable("transaction already committed".to_string())),
        }
    }
}

#[async_trait]
impl BusinessCatalog for PostgresStore {
    async fn verified_businesses(&self, filter: &CatalogFilter) -> Result<Vec<BusinessResult>, StoreError> {
        let area = filter.area;
        let query = format!(
            r#"
            SELECT {BUSINESS_COLUMNS}
            FROM businesses b
            WHERE b.verified
              AND ($1::TEXT IS NULL OR b.business_type = $1)
              AND ($2::FLOAT8 IS NULL OR b.latitude BETWEEN $2 AND $3)
              AND ($4::FLOAT8 IS NULL OR
                   CASE WHEN $4 <= $5
                        THEN b.longitude BETWEEN $4 AND $5
                        ELSE b.longitude >= $4 OR b.longitude <= $5
                   END OR
                   (ABS(b.longitude) = 180 AND
                    CASE WHEN $4 <= $5
                         THEN -b.longitude BETWEEN $4 AND $5
                         ELSE -b.longitude >= $4 OR -b.longitude <= $5
                    END))
            ORDER BY b.id
            "#
        );

        let businesses = sqlx::query_as::<_, Business>(&query)
            .bind(filter.business_type.as_deref())
            .bind(area.map(|a| a.min_lat))
            .bind(area.map(|a| a.max_lat))
            .bind(area.map(|a| a.min_lon))
            .bind(area.map(|a| a.max_lon))
            .fetch_all(&self.pool)
            .await?;

        self.with_services(businesses).await
    }

    async fn search_verified(&self, needle: &str, limit: usize) -> Result<Vec<BusinessResult>, StoreError> {
        let pattern = format!("%{}%", escape_like(needle));
        let query = format!(
            r#"
            SELECT {BUSINESS_COLUMNS}
            FROM businesses b
            WHERE b.verified
              AND (b.business_name ILIKE $1 ESCAPE '\'
                   OR b.address ILIKE $1 ESCAPE '\'
                   OR b.business_type ILIKE $1 ESCAPE '\')
            ORDER BY b.id
            LIMIT $2
            "#
        );

        let businesses = sqlx::query_as::<_, Business>(&query)
            .bind(pattern)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        self.with_services(businesses).await
    }

    async fn business_by_id(&self, business_id: i64) -> Result<Option<BusinessResult>, StoreError> {
        let query = format!("SELECT {BUSINESS_COLUMNS} FROM businesses b WHERE b.id = $1");
        let business = sqlx::query_as::<_, Business>(&query)
            .bind(business_id)
            .fetch_optional(&self.pool)
            .await?;

        match business {
            Some(b) => Ok(self.with_services(vec![b]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn business_count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM businesses")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn set_verified(&self, business_id: i64, verified: bool) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE businesses SET verified = $2 WHERE id = $1")
            .bind(business_id)
            .bind(verified)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserDirectory for PostgresStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, latitude, longitude)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, latitude, longitude, created_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.location.map(|l| l.latitude))
        .bind(user.location.map(|l| l.longitude))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "User", user.email.as_str()))?;

        Ok(created)
    }

    async fn user_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, latitude, longitude, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_user_location(&self, user_id: i64, location: Coordinates) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET latitude = $2, longitude = $3 WHERE id = $1")
            .bind(user_id)
            .bind(location.latitude)
            .bind(location.longitude)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM favorites WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM user_activity WHERE actor_type = 'user' AND actor_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl FavoritesStore for PostgresStore {
    async fn add_favorite(&self, user_id: i64, business_id: i64) -> Result<FavoriteOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO favorites (user_id, business_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, business_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(business_id)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "Favorite target", format!("{}/{}", user_id, business_id)))?;

        if result.rows_affected() > 0 {
            Ok(FavoriteOutcome::Added)
        } else {
            Ok(FavoriteOutcome::AlreadyPresent)
        }
    }

    async fn remove_favorite(&self, user_id: i64, business_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND business_id = $2")
            .bind(user_id)
            .bind(business_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_favorites(&self, user_id: i64) -> Result<Vec<BusinessResult>, StoreError> {
        let query = format!(
            r#"
            SELECT {BUSINESS_COLUMNS}
            FROM favorites f
            JOIN businesses b ON b.id = f.business_id
            WHERE f.user_id = $1
            ORDER BY f.id
            "#
        );
        let businesses = sqlx::query_as::<_, Business>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        self.with_services(businesses).await
    }
}

#[async_trait]
impl NotificationStore for PostgresStore {
    async fn notifications_for(&self, user_id: i64, limit: usize) -> Result<Vec<NotificationView>, StoreError> {
        let notifications = sqlx::query_as::<_, NotificationView>(
            r#"
            SELECT n.id, n.user_id, n.business_id, n.title, n.message, n.is_read, n.created_at,
                   b.business_name, b.business_type, b.address
            FROM notifications n
            JOIN businesses b ON b.id = n.business_id
            WHERE n.user_id = $1
            ORDER BY n.created_at DESC, n.id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn unread_count(&self, user_id: i64) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn mark_read(&self, notification_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
            .bind(notification_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ActivityLogger for PostgresStore {
    async fn log_activity(&self, record: &ActivityRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO user_activity (actor_id, actor_type, email, ip_address,
                                       latitude, longitude, action, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.actor_id)
        .bind(record.actor_type.as_str())
        .bind(&record.email)
        .bind(&record.ip_address)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(&record.action)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl DiscoveryStore for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn RegistrationTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTx {
            tx: Some(tx),
            scan_page_size: self.scan_page_size,
        }))
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
