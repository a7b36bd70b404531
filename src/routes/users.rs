use actix_web::{web, HttpRequest, HttpResponse};

use crate::core::discovery::DiscoveryError;
use crate::models::{
    ActivityRecord, ActorType, CountResponse, LocationRequest, MessageResponse,
    RegisterUserRequest,
};
use crate::routes::{client_ip, AppState};
use crate::services::store::UserDirectory;

/// Configure user, favorites and notification routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("/register", web::post().to(register_user))
            .route("/{user_id}", web::delete().to(delete_user))
            .route("/{user_id}/location", web::post().to(refresh_location))
            .route("/{user_id}/notifications", web::get().to(list_notifications))
            .route("/{user_id}/notifications/unread", web::get().to(unread_count))
            .route("/{user_id}/favorites", web::get().to(list_favorites))
            .route("/{user_id}/favorites/{business_id}", web::post().to(add_favorite))
            .route("/{user_id}/favorites/{business_id}", web::delete().to(remove_favorite)),
    )
    .route("/notifications/{notification_id}/read", web::post().to(mark_read));
}

/// POST /api/users/register
async fn register_user(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, DiscoveryError> {
    let user = state
        .discovery
        .register_user(body.into_inner().into_new_user()?)
        .await?;

    state
        .discovery
        .record_activity_quietly(
            ActivityRecord::new(Some(user.id), ActorType::User, user.email.clone(), "register")
                .with_ip(client_ip(&req))
                .with_location(user.location()),
        )
        .await;

    Ok(HttpResponse::Created().json(user))
}

/// Login-time location refresh
///
/// POST /api/users/{user_id}/location
async fn refresh_location(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<LocationRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, DiscoveryError> {
    let user_id = path.into_inner();
    let location = body.into_inner().into_coordinates()?;

    state.discovery.refresh_location(user_id, location).await?;

    if let Ok(Some(user)) = state.discovery.store().user_by_id(user_id).await {
        state
            .discovery
            .record_activity_quietly(
                ActivityRecord::new(Some(user_id), ActorType::User, user.email, "location_update")
                    .with_ip(client_ip(&req))
                    .with_location(Some(location)),
            )
            .await;
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Location updated")))
}

/// DELETE /api/users/{user_id}
async fn delete_user(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DiscoveryError> {
    state.discovery.delete_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("User deleted")))
}

/// GET /api/users/{user_id}/notifications
async fn list_notifications(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DiscoveryError> {
    let notifications = state.discovery.notifications(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

/// GET /api/users/{user_id}/notifications/unread
async fn unread_count(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DiscoveryError> {
    let count = state.discovery.unread_count(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(CountResponse { count }))
}

/// POST /api/notifications/{notification_id}/read
async fn mark_read(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DiscoveryError> {
    state.discovery.mark_read(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Notification marked as read")))
}

/// GET /api/users/{user_id}/favorites
async fn list_favorites(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DiscoveryError> {
    let favorites = state.discovery.favorites(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(favorites))
}

/// POST /api/users/{user_id}/favorites/{business_id}
async fn add_favorite(
    state: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, DiscoveryError> {
    let (user_id, business_id) = path.into_inner();
    let outcome = state.discovery.add_favorite(user_id, business_id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(outcome.message())))
}

/// DELETE /api/users/{user_id}/favorites/{business_id}
async fn remove_favorite(
    state: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, DiscoveryError> {
    let (user_id, business_id) = path.into_inner();
    state.discovery.remove_favorite(user_id, business_id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Removed from favorites")))
}
