use actix_web::{web, HttpRequest, HttpResponse};

use crate::core::discovery::DiscoveryError;
use crate::models::{
    ActivityRecord, ActorType, NearbyRequest, RegisterBusinessRequest, RegistrationResponse,
    SearchQuery,
};
use crate::routes::{client_ip, AppState};

/// Configure business discovery routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/businesses")
            .route("/register", web::post().to(register_business))
            .route("/nearby", web::post().to(find_nearby))
            .route("/search", web::get().to(search))
            .route("/{business_id}", web::get().to(get_business)),
    );
}

/// Register a business and notify nearby users
///
/// POST /api/businesses/register
async fn register_business(
    state: web::Data<AppState>,
    body: web::Json<RegisterBusinessRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, DiscoveryError> {
    let business = body.into_inner().into_new_business()?;
    let email = business.email.clone();
    let location = business.location;

    let outcome = state.discovery.register_business(business).await?;

    state
        .discovery
        .record_activity_quietly(
            ActivityRecord::new(Some(outcome.business_id), ActorType::Business, email, "register")
                .with_ip(client_ip(&req))
                .with_location(Some(location)),
        )
        .await;

    Ok(HttpResponse::Created().json(RegistrationResponse {
        message: "Business registered successfully".to_string(),
        business_id: outcome.business_id,
        notifications_sent: outcome.notifications_created,
    }))
}

/// Verified businesses near a point, nearest first
///
/// POST /api/businesses/nearby
///
/// Request body:
/// ```json
/// {
///   "latitude": 43.6532,
///   "longitude": -79.3832,
///   "radius": 50,
///   "business_type": "Spa"
/// }
/// ```
async fn find_nearby(
    state: web::Data<AppState>,
    body: web::Json<NearbyRequest>,
) -> Result<HttpResponse, DiscoveryError> {
    let query = body.into_inner().into_query()?;
    let results = state.discovery.find_nearby(query).await?;
    Ok(HttpResponse::Ok().json(results))
}

/// Text search over verified businesses
///
/// GET /api/businesses/search?q=spa
async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, DiscoveryError> {
    let results = state.discovery.find_by_text(&query.q).await?;
    Ok(HttpResponse::Ok().json(results))
}

/// GET /api/businesses/{business_id}
async fn get_business(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DiscoveryError> {
    let business = state.discovery.business(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(business))
}
