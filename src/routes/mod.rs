// Route exports
pub mod businesses;
pub mod users;

use std::sync::Arc;

use actix_web::{error, http::StatusCode, web, HttpRequest, HttpResponse, Responder, ResponseError};

use crate::core::discovery::{DiscoveryError, DiscoveryService};
use crate::models::{ActivityRecord, ActorType, HealthResponse, MessageResponse, TrackActivityRequest};
use crate::models::{requests::location_from_parts, ErrorResponse};
use crate::services::{store::DiscoveryStore, CacheManager};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub discovery: DiscoveryService,
    pub cache: Arc<CacheManager>,
}

impl ResponseError for DiscoveryError {
    fn status_code(&self) -> StatusCode {
        match self {
            DiscoveryError::Validation(_) => StatusCode::BAD_REQUEST,
            DiscoveryError::NotFound { .. } => StatusCode::NOT_FOUND,
            DiscoveryError::Conflict(_) => StatusCode::CONFLICT,
            DiscoveryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let (error, message) = match self {
            DiscoveryError::Validation(m) => ("validation_failed", m.clone()),
            DiscoveryError::NotFound { .. } => ("not_found", self.to_string()),
            DiscoveryError::Conflict(m) => ("conflict", m.clone()),
            DiscoveryError::Store(e) => {
                tracing::error!("Store failure: {}", e);
                ("internal_error", "An internal error occurred".to_string())
            }
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error.to_string(),
            message,
            status_code: status.as_u16(),
        })
    }
}

/// JSON error response for payload errors
#[derive(Debug)]
pub struct JsonError(ErrorResponse);

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0.error, self.0.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.0.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(&self.0)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError(ErrorResponse {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    })
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    JsonError(ErrorResponse {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    })
    .into()
}

/// Handle path parameter errors (non-numeric ids)
pub fn handle_path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    JsonError(ErrorResponse {
        error: "invalid_path".to_string(),
        message: format!("Invalid path parameter: {}", err),
        status_code: 400,
    })
    .into()
}

/// Best-effort client address for activity records
pub(crate) fn client_ip(req: &HttpRequest) -> Option<String> {
    req.connection_info().realip_remote_addr().map(str::to_string)
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .route("/activity", web::post().to(track_activity))
            .configure(users::configure)
            .configure(businesses::configure),
    );
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let database = state
        .discovery
        .store()
        .health_check()
        .await
        .unwrap_or(false);

    let status = if database { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        cache: state.cache.stats(),
        timestamp: chrono::Utc::now(),
    })
}

/// Client-reported activity
///
/// POST /api/activity
async fn track_activity(
    state: web::Data<AppState>,
    body: web::Json<TrackActivityRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, DiscoveryError> {
    let body = body.into_inner();
    validator::Validate::validate(&body)?;

    let actor_type = match body.user_type.as_deref() {
        Some("business") => ActorType::Business,
        _ => ActorType::User,
    };
    let location = location_from_parts(body.latitude, body.longitude)?;

    let record = ActivityRecord::new(body.user_id, actor_type, body.email, body.action)
        .with_ip(client_ip(&req))
        .with_location(location);
    state.discovery.record_activity(record).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Activity tracked")))
}
