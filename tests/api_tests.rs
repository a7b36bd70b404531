// HTTP tests for the discovery routes over the in-memory store

use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use bloom_discovery::core::DiscoveryService;
use bloom_discovery::routes::{self, handle_json_payload_error, handle_path_error, AppState};
use bloom_discovery::services::store::BusinessCatalog;
use bloom_discovery::services::{CacheManager, MemoryStore};
use serde_json::{json, Value};

fn state(store: &MemoryStore) -> AppState {
    let cache = Arc::new(CacheManager::in_memory(100, 60));
    AppState {
        discovery: DiscoveryService::with_default_options(Arc::new(store.clone()))
            .with_search_cache(cache.clone()),
        cache,
    }
}

macro_rules! app {
    (state: $state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
                .app_data(web::PathConfig::default().error_handler(handle_path_error))
                .configure(routes::configure_routes),
        )
        .await
    };
    ($store:expr) => {
        app!(state: state($store))
    };
}

fn business_body(email: &str, lat: f64, lon: f64) -> Value {
    json!({
        "business_name": "Queen Street Salon",
        "owner_name": "David Chen",
        "email": email,
        "phone": "(416) 555-0202",
        "business_type": "Salon",
        "address": "456 Queen St W, Toronto, ON",
        "latitude": lat,
        "longitude": lon,
        "services": [
            {"name": "Haircut", "price": 60.0},
            {"name": "Coloring", "price": 150.0}
        ]
    })
}

#[actix_web::test]
async fn test_health() {
    let store = MemoryStore::new();
    let app = app!(&store);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
    assert_eq!(body["cache"]["redis_enabled"], false);
}

#[actix_web::test]
async fn test_register_business_notifies_and_returns_created() {
    let store = MemoryStore::new();
    let app = app!(&store);

    let req = test::TestRequest::post()
        .uri("/api/users/register")
        .set_json(json!({
            "name": "Nearby Nora",
            "email": "nora@users.test",
            "latitude": 43.66,
            "longitude": -79.39
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let user: Value = test::read_body_json(resp).await;
    let user_id = user["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/businesses/register")
        .set_json(business_body("david@queensalon.com", 43.6487, -79.3962))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["notifications_sent"], 1);
    assert_eq!(body["message"], "Business registered successfully");

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}/notifications/unread", user_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}/notifications", user_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body[0]["title"], "New Business Near You! 🎉");
    assert_eq!(body[0]["business_name"], "Queen Street Salon");

    // Registration and user sign-up are both recorded
    assert_eq!(store.activity().await.len(), 2);
}

#[actix_web::test]
async fn test_register_business_duplicate_email_conflict() {
    let store = MemoryStore::new();
    let app = app!(&store);

    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        let req = test::TestRequest::post()
            .uri("/api/businesses/register")
            .set_json(business_body("dup@bloom.test", 43.6487, -79.3962))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected);
    }
}

#[actix_web::test]
async fn test_register_business_validation_error() {
    let store = MemoryStore::new();
    let app = app!(&store);

    let req = test::TestRequest::post()
        .uri("/api/businesses/register")
        .set_json(business_body("bad@bloom.test", 123.0, -79.3962))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_failed");
    assert_eq!(body["status_code"], 400);
}

#[actix_web::test]
async fn test_malformed_json_is_bad_request() {
    let store = MemoryStore::new();
    let app = app!(&store);

    let req = test::TestRequest::post()
        .uri("/api/businesses/nearby")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_json");
}

#[actix_web::test]
async fn test_nearby_and_search_only_return_verified() {
    let store = MemoryStore::new();
    let app = app!(&store);

    let req = test::TestRequest::post()
        .uri("/api/businesses/register")
        .set_json(business_body("pending@bloom.test", 43.6487, -79.3962))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let business_id = body["business_id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/businesses/nearby")
        .set_json(json!({"latitude": 43.6532, "longitude": -79.3832, "radius": 10}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 0);

    store.set_verified(business_id, true).await.unwrap();

    let req = test::TestRequest::post()
        .uri("/api/businesses/nearby")
        .set_json(json!({"latitude": 43.6532, "longitude": -79.3832, "radius": 10}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["business_name"], "Queen Street Salon");
    assert_eq!(results[0]["services"][1]["name"], "Coloring");
    assert!(results[0]["distance"].as_f64().unwrap() <= 10.0);

    let req = test::TestRequest::get().uri("/api/businesses/search?q=SALON").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0]["distance"].is_null());
}

#[actix_web::test]
async fn test_search_follows_verification_changes() {
    let store = MemoryStore::new();
    let app_state = state(&store);
    let discovery = app_state.discovery.clone();
    let app = app!(state: app_state);

    let req = test::TestRequest::post()
        .uri("/api/businesses/register")
        .set_json(business_body("moderated@bloom.test", 43.6487, -79.3962))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let business_id = body["business_id"].as_i64().unwrap();

    let search = |q: &str| test::TestRequest::get().uri(&format!("/api/businesses/search?q={}", q)).to_request();

    let body: Value = test::call_and_read_body_json(&app, search("salon")).await;
    assert_eq!(body.as_array().unwrap().len(), 0);

    discovery.set_verified(business_id, true).await.unwrap();

    let body: Value = test::call_and_read_body_json(&app, search("salon")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let body: Value = test::call_and_read_body_json(&app, search("queen")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    discovery.set_verified(business_id, false).await.unwrap();

    for q in ["salon", "queen", "SALON"] {
        let body: Value = test::call_and_read_body_json(&app, search(q)).await;
        assert_eq!(body.as_array().unwrap().len(), 0, "query {:?} still returns the unverified business", q);
    }
}

#[actix_web::test]
async fn test_nearby_partial_location_rejected() {
    let store = MemoryStore::new();
    let app = app!(&store);

    let req = test::TestRequest::post()
        .uri("/api/businesses/nearby")
        .set_json(json!({"latitude": 43.6532}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_favorites_flow() {
    let store = MemoryStore::new();
    let app = app!(&store);

    let req = test::TestRequest::post()
        .uri("/api/users/register")
        .set_json(json!({"name": "Fay", "email": "fay@users.test"}))
        .to_request();
    let user: Value = test::call_and_read_body_json(&app, req).await;
    let user_id = user["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/businesses/register")
        .set_json(business_body("fave@bloom.test", 43.6487, -79.3962))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let business_id = body["business_id"].as_i64().unwrap();

    let uri = format!("/api/users/{}/favorites/{}", user_id, business_id);
    for message in ["Added to favorites", "Already in favorites"] {
        let req = test::TestRequest::post().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], message);
    }
    assert_eq!(store.favorite_count().await, 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}/favorites", user_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let req = test::TestRequest::delete().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(store.favorite_count().await, 0);
}

#[actix_web::test]
async fn test_unknown_resources_are_not_found() {
    let store = MemoryStore::new();
    let app = app!(&store);

    let req = test::TestRequest::get().uri("/api/businesses/42").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post().uri("/api/notifications/7/read").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete().uri("/api/users/3").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_track_activity() {
    let store = MemoryStore::new();
    let app = app!(&store);

    let req = test::TestRequest::post()
        .uri("/api/activity")
        .set_json(json!({
            "user_id": 5,
            "user_type": "business",
            "email": "owner@bloom.test",
            "action": "view_dashboard"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let activity = store.activity().await;
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].action, "view_dashboard");
}
