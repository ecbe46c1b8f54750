//! HTTP surface for the board.
//!
//! `GET /api/data` always answers `200`; failure is signalled through the
//! `success` flag and the body keeps its full shape.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::models::record::FieldsPage;
use crate::services::board_service::BoardService;

pub const CACHE_CONTROL_SUCCESS: &str = "no-store, max-age=0";
pub const CACHE_CONTROL_FAILURE: &str = "no-cache, no-store, must-revalidate";
pub const CORS_MAX_AGE: Duration = Duration::from_secs(86_400);
pub const CORS_ALLOW_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type,Authorization";

#[derive(Clone)]
pub struct AppState {
    pub board: Arc<BoardService>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/data", get(get_data).options(preflight))
        .route("/api/fields", get(get_fields))
        .route("/api/refresh", post(refresh))
        .route("/api/config", get(get_config))
        .route("/health", get(health))
        .layer(cors_layer())
        // CorsLayer only advertises methods and headers on preflight; browsers
        // reading simple responses get them here.
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORS_ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(CORS_MAX_AGE)
}

fn cache_control(success: bool) -> [(header::HeaderName, HeaderValue); 1] {
    let value = if success {
        CACHE_CONTROL_SUCCESS
    } else {
        CACHE_CONTROL_FAILURE
    };
    [(header::CACHE_CONTROL, HeaderValue::from_static(value))]
}

async fn get_data(State(state): State<AppState>) -> impl IntoResponse {
    let response = state.board.handle_get_data().await;
    (StatusCode::OK, cache_control(response.success), Json(response))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
struct FieldsResponse {
    success: bool,
    data: Option<Arc<FieldsPage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

async fn get_fields(State(state): State<AppState>) -> impl IntoResponse {
    let body = match state.board.table_fields().await {
        Ok(fields) => FieldsResponse {
            success: true,
            data: Some(fields),
            message: None,
        },
        Err(e) => {
            tracing::error!("Error fetching table fields: {}", e);
            FieldsResponse {
                success: false,
                data: None,
                message: Some(e.to_string()),
            }
        }
    };
    (StatusCode::OK, cache_control(body.success), Json(body))
}

async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    // Detached: the caller does not wait for re-population.
    drop(state.board.refresh());
    (StatusCode::ACCEPTED, Json(json!({ "success": true })))
}

async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "submitUrl": state.board.submit_url() }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
