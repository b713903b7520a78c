use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{handlers, AppState};

async fn root() -> impl IntoResponse {
    Json(json!({ "message": "Notes auth backend is running" }))
}

async fn api_test(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "message": "Backend is working!",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "port": state.config.port,
    }))
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    // Echo the full URI, query string included.
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": format!("Route {} not found", uri) })),
    )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    // Credentials are enabled for the cookie transport, so the origin list
    // must stay explicit; a wildcard is not allowed here.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/", get(root))
        .route("/api/test", get(api_test))
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/signin", post(handlers::auth::signin))
        .route("/api/auth/signout", post(handlers::auth::signout))
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
