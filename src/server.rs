use axum::{
    extract::Request,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::db::Repository;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<dyn Repository>,
}

impl AppState {
    pub fn new(config: Config, db: Arc<dyn Repository>) -> Self {
        Self {
            config: Arc::new(config),
            db,
        }
    }
}

/// Routes are registered without trailing slashes; `build_app` normalizes
/// incoming paths before they get here.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/users", post(crate::api::create_user))
        .route("/users/:user_id", get(crate::api::get_user))
        .route(
            "/users/:user_id/items",
            post(crate::api::create_item_for_user),
        )
        .route("/items", get(crate::api::list_items))
        .route("/movies", get(crate::api::get_movie))
        .route("/poster", get(crate::api::get_poster))
        .route("/recommend", get(crate::api::list_recommendations));

    Router::new()
        .route("/robots.txt", get(robots_txt_handler))
        .merge(api_routes)
        .fallback(fallback_handler)
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The full application: path normalization has to run before routing, so
/// it wraps the router instead of being one of its layers.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .fallback_service(build_router(state))
        .layer(axum::middleware::from_fn(crate::middleware::normalize_path))
}

async fn robots_txt_handler() -> &'static str {
    "User-agent: *\nDisallow: /\n"
}

async fn fallback_handler(req: Request) -> impl IntoResponse {
    // CORS preflight for paths without an OPTIONS route.
    if req.method() == axum::http::Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}
