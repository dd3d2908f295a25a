// Routes module: 라우팅 설정
// 역할: 모든 도메인의 라우터를 조합하고 전역 레이어 적용
// Routes module: combines all domain routers

pub mod api_doc;

use axum::{
    http::{header, Method},
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use crate::shared::config::Config;
use crate::shared::middleware::rate_limit;
use crate::shared::services::AppState;

// 각 도메인의 routes import
use crate::domains::auth::routes::create_auth_router;
use crate::domains::users::routes::create_users_router;
pub use api_doc::ApiDoc;

/// Create main router (combines all domain routers)
/// 메인 라우터 생성 (모든 도메인 라우터 조합)
pub fn create_router(app_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(create_auth_router())
        .merge(create_users_router(app_state))
}

/// 전체 애플리케이션 구성
///
/// 레이어 순서 (바깥 → 안): rate limit → CORS → trace → timeout → routes.
/// The rate limiter runs before anything else, including preflight requests.
pub fn build_app(app_state: AppState, config: &Config) -> Router {
    // CORS 설정
    let cors = CorsLayer::new()
        .allow_origin(config.cors_allowed_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true);

    let rate_limiter = app_state.rate_limiter.clone();

    Router::new()
        .merge(create_router(&app_state))
        .merge(SwaggerUi::new("/api").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit))
        .with_state(app_state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
