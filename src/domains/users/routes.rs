// Users domain routes
// 보호된 라우트: require_auth → (Admin 라우트만) admin_only → handler
use axum::{middleware, routing::get, Router};
use crate::domains::users::handlers::user_handler;
use crate::shared::middleware::{admin_only, require_auth};
use crate::shared::services::AppState;

pub fn create_users_router(app_state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(user_handler::list_users).route_layer(middleware::from_fn(admin_only)),
        )
        .route("/profile", get(user_handler::profile))
        .route_layer(middleware::from_fn_with_state(
            app_state.auth_state.jwt_service.clone(),
            require_auth,
        ))
}
