use axum::{extract::State, Json};
use crate::domains::auth::models::UserResponse;
use crate::shared::errors::AuthError;
use crate::shared::middleware::AuthContext;
use crate::shared::services::AppState;

// 내 정보 조회
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Caller's user record", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Users"
)]
pub async fn profile(
    State(app_state): State<AppState>,
    context: AuthContext,
) -> Result<Json<UserResponse>, AuthError> {
    let user = app_state
        .auth_state
        .auth_service
        .get_user_info(context.user_id)
        .await?;

    Ok(Json(user.into()))
}

// 전체 사용자 조회 (Admin 전용)
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Users"
)]
pub async fn list_users(State(app_state): State<AppState>) -> Result<Json<Vec<UserResponse>>, AuthError> {
    let users = app_state.auth_state.auth_service.list_users().await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}
