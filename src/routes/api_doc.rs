// OpenAPI 스키마 정의: Swagger 문서 자동 생성
use utoipa::OpenApi;
use crate::domains::auth::models::{LoginRequest, Role, SignupRequest, TokenResponse, UserResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::domains::auth::handlers::auth_handler::signup,
        crate::domains::auth::handlers::auth_handler::login,
        crate::domains::auth::handlers::auth_handler::refresh,
        crate::domains::auth::handlers::auth_handler::logout,
        crate::domains::users::handlers::user_handler::profile,
        crate::domains::users::handlers::user_handler::list_users
    ),
    components(schemas(
        SignupRequest,
        LoginRequest,
        TokenResponse,
        UserResponse,
        Role
    )),
    modifiers(
        &SecurityAddon
    ),
    tags(
        (name = "Auth", description = "Signup, login, refresh-token rotation and logout"),
        (name = "Users", description = "Protected user endpoints")
    ),
    info(
        title = "Session Gate",
        description = "Authentication and session lifecycle service",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

// Security scheme 정의: Swagger UI에서 "Authorize" 버튼 추가
pub struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "BearerAuth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
