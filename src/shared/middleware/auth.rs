use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use crate::domains::auth::models::Role;
use crate::domains::auth::services::JwtService;
use crate::shared::errors::AuthError;

/// 인증된 사용자 정보 (JWT 토큰에서 추출)
/// Request context populated by [`require_auth`] and read by downstream handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: u64,
    pub role: Role,
    pub email: String,
}

/// `Authorization: Bearer <token>` 헤더에서 토큰 추출
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AuthError::Unauthenticated("missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AuthError::Unauthenticated("authorization header is not valid ascii".to_string()))?;

    // 스킴 이름은 대소문자 구분 없음
    let token = value
        .trim_start()
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .ok_or_else(|| AuthError::Unauthenticated("authorization scheme is not Bearer".to_string()))?;

    if token.is_empty() {
        return Err(AuthError::Unauthenticated("empty bearer token".to_string()));
    }

    Ok(token)
}

/// Authentication step.
///
/// 토큰 검증 후 `AuthContext` 를 request extensions 에 넣고 다음 단계로 진행.
/// 실패 사유는 로그에만 남고 응답은 항상 401 "Unauthorized".
///
/// ```rust,ignore
/// Router::new()
///     .route("/profile", get(profile))
///     .route_layer(middleware::from_fn_with_state(jwt_service, require_auth));
/// ```
pub async fn require_auth(
    State(jwt_service): State<JwtService>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(token) => token,
        Err(e) => return e.into_response(),
    };

    match jwt_service.verify(token) {
        Ok(identity) => {
            request.extensions_mut().insert(AuthContext {
                user_id: identity.user_id,
                role: identity.role,
                email: identity.email,
            });
            next.run(request).await
        }
        Err(e) => AuthError::from(e).into_response(),
    }
}

/// 역할 비교 (I/O 없음)
pub fn require_role(required: Role, context: &AuthContext) -> Result<(), AuthError> {
    if context.role == required {
        Ok(())
    } else {
        tracing::warn!(user_id = context.user_id, role = %context.role, required = %required, "role check failed");
        Err(AuthError::Forbidden)
    }
}

/// Authorization step: Admin 전용.
/// Must run after [`require_auth`]; without a context the request is 401, not 403.
pub async fn admin_only(request: Request, next: Next) -> Response {
    let Some(context) = request.extensions().get::<AuthContext>() else {
        return AuthError::Unauthenticated("no authenticated identity in request context".to_string())
            .into_response();
    };

    match require_role(Role::Admin, context) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

/// AuthContext를 Axum Extractor로 구현
///
/// 사용법:
/// ```rust,ignore
/// pub async fn profile(context: AuthContext) -> ... {
///     let user_id = context.user_id;
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| AuthError::Unauthenticated("no authenticated identity in request context".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    const SECRET: &str = "middleware-test-secret-0123456789abcdef";

    fn jwt() -> JwtService {
        JwtService::new(Some(SECRET))
    }

    async fn whoami(context: AuthContext) -> String {
        format!("{}:{}", context.user_id, context.role)
    }

    fn protected_app() -> Router {
        Router::new()
            .route("/admin", get(whoami).route_layer(middleware::from_fn(admin_only)))
            .route("/me", get(whoami))
            .route_layer(middleware::from_fn_with_state(jwt(), require_auth))
    }

    fn request(path: &str, authorization: Option<String>) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder().uri(path);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");

        headers.insert(AUTHORIZATION, "Bearerabc".parse().unwrap());
        assert!(bearer_token(&headers).is_err());
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        let mut headers = HeaderMap::new();

        headers.insert(AUTHORIZATION, "bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");

        headers.insert(AUTHORIZATION, "BEARER abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_require_role() {
        let user = AuthContext { user_id: 1, role: Role::User, email: "a@b.co".into() };
        let admin = AuthContext { user_id: 2, role: Role::Admin, email: "c@d.co".into() };

        assert!(matches!(require_role(Role::Admin, &user), Err(AuthError::Forbidden)));
        assert!(require_role(Role::Admin, &admin).is_ok());
        assert!(require_role(Role::User, &user).is_ok());
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let response = protected_app().oneshot(request("/me", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_populates_context() {
        let token = jwt().issue(7, Role::User, "jane@x.com").unwrap();
        let response = protected_app()
            .oneshot(request("/me", Some(format!("Bearer {}", token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"7:user");
    }

    #[tokio::test]
    async fn test_token_signed_with_other_key_is_unauthorized() {
        let token = JwtService::new(Some("some-other-secret-0123456789abcdef"))
            .issue(7, Role::Admin, "jane@x.com")
            .unwrap();
        let response = protected_app()
            .oneshot(request("/me", Some(format!("Bearer {}", token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_route_forbids_user_role() {
        let user_token = jwt().issue(7, Role::User, "jane@x.com").unwrap();
        let admin_token = jwt().issue(1, Role::Admin, "root@x.com").unwrap();

        let forbidden = protected_app()
            .oneshot(request("/admin", Some(format!("Bearer {}", user_token))))
            .await
            .unwrap();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let allowed = protected_app()
            .oneshot(request("/admin", Some(format!("Bearer {}", admin_token))))
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_only_without_authentication_is_unauthorized() {
        let app = Router::new().route("/admin", get(|| async { "ok" }).route_layer(middleware::from_fn(admin_only)));

        let response = app.oneshot(request("/admin", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
