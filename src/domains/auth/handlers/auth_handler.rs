use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use crate::domains::auth::models::{LoginRequest, SignupRequest, TokenResponse};
use crate::domains::auth::services::REFRESH_TOKEN_TTL_DAYS;
use crate::shared::config::CookieSettings;
use crate::shared::errors::AuthError;
use crate::shared::middleware::bearer_token;
use crate::shared::services::AppState;

/// Refresh Token 쿠키 이름
pub const REFRESH_COOKIE: &str = "refresh";

/// 쿠키 Max-Age (초) = Refresh Token 유효 기간
pub const REFRESH_COOKIE_MAX_AGE_SECS: i64 = REFRESH_TOKEN_TTL_DAYS * 24 * 60 * 60;

/// HttpOnly; SameSite=Strict; Path=/ (+ Secure, Domain in production)
fn refresh_cookie(value: String, settings: &CookieSettings) -> Cookie<'static> {
    let mut builder = Cookie::build((REFRESH_COOKIE, value))
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(REFRESH_COOKIE_MAX_AGE_SECS))
        .path("/")
        .secure(settings.secure);

    if let Some(domain) = &settings.domain {
        builder = builder.domain(domain.clone());
    }

    builder.build()
}

/// 쿠키 삭제용 (Path / Domain 이 발급 시와 같아야 함)
fn expired_refresh_cookie(settings: &CookieSettings) -> Cookie<'static> {
    let mut builder = Cookie::build((REFRESH_COOKIE, "")).path("/");
    if let Some(domain) = &settings.domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AuthError::Validation(rejection.body_text()))
}

fn presented_refresh_token(jar: &CookieJar) -> Result<String, AuthError> {
    jar.get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AuthError::Unauthenticated("missing refresh cookie".to_string()))
}

// 회원가입 핸들러
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "User created"),
        (status = 400, description = "Malformed input or email already exists"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn signup(
    State(app_state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<StatusCode, AuthError> {
    let request = json_body(payload)?;

    // Service 호출 (비즈니스 로직)
    app_state.auth_state.auth_service.signup(request).await?;

    Ok(StatusCode::OK)
}

// 로그인 핸들러
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token in the body, refresh token in an HttpOnly cookie", body = TokenResponse),
        (status = 400, description = "Malformed input"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<TokenResponse>), AuthError> {
    let request = json_body(payload)?;

    let session = app_state.auth_state.auth_service.login(request).await?;

    let jar = jar.add(refresh_cookie(session.refresh_token, &app_state.cookie_settings));
    Ok((jar, Json(TokenResponse { token: session.access_token })))
}

/// 토큰 갱신 핸들러
/// Bearer access token (may be expired) + refresh cookie → rotated cookie + new access token
#[utoipa::path(
    post,
    path = "/refresh",
    responses(
        (status = 200, description = "Refresh token rotated", body = TokenResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Auth"
)]
pub async fn refresh(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<TokenResponse>), AuthError> {
    let access_token = bearer_token(&headers)?;
    let presented = presented_refresh_token(&jar)?;

    let session = app_state
        .auth_state
        .auth_service
        .refresh(access_token, &presented)
        .await?;

    let jar = jar.add(refresh_cookie(session.refresh_token, &app_state.cookie_settings));
    Ok((jar, Json(TokenResponse { token: session.access_token })))
}

/// 로그아웃 핸들러
/// Revokes the presented refresh token and clears the cookie
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Auth"
)]
pub async fn logout(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), AuthError> {
    let access_token = bearer_token(&headers)?;

    // 쿠키가 없으면 폐기할 토큰도 없음
    if let Ok(presented) = presented_refresh_token(&jar) {
        app_state
            .auth_state
            .auth_service
            .logout(access_token, &presented)
            .await?;
    } else {
        app_state.auth_state.jwt_service.verify_ignoring_expiry(access_token)?;
    }

    let jar = jar.remove(expired_refresh_cookie(&app_state.cookie_settings));
    Ok((jar, StatusCode::OK))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_cookie_attributes_in_development() {
        let cookie = refresh_cookie("abc".to_string(), &CookieSettings::default());
        let header = cookie.to_string();

        assert!(header.starts_with("refresh=abc"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Strict"));
        assert!(header.contains("Max-Age=432000"));
        assert!(header.contains("Path=/"));
        assert!(!header.contains("Secure"));
        assert!(!header.contains("Domain"));
    }

    #[test]
    fn test_refresh_cookie_attributes_in_production() {
        let settings = CookieSettings {
            secure: true,
            domain: Some("example.com".to_string()),
        };
        let header = refresh_cookie("abc".to_string(), &settings).to_string();

        assert!(header.contains("Secure"));
        assert!(header.contains("Domain=example.com"));
    }
}
