use thiserror::Error;
use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use crate::shared::errors::{RefreshError, StoreError, TokenError};

/// 401 응답에 사용하는 공통 메시지 (실패 원인을 노출하지 않음)
/// Generic body for every 401 so callers cannot tell which check failed
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// 인증 관련 에러 (HTTP 경계)
/// Authentication errors as seen at the HTTP boundary
#[derive(Error, Debug)]
pub enum AuthError {
    /// 잘못된 입력
    /// Malformed or missing input
    #[error("Invalid request: {0}")]
    Validation(String),

    /// 이메일이 이미 존재함
    /// Email already exists
    #[error("Email already exists: {email}")]
    EmailAlreadyExists { email: String },

    /// 잘못된 이메일 또는 비밀번호
    /// Invalid email or password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// 토큰 없음 / 잘못된 토큰 / 만료된 토큰
    /// Missing, invalid or expired access token (reason is logged only)
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// 권한 부족
    /// Valid identity, insufficient role
    #[error("Forbidden")]
    Forbidden,

    /// 요청 한도 초과
    /// Token bucket exhausted
    #[error("Rate limit exceeded")]
    RateLimited { retry_after: u64 },

    /// 이미 사용된 리프레시 토큰 재사용 (탈취 의심)
    /// A retired refresh token was presented again; the user's family is revoked
    #[error("Refresh token reuse detected for user {user_id}")]
    TokenReuseDetected { user_id: u64 },

    /// 리프레시 토큰 소유자 불일치
    /// Refresh token owner differs from the access token subject
    #[error("Refresh token owner mismatch")]
    OwnerMismatch,

    /// 저장소 장애 (타임아웃 포함)
    /// Persistence failure or timeout
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// 설정 오류 (서명 키 없음 등)
    /// Missing signing key or other configuration problem
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 내부 서버 에러
    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::EmailAlreadyExists { .. } => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials
            | AuthError::Unauthenticated(_)
            | AuthError::TokenReuseDetected { .. }
            | AuthError::OwnerMismatch => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AuthError::StoreUnavailable(_)
            | AuthError::Configuration(_)
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 클라이언트에게 보여줄 메시지
    /// Message echoed to the caller; internal detail never leaves the process
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Validation(_) | AuthError::EmailAlreadyExists { .. } => self.to_string(),
            AuthError::InvalidCredentials
            | AuthError::Unauthenticated(_)
            | AuthError::TokenReuseDetected { .. }
            | AuthError::OwnerMismatch => UNAUTHORIZED_MESSAGE.to_string(),
            AuthError::Forbidden => "Forbidden".to_string(),
            AuthError::RateLimited { .. } => "Too Many Requests".to_string(),
            AuthError::StoreUnavailable(_)
            | AuthError::Configuration(_)
            | AuthError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

/// AuthError를 HTTP 응답으로 변환
impl From<AuthError> for (StatusCode, Json<serde_json::Value>) {
    fn from(err: AuthError) -> Self {
        let status = err.status();

        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        } else if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(reason = %err, "request rejected as unauthenticated");
        } else {
            tracing::debug!(reason = %err, status = %status, "request rejected");
        }

        (status, Json(json!({ "error": err.public_message() })))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let retry_after = match &self {
            AuthError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        };

        let (status, body): (StatusCode, Json<serde_json::Value>) = self.into();
        let mut response = (status, body).into_response();

        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Configuration(msg) => AuthError::Configuration(msg),
            TokenError::Encoding(msg) => AuthError::Internal(msg),
            other => AuthError::Unauthenticated(other.to_string()),
        }
    }
}

impl From<RefreshError> for AuthError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::OwnerMismatch => AuthError::OwnerMismatch,
            RefreshError::TokenReuseDetected { user_id } => AuthError::TokenReuseDetected { user_id },
            RefreshError::StoreUnavailable(msg) => AuthError::StoreUnavailable(msg),
            other => AuthError::Unauthenticated(other.to_string()),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::StoreUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::Unauthenticated("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::TokenReuseDetected { user_id: 1 }.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::OwnerMismatch.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::RateLimited { retry_after: 1 }.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AuthError::StoreUnavailable("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AuthError::Configuration("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_unauthenticated_body_is_generic() {
        let response = AuthError::Unauthenticated("signature mismatch".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"Unauthorized"}"#);
    }

    #[tokio::test]
    async fn test_store_failure_hides_detail() {
        let response = AuthError::StoreUnavailable("connection refused 10.0.0.3".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!body.contains("10.0.0.3"));
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AuthError::RateLimited { retry_after: 3 }.into_response();
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "3");
    }
}
