use thiserror::Error;
use crate::shared::errors::StoreError;

/// Access Token 발급/검증 에러
/// Token Issuer failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// 서명 키가 설정되지 않음
    #[error("No signing key configured: {0}")]
    Configuration(String),

    /// 서명 불일치 또는 예상치 못한 알고리즘
    #[error("Token signature is invalid")]
    SignatureInvalid,

    /// 필수 claim 누락 / 타입 불일치 / 구조 오류
    #[error("Token claims are malformed: {0}")]
    MalformedClaims(String),

    /// 만료된 토큰
    #[error("Token has expired")]
    Expired,

    /// 토큰 인코딩 실패
    #[error("Failed to encode token: {0}")]
    Encoding(String),
}

/// Refresh Ledger 에러
/// Refresh-token protocol failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("Refresh token not found")]
    NotFound,

    #[error("Refresh token owner does not match the presented identity")]
    OwnerMismatch,

    /// 이미 회전된 토큰이 다시 제시됨 → 해당 사용자의 모든 토큰 무효화 완료
    /// A retired token was presented again; the owner's family has been revoked
    #[error("Refresh token reuse detected for user {user_id}")]
    TokenReuseDetected { user_id: u64 },

    #[error("Refresh token has expired")]
    Expired,

    #[error("Refresh ledger unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for RefreshError {
    fn from(err: StoreError) -> Self {
        RefreshError::StoreUnavailable(err.to_string())
    }
}
