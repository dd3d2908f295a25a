use serde::{Deserialize, Serialize};
use crate::domains::auth::models::user::Role;

/// JWT Claims (토큰에 포함될 데이터)
/// JWT Claims (data carried by an access token)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 사용자 ID (10진수 문자열)
    /// Subject: user ID as a decimal string
    pub sub: String,

    /// 사용자 역할
    /// Role
    pub role: Role,

    /// 이메일
    /// Email
    pub email: String,

    /// 만료 시간 (Unix timestamp)
    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// 발급 시간 (Unix timestamp)
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    /// 새 Claims 생성 (만료 시간 자동 계산)
    /// Create new Claims valid for `expiration_hours` from `now`
    pub fn new(user_id: u64, role: Role, email: String, now: i64, expiration_hours: i64) -> Self {
        Self {
            sub: user_id.to_string(),
            role,
            email,
            exp: now + expiration_hours * 3600,
            iat: now,
        }
    }
}

/// 검증된 토큰에서 꺼낸 신원 정보
/// Identity recovered from a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: u64,
    pub role: Role,
    pub email: String,
}
