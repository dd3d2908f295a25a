use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Refresh Token 모델 (DB 저장용)
/// Refresh Token ledger row. `revoked == false` means the token is still valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: i64,
    pub user_id: u64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revoked: bool,
}

impl RefreshToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Refresh Token 생성 요청 (새 토큰 발급 시)
/// Refresh Token creation request (when issuing new token)
#[derive(Debug, Clone)]
pub struct RefreshTokenCreate {
    pub user_id: u64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}
