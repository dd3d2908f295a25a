// src/domains/auth/services/refresh_ledger.rs
use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha2::{Digest, Sha256};
use crate::domains::auth::models::refresh_token::RefreshTokenCreate;
use crate::shared::database::store::{with_timeout, RefreshTokenStore};
use crate::shared::errors::RefreshError;

/// Refresh Token 유효 기간 (일)
/// Fixed refresh window from issuance
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 5;

/// 토큰 길이 (영숫자 64자)
const REFRESH_TOKEN_LENGTH: usize = 64;

/// Refresh Ledger
/// 리프레시 토큰 발급 / 회전 / 재사용 탐지
///
/// The raw token only ever lives in the client's cookie; the ledger stores its
/// SHA-256 hash. Per-token lifecycle:
///
/// ```text
/// Active --rotate--> Retired (sibling issued)
/// Active --time----> Expired
/// Retired --presented again--> family revocation + TokenReuseDetected
/// ```
#[derive(Clone)]
pub struct RefreshLedger {
    store: Arc<dyn RefreshTokenStore>,
    store_timeout: Duration,
}

impl RefreshLedger {
    pub fn new(store: Arc<dyn RefreshTokenStore>, store_timeout: Duration) -> Self {
        Self { store, store_timeout }
    }

    /// Refresh Token 생성 (랜덤 문자열)
    /// Generate an unguessable 64-character alphanumeric token
    pub fn generate_token() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(REFRESH_TOKEN_LENGTH)
            .map(char::from)
            .collect()
    }

    /// Refresh Token 해싱 (DB 저장용)
    /// Hash Refresh Token (for database storage)
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn mint(user_id: u64, now: DateTime<Utc>) -> (String, RefreshTokenCreate) {
        let token = Self::generate_token();
        let create = RefreshTokenCreate {
            user_id,
            token_hash: Self::hash_token(&token),
            expires_at: now + chrono::Duration::days(REFRESH_TOKEN_TTL_DAYS),
        };
        (token, create)
    }

    /// 새 Refresh Token 발급 (로그인 시)
    /// Issue(userID): persist a new valid record and return the raw token
    pub async fn issue(&self, user_id: u64) -> Result<String, RefreshError> {
        let (token, create) = Self::mint(user_id, Utc::now());

        with_timeout(self.store_timeout, self.store.create(create)).await?;

        tracing::debug!(user_id, "refresh token issued");
        Ok(token)
    }

    /// Refresh Token 회전
    /// Rotate(presentedToken, claimedOwnerID)
    pub async fn rotate(&self, presented: &str, claimed_owner: u64) -> Result<String, RefreshError> {
        let now = Utc::now();
        let token_hash = Self::hash_token(presented);

        // 1. DB에서 조회
        let record = with_timeout(self.store_timeout, self.store.find_by_token_hash(&token_hash))
            .await?
            .ok_or(RefreshError::NotFound)?;

        // 2. 소유자 확인 (원장은 변경하지 않음)
        if record.user_id != claimed_owner {
            tracing::warn!(
                token_owner = record.user_id,
                claimed_owner,
                "refresh token presented with another user's access token"
            );
            return Err(RefreshError::OwnerMismatch);
        }

        // 3. 이미 회전된 토큰 → 탈취 신호
        if record.revoked {
            return Err(self.revoke_family(record.user_id).await);
        }

        // 4. 만료 확인
        if record.is_expired_at(now) {
            return Err(RefreshError::Expired);
        }

        // 5. 폐기 + 새 토큰 생성 (원자적)
        let (token, replacement) = Self::mint(record.user_id, now);
        let issued = with_timeout(
            self.store_timeout,
            self.store.retire_and_issue(record.id, replacement),
        )
        .await?;

        match issued {
            Some(_) => {
                tracing::debug!(user_id = record.user_id, "refresh token rotated");
                Ok(token)
            }
            // 동시 회전에서 진 쪽: 같은 토큰이 두 번 사용된 것
            None => Err(self.revoke_family(record.user_id).await),
        }
    }

    /// 로그아웃: 제시된 토큰 하나만 폐기
    /// Revoke a single token after the same ownership check as rotation.
    pub async fn revoke(&self, presented: &str, claimed_owner: u64) -> Result<(), RefreshError> {
        let token_hash = Self::hash_token(presented);

        let record = with_timeout(self.store_timeout, self.store.find_by_token_hash(&token_hash))
            .await?
            .ok_or(RefreshError::NotFound)?;

        if record.user_id != claimed_owner {
            return Err(RefreshError::OwnerMismatch);
        }

        // 이미 회전된 토큰을 제시 → 회전과 동일하게 탈취로 처리
        if record.revoked {
            return Err(self.revoke_family(record.user_id).await);
        }

        with_timeout(self.store_timeout, self.store.revoke(record.id)).await?;
        Ok(())
    }

    /// 사용자의 모든 Refresh Token 무효화
    /// Revoke the whole family for `user_id`; returns how many were still valid.
    pub async fn revoke_all(&self, user_id: u64) -> Result<u64, RefreshError> {
        Ok(with_timeout(self.store_timeout, self.store.revoke_all_for_user(user_id)).await?)
    }

    /// `retention` 보다 오래전에 만료된 토큰 삭제
    pub async fn purge_expired(&self, retention: chrono::Duration) -> Result<u64, RefreshError> {
        let cutoff = Utc::now() - retention;
        Ok(with_timeout(self.store_timeout, self.store.delete_expired_before(cutoff)).await?)
    }

    async fn revoke_family(&self, user_id: u64) -> RefreshError {
        match self.revoke_all(user_id).await {
            Ok(revoked) => {
                tracing::warn!(user_id, revoked, "refresh token reuse detected, session family revoked");
                RefreshError::TokenReuseDetected { user_id }
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "refresh token reuse detected but family revocation failed");
                e
            }
        }
    }
}
