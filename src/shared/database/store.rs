// Store traits: the persistence seam consumed by the auth services.
// Postgres repositories and the in-memory store both implement these.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::domains::auth::models::{RefreshToken, RefreshTokenCreate, Role, User};
use crate::shared::errors::StoreError;

/// 사용자(자격 증명) 저장소
/// Credential Store
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 사용자 생성. 이메일 중복이면 `StoreError::Conflict`
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn update_password_hash(&self, id: u64, password_hash: &str) -> Result<(), StoreError>;
}

/// 리프레시 토큰 원장 저장소
/// Refresh Ledger persistence
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn create(&self, data: RefreshTokenCreate) -> Result<RefreshToken, StoreError>;

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, StoreError>;

    /// 기존 토큰 폐기 + 새 토큰 생성을 하나의 원자적 단위로 수행.
    /// The retire is conditioned on the row still being valid; returns `Ok(None)`
    /// without inserting anything if another caller retired it first.
    async fn retire_and_issue(
        &self,
        retired_id: i64,
        replacement: RefreshTokenCreate,
    ) -> Result<Option<RefreshToken>, StoreError>;

    /// 단일 토큰 폐기. 이번 호출로 폐기되었으면 true
    async fn revoke(&self, id: i64) -> Result<bool, StoreError>;

    /// 사용자의 모든 토큰 폐기. 폐기된 개수 반환
    async fn revoke_all_for_user(&self, user_id: u64) -> Result<u64, StoreError>;

    /// `cutoff` 이전에 만료된 토큰 삭제 (정리 작업)
    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn count_valid_for_user(&self, user_id: u64) -> Result<u64, StoreError>;
}

/// 저장소 호출에 제한 시간 적용. 시간 초과는 `StoreError::Timeout`
/// Bound a store call by `timeout`; expiry becomes `StoreError::Timeout`.
pub async fn with_timeout<T, F>(timeout: std::time::Duration, call: F) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| StoreError::Timeout(timeout))?
}
