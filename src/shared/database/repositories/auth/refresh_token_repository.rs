use sqlx::{postgres::PgRow, PgPool, Row};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::domains::auth::models::refresh_token::{RefreshToken, RefreshTokenCreate};
use crate::shared::database::store::RefreshTokenStore;
use crate::shared::errors::StoreError;

/// Refresh Token Repository
/// Refresh Token 데이터베이스 작업 처리
pub struct RefreshTokenRepository {
    pool: PgPool,
}

impl RefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_token(row: &PgRow) -> RefreshToken {
        RefreshToken {
            id: row.get("id"),
            user_id: row.get::<i64, _>("user_id") as u64,
            token_hash: row.get("token_hash"),
            expires_at: row.get("expires_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            revoked: row.get("revoked"),
        }
    }
}

#[async_trait]
impl RefreshTokenStore for RefreshTokenRepository {
    /// Refresh Token 생성 (저장)
    /// Create and store refresh token
    async fn create(&self, data: RefreshTokenCreate) -> Result<RefreshToken, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at, revoked, created_at, updated_at)
            VALUES ($1, $2, $3, FALSE, NOW(), NOW())
            RETURNING id, user_id, token_hash, expires_at, created_at, updated_at, revoked
            "#,
        )
        .bind(data.user_id as i64)  // u64 -> i64 변환 (DB는 BIGINT = i64)
        .bind(&data.token_hash)
        .bind(data.expires_at)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create refresh token")?;

        Ok(Self::row_to_token(&row))
    }

    /// Refresh Token 조회 (token_hash로)
    /// Find refresh token by token hash
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, token_hash, expires_at, created_at, updated_at, revoked
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find refresh token")?;

        Ok(row.as_ref().map(Self::row_to_token))
    }

    /// 회전: 기존 토큰 폐기 + 새 토큰 생성 (하나의 트랜잭션)
    /// Rotation: conditional retire + insert in one transaction
    async fn retire_and_issue(
        &self,
        retired_id: i64,
        replacement: RefreshTokenCreate,
    ) -> Result<Option<RefreshToken>, StoreError> {
        let mut tx = self.pool.begin().await
            .context("Failed to begin rotation transaction")?;

        // 읽은 시점의 revoked = FALSE 를 조건으로 갱신 (동시 회전 중 하나만 성공)
        let retired = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, updated_at = NOW()
            WHERE id = $1 AND revoked = FALSE
            "#,
        )
        .bind(retired_id)
        .execute(&mut *tx)
        .await
        .context("Failed to retire refresh token")?;

        if retired.rows_affected() == 0 {
            tx.rollback().await
                .context("Failed to roll back rotation transaction")?;
            return Ok(None);
        }

        let row = sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at, revoked, created_at, updated_at)
            VALUES ($1, $2, $3, FALSE, NOW(), NOW())
            RETURNING id, user_id, token_hash, expires_at, created_at, updated_at, revoked
            "#,
        )
        .bind(replacement.user_id as i64)
        .bind(&replacement.token_hash)
        .bind(replacement.expires_at)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert rotated refresh token")?;

        tx.commit().await
            .context("Failed to commit rotation transaction")?;

        Ok(Some(Self::row_to_token(&row)))
    }

    /// Refresh Token 무효화 (revoked = true)
    /// Revoke refresh token
    async fn revoke(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, updated_at = NOW()
            WHERE id = $1 AND revoked = FALSE
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to revoke refresh token")?;

        Ok(result.rows_affected() > 0)
    }

    /// 사용자의 모든 Refresh Token 무효화
    /// Revoke all refresh tokens for a user
    async fn revoke_all_for_user(&self, user_id: u64) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, updated_at = NOW()
            WHERE user_id = $1 AND revoked = FALSE
            "#,
        )
        .bind(user_id as i64)  // DB에는 i64로 저장
        .execute(&self.pool)
        .await
        .context("Failed to revoke all refresh tokens for user")?;

        Ok(result.rows_affected())
    }

    /// 만료된 토큰 삭제 (정리 작업)
    /// Delete tokens that expired before `cutoff` (cleanup)
    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE expires_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .context("Failed to delete expired refresh tokens")?;

        Ok(result.rows_affected())
    }

    /// 특정 사용자의 유효한 Refresh Token 개수 조회
    /// Count valid refresh tokens for a user
    async fn count_valid_for_user(&self, user_id: u64) -> Result<u64, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM refresh_tokens
            WHERE user_id = $1 AND revoked = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(user_id as i64)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count valid refresh tokens")?;

        Ok(row.get::<i64, _>("count") as u64)
    }
}
