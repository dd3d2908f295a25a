use sqlx::{postgres::PgRow, PgPool, Row};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::Utc;
use crate::domains::auth::models::user::{Role, User};
use crate::shared::database::store::CredentialStore;
use crate::shared::errors::StoreError;

/// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";

pub struct UserRepository {
    pool: PgPool
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &PgRow) -> Result<User, StoreError> {
        let role: String = row.get("role");
        let role = Role::parse(&role)
            .ok_or_else(|| anyhow!("Unknown role stored for user: {}", role))?;

        Ok(User {
            id: row.get::<i64, _>("id") as u64,
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            role,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl CredentialStore for UserRepository {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id, name, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        let row = match result {
            Ok(row) => row,
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                return Err(StoreError::Conflict(format!("email {} already registered", email)));
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to create user").into()),
        };

        Self::row_to_user(&row)
    }

    // 이메일로 사용자 조회 (로그인용)
    // Get user by email (for login)
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by email")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    // ID로 사용자 조회
    // Get user by ID
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id as i64)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by id")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list users")?;

        rows.iter().map(Self::row_to_user).collect()
    }

    async fn update_password_hash(&self, id: u64, password_hash: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(password_hash)
        .bind(id as i64)
        .execute(&self.pool)
        .await
        .context("Failed to update password hash")?;

        Ok(())
    }
}
