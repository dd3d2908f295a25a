// 인메모리 저장소
// In-process implementation of both store traits. Used by the integration
// tests and for running the service without PostgreSQL.
use std::collections::HashMap;
use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use crate::domains::auth::models::{RefreshToken, RefreshTokenCreate, Role, User};
use crate::shared::database::store::{CredentialStore, RefreshTokenStore};
use crate::shared::errors::StoreError;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    refresh_tokens: HashMap<i64, RefreshToken>,
    next_user_id: u64,
    next_token_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    /// 모든 호출 앞에 삽입되는 지연 (타임아웃 테스트용)
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `latency` before touching the tables.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            latency: Some(latency),
        }
    }

    async fn simulate_io(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    /// 특정 사용자의 모든 토큰 (감사 용도)
    pub fn tokens_for_user(&self, user_id: u64) -> Vec<RefreshToken> {
        let tables = self.tables.lock();
        let mut tokens: Vec<RefreshToken> = tables
            .refresh_tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tokens.sort_by_key(|t| t.id);
        tokens
    }

    fn insert_token(tables: &mut Tables, data: RefreshTokenCreate) -> Result<RefreshToken, StoreError> {
        if tables.refresh_tokens.values().any(|t| t.token_hash == data.token_hash) {
            return Err(StoreError::Conflict("duplicate refresh token hash".to_string()));
        }

        tables.next_token_id += 1;
        let now = Utc::now();
        let token = RefreshToken {
            id: tables.next_token_id,
            user_id: data.user_id,
            token_hash: data.token_hash,
            expires_at: data.expires_at,
            created_at: now,
            updated_at: now,
            revoked: false,
        };
        tables.refresh_tokens.insert(token.id, token.clone());
        Ok(token)
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError> {
        self.simulate_io().await;
        let mut tables = self.tables.lock();

        if tables.users.iter().any(|u| u.email == email) {
            return Err(StoreError::Conflict(format!("email {} already registered", email)));
        }

        tables.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: tables.next_user_id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.simulate_io().await;
        Ok(self.tables.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        self.simulate_io().await;
        Ok(self.tables.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.simulate_io().await;
        Ok(self.tables.lock().users.clone())
    }

    async fn update_password_hash(&self, id: u64, password_hash: &str) -> Result<(), StoreError> {
        self.simulate_io().await;
        let mut tables = self.tables.lock();
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.password_hash = password_hash.to_string();
            user.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn create(&self, data: RefreshTokenCreate) -> Result<RefreshToken, StoreError> {
        self.simulate_io().await;
        Self::insert_token(&mut self.tables.lock(), data)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, StoreError> {
        self.simulate_io().await;
        Ok(self
            .tables
            .lock()
            .refresh_tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn retire_and_issue(
        &self,
        retired_id: i64,
        replacement: RefreshTokenCreate,
    ) -> Result<Option<RefreshToken>, StoreError> {
        self.simulate_io().await;
        // 하나의 락 구간 안에서 폐기 + 생성
        let mut tables = self.tables.lock();

        match tables.refresh_tokens.get(&retired_id) {
            Some(token) if !token.revoked => {}
            _ => return Ok(None),
        }

        let issued = Self::insert_token(&mut tables, replacement)?;
        if let Some(token) = tables.refresh_tokens.get_mut(&retired_id) {
            token.revoked = true;
            token.updated_at = Utc::now();
        }
        Ok(Some(issued))
    }

    async fn revoke(&self, id: i64) -> Result<bool, StoreError> {
        self.simulate_io().await;
        let mut tables = self.tables.lock();
        match tables.refresh_tokens.get_mut(&id) {
            Some(token) if !token.revoked => {
                token.revoked = true;
                token.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: u64) -> Result<u64, StoreError> {
        self.simulate_io().await;
        let mut tables = self.tables.lock();
        let now = Utc::now();
        let mut revoked = 0;
        for token in tables.refresh_tokens.values_mut() {
            if token.user_id == user_id && !token.revoked {
                token.revoked = true;
                token.updated_at = now;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        self.simulate_io().await;
        let mut tables = self.tables.lock();
        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|_, t| t.expires_at >= cutoff);
        Ok((before - tables.refresh_tokens.len()) as u64)
    }

    async fn count_valid_for_user(&self, user_id: u64) -> Result<u64, StoreError> {
        self.simulate_io().await;
        let now = Utc::now();
        Ok(self
            .tables
            .lock()
            .refresh_tokens
            .values()
            .filter(|t| t.user_id == user_id && !t.revoked && t.expires_at > now)
            .count() as u64)
    }
}
