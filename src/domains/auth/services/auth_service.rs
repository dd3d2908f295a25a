use std::sync::Arc;
use std::time::Duration;
use crate::shared::database::store::{with_timeout, CredentialStore};
use crate::domains::auth::models::{LoginRequest, Role, SignupRequest, User};
use crate::domains::auth::services::{JwtService, PasswordMatch, RefreshLedger, hash_password, verify_dummy_password, verify_password};
use crate::shared::errors::{AuthError, RefreshError, StoreError};

/// 로그인 / 갱신 결과: (access token, refresh token)
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

// 인증 서비스
// AuthService: signup, login, refresh rotation, logout and user lookups
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    jwt_service: JwtService,
    refresh_ledger: RefreshLedger,
    store_timeout: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        jwt_service: JwtService,
        refresh_ledger: RefreshLedger,
        store_timeout: Duration,
    ) -> Self {
        Self {
            users,
            jwt_service,
            refresh_ledger,
            store_timeout,
        }
    }

    // 회원가입 (비즈니스 로직)
    pub async fn signup(&self, request: SignupRequest) -> Result<User, AuthError> {
        let name = request.name.trim();
        let email = normalize_email(&request.email);

        if name.is_empty() {
            return Err(AuthError::Validation("name is required".to_string()));
        }
        if request.password.is_empty() {
            return Err(AuthError::Validation("password is required".to_string()));
        }
        if !is_valid_email(&email) {
            return Err(AuthError::Validation("email is malformed".to_string()));
        }

        // 1. 이메일 중복 확인
        let existing_user = with_timeout(self.store_timeout, self.users.find_by_email(&email)).await?;
        if existing_user.is_some() {
            return Err(AuthError::EmailAlreadyExists { email });
        }

        // 2. 비밀번호 해싱
        let password_hash = hash_password(&request.password)?;

        // 3. 사용자 생성 (동시 가입은 유니크 제약으로 걸러짐)
        let created = with_timeout(
            self.store_timeout,
            self.users.create_user(name, &email, &password_hash, Role::User),
        )
        .await;

        match created {
            Ok(user) => {
                tracing::info!(user_id = user.id, "user signed up");
                Ok(user)
            }
            Err(StoreError::Conflict(_)) => Err(AuthError::EmailAlreadyExists { email }),
            Err(e) => Err(e.into()),
        }
    }

    // 로그인 (비즈니스 로직)
    pub async fn login(&self, request: LoginRequest) -> Result<SessionTokens, AuthError> {
        let email = normalize_email(&request.email);
        if email.is_empty() || request.password.is_empty() {
            return Err(AuthError::Validation("email and password are required".to_string()));
        }

        // 1. 이메일로 사용자 조회
        let Some(user) = with_timeout(self.store_timeout, self.users.find_by_email(&email)).await? else {
            // 응답 시간으로 가입 여부가 드러나지 않도록 동일한 해시 비용 지불
            verify_dummy_password(&request.password);
            return Err(AuthError::InvalidCredentials);
        };

        // 2. 비밀번호 검증
        if verify_password(&request.password, &user.password_hash)? == PasswordMatch::Legacy {
            self.upgrade_legacy_hash(&user, &request.password).await;
        }

        // 3. Access Token 발급 (서명 키가 없으면 여기서 실패, 원장은 건드리지 않음)
        let access_token = self.jwt_service.issue(user.id, user.role, &user.email)?;

        // 4. 새 Refresh Token 생성 및 저장
        let refresh_token = self.refresh_ledger.issue(user.id).await?;

        tracing::info!(user_id = user.id, "user logged in");
        Ok(SessionTokens {
            access_token,
            refresh_token,
        })
    }

    /// Refresh Token 회전 + 새 Access Token 발급
    /// The access token may be expired; only its subject is trusted.
    pub async fn refresh(&self, access_token: &str, refresh_token: &str) -> Result<SessionTokens, AuthError> {
        let identity = self.jwt_service.verify_ignoring_expiry(access_token)?;

        let user = with_timeout(self.store_timeout, self.users.find_by_id(identity.user_id))
            .await?
            .ok_or_else(|| AuthError::Unauthenticated(format!("user {} no longer exists", identity.user_id)))?;

        let refresh_token = self.refresh_ledger.rotate(refresh_token, user.id).await?;
        let access_token = self.jwt_service.issue(user.id, user.role, &user.email)?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
        })
    }

    /// 로그아웃 - 제시된 Refresh Token 무효화
    /// Unknown tokens are ignored so logout stays idempotent.
    pub async fn logout(&self, access_token: &str, refresh_token: &str) -> Result<(), AuthError> {
        let identity = self.jwt_service.verify_ignoring_expiry(access_token)?;

        match self.refresh_ledger.revoke(refresh_token, identity.user_id).await {
            Ok(()) | Err(RefreshError::NotFound) => {
                tracing::info!(user_id = identity.user_id, "user logged out");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_user_info(&self, user_id: u64) -> Result<User, AuthError> {
        with_timeout(self.store_timeout, self.users.find_by_id(user_id))
            .await?
            .ok_or_else(|| AuthError::Unauthenticated(format!("user {} no longer exists", user_id)))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        Ok(with_timeout(self.store_timeout, self.users.list_users()).await?)
    }

    /// 레거시 SHA-256 해시를 Argon2id 로 교체. 실패해도 로그인은 계속 진행
    async fn upgrade_legacy_hash(&self, user: &User, password: &str) {
        let upgraded = match hash_password(password) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(user_id = user.id, error = %e, "failed to rehash legacy password");
                return;
            }
        };

        match with_timeout(self.store_timeout, self.users.update_password_hash(user.id, &upgraded)).await {
            Ok(()) => tracing::info!(user_id = user.id, "legacy password hash upgraded to argon2id"),
            Err(e) => tracing::warn!(user_id = user.id, error = %e, "failed to store upgraded password hash"),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// `local@domain.tld` 형태인지 확인 (도메인에 점이 있어야 함)
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    !local.is_empty()
        && !local.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
