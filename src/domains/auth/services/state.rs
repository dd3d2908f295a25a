// Auth domain state
// 인증 도메인 상태
use std::sync::Arc;
use std::time::Duration;
use crate::shared::database::{CredentialStore, RefreshTokenStore};
use crate::domains::auth::services::{AuthService, JwtService, RefreshLedger};

/// Auth domain state
/// 인증 도메인에서 필요한 서비스들을 포함하는 상태
#[derive(Clone)]
pub struct AuthState {
    pub auth_service: AuthService,
    pub jwt_service: JwtService,
    pub refresh_ledger: RefreshLedger,
}

impl AuthState {
    /// AuthState 생성 (저장소 구현과 JWT 서비스 주입)
    pub fn new(
        users: Arc<dyn CredentialStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        jwt_service: JwtService,
        store_timeout: Duration,
    ) -> Self {
        let refresh_ledger = RefreshLedger::new(refresh_tokens, store_timeout);

        Self {
            auth_service: AuthService::new(users, jwt_service.clone(), refresh_ledger.clone(), store_timeout),
            jwt_service,
            refresh_ledger,
        }
    }
}
