use std::sync::Arc;
use crate::domains::auth::services::{AuthState, JwtService};
use crate::shared::config::{Config, CookieSettings};
use crate::shared::database::{
    CredentialStore, Database, MemoryStore, RefreshTokenRepository, RefreshTokenStore, UserRepository,
};
use crate::shared::middleware::RateLimiter;
use crate::shared::services::CleanupScheduler;

/// Application state (combines all domain states)
/// 애플리케이션 상태 (모든 도메인 상태를 조합)
///
/// 저장소 구현(Postgres / 메모리)은 생성자에서 결정되고,
/// 나머지 코드는 trait object 로만 접근합니다.
#[derive(Clone)]
pub struct AppState {
    pub auth_state: AuthState,
    /// 클라이언트별 Token Bucket (프로세스 내 단일 인스턴스)
    pub rate_limiter: RateLimiter,
    /// Refresh cookie 의 Secure / Domain 속성
    pub cookie_settings: CookieSettings,
}

impl AppState {
    /// Postgres 저장소로 생성
    pub fn new(db: Database, config: &Config) -> Self {
        let users = Arc::new(UserRepository::new(db.pool().clone()));
        let refresh_tokens = Arc::new(RefreshTokenRepository::new(db.pool().clone()));

        Self::with_stores(users, refresh_tokens, config)
    }

    /// 메모리 저장소로 생성 (통합 테스트 / 로컬 실행용)
    pub fn in_memory(store: Arc<MemoryStore>, config: &Config) -> Self {
        Self::with_stores(store.clone(), store, config)
    }

    fn with_stores(
        users: Arc<dyn CredentialStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        config: &Config,
    ) -> Self {
        let jwt_service = JwtService::new(config.jwt_secret.as_deref());
        if !jwt_service.is_configured() {
            tracing::warn!("JWT_SECRET is not set; login, refresh and protected routes will fail");
        }

        Self {
            auth_state: AuthState::new(users, refresh_tokens, jwt_service, config.store_timeout),
            rate_limiter: RateLimiter::new(config.rate_limit),
            cookie_settings: config.cookie_settings(),
        }
    }

    /// 정리 스케줄러 생성 (설정된 경우에만)
    pub fn cleanup_scheduler(&self, config: &Config) -> Option<CleanupScheduler> {
        config.cleanup_interval.map(|period| {
            CleanupScheduler::new(
                self.auth_state.refresh_ledger.clone(),
                self.rate_limiter.clone(),
                period,
            )
        })
    }
}
