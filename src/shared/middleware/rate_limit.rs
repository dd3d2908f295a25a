//! Rate limiting middleware.
//!
//! 클라이언트 주소별 Token Bucket. 다른 모든 처리보다 먼저 적용됩니다.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use crate::shared::errors::AuthError;

/// 주소를 알 수 없는 요청이 공유하는 키
pub const UNKNOWN_CLIENT_KEY: &str = "unknown";

/// Rate Limiter 설정.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    /// 버킷 용량 (순간적으로 허용되는 요청 수)
    pub burst: u32,
    /// 초당 리필되는 토큰 수
    pub refill_per_second: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            burst: 30,
            refill_per_second: 1.0,
        }
    }
}

/// Token Bucket 구조체.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    capacity: f64,
    refill_rate: f64,
}

impl TokenBucket {
    fn new(config: &RateLimitConfig, now: Instant) -> Self {
        let capacity = f64::from(config.burst);
        Self {
            tokens: capacity,
            last_refill: now,
            capacity,
            refill_rate: config.refill_per_second,
        }
    }

    fn try_acquire(&mut self, now: Instant) -> bool {
        self.refill(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: Instant) {
        // 시각이 뒤로 가면 리필 없음
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();

        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = self.last_refill.max(now);
    }

    /// 다음 토큰까지 대기 시간 (초, 올림, 최소 1)
    fn retry_after_secs(&self) -> u64 {
        if self.refill_rate <= 0.0 {
            return u64::MAX;
        }
        let wait = ((1.0 - self.tokens).max(0.0) / self.refill_rate).ceil() as u64;
        wait.max(1)
    }
}

/// Rate Limit 확인 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited {
        /// 재시도까지 대기 시간 (초)
        retry_after: u64,
    },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed)
    }
}

/// Rate Limiter.
///
/// One mutex covers bucket creation and the consume decision, so concurrent
/// first requests from the same key share a single bucket. Owned by
/// `AppState` and handed to the middleware; nothing here is global.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<Mutex<HashMap<String, TokenBucket>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// 요청 허용 여부 확인.
    pub fn admit(&self, client_key: &str) -> RateLimitDecision {
        self.admit_at(client_key, Instant::now())
    }

    pub fn admit_at(&self, client_key: &str, now: Instant) -> RateLimitDecision {
        let mut buckets = self.buckets.lock();

        let bucket = buckets
            .entry(client_key.to_string())
            .or_insert_with(|| TokenBucket::new(&self.config, now));

        if bucket.try_acquire(now) {
            RateLimitDecision::Allowed
        } else {
            RateLimitDecision::Limited {
                retry_after: bucket.retry_after_secs(),
            }
        }
    }

    /// `max_idle` 이상 사용되지 않은 버킷 제거. 제거된 개수 반환
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        self.evict_idle_at(max_idle, Instant::now())
    }

    pub fn evict_idle_at(&self, max_idle: Duration, now: Instant) -> usize {
        let mut buckets = self.buckets.lock();
        let before = buckets.len();

        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < max_idle);

        before - buckets.len()
    }

    /// 현재 추적 중인 키 수
    pub fn tracked_keys(&self) -> usize {
        self.buckets.lock().len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

/// Rate Limiting 미들웨어 함수.
///
/// 연결 주소(IP)별로 적용. `ConnectInfo` 가 없으면 `"unknown"` 키를 공유합니다.
pub async fn rate_limit(State(limiter): State<RateLimiter>, request: Request, next: Next) -> Response {
    let client_key = client_key(&request);

    match limiter.admit(&client_key) {
        RateLimitDecision::Allowed => next.run(request).await,
        RateLimitDecision::Limited { retry_after } => {
            tracing::warn!(client_key = %client_key, retry_after, "rate limit exceeded");
            AuthError::RateLimited { retry_after }.into_response()
        }
    }
}

fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT_KEY.to_string())
}
