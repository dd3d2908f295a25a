use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use crate::domains::auth::services::RefreshLedger;
use crate::shared::errors::RefreshError;
use crate::shared::middleware::RateLimiter;

/// 만료 후 이 기간이 지난 Refresh Token 만 삭제 (감사 기록 보존)
pub const EXPIRED_TOKEN_RETENTION_DAYS: i64 = 30;

/// 이 시간 동안 요청이 없던 클라이언트 버킷은 제거
pub const IDLE_BUCKET_WINDOW: Duration = Duration::from_secs(600);

/// 한 번의 정리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupReport {
    pub purged_tokens: u64,
    pub evicted_buckets: usize,
}

/// 정리 스케줄러
/// Cleanup Scheduler
///
/// 역할:
/// - 오래전에 만료된 refresh_tokens 행 삭제
/// - 유휴 rate-limit 버킷 제거
///
/// `CLEANUP_INTERVAL_SECS` 가 설정된 경우에만 `main` 에서 시작됩니다.
#[derive(Clone)]
pub struct CleanupScheduler {
    refresh_ledger: RefreshLedger,
    rate_limiter: RateLimiter,
    period: Duration,
}

impl CleanupScheduler {
    pub fn new(refresh_ledger: RefreshLedger, rate_limiter: RateLimiter, period: Duration) -> Self {
        Self {
            refresh_ledger,
            rate_limiter,
            period,
        }
    }

    /// 스케줄러 시작
    /// Spawns the background loop; the first pass runs after one full period.
    pub fn start(&self) -> JoinHandle<()> {
        let scheduler = self.clone();

        tokio::spawn(async move {
            let mut ticker = interval(scheduler.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // interval 의 첫 tick 은 즉시 완료됨
            ticker.tick().await;

            loop {
                ticker.tick().await;

                match scheduler.run_once().await {
                    Ok(report) => tracing::info!(
                        purged_tokens = report.purged_tokens,
                        evicted_buckets = report.evicted_buckets,
                        "cleanup pass finished"
                    ),
                    Err(e) => tracing::error!(error = %e, "cleanup pass failed"),
                }
            }
        })
    }

    /// 정리 한 번 실행
    pub async fn run_once(&self) -> Result<CleanupReport, RefreshError> {
        let evicted_buckets = self.rate_limiter.evict_idle(IDLE_BUCKET_WINDOW);
        let purged_tokens = self
            .refresh_ledger
            .purge_expired(chrono::Duration::days(EXPIRED_TOKEN_RETENTION_DAYS))
            .await?;

        Ok(CleanupReport {
            purged_tokens,
            evicted_buckets,
        })
    }
}
