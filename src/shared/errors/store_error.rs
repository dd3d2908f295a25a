use thiserror::Error;

/// 저장소 에러
/// Errors surfaced by credential / refresh-token stores
#[derive(Error, Debug)]
pub enum StoreError {
    /// 유니크 제약 위반 (예: 이메일 중복)
    /// Unique constraint violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 저장소 호출이 제한 시간을 넘김
    /// Call exceeded the per-call store timeout
    #[error("Store call timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// DB 연결/쿼리 실패
    /// Backend failure
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
