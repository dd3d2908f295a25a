// Rate limiter 통합 테스트 (라우터 전체 경유)
mod common;

use std::net::SocketAddr;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::*;

fn health_from(addr: [u8; 4]) -> Request<Body> {
    request_builder_from("GET", "/health", SocketAddr::from((addr, 5000)))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_burst_exhaustion_returns_429_with_retry_after() {
    let app = TestApp::with_env(&[("JWT_SECRET", TEST_SECRET), ("RATE_LIMIT_BURST", "3")]);

    for i in 0..3 {
        let response = app.send(health_from([10, 0, 0, 1])).await;
        assert_eq!(response.status(), StatusCode::OK, "request {} should pass", i);
    }

    let limited = app.send(health_from([10, 0, 0, 1])).await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.headers().get(header::RETRY_AFTER).unwrap(), "1");

    // 다른 주소는 독립된 버킷
    let other = app.send(health_from([10, 0, 0, 2])).await;
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_runs_before_authentication() {
    let app = TestApp::with_env(&[("JWT_SECRET", TEST_SECRET), ("RATE_LIMIT_BURST", "1")]);

    let first = app
        .send(request_builder("GET", "/profile").body(Body::empty()).unwrap())
        .await;
    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);

    // 버킷이 비었으므로 인증 검사 전에 거절
    let second = app
        .send(request_builder("GET", "/profile").body(Body::empty()).unwrap())
        .await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_requests_without_client_address_share_a_bucket() {
    let app = TestApp::with_env(&[("JWT_SECRET", TEST_SECRET), ("RATE_LIMIT_BURST", "2")]);

    for _ in 0..2 {
        let response = app
            .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let limited = app
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_default_burst_rejects_tight_loop_after_thirty() {
    // RATE_LIMIT_BURST 미설정 → 기본값 30
    let app = TestApp::with_env(&[("JWT_SECRET", TEST_SECRET)]);

    for i in 1..=30 {
        let response = app.send(health_from([10, 0, 0, 9])).await;
        assert_eq!(response.status(), StatusCode::OK, "request #{} should pass", i);
    }

    let mut limited = 0;
    for _ in 31..=35 {
        if app.send(health_from([10, 0, 0, 9])).await.status() == StatusCode::TOO_MANY_REQUESTS {
            limited += 1;
        }
    }
    assert!(limited >= 1, "a tight loop past the default burst must be limited");
}
