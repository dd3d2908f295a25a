// =====================================================
// 통합 테스트 공통 헬퍼
// =====================================================
// 목적: 메모리 저장소 위에 전체 라우터를 구성하고 요청을 보내는 헬퍼 제공
//
// 사용법:
// ```rust
// mod common;
// use common::*;
//
// #[tokio::test]
// async fn test_something() {
//     let app = TestApp::new();
//     let response = app.send(json_request("POST", "/signup", body)).await;
// }
// ```
// =====================================================
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use session_gate::build_app;
use session_gate::shared::config::Config;
use session_gate::shared::database::MemoryStore;
use session_gate::shared::services::AppState;

// 테스트용 상수
pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const CLIENT_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 40000);

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub config: Config,
}

impl TestApp {
    /// 기본 설정 (서명 키 있음, 넉넉한 rate limit)
    pub fn new() -> Self {
        Self::with_env(&[("JWT_SECRET", TEST_SECRET), ("RATE_LIMIT_BURST", "1000")])
    }

    pub fn with_env(vars: &[(&str, &str)]) -> Self {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let config = Config::from_lookup(|name| vars.get(name).cloned()).expect("test config");

        let store = Arc::new(MemoryStore::new());
        let state = AppState::in_memory(store.clone(), &config);

        Self {
            router: build_app(state, &config),
            store,
            config,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.expect("router is infallible")
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Response<Body> {
        self.send(json_request(
            "POST",
            "/signup",
            json!({ "name": name, "email": email, "password": password }),
        ))
        .await
    }

    /// 로그인 후 (access token, refresh cookie 값) 반환
    pub async fn login(&self, email: &str, password: &str) -> (String, String) {
        let response = self
            .send(json_request("POST", "/login", json!({ "email": email, "password": password })))
            .await;
        assert_eq!(response.status(), StatusCode::OK, "login should succeed");

        let cookie = refresh_cookie(&response).expect("login sets refresh cookie");
        let body = body_json(response).await;
        let token = body["token"].as_str().expect("token in body").to_string();
        (token, cookie)
    }

    pub async fn refresh(&self, access_token: &str, refresh: &str) -> Response<Body> {
        self.send(
            request_builder("POST", "/refresh")
                .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
                .header(header::COOKIE, format!("refresh={}", refresh))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn get_with_token(&self, uri: &str, access_token: &str) -> Response<Body> {
        self.send(
            request_builder("GET", uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

/// 고정된 클라이언트 주소(ConnectInfo)를 가진 요청 빌더
pub fn request_builder(method: &str, uri: &str) -> axum::http::request::Builder {
    request_builder_from(method, uri, SocketAddr::from(CLIENT_ADDR))
}

pub fn request_builder_from(method: &str, uri: &str, addr: SocketAddr) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .extension(ConnectInfo(addr))
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    request_builder(method, uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Set-Cookie 헤더에서 refresh 쿠키 값 추출
pub fn refresh_cookie(response: &Response<Body>) -> Option<String> {
    refresh_set_cookie(response).and_then(|raw| {
        raw.split(';')
            .next()
            .and_then(|pair| pair.trim().strip_prefix("refresh="))
            .map(str::to_string)
    })
}

/// refresh 쿠키의 Set-Cookie 헤더 전체
pub fn refresh_set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("refresh="))
        .map(str::to_string)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("response body is JSON")
}
