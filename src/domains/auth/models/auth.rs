use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// 회원가입 요청 모델
// Missing fields deserialize as empty strings and are rejected by validation (400).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = SignupRequest)]
pub struct SignupRequest {
    /// Display name
    /// 표시 이름
    #[serde(default)]
    #[schema(example = "Jane")]
    pub name: String,

    /// Email address
    /// 이메일 주소
    #[serde(default)]
    #[schema(example = "jane@x.com")]
    pub email: String,

    /// Password (will be hashed)
    /// 비밀번호 (해싱됨)
    #[serde(default)]
    #[schema(example = "p1")]
    pub password: String,
}

// 로그인 요청 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = LoginRequest)]
pub struct LoginRequest {
    #[serde(default)]
    #[schema(example = "jane@x.com")]
    pub email: String,

    #[serde(default)]
    #[schema(example = "p1")]
    pub password: String,
}

// 토큰 응답 모델 (login / refresh)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = TokenResponse)]
pub struct TokenResponse {
    /// JWT Access Token (짧은 수명)
    /// JWT Access Token (short lifetime)
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
}
