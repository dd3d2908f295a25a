// src/domains/auth/services/jwt_service.rs
use crate::shared::errors::TokenError;
use crate::domains::auth::models::jwt::{Claims, VerifiedIdentity};
use crate::domains::auth::models::user::Role;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Access Token 수명 (시간)
/// Access token lifetime in hours
pub const ACCESS_TOKEN_TTL_HOURS: i64 = 24;

/// 서명 알고리즘 (HS256 만 허용)
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Clone)]
struct SigningKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

/// JWT 서비스
/// Token Issuer: mints and verifies HS256 access tokens.
///
/// Verification is a pure function of (token, key, clock): the `*_at`
/// variants take the clock explicitly, the plain variants read `Utc::now()`.
#[derive(Clone)]
pub struct JwtService {
    keys: Option<SigningKeys>,
}

impl JwtService {
    /// JWT Service 생성
    /// `None` or an empty secret leaves the issuer unconfigured; every call then
    /// fails with [`TokenError::Configuration`].
    pub fn new(secret: Option<&str>) -> Self {
        let keys = secret
            .filter(|s| !s.is_empty())
            .map(|s| SigningKeys {
                encoding_key: EncodingKey::from_secret(s.as_bytes()),
                decoding_key: DecodingKey::from_secret(s.as_bytes()),
            });

        Self { keys }
    }

    pub fn is_configured(&self) -> bool {
        self.keys.is_some()
    }

    fn keys(&self) -> Result<&SigningKeys, TokenError> {
        self.keys
            .as_ref()
            .ok_or_else(|| TokenError::Configuration("JWT_SECRET is not set".to_string()))
    }

    /// Access Token 발급
    /// Issue(subject, role, email)
    pub fn issue(&self, user_id: u64, role: Role, email: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, role, email, chrono::Utc::now().timestamp())
    }

    pub fn issue_at(&self, user_id: u64, role: Role, email: &str, now: i64) -> Result<String, TokenError> {
        let keys = self.keys()?;
        let claims = Claims::new(user_id, role, email.to_string(), now, ACCESS_TOKEN_TTL_HOURS);

        encode(&Header::new(SIGNING_ALGORITHM), &claims, &keys.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Access Token 검증
    /// Verify(token): signature, structure and expiration
    pub fn verify(&self, token: &str) -> Result<VerifiedIdentity, TokenError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<VerifiedIdentity, TokenError> {
        let claims = self.decode_claims(token)?;

        // exp 가 검증 시각과 같거나 이전이면 만료
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }

        Self::identity(claims)
    }

    /// 만료는 무시하고 서명/구조만 검증 (refresh, logout 에서 subject 확인용)
    /// Signature and structure only; used where just the embedded subject is trusted
    pub fn verify_ignoring_expiry(&self, token: &str) -> Result<VerifiedIdentity, TokenError> {
        let claims = self.decode_claims(token)?;
        Self::identity(claims)
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        let keys = self.keys()?;

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        // 만료는 직접 검사 (주입된 시각 기준)
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &keys.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::SignatureInvalid,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::MissingRequiredClaim(claim) => {
                    TokenError::MalformedClaims(format!("missing claim `{}`", claim))
                }
                _ => TokenError::MalformedClaims(e.to_string()),
            })
    }

    fn identity(claims: Claims) -> Result<VerifiedIdentity, TokenError> {
        let user_id = claims
            .sub
            .parse::<u64>()
            .map_err(|_| TokenError::MalformedClaims("subject is not a user id".to_string()))?;

        if claims.email.is_empty() {
            return Err(TokenError::MalformedClaims("email claim is empty".to_string()));
        }

        Ok(VerifiedIdentity {
            user_id,
            role: claims.role,
            email: claims.email,
        })
    }
}
