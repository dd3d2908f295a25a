//! 비밀번호 해싱
//! Password hashing: Argon2id for new hashes, unsalted SHA-256 accepted for legacy records.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use crate::shared::errors::AuthError;

/// 검증 결과: 레거시 해시면 로그인 후 Argon2 로 업그레이드해야 함
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordMatch {
    Current,
    /// Stored hash is a legacy SHA-256 digest and should be rehashed
    Legacy,
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))?
        .to_string();

    Ok(password_hash)
}

pub fn verify_password(password: &str, stored_hash: &str) -> Result<PasswordMatch, AuthError> {
    if is_legacy_hash(stored_hash) {
        let digest = format!("{:x}", Sha256::digest(password.as_bytes()));
        return if constant_time_eq(digest.as_bytes(), stored_hash.to_ascii_lowercase().as_bytes()) {
            Ok(PasswordMatch::Legacy)
        } else {
            Err(AuthError::InvalidCredentials)
        };
    }

    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)?;

    Ok(PasswordMatch::Current)
}

/// 존재하지 않는 이메일에도 같은 Argon2 비용을 지불하기 위한 더미 해시
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Runs one Argon2 verification against a fixed hash and discards the result,
/// so unknown-email logins take as long as wrong-password logins.
pub fn verify_dummy_password(password: &str) {
    let dummy = DUMMY_HASH.get_or_init(|| hash_password("session-gate-dummy-password").ok());

    if let Some(parsed) = dummy.as_deref().and_then(|hash| PasswordHash::new(hash).ok()) {
        let _ = Argon2::default().verify_password(password.as_bytes(), &parsed);
    }
}

/// 64자리 hex 문자열 = 솔트 없는 SHA-256 레거시 포맷
fn is_legacy_hash(stored_hash: &str) -> bool {
    stored_hash.len() == 64 && stored_hash.bytes().all(|b| b.is_ascii_hexdigit())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
