// PostgreSQL 저장소 테스트
// 실행: TEST_DATABASE_URL=postgresql://... cargo test --test postgres_store -- --ignored
use std::sync::Arc;
use std::time::Duration;
use session_gate::domains::auth::models::Role;
use session_gate::domains::auth::services::RefreshLedger;
use session_gate::shared::database::{
    CredentialStore, Database, RefreshTokenRepository, RefreshTokenStore, UserRepository,
};
use session_gate::shared::errors::{RefreshError, StoreError};

async fn setup() -> Database {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set for ignored tests");
    let db = Database::new(&url, 5, Duration::from_secs(5))
        .await
        .expect("Failed to connect to database");
    db.initialize().await.expect("Failed to run migrations");
    db
}

fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

#[tokio::test]
#[ignore]
async fn test_user_repository_roundtrip_and_conflict() {
    let db = setup().await;
    let users = UserRepository::new(db.pool().clone());
    let email = unique_email("jane");

    let created = users.create_user("Jane", &email, "hash", Role::User).await.unwrap();
    let found = users.find_by_email(&email).await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.role, Role::User);

    let duplicate = users.create_user("Jane", &email, "hash", Role::User).await;
    assert!(matches!(duplicate, Err(StoreError::Conflict(_))));
}

#[tokio::test]
#[ignore]
async fn test_rotation_and_reuse_against_postgres() {
    let db = setup().await;
    let users = UserRepository::new(db.pool().clone());
    let tokens = Arc::new(RefreshTokenRepository::new(db.pool().clone()));
    let ledger = RefreshLedger::new(tokens.clone(), Duration::from_secs(5));

    let user = users
        .create_user("Jane", &unique_email("rotation"), "hash", Role::User)
        .await
        .unwrap();

    let original = ledger.issue(user.id).await.unwrap();
    let rotated = ledger.rotate(&original, user.id).await.unwrap();
    assert_ne!(original, rotated);

    assert_eq!(
        ledger.rotate(&original, user.id).await,
        Err(RefreshError::TokenReuseDetected { user_id: user.id })
    );
    assert_eq!(tokens.count_valid_for_user(user.id).await.unwrap(), 0);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_rotation_single_winner_against_postgres() {
    let db = setup().await;
    let users = UserRepository::new(db.pool().clone());
    let tokens = Arc::new(RefreshTokenRepository::new(db.pool().clone()));
    let ledger = RefreshLedger::new(tokens, Duration::from_secs(5));

    let user = users
        .create_user("Jane", &unique_email("race"), "hash", Role::User)
        .await
        .unwrap();
    let user_id = user.id;
    let token = ledger.issue(user_id).await.unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ledger = ledger.clone();
            let token = token.clone();
            tokio::spawn(async move { ledger.rotate(&token, user_id).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
}
