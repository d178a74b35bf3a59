mod common;

use common::migrated_db;
use engine::{AuthProvider, EngineError, ErrorKind, SqlAuthProvider};

#[tokio::test]
async fn issued_tokens_verify() {
    let auth = SqlAuthProvider::new(migrated_db("sqlite::memory:").await);

    let issued = auth.create_user("Alice@Example.com").await.unwrap();
    let claims = auth.verify_token(&issued.token).await.unwrap();
    assert_eq!(claims.uid, issued.uid);
    assert_eq!(claims.email, "alice@example.com");
    assert!(claims.claims.is_empty());
}

#[tokio::test]
async fn unknown_and_missing_tokens_are_rejected() {
    let auth = SqlAuthProvider::new(migrated_db("sqlite::memory:").await);
    auth.create_user("alice@example.com").await.unwrap();

    let err = auth.verify_token("pb_nope").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    let err = auth.verify_token("  ").await.unwrap_err();
    assert_eq!(err, EngineError::Unauthorized("missing token".to_string()));
}

#[tokio::test]
async fn emails_are_unique() {
    let auth = SqlAuthProvider::new(migrated_db("sqlite::memory:").await);
    auth.create_user("alice@example.com").await.unwrap();

    let err = auth.create_user("ALICE@example.com").await.unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)), "{err}");
    let err = auth.create_user("not-an-email").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn rotation_invalidates_the_old_token() {
    let auth = SqlAuthProvider::new(migrated_db("sqlite::memory:").await);
    let first = auth.create_user("alice@example.com").await.unwrap();

    let second = auth.rotate_token("alice@example.com").await.unwrap();
    assert_eq!(first.uid, second.uid);
    assert_ne!(first.token, second.token);
    assert!(auth.verify_token(&first.token).await.is_err());
    assert_eq!(auth.verify_token(&second.token).await.unwrap().uid, first.uid);

    let err = auth.rotate_token("bob@example.com").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
