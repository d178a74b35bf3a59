//! Token verification.
//!
//! The server only needs `verify_token`; how users sign up or obtain a token
//! is outside the engine. [`SqlAuthProvider`] also exposes the bootstrap
//! operations used by the admin CLI.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{ActiveValue, DatabaseConnection, QueryFilter, prelude::*};
use serde_json::{Map, Value};

use crate::{EngineError, ResultEngine, error::StoreContext, store::StoreError, users};

/// Identity resolved from a bearer token.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthClaims {
    pub uid: String,
    pub email: String,
    pub claims: Map<String, Value>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolves `token` or fails with [`EngineError::Unauthorized`].
    async fn verify_token(&self, token: &str) -> ResultEngine<AuthClaims>;
}

/// Freshly minted credentials. The token is only ever shown here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedToken {
    pub uid: String,
    pub token: String,
}

fn new_token() -> String {
    format!("pb_{}", Uuid::new_v4().simple())
}

fn missing_token() -> EngineError {
    EngineError::Unauthorized("missing token".to_string())
}

fn invalid_token() -> EngineError {
    EngineError::Unauthorized("invalid token".to_string())
}

/// Looks tokens up in the `users` table.
#[derive(Clone, Debug)]
pub struct SqlAuthProvider {
    db: DatabaseConnection,
}

impl SqlAuthProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_by_email(&self, email: &str) -> ResultEngine<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(StoreError::from)
            .context("user", "get")
    }

    /// Registers a user and issues its first token.
    pub async fn create_user(&self, email: &str) -> ResultEngine<IssuedToken> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(EngineError::invalid("email", "must be an email address"));
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(EngineError::ExistingKey(email));
        }

        let issued = IssuedToken {
            uid: Uuid::new_v4().to_string(),
            token: new_token(),
        };
        users::ActiveModel {
            id: ActiveValue::Set(issued.uid.clone()),
            email: ActiveValue::Set(email.clone()),
            token: ActiveValue::Set(issued.token.clone()),
            claims: ActiveValue::Set(Value::Object(Map::new())),
        }
        .insert(&self.db)
        .await
        .map_err(StoreError::from)
        .context("user", "create")?;

        tracing::info!(uid = %issued.uid, email, "user created");
        Ok(issued)
    }

    /// Replaces the user's token; the old one stops working immediately.
    pub async fn rotate_token(&self, email: &str) -> ResultEngine<IssuedToken> {
        let email = email.trim().to_lowercase();
        let user = self
            .find_by_email(&email)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {email}")))?;

        let uid = user.id.clone();
        let token = new_token();
        let mut active: users::ActiveModel = user.into();
        active.token = ActiveValue::Set(token.clone());
        active
            .update(&self.db)
            .await
            .map_err(StoreError::from)
            .context("user", "update")?;

        tracing::info!(uid, "token rotated");
        Ok(IssuedToken { uid, token })
    }
}

#[async_trait]
impl AuthProvider for SqlAuthProvider {
    async fn verify_token(&self, token: &str) -> ResultEngine<AuthClaims> {
        let token = token.trim();
        if token.is_empty() {
            return Err(missing_token());
        }
        let user = users::Entity::find()
            .filter(users::Column::Token.eq(token))
            .one(&self.db)
            .await
            .map_err(StoreError::from)
            .context("user", "verify")?
            .ok_or_else(invalid_token)?;

        let claims = match user.claims {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Ok(AuthClaims {
            uid: user.id,
            email: user.email,
            claims,
        })
    }
}

/// Fixed token table, for tests and local development.
#[derive(Clone, Debug, Default)]
pub struct StaticAuthProvider {
    tokens: HashMap<String, AuthClaims>,
}

impl StaticAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `token` as `uid`, with the email `<uid>@example.com`.
    pub fn with_token(mut self, token: &str, uid: &str) -> Self {
        self.tokens.insert(
            token.to_string(),
            AuthClaims {
                uid: uid.to_string(),
                email: format!("{uid}@example.com"),
                claims: Map::new(),
            },
        );
        self
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn verify_token(&self, token: &str) -> ResultEngine<AuthClaims> {
        if token.trim().is_empty() {
            return Err(missing_token());
        }
        self.tokens.get(token).cloned().ok_or_else(invalid_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_provider_checks_tokens() {
        let auth = StaticAuthProvider::new().with_token("t1", "alice");

        let claims = auth.verify_token("t1").await.unwrap();
        assert_eq!(claims.uid, "alice");
        assert_eq!(
            auth.verify_token("").await.unwrap_err(),
            EngineError::Unauthorized("missing token".to_string())
        );
        assert_eq!(
            auth.verify_token("t2").await.unwrap_err(),
            EngineError::Unauthorized("invalid token".to_string())
        );
    }

    #[test]
    fn tokens_are_prefixed_and_unique() {
        let a = new_token();
        assert!(a.starts_with("pb_"));
        assert_ne!(a, new_token());
    }
}
