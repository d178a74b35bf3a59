//! The module contains the errors the engine can return.
//!
//! Each variant belongs to one [`ErrorKind`]:
//!
//! - [`Validation`] bad input shape or values, with field level messages.
//! - [`Unauthorized`] missing or invalid credentials.
//! - [`KeyNotFound`] the entity does not exist for the given id and user.
//! - [`InsufficientFunds`] and [`ExistingKey`] domain rules.
//! - [`Store`] the document store failed; carries entity and operation.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`Unauthorized`]: EngineError::Unauthorized
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`Store`]: EngineError::Store
use std::fmt;

use api_types::envelope::FieldError;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    NotFound,
    DomainRule,
    Internal,
}

/// Field level validation messages, in the order they were found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }

    /// `Ok(())` when nothing was pushed, otherwise a validation error.
    pub(crate) fn into_result(self) -> Result<(), EngineError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("{entity} {operation} failed: {source}")]
    Store {
        entity: &'static str,
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unauthorized(_) => ErrorKind::Auth,
            Self::KeyNotFound(_) => ErrorKind::NotFound,
            Self::InsufficientFunds(_) | Self::ExistingKey(_) => ErrorKind::DomainRule,
            Self::Store { .. } => ErrorKind::Internal,
        }
    }

    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(ValidationErrors::single(field, message))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Store { .. }, Self::Store { .. }) => self.to_string() == other.to_string(),
            _ => false,
        }
    }
}

/// Wraps store failures with the entity and operation they happened in.
pub(crate) trait StoreContext<T> {
    fn context(self, entity: &'static str, operation: &'static str) -> Result<T, EngineError>;
}

impl<T> StoreContext<T> for Result<T, StoreError> {
    fn context(self, entity: &'static str, operation: &'static str) -> Result<T, EngineError> {
        self.map_err(|source| EngineError::Store {
            entity,
            operation,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_display_every_field() {
        let mut errors = ValidationErrors::new();
        errors.push("name", "must not be empty");
        errors.push("maximumSpending", "must be >= 0");
        assert_eq!(
            errors.to_string(),
            "name: must not be empty; maximumSpending: must be >= 0"
        );
    }

    #[test]
    fn store_errors_carry_context() {
        let res: Result<(), StoreError> = Err(StoreError::Unavailable("down".to_string()));
        let err = res.context("budget", "query").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.to_string(), "budget query failed: store unavailable: down");
    }

    #[test]
    fn domain_rules_share_a_kind() {
        assert_eq!(
            EngineError::InsufficientFunds("x".to_string()).kind(),
            ErrorKind::DomainRule
        );
        assert_eq!(
            EngineError::ExistingKey("x".to_string()).kind(),
            ErrorKind::DomainRule
        );
    }
}
