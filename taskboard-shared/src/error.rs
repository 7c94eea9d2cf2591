/// Service error taxonomy
///
/// Every task and account service returns [`ServiceError`]. Callers at the
/// HTTP edge match on the variant (or its stable [`ServiceError::kind`]) to
/// choose a status code; nothing here knows about HTTP.
///
/// # Example
///
/// ```
/// use taskboard_shared::error::{FieldError, ServiceError};
///
/// let err = ServiceError::validation("title", "Title is required");
/// assert_eq!(err.kind(), "validation_failed");
/// assert_eq!(err.field_errors(), &[FieldError::new("title", "Title is required")]);
/// ```

use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::store::StoreError;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// A single violated field constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name as it appears on the wire (camelCase)
    pub field: String,

    /// Human-readable description of the violation
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Flattens `validator` errors into field errors, one per violation
    ///
    /// Field names are converted to camelCase and sorted so the output is
    /// deterministic.
    pub fn from_validation(errors: &ValidationErrors) -> Vec<FieldError> {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, violations)| {
                let field = camel_case(field);
                violations.iter().map(move |violation| {
                    let message = violation
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", violation.code));
                    FieldError::new(field.clone(), message)
                })
            })
            .collect();

        fields.sort_by(|a, b| a.field.cmp(&b.field));
        fields
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Errors returned by task and account services
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The referenced user or task does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The actor is neither the assignee nor the creator of the task
    #[error("Not authorized to access this task")]
    AuthorizationDenied,

    /// One or more input fields violate their constraints
    #[error("Validation failed")]
    ValidationFailed(Vec<FieldError>),

    /// Credentials are missing, invalid or belong to an inactive account
    #[error("{0}")]
    Unauthenticated(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] JwtError),
}

impl ServiceError {
    /// Single-field validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed(vec![FieldError::new(field, message)])
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::AuthorizationDenied => "forbidden",
            ServiceError::ValidationFailed(_) => "validation_failed",
            ServiceError::Unauthenticated(_) => "unauthorized",
            ServiceError::Store(_) => "store_error",
            ServiceError::Password(_) => "password_error",
            ServiceError::Token(_) => "token_error",
        }
    }

    /// Field errors carried by a validation failure (empty otherwise)
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ServiceError::ValidationFailed(fields) => fields,
            _ => &[],
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::ValidationFailed(FieldError::from_validation(&errors))
    }
}
