//! Errors of the checkout and billing-portal operations.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | ValidationFailed | 400 |
//! | UserNotFound | 404 |
//! | NoBillingAccount | 404 |
//! | PaymentProvider | 500 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, UserId, ValidationError};

/// Billing-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// A required request field is missing or malformed.
    ValidationFailed { field: String, message: String },

    /// No user record exists for this id.
    UserNotFound(UserId),

    /// The user never went through checkout, so no provider customer exists.
    NoBillingAccount(UserId),

    /// The payment provider rejected or failed the call.
    PaymentProvider(String),

    /// Storage failure.
    Infrastructure(String),
}

impl BillingError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn payment_provider(message: impl Into<String>) -> Self {
        BillingError::PaymentProvider(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            BillingError::UserNotFound(_) => ErrorCode::UserNotFound,
            BillingError::NoBillingAccount(_) => ErrorCode::CustomerNotFound,
            BillingError::PaymentProvider(_) => ErrorCode::PaymentProviderError,
            BillingError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            BillingError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            BillingError::UserNotFound(user_id) => format!("User not found: {}", user_id),
            BillingError::NoBillingAccount(user_id) => {
                format!("User {} has no billing account", user_id)
            }
            BillingError::PaymentProvider(msg) => format!("Payment provider error: {}", msg),
            BillingError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for BillingError {}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => {
                BillingError::ValidationFailed {
                    field: err
                        .details
                        .get("field")
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string()),
                    message: err.message,
                }
            }
            ErrorCode::PaymentProviderError => BillingError::PaymentProvider(err.message),
            _ => BillingError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for BillingError {
    fn from(err: ValidationError) -> Self {
        BillingError::validation(err.field().to_string(), err.to_string())
    }
}
