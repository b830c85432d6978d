use serde::{Deserialize, Serialize};

/// Failure shape of collaborator calls (availability, quote, hold,
/// reservation, payment). Each remote operation is assumed to fail with a
/// distinguishable kind which callers map into [`BookingError`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request rejected: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

/// The booking error taxonomy. Every user-visible failure states what
/// happened and, via [`BookingError::guidance`], what the guest can do next.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("site no longer available: {0}")]
    AvailabilityConflict(String),

    #[error("live pricing unavailable: {0}")]
    QuoteUnavailable(String),

    #[error("could not hold the site: {0}")]
    HoldFailure(String),

    #[error("promo code rejected: {0}")]
    PromoInvalid(String),

    #[error("reservation could not be created: {0}")]
    ReservationCreation(String),

    #[error("failed to initialize payment: {0}")]
    PaymentInitialization(String),

    #[error("payment was not confirmed: {0}")]
    PaymentConfirmation(String),

    #[error("payment reconciliation failed: {0}")]
    Reconciliation(String),
}

impl BookingError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BookingError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Non-fatal errors degrade the experience but never block checkout.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BookingError::ReservationCreation(_)
                | BookingError::PaymentInitialization(_)
                | BookingError::PaymentConfirmation(_)
        )
    }

    /// Whether the guest may simply retry the same action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BookingError::ReservationCreation(_)
                | BookingError::PaymentInitialization(_)
                | BookingError::PaymentConfirmation(_)
                | BookingError::QuoteUnavailable(_)
        )
    }

    /// Actionable next step shown alongside the error message.
    pub fn guidance(&self) -> &'static str {
        match self {
            BookingError::Validation { .. } => "Correct the highlighted field and continue.",
            BookingError::AvailabilityConflict(_) => {
                "Pick another site, or try the suggested dates or site types."
            }
            BookingError::QuoteUnavailable(_) => {
                "Showing an estimated total; the final price is confirmed at checkout."
            }
            BookingError::HoldFailure(_) => {
                "Your site could not be held, but you can still complete checkout."
            }
            BookingError::PromoInvalid(_) => "Check the code and try again, or continue without it.",
            BookingError::ReservationCreation(_) => "Nothing was booked. Please try again.",
            BookingError::PaymentInitialization(_) => {
                "Failed to initialize payment, please retry."
            }
            BookingError::PaymentConfirmation(_) => {
                "Check your card details and available funds, or try a different payment method."
            }
            BookingError::Reconciliation(_) => {
                "Your payment went through; the reservation will update shortly."
            }
        }
    }
}

/// An inline, per-field validation message used by step revalidation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
