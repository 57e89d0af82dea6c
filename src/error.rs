//! Payment failure taxonomy.
//!
//! Every fallible operation in the crate returns [`Result`], whose error is a
//! [`PaymentError`] tagged with one code from the closed [`ErrorCode`] set.
//! The internal message and gateway payload are meant for logs; callers facing
//! end users should only ever show [`PaymentError::user_message`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

/// The closed set of payment failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    GatewayNotConfigured,
    InvalidAmount,
    InvalidCurrency,
    CardDeclined,
    InsufficientFunds,
    ExpiredCard,
    InvalidCard,
    ProcessingError,
    GatewayError,
    NetworkError,
    InvalidRequest,
    AuthenticationFailed,
    TransactionNotFound,
    AlreadyCaptured,
    AlreadyRefunded,
    RefundAmountExceeds,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 16] = [
        ErrorCode::GatewayNotConfigured,
        ErrorCode::InvalidAmount,
        ErrorCode::InvalidCurrency,
        ErrorCode::CardDeclined,
        ErrorCode::InsufficientFunds,
        ErrorCode::ExpiredCard,
        ErrorCode::InvalidCard,
        ErrorCode::ProcessingError,
        ErrorCode::GatewayError,
        ErrorCode::NetworkError,
        ErrorCode::InvalidRequest,
        ErrorCode::AuthenticationFailed,
        ErrorCode::TransactionNotFound,
        ErrorCode::AlreadyCaptured,
        ErrorCode::AlreadyRefunded,
        ErrorCode::RefundAmountExceeds,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::GatewayNotConfigured => "gateway_not_configured",
            ErrorCode::InvalidAmount => "invalid_amount",
            ErrorCode::InvalidCurrency => "invalid_currency",
            ErrorCode::CardDeclined => "card_declined",
            ErrorCode::InsufficientFunds => "insufficient_funds",
            ErrorCode::ExpiredCard => "expired_card",
            ErrorCode::InvalidCard => "invalid_card",
            ErrorCode::ProcessingError => "processing_error",
            ErrorCode::GatewayError => "gateway_error",
            ErrorCode::NetworkError => "network_error",
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::AuthenticationFailed => "authentication_failed",
            ErrorCode::TransactionNotFound => "transaction_not_found",
            ErrorCode::AlreadyCaptured => "already_captured",
            ErrorCode::AlreadyRefunded => "already_refunded",
            ErrorCode::RefundAmountExceeds => "refund_amount_exceeds",
        }
    }

    /// The sanitized, gateway-agnostic sentence shown to end users.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCode::GatewayNotConfigured => "This payment method is currently unavailable.",
            ErrorCode::InvalidAmount => "The payment amount is invalid.",
            ErrorCode::InvalidCurrency => "This currency is not supported.",
            ErrorCode::CardDeclined => {
                "Your card was declined. Please try a different payment method."
            }
            ErrorCode::InsufficientFunds => {
                "Insufficient funds. Please try a different payment method."
            }
            ErrorCode::ExpiredCard => "Your card has expired. Please use a different card.",
            ErrorCode::InvalidCard => "Your card details are invalid. Please check and try again.",
            ErrorCode::NetworkError => "A network error occurred. Please try again.",
            ErrorCode::InvalidRequest => "The payment request is invalid.",
            ErrorCode::AuthenticationFailed => "Payment authentication failed. Please try again.",
            ErrorCode::TransactionNotFound => "The payment could not be found.",
            ErrorCode::AlreadyCaptured => "This payment has already been captured.",
            ErrorCode::AlreadyRefunded => "This payment has already been refunded.",
            ErrorCode::RefundAmountExceeds => {
                "The refund amount exceeds the amount available for refund."
            }
            ErrorCode::ProcessingError | ErrorCode::GatewayError => {
                "Payment processing failed. Please try again."
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct PaymentError {
    code: ErrorCode,
    message: String,
    gateway_message: Option<String>,
    gateway_data: Option<Value>,
}

impl PaymentError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            gateway_message: None,
            gateway_data: None,
        }
    }

    pub fn with_gateway_message(mut self, gateway_message: impl Into<String>) -> Self {
        self.gateway_message = Some(gateway_message.into());
        self
    }

    pub fn with_gateway_data(mut self, gateway_data: Value) -> Self {
        self.gateway_data = Some(gateway_data);
        self
    }

    fn with_gateway_detail(self, gateway_message: Option<String>, gateway_data: Option<Value>) -> Self {
        Self {
            gateway_message,
            gateway_data,
            ..self
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn gateway_message(&self) -> Option<&str> {
        self.gateway_message.as_deref()
    }

    pub fn gateway_data(&self) -> Option<&Value> {
        self.gateway_data.as_ref()
    }

    pub fn user_message(&self) -> &'static str {
        self.code.user_message()
    }

    pub fn gateway_not_configured(gateway_id: Option<&str>) -> Self {
        let message = match gateway_id {
            Some(id) => format!("Payment gateway '{}' is not configured", id),
            None => "No default payment gateway is configured".to_string(),
        };
        Self::new(ErrorCode::GatewayNotConfigured, message)
    }

    pub fn invalid_amount(amount: Decimal) -> Self {
        Self::new(
            ErrorCode::InvalidAmount,
            format!("Invalid payment amount: {}", amount),
        )
    }

    pub fn invalid_currency(currency: &str, gateway_id: &str) -> Self {
        Self::new(
            ErrorCode::InvalidCurrency,
            format!("Currency '{}' is not supported by gateway '{}'", currency, gateway_id),
        )
    }

    pub fn card_declined(gateway_message: Option<String>, gateway_data: Option<Value>) -> Self {
        Self::new(ErrorCode::CardDeclined, "Card was declined")
            .with_gateway_detail(gateway_message, gateway_data)
    }

    pub fn insufficient_funds(gateway_message: Option<String>, gateway_data: Option<Value>) -> Self {
        Self::new(ErrorCode::InsufficientFunds, "Insufficient funds")
            .with_gateway_detail(gateway_message, gateway_data)
    }

    pub fn expired_card(gateway_message: Option<String>) -> Self {
        Self::new(ErrorCode::ExpiredCard, "Card has expired")
            .with_gateway_detail(gateway_message, None)
    }

    pub fn invalid_card(gateway_message: Option<String>) -> Self {
        Self::new(ErrorCode::InvalidCard, "Card details are invalid")
            .with_gateway_detail(gateway_message, None)
    }

    pub fn processing_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProcessingError, message)
    }

    pub fn gateway_error(
        gateway_id: &str,
        gateway_message: Option<String>,
        gateway_data: Option<Value>,
    ) -> Self {
        Self::new(
            ErrorCode::GatewayError,
            format!("Gateway '{}' returned an error", gateway_id),
        )
        .with_gateway_detail(gateway_message, gateway_data)
    }

    pub fn network_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, message)
    }

    pub fn invalid_request(errors: &[String]) -> Self {
        Self::new(
            ErrorCode::InvalidRequest,
            format!("Invalid payment request: {}", errors.join(", ")),
        )
    }

    pub fn authentication_failed(gateway_id: &str) -> Self {
        Self::new(
            ErrorCode::AuthenticationFailed,
            format!("Authentication with gateway '{}' failed", gateway_id),
        )
    }

    pub fn transaction_not_found(transaction_id: &str) -> Self {
        Self::new(
            ErrorCode::TransactionNotFound,
            format!("Transaction '{}' not found", transaction_id),
        )
    }

    pub fn already_captured(transaction_id: &str) -> Self {
        Self::new(
            ErrorCode::AlreadyCaptured,
            format!("Transaction '{}' has already been captured", transaction_id),
        )
    }

    pub fn already_refunded(transaction_id: &str) -> Self {
        Self::new(
            ErrorCode::AlreadyRefunded,
            format!("Transaction '{}' has already been refunded", transaction_id),
        )
    }

    pub fn refund_amount_exceeds(requested: Decimal, available: Decimal) -> Self {
        Self::new(
            ErrorCode::RefundAmountExceeds,
            format!(
                "Refund amount {} exceeds available amount {}",
                requested, available
            ),
        )
    }
}

impl miette::Diagnostic for PaymentError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.user_message()))
    }
}

impl From<std::io::Error> for PaymentError {
    fn from(err: std::io::Error) -> Self {
        Self::processing_error(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for PaymentError {
    fn from(err: serde_json::Error) -> Self {
        Self::processing_error(format!("Serialization error: {}", err))
    }
}

impl From<csv::Error> for PaymentError {
    fn from(err: csv::Error) -> Self {
        Self::invalid_request(&[format!("CSV error: {}", err)])
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PaymentError {
    fn from(err: rocksdb::Error) -> Self {
        Self::processing_error(format!("RocksDB error: {}", err))
    }
}
