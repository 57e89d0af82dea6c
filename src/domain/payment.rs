use super::order::OrderId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical payment status vocabulary.
///
/// Adapters map gateway-native statuses into this set before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Authorized,
    Captured,
    Failed,
    Refunded,
    Voided,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Authorized => "authorized",
            PaymentStatus::Captured => "captured",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Voided => "voided",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to charge an external order.
///
/// Immutable once built; call [`PaymentRequest::validate`] before handing it to a gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    order_id: OrderId,
    amount: Decimal,
    currency: String,
    #[serde(default)]
    billing: BTreeMap<String, String>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl PaymentRequest {
    pub fn new(order_id: OrderId, amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            order_id,
            amount,
            currency: currency.into(),
            billing: BTreeMap::new(),
            metadata: Map::new(),
        }
    }

    pub fn with_billing(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.billing.insert(field.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn billing(&self) -> &BTreeMap<String, String> {
        &self.billing
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Returns every validation problem found; an empty list means the request is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.order_id == 0 {
            errors.push("order id is required".to_string());
        }
        if self.amount <= Decimal::ZERO {
            errors.push("amount must be greater than zero".to_string());
        }
        if self.currency.is_empty() {
            errors.push("currency is required".to_string());
        } else if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase())
        {
            errors.push(format!(
                "currency '{}' must be a three-letter ISO code",
                self.currency
            ));
        }
        if let Some(email) = self.billing.get("email")
            && !email.contains('@')
        {
            errors.push(format!("billing email '{}' is invalid", email));
        }

        errors
    }
}

/// Gateway-issued handle for an in-progress payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub gateway_id: String,
    pub intent_id: String,
    pub order_id: OrderId,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
}

/// Normalized outcome of a lifecycle operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub success: bool,
    pub status: PaymentStatus,
    pub gateway_id: String,
    pub gateway_transaction_id: Option<String>,
    pub amount: Option<Decimal>,
    pub redirect_url: Option<String>,
    pub message: Option<String>,
    /// Untouched gateway payload, kept for audit only.
    #[serde(default)]
    pub raw: Value,
}

impl PaymentResult {
    pub fn succeeded(
        gateway_id: impl Into<String>,
        status: PaymentStatus,
        gateway_transaction_id: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            status,
            gateway_id: gateway_id.into(),
            gateway_transaction_id: Some(gateway_transaction_id.into()),
            amount: None,
            redirect_url: None,
            message: None,
            raw: Value::Null,
        }
    }

    pub fn failed(gateway_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status: PaymentStatus::Failed,
            gateway_id: gateway_id.into(),
            gateway_transaction_id: None,
            amount: None,
            redirect_url: None,
            message: Some(message.into()),
            raw: Value::Null,
        }
    }

    pub fn with_transaction_id(mut self, gateway_transaction_id: impl Into<String>) -> Self {
        self.gateway_transaction_id = Some(gateway_transaction_id.into());
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_redirect_url(mut self, redirect_url: impl Into<String>) -> Self {
        self.redirect_url = Some(redirect_url.into());
        self
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = raw;
        self
    }
}
