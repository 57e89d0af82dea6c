use super::order::{OrderId, OrderPaymentStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    PaymentSucceeded,
    PaymentCaptured,
    PaymentFailed,
    PaymentCancelled,
    PaymentRefunded,
    PaymentAuthorized,
}

impl WebhookEventType {
    /// Accepts both `payment_succeeded` and dotted `payment.succeeded` spellings.
    pub fn parse(event: &str) -> Option<Self> {
        match event.replace('.', "_").to_ascii_lowercase().as_str() {
            "payment_succeeded" => Some(Self::PaymentSucceeded),
            "payment_captured" => Some(Self::PaymentCaptured),
            "payment_failed" => Some(Self::PaymentFailed),
            "payment_cancelled" | "payment_canceled" => Some(Self::PaymentCancelled),
            "payment_refunded" => Some(Self::PaymentRefunded),
            "payment_authorized" => Some(Self::PaymentAuthorized),
            _ => None,
        }
    }
}

/// Side effect recorded while handling a webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WebhookAction {
    OrderUpdated {
        order_id: OrderId,
        new_status: OrderPaymentStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentWebhookResult {
    pub success: bool,
    pub event_type: Option<WebhookEventType>,
    pub gateway_transaction_id: Option<String>,
    pub message: Option<String>,
    /// Append-only audit log; never read back for decisions.
    pub actions: Vec<WebhookAction>,
    #[serde(default)]
    pub raw: Value,
}

impl PaymentWebhookResult {
    pub fn parsed(
        event_type: Option<WebhookEventType>,
        gateway_transaction_id: Option<String>,
    ) -> Self {
        Self {
            success: true,
            event_type,
            gateway_transaction_id,
            message: None,
            actions: Vec::new(),
            raw: Value::Null,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            event_type: None,
            gateway_transaction_id: None,
            message: Some(message.into()),
            actions: Vec::new(),
            raw: Value::Null,
        }
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = raw;
        self
    }

    pub fn record(&mut self, action: WebhookAction) {
        self.actions.push(action);
    }
}
