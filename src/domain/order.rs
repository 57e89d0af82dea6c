use serde::{Deserialize, Serialize};
use std::fmt;

pub type OrderId = u64;

/// Order lifecycle status, owned by the order-management application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderPaymentStatus {
    #[default]
    Pending,
    Authorized,
    Paid,
    Failed,
    Refunded,
}

impl fmt::Display for OrderPaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderPaymentStatus::Pending => "pending",
            OrderPaymentStatus::Authorized => "authorized",
            OrderPaymentStatus::Paid => "paid",
            OrderPaymentStatus::Failed => "failed",
            OrderPaymentStatus::Refunded => "refunded",
        })
    }
}

/// The slice of an external order this crate reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub payment_status: OrderPaymentStatus,
    /// Identifier of the gateway that last handled the order.
    pub payment_method: Option<String>,
    pub gateway_transaction_id: Option<String>,
}

impl Order {
    pub fn new(id: OrderId) -> Self {
        Self {
            id,
            status: OrderStatus::Pending,
            payment_status: OrderPaymentStatus::Pending,
            payment_method: None,
            gateway_transaction_id: None,
        }
    }

    /// Applies a partial update in place. Absent fields are left untouched.
    pub fn apply(&mut self, update: &OrderUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(payment_status) = update.payment_status {
            self.payment_status = payment_status;
        }
        if let Some(method) = &update.payment_method {
            self.payment_method = Some(method.clone());
        }
        if let Some(txn) = &update.gateway_transaction_id {
            self.gateway_transaction_id = Some(txn.clone());
        }
    }

    /// True when applying `update` would not change anything.
    pub fn reflects(&self, update: &OrderUpdate) -> bool {
        let mut updated = self.clone();
        updated.apply(update);
        updated == *self
    }
}

/// Partial field map for [`OrderRepository::update`](super::ports::OrderRepository::update).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<OrderPaymentStatus>,
    pub payment_method: Option<String>,
    pub gateway_transaction_id: Option<String>,
}

/// Exact-match criteria for [`OrderRepository::find_by`](super::ports::OrderRepository::find_by).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderCriteria {
    pub gateway_transaction_id: Option<String>,
    pub payment_method: Option<String>,
    pub payment_status: Option<OrderPaymentStatus>,
}

impl OrderCriteria {
    pub fn by_transaction_id(gateway_transaction_id: impl Into<String>) -> Self {
        Self {
            gateway_transaction_id: Some(gateway_transaction_id.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.gateway_transaction_id
            .as_ref()
            .is_none_or(|txn| order.gateway_transaction_id.as_ref() == Some(txn))
            && self
                .payment_method
                .as_ref()
                .is_none_or(|method| order.payment_method.as_ref() == Some(method))
            && self
                .payment_status
                .is_none_or(|status| order.payment_status == status)
    }
}
