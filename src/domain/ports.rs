use super::order::{Order, OrderCriteria, OrderId, OrderUpdate};
use super::payment::{PaymentIntent, PaymentRequest, PaymentResult, PaymentStatus};
use super::webhook::PaymentWebhookResult;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Contract every payment gateway adapter satisfies.
///
/// Adapters translate gateway-native failures into [`PaymentError`](crate::error::PaymentError)
/// before returning, and gateway-native statuses into [`PaymentStatus`].
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Stable lowercase key, also the transaction-id prefix.
    fn gateway_id(&self) -> &str;
    fn display_name(&self) -> &str;
    /// Upper-case ISO currency codes.
    fn supported_currencies(&self) -> BTreeSet<String>;

    fn supports_authorization(&self) -> bool;
    fn supports_capture(&self) -> bool;
    fn supports_refunds(&self) -> bool;
    fn supports_void(&self) -> bool;

    async fn create_payment_intent(&self, request: &PaymentRequest) -> Result<PaymentIntent>;

    async fn process_payment(
        &self,
        intent: &PaymentIntent,
        gateway_data: &Value,
    ) -> Result<PaymentResult>;

    /// Captures a previously authorized payment; `None` captures the full amount.
    async fn capture_payment(
        &self,
        transaction_id: &str,
        amount: Option<Decimal>,
    ) -> Result<PaymentResult>;

    async fn refund_payment(
        &self,
        transaction_id: &str,
        amount: Decimal,
        reason: Option<&str>,
    ) -> Result<PaymentResult>;

    async fn void_payment(&self, transaction_id: &str) -> Result<PaymentResult>;

    async fn payment_status(&self, transaction_id: &str) -> Result<PaymentStatus>;

    async fn handle_webhook(&self, payload: &str) -> Result<PaymentWebhookResult>;
}

/// Access to the external order store.
///
/// Each `update` is a single authoritative read-modify-write; this crate adds no locking of its own.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;
    /// Returns `false` when the order does not exist.
    async fn update(&self, order_id: OrderId, changes: OrderUpdate) -> Result<bool>;
    async fn find_by(&self, criteria: &OrderCriteria) -> Result<Vec<Order>>;
    async fn insert(&self, order: Order) -> Result<()>;
}

pub type GatewayRef = Arc<dyn PaymentGateway>;
pub type OrderRepositoryRef = Arc<dyn OrderRepository>;
