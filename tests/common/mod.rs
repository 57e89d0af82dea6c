#![allow(dead_code)]

use async_trait::async_trait;
use paygate::domain::order::{Order, OrderId};
use paygate::domain::payment::{PaymentIntent, PaymentRequest, PaymentResult, PaymentStatus};
use paygate::domain::ports::{OrderRepository, PaymentGateway};
use paygate::domain::webhook::{PaymentWebhookResult, WebhookEventType};
use paygate::error::Result;
use paygate::infrastructure::in_memory::InMemoryOrderRepository;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

/// Gateway double that records every contract call and answers with a fixed outcome.
pub struct RecordingGateway {
    id: String,
    currencies: BTreeSet<String>,
    success: bool,
    status: PaymentStatus,
    webhook_event: Option<WebhookEventType>,
    webhook_transaction: Option<String>,
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingGateway {
    pub fn new(id: &str, currencies: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            currencies: currencies.iter().map(|c| c.to_string()).collect(),
            success: true,
            status: PaymentStatus::Captured,
            webhook_event: None,
            webhook_transaction: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(mut self, success: bool, status: PaymentStatus) -> Self {
        self.success = success;
        self.status = status;
        self
    }

    pub fn with_webhook(mut self, event: Option<WebhookEventType>, transaction: &str) -> Self {
        self.webhook_event = event;
        self.webhook_transaction = Some(transaction.to_string());
        self
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn outcome(&self, transaction_id: &str) -> PaymentResult {
        let mut result = PaymentResult::succeeded(self.id.clone(), self.status, transaction_id);
        result.success = self.success;
        result
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    fn gateway_id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        "Recording"
    }

    fn supported_currencies(&self) -> BTreeSet<String> {
        self.currencies.clone()
    }

    fn supports_authorization(&self) -> bool {
        true
    }

    fn supports_capture(&self) -> bool {
        true
    }

    fn supports_refunds(&self) -> bool {
        true
    }

    fn supports_void(&self) -> bool {
        true
    }

    async fn create_payment_intent(&self, request: &PaymentRequest) -> Result<PaymentIntent> {
        self.record("create_payment_intent");
        Ok(PaymentIntent {
            gateway_id: self.id.clone(),
            intent_id: format!("pi{}", request.order_id()),
            order_id: request.order_id(),
            amount: request.amount(),
            currency: request.currency().to_string(),
            status: PaymentStatus::Pending,
        })
    }

    async fn process_payment(
        &self,
        intent: &PaymentIntent,
        _gateway_data: &Value,
    ) -> Result<PaymentResult> {
        self.record("process_payment");
        Ok(self.outcome(&intent.intent_id))
    }

    async fn capture_payment(
        &self,
        transaction_id: &str,
        _amount: Option<Decimal>,
    ) -> Result<PaymentResult> {
        self.record("capture_payment");
        Ok(self.outcome(transaction_id))
    }

    async fn refund_payment(
        &self,
        transaction_id: &str,
        _amount: Decimal,
        _reason: Option<&str>,
    ) -> Result<PaymentResult> {
        self.record("refund_payment");
        Ok(self.outcome(transaction_id))
    }

    async fn void_payment(&self, transaction_id: &str) -> Result<PaymentResult> {
        self.record("void_payment");
        Ok(self.outcome(transaction_id))
    }

    async fn payment_status(&self, _transaction_id: &str) -> Result<PaymentStatus> {
        self.record("payment_status");
        Ok(self.status)
    }

    async fn handle_webhook(&self, _payload: &str) -> Result<PaymentWebhookResult> {
        self.record("handle_webhook");
        Ok(PaymentWebhookResult::parsed(
            self.webhook_event,
            self.webhook_transaction.clone(),
        ))
    }
}

pub async fn orders_with(ids: &[OrderId]) -> Arc<InMemoryOrderRepository> {
    let repo = Arc::new(InMemoryOrderRepository::new());
    for id in ids {
        repo.insert(Order::new(*id)).await.unwrap();
    }
    repo
}

pub async fn order(repo: &InMemoryOrderRepository, id: OrderId) -> Order {
    repo.get(id).await.unwrap().expect("order should exist")
}
