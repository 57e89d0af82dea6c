//! A self-contained gateway adapter that settles payments in memory.
//!
//! It follows the full gateway contract (capture, partial refunds, void, webhooks)
//! and is what the CLI registers for configured gateways. Native transaction ids are
//! `{order_id}-{attempt}`, so a script can refer to them before they exist.

use crate::domain::order::OrderId;
use crate::domain::payment::{PaymentIntent, PaymentRequest, PaymentResult, PaymentStatus};
use crate::domain::ports::PaymentGateway;
use crate::domain::transaction_id;
use crate::domain::webhook::{PaymentWebhookResult, WebhookEventType};
use crate::error::{ErrorCode, PaymentError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Funds are collected as soon as the payment is processed.
    #[default]
    Automatic,
    /// Payments stop at `Authorized` until captured.
    Manual,
}

#[derive(Debug, Clone)]
struct SimulatedTransaction {
    amount: Decimal,
    captured: Decimal,
    refunded: Decimal,
    status: PaymentStatus,
}

#[derive(Default)]
struct Ledger {
    attempts: HashMap<OrderId, u32>,
    transactions: HashMap<String, SimulatedTransaction>,
}

pub struct SimulatedGateway {
    id: String,
    display_name: String,
    currencies: BTreeSet<String>,
    capture_mode: CaptureMode,
    decline: Option<ErrorCode>,
    capture: bool,
    refunds: bool,
    void: bool,
    ledger: RwLock<Ledger>,
}

impl SimulatedGateway {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        currencies: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            currencies: currencies
                .into_iter()
                .map(|c| c.into().to_ascii_uppercase())
                .collect(),
            capture_mode: CaptureMode::Automatic,
            decline: None,
            capture: true,
            refunds: true,
            void: true,
            ledger: RwLock::new(Ledger::default()),
        }
    }

    pub fn with_capture_mode(mut self, capture_mode: CaptureMode) -> Self {
        self.capture_mode = capture_mode;
        self
    }

    /// Makes every payment fail with `code`.
    pub fn declining(mut self, code: ErrorCode) -> Self {
        self.decline = Some(code);
        self
    }

    pub fn without_capture(mut self) -> Self {
        self.capture = false;
        self
    }

    pub fn without_refunds(mut self) -> Self {
        self.refunds = false;
        self
    }

    pub fn without_void(mut self) -> Self {
        self.void = false;
        self
    }

    fn native<'a>(&self, transaction_id: &'a str) -> &'a str {
        transaction_id::strip(&self.id, transaction_id).unwrap_or(transaction_id)
    }

    fn decline_error(&self, code: ErrorCode, intent_id: &str) -> PaymentError {
        let message = Some(format!("simulated {} for {}", code, intent_id));
        let data = Some(json!({ "intent_id": intent_id, "decline_code": code }));
        match code {
            ErrorCode::CardDeclined => PaymentError::card_declined(message, data),
            ErrorCode::InsufficientFunds => PaymentError::insufficient_funds(message, data),
            ErrorCode::ExpiredCard => PaymentError::expired_card(message),
            ErrorCode::InvalidCard => PaymentError::invalid_card(message),
            ErrorCode::AuthenticationFailed => PaymentError::authentication_failed(&self.id),
            ErrorCode::NetworkError => {
                PaymentError::network_error(format!("Gateway '{}' unreachable", self.id))
            }
            ErrorCode::GatewayError => PaymentError::gateway_error(&self.id, message, data),
            other => PaymentError::new(other, format!("Simulated failure: {}", other)),
        }
    }

    fn result(&self, status: PaymentStatus, native_id: &str) -> PaymentResult {
        PaymentResult::succeeded(
            self.id.clone(),
            status,
            transaction_id::compose(&self.id, native_id),
        )
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    fn gateway_id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn supported_currencies(&self) -> BTreeSet<String> {
        self.currencies.clone()
    }

    fn supports_authorization(&self) -> bool {
        true
    }

    fn supports_capture(&self) -> bool {
        self.capture
    }

    fn supports_refunds(&self) -> bool {
        self.refunds
    }

    fn supports_void(&self) -> bool {
        self.void
    }

    async fn create_payment_intent(&self, request: &PaymentRequest) -> Result<PaymentIntent> {
        if !self.currencies.contains(request.currency()) {
            return Err(PaymentError::invalid_currency(request.currency(), &self.id));
        }

        let mut ledger = self.ledger.write().await;
        let attempt = ledger.attempts.entry(request.order_id()).or_default();
        *attempt += 1;
        let intent_id = format!("{}-{}", request.order_id(), attempt);

        ledger.transactions.insert(
            intent_id.clone(),
            SimulatedTransaction {
                amount: request.amount(),
                captured: Decimal::ZERO,
                refunded: Decimal::ZERO,
                status: PaymentStatus::Pending,
            },
        );

        Ok(PaymentIntent {
            gateway_id: self.id.clone(),
            intent_id,
            order_id: request.order_id(),
            amount: request.amount(),
            currency: request.currency().to_string(),
            status: PaymentStatus::Pending,
        })
    }

    async fn process_payment(
        &self,
        intent: &PaymentIntent,
        gateway_data: &Value,
    ) -> Result<PaymentResult> {
        let mut ledger = self.ledger.write().await;
        let txn = ledger
            .transactions
            .get_mut(&intent.intent_id)
            .ok_or_else(|| PaymentError::transaction_not_found(&intent.intent_id))?;

        if let Some(code) = self.decline {
            txn.status = PaymentStatus::Failed;
            return Err(self.decline_error(code, &intent.intent_id));
        }
        if gateway_data.get("outcome").and_then(Value::as_str) == Some("fail") {
            txn.status = PaymentStatus::Failed;
            return Ok(PaymentResult::failed(self.id.clone(), "Payment was not completed")
                .with_transaction_id(transaction_id::compose(&self.id, &intent.intent_id))
                .with_raw(json!({ "intent_id": intent.intent_id, "outcome": "fail" })));
        }

        txn.status = match self.capture_mode {
            CaptureMode::Automatic => {
                txn.captured = txn.amount;
                PaymentStatus::Captured
            }
            CaptureMode::Manual => PaymentStatus::Authorized,
        };

        Ok(self
            .result(txn.status, &intent.intent_id)
            .with_amount(txn.amount)
            .with_raw(json!({ "intent_id": intent.intent_id, "status": txn.status })))
    }

    async fn capture_payment(
        &self,
        transaction_id: &str,
        amount: Option<Decimal>,
    ) -> Result<PaymentResult> {
        let native_id = self.native(transaction_id);
        let mut ledger = self.ledger.write().await;
        let txn = ledger
            .transactions
            .get_mut(native_id)
            .ok_or_else(|| PaymentError::transaction_not_found(transaction_id))?;

        match txn.status {
            PaymentStatus::Authorized => {}
            PaymentStatus::Captured => return Err(PaymentError::already_captured(transaction_id)),
            PaymentStatus::Refunded => return Err(PaymentError::already_refunded(transaction_id)),
            status => {
                return Err(PaymentError::processing_error(format!(
                    "Cannot capture transaction '{}' in status {}",
                    transaction_id, status
                )));
            }
        }

        let amount = amount.unwrap_or(txn.amount);
        if amount <= Decimal::ZERO || amount > txn.amount {
            return Err(PaymentError::invalid_amount(amount));
        }
        txn.captured = amount;
        txn.status = PaymentStatus::Captured;

        Ok(self
            .result(PaymentStatus::Captured, native_id)
            .with_amount(amount))
    }

    async fn refund_payment(
        &self,
        transaction_id: &str,
        amount: Decimal,
        reason: Option<&str>,
    ) -> Result<PaymentResult> {
        let native_id = self.native(transaction_id);
        let mut ledger = self.ledger.write().await;
        let txn = ledger
            .transactions
            .get_mut(native_id)
            .ok_or_else(|| PaymentError::transaction_not_found(transaction_id))?;

        if !matches!(txn.status, PaymentStatus::Captured | PaymentStatus::Refunded) {
            return Err(PaymentError::processing_error(format!(
                "Cannot refund transaction '{}' in status {}",
                transaction_id, txn.status
            )));
        }
        let available = txn.captured - txn.refunded;
        if available <= Decimal::ZERO {
            return Err(PaymentError::already_refunded(transaction_id));
        }
        if amount > available {
            return Err(PaymentError::refund_amount_exceeds(amount, available));
        }

        txn.refunded += amount;
        if txn.refunded == txn.captured {
            txn.status = PaymentStatus::Refunded;
        }

        Ok(self
            .result(PaymentStatus::Refunded, native_id)
            .with_amount(amount)
            .with_raw(json!({ "reason": reason, "refunded_total": txn.refunded })))
    }

    async fn void_payment(&self, transaction_id: &str) -> Result<PaymentResult> {
        let native_id = self.native(transaction_id);
        let mut ledger = self.ledger.write().await;
        let txn = ledger
            .transactions
            .get_mut(native_id)
            .ok_or_else(|| PaymentError::transaction_not_found(transaction_id))?;

        match txn.status {
            PaymentStatus::Pending | PaymentStatus::Authorized => {
                txn.status = PaymentStatus::Voided;
                Ok(self.result(PaymentStatus::Voided, native_id))
            }
            PaymentStatus::Captured => Err(PaymentError::already_captured(transaction_id)),
            PaymentStatus::Refunded => Err(PaymentError::already_refunded(transaction_id)),
            status => Err(PaymentError::processing_error(format!(
                "Cannot void transaction '{}' in status {}",
                transaction_id, status
            ))),
        }
    }

    async fn payment_status(&self, transaction_id: &str) -> Result<PaymentStatus> {
        let ledger = self.ledger.read().await;
        ledger
            .transactions
            .get(self.native(transaction_id))
            .map(|txn| txn.status)
            .ok_or_else(|| PaymentError::transaction_not_found(transaction_id))
    }

    async fn handle_webhook(&self, payload: &str) -> Result<PaymentWebhookResult> {
        let body: Value = serde_json::from_str(payload).map_err(|e| {
            PaymentError::invalid_request(&[format!("malformed webhook payload: {}", e)])
        })?;
        let event = body
            .get("event")
            .and_then(Value::as_str)
            .ok_or_else(|| PaymentError::invalid_request(&["webhook event is required".to_string()]))?;
        let txn = body
            .get("transaction_id")
            .and_then(Value::as_str)
            .map(|id| transaction_id::compose(&self.id, id));

        Ok(PaymentWebhookResult::parsed(WebhookEventType::parse(event), txn).with_raw(body.clone()))
    }
}
