use crate::domain::order::{OrderCriteria, OrderId, OrderPaymentStatus, OrderStatus, OrderUpdate};
use crate::domain::payment::{PaymentRequest, PaymentResult, PaymentStatus};
use crate::domain::ports::{GatewayRef, OrderRepositoryRef};
use crate::domain::transaction_id;
use crate::domain::webhook::{PaymentWebhookResult, WebhookAction, WebhookEventType};
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Runs one payment lifecycle operation against a single gateway and keeps the
/// order in step with the outcome.
///
/// Failures are logged with their internal detail and returned unchanged. Nothing
/// is retried here: a payment operation must never be silently repeated.
#[derive(Clone)]
pub struct PaymentService {
    gateway: GatewayRef,
    orders: OrderRepositoryRef,
}

impl PaymentService {
    /// Binds a gateway to the order store it keeps in sync.
    ///
    /// # Arguments
    ///
    /// * `gateway` - The adapter every operation of this service runs against.
    /// * `orders` - The external order store updated after payments and webhooks.
    pub fn new(gateway: GatewayRef, orders: OrderRepositoryRef) -> Self {
        Self { gateway, orders }
    }

    pub fn gateway_id(&self) -> &str {
        self.gateway.gateway_id()
    }

    /// Validates, creates an intent, processes it and synchronizes the order.
    ///
    /// An invalid request fails before any gateway call and leaves the order untouched.
    /// Once the gateway has been involved the order is always synchronized, including
    /// when the gateway call itself failed. The returned transaction id always carries
    /// the gateway prefix. A charged payment is returned even if the order could not be
    /// updated; the failure is logged with the transaction id for reconciliation.
    pub async fn process_payment(
        &self,
        request: &PaymentRequest,
        payment_data: &Value,
    ) -> Result<PaymentResult> {
        let errors = request.validate();
        if !errors.is_empty() {
            let err = PaymentError::invalid_request(&errors);
            warn!(
                gateway = %self.gateway_id(),
                order_id = request.order_id(),
                error = %err,
                "Rejected invalid payment request"
            );
            return Err(err);
        }

        let outcome = self.charge(request, payment_data).await.map(|r| self.prefixed(r));
        let order_id = request.order_id();

        match outcome {
            Ok(result) => {
                if let Err(sync_err) = self.sync_order(order_id, &result).await {
                    error!(
                        gateway = %self.gateway_id(),
                        order_id,
                        transaction_id = ?result.gateway_transaction_id,
                        code = %sync_err.code(),
                        error = %sync_err,
                        "Failed to record payment outcome on order"
                    );
                }
                info!(
                    gateway = %self.gateway_id(),
                    order_id,
                    status = %result.status,
                    success = result.success,
                    "Payment processed"
                );
                Ok(result)
            }
            Err(err) => {
                self.log_failure("process_payment", &order_id.to_string(), &err);
                let failed = PaymentResult::failed(self.gateway_id(), err.message());
                if let Err(sync_err) = self.sync_order(order_id, &failed).await {
                    error!(
                        order_id,
                        code = %sync_err.code(),
                        error = %sync_err,
                        "Failed to record payment failure on order"
                    );
                }
                Err(err)
            }
        }
    }

    async fn charge(&self, request: &PaymentRequest, payment_data: &Value) -> Result<PaymentResult> {
        let intent = self.gateway.create_payment_intent(request).await?;
        debug!(
            gateway = %self.gateway_id(),
            intent_id = %intent.intent_id,
            order_id = intent.order_id,
            "Payment intent created"
        );
        self.gateway.process_payment(&intent, payment_data).await
    }

    pub async fn capture_payment(
        &self,
        transaction_id: &str,
        amount: Option<Decimal>,
    ) -> Result<PaymentResult> {
        let outcome = if self.gateway.supports_capture() {
            self.gateway
                .capture_payment(transaction_id, amount)
                .await
                .map(|r| self.prefixed(r))
        } else {
            Err(self.unsupported("capture"))
        };
        self.logged("capture_payment", transaction_id, outcome)
    }

    pub async fn refund_payment(
        &self,
        transaction_id: &str,
        amount: Decimal,
        reason: Option<&str>,
    ) -> Result<PaymentResult> {
        let outcome = if amount <= Decimal::ZERO {
            Err(PaymentError::invalid_amount(amount))
        } else if !self.gateway.supports_refunds() {
            Err(self.unsupported("refunds"))
        } else {
            self.gateway
                .refund_payment(transaction_id, amount, reason)
                .await
                .map(|r| self.prefixed(r))
        };
        self.logged("refund_payment", transaction_id, outcome)
    }

    pub async fn void_payment(&self, transaction_id: &str) -> Result<PaymentResult> {
        let outcome = if self.gateway.supports_void() {
            self.gateway
                .void_payment(transaction_id)
                .await
                .map(|r| self.prefixed(r))
        } else {
            Err(self.unsupported("void"))
        };
        self.logged("void_payment", transaction_id, outcome)
    }

    pub async fn payment_status(&self, transaction_id: &str) -> Result<PaymentStatus> {
        let outcome = self.gateway.payment_status(transaction_id).await;
        self.logged("payment_status", transaction_id, outcome)
    }

    /// Parses a gateway notification and applies it to the matching order.
    ///
    /// Never fails: the gateway must always get an acknowledgment. A missing order,
    /// an unmapped event or an order that already reflects the event is a no-op.
    pub async fn handle_webhook(&self, payload: &str) -> PaymentWebhookResult {
        let mut result = match self.gateway.handle_webhook(payload).await {
            Ok(result) => result,
            Err(err) => {
                self.log_failure("handle_webhook", "-", &err);
                return PaymentWebhookResult::rejected(err.message());
            }
        };

        if !result.success {
            return result;
        }
        let (Some(native_id), Some(event)) = (result.gateway_transaction_id.clone(), result.event_type)
        else {
            info!(gateway = %self.gateway_id(), "Webhook carries no actionable event");
            return result;
        };

        let txn = transaction_id::compose(self.gateway_id(), &native_id);
        let order = match self
            .orders
            .find_by(&OrderCriteria::by_transaction_id(&txn))
            .await
        {
            Ok(found) => found.into_iter().next(),
            Err(err) => {
                self.log_failure("handle_webhook", &txn, &err);
                return result;
            }
        };
        let Some(order) = order else {
            warn!(gateway = %self.gateway_id(), transaction_id = %txn, "No order found for webhook");
            return result;
        };

        let update = webhook_update(event);
        if order.reflects(&update) {
            info!(
                order_id = order.id,
                transaction_id = %txn,
                ?event,
                "Order already reflects webhook, skipping"
            );
            return result;
        }

        let new_status = update.payment_status.unwrap_or(order.payment_status);
        match self.orders.update(order.id, update).await {
            Ok(true) => {
                info!(order_id = order.id, %new_status, ?event, "Order updated from webhook");
                result.record(WebhookAction::OrderUpdated {
                    order_id: order.id,
                    new_status,
                });
            }
            Ok(false) => warn!(order_id = order.id, "Order disappeared before webhook update"),
            Err(err) => self.log_failure("handle_webhook", &txn, &err),
        }
        result
    }

    async fn sync_order(&self, order_id: OrderId, result: &PaymentResult) -> Result<()> {
        if !self.orders.update(order_id, order_update(result)).await? {
            warn!(order_id, gateway = %self.gateway_id(), "Order not found while synchronizing payment");
        }
        Ok(())
    }

    /// Composes `{gateway_id}_{native_id}` so the id routes back to this gateway.
    fn prefixed(&self, mut result: PaymentResult) -> PaymentResult {
        result.gateway_transaction_id = result
            .gateway_transaction_id
            .map(|txn| transaction_id::compose(self.gateway_id(), &txn));
        result
    }

    fn unsupported(&self, capability: &str) -> PaymentError {
        PaymentError::processing_error(format!(
            "Gateway '{}' does not support {}",
            self.gateway_id(),
            capability
        ))
    }

    fn logged<T>(&self, operation: &'static str, transaction_id: &str, outcome: Result<T>) -> Result<T> {
        outcome.inspect_err(|err| self.log_failure(operation, transaction_id, err))
    }

    fn log_failure(&self, operation: &'static str, reference: &str, err: &PaymentError) {
        error!(
            gateway = %self.gateway_id(),
            operation,
            reference,
            code = %err.code(),
            error = %err,
            gateway_message = ?err.gateway_message(),
            gateway_data = ?err.gateway_data(),
            "Payment operation failed"
        );
    }
}

/// Order fields implied by a payment outcome. An unsuccessful result never marks the order paid.
pub fn order_update(result: &PaymentResult) -> OrderUpdate {
    let (status, payment_status) = match (result.success, result.status) {
        (true, PaymentStatus::Captured) => (OrderStatus::Confirmed, OrderPaymentStatus::Paid),
        (true, PaymentStatus::Authorized) => (OrderStatus::Pending, OrderPaymentStatus::Authorized),
        (true, PaymentStatus::Pending) => (OrderStatus::Pending, OrderPaymentStatus::Pending),
        _ => (OrderStatus::Cancelled, OrderPaymentStatus::Failed),
    };

    OrderUpdate {
        status: Some(status),
        payment_status: Some(payment_status),
        payment_method: Some(result.gateway_id.clone()).filter(|id| !id.is_empty()),
        gateway_transaction_id: result.gateway_transaction_id.clone(),
    }
}

/// Order fields implied by a webhook event.
pub fn webhook_update(event: WebhookEventType) -> OrderUpdate {
    let (status, payment_status) = match event {
        WebhookEventType::PaymentSucceeded | WebhookEventType::PaymentCaptured => {
            (Some(OrderStatus::Confirmed), OrderPaymentStatus::Paid)
        }
        WebhookEventType::PaymentFailed | WebhookEventType::PaymentCancelled => {
            (Some(OrderStatus::Cancelled), OrderPaymentStatus::Failed)
        }
        WebhookEventType::PaymentRefunded => (None, OrderPaymentStatus::Refunded),
        WebhookEventType::PaymentAuthorized => (None, OrderPaymentStatus::Authorized),
    };

    OrderUpdate {
        status,
        payment_status: Some(payment_status),
        ..OrderUpdate::default()
    }
}
