use crate::application::manager::GatewayManager;
use crate::domain::order::{Order, OrderId};
use crate::domain::payment::{PaymentRequest, PaymentResult, PaymentStatus};
use crate::domain::ports::OrderRepository;
use crate::domain::webhook::PaymentWebhookResult;
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Pay,
    Capture,
    Refund,
    Void,
    Status,
    Webhook,
}

/// One raw row of an operations script. Columns a row type does not use stay empty.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct OperationRecord {
    pub r#type: OperationType,
    pub order: Option<OrderId>,
    pub gateway: Option<String>,
    pub transaction: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub reason: Option<String>,
    pub event: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Pay {
        order: OrderId,
        amount: Decimal,
        currency: String,
        gateway: Option<String>,
    },
    Capture {
        transaction: String,
        amount: Option<Decimal>,
    },
    Refund {
        transaction: String,
        amount: Decimal,
        reason: Option<String>,
    },
    Void {
        transaction: String,
    },
    Status {
        transaction: String,
    },
    Webhook {
        gateway: String,
        payload: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    Payment(PaymentResult),
    Status(PaymentStatus),
    Webhook(PaymentWebhookResult),
}

fn required<T>(value: Option<T>, kind: OperationType, column: &str) -> Result<T> {
    value.ok_or_else(|| {
        PaymentError::invalid_request(&[format!(
            "{} operation requires '{}'",
            format!("{:?}", kind).to_lowercase(),
            column
        )])
    })
}

impl TryFrom<OperationRecord> for Operation {
    type Error = PaymentError;

    fn try_from(record: OperationRecord) -> Result<Self> {
        let kind = record.r#type;
        let operation = match kind {
            OperationType::Pay => Operation::Pay {
                order: required(record.order, kind, "order")?,
                amount: required(record.amount, kind, "amount")?,
                currency: required(record.currency, kind, "currency")?,
                gateway: record.gateway,
            },
            OperationType::Capture => Operation::Capture {
                transaction: required(record.transaction, kind, "transaction")?,
                amount: record.amount,
            },
            OperationType::Refund => Operation::Refund {
                transaction: required(record.transaction, kind, "transaction")?,
                amount: required(record.amount, kind, "amount")?,
                reason: record.reason,
            },
            OperationType::Void => Operation::Void {
                transaction: required(record.transaction, kind, "transaction")?,
            },
            OperationType::Status => Operation::Status {
                transaction: required(record.transaction, kind, "transaction")?,
            },
            OperationType::Webhook => {
                let event = required(record.event, kind, "event")?;
                Operation::Webhook {
                    gateway: required(record.gateway, kind, "gateway")?,
                    payload: json!({ "event": event, "transaction_id": record.transaction })
                        .to_string(),
                }
            }
        };
        Ok(operation)
    }
}

impl Operation {
    /// Runs the operation through the manager. A `pay` row creates its order if it does not exist yet.
    pub async fn execute(
        self,
        manager: &GatewayManager,
        orders: &dyn OrderRepository,
    ) -> Result<OperationOutcome> {
        match self {
            Operation::Pay {
                order,
                amount,
                currency,
                gateway,
            } => {
                if orders.get(order).await?.is_none() {
                    orders.insert(Order::new(order)).await?;
                }
                let request = PaymentRequest::new(order, amount, currency);
                manager
                    .process_payment(&request, &Value::Null, gateway.as_deref())
                    .await
                    .map(OperationOutcome::Payment)
            }
            Operation::Capture {
                transaction,
                amount,
            } => manager
                .capture_payment(&transaction, amount)
                .await
                .map(OperationOutcome::Payment),
            Operation::Refund {
                transaction,
                amount,
                reason,
            } => manager
                .refund_payment(&transaction, amount, reason.as_deref())
                .await
                .map(OperationOutcome::Payment),
            Operation::Void { transaction } => manager
                .void_payment(&transaction)
                .await
                .map(OperationOutcome::Payment),
            Operation::Status { transaction } => manager
                .payment_status(&transaction)
                .await
                .map(OperationOutcome::Status),
            Operation::Webhook { gateway, payload } => Ok(OperationOutcome::Webhook(
                manager.handle_webhook(&gateway, &payload).await,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use rust_decimal_macros::dec;

    fn record(kind: OperationType) -> OperationRecord {
        OperationRecord {
            r#type: kind,
            order: None,
            gateway: None,
            transaction: None,
            amount: None,
            currency: None,
            reason: None,
            event: None,
        }
    }

    #[test]
    fn test_pay_requires_amount() {
        let mut pay = record(OperationType::Pay);
        pay.order = Some(1);
        pay.currency = Some("USD".to_string());

        let err = Operation::try_from(pay).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert!(err.message().contains("pay operation requires 'amount'"));
    }

    #[test]
    fn test_refund_record() {
        let mut refund = record(OperationType::Refund);
        refund.transaction = Some("woo_1-1".to_string());
        refund.amount = Some(dec!(5));

        assert_eq!(
            Operation::try_from(refund).unwrap(),
            Operation::Refund {
                transaction: "woo_1-1".to_string(),
                amount: dec!(5),
                reason: None,
            }
        );
    }

    #[test]
    fn test_webhook_payload_is_built_from_columns() {
        let mut webhook = record(OperationType::Webhook);
        webhook.gateway = Some("woo".to_string());
        webhook.event = Some("payment.refunded".to_string());
        webhook.transaction = Some("woo_1-1".to_string());

        let Operation::Webhook { gateway, payload } = Operation::try_from(webhook).unwrap() else {
            panic!("expected webhook operation");
        };
        assert_eq!(gateway, "woo");
        let body: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(body["event"], "payment.refunded");
        assert_eq!(body["transaction_id"], "woo_1-1");
    }
}
