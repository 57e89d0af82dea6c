use crate::domain::order::{Order, OrderId, OrderPaymentStatus, OrderStatus};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct OrderRow<'a> {
    order: OrderId,
    status: OrderStatus,
    payment_status: OrderPaymentStatus,
    payment_method: Option<&'a str>,
    gateway_transaction_id: Option<&'a str>,
}

/// Writes orders as CSV: `order,status,payment_status,payment_method,gateway_transaction_id`.
pub struct OrderWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OrderWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_orders(&mut self, orders: &[Order]) -> Result<()> {
        if orders.is_empty() {
            self.writer.write_record([
                "order",
                "status",
                "payment_status",
                "payment_method",
                "gateway_transaction_id",
            ])?;
        }
        for order in orders {
            self.writer.serialize(OrderRow {
                order: order.id,
                status: order.status,
                payment_status: order.payment_status,
                payment_method: order.payment_method.as_deref(),
                gateway_transaction_id: order.gateway_transaction_id.as_deref(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
