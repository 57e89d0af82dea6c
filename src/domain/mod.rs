//! Payment domain: value objects, the order slice we synchronize, and the ports
//! to gateways and order storage.

pub mod order;
pub mod payment;
pub mod ports;
pub mod transaction_id;
pub mod webhook;
