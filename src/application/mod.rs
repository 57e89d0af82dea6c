//! Application layer orchestrating payment operations.
//!
//! [`manager::GatewayManager`] owns the gateway registry and picks a gateway for each
//! call; [`service::PaymentService`] runs the operation against that gateway and keeps
//! the external order in step with the outcome.

pub mod manager;
pub mod service;
