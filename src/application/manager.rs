use super::service::PaymentService;
use crate::domain::payment::{PaymentRequest, PaymentResult, PaymentStatus};
use crate::domain::ports::{GatewayRef, OrderRepositoryRef};
use crate::domain::transaction_id;
use crate::domain::webhook::PaymentWebhookResult;
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Public description of a registered gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayInfo {
    pub id: String,
    pub display_name: String,
    pub currencies: BTreeSet<String>,
    pub supports_authorization: bool,
    pub supports_capture: bool,
    pub supports_refunds: bool,
    pub supports_void: bool,
    pub is_default: bool,
}

/// Registry of gateway adapters and the router in front of them.
///
/// Gateways are kept in registration order. While the registry is non-empty exactly
/// one of them is the default. Every operation resolves a gateway, binds a transient
/// [`PaymentService`] to it and delegates.
pub struct GatewayManager {
    gateways: Vec<GatewayRef>,
    default_gateway: Option<String>,
    orders: OrderRepositoryRef,
}

impl GatewayManager {
    /// Creates an empty registry.
    ///
    /// # Arguments
    ///
    /// * `orders` - The external order store shared by every gateway's service.
    pub fn new(orders: OrderRepositoryRef) -> Self {
        Self {
            gateways: Vec::new(),
            default_gateway: None,
            orders,
        }
    }

    /// Registers `gateway`, replacing any gateway with the same id in place.
    ///
    /// The gateway becomes the default when `is_default` is set or when it is the
    /// first one registered.
    ///
    /// # Arguments
    ///
    /// * `gateway` - The adapter to register, keyed by its `gateway_id`.
    /// * `is_default` - Whether it should take over as the default gateway.
    pub fn register_gateway(&mut self, gateway: GatewayRef, is_default: bool) {
        let id = gateway.gateway_id().to_string();
        if id.contains(transaction_id::SEPARATOR) {
            warn!(gateway = %id, "Gateway id contains the transaction id separator, routing by transaction id will not reach it");
        }

        match self.position(&id) {
            Some(index) => self.gateways[index] = gateway,
            None => self.gateways.push(gateway),
        }
        if is_default || self.default_gateway.is_none() {
            self.default_gateway = Some(id.clone());
        }
        info!(gateway = %id, default = self.is_default(&id), "Payment gateway registered");
    }

    /// Removes a gateway. If it was the default, the first remaining gateway takes over.
    pub fn remove_gateway(&mut self, gateway_id: &str) -> Option<GatewayRef> {
        let index = self.position(gateway_id)?;
        let removed = self.gateways.remove(index);

        if self.is_default(gateway_id) {
            self.default_gateway = self
                .gateways
                .first()
                .map(|gateway| gateway.gateway_id().to_string());
            info!(
                removed = gateway_id,
                default = ?self.default_gateway,
                "Default payment gateway reassigned"
            );
        }
        Some(removed)
    }

    pub fn set_default_gateway(&mut self, gateway_id: &str) -> Result<()> {
        if self.position(gateway_id).is_none() {
            return Err(PaymentError::gateway_not_configured(Some(gateway_id)));
        }
        self.default_gateway = Some(gateway_id.to_string());
        Ok(())
    }

    pub fn default_gateway_id(&self) -> Option<&str> {
        self.default_gateway.as_deref()
    }

    pub fn has_gateway(&self, gateway_id: &str) -> bool {
        self.position(gateway_id).is_some()
    }

    /// Resolves an explicit gateway id, or the default when none is given.
    pub fn gateway(&self, gateway_id: Option<&str>) -> Result<GatewayRef> {
        let id = gateway_id
            .or(self.default_gateway.as_deref())
            .ok_or_else(|| PaymentError::gateway_not_configured(None))?;

        self.position(id)
            .map(|index| self.gateways[index].clone())
            .ok_or_else(|| PaymentError::gateway_not_configured(Some(id)))
    }

    /// First registered gateway supporting `currency`, falling back to the default.
    pub fn gateway_for_currency(&self, currency: &str) -> Result<GatewayRef> {
        match self
            .gateways
            .iter()
            .find(|gateway| gateway.supported_currencies().contains(currency))
        {
            Some(gateway) => Ok(gateway.clone()),
            None => {
                debug!(currency, "No gateway supports currency, using default");
                self.gateway(None)
            }
        }
    }

    pub fn gateways_for_currency(&self, currency: &str) -> Vec<GatewayInfo> {
        self.available_gateways()
            .into_iter()
            .filter(|info| info.currencies.contains(currency))
            .collect()
    }

    pub fn available_gateways(&self) -> Vec<GatewayInfo> {
        self.gateways
            .iter()
            .map(|gateway| GatewayInfo {
                id: gateway.gateway_id().to_string(),
                display_name: gateway.display_name().to_string(),
                currencies: gateway.supported_currencies(),
                supports_authorization: gateway.supports_authorization(),
                supports_capture: gateway.supports_capture(),
                supports_refunds: gateway.supports_refunds(),
                supports_void: gateway.supports_void(),
                is_default: self.is_default(gateway.gateway_id()),
            })
            .collect()
    }

    /// Owning gateway id of a transaction: the part before the first `_`, else the default.
    pub fn extract_gateway_from_transaction_id<'a>(&'a self, transaction_id: &'a str) -> Option<&'a str> {
        transaction_id::split(transaction_id)
            .map(|(gateway_id, _)| gateway_id)
            .or(self.default_gateway.as_deref())
    }

    /// Starts a payment on the explicit gateway, or on the best match for the request currency.
    pub async fn process_payment(
        &self,
        request: &PaymentRequest,
        payment_data: &Value,
        gateway_id: Option<&str>,
    ) -> Result<PaymentResult> {
        let gateway = match gateway_id {
            Some(id) => self.gateway(Some(id))?,
            None => self.gateway_for_currency(request.currency())?,
        };
        self.service(gateway)
            .process_payment(request, payment_data)
            .await
    }

    pub async fn capture_payment(
        &self,
        transaction_id: &str,
        amount: Option<Decimal>,
    ) -> Result<PaymentResult> {
        self.service_for_transaction(transaction_id)?
            .capture_payment(transaction_id, amount)
            .await
    }

    pub async fn refund_payment(
        &self,
        transaction_id: &str,
        amount: Decimal,
        reason: Option<&str>,
    ) -> Result<PaymentResult> {
        self.service_for_transaction(transaction_id)?
            .refund_payment(transaction_id, amount, reason)
            .await
    }

    pub async fn void_payment(&self, transaction_id: &str) -> Result<PaymentResult> {
        self.service_for_transaction(transaction_id)?
            .void_payment(transaction_id)
            .await
    }

    pub async fn payment_status(&self, transaction_id: &str) -> Result<PaymentStatus> {
        self.service_for_transaction(transaction_id)?
            .payment_status(transaction_id)
            .await
    }

    /// Always returns a result; an unknown gateway yields an unsuccessful one.
    pub async fn handle_webhook(&self, gateway_id: &str, payload: &str) -> PaymentWebhookResult {
        match self.gateway(Some(gateway_id)) {
            Ok(gateway) => self.service(gateway).handle_webhook(payload).await,
            Err(err) => {
                warn!(gateway = gateway_id, code = %err.code(), "Webhook for unconfigured gateway");
                PaymentWebhookResult::rejected(err.message())
            }
        }
    }

    fn service_for_transaction(&self, transaction_id: &str) -> Result<PaymentService> {
        let gateway_id = self.extract_gateway_from_transaction_id(transaction_id);
        let gateway = match gateway_id {
            Some(id) => self.gateway(Some(id))?,
            None => return Err(PaymentError::gateway_not_configured(None)),
        };
        Ok(self.service(gateway))
    }

    fn service(&self, gateway: GatewayRef) -> PaymentService {
        PaymentService::new(gateway, self.orders.clone())
    }

    fn position(&self, gateway_id: &str) -> Option<usize> {
        self.gateways
            .iter()
            .position(|gateway| gateway.gateway_id() == gateway_id)
    }

    fn is_default(&self, gateway_id: &str) -> bool {
        self.default_gateway.as_deref() == Some(gateway_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::infrastructure::in_memory::InMemoryOrderRepository;
    use crate::infrastructure::simulated::SimulatedGateway;
    use rand::Rng;
    use std::sync::Arc;

    fn manager() -> GatewayManager {
        GatewayManager::new(Arc::new(InMemoryOrderRepository::new()))
    }

    fn gateway(id: &str, currencies: &[&str]) -> GatewayRef {
        Arc::new(SimulatedGateway::new(id, id.to_uppercase(), currencies.iter().copied()))
    }

    #[test]
    fn test_first_registered_is_default() {
        let mut manager = manager();
        manager.register_gateway(gateway("stripe", &["USD"]), false);
        manager.register_gateway(gateway("woo", &["ILS"]), false);
        assert_eq!(manager.default_gateway_id(), Some("stripe"));
    }

    #[test]
    fn test_explicit_default_wins() {
        let mut manager = manager();
        manager.register_gateway(gateway("stripe", &["USD"]), false);
        manager.register_gateway(gateway("woo", &["ILS"]), true);
        assert_eq!(manager.default_gateway_id(), Some("woo"));
        assert!(manager.available_gateways()[1].is_default);
    }

    #[test]
    fn test_random_registrations_keep_one_default() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let mut manager = manager();
            let count = rng.gen_range(0..8);
            let flagged = if count > 0 && rng.gen_bool(0.5) {
                Some(rng.gen_range(0..count))
            } else {
                None
            };

            for i in 0..count {
                manager.register_gateway(gateway(&format!("gw{}", i), &["USD"]), flagged == Some(i));
            }

            let defaults = manager
                .available_gateways()
                .iter()
                .filter(|info| info.is_default)
                .count();
            if count == 0 {
                assert_eq!(defaults, 0);
                assert!(manager.default_gateway_id().is_none());
            } else {
                assert_eq!(defaults, 1);
                let expected = format!("gw{}", flagged.unwrap_or(0));
                assert_eq!(manager.default_gateway_id(), Some(expected.as_str()));
            }
        }
    }

    #[test]
    fn test_removing_default_promotes_remaining() {
        let mut manager = manager();
        manager.register_gateway(gateway("a", &["USD"]), true);
        manager.register_gateway(gateway("b", &["USD"]), false);

        assert!(manager.remove_gateway("a").is_some());
        assert_eq!(manager.default_gateway_id(), Some("b"));

        manager.remove_gateway("b");
        assert_eq!(manager.default_gateway_id(), None);
        let err = manager.gateway(None).err().unwrap();
        assert_eq!(err.code(), ErrorCode::GatewayNotConfigured);
    }

    #[test]
    fn test_removing_unknown_gateway_is_noop() {
        let mut manager = manager();
        manager.register_gateway(gateway("a", &["USD"]), false);
        assert!(manager.remove_gateway("zzz").is_none());
        assert_eq!(manager.default_gateway_id(), Some("a"));
        assert!(manager.has_gateway("a"));
        assert!(!manager.has_gateway("zzz"));
    }

    #[test]
    fn test_reregistering_replaces_in_place() {
        let mut manager = manager();
        manager.register_gateway(gateway("a", &["USD"]), false);
        manager.register_gateway(gateway("b", &["EUR"]), false);
        manager.register_gateway(gateway("a", &["ILS"]), false);

        let gateways = manager.available_gateways();
        assert_eq!(gateways.len(), 2);
        assert_eq!(gateways[0].id, "a");
        assert!(gateways[0].currencies.contains("ILS"));
    }

    #[test]
    fn test_currency_selection() {
        let mut manager = manager();
        manager.register_gateway(gateway("stripe", &["USD", "EUR"]), true);
        manager.register_gateway(gateway("woo", &["ILS"]), false);
        manager.register_gateway(gateway("paypal", &["ILS", "USD"]), false);

        assert_eq!(manager.gateway_for_currency("ILS").unwrap().gateway_id(), "woo");
        assert_eq!(manager.gateway_for_currency("JPY").unwrap().gateway_id(), "stripe");
        assert_eq!(manager.gateways_for_currency("ILS").len(), 2);
    }

    #[test]
    fn test_unknown_explicit_gateway() {
        let mut manager = manager();
        manager.register_gateway(gateway("woo", &["ILS"]), false);
        let err = manager.gateway(Some("stripe")).err().unwrap();
        assert_eq!(err.code(), ErrorCode::GatewayNotConfigured);
        assert!(manager.set_default_gateway("stripe").is_err());
    }

    #[test]
    fn test_extract_gateway_from_transaction_id() {
        let mut manager = manager();
        assert_eq!(manager.extract_gateway_from_transaction_id("abc123"), None);

        manager.register_gateway(gateway("woo", &["ILS"]), false);
        assert_eq!(
            manager.extract_gateway_from_transaction_id("stripe_abc123"),
            Some("stripe")
        );
        assert_eq!(manager.extract_gateway_from_transaction_id("abc123"), Some("woo"));
    }

    #[tokio::test]
    async fn test_webhook_for_unknown_gateway_is_rejected() {
        let manager = manager();
        let result = manager.handle_webhook("stripe", "{}").await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_transaction_routed_to_unregistered_gateway() {
        let mut manager = manager();
        manager.register_gateway(gateway("woo", &["ILS"]), false);
        let err = manager.payment_status("stripe_abc").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::GatewayNotConfigured);
    }
}
