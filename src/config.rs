//! Gateway configuration.
//!
//! A JSON document lists the gateways to register:
//!
//! ```json
//! { "gateways": [
//!     { "id": "woo", "display_name": "WooCommerce", "currencies": ["ILS"], "default": true },
//!     { "id": "stripe", "currencies": ["USD", "EUR"], "capture": "manual", "void": false }
//! ] }
//! ```

use crate::application::manager::GatewayManager;
use crate::domain::ports::OrderRepositoryRef;
use crate::error::{ErrorCode, PaymentError, Result};
use crate::infrastructure::simulated::{CaptureMode, SimulatedGateway};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GatewayConfig {
    pub id: String,
    pub display_name: Option<String>,
    pub currencies: Vec<String>,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub capture: CaptureMode,
    /// Forces every payment on this gateway to fail with the given code.
    #[serde(default)]
    pub decline: Option<ErrorCode>,
    #[serde(default = "enabled")]
    pub refunds: bool,
    #[serde(default = "enabled")]
    pub void: bool,
}

fn enabled() -> bool {
    true
}

impl GatewayConfig {
    pub fn build(&self) -> SimulatedGateway {
        let display_name = self.display_name.clone().unwrap_or_else(|| self.id.clone());
        let mut gateway = SimulatedGateway::new(self.id.clone(), display_name, self.currencies.clone())
            .with_capture_mode(self.capture);
        if let Some(code) = self.decline {
            gateway = gateway.declining(code);
        }
        if !self.refunds {
            gateway = gateway.without_refunds();
        }
        if !self.void {
            gateway = gateway.without_void();
        }
        gateway
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    pub gateways: Vec<GatewayConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateways: vec![GatewayConfig {
                id: "simulated".to_string(),
                display_name: Some("Simulated Gateway".to_string()),
                currencies: vec!["USD".to_string(), "EUR".to_string(), "ILS".to_string()],
                default: true,
                capture: CaptureMode::Automatic,
                decline: None,
                refunds: true,
                void: true,
            }],
        }
    }
}

impl AppConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|e| {
            PaymentError::processing_error(format!("Invalid gateway configuration: {}", e))
        })?;

        if config.gateways.iter().filter(|g| g.default).count() > 1 {
            return Err(PaymentError::processing_error(
                "Invalid gateway configuration: more than one default gateway",
            ));
        }
        Ok(config)
    }

    /// Builds a manager with every configured gateway registered in file order.
    pub fn manager(&self, orders: OrderRepositoryRef) -> GatewayManager {
        let mut manager = GatewayManager::new(orders);
        for gateway in &self.gateways {
            manager.register_gateway(Arc::new(gateway.build()), gateway.default);
        }
        manager
    }
}
