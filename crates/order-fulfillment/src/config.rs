//! Application configuration.
//!
//! Loaded from an optional `fulfillment.toml` in the working directory, then from
//! environment variables prefixed with `FULFILLMENT` using `__` as the section separator:
//!
//! ```bash
//! FULFILLMENT__PAYMENT__FAILURE_RATE=0
//! FULFILLMENT__WORKFLOW__STAGE_DELAY_MS=5000
//! FULFILLMENT__WORKFLOW__FULFILLMENT_MODE=manual
//! ```

use durable_actor::RetryPolicy;
use serde::Deserialize;
use std::time::Duration;

/// Default configuration file name (extension resolved by the loader).
pub const DEFAULT_CONFIG_FILE: &str = "fulfillment";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "FULFILLMENT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentMode {
    /// CreateOrder drives the order all the way to DELIVERED.
    #[default]
    Automatic,
    /// CreateOrder stops at PROCESSING; operators ship and deliver.
    Manual,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Pause after each status transition so intermediate states can be observed.
    pub stage_delay_ms: u64,
    pub fulfillment_mode: FulfillmentMode,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            stage_delay_ms: 0,
            fulfillment_mode: FulfillmentMode::Automatic,
        }
    }
}

impl WorkflowConfig {
    pub fn stage_delay(&self) -> Duration {
        Duration::from_millis(self.stage_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    /// Probability that one simulated gateway attempt fails transiently.
    pub failure_rate: f64,
    /// Fixed latency of one simulated gateway attempt.
    pub processing_delay_ms: u64,
    pub invoice_base_url: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            failure_rate: 0.4,
            processing_delay_ms: 0,
            invoice_base_url: "https://example.test".to_string(),
        }
    }
}

impl PaymentConfig {
    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShipmentConfig {
    pub carrier: String,
    pub service_type: String,
    pub origin_location: String,
    pub estimated_delivery_days: u32,
}

impl Default for ShipmentConfig {
    fn default() -> Self {
        Self {
            carrier: "FedEx".to_string(),
            service_type: "STANDARD".to_string(),
            origin_location: "Warehouse".to_string(),
            estimated_delivery_days: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Page size used by ListItems when the caller passes zero or less.
    pub default_page_size: usize,
    /// Stock given to an item that UpdateStock creates on the fly. `None` rejects
    /// UpdateStock for unknown items instead.
    pub implicit_stock_baseline: Option<u32>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            implicit_stock_baseline: Some(999),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub step_max_attempts: u32,
    pub step_initial_backoff_ms: u64,
    pub step_max_backoff_ms: u64,
    pub invocation_max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            step_max_attempts: 5,
            step_initial_backoff_ms: 100,
            step_max_backoff_ms: 2_000,
            invocation_max_attempts: 3,
        }
    }
}

impl RetryConfig {
    pub fn step_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.step_max_attempts.max(1),
            initial_backoff: Duration::from_millis(self.step_initial_backoff_ms),
            max_backoff: Duration::from_millis(self.step_max_backoff_ms),
            jitter: true,
        }
    }

    pub fn invocation_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.invocation_max_attempts.max(1),
            initial_backoff: Duration::from_millis(self.step_initial_backoff_ms),
            max_backoff: Duration::from_millis(self.step_max_backoff_ms),
            jitter: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FulfillmentConfig {
    pub workflow: WorkflowConfig,
    pub payment: PaymentConfig,
    pub shipment: ShipmentConfig,
    pub inventory: InventoryConfig,
    pub retry: RetryConfig,
    /// Capacity of each actor's router channel.
    pub mailbox_capacity: usize,
    /// How long shutdown waits for in-flight invocations.
    pub shutdown_grace_ms: u64,
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            workflow: WorkflowConfig::default(),
            payment: PaymentConfig::default(),
            shipment: ShipmentConfig::default(),
            inventory: InventoryConfig::default(),
            retry: RetryConfig::default(),
            mailbox_capacity: 32,
            shutdown_grace_ms: 2_000,
        }
    }
}

impl FulfillmentConfig {
    /// Loads configuration from `fulfillment.toml` (optional) and `FULFILLMENT__*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let config = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: FulfillmentConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Zero delays, no simulated failures, immediate retries.
    pub fn for_test() -> Self {
        let mut config = Self::default();
        config.payment.failure_rate = 0.0;
        config.retry.step_initial_backoff_ms = 0;
        config.retry.step_max_backoff_ms = 0;
        config.shutdown_grace_ms = 100;
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.payment.failure_rate) {
            return Err(ConfigError::Invalid(format!(
                "payment.failure_rate must be within [0, 1], got {}",
                self.payment.failure_rate
            )));
        }
        if self.mailbox_capacity == 0 {
            return Err(ConfigError::Invalid("mailbox_capacity must be positive".into()));
        }
        if self.inventory.default_page_size == 0 {
            return Err(ConfigError::Invalid("inventory.default_page_size must be positive".into()));
        }
        Ok(())
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
