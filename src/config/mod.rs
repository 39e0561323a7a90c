//! Configuration loading and management

use crate::core::error::ConfigError;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address, e.g. `127.0.0.1:3000`
    pub bind: String,

    /// Attach a permissive CORS layer
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            cors: true,
        }
    }
}

/// List pagination limits
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

/// Company printed on invoice documents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyProfile {
    pub name: String,
    pub address: String,
    pub email: String,
    pub tax_id: Option<String>,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            name: "Opsboard Inc.".to_string(),
            address: "1 Market Street, San Francisco, CA".to_string(),
            email: "billing@opsboard.dev".to_string(),
            tax_id: None,
        }
    }
}

/// Behaviour of the simulated payment gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayMode {
    /// Every charge and refund succeeds
    #[default]
    Approve,
    /// Every charge and refund is declined
    Decline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub company: CompanyProfile,

    /// ISO 4217 code used when a form does not name one
    pub currency: String,

    pub gateway: GatewayMode,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            company: CompanyProfile::default(),
            currency: "USD".to_string(),
            gateway: GatewayMode::default(),
        }
    }
}

/// Complete dashboard configuration
///
/// Every section is optional in YAML; missing values take their defaults.
///
/// ```yaml
/// server:
///   bind: 0.0.0.0:8080
/// pagination:
///   default_limit: 25
/// billing:
///   currency: EUR
///   gateway: decline
/// seed_demo_data: true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub server: ServerConfig,
    pub pagination: PaginationConfig,

    /// Broadcast buffer of the event bus
    pub event_capacity: usize,

    /// Entries kept by the audit log
    pub audit_capacity: usize,

    pub billing: BillingConfig,

    /// Fill the tables with demo rows on startup
    pub seed_demo_data: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            pagination: PaginationConfig::default(),
            event_capacity: 1024,
            audit_capacity: 1000,
            billing: BillingConfig::default(),
            seed_demo_data: false,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            message: format!("{}: {}", path, e),
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.to_string()),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: None,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pagination;
        if p.default_limit == 0 || p.default_limit > p.max_limit {
            return Err(ConfigError::InvalidValue {
                field: "pagination.default_limit".to_string(),
                value: p.default_limit.to_string(),
                message: format!("must lie between 1 and max_limit ({})", p.max_limit),
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "event_capacity".to_string(),
                value: "0".to_string(),
                message: "must be positive".to_string(),
            });
        }
        let currency = &self.billing.currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidValue {
                field: "billing.currency".to_string(),
                value: currency.clone(),
                message: "must be a three-letter ISO 4217 code".to_string(),
            });
        }
        Ok(())
    }
}
