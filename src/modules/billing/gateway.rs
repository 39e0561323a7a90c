//! Payment gateway seam
//!
//! Charges and refunds go through [`PaymentGateway`]. The crate ships a
//! [`SimulatedGateway`] whose outcome is set by configuration.

use super::model::Invoice;
use crate::config::GatewayMode;
use crate::core::error::{ActionError, DashError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error("payment declined: {0}")]
    Declined(String),

    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

impl From<GatewayError> for DashError {
    fn from(err: GatewayError) -> Self {
        ActionError::Gateway {
            message: err.to_string(),
        }
        .into()
    }
}

/// Proof of a processed charge or refund
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    pub reference: String,
    pub amount: f64,
    pub processed_at: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Collect the remaining amount of an invoice
    async fn charge(&self, invoice: &Invoice) -> Result<Receipt, GatewayError>;

    /// Return part of a collected payment
    async fn refund(&self, invoice: &Invoice, amount: f64) -> Result<Receipt, GatewayError>;
}

/// In-process gateway: approves or declines everything
#[derive(Debug, Default)]
pub struct SimulatedGateway {
    mode: GatewayMode,
    sequence: AtomicU64,
}

impl SimulatedGateway {
    pub fn new(mode: GatewayMode) -> Self {
        Self {
            mode,
            sequence: AtomicU64::new(0),
        }
    }

    fn settle(&self, prefix: &str, amount: f64) -> Result<Receipt, GatewayError> {
        match self.mode {
            GatewayMode::Approve => {
                let n = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
                Ok(Receipt {
                    reference: format!("{}_{:06}", prefix, n),
                    amount,
                    processed_at: Utc::now(),
                })
            }
            GatewayMode::Decline => Err(GatewayError::Declined(
                "simulated gateway declines every request".to_string(),
            )),
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, invoice: &Invoice) -> Result<Receipt, GatewayError> {
        tracing::debug!(invoice = %invoice.number, amount = invoice.amount_remaining, "charge");
        self.settle("ch", invoice.amount_remaining)
    }

    async fn refund(&self, invoice: &Invoice, amount: f64) -> Result<Receipt, GatewayError> {
        tracing::debug!(invoice = %invoice.number, amount, "refund");
        self.settle("re", amount)
    }
}
