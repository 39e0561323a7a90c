//! Sales CRM: deals, pipeline stages and activities

pub mod descriptor;
pub mod handlers;
pub mod model;
pub mod pipeline;
pub mod seed;
pub mod service;
pub mod stats;

pub use descriptor::{DealDescriptor, SalesActivityDescriptor};
pub use handlers::SalesState;
pub use model::{ActivityType, Deal, DealPriority, DealStage, SalesActivity};
pub use service::SalesService;
pub use stats::{FunnelStage, SalesStats};

use crate::core::DataService;
use crate::core::module::Module;
use crate::server::context::AppContext;
use crate::server::entity_registry::EntityRegistry;
use crate::storage::InMemoryDataService;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub struct SalesModule {
    state: SalesState,
    currency: String,
}

impl SalesModule {
    /// Sales module backed by in-memory tables
    pub fn new(context: &AppContext) -> Self {
        Self::with_services(
            context,
            Arc::new(InMemoryDataService::<Deal>::new()),
            Arc::new(InMemoryDataService::<SalesActivity>::new()),
        )
    }

    pub fn with_services(
        context: &AppContext,
        deals: Arc<dyn DataService<Deal>>,
        activities: Arc<dyn DataService<SalesActivity>>,
    ) -> Self {
        let currency = context.config.billing.currency.clone();
        let service = SalesService::new(
            deals.clone(),
            activities.clone(),
            context.mutator.clone(),
            currency.clone(),
        );
        Self {
            state: SalesState {
                deals: context.crud(deals),
                activities: context.crud(activities),
                service: Arc::new(service),
            },
            currency,
        }
    }

    pub fn service(&self) -> Arc<SalesService> {
        self.state.service.clone()
    }
}

#[async_trait]
impl Module for SalesModule {
    fn name(&self) -> &str {
        "sales"
    }

    fn entity_types(&self) -> Vec<&str> {
        vec!["deal", "sales_activity"]
    }

    fn register_entities(&self, registry: &mut EntityRegistry) {
        registry.register(Box::new(DealDescriptor {
            state: self.state.clone(),
        }));
        registry.register(Box::new(SalesActivityDescriptor {
            state: self.state.clone(),
        }));
    }

    async fn seed_demo(&self) -> Result<()> {
        seed::seed(
            self.state.deals.service.as_ref(),
            self.state.activities.service.as_ref(),
            &self.currency,
        )
        .await?;
        Ok(())
    }
}
