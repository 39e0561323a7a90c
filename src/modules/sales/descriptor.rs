//! Entity descriptors for the sales tables

use super::handlers::{
    SalesState, advance_deal, create_deal, deal_funnel, deal_stats, export_pipeline,
    list_deal_activities, log_activity, lose_deal, update_deal, win_deal,
};
use super::model::{Deal, SalesActivity};
use crate::server::crud;
use crate::server::entity_registry::EntityDescriptor;
use axum::Router;
use axum::routing::{get, post};

/// Descriptor for the Deal table
pub struct DealDescriptor {
    pub state: SalesState,
}

impl EntityDescriptor for DealDescriptor {
    fn entity_type(&self) -> &str {
        "deal"
    }

    fn plural(&self) -> &str {
        "deals"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route("/deals", get(crud::list::<Deal>).post(create_deal))
            .route("/deals/export", get(crud::export::<Deal>))
            .route("/deals/stats", get(deal_stats))
            .route("/deals/funnel", get(deal_funnel))
            .route("/deals/pipeline/export", get(export_pipeline))
            .route(
                "/deals/{id}",
                get(crud::fetch::<Deal>)
                    .put(update_deal)
                    .patch(update_deal)
                    .delete(crud::remove::<Deal>),
            )
            .route("/deals/{id}/restore", post(crud::restore::<Deal>))
            .route("/deals/{id}/advance", post(advance_deal))
            .route("/deals/{id}/win", post(win_deal))
            .route("/deals/{id}/lose", post(lose_deal))
            .route(
                "/deals/{id}/activities",
                get(list_deal_activities).post(log_activity),
            )
            .with_state(self.state.clone())
    }
}

/// Descriptor for the SalesActivity table
pub struct SalesActivityDescriptor {
    pub state: SalesState,
}

impl EntityDescriptor for SalesActivityDescriptor {
    fn entity_type(&self) -> &str {
        "sales_activity"
    }

    fn plural(&self) -> &str {
        "sales_activities"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route("/sales_activities", get(crud::list::<SalesActivity>))
            .route("/sales_activities/export", get(crud::export::<SalesActivity>))
            .route(
                "/sales_activities/{id}",
                get(crud::fetch::<SalesActivity>).delete(crud::remove::<SalesActivity>),
            )
            .route(
                "/sales_activities/{id}/restore",
                post(crud::restore::<SalesActivity>),
            )
            .with_state(self.state.clone())
    }
}
