//! Sales operations: deal lifecycle, activities and reports

use super::model::{
    ActivityForm, ActivityStatus, Deal, DealForm, DealPatch, DealPriority, DealStage, LoseForm,
    SalesActivity,
};
use super::pipeline;
use super::stats::{FunnelStage, SalesStats, funnel};
use crate::core::error::{DashError, DashResult};
use crate::core::events::Notification;
use crate::core::mutation::{Mutation, Mutator};
use crate::core::query::ListQuery;
use crate::core::service::{live_rows, require};
use crate::core::validation::validate_form;
use crate::core::{DataService, Entity};
use crate::export::csv::{CsvColumn, to_csv_with_columns};
use crate::export::{ExportFile, ExportFormat, dated_filename};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Column layout of the pipeline CSV report
pub const PIPELINE_COLUMNS: [CsvColumn; 6] = [
    CsvColumn::new("Title", "name"),
    CsvColumn::new("Company", "company_name"),
    CsvColumn::new("Value", "value"),
    CsvColumn::new("Stage", "status"),
    CsvColumn::new("Probability", "probability"),
    CsvColumn::new("Close Date", "expected_close_date"),
];

pub struct SalesService {
    deals: Arc<dyn DataService<Deal>>,
    activities: Arc<dyn DataService<SalesActivity>>,
    mutator: Mutator,
    currency: String,
}

impl SalesService {
    pub fn new(
        deals: Arc<dyn DataService<Deal>>,
        activities: Arc<dyn DataService<SalesActivity>>,
        mutator: Mutator,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            deals,
            activities,
            mutator,
            currency: currency.into(),
        }
    }

    pub fn deals(&self) -> Arc<dyn DataService<Deal>> {
        self.deals.clone()
    }

    pub fn activities(&self) -> Arc<dyn DataService<SalesActivity>> {
        self.activities.clone()
    }

    pub async fn create_deal(&self, form: DealForm, actor: Option<Uuid>) -> DashResult<Deal> {
        self.mutator
            .run(Mutation::create("deal").by(actor), async move {
                validate_form(&form)?;

                let stage = form.stage.unwrap_or(DealStage::Lead);
                let mut deal = Deal::new(
                    form.title.trim().to_string(),
                    stage,
                    actor,
                    form.company_name,
                    form.contact_name,
                    form.contact_email,
                    form.contact_phone,
                    form.value,
                    form.currency.unwrap_or_else(|| self.currency.clone()),
                    form.probability.unwrap_or(stage.default_probability()),
                    form.priority.unwrap_or(DealPriority::Medium),
                    form.expected_close_date,
                    form.notes,
                    form.tags,
                    None,
                    None,
                    None,
                    None,
                );
                match stage {
                    DealStage::ClosedWon => deal.won_at = Some(deal.created_at),
                    DealStage::ClosedLost => deal.lost_at = Some(deal.created_at),
                    _ => {}
                }

                Ok(self.deals.create(deal).await?)
            })
            .await
    }

    /// Apply a partial update. A stage change without an explicit
    /// probability takes the stage's default probability.
    pub async fn update_deal(
        &self,
        id: Uuid,
        patch: DealPatch,
        actor: Option<Uuid>,
    ) -> DashResult<Deal> {
        self.mutator
            .run(Mutation::update("deal", id).by(actor), async move {
                validate_form(&patch)?;
                let mut deal = require(self.deals.as_ref(), id).await?;

                if let Some(title) = patch.title {
                    deal.name = title.trim().to_string();
                }
                if let Some(company_name) = patch.company_name {
                    deal.company_name = company_name;
                }
                if patch.contact_name.is_some() {
                    deal.contact_name = patch.contact_name;
                }
                if patch.contact_email.is_some() {
                    deal.contact_email = patch.contact_email;
                }
                if patch.contact_phone.is_some() {
                    deal.contact_phone = patch.contact_phone;
                }
                if let Some(value) = patch.value {
                    deal.value = value;
                }
                if let Some(currency) = patch.currency {
                    deal.currency = currency;
                }
                if let Some(priority) = patch.priority {
                    deal.priority = priority;
                }
                if patch.expected_close_date.is_some() {
                    deal.expected_close_date = patch.expected_close_date;
                }
                if patch.notes.is_some() {
                    deal.notes = patch.notes;
                }
                if let Some(tags) = patch.tags {
                    deal.tags = tags;
                }
                if let Some(stage) = patch.stage
                    && stage != deal.status
                {
                    pipeline::move_to(&mut deal, stage);
                }
                if let Some(probability) = patch.probability {
                    deal.probability = probability;
                }

                deal.touch();
                Ok(self.deals.update(&id, deal).await?)
            })
            .await
    }

    /// Move the deal one stage forward. On `closed_won`/`closed_lost` this
    /// is a no-op that returns the deal unchanged.
    pub async fn advance_stage(&self, id: Uuid, actor: Option<Uuid>) -> DashResult<Deal> {
        let mut deal = require(self.deals.as_ref(), id).await?;
        if deal.status.is_terminal() {
            self.mutator.events().notify(
                Notification::info("Deal is already closed")
                    .with_description(format!("{} is {}", deal.name, deal.status)),
            );
            return Ok(deal);
        }

        self.mutator
            .run(
                Mutation::action("deal", "advance_stage", Some(id))
                    .by(actor)
                    .titled("Deal advanced", "Failed to advance deal"),
                async move {
                    pipeline::advance(&mut deal);
                    Ok(self.deals.update(&id, deal).await?)
                },
            )
            .await
    }

    /// `closed_won`, probability 100
    pub async fn win(&self, id: Uuid, actor: Option<Uuid>) -> DashResult<Deal> {
        self.mutator
            .run(
                Mutation::action("deal", "win", Some(id))
                    .by(actor)
                    .titled("Deal won", "Failed to mark deal as won"),
                async move {
                    let mut deal = require(self.deals.as_ref(), id).await?;
                    if deal.status == DealStage::ClosedWon {
                        return Err(DashError::invalid_transition("deal", deal.status.to_string(), "win"));
                    }
                    pipeline::move_to(&mut deal, DealStage::ClosedWon);
                    Ok(self.deals.update(&id, deal).await?)
                },
            )
            .await
    }

    /// `closed_lost`, probability 0, with reason and competitor
    pub async fn lose(&self, id: Uuid, form: LoseForm, actor: Option<Uuid>) -> DashResult<Deal> {
        self.mutator
            .run(
                Mutation::action("deal", "lose", Some(id))
                    .by(actor)
                    .titled("Deal marked as lost", "Failed to mark deal as lost"),
                async move {
                    let mut deal = require(self.deals.as_ref(), id).await?;
                    if deal.status == DealStage::ClosedLost {
                        return Err(DashError::invalid_transition("deal", deal.status.to_string(), "lose"));
                    }
                    pipeline::move_to(&mut deal, DealStage::ClosedLost);
                    deal.loss_reason = form.reason;
                    deal.competitor = form.competitor;
                    Ok(self.deals.update(&id, deal).await?)
                },
            )
            .await
    }

    pub async fn log_activity(
        &self,
        deal_id: Uuid,
        form: ActivityForm,
        actor: Option<Uuid>,
    ) -> DashResult<SalesActivity> {
        self.mutator
            .run(
                Mutation::create("sales_activity")
                    .by(actor)
                    .titled("Activity logged", "Failed to log activity"),
                async move {
                    validate_form(&form)?;
                    let deal = require(self.deals.as_ref(), deal_id).await?;

                    let (status, completed_at) = if form.completed {
                        (ActivityStatus::Completed, Some(Utc::now()))
                    } else {
                        (ActivityStatus::Planned, None)
                    };
                    let activity = SalesActivity::new(
                        form.subject.trim().to_string(),
                        status,
                        actor.or(deal.owner_id),
                        deal.id,
                        form.activity_type,
                        form.description,
                        form.outcome,
                        form.scheduled_at,
                        completed_at,
                    );
                    Ok(self.activities.create(activity).await?)
                },
            )
            .await
    }

    /// Activities of one deal, newest first
    pub async fn activities_for(&self, deal_id: Uuid) -> DashResult<Vec<SalesActivity>> {
        require(self.deals.as_ref(), deal_id).await?;
        let activities = live_rows(self.activities.as_ref()).await?;
        Ok(activities
            .into_iter()
            .filter(|a| a.deal_id == deal_id)
            .collect())
    }

    pub async fn stats(&self, query: &ListQuery) -> DashResult<SalesStats> {
        let deals = self.deals.query(query).await?;
        Ok(SalesStats::compute(&deals))
    }

    pub async fn funnel(&self, query: &ListQuery) -> DashResult<Vec<FunnelStage>> {
        let deals = self.deals.query(query).await?;
        Ok(funnel(&deals))
    }

    /// Pipeline report with fixed columns
    pub async fn pipeline_csv(&self, query: &ListQuery) -> DashResult<ExportFile> {
        let deals = self.deals.query(query).await?;
        let body = to_csv_with_columns(&deals, &PIPELINE_COLUMNS)?;
        Ok(ExportFile::new(
            dated_filename("sales-pipeline", ExportFormat::Csv),
            ExportFormat::Csv.content_type(),
            body,
        ))
    }
}
