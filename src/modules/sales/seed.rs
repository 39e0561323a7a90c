//! Demo pipeline

use super::model::{ActivityStatus, ActivityType, Deal, DealPriority, DealStage, SalesActivity};
use super::pipeline;
use crate::core::DataService;
use anyhow::Result;
use chrono::{Duration, Utc};

struct DemoDeal {
    title: &'static str,
    company: &'static str,
    contact: &'static str,
    value: f64,
    stage: DealStage,
    priority: DealPriority,
    close_in_days: i64,
}

const DEALS: &[DemoDeal] = &[
    DemoDeal {
        title: "Website redesign",
        company: "Northwind Traders",
        contact: "Ana Trujillo",
        value: 24_000.0,
        stage: DealStage::Lead,
        priority: DealPriority::Medium,
        close_in_days: 60,
    },
    DemoDeal {
        title: "Analytics platform",
        company: "Contoso",
        contact: "Sam Patel",
        value: 85_000.0,
        stage: DealStage::Qualified,
        priority: DealPriority::High,
        close_in_days: 45,
    },
    DemoDeal {
        title: "Support retainer",
        company: "Fabrikam",
        contact: "Lee Wong",
        value: 18_500.0,
        stage: DealStage::Proposal,
        priority: DealPriority::Low,
        close_in_days: 30,
    },
    DemoDeal {
        title: "Data migration",
        company: "Tailspin Toys",
        contact: "Maria Garcia",
        value: 42_000.0,
        stage: DealStage::Negotiation,
        priority: DealPriority::Critical,
        close_in_days: 10,
    },
    DemoDeal {
        title: "Annual licence",
        company: "Wide World Importers",
        contact: "Chris Lee",
        value: 120_000.0,
        stage: DealStage::ClosedWon,
        priority: DealPriority::High,
        close_in_days: -5,
    },
    DemoDeal {
        title: "Mobile app",
        company: "Adventure Works",
        contact: "Kim Novak",
        value: 60_000.0,
        stage: DealStage::ClosedLost,
        priority: DealPriority::Medium,
        close_in_days: -20,
    },
];

pub async fn seed(
    deals: &dyn DataService<Deal>,
    activities: &dyn DataService<SalesActivity>,
    currency: &str,
) -> Result<usize> {
    let today = Utc::now().date_naive();

    for demo in DEALS {
        let mut deal = Deal::new(
            demo.title.to_string(),
            DealStage::Lead,
            None,
            demo.company.to_string(),
            Some(demo.contact.to_string()),
            None,
            None,
            demo.value,
            currency.to_string(),
            DealStage::Lead.default_probability(),
            demo.priority,
            Some(today + Duration::days(demo.close_in_days)),
            None,
            vec![],
            None,
            None,
            None,
            None,
        );
        if demo.stage != DealStage::Lead {
            pipeline::move_to(&mut deal, demo.stage);
        }
        if demo.stage == DealStage::ClosedLost {
            deal.loss_reason = Some("Chose a cheaper vendor".to_string());
        }
        let deal = deals.create(deal).await?;

        activities
            .create(SalesActivity::new(
                format!("Intro call with {}", demo.contact),
                ActivityStatus::Completed,
                None,
                deal.id,
                ActivityType::Call,
                None,
                None,
                None,
                Some(Utc::now()),
            ))
            .await?;
    }

    Ok(DEALS.len())
}
