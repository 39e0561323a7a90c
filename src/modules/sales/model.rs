//! Deal and sales activity records

use crate::{closed_set, impl_data_entity};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

closed_set!(
    /// Pipeline stage of a deal, stored as its status
    DealStage {
        Lead => "lead",
        Qualified => "qualified",
        Proposal => "proposal",
        Negotiation => "negotiation",
        ClosedWon => "closed_won",
        ClosedLost => "closed_lost",
    }
);

closed_set!(
    DealPriority {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
);

closed_set!(
    ActivityType {
        Call => "call",
        Email => "email",
        Meeting => "meeting",
        Task => "task",
        Note => "note",
        Demo => "demo",
        SiteVisit => "site_visit",
    }
);

closed_set!(
    ActivityStatus {
        Planned => "planned",
        Completed => "completed",
    }
);

impl_data_entity!(Deal, "deal", "deals", DealStage, ["name", "company_name", "contact_name"], {
    company_name: String,
    contact_name: Option<String>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    value: f64,
    currency: String,
    probability: u8,
    priority: DealPriority,
    expected_close_date: Option<NaiveDate>,
    notes: Option<String>,
    tags: Vec<String>,
    won_at: Option<DateTime<Utc>>,
    lost_at: Option<DateTime<Utc>>,
    loss_reason: Option<String>,
    competitor: Option<String>,
});

impl Deal {
    /// The deal title, stored as the display name
    pub fn title(&self) -> &str {
        &self.name
    }

    /// `value * probability / 100`
    pub fn weighted_value(&self) -> f64 {
        self.value * f64::from(self.probability) / 100.0
    }
}

impl_data_entity!(
    SalesActivity,
    "sales_activity",
    "sales_activities",
    ActivityStatus,
    ["name", "description", "outcome"],
    {
        deal_id: Uuid,
        activity_type: ActivityType,
        description: Option<String>,
        outcome: Option<String>,
        scheduled_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
    }
);

impl SalesActivity {
    pub fn subject(&self) -> &str {
        &self.name
    }
}

/// Payload for `POST /deals`
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct DealForm {
    #[serde(alias = "name")]
    #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
    pub title: String,

    #[serde(default)]
    pub company_name: String,

    pub contact_name: Option<String>,

    #[validate(email(message = "must be a valid email address"))]
    pub contact_email: Option<String>,

    pub contact_phone: Option<String>,

    #[serde(default)]
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub value: f64,

    pub currency: Option<String>,

    pub stage: Option<DealStage>,

    #[validate(range(max = 100, message = "must lie between 0 and 100"))]
    pub probability: Option<u8>,

    pub priority: Option<DealPriority>,

    pub expected_close_date: Option<NaiveDate>,

    pub notes: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

/// Payload for `PUT /deals/{id}`; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct DealPatch {
    #[serde(alias = "name")]
    #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub value: Option<f64>,
    pub currency: Option<String>,
    pub stage: Option<DealStage>,
    #[validate(range(max = 100, message = "must lie between 0 and 100"))]
    pub probability: Option<u8>,
    pub priority: Option<DealPriority>,
    pub expected_close_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Payload for `POST /deals/{id}/lose`
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct LoseForm {
    #[serde(alias = "loss_reason")]
    pub reason: Option<String>,
    pub competitor: Option<String>,
}

/// Payload for `POST /deals/{id}/activities`
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ActivityForm {
    #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
    pub subject: String,

    #[serde(default = "default_activity_type", alias = "type")]
    pub activity_type: ActivityType,

    pub description: Option<String>,
    pub outcome: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,

    /// Log as already done
    #[serde(default = "default_completed")]
    pub completed: bool,
}

fn default_activity_type() -> ActivityType {
    ActivityType::Note
}

fn default_completed() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::{ClosedSet, Data};

    fn deal() -> Deal {
        Deal::new(
            "Platform rollout".into(),
            DealStage::Proposal,
            None,
            "Acme".into(),
            Some("Jane Roe".into()),
            None,
            None,
            50_000.0,
            "USD".into(),
            60,
            DealPriority::High,
            None,
            None,
            vec!["enterprise".into()],
            None,
            None,
            None,
            None,
        )
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(DealStage::ClosedWon.as_str(), "closed_won");
        assert_eq!("negotiation".parse::<DealStage>().unwrap(), DealStage::Negotiation);
        assert!("won".parse::<DealStage>().is_err());
    }

    #[test]
    fn test_weighted_value() {
        assert_eq!(deal().weighted_value(), 30_000.0);
    }

    #[test]
    fn test_search_covers_title_company_and_contact() {
        let deal = deal();
        assert!(deal.matches_search("rollout"));
        assert!(deal.matches_search("acme"));
        assert!(deal.matches_search("jane"));
        assert!(!deal.matches_search("globex"));
    }

    #[test]
    fn test_deal_form_validation() {
        let form: DealForm = serde_json::from_value(serde_json::json!({
            "title": "  ",
            "contact_email": "nope",
            "probability": 120
        }))
        .unwrap();
        let errors = form.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("contact_email"));
        assert!(fields.contains_key("probability"));
    }

    #[test]
    fn test_activity_form_defaults() {
        let form: ActivityForm =
            serde_json::from_value(serde_json::json!({"subject": "Intro call", "type": "call"})).unwrap();
        assert_eq!(form.activity_type, ActivityType::Call);
        assert!(form.completed);
    }
}
