use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BudgetEntry, SavingsGoalEntry};
use crate::auth::Identity;

/// One document per user, keyed by the identity provider's subject id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDocument {
    pub subject_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub phone_number: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub preferred_currency: Option<String>,
    pub monthly_income: Option<f64>,
    #[serde(rename = "savings_goal")]
    pub savings_goal_target: Option<f64>,
    #[serde(default)]
    pub budgets: Vec<BudgetEntry>,
    #[serde(default)]
    pub savings_goals: Vec<SavingsGoalEntry>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl UserDocument {
    /// Bare document with empty sequences
    pub fn new(subject_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            subject_id: subject_id.into(),
            email: None,
            display_name: None,
            phone_number: None,
            avatar_url: None,
            bio: None,
            preferred_currency: None,
            monthly_income: None,
            savings_goal_target: None,
            budgets: Vec::new(),
            savings_goals: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Registration document seeded from the caller's claims
    pub fn from_identity(identity: &Identity, now: DateTime<Utc>) -> Self {
        Self {
            email: Some(identity.email()),
            display_name: Some(identity.display_name()),
            phone_number: identity.claims.phone_number.clone(),
            avatar_url: identity.claims.picture.clone(),
            monthly_income: Some(0.0),
            savings_goal_target: Some(0.0),
            ..Self::new(identity.subject_id.clone(), now)
        }
    }
}
