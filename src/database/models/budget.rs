use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{optional_amount, optional_text, require_amount, require_text, EntryKind, UserDocument};
use crate::database::store::Sequence;

/// Budget entry embedded in `budgets`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetEntry {
    #[serde(rename = "_id")]
    pub entry_id: String,
    pub category: String,
    /// Budgeted limit
    pub amount: f64,
    #[serde(default)]
    pub spent: f64,
    pub description: Option<String>,
    pub period: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// POST body. Any client-supplied `spent` is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBudget {
    pub category: String,
    pub amount: f64,
    pub description: Option<String>,
    pub period: Option<String>,
}

/// PUT body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

impl EntryKind for BudgetEntry {
    type New = NewBudget;
    type Patch = BudgetPatch;

    const SEQUENCE: Sequence = Sequence::Budgets;
    const LABEL: &'static str = "Budget";
    const ID_KEY: &'static str = "budget_id";

    fn create(new: NewBudget, entry_id: String, now: DateTime<Utc>) -> Result<Self, String> {
        require_text("category", &new.category)?;
        require_amount("amount", new.amount)?;

        Ok(Self {
            entry_id,
            category: new.category,
            amount: new.amount,
            spent: 0.0,
            description: new.description,
            period: new.period,
            created_at: now,
            updated_at: now,
        })
    }

    fn validate_patch(patch: &BudgetPatch) -> Result<(), String> {
        optional_text("category", &patch.category)?;
        optional_amount("amount", patch.amount)?;
        optional_amount("spent", patch.spent)
    }

    fn entry_id(&self) -> &str {
        &self.entry_id
    }

    fn entries(document: &UserDocument) -> &[Self] {
        &document.budgets
    }
}
