use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{optional_amount, optional_text, require_amount, require_text, EntryKind, UserDocument};
use crate::database::store::Sequence;

/// Savings goal embedded in `savings_goals`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoalEntry {
    #[serde(rename = "_id")]
    pub entry_id: String,
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    pub target_date: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSavingsGoal {
    pub name: String,
    pub target_amount: f64,
    /// Accepted for client compatibility; new goals always start at 0
    #[serde(default)]
    pub current_amount: Option<f64>,
    pub target_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavingsGoalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EntryKind for SavingsGoalEntry {
    type New = NewSavingsGoal;
    type Patch = SavingsGoalPatch;

    const SEQUENCE: Sequence = Sequence::SavingsGoals;
    const LABEL: &'static str = "Savings goal";
    const ID_KEY: &'static str = "goal_id";

    fn create(new: NewSavingsGoal, entry_id: String, now: DateTime<Utc>) -> Result<Self, String> {
        require_text("name", &new.name)?;
        require_amount("target_amount", new.target_amount)?;

        Ok(Self {
            entry_id,
            name: new.name,
            target_amount: new.target_amount,
            current_amount: 0.0,
            target_date: new.target_date,
            description: new.description,
            created_at: now,
            updated_at: now,
        })
    }

    fn validate_patch(patch: &SavingsGoalPatch) -> Result<(), String> {
        optional_text("name", &patch.name)?;
        optional_amount("target_amount", patch.target_amount)?;
        optional_amount("current_amount", patch.current_amount)
    }

    fn entry_id(&self) -> &str {
        &self.entry_id
    }

    fn entries(document: &UserDocument) -> &[Self] {
        &document.savings_goals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn current_amount_starts_at_zero() {
        let new: NewSavingsGoal = serde_json::from_value(json!({
            "name": "Holiday",
            "target_amount": 1500.0,
            "current_amount": 400.0,
            "target_date": "2027-06-01"
        }))
        .unwrap();
        let goal = SavingsGoalEntry::create(new, "g1".into(), Utc::now()).unwrap();
        assert_eq!(goal.current_amount, 0.0);
        assert_eq!(goal.target_date.as_deref(), Some("2027-06-01"));
    }

    #[test]
    fn patch_rejects_non_finite_progress() {
        let patch = SavingsGoalPatch { current_amount: Some(f64::NAN), ..Default::default() };
        assert!(SavingsGoalEntry::validate_patch(&patch).is_err());
    }
}
