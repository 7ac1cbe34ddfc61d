pub mod budget;
pub mod savings_goal;
pub mod user;

pub use budget::{BudgetEntry, BudgetPatch, NewBudget};
pub use savings_goal::{NewSavingsGoal, SavingsGoalEntry, SavingsGoalPatch};
pub use user::UserDocument;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use super::store::Sequence;

/// An entry type embedded in a user document sequence
pub trait EntryKind: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Client payload for creation
    type New: DeserializeOwned + Send + 'static;
    /// Client payload for partial update; `None` fields are left untouched
    type Patch: Serialize + DeserializeOwned + Send + 'static;

    const SEQUENCE: Sequence;
    /// Human label used in messages ("Budget", "Savings goal")
    const LABEL: &'static str;
    /// Response key carrying a freshly created id
    const ID_KEY: &'static str;

    /// Validate the payload and build a new entry with numeric progress reset to 0
    fn create(new: Self::New, entry_id: String, now: DateTime<Utc>) -> Result<Self, String>;

    fn validate_patch(patch: &Self::Patch) -> Result<(), String>;

    fn entry_id(&self) -> &str;

    fn entries(document: &UserDocument) -> &[Self];
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} must not be empty", field));
    }
    Ok(())
}

pub(crate) fn require_amount(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{} must be a non-negative number", field));
    }
    Ok(())
}

pub(crate) fn optional_text(field: &str, value: &Option<String>) -> Result<(), String> {
    match value {
        Some(v) => require_text(field, v),
        None => Ok(()),
    }
}

pub(crate) fn optional_amount(field: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) => require_amount(field, v),
        None => Ok(()),
    }
}
