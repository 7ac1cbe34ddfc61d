use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::api::format::DashboardProfile;
use crate::auth::Caller;
use crate::database::models::{BudgetEntry, SavingsGoalEntry, UserDocument};
use crate::database::UserStore;
use crate::error::ApiError;
use crate::types::Access;

/// Number of most recently appended entries the dashboard shows per sequence
pub const RECENT_ENTRIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub profile: DashboardProfile,
    pub budgets: Vec<BudgetEntry>,
    pub savings_goals: Vec<SavingsGoalEntry>,
    pub total_budget: f64,
    pub total_budget_spent: f64,
    pub total_savings_goal: f64,
    pub total_savings_current: f64,
    pub budget_count: usize,
    pub savings_count: usize,
}

impl DashboardSummary {
    pub fn from_document(document: &UserDocument) -> Self {
        Self {
            profile: DashboardProfile::from(document),
            budgets: recent(&document.budgets),
            savings_goals: recent(&document.savings_goals),
            total_budget: total(&document.budgets, |b| b.amount),
            total_budget_spent: total(&document.budgets, |b| b.spent),
            total_savings_goal: total(&document.savings_goals, |g| g.target_amount),
            total_savings_current: total(&document.savings_goals, |g| g.current_amount),
            budget_count: document.budgets.len(),
            savings_count: document.savings_goals.len(),
        }
    }

    /// Zero-valued summary for an owner with no stored document
    pub fn empty(profile: DashboardProfile) -> Self {
        Self {
            profile,
            budgets: Vec::new(),
            savings_goals: Vec::new(),
            total_budget: 0.0,
            total_budget_spent: 0.0,
            total_savings_goal: 0.0,
            total_savings_current: 0.0,
            budget_count: 0,
            savings_count: 0,
        }
    }
}

/// Sum from +0.0; `Iterator::sum` over f64 starts at -0.0
fn total<T>(entries: &[T], amount: impl Fn(&T) -> f64) -> f64 {
    entries.iter().fold(0.0, |acc, entry| acc + amount(entry))
}

/// Last appended entries, still in insertion order
fn recent<T: Clone>(entries: &[T]) -> Vec<T> {
    let start = entries.len().saturating_sub(RECENT_ENTRIES);
    entries[start..].to_vec()
}

pub struct DashboardService {
    store: Arc<dyn UserStore>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn summary(&self, caller: &Caller, owner_id: &str) -> Result<DashboardSummary, ApiError> {
        caller.authorize(owner_id, Access::Read)?;

        match self.store.find(owner_id).await? {
            Some(document) => Ok(DashboardSummary::from_document(&document)),
            None => {
                info!("No document for user {}, returning empty dashboard", owner_id);
                Ok(DashboardSummary::empty(DashboardProfile::placeholder(owner_id, &caller.identity)))
            }
        }
    }
}
