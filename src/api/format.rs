// Wire shapes for user-facing profile data.
//
// Stored documents use snake_case field names; the profile endpoints speak camelCase.
// Entry lists keep the stored names (`_id`, snake_case) that existing clients read.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::Identity;
use crate::database::models::{require_amount, require_text, UserDocument};

pub const DEFAULT_CURRENCY: &str = "USD";

/// GET /api/users/:user_id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub monthly_income: Option<f64>,
    pub savings_goal: Option<f64>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub preferred_currency: String,
}

impl From<&UserDocument> for ProfileView {
    fn from(doc: &UserDocument) -> Self {
        Self {
            display_name: doc.display_name.clone(),
            email: doc.email.clone(),
            phone_number: doc.phone_number.clone(),
            monthly_income: doc.monthly_income,
            savings_goal: doc.savings_goal_target,
            avatar_url: doc.avatar_url.clone(),
            bio: doc.bio.clone(),
            preferred_currency: doc
                .preferred_currency
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        }
    }
}

impl ProfileView {
    /// Profile built from claims when nothing is stored for the owner
    pub fn placeholder(owner_id: &str, identity: &Identity) -> Self {
        let (display_name, email) = placeholder_names(owner_id, identity);
        Self {
            display_name: Some(display_name),
            email: Some(email),
            phone_number: None,
            monthly_income: Some(0.0),
            savings_goal: Some(0.0),
            avatar_url: None,
            bio: None,
            preferred_currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Profile block of the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardProfile {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub monthly_income: Option<f64>,
    pub savings_goal: Option<f64>,
    pub avatar_url: Option<String>,
}

impl From<&UserDocument> for DashboardProfile {
    fn from(doc: &UserDocument) -> Self {
        Self {
            display_name: doc.display_name.clone(),
            email: doc.email.clone(),
            phone_number: doc.phone_number.clone(),
            monthly_income: doc.monthly_income,
            savings_goal: doc.savings_goal_target,
            avatar_url: doc.avatar_url.clone(),
        }
    }
}

impl DashboardProfile {
    pub fn placeholder(owner_id: &str, identity: &Identity) -> Self {
        let (display_name, email) = placeholder_names(owner_id, identity);
        Self {
            display_name: Some(display_name),
            email: Some(email),
            phone_number: None,
            monthly_income: Some(0.0),
            savings_goal: Some(0.0),
            avatar_url: None,
        }
    }
}

fn placeholder_names(owner_id: &str, identity: &Identity) -> (String, String) {
    let display_name = identity
        .claims
        .name
        .clone()
        .unwrap_or_else(|| format!("User {}", owner_id));
    let email = identity
        .claims
        .email
        .clone()
        .unwrap_or_else(|| format!("{}@example.com", owner_id));
    (display_name, email)
}

/// PUT /api/users/:user_id body. Replaces every profile field.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub display_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub monthly_income: Option<f64>,
    pub savings_goal: Option<f64>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    #[serde(default = "default_currency")]
    pub preferred_currency: Option<String>,
}

fn default_currency() -> Option<String> {
    Some(DEFAULT_CURRENCY.to_string())
}

/// Storage-side names of the profile fields
#[derive(Serialize)]
struct StoredProfile<'a> {
    display_name: &'a str,
    email: &'a str,
    phone_number: &'a Option<String>,
    monthly_income: Option<f64>,
    savings_goal: Option<f64>,
    avatar_url: &'a Option<String>,
    bio: &'a Option<String>,
    preferred_currency: &'a Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), String> {
        require_text("displayName", &self.display_name)?;
        require_text("email", &self.email)?;
        if let Some(income) = self.monthly_income {
            require_amount("monthlyIncome", income)?;
        }
        if let Some(target) = self.savings_goal {
            require_amount("savingsGoal", target)?;
        }
        Ok(())
    }

    /// Top-level document fields to set
    pub fn to_storage_fields(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let stored = StoredProfile {
            display_name: &self.display_name,
            email: &self.email,
            phone_number: &self.phone_number,
            monthly_income: self.monthly_income,
            savings_goal: self.savings_goal,
            avatar_url: &self.avatar_url,
            bio: &self.bio,
            preferred_currency: &self.preferred_currency,
        };
        match serde_json::to_value(stored)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::dev_token;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn profile_view_is_camel_case_with_currency_default() {
        let mut doc = UserDocument::new("u1", Utc::now());
        doc.display_name = Some("Ana".into());
        doc.savings_goal_target = Some(300.0);

        let value = serde_json::to_value(ProfileView::from(&doc)).unwrap();
        assert_eq!(value["displayName"], "Ana");
        assert_eq!(value["savingsGoal"], 300.0);
        assert_eq!(value["preferredCurrency"], "USD");
        assert!(value.get("display_name").is_none());
    }

    #[test]
    fn update_maps_to_storage_names() {
        let update: ProfileUpdate = serde_json::from_value(json!({
            "displayName": "Ana",
            "email": "ana@mail.test",
            "monthlyIncome": 4200.0,
            "savingsGoal": 500.0
        }))
        .unwrap();
        let fields = update.to_storage_fields().unwrap();
        assert_eq!(fields["display_name"], "Ana");
        assert_eq!(fields["monthly_income"], 4200.0);
        assert_eq!(fields["savings_goal"], 500.0);
        assert_eq!(fields["preferred_currency"], "USD");
        assert!(fields.get("displayName").is_none());
    }

    #[test]
    fn placeholder_uses_claims_then_owner() {
        let identity = dev_token::parse("dev_alice12345").unwrap();
        let view = ProfileView::placeholder("alice12345", &identity);
        assert_eq!(view.display_name.as_deref(), Some("User alice12345"));
        assert_eq!(view.email.as_deref(), Some("alice12345@example.com"));
        assert_eq!(view.monthly_income, Some(0.0));
    }

    #[test]
    fn update_requires_display_name() {
        let update: ProfileUpdate =
            serde_json::from_value(json!({"displayName": " ", "email": "a@b.test"})).unwrap();
        assert!(update.validate().is_err());
    }
}
