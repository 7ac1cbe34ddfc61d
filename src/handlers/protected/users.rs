use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::api::format::{ProfileUpdate, ProfileView};
use crate::auth::Caller;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::DashboardSummary;
use crate::state::AppState;
use crate::types::Access;

/// POST /api/users/register - Create the caller's own document
///
/// Repeating the call is not an error.
///
/// Expected Output:
/// ```json
/// { "message": "User registered successfully", "user_id": "uid" }
/// ```
pub async fn register_post(State(state): State<AppState>, Extension(caller): Extension<Caller>) -> ApiResult<Value> {
    let outcome = state.profiles().register(&caller).await?;
    Ok(ApiResponse::success(json!({
        "message": outcome.message(),
        "user_id": caller.subject_id(),
    })))
}

/// GET /api/users/:user_id - camelCase profile
pub async fn profile_get(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(owner_id): Path<String>,
) -> ApiResult<ProfileView> {
    let profile = state.profiles().get_profile(&caller, &owner_id).await?;
    Ok(ApiResponse::success(profile))
}

/// PUT /api/users/:user_id - Replace the profile fields
///
/// Expected Input:
/// ```json
/// {
///   "displayName": "string",     // Required
///   "email": "string",           // Required
///   "phoneNumber": "string",
///   "monthlyIncome": 4200.0,
///   "savingsGoal": 500.0,
///   "avatarUrl": "string",
///   "bio": "string",
///   "preferredCurrency": "USD"
/// }
/// ```
pub async fn profile_put(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(owner_id): Path<String>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<Value> {
    caller.authorize(&owner_id, Access::Write)?;
    let Json(update) = payload?;

    state.profiles().update_profile(&caller, &owner_id, update).await?;
    Ok(ApiResponse::success(json!({ "message": "Profile updated successfully" })))
}

/// GET /api/users/:user_id/dashboard - Totals and most recent entries
pub async fn dashboard_get(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(owner_id): Path<String>,
) -> ApiResult<DashboardSummary> {
    let summary = state.dashboards().summary(&caller, &owner_id).await?;
    Ok(ApiResponse::success(summary))
}
