// Budget and savings goal routes share these handlers, instantiated per entry kind.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::{json, Map, Value};

use crate::auth::Caller;
use crate::database::models::EntryKind;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::Access;

/// GET /api/{budgets,savings}/:user_id - Entries in stored order
pub async fn list<K: EntryKind>(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(owner_id): Path<String>,
) -> ApiResult<Vec<K>> {
    let entries = state.entries::<K>().list(&caller, &owner_id).await?;
    Ok(ApiResponse::success(entries))
}

/// POST /api/{budgets,savings}/:user_id - Append an entry
///
/// Expected Output:
/// ```json
/// { "message": "Budget created successfully", "budget_id": "9f1c..." }
/// ```
pub async fn create<K: EntryKind>(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(owner_id): Path<String>,
    payload: Result<Json<K::New>, JsonRejection>,
) -> ApiResult<Value> {
    // Ownership is decided before the body is looked at
    caller.authorize(&owner_id, Access::Write)?;
    let Json(payload) = payload?;

    let entry_id = state.entries::<K>().create(&caller, &owner_id, payload).await?;

    let mut body = Map::new();
    body.insert("message".to_string(), json!(format!("{} created successfully", K::LABEL)));
    body.insert(K::ID_KEY.to_string(), json!(entry_id));
    Ok(ApiResponse::success(Value::Object(body)))
}

/// PUT /api/{budgets,savings}/:user_id/:entry_id - Merge non-null fields into one entry
pub async fn update<K: EntryKind>(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((owner_id, entry_id)): Path<(String, String)>,
    payload: Result<Json<K::Patch>, JsonRejection>,
) -> ApiResult<Value> {
    caller.authorize(&owner_id, Access::Write)?;
    let Json(patch) = payload?;

    state.entries::<K>().update(&caller, &owner_id, &entry_id, patch).await?;
    Ok(ApiResponse::success(json!({
        "message": format!("{} updated successfully", K::LABEL)
    })))
}

/// DELETE /api/{budgets,savings}/:user_id/:entry_id
pub async fn delete<K: EntryKind>(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((owner_id, entry_id)): Path<(String, String)>,
) -> ApiResult<Value> {
    state.entries::<K>().delete(&caller, &owner_id, &entry_id).await?;
    Ok(ApiResponse::success(json!({
        "message": format!("{} deleted successfully", K::LABEL)
    })))
}
