use axum::response::Json;
use serde_json::{json, Value};

use crate::routes::ROUTE_TABLE;

/// GET / - Service name, version and endpoint map
pub async fn root_get() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "SmartSaver API",
        "version": version,
        "description": "Budgeting backend: profiles, budgets, savings goals and dashboards",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "routes": "/api/routes (public)",
            "users": "/api/users/register, /api/users/:user_id[/dashboard] (protected)",
            "budgets": "/api/budgets/:user_id[/:budget_id] (protected)",
            "savings": "/api/savings/:user_id[/:goal_id] (protected)",
        }
    }))
}

/// GET /api/routes - Registered routes for frontend discovery
///
/// Expected Output:
/// ```json
/// { "routes": [ { "path": "/api/budgets/:user_id", "methods": ["GET", "POST"] } ] }
/// ```
pub async fn routes_get() -> Json<Value> {
    let routes: Vec<Value> = ROUTE_TABLE
        .iter()
        .map(|(path, methods)| json!({ "path": path, "methods": methods }))
        .collect();

    Json(json!({ "routes": routes }))
}
