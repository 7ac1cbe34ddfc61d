use axum::{
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::database::models::{BudgetEntry, SavingsGoalEntry};
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::auth_middleware;
use crate::state::AppState;

/// Every registered route with its methods, served by GET /api/routes
pub const ROUTE_TABLE: &[(&str, &[&str])] = &[
    ("/", &["GET"]),
    ("/health", &["GET"]),
    ("/api/routes", &["GET"]),
    ("/api/users/register", &["POST"]),
    ("/api/users/:user_id", &["GET", "PUT"]),
    ("/api/users/:user_id/dashboard", &["GET"]),
    ("/api/budgets/:user_id", &["GET", "POST"]),
    ("/api/budgets/:user_id/:budget_id", &["PUT", "DELETE"]),
    ("/api/savings/:user_id", &["GET", "POST"]),
    ("/api/savings/:user_id/:goal_id", &["PUT", "DELETE"]),
];

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.security);

    let protected_routes = Router::new()
        .merge(user_routes())
        .merge(budget_routes())
        .merge(savings_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        // Public
        .route("/", get(public::root_get))
        .route("/health", get(public::health_get))
        .route("/api/routes", get(public::routes_get))
        // Protected API
        .merge(protected_routes)
        .fallback(not_found)
        .with_state(state)
        // Global middleware
        .layer(middleware::map_response(method_not_allowed_body))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not Found")
}

/// Give the router's bare 405 responses the JSON error body, keeping `Allow`
async fn method_not_allowed_body(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut rewritten = ApiError::method_not_allowed("Method Not Allowed").into_response();
    if let Some(allow) = allow {
        rewritten.headers_mut().insert(header::ALLOW, allow);
    }
    rewritten
}

fn user_routes() -> Router<AppState> {
    use protected::{dashboard_get, profile_get, profile_put, register_post};

    Router::new()
        .route("/api/users/register", post(register_post))
        .route("/api/users/:user_id", get(profile_get).put(profile_put))
        .route("/api/users/:user_id/dashboard", get(dashboard_get))
}

fn budget_routes() -> Router<AppState> {
    use protected::{entry_create, entry_delete, entry_list, entry_update};

    Router::new()
        .route(
            "/api/budgets/:user_id",
            get(entry_list::<BudgetEntry>).post(entry_create::<BudgetEntry>),
        )
        .route(
            "/api/budgets/:user_id/:budget_id",
            put(entry_update::<BudgetEntry>).delete(entry_delete::<BudgetEntry>),
        )
}

fn savings_routes() -> Router<AppState> {
    use protected::{entry_create, entry_delete, entry_list, entry_update};

    Router::new()
        .route(
            "/api/savings/:user_id",
            get(entry_list::<SavingsGoalEntry>).post(entry_create::<SavingsGoalEntry>),
        )
        .route(
            "/api/savings/:user_id/:goal_id",
            put(entry_update::<SavingsGoalEntry>).delete(entry_delete::<SavingsGoalEntry>),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
