use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{resolve_identity, Caller};
use crate::error::ApiError;
use crate::state::AppState;

/// Bearer authentication middleware that resolves the caller identity
/// and injects a `Caller` into request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_from_headers(&headers).map_err(ApiError::unauthorized)?;

    let identity = resolve_identity(&token, state.verifier.as_deref(), &state.policy).await?;
    tracing::debug!("Authenticated {} via {:?}", identity.subject_id, identity.source);

    request
        .extensions_mut()
        .insert(Caller::new(identity, state.policy.dev_read_bypass));

    Ok(next.run(request).await)
}

/// Extract the bearer credential from the Authorization header
fn extract_bearer_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        let token = token.trim();
        if token.is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
