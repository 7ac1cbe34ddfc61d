mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};

#[tokio::test]
async fn health_reports_memory_store_healthy() -> Result<()> {
    let app = common::dev_app();

    let (status, body) = app.call(Method::GET, "/health", None, None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["working"], true);
    assert!(body["database"]["error"].is_null());
    Ok(())
}

#[tokio::test]
async fn root_describes_service() -> Result<()> {
    let app = common::dev_app();

    let (status, body) = app.call(Method::GET, "/", None, None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "SmartSaver API");
    assert!(body["endpoints"]["budgets"].is_string());
    Ok(())
}

#[tokio::test]
async fn routes_listing_includes_resource_families() -> Result<()> {
    let app = common::dev_app();

    let (status, body) = app.call(Method::GET, "/api/routes", None, None).await?;
    assert_eq!(status, StatusCode::OK);

    let routes = body["routes"].as_array().expect("routes array");
    let paths: Vec<&str> = routes.iter().filter_map(|r| r["path"].as_str()).collect();
    assert!(paths.contains(&"/api/budgets/:user_id"));
    assert!(paths.contains(&"/api/savings/:user_id/:goal_id"));
    assert!(paths.contains(&"/api/users/:user_id/dashboard"));
    Ok(())
}

#[tokio::test]
async fn unknown_path_gets_detail_body() -> Result<()> {
    let app = common::dev_app();

    let (status, body) = app.call(Method::GET, "/api/nope", None, None).await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, serde_json::json!({ "detail": "Not Found" }));
    Ok(())
}

#[tokio::test]
async fn wrong_method_gets_detail_body() -> Result<()> {
    let app = common::dev_app();

    let (status, body) = app.call(Method::PATCH, "/api/budgets/alice12345", None, None).await?;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, serde_json::json!({ "detail": "Method Not Allowed" }));
    Ok(())
}

#[tokio::test]
async fn unhealthy_store_is_503_without_internal_detail() -> Result<()> {
    let app = common::build_with_store(
        std::sync::Arc::new(common::DownStore),
        None,
        smartsaver_api::auth::AuthPolicy::strict(),
    );

    let (status, body) = app.call(Method::GET, "/health", None, None).await?;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["database"]["working"], false);
    let error = body["database"]["error"].as_str().expect("error message");
    assert!(!error.contains(common::DOWN_STORE_DETAIL));
    Ok(())
}

#[tokio::test]
async fn store_outage_on_api_call_is_generic_500() -> Result<()> {
    let app = common::build_with_store(
        std::sync::Arc::new(common::DownStore),
        None,
        smartsaver_api::auth::AuthPolicy { allow_dev_tokens: true, ..Default::default() },
    );

    let (status, body) = app.get("/api/budgets/alice12345", &common::dev_token("alice12345")).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Database temporarily unavailable, please retry");
    Ok(())
}
