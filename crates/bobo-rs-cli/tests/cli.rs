//! End-to-end tests for the command-line entry point.

use std::sync::Arc;

use bobo_rs_app::{AppFactory, Application};
use bobo_rs_cli::run_from;
use bobo_rs_core::{BoboError, Settings};
use bobo_rs_http::routing::{get, handler, HandlerDescriptor};

fn factory() -> AppFactory {
    Arc::new(|settings: &Settings| {
        Application::builder()
            .settings(settings.clone())
            .route(get("/", HandlerDescriptor::new("index"), handler(|_| Ok("index"))))
            .build()
    })
}

fn broken_factory() -> AppFactory {
    Arc::new(|_: &Settings| {
        Application::builder()
            .route(get("bad", HandlerDescriptor::new("bad"), handler(|_| Ok("x"))))
            .build()
    })
}

#[tokio::test]
async fn test_check_passes() {
    run_from(["bobo", "check"], factory()).await.unwrap();
}

#[tokio::test]
async fn test_routes_lists() {
    run_from(["bobo", "routes"], factory()).await.unwrap();
}

#[tokio::test]
async fn test_check_reports_build_failure() {
    let err = run_from(["bobo", "check"], broken_factory()).await.unwrap_err();
    assert!(matches!(err, BoboError::ImproperlyConfigured(_)));
}

#[tokio::test]
async fn test_unknown_command() {
    let err = run_from(["bobo", "migrate"], factory()).await.unwrap_err();
    assert!(matches!(err, BoboError::ConfigurationError(_)));
}

#[tokio::test]
async fn test_check_with_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bobo.json");
    std::fs::write(&path, r#"{"strict_status_codes": true}"#).unwrap();

    let path = path.to_string_lossy().into_owned();
    run_from(["bobo", "check", "--config", path.as_str()], factory())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_missing_settings_file() {
    let err = run_from(["bobo", "check", "--config", "/nonexistent/bobo.toml"], factory())
        .await
        .unwrap_err();
    assert!(matches!(err, BoboError::ConfigurationError(_) | BoboError::IoError(_)));
}
