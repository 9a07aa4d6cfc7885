//! The calculator end to end.

use bobo_calc::{app, DEFAULT_TITLE};
use bobo_rs::prelude::*;
use bobo_rs::test::{RouterClient, TestClient};

fn client() -> TestClient {
    TestClient::new(app(&Settings::default()).unwrap())
}

#[tokio::test]
async fn test_index_page() {
    let response = client().get("/").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.header("content-type"),
        Some("text/html; charset=UTF-8")
    );
    assert!(response.contains(&format!("<title>{DEFAULT_TITLE}</title>")));
    assert!(response.contains("calc('add.json')"));
    assert!(response.contains("calc('sub.json')"));
}

#[tokio::test]
async fn test_page_resets_input_to_a_number() {
    let client = client();
    let page = client.get("/").await;
    assert!(page.contains(r#"input.value = "0""#));
    assert!(!page.contains(r#"input.value = """#));

    let response = client.post("/add.json", &[("value", "3"), ("input", "0")]).await;
    assert_eq!(response.status_code(), 200);
    let json: serde_json::Value = response.json().unwrap();
    assert_eq!(json["value"], 3);
}

#[tokio::test]
async fn test_title_from_settings_is_escaped() {
    let mut settings = Settings::default();
    settings
        .extra
        .insert("title".to_string(), serde_json::json!("<Calc & Co>"));
    let client = TestClient::new(app(&settings).unwrap());

    let response = client.get("/").await;
    assert!(response.contains("<title>&lt;Calc &amp; Co&gt;</title>"));
}

#[tokio::test]
async fn test_add_and_sub() {
    let client = client();

    let response = client.get("/add.json?value=40&input=2").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(response.text(), r#"{"value":42}"#);

    let response = client.post("/sub.json", &[("value", "10"), ("input", "15")]).await;
    let json: serde_json::Value = response.json().unwrap();
    assert_eq!(json["value"], -5);
}

#[tokio::test]
async fn test_missing_arguments_default_to_zero() {
    let response = client().get("/add.json?input=7").await;
    assert_eq!(response.text(), r#"{"value":7}"#);
}

#[tokio::test]
async fn test_non_numeric_argument() {
    let response = client().get("/add.json?value=abc").await;
    assert_eq!(response.status_code(), 404);

    let strict = TestClient::new(
        app(&Settings {
            strict_status_codes: true,
            ..Settings::default()
        })
        .unwrap(),
    );
    let response = strict.get("/add.json?value=abc").await;
    assert_eq!(response.status_code(), 403);
    assert!(response.contains("Form variable value must be"));
}

#[tokio::test]
async fn test_overflow_is_bad_request() {
    let path = format!("/add.json?value={}&input=1", i64::MAX);
    let response = client().get(&path).await;
    assert_eq!(response.status_code(), 400);
    assert!(response.contains("add overflowed"));
}

#[tokio::test]
async fn test_through_the_router() {
    let client = RouterClient::new(app(&Settings::default()).unwrap());
    let response = client
        .post_json("/add.json", &serde_json::json!({"value": 1, "input": 2}))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.text(), r#"{"value":3}"#);

    assert_eq!(client.delete("/add.json").await.status_code(), 404);
}
