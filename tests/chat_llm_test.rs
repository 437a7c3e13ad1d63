mod common;

use axum::http::StatusCode;
use common::{diabetes_form, TestApp};
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use symptoscan::chat::{ChatCompletion, OpenAiClient};
use symptoscan::config::ChatConfig;

fn client(url: String) -> Arc<dyn ChatCompletion> {
    let config = ChatConfig {
        api_url: url,
        timeout_secs: 5,
        ..Default::default()
    };
    Arc::new(OpenAiClient::new(&config, "test-key".to_string()).unwrap())
}

#[tokio::test]
async fn test_llm_reply_carries_prediction_context() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::Regex("CONTEXT".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"choices":[{"message":{"role":"assistant","content":"Walk 30 minutes daily."}}]}"#,
        )
        .create_async()
        .await;

    let app = TestApp::with_backend(Some(client(format!(
        "{}/v1/chat/completions",
        server.url()
    ))));
    let token = app.signup("kate").await;

    let (_, body) = app
        .post("/v1/diseases/diabetes/predict", Some(&token), diabetes_form())
        .await;
    let prediction_id = body["prediction"]["id"].as_str().unwrap().to_string();

    let (status, reply) = app
        .post(
            "/v1/chat/messages",
            Some(&token),
            json!({"message": "How much exercise do I need?", "prediction_id": prediction_id}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["response"], "Walk 30 minutes daily.");
    assert!(reply.get("error").is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_llm_failure_falls_back() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let app = TestApp::with_backend(Some(client(format!(
        "{}/v1/chat/completions",
        server.url()
    ))));
    let token = app.signup("liam").await;

    let (status, reply) = app
        .post(
            "/v1/chat/messages",
            Some(&token),
            json!({"message": "Is my blood pressure too high?"}),
        )
        .await;

    // Failures never surface as errors
    assert_eq!(status, StatusCode::OK);
    assert!(reply["error"].as_str().unwrap().contains("500"));
    assert!(!reply["response"].as_str().unwrap().is_empty());

    let conversation_id = reply["conversation_id"].as_str().unwrap();
    let (_, conversation) = app
        .get(
            &format!("/v1/chat/conversations/{}", conversation_id),
            Some(&token),
        )
        .await;
    assert_eq!(conversation["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_off_topic_never_reaches_llm() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let app = TestApp::with_backend(Some(client(format!(
        "{}/v1/chat/completions",
        server.url()
    ))));
    let token = app.signup("mona").await;

    let (status, reply) = app
        .post(
            "/v1/chat/messages",
            Some(&token),
            json!({"message": "How to cook pasta?"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["is_health_related"], false);
    mock.assert_async().await;
}
