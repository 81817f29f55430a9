//! `OpenAI` generator tests against a local one-shot HTTP server

use std::time::Duration;

use ghostreply::generator::ReplyGenerator;
use ghostreply::{Error, OpenAiGenerator, STOP_SEQUENCES};
use secrecy::SecretString;

mod common;
use common::serve_once;

fn generator(base_url: String, organization: Option<&str>) -> OpenAiGenerator {
    OpenAiGenerator::new(
        SecretString::from("sk-test".to_string()),
        Some(base_url),
        organization.map(ToString::to_string),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_complete_returns_trimmed_first_choice() {
    let body = serde_json::json!({
        "choices": [
            { "message": { "role": "assistant", "content": "  sounds good, see you at 8  " } }
        ]
    })
    .to_string();
    let (url, server) = serve_once("200 OK", body).await;

    let reply = generator(url, Some("org-123"))
        .complete("prompt text", "gpt-3.5-turbo", &STOP_SEQUENCES)
        .await
        .unwrap();
    assert_eq!(reply, "sounds good, see you at 8");

    let request = server.await.unwrap();
    let lower = request.to_lowercase();
    assert!(request.starts_with("POST /v1/chat/completions "));
    assert!(lower.contains("authorization: bearer sk-test"));
    assert!(lower.contains("openai-organization: org-123"));

    let json_start = request.find("\r\n\r\n").unwrap() + 4;
    let sent: serde_json::Value = serde_json::from_str(&request[json_start..]).unwrap();
    assert_eq!(sent["model"], "gpt-3.5-turbo");
    assert_eq!(sent["messages"][0]["content"], "prompt text");
    assert_eq!(sent["stop"], serde_json::json!(["\n", " me:", " them:"]));
    assert_eq!(sent["temperature"], 0.5);
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let body = r#"{"error":{"message":"Rate limit reached"}}"#.to_string();
    let (url, server) = serve_once("429 Too Many Requests", body).await;

    let err = generator(url, None)
        .complete("prompt", "gpt-3.5-turbo", &STOP_SEQUENCES)
        .await
        .unwrap_err();

    let request = server.await.unwrap();
    assert!(!request.to_lowercase().contains("openai-organization"));
    assert!(matches!(err, Error::Generator(_)));
    assert!(err.to_string().contains("429"));
    assert!(err.to_string().contains("Rate limit reached"));
}

#[tokio::test]
async fn test_empty_choices_is_an_error() {
    let (url, _server) = serve_once("200 OK", r#"{"choices":[]}"#.to_string()).await;

    let err = generator(url, None)
        .complete("prompt", "gpt-3.5-turbo", &STOP_SEQUENCES)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("no content"));
}

#[tokio::test]
async fn test_blank_content_is_an_error() {
    let body = serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": " \n\t " } }]
    })
    .to_string();
    let (url, _server) = serve_once("200 OK", body).await;

    let err = generator(url, None)
        .complete("prompt", "gpt-3.5-turbo", &STOP_SEQUENCES)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Generator(_)));
    assert!(err.to_string().contains("no content"));
}

#[tokio::test]
async fn test_unreachable_server_is_an_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = generator(format!("http://{addr}/v1"), None)
        .complete("prompt", "gpt-3.5-turbo", &STOP_SEQUENCES)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Generator(_)));
}
