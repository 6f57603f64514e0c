use super::anthropic::{build_body, classify_status, parse_response};
use super::*;
use crate::core::error::ErrorKind;
use crate::core::message::ChatMessage;
use crate::core::model::ModelId;
use crate::core::provider::CompletionRequest;

fn request() -> CompletionRequest {
    CompletionRequest {
        model: ModelId("claude-haiku-4-5-20251001".into()),
        max_output_tokens: 8192,
        system_prompt: Some("Answer in JSON".into()),
        messages: vec![
            ChatMessage::user("make it blue"),
            ChatMessage::assistant("{\"message\":\"done\"}"),
            ChatMessage::user("Current Code State: ..."),
        ],
    }
}

#[test]
fn test_build_body() {
    let body = build_body(&request());
    assert_eq!(body["model"], "claude-haiku-4-5-20251001");
    assert_eq!(body["max_tokens"], 8192);
    assert_eq!(body["system"], "Answer in JSON");

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[2]["content"], "Current Code State: ...");
}

#[test]
fn test_build_body_without_system_prompt() {
    let mut req = request();
    req.system_prompt = None;
    let body = build_body(&req);
    assert!(body.get("system").is_none());
}

#[test]
fn test_parse_response_joins_text_blocks() {
    let json = serde_json::json!({
        "content": [
            {"type": "text", "text": "{\"message\":"},
            {"type": "thinking", "thinking": "ignored"},
            {"type": "text", "text": "\"ok\"}"}
        ],
        "usage": {"input_tokens": 1200, "output_tokens": 340}
    });
    let resp = parse_response(&json).unwrap();
    assert_eq!(resp.text, "{\"message\":\"ok\"}");
    assert_eq!(resp.usage.input_tokens, 1200);
    assert_eq!(resp.usage.output_tokens, 340);
}

#[test]
fn test_parse_response_requires_usage() {
    let json = serde_json::json!({"content": [{"type": "text", "text": "hi"}]});
    assert!(matches!(
        parse_response(&json),
        Err(ProviderError::InvalidResponse(_))
    ));

    let json = serde_json::json!({"usage": {"input_tokens": 1, "output_tokens": 1}});
    assert!(parse_response(&json).is_err());
}

#[test]
fn test_classify_status() {
    let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
    match classify_status(401, None, body) {
        ProviderError::Auth(msg) => assert_eq!(msg, "invalid x-api-key"),
        other => panic!("Expected Auth, got {other:?}"),
    }

    let err = classify_status(429, Some(30_000), "");
    assert!(matches!(
        err,
        ProviderError::RateLimited {
            retry_after_ms: Some(30_000)
        }
    ));
    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert!(!err.is_transient());

    let err = classify_status(529, None, "overloaded");
    assert!(err.is_transient());
    assert_eq!(err.kind(), ErrorKind::Upstream);

    let err = classify_status(400, None, "bad");
    assert!(!err.is_transient());
}

#[test]
fn test_create_provider_requires_key() {
    let mut config = AppConfig::default();
    match create_provider(&config) {
        Err(e) => assert_eq!(e.kind(), ErrorKind::Auth),
        Ok(_) => panic!("Expected missing key error"),
    }

    config.api_key = Some("sk-test".into());
    let provider = create_provider(&config).unwrap();
    assert_eq!(provider.name(), "anthropic");
}
