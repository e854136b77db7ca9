use std::time::Duration;

use archprompt::{ArchpromptError, CompletionRequest, OpenAiProvider, Provider, Turn, Usage};
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> OpenAiProvider {
    OpenAiProvider::new(
        SecretString::from("test-key".to_owned()),
        &server.uri(),
        Duration::from_secs(5),
    )
    .expect("client should build")
}

fn request(turns: &[Turn]) -> CompletionRequest<'_> {
    CompletionRequest {
        model: "gpt-3.5-turbo-1106",
        turns,
        max_tokens: 2000,
        temperature: 0.3,
        json_object: true,
    }
}

fn seed() -> Vec<Turn> {
    vec![Turn::system("You are an assistant."), Turn::user("Hello")]
}

#[tokio::test]
async fn sends_full_request_and_parses_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-3.5-turbo-1106",
            "messages": [
                {"role": "system", "content": "You are an assistant."},
                {"role": "user", "content": "Hello"},
            ],
            "max_tokens": 2000,
            "temperature": 0.3,
            "response_format": {"type": "json_object"},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "{\"applications\": []}"},
                "finish_reason": "stop",
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let turns = seed();
    let completion = provider(&server).complete(request(&turns)).await.unwrap();

    assert_eq!(completion.turn, Turn::assistant("{\"applications\": []}"));
    assert_eq!(
        completion.usage,
        Some(Usage {
            prompt_tokens: 12,
            completion_tokens: 7,
            total_tokens: 19,
        })
    );
}

#[tokio::test]
async fn missing_usage_is_tolerated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "{}"}}],
        })))
        .mount(&server)
        .await;

    let turns = seed();
    let completion = provider(&server).complete(request(&turns)).await.unwrap();

    assert_eq!(completion.turn.content(), "{}");
    assert!(completion.usage.is_none());
}

#[tokio::test]
async fn error_status_is_remote_call_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"},
        })))
        .mount(&server)
        .await;

    let turns = seed();
    let err = provider(&server).complete(request(&turns)).await.unwrap_err();

    match err {
        ArchpromptError::RemoteCallFailed(msg) => {
            assert!(msg.contains("401"), "{msg}");
            assert!(msg.contains("Incorrect API key"), "{msg}");
        }
        other => panic!("expected RemoteCallFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_choices_is_remote_call_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let turns = seed();
    let err = provider(&server).complete(request(&turns)).await.unwrap_err();
    assert!(matches!(err, ArchpromptError::RemoteCallFailed(_)));
}

#[tokio::test]
async fn null_content_is_remote_call_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}],
        })))
        .mount(&server)
        .await;

    let turns = seed();
    let err = provider(&server).complete(request(&turns)).await.unwrap_err();
    assert!(matches!(err, ArchpromptError::RemoteCallFailed(_)));
}

#[tokio::test]
async fn malformed_body_is_remote_call_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let turns = seed();
    let err = provider(&server).complete(request(&turns)).await.unwrap_err();
    assert!(matches!(err, ArchpromptError::RemoteCallFailed(_)));
}

#[tokio::test]
async fn unreachable_server_is_remote_call_failure() {
    let provider = OpenAiProvider::new(
        SecretString::from("test-key".to_owned()),
        "http://127.0.0.1:1",
        Duration::from_secs(2),
    )
    .unwrap();

    let turns = seed();
    let err = provider.complete(request(&turns)).await.unwrap_err();
    assert!(matches!(err, ArchpromptError::RemoteCallFailed(_)));
}
