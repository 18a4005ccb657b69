//! OpenAI-compatible backend against a mock HTTP server.

use completion_cache::cache::{MemoryStore, StoreConfig};
use completion_cache::config::BackendConfig;
use completion_cache::drivers::{BackendKind, CompletionBackend, OpenAiBackend};
use completion_cache::{CancellationToken, CompletionClient, Error};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;

const CHAT_OK: &str = r#"{
  "id": "chatcmpl-1",
  "object": "chat.completion",
  "choices": [
    { "index": 0, "finish_reason": "stop",
      "message": { "role": "assistant", "content": "Increase memory limits." } }
  ]
}"#;

fn backend_for(server: &Server) -> OpenAiBackend {
    let config = BackendConfig::new()
        .with_token("sk-test")
        .with_model("gpt-4o")
        .with_base_url(format!("{}/v1", server.url()))
        .with_prompt_template("[{language}] {prompt}");
    OpenAiBackend::configure(&config).unwrap()
}

#[tokio::test]
async fn sends_chat_request_and_returns_first_choice() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o",
            "messages": [{ "role": "user", "content": "[english] pod crashloopbackoff" }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(CHAT_OK)
        .expect(1)
        .create_async()
        .await;

    let text = backend_for(&server)
        .get_completion(&CancellationToken::new(), "english", "pod crashloopbackoff")
        .await
        .unwrap();
    assert_eq!(text, "Increase memory limits.");
    mock.assert_async().await;
}

#[tokio::test]
async fn http_error_status_becomes_remote_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#)
        .create_async()
        .await;

    let err = backend_for(&server)
        .get_completion(&CancellationToken::new(), "english", "x")
        .await
        .unwrap_err();
    match err {
        Error::Remote { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn no_choices_is_a_backend_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": []}"#)
        .create_async()
        .await;

    let err = backend_for(&server)
        .get_completion(&CancellationToken::new(), "english", "x")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Backend { ref backend, .. } if backend == "openai"));
}

#[tokio::test]
async fn cancelled_token_skips_the_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(CHAT_OK)
        .expect(0)
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = backend_for(&server)
        .get_completion(&cancel, "english", "x")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    mock.assert_async().await;
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let config = BackendConfig::new()
        .with_token("sk-test")
        .with_base_url("http://127.0.0.1:1/v1");
    let err = OpenAiBackend::configure(&config)
        .unwrap()
        .get_completion(&CancellationToken::new(), "english", "x")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn cached_client_hits_the_network_once() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(CHAT_OK)
        .expect(1)
        .create_async()
        .await;

    let client = CompletionClient::builder()
        .backend_kind(BackendKind::OpenAi)
        .backend_config(
            BackendConfig::new()
                .with_token("sk-test")
                .with_base_url(format!("{}/v1", server.url())),
        )
        .store(Arc::new(MemoryStore::new(StoreConfig::memory())))
        .build()
        .unwrap();

    let cancel = CancellationToken::new();
    for _ in 0..3 {
        let text = client.complete(&cancel, &["pod", "crashloopbackoff"]).await.unwrap();
        assert_eq!(text, "Increase memory limits.");
    }
    mock.assert_async().await;
}
