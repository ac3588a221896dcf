//! End-to-end conversation tests: a real repository and a mocked provider.

mod common;

use common::TestRepo;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use commitsmith::error::{ConversationError, ProviderError};
use commitsmith::{
    ConversationConfig, ConversationOrchestrator, ConversationState, ModelSelection, Provider,
};

fn forced_openai_choice() -> Value {
    json!({
        "tool_choice": { "type": "function", "function": { "name": "analyze_changes" } }
    })
}

fn staged_repo() -> TestRepo {
    let repo = TestRepo::new();
    repo.write_and_stage("src/widget.rs", "pub struct Widget;\n");
    repo
}

fn provider(model: &str, base_url: String) -> Provider {
    let selection = ModelSelection::resolve(model, false).unwrap();
    Provider::new(&selection, Some("test-key".into()), Some(base_url)).unwrap()
}

#[tokio::test]
async fn test_openai_conversation_end_to_end() {
    let repo = staged_repo();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(forced_openai_choice()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "analyze_changes", "arguments": "{\"focus\": \"ignored\"}" }
                    }]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "tool_choice": "auto" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": { "role": "assistant", "content": "feat: add widget\n\n\nDetails." }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider("gpt-4o", format!("{}/v1", server.uri()));
    let analyzer = repo.analyzer();
    let mut orchestrator =
        ConversationOrchestrator::new(&provider, &analyzer, ConversationConfig::default());

    let message = orchestrator.decide_next_action().await.unwrap();
    assert_eq!(message, "feat: add widget\n\n\nDetails.");
    assert_eq!(orchestrator.state(), ConversationState::Done);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let second: Value = serde_json::from_slice(&requests[1].body).unwrap();
    let tool_message = &second["messages"][3];
    assert_eq!(tool_message["role"], "tool");
    assert_eq!(tool_message["tool_call_id"], "call_1");

    let summary: Value = serde_json::from_str(tool_message["content"].as_str().unwrap()).unwrap();
    assert_eq!(summary["total_additions"], 1);
    assert_eq!(summary["files_changed"][0]["path"], "src/widget.rs");
    assert_eq!(summary["files_changed"][0]["kind"], "added");
}

#[tokio::test]
async fn test_anthropic_conversation_end_to_end() {
    let repo = staged_repo();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({
            "tool_choice": { "type": "tool", "name": "analyze_changes" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stop_reason": "tool_use",
            "content": [
                { "type": "tool_use", "id": "toolu_1", "name": "analyze_changes", "input": {} }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({ "tool_choice": { "type": "auto" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stop_reason": "end_turn",
            "content": [{ "type": "text", "text": "feat: add widget struct" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider("claude-3-5-sonnet-latest", server.uri());
    let analyzer = repo.analyzer();
    let mut orchestrator =
        ConversationOrchestrator::new(&provider, &analyzer, ConversationConfig::default());

    let message = orchestrator.decide_next_action().await.unwrap();
    assert_eq!(message, "feat: add widget struct");

    let requests = server.received_requests().await.unwrap();
    let second: Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert!(second["system"].as_str().unwrap().contains("analyze_changes"));
    let tool_result = &second["messages"][2]["content"][0];
    assert_eq!(tool_result["type"], "tool_result");
    assert_eq!(tool_result["tool_use_id"], "toolu_1");
    assert!(tool_result["content"].as_str().unwrap().contains("src/widget.rs"));
}

#[tokio::test]
async fn test_first_call_failure_makes_no_second_call() {
    let repo = staged_repo();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(forced_openai_choice()))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "tool_choice": "auto" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let provider = provider("gpt-4o", format!("{}/v1", server.uri()));
    let analyzer = repo.analyzer();
    let mut orchestrator =
        ConversationOrchestrator::new(&provider, &analyzer, ConversationConfig::default());

    let result = orchestrator.decide_next_action().await;

    assert!(matches!(
        result,
        Err(ConversationError::Provider(ProviderError::Api { status: 500, .. }))
    ));
    assert_eq!(orchestrator.state(), ConversationState::Errored);
}
