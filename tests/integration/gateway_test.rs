//! Gateway Integration Tests
//!
//! Endpoint failover across scripted and real providers, and the offline
//! fallback of the interrogation channel.

use std::sync::Arc;

use interrogation_core::action::TurnIntent;
use interrogation_llm::{
    candidate_endpoints, ChatMessage, CompletionParams, GatewayError, LlmError, LlmProvider,
    OpenAIProvider, ProviderConfig, ProviderGateway,
};
use interrogation_room::models::level::LevelCatalog;
use interrogation_room::models::response::ReplySource;
use interrogation_room::services::{ChatRequest, InterrogationChannel};
use interrogation_room::AppError;

use crate::support::{gateway_of, ScriptedSuspect};

fn hello() -> Vec<ChatMessage> {
    vec![ChatMessage::user("hello")]
}

// ============================================================================
// Failover
// ============================================================================

#[tokio::test]
async fn test_second_endpoint_answers_after_server_error() {
    let first = ScriptedSuspect::new("https://a.example/v1");
    first.push_error(LlmError::ServerError {
        message: "overloaded".to_string(),
        status: Some(503),
    });
    let second = ScriptedSuspect::with_replies("https://b.example/v1", ["Answer."]);
    let gateway = gateway_of(&[first.clone(), second.clone()]);

    let (text, log) = gateway
        .complete(&hello(), Some("be brief"), CompletionParams::INTERROGATION)
        .await
        .unwrap();

    assert_eq!(text, "Answer.");
    assert_eq!(log.attempts.len(), 2);
    assert_eq!(log.failed_attempts_count(), 1);
    assert_eq!(log.successful_endpoint.as_deref(), Some("https://b.example/v1"));
    assert_eq!(second.calls()[0].system.as_deref(), Some("be brief"));
}

#[tokio::test]
async fn test_blank_reply_counts_as_failure() {
    let first = ScriptedSuspect::with_replies("a", ["   "]);
    let second = ScriptedSuspect::with_replies("b", ["Real answer."]);
    let gateway = gateway_of(&[first, second]);

    let (text, log) = gateway
        .complete(&hello(), None, CompletionParams::INTERROGATION)
        .await
        .unwrap();
    assert_eq!(text, "Real answer.");
    assert!(log.attempts[0].error_message.is_some());
}

#[tokio::test]
async fn test_all_endpoints_failing() {
    let gateway = gateway_of(&[ScriptedSuspect::new("a"), ScriptedSuspect::new("b")]);
    let err = gateway
        .complete(&hello(), None, CompletionParams::SUMMARY)
        .await
        .unwrap_err();
    match err {
        GatewayError::AllEndpointsFailed { attempts, last_error } => {
            assert_eq!(attempts, 2);
            assert!(last_error.contains("script exhausted"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_keyless_endpoint_is_skipped_without_a_request() {
    let keyless = OpenAIProvider::new(ProviderConfig {
        api_key: None,
        base_url: "http://127.0.0.1:9/v1".to_string(),
        model: "gpt-3.5-turbo".to_string(),
        timeout_secs: 1,
    })
    .unwrap();
    let backup = ScriptedSuspect::with_replies("backup", ["From the backup."]);
    let gateway = ProviderGateway::new(vec![
        Arc::new(keyless) as Arc<dyn LlmProvider>,
        backup.clone() as Arc<dyn LlmProvider>,
    ]);

    let (text, log) = gateway
        .complete(&hello(), None, CompletionParams::INTERROGATION)
        .await
        .unwrap();
    assert_eq!(text, "From the backup.");
    assert!(log.attempts[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("API key"));
}

#[test]
fn test_endpoint_list_from_config() {
    let config = ProviderConfig {
        api_key: Some("sk-test".to_string()),
        base_url: "https://primary.example/v1".to_string(),
        ..ProviderConfig::default()
    };
    let extras = vec![
        " https://backup.example/v1 ".to_string(),
        "https://primary.example/v1".to_string(),
        "not a url".to_string(),
    ];
    assert_eq!(
        candidate_endpoints(&config.base_url, &extras),
        vec![
            "https://primary.example/v1".to_string(),
            "https://backup.example/v1".to_string(),
            "not a url".to_string(),
        ]
    );

    let gateway = ProviderGateway::from_config(&config, &extras);
    assert_eq!(gateway.endpoints().len(), 2);
}

// ============================================================================
// Channel fallback
// ============================================================================

fn request(content: &str, intent: Option<TurnIntent>, stress: u8) -> ChatRequest {
    ChatRequest {
        messages: vec![ChatMessage::user(content)],
        current_stress: stress,
        level_id: "level-2".to_string(),
        intent,
    }
}

#[tokio::test]
async fn test_channel_goes_offline_for_the_requested_level() {
    let dead = ScriptedSuspect::new("dead");
    let channel = InterrogationChannel::new(
        gateway_of(&[dead.clone()]),
        Arc::new(LevelCatalog::builtin()),
    );

    let reply = channel
        .send(&request("START_SESSION", Some(TurnIntent::Opening), 40))
        .await
        .unwrap();
    assert_eq!(reply.source, ReplySource::Offline);
    assert!(reply.content.contains("MOTHER"));
    assert!(reply.content.contains("\"stress\":0"));
    assert_eq!(dead.call_count(), 1);
}

#[tokio::test]
async fn test_channel_reports_provider_endpoint() {
    let live = ScriptedSuspect::with_replies("live", ["Hello."]);
    let channel = InterrogationChannel::new(
        gateway_of(&[live.clone()]),
        Arc::new(LevelCatalog::builtin()),
    );
    let reply = channel
        .send(&request("Who are you?", None, 10))
        .await
        .unwrap();
    assert_eq!(reply.content, "Hello.");
    assert_eq!(
        reply.source,
        ReplySource::Provider {
            endpoint: "live".to_string()
        }
    );
    let system = live.calls()[0].system.clone().unwrap();
    assert!(system.contains("Current stress: 10/100"));
}

#[tokio::test]
async fn test_channel_without_fallback_surfaces_gateway_error() {
    let channel = InterrogationChannel::new(
        gateway_of(&[ScriptedSuspect::new("dead")]),
        Arc::new(LevelCatalog::builtin()),
    )
    .with_offline_fallback(false);

    let err = channel
        .send(&request("hello", None, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Gateway(_)));
}
