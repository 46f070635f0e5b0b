//! End-to-end pipeline tests: in-memory lead store, real HTTP clients
//! against mock inference and gateway servers.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use secrecy::SecretString;

use lead_agent::assess::AnthropicAssessor;
use lead_agent::notify::WhatsAppDispatcher;
use lead_agent::pipeline::LeadProcessor;
use lead_agent::store::{Lead, LeadStore, LibSqlStore};

const VALID_ASSESSMENT_TEXT: &str = r#"Here is my analysis:
{
    "priority": "HOT",
    "urgency_score": 8,
    "interest_level": "HIGH",
    "buying_intent": "BUY_NOW",
    "recommended_action": "CALL_URGENT",
    "summary": "High-value lead asking for a visit.",
    "key_points": ["visit requested"]
}"#;

fn ana() -> Lead {
    Lead {
        id: "1".into(),
        name: "Ana".into(),
        email: Some("ana@example.com".into()),
        phone: Some("+5511999990000".into()),
        message: "I'd like to visit this weekend".into(),
        property_title: Some("2BR apartment downtown".into()),
        property_price: Some(500_000.0),
        property_type: Some("apartment".into()),
        created_at: Utc::now(),
    }
}

async fn seeded_store() -> Arc<LibSqlStore> {
    let store = LibSqlStore::new_memory().await.unwrap();
    store.insert_lead(&ana()).await.unwrap();
    store
        .set_setting("contactWhatsapp", "+5511988887777")
        .await
        .unwrap();
    store.set_setting("siteName", "Modelo Imóveis").await.unwrap();
    Arc::new(store)
}

fn messages_body(text: &str) -> String {
    serde_json::json!({
        "content": [{ "type": "text", "text": text }]
    })
    .to_string()
}

fn processor(
    store: Arc<LibSqlStore>,
    anthropic: &mockito::Server,
    gateway: &mockito::Server,
) -> LeadProcessor {
    let assessor = Arc::new(
        AnthropicAssessor::new(
            SecretString::from("sk-ant-test"),
            "claude-test".into(),
            Duration::from_secs(5),
        )
        .with_base_url(anthropic.url()),
    );
    let dispatcher = Arc::new(WhatsAppDispatcher::new(
        gateway.url(),
        SecretString::from("gw-token"),
        Duration::from_secs(5),
    ));
    LeadProcessor::new(store, assessor, dispatcher, Duration::ZERO)
}

#[tokio::test]
async fn scored_lead_is_dispatched_and_marked_sent() {
    let store = seeded_store().await;

    let mut anthropic = mockito::Server::new_async().await;
    anthropic
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(messages_body(VALID_ASSESSMENT_TEXT))
        .create_async()
        .await;

    let mut gateway = mockito::Server::new_async().await;
    let gw_mock = gateway
        .mock("POST", "/api/whatsapp/send")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "to": "+5511988887777",
            "lead_id": "1",
            "source": "lead-agent",
            "assessment": { "priority": "HOT", "urgency_score": 8 }
        })))
        .with_status(200)
        .with_body(r#"{"success": true}"#)
        .expect(1)
        .create_async()
        .await;

    let report = processor(store.clone(), &anthropic, &gateway)
        .run_cycle()
        .await
        .unwrap();

    gw_mock.assert_async().await;
    assert_eq!(report.sent, 1);
    assert_eq!(store.lead_status("1").await.unwrap(), "SENT");
    // Lead is no longer eligible for the next cycle
    assert!(store.fetch_unprocessed().await.unwrap().is_empty());
}

#[tokio::test]
async fn provider_failure_dispatches_the_fallback() {
    let store = seeded_store().await;

    let mut anthropic = mockito::Server::new_async().await;
    anthropic
        .mock("POST", "/v1/messages")
        .with_status(500)
        .with_body("overloaded")
        .create_async()
        .await;

    let mut gateway = mockito::Server::new_async().await;
    let gw_mock = gateway
        .mock("POST", "/api/whatsapp/send")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "lead_id": "1",
            "assessment": {
                "priority": "WARM",
                "urgency_score": 5,
                "recommended_action": "SEND_INFO"
            }
        })))
        .with_status(200)
        .with_body(r#"{"success": true}"#)
        .expect(1)
        .create_async()
        .await;

    let report = processor(store.clone(), &anthropic, &gateway)
        .run_cycle()
        .await
        .unwrap();

    gw_mock.assert_async().await;
    assert_eq!(report.sent, 1);
    assert_eq!(store.lead_status("1").await.unwrap(), "SENT");
}

#[tokio::test]
async fn unconfirmed_dispatch_marks_ai_error() {
    let store = seeded_store().await;

    let mut anthropic = mockito::Server::new_async().await;
    anthropic
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(messages_body(VALID_ASSESSMENT_TEXT))
        .create_async()
        .await;

    let mut gateway = mockito::Server::new_async().await;
    gateway
        .mock("POST", "/api/whatsapp/send")
        .with_status(200)
        .with_body(r#"{"success": false}"#)
        .create_async()
        .await;

    let report = processor(store.clone(), &anthropic, &gateway)
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(report.ai_error, 1);
    assert_eq!(store.lead_status("1").await.unwrap(), "AI_ERROR");
}

#[tokio::test]
async fn empty_store_makes_no_outbound_calls() {
    let store = Arc::new(LibSqlStore::new_memory().await.unwrap());

    let mut anthropic = mockito::Server::new_async().await;
    let llm_mock = anthropic
        .mock("POST", "/v1/messages")
        .expect(0)
        .create_async()
        .await;

    let mut gateway = mockito::Server::new_async().await;
    let gw_mock = gateway
        .mock("POST", "/api/whatsapp/send")
        .expect(0)
        .create_async()
        .await;

    let report = processor(store, &anthropic, &gateway)
        .run_cycle()
        .await
        .unwrap();

    llm_mock.assert_async().await;
    gw_mock.assert_async().await;
    assert_eq!(report.processed, 0);
}

#[tokio::test]
async fn missing_recipient_fails_closed_as_ai_error() {
    let store = Arc::new(LibSqlStore::new_memory().await.unwrap());
    store.insert_lead(&ana()).await.unwrap();
    // No contactWhatsapp setting configured

    let mut anthropic = mockito::Server::new_async().await;
    anthropic
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(messages_body(VALID_ASSESSMENT_TEXT))
        .create_async()
        .await;

    let mut gateway = mockito::Server::new_async().await;
    let gw_mock = gateway
        .mock("POST", "/api/whatsapp/send")
        .expect(0)
        .create_async()
        .await;

    let report = processor(store.clone(), &anthropic, &gateway)
        .run_cycle()
        .await
        .unwrap();

    gw_mock.assert_async().await;
    assert_eq!(report.ai_error, 1);
    assert_eq!(store.lead_status("1").await.unwrap(), "AI_ERROR");
}
