//! WhatsApp handoff against a mock service over real HTTP

use std::sync::Arc;

use regex::Regex;
use serde_json::{json, Map, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use leadchat::api::types::HandoffSource;
use leadchat::api::{ConversationApi, HttpConversationApi};
use leadchat::config::HandoffConfig;
use leadchat::handoff::RecordingNavigator;
use leadchat::HandoffTrigger;

const AUTHORIZE: &str = "/api/v1/whatsapp/authorize";

fn trigger_for(base_url: &str) -> (HandoffTrigger, Arc<RecordingNavigator>) {
    let api = HttpConversationApi::new(base_url, 2).expect("valid base url");
    let navigator = Arc::new(RecordingNavigator::new());
    let trigger = HandoffTrigger::new(Arc::new(api), navigator.clone(), HandoffConfig::default());
    (trigger, navigator)
}

async fn single_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1, "exactly one authorization request");
    serde_json::from_slice(&requests[0].body).expect("json body")
}

#[tokio::test]
async fn test_authorization_payload_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(AUTHORIZE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "authorized",
            "whatsapp_url": "https://wa.me/5511918368812"
        })))
        .mount(&server)
        .await;

    let (trigger, navigator) = trigger_for(&server.uri());
    let mut user_data = Map::new();
    user_data.insert("name".into(), json!("Ana"));

    let authorized = trigger
        .pre_authorize_and_redirect(HandoffSource::WhatsappButton, user_data)
        .await;

    assert!(authorized);
    let body = single_body(&server).await;
    let session_re = Regex::new(r"^whatsapp_\d+_[0-9a-z]{9}$").unwrap();
    assert!(session_re.is_match(body["session_id"].as_str().unwrap()));
    assert_eq!(body["phone_number"], Value::Null);
    assert_eq!(body["source"], "whatsapp_button");
    assert_eq!(body["user_data"]["name"], "Ana");
    assert_eq!(body["user_data"]["page_url"], "cli://leadchat");
    assert_eq!(body["user_data"]["referrer"], "direct");
    assert!(body["user_data"]["timestamp"].is_string());
    assert!(body["user_data"]["user_agent"]
        .as_str()
        .unwrap()
        .starts_with("leadchat/"));

    let opened = navigator.opened();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].host_str(), Some("wa.me"));
    assert_eq!(opened[0].path(), "/5511918368812");
    let text: Vec<_> = opened[0]
        .query_pairs()
        .filter(|(key, _)| key == "text")
        .map(|(_, value)| value.into_owned())
        .collect();
    assert_eq!(text, vec![HandoffConfig::default().greeting_message]);
}

#[tokio::test]
async fn test_redirect_happens_when_authorization_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(AUTHORIZE))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (trigger, navigator) = trigger_for(&server.uri());

    let authorized = trigger
        .pre_authorize_and_redirect(HandoffSource::FloatingButton, Map::new())
        .await;

    assert!(!authorized);
    assert_eq!(navigator.opened().len(), 1);
}

#[tokio::test]
async fn test_redirect_happens_when_service_unreachable() {
    let (trigger, navigator) = trigger_for("http://127.0.0.1:9");

    let authorized = trigger
        .pre_authorize_and_redirect(HandoffSource::ChatHeader, Map::new())
        .await;

    assert!(!authorized);
    assert_eq!(navigator.opened().len(), 1);
    assert_eq!(navigator.opened()[0].host_str(), Some("wa.me"));
}

#[tokio::test]
async fn test_empty_authorization_body_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(AUTHORIZE))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (trigger, navigator) = trigger_for(&server.uri());

    assert!(
        trigger
            .pre_authorize_and_redirect(HandoffSource::ChatCompletion, Map::new())
            .await
    );
    assert_eq!(navigator.opened().len(), 1);
}

#[tokio::test]
async fn test_changed_contact_used_for_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(AUTHORIZE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let (trigger, navigator) = trigger_for(&server.uri());
    trigger.set_contact_number("+55 (21) 98888-7777").unwrap();

    trigger
        .pre_authorize_and_redirect(HandoffSource::DebugTest, Map::new())
        .await;

    assert_eq!(navigator.opened()[0].path(), "/5521988887777");
}

#[tokio::test]
async fn test_service_status_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/whatsapp/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "service": "whatsapp",
            "status": "active",
            "sessions": 4
        })))
        .mount(&server)
        .await;

    let api = HttpConversationApi::new(&server.uri(), 2).unwrap();
    let status = api.service_status().await.unwrap();

    assert_eq!(status.status.as_deref(), Some("active"));
    assert_eq!(status.details.get("sessions"), Some(&json!(4)));
}
