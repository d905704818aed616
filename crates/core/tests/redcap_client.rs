//! Wire-format tests for the REDCap record client against a mock API server.

use consent_core::store::{RecordStore, Store, StoreError};
use consent_core::{
    ConsentBranch, ConsentDispatcher, ConsentState, CoreConfig, DispatchOutcome, RecordId,
    RedcapClient, StoreCredential, TransferOutcome, TransferService,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const SOURCE_TOKEN: &str = "SOURCETOKEN0001";
const TARGET_TOKEN: &str = "TARGETTOKEN0002";

fn client_for(server: &MockServer, timeout: Duration) -> RedcapClient {
    let cfg = CoreConfig::new(
        &format!("{}/api/", server.uri()),
        StoreCredential::new(SOURCE_TOKEN).unwrap(),
        StoreCredential::new(TARGET_TOKEN).unwrap(),
        timeout,
    )
    .expect("CoreConfig::new should succeed");
    RedcapClient::new(&cfg).expect("client should build")
}

fn form_of(request: &Request) -> HashMap<String, String> {
    url::form_urlencoded::parse(&request.body)
        .into_owned()
        .collect()
}

fn id(value: &str) -> RecordId {
    RecordId::parse(value).unwrap()
}

async fn requests_with_token(server: &MockServer, token: &str) -> Vec<HashMap<String, String>> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(form_of)
        .filter(|form| form.get("token").map(String::as_str) == Some(token))
        .collect()
}

#[tokio::test]
async fn test_fetch_one_sends_export_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "record_id": "42", "interested_consent": "1" }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let record = client
        .fetch_one(Store::Source, &id("42"))
        .await
        .unwrap()
        .expect("record should be returned");
    assert_eq!(record["interested_consent"], "1");

    let forms = requests_with_token(&server, SOURCE_TOKEN).await;
    assert_eq!(forms.len(), 1);
    let form = &forms[0];
    assert_eq!(form["content"], "record");
    assert_eq!(form["format"], "json");
    assert_eq!(form["type"], "flat");
    assert_eq!(form["records[0]"], "42");
    assert_eq!(form["exportSurveyFields"], "true");
}

#[tokio::test]
async fn test_target_fetch_uses_target_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let record = client.fetch_one(Store::Target, &id("7")).await.unwrap();
    assert!(record.is_none());

    assert!(requests_with_token(&server, SOURCE_TOKEN).await.is_empty());
    let forms = requests_with_token(&server, TARGET_TOKEN).await;
    assert_eq!(forms.len(), 1);
    assert!(!forms[0].contains_key("exportSurveyFields"));
}

#[tokio::test]
async fn test_upsert_sends_import_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("overwriteBehavior=normal"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"count": 1}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let record = match json!({ "record_id": "42", "trigger_email": "1" }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    let response = client.upsert(Store::Target, record).await.unwrap();
    assert!(response.is_success());
    assert_eq!(response.body, r#"{"count": 1}"#);

    let forms = requests_with_token(&server, TARGET_TOKEN).await;
    let data: Value = serde_json::from_str(&forms[0]["data"]).unwrap();
    assert_eq!(data, json!([{ "record_id": "42", "trigger_email": "1" }]));
    assert_eq!(forms[0]["type"], "flat");
}

#[tokio::test]
async fn test_upsert_rejection_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"bad field"}"#))
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let response = client
        .upsert(Store::Target, serde_json::Map::new())
        .await
        .unwrap();
    assert_eq!(response.status, 400);
    assert!(response.body.contains("bad field"));
}

#[tokio::test]
async fn test_fetch_error_status_and_garbage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains(SOURCE_TOKEN))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains(TARGET_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    assert!(matches!(
        client.fetch_one(Store::Source, &id("1")).await,
        Err(StoreError::Status { status: 403, .. })
    ));
    assert!(matches!(
        client.fetch_one(Store::Target, &id("1")).await,
        Err(StoreError::Decode { .. })
    ));
}

#[tokio::test]
async fn test_slow_server_hits_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_millis(200));
    assert!(matches!(
        client.fetch_one(Store::Source, &id("1")).await,
        Err(StoreError::Transport { store: Store::Source, .. })
    ));
}

#[tokio::test]
async fn test_transfer_then_dispatch_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains(SOURCE_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "record_id": "42",
            "pt_email": "participant@example.org",
            "pt_phone": "555-0100",
            "res_email": "staff@example.org",
            "elig_date": "2026-01-15",
            "interested_consent": "1",
            "dob": "1970-01-01",
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains(TARGET_TOKEN))
        .and(body_string_contains("overwriteBehavior=normal"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"count": 1}"#))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains(TARGET_TOKEN))
        .and(body_string_contains("records%5B0%5D=42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "record_id": "42",
            "interested_consent": "1",
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(client_for(&server, Duration::from_secs(5)));
    let outcome = TransferService::new(store.clone())
        .transfer("42")
        .await
        .unwrap();
    assert!(matches!(outcome, TransferOutcome::Committed { status: 200, .. }));
    assert_eq!(outcome.result().consent_state, ConsentState::Electronic);

    let dispatched = ConsentDispatcher::new(store).dispatch("42").await.unwrap();
    assert_eq!(dispatched, DispatchOutcome::Dispatched(ConsentBranch::Electronic));

    let imports: Vec<Value> = requests_with_token(&server, TARGET_TOKEN)
        .await
        .into_iter()
        .filter_map(|form| form.get("data").cloned())
        .map(|data| serde_json::from_str(&data).unwrap())
        .collect();
    assert_eq!(imports.len(), 2);
    assert_eq!(
        imports[0],
        json!([{
            "record_id": "42",
            "pt_email": "participant@example.org",
            "pt_phone": "555-0100",
            "res_email": "staff@example.org",
            "elig_date": "2026-01-15",
            "interested_consent": "1",
            "trace_ai_eligibility_screening_draft_complete": "2",
            "record_set_up_complete": "2",
        }])
    );
    assert_eq!(imports[1], json!([{ "record_id": "42", "trigger_email": "1" }]));
}
