//! Integration tests for the batch coordinator: fan-out, per-lead error
//! isolation, and the summary report contract.

use rust_phone_waterfall::batch::{BatchCoordinator, LeadResolver};
use rust_phone_waterfall::config::{Config, ProviderSettings};
use rust_phone_waterfall::errors::AppError;
use rust_phone_waterfall::models::{LeadLookupInput, WaterfallStatus};
use rust_phone_waterfall::providers::ProviderKind;
use rust_phone_waterfall::retry::RetryPolicy;
use rust_phone_waterfall::waterfall::WaterfallEngine;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> Config {
    let retry = RetryPolicy {
        max_attempts: 2,
        initial_interval: Duration::from_millis(10),
        backoff_multiplier: 2.0,
    };
    let provider = |kind| ProviderSettings {
        kind,
        base_url: base_url.to_string(),
        api_key: "test_key".to_string(),
        max_rps: 1000.0,
        burst: 1,
        retry: retry.clone(),
        attempt_timeout: Duration::from_millis(500),
    };
    Config {
        providers: vec![
            provider(ProviderKind::OrionConnect),
            provider(ProviderKind::AstraDialer),
            provider(ProviderKind::NimbusLookup),
        ],
        dedup_retention: Duration::from_secs(60),
        run_deadline: None,
    }
}

/// In-memory resolver standing in for the upstream lead store.
struct MapResolver {
    leads: HashMap<String, LeadLookupInput>,
}

impl LeadResolver for MapResolver {
    fn resolve(
        &self,
        lead_id: &str,
    ) -> impl Future<Output = Result<LeadLookupInput, AppError>> + Send {
        let resolved = self
            .leads
            .get(lead_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("lead {} not found", lead_id)));
        async move { resolved }
    }
}

fn lead(id: &str, first: &str, last: &str, email: &str) -> LeadLookupInput {
    LeadLookupInput {
        lead_id: id.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: email.to_string(),
        job_title: None,
        company_name: Some("Acme".to_string()),
        company_website: None,
    }
}

fn resolver() -> MapResolver {
    let mut leads = HashMap::new();
    leads.insert(
        "lead-1".to_string(),
        lead("lead-1", "Ada", "Lovelace", "ada@example.com"),
    );
    leads.insert(
        "lead-2".to_string(),
        lead("lead-2", "Grace", "Hopper", "grace@example.com"),
    );
    MapResolver { leads }
}

async fn mount_providers(mock_server: &MockServer) {
    // Only Ada has a phone on record; everything else is a clean miss.
    Mock::given(method("POST"))
        .and(path("/orionConnect"))
        .and(body_partial_json(serde_json::json!({
            "fullName": "Ada Lovelace"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"phone": "+442012345"})),
        )
        .mount(mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orionConnect"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"phone": null})),
        )
        .mount(mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/astraDialer"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"phoneNmbr": null})),
        )
        .mount(mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/numbusLookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_batch_mixed_outcomes() {
    let mock_server = MockServer::start().await;
    mount_providers(&mock_server).await;

    let engine = Arc::new(WaterfallEngine::new(&test_config(&mock_server.uri())));
    let coordinator = BatchCoordinator::new(engine, Arc::new(resolver()));

    let report = coordinator
        .enrich_batch(&[
            "lead-1".to_string(),
            "lead-2".to_string(),
            "lead-404".to_string(),
        ])
        .await;

    assert!(!report.success);
    assert_eq!(report.found_count, 1);
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.errors.len(), 1);

    // Results keep the batch input order.
    assert_eq!(report.results[0].lead_id, "lead-1");
    assert_eq!(report.results[0].status, WaterfallStatus::Found);
    assert_eq!(report.results[0].phone.as_deref(), Some("+442012345"));
    assert_eq!(report.results[0].provider.as_deref(), Some("orion_connect"));

    assert_eq!(report.results[1].lead_id, "lead-2");
    assert_eq!(report.results[1].status, WaterfallStatus::NotFound);
    assert!(report.results[1].phone.is_none());

    assert_eq!(report.errors[0].lead_id, "lead-404");
    assert!(report.errors[0].error.contains("lead-404"));
}

#[tokio::test]
async fn test_batch_all_resolved_is_success() {
    let mock_server = MockServer::start().await;
    mount_providers(&mock_server).await;

    let engine = Arc::new(WaterfallEngine::new(&test_config(&mock_server.uri())));
    let coordinator = BatchCoordinator::new(engine, Arc::new(resolver()));

    let report = coordinator
        .enrich_batch(&["lead-1".to_string(), "lead-2".to_string()])
        .await;

    assert!(report.success);
    assert_eq!(report.found_count, 1);
    assert_eq!(report.results.len(), 2);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn test_duplicate_ids_in_batch_share_one_run() {
    let mock_server = MockServer::start().await;

    // Both entries for lead-1 must converge on one provider call sequence.
    Mock::given(method("POST"))
        .and(path("/orionConnect"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"phone": "+442012345"}))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let engine = Arc::new(WaterfallEngine::new(&test_config(&mock_server.uri())));
    let coordinator = BatchCoordinator::new(engine, Arc::new(resolver()));

    let report = coordinator
        .enrich_batch(&["lead-1".to_string(), "lead-1".to_string()])
        .await;

    assert!(report.success);
    assert_eq!(report.found_count, 2);
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[0].phone, report.results[1].phone);
}

#[tokio::test]
async fn test_report_serializes_camel_case() {
    let mock_server = MockServer::start().await;
    mount_providers(&mock_server).await;

    let engine = Arc::new(WaterfallEngine::new(&test_config(&mock_server.uri())));
    let coordinator = BatchCoordinator::new(engine, Arc::new(resolver()));

    let report = coordinator
        .enrich_batch(&["lead-1".to_string(), "lead-404".to_string()])
        .await;
    let json = serde_json::to_value(&report).expect("serializes");

    assert_eq!(json["success"], false);
    assert_eq!(json["foundCount"], 1);
    assert_eq!(json["results"][0]["leadId"], "lead-1");
    assert_eq!(json["results"][0]["status"], "found");
    assert_eq!(json["results"][0]["phone"], "+442012345");
    assert_eq!(json["errors"][0]["leadId"], "lead-404");
    assert!(json["errors"][0]["leadName"].is_string());
    assert!(json["errors"][0]["error"]
        .as_str()
        .expect("error string")
        .contains("Not found"));
}
