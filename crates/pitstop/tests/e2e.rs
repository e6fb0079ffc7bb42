// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete survey pipeline.
//!
//! Each test creates an isolated TestHarness with temp SQLite and mock
//! adapters, then drives the scheduled jobs and the HTTP gateway the way
//! `pitstop serve` wires them. Tests are independent and order-insensitive.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, Utc};
use pitstop_config::model::SchedulerConfig;
use pitstop_core::records::{MessageDirection, message_status};
use pitstop_core::{Language, StorageAdapter};
use pitstop_cron::{SurveyJobs, sqlite_timestamp};
use pitstop_gateway::{AuthConfig, GatewayState, WebhookAuth, build_router};
use pitstop_survey::SurveyService;
use pitstop_survey::scripts;
use pitstop_test_utils::TestHarness;
use serde_json::{Value, json};
use tower::ServiceExt;

const TOKEN: &str = "e2e-token";

struct Stack {
    jobs: SurveyJobs,
    app: Router,
}

fn stack(harness: &TestHarness) -> Stack {
    let service = Arc::new(SurveyService::new(
        harness.storage.clone(),
        harness.mock_channel.clone(),
        harness.mock_provider.clone(),
        &harness.config,
    ));
    let state = GatewayState::new(
        service.clone(),
        AuthConfig {
            bearer_token: Some(TOKEN.to_string()),
        },
        WebhookAuth {
            auth_token: None,
            public_base_url: None,
            validate_signatures: false,
        },
    );
    Stack {
        jobs: SurveyJobs::new(service, SchedulerConfig::default()),
        app: build_router(state),
    }
}

async fn sms(app: &Router, from: &str, body: &str) {
    let form = serde_urlencoded::to_string([("From", from), ("Body", body), ("MessageSid", "SMe2e")])
        .unwrap();
    let req = Request::builder()
        .method("POST")
        .uri("/api/webhooks/twilio/message")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

async fn get_json(app: &Router, uri: &str) -> Value {
    let req = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn extraction(language: &str, overall: u8, safety: &[&str]) -> String {
    json!({
        "ratings": {
            "overall_satisfaction": overall,
            "workmanship_quality": 9,
            "service_timeliness": 9,
            "staff_friendliness": 10
        },
        "follow_up_items": {
            "billing_disputes": [],
            "mechanical_issues": [],
            "warranty_questions": [],
            "service_logistics": [],
            "safety_concerns": safety
        },
        "positive_remarks": [],
        "preferred_language": language,
        "callback_needed": false
    })
    .to_string()
}

// ---- Scheduled survey through completion ----

#[tokio::test]
async fn scheduled_survey_runs_to_completion_over_webhooks() {
    let harness = TestHarness::builder()
        .with_dealership("Lakeside Motors")
        .build()
        .await
        .unwrap();
    let stack = stack(&harness);
    let now = Utc::now();
    let phone = "+15550003333";
    let customer = harness.add_customer(phone, Language::English).await.unwrap();
    let visit = harness
        .add_visit(customer.id, Some(&sqlite_timestamp(now - Duration::hours(30))))
        .await
        .unwrap();

    let report = stack.jobs.run_survey_batch(now).await.unwrap();
    assert_eq!(report.succeeded, 1);
    let greeting = harness.mock_channel.last_sent().await.unwrap().1;
    assert!(greeting.body.contains("Lakeside Motors"));

    for reply in ["10", "9", "9", "10", "the tire light is still on"] {
        sms(&stack.app, phone, reply).await;
    }
    harness.add_provider_response("English").await;
    harness
        .add_provider_response(extraction("English", 10, &["tire pressure light still on"]))
        .await;
    sms(&stack.app, phone, "Dev did a great job").await;

    let bodies = harness.mock_channel.sent_bodies().await;
    assert_eq!(bodies.len(), 7);
    assert_eq!(bodies.last().unwrap(), scripts::thank_you(Language::English));

    let survey = harness
        .storage
        .survey_for_visit(visit.id)
        .await
        .unwrap()
        .unwrap();
    let detail = get_json(&stack.app, &format!("/api/surveys/{}", survey.id)).await;
    assert_eq!(detail["data"]["completed"], true);
    // A safety concern forces a callback even with top ratings.
    assert_eq!(detail["data"]["callback_needed"], true);
    assert_eq!(detail["data"]["follow_up_items"][0]["issue_type"], "safety_concern");

    // Late replies are logged but not answered.
    sms(&stack.app, phone, "one more thing").await;
    assert_eq!(harness.mock_channel.sent_count().await, 7);

    let logs = get_json(&stack.app, &format!("/api/services/{}/messages", visit.id)).await;
    let inbound = logs["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|l| l["direction"] == "inbound")
        .count();
    assert_eq!(inbound, 7);
}

// ---- Spanish conversation ----

#[tokio::test]
async fn spanish_customer_gets_spanish_questions() {
    let harness = TestHarness::builder().build().await.unwrap();
    let stack = stack(&harness);
    let now = Utc::now();
    let phone = "+15550004444";
    let customer = harness.add_customer(phone, Language::Spanish).await.unwrap();
    harness
        .add_visit(customer.id, Some(&sqlite_timestamp(now - Duration::hours(26))))
        .await
        .unwrap();

    stack.jobs.run_survey_batch(now).await.unwrap();
    harness.add_provider_response("Spanish").await;
    sms(&stack.app, phone, "Muy bien, un 9").await;

    let bodies = harness.mock_channel.sent_bodies().await;
    assert_eq!(bodies.len(), 2);
    assert_eq!(
        bodies[1],
        scripts::question_after(pitstop_survey::SurveyPhase::OverallSatisfaction, Language::Spanish)
            .unwrap()
    );
}

// ---- Delivery failure and retry ----

#[tokio::test]
async fn failed_greeting_is_retried_and_status_reports_recorded() {
    let harness = TestHarness::builder().build().await.unwrap();
    let stack = stack(&harness);
    let now = Utc::now();
    let customer = harness
        .add_customer("+15550005555", Language::English)
        .await
        .unwrap();
    let visit = harness
        .add_visit(customer.id, Some(&sqlite_timestamp(now - Duration::hours(40))))
        .await
        .unwrap();

    harness.mock_channel.set_failing(true);
    let report = stack.jobs.run_survey_batch(now).await.unwrap();
    assert_eq!(report.failed, 1);
    // The survey record exists even though the greeting failed.
    assert!(harness.storage.survey_for_visit(visit.id).await.unwrap().is_some());

    harness.mock_channel.set_failing(false);
    let retry = stack.jobs.run_retry_batch(Utc::now()).await.unwrap();
    assert_eq!(retry.succeeded, 1);

    let sid = harness.mock_channel.last_sent().await.unwrap().0.0;
    let req = Request::builder()
        .method("POST")
        .uri("/api/webhooks/twilio/status")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("MessageSid={sid}&MessageStatus=delivered")))
        .unwrap();
    let resp = stack.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let logs = harness.storage.message_logs_for_visit(visit.id).await.unwrap();
    let outbound: Vec<_> = logs
        .iter()
        .filter(|l| l.direction == MessageDirection::Outbound)
        .collect();
    assert_eq!(outbound.len(), 2);
    assert_eq!(outbound[0].status, message_status::RETRIED);
    assert_eq!(outbound[1].status, "delivered");
    assert_eq!(outbound[1].retries_count, 1);
}
