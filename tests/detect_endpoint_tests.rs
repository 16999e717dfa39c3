//! End-to-end tests over a real socket: gateway plus a mock case-management
//! service, exercising the full detect-then-clear flow.

mod common;

use common::{
    CASE_TOKEN, MATCH_ALL, MATCH_NONE, clearance_config_for, png_bytes, spawn_case_management,
    spawn_gateway,
};

use std::time::Duration;

use leafgate::clearance::ClearanceConfig;
use reqwest::multipart;

fn detect_form(image_count: usize, listing_id: &str) -> multipart::Form {
    let mut form = multipart::Form::new().text("listing_id", listing_id.to_string());
    for i in 0..image_count {
        form = form.part(
            "images[]",
            multipart::Part::bytes(png_bytes(i as u8 + 1)).file_name(format!("{i}.png")),
        );
    }
    form
}

#[tokio::test]
async fn positive_verdict_exchanges_credentials_and_posts_clearance() {
    let (cm_server, cm) = spawn_case_management().await;
    let gateway = spawn_gateway(MATCH_ALL, None, clearance_config_for(cm_server.addr)).await;

    let response = reqwest::Client::new()
        .post(format!("{}/detect", gateway.url()))
        .multipart(detect_form(2, "42"))
        .send()
        .await
        .expect("detect request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["status"], "success");
    assert_eq!(body["is_tobacco"], true);
    assert_eq!(body["detection_results"], serde_json::json!([true, true]));

    // The clearance call happened before the response was returned.
    assert_eq!(cm.login_count(), 1);
    let calls = cm.clearance_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].listing_id, "42");
    assert_eq!(calls[0].bearer.as_deref(), Some(CASE_TOKEN));
}

#[tokio::test]
async fn negative_verdict_never_contacts_case_management() {
    let (cm_server, cm) = spawn_case_management().await;
    let gateway = spawn_gateway(MATCH_NONE, None, clearance_config_for(cm_server.addr)).await;

    let response = reqwest::Client::new()
        .post(format!("{}/detect", gateway.url()))
        .multipart(detect_form(3, "7"))
        .send()
        .await
        .expect("detect request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["is_tobacco"], false);
    assert_eq!(
        body["detection_results"],
        serde_json::json!([false, false, false])
    );

    assert_eq!(cm.login_count(), 0);
    assert!(cm.clearance_calls().is_empty());
}

#[tokio::test]
async fn static_token_deployments_reuse_the_inbound_bearer() {
    let (cm_server, cm) = spawn_case_management().await;
    let gateway = spawn_gateway(
        MATCH_ALL,
        Some("shared-secret"),
        clearance_config_for(cm_server.addr),
    )
    .await;

    let response = reqwest::Client::new()
        .post(format!("{}/detect", gateway.url()))
        .bearer_auth("shared-secret")
        .multipart(detect_form(1, "9"))
        .send()
        .await
        .expect("detect request");

    assert_eq!(response.status(), 200);

    // No credential exchange; the caller's own token went downstream.
    assert_eq!(cm.login_count(), 0);
    let calls = cm.clearance_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].listing_id, "9");
    assert_eq!(calls[0].bearer.as_deref(), Some("shared-secret"));
}

#[tokio::test]
async fn static_token_deployments_reject_unauthenticated_callers() {
    let (cm_server, cm) = spawn_case_management().await;
    let gateway = spawn_gateway(
        MATCH_ALL,
        Some("shared-secret"),
        clearance_config_for(cm_server.addr),
    )
    .await;

    let response = reqwest::Client::new()
        .post(format!("{}/detect", gateway.url()))
        .multipart(detect_form(1, "9"))
        .send()
        .await
        .expect("detect request");

    assert_eq!(response.status(), 401);
    assert!(cm.clearance_calls().is_empty());
}

#[tokio::test]
async fn unreachable_case_management_does_not_change_the_verdict() {
    // Nothing listens on port 1; the clearance attempt fails but the
    // detection response is still a clean 200.
    let unreachable = ClearanceConfig {
        login_url: "http://127.0.0.1:1/api/login".to_string(),
        clearance_url_template:
            "http://127.0.0.1:1/api/tobacco_listings/{listing_id}/timb_clearance".to_string(),
        email: "officer@example.test".to_string(),
        password: "secret".to_string(),
        timeout: Duration::from_millis(500),
    };
    let gateway = spawn_gateway(MATCH_ALL, None, unreachable).await;

    let response = reqwest::Client::new()
        .post(format!("{}/detect", gateway.url()))
        .multipart(detect_form(2, "13"))
        .send()
        .await
        .expect("detect request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["is_tobacco"], true);
}

#[tokio::test]
async fn validation_failures_are_bad_requests() {
    let (cm_server, cm) = spawn_case_management().await;
    let gateway = spawn_gateway(MATCH_ALL, None, clearance_config_for(cm_server.addr)).await;
    let client = reqwest::Client::new();

    // No images at all.
    let response = client
        .post(format!("{}/detect", gateway.url()))
        .multipart(multipart::Form::new().text("listing_id", "42"))
        .send()
        .await
        .expect("detect request");
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["message"], "No images uploaded");

    // Images but no listing id.
    let form = multipart::Form::new().part(
        "images[]",
        multipart::Part::bytes(png_bytes(1)).file_name("a.png"),
    );
    let response = client
        .post(format!("{}/detect", gateway.url()))
        .multipart(form)
        .send()
        .await
        .expect("detect request");
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["message"], "No listing ID provided");

    assert!(cm.clearance_calls().is_empty());
}

#[tokio::test]
async fn undecodable_upload_is_a_server_error() {
    let (cm_server, cm) = spawn_case_management().await;
    let gateway = spawn_gateway(MATCH_ALL, None, clearance_config_for(cm_server.addr)).await;

    let form = multipart::Form::new()
        .text("listing_id", "42")
        .part(
            "images[]",
            multipart::Part::bytes(png_bytes(1)).file_name("a.png"),
        )
        .part(
            "images[]",
            multipart::Part::bytes(b"not an image".to_vec()).file_name("b.png"),
        );

    let response = reqwest::Client::new()
        .post(format!("{}/detect", gateway.url()))
        .multipart(form)
        .send()
        .await
        .expect("detect request");

    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["status"], "error");

    // The batch aborted before any verdict, so no clearance was attempted.
    assert!(cm.clearance_calls().is_empty());
}
