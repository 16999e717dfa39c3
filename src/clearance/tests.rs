use std::time::Duration;

use super::*;
use crate::config::ConfigError;

fn unreachable_config() -> ClearanceConfig {
    // Port 1 is reserved and nothing listens there; connects fail fast.
    ClearanceConfig {
        login_url: "http://127.0.0.1:1/api/login".to_string(),
        clearance_url_template: "http://127.0.0.1:1/api/tobacco_listings/{listing_id}/timb_clearance"
            .to_string(),
        email: "officer@example.test".to_string(),
        password: "secret".to_string(),
        timeout: Duration::from_millis(500),
    }
}

#[test]
fn clearance_url_substitutes_listing_id() {
    let config = ClearanceConfig::default();
    assert_eq!(
        config.clearance_url("42"),
        "http://127.0.0.1:8000/api/tobacco_listings/42/timb_clearance"
    );
}

#[test]
fn template_without_placeholder_is_rejected() {
    let config = ClearanceConfig {
        clearance_url_template: "http://127.0.0.1:8000/api/clearance".to_string(),
        ..unreachable_config()
    };
    let err = config.validate(true).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidUrlTemplate { .. }));
}

#[test]
fn credential_exchange_requires_both_credentials() {
    let config = ClearanceConfig {
        email: String::new(),
        ..unreachable_config()
    };
    assert!(matches!(
        config.validate(true).unwrap_err(),
        ConfigError::MissingCredential {
            name: "LEAFGATE_OFFICER_EMAIL"
        }
    ));

    let config = ClearanceConfig {
        password: String::new(),
        ..unreachable_config()
    };
    assert!(matches!(
        config.validate(true).unwrap_err(),
        ConfigError::MissingCredential {
            name: "LEAFGATE_OFFICER_PASSWORD"
        }
    ));

    // Credentials are not required when the inbound gate is static-token.
    let config = ClearanceConfig {
        email: String::new(),
        password: String::new(),
        ..unreachable_config()
    };
    assert!(config.validate(false).is_ok());
}

#[test]
fn outcome_constructors() {
    let skipped = ClearanceOutcome::skipped();
    assert!(!skipped.attempted);
    assert!(!skipped.succeeded);
    assert_eq!(skipped.http_status, None);

    let ok = ClearanceOutcome::succeeded(200);
    assert!(ok.attempted);
    assert!(ok.succeeded);
    assert_eq!(ok.http_status, Some(200));

    let failed = ClearanceOutcome::failed(Some(422));
    assert!(failed.attempted);
    assert!(!failed.succeeded);
    assert_eq!(failed.http_status, Some(422));
}

#[test]
fn state_machine_terminal_states() {
    assert!(ClearanceState::Done.is_terminal());
    assert!(ClearanceState::Failed.is_terminal());
    assert!(!ClearanceState::Idle.is_terminal());
    assert!(!ClearanceState::Authenticating.is_terminal());
    assert!(!ClearanceState::Authenticated.is_terminal());
    assert!(!ClearanceState::ClearanceRequested.is_terminal());
}

#[tokio::test]
async fn trigger_contains_transport_failures() {
    let client = ClearanceClient::new(unreachable_config()).expect("client");

    let outcome = client.trigger("listing-9", None).await;

    assert!(outcome.attempted);
    assert!(!outcome.succeeded);
    // Transport error: no HTTP status was ever received.
    assert_eq!(outcome.http_status, None);
}

#[tokio::test]
async fn trigger_never_panics_on_repeated_failures() {
    let client = ClearanceClient::new(unreachable_config()).expect("client");

    for i in 0..3 {
        let outcome = client.trigger(&format!("listing-{i}"), None).await;
        assert!(outcome.attempted);
        assert!(!outcome.succeeded);
    }
}

#[test]
fn error_status_extraction() {
    assert_eq!(
        ClearanceError::LoginRejected { status: 401 }.http_status(),
        Some(401)
    );
    assert_eq!(
        ClearanceError::ClearanceRejected { status: 500 }.http_status(),
        Some(500)
    );
    assert_eq!(ClearanceError::MissingToken.http_status(), None);
}
