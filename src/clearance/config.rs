use std::time::Duration;

use crate::config::ConfigError;

/// Placeholder substituted with the listing id in the clearance URL template.
pub const LISTING_ID_PLACEHOLDER: &str = "{listing_id}";

/// Default login endpoint (override with `LEAFGATE_LOGIN_URL`).
pub const DEFAULT_LOGIN_URL: &str = "http://127.0.0.1:8000/api/login";

/// Default clearance endpoint template (override with `LEAFGATE_CLEARANCE_URL`).
pub const DEFAULT_CLEARANCE_URL_TEMPLATE: &str =
    "http://127.0.0.1:8000/api/tobacco_listings/{listing_id}/timb_clearance";

/// Default bound on each outbound call.
pub const DEFAULT_OUTBOUND_TIMEOUT_SECS: u64 = 10;

/// Configuration for [`ClearanceClient`](super::ClearanceClient).
#[derive(Debug, Clone)]
pub struct ClearanceConfig {
    /// Case-management login endpoint.
    pub login_url: String,
    /// Clearance endpoint template containing [`LISTING_ID_PLACEHOLDER`].
    pub clearance_url_template: String,
    /// Officer credentials exchanged for a bearer token.
    pub email: String,
    pub password: String,
    /// Bound applied to each outbound call so a stalled case-management
    /// service cannot hold a detection request open indefinitely.
    pub timeout: Duration,
}

impl Default for ClearanceConfig {
    fn default() -> Self {
        Self {
            login_url: DEFAULT_LOGIN_URL.to_string(),
            clearance_url_template: DEFAULT_CLEARANCE_URL_TEMPLATE.to_string(),
            email: String::new(),
            password: String::new(),
            timeout: Duration::from_secs(DEFAULT_OUTBOUND_TIMEOUT_SECS),
        }
    }
}

impl ClearanceConfig {
    /// Validates the URL template and (when `require_credentials`) that both
    /// credential fields are present. Credentials come from the environment,
    /// never from code.
    pub fn validate(&self, require_credentials: bool) -> Result<(), ConfigError> {
        if !self.clearance_url_template.contains(LISTING_ID_PLACEHOLDER) {
            return Err(ConfigError::InvalidUrlTemplate {
                placeholder: LISTING_ID_PLACEHOLDER,
                value: self.clearance_url_template.clone(),
            });
        }

        if require_credentials {
            if self.email.is_empty() {
                return Err(ConfigError::MissingCredential {
                    name: "LEAFGATE_OFFICER_EMAIL",
                });
            }
            if self.password.is_empty() {
                return Err(ConfigError::MissingCredential {
                    name: "LEAFGATE_OFFICER_PASSWORD",
                });
            }
        }

        Ok(())
    }

    /// Returns the clearance URL for `listing_id`.
    pub fn clearance_url(&self, listing_id: &str) -> String {
        self.clearance_url_template
            .replace(LISTING_ID_PLACEHOLDER, listing_id)
    }
}
