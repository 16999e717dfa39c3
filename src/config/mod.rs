//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `LEAFGATE_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::clearance::ClearanceConfig;
use crate::concepts::ConceptBank;
use crate::embedding::EncoderConfig;
use crate::scoring::ScoringMode;

/// How requests and the downstream clearance call are authenticated.
///
/// `CredentialExchange` leaves the inbound endpoint open and exchanges
/// configured officer credentials for a bearer token on each positive
/// verdict. `StaticToken` requires callers to present a pre-shared bearer
/// token, which is then reused for the clearance call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    CredentialExchange,
    StaticToken,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::CredentialExchange => "credential-exchange",
            AuthMode::StaticToken => "static-token",
        }
    }
}

impl std::str::FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credential-exchange" | "credential_exchange" => Ok(AuthMode::CredentialExchange),
            "static-token" | "static_token" => Ok(AuthMode::StaticToken),
            other => Err(other.to_string()),
        }
    }
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `LEAFGATE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Directory where uploads are staged during a request. Default: `./.spool`.
    pub spool_path: PathBuf,

    /// Path to the CLIP safetensors weights. When unset the encoder runs in
    /// deterministic stub mode.
    pub model_path: Option<PathBuf>,

    /// Tokenizer file override. Defaults to `tokenizer.json` inside the model
    /// directory.
    pub tokenizer_path: Option<PathBuf>,

    /// Concept prompts scored against each image.
    pub concept_prompts: Vec<String>,

    /// Score reduction applied to each similarity row.
    pub scoring_mode: ScoringMode,

    /// Decision threshold override. When unset the mode's default applies.
    pub threshold: Option<f32>,

    /// Inbound/outbound authentication mode.
    pub auth_mode: AuthMode,

    /// Pre-shared bearer token, required in static-token mode.
    pub static_token: Option<String>,

    /// Downstream case-management client settings.
    pub clearance: ClearanceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            spool_path: PathBuf::from("./.spool"),
            model_path: None,
            tokenizer_path: None,
            concept_prompts: ConceptBank::default_prompts(),
            scoring_mode: ScoringMode::default(),
            threshold: None,
            auth_mode: AuthMode::default(),
            static_token: None,
            clearance: ClearanceConfig::default(),
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "LEAFGATE_PORT";
    const ENV_BIND_ADDR: &'static str = "LEAFGATE_BIND_ADDR";
    const ENV_SPOOL_PATH: &'static str = "LEAFGATE_SPOOL_PATH";
    const ENV_MODEL_PATH: &'static str = "LEAFGATE_MODEL_PATH";
    const ENV_TOKENIZER_PATH: &'static str = "LEAFGATE_TOKENIZER_PATH";
    const ENV_CONCEPTS: &'static str = "LEAFGATE_CONCEPTS";
    const ENV_SCORING_MODE: &'static str = "LEAFGATE_SCORING_MODE";
    const ENV_THRESHOLD: &'static str = "LEAFGATE_THRESHOLD";
    const ENV_AUTH_MODE: &'static str = "LEAFGATE_AUTH_MODE";
    const ENV_STATIC_TOKEN: &'static str = "LEAFGATE_STATIC_TOKEN";
    const ENV_LOGIN_URL: &'static str = "LEAFGATE_LOGIN_URL";
    const ENV_CLEARANCE_URL: &'static str = "LEAFGATE_CLEARANCE_URL";
    const ENV_OFFICER_EMAIL: &'static str = "LEAFGATE_OFFICER_EMAIL";
    const ENV_OFFICER_PASSWORD: &'static str = "LEAFGATE_OFFICER_PASSWORD";
    const ENV_OUTBOUND_TIMEOUT_SECS: &'static str = "LEAFGATE_OUTBOUND_TIMEOUT_SECS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let spool_path = Self::parse_path_from_env(Self::ENV_SPOOL_PATH, defaults.spool_path);
        let model_path = Self::parse_optional_path_from_env(Self::ENV_MODEL_PATH);
        let tokenizer_path = Self::parse_optional_path_from_env(Self::ENV_TOKENIZER_PATH);
        let concept_prompts = Self::parse_concepts_from_env(defaults.concept_prompts)?;
        let scoring_mode = Self::parse_scoring_mode_from_env(defaults.scoring_mode)?;
        let threshold = Self::parse_threshold_from_env()?;
        let auth_mode = Self::parse_auth_mode_from_env(defaults.auth_mode)?;
        let static_token = Self::parse_optional_string_from_env(Self::ENV_STATIC_TOKEN);

        let clearance = ClearanceConfig {
            login_url: Self::parse_string_from_env(
                Self::ENV_LOGIN_URL,
                defaults.clearance.login_url,
            ),
            clearance_url_template: Self::parse_string_from_env(
                Self::ENV_CLEARANCE_URL,
                defaults.clearance.clearance_url_template,
            ),
            email: Self::parse_string_from_env(
                Self::ENV_OFFICER_EMAIL,
                defaults.clearance.email,
            ),
            password: Self::parse_string_from_env(
                Self::ENV_OFFICER_PASSWORD,
                defaults.clearance.password,
            ),
            timeout: Duration::from_secs(Self::parse_u64_from_env(
                Self::ENV_OUTBOUND_TIMEOUT_SECS,
                defaults.clearance.timeout.as_secs(),
            )),
        };

        Ok(Self {
            port,
            bind_addr,
            spool_path,
            model_path,
            tokenizer_path,
            concept_prompts,
            scoring_mode,
            threshold,
            auth_mode,
            static_token,
            clearance,
        })
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spool_path.exists() && !self.spool_path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.spool_path.clone(),
            });
        }

        if let Some(ref path) = self.model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        if let Some(ref path) = self.tokenizer_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        if self.concept_prompts.is_empty() {
            return Err(ConfigError::EmptyConceptList);
        }

        if let Some(threshold) = self.threshold
            && !threshold.is_finite()
        {
            return Err(ConfigError::InvalidThreshold {
                value: threshold.to_string(),
            });
        }

        if self.auth_mode == AuthMode::StaticToken
            && self.static_token.as_deref().unwrap_or("").is_empty()
        {
            return Err(ConfigError::MissingStaticToken {
                name: Self::ENV_STATIC_TOKEN,
            });
        }

        self.clearance
            .validate(self.auth_mode == AuthMode::CredentialExchange)?;

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Decision threshold after applying the mode default.
    pub fn resolved_threshold(&self) -> f32 {
        self.threshold
            .unwrap_or_else(|| self.scoring_mode.default_threshold())
    }

    /// Builds the encoder configuration, falling back to stub mode when no
    /// model directory is configured.
    pub fn encoder_config(&self) -> EncoderConfig {
        match &self.model_path {
            Some(model_path) => {
                let mut encoder = EncoderConfig::new(model_path.clone());
                if let Some(tokenizer_path) = &self.tokenizer_path {
                    encoder.tokenizer_path = tokenizer_path.clone();
                }
                encoder
            }
            None => EncoderConfig::stub(),
        }
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    /// Comma-separated prompt list. Setting the variable to an empty (or
    /// all-whitespace) value is a configuration error, not a fallback.
    fn parse_concepts_from_env(default: Vec<String>) -> Result<Vec<String>, ConfigError> {
        match env::var(Self::ENV_CONCEPTS) {
            Ok(value) => {
                let prompts: Vec<String> = value
                    .split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect();

                if prompts.is_empty() {
                    return Err(ConfigError::EmptyConceptList);
                }

                Ok(prompts)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_scoring_mode_from_env(default: ScoringMode) -> Result<ScoringMode, ConfigError> {
        match env::var(Self::ENV_SCORING_MODE) {
            Ok(value) => value
                .parse()
                .map_err(|value| ConfigError::InvalidScoringMode { value }),
            Err(_) => Ok(default),
        }
    }

    fn parse_threshold_from_env() -> Result<Option<f32>, ConfigError> {
        match env::var(Self::ENV_THRESHOLD) {
            Ok(value) => {
                let threshold: f32 = value
                    .parse()
                    .map_err(|_| ConfigError::InvalidThreshold {
                        value: value.clone(),
                    })?;

                if !threshold.is_finite() {
                    return Err(ConfigError::InvalidThreshold { value });
                }

                Ok(Some(threshold))
            }
            Err(_) => Ok(None),
        }
    }

    fn parse_auth_mode_from_env(default: AuthMode) -> Result<AuthMode, ConfigError> {
        match env::var(Self::ENV_AUTH_MODE) {
            Ok(value) => value
                .parse()
                .map_err(|value| ConfigError::InvalidAuthMode { value }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}
