use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse port from '{value}': {source}")]
    PortParseError {
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("invalid port '{value}': must be between 1 and 65535")]
    InvalidPort { value: String },

    #[error("failed to parse bind address from '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },

    #[error("path not found: {path}")]
    PathNotFound { path: PathBuf },

    #[error("not a file: {path}")]
    NotAFile { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("failed to parse threshold from '{value}': must be a finite number")]
    InvalidThreshold { value: String },

    #[error("unknown scoring mode '{value}': expected 'raw' or 'softmax'")]
    InvalidScoringMode { value: String },

    #[error("unknown auth mode '{value}': expected 'credential-exchange' or 'static-token'")]
    InvalidAuthMode { value: String },

    #[error("static-token auth mode requires {name} to be set")]
    MissingStaticToken { name: &'static str },

    #[error("credential-exchange mode requires {name} to be set")]
    MissingCredential { name: &'static str },

    #[error("clearance URL template must contain the '{placeholder}' placeholder: {value}")]
    InvalidUrlTemplate {
        placeholder: &'static str,
        value: String,
    },

    #[error("concept prompt list is empty")]
    EmptyConceptList,
}
