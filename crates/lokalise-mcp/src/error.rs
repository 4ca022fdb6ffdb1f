use std::{io, path::PathBuf};

use serde_json::Value;
use thiserror::Error;
use toml_edit::de::Error as TomlDeError;
use url::ParseError as UrlParseError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("LOKALISE_API_KEY not set in environment or configuration")]
    MissingApiKey,

    #[error("missing {what}")]
    MissingArgument { what: &'static str },

    #[error("key name cannot be empty or contain only whitespace")]
    EmptyKeyName,

    #[error("no valid platforms specified for key: {key}. Valid platforms are: {valid}")]
    NoValidPlatforms { key: String, valid: String },

    #[error("limit must be a positive number greater than 0 (got {limit})")]
    InvalidLimit { limit: i64 },

    #[error("project named \"{name}\" not found")]
    ProjectNotFound { name: String },

    #[error("key named \"{key}\" not found in project \"{project}\"")]
    KeyNotFound { key: String, project: String },

    #[error("invalid key data: {message}")]
    InvalidKeyData {
        message: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error("lokalise API responded with {status}: {}", .message.as_deref().unwrap_or("no message"))]
    RemoteStatus { status: u16, message: Option<String>, body: Value },

    #[error("request to lokalise API failed")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode lokalise API response from {path}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid API base url '{url}'")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: UrlParseError,
    },

    #[error("failed to read config file {path}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: TomlDeError,
    },

    #[error("failed to create directory {path}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to determine user home directory for LOKALISE_MCP_ROOT")]
    HomeDirectoryUnknown,
}

impl CoreError {
    /// Errors raised before any remote call was attempted.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            CoreError::MissingApiKey
                | CoreError::MissingArgument { .. }
                | CoreError::EmptyKeyName
                | CoreError::NoValidPlatforms { .. }
                | CoreError::InvalidLimit { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::ProjectNotFound { .. } | CoreError::KeyNotFound { .. })
    }

    /// Short failure label used by the boundaries in logs and the tool audit log.
    pub fn kind(&self) -> &'static str {
        if self.is_precondition() {
            "precondition"
        } else if self.is_not_found() {
            "not_found"
        } else if matches!(
            self,
            CoreError::RemoteStatus { .. }
                | CoreError::InvalidKeyData { .. }
                | CoreError::Transport { .. }
                | CoreError::Decode { .. }
        ) {
            "remote"
        } else {
            "config"
        }
    }

    /// Caller mistakes rather than remote or local faults.
    pub fn is_caller_error(&self) -> bool {
        self.is_precondition() || self.is_not_found()
    }

    /// Remote response body attached to the error, if any.
    pub fn remote_body(&self) -> Option<&Value> {
        match self {
            CoreError::RemoteStatus { body, .. } => Some(body),
            CoreError::InvalidKeyData { source, .. } => source.remote_body(),
            _ => None,
        }
    }

    /// Remote HTTP status attached to the error, if any.
    pub fn remote_status(&self) -> Option<u16> {
        match self {
            CoreError::RemoteStatus { status, .. } => Some(*status),
            CoreError::InvalidKeyData { source, .. } => source.remote_status(),
            _ => None,
        }
    }
}
