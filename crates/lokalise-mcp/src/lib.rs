//! Lokalise key and translation management exposed as a stdio tool server and
//! a small HTTP API.

pub mod api;
pub mod command;
pub mod config;
pub mod error;
pub mod mcp;
pub mod paths;
pub mod resolve;
pub mod search;
pub mod service;
pub mod timestamps;

// Web / HTTP
pub mod web {
    pub mod http;
}

pub use config::Settings;
pub use error::CoreError;
pub use paths::{Layout, default_root, resolve_root};
pub use service::LocalizationService;
