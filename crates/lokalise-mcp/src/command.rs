//! Natural-language "add a key" commands.
//!
//! A fixed set of case-insensitive extractions, e.g.
//! `my project name is "Watt". I want to add a key named hello and default
//! value is "sdfs". platforms are web, ios. add it`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::{error::CoreError, service::NewKey};

static PROJECT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)project name is ['"]?([\w\s-]+)['"]?"#).expect("project pattern compiles")
});

static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)key named ['"]?([\w-]+)['"]?"#).expect("key pattern compiles")
});

static VALUE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)default value is ['"]?([\w\s-]+)['"]?"#).expect("value pattern compiles")
});

static PLATFORMS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)platforms? (are|is) ([\w,\s-]+)").expect("platforms pattern compiles")
});

/// Fields found in a command. Anything not found stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCommand {
    pub project_name: Option<String>,
    pub key_name: Option<String>,
    pub default_value: Option<String>,
    pub platforms: Option<Vec<String>>,
}

pub fn parse_command(command: &str) -> ParsedCommand {
    let capture = |pattern: &Regex, group: usize| {
        pattern
            .captures(command)
            .and_then(|caps| caps.get(group))
            .map(|m| m.as_str().trim().to_string())
    };

    let platforms = capture(&PLATFORMS_PATTERN, 2).map(|list| {
        list.split(',')
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect()
    });

    ParsedCommand {
        project_name: capture(&PROJECT_PATTERN, 1),
        key_name: capture(&KEY_PATTERN, 1),
        default_value: capture(&VALUE_PATTERN, 1),
        platforms,
    }
}

impl ParsedCommand {
    /// Split into a project name and a key to create. Project, key and
    /// default value are all required.
    pub fn into_new_key(self) -> Result<(String, NewKey), CoreError> {
        let project_name = self
            .project_name
            .filter(|v| !v.is_empty())
            .ok_or(CoreError::MissingArgument { what: "project name" })?;
        let key_name = self
            .key_name
            .filter(|v| !v.is_empty())
            .ok_or(CoreError::MissingArgument { what: "key name" })?;
        let default_value = self
            .default_value
            .filter(|v| !v.is_empty())
            .ok_or(CoreError::MissingArgument { what: "default value" })?;

        let key = NewKey {
            key_name,
            default_value: Some(default_value),
            platforms: self.platforms,
            ..Default::default()
        };
        Ok((project_name, key))
    }
}
