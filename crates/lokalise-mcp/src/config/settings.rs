use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::{error::CoreError, paths::Layout};

pub const DEFAULT_BASE_URL: &str = "https://api.lokalise.com/api2";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_HTTP_PORT: u16 = 3000;

const API_KEY_ENV: &str = "LOKALISE_API_KEY";
const BASE_URL_ENV: &str = "LOKALISE_API_URL";
const PORT_ENV: &str = "PORT";
const CONFIG_PATH_ENV: &str = "LOKALISE_MCP_CONFIG";

/// On-disk representation of the optional TOML config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SettingsDocument {
    lokalise: LokaliseSection,
    http: HttpSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct LokaliseSection {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct HttpSection {
    port: Option<u16>,
}

/// Process-wide configuration, built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct Settings {
    api_key: Option<String>,
    base_url: Url,
    timeout: Duration,
    http_port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            timeout: DEFAULT_TIMEOUT,
            http_port: DEFAULT_HTTP_PORT,
        }
    }
}

impl Settings {
    /// Load settings from the config file (if any) and the process environment.
    ///
    /// An explicit path, or one named by `LOKALISE_MCP_CONFIG`, must exist. The
    /// layout's default `config.toml` is only read when present.
    pub fn load(explicit: Option<&Path>, layout: &Layout) -> Result<Self> {
        let env_path = env::var(CONFIG_PATH_ENV).ok().filter(|v| !v.trim().is_empty());
        let file = match (explicit, env_path) {
            (Some(path), _) => Some(path.to_path_buf()),
            (None, Some(path)) => Some(PathBuf::from(path)),
            (None, None) => Some(layout.config_path()).filter(|path| path.exists()),
        };
        Self::from_sources(file.as_deref(), |name| env::var(name).ok())
    }

    /// Build settings from an optional file and an environment lookup.
    pub fn from_sources<F>(file: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(path) = file {
            let content = fs::read_to_string(path)
                .map_err(|source| CoreError::ReadConfig { path: path.to_path_buf(), source })?;
            let doc: SettingsDocument = toml_edit::de::from_str(&content)
                .map_err(|source| CoreError::ParseConfig { path: path.to_path_buf(), source })?;
            debug!(path = %path.display(), "loaded config file");
            settings.apply_document(doc)?;
        }

        if let Some(key) = lookup(API_KEY_ENV) {
            settings.api_key = normalize_key(Some(key));
        }
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            settings.base_url = parse_base_url(&url)?;
        }
        if let Some(port) = lookup(PORT_ENV).filter(|v| !v.trim().is_empty()) {
            match port.trim().parse::<u16>() {
                Ok(port) => settings.http_port = port,
                Err(_) => warn!(value = %port, "ignoring invalid PORT value"),
            }
        }

        Ok(settings)
    }

    fn apply_document(&mut self, doc: SettingsDocument) -> Result<()> {
        if doc.lokalise.api_key.is_some() {
            self.api_key = normalize_key(doc.lokalise.api_key);
        }
        if let Some(url) = doc.lokalise.base_url.filter(|v| !v.trim().is_empty()) {
            self.base_url = parse_base_url(&url)?;
        }
        if let Some(secs) = doc.lokalise.timeout_secs.filter(|secs| *secs > 0) {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(port) = doc.http.port {
            self.http_port = port;
        }
        Ok(())
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = normalize_key(Some(key.into()));
        self
    }

    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// The credential, or a precondition error when it is absent.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key().ok_or_else(|| CoreError::MissingApiKey.into())
    }

    /// Credential with everything but a short prefix and suffix hidden.
    pub fn masked_api_key(&self) -> String {
        match self.api_key() {
            None => "not configured".to_string(),
            Some(key) if key.chars().count() <= 12 => "****".to_string(),
            Some(key) => {
                let chars: Vec<char> = key.chars().collect();
                let head: String = chars[..8].iter().collect();
                let tail: String = chars[chars.len() - 4..].iter().collect();
                format!("{head}...{tail}")
            }
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn set_http_port(&mut self, port: u16) {
        self.http_port = port;
    }
}

fn normalize_key(key: Option<String>) -> Option<String> {
    key.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    Url::parse(trimmed)
        .map_err(|source| CoreError::InvalidBaseUrl { url: trimmed.to_string(), source }.into())
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, io::Write};

    use tempfile::tempdir;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_sources() {
        let settings = Settings::from_sources(None, env_of(&[])).unwrap();
        assert_eq!(settings.api_key(), None);
        assert_eq!(settings.base_url().as_str(), "https://api.lokalise.com/api2");
        assert_eq!(settings.timeout(), Duration::from_secs(30));
        assert_eq!(settings.http_port(), 3000);
        assert!(settings.require_api_key().is_err());
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[lokalise]
api_key = "from-file"
timeout_secs = 5

[http]
port = 8080
"#
        )
        .unwrap();

        let settings = Settings::from_sources(
            Some(&path),
            env_of(&[("LOKALISE_API_KEY", "from-env"), ("PORT", "9000")]),
        )
        .unwrap();
        assert_eq!(settings.api_key(), Some("from-env"));
        assert_eq!(settings.timeout(), Duration::from_secs(5));
        assert_eq!(settings.http_port(), 9000);
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let settings =
            Settings::from_sources(None, env_of(&[("LOKALISE_API_KEY", "   ")])).unwrap();
        assert_eq!(settings.api_key(), None);
    }

    #[test]
    fn rejects_invalid_base_url() {
        let err = Settings::from_sources(None, env_of(&[("LOKALISE_API_URL", "not a url")]))
            .unwrap_err();
        assert!(err.to_string().contains("base url"), "unexpected error: {err:?}");
    }

    #[test]
    fn masks_credential() {
        let settings = Settings::default().with_api_key("abcdefgh12345678wxyz");
        assert_eq!(settings.masked_api_key(), "abcdefgh...wxyz");
        assert_eq!(Settings::default().masked_api_key(), "not configured");
    }
}
