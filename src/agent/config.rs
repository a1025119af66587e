use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;

/// 預設的秘密設定檔位置，相對於目前工作目錄。
pub const DEFAULT_SECRETS_PATH: &str = "config/secrets.toml";
/// 指定其他秘密設定檔路徑的環境變數。
pub const SECRETS_PATH_ENV: &str = "AGENTDESK_SECRETS";

pub const KEY_ENDPOINT: &str = "PROJECT_ENDPOINT";
pub const KEY_API_KEY: &str = "PROJECT_API_KEY";
pub const KEY_PRICE_MONITORING: &str = "AGENT_PRICE_MONITORING";
pub const KEY_COMP_GAP: &str = "AGENT_COMP_GAP";
pub const KEY_API_VERSION: &str = "AGENTS_API_VERSION";
pub const KEY_POLL_INTERVAL: &str = "AGENTS_POLL_INTERVAL_MS";
pub const KEY_RUN_TIMEOUT: &str = "AGENTS_RUN_TIMEOUT_SECS";
pub const KEY_THREAD_SCOPE: &str = "AGENTS_THREAD_SCOPE";

const DEFAULT_API_VERSION: &str = "v1";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_RUN_TIMEOUT_SECS: u64 = 300;

/// Errors produced while loading [`Settings`]. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required secret `{key}`")]
    Missing { key: &'static str },
    #[error("invalid value `{value}` for `{key}`")]
    Invalid { key: &'static str, value: String },
    #[error("failed to read secrets file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse secrets file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// How remote conversation threads are shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadScope {
    /// One remote thread per agent for the whole process.
    #[default]
    Process,
    /// One remote thread per agent per UI session.
    Session,
}

impl ThreadScope {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "process" => Some(Self::Process),
            "session" => Some(Self::Session),
            _ => None,
        }
    }
}

/// Runtime settings: the four required secrets plus optional tuning.
#[derive(Clone)]
pub struct Settings {
    pub endpoint: String,
    pub api_key: String,
    pub price_monitoring_agent: String,
    pub competitor_gap_agent: String,
    pub api_version: String,
    pub poll_interval: Duration,
    /// `None` disables the local deadline on a reply.
    pub run_timeout: Option<Duration>,
    pub thread_scope: ThreadScope,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("price_monitoring_agent", &self.price_monitoring_agent)
            .field("competitor_gap_agent", &self.competitor_gap_agent)
            .field("api_version", &self.api_version)
            .field("poll_interval", &self.poll_interval)
            .field("run_timeout", &self.run_timeout)
            .field("thread_scope", &self.thread_scope)
            .finish()
    }
}

impl Settings {
    /// 從環境變數與秘密設定檔載入設定。
    ///
    /// 環境變數優先於設定檔。若 `AGENTDESK_SECRETS` 指定了路徑，該檔案必須存在；
    /// 否則 `config/secrets.toml` 為可選。
    pub fn load() -> Result<Self, ConfigError> {
        let file = match env::var(SECRETS_PATH_ENV) {
            Ok(path) => SecretsFile::read(Path::new(&path))?,
            Err(_) => SecretsFile::read_optional(Path::new(DEFAULT_SECRETS_PATH))?,
        };
        Self::from_sources(|key| env::var(key).ok(), &file)
    }

    /// Builds settings from an environment lookup layered over a secrets file.
    pub fn from_sources<F>(env_lookup: F, file: &SecretsFile) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup(|key| {
            env_lookup(key)
                .filter(|value| !value.trim().is_empty())
                .or_else(|| file.get(key))
        })
    }

    /// Builds settings from a single key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing { key })
        };

        let endpoint = required(KEY_ENDPOINT)?;
        let api_key = required(KEY_API_KEY)?;
        let price_monitoring_agent = required(KEY_PRICE_MONITORING)?;
        let competitor_gap_agent = required(KEY_COMP_GAP)?;

        let api_version = lookup(KEY_API_VERSION)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let poll_ms = parse_u64(&lookup, KEY_POLL_INTERVAL)?.unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        if poll_ms == 0 {
            return Err(ConfigError::Invalid {
                key: KEY_POLL_INTERVAL,
                value: String::from("0"),
            });
        }

        let run_timeout = match parse_u64(&lookup, KEY_RUN_TIMEOUT)? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(Duration::from_secs(DEFAULT_RUN_TIMEOUT_SECS)),
        };

        let thread_scope = match lookup(KEY_THREAD_SCOPE) {
            Some(raw) if !raw.trim().is_empty() => {
                ThreadScope::parse(&raw).ok_or(ConfigError::Invalid {
                    key: KEY_THREAD_SCOPE,
                    value: raw,
                })?
            }
            _ => ThreadScope::default(),
        };

        Ok(Self {
            endpoint,
            api_key,
            price_monitoring_agent,
            competitor_gap_agent,
            api_version,
            poll_interval: Duration::from_millis(poll_ms),
            run_timeout,
            thread_scope,
        })
    }

    /// The two configured agent ids, price monitoring first.
    pub fn agent_ids(&self) -> [&str; 2] {
        [&self.price_monitoring_agent, &self.competitor_gap_agent]
    }
}

fn parse_u64<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        _ => Ok(None),
    }
}

/// Flat key/value view over a TOML secrets file.
///
/// Only top-level scalars are read; tables and arrays are ignored.
#[derive(Debug, Default)]
pub struct SecretsFile {
    values: toml::Table,
}

impl SecretsFile {
    /// Reads a secrets file that must exist.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded secrets file {}", path.display());
        Self::parse(path, &raw)
    }

    /// Reads a secrets file if present, otherwise yields an empty one.
    pub fn read_optional(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::read(path)
        } else {
            debug!("No secrets file at {}, using environment only", path.display());
            Ok(Self::default())
        }
    }

    pub fn parse(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        let values = toml::from_str::<toml::Table>(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            toml::Value::String(value) => Some(value.clone()),
            toml::Value::Integer(value) => Some(value.to_string()),
            toml::Value::Boolean(value) => Some(value.to_string()),
            toml::Value::Float(value) => Some(value.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (KEY_ENDPOINT, "https://example.services.ai.azure.com/api/projects/demo"),
            (KEY_API_KEY, "secret"),
            (KEY_PRICE_MONITORING, "asst_price"),
            (KEY_COMP_GAP, "asst_gap"),
        ])
    }

    fn load(map: &HashMap<&'static str, &'static str>) -> Result<Settings, ConfigError> {
        Settings::from_lookup(|key| map.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn loads_required_values_with_defaults() {
        let settings = load(&full()).unwrap();
        assert_eq!(settings.api_key, "secret");
        assert_eq!(settings.agent_ids(), ["asst_price", "asst_gap"]);
        assert_eq!(settings.api_version, "v1");
        assert_eq!(settings.poll_interval, Duration::from_millis(1000));
        assert_eq!(settings.run_timeout, Some(Duration::from_secs(300)));
        assert_eq!(settings.thread_scope, ThreadScope::Process);
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let mut map = full();
        map.remove(KEY_API_KEY);
        let err = load(&map).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key } if key == KEY_API_KEY));
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut map = full();
        map.insert(KEY_COMP_GAP, "   ");
        let err = load(&map).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key } if key == KEY_COMP_GAP));
    }

    #[test]
    fn optional_values_are_parsed() {
        let mut map = full();
        map.insert(KEY_POLL_INTERVAL, "250");
        map.insert(KEY_RUN_TIMEOUT, "0");
        map.insert(KEY_THREAD_SCOPE, "Session");
        let settings = load(&map).unwrap();
        assert_eq!(settings.poll_interval, Duration::from_millis(250));
        assert_eq!(settings.run_timeout, None);
        assert_eq!(settings.thread_scope, ThreadScope::Session);
    }

    #[test]
    fn invalid_optional_value_is_rejected() {
        let mut map = full();
        map.insert(KEY_POLL_INTERVAL, "soon");
        let err = load(&map).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key, .. } if key == KEY_POLL_INTERVAL));

        let mut map = full();
        map.insert(KEY_THREAD_SCOPE, "global");
        assert!(matches!(
            load(&map).unwrap_err(),
            ConfigError::Invalid { key, .. } if key == KEY_THREAD_SCOPE
        ));
    }

    #[test]
    fn environment_overrides_secrets_file() {
        let raw = r#"
PROJECT_ENDPOINT = "https://from-file.example.com"
PROJECT_API_KEY = "file-key"
AGENT_PRICE_MONITORING = "asst_file_price"
AGENT_COMP_GAP = "asst_file_gap"
AGENTS_POLL_INTERVAL_MS = 500
"#;
        let file = SecretsFile::parse(Path::new("secrets.toml"), raw).unwrap();
        let env = HashMap::from([(KEY_API_KEY, "env-key"), (KEY_ENDPOINT, "")]);
        let settings =
            Settings::from_sources(|key| env.get(key).map(|v| v.to_string()), &file).unwrap();
        assert_eq!(settings.api_key, "env-key");
        assert_eq!(settings.endpoint, "https://from-file.example.com");
        assert_eq!(settings.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn malformed_secrets_file_is_a_parse_error() {
        let err = SecretsFile::parse(Path::new("bad.toml"), "PROJECT_API_KEY = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let settings = load(&full()).unwrap();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
