//! Runtime configuration, read from the environment (and `.env` when present)
use crate::error::ConfigError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const GATEWAY_URL: &str = "ACTA_GATEWAY_URL";
pub const FILES_URL: &str = "ACTA_FILES_URL";
pub const SESSION_TOKEN: &str = "ACTA_SESSION_TOKEN";
pub const JOURNAL_PATH: &str = "ACTA_JOURNAL_PATH";
pub const HTTP_TIMEOUT_SECS: &str = "ACTA_HTTP_TIMEOUT_SECS";
pub const LOG_JSON: &str = "ACTA_LOG_JSON";

const DEFAULT_JOURNAL_PATH: &str = "acta-review.journal";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Settings that never touch the gateway, enough to read the local journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConfig {
    pub journal_path: PathBuf,
    pub log_json: bool,
}

impl LocalConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| trimmed(&lookup, name);

        let log_json = match var(LOG_JSON) {
            None => false,
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                name: LOG_JSON,
                reason: format!("expected a boolean, got {raw:?}"),
            })?,
        };

        Ok(Self {
            journal_path: var(JOURNAL_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_JOURNAL_PATH)),
            log_json,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub gateway_url: String,
    /// Base for relative acta file paths; defaults to the gateway URL.
    pub files_url: String,
    pub session_token: Option<String>,
    pub http_timeout: Duration,
    pub local: LocalConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| trimmed(&lookup, name);

        let gateway_url = var(GATEWAY_URL).ok_or(ConfigError::Missing(GATEWAY_URL))?;
        check_url(GATEWAY_URL, &gateway_url)?;
        let files_url = match var(FILES_URL) {
            Some(url) => {
                check_url(FILES_URL, &url)?;
                url
            }
            None => gateway_url.clone(),
        };

        let http_timeout = match var(HTTP_TIMEOUT_SECS) {
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: HTTP_TIMEOUT_SECS,
                        reason: format!("expected a positive number of seconds, got {raw:?}"),
                    });
                }
            },
        };

        Ok(Self {
            gateway_url,
            files_url,
            session_token: var(SESSION_TOKEN),
            http_timeout,
            local: LocalConfig::from_lookup(&lookup)?,
        })
    }
}

fn trimmed(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

fn check_url(name: &'static str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(());
    }
    Err(ConfigError::Invalid {
        name,
        reason: format!("expected an http(s) URL, got {url:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(vars: &[(&str, &str)]) -> HashMap<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn config(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars = vars(pairs);
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn gateway_url_is_required() {
        let err = config(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(GATEWAY_URL)));
        assert!(err.to_string().contains(GATEWAY_URL));
    }

    #[test]
    fn defaults_apply() {
        let config = config(&[(GATEWAY_URL, "https://ledger.example/api/"), (SESSION_TOKEN, "  ")]).unwrap();
        assert_eq!(config.files_url, "https://ledger.example/api/");
        assert_eq!(config.session_token, None);
        assert_eq!(config.local.journal_path, PathBuf::from(DEFAULT_JOURNAL_PATH));
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert!(!config.local.log_json);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = config(&[(GATEWAY_URL, "https://a"), (HTTP_TIMEOUT_SECS, "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: HTTP_TIMEOUT_SECS, .. }));

        let err = config(&[(GATEWAY_URL, "ledger.local")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: GATEWAY_URL, .. }));

        let err = config(&[(GATEWAY_URL, "https://a"), (LOG_JSON, "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: LOG_JSON, .. }));
    }

    #[test]
    fn overrides_are_read() {
        let config = config(&[
            (GATEWAY_URL, "https://a"),
            (FILES_URL, "https://files.a"),
            (SESSION_TOKEN, "tok"),
            (HTTP_TIMEOUT_SECS, "3"),
            (LOG_JSON, "yes"),
        ])
        .unwrap();
        assert_eq!(config.files_url, "https://files.a");
        assert_eq!(config.session_token.as_deref(), Some("tok"));
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert!(config.local.log_json);
    }

    #[test]
    fn local_settings_need_no_gateway() {
        let vars = vars(&[(JOURNAL_PATH, " /var/lib/acta/journal "), (LOG_JSON, "1")]);
        let local = LocalConfig::from_lookup(|name| vars.get(name).cloned()).unwrap();
        assert_eq!(local.journal_path, PathBuf::from("/var/lib/acta/journal"));
        assert!(local.log_json);

        let local = LocalConfig::from_lookup(|_| None).unwrap();
        assert_eq!(local.journal_path, PathBuf::from(DEFAULT_JOURNAL_PATH));
    }
}
