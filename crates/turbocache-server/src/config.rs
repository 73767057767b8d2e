use crate::error::{Result, ServerError};
use std::env;
use std::path::PathBuf;
use turbocache_store::ComputeTimeAccounting;

const DEFAULT_TEMP_DIR: &str = "turbo.go.remote-cache";
const DEFAULT_MAX_ARTIFACT_BYTES: usize = 512 * 1024 * 1024;

/// Server configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_version: String,
    pub storage_dir: PathBuf,
    /// Accepted bearer tokens
    pub tokens: Vec<String>,
    pub max_artifact_bytes: usize,
    pub accounting: ComputeTimeAccounting,
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let tokens = lookup("TURBO_TOKENS")
            .map(|s| parse_tokens(&s))
            .unwrap_or_default();

        if tokens.is_empty() {
            return Err(ServerError::Config(
                "TURBO_TOKENS must list at least one token".to_string(),
            ));
        }

        let port = match lookup("API_PORT").or_else(|| lookup("PORT")) {
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| ServerError::Config(format!("invalid port: {:?}", p)))?,
            None => 3000,
        };

        let api_version = lookup("TURBO_API_VERSION")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "v8".to_string());

        // Explicit directory wins; otherwise a named folder under the OS temp dir
        let storage_dir = match lookup("TURBO_STORAGE_DIR").filter(|v| !v.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => {
                let name = lookup("TURBO_TEMP_DIR")
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| DEFAULT_TEMP_DIR.to_string());
                env::temp_dir().join(name)
            }
        };

        let max_artifact_bytes = lookup("TURBO_MAX_ARTIFACT_BYTES")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_ARTIFACT_BYTES);

        let accounting = match lookup("TURBO_COMPUTE_TIME_ACCOUNTING") {
            Some(mode) => mode.parse::<ComputeTimeAccounting>().map_err(ServerError::Config)?,
            None => ComputeTimeAccounting::default(),
        };

        Ok(Self {
            port,
            api_version,
            storage_dir,
            tokens,
            max_artifact_bytes,
            accounting,
        })
    }
}

fn parse_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("TURBO_TOKENS", "secret")]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.api_version, "v8");
        assert_eq!(config.storage_dir, env::temp_dir().join("turbo.go.remote-cache"));
        assert_eq!(config.tokens, vec!["secret".to_string()]);
        assert_eq!(config.max_artifact_bytes, 512 * 1024 * 1024);
        assert_eq!(config.accounting, ComputeTimeAccounting::PerScannedRecord);
    }

    #[test]
    fn test_tokens_required() {
        assert!(config_from(&[]).is_err());
        assert!(config_from(&[("TURBO_TOKENS", " , ,")]).is_err());
    }

    #[test]
    fn test_token_list_parsing() {
        let config = config_from(&[("TURBO_TOKENS", "a, b,,c ")]).unwrap();
        assert_eq!(config.tokens, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("TURBO_TOKENS", "t"),
            ("API_PORT", "8080"),
            ("TURBO_API_VERSION", "v9"),
            ("TURBO_TEMP_DIR", "my-cache"),
            ("TURBO_COMPUTE_TIME_ACCOUNTING", "per-event"),
            ("TURBO_MAX_ARTIFACT_BYTES", "1024"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.api_version, "v9");
        assert_eq!(config.storage_dir, env::temp_dir().join("my-cache"));
        assert_eq!(config.accounting, ComputeTimeAccounting::PerEvent);
        assert_eq!(config.max_artifact_bytes, 1024);
    }

    #[test]
    fn test_storage_dir_override() {
        let config = config_from(&[
            ("TURBO_TOKENS", "t"),
            ("TURBO_TEMP_DIR", "ignored"),
            ("TURBO_STORAGE_DIR", "/var/lib/turbocache"),
        ])
        .unwrap();
        assert_eq!(config.storage_dir, PathBuf::from("/var/lib/turbocache"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_from(&[("TURBO_TOKENS", "t"), ("API_PORT", "http")]).is_err());
        assert!(config_from(&[
            ("TURBO_TOKENS", "t"),
            ("TURBO_COMPUTE_TIME_ACCOUNTING", "sometimes")
        ])
        .is_err());
    }
}
