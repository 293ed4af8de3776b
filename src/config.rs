use std::{fmt, path::PathBuf, str::FromStr};

use tracing::warn;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.8;
pub const DEFAULT_MAX_TOKENS: u32 = 1500;
pub const DEFAULT_PORT: u16 = 8080;

/// Settings for the text-completion provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-call HTTP timeout. `None` leaves calls unbounded.
    pub timeout_secs: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: None,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// `None` when `OPENAI_API_KEY` is unset; requests then fail with a missing-credential error.
    pub api_key: Option<String>,
    pub provider: ProviderConfig,
    pub template_dir: Option<PathBuf>,
    pub port: u16,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("provider", &self.provider)
            .field("template_dir", &self.template_dir)
            .field("port", &self.port)
            .finish()
    }
}

impl AppConfig {
    /// Reads `OPENAI_API_KEY`, `OPENAI_API_BASE`, `OPENAI_MODEL`, `OPENAI_TEMPERATURE`,
    /// `OPENAI_MAX_TOKENS`, `OPENAI_TIMEOUT_SECS`, `PROMPT_TEMPLATE_DIR` and `PORT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let provider = ProviderConfig {
            base_url: non_blank(&lookup, "OPENAI_API_BASE")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: non_blank(&lookup, "OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: parsed(&lookup, "OPENAI_TEMPERATURE").unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: parsed(&lookup, "OPENAI_MAX_TOKENS").unwrap_or(DEFAULT_MAX_TOKENS),
            timeout_secs: parsed(&lookup, "OPENAI_TIMEOUT_SECS"),
        };

        Self {
            api_key: non_blank(&lookup, "OPENAI_API_KEY"),
            provider,
            template_dir: non_blank(&lookup, "PROMPT_TEMPLATE_DIR").map(PathBuf::from),
            port: parsed(&lookup, "PORT").unwrap_or(DEFAULT_PORT),
        }
    }
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = non_blank(lookup, key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {key}={raw:?}, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = config(&[]);
        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.provider, ProviderConfig::default());
        assert_eq!(cfg.template_dir, None);
        assert_eq!(cfg.port, DEFAULT_PORT);
    }

    #[test]
    fn reads_provider_settings() {
        let cfg = config(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_API_BASE", "http://localhost:9000/v1/"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("OPENAI_TEMPERATURE", "0.3"),
            ("OPENAI_MAX_TOKENS", "800"),
            ("OPENAI_TIMEOUT_SECS", "30"),
            ("PROMPT_TEMPLATE_DIR", "/etc/prompts"),
            ("PORT", "3000"),
        ]);
        assert_eq!(cfg.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.provider.base_url, "http://localhost:9000/v1");
        assert_eq!(cfg.provider.model, "gpt-4o-mini");
        assert_eq!(cfg.provider.temperature, 0.3);
        assert_eq!(cfg.provider.max_tokens, 800);
        assert_eq!(cfg.provider.timeout_secs, Some(30));
        assert_eq!(cfg.template_dir, Some(PathBuf::from("/etc/prompts")));
        assert_eq!(cfg.port, 3000);
    }

    #[test]
    fn blank_key_counts_as_missing_and_bad_numbers_fall_back() {
        let cfg =
            config(&[("OPENAI_API_KEY", "  "), ("OPENAI_MAX_TOKENS", "lots"), ("PORT", "-1")]);
        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.provider.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(cfg.port, DEFAULT_PORT);
    }

    #[test]
    fn debug_redacts_key() {
        let rendered = format!("{:?}", config(&[("OPENAI_API_KEY", "sk-secret")]));
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
