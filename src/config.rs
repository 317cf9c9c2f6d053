// src/config.rs
//! Run configuration.
//!
//! Secrets (SMTP login, recipient, NewsAPI key) come from the environment,
//! usually via `.env`. Everything else lives in an optional TOML file:
//! 1) $DIGEST_CONFIG_PATH
//! 2) config/digest.toml
//! 3) built-in defaults
//!
//! `DIGEST_LIMIT` and `DIGEST_LEDGER_PATH` override the file.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/digest.toml";

const ENV_LIMIT: &str = "DIGEST_LIMIT";
const ENV_LEDGER_PATH: &str = "DIGEST_LEDGER_PATH";

const ENV_EMAIL_USER: &str = "EMAIL_USER";
const ENV_EMAIL_PASSWORD: &str = "EMAIL_PASSWORD";
const ENV_RECIPIENT: &str = "RECIPIENT_EMAIL";
const ENV_NEWSAPI_KEY: &str = "NEWSAPI_KEY";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Top-N bound for one digest.
    pub limit: usize,
    pub ledger_path: PathBuf,
    /// Evict delivered urls older than this many days. Unset keeps them forever.
    pub ledger_retention_days: Option<u32>,
    pub http_timeout_secs: u64,
    /// Upper bound for a whole adapter, including multi-query providers.
    pub adapter_timeout_secs: u64,
    /// Write Prometheus text exposition here after each run.
    pub metrics_textfile: Option<PathBuf>,
    pub smtp: SmtpSettings,
    pub sources: SourceSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            limit: 20,
            ledger_path: PathBuf::from("state/delivered.json"),
            ledger_retention_days: None,
            http_timeout_secs: 10,
            adapter_timeout_secs: 60,
            metrics_textfile: None,
            smtp: SmtpSettings::default(),
            sources: SourceSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceSettings {
    pub hacker_news: HackerNewsSettings,
    pub reddit: RedditSettings,
    pub arxiv: ArxivSettings,
    pub github: GithubSettings,
    pub newsapi: NewsApiSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HackerNewsSettings {
    pub enabled: bool,
    pub query: String,
    pub hits_per_page: u32,
}

impl Default for HackerNewsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            query: "AI OR machine learning OR data science OR artificial intelligence".to_string(),
            hits_per_page: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RedditSettings {
    pub enabled: bool,
    pub subreddits: Vec<String>,
    pub limit_per_subreddit: u32,
    /// Pause between subreddit requests.
    pub delay_ms: u64,
}

impl Default for RedditSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            subreddits: vec![
                "MachineLearning".to_string(),
                "artificial".to_string(),
                "datascience".to_string(),
            ],
            limit_per_subreddit: 5,
            delay_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArxivSettings {
    pub enabled: bool,
    pub categories: Vec<String>,
    pub max_results: u32,
}

impl Default for ArxivSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            categories: ["cs.AI", "cs.LG", "cs.CV", "cs.CL"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_results: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GithubSettings {
    pub enabled: bool,
    pub query: String,
    pub per_page: u32,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            query: "machine learning OR artificial intelligence OR data science".to_string(),
            per_page: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NewsApiSettings {
    /// Still requires NEWSAPI_KEY; this only lets a configured key be ignored.
    pub enabled: bool,
    pub query: String,
    pub page_size: u32,
}

impl Default for NewsApiSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            query: "artificial intelligence OR machine learning OR data science OR deep learning OR neural networks OR AI".to_string(),
            page_size: 10,
        }
    }
}

impl Settings {
    /// Load settings from an explicit TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let s: Settings = toml::from_str(&content)
            .with_context(|| format!("parsing settings in {}", path.display()))?;
        Ok(s)
    }

    /// Find the settings file (`explicit`, then the env path, then
    /// `config/digest.toml`, then defaults), apply env overrides, validate.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut s = if let Some(p) = explicit {
            Self::load_from(p)?
        } else if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from(Path::new(DEFAULT_CONFIG_PATH))?
        } else {
            Self::default()
        };
        s.apply_overrides(|k| std::env::var(k).ok())?;
        s.validate()?;
        Ok(s)
    }

    pub fn apply_overrides<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = var(ENV_LIMIT) {
            self.limit = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_LIMIT} must be a positive integer, got {v:?}"))?;
        }
        if let Some(v) = var(ENV_LEDGER_PATH).filter(|v| !v.trim().is_empty()) {
            self.ledger_path = PathBuf::from(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            bail!("limit must be at least 1");
        }
        if self.http_timeout_secs == 0 || self.adapter_timeout_secs == 0 {
            bail!("timeouts must be at least 1 second");
        }
        Ok(())
    }
}

/// SMTP login and digest recipient. Required for any real delivery.
#[derive(Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub user: String,
    pub password: String,
    pub recipient: String,
}

// Keep the password out of logs.
impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("user", &self.user)
            .field("password", &"***")
            .field("recipient", &self.recipient)
            .finish()
    }
}

impl EmailConfig {
    /// Read all three variables; report every missing one in a single error.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| var(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let user = get(ENV_EMAIL_USER);
        let password = get(ENV_EMAIL_PASSWORD);
        let recipient = get(ENV_RECIPIENT);

        match (user, password, recipient) {
            (Some(user), Some(password), Some(recipient)) => Ok(Self {
                user,
                password,
                recipient,
            }),
            (user, password, recipient) => {
                let missing: Vec<&str> = [
                    (ENV_EMAIL_USER, user.is_none()),
                    (ENV_EMAIL_PASSWORD, password.is_none()),
                    (ENV_RECIPIENT, recipient.is_none()),
                ]
                .into_iter()
                .filter_map(|(k, gone)| gone.then_some(k))
                .collect();
                bail!(
                    "missing required environment variables: {}",
                    missing.join(", ")
                )
            }
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_vars(|k| std::env::var(k).ok())
    }
}

/// Optional NewsAPI key; blank counts as absent.
fn newsapi_key_from_env() -> Option<String> {
    std::env::var(ENV_NEWSAPI_KEY)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

/// Everything a run needs, validated before any source is fetched.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    pub settings: Settings,
    /// `None` only when resolved for a run that never delivers.
    pub email: Option<EmailConfig>,
    pub newsapi_key: Option<String>,
}

impl DigestConfig {
    /// Settings via [`Settings::resolve`], then credentials from the
    /// environment. With `deliver` set, missing email vars are an error.
    pub fn resolve(explicit: Option<&Path>, deliver: bool) -> Result<Self> {
        let settings = Settings::resolve(explicit)?;
        let email = if deliver {
            Some(EmailConfig::from_env()?)
        } else {
            None
        };
        Ok(Self {
            settings,
            email,
            newsapi_key: newsapi_key_from_env(),
        })
    }

    /// Replace the digest size (e.g. from the command line) and re-validate.
    pub fn with_limit(mut self, limit: usize) -> Result<Self> {
        self.settings.limit = limit;
        self.settings.validate()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let m: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| m.get(k).cloned()
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let s: Settings = toml::from_str(
            r#"
limit = 5
[sources.reddit]
subreddits = ["rust"]
"#,
        )
        .unwrap();
        assert_eq!(s.limit, 5);
        assert_eq!(s.sources.reddit.subreddits, vec!["rust".to_string()]);
        assert_eq!(s.sources.reddit.delay_ms, 1_000);
        assert_eq!(s.smtp, SmtpSettings::default());
        assert!(s.ledger_retention_days.is_none());
    }

    #[test]
    fn env_overrides_apply() {
        let mut s = Settings::default();
        s.apply_overrides(vars(&[
            ("DIGEST_LIMIT", " 7 "),
            ("DIGEST_LEDGER_PATH", "/tmp/l.json"),
        ]))
        .unwrap();
        assert_eq!(s.limit, 7);
        assert_eq!(s.ledger_path, PathBuf::from("/tmp/l.json"));
    }

    #[test]
    fn bad_limit_override_is_an_error() {
        let mut s = Settings::default();
        assert!(s.apply_overrides(vars(&[("DIGEST_LIMIT", "lots")])).is_err());
    }

    #[test]
    fn zero_limit_fails_validation() {
        let s = Settings {
            limit: 0,
            ..Settings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn email_config_lists_all_missing_vars() {
        let err = EmailConfig::from_vars(vars(&[("EMAIL_USER", "me@x.test"), ("EMAIL_PASSWORD", " ")]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("EMAIL_PASSWORD"));
        assert!(err.contains("RECIPIENT_EMAIL"));
        assert!(!err.contains("EMAIL_USER,"));
    }

    #[test]
    fn email_config_debug_hides_password() {
        let c = EmailConfig::from_vars(vars(&[
            ("EMAIL_USER", "me@x.test"),
            ("EMAIL_PASSWORD", "hunter2"),
            ("RECIPIENT_EMAIL", "you@x.test"),
        ]))
        .unwrap();
        assert!(!format!("{c:?}").contains("hunter2"));
    }
}
