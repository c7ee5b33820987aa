use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use inkwell_gmail::GmailConfig;
use inkwell_provider::ProviderKind;
use inkwell_sendgrid::SendGridConfig;
use inkwell_smtp::SmtpConfig;
use thiserror::Error;
use tracing::debug;

use crate::manager::ManagerSettings;

const FALLBACK_FROM_EMAIL: &str = "webmaster@localhost";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything needed to build the registry and the manager.
///
/// Loaded from environment variables (with a `.env` file as fallback), or
/// from a flat TOML file whose keys are the same variable names. Each SMTP
/// key also accepts its `_QQ` spelling, e.g. `EMAIL_HOST_QQ` for
/// `EMAIL_HOST_SMTP`:
///
/// ```toml
/// EMAIL_PRIMARY_PROVIDER = "sendgrid"
/// SENDGRID_API_KEY = "SG.xxxxx"
/// EMAIL_PORT_SMTP = 587
/// EMAIL_USE_TLS_SMTP = true
/// EMAIL_USE_SSL_SMTP = false
/// ```
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Head of the fallback order.
    pub primary_provider: ProviderKind,
    pub default_from_email: String,
    /// Recipient of diagnostic test messages.
    pub test_email_address: String,
    pub smtp: SmtpConfig,
    pub sendgrid: SendGridConfig,
    pub gmail: GmailConfig,
    /// Upper bound on one provider attempt (connect + send).
    pub attempt_timeout_seconds: u64,
    /// How many providers diagnostics exercise at once.
    pub max_concurrent_tests: usize,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            primary_provider: ProviderKind::Smtp,
            default_from_email: FALLBACK_FROM_EMAIL.to_owned(),
            test_email_address: FALLBACK_FROM_EMAIL.to_owned(),
            smtp: SmtpConfig::default(),
            sendgrid: SendGridConfig::new(""),
            gmail: GmailConfig::default(),
            attempt_timeout_seconds: 30,
            max_concurrent_tests: 4,
        }
    }
}

impl MailerConfig {
    /// Load from the process environment, falling back to a `.env` file in
    /// the working directory or one of its parents.
    pub fn from_env() -> Result<Self, ConfigError> {
        let dotenv = match dotenvy::dotenv_iter() {
            Ok(iter) => iter.collect::<Result<HashMap<_, _>, _>>()?,
            Err(e) if e.not_found() => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Self::from_env_with(&dotenv)
    }

    /// Load from the process environment, falling back to the `.env` file at
    /// `path`.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        let dotenv = dotenvy::from_path_iter(path)?.collect::<Result<HashMap<_, _>, _>>()?;
        Self::from_env_with(&dotenv)
    }

    fn from_env_with(dotenv: &HashMap<String, String>) -> Result<Self, ConfigError> {
        if !dotenv.is_empty() {
            debug!(keys = dotenv.len(), "loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| dotenv.get(key).cloned()))
    }

    /// Load from a flat TOML document keyed by variable name.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: HashMap<String, toml::Value> = toml::from_str(content)?;
        Self::from_lookup(|key| {
            table.get(key).map(|value| match value {
                toml::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        })
    }

    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from `path` when given, otherwise from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::from_env(),
        }
    }

    /// Build a configuration from a key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        // The relay was first configured as the QQ mailbox; `_QQ` keys
        // remain valid when the `_SMTP` key is unset.
        let get_smtp = |key: &str| {
            get(key).or_else(|| {
                key.strip_suffix("_SMTP")
                    .and_then(|stem| get(&format!("{stem}_QQ")))
            })
        };

        let mut smtp = SmtpConfig::default();
        if let Some(host) = get_smtp("EMAIL_HOST_SMTP") {
            smtp.host = host;
        }
        smtp.port = parse_or("EMAIL_PORT_SMTP", get_smtp("EMAIL_PORT_SMTP"), smtp.port)?;
        smtp.username = get_smtp("EMAIL_HOST_USER_SMTP");
        smtp.password = get_smtp("EMAIL_HOST_PASSWORD_SMTP");
        smtp.use_tls = parse_bool_or("EMAIL_USE_TLS_SMTP", get_smtp("EMAIL_USE_TLS_SMTP"), smtp.use_tls)?;
        smtp.use_ssl = parse_bool_or("EMAIL_USE_SSL_SMTP", get_smtp("EMAIL_USE_SSL_SMTP"), smtp.use_ssl)?;

        let mut sendgrid = SendGridConfig::new(get("SENDGRID_API_KEY").unwrap_or_default());
        if let Some(url) = get("SENDGRID_API_BASE_URL") {
            sendgrid = sendgrid.with_api_base_url(url);
        }

        let mut gmail = GmailConfig::default();
        if let Some(path) = get("GMAIL_CREDENTIALS_PATH") {
            gmail.credentials_path = PathBuf::from(path);
        }
        if let Some(path) = get("GMAIL_TOKEN_PATH") {
            gmail.token_path = PathBuf::from(path);
        }
        if let Some(url) = get("GMAIL_API_BASE_URL") {
            gmail.api_base_url = url;
        }

        let primary_provider = match get("EMAIL_PRIMARY_PROVIDER") {
            Some(raw) => raw.parse().map_err(|e: inkwell_provider::UnknownProviderError| {
                ConfigError::Invalid {
                    key: "EMAIL_PRIMARY_PROVIDER",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => defaults.primary_provider,
        };

        let default_from_email = get("DEFAULT_FROM_EMAIL")
            .or_else(|| smtp.username.clone())
            .unwrap_or(defaults.default_from_email);
        let test_email_address =
            get("TEST_EMAIL_ADDRESS").unwrap_or_else(|| default_from_email.clone());

        let attempt_timeout_seconds = parse_or(
            "EMAIL_ATTEMPT_TIMEOUT_SECONDS",
            get("EMAIL_ATTEMPT_TIMEOUT_SECONDS"),
            defaults.attempt_timeout_seconds,
        )?;
        let max_concurrent_tests = parse_or(
            "EMAIL_MAX_CONCURRENT_TESTS",
            get("EMAIL_MAX_CONCURRENT_TESTS"),
            defaults.max_concurrent_tests,
        )?;
        if max_concurrent_tests == 0 {
            return Err(ConfigError::Invalid {
                key: "EMAIL_MAX_CONCURRENT_TESTS",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            primary_provider,
            default_from_email,
            test_email_address,
            smtp,
            sendgrid,
            gmail,
            attempt_timeout_seconds,
            max_concurrent_tests,
        })
    }

    /// Orchestration settings derived from this configuration.
    pub fn manager_settings(&self) -> ManagerSettings {
        ManagerSettings {
            attempt_timeout: Duration::from_secs(self.attempt_timeout_seconds),
            max_concurrent_tests: self.max_concurrent_tests,
            default_from: self.default_from_email.clone(),
            test_recipient: self.test_email_address.clone(),
        }
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn parse_bool_or(key: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            reason: "expected a boolean".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<MailerConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        MailerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.primary_provider, ProviderKind::Smtp);
        assert_eq!(config.smtp.host, "smtp.qq.com");
        assert_eq!(config.smtp.port, 465);
        assert!(!config.smtp.use_tls);
        assert!(config.smtp.use_ssl);
        assert_eq!(config.sendgrid.api_key, "");
        assert_eq!(config.default_from_email, "webmaster@localhost");
        assert_eq!(config.attempt_timeout_seconds, 30);
        assert_eq!(config.max_concurrent_tests, 4);
    }

    #[test]
    fn qq_alias_selects_smtp() {
        let config = from_pairs(&[("EMAIL_PRIMARY_PROVIDER", "QQ")]).unwrap();
        assert_eq!(config.primary_provider, ProviderKind::Smtp);

        let config = from_pairs(&[("EMAIL_PRIMARY_PROVIDER", " SendGrid ")]).unwrap();
        assert_eq!(config.primary_provider, ProviderKind::SendGrid);
    }

    #[test]
    fn unknown_primary_is_rejected() {
        let err = from_pairs(&[("EMAIL_PRIMARY_PROVIDER", "mailchimp")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "EMAIL_PRIMARY_PROVIDER",
                ..
            }
        ));
    }

    #[test]
    fn test_address_defaults_to_from_address() {
        let config = from_pairs(&[("DEFAULT_FROM_EMAIL", "blog@example.com")]).unwrap();
        assert_eq!(config.test_email_address, "blog@example.com");

        let config = from_pairs(&[
            ("DEFAULT_FROM_EMAIL", "blog@example.com"),
            ("TEST_EMAIL_ADDRESS", "ops@example.com"),
        ])
        .unwrap();
        assert_eq!(config.test_email_address, "ops@example.com");
    }

    #[test]
    fn from_address_falls_back_to_smtp_user() {
        let config = from_pairs(&[("EMAIL_HOST_USER_SMTP", "12345@qq.com")]).unwrap();
        assert_eq!(config.default_from_email, "12345@qq.com");
    }

    #[test]
    fn smtp_settings_are_parsed() {
        let config = from_pairs(&[
            ("EMAIL_HOST_SMTP", "smtp.example.com"),
            ("EMAIL_PORT_SMTP", "587"),
            ("EMAIL_USE_TLS_SMTP", "True"),
            ("EMAIL_USE_SSL_SMTP", "false"),
            ("EMAIL_HOST_PASSWORD_SMTP", "hunter2"),
        ])
        .unwrap();
        assert_eq!(config.smtp.host, "smtp.example.com");
        assert_eq!(config.smtp.port, 587);
        assert!(config.smtp.use_tls);
        assert!(!config.smtp.use_ssl);
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn qq_keys_configure_smtp() {
        let config = from_pairs(&[
            ("EMAIL_HOST_QQ", "smtp.qq.com"),
            ("EMAIL_PORT_QQ", "587"),
            ("EMAIL_HOST_USER_QQ", "12345@qq.com"),
            ("EMAIL_HOST_PASSWORD_QQ", "authcode"),
            ("EMAIL_USE_TLS_QQ", "True"),
            ("EMAIL_USE_SSL_QQ", "False"),
        ])
        .unwrap();
        assert_eq!(config.smtp.host, "smtp.qq.com");
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.username.as_deref(), Some("12345@qq.com"));
        assert_eq!(config.smtp.password.as_deref(), Some("authcode"));
        assert!(config.smtp.use_tls);
        assert!(!config.smtp.use_ssl);
        assert_eq!(config.default_from_email, "12345@qq.com");
    }

    #[test]
    fn smtp_keys_win_over_qq_keys() {
        let config = from_pairs(&[
            ("EMAIL_HOST_SMTP", "smtp.example.com"),
            ("EMAIL_HOST_QQ", "smtp.qq.com"),
        ])
        .unwrap();
        assert_eq!(config.smtp.host, "smtp.example.com");
    }

    #[test]
    fn invalid_qq_port_names_the_smtp_key() {
        let err = from_pairs(&[("EMAIL_PORT_QQ", "smtp")]).unwrap_err();
        assert!(err.to_string().contains("EMAIL_PORT_SMTP"));
    }

    #[test]
    fn dotenv_file_fills_unset_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "# deployment settings\n\
             INKWELL_TEST_UNUSED=1\n\
             EMAIL_HOST_QQ=smtp.qq.com\n\
             EMAIL_HOST_USER_QQ=\"blog@qq.com\"\n\
             SENDGRID_API_KEY=SG.from-dotenv\n",
        )
        .unwrap();

        let config = MailerConfig::from_env_file(&path).unwrap();
        assert_eq!(config.smtp.username.as_deref(), Some("blog@qq.com"));
        assert_eq!(config.sendgrid.api_key, "SG.from-dotenv");

        let err = MailerConfig::from_env_file(&dir.path().join("missing.env")).unwrap_err();
        assert!(matches!(err, ConfigError::Dotenv(_)));
    }

    #[test]
    fn invalid_port_is_reported() {
        let err = from_pairs(&[("EMAIL_PORT_SMTP", "smtp")]).unwrap_err();
        assert!(err.to_string().contains("EMAIL_PORT_SMTP"));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(from_pairs(&[("EMAIL_MAX_CONCURRENT_TESTS", "0")]).is_err());
    }

    #[test]
    fn toml_uses_the_same_keys() {
        let config = MailerConfig::from_toml_str(
            r#"
            EMAIL_PRIMARY_PROVIDER = "gmail"
            EMAIL_PORT_SMTP = 2525
            EMAIL_USE_SSL_SMTP = false
            SENDGRID_API_KEY = "SG.key"
            SENDGRID_API_BASE_URL = "http://127.0.0.1:9000"
            GMAIL_TOKEN_PATH = "/var/lib/inkwell/token.json"
            EMAIL_ATTEMPT_TIMEOUT_SECONDS = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.primary_provider, ProviderKind::Gmail);
        assert_eq!(config.smtp.port, 2525);
        assert!(!config.smtp.use_ssl);
        assert_eq!(config.sendgrid.api_key, "SG.key");
        assert_eq!(config.sendgrid.api_base_url, "http://127.0.0.1:9000");
        assert_eq!(
            config.gmail.token_path,
            PathBuf::from("/var/lib/inkwell/token.json")
        );
        assert_eq!(
            config.manager_settings().attempt_timeout,
            Duration::from_secs(5)
        );
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inkwell.toml");
        std::fs::write(&path, "DEFAULT_FROM_EMAIL = \"blog@example.com\"\n").unwrap();

        let config = MailerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.default_from_email, "blog@example.com");

        let err = MailerConfig::from_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
