use inkwell_provider::DeliveryError;
use serde::{Deserialize, Serialize};

/// Connection security for the SMTP relay, derived from the
/// `use_tls`/`use_ssl` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Plaintext connection. Only for local relays and tests.
    None,
    /// Plaintext connection upgraded with `STARTTLS`.
    StartTls,
    /// TLS from the first byte (SMTPS).
    ImplicitTls,
}

/// SMTP relay connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    #[serde(default = "default_host")]
    pub host: String,

    /// SMTP server port. Defaults to 465 (implicit TLS).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional username for authentication.
    #[serde(default)]
    pub username: Option<String>,

    /// Optional password for authentication.
    #[serde(default)]
    pub password: Option<String>,

    /// Upgrade the connection with `STARTTLS`. Defaults to `false`.
    #[serde(default)]
    pub use_tls: bool,

    /// Connect with implicit TLS. Defaults to `true`.
    #[serde(default = "default_use_ssl")]
    pub use_ssl: bool,

    /// Socket timeout for each SMTP command, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_host() -> String {
    "smtp.qq.com".to_owned()
}

fn default_port() -> u16 {
    465
}

fn default_use_ssl() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    30
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("use_tls", &self.use_tls)
            .field("use_ssl", &self.use_ssl)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: None,
            password: None,
            use_tls: false,
            use_ssl: default_use_ssl(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl SmtpConfig {
    /// Create a config for the given relay host with default port and
    /// implicit TLS.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Set authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the connection security directly.
    #[must_use]
    pub fn with_security(mut self, security: SmtpSecurity) -> Self {
        self.use_tls = security == SmtpSecurity::StartTls;
        self.use_ssl = security == SmtpSecurity::ImplicitTls;
        self
    }

    /// Resolve the `use_tls`/`use_ssl` flags. Enabling both is a
    /// configuration error.
    pub fn security(&self) -> Result<SmtpSecurity, DeliveryError> {
        match (self.use_tls, self.use_ssl) {
            (true, true) => Err(DeliveryError::Configuration(
                "use_tls and use_ssl are mutually exclusive".into(),
            )),
            (true, false) => Ok(SmtpSecurity::StartTls),
            (false, true) => Ok(SmtpSecurity::ImplicitTls),
            (false, false) => Ok(SmtpSecurity::None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_implicit_tls_on_465() {
        let config = SmtpConfig::default();
        assert_eq!(config.port, 465);
        assert!(config.use_ssl);
        assert!(!config.use_tls);
        assert_eq!(config.security().unwrap(), SmtpSecurity::ImplicitTls);
    }

    #[test]
    fn tls_and_ssl_together_is_rejected() {
        let mut config = SmtpConfig::new("smtp.example.com");
        config.use_tls = true;
        config.use_ssl = true;
        let err = config.security().unwrap_err();
        assert!(matches!(err, DeliveryError::Configuration(_)));
    }

    #[test]
    fn with_security_sets_flags() {
        let config = SmtpConfig::new("smtp.example.com").with_security(SmtpSecurity::StartTls);
        assert!(config.use_tls);
        assert!(!config.use_ssl);

        let config = config.with_security(SmtpSecurity::None);
        assert_eq!(config.security().unwrap(), SmtpSecurity::None);
    }

    #[test]
    fn deserialize_applies_defaults() {
        let config: SmtpConfig = serde_json::from_value(serde_json::json!({
            "host": "smtp.example.com",
            "username": "blog"
        }))
        .unwrap();
        assert_eq!(config.host, "smtp.example.com");
        assert_eq!(config.port, 465);
        assert!(config.use_ssl);
        assert_eq!(config.timeout_seconds, 30);
        assert!(config.password.is_none());
    }

    #[test]
    fn debug_redacts_password() {
        let config =
            SmtpConfig::new("smtp.example.com").with_credentials("user", "test-pw-placeholder");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"), "password must be redacted");
        assert!(
            !debug.contains("test-pw-placeholder"),
            "password must not appear in debug output"
        );
        assert!(debug.contains("smtp.example.com"));
    }
}
