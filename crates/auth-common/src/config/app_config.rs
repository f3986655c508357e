//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when
//! present). Every component receives the parts it needs from [`AppConfig`]
//! at startup; nothing reads the environment after that.

use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
    pub captcha: CaptchaConfig,
    pub mail: MailConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
    /// Base URL of the web client, used to build password reset links
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
    /// Mount point of the admin routes under `/api/v1`
    #[serde(default = "default_admin_path")]
    pub admin_path: String,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" | "prod" | "release" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" | "dev" | "debug" => Some(Self::Development),
            _ => None,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// JWT configuration. Expiries are in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64,
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: i64,
}

/// Verification code, lockout and sweeper settings
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_register_code_expire_minutes")]
    pub register_code_expire_minutes: u32,
    #[serde(default = "default_reset_code_expire_minutes")]
    pub reset_code_expire_minutes: u32,
    #[serde(default = "default_login_max_failure_count")]
    pub login_max_failure_count: u32,
    #[serde(default = "default_login_lock_duration_minutes")]
    pub login_lock_duration_minutes: u32,
    #[serde(default = "default_cleanup_interval_minutes")]
    pub cleanup_interval_minutes: u32,
    #[serde(default = "default_code_retention_days")]
    pub code_retention_days: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            register_code_expire_minutes: default_register_code_expire_minutes(),
            reset_code_expire_minutes: default_reset_code_expire_minutes(),
            login_max_failure_count: default_login_max_failure_count(),
            login_lock_duration_minutes: default_login_lock_duration_minutes(),
            cleanup_interval_minutes: default_cleanup_interval_minutes(),
            code_retention_days: default_code_retention_days(),
        }
    }
}

/// Third-party human verification (Geetest v4) credentials
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptchaConfig {
    #[serde(default)]
    pub enabled: bool,
    pub captcha_id: Option<String>,
    pub captcha_key: Option<String>,
}

impl CaptchaConfig {
    /// The gate is active only when switched on and both credentials are set
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled
            && self.captcha_id.as_deref().is_some_and(|s| !s.is_empty())
            && self.captcha_key.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Outbound mail settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailConfig {
    pub smtp_host: Option<String>,
    /// Defaults to 465 with implicit TLS, 587 otherwise
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    /// `SMTP_SSL_TYPE=ssl`: TLS from the first byte instead of STARTTLS
    #[serde(default)]
    pub smtp_implicit_tls: bool,
    pub from_address: Option<String>,
    pub from_name: Option<String>,
    /// Log mails instead of delivering them
    #[serde(default)]
    pub log_only: bool,
}

impl MailConfig {
    /// Whether an SMTP server is configured
    #[must_use]
    pub fn has_smtp(&self) -> bool {
        self.smtp_host.as_deref().is_some_and(|s| !s.is_empty())
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.smtp_port
            .unwrap_or(if self.smtp_implicit_tls { 465 } else { 587 })
    }

    /// Envelope sender: `SYSTEM_EMAIL_ADDRESS`, else the SMTP login
    #[must_use]
    pub fn sender_address(&self) -> Option<&str> {
        self.from_address
            .as_deref()
            .or(self.smtp_username.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

/// CORS configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

// Default value functions
fn default_app_name() -> String {
    "F.st".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_frontend_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_admin_path() -> String {
    "/admin".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_access_token_expiry() -> i64 {
    7200 // 2 hours
}

fn default_refresh_token_expiry() -> i64 {
    604_800 // 7 days
}

fn default_register_code_expire_minutes() -> u32 {
    60
}

fn default_reset_code_expire_minutes() -> u32 {
    15
}

fn default_login_max_failure_count() -> u32 {
    5
}

fn default_login_lock_duration_minutes() -> u32 {
    10
}

fn default_cleanup_interval_minutes() -> u32 {
    10
}

fn default_code_retention_days() -> u32 {
    7
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_burst() -> u32 {
    50
}

/// Ensure the admin mount point starts with a slash and has none trailing
fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        default_admin_path()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|s| !s.trim().is_empty());
        let parsed = |name: &'static str| -> Result<Option<i64>, ConfigError> {
            var(name).map(|s| parse_value(name, &s)).transpose()
        };

        let cleanup_interval_minutes = match parsed("CLEANUP_INTERVAL_MINUTES")? {
            Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
            _ => default_cleanup_interval_minutes(),
        };

        Ok(Self {
            app: AppSettings {
                name: var("APP_NAME").unwrap_or_else(default_app_name),
                env: var("APP_ENV")
                    .or_else(|| var("APP_MODE"))
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
                frontend_url: var("FRONTEND_URL")
                    .map(|s| s.trim_end_matches('/').to_string())
                    .unwrap_or_else(default_frontend_url),
                admin_path: var("ADMIN_PATH")
                    .map(|s| normalize_path(&s))
                    .unwrap_or_else(default_admin_path),
            },
            api: ServerConfig {
                host: var("API_HOST").unwrap_or_else(default_host),
                port: var("API_PORT")
                    .or_else(|| var("PORT"))
                    .map(|s| parse_value("API_PORT", &s))
                    .transpose()?
                    .unwrap_or_else(default_port),
            },
            database: DatabaseConfig {
                url: var("DATABASE_URL").ok_or(ConfigError::MissingVar("DATABASE_URL"))?,
                max_connections: var("DATABASE_MAX_CONNECTIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_max_connections),
                min_connections: var("DATABASE_MIN_CONNECTIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_min_connections),
            },
            jwt: JwtConfig {
                secret: var("JWT_SECRET").ok_or(ConfigError::MissingVar("JWT_SECRET"))?,
                access_token_expiry: positive(parsed("JWT_ACCESS_EXPIRE")?)
                    .unwrap_or_else(default_access_token_expiry),
                refresh_token_expiry: positive(parsed("JWT_REFRESH_EXPIRE")?)
                    .unwrap_or_else(default_refresh_token_expiry),
            },
            security: SecurityConfig {
                register_code_expire_minutes: positive_u32(parsed("REGISTER_CODE_EXPIRE_MINUTES")?)
                    .unwrap_or_else(default_register_code_expire_minutes),
                reset_code_expire_minutes: default_reset_code_expire_minutes(),
                login_max_failure_count: positive_u32(parsed("LOGIN_MAX_FAILURE_COUNT")?)
                    .unwrap_or_else(default_login_max_failure_count),
                login_lock_duration_minutes: positive_u32(parsed("LOGIN_LOCK_DURATION_MINUTES")?)
                    .unwrap_or_else(default_login_lock_duration_minutes),
                cleanup_interval_minutes,
                code_retention_days: default_code_retention_days(),
            },
            captcha: CaptchaConfig {
                enabled: var("GEETEST_ENABLED").is_some_and(|s| parse_flag(&s)),
                captcha_id: var("GEETEST_ID").or_else(|| var("GEETEST_CAPTCHA_ID")),
                captcha_key: var("GEETEST_KEY").or_else(|| var("GEETEST_CAPTCHA_KEY")),
            },
            mail: MailConfig {
                smtp_host: var("SMTP_HOST"),
                smtp_port: var("SMTP_PORT")
                    .map(|s| parse_value("SMTP_PORT", &s))
                    .transpose()?,
                smtp_username: var("SMTP_USERNAME"),
                smtp_password: var("SMTP_PASSWORD"),
                smtp_implicit_tls: var("SMTP_SSL_TYPE")
                    .is_some_and(|s| s.trim().eq_ignore_ascii_case("ssl")),
                from_address: var("SYSTEM_EMAIL_ADDRESS"),
                from_name: var("SYSTEM_EMAIL_NAME"),
                log_only: var("MAIL_LOG_ONLY").is_some_and(|s| parse_flag(&s)),
            },
            rate_limit: RateLimitConfig {
                requests_per_second: var("RATE_LIMIT_REQUESTS_PER_SECOND")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_requests_per_second),
                burst: var("RATE_LIMIT_BURST")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_burst),
            },
            cors: CorsConfig {
                allowed_origins: var("CORS_ALLOWED_ORIGINS")
                    .or_else(|| var("CORS_ORIGINS"))
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        })
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name, raw.to_string()))
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn positive(value: Option<i64>) -> Option<i64> {
    value.filter(|n| *n > 0)
}

fn positive_u32(value: Option<i64>) -> Option<u32> {
    positive(value).map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/auth"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn test_environment_is_production() {
        assert!(!Environment::Development.is_production());
        assert!(!Environment::Staging.is_production());
        assert!(Environment::Production.is_production());
    }

    #[test]
    fn test_environment_is_development() {
        assert!(Environment::Development.is_development());
        assert!(!Environment::Staging.is_development());
        assert!(!Environment::Production.is_development());
    }

    #[test]
    fn test_server_address() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        };
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_defaults() {
        let config = load(&REQUIRED).unwrap();
        assert_eq!(config.app.name, "F.st");
        assert_eq!(config.app.env, Environment::Development);
        assert_eq!(config.app.admin_path, "/admin");
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.jwt.access_token_expiry, 7200);
        assert_eq!(config.jwt.refresh_token_expiry, 604_800);
        assert_eq!(config.security.register_code_expire_minutes, 60);
        assert_eq!(config.security.reset_code_expire_minutes, 15);
        assert_eq!(config.security.login_max_failure_count, 5);
        assert_eq!(config.security.login_lock_duration_minutes, 10);
        assert_eq!(config.security.cleanup_interval_minutes, 10);
        assert!(!config.captcha.is_active());
        assert!(!config.mail.has_smtp());
    }

    #[test]
    fn test_smtp_settings() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SMTP_HOST", "smtp.example.com"));
        pairs.push(("SMTP_USERNAME", "mailer@example.com"));
        pairs.push(("SMTP_SSL_TYPE", "ssl"));
        let config = load(&pairs).unwrap();
        assert!(config.mail.has_smtp());
        assert!(config.mail.smtp_implicit_tls);
        assert_eq!(config.mail.port(), 465);
        assert_eq!(config.mail.sender_address(), Some("mailer@example.com"));

        pairs.push(("SMTP_PORT", "2525"));
        pairs.push(("SYSTEM_EMAIL_ADDRESS", "no-reply@example.com"));
        let config = load(&pairs).unwrap();
        assert_eq!(config.mail.port(), 2525);
        assert_eq!(config.mail.sender_address(), Some("no-reply@example.com"));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SMTP_PORT", "smtp"));
        assert!(matches!(
            load(&pairs).unwrap_err(),
            ConfigError::InvalidValue("SMTP_PORT", _)
        ));
    }

    #[test]
    fn test_missing_required() {
        let err = load(&[("JWT_SECRET", "s")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("DATABASE_URL")));

        let err = load(&[("DATABASE_URL", "postgres://x")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("JWT_SECRET")));
    }

    #[test]
    fn test_invalid_number_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("LOGIN_MAX_FAILURE_COUNT", "five"));
        let err = load(&pairs).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("LOGIN_MAX_FAILURE_COUNT", _)));
    }

    #[test]
    fn test_non_positive_cleanup_interval_falls_back() {
        for raw in ["0", "-3"] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push(("CLEANUP_INTERVAL_MINUTES", raw));
            assert_eq!(load(&pairs).unwrap().security.cleanup_interval_minutes, 10);
        }
    }

    #[test]
    fn test_captcha_requires_flag_and_both_credentials() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("GEETEST_ENABLED", "true"));
        pairs.push(("GEETEST_CAPTCHA_ID", "id"));
        assert!(!load(&pairs).unwrap().captcha.is_active());

        pairs.push(("GEETEST_KEY", "key"));
        let config = load(&pairs).unwrap();
        assert!(config.captcha.is_active());
        assert_eq!(config.captcha.captcha_id.as_deref(), Some("id"));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("GEETEST_ID", "id"));
        pairs.push(("GEETEST_KEY", "key"));
        assert!(!load(&pairs).unwrap().captcha.is_active());
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("APP_MODE", "production"),
            ("PORT", "9000"),
            ("ADMIN_PATH", "manage/"),
            ("FRONTEND_URL", "https://app.example.com/"),
            ("CORS_ALLOWED_ORIGINS", "https://a.com, https://b.com,"),
            ("JWT_ACCESS_EXPIRE", "60"),
        ]);
        let config = load(&pairs).unwrap();
        assert!(config.app.env.is_production());
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.app.admin_path, "/manage");
        assert_eq!(config.app.frontend_url, "https://app.example.com");
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.com".to_string(), "https://b.com".to_string()]
        );
        assert_eq!(config.jwt.access_token_expiry, 60);
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_app_name(), "F.st");
        assert_eq!(default_host(), "0.0.0.0");
        assert_eq!(default_max_connections(), 20);
        assert_eq!(default_access_token_expiry(), 7200);
        assert_eq!(default_refresh_token_expiry(), 604_800);
    }
}
