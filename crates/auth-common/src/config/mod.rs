//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, CaptchaConfig, ConfigError, CorsConfig, DatabaseConfig, Environment,
    JwtConfig, MailConfig, RateLimitConfig, SecurityConfig, ServerConfig,
};
