//! Process settings read from the environment (and `.env`)

use std::net::SocketAddr;
use std::time::Duration;

use auth::AuthConfig;
use platform::config::{
    ConfigError, env_bool, env_list, env_or, env_parse, env_required, env_secret_32,
};

const DEFAULT_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    pub auth: AuthConfig,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = AuthConfig::default();

        let email_token_secret = match env_or("EMAIL_TOKEN_SECRET", "") {
            secret if !secret.is_empty() => secret.into_bytes(),
            _ => env_secret_32("EMAIL_TOKEN_SECRET")?.to_vec(),
        };

        let mut cookie = defaults.cookie.clone();
        cookie.secure = env_bool("COOKIE_SECURE", !cfg!(debug_assertions))?;

        let auth = AuthConfig {
            cookie,
            session_secret: env_secret_32("AUTH_SESSION_SECRET")?,
            email_token_secret,
            email_token_ttl: Duration::from_secs(env_parse(
                "EMAIL_TOKEN_TTL_SECS",
                defaults.email_token_ttl.as_secs(),
            )?),
            app_base_url: env_or("APP_BASE_URL", &defaults.app_base_url),
            password_pepper: Some(env_or("PASSWORD_PEPPER", ""))
                .filter(|p| !p.is_empty())
                .map(String::into_bytes),
            ..defaults
        };

        Ok(Self {
            database_url: env_required("DATABASE_URL")?,
            database_max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 5)?,
            bind_addr: env_parse("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 31113)))?,
            frontend_origins: env_list("FRONTEND_ORIGINS", DEFAULT_ORIGINS),
            auth,
        })
    }
}
