//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;

use crate::db::DbConfig;

/// Development-only signing secret. Refused when `ENVIRONMENT=production`.
pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

/// Origin of the bundled frontend dev server.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// Credential lifetime in seconds
pub const TOKEN_TTL_SECS: i64 = 60 * 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub allowed_origins: Vec<String>,
    /// Crate log level used when `RUST_LOG` is unset
    pub log_level: String,
    pub db: DbConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5000,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_secs: TOKEN_TTL_SECS,
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            log_level: "debug".to_string(),
            db: DbConfig {
                url: None,
                ..DbConfig::default()
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let jwt_secret = std::env::var("JWT_SECRET")
            .or_else(|_| std::env::var("ACCESS_TOKEN_SECRET"))
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.jwt_secret);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|s| parse_origins(&s))
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.allowed_origins);

        let environment = std::env::var("ENVIRONMENT").unwrap_or(defaults.environment);
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| {
            if environment == "production" {
                "info".to_string()
            } else {
                defaults.log_level
            }
        });

        Self {
            environment,
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            jwt_secret,
            token_ttl_secs: defaults.token_ttl_secs,
            allowed_origins,
            log_level,
            db: DbConfig::default(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid HOST/PORT configuration: {}", e))
    }

    /// Refuse to start in production with the insecure default secret.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.is_production() && self.jwt_secret == DEFAULT_JWT_SECRET {
            anyhow::bail!(
                "JWT_SECRET must be set to a secure, unique value in production. \
                 Refusing to start with the default secret."
            );
        }
        Ok(())
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_trims_and_skips_blanks() {
        assert_eq!(
            parse_origins(" http://a.io, ,http://b.io "),
            vec!["http://a.io".to_string(), "http://b.io".to_string()]
        );
    }

    #[test]
    fn test_default_config_allows_frontend_origin() {
        let config = AppConfig::default();
        assert_eq!(config.allowed_origins, vec![DEFAULT_ALLOWED_ORIGIN.to_string()]);
        assert_eq!(config.token_ttl_secs, 3600);
        assert!(config.bind_addr().is_ok());
    }

    #[test]
    fn test_production_rejects_default_secret() {
        let config = AppConfig {
            environment: "production".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            jwt_secret: "a-real-secret".to_string(),
            ..config
        };
        assert!(config.validate().is_ok());
    }
}
