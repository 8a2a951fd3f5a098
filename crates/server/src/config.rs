//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPX_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SHOPX_JWT_SECRET` - HMAC secret for signing access tokens (min 32 chars, high entropy)
//!
//! ## Optional
//! - `SHOPX_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOPX_PORT` - Listen port (default: 5000)
//! - `SHOPX_JWT_ISSUER` - `iss` claim for issued tokens (default: shopx)
//! - `SHOPX_JWT_EXPIRY_MINUTES` - Access token lifetime (default: 60)
//! - `SHOPX_CORS_ORIGINS` - Comma-separated list of allowed browser origins
//! - `SHOPX_ENABLE_JOBS` - Run background jobs in this process (default: true)
//! - `LOG_FORMAT` - `json` for structured log output
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Access token settings
    pub jwt: JwtConfig,
    /// Origins allowed to call the API from a browser; empty means same-origin only
    pub cors_origins: Vec<String>,
    /// Whether this process runs the background jobs
    pub enable_jobs: bool,
    /// Emit JSON logs instead of the human-readable format
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Access token settings.
///
/// Implements `Debug` manually to redact the signing secret.
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC signing secret
    pub secret: SecretString,
    /// `iss` claim written to and required on every token
    pub issuer: String,
    /// Token lifetime in minutes
    pub expiry_minutes: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("expiry_minutes", &self.expiry_minutes)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("SHOPX_DATABASE_URL")?;
        let host = parse_env("SHOPX_HOST", "127.0.0.1")?;
        let port = parse_env("SHOPX_PORT", "5000")?;
        let jwt = JwtConfig::from_env()?;
        let cors_origins = get_optional_env("SHOPX_CORS_ORIGINS")
            .map(|value| parse_origins(&value))
            .unwrap_or_default();
        let enable_jobs = parse_env("SHOPX_ENABLE_JOBS", "true")?;
        let json_logs = get_optional_env("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json"));

        Ok(Self {
            database_url,
            host,
            port,
            jwt,
            cors_origins,
            enable_jobs,
            json_logs,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        const SECRET_VAR: &str = "SHOPX_JWT_SECRET";
        let secret = std::env::var(SECRET_VAR)
            .map_err(|_| ConfigError::MissingEnvVar(SECRET_VAR.to_owned()))?;
        check_signing_secret(&secret)
            .map_err(|reason| ConfigError::InsecureSecret(SECRET_VAR.to_owned(), reason))?;

        let expiry_minutes: i64 = parse_env("SHOPX_JWT_EXPIRY_MINUTES", "60")?;
        if expiry_minutes <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPX_JWT_EXPIRY_MINUTES".to_owned(),
                "must be positive".to_owned(),
            ));
        }

        Ok(Self {
            secret: SecretString::from(secret),
            issuer: env_or("SHOPX_JWT_ISSUER", "shopx"),
            expiry_minutes,
        })
    }
}

/// `SHOPX_DATABASE_URL`, or the conventional `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    [primary_key, "DATABASE_URL"]
        .into_iter()
        .find_map(|key| std::env::var(key).ok())
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_owned())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_or(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
}

/// Split a comma-separated origin list, dropping blanks and trailing slashes.
fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Reject signing secrets that are short, look like a placeholder, or are
/// too repetitive to be random. The error is the reason.
fn check_signing_secret(secret: &str) -> Result<(), String> {
    let length = secret.chars().count();
    if length < MIN_JWT_SECRET_LENGTH {
        return Err(format!(
            "must be at least {MIN_JWT_SECRET_LENGTH} characters (got {length})"
        ));
    }

    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(format!("appears to be a placeholder (contains '{pattern}')"));
    }

    let entropy = bits_per_char(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}); generate it randomly"
        ));
    }
    Ok(())
}

/// Shannon entropy of `s` in bits per character.
fn bits_per_char(s: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }
    let total = counts.values().sum::<u32>();
    if total == 0 {
        return 0.0;
    }
    let total = f64::from(total);
    counts
        .values()
        .map(|&n| {
            let p = f64::from(n) / total;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_per_char() {
        assert!(bits_per_char("").abs() < f64::EPSILON);
        assert!((bits_per_char("ab") - 1.0).abs() < 0.01);
        assert!(bits_per_char("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_signing_secret_too_short() {
        let reason = check_signing_secret("k9$Lm2").unwrap_err();
        assert!(reason.contains("at least 32"));
    }

    #[test]
    fn test_signing_secret_placeholder() {
        let reason = check_signing_secret("changeme-jwt-signing-key-0123456789").unwrap_err();
        assert!(reason.contains("placeholder"));
    }

    #[test]
    fn test_signing_secret_low_entropy() {
        let reason = check_signing_secret(&"ab".repeat(20)).unwrap_err();
        assert!(reason.contains("entropy"));
    }

    #[test]
    fn test_signing_secret_accepted() {
        assert!(check_signing_secret("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6!").is_ok());
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" https://shop.example.vn/ ,, http://localhost:5173"),
            vec!["https://shop.example.vn", "http://localhost:5173"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/shopx"),
            host: "0.0.0.0".parse().unwrap(),
            port: 5000,
            jwt: JwtConfig {
                secret: SecretString::from("x".repeat(32)),
                issuer: "shopx".to_string(),
                expiry_minutes: 60,
            },
            cors_origins: vec![],
            enable_jobs: false,
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "0.0.0.0");
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_jwt_config_debug_redacts_secret() {
        let config = JwtConfig {
            secret: SecretString::from("super_sensitive_signing_key_value"),
            issuer: "shopx".to_string(),
            expiry_minutes: 30,
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("shopx"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_sensitive_signing_key_value"));
    }
}
