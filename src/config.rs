use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use zeroize::{Zeroize, Zeroizing};

/// Upper bound for `SESSION_DURATION_DAYS` (ten years).
pub const MAX_SESSION_DURATION_DAYS: i64 = 3650;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database. `None` selects the in-memory user store.
    pub database_url: Option<String>,
    /// The duration of a session in days.
    pub session_duration_days: i64,
    /// The symmetric key used to sign session tokens.
    pub secret_key: Zeroizing<Vec<u8>>,
    /// Whether the process runs in production (enables `Secure` cookies).
    pub production: bool,
    /// Whether authenticated page requests renew the session cookie.
    pub sliding_sessions: bool,
    /// The address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// The directory static pages are served from.
    pub public_dir: PathBuf,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`. A missing `SECRET_KEY` is an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Creates a new `Config` from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut secret = lookup("SECRET_KEY")
            .context("SECRET_KEY must be set (generate with: openssl rand -base64 32)")?;

        if secret.trim().is_empty() {
            secret.zeroize();
            anyhow::bail!("SECRET_KEY must not be empty");
        }

        let secret_key = Zeroizing::new(secret.as_bytes().to_vec());
        secret.zeroize();

        let session_duration_days: i64 = lookup("SESSION_DURATION_DAYS")
            .unwrap_or_else(|| "7".to_string())
            .parse()
            .context("Invalid SESSION_DURATION_DAYS")?;

        if session_duration_days <= 0 {
            anyhow::bail!("SESSION_DURATION_DAYS must be positive");
        }

        if session_duration_days > MAX_SESSION_DURATION_DAYS {
            anyhow::bail!(
                "SESSION_DURATION_DAYS must be at most {}",
                MAX_SESSION_DURATION_DAYS
            );
        }

        let production = lookup("APP_ENV")
            .unwrap_or_else(|| "development".to_string())
            == "production";

        let sliding_sessions = lookup("SESSION_SLIDING")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .context("Invalid BIND_ADDR")?;

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            session_duration_days,
            secret_key,
            production,
            sliding_sessions,
            bind_addr,
            public_dir: lookup("PUBLIC_DIR")
                .unwrap_or_else(|| "files/public".to_string())
                .into(),
            cors_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn missing_secret_is_fatal() {
        let result = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")]));
        assert!(result.is_err());
    }

    #[test]
    fn blank_secret_is_fatal() {
        let result = Config::from_lookup(lookup_from(&[("SECRET_KEY", "   ")]));
        assert!(result.is_err());
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup_from(&[("SECRET_KEY", "s3cret")])).unwrap();
        assert_eq!(config.session_duration_days, 7);
        assert!(!config.production);
        assert!(!config.sliding_sessions);
        assert!(config.database_url.is_none());
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.cors_origins, vec!["http://localhost:3000".to_string()]);
        assert_eq!(config.secret_key.as_slice(), b"s3cret");
    }

    #[test]
    fn production_and_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("SECRET_KEY", "s3cret"),
            ("APP_ENV", "production"),
            ("SESSION_SLIDING", "true"),
            ("SESSION_DURATION_DAYS", "14"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
        ]))
        .unwrap();
        assert!(config.production);
        assert!(config.sliding_sessions);
        assert_eq!(config.session_duration_days, 14);
        assert_eq!(config.cors_origins.len(), 2);
    }

    #[test]
    fn rejects_non_positive_duration() {
        let result = Config::from_lookup(lookup_from(&[
            ("SECRET_KEY", "s3cret"),
            ("SESSION_DURATION_DAYS", "0"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_out_of_range_duration() {
        for days in ["100000000", "200000000000", "99999999999999999999"] {
            let result = Config::from_lookup(lookup_from(&[
                ("SECRET_KEY", "s3cret"),
                ("SESSION_DURATION_DAYS", days),
            ]));
            assert!(result.is_err(), "{} days should be rejected", days);
        }

        let config = Config::from_lookup(lookup_from(&[
            ("SECRET_KEY", "s3cret"),
            ("SESSION_DURATION_DAYS", "3650"),
        ]))
        .unwrap();
        assert_eq!(config.session_duration_days, MAX_SESSION_DURATION_DAYS);
    }
}
