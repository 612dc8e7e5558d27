//! Server configuration read from the environment

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chrono::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite:pdf-margins.db?mode=rwc";
pub const DEFAULT_CORS_ORIGINS: &[&str] =
    &["http://localhost:4200", "https://pdfmargin.beatsacademy.in"];
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;

/// Settings for the HTTP service
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind: SocketAddr,
    /// sqlx connection string for the user store
    pub database_url: String,
    /// Origins allowed to call the API with credentials
    pub cors_origins: Vec<String>,
    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,
    /// Age after which a session stops blocking a new login
    pub session_ttl: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            session_ttl: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name} has an invalid value: {value}")))
}

/// Split a comma-separated origin list, dropping blanks and trailing slashes
pub fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

impl ServerConfig {
    /// Load settings from the process environment (after `.env`, if present)
    ///
    /// Recognised variables: `HOST`, `PORT`, `DATABASE_URL`, `CORS_ORIGINS`,
    /// `MAX_UPLOAD_MB`, `SESSION_TTL_MINUTES`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.bind.set_ip(parse_var("HOST", &host)?);
        }
        if let Some(port) = lookup("PORT") {
            config.bind.set_port(parse_var("PORT", &port)?);
        }
        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            config.cors_origins = parse_origins(&origins);
        }
        if let Some(mb) = lookup("MAX_UPLOAD_MB") {
            let mb: usize = parse_var("MAX_UPLOAD_MB", &mb)?;
            config.max_upload_bytes = mb
                .checked_mul(1024 * 1024)
                .ok_or_else(|| Error::Config(format!("MAX_UPLOAD_MB is too large: {mb}")))?;
        }
        if let Some(minutes) = lookup("SESSION_TTL_MINUTES") {
            let minutes: i64 = parse_var("SESSION_TTL_MINUTES", &minutes)?;
            let ttl = Duration::try_minutes(minutes).ok_or_else(|| {
                Error::Config(format!("SESSION_TTL_MINUTES is out of range: {minutes}"))
            })?;
            config.session_ttl = Some(ttl);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind.port(), 8000);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
        assert!(config.session_ttl.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9001"),
            ("CORS_ORIGINS", "https://a.example/, ,https://b.example"),
            ("MAX_UPLOAD_MB", "2"),
            ("SESSION_TTL_MINUTES", "30"),
        ]))
        .unwrap();

        assert_eq!(config.bind, "127.0.0.1:9001".parse::<SocketAddr>().unwrap());
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.max_upload_bytes, 2 * 1024 * 1024);
        assert_eq!(config.session_ttl, Some(Duration::minutes(30)));
    }

    #[test]
    fn test_invalid_port() {
        let result = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_out_of_range_sizes_are_rejected() {
        let huge_upload = usize::MAX.to_string();
        let result = ServerConfig::from_lookup(lookup(&[("MAX_UPLOAD_MB", huge_upload.as_str())]));
        assert!(matches!(result, Err(Error::Config(_))));

        let huge_ttl = i64::MAX.to_string();
        let result = ServerConfig::from_lookup(lookup(&[("SESSION_TTL_MINUTES", huge_ttl.as_str())]));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
