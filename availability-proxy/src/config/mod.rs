use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;
use std::net::IpAddr;

pub const DEFAULT_SMOOBU_BASE_URL: &str = "https://login.smoobu.com";

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub smoobu: SmoobuConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub log: LogConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SmoobuConfig {
    pub api_key: Secret<String>,
    pub base_url: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RateLimitConfig {
    /// Requests allowed per IP within one window.
    pub max_requests: u32,
    pub window_seconds: u64,
    /// Peers allowed to set `X-Forwarded-For`. Empty means the socket peer
    /// address is always the caller.
    pub trusted_proxies: Vec<IpAddr>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct LogConfig {
    pub level: String,
    /// Append-only JSON log file, in addition to stdout.
    pub file: Option<String>,
}

fn parse_trusted_proxies(raw: &str) -> Result<Vec<IpAddr>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<IpAddr>()
                .map_err(|e| anyhow!("TRUSTED_PROXIES entry '{}' is not an IP address: {}", s, e))
        })
        .collect()
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches('/').to_string())
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse()
            .map_err(|e| anyhow!("PORT must be a valid port number: {}", e))?;

        let api_key = env::var("SMOOBU_API_KEY")
            .map_err(|_| anyhow!("SMOOBU_API_KEY must be set"))?;
        if api_key.trim().is_empty() {
            return Err(anyhow!("SMOOBU_API_KEY must not be empty"));
        }
        let base_url = env::var("SMOOBU_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_SMOOBU_BASE_URL.to_string());

        let allowed_origins = parse_origins(
            &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".to_string()),
        );

        let max_requests = env::var("RATE_LIMIT_MAX_REQUESTS")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .map_err(|e| anyhow!("RATE_LIMIT_MAX_REQUESTS must be a positive integer: {}", e))?;
        let window_seconds = env::var("RATE_LIMIT_WINDOW_SECONDS")
            .unwrap_or_else(|_| "900".to_string())
            .parse()
            .map_err(|e| anyhow!("RATE_LIMIT_WINDOW_SECONDS must be a positive integer: {}", e))?;

        let trusted_proxies =
            parse_trusted_proxies(&env::var("TRUSTED_PROXIES").unwrap_or_default())?;

        let level =
            env::var("RUST_LOG").unwrap_or_else(|_| "info,availability_proxy=debug".to_string());
        let file = env::var("LOG_FILE").ok().filter(|s| !s.is_empty());

        Ok(Self {
            server: ServerConfig { host, port },
            smoobu: SmoobuConfig {
                api_key: Secret::new(api_key),
                base_url: base_url.trim_end_matches('/').to_string(),
            },
            cors: CorsConfig { allowed_origins },
            rate_limit: RateLimitConfig {
                max_requests,
                window_seconds,
                trusted_proxies,
            },
            log: LogConfig { level, file },
            service_name: "availability-proxy".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trusted_proxies_are_parsed_strictly() {
        assert!(parse_trusted_proxies("").unwrap().is_empty());
        assert_eq!(
            parse_trusted_proxies("127.0.0.1, ::1").unwrap(),
            vec![
                "127.0.0.1".parse::<IpAddr>().unwrap(),
                "::1".parse::<IpAddr>().unwrap()
            ]
        );
        assert!(parse_trusted_proxies("10.0.0.0/8").is_err());
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let origins = parse_origins(" http://localhost:5173/ ,https://guesthouse.example,, ");
        assert_eq!(
            origins,
            vec![
                "http://localhost:5173".to_string(),
                "https://guesthouse.example".to_string()
            ]
        );
    }
}
