//! Client configuration.
//!
//! Everything is read from `SMARTPARKING_*` environment variables (a `.env`
//! file is loaded first when present). Only the API base URL is required.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use smartparking_auth::{AuthRoutes, TokenKeys};

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const PAGE_SIZE_OPTIONS: [u32; 5] = [5, 10, 25, 50, 100];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{var} is not a valid http(s) URL: {reason}")]
    InvalidUrl { var: &'static str, reason: String },

    #[error("{var} has invalid value `{value}`")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Gateway base URL, without trailing slash (e.g. `http://host:8080/api`).
    pub api_url: String,
    /// Auth service base URL; requests under it also carry the bearer token.
    pub auth_service_url: String,
    pub token_keys: TokenKeys,
    pub http_timeout: Duration,
    /// Raise guard and client traces from `debug` to `info`.
    pub debug: bool,
    pub default_page_size: u32,
    pub page_size_options: Vec<u32>,
    pub auth_routes: AuthRoutes,
}

impl ClientConfig {
    /// Defaults around `api_url`; the auth service is assumed to share it.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        let api_url = parse_base_url("SMARTPARKING_API_URL", api_url)?;
        Ok(Self {
            auth_service_url: api_url.clone(),
            api_url,
            token_keys: TokenKeys::default(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            debug: false,
            default_page_size: DEFAULT_PAGE_SIZE,
            page_size_options: PAGE_SIZE_OPTIONS.to_vec(),
            auth_routes: AuthRoutes::default(),
        })
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if it exists
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = var("SMARTPARKING_API_URL").ok_or(ConfigError::Missing("SMARTPARKING_API_URL"))?;
        let mut config = Self::new(&api_url)?;

        if let Some(url) = var("SMARTPARKING_AUTH_SERVICE_URL") {
            config.auth_service_url = parse_base_url("SMARTPARKING_AUTH_SERVICE_URL", &url)?;
        }
        if let Some(key) = var("SMARTPARKING_TOKEN_KEY") {
            config.token_keys.access = key;
        }
        if let Some(key) = var("SMARTPARKING_REFRESH_TOKEN_KEY") {
            config.token_keys.refresh = key;
        }
        if let Some(ms) = var("SMARTPARKING_HTTP_TIMEOUT_MS") {
            config.http_timeout = Duration::from_millis(parse_number("SMARTPARKING_HTTP_TIMEOUT_MS", &ms)?);
        }
        if let Some(flag) = var("SMARTPARKING_DEBUG") {
            config.debug = parse_flag("SMARTPARKING_DEBUG", &flag)?;
        }
        if let Some(size) = var("SMARTPARKING_DEFAULT_PAGE_SIZE") {
            config.default_page_size = parse_number("SMARTPARKING_DEFAULT_PAGE_SIZE", &size)?;
        }
        if let Some(options) = var("SMARTPARKING_PAGE_SIZE_OPTIONS") {
            config.page_size_options = options
                .split(',')
                .map(|s| parse_number("SMARTPARKING_PAGE_SIZE_OPTIONS", s.trim()))
                .collect::<Result<_, _>>()?;
        }
        if let Some(path) = var("SMARTPARKING_LOGIN_PATH") {
            config.auth_routes.login = path;
        }
        if let Some(path) = var("SMARTPARKING_DASHBOARD_PATH") {
            config.auth_routes.dashboard = path;
        }

        if config.default_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                var: "SMARTPARKING_DEFAULT_PAGE_SIZE",
                value: "0".to_string(),
            });
        }

        Ok(config)
    }

    /// Whether `url` targets one of the configured backends.
    pub fn is_api_url(&self, url: &str) -> bool {
        url.starts_with(&self.api_url) || url.starts_with(&self.auth_service_url)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}

fn parse_base_url(var: &'static str, raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        var,
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            var,
            reason: format!("unsupported scheme `{}`", url.scheme()),
        });
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn parse_number<N: core::str::FromStr>(var: &'static str, raw: &str) -> Result<N, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: raw.to_string(),
    })
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: raw.to_string(),
        }),
    }
}
