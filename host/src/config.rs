/*
 * Responsibility
 * - host 用の環境変数読み込み (PORT, APP_ENV, PUBLIC_BASE_URL)
 * - CAS 設定は casauth::CasConfig に委譲
 */
use std::net::SocketAddr;
use std::str::FromStr;

use casauth::{CasConfig, ConfigError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    // Absolute base URL as seen by browsers (e.g. https://app.example.org).
    // When unset, the request URL is rebuilt from X-Forwarded-* / Host.
    pub public_base_url: Option<String>,
    pub cas: CasConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let public_base_url = match std::env::var("PUBLIC_BASE_URL") {
            Ok(v) if !v.trim().is_empty() => {
                let v = v.trim().trim_end_matches('/').to_string();
                url::Url::parse(&v).map_err(|_| ConfigError::Invalid("PUBLIC_BASE_URL"))?;
                Some(v)
            }
            _ => None,
        };

        let cas = CasConfig::from_env()?;

        Ok(Self {
            addr,
            app_env,
            public_base_url,
            cas,
        })
    }
}
