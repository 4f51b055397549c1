/*
 * Responsibility
 * - CAS 関連の環境変数の読み込み (CAS_SERVER_URL, timeout, User-Agent)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 * - reqwest::Client の組み立て (timeout 付き)
 */
use std::fmt;
use std::time::Duration;

const DEFAULT_VALIDATE_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// HTTP client settings for `serviceValidate` requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    // Whole request, including reading the body.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_VALIDATE_TIMEOUT_SECONDS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Build a reqwest Client from this configuration.
    ///
    /// Certificate validation is always on (default root store).
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(&self.user_agent)
            .build()
    }

    fn from_env() -> Self {
        let defaults = Self::default();

        let timeout = std::env::var("CAS_VALIDATE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let connect_timeout = std::env::var("CAS_CONNECT_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.connect_timeout);

        let user_agent = std::env::var("CAS_USER_AGENT")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.user_agent);

        Self {
            timeout,
            connect_timeout,
            user_agent,
        }
    }
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// CAS server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasConfig {
    // Base URL without trailing slash, e.g. https://cas.example.org/cas
    pub server_url: String,
    pub client: ClientConfig,
}

impl CasConfig {
    /// Config for `server_url` with default client settings.
    pub fn new(server_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            server_url: parse_server_url(server_url)?,
            client: ClientConfig::default(),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let server_url =
            std::env::var("CAS_SERVER_URL").map_err(|_| ConfigError::Missing("CAS_SERVER_URL"))?;

        Ok(Self {
            server_url: parse_server_url(&server_url)?,
            client: ClientConfig::from_env(),
        })
    }
}

fn parse_server_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');

    let url = url::Url::parse(trimmed).map_err(|_| ConfigError::Invalid("CAS_SERVER_URL"))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::Invalid("CAS_SERVER_URL"));
    }
    // query/fragment would end up in front of /serviceValidate
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::Invalid("CAS_SERVER_URL"));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_base_url_and_drops_trailing_slash() {
        let config = CasConfig::new("https://cas.example.org/cas/").unwrap();
        assert_eq!(config.server_url, "https://cas.example.org/cas");
        assert_eq!(config.client, ClientConfig::default());
    }

    #[test]
    fn rejects_unusable_server_urls() {
        for raw in [
            "",
            "cas.example.org",
            "ftp://cas.example.org",
            "https://cas.example.org/cas?x=1",
            "https://cas.example.org/#login",
        ] {
            assert_eq!(
                CasConfig::new(raw),
                Err(ConfigError::Invalid("CAS_SERVER_URL")),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn default_client_has_bounded_timeouts() {
        let client = ClientConfig::default();
        assert_eq!(client.timeout, Duration::from_secs(10));
        assert_eq!(client.connect_timeout, Duration::from_secs(5));
        assert!(client.user_agent.starts_with("casauth/"));
        assert!(client.build_client().is_ok());
    }
}
