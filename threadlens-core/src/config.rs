use std::env;

use crate::client::ThreadClient;
use crate::error::{LensError, Result};

pub const DEFAULT_PER_PAGE: u32 = 200;
pub const DEFAULT_CONCURRENCY: usize = 6;

/// Where requests go and how they authenticate. An unset token means ambient
/// session credentials; an unset host means the hosting page's origin, which
/// a detached front-end cannot supply and must therefore configure.
#[derive(Debug, Clone, Default)]
pub struct HostConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
}

impl HostConfig {
    /// Precedence:
    /// 1) explicit overrides (CLI flags)
    /// 2) MM_HOST / MM_TOKEN environment
    pub fn from_env() -> Self {
        Self {
            base_url: env_non_empty("MM_HOST"),
            token: env_non_empty("MM_TOKEN"),
        }
    }

    pub fn with_overrides(mut self, base_url: Option<String>, token: Option<String>) -> Self {
        if let Some(base_url) = base_url {
            self.base_url = Some(base_url);
        }
        if let Some(token) = token {
            self.token = Some(token);
        }
        self
    }

    pub fn into_client(self) -> Result<ThreadClient> {
        let base_url = self.base_url.ok_or(LensError::MissingHost)?;
        let client = ThreadClient::new(base_url)?;
        Ok(match self.token {
            Some(token) => client.with_token(token),
            None => client,
        })
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::HostConfig;
    use crate::error::LensError;

    #[test]
    fn overrides_replace_config_values() {
        let config = HostConfig {
            base_url: Some("https://a.example".to_string()),
            token: None,
        }
        .with_overrides(Some("https://b.example".to_string()), Some("t".to_string()));

        assert_eq!(config.base_url.as_deref(), Some("https://b.example"));
        assert_eq!(config.token.as_deref(), Some("t"));
    }

    #[test]
    fn missing_host_is_a_config_error() {
        let err = HostConfig::default()
            .into_client()
            .expect_err("must require a host");
        assert!(matches!(err, LensError::MissingHost));
    }

    #[test]
    fn client_strips_trailing_slash() {
        let client = HostConfig {
            base_url: Some("https://chat.example.com/".to_string()),
            token: None,
        }
        .into_client()
        .expect("client");
        assert_eq!(client.base_url(), "https://chat.example.com");
    }
}
