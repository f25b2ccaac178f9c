//! Relay configuration, resolved once at startup and injected into the router.

use crate::removal::{self, BackgroundRemover, DEFAULT_ENDPOINT};
use std::net::SocketAddr;
use std::sync::Arc;

/// remove.bg rejects uploads above 12 MB.
pub const DEFAULT_BODY_LIMIT: usize = 12 * 1024 * 1024;

pub const API_KEY_ENV: &str = "REMOVEBG_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub addr: SocketAddr,
    /// Upstream credential. `None` means every upload gets the fixed
    /// missing-key error.
    pub api_key: Option<String>,
    pub upstream_url: String,
    pub body_limit: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            api_key: None,
            upstream_url: DEFAULT_ENDPOINT.to_string(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl RelayConfig {
    /// Blank keys count as missing.
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn remover(&self) -> Option<Arc<dyn BackgroundRemover>> {
        self.api_key
            .as_deref()
            .map(|key| removal::create_default_remover(key, &self.upstream_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_key_is_missing() {
        let config = RelayConfig::default().with_api_key(Some("   ".into()));
        assert!(!config.has_api_key());
        assert!(config.remover().is_none());
    }

    #[test]
    fn test_key_is_trimmed() {
        let config = RelayConfig::default().with_api_key(Some(" abc \n".into()));
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert!(config.remover().is_some());
    }

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.upstream_url, DEFAULT_ENDPOINT);
        assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT);
        assert_eq!(config.addr.port(), 3000);
    }
}
