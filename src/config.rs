// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Agent configuration

use std::time::Duration;

use crate::http::DEFAULT_USER_AGENT;

/// Default number of redirect hops followed per request
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

/// Agent configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// User agent string
    pub user_agent: String,
    /// Default timeout for each exchange with the transport
    pub timeout: Duration,
    /// Redirect budget used when a request does not override it
    pub max_redirects: u32,
    /// Accept invalid TLS certificates
    pub accept_invalid_certs: bool,
    /// Proxy URL
    pub proxy: Option<String>,
    /// Headers sent with every request of the agent
    pub default_headers: Vec<(String, String)>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            accept_invalid_certs: false,
            proxy: None,
            default_headers: vec![],
        }
    }
}

impl AgentConfig {
    /// Create a new agent config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the default redirect budget (0 = never follow)
    pub fn max_redirects(mut self, max: u32) -> Self {
        self.max_redirects = max;
        self
    }

    /// Accept invalid TLS certificates
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Set proxy
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Add default header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(config.default_headers.is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = AgentConfig::new()
            .user_agent("Custom Agent")
            .timeout(Duration::from_secs(60))
            .max_redirects(0)
            .header("x-trace", "1");

        assert_eq!(config.user_agent, "Custom Agent");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_redirects, 0);
        assert_eq!(config.default_headers, vec![("x-trace".to_string(), "1".to_string())]);
    }
}
