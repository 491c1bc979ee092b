//! Configuration for the authority client

use std::time::Duration;

/// Configuration for connecting to a medgate token authority
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Authority base URL (e.g., "http://localhost:8081")
    pub base_url: String,

    /// Timeout for each request
    pub timeout: Duration,
}

impl AuthConfig {
    /// Create a new configuration with the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AuthConfig::new("http://localhost:8081");

        assert_eq!(config.base_url, "http://localhost:8081");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_config_strips_trailing_slash() {
        let config = AuthConfig::new("http://localhost:8081/");
        assert_eq!(config.base_url, "http://localhost:8081");
    }

    #[test]
    fn test_config_timeout() {
        let config = AuthConfig::new("http://localhost:8081").timeout(Duration::from_secs(2));
        assert_eq!(config.timeout, Duration::from_secs(2));
    }
}
