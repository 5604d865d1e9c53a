// Client configuration for the code-execution backend

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub run_path: String,
    pub submit_path: String,
    pub mcq_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            run_path: "/api/code/run".to_string(),
            submit_path: "/api/code/submit".to_string(),
            mcq_path: "/api/code/submit-mcq".to_string(),
        }
    }
}

impl ClientConfig {
    /// Build from `CODELAB_API_URL` and `CODELAB_TIMEOUT_MS`.
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_base_url = std::env::var("CODELAB_API_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_base_url);

        let request_timeout_ms = std::env::var("CODELAB_TIMEOUT_MS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(defaults.request_timeout_ms);

        Self {
            api_base_url,
            request_timeout_ms,
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn run_url(&self) -> String {
        format!("{}{}", self.api_base_url, self.run_path)
    }

    pub fn submit_url(&self) -> String {
        format!("{}{}", self.api_base_url, self.submit_path)
    }

    pub fn mcq_url(&self) -> String {
        format!("{}{}", self.api_base_url, self.mcq_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_urls() {
        let config = ClientConfig::default();
        assert_eq!(config.run_url(), "http://127.0.0.1:5000/api/code/run");
        assert_eq!(config.submit_url(), "http://127.0.0.1:5000/api/code/submit");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_with_base_url_strips_trailing_slash() {
        let config = ClientConfig::default().with_base_url("http://judge.local:8080/");
        assert_eq!(config.mcq_url(), "http://judge.local:8080/api/code/submit-mcq");
    }
}
