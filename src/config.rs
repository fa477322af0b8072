//! API endpoint configuration.
//!
//! The base URL comes from `--api-url`, else `MODEL_API_URL` (which may be set in
//! a `.env` file), else a local default. Clap folds the three together; this
//! module only checks the result.

use reqwest::Url;

use crate::error::AppError;

/// Environment variable holding the backend base URL.
pub const API_URL_ENV: &str = "MODEL_API_URL";

/// Backend address used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "DECK_LOG";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
}

impl ApiConfig {
    /// Parse and check a base URL.
    pub fn new(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::input(format!(
                "Empty API URL. Set {API_URL_ENV} or pass --api-url."
            )));
        }
        let base_url = Url::parse(trimmed)
            .map_err(|e| AppError::input(format!("Invalid API URL '{trimmed}': {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(AppError::input(format!(
                "API URL must use http or https (got '{}').",
                base_url.scheme()
            )));
        }
        if base_url.cannot_be_a_base() {
            return Err(AppError::input(format!("API URL '{trimmed}' cannot be a base URL.")));
        }
        Ok(Self { base_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_urls_with_prefix() {
        let cfg = ApiConfig::new(" https://example.com/api/ ").unwrap();
        assert_eq!(cfg.base_url.as_str(), "https://example.com/api/");
    }

    #[test]
    fn rejects_other_schemes() {
        let err = ApiConfig::new("ftp://example.com").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn default_url_is_valid() {
        let cfg = ApiConfig::new(DEFAULT_API_URL).unwrap();
        assert_eq!(cfg.base_url.as_str(), "http://127.0.0.1:8000/");
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(ApiConfig::new("  ").is_err());
        assert!(ApiConfig::new("not a url").is_err());
    }
}
