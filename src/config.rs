use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://canvas.instructure.com/api/v1";
pub const DEFAULT_LOG_FILE: &str = "canvas_feedback_uploader.log";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub access_token: String,
    pub log_file: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_token = lookup("CANVAS_ACCESS_TOKEN").context(
            "CANVAS_ACCESS_TOKEN not found. Please set it in .env file or environment",
        )?;

        if access_token.trim().is_empty() {
            anyhow::bail!("CANVAS_ACCESS_TOKEN is empty");
        }

        let api_url = lookup("CANVAS_API_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = api_url.trim().trim_end_matches('/').to_string();

        url::Url::parse(&api_url)
            .with_context(|| format!("CANVAS_API_URL is not a valid URL: {}", api_url))?;

        let log_file = lookup("CANVAS_LOG_FILE")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

        Ok(Config {
            api_url,
            access_token,
            log_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_only_token_set() {
        let config = Config::from_lookup(lookup_from(&[("CANVAS_ACCESS_TOKEN", "abc")])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.access_token, "abc");
        assert_eq!(config.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("CANVAS_ACCESS_TOKEN"));
    }

    #[test]
    fn test_blank_token_is_an_error() {
        assert!(Config::from_lookup(lookup_from(&[("CANVAS_ACCESS_TOKEN", "  ")])).is_err());
    }

    #[test]
    fn test_api_url_trailing_slash_is_trimmed() {
        let config = Config::from_lookup(lookup_from(&[
            ("CANVAS_ACCESS_TOKEN", "abc"),
            ("CANVAS_API_URL", "https://school.instructure.com/api/v1/"),
            ("CANVAS_LOG_FILE", "/tmp/uploader.log"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://school.instructure.com/api/v1");
        assert_eq!(config.log_file, PathBuf::from("/tmp/uploader.log"));
    }

    #[test]
    fn test_invalid_api_url_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            ("CANVAS_ACCESS_TOKEN", "abc"),
            ("CANVAS_API_URL", "not a url"),
        ]));
        assert!(result.is_err());
    }
}
