use crate::errors::{AppError, Result};
use url::Url;

pub const MAX_QUERY_LEN: usize = 500;
pub const MAX_LIMIT: i64 = 100;
/// Longest track duration, in seconds, a lyrics lookup accepts.
pub const MAX_DURATION_SECS: i64 = 86_400;

pub struct InputValidator;

impl InputValidator {
    pub fn new() -> Self {
        Self
    }

    /// Returns the trimmed value of a required string field.
    pub fn require_text(&self, field: &str, value: Option<&str>, label: &str) -> Result<String> {
        match value.map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Err(AppError::validation(field, format!("{} is required", label))),
        }
    }

    pub fn validate_search_query(&self, query: Option<&str>) -> Result<String> {
        let query = self.require_text("query", query, "Query")?;

        if query.chars().count() > MAX_QUERY_LEN {
            return Err(AppError::validation(
                "query",
                format!("Search query too long (max {} characters)", MAX_QUERY_LEN),
            ));
        }

        Ok(query)
    }

    pub fn validate_limit(&self, limit: Option<i64>, default: usize) -> Result<usize> {
        match limit {
            None => Ok(default),
            Some(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(limit as usize),
            Some(limit) => Err(AppError::validation(
                "limit",
                format!("Limit must be between 1 and {}, got {}", MAX_LIMIT, limit),
            )),
        }
    }

    /// A non-positive duration means "unknown".
    pub fn validate_duration(&self, duration: Option<i64>) -> Result<Option<u64>> {
        match duration {
            Some(seconds) if seconds > MAX_DURATION_SECS => Err(AppError::validation(
                "duration",
                format!("Duration must be at most {} seconds, got {}", MAX_DURATION_SECS, seconds),
            )),
            Some(seconds) if seconds > 0 => Ok(Some(seconds as u64)),
            _ => Ok(None),
        }
    }

    pub fn validate_proxy_url(&self, proxy: &str) -> Result<()> {
        if !proxy.starts_with("http://")
            && !proxy.starts_with("https://")
            && !proxy.starts_with("socks5://")
        {
            return Err(AppError::validation(
                "proxy",
                "Proxy URL must start with http://, https://, or socks5://",
            ));
        }

        let parsed = Url::parse(proxy)
            .map_err(|e| AppError::validation("proxy", format!("Invalid proxy URL: {}", e)))?;

        if parsed.host_str().is_none() {
            return Err(AppError::validation("proxy", "Proxy URL must have a host"));
        }

        Ok(())
    }

    pub fn validate_country(&self, country: &str) -> Result<String> {
        let country = country.trim();
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AppError::validation(
                "country",
                format!("Country must be a two-letter code, got '{}'", country),
            ));
        }
        Ok(country.to_ascii_uppercase())
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new()
    }
}
