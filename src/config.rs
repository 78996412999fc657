use crate::currency::Locale;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:1337/api";
pub const DEFAULT_RATES_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";

/// Runtime settings, read from the environment (and `.env` if present)
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the CMS REST API
    pub api_url: String,
    /// Base URL relative image paths are resolved against
    pub media_url: String,
    pub rates_url: String,
    /// File holding tenant id, search history and cached rates
    pub storage_path: PathBuf,
    pub http_timeout: Duration,
    pub rate_refresh: Duration,
    pub page_size: usize,
    /// Client language tag (`LANG`), used to guess a locale
    pub language: Option<String>,
    /// Client time zone (`TZ`), used to guess a locale
    pub timezone: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            media_url: media_base(DEFAULT_API_URL),
            rates_url: DEFAULT_RATES_URL.to_string(),
            storage_path: PathBuf::from("catalog-state.json"),
            http_timeout: Duration::from_secs(30),
            rate_refresh: Duration::from_secs(300),
            page_size: 12,
            language: None,
            timezone: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset or unparsable values keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_url = lookup("CATALOG_API_URL").unwrap_or(defaults.api_url);
        let media_url = lookup("CATALOG_MEDIA_URL").unwrap_or_else(|| media_base(&api_url));

        Self {
            media_url,
            rates_url: lookup("CATALOG_RATES_URL").unwrap_or(defaults.rates_url),
            storage_path: lookup("CATALOG_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            http_timeout: parse_or(&lookup, "CATALOG_HTTP_TIMEOUT_SECS", 30).map_or(
                defaults.http_timeout,
                Duration::from_secs,
            ),
            rate_refresh: parse_or(&lookup, "CATALOG_RATE_REFRESH_SECS", 300)
                .map_or(defaults.rate_refresh, |secs| Duration::from_secs(secs.max(1))),
            page_size: parse_or(&lookup, "CATALOG_PAGE_SIZE", 12)
                .map_or(defaults.page_size, |n| n.max(1) as usize),
            language: lookup("LANG"),
            timezone: lookup("TZ"),
            api_url,
        }
    }
}

impl Config {
    /// Locale guessed from the client's language and time zone
    pub fn detected_locale(&self) -> Locale {
        Locale::detect(
            self.language.as_deref().unwrap_or_default(),
            self.timezone.as_deref().unwrap_or_default(),
        )
    }
}

fn parse_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}, using default {}", key, raw, default);
            None
        }
    }
}

/// `http://host/api` -> `http://host`
fn media_base(api_url: &str) -> String {
    let trimmed = api_url.trim_end_matches('/');
    trimmed
        .strip_suffix("/api")
        .unwrap_or(trimmed)
        .to_string()
}
