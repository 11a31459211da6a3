use std::{env, fmt, num::NonZeroU32, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::clients::website::DEFAULT_USER_AGENT;
use crate::clients::{PlacesConfig, WebsiteConfig};
use crate::util::text::redact;

/// ログ出力時に伏せられるAPIキー。
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&redact(&self.0)).finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    places_api_key: ApiKey,
    places_api_base_url: String,
    places_connect_timeout: Duration,
    places_total_timeout: Duration,
    search_keyword: String,
    search_place_type: Option<String>,
    search_radius_meters: NonZeroU32,
    search_max_pages: usize,
    search_page_token_delay: Duration,
    website_scan_enabled: bool,
    website_fetch_timeout: Duration,
    website_fetch_delay: Duration,
    website_user_agent: String,
    output_dir: PathBuf,
    taxonomy_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// Nearby Search が返すページ数の上限。
const MAX_SEARCH_PAGES: usize = 3;

impl Config {
    /// 環境変数から設定値を読み込み、検証する。
    ///
    /// # Errors
    /// `PLACES_API_KEY` が未設定、もしくは各種値のパースに失敗した場合は [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let places_api_key = ApiKey(env_var("PLACES_API_KEY")?);
        let places_api_base_url = env::var("PLACES_API_BASE_URL")
            .unwrap_or_else(|_| "https://maps.googleapis.com/".to_string());
        let places_connect_timeout = parse_duration_ms("PLACES_CONNECT_TIMEOUT_MS", 3000)?;
        let places_total_timeout = parse_duration_ms("PLACES_TOTAL_TIMEOUT_MS", 30000)?;

        // Search settings
        let search_keyword =
            env::var("SEARCH_KEYWORD").unwrap_or_else(|_| "recycling".to_string());
        let search_place_type = Some(
            env::var("SEARCH_PLACE_TYPE").unwrap_or_else(|_| "establishment".to_string()),
        )
        .filter(|value| !value.trim().is_empty());
        let search_radius_meters = parse_non_zero_u32("SEARCH_RADIUS_METERS", 5000)?;
        let search_max_pages = parse_page_count("SEARCH_MAX_PAGES", 1)?;
        let search_page_token_delay = parse_duration_ms("SEARCH_PAGE_TOKEN_DELAY_MS", 2000)?;

        // Website scan settings
        let website_scan_enabled = parse_bool("WEBSITE_SCAN_ENABLED", true)?;
        let website_fetch_timeout = parse_duration_ms("WEBSITE_FETCH_TIMEOUT_MS", 10000)?;
        let website_fetch_delay = parse_duration_ms("WEBSITE_FETCH_DELAY_MS", 1000)?;
        let website_user_agent =
            env::var("WEBSITE_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

        let output_dir = PathBuf::from(
            env::var("OUTPUT_DIR").unwrap_or_else(|_| "recyclers".to_string()),
        );
        let taxonomy_path = env::var("TAXONOMY_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            places_api_key,
            places_api_base_url,
            places_connect_timeout,
            places_total_timeout,
            search_keyword,
            search_place_type,
            search_radius_meters,
            search_max_pages,
            search_page_token_delay,
            website_scan_enabled,
            website_fetch_timeout,
            website_fetch_delay,
            website_user_agent,
            output_dir,
            taxonomy_path,
        })
    }

    #[must_use]
    pub fn with_search_keyword(mut self, keyword: String) -> Self {
        self.search_keyword = keyword;
        self
    }

    #[must_use]
    pub fn with_search_radius(mut self, radius_meters: NonZeroU32) -> Self {
        self.search_radius_meters = radius_meters;
        self
    }

    #[must_use]
    pub fn with_website_scan(mut self, enabled: bool) -> Self {
        self.website_scan_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_output_dir(mut self, output_dir: PathBuf) -> Self {
        self.output_dir = output_dir;
        self
    }

    #[must_use]
    pub fn places_api_key(&self) -> &ApiKey {
        &self.places_api_key
    }

    #[must_use]
    pub fn places_api_base_url(&self) -> &str {
        &self.places_api_base_url
    }

    #[must_use]
    pub fn places_connect_timeout(&self) -> Duration {
        self.places_connect_timeout
    }

    #[must_use]
    pub fn places_total_timeout(&self) -> Duration {
        self.places_total_timeout
    }

    #[must_use]
    pub fn search_keyword(&self) -> &str {
        &self.search_keyword
    }

    #[must_use]
    pub fn search_place_type(&self) -> Option<&str> {
        self.search_place_type.as_deref()
    }

    #[must_use]
    pub fn search_radius_meters(&self) -> NonZeroU32 {
        self.search_radius_meters
    }

    #[must_use]
    pub fn search_max_pages(&self) -> usize {
        self.search_max_pages
    }

    #[must_use]
    pub fn search_page_token_delay(&self) -> Duration {
        self.search_page_token_delay
    }

    #[must_use]
    pub fn website_scan_enabled(&self) -> bool {
        self.website_scan_enabled
    }

    #[must_use]
    pub fn website_fetch_timeout(&self) -> Duration {
        self.website_fetch_timeout
    }

    #[must_use]
    pub fn website_fetch_delay(&self) -> Duration {
        self.website_fetch_delay
    }

    #[must_use]
    pub fn website_user_agent(&self) -> &str {
        &self.website_user_agent
    }

    #[must_use]
    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    #[must_use]
    pub fn taxonomy_path(&self) -> Option<&PathBuf> {
        self.taxonomy_path.as_ref()
    }

    #[must_use]
    pub fn places_config(&self) -> PlacesConfig {
        PlacesConfig {
            base_url: self.places_api_base_url.clone(),
            api_key: self.places_api_key.expose().to_string(),
            connect_timeout: self.places_connect_timeout,
            total_timeout: self.places_total_timeout,
            max_pages: self.search_max_pages,
            page_token_delay: self.search_page_token_delay,
        }
    }

    #[must_use]
    pub fn website_config(&self) -> WebsiteConfig {
        WebsiteConfig {
            user_agent: self.website_user_agent.clone(),
            timeout: self.website_fetch_timeout,
        }
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_duration_ms(name: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default_ms.to_string());
    let ms = raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    Ok(Duration::from_millis(ms))
}

fn parse_non_zero_u32(name: &'static str, default: u32) -> Result<NonZeroU32, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = raw.parse::<u32>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    NonZeroU32::new(parsed).ok_or_else(|| ConfigError::Invalid {
        name,
        source: anyhow::anyhow!("must be greater than zero"),
    })
}

fn parse_page_count(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    if !(1..=MAX_SEARCH_PAGES).contains(&parsed) {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("value must be between 1 and {MAX_SEARCH_PAGES}"),
        });
    }
    Ok(parsed)
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("invalid boolean value: {raw}"),
        }),
    }
}
