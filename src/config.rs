use std::{env, fmt::Display, net::SocketAddr, str::FromStr, time::Duration};

use color_eyre::eyre::{eyre, Result, WrapErr};

pub const DEFAULT_OVERPASS_URLS: [&str; 3] = [
    "https://overpass-api.de/api/interpreter",
    "https://overpass.kumi.systems/api/interpreter",
    "https://overpass.openstreetmap.ru/api/interpreter",
];

/// Process-wide settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub nominatim_url: String,
    /// Overpass mirrors in priority order.
    pub overpass_urls: Vec<String>,
    pub http_timeout: Duration,
    /// Server and client timeout for statewide Overpass queries.
    pub region_query_timeout: Duration,
    pub overpass_retry_attempts: u32,
    pub retry_backoff: Duration,
    pub retry_backoff_cap: Duration,
    pub rate_limit_backoff: Duration,
    pub enable_website_email_discovery: bool,
    /// Pause between the pages tried for one website.
    pub crawl_delay: Duration,
    pub user_agent: String,
    pub max_parallel_category_requests: usize,
    pub enrichment_concurrency: usize,
    pub distance_tolerance_factor: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            nominatim_url: "https://nominatim.openstreetmap.org/search".to_owned(),
            overpass_urls: DEFAULT_OVERPASS_URLS.iter().map(|u| (*u).to_owned()).collect(),
            http_timeout: Duration::from_secs(15),
            region_query_timeout: Duration::from_secs(900),
            overpass_retry_attempts: 3,
            retry_backoff: Duration::from_secs(2),
            retry_backoff_cap: Duration::from_secs(5),
            rate_limit_backoff: Duration::from_secs(5),
            enable_website_email_discovery: false,
            crawl_delay: Duration::from_secs(1),
            user_agent: "FindYourPlace/1.0 (+https://example.com)".to_owned(),
            max_parallel_category_requests: 4,
            enrichment_concurrency: 8,
            distance_tolerance_factor: 1.05,
        }
    }
}

impl Config {
    /// Reads `FYP_*` variables on top of the defaults. A `.env` file in the
    /// working directory is loaded first when present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let defaults = Self::default();

        let overpass_urls = match vars.raw("FYP_OVERPASS_URLS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_owned)
                .collect(),
            None => defaults.overpass_urls,
        };
        let enable_website_email_discovery = match vars.raw("FYP_ENABLE_WEBSITE_EMAIL_DISCOVERY") {
            Some(raw) => parse_flag(&raw).wrap_err("FYP_ENABLE_WEBSITE_EMAIL_DISCOVERY")?,
            None => defaults.enable_website_email_discovery,
        };
        let config = Self {
            bind_addr: vars.get("FYP_BIND_ADDR")?.unwrap_or(defaults.bind_addr),
            nominatim_url: vars
                .raw("FYP_NOMINATIM_URL")
                .unwrap_or(defaults.nominatim_url),
            overpass_urls,
            http_timeout: vars
                .get("FYP_HTTP_TIMEOUT")?
                .map_or(defaults.http_timeout, Duration::from_secs),
            region_query_timeout: vars
                .get("FYP_REGION_QUERY_TIMEOUT")?
                .map_or(defaults.region_query_timeout, Duration::from_secs),
            overpass_retry_attempts: vars
                .get("FYP_OVERPASS_RETRY_ATTEMPTS")?
                .unwrap_or(defaults.overpass_retry_attempts),
            retry_backoff: vars
                .get("FYP_RETRY_BACKOFF_MS")?
                .map_or(defaults.retry_backoff, Duration::from_millis),
            retry_backoff_cap: vars
                .get("FYP_RETRY_BACKOFF_CAP_MS")?
                .map_or(defaults.retry_backoff_cap, Duration::from_millis),
            rate_limit_backoff: vars
                .get("FYP_RATE_LIMIT_BACKOFF_MS")?
                .map_or(defaults.rate_limit_backoff, Duration::from_millis),
            enable_website_email_discovery,
            crawl_delay: vars
                .get("FYP_CRAWL_DELAY_MS")?
                .map_or(defaults.crawl_delay, Duration::from_millis),
            user_agent: vars.raw("FYP_USER_AGENT").unwrap_or(defaults.user_agent),
            max_parallel_category_requests: vars
                .get("FYP_MAX_PARALLEL_CATEGORY_REQUESTS")?
                .unwrap_or(defaults.max_parallel_category_requests),
            enrichment_concurrency: vars
                .get("FYP_ENRICHMENT_CONCURRENCY")?
                .unwrap_or(defaults.enrichment_concurrency),
            distance_tolerance_factor: vars
                .get("FYP_DISTANCE_TOLERANCE_FACTOR")?
                .unwrap_or(defaults.distance_tolerance_factor),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.overpass_urls.is_empty() {
            return Err(eyre!("FYP_OVERPASS_URLS must name at least one mirror"));
        }
        if self.overpass_retry_attempts == 0 {
            return Err(eyre!("FYP_OVERPASS_RETRY_ATTEMPTS must be at least 1"));
        }
        if self.max_parallel_category_requests == 0 || self.enrichment_concurrency == 0 {
            return Err(eyre!("concurrency limits must be at least 1"));
        }
        if !(self.distance_tolerance_factor >= 1.0) {
            return Err(eyre!("FYP_DISTANCE_TOLERANCE_FACTOR must be at least 1.0"));
        }
        Ok(())
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed value; blank counts as unset.
    fn raw(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|raw| raw.trim().to_owned())
            .filter(|raw| !raw.is_empty())
    }

    fn get<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.raw(name)
            .map(|value| {
                value
                    .parse::<T>()
                    .map_err(|e| eyre!("{name} has an invalid value {value:?}: {e}"))
            })
            .transpose()
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(eyre!("expected a boolean, got {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert_eq!(config.region_query_timeout, Duration::from_secs(900));
        assert_eq!(config.crawl_delay, Duration::from_secs(1));
        assert_eq!(config.overpass_retry_attempts, 3);
        assert!(!config.enable_website_email_discovery);
        assert_eq!(config.overpass_urls.len(), 3);
        assert_eq!(config.overpass_urls[0], DEFAULT_OVERPASS_URLS[0]);
    }

    #[test]
    fn reads_overrides() {
        let config = from_pairs(&[
            ("FYP_OVERPASS_URLS", "http://one, http://two"),
            ("FYP_HTTP_TIMEOUT", "4"),
            ("FYP_ENABLE_WEBSITE_EMAIL_DISCOVERY", "yes"),
            ("FYP_USER_AGENT", "tester/0.1"),
            ("FYP_BIND_ADDR", "127.0.0.1:8080"),
            ("FYP_CRAWL_DELAY_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.overpass_urls, ["http://one", "http://two"]);
        assert_eq!(config.http_timeout, Duration::from_secs(4));
        assert!(config.enable_website_email_discovery);
        assert_eq!(config.user_agent, "tester/0.1");
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.crawl_delay, Duration::from_millis(250));
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(from_pairs(&[("FYP_HTTP_TIMEOUT", "soon")]).is_err());
        assert!(from_pairs(&[("FYP_OVERPASS_RETRY_ATTEMPTS", "0")]).is_err());
        assert!(from_pairs(&[("FYP_ENABLE_WEBSITE_EMAIL_DISCOVERY", "maybe")]).is_err());
        assert!(from_pairs(&[("FYP_OVERPASS_URLS", " , ")]).is_err());
    }
}
