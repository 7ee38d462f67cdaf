use std::sync::Arc;

use color_eyre::eyre::Result;

use crate::{
    config::Config,
    enrich::{EmailCrawler, ReqwestPageFetcher},
    geocode::NominatimGeocoder,
    overpass::{OverpassOrchestrator, ReqwestOverpassTransport},
    search::SearchService,
};

/// Shared outbound client carrying the configured user agent and timeout.
pub fn build_http_client(config: &Config) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.http_timeout)
        .build()?)
}

/// Wires the production adapters around one shared client.
pub fn build_search_service(config: &Config, client: reqwest::Client) -> SearchService {
    let geocoder = NominatimGeocoder::new(client.clone(), config.nominatim_url.as_str());
    let overpass = OverpassOrchestrator::new(
        Arc::new(ReqwestOverpassTransport::new(client.clone())),
        config,
    );
    let crawler = EmailCrawler::new(
        Arc::new(ReqwestPageFetcher::new(client)),
        config.enrichment_concurrency,
        config.http_timeout,
    )
    .with_crawl_delay(config.crawl_delay);
    SearchService::new(config, Arc::new(geocoder), overpass, crawler)
}
