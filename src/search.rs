//! Top-level search: geocode, fan out per category, merge, enrich.

use std::{collections::HashSet, future::Future, sync::Arc};

use futures::stream::{self, StreamExt};
use tracing::{info, instrument, warn};

use crate::{
    config::Config,
    enrich::EmailCrawler,
    error::{Result, SearchError},
    geocode::Geocoder,
    normalize::normalize,
    overpass::{AdminArea, OverpassOrchestrator, OverpassUnavailable},
    types::{
        Category, CategoryWarning, Coordinate, Place, RawElement, SearchRequest, SearchResult,
    },
};

type Batches = Vec<(Category, Vec<Place>)>;

pub struct SearchService {
    geocoder: Arc<dyn Geocoder>,
    overpass: OverpassOrchestrator,
    crawler: Option<EmailCrawler>,
    category_concurrency: usize,
    distance_tolerance: f64,
}

impl SearchService {
    /// `crawler` is only used when website email discovery is enabled in
    /// `config`.
    pub fn new(
        config: &Config,
        geocoder: Arc<dyn Geocoder>,
        overpass: OverpassOrchestrator,
        crawler: EmailCrawler,
    ) -> Self {
        Self {
            geocoder,
            overpass,
            crawler: config.enable_website_email_discovery.then_some(crawler),
            category_concurrency: config.max_parallel_category_requests.max(1),
            distance_tolerance: config.distance_tolerance_factor,
        }
    }

    #[instrument(
        skip(self, request),
        fields(location = %request.location, radius_km = request.radius_km)
    )]
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResult> {
        let origin = self.geocoder.resolve(&request.location).await?;
        info!(label = %origin.label, "resolved location");

        let coordinate = origin.coordinate;
        let radius_m = request.radius_m();
        let (batches, warnings) = self
            .fetch_categories(&request.categories, |category| {
                self.overpass.query(coordinate, radius_m, category)
            })
            .await?;

        let max_distance_m = f64::from(radius_m) * self.distance_tolerance;
        let results = merge_places(batches, coordinate, max_distance_m);
        let results = self.maybe_enrich(results, request.with_email_enrichment).await;
        info!(
            results = results.len(),
            failed_categories = warnings.len(),
            "search finished"
        );

        Ok(SearchResult {
            location_label: origin.label,
            radius_km: request.radius_km,
            categories: request.categories.clone(),
            results,
            warnings,
        })
    }

    /// Every category across a whole administrative area. Unnamed places are
    /// dropped; there is no distance filter.
    #[instrument(skip(self, area), fields(area = area.name))]
    pub async fn search_area(
        &self,
        area: &AdminArea,
        with_email_enrichment: bool,
    ) -> Result<Vec<Place>> {
        let (batches, warnings) = self
            .fetch_categories(&Category::ALL, |category| {
                self.overpass.query_area(area, category)
            })
            .await?;

        let named = batches
            .into_iter()
            .map(|(category, mut places)| {
                places.retain(|place| place.name.is_some());
                (category, places)
            })
            .collect();
        let results = self.maybe_enrich(dedupe_places(named), with_email_enrichment).await;
        info!(
            results = results.len(),
            failed_categories = warnings.len(),
            "area search finished"
        );
        Ok(results)
    }

    /// Runs `fetch` for each category with at most `category_concurrency` in
    /// flight. Failed categories become warnings unless all of them fail.
    async fn fetch_categories<F, Fut>(
        &self,
        categories: &[Category],
        fetch: F,
    ) -> Result<(Batches, Vec<CategoryWarning>)>
    where
        F: Fn(Category) -> Fut,
        Fut: Future<Output = std::result::Result<Vec<RawElement>, OverpassUnavailable>>,
    {
        let outcomes: Vec<(Category, std::result::Result<_, _>)> =
            stream::iter(categories.iter().copied())
                .map(|category| {
                    let pending = fetch(category);
                    async move { (category, pending.await) }
                })
                .buffered(self.category_concurrency)
                .collect()
                .await;

        let mut batches: Batches = Vec::with_capacity(outcomes.len());
        let mut warnings = Vec::new();
        let mut last_failure = None;
        for (category, outcome) in outcomes {
            match outcome {
                Ok(elements) => batches.push((
                    category,
                    elements
                        .into_iter()
                        .map(|raw| normalize(raw, category))
                        .collect(),
                )),
                Err(err) => {
                    warn!(%category, error = %err, "category query failed");
                    warnings.push(CategoryWarning {
                        category,
                        message: err.to_string(),
                    });
                    last_failure = Some(err);
                }
            }
        }
        match last_failure {
            Some(err) if batches.is_empty() => Err(SearchError::OverpassUnavailable(err)),
            _ => Ok((batches, warnings)),
        }
    }

    /// Enrichment needs both the process flag and the caller's opt-in.
    async fn maybe_enrich(&self, places: Vec<Place>, requested: bool) -> Vec<Place> {
        match self.crawler.as_ref().filter(|_| requested) {
            Some(crawler) => crawler.enrich(places).await,
            None => places,
        }
    }
}

/// Merges per-category batches given in request order. Places outside
/// `max_distance_m` of `origin` are dropped before deduplication.
pub fn merge_places(batches: Batches, origin: Coordinate, max_distance_m: f64) -> Vec<Place> {
    let within = batches
        .into_iter()
        .map(|(category, mut places)| {
            places.retain(|place| place.coordinate().distance_m(&origin) <= max_distance_m);
            (category, places)
        })
        .collect();
    dedupe_places(within)
}

/// The first occurrence of an OSM id wins and each category's places are
/// sorted by OSM id.
pub fn dedupe_places(batches: Batches) -> Vec<Place> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for (_, mut places) in batches {
        places.retain(|place| seen.insert(place.osm_id));
        places.sort_by_key(|place| place.osm_id);
        merged.extend(places);
    }
    merged
}
